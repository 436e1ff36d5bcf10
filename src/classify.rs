//! Keyword relevance classification.
//!
//! Each meeting is tagged against two ordered keyword sets. The local set
//! holds fine-grained neighborhood terms and wins over the broad (district)
//! set whenever both match.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::models::{MeetingRecord, RelevanceTag, TaggedMeeting};

/// Neighborhood terms checked first.
pub const DEFAULT_LOCAL_KEYWORDS: &[&str] = &[
    "Society Hill",
    "Old City",
    "District 1",
    "Squilla",
    "Washington Square",
    "Head House",
    "Penn's Landing",
    "Spruce St",
    "Pine St",
];

/// Wider district terms checked after the local set.
pub const DEFAULT_BROAD_KEYWORDS: &[&str] = &[
    "Center City",
    "Market St",
    "Broad St",
    "Rittenhouse",
    "Logan Square",
    "Chinatown",
    "City Hall",
    "Vine St",
];

/// The two keyword sets, built once at startup and only read afterwards.
///
/// Terms are stored lowercased; matching is a case-insensitive substring test
/// over [`MeetingRecord::search_text`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "KeywordLists", into = "KeywordLists")]
pub struct KeywordSets {
    local: Vec<String>,
    broad: Vec<String>,
}

/// Serialized form of [`KeywordSets`] as it appears in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct KeywordLists {
    local: Vec<String>,
    broad: Vec<String>,
}

impl Default for KeywordLists {
    fn default() -> Self {
        Self {
            local: DEFAULT_LOCAL_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            broad: DEFAULT_BROAD_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl From<KeywordLists> for KeywordSets {
    fn from(lists: KeywordLists) -> Self {
        KeywordSets::new(lists.local, lists.broad)
    }
}

impl From<KeywordSets> for KeywordLists {
    fn from(sets: KeywordSets) -> Self {
        KeywordLists {
            local: sets.local,
            broad: sets.broad,
        }
    }
}

impl Default for KeywordSets {
    fn default() -> Self {
        KeywordLists::default().into()
    }
}

impl KeywordSets {
    /// Build the sets, dropping blank terms and duplicates while keeping order.
    pub fn new<I, J, S, T>(local: I, broad: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        fn clean<S: AsRef<str>>(items: impl IntoIterator<Item = S>) -> Vec<String> {
            items
                .into_iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .unique()
                .collect()
        }

        Self {
            local: clean(local),
            broad: clean(broad),
        }
    }

    pub fn local(&self) -> &[String] {
        &self.local
    }

    pub fn broad(&self) -> &[String] {
        &self.broad
    }

    /// Tag one record. Local takes precedence over Broad.
    pub fn classify(&self, record: &MeetingRecord) -> RelevanceTag {
        let text = record.search_text();
        if self.local.iter().any(|k| text.contains(k.as_str())) {
            RelevanceTag::Local
        } else if self.broad.iter().any(|k| text.contains(k.as_str())) {
            RelevanceTag::Broad
        } else {
            RelevanceTag::None
        }
    }
}

/// Tag every record, producing new views and leaving the input untouched.
#[instrument(level = "debug", skip_all, fields(count = records.len()))]
pub fn tag_all(records: &[MeetingRecord], keywords: &KeywordSets) -> Vec<TaggedMeeting> {
    let tagged: Vec<TaggedMeeting> = records
        .iter()
        .map(|record| TaggedMeeting {
            record: record.clone(),
            relevance: keywords.classify(record),
        })
        .collect();

    let counts = tagged.iter().counts_by(|t| t.relevance);
    debug!(
        local = counts.get(&RelevanceTag::Local).copied().unwrap_or(0),
        broad = counts.get(&RelevanceTag::Broad).copied().unwrap_or(0),
        none = counts.get(&RelevanceTag::None).copied().unwrap_or(0),
        "Classified meetings"
    );
    tagged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(body: &str, location: &str) -> MeetingRecord {
        MeetingRecord::new(body, "2026-01-20", "10:00 AM", location, "#")
    }

    #[test]
    fn test_local_beats_broad() {
        let keywords = KeywordSets::default();
        let r = record("Zoning hearing near Rittenhouse and Society Hill", "");
        assert_eq!(keywords.classify(&r), RelevanceTag::Local);
    }

    #[test]
    fn test_broad_and_none() {
        let keywords = KeywordSets::default();
        assert_eq!(
            keywords.classify(&record("Committee on Streets", "Room 400, City Hall")),
            RelevanceTag::Broad
        );
        assert_eq!(
            keywords.classify(&record("Committee on Parks", "Fairmount Park")),
            RelevanceTag::None
        );
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let keywords = KeywordSets::new(["OLD CITY"], ["market st"]);
        assert_eq!(
            keywords.classify(&record("Hearing on old city parking", "")),
            RelevanceTag::Local
        );
        assert_eq!(
            keywords.classify(&record("1500 MARKET ST review", "")),
            RelevanceTag::Broad
        );
    }

    #[test]
    fn test_new_drops_blank_and_duplicate_terms() {
        let keywords = KeywordSets::new(["Pine St", " ", "pine st"], Vec::<String>::new());
        assert_eq!(keywords.local(), &["pine st".to_string()]);
        assert!(keywords.broad().is_empty());
    }

    #[test]
    fn test_tag_all_does_not_change_records() {
        let records = vec![record("Society Hill Civic", ""), record("Budget", "")];
        let before = records.clone();
        let tagged = tag_all(&records, &KeywordSets::default());
        assert_eq!(records, before);
        assert_eq!(tagged.len(), 2);
        assert_eq!(tagged[0].relevance, RelevanceTag::Local);
        assert_eq!(tagged[1].relevance, RelevanceTag::None);
        assert_eq!(tagged[0].record, records[0]);
    }

    #[test]
    fn test_keywords_from_yaml() {
        let yaml = "local: [\"Queen Village\"]\nbroad: [\"South St\"]\n";
        let keywords: KeywordSets = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(keywords.local(), &["queen village".to_string()]);
        assert_eq!(keywords.broad(), &["south st".to_string()]);
    }

    #[test]
    fn test_keywords_yaml_defaults_missing_list() {
        let keywords: KeywordSets = serde_yaml::from_str("local: [\"Queen Village\"]\n").unwrap();
        assert_eq!(keywords.local().len(), 1);
        assert_eq!(keywords.broad().len(), DEFAULT_BROAD_KEYWORDS.len());
    }
}
