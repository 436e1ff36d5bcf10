//! Focus scope selection.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{RelevanceTag, TaggedMeeting};

/// How narrowly to filter tagged meetings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Everything, tags kept as computed.
    #[default]
    #[value(alias = "all")]
    AllActivity,
    /// Meetings matching either keyword set.
    #[value(alias = "broad")]
    CenterCityBroad,
    /// Meetings matching the local keyword set only.
    #[value(alias = "local")]
    SocietyHillLocal,
}

impl Scope {
    /// Human label used in rendered output.
    pub fn label(self) -> &'static str {
        match self {
            Scope::AllActivity => "All Activity",
            Scope::CenterCityBroad => "Center City (Broad)",
            Scope::SocietyHillLocal => "Society Hill & Old City (Local)",
        }
    }

    pub fn admits(self, tag: RelevanceTag) -> bool {
        match self {
            Scope::AllActivity => true,
            Scope::CenterCityBroad => matches!(tag, RelevanceTag::Local | RelevanceTag::Broad),
            Scope::SocietyHillLocal => tag == RelevanceTag::Local,
        }
    }

    /// Reduce `meetings` to the ones this scope admits, keeping order.
    pub fn apply(self, meetings: Vec<TaggedMeeting>) -> Vec<TaggedMeeting> {
        if self == Scope::AllActivity {
            return meetings;
        }
        meetings
            .into_iter()
            .filter(|m| self.admits(m.relevance))
            .collect()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
