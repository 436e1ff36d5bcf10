//! Throwaway HTTP upstreams for tests.

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;
use url::Url;

struct Canned {
    status: StatusCode,
    content_type: &'static str,
    body: String,
    delay: Duration,
    hits: Arc<AtomicUsize>,
}

/// Serve the same canned response to every request, on any path, on 127.0.0.1.
///
/// Returns the base URL and a counter of handled requests.
pub async fn spawn_server(
    status: u16,
    content_type: &'static str,
    body: impl Into<String>,
    delay: Duration,
) -> (Url, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let state = Arc::new(Canned {
        status: StatusCode::from_u16(status).unwrap(),
        content_type,
        body: body.into(),
        delay,
        hits: Arc::clone(&hits),
    });
    let app = Router::new().fallback(serve_canned).with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let url = Url::parse(&format!("http://{addr}/calendar")).unwrap();
    (url, hits)
}

async fn serve_canned(State(canned): State<Arc<Canned>>) -> Response {
    canned.hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(canned.delay).await;
    (
        canned.status,
        [(header::CONTENT_TYPE, canned.content_type)],
        canned.body.clone(),
    )
        .into_response()
}

/// A local URL nothing is listening on.
pub async fn unused_local_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{addr}/calendar")).unwrap()
}
