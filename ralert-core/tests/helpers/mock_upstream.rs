//! In-process Crossref/ORCID stand-in
//!
//! Serves scripted replies per request path and records every hit. The
//! Crossref side lives at `/works/{doi}`, the ORCID side at
//! `/orcid/{id}/works`.

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub enum Reply {
    /// 200 with `{"status":"ok","message": ...}`
    Work(Value),
    /// 200 with an arbitrary JSON body
    Json(Value),
    /// 200 with a non-JSON body
    Garbage,
    /// 429, optionally with `Retry-After`
    TooManyRequests(Option<&'static str>),
    Status(u16),
}

#[derive(Debug, Clone)]
pub struct Hit {
    pub path: String,
    pub at: Instant,
    pub accept: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Default)]
struct MockState {
    /// Replies per path; the last one repeats once the script runs out
    scripts: Mutex<HashMap<String, Vec<Reply>>>,
    hits: Mutex<Vec<Hit>>,
}

pub struct MockUpstream {
    base_url: String,
    state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl MockUpstream {
    pub async fn start() -> anyhow::Result<Self> {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .fallback(respond)
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url: format!("http://{}", addr),
            state,
            handle,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Script replies for `GET /works/{doi}`
    pub fn work(&self, doi: &str, replies: Vec<Reply>) -> &Self {
        self.script(format!("/works/{}", doi), replies)
    }

    /// Script replies for `GET /orcid/{id}/works`
    pub fn orcid(&self, orcid_id: &str, replies: Vec<Reply>) -> &Self {
        self.script(format!("/orcid/{}/works", orcid_id), replies)
    }

    fn script(&self, path: String, replies: Vec<Reply>) -> &Self {
        self.state.scripts.lock().unwrap().insert(path, replies);
        self
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.state.hits.lock().unwrap().clone()
    }

    pub fn hits_for(&self, path: &str) -> Vec<Hit> {
        self.hits().into_iter().filter(|h| h.path == path).collect()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// ORCID works body listing the given DOIs
pub fn orcid_works(dois: &[&str]) -> Value {
    let groups: Vec<Value> = dois
        .iter()
        .map(|doi| {
            json!({
                "external-ids": {
                    "external-id": [
                        { "external-id-type": "doi", "external-id-value": doi }
                    ]
                }
            })
        })
        .collect();
    json!({ "group": groups })
}

async fn respond(State(state): State<Arc<MockState>>, uri: Uri, headers: HeaderMap) -> Response {
    let path = uri.path().to_string();
    let header_text = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };

    let seen = {
        let mut hits = state.hits.lock().unwrap();
        let seen = hits.iter().filter(|h| h.path == path).count();
        hits.push(Hit {
            path: path.clone(),
            at: Instant::now(),
            accept: header_text(header::ACCEPT),
            user_agent: header_text(header::USER_AGENT),
        });
        seen
    };

    let reply = {
        let scripts = state.scripts.lock().unwrap();
        scripts
            .get(&path)
            .and_then(|replies| replies.get(seen).or_else(|| replies.last()).cloned())
    };

    match reply {
        Some(Reply::Work(message)) => {
            Json(json!({ "status": "ok", "message-type": "work", "message": message })).into_response()
        }
        Some(Reply::Json(body)) => Json(body).into_response(),
        Some(Reply::Garbage) => (StatusCode::OK, "<html>not json</html>").into_response(),
        Some(Reply::TooManyRequests(Some(retry_after))) => {
            (StatusCode::TOO_MANY_REQUESTS, [(header::RETRY_AFTER, retry_after)]).into_response()
        }
        Some(Reply::TooManyRequests(None)) => StatusCode::TOO_MANY_REQUESTS.into_response(),
        Some(Reply::Status(code)) => StatusCode::from_u16(code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
        None => (StatusCode::NOT_FOUND, "Resource not found").into_response(),
    }
}
