//! Sub-applications mounted under `/app/{name}`.

use std::collections::BTreeMap;

use axum::{
    Router,
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tracing::info;

use crate::application::error::HttpError;

use super::HttpState;

const SOURCE: &str = "infra::http::apps";

/// Routers registered by name at startup. Each sees paths relative to its
/// mount point, so `/app/notes/list` reaches the `notes` router as `/list`.
#[derive(Clone, Default)]
pub struct AppRegistry {
    apps: BTreeMap<String, Router>,
}

impl AppRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `router` under `name`, returning the router it replaced.
    pub fn register(&mut self, name: impl Into<String>, router: Router) -> Option<Router> {
        self.apps.insert(name.into(), router)
    }

    pub fn with(mut self, name: impl Into<String>, router: Router) -> Self {
        self.register(name, router);
        self
    }

    pub fn get(&self, name: &str) -> Option<Router> {
        self.apps.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.apps.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

pub(super) async fn dispatch_root(
    State(state): State<HttpState>,
    Path(name): Path<String>,
    request: Request<Body>,
) -> Response {
    dispatch(&state, name, request).await
}

pub(super) async fn dispatch_nested(
    State(state): State<HttpState>,
    Path((name, _rest)): Path<(String, String)>,
    request: Request<Body>,
) -> Response {
    dispatch(&state, name, request).await
}

async fn dispatch(state: &HttpState, name: String, request: Request<Body>) -> Response {
    info!(target = "wijiwiki::apps", app = %name, "Accessing app");

    let Some(router) = state.apps.get(&name) else {
        return HttpError::new(
            SOURCE,
            StatusCode::NOT_FOUND,
            "application not installed",
            format!("no application registered as `{name}`"),
        )
        .into_response();
    };

    let request = match rebase(request) {
        Ok(request) => request,
        Err(err) => {
            return HttpError::from_error(
                SOURCE,
                StatusCode::BAD_REQUEST,
                "Invalid application path",
                &err,
            )
            .into_response();
        }
    };

    match router.oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    }
}

/// Strip `/app/{name}` from the request path, keeping the query string.
///
/// Works on the raw path so percent-encoding survives untouched.
fn rebase(mut request: Request<Body>) -> Result<Request<Body>, axum::http::uri::InvalidUri> {
    let rest = request
        .uri()
        .path()
        .strip_prefix("/app/")
        .and_then(|tail| tail.split_once('/'))
        .map(|(_, rest)| rest)
        .unwrap_or("");
    let path = format!("/{rest}");
    let target = match request.uri().query() {
        Some(query) => format!("{path}?{query}"),
        None => path,
    };
    *request.uri_mut() = target.parse::<Uri>()?;
    Ok(request)
}
