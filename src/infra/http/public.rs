use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    application::error::HttpError,
    domain::pages::PageName,
    presentation::views::{
        IndexTemplate, PageTemplate, render_http_error, render_not_found_response,
        render_template_response,
    },
};

use super::{HttpState, join_error, viewer_for};

pub(super) async fn index(State(state): State<HttpState>, jar: CookieJar) -> Response {
    let viewer = viewer_for(&state, &jar);
    render_template_response(IndexTemplate { viewer }, StatusCode::OK)
}

/// `GET /page/{name}`: the cached, rendered page.
pub(super) async fn page(
    State(state): State<HttpState>,
    jar: CookieJar,
    Path(raw): Path<String>,
) -> Response {
    let viewer = viewer_for(&state, &jar);
    let name = match PageName::new(raw) {
        Ok(name) => name,
        Err(err) => return render_http_error(viewer, HttpError::from(err)),
    };

    let cache = state.pages.clone();
    let loaded = tokio::task::spawn_blocking(move || cache.get(&name)).await;

    match loaded {
        Ok(Ok((page, _metadata))) => {
            render_template_response(PageTemplate::new(viewer, page), StatusCode::OK)
        }
        Ok(Err(err)) => render_http_error(viewer, HttpError::from(err)),
        Err(err) => render_http_error(viewer, join_error("infra::http::public::page", &err)),
    }
}

pub(super) async fn not_found(State(state): State<HttpState>, jar: CookieJar) -> Response {
    render_not_found_response(viewer_for(&state, &jar))
}
