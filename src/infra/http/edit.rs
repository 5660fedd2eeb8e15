//! Admin-only page editor.

use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::{
    application::{auth::Session, error::HttpError},
    cache::PageError,
    domain::pages::PageName,
    presentation::views::{
        EditTemplate, EditView, Viewer, render_http_error, render_template_response,
    },
};

use super::{HttpState, join_error};

#[derive(Debug, Deserialize)]
pub(super) struct EditForm {
    #[serde(default)]
    contents: String,
}

/// `GET /edit/{name}`: raw source in a form. Missing pages open blank.
pub(super) async fn edit_form(
    State(state): State<HttpState>,
    Extension(session): Extension<Session>,
    Path(raw): Path<String>,
) -> Response {
    let viewer = Viewer::from_session(Some(&session));
    let name = match PageName::new(raw) {
        Ok(name) => name,
        Err(err) => return render_http_error(viewer, HttpError::from(err)),
    };

    let cache = state.pages.clone();
    let lookup = name.clone();
    let loaded = tokio::task::spawn_blocking(move || cache.get_source(&lookup)).await;

    let view = match loaded {
        Ok(Ok((source, metadata))) => EditView::new(
            name.as_str(),
            &metadata,
            String::from_utf8_lossy(&source).into_owned(),
        ),
        Ok(Err(PageError::NotFound { .. })) => EditView::blank(name.as_str()),
        Ok(Err(err)) => return render_http_error(viewer, HttpError::from(err)),
        Err(err) => {
            return render_http_error(viewer, join_error("infra::http::edit::edit_form", &err));
        }
    };

    render_template_response(EditTemplate { viewer, view }, StatusCode::OK)
}

/// `POST /edit/{name}`: store the submitted source and show the page.
pub(super) async fn save_page(
    State(state): State<HttpState>,
    Extension(session): Extension<Session>,
    Path(raw): Path<String>,
    Form(form): Form<EditForm>,
) -> Response {
    let viewer = Viewer::from_session(Some(&session));
    let name = match PageName::new(raw) {
        Ok(name) => name,
        Err(err) => return render_http_error(viewer, HttpError::from(err)),
    };

    let cache = state.pages.clone();
    let target = name.clone();
    let saved =
        tokio::task::spawn_blocking(move || cache.save(&target, form.contents.as_bytes())).await;

    match saved {
        Ok(Ok(())) => Redirect::to(&format!("/page/{}", name.path_segment())).into_response(),
        Ok(Err(err)) => render_http_error(viewer, HttpError::from(err)),
        Err(err) => render_http_error(viewer, join_error("infra::http::edit::save_page", &err)),
    }
}
