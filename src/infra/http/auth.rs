use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;

use crate::{
    application::{
        auth::{AuthError, SESSION_COOKIE},
        error::HttpError,
    },
    presentation::views::{
        LoginTemplate, LoginView, Viewer, render_http_error, render_template_response,
    },
};

use super::{HttpState, session_token, viewer_for};

const SOURCE: &str = "infra::http::auth";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct LoginQuery {
    failed: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginForm {
    username: String,
    password: String,
}

fn throttled(viewer: Viewer, err: &AuthError) -> Response {
    render_http_error(
        viewer,
        HttpError::from_error(
            SOURCE,
            StatusCode::TOO_MANY_REQUESTS,
            "Too many login attempts, try again shortly",
            err,
        ),
    )
}

/// `GET /login`.
pub(super) async fn login_form(
    State(state): State<HttpState>,
    jar: CookieJar,
    Query(query): Query<LoginQuery>,
) -> Response {
    let viewer = viewer_for(&state, &jar);
    if let Err(err) = state.auth.admit_login_attempt() {
        return throttled(viewer, &err);
    }
    if viewer.username.is_some() {
        return Redirect::to("/").into_response();
    }

    let view = LoginView {
        failed: query.failed,
    };
    render_template_response(LoginTemplate { viewer, view }, StatusCode::OK)
}

/// `POST /login`.
pub(super) async fn login(
    State(state): State<HttpState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let viewer = viewer_for(&state, &jar);
    if let Err(err) = state.auth.admit_login_attempt() {
        return throttled(viewer, &err);
    }
    if viewer.username.is_some() {
        return Redirect::to("/").into_response();
    }

    match state.auth.login(&form.username, &form.password) {
        Ok(token) => {
            let cookie = Cookie::build((SESSION_COOKIE, token))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax);
            (jar.add(cookie), Redirect::to("/")).into_response()
        }
        Err(AuthError::InvalidCredentials) => Redirect::to("/login?failed=true").into_response(),
        Err(err) => render_http_error(
            viewer,
            HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Login is unavailable",
                &err,
            ),
        ),
    }
}

/// `GET /logout`.
pub(super) async fn logout(State(state): State<HttpState>, jar: CookieJar) -> Response {
    if let Some(token) = session_token(&jar) {
        state.auth.logout(&token);
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/")).into_response()
}
