mod apps;
mod auth;
mod edit;
mod middleware;
mod public;

pub use apps::AppRegistry;
pub use middleware::RequestContext;

use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    middleware as axum_middleware,
    routing::{any, get},
};
use axum_extra::extract::cookie::CookieJar;
use tokio::task::JoinError;

use crate::{
    application::{
        auth::{AuthService, SESSION_COOKIE},
        error::HttpError,
    },
    cache::PageCache,
    infra::assets::serve_assets,
    presentation::views::Viewer,
};

use self::middleware::{log_responses, require_admin, set_request_context};

/// Shared services handed to every handler.
#[derive(Clone)]
pub struct HttpState {
    pub pages: Arc<PageCache>,
    pub auth: AuthService,
    pub apps: Arc<AppRegistry>,
}

impl HttpState {
    pub fn new(pages: Arc<PageCache>, auth: AuthService, apps: AppRegistry) -> Self {
        Self {
            pages,
            auth,
            apps: Arc::new(apps),
        }
    }
}

pub fn build_router(state: HttpState) -> Router {
    let admin_routes = Router::new()
        .route("/edit/{name}", get(edit::edit_form).post(edit::save_page))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_admin,
        ));

    Router::new()
        .route("/", get(public::index))
        .route("/page/{name}", get(public::page))
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/app/{name}", any(apps::dispatch_root))
        .route("/app/{name}/{*rest}", any(apps::dispatch_nested))
        .route("/static/{*path}", get(serve_assets))
        .merge(admin_routes)
        .fallback(public::not_found)
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

fn session_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

fn viewer_for(state: &HttpState, jar: &CookieJar) -> Viewer {
    let session = session_token(jar).and_then(|token| state.auth.current_user(&token));
    Viewer::from_session(session.as_ref())
}

fn join_error(source: &'static str, err: &JoinError) -> HttpError {
    HttpError::from_error(
        source,
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error",
        err,
    )
}
