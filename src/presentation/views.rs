use crate::application::auth::Session;
use crate::application::error::{ErrorReport, HttpError};
use crate::domain::pages::{PageMetadata, RenderedPage, path_segment, title_from_name};
use crate::domain::users::Role;
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Render `err` as a full error page, keeping its report for the logger.
pub fn render_http_error(viewer: Viewer, err: HttpError) -> Response {
    let status = err.status();
    let view = ErrorPageView::new(status, err.public_message());
    let mut response = render_template_response(ErrorTemplate { viewer, view }, status);
    err.into_report().attach(&mut response);
    response
}

pub fn render_not_found_response(viewer: Viewer) -> Response {
    let view = ErrorPageView::new(StatusCode::NOT_FOUND, "The page you requested does not exist.");
    let mut response =
        render_template_response(ErrorTemplate { viewer, view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

/// Who is looking at the page.
#[derive(Clone, Debug, Default)]
pub struct Viewer {
    pub username: Option<String>,
    pub is_admin: bool,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn from_session(session: Option<&Session>) -> Self {
        match session {
            Some(session) => Self {
                username: Some(session.username.clone()),
                is_admin: session.role.satisfies(Role::Admin),
            },
            None => Self::anonymous(),
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub viewer: Viewer,
}

#[derive(Template)]
#[template(path = "page.html")]
pub struct PageTemplate {
    pub viewer: Viewer,
    pub page: RenderedPage,
    /// `page_name` escaped for links back into the wiki.
    pub page_path: String,
}

impl PageTemplate {
    pub fn new(viewer: Viewer, page: RenderedPage) -> Self {
        let page_path = path_segment(&page.page_name);
        Self {
            viewer,
            page,
            page_path,
        }
    }
}

pub struct EditView {
    pub page_name: String,
    pub page_path: String,
    pub title: String,
    pub image_url: String,
    pub source: String,
}

impl EditView {
    pub fn new(page_name: &str, metadata: &PageMetadata, source: String) -> Self {
        Self {
            page_name: page_name.to_string(),
            page_path: path_segment(page_name),
            title: title_from_name(page_name),
            image_url: metadata.image_url.clone(),
            source,
        }
    }

    /// Editor for a page that has no source yet.
    pub fn blank(page_name: &str) -> Self {
        Self::new(page_name, &PageMetadata::default(), String::new())
    }
}

#[derive(Template)]
#[template(path = "edit.html")]
pub struct EditTemplate {
    pub viewer: Viewer,
    pub view: EditView,
}

pub struct LoginView {
    pub failed: bool,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub viewer: Viewer,
    pub view: LoginView,
}

pub struct ErrorPageView {
    pub code: u16,
    pub title: String,
    pub message: String,
}

impl ErrorPageView {
    pub fn new(status: StatusCode, message: &str) -> Self {
        Self {
            code: status.as_u16(),
            title: status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub viewer: Viewer,
    pub view: ErrorPageView,
}
