use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    application::{auth::AuthError, repos::StoreError},
    cache::PageError,
    config::LoadError,
    domain::pages::PageNameError,
    infra::error::InfraError,
};

/// Diagnostic detail carried on a response for the logging middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// Error with a fixed public message and a private report.
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            status,
            public_message,
            report: ErrorReport::from_message(source, status, detail),
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        Self {
            status,
            public_message,
            report: ErrorReport::from_error(source, status, error),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn public_message(&self) -> &'static str {
        self.public_message
    }

    pub fn into_report(self) -> ErrorReport {
        self.report
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.public_message).into_response();
        self.report.attach(&mut response);
        response
    }
}

const PAGE_ERROR_SOURCE: &str = "application::error::page_error_to_http_error";

impl From<PageError> for HttpError {
    fn from(error: PageError) -> Self {
        match &error {
            PageError::NotFound { .. } | PageError::PageRemoved { .. } => HttpError::from_error(
                PAGE_ERROR_SOURCE,
                StatusCode::NOT_FOUND,
                "Page not found",
                &error,
            ),
            PageError::Metadata(_) => HttpError::from_error(
                PAGE_ERROR_SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Page could not be loaded",
                &error,
            ),
            PageError::Store(_) => HttpError::from_error(
                PAGE_ERROR_SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Page storage failure",
                &error,
            ),
        }
    }
}

impl From<PageNameError> for HttpError {
    fn from(error: PageNameError) -> Self {
        HttpError::from_error(
            "application::error::page_name_to_http_error",
            StatusCode::NOT_FOUND,
            "Page not found",
            &error,
        )
    }
}

/// Failure that ends the process, reported once by `main`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("server error: {0}")]
    Server(String),
}
