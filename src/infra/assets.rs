//! Stylesheets and images compiled into the binary from `static/`.

use axum::{
    extract::Path,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use include_dir::{Dir, File, include_dir};

use crate::application::error::ErrorReport;

static STATIC_ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static");

const SOURCE: &str = "infra::assets::serve_assets";

/// `GET /static/{*path}`.
pub async fn serve_assets(path: Option<Path<String>>) -> Response {
    let requested = path.map(|Path(value)| value).unwrap_or_default();
    match lookup(&STATIC_ASSETS, &requested) {
        Ok(Some(file)) => asset_response(file),
        Ok(None) => rejection(StatusCode::NOT_FOUND, "Static asset not found"),
        Err(status) => rejection(status, "Static asset request rejected"),
    }
}

fn lookup(
    bundle: &'static Dir<'static>,
    requested: &str,
) -> Result<Option<&'static File<'static>>, StatusCode> {
    let candidate = requested.trim_start_matches('/');

    if candidate.contains('\\') || candidate.contains('\0') {
        return Err(StatusCode::BAD_REQUEST);
    }
    // No traversal, no directory listings.
    if candidate.is_empty()
        || candidate.ends_with('/')
        || candidate.split('/').any(|segment| segment == "..")
    {
        return Ok(None);
    }

    Ok(bundle.get_file(candidate))
}

fn asset_response(file: &'static File<'static>) -> Response {
    let mime = mime_guess::from_path(file.path()).first_or_octet_stream();
    let mut response = Bytes::from_static(file.contents()).into_response();

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=3600"),
    );
    response
}

fn rejection(status: StatusCode, message: &'static str) -> Response {
    let mut response = status.into_response();
    ErrorReport::from_message(SOURCE, status, message).attach(&mut response);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_bundled_stylesheet() {
        let file = lookup(&STATIC_ASSETS, "wiki.css")
            .expect("accepted")
            .expect("present");
        assert!(!file.contents().is_empty());
    }

    #[test]
    fn stylesheet_is_served_as_css() {
        let file = lookup(&STATIC_ASSETS, "/wiki.css")
            .expect("accepted")
            .expect("present");
        let response = asset_response(file);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE),
            Some(&HeaderValue::from_static("text/css"))
        );
    }

    #[test]
    fn traversal_and_directories_are_not_served() {
        assert!(lookup(&STATIC_ASSETS, "../Cargo.toml").expect("ok").is_none());
        assert!(lookup(&STATIC_ASSETS, "").expect("ok").is_none());
        assert!(lookup(&STATIC_ASSETS, "css/").expect("ok").is_none());
        assert_eq!(
            lookup(&STATIC_ASSETS, "a\\b").expect_err("rejected"),
            StatusCode::BAD_REQUEST
        );
    }
}
