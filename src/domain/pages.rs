//! Wiki page identity and the immutable values produced for display.

use std::fmt;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bytes escaped when a page name is placed in a URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Logical name of a wiki page, taken from the last URL path segment.
///
/// Names map 1:1 onto `<pages_dir>/<name>.md`. They are case-sensitive and
/// otherwise used verbatim, except that anything which could escape the page
/// directory is refused up front.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageName(String);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageNameError {
    #[error("page name is empty")]
    Empty,
    #[error("page name contains a path separator")]
    Separator,
    #[error("page name contains a NUL byte")]
    NulByte,
    #[error("page name `{0}` is a relative path component")]
    Traversal(String),
}

impl PageName {
    pub fn new(value: impl Into<String>) -> Result<Self, PageNameError> {
        let raw = value.into();
        if raw.is_empty() {
            return Err(PageNameError::Empty);
        }
        if raw.contains('\0') {
            return Err(PageNameError::NulByte);
        }
        if raw.contains('/') || raw.contains('\\') {
            return Err(PageNameError::Separator);
        }
        if raw == "." || raw == ".." {
            return Err(PageNameError::Traversal(raw));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-readable title: every `-` becomes a space.
    pub fn title(&self) -> String {
        title_from_name(&self.0)
    }

    /// The name escaped for use as one URL path segment.
    pub fn path_segment(&self) -> String {
        path_segment(&self.0)
    }
}

pub fn path_segment(name: &str) -> String {
    utf8_percent_encode(name, PATH_SEGMENT).to_string()
}

impl fmt::Display for PageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub fn title_from_name(name: &str) -> String {
    name.replace('-', " ")
}

/// Structured fields read from a page's front-matter block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageMetadata {
    #[serde(alias = "Subtitle")]
    pub subtitle: String,
    #[serde(rename = "imageURL", alias = "ImageURL", alias = "image_url")]
    pub image_url: String,
}

/// Display-ready page. Built once per render and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedPage {
    pub title: String,
    pub subtitle: String,
    pub title_image: String,
    pub page_name: String,
    pub contents_html: String,
}

impl RenderedPage {
    pub fn new(name: &PageName, metadata: &PageMetadata, contents_html: String) -> Self {
        Self {
            title: name.title(),
            subtitle: metadata.subtitle.clone(),
            title_image: metadata.image_url.clone(),
            page_name: name.as_str().to_string(),
            contents_html,
        }
    }

    /// Same page with the title recomputed from `name`.
    pub fn with_title_from(self, name: &PageName) -> Self {
        Self {
            title: name.title(),
            ..self
        }
    }
}
