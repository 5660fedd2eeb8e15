//! Front-matter extraction for wiki page sources.
//!
//! A page may start with a TOML block terminated by the first `---` in the
//! file. Everything after the separator is the markdown body. Sources without
//! a separator have no front-matter at all.

use thiserror::Error;

use crate::domain::pages::PageMetadata;

pub const PAGE_META_SEPARATOR: &str = "---";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to decode page front-matter: {message}")]
pub struct MetadataDecodeError {
    pub message: String,
}

/// Split `raw` into metadata and the byte offset where the body starts.
pub fn parse(raw: &str) -> Result<(PageMetadata, usize), MetadataDecodeError> {
    let Some(idx) = raw.find(PAGE_META_SEPARATOR) else {
        return Ok((PageMetadata::default(), 0));
    };

    let metadata = toml::from_str::<PageMetadata>(&raw[..idx]).map_err(|err| {
        MetadataDecodeError {
            message: err.to_string(),
        }
    })?;

    Ok((metadata, idx + PAGE_META_SEPARATOR.len()))
}

/// Parse metadata from raw bytes, treating invalid UTF-8 lossily.
pub fn parse_bytes(raw: &[u8]) -> Result<(PageMetadata, usize), MetadataDecodeError> {
    match std::str::from_utf8(raw) {
        Ok(text) => parse(text),
        Err(_) => {
            let text = String::from_utf8_lossy(raw);
            let (metadata, offset) = parse(&text)?;
            // Offsets only line up with `raw` when the prefix survived intact.
            let offset = if offset == 0 {
                0
            } else {
                byte_offset_in_raw(raw, offset)
            };
            Ok((metadata, offset))
        }
    }
}

fn byte_offset_in_raw(raw: &[u8], lossy_offset: usize) -> usize {
    let separator = PAGE_META_SEPARATOR.as_bytes();
    raw.windows(separator.len())
        .position(|window| window == separator)
        .map(|idx| idx + separator.len())
        .unwrap_or(lossy_offset.min(raw.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_without_separator_is_all_body() {
        let (metadata, offset) = parse("# Heading\n\nNo metadata here.").expect("parse");
        assert_eq!(metadata, PageMetadata::default());
        assert_eq!(offset, 0);
    }

    #[test]
    fn reads_subtitle_and_image_url() {
        let raw = "subtitle = \"Hello\"\nimageURL = \"/static/title.png\"\n---\n# Title\n";
        let (metadata, offset) = parse(raw).expect("parse");

        assert_eq!(metadata.subtitle, "Hello");
        assert_eq!(metadata.image_url, "/static/title.png");
        assert_eq!(&raw[offset..], "\n# Title\n");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let raw = "subtitle = \"s\"\nauthor = \"someone\"\n---\nbody";
        let (metadata, _) = parse(raw).expect("parse");
        assert_eq!(metadata.subtitle, "s");
        assert!(metadata.image_url.is_empty());
    }

    #[test]
    fn empty_front_matter_yields_defaults() {
        let (metadata, offset) = parse("---\nbody").expect("parse");
        assert_eq!(metadata, PageMetadata::default());
        assert_eq!(offset, 3);
    }

    #[test]
    fn malformed_front_matter_is_an_error() {
        let err = parse("subtitle = \n---\nbody").expect_err("malformed toml");
        assert!(err.to_string().contains("front-matter"));
    }

    #[test]
    fn wrong_value_type_is_an_error() {
        assert!(parse("subtitle = 42\n---\nbody").is_err());
    }

    #[test]
    fn only_first_separator_counts() {
        let raw = "subtitle = \"a\"\n---\nintro\n---\nmore";
        let (_, offset) = parse(raw).expect("parse");
        assert_eq!(&raw[offset..], "\nintro\n---\nmore");
    }

    #[test]
    fn bytes_with_invalid_utf8_in_body_keep_raw_offset() {
        let mut raw = b"subtitle = \"a\"\n---\n".to_vec();
        raw.extend_from_slice(&[0xff, b'x']);
        let (metadata, offset) = parse_bytes(&raw).expect("parse");
        assert_eq!(metadata.subtitle, "a");
        assert_eq!(&raw[offset..], &[b'\n', 0xff, b'x']);
    }
}
