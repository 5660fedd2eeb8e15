//! Markdown rendering.
//!
//! The pipeline is pure: it accepts markdown and produces deterministic,
//! sanitised HTML. Caching decisions live in [`crate::cache`].

mod service;
mod types;

pub use service::{ComrakRenderer, default_renderer};
pub use types::Renderer;
