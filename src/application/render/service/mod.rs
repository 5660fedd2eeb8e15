mod config;

use std::sync::Arc;

use comrak::markdown_to_html;
use once_cell::sync::Lazy;

use crate::application::render::types::Renderer;

use config::{build_page_sanitizer, default_options};

/// Comrak-based markdown renderer with Ammonia sanitisation.
pub struct ComrakRenderer {
    options: comrak::Options<'static>,
    sanitizer: ammonia::Builder<'static>,
}

impl ComrakRenderer {
    /// Construct a renderer with the common GFM extensions enabled.
    pub fn new() -> Self {
        Self {
            options: default_options(),
            sanitizer: build_page_sanitizer(),
        }
    }

    /// Render markdown into HTML while skipping the sanitisation stage.
    pub fn render_unsanitized(&self, markdown: &str) -> String {
        markdown_to_html(markdown, &self.options)
    }
}

impl Default for ComrakRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for ComrakRenderer {
    fn render(&self, markdown: &str) -> String {
        let html = self.render_unsanitized(markdown);
        self.sanitizer.clean(&html).to_string()
    }
}

static RENDERER: Lazy<Arc<ComrakRenderer>> = Lazy::new(|| Arc::new(ComrakRenderer::new()));

/// Access the shared renderer instance, initialised on first use.
pub fn default_renderer() -> Arc<ComrakRenderer> {
    Arc::clone(&RENDERER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_headings_and_paragraphs() {
        let html = default_renderer().render("# Title\n\nSome *text*.");
        assert!(html.contains("<h1>Title</h1>"), "{html}");
        assert!(html.contains("<em>text</em>"), "{html}");
    }

    #[test]
    fn strips_script_tags() {
        let html = default_renderer().render("hello <script>alert(1)</script>");
        assert!(!html.contains("<script"), "{html}");
        assert!(html.contains("hello"));
    }

    #[test]
    fn strips_event_handler_attributes() {
        let html = default_renderer().render("<img src=\"/a.png\" onerror=\"alert(1)\">");
        assert!(!html.contains("onerror"), "{html}");
    }

    #[test]
    fn renders_tables() {
        let html = default_renderer().render("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"), "{html}");
        assert!(html.contains("<td>1</td>"), "{html}");
    }

    #[test]
    fn rendering_is_deterministic() {
        let renderer = ComrakRenderer::new();
        let source = "## Notes\n\n- one\n- two\n";
        assert_eq!(renderer.render(source), renderer.render(source));
    }
}
