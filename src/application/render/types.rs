/// Markdown-to-HTML conversion used by the page cache.
///
/// Implementations must be pure and deterministic: the same markdown always
/// produces the same HTML, with no side effects. Output is trusted as safe to
/// embed in page templates.
pub trait Renderer: Send + Sync {
    fn render(&self, markdown: &str) -> String;
}
