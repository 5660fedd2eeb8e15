use ammonia::Builder as AmmoniaBuilder;
use comrak::options::Options;

/// GFM-flavoured comrak options for wiki pages.
pub(crate) fn default_options() -> Options<'static> {
    let mut options = Options::default();

    let ext = &mut options.extension;
    ext.strikethrough = true;
    ext.table = true;
    ext.autolink = true;
    ext.tasklist = true;
    ext.footnotes = true;

    let render = &mut options.render;
    render.github_pre_lang = true;
    // Inline HTML from page authors goes through the sanitizer below.
    render.r#unsafe = true;

    options
}

/// Ammonia's default allowlist plus what the comrak extensions above emit.
pub(crate) fn build_page_sanitizer() -> AmmoniaBuilder<'static> {
    let mut builder = AmmoniaBuilder::default();
    builder
        .add_tags(["input", "section"])
        .add_tag_attributes("input", ["type", "checked", "disabled"])
        .add_tag_attributes("pre", ["lang"])
        .add_tag_attributes("th", ["align"])
        .add_tag_attributes("td", ["align"])
        .add_tag_attributes("section", ["data-footnotes"])
        .add_tag_attributes("sup", ["data-footnote-ref"])
        .add_tag_attributes("a", ["data-footnote-ref", "data-footnote-backref"])
        .add_generic_attributes(["id"]);
    builder
}
