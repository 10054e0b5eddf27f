//! Markdown rendering pipeline for user-supplied content.
//!
//! Converts untrusted Markdown into HTML that is safe to embed directly in a
//! page: the dialect supports fenced code blocks, tables, strikethrough and
//! newline-as-break, and the generated HTML is passed through an allow-list
//! sanitizer before it leaves this crate.
//!
//! The entry point is [`render`]; everything else is plumbing around it.

use once_cell::sync::Lazy;
use pulldown_cmark::{html, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

mod sanitize;

use sanitize::build_sanitizer;

static SANITIZER: Lazy<ammonia::Builder<'static>> = Lazy::new(build_sanitizer);

/// Render untrusted Markdown into sanitized HTML.
///
/// Pure and deterministic: the same input always produces byte-identical
/// output, and no input can make this function fail. Empty or blank input
/// renders to an empty string.
pub fn render(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }
    let html = markdown_to_html(raw);
    SANITIZER.clean(&html).to_string()
}

/// First stage: Markdown -> HTML, before sanitization.
fn markdown_to_html(raw: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let events = Parser::new_ext(raw, options).map(|event| match event {
        // Single newlines inside a paragraph become <br>, matching how
        // authors expect plain-text line breaks to behave in posts.
        Event::SoftBreak => Event::HardBreak,
        other => rewrite_code_block(other),
    });

    let mut out = String::with_capacity(raw.len() * 2);
    html::push_html(&mut out, events);
    out
}

/// Rewrite code-block delimiters so fenced blocks carry the `highlight`
/// wrapper and a `language-*` class that client-side highlighters hook into.
fn rewrite_code_block(event: Event<'_>) -> Event<'_> {
    match event {
        Event::Start(Tag::CodeBlock(kind)) => {
            let open = match kind {
                CodeBlockKind::Fenced(info) => match code_language(&info) {
                    Some(lang) => format!(
                        "<div class=\"highlight\"><pre><code class=\"language-{lang}\">"
                    ),
                    None => "<div class=\"highlight\"><pre><code>".to_string(),
                },
                CodeBlockKind::Indented => "<div class=\"highlight\"><pre><code>".to_string(),
            };
            Event::Html(open.into())
        }
        Event::End(TagEnd::CodeBlock) => Event::Html("</code></pre></div>".into()),
        other => other,
    }
}

/// Extract a usable language token from a fence info string. Anything that
/// could not be a class name fragment is dropped rather than escaped.
fn code_language(info: &str) -> Option<String> {
    let token = info.split_whitespace().next()?;
    let lang: String = token
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '#' | '_' | '.'))
        .collect();
    if lang.is_empty() {
        None
    } else {
        Some(lang)
    }
}
