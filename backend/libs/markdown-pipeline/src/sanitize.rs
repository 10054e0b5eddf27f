//! Allow-list sanitizer configuration.
//!
//! Everything not explicitly listed here is stripped from the rendered HTML:
//! unknown tags disappear (their valid inline text remains), unknown
//! attributes are dropped, and link/image URLs outside http/https/mailto are
//! removed entirely.

use std::collections::{HashMap, HashSet};

const ALLOWED_TAGS: &[&str] = &[
    "a", "abbr", "acronym", "b", "blockquote", "code", "em", "i", "li", "ol", "pre", "strong",
    "ul", "h1", "h2", "h3", "h4", "h5", "h6", "p", "br", "span", "div", "table", "thead", "tbody",
    "tr", "th", "td", "img", "hr", "del", "ins", "sup", "sub",
];

/// Attributes are scoped per element; an attribute allowed on one tag is
/// still stripped from every other tag.
const ALLOWED_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("a", &["href", "title", "rel"]),
    ("abbr", &["title"]),
    ("acronym", &["title"]),
    ("img", &["src", "alt", "title"]),
    ("code", &["class"]),
    ("pre", &["class"]),
    ("div", &["class"]),
    ("span", &["class"]),
    ("td", &["align"]),
    ("th", &["align"]),
];

const ALLOWED_URL_SCHEMES: &[&str] = &["http", "https", "mailto"];

pub(crate) fn build_sanitizer() -> ammonia::Builder<'static> {
    let mut builder = ammonia::Builder::default();

    builder.tags(ALLOWED_TAGS.iter().copied().collect::<HashSet<_>>());

    let attributes: HashMap<&str, HashSet<&str>> = ALLOWED_ATTRIBUTES
        .iter()
        .map(|(tag, attrs)| (*tag, attrs.iter().copied().collect()))
        .collect();
    builder.tag_attributes(attributes);

    builder.generic_attributes(HashSet::new());
    builder.url_schemes(ALLOWED_URL_SCHEMES.iter().copied().collect::<HashSet<_>>());

    // `rel` is author-controlled and allow-listed above, so the automatic
    // rel rewriting must be off (the two settings are mutually exclusive).
    builder.link_rel(None);

    // Strip disallowed tags but keep their inner text.
    builder.clean_content_tags(HashSet::new());

    builder
}
