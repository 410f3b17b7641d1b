//! Server-side social preview metadata extraction (spec.md §3), grounded on
//! `examples/original_source/app/internal/util.py::social_meta_tags`: the
//! already-fetched page HTML is parsed once with `scraper`, the same crate
//! the teacher uses for DOM queries elsewhere, rather than spending a second
//! in-browser navigation on it.

use scraper::{Html, Selector};

use super::types::SocialMeta;

/// Parses `og:*` and `twitter:*` `<meta>` tags out of `html` into their
/// respective sub-maps with the prefix stripped from each key. CSS
/// attribute-prefix selectors (`[property^="og:"]`) are not used here: this
/// crate's `scraper`/`selectors` pairing leaves that syntax unconfirmed, so
/// every `meta[property]`/`meta[name]` tag is inspected and classified in
/// Rust instead.
#[must_use]
pub fn extract_social_meta(html: &str) -> SocialMeta {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(r#"meta[property], meta[name]"#) else {
        return SocialMeta::default();
    };

    let mut meta = SocialMeta::default();
    for tag in document.select(&selector) {
        let key = tag
            .value()
            .attr("property")
            .or_else(|| tag.value().attr("name"));
        let Some(content) = tag.value().attr("content") else {
            continue;
        };
        let Some(key) = key else {
            continue;
        };

        if let Some(stripped) = key.strip_prefix("og:") {
            meta.og.insert(stripped.to_string(), content.to_string());
        } else if let Some(stripped) = key.strip_prefix("twitter:") {
            meta.twitter.insert(stripped.to_string(), content.to_string());
        }
    }

    meta
}
