//! Result presentation projections (SPEC_FULL.md §2 supplement): `CrawlResult`
//! to structured JSON and to a consolidated Markdown document. PDF/DOCX/
//! "manual" generation is explicitly out of scope (spec.md §1) and is not
//! stubbed here; callers needing those formats feed the JSON projection to
//! the external manual generator.

use serde_json::Value;

use crate::crawler::types::CrawlResult;

/// Structured JSON projection: just the result as-is, serde-derived.
/// Kept as a named function (rather than requiring callers to reach for
/// `serde_json::to_value` directly) so the seam documented in
/// SPEC_FULL.md has one call site to evolve if the wire shape ever
/// diverges from the storage shape.
pub fn to_json(result: &CrawlResult) -> Value {
    serde_json::to_value(result).unwrap_or(Value::Null)
}

/// Consolidated Markdown projection: one heading per level, one
/// sub-heading per page, with the page's already-converted
/// `readable_html` (itself Markdown, see `crawler::markdown`) inlined.
pub fn to_markdown(result: &CrawlResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", result.seed_url));
    out.push_str(&format!(
        "*{} pages across {} levels, crawled {}*\n\n",
        result.total_pages,
        result.levels.len(),
        result.timestamp.to_rfc3339()
    ));

    for level in &result.levels {
        out.push_str(&format!("## Level {}\n\n", level.level_number));
        for page in &level.pages {
            out.push_str(&format!("### {}\n\n", if page.title.is_empty() { &page.url } else { &page.title }));
            out.push_str(&format!("[{}]({})\n\n", page.url, page.url));
            if let Some(byline) = &page.byline {
                out.push_str(&format!("*{byline}*\n\n"));
            }
            out.push_str(&page.readable_html);
            out.push_str("\n\n");
        }
    }

    out.trim_end().to_string()
}
