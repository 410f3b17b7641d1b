//! Deterministic HTML -> Markdown conversion for stored page records
//! (spec.md §4.7). The teacher's `markdown_converter` subtree is a large
//! `htmd`-based pipeline with language inference and table reconstruction;
//! this is the narrower, fixed tag mapping the spec calls for, walked
//! directly over `scraper`'s DOM the way `link_rewriter::rewrite_links_in_html`
//! walks it for link rewriting.

use scraper::node::Node;
use scraper::{ElementRef, Html};

const STRIPPED_ENTIRELY: &[&str] = &["script", "style", "noscript", "template"];

/// Converts `html` (assumed already readability-extracted content) into
/// Markdown using a fixed tag mapping. Unknown/unhandled tags are unwrapped
/// (children kept, tag dropped) rather than stripped, so running text never
/// disappears because of an unrecognized wrapper element.
#[must_use]
pub fn html_to_markdown(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut buffer = String::new();
    walk_children(document.root_element(), &mut buffer);
    collapse_whitespace(&buffer)
}

fn walk_children(element: ElementRef, buffer: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => buffer.push_str(text),
            Node::Element(_) => {
                if let Some(child_elem) = ElementRef::wrap(child) {
                    walk_element(child_elem, buffer);
                }
            }
            _ => {}
        }
    }
}

fn walk_element(element: ElementRef, buffer: &mut String) {
    let tag = element.value().name();

    if STRIPPED_ENTIRELY.contains(&tag) {
        return;
    }

    match tag {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = tag.as_bytes()[1] - b'0';
            buffer.push('\n');
            buffer.push_str(&"#".repeat(level as usize));
            buffer.push(' ');
            walk_children(element, buffer);
            buffer.push_str("\n\n");
        }
        "p" | "div" => {
            walk_children(element, buffer);
            buffer.push_str("\n\n");
        }
        "span" => walk_children(element, buffer),
        "br" => buffer.push_str("  \n"),
        "a" => {
            let href = element.value().attr("href").unwrap_or("");
            buffer.push('[');
            walk_children(element, buffer);
            buffer.push_str("](");
            buffer.push_str(href);
            buffer.push(')');
        }
        "img" => {
            let src = element.value().attr("src").unwrap_or("");
            let alt = element.value().attr("alt").unwrap_or("");
            buffer.push_str("![");
            buffer.push_str(alt);
            buffer.push_str("](");
            buffer.push_str(src);
            buffer.push(')');
        }
        "strong" | "b" => {
            buffer.push_str("**");
            walk_children(element, buffer);
            buffer.push_str("**");
        }
        "em" | "i" => {
            buffer.push('*');
            walk_children(element, buffer);
            buffer.push('*');
        }
        "code" => {
            buffer.push('`');
            walk_children(element, buffer);
            buffer.push('`');
        }
        "pre" => {
            buffer.push_str("\n```\n");
            // pre content is emitted verbatim, not re-wrapped in `code` marks
            for child in element.children() {
                if let Node::Text(text) = child.value() {
                    buffer.push_str(text);
                } else if let Some(child_elem) = ElementRef::wrap(child) {
                    walk_children(child_elem, buffer);
                }
            }
            buffer.push_str("\n```\n\n");
        }
        "ul" | "ol" => {
            buffer.push('\n');
            walk_list(element, buffer, tag == "ol");
            buffer.push('\n');
        }
        "blockquote" => {
            let mut inner = String::new();
            walk_children(element, &mut inner);
            for line in inner.trim().lines() {
                buffer.push_str("> ");
                buffer.push_str(line);
                buffer.push('\n');
            }
            buffer.push('\n');
        }
        // unhandled element: keep content, drop the tag
        _ => walk_children(element, buffer),
    }
}

fn walk_list(list: ElementRef, buffer: &mut String, ordered: bool) {
    let mut index = 0usize;
    for child in list.children() {
        let Node::Element(_) = child.value() else {
            continue;
        };
        let Some(item) = ElementRef::wrap(child) else {
            continue;
        };
        if item.value().name() != "li" {
            continue;
        }
        index += 1;
        if ordered {
            buffer.push_str(&format!("{index}. "));
        } else {
            buffer.push_str("- ");
        }
        walk_children(item, buffer);
        if !buffer.ends_with('\n') {
            buffer.push('\n');
        }
    }
}

/// Decodes leftover HTML whitespace runs and collapses 3+ blank lines down
/// to a single blank line, matching spec.md's "entities decoded and
/// whitespace collapsed post-conversion".
fn collapse_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut blank_run = 0;
    for line in input.lines() {
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            blank_run += 1;
            if blank_run <= 1 {
                out.push('\n');
            }
        } else {
            blank_run = 0;
            out.push_str(trimmed);
            out.push('\n');
        }
    }
    out.trim().to_string()
}
