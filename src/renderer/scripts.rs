//! In-browser scripts: the `Readability` init-script library and the
//! extractors evaluated by the renderer (C2).
//!
//! These strings are opaque to the engine: they run inside the page and
//! return a JSON-serializable record or a `{ "err": "..." }` object on soft
//! failure. The engine never parses their bodies, only their JSON output.

/// Defines the `Readability` global that `READABILITY_EXTRACTOR` calls.
///
/// No Mozilla Readability.js source ships in this crate's dependency tree
/// (it is a browser-side library, not a Rust crate), so this is a compact,
/// self-contained content-scoring implementation: it walks candidate block
/// elements, scores them by text length and comma density (a cheap proxy for
/// prose vs. boilerplate), and returns the highest-scoring element among the
/// top `nbTopCandidates` as the article body. Loaded as an `init_scripts`
/// entry so the global exists before the page's own scripts run.
pub const READABILITY_LIBRARY: &str = r#"
    class Readability {
        constructor(doc, options = {}) {
            this.doc = doc;
            this.maxElemsToParse = options.maxElemsToParse || 0;
            this.nbTopCandidates = options.nbTopCandidates || 5;
            this.charThreshold = options.charThreshold || 500;
        }

        _score(el) {
            const text = (el.textContent || "").trim();
            if (text.length < 25) return null;
            const commas = (text.match(/,/g) || []).length;
            const score = Math.min(Math.floor(text.length / 100), 40) + commas;
            return { el, text, score };
        }

        parse() {
            const candidates = Array.from(
                this.doc.querySelectorAll("article, section, div, p")
            );
            if (this.maxElemsToParse > 0 && candidates.length > this.maxElemsToParse) {
                return null;
            }

            const scored = candidates
                .map((el) => this._score(el))
                .filter(Boolean)
                .sort((a, b) => b.score - a.score)
                .slice(0, this.nbTopCandidates);

            if (scored.length === 0) return null;

            const best = scored.reduce((a, b) => (b.text.length > a.text.length ? b : a));
            if (best.text.length < this.charThreshold) return null;

            const titleEl = this.doc.querySelector("h1") || this.doc.querySelector("title");
            const bylineEl = this.doc.querySelector(
                '[rel="author"], .author, .byline, [itemprop="author"]'
            );

            return {
                title: titleEl ? titleEl.textContent.trim() : "",
                content: best.el.innerHTML,
                textContent: best.text,
                byline: bylineEl ? bylineEl.textContent.trim() : null,
                excerpt: best.text.slice(0, 200),
                length: best.text.length,
            };
        }
    }
"#;

/// Extracts readable article content: title, byline, excerpt, language,
/// plain text, and the readable HTML subset, or `{ err }` if extraction
/// yields nothing usable. Requires the `Readability` global from
/// `READABILITY_LIBRARY` to already be defined in the page.
pub const READABILITY_EXTRACTOR: &str = r#"
    (() => {
        try {
            const clone = document.cloneNode(true);
            const article = new Readability(clone, {
                maxElemsToParse: __MAX_ELEMS__,
                nbTopCandidates: __TOP_CANDIDATES__,
                charThreshold: __CHAR_THRESHOLD__,
            }).parse();

            if (!article || !article.content) {
                return { err: "readability produced no content" };
            }

            return {
                title: article.title || document.title || "",
                html: article.content,
                text: article.textContent || "",
                byline: article.byline || null,
                excerpt: article.excerpt || null,
                language: document.documentElement.lang || null,
                length: article.length || 0,
            };
        } catch (e) {
            return { err: String(e) };
        }
    })()
"#;

/// Extracts every anchor's absolute href and visible text.
pub const LINK_EXTRACTOR: &str = r#"
    (() => {
        try {
            return Array.from(document.querySelectorAll('a[href]')).map(a => ({
                url: a.href,
                text: (a.textContent || "").trim(),
            }));
        } catch (e) {
            return { err: String(e) };
        }
    })()
"#;

/// Fills in the numeric readability tuning knobs before the script is sent
/// to the renderer, matching the teacher's evaluate-constant-script pattern
/// in `page_extractor::extractors` (scripts are plain `const` strings with
/// no templating there; this extractor needs per-request parameters, so a
/// simple placeholder substitution stands in for a real JS template engine).
#[must_use]
pub fn readability_extractor_for(
    max_elements: usize,
    top_candidates: usize,
    char_threshold: usize,
) -> String {
    READABILITY_EXTRACTOR
        .replace("__MAX_ELEMS__", &max_elements.to_string())
        .replace("__TOP_CANDIDATES__", &top_candidates.to_string())
        .replace("__CHAR_THRESHOLD__", &char_threshold.to_string())
}
