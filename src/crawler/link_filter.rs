//! Link validity filtering for the recursive crawler, grounded on
//! `crawl_engine::crawler::should_visit_url` — generalized from a
//! path-scoped allowlist to the spec's registered-domain + substring-skip
//! rules (spec.md §4.7).

use url::Url;

use crate::config::CrawlConfig;

const SKIP_SUBSTRINGS: &[&str] = &[
    "login", "logout", "register", "signup", "admin", "api", "ajax", "feed", "rss",
];

const SKIP_EXTENSIONS: &[&str] = &[
    ".pdf", ".doc", ".docx", ".zip", ".exe", ".dmg",
];

/// Returns `true` when `link` should be queued for crawling. `source` is the
/// page the link was discovered on (used to reject pure same-page fragment
/// links); `seed` is the crawl's starting URL (used for the same-domain
/// restriction).
#[must_use]
pub fn should_visit_url(link: &str, source: &Url, seed: &Url, config: &CrawlConfig) -> bool {
    let Ok(parsed) = Url::parse(link) else {
        return false;
    };

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return false;
    }

    if parsed.fragment().is_some()
        && parsed.path() == source.path()
        && parsed.query() == source.query()
        && parsed.host_str() == source.host_str()
    {
        // pure fragment on the same resource, not a new page
        return false;
    }

    if config.same_domain_only() {
        let link_host = parsed.host_str().unwrap_or_default();
        let seed_host = seed.host_str().unwrap_or_default();
        if !same_registered_domain(link_host, seed_host) {
            return false;
        }
    }

    let lower_path = parsed.path().to_lowercase();
    if SKIP_EXTENSIONS.iter().any(|ext| lower_path.ends_with(ext)) {
        return false;
    }

    let lower_full = link.to_lowercase();
    if SKIP_SUBSTRINGS.iter().any(|needle| lower_full.contains(needle)) {
        return false;
    }

    for pattern in config.exclude_substrings() {
        if link.contains(pattern.as_str()) {
            return false;
        }
    }

    for regex in &config.excluded_patterns_compiled {
        if regex.is_match(link) {
            return false;
        }
    }

    true
}

/// Compares two hosts for same-registered-domain purposes. This crate has
/// no public-suffix-list dependency (none of the examples carry one), so the
/// comparison is exact-host-match, the same behavior the teacher's own
/// `should_visit_url` uses ("Host must match exactly").
fn same_registered_domain(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
