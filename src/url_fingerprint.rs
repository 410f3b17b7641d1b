//! URL canonicalization and fingerprinting (C1).
//!
//! Canonicalization strips the parts of a URL that do not change the
//! resource being addressed (fragment, tracking params, case of the host,
//! a trailing slash on a non-root path) while leaving everything else
//! untouched, so two visually different URLs for the same page collide on
//! the same fingerprint.

use sha2::{Digest, Sha256};
use url::Url;

const TRACKING_PARAM_PREFIX: &str = "utm_";

const TRACKING_PARAMS_EXACT: &[&str] = &[
    "ref",
    "referrer",
    "session",
    "fbclid",
    "gclid",
    "yclid",
    "mc_cid",
    "mc_eid",
];

/// Canonicalizes a URL per the rules above. Malformed input is returned
/// unchanged rather than causing a panic or error: the caller still needs a
/// string to fingerprint even when the URL can't be parsed.
#[must_use]
pub fn canonicalize(input: &str) -> String {
    let Ok(mut url) = Url::parse(input) else {
        return input.to_string();
    };

    url.set_fragment(None);

    if let Some(host) = url.host_str() {
        let lower = host.to_lowercase();
        if lower != host {
            // set_host validates and re-serializes; ignore failure and keep original host.
            let _ = url.set_host(Some(&lower));
        }
    }

    let kept_pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept_pairs.is_empty() {
        url.set_query(None);
    } else {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in &kept_pairs {
            serializer.append_pair(k, v);
        }
        url.set_query(Some(&serializer.finish()));
    }

    let path = url.path();
    if path.is_empty() {
        url.set_path("/");
    } else if path != "/" && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    url.to_string()
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with(TRACKING_PARAM_PREFIX) || TRACKING_PARAMS_EXACT.contains(&key)
}

/// Derives the result/job fingerprint from a canonicalized URL. The
/// fingerprint is a stable hex digest over the canonicalized UTF-8 bytes, so
/// the same resource always produces the same fingerprint regardless of how
/// the seed URL was spelled by the caller.
#[must_use]
pub fn fingerprint(url: &str) -> String {
    let canonical = canonicalize(url);
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}
