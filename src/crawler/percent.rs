//! Progress-percent arithmetic for the recursive crawler (spec.md §4.7,
//! §9 "monotone progress"). Two formulas — one evaluated after each page,
//! one at the close of a level — both rounded to 2dp and clamped so a
//! job's reported `percent` never regresses, matching the invariant in
//! spec.md §3 ("monotone percent").

/// `100 * (current_level + (page_index + 1) / pages_in_level) / max_depth`,
/// rounded to 2 decimal places.
#[must_use]
pub fn page_percent(current_level: u8, page_index: usize, pages_in_level: usize, max_depth: u8) -> f64 {
    if pages_in_level == 0 || max_depth == 0 {
        return 0.0;
    }
    let fraction = f64::from(current_level)
        + (page_index as f64 + 1.0) / pages_in_level as f64;
    round2(100.0 * fraction / f64::from(max_depth))
}

/// `100 * (current_level + 1) / max_depth`, rounded to 2 decimal places.
#[must_use]
pub fn level_percent(current_level: u8, max_depth: u8) -> f64 {
    if max_depth == 0 {
        return 0.0;
    }
    round2(100.0 * f64::from(current_level + 1) / f64::from(max_depth))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Clamps a freshly computed percent so it never drops below the last
/// reported value. The crawler calls this on every progress update rather
/// than trusting the raw formula, since a late-finishing page in a shallow
/// level can otherwise compute a lower fraction than an earlier page in a
/// deeper one.
#[must_use]
pub fn clamp_monotone(previous: f64, candidate: f64) -> f64 {
    candidate.max(previous).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_percent_mid_crawl() {
        // level 1 (0-indexed), page 2 of 4, depth 4: 100*(1 + 2/4)/4 = 37.5
        assert_eq!(page_percent(1, 1, 4, 4), 37.5);
    }

    #[test]
    fn page_percent_first_page_first_level() {
        // level 0, page 1 of 3, depth 3: 100*(0 + 1/3)/3 = 11.11
        assert_eq!(page_percent(0, 0, 3, 3), 11.11);
    }

    #[test]
    fn level_percent_end_of_level() {
        assert_eq!(level_percent(0, 4), 25.0);
        assert_eq!(level_percent(3, 4), 100.0);
    }

    #[test]
    fn clamp_never_regresses() {
        assert_eq!(clamp_monotone(40.0, 35.0), 40.0);
        assert_eq!(clamp_monotone(40.0, 45.0), 45.0);
    }

    #[test]
    fn clamp_never_exceeds_100() {
        assert_eq!(clamp_monotone(99.0, 150.0), 100.0);
    }

    #[test]
    fn zero_pages_in_level_is_zero_not_nan() {
        assert_eq!(page_percent(0, 0, 0, 4), 0.0);
    }
}
