//! Small helpers shared by the page modules.

pub mod lenient;

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Datelike, Days, NaiveDate, Utc};
use rand::Rng;

static LAST_ID: AtomicU64 = AtomicU64::new(0);

/// Millisecond timestamp id, strictly increasing within the process.
pub fn next_timestamp_id() -> u64 {
    let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
    let mut last = LAST_ID.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_ID.compare_exchange_weak(last, candidate, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return candidate,
            Err(observed) => last = observed,
        }
    }
}

/// `MEM` followed by three random digits.
pub fn generate_membership_id() -> String {
    format!("MEM{:03}", rand::rng().random_range(0..1000))
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn current_year() -> i32 {
    Utc::now().year()
}

/// Due date of a loan starting on `from`.
pub fn due_date(from: NaiveDate, period_days: u32) -> NaiveDate {
    from.checked_add_days(Days::new(u64::from(period_days)))
        .unwrap_or(NaiveDate::MAX)
}

/// Case-insensitive substring match of `needle` against any of `fields`. An empty needle matches.
pub fn matches_search<'a>(needle: &str, fields: impl IntoIterator<Item = &'a str>) -> bool {
    let needle = needle.to_lowercase();
    needle.is_empty()
        || fields
            .into_iter()
            .any(|field| field.to_lowercase().contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_ids_never_repeat() {
        let ids: Vec<u64> = (0..1000).map(|_| next_timestamp_id()).collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn membership_ids_have_fixed_shape() {
        let id = generate_membership_id();
        assert_eq!(id.len(), 6);
        assert!(id.starts_with("MEM"));
        assert!(id[3..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn loans_are_due_after_the_period() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 25).unwrap();
        assert_eq!(due_date(start, 14), NaiveDate::from_ymd_opt(2024, 4, 8).unwrap());
        assert_eq!(due_date(start, 0), start);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        assert!(matches_search("gats", ["The Great Gatsby", "Fitzgerald"]));
        assert!(matches_search("FITZ", ["The Great Gatsby", "F. Scott Fitzgerald"]));
        assert!(matches_search("", ["anything"]));
        // whitespace is matched literally
        assert!(matches_search("great g", ["The Great Gatsby"]));
        assert!(!matches_search(" ", ["1984", "Orwell"]));
        assert!(!matches_search("tolkien", ["1984", "George Orwell"]));
    }
}
