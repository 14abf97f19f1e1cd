//! Descending key generation
//!
//! Deta Base returns items in ascending key order and cannot sort, so new
//! keys count down from `Number.MAX_SAFE_INTEGER`: the newest record is the
//! first one a query returns. A key is the current smallest key minus a small
//! random jitter, or the time-derived seed for an empty base.

use rand::Rng;

/// Largest integer exactly representable as an IEEE-754 double
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// Upper bound of the random step between consecutive keys
pub const MAX_JITTER: i64 = 100;

/// Lower bound of the step; a new key never equals the current minimum
pub const MIN_JITTER: i64 = 1;

/// Key to insert below `current_min`
///
/// `current_min` is parsed by its leading decimal digits; a base with no
/// parseable key, or one too small to step below, is seeded from
/// `now_millis`.
pub fn derive_key(current_min: Option<&str>, jitter: i64, now_millis: i64) -> String {
    let seed = MAX_SAFE_INTEGER - now_millis;
    current_min
        .and_then(leading_integer)
        .and_then(|min| min.checked_sub(jitter))
        .unwrap_or(seed - jitter)
        .to_string()
}

/// Random step in `MIN_JITTER..=MAX_JITTER`
pub fn next_jitter() -> i64 {
    rand::thread_rng().gen_range(MIN_JITTER..=MAX_JITTER)
}

/// Current time in milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn leading_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim_start();
    let (sign, digits) = match raw.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_empty_base_seeds_from_time() {
        let now = 1_700_000_000_000;
        assert_eq!(
            derive_key(None, 0, now),
            (MAX_SAFE_INTEGER - now).to_string()
        );
    }

    #[test]
    fn test_key_steps_below_current_min() {
        assert_eq!(derive_key(Some("9007197554740991"), 42, 0), "9007197554740949");
    }

    #[test_case("123abc", Some(123) ; "trailing garbage")]
    #[test_case("  77", Some(77) ; "leading whitespace")]
    #[test_case("-5", Some(-5) ; "negative")]
    #[test_case("abc", None ; "no digits")]
    #[test_case("", None ; "empty")]
    fn test_leading_integer(raw: &str, expected: Option<i64>) {
        assert_eq!(leading_integer(raw), expected);
    }

    #[test]
    fn test_unparseable_min_falls_back_to_seed() {
        assert_eq!(derive_key(Some("abc"), 1, 10), (MAX_SAFE_INTEGER - 11).to_string());
    }

    #[test]
    fn test_min_near_i64_floor_falls_back_to_seed() {
        assert_eq!(
            derive_key(Some("-9223372036854775807"), 5, 10),
            (MAX_SAFE_INTEGER - 15).to_string()
        );
    }

    #[test]
    fn test_jitter_in_range() {
        for _ in 0..200 {
            let jitter = next_jitter();
            assert!((MIN_JITTER..=MAX_JITTER).contains(&jitter));
        }
    }

    #[test]
    fn test_successive_keys_sort_first() {
        let first = derive_key(None, 10, now_millis());
        let second = derive_key(Some(&first), next_jitter(), 0);
        assert!(second < first);
    }
}
