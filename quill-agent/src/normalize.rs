//! Numeric format normalization for incoming queries.

use std::sync::OnceLock;

use regex::Regex;

fn decimal_comma() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d),(\d)").expect("valid regex"))
}

fn dotted_thousands() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d{1,3}(?:\.\d{3})+\b").expect("valid regex"))
}

/// Rewrite ambiguous numeric formats before the query enters the
/// reasoning loop.
///
/// Commas between digits become decimal points (`3,14` → `3.14`), and
/// dotted thousand groupings collapse into plain integers (`12.345.678`
/// → `12345678`). Runs once per query, never per tool call.
pub fn normalize_numbers(query: &str) -> String {
    // The comma rewrite is repeated to a fixpoint: the regex engine
    // cannot express a lookbehind, and a single pass leaves every other
    // comma in runs like `1,2,3` untouched.
    let mut decimals_fixed = query.to_string();
    loop {
        let next = decimal_comma()
            .replace_all(&decimals_fixed, "$1.$2")
            .into_owned();
        if next == decimals_fixed {
            break;
        }
        decimals_fixed = next;
    }

    dotted_thousands()
        .replace_all(&decimals_fixed, |caps: &regex::Captures<'_>| {
            caps[0].replace('.', "")
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_thousands_collapse() {
        assert_eq!(normalize_numbers("5.000"), "5000");
        assert_eq!(normalize_numbers("12.345.678"), "12345678");
    }

    #[test]
    fn decimal_comma_becomes_period() {
        assert_eq!(normalize_numbers("3,14"), "3.14");
    }

    #[test]
    fn plain_numbers_unchanged() {
        assert_eq!(normalize_numbers("42"), "42");
        assert_eq!(normalize_numbers("3.14"), "3.14");
    }

    #[test]
    fn surrounding_text_is_preserved() {
        assert_eq!(
            normalize_numbers("divide 5.000 by 3,14 please"),
            "divide 5000 by 3.14 please"
        );
    }

    #[test]
    fn four_digit_groups_are_not_thousands() {
        // 12.3456 is not a 3-digit grouping; leave it alone.
        assert_eq!(normalize_numbers("12.3456"), "12.3456");
    }

    #[test]
    fn consecutive_commas_normalize() {
        assert_eq!(normalize_numbers("1,2,3"), "1.2.3");
    }
}
