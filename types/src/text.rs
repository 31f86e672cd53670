//! Small pure text helpers.

/// Truncate a string to a maximum length, adding `...` if needed.
///
/// - Trims surrounding whitespace before truncating.
/// - Uses `char` count (not bytes) to avoid splitting Unicode scalar values.
/// - Enforces a minimum `max` of 3 so the ellipsis fits.
#[must_use]
pub fn truncate_with_ellipsis(raw: &str, max: usize) -> String {
    let max = max.max(3);
    let s = raw.trim();
    if s.chars().count() <= max {
        return s.to_string();
    }
    let head: String = s.chars().take(max - 3).collect();
    format!("{head}...")
}

/// Split `s` into leading whitespace, content, and trailing whitespace.
///
/// Concatenating the three parts always yields `s`. An all-whitespace input
/// comes back entirely as the leading part.
#[must_use]
pub fn split_edge_whitespace(s: &str) -> (&str, &str, &str) {
    let core_start = s.len() - s.trim_start().len();
    let (leading, rest) = s.split_at(core_start);
    let core_len = rest.trim_end().len();
    let (core, trailing) = rest.split_at(core_len);
    (leading, core, trailing)
}

#[cfg(test)]
mod tests {
    use super::{split_edge_whitespace, truncate_with_ellipsis};

    #[test]
    fn truncate_short_string_unchanged() {
        assert_eq!(truncate_with_ellipsis("hello", 10), "hello");
        assert_eq!(truncate_with_ellipsis("hello", 5), "hello");
    }

    #[test]
    fn truncate_adds_ellipsis() {
        assert_eq!(truncate_with_ellipsis("hello world", 8), "hello...");
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_with_ellipsis("héllo wörld", 7), "héll...");
    }

    #[test]
    fn truncate_minimum_budget() {
        assert_eq!(truncate_with_ellipsis("abcdef", 0), "...");
    }

    #[test]
    fn edge_whitespace_parts() {
        assert_eq!(split_edge_whitespace("  hi there \n"), ("  ", "hi there", " \n"));
        assert_eq!(split_edge_whitespace("word"), ("", "word", ""));
        assert_eq!(split_edge_whitespace(" \t "), (" \t ", "", ""));
        assert_eq!(split_edge_whitespace(""), ("", "", ""));
    }
}
