use once_cell::sync::Lazy;
use regex::Regex;

static DIGITS_DOTS_STARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9.*]").unwrap());
static BRACKETS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\(\)\[\]]").unwrap());

/// Normalize a `group` label: drop digits, `.` and `*`, then any of `()[]`, then trim.
pub fn clean_group(raw: &str) -> String {
    let clean = DIGITS_DOTS_STARS.replace_all(raw, "");
    let clean = BRACKETS.replace_all(&clean, "");
    clean.trim().to_string()
}
