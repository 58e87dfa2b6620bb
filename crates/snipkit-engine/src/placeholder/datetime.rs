use chrono::{Datelike, NaiveDateTime, Timelike};

pub const DEFAULT_DATE_FORMAT: &str = "YYYY-MM-DD";
pub const DEFAULT_TIME_FORMAT: &str = "HH:mm";
pub const DEFAULT_DATETIME_FORMAT: &str = "YYYY-MM-DD HH:mm";

/// Format tokens, longest first so `YYYY` wins over `YY` and `MM` over `M`.
const TOKENS: [&str; 16] = [
    "YYYY", "YY", "MM", "DD", "HH", "hh", "mm", "ss", "M", "D", "H", "h", "m", "s", "A", "a",
];

/// Renders `now` using the placeholder date format language.
///
/// Characters that are not part of a token are copied through unchanged.
pub fn format_datetime(now: &NaiveDateTime, pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut rest = pattern;

    while let Some(ch) = rest.chars().next() {
        match TOKENS.iter().find(|token| rest.starts_with(*token)) {
            Some(token) => {
                out.push_str(&token_value(now, token));
                rest = &rest[token.len()..];
            }
            None => {
                out.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }

    out
}

fn token_value(now: &NaiveDateTime, token: &str) -> String {
    let (is_pm, hour12) = now.hour12();
    match token {
        "YYYY" => format!("{:04}", now.year()),
        "YY" => format!("{:02}", now.year().rem_euclid(100)),
        "MM" => format!("{:02}", now.month()),
        "M" => now.month().to_string(),
        "DD" => format!("{:02}", now.day()),
        "D" => now.day().to_string(),
        "HH" => format!("{:02}", now.hour()),
        "H" => now.hour().to_string(),
        "hh" => format!("{hour12:02}"),
        "h" => hour12.to_string(),
        "mm" => format!("{:02}", now.minute()),
        "m" => now.minute().to_string(),
        "ss" => format!("{:02}", now.second()),
        "s" => now.second().to_string(),
        "A" => (if is_pm { "PM" } else { "AM" }).to_string(),
        "a" => (if is_pm { "pm" } else { "am" }).to_string(),
        _ => token.to_string(),
    }
}
