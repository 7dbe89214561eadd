//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Format a forint amount the way the shop displays prices: thousands
/// grouped with spaces, no decimals, `Ft` suffix, e.g. `24 500 Ft`.
///
/// Prices in this shop are whole forints; any fractional part is dropped.
///
/// Usage in templates: `{{ part.price|forint }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn forint(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_forint(&value.to_string()))
}

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Returns the content hash for main.css.
///
/// The hash is computed at build time from the CSS file content.
///
/// Usage in templates: `{{ ""|css_hash }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}

/// Group the integer part of a decimal string by thousands and append `Ft`.
fn format_forint(raw: &str) -> String {
    let (sign, unsigned) = raw
        .strip_prefix('-')
        .map_or(("", raw), |rest| ("-", rest));
    let whole = unsigned.split('.').next().unwrap_or(unsigned);

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3 + 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }

    format!("{sign}{grouped} Ft")
}

#[cfg(test)]
mod tests {
    use super::format_forint;

    #[test]
    fn groups_thousands_with_spaces() {
        assert_eq!(format_forint("24500"), "24 500 Ft");
        assert_eq!(format_forint("1990"), "1 990 Ft");
        assert_eq!(format_forint("1234567"), "1 234 567 Ft");
    }

    #[test]
    fn small_amounts_are_untouched() {
        assert_eq!(format_forint("0"), "0 Ft");
        assert_eq!(format_forint("999"), "999 Ft");
    }

    #[test]
    fn fractional_part_is_dropped() {
        assert_eq!(format_forint("24500.00"), "24 500 Ft");
    }

    #[test]
    fn negative_amounts_keep_sign() {
        assert_eq!(format_forint("-1990"), "-1 990 Ft");
    }
}
