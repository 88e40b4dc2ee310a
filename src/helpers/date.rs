//! Date helper functions

use chrono::{DateTime, FixedOffset, Locale, TimeZone};
use chrono_tz::Tz;

/// Locale and timezone used to display publication dates
#[derive(Debug, Clone, Copy)]
pub struct DateStyle {
    pub locale: Locale,
    pub timezone: Tz,
}

impl DateStyle {
    /// Build from config values, falling back to POSIX / UTC when unknown
    pub fn new(language: &str, timezone: &str) -> Self {
        let locale = Locale::try_from(language.replace('-', "_").as_str()).unwrap_or_else(|_| {
            tracing::warn!("Unknown language {:?}, using POSIX month names", language);
            Locale::POSIX
        });
        let timezone = timezone.parse::<Tz>().unwrap_or_else(|_| {
            tracing::warn!("Unknown timezone {:?}, using UTC", timezone);
            Tz::UTC
        });
        Self { locale, timezone }
    }
}

impl Default for DateStyle {
    fn default() -> Self {
        Self {
            locale: Locale::POSIX,
            timezone: Tz::UTC,
        }
    }
}

/// Format a date using a Moment.js-compatible format string
///
/// # Examples
/// ```ignore
/// format_date(&date, "YYYY-MM-DD", &style) // -> "2024-01-15"
/// ```
pub fn format_date<Z: TimeZone>(date: &DateTime<Z>, format: &str, style: &DateStyle) -> String {
    let chrono_format = moment_to_chrono_format(format);
    date.with_timezone(&style.timezone)
        .format_localized(&chrono_format, style.locale)
        .to_string()
}

/// Format an optional publication date; an absent date renders empty
pub fn format_publication_date(
    date: Option<&DateTime<FixedOffset>>,
    format: &str,
    style: &DateStyle,
) -> String {
    date.map(|d| format_date(d, format, style))
        .unwrap_or_default()
}

/// Format a date in ISO 8601 / XML format
pub fn date_xml<Z: TimeZone>(date: &DateTime<Z>) -> String
where
    Z::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

/// Convert Moment.js format to chrono format
fn moment_to_chrono_format(format: &str) -> String {
    // Longest patterns first within each category
    let replacements = [
        ("YYYY", "%Y"),
        ("YY", "%y"),
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        ("DDDD", "%j"),
        ("DD", "%d"),
        ("HH", "%H"),
        ("hh", "%I"),
        ("mm", "%M"),
        ("ss", "%S"),
        ("dddd", "%A"),
        ("ddd", "%a"),
        ("ZZ", "%z"),
    ];

    let mut result = format.to_string();

    for (from, to) in replacements {
        result = result.replace(from, to);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2021, 12, 15, 1, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_format_date() {
        let style = DateStyle::default();
        assert_eq!(format_date(&date(), "YYYY-MM-DD", &style), "2021-12-15");
        assert_eq!(format_date(&date(), "DD MMM YYYY", &style), "15 Dec 2021");
    }

    #[test]
    fn test_localized_month() {
        let style = DateStyle::new("pt-BR", "UTC");
        assert_eq!(format_date(&date(), "DD MMM YYYY", &style), "15 dez 2021");
    }

    #[test]
    fn test_timezone_shift() {
        let style = DateStyle::new("en_US", "America/Sao_Paulo");
        assert_eq!(format_date(&date(), "YYYY-MM-DD", &style), "2021-12-14");
    }

    #[test]
    fn test_unknown_style_falls_back() {
        let style = DateStyle::new("xx_YY", "Mars/Olympus");
        assert_eq!(style.timezone, Tz::UTC);
        assert_eq!(format_date(&date(), "DD MMM YYYY", &style), "15 Dec 2021");
    }

    #[test]
    fn test_absent_publication_date() {
        let style = DateStyle::default();
        assert_eq!(format_publication_date(None, "DD MMM YYYY", &style), "");
        assert_eq!(
            format_publication_date(Some(&date()), "DD/MM/YYYY", &style),
            "15/12/2021"
        );
    }

    #[test]
    fn test_moment_to_chrono() {
        assert_eq!(moment_to_chrono_format("DD MMM YYYY"), "%d %b %Y");
        assert_eq!(moment_to_chrono_format("HH:mm:ss"), "%H:%M:%S");
    }
}
