//! Period label parsing.

use fundpanel_primitives::Period;

const FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d"];

/// Parse a period-end date.
///
/// Accepts ISO dates, compact `YYYYMMDD` report dates and timestamp strings
/// whose date part is one of those (`2024-03-31 00:00:00`).
#[must_use]
pub fn parse_period(raw: &str) -> Option<Period> {
    let trimmed = raw.trim();
    let date_part = trimmed.split([' ', 'T']).next().unwrap_or(trimmed);
    FORMATS.iter().find_map(|fmt| Period::parse_from_str(date_part, fmt).ok())
}

/// Format a period the way exported tables label their columns.
#[must_use]
pub fn format_period(period: Period) -> String {
    period.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("2024-03-31")]
    #[case("20240331")]
    #[case(" 2024-03-31 00:00:00 ")]
    #[case("2024-03-31T00:00:00")]
    #[case("2024/03/31")]
    fn parses_known_formats(#[case] raw: &str) {
        assert_eq!(parse_period(raw), Period::from_ymd_opt(2024, 3, 31));
    }

    #[rstest]
    #[case("")]
    #[case("entity")]
    #[case("2024-13-01")]
    #[case("Q1 2024")]
    fn rejects_non_dates(#[case] raw: &str) {
        assert_eq!(parse_period(raw), None);
    }

    #[test]
    fn format_round_trips() {
        let p = Period::from_ymd_opt(2023, 12, 31).unwrap();
        assert_eq!(format_period(p), "2023-12-31");
        assert_eq!(parse_period(&format_period(p)), Some(p));
    }
}
