use time::format_description::FormatItem;
use time::macros::format_description;
use time::Date;

/// Calendar dates cross the API and the store as `YYYY-MM-DD` text, the same
/// shape SQLite's `DATE()` understands.
pub const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn parse_date(value: &str) -> Result<Date, time::error::Parse> {
    Date::parse(value, DATE_FORMAT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn parses_iso_dates() {
        assert_eq!(parse_date("2025-01-10").unwrap(), date!(2025 - 01 - 10));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_date("10/01/2025").is_err());
        assert!(parse_date("").is_err());
    }
}
