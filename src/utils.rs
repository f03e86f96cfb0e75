/// Utility functions for formatting
use time::macros::format_description;
use time::OffsetDateTime;

/// Format a timestamp for human-readable logging
///
/// Converts an OffsetDateTime to DD.MM.YYYY - HH:MM:SS format
/// Falls back to default string representation if formatting fails.
pub fn format_datetime(dt: &OffsetDateTime) -> String {
    let format = format_description!("[day].[month].[year] - [hour]:[minute]:[second]");
    dt.format(format).unwrap_or_else(|_| dt.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn formats_day_first() {
        let dt = datetime!(2024-03-07 09:05:01 UTC);
        assert_eq!(format_datetime(&dt), "07.03.2024 - 09:05:01");
    }
}
