use chrono::{DateTime, NaiveDateTime};

/// Format of the human-readable time column of the wide table.
///
/// Month/day and time of day with millisecond resolution, e.g. `03/11  14:05:09:400`.
pub const TIME_KEY_FORMAT: &str = "%m/%d  %H:%M:%S:%3f";

/// Format of event-log timestamps, e.g. `11-03-2022 14:05:09:000`.
pub const EVENT_TIME_FORMAT: &str = "%d-%m-%Y %H:%M:%S:%3f";

/// Event-log timestamps written without the millisecond component.
pub const EVENT_TIME_FORMAT_SECONDS: &str = "%d-%m-%Y %H:%M:%S";

/// Formats a millisecond Unix timestamp with [`TIME_KEY_FORMAT`].
///
/// Returns `None` if the timestamp is outside chrono's representable range.
///
/// # Examples
///
/// ```
/// # use lmt_table::format_time_key;
/// assert_eq!(format_time_key(1_400).unwrap(), "01/01  00:00:01:400");
/// ```
#[must_use]
pub fn format_time_key(timestamp_ms: i64) -> Option<String> {
    DateTime::from_timestamp_millis(timestamp_ms)
        .map(|time| time.format(TIME_KEY_FORMAT).to_string())
}

/// Formats a millisecond Unix timestamp with [`EVENT_TIME_FORMAT`].
///
/// # Examples
///
/// ```
/// # use lmt_table::format_event_time;
/// assert_eq!(format_event_time(61_250).unwrap(), "01-01-1970 00:01:01:250");
/// ```
#[must_use]
pub fn format_event_time(timestamp_ms: i64) -> Option<String> {
    DateTime::from_timestamp_millis(timestamp_ms)
        .map(|time| time.format(EVENT_TIME_FORMAT).to_string())
}

/// Parses an event-log timestamp into milliseconds since the Unix epoch.
///
/// Log times carry no zone and are interpreted as UTC, matching how frame
/// timestamps are formatted. A missing trailing millisecond component is
/// accepted as whole seconds.
///
/// # Examples
///
/// ```
/// # use lmt_table::parse_event_time;
/// assert_eq!(parse_event_time("01-01-1970 00:00:01:250"), Some(1_250));
/// assert_eq!(parse_event_time("01-01-1970 00:00:02"), Some(2_000));
/// assert_eq!(parse_event_time("date"), None);
/// ```
#[must_use]
pub fn parse_event_time(text: &str) -> Option<i64> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, EVENT_TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, EVENT_TIME_FORMAT_SECONDS))
        .ok()
        .map(|time| time.and_utc().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_key_round_trip_through_log_format() {
        // 2022-03-11 14:05:09.400 UTC
        let timestamp_ms = 1_647_007_509_400;
        assert_eq!(format_time_key(timestamp_ms).unwrap(), "03/11  14:05:09:400");
        assert_eq!(
            parse_event_time("11-03-2022 14:05:09:400"),
            Some(timestamp_ms)
        );
    }

    #[test]
    fn test_negative_timestamp() {
        assert_eq!(format_time_key(-1).unwrap(), "12/31  23:59:59:999");
    }

    #[test]
    fn test_out_of_range_timestamp() {
        assert_eq!(format_time_key(i64::MAX), None);
    }

    #[test]
    fn test_malformed_event_times() {
        assert_eq!(parse_event_time(""), None);
        assert_eq!(parse_event_time("2022-03-11 14:05:09"), None);
        assert_eq!(parse_event_time("32-03-2022 14:05:09:000"), None);
    }
}
