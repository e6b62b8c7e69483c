use crate::error::{validation_error, CalendarResult};
use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};

/// Parse time string in HH:MM format
pub fn parse_time(time_str: &str) -> Option<(u32, u32)> {
    let parts: Vec<&str> = time_str.trim().split(':').collect();
    if parts.len() != 2 {
        return None;
    }
    let hour = parts[0].parse::<u32>().ok()?;
    let minute = parts[1].parse::<u32>().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some((hour, minute))
}

/// Parse date string in YYYY-MM-DD format
pub fn parse_date(date_str: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").ok()
}

/// Resolve a wall-clock time in `tz` to an instant
pub fn resolve_local<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> CalendarResult<DateTime<Utc>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        // Clocks turned back: the earlier occurrence is the one shown first
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(validation_error(&format!(
            "Local time {} does not exist in this time zone",
            local
        ))),
    }
}

/// Local midnight of `date` in `tz`
pub fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> CalendarResult<DateTime<Utc>> {
    resolve_local(tz, date.and_time(NaiveTime::MIN))
}

/// Meeting start from form fields, interpreted in `tz`
pub fn meeting_start<Tz: TimeZone>(
    tz: &Tz,
    date_str: &str,
    time_str: &str,
) -> CalendarResult<DateTime<Utc>> {
    let date = parse_date(date_str)
        .ok_or_else(|| validation_error(&format!("Invalid date: {}", date_str)))?;
    let (hour, minute) = parse_time(time_str)
        .ok_or_else(|| validation_error(&format!("Invalid time: {}", time_str)))?;
    let local = date
        .and_hms_opt(hour, minute, 0)
        .ok_or_else(|| validation_error("Failed to create datetime"))?;
    resolve_local(tz, local)
}

/// End of a meeting of `duration_minutes` starting at `start`
pub fn meeting_end(start: DateTime<Utc>, duration_minutes: u32) -> DateTime<Utc> {
    start + Duration::minutes(i64::from(duration_minutes))
}

/// Parse an instant from the backend.
///
/// Accepts RFC 3339, a naive date-time (taken as UTC) or a bare date (UTC midnight).
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    parse_date(value).map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

/// ISO-8601 form the backend expects in query strings
pub fn to_iso(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Europe::Helsinki;

    #[test]
    fn test_parse_time() {
        // Valid cases
        assert_eq!(parse_time("00:00"), Some((0, 0)));
        assert_eq!(parse_time("12:30"), Some((12, 30)));
        assert_eq!(parse_time("23:59"), Some((23, 59)));
        assert_eq!(parse_time(" 9:05 "), Some((9, 5)));

        // Invalid cases
        assert_eq!(parse_time("24:00"), None);
        assert_eq!(parse_time("12:60"), None);
        assert_eq!(parse_time("12:30:45"), None);
        assert_eq!(parse_time("12"), None);
        assert_eq!(parse_time("12:ab"), None);
        assert_eq!(parse_time(""), None);
    }

    #[test]
    fn test_meeting_start_and_end() {
        let start = meeting_start(&Utc, "2025-01-10", "10:00").unwrap();
        assert_eq!(to_iso(&start), "2025-01-10T10:00:00.000Z");
        assert_eq!(to_iso(&meeting_end(start, 30)), "2025-01-10T10:30:00.000Z");
        assert_eq!(to_iso(&meeting_end(start, 90)), "2025-01-10T11:30:00.000Z");

        // Helsinki is UTC+2 in January
        let start = meeting_start(&Helsinki, "2025-01-10", "10:00").unwrap();
        assert_eq!(to_iso(&start), "2025-01-10T08:00:00.000Z");

        assert!(meeting_start(&Utc, "2025-13-01", "10:00").is_err());
        assert!(meeting_start(&Utc, "2025-01-10", "10").is_err());
    }

    #[test]
    fn test_nonexistent_local_time_is_rejected() {
        // 2025-03-30 03:00 -> 04:00 in Helsinki
        assert!(meeting_start(&Helsinki, "2025-03-30", "03:30").is_err());
        // 2025-10-26 04:00 -> 03:00 happens twice, the earlier one wins
        let ambiguous = meeting_start(&Helsinki, "2025-10-26", "03:30").unwrap();
        assert_eq!(to_iso(&ambiguous), "2025-10-26T00:30:00.000Z");
    }

    #[test]
    fn test_parse_instant_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 1, 10, 10, 0, 0).unwrap();
        assert_eq!(parse_instant("2025-01-10T10:00:00Z"), Some(expected));
        assert_eq!(parse_instant("2025-01-10T10:00:00.000Z"), Some(expected));
        assert_eq!(parse_instant("2025-01-10T12:00:00+02:00"), Some(expected));
        assert_eq!(parse_instant("2025-01-10T10:00:00"), Some(expected));
        assert_eq!(parse_instant("2025-01-10T10:00"), Some(expected));
        assert_eq!(
            parse_instant("2025-01-10"),
            Some(Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_instant("next tuesday"), None);
    }
}
