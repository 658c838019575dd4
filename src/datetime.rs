use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a user-entered date or date-time into an absolute instant.
///
/// `YYYY-MM-DD` is midnight UTC. RFC 3339 carries its own offset. Naive
/// date-times (`datetime-local` inputs) are read in `local_offset`.
pub fn parse_date_input(input: &str, local_offset: FixedOffset) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    NAIVE_DATETIME_FORMATS.iter().find_map(|fmt| {
        let naive = NaiveDateTime::parse_from_str(input, fmt).ok()?;
        local_offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    })
}
