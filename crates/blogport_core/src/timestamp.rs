use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};

const DB_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses a database `DATETIME` rendered as text.
///
/// The zero date (`0000-00-00 00:00:00`) and anything else that is not a
/// valid calendar date yields `None`.
pub fn parse_db_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DB_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// Builds a timezone-aware timestamp from the local and UTC renderings of the
/// same instant. The offset is the difference between the two.
pub fn from_local_and_utc(
    local: NaiveDateTime,
    utc: NaiveDateTime,
) -> Option<DateTime<FixedOffset>> {
    let seconds = i32::try_from((local - utc).num_seconds()).ok()?;
    let offset = FixedOffset::east_opt(seconds)?;
    offset.from_local_datetime(&local).single()
}

/// `YYYY-MM-DD HH:MM:SS±HH:MM`, the date form written to content preambles.
pub fn format_preamble_date(date: &DateTime<FixedOffset>) -> String {
    date.format("%Y-%m-%d %H:%M:%S%:z").to_string()
}
