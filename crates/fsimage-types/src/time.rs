//! Epoch-millisecond timestamp rendering.

/// Rendering of a zero timestamp.
pub const EPOCH_SENTINEL: &str = "1970-01-01 00:00:00";

const MILLIS_PER_SECOND: u64 = 1_000;
const SECONDS_PER_DAY: u64 = 86_400;

/// Format milliseconds since the Unix epoch as `YYYY-MM-DD HH:MM:SS` in UTC.
///
/// Sub-second precision is truncated. The result does not depend on the host
/// time zone.
#[must_use]
pub fn format_epoch_millis(millis: u64) -> String {
    if millis == 0 {
        return EPOCH_SENTINEL.to_owned();
    }
    let secs = millis / MILLIS_PER_SECOND;
    let days = secs / SECONDS_PER_DAY;
    let of_day = secs % SECONDS_PER_DAY;
    let (year, month, day) = civil_from_days(days);
    format!(
        "{year:04}-{month:02}-{day:02} {:02}:{:02}:{:02}",
        of_day / 3_600,
        (of_day % 3_600) / 60,
        of_day % 60
    )
}

/// Proleptic Gregorian date for a day count since 1970-01-01.
///
/// Howard Hinnant's `civil_from_days`, restricted to non-negative input.
const fn civil_from_days(days: u64) -> (u64, u64, u64) {
    let z = days + 719_468;
    let era = z / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };
    (year, month, day)
}
