//! Timezone-aware due-date input.

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Parse a due date like "2026-04-01 17:00" in an IANA tz like
/// "America/Chicago", returning UTC.
pub fn parse_local_due_to_utc(local: &str, tz: &str) -> Result<DateTime<Utc>> {
    let tz: Tz = tz
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))?;

    let ndt = NaiveDateTime::parse_from_str(local, "%Y-%m-%d %H:%M")
        .map_err(|e| anyhow::anyhow!("invalid local datetime '{local}': {e}"))?;

    let local_dt = tz
        .from_local_datetime(&ndt)
        .single()
        .ok_or_else(|| anyhow::anyhow!("ambiguous or invalid local time (DST?): {local} {tz}"))?;

    Ok(local_dt.with_timezone(&Utc))
}

/// Format a UTC instant in the display timezone; falls back to UTC when the
/// configured zone does not parse.
pub fn format_in_tz(dt: DateTime<Utc>, tz: &str) -> String {
    match tz.parse::<Tz>() {
        Ok(tz) => dt.with_timezone(&tz).format("%Y-%m-%d %H:%M %Z").to_string(),
        Err(_) => dt.format("%Y-%m-%d %H:%M UTC").to_string(),
    }
}
