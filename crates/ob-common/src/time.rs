use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Renders a unix timestamp (seconds) as a `YYYY-MM-DD` UTC date for logs.
pub fn format_unix_date(ts_secs: i64) -> String {
    match DateTime::<Utc>::from_timestamp(ts_secs, 0) {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => ts_secs.to_string(),
    }
}

/// Parses either a raw unix timestamp or a `YYYY-MM-DD` date (midnight UTC).
pub fn parse_base_date(raw: &str) -> Result<i64> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<i64>() {
        return Ok(secs);
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid base date '{raw}', expected YYYY-MM-DD or unix seconds"))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("invalid midnight for {raw}"))?;
    Ok(midnight.and_utc().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_date_accepts_iso_and_unix() {
        assert_eq!(parse_base_date("2023-10-01").unwrap(), 1_696_118_400);
        assert_eq!(parse_base_date("1696118400").unwrap(), 1_696_118_400);
        assert!(parse_base_date("10/01/2023").is_err());
    }

    #[test]
    fn formats_day() {
        assert_eq!(format_unix_date(1_696_118_400), "2023-10-01");
    }
}
