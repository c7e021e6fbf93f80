use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Local, TimeDelta, Timelike, Utc};
use regex::Regex;

static OFFSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([+\-\s])(\d{2}):?(\d{2})?").expect("offset pattern is valid"));

/// Time zone used when rendering timestamps into SQL literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeZone {
    /// Use the calendar fields of the process' local time zone.
    #[default]
    Local,
    /// Shift the instant by this many minutes and read UTC calendar fields.
    Offset(i32),
}

impl TimeZone {
    /// Parse `local`, `Z`, or an offset such as `+05:30`, `-08` or `+0200`.
    ///
    /// Anything else is treated as a zero offset.
    #[must_use]
    pub fn parse(tz: &str) -> Self {
        if tz == "local" {
            return TimeZone::Local;
        }
        if tz == "Z" {
            return TimeZone::Offset(0);
        }
        let Some(caps) = OFFSET_RE.captures(tz) else {
            return TimeZone::Offset(0);
        };
        let sign = if &caps[1] == "-" { -1 } else { 1 };
        let hours: i32 = caps[2].parse().unwrap_or(0);
        let minutes: i32 = caps
            .get(3)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);
        TimeZone::Offset(sign * (hours * 60 + minutes))
    }
}

impl FromStr for TimeZone {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TimeZone::parse(s))
    }
}

/// Render `YYYY-MM-DD HH:mm:ss.mmm`, or `None` when the shifted instant is out of range.
pub(super) fn format_timestamp(ts: &DateTime<Utc>, tz: TimeZone) -> Option<String> {
    match tz {
        TimeZone::Local => Some(render(&ts.with_timezone(&Local))),
        TimeZone::Offset(minutes) => {
            let shifted = ts.checked_add_signed(TimeDelta::try_minutes(i64::from(minutes))?)?;
            Some(render(&shifted))
        }
    }
}

fn render<T: Datelike + Timelike>(dt: &T) -> String {
    let millis = (dt.nanosecond() / 1_000_000).min(999);
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:03}",
        dt.year(),
        dt.month(),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second(),
        millis
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_offsets() {
        assert_eq!(TimeZone::parse("Z"), TimeZone::Offset(0));
        assert_eq!(TimeZone::parse("local"), TimeZone::Local);
        assert_eq!(TimeZone::parse("+05:30"), TimeZone::Offset(330));
        assert_eq!(TimeZone::parse("-08"), TimeZone::Offset(-480));
        assert_eq!(TimeZone::parse("+0200"), TimeZone::Offset(120));
        assert_eq!(TimeZone::parse("Europe/Paris"), TimeZone::Offset(0));
    }

    #[test]
    fn shifts_before_reading_fields() {
        let ts = DateTime::parse_from_rfc3339("2023-01-01T23:30:00.045Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            format_timestamp(&ts, TimeZone::Offset(60)).unwrap(),
            "2023-01-02 00:30:00.045"
        );
        assert_eq!(
            format_timestamp(&ts, TimeZone::Offset(0)).unwrap(),
            "2023-01-01 23:30:00.045"
        );
    }

    #[test]
    fn overflowing_shift_is_none() {
        assert!(format_timestamp(&DateTime::<Utc>::MAX_UTC, TimeZone::Offset(60)).is_none());
    }
}
