//! Date header fields (`Date`, `Delivery-Date`).

use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone, Utc};
use std::fmt;

/// A point in time as written in RFC 2822 date headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(DateTime<FixedOffset>);

impl Timestamp {
    /// The current local time.
    #[must_use]
    pub fn now() -> Self {
        Self(Local::now().fixed_offset())
    }

    /// Wraps a `chrono` date.
    #[must_use]
    pub const fn from_datetime(dt: DateTime<FixedOffset>) -> Self {
        Self(dt)
    }

    /// The wrapped date.
    #[must_use]
    pub const fn datetime(&self) -> DateTime<FixedOffset> {
        self.0
    }

    /// Parses an RFC 2822 date.
    ///
    /// A trailing zone comment such as `(CET)` is ignored. RFC 3339 and the
    /// `asctime` form used on mbox `From ` lines are accepted as well.
    ///
    /// # Errors
    ///
    /// Returns an error if none of the formats match.
    pub fn parse(raw: &str) -> Result<Self> {
        let text = strip_comment(raw.trim());
        if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
            return Ok(Self(dt));
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Ok(Self(dt));
        }
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        NaiveDateTime::parse_from_str(&collapsed, "%a %b %d %H:%M:%S %Y")
            .map(|naive| Self(Utc.from_utc_datetime(&naive).fixed_offset()))
            .map_err(|_| Error::InvalidTimestamp(raw.trim().to_string()))
    }

    /// The `asctime` form used on mbox `From ` lines (`Mon Jan  1 10:00:00 2024`).
    #[must_use]
    pub fn asctime(&self) -> String {
        self.0.format("%a %b %e %H:%M:%S %Y").to_string()
    }

    /// Header wire words.
    #[must_use]
    pub fn encode(&self) -> Vec<String> {
        self.to_string().split(' ').map(String::from).collect()
    }
}

fn strip_comment(text: &str) -> &str {
    if text.ends_with(')') {
        if let Some(open) = text.rfind('(') {
            return text[..open].trim_end();
        }
    }
    text
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc2822())
    }
}

impl From<DateTime<FixedOffset>> for Timestamp {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Self(dt)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_rfc2822() {
        let ts = Timestamp::parse("Tue, 1 Jul 2003 10:52:37 +0200").unwrap();
        assert_eq!(ts.datetime().year(), 2003);
        assert_eq!(ts.datetime().hour(), 10);
        assert_eq!(ts.to_string(), "Tue, 1 Jul 2003 10:52:37 +0200");
    }

    #[test]
    fn test_parse_with_comment() {
        let ts = Timestamp::parse("Tue, 1 Jul 2003 10:52:37 +0200 (CEST)").unwrap();
        assert_eq!(ts.datetime().minute(), 52);
    }

    #[test]
    fn test_parse_asctime() {
        let ts = Timestamp::parse("Tue Jul  1 10:52:37 2003").unwrap();
        assert_eq!(ts.asctime(), "Tue Jul  1 10:52:37 2003");
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(Timestamp::parse("yesterday"), Err(Error::InvalidTimestamp(_))));
    }
}
