//! Time keying for temporal datasets.
//!
//! A temporal provider maps simulation time onto a discrete time key: the
//! [`TimeQuantizer`] snaps a timestamp to the start of its bucket within
//! the dataset's validity range, and a [`TimeFormat`] renders the bucket
//! as the key string substituted into the dataset template.

use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::config::ConfigError;

/// Key formats a temporal dataset can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFormat {
    /// `2004-07-18`
    Date,
    /// `2004-07-18T10:05:00Z`
    DateTimeZ,
    /// `2004-07-18T10_05_00Z`
    DateTimeUnderscoreZ,
    /// `20040718_100500`
    CompactDateTime,
    /// `20040718_1005`
    CompactDateHourMinute,
}

impl TimeFormat {
    /// Render `time` as a key string in this format.
    pub fn format(&self, time: DateTime<Utc>) -> String {
        let pattern = match self {
            TimeFormat::Date => "%Y-%m-%d",
            TimeFormat::DateTimeZ => "%Y-%m-%dT%H:%M:%SZ",
            TimeFormat::DateTimeUnderscoreZ => "%Y-%m-%dT%H_%M_%SZ",
            TimeFormat::CompactDateTime => "%Y%m%d_%H%M%S",
            TimeFormat::CompactDateHourMinute => "%Y%m%d_%H%M",
        };
        time.format(pattern).to_string()
    }
}

impl FromStr for TimeFormat {
    type Err = ConfigError;

    /// Parse the format names used in temporal dataset metadata.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "YYYY-MM-DD" => Ok(TimeFormat::Date),
            "YYYY-MM-DDThh:mm:ssZ" => Ok(TimeFormat::DateTimeZ),
            "YYYY-MM-DDThh_mm_ssZ" => Ok(TimeFormat::DateTimeUnderscoreZ),
            "YYYYMMDD_hhmmss" => Ok(TimeFormat::CompactDateTime),
            "YYYYMMDD_hhmm" => Ok(TimeFormat::CompactDateHourMinute),
            other => Err(ConfigError::InvalidTimeFormat(other.to_string())),
        }
    }
}

/// Parse a configuration timestamp: RFC 3339, `YYYY-MM-DDTHH:MM:SS`, or a
/// bare `YYYY-MM-DD` (midnight).
pub fn parse_time(s: &str) -> Result<DateTime<Utc>, ConfigError> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&t));
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN)));
    }
    Err(ConfigError::InvalidTimeRange(format!(
        "unparseable timestamp '{}'",
        s
    )))
}

/// Parse a bucket resolution of the form `<count><d|h|m>`.
fn parse_resolution(s: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidTimeResolution(s.to_string());

    if s.len() < 2 {
        return Err(invalid());
    }
    let (count, unit) = s.split_at(s.len() - 1);
    let count: i64 = count.parse().map_err(|_| invalid())?;
    if count <= 0 {
        return Err(invalid());
    }
    match unit {
        "d" => Ok(Duration::days(count)),
        "h" => Ok(Duration::hours(count)),
        "m" => Ok(Duration::minutes(count)),
        _ => Err(invalid()),
    }
}

/// Snaps timestamps onto discrete buckets within a validity range.
#[derive(Debug, Clone)]
pub struct TimeQuantizer {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    resolution: Duration,
}

impl TimeQuantizer {
    /// Build a quantizer from configuration strings.
    ///
    /// `end` accepts `"Today"` and `"Yesterday"` relative to `now`, in
    /// addition to explicit timestamps.
    pub fn new(start: &str, end: &str, resolution: &str, now: DateTime<Utc>) -> Result<Self, ConfigError> {
        let start = parse_time(start)?;
        let end = match end {
            "Today" => now,
            "Yesterday" => now - Duration::days(1),
            explicit => parse_time(explicit)?,
        };
        if end < start {
            return Err(ConfigError::InvalidTimeRange(format!(
                "range end {} precedes start {}",
                end, start
            )));
        }
        Ok(Self {
            start,
            end,
            resolution: parse_resolution(resolution)?,
        })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Snap `time` to the start of its bucket.
    ///
    /// Out-of-range times are clamped into the range when `clamp` is set
    /// and rejected otherwise.
    pub fn quantize(&self, time: DateTime<Utc>, clamp: bool) -> Option<DateTime<Utc>> {
        let time = if time < self.start || time > self.end {
            if !clamp {
                return None;
            }
            time.clamp(self.start, self.end)
        } else {
            time
        };

        let elapsed = time - self.start;
        let buckets = elapsed.num_seconds() / self.resolution.num_seconds();
        Some(self.start + self.resolution * buckets as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        parse_time(s).unwrap()
    }

    #[test]
    fn test_format_names_roundtrip() {
        let time = utc("2004-07-18T10:05:09Z");
        let cases = [
            ("YYYY-MM-DD", "2004-07-18"),
            ("YYYY-MM-DDThh:mm:ssZ", "2004-07-18T10:05:09Z"),
            ("YYYY-MM-DDThh_mm_ssZ", "2004-07-18T10_05_09Z"),
            ("YYYYMMDD_hhmmss", "20040718_100509"),
            ("YYYYMMDD_hhmm", "20040718_1005"),
        ];
        for (name, expected) in cases {
            let format: TimeFormat = name.parse().unwrap();
            assert_eq!(format.format(time), expected, "format {}", name);
        }
    }

    #[test]
    fn test_unknown_format_is_config_error() {
        let result: Result<TimeFormat, _> = "MM/DD/YYYY".parse();
        assert!(matches!(result, Err(ConfigError::InvalidTimeFormat(_))));
    }

    #[test]
    fn test_parse_time_accepts_bare_date() {
        let t = parse_time("2010-03-04").unwrap();
        assert_eq!(TimeFormat::DateTimeZ.format(t), "2010-03-04T00:00:00Z");
    }

    #[test]
    fn test_daily_quantization() {
        let now = utc("2020-06-15T00:00:00Z");
        let q = TimeQuantizer::new("2020-01-01", "Today", "1d", now).unwrap();

        let morning = q.quantize(utc("2020-03-05T08:12:00Z"), false).unwrap();
        let evening = q.quantize(utc("2020-03-05T22:59:00Z"), false).unwrap();
        assert_eq!(morning, evening, "same calendar day, same bucket");
        assert_eq!(morning, utc("2020-03-05"));

        let next_day = q.quantize(utc("2020-03-06T01:00:00Z"), false).unwrap();
        assert_ne!(morning, next_day);
    }

    #[test]
    fn test_hour_and_minute_resolutions() {
        let now = utc("2020-06-15T00:00:00Z");

        let q = TimeQuantizer::new("2020-01-01", "Today", "6h", now).unwrap();
        let bucket = q.quantize(utc("2020-02-01T07:30:00Z"), false).unwrap();
        assert_eq!(bucket, utc("2020-02-01T06:00:00Z"));

        let q = TimeQuantizer::new("2020-01-01", "Today", "30m", now).unwrap();
        let bucket = q.quantize(utc("2020-02-01T07:44:00Z"), false).unwrap();
        assert_eq!(bucket, utc("2020-02-01T07:30:00Z"));
    }

    #[test]
    fn test_out_of_range_clamps_or_rejects() {
        let now = utc("2020-06-15T00:00:00Z");
        let q = TimeQuantizer::new("2020-01-01", "2020-02-01", "1d", now).unwrap();

        let early = utc("2019-12-25");
        assert_eq!(q.quantize(early, false), None);
        assert_eq!(q.quantize(early, true), Some(utc("2020-01-01")));

        let late = utc("2021-01-01");
        assert_eq!(q.quantize(late, true), Some(utc("2020-02-01")));
    }

    #[test]
    fn test_yesterday_end() {
        let now = utc("2020-06-15T12:00:00Z");
        let q = TimeQuantizer::new("2020-01-01", "Yesterday", "1d", now).unwrap();
        assert_eq!(q.end(), utc("2020-06-14T12:00:00Z"));
    }

    #[test]
    fn test_invalid_resolution_is_config_error() {
        let now = utc("2020-06-15T00:00:00Z");
        for bad in ["", "d", "5w", "-2d", "2.5h"] {
            let result = TimeQuantizer::new("2020-01-01", "Today", bad, now);
            assert!(
                matches!(result, Err(ConfigError::InvalidTimeResolution(_))),
                "'{}' must be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_inverted_range_is_config_error() {
        let now = utc("2020-06-15T00:00:00Z");
        let result = TimeQuantizer::new("2020-06-01", "2020-01-01", "1d", now);
        assert!(matches!(result, Err(ConfigError::InvalidTimeRange(_))));
    }
}
