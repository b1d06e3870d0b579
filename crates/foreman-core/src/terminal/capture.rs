//! Time-window scan over a timestamped session log

use chrono::{DateTime, Duration, Local, NaiveDateTime, Timelike};

/// Inclusive window of local wall-clock seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    /// `[now - offset, now + duration]`, widened to whole seconds
    ///
    /// Log timestamps carry no sub-second part, so the start is floored and
    /// the end ceiled; a line stamped in the same second as `now` is inside.
    pub fn around(now: DateTime<Local>, offset_secs: u64, duration_secs: u64) -> Self {
        let now = now.naive_local();
        let start = now
            .checked_sub_signed(Duration::seconds(clamp_secs(offset_secs)))
            .unwrap_or(NaiveDateTime::MIN);
        let end = now
            .checked_add_signed(Duration::seconds(clamp_secs(duration_secs)))
            .unwrap_or(NaiveDateTime::MAX);
        Self {
            start: floor_second(start),
            end: ceil_second(end),
        }
    }

    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t <= self.end
    }
}

/// Lines of `content` whose timestamp lies in `window`
///
/// Each line is parsed for a leading timestamp in `format`. A line without
/// one belongs to the nearest stamped line above it; lines before the first
/// stamped line are dropped. Returned lines keep their timestamp prefix.
pub fn scan_window<'a>(content: &'a str, window: &TimeWindow, format: &str) -> Vec<&'a str> {
    let mut inside = false;
    let mut lines = Vec::new();

    for line in content.lines() {
        if let Ok((stamp, _)) = NaiveDateTime::parse_and_remainder(line, format) {
            inside = window.contains(stamp);
        }
        if inside {
            lines.push(line);
        }
    }

    lines
}

// About a century; keeps `Duration::seconds` in range.
const MAX_SPAN_SECS: u64 = 3_200_000_000;

fn clamp_secs(secs: u64) -> i64 {
    secs.min(MAX_SPAN_SECS) as i64
}

fn floor_second(t: NaiveDateTime) -> NaiveDateTime {
    t.with_nanosecond(0).unwrap_or(t)
}

fn ceil_second(t: NaiveDateTime) -> NaiveDateTime {
    if t.nanosecond() == 0 {
        t
    } else {
        floor_second(t)
            .checked_add_signed(Duration::seconds(1))
            .unwrap_or(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::DEFAULT_TIMESTAMP_FORMAT;
    use chrono::TimeZone;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, DEFAULT_TIMESTAMP_FORMAT).unwrap()
    }

    fn window(start: &str, end: &str) -> TimeWindow {
        TimeWindow {
            start: at(start),
            end: at(end),
        }
    }

    const LOG: &str = "\
2024-05-01-10:00:00 $ make
2024-05-01-10:00:05 compiling
warning: unused variable
  --> src/lib.rs:3
2024-05-01-10:00:09 done
2024-05-01-10:00:20 $ echo hi
2024-05-01-10:00:20 hi
";

    #[test]
    fn test_window_is_inclusive() {
        let w = window("2024-05-01-10:00:05", "2024-05-01-10:00:09");
        let lines = scan_window(LOG, &w, DEFAULT_TIMESTAMP_FORMAT);
        assert_eq!(
            lines,
            vec![
                "2024-05-01-10:00:05 compiling",
                "warning: unused variable",
                "  --> src/lib.rs:3",
                "2024-05-01-10:00:09 done",
            ]
        );
    }

    #[test]
    fn test_unstamped_lines_follow_previous_stamp() {
        // The continuation lines belong to 10:00:05, which is outside.
        let w = window("2024-05-01-10:00:06", "2024-05-01-10:00:30");
        let lines = scan_window(LOG, &w, DEFAULT_TIMESTAMP_FORMAT);
        assert_eq!(lines[0], "2024-05-01-10:00:09 done");
        assert!(!lines.iter().any(|l| l.contains("warning")));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_leading_unstamped_lines_are_dropped() {
        let content = "banner\n2024-05-01-10:00:00 ready\n";
        let w = window("2024-05-01-09:00:00", "2024-05-01-11:00:00");
        assert_eq!(
            scan_window(content, &w, DEFAULT_TIMESTAMP_FORMAT),
            vec!["2024-05-01-10:00:00 ready"]
        );
    }

    #[test]
    fn test_empty_window_result() {
        let w = window("2024-05-02-00:00:00", "2024-05-02-00:00:10");
        assert!(scan_window(LOG, &w, DEFAULT_TIMESTAMP_FORMAT).is_empty());
        assert!(scan_window("", &w, DEFAULT_TIMESTAMP_FORMAT).is_empty());
    }

    #[test]
    fn test_around_rounds_to_whole_seconds() {
        let now = Local
            .from_local_datetime(&at("2024-05-01-10:00:20"))
            .earliest()
            .unwrap()
            + Duration::milliseconds(400);

        let w = TimeWindow::around(now, 5, 2);
        assert_eq!(w.start, at("2024-05-01-10:00:15"));
        assert_eq!(w.end, at("2024-05-01-10:00:23"));

        let zero = TimeWindow::around(now, 0, 0);
        assert!(zero.contains(at("2024-05-01-10:00:20")));
        assert!(!zero.contains(at("2024-05-01-10:00:22")));
    }

    #[test]
    fn test_custom_format() {
        let content = "[10:00:01] one\n[10:00:09] two\n";
        let w = TimeWindow {
            start: NaiveDateTime::parse_from_str("2024-01-01 10:00:00", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
            end: NaiveDateTime::parse_from_str("2024-01-01 10:00:05", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
        };
        // Formats without a date cannot produce a NaiveDateTime
        assert!(scan_window(content, &w, "[%H:%M:%S]").is_empty());
    }
}
