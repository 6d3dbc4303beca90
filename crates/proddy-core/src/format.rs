//! Formatting utilities

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Format a whole number of minutes as "45 min" or "2h 15m"
pub fn minutes(total: u32) -> String {
    if total < 60 {
        format!("{} min", total)
    } else {
        format!("{}h {}m", total / 60, total % 60)
    }
}

/// Format a remaining duration as "24m 10s" or "45s"
pub fn remaining(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Format a timestamp as a calendar date
pub fn date(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d").to_string()
}

/// Text progress bar for a 0-100 percentage
pub fn progress_bar(percent: u8, width: usize) -> String {
    let filled = (width * usize::from(percent.min(100))) / 100;
    format!(
        "{}{}",
        "\u{2588}".repeat(filled),
        "\u{2591}".repeat(width - filled)
    )
}

/// Truncate a string to max characters with ellipsis
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_minutes() {
        assert_eq!(minutes(25), "25 min");
        assert_eq!(minutes(135), "2h 15m");
    }

    #[test]
    fn test_remaining() {
        assert_eq!(remaining(Duration::from_secs(45)), "45s");
        assert_eq!(remaining(Duration::from_secs(24 * 60 + 10)), "24m 10s");
    }

    #[test]
    fn test_date() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        assert_eq!(date(dt), "2024-03-09");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0, 10).chars().filter(|c| *c == '\u{2588}').count(), 0);
        assert_eq!(progress_bar(50, 10).chars().filter(|c| *c == '\u{2588}').count(), 5);
        assert_eq!(progress_bar(150, 10).chars().filter(|c| *c == '\u{2588}').count(), 10);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer title", 10), "a much ...");
        assert_eq!(truncate("привет мир", 7), "прив...");
    }
}
