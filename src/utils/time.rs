//! Human-readable duration formatting for menu entries and tab status

/// Format a duration in seconds as "1 hour, 3 minutes, 5 seconds" style text.
pub fn format_duration(total_seconds: u32) -> String {
    let seconds = total_seconds % 60;
    let minutes = (total_seconds % 3600) / 60;
    let hours = total_seconds / 3600;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(with_unit(hours, "hour"));
    }
    if minutes > 0 {
        parts.push(with_unit(minutes, "minute"));
    }
    if seconds > 0 {
        parts.push(with_unit(seconds, "second"));
    }

    if parts.is_empty() {
        return "0 seconds".to_string();
    }
    parts.join(", ")
}

fn with_unit(value: u32, unit: &str) -> String {
    if value == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", value, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_only() {
        assert_eq!(format_duration(3), "3 seconds");
        assert_eq!(format_duration(1), "1 second");
    }

    #[test]
    fn test_whole_minutes_and_hours() {
        assert_eq!(format_duration(60), "1 minute");
        assert_eq!(format_duration(1200), "20 minutes");
        assert_eq!(format_duration(3600), "1 hour");
        assert_eq!(format_duration(7200), "2 hours");
    }

    #[test]
    fn test_mixed_units() {
        assert_eq!(format_duration(90), "1 minute, 30 seconds");
        assert_eq!(format_duration(3661), "1 hour, 1 minute, 1 second");
    }

    #[test]
    fn test_zero() {
        assert_eq!(format_duration(0), "0 seconds");
    }
}
