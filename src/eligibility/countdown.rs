use chrono::Duration;

/// Text shown while a dose is blocked: `"2h 5m"`, `"45m"` or
/// `"less than 1 minute"`. Hours and minutes truncate.
pub fn format_countdown(remaining: Duration) -> String {
    let seconds = remaining.num_seconds().max(0);
    if seconds < 60 {
        return "less than 1 minute".into();
    }

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}
