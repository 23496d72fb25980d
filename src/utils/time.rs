use chrono::Utc;

/// Current Unix timestamp in seconds.
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// Render the time remaining until `expires_at` for the delegation list view.
///
/// Windows of a day or more use day-based formatting; shorter windows use
/// hours and minutes. An elapsed deadline renders as "Expired" (expiry is
/// checked as `now >= expires_at`, the convention used everywhere else).
pub fn humanize_expiry(expires_at: i64, now: i64) -> String {
    if now >= expires_at {
        return "Expired".to_string();
    }

    let remaining = expires_at - now;
    let days = remaining / 86_400;
    if days >= 1 {
        let hours = (remaining % 86_400) / 3_600;
        format!("{}d {}h", days, hours)
    } else {
        let hours = remaining / 3_600;
        let minutes = (remaining % 3_600) / 60;
        format!("{}h {}m", hours, minutes)
    }
}
