//! Human-readable uptime strings.
//!
//! `short` is the compact form used in tight UI spots (`42s`, `5m`, `3h`, `2d`),
//! `long` the sentence form (`5 minutes ago`).

use std::time::Duration;

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 3600;
const SECONDS_PER_DAY: u64 = 86400;
const SECONDS_PER_MONTH: u64 = 2_592_000;
const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Compact uptime, largest whole unit.
pub fn short(uptime: Duration) -> String {
    let seconds = uptime.as_secs();
    if seconds < SECONDS_PER_MINUTE {
        format!("{}s", seconds)
    } else if seconds < SECONDS_PER_HOUR {
        format!("{}m", seconds / SECONDS_PER_MINUTE)
    } else if seconds < SECONDS_PER_DAY {
        format!("{}h", seconds / SECONDS_PER_HOUR)
    } else {
        format!("{}d", seconds / SECONDS_PER_DAY)
    }
}

/// Relative-time sentence for the moment the process started.
pub fn long(uptime: Duration) -> String {
    let seconds = uptime.as_secs();
    let (count, unit) = if seconds < SECONDS_PER_MINUTE {
        return "just now".to_string();
    } else if seconds < SECONDS_PER_HOUR {
        (seconds / SECONDS_PER_MINUTE, "minute")
    } else if seconds < SECONDS_PER_DAY {
        (seconds / SECONDS_PER_HOUR, "hour")
    } else if seconds < SECONDS_PER_MONTH {
        (seconds / SECONDS_PER_DAY, "day")
    } else if seconds < SECONDS_PER_YEAR {
        (seconds / SECONDS_PER_MONTH, "month")
    } else {
        (seconds / SECONDS_PER_YEAR, "year")
    };

    if count == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", count, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_short() {
        assert_eq!(short(secs(0)), "0s");
        assert_eq!(short(secs(59)), "59s");
        assert_eq!(short(secs(60)), "1m");
        assert_eq!(short(secs(7200)), "2h");
        assert_eq!(short(secs(3 * 86400 + 5)), "3d");
    }

    #[test]
    fn test_long() {
        assert_eq!(long(secs(30)), "just now");
        assert_eq!(long(secs(60)), "1 minute ago");
        assert_eq!(long(secs(300)), "5 minutes ago");
        assert_eq!(long(secs(3600)), "1 hour ago");
        assert_eq!(long(secs(2 * 86400)), "2 days ago");
        assert_eq!(long(secs(SECONDS_PER_MONTH * 3)), "3 months ago");
        assert_eq!(long(secs(SECONDS_PER_YEAR)), "1 year ago");
    }
}
