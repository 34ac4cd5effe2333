//! Human-readable labels for elapsed time and resource quantities.

use chrono::{DateTime, Duration, Utc};

/// Formats the wall-clock time elapsed since `ts`.
///
/// `None` stands for "never happened" (a pod that has not restarted, a
/// missing start time) and yields an empty label instead of a bogus span.
pub fn format_elapsed(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(t) => format_span(Utc::now() - t),
        None => String::new(),
    }
}

/// Renders a span with its most significant unit: the first of days, hours,
/// minutes, seconds whose magnitude is at least one. The value is truncated,
/// not rounded.
pub fn format_span(span: Duration) -> String {
    if span.num_days() >= 1 {
        format!("{}d", span.num_days())
    } else if span.num_hours() >= 1 {
        format!("{}h", span.num_hours())
    } else if span.num_minutes() >= 1 {
        format!("{}m", span.num_minutes())
    } else {
        format!("{}s", span.num_seconds())
    }
}

/// CPU usage column: always millicores.
pub fn format_cpu(millicores: i64) -> String {
    format!("{}m", millicores)
}

/// Memory usage column: always whole mebibytes, the way `kubectl top`
/// reports it.
pub fn format_memory(bytes: i64) -> String {
    format!("{}Mi", bytes / (1024 * 1024))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_unit_ladder() {
        assert_eq!(format_span(Duration::minutes(90)), "1h");
        assert_eq!(format_span(Duration::hours(25)), "1d");
        assert_eq!(format_span(Duration::seconds(45)), "45s");
        assert_eq!(format_span(Duration::minutes(59)), "59m");
        assert_eq!(format_span(Duration::hours(23)), "23h");
        assert_eq!(format_span(Duration::days(400)), "400d");
        assert_eq!(format_span(Duration::zero()), "0s");
    }

    #[test]
    fn test_span_truncates_instead_of_rounding() {
        assert_eq!(format_span(Duration::minutes(119)), "1h");
        assert_eq!(format_span(Duration::hours(47)), "1d");
        assert_eq!(format_span(Duration::seconds(119)), "1m");
    }

    #[test]
    fn test_never_sentinel_is_empty() {
        assert_eq!(format_elapsed(None), "");
    }

    #[test]
    fn test_elapsed_from_timestamp() {
        let started = Utc::now() - Duration::minutes(90);
        assert_eq!(format_elapsed(Some(started)), "1h");
    }

    #[test]
    fn test_quantity_display() {
        assert_eq!(format_cpu(2000), "2000m");
        assert_eq!(format_cpu(0), "0m");
        assert_eq!(format_memory(1024 * 1024 * 1024), "1024Mi");
        assert_eq!(format_memory(512 * 1024 * 1024), "512Mi");
        assert_eq!(format_memory(100), "0Mi");
    }
}
