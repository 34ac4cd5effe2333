//! Resource quantity parsing and the usage-ratio arithmetic behind every
//! percentage column.

/// A usage/allocatable ratio held at two fractional digits, rounded toward
/// positive infinity so utilization is never under-reported.
///
/// Stored in hundredths of the ratio. The rendered percentage is the ratio
/// times 100 with any remaining fraction dropped; at two-digit scale that
/// multiply is exact, so [`UsageRatio::percent`] returns the stored value
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UsageRatio(i64);

impl UsageRatio {
    /// Integer percentage for display.
    pub fn percent(self) -> i64 {
        self.0
    }
}

/// Computes `usage / allocatable`, rounded up to two fractional digits.
///
/// Returns `None` when `allocatable` is zero (or negative): the ratio is
/// undefined and callers skip the percentage rather than report zero.
pub fn compute_usage_ratio(usage: i64, allocatable: i64) -> Option<UsageRatio> {
    if allocatable <= 0 {
        return None;
    }
    let scaled = usage as i128 * 100;
    let divisor = allocatable as i128;
    let mut hundredths = scaled / divisor;
    if scaled % divisor != 0 && scaled > 0 {
        hundredths += 1;
    }
    Some(UsageRatio(hundredths as i64))
}

/// Splits a quantity string into its numeric part and unit suffix.
fn split_quantity(q: &str) -> (&str, &str) {
    let boundary = q
        .find(|c: char| !c.is_ascii_digit() && c != '.' && c != '-' && c != '+')
        .unwrap_or(q.len());
    q.split_at(boundary)
}

/// Parses a Kubernetes CPU quantity (`250m`, `2`, `0.5`, `1500000000n`) into
/// millicores.
pub fn parse_cpu_millicores(q: &str) -> Option<i64> {
    let (number, unit) = split_quantity(q.trim());
    if number.is_empty() {
        return None;
    }
    match unit {
        "n" => number.parse::<i128>().ok().map(|n| (n / 1_000_000) as i64),
        "u" => number.parse::<i128>().ok().map(|n| (n / 1_000) as i64),
        "m" => number.parse::<i64>().ok(),
        "" => number
            .parse::<f64>()
            .ok()
            .map(|cores| (cores * 1000.0).round() as i64),
        _ => None,
    }
}

/// Parses a Kubernetes memory quantity (`128974848`, `512Mi`, `1G`) into
/// bytes. Binary and decimal suffixes are both accepted.
pub fn parse_memory_bytes(q: &str) -> Option<i64> {
    let (number, unit) = split_quantity(q.trim());
    if number.is_empty() {
        return None;
    }
    if unit.is_empty() {
        return number.parse::<i64>().ok();
    }
    let scale: i64 = match unit {
        "k" | "K" => 1000,
        "M" => 1000_i64.pow(2),
        "G" => 1000_i64.pow(3),
        "T" => 1000_i64.pow(4),
        "P" => 1000_i64.pow(5),
        "E" => 1000_i64.pow(6),
        "Ki" => 1024,
        "Mi" => 1024_i64.pow(2),
        "Gi" => 1024_i64.pow(3),
        "Ti" => 1024_i64.pow(4),
        "Pi" => 1024_i64.pow(5),
        "Ei" => 1024_i64.pow(6),
        _ => return None,
    };
    number
        .parse::<f64>()
        .ok()
        .map(|v| (v * scale as f64).round() as i64)
}
