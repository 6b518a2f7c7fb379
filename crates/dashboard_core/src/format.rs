//! Human-readable sizes and rates for display.

const BYTE_UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];
const RATE_UNITS: [&str; 5] = ["bps", "Kbps", "Mbps", "Gbps", "Tbps"];

/// Formats a byte count with decimal (1000-based) units, e.g. `1.5 GB`.
pub fn format_bytes(bytes: u64) -> String {
    scale(bytes as f64, &BYTE_UNITS)
}

/// Formats a bit rate, e.g. `12.4 Mbps`. Negative or non-finite input renders as `-`.
pub fn format_rate(bits_per_second: f64) -> String {
    if !bits_per_second.is_finite() || bits_per_second < 0.0 {
        return "-".to_string();
    }
    scale(bits_per_second, &RATE_UNITS)
}

/// `42%`, or `N/A` when there is no percentage.
pub fn format_percent(percent: Option<u32>) -> String {
    match percent {
        Some(pct) => format!("{pct}%"),
        None => "N/A".to_string(),
    }
}

fn scale(mut value: f64, units: &[&str]) -> String {
    let mut unit = 0;
    while value >= 1000.0 && unit + 1 < units.len() {
        value /= 1000.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", value.round() as u64, units[0])
    } else {
        format!("{:.1} {}", value, units[unit])
    }
}
