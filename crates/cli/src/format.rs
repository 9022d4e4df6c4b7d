//! Human-readable formatting for CLI output.

use std::time::Duration;

const UNITS: [(&str, f64); 4] = [
    ("TB", 1024.0 * 1024.0 * 1024.0 * 1024.0),
    ("GB", 1024.0 * 1024.0 * 1024.0),
    ("MB", 1024.0 * 1024.0),
    ("KB", 1024.0),
];

fn scaled(amount: f64) -> String {
    UNITS
        .iter()
        .find(|(_, size)| amount >= *size)
        .map(|(unit, size)| format!("{:.2} {unit}", amount / size))
        .unwrap_or_else(|| format!("{amount:.0} bytes"))
}

pub fn format_bytes(bytes: u64) -> String {
    scaled(bytes as f64)
}

/// Throughput in bytes per second; non-finite rates render as unknown.
pub fn format_rate(bytes_per_sec: f64) -> String {
    if !bytes_per_sec.is_finite() || bytes_per_sec < 0.0 {
        return "? /s".to_string();
    }
    format!("{}/s", scaled(bytes_per_sec))
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{hours}h {minutes:02}m {seconds:02}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes() {
        assert_eq!(format_bytes(512), "512 bytes");
        assert_eq!(format_bytes(25_000_000), "23.84 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn rates() {
        assert_eq!(format_rate(2048.0), "2.00 KB/s");
        assert_eq!(format_rate(12.4), "12 bytes/s");
        assert_eq!(format_rate(f64::INFINITY), "? /s");
        assert_eq!(format_rate(f64::NAN), "? /s");
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_secs(45)), "45s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 05s");
        assert_eq!(format_duration(Duration::from_secs(3723)), "1h 02m 03s");
    }
}
