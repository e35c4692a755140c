/// Size formatting utilities — human-readable byte counts.
///
/// All internal sizes are `u64` bytes. Floating point is only used
/// at the display-formatting boundary.

/// Binary unit labels, indexed by power of 1024.
const UNITS: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

/// Format a byte count with one decimal in the largest fitting binary unit.
///
/// A value exactly on a unit boundary stays in the smaller unit
/// (`1024` → `"1024.0 B"`), matching the size column users already know.
pub fn format_size(bytes: u64) -> String {
    let mut power = 0;
    while power + 1 < UNITS.len() && 1024f64.powi(power as i32 + 1) < bytes as f64 {
        power += 1;
    }
    format!(
        "{:.1} {}",
        bytes as f64 / 1024f64.powi(power as i32),
        UNITS[power]
    )
}

/// Compact label for a threshold: whole binary units print without decimals.
///
/// `1_048_576` → `"1 MiB"`, `1536` → `"1536 B"`.
pub fn format_threshold(bytes: u64) -> String {
    let mut power = 0;
    let mut value = bytes;
    while power + 1 < UNITS.len() && value >= 1024 && value % 1024 == 0 {
        value /= 1024;
        power += 1;
    }
    format!("{value} {}", UNITS[power])
}

/// Format a file count with thousand separators.
pub fn format_count(count: u64) -> String {
    if count < 1_000 {
        return count.to_string();
    }
    let s = count.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}
