//! Chapter timestamp parsing and formatting.
//!
//! The inference backend reports chapter starts as `MM:SS` or `H:MM:SS`
//! strings. Anything else parses to zero rather than failing the run.

/// Duration assigned to the last chapter, which has no following boundary
pub const LAST_CHAPTER_DURATION_SECS: i32 = 60;

/// Parse `MM:SS` or `HH:MM:SS` into seconds. Other shapes yield 0.
pub fn parse_timestamp(timestamp: &str) -> i32 {
    let fields: Option<Vec<u64>> = timestamp
        .split(':')
        .map(|field| field.trim().parse::<u64>().ok())
        .collect();

    let seconds = match fields.as_deref() {
        Some([minutes, seconds]) => minutes.saturating_mul(60).saturating_add(*seconds),
        Some([hours, minutes, seconds]) => hours
            .saturating_mul(3600)
            .saturating_add(minutes.saturating_mul(60))
            .saturating_add(*seconds),
        _ => 0,
    };

    i32::try_from(seconds).unwrap_or(0)
}

/// Format seconds as `H:MM:SS` when an hour or more, otherwise `M:SS`.
///
/// Not the exact inverse of [`parse_timestamp`]: zero-padded minutes
/// (`"02:05"`) and zero-padded or zero hours (`"01:02:03"`, `"0:02:05"`)
/// come back in canonical form.
pub fn format_timestamp(seconds: i32) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Duration of each chapter given the sorted start offsets.
pub fn chapter_durations(starts: &[i32]) -> Vec<i32> {
    starts
        .iter()
        .enumerate()
        .map(|(i, start)| match starts.get(i + 1) {
            Some(next) => next - start,
            None => LAST_CHAPTER_DURATION_SECS,
        })
        .collect()
}
