// crates/clipstrip-core/src/helpers/time.rs
//
// Time-formatting and ruler utilities shared by the player readout, the
// timeline header and the thumbnail overlays.
//
// Canonical source for format_time(). Every readout in the editor uses the
// same `M:SS` shape so the player, the ruler and the thumbnail badges agree.

/// Default spacing of timeline ruler markers, in seconds.
pub const DEFAULT_MARKER_INTERVAL: f64 = 30.0;

/// Format a time in seconds as `M:SS`.
///
/// Minutes are unbounded (no hour rollover) and both fields are floored.
/// NaN and negative input render as `0:00`.
///
/// ```
/// use clipstrip_core::helpers::time::format_time;
/// assert_eq!(format_time(0.0),    "0:00");
/// assert_eq!(format_time(65.0),   "1:05");
/// assert_eq!(format_time(3600.0), "60:00");
/// ```
pub fn format_time(s: f64) -> String {
    let s  = if s.is_finite() && s > 0.0 { s } else { 0.0 };
    let m  = (s / 60.0).floor() as u64;
    let sc = (s % 60.0).floor() as u64;
    format!("{m}:{sc:02}")
}

/// Ruler markers every `interval` seconds from 0 up to and including
/// `duration`, as `(time, percent_of_track)` pairs.
///
/// Returns an empty vec when either argument is not strictly positive.
///
/// ```
/// use clipstrip_core::helpers::time::time_markers;
/// let m = time_markers(75.0, 30.0);
/// assert_eq!(m.len(), 3);
/// assert_eq!(m[1].0, 30.0);
/// assert!((m[1].1 - 40.0).abs() < 1e-9);
/// ```
pub fn time_markers(duration: f64, interval: f64) -> Vec<(f64, f64)> {
    if !(duration > 0.0) || !(interval > 0.0) {
        return Vec::new();
    }
    let count = (duration / interval).ceil() as u64;
    (0..=count)
        .map(|i| i as f64 * interval)
        .take_while(|&t| t <= duration)
        .map(|t| (t, t / duration * 100.0))
        .collect()
}
