// crates/clipstrip-core/src/helpers/track.rs
//
// Pointer <-> time mapping for timeline tracks.
//
// Two shapes:
//   single track  — one source spanning the whole width.
//   multi-clip    — clips laid out left to right in proportion to their share
//                   of the total duration. A pointer hit resolves to a clip
//                   plus a time local to that clip, because the player only
//                   ever has one clip loaded.
//
// Everything here is pure. Pointer positions arrive as ratios in [0, 1];
// pointer_ratio() does the pixel → ratio step for hosts that need it.

use crate::state::{Clip, ClipId};

/// Normalise a pointer x coordinate against a track rect. Degenerate rects
/// map to 0.
pub fn pointer_ratio(x: f32, left: f32, width: f32) -> f64 {
    if !(width > 0.0) {
        return 0.0;
    }
    clamp_ratio(((x - left) / width) as f64)
}

fn clamp_ratio(r: f64) -> f64 {
    if r.is_finite() { r.clamp(0.0, 1.0) } else { 0.0 }
}

// ── Single track ──────────────────────────────────────────────────────────────

/// Seek target for a click at `ratio` along a track of `duration` seconds.
///
/// ```
/// use clipstrip_core::helpers::track::time_from_pointer;
/// assert_eq!(time_from_pointer(0.25, 40.0), 10.0);
/// assert_eq!(time_from_pointer(1.5, 40.0), 40.0);
/// ```
pub fn time_from_pointer(ratio: f64, duration: f64) -> f64 {
    if !(duration > 0.0) || !duration.is_finite() {
        return 0.0;
    }
    clamp_ratio(ratio) * duration
}

/// Playhead offset in percent. A zero or unknown duration yields 0 instead
/// of dividing by zero.
///
/// ```
/// use clipstrip_core::helpers::track::percent_from_time;
/// assert_eq!(percent_from_time(5.0, 20.0), 25.0);
/// assert_eq!(percent_from_time(5.0, 0.0), 0.0);
/// ```
pub fn percent_from_time(time: f64, duration: f64) -> f64 {
    if !(duration > 0.0) || !duration.is_finite() || !time.is_finite() {
        return 0.0;
    }
    (time / duration * 100.0).clamp(0.0, 100.0)
}

// ── Multi-clip track ──────────────────────────────────────────────────────────

/// Horizontal extent of one clip on a multi-clip track.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipSpan {
    pub clip_id:       ClipId,
    /// Seconds from the start of the timeline to the start of this clip.
    pub start_time:    f64,
    pub duration:      f64,
    pub start_percent: f64,
    pub end_percent:   f64,
}

impl ClipSpan {
    pub fn width_percent(&self) -> f64 { self.end_percent - self.start_percent }
}

/// Result of resolving a pointer on a multi-clip track.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipHit {
    pub clip_id:    ClipId,
    pub clip_index: usize,
    /// Seconds into the hit clip.
    pub local_time: f64,
}

/// Proportional layout of a clip sequence.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClipLayout {
    spans: Vec<ClipSpan>,
    total: f64,
}

impl ClipLayout {
    pub fn new(clips: &[Clip]) -> Self {
        let total: f64 = clips.iter().map(Clip::duration_secs).sum();
        let mut spans = Vec::with_capacity(clips.len());
        if total > 0.0 {
            // Each end is computed exactly like the next start, so adjacent
            // spans share their boundary bit-for-bit.
            let mut elapsed = 0.0;
            for clip in clips {
                let start_percent = elapsed / total * 100.0;
                let start_time    = elapsed;
                elapsed += clip.duration_secs();
                spans.push(ClipSpan {
                    clip_id:       clip.id,
                    start_time,
                    duration:      clip.duration_secs(),
                    start_percent,
                    end_percent:   elapsed / total * 100.0,
                });
            }
        }
        Self { spans, total }
    }

    pub fn spans(&self) -> &[ClipSpan] { &self.spans }

    pub fn total_duration(&self) -> f64 { self.total }

    pub fn span(&self, id: ClipId) -> Option<&ClipSpan> {
        self.spans.iter().find(|s| s.clip_id == id)
    }

    /// Clip under the pointer and the time within it.
    ///
    /// Ranges are `[start, end)` so a pointer exactly on a boundary belongs to
    /// the later clip; the last clip is closed at 100%.
    pub fn resolve(&self, ratio: f64) -> Option<ClipHit> {
        let p    = clamp_ratio(ratio) * 100.0;
        let last = self.spans.len().checked_sub(1)?;
        let (clip_index, span) = self.spans.iter().enumerate().find(|(i, s)| {
            p >= s.start_percent && (p < s.end_percent || (*i == last && p <= s.end_percent))
        })?;
        let width = span.width_percent();
        let local_time = if width > 0.0 {
            ((p - span.start_percent) / width * span.duration).clamp(0.0, span.duration)
        } else {
            0.0
        };
        Some(ClipHit { clip_id: span.clip_id, clip_index, local_time })
    }

    /// Global timeline time under the pointer (hover readout).
    pub fn time_at(&self, ratio: f64) -> f64 {
        clamp_ratio(ratio) * self.total
    }

    /// Playhead position for `local_time` seconds into clip `id`.
    /// Unknown clips put the playhead at 0.
    pub fn playhead_percent(&self, id: ClipId, local_time: f64) -> f64 {
        let Some(span) = self.span(id) else { return 0.0 };
        let frac = if span.duration > 0.0 && local_time.is_finite() {
            (local_time / span.duration).clamp(0.0, 1.0)
        } else {
            0.0
        };
        span.start_percent + frac * span.width_percent()
    }

    /// Global timeline time for a clip-local time.
    pub fn global_time(&self, id: ClipId, local_time: f64) -> Option<f64> {
        self.span(id).map(|s| s.start_time + local_time.clamp(0.0, s.duration))
    }
}
