// crates/clipstrip-core/src/segments.rs
//
// Fixed-width time buckets. Segments are never stored — they are derived
// from the total duration and the bucket width on demand. Thumbnails,
// grid cells and the "active frame" highlight are all keyed by segment index.

use serde::{Deserialize, Serialize};

/// Default bucket width in seconds.
pub const DEFAULT_SEGMENT_WIDTH: f64 = 3.0;

/// One derived bucket: `[start, end)`, except the last which ends at the
/// total duration and may be shorter than the width.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub index: usize,
    pub start: f64,
    pub end:   f64,
}

impl Segment {
    pub fn duration(&self) -> f64 { self.end - self.start }

    pub fn contains(&self, t: f64) -> bool { t >= self.start && t < self.end }
}

/// Maps continuous time to segment indices for one media source.
///
/// `total` is `None` while the duration is still being probed; an index
/// built from an unknown duration has zero segments.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentIndex {
    total: Option<f64>,
    width: f64,
}

impl SegmentIndex {
    /// Build an index over `total` seconds with `width`-second buckets.
    /// A non-positive or non-finite width falls back to the default.
    pub fn new(total: Option<f64>, width: f64) -> Self {
        let width = if width.is_finite() && width > 0.0 { width } else { DEFAULT_SEGMENT_WIDTH };
        let total = total.filter(|t| t.is_finite() && *t >= 0.0);
        Self { total, width }
    }

    pub fn with_default_width(total: Option<f64>) -> Self {
        Self::new(total, DEFAULT_SEGMENT_WIDTH)
    }

    pub fn width(&self) -> f64 { self.width }

    pub fn total(&self) -> Option<f64> { self.total }

    /// Number of segments: `ceil(total / width)`, or 0 when unknown.
    ///
    /// ```
    /// use clipstrip_core::segments::SegmentIndex;
    /// assert_eq!(SegmentIndex::with_default_width(Some(9.0)).count(),  3);
    /// assert_eq!(SegmentIndex::with_default_width(Some(10.0)).count(), 4);
    /// assert_eq!(SegmentIndex::with_default_width(Some(0.0)).count(),  0);
    /// assert_eq!(SegmentIndex::with_default_width(None).count(),       0);
    /// ```
    pub fn count(&self) -> usize {
        match self.total {
            Some(t) if t > 0.0 => (t / self.width).ceil() as usize,
            _ => 0,
        }
    }

    /// Segment containing `t`, clamped into `[0, count - 1]`.
    /// `None` only when there are no segments.
    pub fn index_of(&self, t: f64) -> Option<usize> {
        let count = self.count();
        if count == 0 {
            return None;
        }
        let t = if t.is_finite() { t.max(0.0) } else { 0.0 };
        let raw = (t / self.width).floor() as usize;
        Some(raw.min(count - 1))
    }

    /// `[index * width, min((index + 1) * width, total)]`.
    pub fn bounds_of(&self, index: usize) -> Option<(f64, f64)> {
        if index >= self.count() {
            return None;
        }
        let total = self.total?;
        let start = index as f64 * self.width;
        let end   = ((index + 1) as f64 * self.width).min(total);
        Some((start, end))
    }

    pub fn segment(&self, index: usize) -> Option<Segment> {
        self.bounds_of(index).map(|(start, end)| Segment { index, start, end })
    }

    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        (0..self.count()).filter_map(move |i| self.segment(i))
    }
}
