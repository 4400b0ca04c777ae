// crates/clipstrip-core/src/media_types.rs
//
// Types that flow between the media side (playback handle notifications,
// thumbnail worker results) and the editor state.
// No decoder, no threads — just plain data.

use crate::state::SourceRef;

/// Notifications emitted by a playback `MediaHandle`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MediaEvent {
    /// Periodic position report while playing (or after a seek lands).
    TimeUpdated(f64),
    /// Metadata finished loading; the source is this many seconds long.
    DurationKnown(f64),
    /// Playback reached the end of the source.
    Ended,
}

/// A captured video still, tightly packed RGBA8 (no stride padding).
#[derive(Clone, Debug, PartialEq)]
pub struct Still {
    pub width:  u32,
    pub height: u32,
    pub data:   Vec<u8>,
}

impl Still {
    /// Wrap `data`, checking that it holds exactly `width * height` RGBA pixels.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        (data.len() == width as usize * height as usize * 4).then_some(Self { width, height, data })
    }

    /// Single-colour still, used by placeholders and test decoders.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba.iter().copied().cycle().take(width as usize * height as usize * 4).collect();
        Self { width, height, data }
    }
}

/// Results sent from the thumbnail worker thread to whoever owns the strip.
///
/// Every variant carries the `generation` of the job that produced it so
/// results from a cancelled source can be recognised and dropped.
#[derive(Clone, Debug)]
pub enum ThumbnailResult {
    Started  { generation: u64, source: SourceRef, segment_count: usize, segment_width: f64 },
    Ready    { generation: u64, index: usize, still: Still },
    Failed   { generation: u64, index: usize, msg: String },
    Finished { generation: u64 },
}

impl ThumbnailResult {
    pub fn generation(&self) -> u64 {
        match self {
            ThumbnailResult::Started  { generation, .. }
            | ThumbnailResult::Ready  { generation, .. }
            | ThumbnailResult::Failed { generation, .. }
            | ThumbnailResult::Finished { generation } => *generation,
        }
    }
}
