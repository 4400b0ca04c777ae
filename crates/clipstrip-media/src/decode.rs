// crates/clipstrip-media/src/decode.rs
//
// The private decoding capability used for thumbnails.
//
// A DecodingHandle is opened per source by the worker and is never the
// playback handle — seeking it must not move the user's playhead.

use anyhow::Result;

use clipstrip_core::media_types::Still;
use clipstrip_core::state::SourceRef;

/// One open decoder positioned somewhere in a source.
pub trait DecodingHandle: Send {
    /// Source length in seconds, if the container reports one.
    fn duration(&self) -> Option<f64>;

    /// Seek to `t` seconds and block until a frame at (or just after) `t`
    /// has been decoded.
    fn seek_to(&mut self, t: f64) -> Result<()>;

    /// Rasterise the frame from the last successful `seek_to` into a
    /// `width` x `height` RGBA still.
    fn capture_still(&mut self, width: u32, height: u32) -> Result<Still>;

    /// Free decoder resources. Called exactly once by the worker when the
    /// job ends or is cancelled; the handle is dropped right after.
    fn release(&mut self) {}
}

/// Opens decoding handles. Shared by every job the worker runs.
pub trait DecoderFactory: Send + Sync + 'static {
    fn open(&self, source: &SourceRef) -> Result<Box<dyn DecodingHandle>>;
}
