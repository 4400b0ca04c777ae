// crates/clipstrip-media/src/lib.rs
//
// Thumbnail generation. No UI dependency — communicates with the editor state
// via ThumbnailResult over a channel only.
//
// To add a new decoder backend:
//   1. Implement DecodingHandle + DecoderFactory in a new module
//   2. Add it below (behind a feature if it links native libraries)
//   3. Hand the factory to ThumbnailWorker::new

pub mod decode;
pub mod still;
pub mod worker;

mod helpers;
#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;

// Re-export the main public API so callers' imports stay short.
pub use decode::{DecoderFactory, DecodingHandle};
pub use worker::{ThumbnailSettings, ThumbnailWorker};
pub use clipstrip_core::media_types::{Still, ThumbnailResult};
