// crates/clipstrip-core/src/lib.rs
//
// Pure editor data and the playback controller. No decoder, no threads —
// clipstrip-media talks to this crate through the types in media_types.

pub mod commands;
pub mod config;
pub mod error;
pub mod helpers;
pub mod media_types;
pub mod playback;
pub mod segments;
pub mod state;

pub use commands::EditorCommand;
pub use config::EditorConfig;
pub use error::{ClipError, ConfigError, PlaybackError};
pub use media_types::{MediaEvent, Still, ThumbnailResult};
pub use playback::{MediaHandle, PlaybackController, SubscriptionId};
pub use segments::{Segment, SegmentIndex, DEFAULT_SEGMENT_WIDTH};
pub use state::{Clip, ClipId, PlayState, PlaybackState, SourceRef, Thumbnail, ThumbnailStrip, Timeline};
