// crates/clipstrip-core/src/commands.rs
//
// Every user action on the player, timeline and thumbnail grid is expressed
// as an EditorCommand. Widgets emit these; PlaybackController::apply runs
// them. Adding a control = add a variant here + one match arm in apply().

use crate::state::ClipId;

#[derive(Debug, Clone, PartialEq)]
pub enum EditorCommand {
    // ── Transport ────────────────────────────────────────────────────────────
    Play,
    Pause,
    TogglePlay,
    /// Absolute seek in seconds within the loaded clip.
    Seek(f64),
    /// Relative seek (skip back / skip forward buttons).
    Skip(f64),

    // ── Audio ────────────────────────────────────────────────────────────────
    SetVolume(f32),
    ToggleMute,

    // ── Timeline / grid ──────────────────────────────────────────────────────
    /// Load a clip from the timeline: pauses and rewinds to 0.
    SelectClip(ClipId),
    /// Click on the single-track scrubber at this ratio of its width.
    SeekPointer(f64),
    /// Click on the multi-clip timeline at this ratio of its width.
    SeekTimeline(f64),
    /// Click on a thumbnail: jump to the start of that segment.
    SeekSegment(usize),
}
