// crates/clipstrip-core/src/state.rs
// Pure editor data — no decoder, no runtime handles.
// Serializable via serde except the thumbnail strip, which is rebuilt from
// the worker on every load.
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::ClipError;
use crate::helpers::track::ClipLayout;
use crate::media_types::{Still, ThumbnailResult};
use crate::segments::SegmentIndex;

pub type ClipId = Uuid;

/// Opaque reference to a playable source (file path or URL). The core never
/// opens it; handles and decoder factories interpret it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef(pub String);

impl SourceRef {
    pub fn new(s: impl Into<String>) -> Self { Self(s.into()) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// One playable unit on the timeline. Immutable once loaded.
///
/// `duration_secs` is always finite and positive: every constructor,
/// deserialization included, goes through the same check.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawClip")]
pub struct Clip {
    pub id:          ClipId,
    pub title:       String,
    duration_secs:   f64,
    pub start_frame: u64,
    pub source:      SourceRef,
}

/// Unchecked wire form of `Clip`.
#[derive(Deserialize)]
struct RawClip {
    id:            ClipId,
    title:         String,
    duration_secs: f64,
    start_frame:   u64,
    source:        SourceRef,
}

impl TryFrom<RawClip> for Clip {
    type Error = ClipError;

    fn try_from(raw: RawClip) -> Result<Self, ClipError> {
        check_duration(raw.duration_secs)?;
        Ok(Self {
            id:            raw.id,
            title:         raw.title,
            duration_secs: raw.duration_secs,
            start_frame:   raw.start_frame,
            source:        raw.source,
        })
    }
}

fn check_duration(d: f64) -> Result<(), ClipError> {
    if d.is_finite() && d > 0.0 { Ok(()) } else { Err(ClipError::InvalidDuration(d)) }
}

impl Clip {
    pub fn new(
        title:         impl Into<String>,
        duration_secs: f64,
        start_frame:   u64,
        source:        SourceRef,
    ) -> Result<Self, ClipError> {
        check_duration(duration_secs)?;
        Ok(Self { id: Uuid::new_v4(), title: title.into(), duration_secs, start_frame, source })
    }

    pub fn duration_secs(&self) -> f64 { self.duration_secs }
}

/// Ordered clips; insertion order is playback order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    clips: Vec<Clip>,
}

/// One cell of the all-clips thumbnail grid.
#[derive(Clone, Debug, PartialEq)]
pub struct GridCell {
    pub clip_id:       ClipId,
    pub segment_index: usize,
    /// Seconds into the clip.
    pub time:          f64,
    pub is_current:    bool,
}

impl Timeline {
    pub fn new(clips: Vec<Clip>) -> Result<Self, ClipError> {
        if clips.is_empty() {
            return Err(ClipError::EmptyTimeline);
        }
        for clip in &clips {
            check_duration(clip.duration_secs)?;
        }
        Ok(Self { clips })
    }

    /// Append `clip` to the end of playback order.
    pub fn push(&mut self, clip: Clip) -> Result<(), ClipError> {
        check_duration(clip.duration_secs)?;
        self.clips.push(clip);
        Ok(())
    }

    pub fn clips(&self) -> &[Clip] { &self.clips }

    pub fn is_empty(&self) -> bool { self.clips.is_empty() }

    pub fn clip(&self, id: ClipId) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == id)
    }

    pub fn total_duration(&self) -> f64 {
        self.clips.iter().map(Clip::duration_secs).sum()
    }

    pub fn layout(&self) -> ClipLayout { ClipLayout::new(&self.clips) }

    /// Every clip's segments flattened into one grid, in playback order.
    /// Cells belonging to `current` are flagged so the grid can highlight them.
    pub fn segment_grid(&self, current: Option<ClipId>, width: f64) -> Vec<GridCell> {
        self.clips.iter()
            .flat_map(|clip| {
                let is_current = current == Some(clip.id);
                SegmentIndex::new(Some(clip.duration_secs), width)
                    .segments()
                    .map(move |seg| GridCell {
                        clip_id:       clip.id,
                        segment_index: seg.index,
                        time:          seg.start,
                        is_current,
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayState {
    /// No source assigned yet.
    Idle,
    Paused,
    Playing,
}

/// Everything observers may read about playback. Owned and written only by
/// `PlaybackController`; everyone else gets a snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub source:        Option<SourceRef>,
    pub selected_clip: Option<ClipId>,
    pub current_time:  f64,
    /// `None` until the handle reports metadata (or a clip supplies a hint).
    pub duration:      Option<f64>,
    pub play_state:    PlayState,
    pub volume:        f32,
    pub muted:         bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            source:        None,
            selected_clip: None,
            current_time:  0.0,
            duration:      None,
            play_state:    PlayState::Idle,
            volume:        1.0,
            muted:         false,
        }
    }
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool { self.play_state == PlayState::Playing }

    pub fn segment_index(&self, width: f64) -> SegmentIndex {
        SegmentIndex::new(self.duration, width)
    }
}

/// One thumbnail slot. `still` stays `None` while pending and forever if
/// generation for this segment failed.
#[derive(Clone, Debug, PartialEq)]
pub struct Thumbnail {
    pub segment_index: usize,
    pub start_time:    f64,
    pub still:         Option<Still>,
}

impl Thumbnail {
    pub fn is_ready(&self) -> bool { self.still.is_some() }
}

/// Per-segment thumbnails for the current source, fed by worker results.
///
/// Only results tagged with the current generation are applied; anything
/// from an older (cancelled) job is dropped.
#[derive(Clone, Debug, Default)]
pub struct ThumbnailStrip {
    generation: u64,
    source:     Option<SourceRef>,
    slots:      Vec<Thumbnail>,
    finished:   bool,
}

impl ThumbnailStrip {
    pub fn new() -> Self { Self::default() }

    /// Forget everything and accept only results for `generation` from now on.
    pub fn begin(&mut self, generation: u64, source: SourceRef) {
        self.generation = generation;
        self.source     = Some(source);
        self.slots.clear();
        self.finished   = false;
    }

    pub fn generation(&self) -> u64 { self.generation }

    pub fn source(&self) -> Option<&SourceRef> { self.source.as_ref() }

    pub fn thumbnails(&self) -> &[Thumbnail] { &self.slots }

    pub fn get(&self, index: usize) -> Option<&Thumbnail> { self.slots.get(index) }

    pub fn ready_count(&self) -> usize { self.slots.iter().filter(|t| t.is_ready()).count() }

    pub fn is_finished(&self) -> bool { self.finished }

    /// Apply one worker result. Returns `true` if the strip changed.
    pub fn apply(&mut self, result: ThumbnailResult) -> bool {
        if result.generation() != self.generation {
            debug!(
                "[thumbs] dropping stale result gen={} (current {})",
                result.generation(), self.generation
            );
            return false;
        }
        match result {
            ThumbnailResult::Started { segment_count, segment_width, source, .. } => {
                if self.source.as_ref() != Some(&source) {
                    self.source = Some(source);
                }
                self.slots = (0..segment_count)
                    .map(|i| Thumbnail {
                        segment_index: i,
                        start_time:    i as f64 * segment_width,
                        still:         None,
                    })
                    .collect();
                true
            }
            ThumbnailResult::Ready { index, still, .. } => match self.slots.get_mut(index) {
                Some(slot) => {
                    slot.still = Some(still);
                    true
                }
                None => false,
            },
            // Slot stays a placeholder; the worker already logged the cause.
            ThumbnailResult::Failed { .. } => false,
            ThumbnailResult::Finished { .. } => {
                self.finished = true;
                true
            }
        }
    }
}
