// crates/clipstrip-core/src/playback.rs
//
// PlaybackController: the single owner of playback state.
//
// Everything that moves the playhead, starts or stops playback, or touches
// volume goes through here. The controller drives an abstract MediaHandle
// (the host's media element / player) and republishes a PlaybackState
// snapshot to observers synchronously after every change.
//
// State machine:
//   Idle ──load_source──▶ Paused ⇄ Playing
//                          ▲          │
//                          └─ Ended ──┘   (parks at duration)
//
// Nothing here fails loudly. Out-of-range input is clamped, requests that
// arrive before a source or duration is known are ignored, and the only
// error a caller ever sees is play() without a source.

use std::error::Error as StdError;

use tracing::{debug, info, warn};

use crate::commands::EditorCommand;
use crate::config::EditorConfig;
use crate::error::PlaybackError;
use crate::helpers::track::{percent_from_time, time_from_pointer, ClipHit};
use crate::media_types::MediaEvent;
use crate::segments::SegmentIndex;
use crate::state::{ClipId, PlayState, PlaybackState, SourceRef, Timeline};

pub type HandleResult = Result<(), Box<dyn StdError + Send + Sync>>;

/// Capability for controlling and observing one playable source.
///
/// Implemented by the host around its real player. Notifications are pulled
/// with `poll_event`; the controller drains the queue in `pump_events`.
pub trait MediaHandle {
    /// Point the handle at a new source. Duration becomes known later via
    /// `MediaEvent::DurationKnown`.
    fn load(&mut self, source: &SourceRef);
    fn play(&mut self) -> HandleResult;
    fn pause(&mut self);

    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, t: f64);
    fn duration(&self) -> Option<f64>;

    fn volume(&self) -> f32;
    fn set_volume(&mut self, v: f32);
    fn muted(&self) -> bool;
    fn set_muted(&mut self, muted: bool);

    /// Next pending notification, if any.
    fn poll_event(&mut self) -> Option<MediaEvent>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut(&PlaybackState)>;

pub struct PlaybackController<H: MediaHandle> {
    handle:         H,
    state:          PlaybackState,
    /// Volume to restore on unmute.
    premute_volume: f32,
    timeline:       Timeline,
    segment_width:  f64,
    observers:      Vec<(SubscriptionId, Observer)>,
    next_sub:       u64,
}

impl<H: MediaHandle> PlaybackController<H> {
    pub fn new(mut handle: H, config: &EditorConfig) -> Self {
        let volume = config.default_volume.clamp(0.0, 1.0);
        handle.set_volume(volume);
        handle.set_muted(false);
        let state = PlaybackState { volume, ..PlaybackState::default() };
        Self {
            handle,
            state,
            premute_volume: volume,
            timeline:       Timeline::default(),
            segment_width:  config.segment_width_secs,
            observers:      Vec::new(),
            next_sub:       0,
        }
    }

    pub fn state(&self) -> &PlaybackState { &self.state }

    pub fn handle(&self) -> &H { &self.handle }

    pub fn handle_mut(&mut self) -> &mut H { &mut self.handle }

    pub fn timeline(&self) -> &Timeline { &self.timeline }

    pub fn set_timeline(&mut self, timeline: Timeline) { self.timeline = timeline; }

    // ── Observers ────────────────────────────────────────────────────────────

    /// Register `f` to receive a snapshot after every state change.
    pub fn subscribe(&mut self, f: impl FnMut(&PlaybackState) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_sub);
        self.next_sub += 1;
        self.observers.push((id, Box::new(f)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    fn notify(&mut self) {
        for (_, f) in self.observers.iter_mut() {
            f(&self.state);
        }
    }

    // ── Source ───────────────────────────────────────────────────────────────

    /// Assign a new source. Pauses, rewinds to 0, clears the clip selection
    /// and forgets the old duration unless `duration_hint` supplies one.
    pub fn load_source(&mut self, source: SourceRef, duration_hint: Option<f64>) {
        self.load(source, duration_hint, None);
    }

    fn load(&mut self, source: SourceRef, duration_hint: Option<f64>, clip: Option<ClipId>) {
        // Notifications still queued belong to the previous source.
        let mut stale = 0usize;
        while self.handle.poll_event().is_some() {
            stale += 1;
        }
        if stale > 0 {
            debug!("[playback] dropped {stale} stale events before load");
        }

        if self.state.is_playing() {
            self.handle.pause();
        }
        self.handle.load(&source);
        self.handle.set_volume(self.state.volume);
        self.handle.set_muted(self.state.muted);

        info!("[playback] source → {source}");
        self.state.source        = Some(source);
        self.state.selected_clip = clip;
        self.state.duration      = duration_hint.filter(|d| d.is_finite() && *d >= 0.0);
        self.state.current_time  = 0.0;
        self.state.play_state    = PlayState::Paused;
        self.notify();
    }

    /// Load clip `id` from the timeline. Returns `false` if it is not on it.
    pub fn select_clip(&mut self, id: ClipId) -> bool {
        let Some(clip) = self.timeline.clip(id) else {
            warn!("[playback] select_clip: {id} not on timeline");
            return false;
        };
        let (source, duration) = (clip.source.clone(), clip.duration_secs());
        self.load(source, Some(duration), Some(id));
        true
    }

    // ── Transport ────────────────────────────────────────────────────────────

    pub fn play(&mut self) -> Result<(), PlaybackError> {
        match self.state.play_state {
            PlayState::Idle    => return Err(PlaybackError::NoSource),
            PlayState::Playing => return Ok(()),
            PlayState::Paused  => {}
        }
        // Playing from the very end starts over, as a native player does.
        if let Some(d) = self.state.duration {
            if d > 0.0 && self.state.current_time >= d {
                self.handle.set_current_time(0.0);
                self.state.current_time = 0.0;
            }
        }
        self.handle.play().map_err(|e| {
            warn!("[playback] handle refused play: {e}");
            PlaybackError::Media { op: "play", msg: e.to_string() }
        })?;
        self.state.play_state = PlayState::Playing;
        self.notify();
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.state.play_state != PlayState::Playing {
            return;
        }
        self.handle.pause();
        self.state.play_state = PlayState::Paused;
        self.notify();
    }

    pub fn toggle_play(&mut self) -> Result<(), PlaybackError> {
        if self.state.is_playing() {
            self.pause();
            Ok(())
        } else {
            self.play()
        }
    }

    /// Seek within the loaded source, clamped to `[0, duration]`.
    /// Ignored while idle or while the duration is unknown. Play state is
    /// left as it was.
    pub fn seek(&mut self, t: f64) {
        if self.state.play_state == PlayState::Idle {
            debug!("[playback] seek ignored: no source");
            return;
        }
        let Some(duration) = self.state.duration else {
            debug!("[playback] seek ignored: duration unknown");
            return;
        };
        let t = if t.is_finite() { t.clamp(0.0, duration) } else { 0.0 };
        self.handle.set_current_time(t);
        // Optimistic: the handle reports the landed position later.
        self.state.current_time = t;
        self.notify();
    }

    pub fn skip(&mut self, delta: f64) {
        self.seek(self.state.current_time + delta);
    }

    /// Click on the single-source scrubber.
    pub fn seek_pointer(&mut self, ratio: f64) {
        if let Some(d) = self.state.duration {
            self.seek(time_from_pointer(ratio, d));
        }
    }

    /// Click on the multi-clip timeline. Switches clip when the hit lands on
    /// a different one, then seeks inside it.
    pub fn seek_timeline(&mut self, ratio: f64) -> Option<ClipHit> {
        let hit = self.timeline.layout().resolve(ratio)?;
        if self.state.selected_clip != Some(hit.clip_id) {
            self.select_clip(hit.clip_id);
        }
        self.seek(hit.local_time);
        Some(hit)
    }

    /// Jump to the start of thumbnail segment `index`.
    pub fn seek_segment(&mut self, index: usize) {
        match self.segment_index().bounds_of(index) {
            Some((start, _)) => self.seek(start),
            None => debug!("[playback] seek_segment: {index} out of range"),
        }
    }

    // ── Audio ────────────────────────────────────────────────────────────────

    /// Set volume (clamped to [0, 1]). Moving the volume unmutes.
    pub fn set_volume(&mut self, v: f32) {
        let v = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        self.handle.set_volume(v);
        if self.state.muted {
            self.handle.set_muted(false);
            self.state.muted = false;
        }
        self.state.volume   = self.handle.volume();
        self.premute_volume = self.state.volume;
        self.notify();
    }

    pub fn toggle_mute(&mut self) {
        if self.state.muted {
            self.handle.set_muted(false);
            self.handle.set_volume(self.premute_volume);
            self.state.muted  = false;
            self.state.volume = self.handle.volume();
        } else {
            self.premute_volume = self.state.volume;
            self.handle.set_muted(true);
            self.handle.set_volume(0.0);
            self.state.muted  = true;
            self.state.volume = 0.0;
        }
        self.notify();
    }

    // ── Notifications ────────────────────────────────────────────────────────

    pub fn handle_event(&mut self, event: MediaEvent) {
        if self.state.play_state == PlayState::Idle {
            debug!("[playback] {event:?} ignored: no source");
            return;
        }
        match event {
            MediaEvent::TimeUpdated(t) => {
                if !t.is_finite() { return; }
                let upper = self.state.duration.unwrap_or(f64::INFINITY);
                self.state.current_time = t.clamp(0.0, upper);
            }
            MediaEvent::DurationKnown(d) => {
                if !(d.is_finite() && d >= 0.0) {
                    warn!("[playback] ignoring bogus duration {d}");
                    return;
                }
                debug!("[playback] duration {d:.2}s");
                self.state.duration     = Some(d);
                self.state.current_time = self.state.current_time.min(d);
            }
            MediaEvent::Ended => {
                self.state.play_state = PlayState::Paused;
                if let Some(d) = self.state.duration {
                    self.state.current_time = d;
                }
            }
        }
        self.notify();
    }

    /// Drain and apply every queued handle notification. Returns how many.
    pub fn pump_events(&mut self) -> usize {
        let mut n = 0;
        while let Some(ev) = self.handle.poll_event() {
            self.handle_event(ev);
            n += 1;
        }
        n
    }

    // ── Derived views ────────────────────────────────────────────────────────

    pub fn segment_index(&self) -> SegmentIndex {
        self.state.segment_index(self.segment_width)
    }

    pub fn active_segment(&self) -> Option<usize> {
        self.segment_index().index_of(self.state.current_time)
    }

    /// Playhead position on the single-source scrubber.
    pub fn playhead_percent(&self) -> f64 {
        percent_from_time(self.state.current_time, self.state.duration.unwrap_or(0.0))
    }

    /// Playhead position on the multi-clip timeline.
    pub fn timeline_playhead_percent(&self) -> f64 {
        match self.state.selected_clip {
            Some(id) => self.timeline.layout().playhead_percent(id, self.state.current_time),
            None     => 0.0,
        }
    }

    // ── Dispatch ─────────────────────────────────────────────────────────────

    pub fn apply(&mut self, cmd: EditorCommand) -> Result<(), PlaybackError> {
        match cmd {
            EditorCommand::Play            => return self.play(),
            EditorCommand::Pause           => self.pause(),
            EditorCommand::TogglePlay      => return self.toggle_play(),
            EditorCommand::Seek(t)         => self.seek(t),
            EditorCommand::Skip(d)         => self.skip(d),
            EditorCommand::SetVolume(v)    => self.set_volume(v),
            EditorCommand::ToggleMute      => self.toggle_mute(),
            EditorCommand::SelectClip(id)  => { self.select_clip(id); }
            EditorCommand::SeekPointer(r)  => self.seek_pointer(r),
            EditorCommand::SeekTimeline(r) => { self.seek_timeline(r); }
            EditorCommand::SeekSegment(i)  => self.seek_segment(i),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Clip;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    #[derive(Default)]
    struct FakeHandle {
        source:   Option<SourceRef>,
        time:     f64,
        volume:   f32,
        muted:    bool,
        playing:  bool,
        refuse:   bool,
        events:   VecDeque<MediaEvent>,
    }

    impl MediaHandle for FakeHandle {
        fn load(&mut self, source: &SourceRef) {
            self.source  = Some(source.clone());
            self.time    = 0.0;
            self.playing = false;
        }
        fn play(&mut self) -> HandleResult {
            if self.refuse {
                return Err("autoplay blocked".into());
            }
            self.playing = true;
            Ok(())
        }
        fn pause(&mut self) { self.playing = false; }
        fn current_time(&self) -> f64 { self.time }
        fn set_current_time(&mut self, t: f64) { self.time = t; }
        fn duration(&self) -> Option<f64> { None }
        fn volume(&self) -> f32 { self.volume }
        fn set_volume(&mut self, v: f32) { self.volume = v; }
        fn muted(&self) -> bool { self.muted }
        fn set_muted(&mut self, muted: bool) { self.muted = muted; }
        fn poll_event(&mut self) -> Option<MediaEvent> { self.events.pop_front() }
    }

    fn controller() -> PlaybackController<FakeHandle> {
        PlaybackController::new(FakeHandle::default(), &EditorConfig::default())
    }

    fn loaded(duration: f64) -> PlaybackController<FakeHandle> {
        let mut c = controller();
        c.load_source(SourceRef::new("a.mp4"), None);
        c.handle_event(MediaEvent::DurationKnown(duration));
        c
    }

    #[test]
    fn play_without_source_is_rejected() {
        let mut c = controller();
        assert!(matches!(c.play(), Err(PlaybackError::NoSource)));
        assert_eq!(c.state().play_state, PlayState::Idle);
        assert!(!c.handle().playing);
    }

    #[test]
    fn play_pause_and_end() {
        let mut c = loaded(12.0);
        c.play().unwrap();
        assert!(c.state().is_playing());
        assert!(c.handle().playing);
        c.handle_event(MediaEvent::TimeUpdated(11.5));
        c.handle_event(MediaEvent::Ended);
        assert_eq!(c.state().play_state, PlayState::Paused);
        assert_eq!(c.state().current_time, 12.0);
    }

    #[test]
    fn play_at_end_restarts() {
        let mut c = loaded(12.0);
        c.seek(12.0);
        c.play().unwrap();
        assert_eq!(c.state().current_time, 0.0);
        assert_eq!(c.handle().time, 0.0);
    }

    #[test]
    fn refused_play_stays_paused() {
        let mut c = loaded(12.0);
        c.handle_mut().refuse = true;
        assert!(matches!(c.play(), Err(PlaybackError::Media { op: "play", .. })));
        assert_eq!(c.state().play_state, PlayState::Paused);
    }

    #[test]
    fn seek_clamps_and_keeps_play_state() {
        let mut c = loaded(20.0);
        c.play().unwrap();
        c.seek(25.0);
        assert_eq!(c.state().current_time, 20.0);
        c.seek(-3.0);
        assert_eq!(c.state().current_time, 0.0);
        c.seek(f64::NAN);
        assert_eq!(c.state().current_time, 0.0);
        assert!(c.state().is_playing());
        assert_eq!(c.handle().time, 0.0);
    }

    #[test]
    fn seek_before_duration_is_ignored() {
        let mut c = controller();
        c.seek(4.0);
        c.load_source(SourceRef::new("a.mp4"), None);
        c.seek(4.0);
        assert_eq!(c.state().current_time, 0.0);
        assert_eq!(c.handle().time, 0.0);
    }

    #[test]
    fn mute_round_trip_restores_volume() {
        let mut c = loaded(10.0);
        c.set_volume(0.6);
        c.toggle_mute();
        assert!(c.state().muted);
        assert_eq!(c.state().volume, 0.0);
        assert!(c.handle().muted);
        c.toggle_mute();
        assert!(!c.state().muted);
        assert_eq!(c.state().volume, 0.6);
        assert_eq!(c.handle().volume, 0.6);
    }

    #[test]
    fn mute_at_zero_restores_zero() {
        let mut c = loaded(10.0);
        c.set_volume(0.0);
        c.toggle_mute();
        c.toggle_mute();
        assert_eq!(c.state().volume, 0.0);
    }

    #[test]
    fn volume_is_clamped_and_unmutes() {
        let mut c = loaded(10.0);
        c.set_volume(1.7);
        assert_eq!(c.state().volume, 1.0);
        c.toggle_mute();
        c.set_volume(-0.2);
        assert_eq!(c.state().volume, 0.0);
        assert!(!c.state().muted);
        c.set_volume(f32::NAN);
        assert_eq!(c.state().volume, 0.0);
    }

    #[test]
    fn observers_get_snapshots_until_unsubscribed() {
        let seen: Rc<RefCell<Vec<PlaybackState>>> = Rc::default();
        let mut c = loaded(10.0);
        let sink = Rc::clone(&seen);
        let id = c.subscribe(move |s| sink.borrow_mut().push(s.clone()));
        c.seek(4.0);
        c.set_volume(0.5);
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(seen.borrow()[0].current_time, 4.0);
        assert!(c.unsubscribe(id));
        c.seek(5.0);
        assert_eq!(seen.borrow().len(), 2);
        assert!(!c.unsubscribe(id));
    }

    #[test]
    fn pump_applies_queued_events() {
        let mut c = controller();
        c.load_source(SourceRef::new("a.mp4"), None);
        c.handle_mut().events.extend([MediaEvent::DurationKnown(9.0), MediaEvent::TimeUpdated(4.5)]);
        assert_eq!(c.pump_events(), 2);
        assert_eq!(c.state().duration, Some(9.0));
        assert_eq!(c.active_segment(), Some(1));
        assert_eq!(c.playhead_percent(), 50.0);
    }

    #[test]
    fn load_drops_stale_events() {
        let mut c = loaded(30.0);
        c.handle_mut().events.push_back(MediaEvent::TimeUpdated(25.0));
        c.load_source(SourceRef::new("b.mp4"), None);
        assert_eq!(c.pump_events(), 0);
        assert_eq!(c.state().current_time, 0.0);
        assert_eq!(c.state().duration, None);
        assert_eq!(c.handle().source, Some(SourceRef::new("b.mp4")));
    }

    #[test]
    fn timeline_click_switches_clip_and_seeks_locally() {
        let clips: Vec<Clip> = [10.0, 5.0, 15.0].iter().enumerate()
            .map(|(i, d)| Clip::new(format!("c{i}"), *d, 0, SourceRef::new(format!("{i}.mp4"))).unwrap())
            .collect();
        let ids: Vec<ClipId> = clips.iter().map(|c| c.id).collect();
        let mut c = controller();
        c.set_timeline(Timeline::new(clips).unwrap());
        assert!(c.select_clip(ids[0]));
        c.play().unwrap();

        let hit = c.seek_timeline(0.4).unwrap();
        assert_eq!(hit.clip_id, ids[1]);
        assert_eq!(c.state().selected_clip, Some(ids[1]));
        assert_eq!(c.handle().source, Some(SourceRef::new("1.mp4")));
        assert!((c.state().current_time - 2.0).abs() < 1e-9);
        // Switching clips pauses, as a fresh selection does.
        assert_eq!(c.state().play_state, PlayState::Paused);
        assert!((c.timeline_playhead_percent() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn loading_an_outside_source_clears_selection() {
        let clips: Vec<Clip> = [10.0, 5.0].iter().enumerate()
            .map(|(i, d)| Clip::new(format!("c{i}"), *d, 0, SourceRef::new(format!("{i}.mp4"))).unwrap())
            .collect();
        let second = clips[1].id;
        let mut c = controller();
        c.set_timeline(Timeline::new(clips).unwrap());

        let seen: Rc<RefCell<Vec<PlaybackState>>> = Rc::default();
        let sink = Rc::clone(&seen);
        c.subscribe(move |s| sink.borrow_mut().push(s.clone()));
        assert!(c.select_clip(second));
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(seen.borrow()[0].selected_clip, Some(second));

        c.load_source(SourceRef::new("elsewhere.mp4"), Some(8.0));
        c.seek(4.0);
        assert_eq!(c.state().selected_clip, None);
        assert_eq!(c.timeline_playhead_percent(), 0.0);
    }

    #[test]
    fn select_unknown_clip_is_noop() {
        let mut c = controller();
        assert!(!c.select_clip(uuid::Uuid::new_v4()));
        assert_eq!(c.state().play_state, PlayState::Idle);
    }

    #[test]
    fn commands_dispatch() {
        let mut c = loaded(10.0);
        c.apply(EditorCommand::SeekSegment(2)).unwrap();
        assert_eq!(c.state().current_time, 6.0);
        c.apply(EditorCommand::Skip(-10.0)).unwrap();
        assert_eq!(c.state().current_time, 0.0);
        c.apply(EditorCommand::SeekPointer(0.5)).unwrap();
        assert_eq!(c.state().current_time, 5.0);
        c.apply(EditorCommand::TogglePlay).unwrap();
        assert!(c.state().is_playing());
        c.apply(EditorCommand::TogglePlay).unwrap();
        assert!(!c.state().is_playing());
        c.apply(EditorCommand::SeekSegment(9)).unwrap();
        assert_eq!(c.state().current_time, 5.0);
    }
}
