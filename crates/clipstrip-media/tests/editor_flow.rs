// End-to-end: a clip is selected on the timeline, the player reports its
// duration, thumbnails are generated for it, and the active thumbnail follows
// the playhead. Switching clips restarts generation for the new source only.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;

use clipstrip_core::playback::HandleResult;
use clipstrip_core::{
    Clip, EditorCommand, EditorConfig, MediaEvent, MediaHandle, PlaybackController, SourceRef,
    Still, ThumbnailStrip, Timeline,
};
use clipstrip_media::{DecoderFactory, DecodingHandle, ThumbnailSettings, ThumbnailWorker};

#[derive(Default)]
struct Player {
    source: Option<SourceRef>,
    time:   f64,
    volume: f32,
    muted:  bool,
    events: VecDeque<MediaEvent>,
}

impl MediaHandle for Player {
    fn load(&mut self, source: &SourceRef) { self.source = Some(source.clone()); self.time = 0.0; }
    fn play(&mut self) -> HandleResult { Ok(()) }
    fn pause(&mut self) {}
    fn current_time(&self) -> f64 { self.time }
    fn set_current_time(&mut self, t: f64) { self.time = t; }
    fn duration(&self) -> Option<f64> { None }
    fn volume(&self) -> f32 { self.volume }
    fn set_volume(&mut self, v: f32) { self.volume = v; }
    fn muted(&self) -> bool { self.muted }
    fn set_muted(&mut self, muted: bool) { self.muted = muted; }
    fn poll_event(&mut self) -> Option<MediaEvent> { self.events.pop_front() }
}

struct Stills;

struct StillDecoder {
    tag: u8,
}

impl DecodingHandle for StillDecoder {
    fn duration(&self) -> Option<f64> { None }
    fn seek_to(&mut self, _t: f64) -> Result<()> { Ok(()) }
    fn capture_still(&mut self, width: u32, height: u32) -> Result<Still> {
        Ok(Still::solid(width, height, [self.tag, 0, 0, 255]))
    }
}

impl DecoderFactory for Stills {
    fn open(&self, source: &SourceRef) -> Result<Box<dyn DecodingHandle>> {
        Ok(Box::new(StillDecoder { tag: source.as_str().as_bytes()[0] }))
    }
}

fn wait_finished(worker: &ThumbnailWorker, strip: &mut ThumbnailStrip) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !strip.is_finished() {
        assert!(Instant::now() < deadline, "thumbnails never finished");
        worker.drain_into(strip);
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn selection_duration_thumbnails_and_playhead() {
    let config = EditorConfig::default();
    let a = Clip::new("010_0020_A", 17.25, 524, SourceRef::new("a.mp4")).unwrap();
    let b = Clip::new("120_0040_B", 14.3, 2812, SourceRef::new("b.mp4")).unwrap();
    let (a_id, b_id) = (a.id, b.id);

    let mut ctl = PlaybackController::new(Player::default(), &config);
    ctl.set_timeline(Timeline::new(vec![a, b]).unwrap());
    let worker = ThumbnailWorker::new(Arc::new(Stills), ThumbnailSettings::from(&config));
    let mut strip = ThumbnailStrip::new();

    ctl.apply(EditorCommand::SelectClip(a_id)).unwrap();
    ctl.handle_mut().events.push_back(MediaEvent::DurationKnown(17.25));
    ctl.pump_events();
    worker.start_into(&mut strip, SourceRef::new("a.mp4"), ctl.state().duration);
    wait_finished(&worker, &mut strip);

    assert_eq!(strip.thumbnails().len(), 6);
    assert_eq!(strip.ready_count(), 6);
    let still = strip.get(0).and_then(|t| t.still.as_ref()).unwrap();
    assert_eq!((still.width, still.height), (160, 90));

    ctl.apply(EditorCommand::Play).unwrap();
    ctl.handle_mut().events.push_back(MediaEvent::TimeUpdated(7.5));
    ctl.pump_events();
    assert_eq!(ctl.active_segment(), Some(2));

    // Clicking a thumbnail seeks to its segment start.
    ctl.apply(EditorCommand::SeekSegment(4)).unwrap();
    assert_eq!(ctl.state().current_time, 12.0);
    assert!(ctl.state().is_playing());

    // Clicking late on the timeline lands in clip b.
    let hit = ctl.seek_timeline(0.9).unwrap();
    assert_eq!(hit.clip_id, b_id);
    assert_eq!(ctl.state().selected_clip, Some(b_id));
    worker.start_into(&mut strip, SourceRef::new("b.mp4"), ctl.state().duration);
    wait_finished(&worker, &mut strip);

    assert_eq!(strip.source(), Some(&SourceRef::new("b.mp4")));
    assert_eq!(strip.thumbnails().len(), 5);
    assert!(strip.thumbnails().iter().all(|t| t.still.as_ref().unwrap().data[0] == b'b'));
}
