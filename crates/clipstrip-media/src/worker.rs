// crates/clipstrip-media/src/worker.rs
//
// ThumbnailWorker: owns the thumbnail job for the current source.
// All public API the editor calls for thumbnails lives here.
//
// One job = one source = one background thread with its own DecodingHandle.
// Segments are captured sequentially on that thread: seek, capture, send.
//
// Cancellation has two layers:
//   1. A per-job AtomicBool. The job thread checks it before every segment
//      and before every send, then releases its decoder and exits. A seek
//      that never returns keeps the thread parked, never the caller.
//   2. A generation counter. start() bumps it before spawning, and
//      drain_into() / ThumbnailStrip::apply drop anything tagged with an
//      older generation. A result that slipped past the flag is still never
//      written.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use clipstrip_core::config::EditorConfig;
use clipstrip_core::media_types::ThumbnailResult;
use clipstrip_core::segments::SegmentIndex;
use clipstrip_core::state::{SourceRef, ThumbnailStrip};

use crate::decode::{DecoderFactory, DecodingHandle};

/// How long a blocked send waits before re-checking the cancel flag.
const SEND_POLL: Duration = Duration::from_millis(50);

// ── Settings ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThumbnailSettings {
    pub width:         u32,
    pub height:        u32,
    pub segment_width: f64,
}

impl Default for ThumbnailSettings {
    fn default() -> Self { Self::from(&EditorConfig::default()) }
}

impl From<&EditorConfig> for ThumbnailSettings {
    fn from(cfg: &EditorConfig) -> Self {
        Self {
            width:         cfg.thumbnail_width,
            height:        cfg.thumbnail_height,
            segment_width: cfg.segment_width_secs,
        }
    }
}

// ── Internal types ────────────────────────────────────────────────────────────

struct Job {
    generation: u64,
    source:     SourceRef,
    cancel:     Arc<AtomicBool>,
    /// Started with a usable duration hint.
    sized:      bool,
}

/// Calls `release()` on the wrapped handle when dropped, so the decoder is
/// freed on every exit path of the job thread, panics included.
struct ReleaseGuard(Box<dyn DecodingHandle>);

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.0.release();
    }
}

// ── ThumbnailWorker ───────────────────────────────────────────────────────────

pub struct ThumbnailWorker {
    /// Results from job threads. Prefer `drain_into`, which also filters
    /// stale generations.
    pub rx:     Receiver<ThumbnailResult>,
    tx:         Sender<ThumbnailResult>,
    factory:    Arc<dyn DecoderFactory>,
    settings:   ThumbnailSettings,
    /// Generation whose results are currently accepted.
    generation: AtomicU64,
    job:        Mutex<Option<Job>>,
}

impl ThumbnailWorker {
    pub fn new(factory: Arc<dyn DecoderFactory>, settings: ThumbnailSettings) -> Self {
        let (tx, rx) = bounded(512);
        Self {
            rx, tx, factory, settings,
            generation: AtomicU64::new(0),
            job:        Mutex::new(None),
        }
    }

    pub fn settings(&self) -> ThumbnailSettings { self.settings }

    pub fn current_generation(&self) -> u64 { self.generation.load(Ordering::SeqCst) }

    /// Start generating thumbnails for `source`, abandoning any job for the
    /// previous source first. Returns the new job's generation; pass it to
    /// `ThumbnailStrip::begin`.
    ///
    /// `duration_hint` is used when known; otherwise the decoder is asked.
    /// If neither knows, the job reports zero segments and finishes. Call
    /// `restart_with_duration` once the player learns the duration.
    pub fn start(&self, source: SourceRef, duration_hint: Option<f64>) -> u64 {
        let mut slot = self.job.lock();
        if let Some(old) = slot.take() {
            old.cancel.store(true, Ordering::SeqCst);
            debug!("[thumbs] cancelled gen={} ({})", old.generation, old.source);
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel     = Arc::new(AtomicBool::new(false));
        let sized      = duration_hint.is_some_and(|d| d.is_finite() && d >= 0.0);

        let factory  = Arc::clone(&self.factory);
        let tx       = self.tx.clone();
        let flag     = Arc::clone(&cancel);
        let settings = self.settings;
        let src      = source.clone();
        thread::spawn(move || {
            run_job(factory.as_ref(), &src, duration_hint, settings, generation, &flag, &tx);
        });

        info!("[thumbs] gen={generation} started for {source}");
        *slot = Some(Job { generation, source, cancel, sized });
        generation
    }

    /// Start a job and point `strip` at it in one step.
    pub fn start_into(&self, strip: &mut ThumbnailStrip, source: SourceRef, duration_hint: Option<f64>) -> u64 {
        let generation = self.start(source.clone(), duration_hint);
        strip.begin(generation, source);
        generation
    }

    /// Re-run the current job with `duration` if it was started without one
    /// and `strip` has no slots yet (typically on `MediaEvent::DurationKnown`).
    /// Returns the new generation, or `None` if nothing needed restarting.
    pub fn restart_with_duration(&self, strip: &mut ThumbnailStrip, duration: f64) -> Option<u64> {
        if !(duration.is_finite() && duration > 0.0) || !strip.thumbnails().is_empty() {
            return None;
        }
        let source = {
            let slot = self.job.lock();
            let job  = slot.as_ref()?;
            if job.sized || job.generation != strip.generation() {
                return None;
            }
            job.source.clone()
        };
        debug!("[thumbs] duration {duration:.2}s now known, restarting {source}");
        Some(self.start_into(strip, source, Some(duration)))
    }

    /// Abandon the current job without starting another. Results still in
    /// flight are dropped.
    pub fn cancel(&self) {
        if let Some(old) = self.job.lock().take() {
            old.cancel.store(true, Ordering::SeqCst);
            debug!("[thumbs] cancelled gen={} ({})", old.generation, old.source);
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Apply every pending result for the current generation to `strip`.
    /// Returns how many changed it.
    pub fn drain_into(&self, strip: &mut ThumbnailStrip) -> usize {
        let current = self.current_generation();
        let mut applied = 0;
        while let Ok(result) = self.rx.try_recv() {
            if result.generation() != current {
                continue;
            }
            if strip.apply(result) {
                applied += 1;
            }
        }
        applied
    }
}

impl Drop for ThumbnailWorker {
    fn drop(&mut self) {
        if let Some(job) = self.job.get_mut().take() {
            job.cancel.store(true, Ordering::SeqCst);
        }
    }
}

// ── Job thread ────────────────────────────────────────────────────────────────

/// Send `result` unless the job has been cancelled. Never blocks for longer
/// than SEND_POLL without re-checking the flag, so a full channel cannot pin
/// a cancelled job (and its decoder) forever.
fn emit(tx: &Sender<ThumbnailResult>, cancel: &AtomicBool, mut result: ThumbnailResult) -> bool {
    loop {
        if cancel.load(Ordering::SeqCst) {
            return false;
        }
        match tx.send_timeout(result, SEND_POLL) {
            Ok(()) => return true,
            Err(SendTimeoutError::Timeout(r))      => result = r,
            Err(SendTimeoutError::Disconnected(_)) => return false,
        }
    }
}

fn run_job(
    factory:       &dyn DecoderFactory,
    source:        &SourceRef,
    duration_hint: Option<f64>,
    settings:      ThumbnailSettings,
    generation:    u64,
    cancel:        &AtomicBool,
    tx:            &Sender<ThumbnailResult>,
) {
    let hint = duration_hint.filter(|d| d.is_finite() && *d >= 0.0);

    let mut handle = match factory.open(source) {
        Ok(h) => ReleaseGuard(h),
        Err(e) => {
            // Slots stay placeholders; nothing is retried.
            warn!("[thumbs] gen={generation} open failed for {source}: {e:#}");
            let segment_count = SegmentIndex::new(hint, settings.segment_width).count();
            if emit(tx, cancel, ThumbnailResult::Started {
                generation, source: source.clone(), segment_count, segment_width: settings.segment_width,
            }) {
                emit(tx, cancel, ThumbnailResult::Finished { generation });
            }
            return;
        }
    };

    let duration = hint.or_else(|| handle.0.duration());
    let index    = SegmentIndex::new(duration, settings.segment_width);
    if !emit(tx, cancel, ThumbnailResult::Started {
        generation,
        source:        source.clone(),
        segment_count: index.count(),
        segment_width: index.width(),
    }) {
        return;
    }

    let mut ready = 0usize;
    for seg in index.segments() {
        if cancel.load(Ordering::SeqCst) {
            debug!("[thumbs] gen={generation} stopping at segment {}", seg.index);
            return;
        }
        let h = &mut handle.0;
        let captured = h.seek_to(seg.start)
            .and_then(|()| h.capture_still(settings.width, settings.height));
        let result = match captured {
            Ok(still) => {
                ready += 1;
                ThumbnailResult::Ready { generation, index: seg.index, still }
            }
            Err(e) => {
                warn!("[thumbs] gen={generation} segment {} @ {:.2}s failed: {e:#}", seg.index, seg.start);
                ThumbnailResult::Failed { generation, index: seg.index, msg: e.to_string() }
            }
        };
        if !emit(tx, cancel, result) {
            return;
        }
    }

    info!("[thumbs] gen={generation} done: {ready}/{} stills ← {source}", index.count());
    emit(tx, cancel, ThumbnailResult::Finished { generation });
}
