// crates/clipstrip-media/src/helpers/seek.rs
//
// Seek helpers for the FFmpeg backend.
//
// Some containers refuse random access, and `avformat_seek_file` with
// max_ts=0 returns EPERM on a freshly-opened context on Windows. Every seek
// the thumbnail decoder makes routes through here; the caller decides what
// a failed seek means.

#[cfg(feature = "ffmpeg")]
use ffmpeg_the_third as ffmpeg;
#[cfg(feature = "ffmpeg")]
use tracing::warn;

/// How a decoder should get its demuxer to `target_secs`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(not(feature = "ffmpeg"), allow(dead_code))]
pub enum SeekPlan {
    /// Fresh context asked for 0: already there.
    Stay,
    /// Used context asked for 0: reopen, since 0 is never seeked.
    Reopen,
    /// Seek with `seek_to_secs`; reopen if that soft-fails.
    Seek,
}

/// `consumed` is whether any packets were read since the context opened.
#[cfg_attr(not(feature = "ffmpeg"), allow(dead_code))]
pub fn plan_seek(target_secs: f64, consumed: bool) -> SeekPlan {
    match (target_secs <= 0.0, consumed) {
        (true, false) => SeekPlan::Stay,
        (true, true)  => SeekPlan::Reopen,
        (false, _)    => SeekPlan::Seek,
    }
}

/// Seek `ictx` to the keyframe at or before `target_secs`.
///
/// Returns `false` if the seek failed — the demuxer then decodes from
/// wherever it is and the caller's PTS filter skips pre-roll frames.
/// Targets at or below 0 are not seeked; see `plan_seek`.
#[cfg(feature = "ffmpeg")]
pub fn seek_to_secs(
    ictx:        &mut ffmpeg::format::context::Input,
    target_secs: f64,
    label:       &str,
) -> bool {
    if target_secs <= 0.0 {
        return true;
    }

    // Backward seek: landing after the target would drop frames we need.
    let seek_ts = (target_secs * ffmpeg::ffi::AV_TIME_BASE as f64) as i64;
    match ictx.seek(seek_ts, ..=seek_ts) {
        Ok(()) => true,
        Err(e) => {
            warn!("[seek] soft-fail in {label} at {target_secs:.3}s: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewinding_a_used_context_reopens() {
        assert_eq!(plan_seek(0.0, false), SeekPlan::Stay);
        assert_eq!(plan_seek(0.0, true), SeekPlan::Reopen);
        assert_eq!(plan_seek(-1.0, true), SeekPlan::Reopen);
        assert_eq!(plan_seek(3.0, true), SeekPlan::Seek);
        assert_eq!(plan_seek(3.0, false), SeekPlan::Seek);
    }
}
