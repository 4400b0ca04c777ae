// crates/clipstrip-media/src/ffmpeg.rs
//
// FFmpeg-backed DecodingHandle (feature `ffmpeg`).
//
// Each handle owns its own demuxer + decoder, independent of whatever the
// host uses for playback, so thumbnail seeks never touch the user's player.
// Callers must run `ffmpeg_the_third::init()` once before opening anything.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use tracing::debug;

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::{input, Pixel};
use ffmpeg::media::Type;
use ffmpeg::software::scaling::{context::Context as SwsContext, flag::Flags};
use ffmpeg::util::frame::video::Video as VideoFrame;

use clipstrip_core::media_types::Still;
use clipstrip_core::state::SourceRef;

use crate::decode::{DecoderFactory, DecodingHandle};
use crate::helpers::seek::{plan_seek, seek_to_secs, SeekPlan};

/// Opens `FfmpegDecoder`s, treating every `SourceRef` as a local path or a
/// URL FFmpeg can open directly.
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegDecoderFactory;

impl DecoderFactory for FfmpegDecoderFactory {
    fn open(&self, source: &SourceRef) -> Result<Box<dyn DecodingHandle>> {
        Ok(Box::new(FfmpegDecoder::open(Path::new(source.as_str()))?))
    }
}

pub struct FfmpegDecoder {
    path:      PathBuf,
    ictx:      ffmpeg::format::context::Input,
    decoder:   ffmpeg::decoder::video::Video,
    video_idx: usize,
    tb_num:    i32,
    tb_den:    i32,
    duration:  Option<f64>,
    /// Packets have been read since `ictx` was opened.
    consumed:  bool,
    /// Frame landed on by the last successful seek_to().
    frame:     Option<VideoFrame>,
}

impl FfmpegDecoder {
    pub fn open(path: &Path) -> Result<Self> {
        let ictx = input(path)?;
        let video_idx = ictx.streams().best(Type::Video)
            .ok_or_else(|| anyhow!("no video stream"))?.index();

        let (tb_num, tb_den, stream_secs) = {
            let stream = ictx.stream(video_idx).ok_or_else(|| anyhow!("stream gone"))?;
            let tb = stream.time_base();
            let secs = stream.duration() as f64 * tb.numerator() as f64 / tb.denominator() as f64;
            (tb.numerator(), tb.denominator(), secs)
        };

        // Container duration first, stream duration as fallback.
        let container_secs = ictx.duration() as f64 / ffmpeg::ffi::AV_TIME_BASE as f64;
        let duration = [container_secs, stream_secs].into_iter().find(|d| d.is_finite() && *d > 0.0);

        // Second context for decoder params (Parameters borrows from the stream).
        let ictx2   = input(path)?;
        let stream2 = ictx2.stream(video_idx).ok_or_else(|| anyhow!("stream gone"))?;
        let dec_ctx = ffmpeg::codec::context::Context::from_parameters(stream2.parameters())?;
        let decoder = dec_ctx.decoder().video()?;

        debug!("[ffmpeg] opened {} ({:?}s)", path.display(), duration);
        Ok(Self {
            path: path.to_path_buf(), ictx, decoder, video_idx,
            tb_num, tb_den, duration, consumed: false, frame: None,
        })
    }

    fn ts_to_pts(&self, t: f64) -> i64 {
        (t * self.tb_den as f64 / self.tb_num as f64) as i64
    }
}

impl DecodingHandle for FfmpegDecoder {
    fn duration(&self) -> Option<f64> { self.duration }

    fn seek_to(&mut self, t: f64) -> Result<()> {
        let target_pts = self.ts_to_pts(t);
        let reopen = match plan_seek(t, self.consumed) {
            SeekPlan::Stay   => false,
            SeekPlan::Reopen => true,
            // On soft-fail decode from the top; the PTS filter skips ahead.
            SeekPlan::Seek   => !seek_to_secs(&mut self.ictx, t, "thumbnail"),
        };
        if reopen {
            self.ictx = input(&self.path)?;
        }
        self.decoder.flush();
        self.frame    = None;
        self.consumed = true;

        // last_good covers a target past the final frame (EOF before target).
        let mut last_good: Option<VideoFrame> = None;
        for (stream, packet) in self.ictx.packets().flatten() {
            if stream.index() != self.video_idx { continue; }
            if self.decoder.send_packet(&packet).is_err() { continue; }
            let mut decoded = VideoFrame::empty();
            while self.decoder.receive_frame(&mut decoded).is_ok() {
                let pts = decoded.pts().unwrap_or(target_pts);
                last_good = Some(decoded.clone());
                // Skip pre-roll from the keyframe-aligned seek.
                if pts + 2 >= target_pts {
                    self.frame = last_good;
                    return Ok(());
                }
            }
        }

        match last_good {
            Some(f) => {
                self.frame = Some(f);
                Ok(())
            }
            None => Err(anyhow!("no frame decoded at t={t:.3}")),
        }
    }

    fn capture_still(&mut self, width: u32, height: u32) -> Result<Still> {
        let frame = self.frame.as_ref().ok_or_else(|| anyhow!("capture before seek"))?;
        let mut scaler = SwsContext::get(
            frame.format(), frame.width(), frame.height(),
            Pixel::RGBA, width, height, Flags::BILINEAR,
        )?;
        let mut out = VideoFrame::empty();
        scaler.run(frame, &mut out)?;

        // Destripe: copy only visible pixels, not stride padding.
        let stride    = out.stride(0);
        let raw       = out.data(0);
        let row_bytes = width as usize * 4;
        let data: Vec<u8> = (0..height as usize)
            .flat_map(|row| &raw[row * stride..row * stride + row_bytes])
            .copied()
            .collect();
        Still::from_rgba(width, height, data).ok_or_else(|| anyhow!("scaler produced a short frame"))
    }

    fn release(&mut self) {
        self.frame = None;
        debug!("[ffmpeg] released {}", self.path.display());
    }
}
