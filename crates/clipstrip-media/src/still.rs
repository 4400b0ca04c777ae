// crates/clipstrip-media/src/still.rs
//
// PNG export for thumbnail stills (disk cache, drag-out, debugging).

use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use clipstrip_core::media_types::Still;

fn write_rgba<W: Write>(still: &Still, w: W) -> Result<()> {
    let expected = still.width as usize * still.height as usize * 4;
    if still.data.len() != expected {
        anyhow::bail!(
            "still is {}x{} but holds {} bytes (expected {expected})",
            still.width, still.height, still.data.len()
        );
    }
    let mut encoder = png::Encoder::new(w, still.width, still.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&still.data)?;
    writer.finish()?;
    Ok(())
}

/// Encode `still` as an in-memory PNG.
pub fn encode_png(still: &Still) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_rgba(still, &mut buf)?;
    Ok(buf)
}

/// Write `still` to `dest` as a PNG file.
pub fn write_png(still: &Still, dest: &Path) -> Result<()> {
    let file = std::fs::File::create(dest)
        .with_context(|| format!("creating {}", dest.display()))?;
    write_rgba(still, BufWriter::new(file))?;
    debug!("[still] PNG saved → {}", dest.display());
    Ok(())
}
