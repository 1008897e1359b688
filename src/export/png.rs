use std::io::Cursor;

use crate::{
    foundation::error::{PfpError, PfpResult},
    render::backend::FrameRGBA,
    render::composite::unpremultiply_in_place,
    render::cpu::CpuCompositor,
    scene::snapshot::SceneSnapshot,
};

pub const DEFAULT_EXPORT_FILE_NAME: &str = "kindred-pfp-showshow.png";

/// An encoded export, ready for the host to save or offer as a download.
#[derive(Clone, Debug)]
pub struct ExportedPng {
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl ExportedPng {
    pub fn write_to(&self, path: &std::path::Path) -> PfpResult<()> {
        use anyhow::Context as _;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        std::fs::write(path, &self.bytes)
            .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

/// Renders `snap` and encodes it as an RGBA PNG.
#[tracing::instrument(skip(snap, compositor))]
pub fn export_scene(
    snap: &SceneSnapshot,
    compositor: &mut CpuCompositor,
    file_name: &str,
) -> PfpResult<ExportedPng> {
    let frame = compositor.render(snap)?;
    let bytes = encode_png(&frame)?;
    tracing::info!(
        width = frame.width,
        height = frame.height,
        bytes = bytes.len(),
        "exported png"
    );
    Ok(ExportedPng {
        file_name: file_name.to_string(),
        width: frame.width,
        height: frame.height,
        bytes,
    })
}

/// Encodes a frame as 8-bit RGBA PNG with straight alpha.
pub fn encode_png(frame: &FrameRGBA) -> PfpResult<Vec<u8>> {
    let expected = frame.width as usize * frame.height as usize * 4;
    if frame.data.len() != expected {
        return Err(PfpError::encode(format!(
            "frame buffer is {} bytes, expected {expected}",
            frame.data.len()
        )));
    }

    let mut rgba = frame.data.clone();
    if frame.premultiplied {
        unpremultiply_in_place(&mut rgba);
    }
    let img = image::RgbaImage::from_raw(frame.width, frame.height, rgba)
        .ok_or_else(|| PfpError::encode("frame dimensions do not match buffer"))?;

    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .map_err(|e| PfpError::encode(format!("png: {e}")))?;
    Ok(out)
}
