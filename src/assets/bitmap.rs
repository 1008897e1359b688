use std::sync::Arc;

use crate::foundation::error::{PfpError, PfpResult};

/// Largest width or height the CPU compositor can draw.
pub const MAX_BITMAP_SIDE: u32 = u16::MAX as u32;

/// Decoded raster image ready for compositing.
///
/// Pixels are premultiplied RGBA8, row-major, tightly packed. Cloning a `Bitmap` only clones the
/// shared pixel buffer handle, so scene snapshots stay cheap.
#[derive(Clone, Debug)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl Bitmap {
    pub fn from_premul_rgba8(width: u32, height: u32, rgba8_premul: Vec<u8>) -> PfpResult<Self> {
        if width == 0 || height == 0 {
            return Err(PfpError::validation(format!(
                "bitmap must be non-empty (got {width}x{height})"
            )));
        }
        if rgba8_premul.len() != width as usize * height as usize * 4 {
            return Err(PfpError::validation(format!(
                "bitmap byte length {} does not match {width}x{height} rgba8",
                rgba8_premul.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    /// Uniformly filled bitmap from a straight-alpha color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> PfpResult<Self> {
        let [r, g, b, a] = rgba;
        let px = premul_rgba8(r, g, b, a);
        let data = px.repeat(width as usize * height as usize);
        Self::from_premul_rgba8(width, height, data)
    }

    pub fn shares_pixels_with(&self, other: &Bitmap) -> bool {
        Arc::ptr_eq(&self.rgba8_premul, &other.rgba8_premul)
    }
}

pub(crate) fn premul_rgba8(r: u8, g: u8, b: u8, a: u8) -> [u8; 4] {
    fn premul(c: u8, a: u8) -> u8 {
        ((u16::from(c) * u16::from(a) + 127) / 255) as u8
    }
    [premul(r, a), premul(g, a), premul(b, a), a]
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}
