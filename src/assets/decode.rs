use std::{
    borrow::Cow,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;

use crate::{
    assets::bitmap::{Bitmap, premultiply_rgba8_in_place},
    assets::svg_raster::{rasterize_svg_to_premul_rgba8, svg_raster_size},
    foundation::error::{PfpError, PfpResult},
};

/// An image handed over by the host: a file on disk or bytes already in memory.
#[derive(Clone, Debug)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes { name: String, bytes: Arc<Vec<u8>> },
}

impl ImageSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::Bytes {
            name: name.into(),
            bytes: Arc::new(bytes),
        }
    }

    pub fn name(&self) -> Cow<'_, str> {
        match self {
            Self::Path(p) => p.to_string_lossy(),
            Self::Bytes { name, .. } => Cow::Borrowed(name.as_str()),
        }
    }

    fn read(&self) -> PfpResult<Cow<'_, [u8]>> {
        match self {
            Self::Path(p) => {
                let bytes = std::fs::read(p)
                    .with_context(|| format!("read image '{}'", p.display()))?;
                Ok(Cow::Owned(bytes))
            }
            Self::Bytes { bytes, .. } => Ok(Cow::Borrowed(bytes.as_slice())),
        }
    }

    fn looks_like_svg(&self, bytes: &[u8]) -> bool {
        let by_ext = match self {
            Self::Path(p) => has_svg_extension(p),
            Self::Bytes { name, .. } => has_svg_extension(Path::new(name)),
        };
        by_ext || {
            let head = bytes.trim_ascii_start();
            head.starts_with(b"<svg") || head.starts_with(b"<?xml")
        }
    }
}

fn has_svg_extension(p: &Path) -> bool {
    p.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"))
}

/// Result of decoding a source. Vector images stay unrasterized until the caller knows the size
/// they will be shown at.
#[derive(Clone, Debug)]
pub enum DecodedImage {
    Raster(Bitmap),
    Svg(Arc<usvg::Tree>),
}

impl DecodedImage {
    /// Rasterize (if needed). SVGs are scaled to `target_width` when given, else their own size.
    pub fn into_bitmap(self, target_width: Option<u32>) -> PfpResult<Bitmap> {
        match self {
            Self::Raster(b) => Ok(b),
            Self::Svg(tree) => {
                let (w, h) = svg_raster_size(&tree, target_width)?;
                let px = rasterize_svg_to_premul_rgba8(&tree, w, h)?;
                Bitmap::from_premul_rgba8(w, h, px)
            }
        }
    }
}

/// Host-side image decoding collaborator.
pub trait ImageDecoder {
    fn decode(&self, source: &ImageSource) -> PfpResult<DecodedImage>;
}

/// Default decoder: reads files from disk and decodes with `image` / `usvg`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsDecoder;

impl ImageDecoder for FsDecoder {
    fn decode(&self, source: &ImageSource) -> PfpResult<DecodedImage> {
        let bytes = source.read()?;
        if source.looks_like_svg(&bytes) {
            let tree = usvg::Tree::from_data(&bytes, &usvg::Options::default())
                .map_err(|e| PfpError::decode(format!("svg '{}': {e}", source.name())))?;
            return Ok(DecodedImage::Svg(Arc::new(tree)));
        }
        let dyn_img = image::load_from_memory(&bytes)
            .map_err(|e| PfpError::decode(format!("image '{}': {e}", source.name())))?;
        Ok(DecodedImage::Raster(bitmap_from_dynamic(dyn_img)?))
    }
}

pub fn decode_image(bytes: &[u8]) -> PfpResult<Bitmap> {
    let dyn_img =
        image::load_from_memory(bytes).map_err(|e| PfpError::decode(format!("image: {e}")))?;
    bitmap_from_dynamic(dyn_img)
}

fn bitmap_from_dynamic(dyn_img: image::DynamicImage) -> PfpResult<Bitmap> {
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Bitmap::from_premul_rgba8(width, height, rgba8_premul)
}
