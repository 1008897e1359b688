//! pfpframe composes profile pictures: user images placed inside a circular mask, an optional
//! decorative ring drawn on top, flattened into a fixed-size PNG.
//!
//! # Pipeline overview
//!
//! 1. **Decode**: `ImageSource -> Bitmap` (premultiplied RGBA8; SVG frames rasterized on demand)
//! 2. **Place**: `Bitmap + ClipCircle -> Transform2D` (cover-fit or scatter, see [`FitPolicy`])
//! 3. **Edit**: [`EditorSession`] command handlers mutate the [`Scene`]; the overlay stays on top
//! 4. **Export**: `Scene -> SceneSnapshot -> FrameRGBA -> PNG bytes`
//!
//! Rendering runs on the CPU through `vello_cpu`. Content is clipped to the circle, the overlay
//! is not, and nothing is painted where neither covers the canvas.
#![forbid(unsafe_code)]

mod assets;
mod export;
mod foundation;
mod layout;
mod render;
mod scene;
mod session;

pub use assets::bitmap::{Bitmap, MAX_BITMAP_SIDE};
pub use assets::decode::{DecodedImage, FsDecoder, ImageDecoder, ImageSource, decode_image};
pub use export::png::{DEFAULT_EXPORT_FILE_NAME, ExportedPng, encode_png, export_scene};
pub use foundation::core::{
    Affine, BezPath, Canvas, ClipCircle, LayerId, MAX_CANVAS_SIDE, Point, Rect, Transform2D, Vec2,
};
pub use foundation::error::{PfpError, PfpResult};
pub use layout::fit::{
    DEFAULT_BLEED, DEFAULT_SCATTER_JITTER, DEFAULT_SCATTER_WIDTH, FitPolicy, cover_scale,
    covers_circle, place_new_layer, place_overlay,
};
pub use layout::rng::Rng64;
pub use render::backend::{FrameRGBA, RenderSettings};
pub use render::composite::{over, over_in_place};
pub use render::cpu::CpuCompositor;
pub use scene::model::{Layer, Overlay, Scene, StackEntry};
pub use scene::snapshot::{SceneSnapshot, SnapshotLayer};
pub use session::config::{DEFAULT_CLIP_RADIUS, DEFAULT_SEED, EditorConfig};
pub use session::editor::{AddReport, ControlState, EditorSession};
