use crate::{
    assets::bitmap::Bitmap,
    foundation::core::{Canvas, ClipCircle, LayerId, Transform2D},
    scene::model::Scene,
};

#[derive(Clone, Debug)]
pub struct SnapshotLayer {
    pub id: LayerId,
    pub bitmap: Bitmap,
    pub transform: Transform2D,
}

/// Frozen copy of a [`Scene`] taken at export time.
///
/// Transforms are copied and bitmaps share pixel buffers with the live scene, so edits made after
/// the snapshot never leak into it.
#[derive(Clone, Debug)]
pub struct SceneSnapshot {
    pub canvas: Canvas,
    pub clip: ClipCircle,
    /// Bottom first.
    pub content: Vec<SnapshotLayer>,
    pub overlay: Option<SnapshotLayer>,
}

impl Scene {
    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            canvas: self.canvas(),
            clip: self.clip(),
            content: self
                .content()
                .map(|l| SnapshotLayer {
                    id: l.id,
                    bitmap: l.bitmap.clone(),
                    transform: l.transform,
                })
                .collect(),
            overlay: self.overlay().map(|o| SnapshotLayer {
                id: o.id,
                bitmap: o.bitmap.clone(),
                transform: o.transform,
            }),
        }
    }
}
