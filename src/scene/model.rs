use crate::{
    assets::bitmap::Bitmap,
    foundation::core::{Canvas, ClipCircle, LayerId, Transform2D, Vec2},
    foundation::error::{PfpError, PfpResult},
};

/// A user-placed content image.
#[derive(Clone, Debug)]
pub struct Layer {
    pub id: LayerId,
    pub bitmap: Bitmap,
    pub transform: Transform2D,
}

/// The decorative ring drawn above all content. Never clipped, never selectable.
#[derive(Clone, Debug)]
pub struct Overlay {
    pub id: LayerId,
    pub bitmap: Bitmap,
    pub transform: Transform2D,
}

#[derive(Clone, Debug)]
enum SceneNode {
    Content(Layer),
    Overlay(Overlay),
}

/// One slot of the draw stack, bottom first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum StackEntry {
    Content(LayerId),
    Overlay(LayerId),
}

/// Editable scene: content layers in insertion order plus at most one overlay.
///
/// After every public mutation the overlay (if any) is the topmost node.
#[derive(Clone, Debug)]
pub struct Scene {
    canvas: Canvas,
    clip: ClipCircle,
    nodes: Vec<SceneNode>,
    selection: Option<LayerId>,
    next_id: u64,
}

impl Scene {
    pub fn new(canvas: Canvas, clip: ClipCircle) -> PfpResult<Self> {
        canvas.validate()?;
        clip.validate_within(canvas)?;
        Ok(Self {
            canvas,
            clip,
            nodes: Vec::new(),
            selection: None,
            next_id: 1,
        })
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn clip(&self) -> ClipCircle {
        self.clip
    }

    pub fn add_layer(&mut self, bitmap: Bitmap, transform: Transform2D) -> LayerId {
        let id = self.alloc_id();
        self.nodes.push(SceneNode::Content(Layer {
            id,
            bitmap,
            transform,
        }));
        self.selection = Some(id);
        self.pin_overlay();
        tracing::debug!(%id, content = self.content_len(), "layer added");
        id
    }

    /// Removes `id` only if it is a content layer and currently selected.
    pub fn delete_layer(&mut self, id: LayerId) -> bool {
        if self.selection != Some(id) {
            return false;
        }
        let Some(idx) = self.content_index(id) else {
            return false;
        };
        self.nodes.remove(idx);
        self.selection = None;
        self.pin_overlay();
        tracing::debug!(%id, content = self.content_len(), "layer deleted");
        true
    }

    pub fn delete_selected(&mut self) -> bool {
        match self.selection {
            Some(id) => self.delete_layer(id),
            None => false,
        }
    }

    /// Drops every content layer, keeps the overlay. Returns how many layers were removed.
    pub fn reset_content(&mut self) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|n| matches!(n, SceneNode::Overlay(_)));
        self.selection = None;
        self.pin_overlay();
        let removed = before - self.nodes.len();
        tracing::debug!(removed, "content reset");
        removed
    }

    pub fn replace_overlay(&mut self, bitmap: Bitmap, transform: Transform2D) -> LayerId {
        self.nodes.retain(|n| !matches!(n, SceneNode::Overlay(_)));
        let id = self.alloc_id();
        self.nodes.push(SceneNode::Overlay(Overlay {
            id,
            bitmap,
            transform,
        }));
        self.pin_overlay();
        tracing::debug!(%id, "overlay replaced");
        id
    }

    /// Moves the overlay to the top of the draw stack. Idempotent.
    pub fn pin_overlay(&mut self) {
        let Some(idx) = self
            .nodes
            .iter()
            .position(|n| matches!(n, SceneNode::Overlay(_)))
        else {
            return;
        };
        if idx + 1 != self.nodes.len() {
            let node = self.nodes.remove(idx);
            self.nodes.push(node);
        }
    }

    pub fn select(&mut self, id: LayerId) -> bool {
        if self.content_index(id).is_none() {
            return false;
        }
        self.selection = Some(id);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn selection(&self) -> Option<LayerId> {
        self.selection
    }

    pub fn can_delete_selection(&self) -> bool {
        self.selection
            .is_some_and(|id| self.content_index(id).is_some())
    }

    pub fn set_transform(&mut self, id: LayerId, transform: Transform2D) -> PfpResult<()> {
        self.modify(id, |t| *t = transform)
    }

    pub fn translate_layer(&mut self, id: LayerId, delta: Vec2) -> PfpResult<()> {
        self.modify(id, |t| t.translate += delta)
    }

    /// Multiplies the layer scale by `factor`, keeping its center in place.
    pub fn scale_layer(&mut self, id: LayerId, factor: f64) -> PfpResult<()> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(PfpError::validation("scale factor must be finite and > 0"));
        }
        self.modify(id, |t| t.scale *= factor)
    }

    /// Adds `radians` to the layer rotation about its center.
    pub fn rotate_layer(&mut self, id: LayerId, radians: f64) -> PfpResult<()> {
        if !radians.is_finite() {
            return Err(PfpError::validation("rotation must be finite"));
        }
        self.modify(id, |t| t.rotation_rad += radians)
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.content().find(|l| l.id == id)
    }

    /// Content layers, bottom first.
    pub fn content(&self) -> impl Iterator<Item = &Layer> {
        self.nodes.iter().filter_map(|n| match n {
            SceneNode::Content(l) => Some(l),
            SceneNode::Overlay(_) => None,
        })
    }

    pub fn content_len(&self) -> usize {
        self.content().count()
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.nodes.iter().find_map(|n| match n {
            SceneNode::Overlay(o) => Some(o),
            SceneNode::Content(_) => None,
        })
    }

    pub fn draw_order(&self) -> Vec<StackEntry> {
        self.nodes
            .iter()
            .map(|n| match n {
                SceneNode::Content(l) => StackEntry::Content(l.id),
                SceneNode::Overlay(o) => StackEntry::Overlay(o.id),
            })
            .collect()
    }

    fn modify(&mut self, id: LayerId, f: impl FnOnce(&mut Transform2D)) -> PfpResult<()> {
        let layer = self
            .nodes
            .iter_mut()
            .find_map(|n| match n {
                SceneNode::Content(l) if l.id == id => Some(l),
                _ => None,
            })
            .ok_or_else(|| PfpError::validation(format!("{id} is not a content layer")))?;
        f(&mut layer.transform);
        self.pin_overlay();
        Ok(())
    }

    fn content_index(&self, id: LayerId) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| matches!(n, SceneNode::Content(l) if l.id == id))
    }

    fn alloc_id(&mut self) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;
        id
    }

    #[cfg(test)]
    fn push_raw_overlay_below_content(&mut self, bitmap: Bitmap) -> LayerId {
        let id = self.alloc_id();
        self.nodes.insert(
            0,
            SceneNode::Overlay(Overlay {
                id,
                bitmap,
                transform: Transform2D::default(),
            }),
        );
        id
    }
}
