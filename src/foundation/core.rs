use crate::foundation::error::{PfpError, PfpResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Largest canvas side the CPU compositor can allocate (surfaces are `u16`-sized).
pub const MAX_CANVAS_SIDE: u32 = 16_384;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct LayerId(pub u64);

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

/// Export frame bounds, in canvas units (one unit is one output pixel).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 500,
            height: 500,
        }
    }
}

impl Canvas {
    pub fn center(self) -> Point {
        Point::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }

    pub fn validate(self) -> PfpResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(PfpError::validation("canvas width/height must be > 0"));
        }
        if self.width > MAX_CANVAS_SIDE || self.height > MAX_CANVAS_SIDE {
            return Err(PfpError::validation(format!(
                "canvas {}x{} exceeds {MAX_CANVAS_SIDE}x{MAX_CANVAS_SIDE}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Circular region that content layers are clipped to on export.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClipCircle {
    pub center: Point,
    pub radius: f64,
}

impl ClipCircle {
    pub fn centered_in(canvas: Canvas, radius: f64) -> Self {
        Self {
            center: canvas.center(),
            radius,
        }
    }

    pub fn diameter(self) -> f64 {
        self.radius * 2.0
    }

    pub fn validate_within(self, canvas: Canvas) -> PfpResult<()> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(PfpError::validation("clip radius must be finite and > 0"));
        }
        let bounds = Rect::new(0.0, 0.0, f64::from(canvas.width), f64::from(canvas.height));
        let r = self.radius;
        let c = self.center;
        if c.x - r < bounds.x0 || c.y - r < bounds.y0 || c.x + r > bounds.x1 || c.y + r > bounds.y1
        {
            return Err(PfpError::validation(format!(
                "clip circle (center {:?}, radius {r}) does not fit inside {}x{} canvas",
                c, canvas.width, canvas.height
            )));
        }
        Ok(())
    }

    pub fn to_path(self) -> BezPath {
        use kurbo::Shape as _;
        kurbo::Circle::new(self.center, self.radius).to_path(0.1)
    }

    pub fn contains(self, p: Point) -> bool {
        (p - self.center).hypot() <= self.radius
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transform2D {
    pub translate: Vec2,
    pub rotation_rad: f64,
    pub scale: Vec2,  // default (1,1)
    pub anchor: Vec2, // pivot in local space
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            translate: Vec2::ZERO,
            rotation_rad: 0.0,
            scale: Vec2::new(1.0, 1.0),
            anchor: Vec2::ZERO,
        }
    }
}

impl Transform2D {
    /// Center-origin placement: the middle of a `width x height` bitmap lands on `center`.
    pub fn centered(center: Point, width: u32, height: u32, scale: f64) -> Self {
        let anchor = Vec2::new(f64::from(width) / 2.0, f64::from(height) / 2.0);
        Self {
            translate: center.to_vec2() - anchor,
            rotation_rad: 0.0,
            scale: Vec2::new(scale, scale),
            anchor,
        }
    }

    /// Canvas-space position of the anchor (the bitmap center for layers built by
    /// [`Transform2D::centered`]).
    pub fn center(self) -> Point {
        (self.translate + self.anchor).to_point()
    }

    pub fn move_center_to(&mut self, center: Point) {
        self.translate = center.to_vec2() - self.anchor;
    }

    pub fn scaled_size(self, width: u32, height: u32) -> (f64, f64) {
        (
            f64::from(width) * self.scale.x.abs(),
            f64::from(height) * self.scale.y.abs(),
        )
    }

    pub fn to_affine(self) -> Affine {
        let t_translate = Affine::translate(self.translate);
        let t_anchor = Affine::translate(self.anchor);
        let t_unanchor = Affine::translate(-self.anchor);
        let t_rotate = Affine::rotate(self.rotation_rad);
        let t_scale = Affine::scale_non_uniform(self.scale.x, self.scale.y);

        // Canonical order:
        // T(translate) * T(anchor) * R(rot) * S(scale) * T(-anchor)
        t_translate * t_anchor * t_rotate * t_scale * t_unanchor
    }
}
