//! Initial placement of newly added layers.
//!
//! Content layers are fitted against the clip circle; the overlay is fitted against the canvas.
//! All transforms use the center-origin convention of [`Transform2D::centered`].

use crate::{
    assets::bitmap::{Bitmap, MAX_BITMAP_SIDE},
    foundation::core::{Canvas, ClipCircle, Point, Transform2D, Vec2},
    foundation::error::{PfpError, PfpResult},
    layout::rng::Rng64,
};

pub const DEFAULT_BLEED: f64 = 1.02;
pub const DEFAULT_SCATTER_WIDTH: f64 = 260.0;
pub const DEFAULT_SCATTER_JITTER: f64 = 50.0;

/// Policy used to place a freshly decoded content layer.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FitPolicy {
    /// Scale up just enough to cover the circle, times `bleed`, centered on it.
    Cover { bleed: f64 },
    /// Fixed output width, center jittered around the circle center. No coverage guarantee.
    Scatter { width: f64, jitter: f64 },
}

impl Default for FitPolicy {
    fn default() -> Self {
        Self::Cover {
            bleed: DEFAULT_BLEED,
        }
    }
}

impl FitPolicy {
    pub fn scatter() -> Self {
        Self::Scatter {
            width: DEFAULT_SCATTER_WIDTH,
            jitter: DEFAULT_SCATTER_JITTER,
        }
    }

    pub fn validate(&self) -> PfpResult<()> {
        match *self {
            Self::Cover { bleed } => {
                if !bleed.is_finite() || bleed < 1.0 {
                    return Err(PfpError::validation("cover bleed must be finite and >= 1"));
                }
            }
            Self::Scatter { width, jitter } => {
                if !width.is_finite() || width <= 0.0 {
                    return Err(PfpError::validation("scatter width must be finite and > 0"));
                }
                if !jitter.is_finite() || jitter < 0.0 {
                    return Err(PfpError::validation(
                        "scatter jitter must be finite and >= 0",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Smallest uniform scale at which a `width x height` image covers a `diameter` square, times
/// `bleed`.
pub fn cover_scale(width: u32, height: u32, diameter: f64, bleed: f64) -> f64 {
    let sx = diameter / f64::from(width);
    let sy = diameter / f64::from(height);
    sx.max(sy) * bleed
}

pub fn place_new_layer(
    bitmap: &Bitmap,
    target: ClipCircle,
    policy: &FitPolicy,
    rng: &mut Rng64,
) -> PfpResult<Transform2D> {
    ensure_placeable(bitmap)?;
    policy.validate()?;

    let t = match *policy {
        FitPolicy::Cover { bleed } => {
            let scale = cover_scale(bitmap.width, bitmap.height, target.diameter(), bleed);
            Transform2D::centered(target.center, bitmap.width, bitmap.height, scale)
        }
        FitPolicy::Scatter { width, jitter } => {
            let scale = width / f64::from(bitmap.width);
            let offset = Vec2::new(rng.symmetric(jitter), rng.symmetric(jitter));
            Transform2D::centered(target.center + offset, bitmap.width, bitmap.height, scale)
        }
    };
    Ok(t)
}

/// Overlay spans the full canvas width and sits on the canvas center.
pub fn place_overlay(bitmap: &Bitmap, canvas: Canvas) -> PfpResult<Transform2D> {
    ensure_placeable(bitmap)?;
    let scale = f64::from(canvas.width) / f64::from(bitmap.width);
    Ok(Transform2D::centered(
        canvas.center(),
        bitmap.width,
        bitmap.height,
        scale,
    ))
}

/// True when the scaled footprint of `bitmap` contains `circle`.
///
/// Only axis-aligned layers are measured: any non-zero rotation reports `false`, even when the
/// rotated footprint would still cover the circle.
pub fn covers_circle(bitmap: &Bitmap, transform: Transform2D, circle: ClipCircle) -> bool {
    let (w, h) = transform.scaled_size(bitmap.width, bitmap.height);
    let c: Point = transform.center();
    let left = c.x - w / 2.0;
    let top = c.y - h / 2.0;
    transform.rotation_rad == 0.0
        && left <= circle.center.x - circle.radius
        && top <= circle.center.y - circle.radius
        && left + w >= circle.center.x + circle.radius
        && top + h >= circle.center.y + circle.radius
}

fn ensure_placeable(bitmap: &Bitmap) -> PfpResult<()> {
    if bitmap.width == 0 || bitmap.height == 0 {
        return Err(PfpError::validation(format!(
            "cannot place an empty {}x{} bitmap",
            bitmap.width, bitmap.height
        )));
    }
    if bitmap.width > MAX_BITMAP_SIDE || bitmap.height > MAX_BITMAP_SIDE {
        return Err(PfpError::validation(format!(
            "cannot place a {}x{} bitmap (max side {MAX_BITMAP_SIDE})",
            bitmap.width, bitmap.height
        )));
    }
    Ok(())
}
