use std::sync::Arc;

use crate::{
    assets::bitmap::{Bitmap, premul_rgba8},
    foundation::core::{Affine, BezPath, Canvas, Point, Transform2D},
    foundation::error::{PfpError, PfpResult},
    render::backend::{FrameRGBA, RenderSettings},
    render::composite::over_in_place,
    scene::snapshot::{SceneSnapshot, SnapshotLayer},
};

/// CPU export compositor built on `vello_cpu`.
///
/// A frame is produced in two passes over canvas-sized surfaces: content layers inside a circular
/// clip layer, then the overlay with no clip. The passes are composited source-over onto the
/// background in that order, so the overlay is always on top.
pub struct CpuCompositor {
    settings: RenderSettings,
    ctx: Option<vello_cpu::RenderContext>,
}

impl CpuCompositor {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            ctx: None,
        }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    #[tracing::instrument(skip(self, snap), fields(content = snap.content.len(), overlay = snap.overlay.is_some()))]
    pub fn render(&mut self, snap: &SceneSnapshot) -> PfpResult<FrameRGBA> {
        let (width, height) = surface_dims(snap.canvas)?;
        let len = usize::from(width) * usize::from(height) * 4;

        let bg = self
            .settings
            .clear_rgba
            .map(|[r, g, b, a]| premul_rgba8(r, g, b, a))
            .unwrap_or([0, 0, 0, 0]);
        let mut frame = bg.repeat(len / 4);

        if !snap.content.is_empty() {
            let clip = bezpath_to_cpu(&snap.clip.to_path());
            let content = self.render_pass(width, height, &snap.content, Some(&clip))?;
            over_in_place(&mut frame, content.data_as_u8_slice(), 1.0)?;
        }

        if let Some(overlay) = &snap.overlay {
            let ring = self.render_pass(width, height, std::slice::from_ref(overlay), None)?;
            over_in_place(&mut frame, ring.data_as_u8_slice(), 1.0)?;
        }

        Ok(FrameRGBA {
            width: snap.canvas.width,
            height: snap.canvas.height,
            data: frame,
            premultiplied: true,
        })
    }

    fn render_pass(
        &mut self,
        width: u16,
        height: u16,
        layers: &[SnapshotLayer],
        clip: Option<&vello_cpu::kurbo::BezPath>,
    ) -> PfpResult<vello_cpu::Pixmap> {
        let mut pixmap = vello_cpu::Pixmap::new(width, height);
        self.with_ctx_mut(width, height, |ctx| {
            if let Some(clip) = clip {
                ctx.push_clip_layer(clip);
            }
            for layer in layers {
                draw_bitmap(ctx, &layer.bitmap, layer.transform)?;
            }
            if clip.is_some() {
                ctx.pop_layer();
            }
            ctx.flush();
            ctx.render_to_pixmap(&mut pixmap);
            Ok(())
        })?;
        Ok(pixmap)
    }

    fn with_ctx_mut<R>(
        &mut self,
        width: u16,
        height: u16,
        f: impl FnOnce(&mut vello_cpu::RenderContext) -> PfpResult<R>,
    ) -> PfpResult<R> {
        let mut ctx = match self.ctx.take() {
            None => vello_cpu::RenderContext::new(width, height),
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            Some(_) => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        let out = f(&mut ctx)?;
        self.ctx = Some(ctx);
        Ok(out)
    }
}

impl Default for CpuCompositor {
    fn default() -> Self {
        Self::new(RenderSettings::default())
    }
}

fn surface_dims(canvas: Canvas) -> PfpResult<(u16, u16)> {
    canvas.validate()?;
    let width: u16 = canvas
        .width
        .try_into()
        .map_err(|_| PfpError::render("surface width exceeds u16"))?;
    let height: u16 = canvas
        .height
        .try_into()
        .map_err(|_| PfpError::render("surface height exceeds u16"))?;
    Ok((width, height))
}

fn draw_bitmap(
    ctx: &mut vello_cpu::RenderContext,
    bitmap: &Bitmap,
    transform: Transform2D,
) -> PfpResult<()> {
    let pixmap = image_premul_bytes_to_pixmap(&bitmap.rgba8_premul, bitmap.width, bitmap.height)?;
    let paint = vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    };

    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_transform(affine_to_cpu(transform.to_affine()));
    ctx.set_paint(paint);
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        f64::from(bitmap.width),
        f64::from(bitmap.height),
    ));
    Ok(())
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn image_premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> PfpResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| PfpError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| PfpError::render("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(PfpError::render("bitmap byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::ClipCircle;

    fn canvas() -> Canvas {
        Canvas {
            width: 64,
            height: 64,
        }
    }

    fn layer(bitmap: Bitmap, transform: Transform2D) -> SnapshotLayer {
        SnapshotLayer {
            id: crate::foundation::core::LayerId(1),
            bitmap,
            transform,
        }
    }

    fn snap(content: Vec<SnapshotLayer>, overlay: Option<SnapshotLayer>) -> SceneSnapshot {
        SceneSnapshot {
            canvas: canvas(),
            clip: ClipCircle::centered_in(canvas(), 24.0),
            content,
            overlay,
        }
    }

    fn full_cover(rgba: [u8; 4]) -> SnapshotLayer {
        let b = Bitmap::solid(8, 8, rgba).unwrap();
        layer(b, Transform2D::centered(Point::new(32.0, 32.0), 8, 8, 10.0))
    }

    #[test]
    fn empty_scene_is_transparent_and_canvas_sized() {
        let frame = CpuCompositor::default().render(&snap(vec![], None)).unwrap();
        assert_eq!((frame.width, frame.height), (64, 64));
        assert_eq!(frame.data.len(), 64 * 64 * 4);
        assert!(frame.is_fully_transparent());
    }

    #[test]
    fn content_is_clipped_to_circle() {
        let frame = CpuCompositor::default()
            .render(&snap(vec![full_cover([255, 0, 0, 255])], None))
            .unwrap();
        assert_eq!(frame.pixel(32, 32), Some([255, 0, 0, 255]));
        // Corners are outside the radius-24 circle.
        assert_eq!(frame.pixel(1, 1), Some([0, 0, 0, 0]));
        assert_eq!(frame.pixel(62, 62), Some([0, 0, 0, 0]));
        // Just inside the canvas but outside the circle on the horizontal axis.
        assert_eq!(frame.pixel(60, 32), Some([0, 0, 0, 0]));
    }

    #[test]
    fn overlay_is_unclipped_and_on_top() {
        let ring = full_cover([0, 0, 255, 255]);
        let frame = CpuCompositor::default()
            .render(&snap(vec![full_cover([255, 0, 0, 255])], Some(ring)))
            .unwrap();
        assert_eq!(frame.pixel(32, 32), Some([0, 0, 255, 255]));
        assert_eq!(frame.pixel(1, 1), Some([0, 0, 255, 255]));
    }

    #[test]
    fn later_content_draws_above_earlier_content() {
        let frame = CpuCompositor::default()
            .render(&snap(
                vec![full_cover([255, 0, 0, 255]), full_cover([0, 255, 0, 255])],
                None,
            ))
            .unwrap();
        assert_eq!(frame.pixel(32, 32), Some([0, 255, 0, 255]));
    }

    #[test]
    fn clear_color_fills_background() {
        let mut c = CpuCompositor::new(RenderSettings {
            clear_rgba: Some([10, 20, 30, 255]),
        });
        let frame = c.render(&snap(vec![], None)).unwrap();
        assert_eq!(frame.pixel(0, 0), Some([10, 20, 30, 255]));
    }

    #[test]
    fn rendering_is_deterministic_across_context_reuse() {
        let mut c = CpuCompositor::default();
        let s = snap(vec![full_cover([200, 100, 50, 255])], None);
        let a = c.render(&s).unwrap();
        let b = c.render(&s).unwrap();
        assert_eq!(a.data, b.data);
    }
}
