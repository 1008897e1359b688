use crate::foundation::error::{PfpError, PfpResult};

const MAX_DIM: u32 = 16_384;

/// Raster size for an SVG scaled uniformly to `target_width` pixels wide.
///
/// With no target the SVG's own size is used.
pub fn svg_raster_size(tree: &usvg::Tree, target_width: Option<u32>) -> PfpResult<(u32, u32)> {
    let size = tree.size();
    let (w, h) = (size.width(), size.height());
    if !w.is_finite() || !h.is_finite() || w <= 0.0 || h <= 0.0 {
        return Err(PfpError::decode("svg has invalid width/height"));
    }

    let scale = match target_width {
        Some(0) => return Err(PfpError::validation("svg target width must be > 0")),
        Some(tw) => f64::from(tw) / f64::from(w),
        None => 1.0,
    };
    let out_w = (f64::from(w) * scale).round().max(1.0) as u32;
    let out_h = (f64::from(h) * scale).round().max(1.0) as u32;

    if out_w > MAX_DIM || out_h > MAX_DIM {
        return Err(PfpError::decode(format!(
            "svg raster size too large: {out_w}x{out_h} (max {MAX_DIM}x{MAX_DIM})"
        )));
    }
    Ok((out_w, out_h))
}

pub fn rasterize_svg_to_premul_rgba8(
    tree: &usvg::Tree,
    width: u32,
    height: u32,
) -> PfpResult<Vec<u8>> {
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| PfpError::render("failed to allocate svg pixmap"))?;

    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

    resvg::render(tree, xform, &mut pixmap.as_mut());
    Ok(pixmap.data().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(svg: &str) -> usvg::Tree {
        usvg::Tree::from_data(svg.as_bytes(), &usvg::Options::default()).unwrap()
    }

    #[test]
    fn size_follows_target_width() {
        let t = tree(r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50"></svg>"#);
        assert_eq!(svg_raster_size(&t, None).unwrap(), (100, 50));
        assert_eq!(svg_raster_size(&t, Some(500)).unwrap(), (500, 250));
        assert!(svg_raster_size(&t, Some(0)).is_err());
    }

    #[test]
    fn rasterizes_filled_rect() {
        let t = tree(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"><rect width="4" height="4" fill="#ff0000"/></svg>"##,
        );
        let px = rasterize_svg_to_premul_rgba8(&t, 8, 8).unwrap();
        assert_eq!(px.len(), 8 * 8 * 4);
        let center = ((4 * 8) + 4) * 4;
        assert_eq!(&px[center..center + 4], &[255, 0, 0, 255]);
    }
}
