use std::io::Cursor;

use pfpframe::{EditorConfig, EditorSession, ImageSource, RenderSettings};

fn png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

/// Transparent square with an opaque band around the edge, like a ring frame.
fn ring_png(side: u32, band: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(side, side, |x, y| {
        let edge = x < band || y < band || x >= side - band || y >= side - band;
        if edge {
            image::Rgba(rgba)
        } else {
            image::Rgba([0, 0, 0, 0])
        }
    });
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn decode(bytes: &[u8]) -> image::RgbaImage {
    image::load_from_memory(bytes).unwrap().to_rgba8()
}

fn session() -> EditorSession {
    EditorSession::new(EditorConfig::default()).unwrap()
}

#[test]
fn empty_scene_exports_transparent_500_square() {
    let mut s = session();
    let out = s.on_export().unwrap();
    assert_eq!(out.file_name, "kindred-pfp-showshow.png");

    let img = decode(&out.bytes);
    assert_eq!(img.dimensions(), (500, 500));
    assert!(img.pixels().all(|p| p.0[3] == 0));
}

#[test]
fn export_size_is_fixed_regardless_of_inputs() {
    let mut s = session();
    s.on_add_images(&[
        ImageSource::bytes("big.png", png(1200, 900, [10, 20, 30, 255])),
        ImageSource::bytes("tiny.png", png(3, 7, [40, 50, 60, 255])),
    ]);
    let img = decode(&s.on_export().unwrap().bytes);
    assert_eq!(img.dimensions(), (500, 500));
}

#[test]
fn content_is_clipped_and_fills_the_circle() {
    let mut s = session();
    s.on_add_images(&[ImageSource::bytes(
        "wide.png",
        png(800, 400, [255, 0, 0, 255]),
    )]);
    let img = decode(&s.on_export().unwrap().bytes);

    assert_eq!(img.get_pixel(250, 250).0, [255, 0, 0, 255]);
    // Near the circle edge on each axis, still inside radius 240.
    for (x, y) in [(14, 250), (485, 250), (250, 14), (250, 485)] {
        assert_eq!(img.get_pixel(x, y).0, [255, 0, 0, 255], "({x},{y})");
    }
    // Corners are outside the circle.
    for (x, y) in [(0, 0), (499, 0), (0, 499), (499, 499), (40, 40)] {
        assert_eq!(img.get_pixel(x, y).0[3], 0, "({x},{y})");
    }
}

#[test]
fn overlay_draws_above_content_and_outside_the_clip() {
    let mut s = session();
    s.on_add_images(&[ImageSource::bytes(
        "photo.png",
        png(600, 600, [0, 0, 255, 255]),
    )]);
    s.on_replace_overlay(&ImageSource::bytes(
        "ring.png",
        ring_png(500, 20, [255, 255, 0, 255]),
    ))
    .unwrap();
    let img = decode(&s.on_export().unwrap().bytes);

    // Ring band at the corners, where content is clipped away.
    assert_eq!(img.get_pixel(5, 5).0, [255, 255, 0, 255]);
    // Ring band over content.
    assert_eq!(img.get_pixel(250, 5).0, [255, 255, 0, 255]);
    // Transparent ring interior reveals content.
    assert_eq!(img.get_pixel(250, 250).0, [0, 0, 255, 255]);
}

#[test]
fn reset_then_export_matches_overlay_only_export() {
    let ring = ring_png(250, 10, [0, 128, 0, 200]);

    let mut edited = session();
    edited
        .on_replace_overlay(&ImageSource::bytes("ring.png", ring.clone()))
        .unwrap();
    edited.on_add_images(&[ImageSource::bytes("a.png", png(300, 300, [200, 0, 0, 255]))]);
    edited.on_reset();

    let mut fresh = session();
    fresh
        .on_replace_overlay(&ImageSource::bytes("ring.png", ring))
        .unwrap();

    let a = decode(&edited.on_export().unwrap().bytes);
    let b = decode(&fresh.on_export().unwrap().bytes);
    assert_eq!(a.as_raw(), b.as_raw());
}

#[test]
fn svg_frame_is_rasterized_at_canvas_width() {
    let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
        <circle cx="50" cy="50" r="46" fill="none" stroke="#ff00ff" stroke-width="8"/>
    </svg>"##;
    let mut s = session();
    let ov = s
        .on_replace_overlay(&ImageSource::bytes("ring.svg", svg.to_vec()))
        .unwrap();
    let o = s.scene().overlay().unwrap();
    assert_eq!(o.id, ov);
    assert_eq!((o.bitmap.width, o.bitmap.height), (500, 500));
    assert!((o.transform.scale.x - 1.0).abs() < 1e-12);

    let img = decode(&s.on_export().unwrap().bytes);
    // On the stroke, top center.
    assert_eq!(img.get_pixel(250, 20).0, [255, 0, 255, 255]);
    assert_eq!(img.get_pixel(250, 250).0[3], 0);
}

#[test]
fn clear_color_is_applied_when_configured() {
    let mut s = EditorSession::new(EditorConfig {
        render: RenderSettings {
            clear_rgba: Some([255, 255, 255, 255]),
        },
        ..EditorConfig::default()
    })
    .unwrap();
    let img = decode(&s.on_export().unwrap().bytes);
    assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255, 255]);
}

#[test]
fn snapshot_export_ignores_later_edits() {
    let mut s = session();
    let id = s
        .on_add_images(&[ImageSource::bytes("a.png", png(100, 100, [0, 200, 0, 255]))])
        .added[0];
    let snap = s.scene().snapshot();
    s.on_move(id, pfpframe::Vec2::new(1000.0, 0.0)).unwrap();

    let mut compositor = pfpframe::CpuCompositor::default();
    let out = pfpframe::export_scene(&snap, &mut compositor, "snap.png").unwrap();
    let img = decode(&out.bytes);
    assert_eq!(img.get_pixel(250, 250).0, [0, 200, 0, 255]);

    let live = decode(&s.on_export().unwrap().bytes);
    assert_eq!(live.get_pixel(250, 250).0[3], 0);
}
