use crate::{
    assets::decode::{FsDecoder, ImageDecoder, ImageSource},
    export::png::{ExportedPng, export_scene},
    foundation::core::{LayerId, Transform2D, Vec2},
    foundation::error::{PfpError, PfpResult},
    layout::fit::{place_new_layer, place_overlay},
    layout::rng::Rng64,
    render::cpu::CpuCompositor,
    scene::model::Scene,
    session::config::EditorConfig,
};

/// Which host controls are currently actionable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct ControlState {
    pub delete_enabled: bool,
    pub reset_enabled: bool,
    pub export_enabled: bool,
    pub has_overlay: bool,
}

/// Outcome of a multi-file add. Failed sources are skipped; the rest still load.
#[derive(Debug, Default)]
pub struct AddReport {
    pub added: Vec<LayerId>,
    pub failed: Vec<(String, PfpError)>,
}

impl AddReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// One editing session: owns the scene and exposes the host-facing command handlers.
pub struct EditorSession<D: ImageDecoder = FsDecoder> {
    config: EditorConfig,
    scene: Scene,
    rng: Rng64,
    decoder: D,
    compositor: CpuCompositor,
}

impl EditorSession<FsDecoder> {
    pub fn new(config: EditorConfig) -> PfpResult<Self> {
        Self::with_decoder(config, FsDecoder)
    }
}

impl<D: ImageDecoder> EditorSession<D> {
    pub fn with_decoder(config: EditorConfig, decoder: D) -> PfpResult<Self> {
        config.validate()?;
        let scene = Scene::new(config.canvas, config.clip())?;
        let mut session = Self {
            rng: Rng64::new(config.seed),
            compositor: CpuCompositor::new(config.render.clone()),
            scene,
            decoder,
            config,
        };
        if let Some(path) = session.config.overlay.clone() {
            session.on_replace_overlay(&ImageSource::Path(path))?;
        }
        Ok(session)
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Decodes and places each source in order.
    #[tracing::instrument(skip(self, sources), fields(count = sources.len()))]
    pub fn on_add_images(&mut self, sources: &[ImageSource]) -> AddReport {
        let mut report = AddReport::default();
        for source in sources {
            match self.add_one(source) {
                Ok(id) => report.added.push(id),
                Err(err) => {
                    tracing::warn!(source = %source.name(), error = %err, "skipping image");
                    report.failed.push((source.name().into_owned(), err));
                }
            }
        }
        report
    }

    fn add_one(&mut self, source: &ImageSource) -> PfpResult<LayerId> {
        let bitmap = self.decoder.decode(source)?.into_bitmap(None)?;
        let transform = place_new_layer(
            &bitmap,
            self.scene.clip(),
            &self.config.fit,
            &mut self.rng,
        )?;
        Ok(self.scene.add_layer(bitmap, transform))
    }

    /// Installs a new frame. SVG frames are rasterized at the canvas width.
    pub fn on_replace_overlay(&mut self, source: &ImageSource) -> PfpResult<LayerId> {
        let bitmap = self
            .decoder
            .decode(source)?
            .into_bitmap(Some(self.config.canvas.width))?;
        let transform = place_overlay(&bitmap, self.config.canvas)?;
        Ok(self.scene.replace_overlay(bitmap, transform))
    }

    pub fn on_select(&mut self, id: LayerId) -> bool {
        self.scene.select(id)
    }

    pub fn on_clear_selection(&mut self) {
        self.scene.clear_selection();
    }

    pub fn on_delete_selected(&mut self) -> bool {
        self.scene.delete_selected()
    }

    pub fn on_reset(&mut self) -> usize {
        self.scene.reset_content()
    }

    pub fn on_move(&mut self, id: LayerId, delta: Vec2) -> PfpResult<()> {
        self.scene.translate_layer(id, delta)
    }

    pub fn on_scale(&mut self, id: LayerId, factor: f64) -> PfpResult<()> {
        self.scene.scale_layer(id, factor)
    }

    pub fn on_rotate(&mut self, id: LayerId, radians: f64) -> PfpResult<()> {
        self.scene.rotate_layer(id, radians)
    }

    pub fn on_set_transform(&mut self, id: LayerId, transform: Transform2D) -> PfpResult<()> {
        self.scene.set_transform(id, transform)
    }

    #[tracing::instrument(skip(self))]
    pub fn on_export(&mut self) -> PfpResult<ExportedPng> {
        self.scene.pin_overlay();
        let snap = self.scene.snapshot();
        export_scene(&snap, &mut self.compositor, &self.config.export_file_name)
    }

    pub fn controls(&self) -> ControlState {
        ControlState {
            delete_enabled: self.scene.can_delete_selection(),
            reset_enabled: self.scene.content_len() > 0,
            export_enabled: true,
            has_overlay: self.scene.overlay().is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::{
        assets::bitmap::Bitmap, assets::decode::DecodedImage, foundation::core::Point,
        scene::model::StackEntry,
    };

    /// Serves solid bitmaps keyed by source name: "WxH" decodes, anything else fails.
    #[derive(Default)]
    struct FakeDecoder {
        calls: RefCell<Vec<String>>,
    }

    impl ImageDecoder for FakeDecoder {
        fn decode(&self, source: &ImageSource) -> PfpResult<DecodedImage> {
            let name = source.name().into_owned();
            self.calls.borrow_mut().push(name.clone());
            let (w, h) = name
                .split_once('x')
                .and_then(|(w, h)| Some((w.parse::<u32>().ok()?, h.parse::<u32>().ok()?)))
                .ok_or_else(|| PfpError::decode(format!("cannot decode '{name}'")))?;
            Ok(DecodedImage::Raster(Bitmap::solid(w, h, [9, 9, 9, 255])?))
        }
    }

    fn src(name: &str) -> ImageSource {
        ImageSource::bytes(name, Vec::new())
    }

    fn session() -> EditorSession<FakeDecoder> {
        EditorSession::with_decoder(EditorConfig::default(), FakeDecoder::default()).unwrap()
    }

    #[test]
    fn empty_selection_is_ignored() {
        let mut s = session();
        let report = s.on_add_images(&[]);
        assert!(report.added.is_empty() && report.is_clean());
        assert_eq!(s.scene().content_len(), 0);
    }

    #[test]
    fn sources_are_decoded_in_order_and_failures_skipped() {
        let mut s = session();
        let report = s.on_add_images(&[src("800x400"), src("garbage"), src("100x100")]);
        assert_eq!(report.added.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "garbage");
        assert_eq!(
            *s.decoder.calls.borrow(),
            vec!["800x400", "garbage", "100x100"]
        );
        assert_eq!(s.scene().selection(), Some(report.added[1]));
    }

    #[test]
    fn added_layer_uses_cover_fit() {
        let mut s = session();
        let report = s.on_add_images(&[src("800x400")]);
        let layer = s.scene().layer(report.added[0]).unwrap();
        assert!((layer.transform.scale.x - 1.224).abs() < 1e-12);
        assert_eq!(layer.transform.center(), Point::new(250.0, 250.0));
    }

    #[test]
    fn overlay_is_fit_to_canvas_and_pinned() {
        let mut s = session();
        s.on_add_images(&[src("10x10")]);
        let ov = s.on_replace_overlay(&src("1000x1000")).unwrap();
        s.on_add_images(&[src("20x20")]);
        assert_eq!(s.scene().draw_order().last(), Some(&StackEntry::Overlay(ov)));
        let o = s.scene().overlay().unwrap();
        assert!((o.transform.scale.x - 0.5).abs() < 1e-12);
    }

    #[test]
    fn controls_follow_selection() {
        let mut s = session();
        assert_eq!(
            s.controls(),
            ControlState {
                delete_enabled: false,
                reset_enabled: false,
                export_enabled: true,
                has_overlay: false,
            }
        );
        let ids = s.on_add_images(&[src("10x10")]).added;
        assert!(s.controls().delete_enabled);
        s.on_clear_selection();
        assert!(!s.controls().delete_enabled);
        assert!(s.on_select(ids[0]));
        assert!(s.on_delete_selected());
        assert!(!s.controls().delete_enabled);
        assert!(!s.controls().reset_enabled);
    }

    #[test]
    fn failed_overlay_keeps_previous_frame() {
        let mut s = session();
        let ov = s.on_replace_overlay(&src("50x50")).unwrap();
        assert!(s.on_replace_overlay(&src("nope")).is_err());
        assert_eq!(s.scene().overlay().map(|o| o.id), Some(ov));
    }

    #[test]
    fn manipulation_handlers_reach_the_scene() {
        let mut s = session();
        let id = s.on_add_images(&[src("10x10")]).added[0];
        s.on_move(id, Vec2::new(5.0, 0.0)).unwrap();
        s.on_scale(id, 0.5).unwrap();
        s.on_rotate(id, 0.25).unwrap();
        let t = s.scene().layer(id).unwrap().transform;
        assert_eq!(t.center(), Point::new(255.0, 250.0));
        assert_eq!(t.rotation_rad, 0.25);
        assert!(s.on_scale(id, -1.0).is_err());
    }

    #[test]
    fn oversized_image_is_skipped_and_export_still_works() {
        let mut s = session();
        let report = s.on_add_images(&[src("70000x2"), src("800x400")]);
        assert_eq!(report.added.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "70000x2");
        assert!(matches!(report.failed[0].1, PfpError::Validation(_)));
        assert_eq!(s.scene().content_len(), 1);

        let png = s.on_export().unwrap();
        assert_eq!((png.width, png.height), (500, 500));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = EditorConfig {
            clip_radius: -1.0,
            ..EditorConfig::default()
        };
        assert!(EditorSession::with_decoder(cfg, FakeDecoder::default()).is_err());
    }

    #[test]
    fn export_uses_configured_name_and_canvas_size() {
        let mut s = session();
        s.on_add_images(&[src("30x60")]);
        let png = s.on_export().unwrap();
        assert_eq!(png.file_name, "kindred-pfp-showshow.png");
        assert_eq!((png.width, png.height), (500, 500));
        assert!(png.bytes.starts_with(b"\x89PNG"));
    }
}
