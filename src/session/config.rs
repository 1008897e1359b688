use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::{
    export::png::DEFAULT_EXPORT_FILE_NAME,
    foundation::core::{Canvas, ClipCircle},
    foundation::error::{PfpError, PfpResult},
    layout::fit::FitPolicy,
    render::backend::RenderSettings,
};

pub const DEFAULT_CLIP_RADIUS: f64 = 240.0;
pub const DEFAULT_SEED: u64 = 0x5EED;

/// Editor configuration. Every field has a default, so `{}` is a valid config file.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub canvas: Canvas,
    /// Radius of the export clip circle, centered on the canvas.
    pub clip_radius: f64,
    pub fit: FitPolicy,
    /// Seed for scatter placement jitter.
    pub seed: u64,
    pub export_file_name: String,
    /// Frame loaded when the session starts. Relative paths in a config file are resolved
    /// against the file's directory.
    pub overlay: Option<PathBuf>,
    pub render: RenderSettings,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            clip_radius: DEFAULT_CLIP_RADIUS,
            fit: FitPolicy::default(),
            seed: DEFAULT_SEED,
            export_file_name: DEFAULT_EXPORT_FILE_NAME.to_string(),
            overlay: None,
            render: RenderSettings::default(),
        }
    }
}

impl EditorConfig {
    pub fn from_json_file(path: &Path) -> PfpResult<Self> {
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        let mut cfg: Self = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse config JSON '{}'", path.display()))?;
        if let (Some(overlay), Some(dir)) = (cfg.overlay.as_mut(), path.parent())
            && overlay.is_relative()
        {
            *overlay = dir.join(&*overlay);
        }
        Ok(cfg)
    }

    pub fn clip(&self) -> ClipCircle {
        ClipCircle::centered_in(self.canvas, self.clip_radius)
    }

    pub fn validate(&self) -> PfpResult<()> {
        self.canvas.validate()?;
        self.clip().validate_within(self.canvas)?;
        self.fit.validate()?;

        let name = self.export_file_name.trim();
        if name.is_empty() {
            return Err(PfpError::validation("export_file_name must be non-empty"));
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(PfpError::validation(format!(
                "export_file_name '{name}' must be a bare file name"
            )));
        }
        Ok(())
    }
}
