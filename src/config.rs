use std::ops::RangeInclusive;
use std::path::Path;

use anyhow::Context as _;

use crate::encode::codec::CodecId;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{StillsError, StillsResult};
use crate::sequence::order::SortOrder;

/// Accepted playback rates (images per second).
pub const FPS_RANGE: RangeInclusive<f64> = 0.1..=30.0;
/// Accepted output widths in pixels.
pub const WIDTH_RANGE: RangeInclusive<u32> = 480..=3840;
/// Accepted output heights in pixels.
pub const HEIGHT_RANGE: RangeInclusive<u32> = 360..=2160;

/// User-facing export settings.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct ExportConfig {
    /// Images per second; each image is held for `1 / fps` seconds.
    pub fps: f64,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Requested codec; replaced by a fallback when the runtime cannot record it.
    pub codec: CodecId,
    /// Ordering mode applied to the sequence before export.
    pub sort_order: SortOrder,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            fps: 25.0,
            width: 1920,
            height: 1080,
            codec: CodecId::default(),
            sort_order: SortOrder::Manual,
        }
    }
}

impl ExportConfig {
    /// Check every bound.
    pub fn validate(&self) -> StillsResult<()> {
        if !FPS_RANGE.contains(&self.fps) {
            return Err(StillsError::validation(format!(
                "fps must be within {}..={}, got {}",
                FPS_RANGE.start(),
                FPS_RANGE.end(),
                self.fps
            )));
        }
        if !WIDTH_RANGE.contains(&self.width) {
            return Err(StillsError::validation(format!(
                "width must be within {}..={}, got {}",
                WIDTH_RANGE.start(),
                WIDTH_RANGE.end(),
                self.width
            )));
        }
        if !HEIGHT_RANGE.contains(&self.height) {
            return Err(StillsError::validation(format!(
                "height must be within {}..={}, got {}",
                HEIGHT_RANGE.start(),
                HEIGHT_RANGE.end(),
                self.height
            )));
        }
        Ok(())
    }

    /// Validated playback rate.
    pub fn fps(&self) -> StillsResult<Fps> {
        self.validate()?;
        Fps::new(self.fps)
    }

    /// Validated output canvas.
    pub fn canvas(&self) -> StillsResult<Canvas> {
        self.validate()?;
        Canvas::new(self.width, self.height)
    }

    /// Load settings from a JSON file; missing fields keep their defaults.
    pub fn from_json_path(path: &Path) -> StillsResult<Self> {
        let f = std::fs::File::open(path)
            .with_context(|| format!("open settings '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(std::io::BufReader::new(f))
            .with_context(|| format!("parse settings '{}'", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
