use std::time::Duration;

use crate::foundation::error::{StillsError, StillsResult};

pub use kurbo::Rect;

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Create a canvas with strictly positive dimensions.
    pub fn new(width: u32, height: u32) -> StillsResult<Self> {
        if width == 0 || height == 0 {
            return Err(StillsError::validation(format!(
                "canvas dimensions must be non-zero, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// Width divided by height.
    pub fn aspect(self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    /// Size of a tightly packed RGBA8 buffer for this canvas.
    pub fn rgba_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

/// Playback rate of the still sequence, in images per second.
///
/// Fractional rates are allowed (`0.5` holds every image for two seconds). The value is always
/// finite and strictly positive, so [`Fps::frame_duration`] is never zero or negative.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Fps(f64);

impl Fps {
    /// Create a validated rate.
    pub fn new(fps: f64) -> StillsResult<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(StillsError::validation(format!(
                "fps must be a finite positive number, got {fps}"
            )));
        }
        Ok(Self(fps))
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        self.0
    }

    /// How long each image is held, in milliseconds (`1000 / fps`).
    pub fn frame_duration_ms(self) -> f64 {
        1000.0 / self.0
    }

    /// How long each image is held.
    pub fn frame_duration(self) -> Duration {
        Duration::from_secs_f64(1.0 / self.0)
    }

    /// Nominal playback length of `frames` images.
    pub fn frames_to_duration(self, frames: usize) -> Duration {
        Duration::from_secs_f64(frames as f64 / self.0)
    }
}

impl TryFrom<f64> for Fps {
    type Error = StillsError;

    fn try_from(value: f64) -> StillsResult<Self> {
        Self::new(value)
    }
}

impl From<Fps> for f64 {
    fn from(value: Fps) -> Self {
        value.0
    }
}

impl std::fmt::Display for Fps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
