use crate::foundation::core::{Canvas, Rect};
use crate::foundation::error::{StillsError, StillsResult};

/// Scale-to-fit placement of an `image_width x image_height` image on `canvas`.
///
/// The image keeps its aspect ratio and is centered: a relatively wider image fills the canvas
/// width (bars above and below), anything else fills the height (bars left and right).
pub fn letterbox(image_width: u32, image_height: u32, canvas: Canvas) -> StillsResult<Rect> {
    if image_width == 0 || image_height == 0 {
        return Err(StillsError::validation(format!(
            "image dimensions must be non-zero, got {image_width}x{image_height}"
        )));
    }
    if canvas.width == 0 || canvas.height == 0 {
        return Err(StillsError::validation("canvas dimensions must be non-zero"));
    }

    let image_aspect = f64::from(image_width) / f64::from(image_height);
    let cw = f64::from(canvas.width);
    let ch = f64::from(canvas.height);

    let rect = if image_aspect > canvas.aspect() {
        let h = cw / image_aspect;
        let y = (ch - h) / 2.0;
        Rect::new(0.0, y, cw, y + h)
    } else {
        let w = ch * image_aspect;
        let x = (cw - w) / 2.0;
        Rect::new(x, 0.0, x + w, ch)
    };
    Ok(rect)
}

/// Whole-pixel destination rectangle inside a canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width, at least 1.
    pub width: u32,
    /// Height, at least 1.
    pub height: u32,
}

impl PixelRect {
    /// Round `rect` to pixel edges, clamped to `canvas`.
    pub fn snap(rect: Rect, canvas: Canvas) -> Self {
        let (x, width) = snap_span(rect.x0, rect.x1, canvas.width);
        let (y, height) = snap_span(rect.y0, rect.y1, canvas.height);
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the rectangle covers the whole canvas.
    pub fn fills(&self, canvas: Canvas) -> bool {
        self.x == 0 && self.y == 0 && self.width == canvas.width && self.height == canvas.height
    }
}

fn snap_span(lo: f64, hi: f64, limit: u32) -> (u32, u32) {
    let max = f64::from(limit);
    let lo = lo.round().clamp(0.0, max - 1.0) as u32;
    let hi = hi.round().clamp(0.0, max) as u32;
    (lo, hi.saturating_sub(lo).max(1))
}
