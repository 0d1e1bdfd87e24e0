use image::imageops::FilterType;

use crate::foundation::error::{StillsError, StillsResult};
use crate::render::letterbox::{PixelRect, letterbox};
use crate::render::surface::Surface;
use crate::sequence::entry::ImageEntry;

/// Color every frame is cleared to before the image is drawn.
pub const BACKGROUND_RGBA: [u8; 4] = [0, 0, 0, 255];

/// Decode an entry's bytes into straight-alpha RGBA8.
pub fn decode_image(entry: &ImageEntry) -> StillsResult<image::RgbaImage> {
    decode_bytes(entry.source().bytes())
        .map_err(|e| StillsError::decode(format!("failed to load '{}': {e}", entry.name())))
}

pub(crate) fn decode_bytes(bytes: &[u8]) -> image::ImageResult<image::RgbaImage> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// Paint one still onto `surface`.
///
/// The whole surface is cleared to [`BACKGROUND_RGBA`] first, then the image is scaled to fit
/// (aspect ratio preserved) and centered. Returns where the image landed.
pub fn render_frame(surface: &mut Surface, image: &image::RgbaImage) -> StillsResult<PixelRect> {
    let canvas = surface.canvas();
    let rect = letterbox(image.width(), image.height(), canvas)?;
    let dst = PixelRect::snap(rect, canvas);

    surface.clear(BACKGROUND_RGBA);
    if dst.width == image.width() && dst.height == image.height() {
        surface.draw_image(image, dst);
    } else {
        let scaled = image::imageops::resize(image, dst.width, dst.height, FilterType::Triangle);
        surface.draw_image(&scaled, dst);
    }
    Ok(dst)
}
