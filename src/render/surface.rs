use crate::foundation::core::Canvas;
use crate::foundation::math::blend_channel_over;
use crate::render::letterbox::PixelRect;

/// A captured frame as straight-alpha RGBA8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
}

/// Off-screen CPU drawing surface.
///
/// Pixels are straight-alpha RGBA8. After [`Surface::clear`] with an opaque color the surface
/// stays opaque, since images are composited source-over.
#[derive(Clone, Debug)]
pub struct Surface {
    canvas: Canvas,
    data: Vec<u8>,
}

impl Surface {
    /// Allocate a transparent surface.
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            data: vec![0u8; canvas.rgba_len()],
        }
    }

    /// Surface dimensions.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.canvas.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.canvas.height
    }

    /// Raw RGBA8 bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Fill every pixel with `rgba`.
    pub fn clear(&mut self, rgba: [u8; 4]) {
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }

    /// Read one pixel. Returns `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.canvas.width || y >= self.canvas.height {
            return None;
        }
        let i = (y as usize * self.canvas.width as usize + x as usize) * 4;
        let px = &self.data[i..i + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Composite `image` source-over with its top-left corner at `(dst.x, dst.y)`.
    ///
    /// `image` must already be `dst.width x dst.height`; anything outside the surface is
    /// clipped.
    pub(crate) fn draw_image(&mut self, image: &image::RgbaImage, dst: PixelRect) {
        let sw = self.canvas.width as usize;
        let cols = (image.width().min(dst.width) as usize)
            .min(sw.saturating_sub(dst.x as usize));
        let rows = (image.height().min(dst.height) as usize)
            .min((self.canvas.height as usize).saturating_sub(dst.y as usize));
        if cols == 0 || rows == 0 {
            return;
        }
        let src = image.as_raw();
        let src_stride = image.width() as usize * 4;

        for row in 0..rows {
            let s_off = row * src_stride;
            let d_off = ((dst.y as usize + row) * sw + dst.x as usize) * 4;
            let s_row = &src[s_off..s_off + cols * 4];
            let d_row = &mut self.data[d_off..d_off + cols * 4];

            for (d, s) in d_row.chunks_exact_mut(4).zip(s_row.chunks_exact(4)) {
                match s[3] {
                    255 => d.copy_from_slice(s),
                    0 => {}
                    a => {
                        d[0] = blend_channel_over(d[0], s[0], a);
                        d[1] = blend_channel_over(d[1], s[1], a);
                        d[2] = blend_channel_over(d[2], s[2], a);
                        d[3] = blend_channel_over(d[3], 255, a);
                    }
                }
            }
        }
    }

    /// Copy the current pixels into a frame.
    pub fn snapshot(&self) -> FrameRGBA {
        FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data: self.data.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas(w: u32, h: u32) -> Canvas {
        Canvas::new(w, h).unwrap()
    }

    #[test]
    fn clear_fills_every_pixel() {
        let mut s = Surface::new(canvas(3, 2));
        s.clear([1, 2, 3, 255]);
        assert!(s.data().chunks_exact(4).all(|p| p == [1, 2, 3, 255]));
        assert_eq!(s.pixel(3, 0), None);
    }

    #[test]
    fn draw_image_places_and_clips() {
        let mut s = Surface::new(canvas(4, 4));
        s.clear([0, 0, 0, 255]);
        let img = image::RgbaImage::from_pixel(3, 3, image::Rgba([200, 100, 50, 255]));
        s.draw_image(
            &img,
            PixelRect {
                x: 2,
                y: 2,
                width: 3,
                height: 3,
            },
        );

        assert_eq!(s.pixel(1, 1), Some([0, 0, 0, 255]));
        assert_eq!(s.pixel(2, 2), Some([200, 100, 50, 255]));
        assert_eq!(s.pixel(3, 3), Some([200, 100, 50, 255]));
        assert_eq!(s.pixel(2, 1), Some([0, 0, 0, 255]));
    }

    #[test]
    fn translucent_pixels_blend_over_the_background() {
        let mut s = Surface::new(canvas(1, 1));
        s.clear([0, 0, 0, 255]);
        let img = image::RgbaImage::from_pixel(1, 1, image::Rgba([255, 0, 0, 128]));
        s.draw_image(
            &img,
            PixelRect {
                x: 0,
                y: 0,
                width: 1,
                height: 1,
            },
        );
        assert_eq!(s.pixel(0, 0), Some([128, 0, 0, 255]));
    }

    #[test]
    fn snapshot_is_independent_of_later_draws() {
        let mut s = Surface::new(canvas(2, 2));
        s.clear([9, 9, 9, 255]);
        let snap = s.snapshot();
        s.clear([0, 0, 0, 255]);
        assert_eq!(snap.width, 2);
        assert!(snap.data.chunks_exact(4).all(|p| p == [9, 9, 9, 255]));
    }
}
