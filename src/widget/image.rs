// Still image painter
//
// The image is decoded and fit-scaled once, at construction, then blitted
// centered on every paint. Remote images arrive through the image cache; by
// the time a painter is built the bytes are already on disk.

use super::Painter;
use crate::error::RenderError;
use crate::render::Surface;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use std::path::Path;

pub struct ImagePainter {
    scaled: Surface,
}

impl ImagePainter {
    pub fn from_path(path: &Path, region: Size) -> Result<Self, RenderError> {
        let bytes = std::fs::read(path).map_err(RenderError::Backend)?;
        Self::from_bytes(&bytes, region)
    }

    pub fn from_bytes(bytes: &[u8], region: Size) -> Result<Self, RenderError> {
        let decoded = image::load_from_memory(bytes)?;
        Ok(Self {
            scaled: fit_scale(&decoded, region),
        })
    }
}

impl Painter for ImagePainter {
    fn paint(&mut self, canvas: &mut Surface) -> Result<(), RenderError> {
        let x = (canvas.width() as i32 - self.scaled.width() as i32) / 2;
        let y = (canvas.height() as i32 - self.scaled.height() as i32) / 2;
        canvas.blit(&self.scaled, Point::new(x, y));
        Ok(())
    }
}

/// Scale to the largest size that fits `bounds` while keeping the aspect
/// ratio, and convert to a Surface.
pub(crate) fn fit_scale(img: &image::DynamicImage, bounds: Size) -> Surface {
    let resized = img.resize(
        bounds.width.max(1),
        bounds.height.max(1),
        image::imageops::FilterType::Triangle,
    );
    let rgb = resized.to_rgb8();
    let mut out = Surface::new(Size::new(rgb.width(), rgb.height()));
    for (x, y, px) in rgb.enumerate_pixels() {
        out.set_pixel(x, y, Rgb888::new(px[0], px[1], px[2]));
    }
    out
}
