// Surface - an owned RGB framebuffer
//
// The shared display frame, every widget canvas and every background
// snapshot is a Surface. It implements embedded-graphics' DrawTarget so
// painters can use the crate's primitives and mono-font text directly;
// blits are row-sliced copies with clipping so ticker scrolling can blit at
// negative offsets.

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use std::convert::Infallible;

#[derive(Clone)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<Rgb888>,
}

impl Surface {
    pub fn new(size: Size) -> Self {
        Self::filled(size, Rgb888::BLACK)
    }

    pub fn filled(size: Size, color: Rgb888) -> Self {
        Self {
            width: size.width,
            height: size.height,
            pixels: vec![color; size.width as usize * size.height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn fill(&mut self, color: Rgb888) {
        self.pixels.fill(color);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb888> {
        if x < self.width && y < self.height {
            Some(self.pixels[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgb888) {
        if x < self.width && y < self.height {
            self.pixels[(y * self.width + x) as usize] = color;
        }
    }

    /// Copy `src` onto self with its top-left corner at `dest`, clipping to
    /// both surfaces. Negative coordinates clip on the left/top.
    pub fn blit(&mut self, src: &Surface, dest: Point) {
        let x0 = dest.x.max(0);
        let y0 = dest.y.max(0);
        let x1 = (dest.x + src.width as i32).min(self.width as i32);
        let y1 = (dest.y + src.height as i32).min(self.height as i32);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let row_len = (x1 - x0) as usize;
        for dy in y0..y1 {
            let sy = (dy - dest.y) as u32;
            let sx = (x0 - dest.x) as u32;
            let src_start = (sy * src.width + sx) as usize;
            let dst_start = (dy as u32 * self.width + x0 as u32) as usize;
            self.pixels[dst_start..dst_start + row_len]
                .copy_from_slice(&src.pixels[src_start..src_start + row_len]);
        }
    }

    /// Copy the pixels under `region` into a new surface of the region's
    /// size. Areas outside self come back black.
    pub fn copy_region(&self, region: &Rectangle) -> Surface {
        let mut out = Surface::new(region.size);
        out.blit(self, Point::zero() - region.top_left);
        out
    }

    /// Whole-surface rectangle at the origin, for styled primitives.
    pub fn bounds(&self) -> Rectangle {
        Rectangle::new(Point::zero(), Size::new(self.width, self.height))
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = &[Rgb888]> {
        self.pixels.chunks_exact(self.width.max(1) as usize)
    }
}

impl OriginDimensions for Surface {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Surface {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set_pixel(point.x as u32, point.y as u32, color);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb888 = Rgb888::new(255, 0, 0);
    const BLUE: Rgb888 = Rgb888::new(0, 0, 255);

    #[test]
    fn test_filled_and_pixel_access() {
        let s = Surface::filled(Size::new(4, 3), RED);
        assert_eq!(s.pixel(0, 0), Some(RED));
        assert_eq!(s.pixel(3, 2), Some(RED));
        assert_eq!(s.pixel(4, 0), None);
        assert_eq!(s.pixel(0, 3), None);
    }

    #[test]
    fn test_blit_copies_and_clips() {
        let mut dst = Surface::new(Size::new(4, 4));
        let src = Surface::filled(Size::new(2, 2), BLUE);

        dst.blit(&src, Point::new(3, 3));
        assert_eq!(dst.pixel(3, 3), Some(BLUE));
        assert_eq!(dst.pixel(2, 2), Some(Rgb888::BLACK));
    }

    #[test]
    fn test_blit_negative_offset_clips_top_left() {
        let mut dst = Surface::new(Size::new(4, 4));
        let src = Surface::filled(Size::new(3, 3), RED);

        dst.blit(&src, Point::new(-2, -2));
        assert_eq!(dst.pixel(0, 0), Some(RED));
        assert_eq!(dst.pixel(1, 1), Some(Rgb888::BLACK));
    }

    #[test]
    fn test_blit_fully_outside_is_noop() {
        let mut dst = Surface::filled(Size::new(2, 2), RED);
        let src = Surface::filled(Size::new(2, 2), BLUE);
        dst.blit(&src, Point::new(5, 5));
        dst.blit(&src, Point::new(-5, -5));
        assert_eq!(dst.pixel(0, 0), Some(RED));
        assert_eq!(dst.pixel(1, 1), Some(RED));
    }

    #[test]
    fn test_copy_region_round_trip() {
        let mut frame = Surface::new(Size::new(6, 6));
        frame.set_pixel(2, 2, RED);
        frame.set_pixel(3, 3, BLUE);

        let region = Rectangle::new(Point::new(2, 2), Size::new(2, 2));
        let snap = frame.copy_region(&region);
        assert_eq!(snap.pixel(0, 0), Some(RED));
        assert_eq!(snap.pixel(1, 1), Some(BLUE));

        // Restoring the snapshot puts the same pixels back
        let mut other = Surface::new(Size::new(6, 6));
        other.blit(&snap, Point::new(2, 2));
        assert_eq!(other.pixel(2, 2), Some(RED));
        assert_eq!(other.pixel(3, 3), Some(BLUE));
    }

    #[test]
    fn test_draw_target_clips_negative_points() {
        use embedded_graphics::Pixel;
        let mut s = Surface::new(Size::new(2, 2));
        s.draw_iter([
            Pixel(Point::new(-1, 0), RED),
            Pixel(Point::new(1, 1), RED),
            Pixel(Point::new(2, 2), RED),
        ])
        .unwrap();
        assert_eq!(s.pixel(1, 1), Some(RED));
        assert_eq!(s.pixel(0, 0), Some(Rgb888::BLACK));
    }
}
