// Horizontally scrolling text painter
//
// Text enters from the right edge and scrolls left by a fixed step per
// frame, wrapping once it has fully left the region. The text comes from a
// change source; a source update swaps in the new text and restarts the
// scroll from the right edge.

use super::{draw_text, text_width, FontSize, Painter};
use crate::error::RenderError;
use crate::render::Surface;
use crate::source::ChangeSource;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;

pub const DEFAULT_STEP: i32 = 2;

pub struct TickerPainter {
    source: Box<dyn ChangeSource>,
    font_size: FontSize,
    color: Rgb888,
    /// Pixels scrolled past the right edge so far.
    offset: i32,
    step: i32,
}

impl TickerPainter {
    pub fn new(source: Box<dyn ChangeSource>, font_size: FontSize, color: Rgb888, step: i32) -> Self {
        Self {
            source,
            font_size,
            color,
            offset: 0,
            step: step.max(1),
        }
    }
}

impl Painter for TickerPainter {
    /// Animates every frame; a source update additionally restarts the
    /// scroll with the fresh text.
    fn changed(&mut self) -> bool {
        if self.source.changed() {
            self.source.reload();
            self.offset = 0;
        }
        true
    }

    fn paint(&mut self, canvas: &mut Surface) -> Result<(), RenderError> {
        let font = self.font_size.font();
        let text = self.source.value();
        let width = text_width(text, font) as i32;

        let x = canvas.width() as i32 - self.offset;
        let y = (canvas.height() as i32 - font.character_size.height as i32) / 2;
        draw_text(canvas, text, font, self.color, Point::new(x, y.max(0)));

        self.offset += self.step;
        if x + width < 0 {
            self.offset = 0;
        }
        Ok(())
    }

    fn on_click(&mut self) {
        self.offset = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticSource;
    use crate::widget::tests::RED;

    fn ticker(text: &str) -> TickerPainter {
        let source = StaticSource::new("ticker", Some(text.to_string())).unwrap();
        TickerPainter::new(Box::new(source), FontSize::Small, RED, 3)
    }

    #[test]
    fn test_always_reports_changed() {
        let mut painter = ticker("news");
        assert!(painter.changed());
        assert!(painter.changed());
    }

    #[test]
    fn test_scroll_advances_and_wraps() {
        let mut painter = ticker("x");
        let mut canvas = Surface::new(Size::new(10, 10));

        painter.paint(&mut canvas).unwrap();
        assert_eq!(painter.offset, 3);

        // Scroll until the glyph has fully left the region; the offset
        // wraps instead of growing without bound
        for _ in 0..20 {
            painter.paint(&mut canvas).unwrap();
        }
        assert!(painter.offset < 3 * 21);
    }

    #[test]
    fn test_click_resets_offset() {
        let mut painter = ticker("news");
        let mut canvas = Surface::new(Size::new(30, 10));
        painter.paint(&mut canvas).unwrap();
        painter.paint(&mut canvas).unwrap();
        assert!(painter.offset > 0);

        painter.on_click();
        assert_eq!(painter.offset, 0);
    }

    #[test]
    fn test_text_enters_from_right_edge() {
        let mut painter = ticker("abc");
        let mut canvas = Surface::new(Size::new(20, 10));
        painter.paint(&mut canvas).unwrap();

        // First frame: text sits just past the right edge, nothing visible
        let any = (0..10)
            .flat_map(|y| (0..20).map(move |x| (x, y)))
            .any(|(x, y)| canvas.pixel(x, y) == Some(RED));
        assert!(!any);

        // A few frames later the leading glyph is inside the region
        for _ in 0..4 {
            painter.paint(&mut canvas).unwrap();
        }
        let any = (0..10)
            .flat_map(|y| (0..20).map(move |x| (x, y)))
            .any(|(x, y)| canvas.pixel(x, y) == Some(RED));
        assert!(any);
    }
}
