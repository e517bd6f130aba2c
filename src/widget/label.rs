// Static one-shot text painter

use super::{draw_text, FontSize, Painter};
use crate::error::RenderError;
use crate::render::Surface;
use crate::source::{ChangeSource, StaticSource};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;

pub struct LabelPainter {
    source: StaticSource,
    font_size: FontSize,
    color: Rgb888,
}

impl LabelPainter {
    pub fn new(source: StaticSource, font_size: FontSize, color: Rgb888) -> Self {
        Self {
            source,
            font_size,
            color,
        }
    }
}

impl Painter for LabelPainter {
    fn paint(&mut self, canvas: &mut Surface) -> Result<(), RenderError> {
        draw_text(
            canvas,
            self.source.value(),
            self.font_size.font(),
            self.color,
            Point::zero(),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::tests::RED;
    use embedded_graphics::prelude::Size;

    #[test]
    fn test_label_paints_pixels() {
        let source = StaticSource::new("label", Some("Hi".to_string())).unwrap();
        let mut painter = LabelPainter::new(source, FontSize::Medium, RED);
        let mut canvas = Surface::new(Size::new(40, 16));
        painter.paint(&mut canvas).unwrap();

        let drawn = (0..16)
            .flat_map(|y| (0..40).map(move |x| (x, y)))
            .filter(|&(x, y)| canvas.pixel(x, y) == Some(RED))
            .count();
        assert!(drawn > 0);
    }

    #[test]
    fn test_label_never_reports_change() {
        let source = StaticSource::new("label", Some("Hi".to_string())).unwrap();
        let mut painter = LabelPainter::new(source, FontSize::Small, RED);
        assert!(!painter.changed());
        assert!(!painter.changed());
    }
}
