// Clock/date painter
//
// One painter serves both time and date widgets; only the chrono format
// mask differs. Dirty exactly when the formatted string changes, so a
// "%H:%M" clock redraws once a minute and a "%A %d %B" date once a day.

use super::{draw_text, FontSize, Painter};
use crate::error::RenderError;
use crate::render::Surface;
use chrono::Local;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;

pub struct ClockPainter {
    format: String,
    font_size: FontSize,
    color: Rgb888,
    last_text: String,
}

impl ClockPainter {
    pub fn new(format: &str, font_size: FontSize, color: Rgb888) -> Self {
        Self {
            format: format.to_string(),
            font_size,
            color,
            last_text: String::new(),
        }
    }

    fn now_text(&self) -> String {
        Local::now().format(&self.format).to_string()
    }
}

impl Painter for ClockPainter {
    fn changed(&mut self) -> bool {
        self.now_text() != self.last_text
    }

    fn paint(&mut self, canvas: &mut Surface) -> Result<(), RenderError> {
        self.last_text = self.now_text();
        draw_text(
            canvas,
            &self.last_text,
            self.font_size.font(),
            self.color,
            Point::zero(),
        );
        Ok(())
    }
}
