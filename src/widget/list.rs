// Bulleted list painter: header, separator rule, markered items

use super::{draw_text, text_width, FontSize, Painter};
use crate::error::{ConfigError, RenderError};
use crate::render::Surface;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, Primitive, PrimitiveStyle};

const LINE_GAP: i32 = 2;
pub const DEFAULT_MARKER: &str = "- ";

pub struct ListPainter {
    header: Option<String>,
    items: Vec<String>,
    marker: String,
    font_size: FontSize,
    color: Rgb888,
}

impl ListPainter {
    pub fn new(
        name: &str,
        header: Option<String>,
        items: Vec<String>,
        marker: Option<String>,
        font_size: FontSize,
        color: Rgb888,
    ) -> Result<Self, ConfigError> {
        if items.is_empty() {
            return Err(ConfigError::MissingField {
                widget: name.to_string(),
                field: "items".to_string(),
            });
        }
        Ok(Self {
            header,
            items,
            marker: marker.unwrap_or_else(|| DEFAULT_MARKER.to_string()),
            font_size,
            color,
        })
    }
}

impl Painter for ListPainter {
    fn paint(&mut self, canvas: &mut Surface) -> Result<(), RenderError> {
        let font = self.font_size.font();
        let line_height = font.character_size.height as i32 + LINE_GAP;
        let mut y = 0;

        if let Some(header) = &self.header {
            draw_text(canvas, header, font, self.color, Point::new(0, y));
            y += line_height;
            // Separator rule under the header
            let rule_width = text_width(header, font).max(canvas.width() / 2) as i32;
            let _ = Line::new(Point::new(0, y - LINE_GAP + 1), Point::new(rule_width - 1, y - LINE_GAP + 1))
                .into_styled(PrimitiveStyle::with_stroke(self.color, 1))
                .draw(canvas);
        }

        for item in &self.items {
            if y >= canvas.height() as i32 {
                break;
            }
            let line = format!("{}{}", self.marker, item);
            draw_text(canvas, &line, font, self.color, Point::new(0, y));
            y += line_height;
        }
        Ok(())
    }
}
