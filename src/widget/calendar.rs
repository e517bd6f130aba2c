// Month calendar painter
//
// Current-month grid: "August 2026" header, weekday row, day numbers laid
// out Monday-first with today drawn in the highlight color. Dirty exactly
// when the date changes, so it redraws once at midnight (which also covers
// the month rollover).

use super::{draw_text, text_width, FontSize, Painter};
use crate::error::RenderError;
use crate::render::Surface;
use chrono::{Datelike, Local, NaiveDate};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;

const LINE_GAP: i32 = 2;
const WEEKDAY_ROW: &str = "Mo Tu We Th Fr Sa Su";

pub struct CalendarPainter {
    font_size: FontSize,
    color: Rgb888,
    highlight: Rgb888,
    last_day: String,
}

impl CalendarPainter {
    pub fn new(font_size: FontSize, color: Rgb888, highlight: Rgb888) -> Self {
        Self {
            font_size,
            color,
            highlight,
            last_day: String::new(),
        }
    }

    fn today_stamp() -> String {
        Local::now().format("%Y-%m-%d").to_string()
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    (28..=31)
        .rev()
        .find(|&day| NaiveDate::from_ymd_opt(year, month, day).is_some())
        .unwrap_or(28)
}

impl Painter for CalendarPainter {
    fn changed(&mut self) -> bool {
        Self::today_stamp() != self.last_day
    }

    fn paint(&mut self, canvas: &mut Surface) -> Result<(), RenderError> {
        self.last_day = Self::today_stamp();
        let now = Local::now();
        let font = self.font_size.font();
        let line_height = font.character_size.height as i32 + LINE_GAP;
        // Three characters per column: two digits plus a space
        let cell = text_width("Mo ", font) as i32;

        let header = now.format("%B %Y").to_string();
        draw_text(canvas, &header, font, self.color, Point::zero());
        let mut y = line_height;
        draw_text(canvas, WEEKDAY_ROW, font, self.color, Point::new(0, y));
        y += line_height;

        let mut column = NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
            .map(|first| first.weekday().num_days_from_monday() as i32)
            .unwrap_or(0);
        let today = now.day();
        for day in 1..=days_in_month(now.year(), now.month()) {
            let color = if day == today { self.highlight } else { self.color };
            draw_text(
                canvas,
                &format!("{day:>2}"),
                font,
                color,
                Point::new(column * cell, y),
            );
            column += 1;
            if column == 7 {
                column = 0;
                y += line_height;
            }
        }
        Ok(())
    }
}
