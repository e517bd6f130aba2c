// Line chart painter over a bounded sample history
//
// The feed is drained once per frame during change detection, so the
// polyline scrolls left as new samples push old ones out of the window.

use super::Painter;
use crate::data::SampleFeed;
use crate::error::RenderError;
use crate::render::Surface;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, Primitive, PrimitiveStyle};

const MARGIN: i32 = 2;

pub struct ChartPainter {
    feed: SampleFeed,
    line_color: Rgb888,
    axis_color: Rgb888,
}

impl ChartPainter {
    pub fn new(feed: SampleFeed, line_color: Rgb888, axis_color: Rgb888) -> Self {
        Self {
            feed,
            line_color,
            axis_color,
        }
    }

    /// Map a sample to a y pixel. The value range is the history's own
    /// min..max, padded so a flat line sits mid-chart instead of on an edge.
    fn scale_y(value: f64, min: f64, max: f64, height: i32) -> i32 {
        let span = (max - min).max(f64::EPSILON);
        let norm = (value - min) / span;
        let usable = (height - 2 * MARGIN - 1).max(1) as f64;
        MARGIN + ((1.0 - norm) * usable).round() as i32
    }
}

impl Painter for ChartPainter {
    fn changed(&mut self) -> bool {
        self.feed.drain()
    }

    fn paint(&mut self, canvas: &mut Surface) -> Result<(), RenderError> {
        let w = canvas.width() as i32;
        let h = canvas.height() as i32;
        let axis = PrimitiveStyle::with_stroke(self.axis_color, 1);

        // Left and bottom axes
        let _ = Line::new(Point::new(0, 0), Point::new(0, h - 1))
            .into_styled(axis)
            .draw(canvas);
        let _ = Line::new(Point::new(0, h - 1), Point::new(w - 1, h - 1))
            .into_styled(axis)
            .draw(canvas);

        let samples: Vec<f64> = self.feed.samples().collect();
        if samples.len() < 2 {
            return Ok(());
        }

        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let (min, max) = if min == max {
            (min - 1.0, max + 1.0)
        } else {
            (min, max)
        };

        let step = ((w - 1 - MARGIN) as f64 / (samples.len() - 1) as f64).max(1.0);
        let style = PrimitiveStyle::with_stroke(self.line_color, 1);
        let mut prev: Option<Point> = None;
        for (i, &sample) in samples.iter().enumerate() {
            let x = MARGIN + (i as f64 * step).round() as i32;
            let point = Point::new(x.min(w - 1), Self::scale_y(sample, min, max, h));
            if let Some(prev) = prev {
                let _ = Line::new(prev, point).into_styled(style).draw(canvas);
            }
            prev = Some(point);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::tests::RED;

    const GREY: Rgb888 = Rgb888::new(80, 80, 80);

    fn chart_with(samples: &[f64]) -> ChartPainter {
        let (feed, tx) = SampleFeed::new(32);
        for &s in samples {
            tx.send(s).unwrap();
        }
        let mut painter = ChartPainter::new(feed, RED, GREY);
        painter.changed();
        painter
    }

    #[test]
    fn test_changed_tracks_feed() {
        let (feed, tx) = SampleFeed::new(8);
        let mut painter = ChartPainter::new(feed, RED, GREY);
        assert!(!painter.changed());
        tx.send(0.5).unwrap();
        assert!(painter.changed());
        assert!(!painter.changed());
    }

    #[test]
    fn test_axes_drawn_even_without_samples() {
        let mut painter = chart_with(&[]);
        let mut canvas = Surface::new(Size::new(20, 10));
        painter.paint(&mut canvas).unwrap();
        assert_eq!(canvas.pixel(0, 0), Some(GREY));
        assert_eq!(canvas.pixel(0, 9), Some(GREY));
        assert_eq!(canvas.pixel(19, 9), Some(GREY));
    }

    #[test]
    fn test_polyline_spans_the_width() {
        let mut painter = chart_with(&[0.0, 1.0, 0.5, 2.0]);
        let mut canvas = Surface::new(Size::new(24, 16));
        painter.paint(&mut canvas).unwrap();

        let red_columns: Vec<u32> = (0..24)
            .filter(|&x| (0..16).any(|y| canvas.pixel(x, y) == Some(RED)))
            .collect();
        assert!(red_columns.first().copied().unwrap_or(99) <= MARGIN as u32);
        assert!(red_columns.last().copied().unwrap_or(0) >= 20);
    }

    #[test]
    fn test_flat_history_stays_inside_canvas() {
        let mut painter = chart_with(&[1.0, 1.0, 1.0]);
        let mut canvas = Surface::new(Size::new(16, 8));
        // A zero value range must not divide by zero or draw out of bounds
        painter.paint(&mut canvas).unwrap();
    }
}
