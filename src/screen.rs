// Screen - the shared frame, the display backend, and the widget roster
//
// Widgets are registered once per configuration load and discarded
// wholesale on hot reload. Region ownership is exclusive: duplicate names
// and overlapping regions are rejected at registration, so draw order can
// never change what ends up on screen.

use crate::error::{ConfigError, RenderError};
use crate::render::{DisplayBackend, InputEvent, Surface};
use crate::widget::image::fit_scale;
use crate::widget::Widget;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use std::path::Path;

pub struct Screen {
    frame: Surface,
    /// Full-frame background, restored when the widget roster is rebuilt.
    background: Surface,
    backend: Box<dyn DisplayBackend>,
    widgets: Vec<Widget>,
}

impl Screen {
    pub fn new(size: Size, backend: Box<dyn DisplayBackend>, background_color: Rgb888) -> Self {
        let background = Surface::filled(size, background_color);
        Self {
            frame: background.clone(),
            background,
            backend,
            widgets: Vec::new(),
        }
    }

    /// Decode an image and center it over the background color, scaled to
    /// fit the frame. Must run before widgets are added so their snapshots
    /// capture the final background.
    pub fn set_background_image(&mut self, bytes: &[u8]) -> Result<(), RenderError> {
        let decoded = image::load_from_memory(bytes)?;
        let scaled = fit_scale(&decoded, self.frame.bounds().size);
        let x = (self.background.width() as i32 - scaled.width() as i32) / 2;
        let y = (self.background.height() as i32 - scaled.height() as i32) / 2;
        self.background.blit(&scaled, Point::new(x, y));
        self.frame = self.background.clone();
        Ok(())
    }

    pub fn set_background_image_file(&mut self, path: &Path) -> Result<(), RenderError> {
        let bytes = std::fs::read(path).map_err(RenderError::Backend)?;
        self.set_background_image(&bytes)
    }

    /// The frame widgets snapshot their background from at construction.
    pub fn frame(&self) -> &Surface {
        &self.frame
    }

    pub fn widget_count(&self) -> usize {
        self.widgets.len()
    }

    /// Register a widget. Name and region are claimed exclusively.
    pub fn add(&mut self, widget: Widget) -> Result<(), ConfigError> {
        for existing in &self.widgets {
            if existing.name() == widget.name() {
                return Err(ConfigError::DuplicateName(widget.name().to_string()));
            }
            let overlap = existing.region().intersection(&widget.region());
            if !overlap.is_zero_sized() {
                return Err(ConfigError::OverlappingRegions {
                    a: existing.name().to_string(),
                    b: widget.name().to_string(),
                });
            }
        }
        tracing::debug!(
            "registered widget '{}' at {:?}+{:?}",
            widget.name(),
            widget.region().top_left,
            widget.region().size
        );
        self.widgets.push(widget);
        Ok(())
    }

    /// Drop every widget and restore the bare background, for wholesale
    /// rebuild on configuration hot reload.
    pub fn clear_widgets(&mut self) {
        self.widgets.clear();
        self.frame = self.background.clone();
        self.present_full();
    }

    /// Present the whole frame once, for startup and background changes.
    pub fn present_full(&mut self) {
        let bounds = self.frame.bounds();
        if let Err(e) = self.backend.present(&self.frame, &bounds) {
            tracing::error!("full-frame present failed: {}", e);
        }
    }

    pub fn poll_event(&mut self) -> Option<InputEvent> {
        self.backend.poll_event()
    }

    /// Route a click to the first widget whose region contains the point,
    /// registration order. Exactly one widget is notified.
    pub fn dispatch_click(&mut self, point: Point) -> bool {
        for widget in &mut self.widgets {
            if widget.verify_click(point) {
                return true;
            }
        }
        false
    }

    /// Refresh every widget in registration order. Returns how many
    /// actually redrew; clean widgets cost one change check each.
    pub fn refresh_all(&mut self, force: bool) -> usize {
        let mut redrawn = 0;
        for widget in &mut self.widgets {
            if widget.refresh(&mut self.frame, self.backend.as_mut(), force) {
                redrawn += 1;
            }
        }
        redrawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticSource;
    use crate::widget::label::LabelPainter;
    use crate::widget::tests::RecordingBackend;
    use crate::widget::{FontSize, DEFAULT_BORDER_COLOR};
    use embedded_graphics::primitives::Rectangle;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn label_widget(frame: &Surface, name: &str, region: Rectangle) -> Widget {
        let source = StaticSource::new(name, Some(name.to_string())).unwrap();
        Widget::new(
            frame,
            name,
            region,
            None,
            false,
            DEFAULT_BORDER_COLOR,
            Box::new(LabelPainter::new(source, FontSize::Small, Rgb888::WHITE)),
        )
        .unwrap()
    }

    fn screen_64() -> (Screen, Rc<RefCell<Vec<Rectangle>>>) {
        let (backend, presented) = RecordingBackend::new();
        (
            Screen::new(Size::new(64, 64), Box::new(backend), Rgb888::BLACK),
            presented,
        )
    }

    fn rect(x: i32, y: i32, w: u32, h: u32) -> Rectangle {
        Rectangle::new(Point::new(x, y), Size::new(w, h))
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let (mut screen, _) = screen_64();
        let a = label_widget(screen.frame(), "a", rect(0, 0, 10, 10));
        screen.add(a).unwrap();
        let dup = label_widget(screen.frame(), "a", rect(20, 20, 10, 10));
        assert!(matches!(
            screen.add(dup),
            Err(ConfigError::DuplicateName(..))
        ));
    }

    #[test]
    fn test_overlapping_region_rejected() {
        let (mut screen, _) = screen_64();
        let a = label_widget(screen.frame(), "a", rect(0, 0, 10, 10));
        screen.add(a).unwrap();
        let b = label_widget(screen.frame(), "b", rect(5, 5, 10, 10));
        assert!(matches!(
            screen.add(b),
            Err(ConfigError::OverlappingRegions { .. })
        ));
        // Touching edges do not overlap
        let c = label_widget(screen.frame(), "c", rect(10, 0, 10, 10));
        screen.add(c).unwrap();
    }

    #[test]
    fn test_refresh_all_counts_only_redrawn() {
        let (mut screen, presented) = screen_64();
        let a = label_widget(screen.frame(), "a", rect(0, 0, 20, 10));
        let b = label_widget(screen.frame(), "b", rect(0, 20, 20, 10));
        screen.add(a).unwrap();
        screen.add(b).unwrap();

        assert_eq!(screen.refresh_all(false), 2); // first frame: all dirty
        assert_eq!(screen.refresh_all(false), 0); // static content settles
        assert_eq!(screen.refresh_all(true), 2);
        assert_eq!(presented.borrow().len(), 4);
    }

    #[test]
    fn test_click_routed_to_first_containing_region() {
        let (mut screen, _) = screen_64();
        let a = label_widget(screen.frame(), "a", rect(0, 0, 10, 10));
        let b = label_widget(screen.frame(), "b", rect(20, 20, 10, 10));
        screen.add(a).unwrap();
        screen.add(b).unwrap();
        screen.refresh_all(false);

        assert!(screen.dispatch_click(Point::new(25, 25)));
        // Only b went dirty
        assert_eq!(screen.refresh_all(false), 1);

        assert!(!screen.dispatch_click(Point::new(50, 50)));
        assert_eq!(screen.refresh_all(false), 0);
    }

    #[test]
    fn test_clear_widgets_restores_background() {
        let (mut screen, presented) = screen_64();
        let a = label_widget(screen.frame(), "a", rect(0, 0, 20, 10));
        screen.add(a).unwrap();
        screen.refresh_all(false);

        screen.clear_widgets();
        assert_eq!(screen.widget_count(), 0);
        // clear_widgets presents the restored full frame
        let last = *presented.borrow().last().unwrap();
        assert_eq!(last, rect(0, 0, 64, 64));
        let all_black = (0..64)
            .flat_map(|y| (0..64).map(move |x| (x, y)))
            .all(|(x, y)| screen.frame().pixel(x, y) == Some(Rgb888::BLACK));
        assert!(all_black);
    }

    #[test]
    fn test_background_image_centered_and_scaled() {
        let (mut screen, _) = screen_64();
        let img = image::RgbImage::from_pixel(32, 16, image::Rgb([0, 200, 0]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();

        screen.set_background_image(&bytes.into_inner()).unwrap();
        // 32x16 scaled to fit 64x64 becomes 64x32, vertically centered
        assert_eq!(screen.frame().pixel(0, 32), Some(Rgb888::new(0, 200, 0)));
        assert_eq!(screen.frame().pixel(0, 0), Some(Rgb888::BLACK));
    }
}
