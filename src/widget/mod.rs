// Widget module - the compositor unit
//
// A Widget owns a screen region for its whole lifetime. It keeps the pixels
// that were under that region at construction time (the background
// snapshot), a private canvas the same size as the region, and a dirty
// flag. Content comes from a Painter - a strategy object, not a subclass -
// so concrete widgets are flat state machines instead of inheritance
// chains.
//
// Redraw protocol per frame: restore the snapshot over the region (erasing
// the previous frame), blit the freshly painted canvas, present only that
// region to the display.

pub mod calendar;
pub mod chart;
pub mod clock;
pub mod image;
pub mod label;
pub mod list;
pub mod ticker;

use crate::error::{ConfigError, RenderError};
use crate::render::{DisplayBackend, Surface};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use serde::Deserialize;

/// Debug border color (hot pink, hard to mistake for content).
pub const DEFAULT_BORDER_COLOR: Rgb888 = Rgb888::new(255, 105, 180);

/// Mono font presets for widget text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FontSize {
    pub fn font(&self) -> &'static MonoFont<'static> {
        match self {
            FontSize::Small => &embedded_graphics::mono_font::ascii::FONT_5X8,
            FontSize::Medium => &embedded_graphics::mono_font::ascii::FONT_6X10,
            FontSize::Large => &embedded_graphics::mono_font::ascii::FONT_10X20,
        }
    }
}

/// Advance width of `text` in the given mono font.
pub(crate) fn text_width(text: &str, font: &MonoFont<'_>) -> u32 {
    text.chars().count() as u32 * (font.character_size.width + font.character_spacing)
}

/// Draw a single line of text with its top-left corner at `pos`.
pub(crate) fn draw_text(canvas: &mut Surface, text: &str, font: &'static MonoFont<'static>, color: Rgb888, pos: Point) {
    let style = MonoTextStyle::new(font, color);
    // Surface drawing is infallible
    let _ = Text::with_baseline(text, pos, style, Baseline::Top).draw(canvas);
}

/// Content strategy plugged into a Widget.
pub trait Painter {
    /// Poll for content changes. Called once per frame on a clean widget;
    /// must be cheap. Animated painters return true every frame.
    fn changed(&mut self) -> bool {
        false
    }

    /// Paint the current content into the canvas, widget-local coordinates
    /// starting at (0,0).
    fn paint(&mut self, canvas: &mut Surface) -> Result<(), RenderError>;

    /// Click received inside the widget's region. The widget itself already
    /// schedules a forced redraw; painters override this to reset animation
    /// state and the like.
    fn on_click(&mut self) {}
}

pub struct Widget {
    name: String,
    region: Rectangle,
    background_color: Option<Rgb888>,
    border: bool,
    border_color: Rgb888,
    /// Pixels that were under the region at construction; restored before
    /// every redraw to erase the previous frame.
    background_snapshot: Surface,
    /// Private off-screen canvas, same size as the region.
    canvas: Surface,
    /// Dirty flag. Starts true so the first frame always renders.
    render_required: bool,
    painter: Box<dyn Painter>,
}

impl Widget {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        parent: &Surface,
        name: &str,
        region: Rectangle,
        background_color: Option<Rgb888>,
        border: bool,
        border_color: Rgb888,
        painter: Box<dyn Painter>,
    ) -> Result<Self, ConfigError> {
        if name.is_empty() {
            return Err(ConfigError::MissingField {
                widget: "<unnamed>".to_string(),
                field: "name".to_string(),
            });
        }
        if region.size.width == 0 || region.size.height == 0 {
            return Err(ConfigError::InvalidRegion {
                widget: name.to_string(),
                reason: "zero width or height".to_string(),
            });
        }
        let in_bounds = region.top_left.x >= 0
            && region.top_left.y >= 0
            && region.top_left.x + region.size.width as i32 <= parent.width() as i32
            && region.top_left.y + region.size.height as i32 <= parent.height() as i32;
        if !in_bounds {
            return Err(ConfigError::InvalidRegion {
                widget: name.to_string(),
                reason: format!(
                    "{:?}+{:?} outside {}x{} frame",
                    region.top_left,
                    region.size,
                    parent.width(),
                    parent.height()
                ),
            });
        }

        Ok(Self {
            name: name.to_string(),
            region,
            background_color,
            border,
            border_color,
            background_snapshot: parent.copy_region(&region),
            canvas: Surface::new(region.size),
            render_required: true,
            painter,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn region(&self) -> Rectangle {
        self.region
    }

    /// Force a redraw on the next refresh.
    pub fn mark_dirty(&mut self) {
        self.render_required = true;
    }

    /// Redraw if needed. Returns true when the widget drew and presented.
    ///
    /// A painter failure is contained here: it is logged, the widget keeps
    /// its last good frame on screen, and the loop carries on.
    pub fn refresh(
        &mut self,
        frame: &mut Surface,
        display: &mut dyn DisplayBackend,
        force: bool,
    ) -> bool {
        if !force && !self.render_required && !self.painter.changed() {
            return false;
        }

        // Clear the canvas: configured background, or the snapshot itself
        // so "no background" means transparent/inherit.
        match self.background_color {
            Some(color) => self.canvas.fill(color),
            None => self.canvas.blit(&self.background_snapshot, Point::zero()),
        }

        if let Err(e) = self.painter.paint(&mut self.canvas) {
            tracing::warn!("widget '{}' failed to paint: {}", self.name, e);
            self.render_required = false;
            return false;
        }

        self.render(frame, display);
        self.render_required = false;
        true
    }

    /// Composite the canvas onto the shared frame and present the region.
    fn render(&mut self, frame: &mut Surface, display: &mut dyn DisplayBackend) {
        // Erase the previous frame before drawing the next
        frame.blit(&self.background_snapshot, self.region.top_left);

        if self.border {
            let _ = self
                .canvas
                .bounds()
                .into_styled(PrimitiveStyle::with_stroke(self.border_color, 1))
                .draw(&mut self.canvas);
        }

        frame.blit(&self.canvas, self.region.top_left);

        if let Err(e) = display.present(frame, &self.region) {
            tracing::error!("widget '{}' present failed: {}", self.name, e);
        }
    }

    /// Region hit test for a click. On a hit the painter is notified and the
    /// widget is marked dirty (default click behavior: assume something
    /// changed, redraw). Returns whether the click was consumed.
    pub fn verify_click(&mut self, point: Point) -> bool {
        if !self.region.contains(point) {
            return false;
        }
        tracing::debug!("widget '{}' clicked, forcing refresh", self.name);
        self.painter.on_click();
        self.render_required = true;
        true
    }
}
