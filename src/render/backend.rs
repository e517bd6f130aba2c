// Display backends - where composited pixels leave the process
//
// The contract that matters is partial presentation: present() receives the
// full frame plus the region that changed, and an implementation may upload
// only that region. Per-frame cost is then proportional to the number of
// changed widgets, not the widget count.

use super::surface::Surface;
use crate::error::RenderError;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Input events a backend may deliver to the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Pointer/touch press at screen coordinates.
    Click(Point),
    Quit,
}

pub trait DisplayBackend {
    /// Push the given region of the frame to the display. Never a
    /// full-screen flip unless `region` covers the frame.
    fn present(&mut self, frame: &Surface, region: &Rectangle) -> Result<(), RenderError>;

    /// Poll for one pending input event, non-blocking.
    fn poll_event(&mut self) -> Option<InputEvent> {
        None
    }
}

/// Writes to a Linux framebuffer device (or any seekable file) as packed
/// 32-bit XRGB rows. Only the rows intersecting the presented region are
/// rewritten.
pub struct FramebufferBackend {
    device: File,
    screen: Size,
}

impl FramebufferBackend {
    pub fn open(path: &Path, screen: Size) -> Result<Self, RenderError> {
        let device = OpenOptions::new().write(true).open(path)?;
        tracing::info!(
            "framebuffer backend on {} ({}x{})",
            path.display(),
            screen.width,
            screen.height
        );
        Ok(Self { device, screen })
    }

    fn clamp(&self, region: &Rectangle) -> Option<(u32, u32, u32, u32)> {
        let x0 = region.top_left.x.max(0) as u32;
        let y0 = region.top_left.y.max(0) as u32;
        let x1 = (region.top_left.x + region.size.width as i32).min(self.screen.width as i32);
        let y1 = (region.top_left.y + region.size.height as i32).min(self.screen.height as i32);
        if x0 as i32 >= x1 || y0 as i32 >= y1 {
            return None;
        }
        Some((x0, y0, x1 as u32, y1 as u32))
    }
}

impl DisplayBackend for FramebufferBackend {
    fn present(&mut self, frame: &Surface, region: &Rectangle) -> Result<(), RenderError> {
        let Some((x0, y0, x1, y1)) = self.clamp(region) else {
            return Ok(());
        };

        let mut row = Vec::with_capacity(((x1 - x0) * 4) as usize);
        for y in y0..y1 {
            row.clear();
            for x in x0..x1 {
                let px = frame.pixel(x, y).unwrap_or(Rgb888::BLACK);
                // Little-endian XRGB8888
                row.extend_from_slice(&[px.b(), px.g(), px.r(), 0]);
            }
            let offset = ((y * self.screen.width + x0) * 4) as u64;
            self.device.seek(SeekFrom::Start(offset))?;
            self.device.write_all(&row)?;
        }
        self.device.flush()?;
        Ok(())
    }
}

/// Headless backend: dumps every presented frame to a PNG file. Useful for
/// skin development and debugging without display hardware.
pub struct PngBackend {
    output: PathBuf,
    presents: u64,
}

impl PngBackend {
    pub fn new(output: PathBuf) -> Self {
        tracing::info!("png backend writing frames to {}", output.display());
        Self {
            output,
            presents: 0,
        }
    }
}

impl DisplayBackend for PngBackend {
    fn present(&mut self, frame: &Surface, region: &Rectangle) -> Result<(), RenderError> {
        self.presents += 1;
        tracing::trace!(
            "present #{} region {:?}+{:?}",
            self.presents,
            region.top_left,
            region.size
        );

        let mut img = image::RgbImage::new(frame.width().max(1), frame.height().max(1));
        for (y, row) in frame.rows().enumerate() {
            for (x, px) in row.iter().enumerate() {
                img.put_pixel(x as u32, y as u32, image::Rgb([px.r(), px.g(), px.b()]));
            }
        }
        img.save(&self.output)?;
        Ok(())
    }
}
