// Startup module - builds the display backend, the screen, and the widget
// roster out of configuration
//
// Widget construction is all-or-nothing: any invalid widget aborts the
// whole build (and with it startup or a hot reload) instead of leaving a
// partially-populated screen.

use crate::cache::remote_image::RemoteImageCache;
use crate::cache::rss::RssCache;
use crate::cache::spawn_refresh_worker;
use crate::config::{AppConfig, BackendConfig, Color, SkinConfig, WidgetConfig, WidgetKind, VERSION};
use crate::data::{spawn_load_sampler, SampleFeed};
use crate::error::ConfigError;
use crate::render::{DisplayBackend, FramebufferBackend, PngBackend, Surface};
use crate::screen::Screen;
use crate::source::{FeedSource, StaticSource};
use crate::widget::calendar::CalendarPainter;
use crate::widget::chart::ChartPainter;
use crate::widget::clock::ClockPainter;
use crate::widget::image::ImagePainter;
use crate::widget::label::LabelPainter;
use crate::widget::list::ListPainter;
use crate::widget::ticker::{self, TickerPainter};
use crate::widget::{Painter, Widget, DEFAULT_BORDER_COLOR};
use crate::worker::PeriodicWorker;
use anyhow::{bail, Context, Result};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TEXT_COLOR: Rgb888 = Rgb888::WHITE;
const DEFAULT_CLOCK_FORMAT: &str = "%H:%M";
const DEFAULT_DATE_FORMAT: &str = "%A %-d %B";
const DEFAULT_FEED_ITEMS: usize = 5;
const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(5);
const CHART_HISTORY: usize = 120;

/// Background workers owned by the current widget roster. Stopped and
/// rebuilt together with the widgets on hot reload, and at shutdown.
#[derive(Debug, Default)]
pub struct Workers {
    workers: Vec<PeriodicWorker>,
}

impl Workers {
    pub fn push(&mut self, worker: PeriodicWorker) {
        self.workers.push(worker);
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Signal and join every worker.
    pub fn stop_all(&mut self) {
        for worker in self.workers.drain(..) {
            worker.stop();
        }
    }
}

pub fn build_backend(config: &BackendConfig, screen: Size) -> Result<Box<dyn DisplayBackend>> {
    Ok(match config {
        BackendConfig::Framebuffer { device } => Box::new(
            FramebufferBackend::open(device, screen)
                .with_context(|| format!("opening framebuffer {}", device.display()))?,
        ),
        BackendConfig::Png { output } => Box::new(PngBackend::new(output.clone())),
    })
}

/// Build the screen with its background painted, ready for widgets.
pub fn build_screen(app: &AppConfig, skin: &SkinConfig) -> Result<Screen> {
    let backend = build_backend(&app.backend, skin.size())?;
    let background = skin.background.map(|Color(c)| c).unwrap_or(Rgb888::BLACK);
    let mut screen = Screen::new(skin.size(), backend, background);

    if let Some(path) = &skin.background_image {
        screen
            .set_background_image_file(path)
            .with_context(|| format!("loading background image {}", path.display()))?;
    } else if let Some(url) = &skin.background_url {
        let cache = RemoteImageCache::new(&app.cache_dir, url)
            .with_context(|| format!("fetching background image {url}"))?;
        screen
            .set_background_image_file(cache.path())
            .context("decoding cached background image")?;
    }

    Ok(screen)
}

/// Build every widget in the skin and register it. Returns the workers the
/// roster owns; the caller stops them before the next rebuild.
pub fn populate_widgets(screen: &mut Screen, app: &AppConfig, skin: &SkinConfig) -> Result<Workers> {
    let frame_size = screen.frame().bounds().size;
    if skin.size() != frame_size {
        bail!(ConfigError::SkinSizeMismatch {
            skin_width: skin.width,
            skin_height: skin.height,
            screen_width: frame_size.width,
            screen_height: frame_size.height,
        });
    }

    // Build every widget before registering any, and undo on failure, so
    // an invalid entry can never leave a partial roster on screen.
    let mut workers = Workers::default();
    let mut widgets = Vec::with_capacity(skin.widgets.len());
    for config in &skin.widgets {
        let built = build_widget(screen.frame(), config, app, skin.size(), app.debug_widgets, &mut workers)
            .with_context(|| format!("building widget '{}'", config.name));
        match built {
            Ok(widget) => widgets.push(widget),
            Err(e) => {
                workers.stop_all();
                return Err(e);
            }
        }
    }
    for widget in widgets {
        if let Err(e) = screen.add(widget) {
            workers.stop_all();
            screen.clear_widgets();
            return Err(e.into());
        }
    }

    tracing::info!(
        "screen ready: {} widgets, {} background workers",
        screen.widget_count(),
        workers.len()
    );
    screen.present_full();
    Ok(workers)
}

fn text_color(color: Option<Color>) -> Rgb888 {
    color.map(|Color(c)| c).unwrap_or(DEFAULT_TEXT_COLOR)
}

fn build_widget(
    frame: &Surface,
    config: &WidgetConfig,
    app: &AppConfig,
    screen: Size,
    border: bool,
    workers: &mut Workers,
) -> Result<Widget> {
    let region = config.placement.resolve(&config.name, screen)?;

    let painter: Box<dyn Painter> = match &config.kind {
        WidgetKind::Label {
            text,
            font_size,
            color,
        } => {
            let source = StaticSource::new(&config.name, text.clone())?;
            Box::new(LabelPainter::new(source, *font_size, text_color(*color)))
        }

        WidgetKind::Clock {
            format,
            font_size,
            color,
        } => Box::new(ClockPainter::new(
            format.as_deref().unwrap_or(DEFAULT_CLOCK_FORMAT),
            *font_size,
            text_color(*color),
        )),

        WidgetKind::Date {
            format,
            font_size,
            color,
        } => Box::new(ClockPainter::new(
            format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT),
            *font_size,
            text_color(*color),
        )),

        WidgetKind::Ticker {
            text,
            rss_url,
            item_count,
            step,
            font_size,
            color,
        } => {
            let source: Box<dyn crate::source::ChangeSource> = match (text, rss_url) {
                (None, Some(url)) => {
                    let cache = RssCache::new(&app.cache_dir, url)
                        .with_context(|| format!("priming feed {url}"))?;
                    let entry = cache.entry().clone();
                    if let Some(worker) =
                        spawn_refresh_worker(&format!("rss-{}", config.name), &entry, Arc::new(cache))
                    {
                        workers.push(worker);
                    }
                    Box::new(FeedSource::new(
                        entry,
                        item_count.unwrap_or(DEFAULT_FEED_ITEMS),
                    ))
                }
                (Some(text), None) => {
                    Box::new(StaticSource::new(&config.name, Some(text.clone()))?)
                }
                _ => {
                    bail!(ConfigError::MissingField {
                        widget: config.name.clone(),
                        field: "text or rss_url (exactly one)".to_string(),
                    });
                }
            };
            Box::new(TickerPainter::new(
                source,
                *font_size,
                text_color(*color),
                step.unwrap_or(ticker::DEFAULT_STEP),
            ))
        }

        WidgetKind::Image { path, url } => {
            let painter = match (path, url) {
                (Some(path), None) => ImagePainter::from_path(path, region.size)
                    .with_context(|| format!("loading image {}", path.display()))?,
                (None, Some(url)) => {
                    let cache = RemoteImageCache::new(&app.cache_dir, url)
                        .with_context(|| format!("fetching image {url}"))?;
                    ImagePainter::from_path(cache.path(), region.size)
                        .context("decoding cached image")?
                }
                _ => {
                    bail!(ConfigError::MissingField {
                        widget: config.name.clone(),
                        field: "path or url (exactly one)".to_string(),
                    });
                }
            };
            Box::new(painter)
        }

        WidgetKind::List {
            header,
            items,
            marker,
            font_size,
            color,
        } => Box::new(ListPainter::new(
            &config.name,
            header.clone(),
            items.clone(),
            marker.clone(),
            *font_size,
            text_color(*color),
        )?),

        WidgetKind::Chart {
            sample_interval_secs,
            color,
            axis_color,
        } => {
            let (feed, tx) = SampleFeed::new(CHART_HISTORY);
            let interval = sample_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_SAMPLE_INTERVAL);
            workers.push(spawn_load_sampler(interval, tx));
            Box::new(ChartPainter::new(
                feed,
                text_color(*color),
                axis_color
                    .map(|Color(c)| c)
                    .unwrap_or(Rgb888::new(90, 90, 90)),
            ))
        }

        WidgetKind::Calendar {
            font_size,
            color,
            highlight,
        } => Box::new(CalendarPainter::new(
            *font_size,
            text_color(*color),
            highlight
                .map(|Color(c)| c)
                .unwrap_or(Rgb888::new(255, 200, 0)),
        )),
    };

    Ok(Widget::new(
        frame,
        &config.name,
        region,
        config.background.map(|Color(c)| c),
        border,
        DEFAULT_BORDER_COLOR,
        painter,
    )?)
}

/// Startup log lines, once the configuration is loaded.
pub fn log_startup(app: &AppConfig, skin: &SkinConfig) {
    tracing::info!("homeboard v{}", VERSION);
    tracing::info!("screen {}x{}, {} fps", skin.width, skin.height, app.fps);
    tracing::info!("cache directory {}", app.cache_dir.display());
    match &app.backend {
        BackendConfig::Framebuffer { device } => {
            tracing::info!("backend: framebuffer ({})", device.display())
        }
        BackendConfig::Png { output } => tracing::info!("backend: png ({})", output.display()),
    }
    if app.debug_widgets {
        tracing::info!("debug widgets on: borders drawn, skin hot reload active");
    }
}
