// Homeboard - a widget dashboard for kiosk displays
//
// Architecture:
// - Render: an owned RGB frame surface, composited incrementally by widgets
//   that each own one screen region; backends present only dirty regions
// - Widgets: flat state machines (dirty/clean) over a boxed Painter
// - Caches: TTL'd on-disk entries keep slow fetches (RSS, remote images)
//   off the render thread; background workers refresh them on expiry
// - Main loop: single-threaded and cooperative - drain input, hot-reload
//   the skin when debugging, refresh widgets, sleep out the frame budget

mod cache;
mod cli;
mod config;
mod data;
mod error;
mod net;
mod render;
mod screen;
mod source;
mod startup;
mod widget;
mod worker;

use anyhow::{Context, Result};
use clap::Parser;
use config::{AppConfig, SkinConfig, SkinWatcher};
use render::{FrameLimiter, InputEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install SIGINT/SIGTERM handlers that flip a shared flag, so the loop
/// can stop its workers before exiting.
#[cfg(unix)]
fn shutdown_flag() -> Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, flag.clone())?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, flag.clone())?;
    Ok(flag)
}

#[cfg(not(unix))]
fn shutdown_flag() -> Result<Arc<AtomicBool>> {
    Ok(Arc::new(AtomicBool::new(false)))
}

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    if cli::handle_cli(&args) {
        return Ok(());
    }

    let app = AppConfig::load(args.config.as_deref())?;

    // Logging precedence: RUST_LOG env var > config file > default "info"
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("homeboard={}", app.logging.level).into());

    // The guard must be kept alive for the duration of the program so
    // buffered file logs flush on exit
    let _file_guard: Option<tracing_appender::non_blocking::WorkerGuard> =
        if let Some(dir) = &app.logging.dir {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "homeboard.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking)
                        .with_ansi(false),
                )
                .init();
            Some(guard)
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
            None
        };

    let skin = SkinConfig::load(&args.skin)?;
    startup::log_startup(&app, &skin);

    let mut screen = startup::build_screen(&app, &skin)?;
    let mut workers = startup::populate_widgets(&mut screen, &app, &skin)?;

    let mut watcher = SkinWatcher::new(&args.skin);
    let mut limiter = FrameLimiter::new(app.fps);
    let shutdown = shutdown_flag()?;

    'frames: while !shutdown.load(Ordering::Relaxed) {
        while let Some(event) = screen.poll_event() {
            match event {
                InputEvent::Click(point) => {
                    screen.dispatch_click(point);
                }
                InputEvent::Quit => break 'frames,
            }
        }

        // Skin hot reload: rebuild the widget roster wholesale. A broken
        // skin edit logs and leaves the bare background up until the file
        // parses again.
        if app.debug_widgets && watcher.changed() {
            tracing::info!("skin changed, rebuilding widgets");
            workers.stop_all();
            screen.clear_widgets();
            match SkinConfig::load(watcher.path()) {
                Ok(skin) => match startup::populate_widgets(&mut screen, &app, &skin) {
                    Ok(rebuilt) => workers = rebuilt,
                    Err(e) => tracing::error!("widget rebuild failed: {e:#}"),
                },
                Err(e) => tracing::error!("skin reload failed: {e}"),
            }
        }

        screen.refresh_all(false);
        limiter.tick();
    }

    tracing::info!("shutting down, stopping {} workers", workers.len());
    workers.stop_all();
    tracing::info!("shutdown complete");
    Ok(())
}
