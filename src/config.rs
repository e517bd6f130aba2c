// Configuration for the dashboard
//
// Two files with different lifecycles:
// - App config (~/.config/homeboard/config.toml): cache directory, frame
//   rate, display backend, logging. Loaded once at startup, in order of
//   precedence: environment variables > config file > built-in defaults.
// - Skin (TOML path given on the command line): screen size, background,
//   and the widget table. Reloadable at runtime; widgets are rebuilt
//   wholesale when it changes.

use crate::error::ConfigError;
use crate::widget::FontSize;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_FPS: u32 = 25;

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Directory for rotating log files; stderr-only when unset
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
        }
    }
}

/// Display backend selection
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// Linux framebuffer device, 32-bit XRGB
    Framebuffer { device: PathBuf },

    /// Headless: dump composited frames to a PNG file
    Png { output: PathBuf },
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Png {
            output: PathBuf::from("./homeboard.png"),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base directory for the on-disk cache
    pub cache_dir: PathBuf,

    /// Render loop frame budget
    pub fps: u32,

    /// Draw widget borders and poll the skin file for hot reload
    pub debug_widgets: bool,

    /// Display backend
    pub backend: BackendConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
struct FileLogging {
    level: Option<String>,
    dir: Option<PathBuf>,
}

/// Config file structure (subset of AppConfig that makes sense to persist)
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    cache_dir: Option<PathBuf>,
    fps: Option<u32>,
    debug_widgets: Option<bool>,

    /// Optional [backend] section
    backend: Option<BackendConfig>,

    /// Optional [logging] section
    logging: Option<FileLogging>,
}

impl AppConfig {
    /// Default config file path: ~/.config/homeboard/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("homeboard").join("config.toml"))
    }

    fn default_cache_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("homeboard")
    }

    fn load_file_config(path: Option<&Path>) -> Result<FileConfig, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::config_path() {
                Some(p) if p.exists() => p,
                _ => return Ok(FileConfig::default()),
            },
        };

        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Load configuration: env vars > file > defaults. An explicit `path`
    /// must exist and parse; the default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = Self::load_file_config(path)?;

        let cache_dir = std::env::var("HOMEBOARD_CACHE_DIR")
            .ok()
            .map(PathBuf::from)
            .or(file.cache_dir)
            .unwrap_or_else(Self::default_cache_dir);

        let fps = std::env::var("HOMEBOARD_FPS")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(file.fps)
            .unwrap_or(DEFAULT_FPS);

        let debug_widgets = std::env::var("HOMEBOARD_DEBUG_WIDGETS")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .ok()
            .or(file.debug_widgets)
            .unwrap_or(false);

        let file_logging = file.logging.unwrap_or_default();
        let logging = LoggingConfig {
            level: file_logging.level.unwrap_or_else(|| "info".to_string()),
            dir: file_logging.dir,
        };

        Ok(Self {
            cache_dir,
            fps,
            debug_widgets,
            backend: file.backend.unwrap_or_default(),
            logging,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_dir: Self::default_cache_dir(),
            fps: DEFAULT_FPS,
            debug_widgets: false,
            backend: BackendConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// An "#rrggbb" color literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub Rgb888);

impl Color {
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let hex = text
            .strip_prefix('#')
            .filter(|h| h.len() == 6 && h.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| ConfigError::InvalidColor(text.to_string()))?;
        let channel =
            |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or_default();
        Ok(Color(Rgb888::new(channel(0), channel(2), channel(4))))
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Color::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Named placement anchors resolved against the screen size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

/// Where and how big a widget is. Either explicit x/y or a named anchor;
/// full_width/full_height stretch the region to the screen edge.
#[derive(Debug, Clone, Deserialize)]
pub struct Placement {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub position: Option<Anchor>,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub full_width: bool,
    #[serde(default)]
    pub full_height: bool,
}

impl Placement {
    pub fn resolve(&self, widget: &str, screen: Size) -> Result<Rectangle, ConfigError> {
        let width = if self.full_width { screen.width } else { self.width };
        let height = if self.full_height { screen.height } else { self.height };
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidRegion {
                widget: widget.to_string(),
                reason: "zero width or height".to_string(),
            });
        }

        let top_left = match (self.x, self.y, self.position) {
            (Some(x), Some(y), None) => Point::new(x, y),
            (None, None, Some(anchor)) => anchor_point(anchor, screen, Size::new(width, height)),
            (None, None, None) => {
                return Err(ConfigError::MissingField {
                    widget: widget.to_string(),
                    field: "x/y or position".to_string(),
                })
            }
            _ => {
                return Err(ConfigError::InvalidRegion {
                    widget: widget.to_string(),
                    reason: "give either x/y or a named position, not both".to_string(),
                })
            }
        };

        Ok(Rectangle::new(top_left, Size::new(width, height)))
    }
}

fn anchor_point(anchor: Anchor, screen: Size, size: Size) -> Point {
    let right = screen.width.saturating_sub(size.width) as i32;
    let bottom = screen.height.saturating_sub(size.height) as i32;
    let (x, y) = match anchor {
        Anchor::TopLeft => (0, 0),
        Anchor::TopCenter => (right / 2, 0),
        Anchor::TopRight => (right, 0),
        Anchor::CenterLeft => (0, bottom / 2),
        Anchor::Center => (right / 2, bottom / 2),
        Anchor::CenterRight => (right, bottom / 2),
        Anchor::BottomLeft => (0, bottom),
        Anchor::BottomCenter => (right / 2, bottom),
        Anchor::BottomRight => (right, bottom),
    };
    Point::new(x, y)
}

/// Per-variant widget settings. The variant is decided here, once, at load
/// time; the render loop never looks at a type tag again.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WidgetKind {
    Label {
        text: Option<String>,
        #[serde(default)]
        font_size: FontSize,
        color: Option<Color>,
    },
    Clock {
        format: Option<String>,
        #[serde(default)]
        font_size: FontSize,
        color: Option<Color>,
    },
    Date {
        format: Option<String>,
        #[serde(default)]
        font_size: FontSize,
        color: Option<Color>,
    },
    Ticker {
        text: Option<String>,
        rss_url: Option<String>,
        item_count: Option<usize>,
        step: Option<i32>,
        #[serde(default)]
        font_size: FontSize,
        color: Option<Color>,
    },
    Image {
        path: Option<PathBuf>,
        url: Option<String>,
    },
    List {
        header: Option<String>,
        #[serde(default)]
        items: Vec<String>,
        marker: Option<String>,
        #[serde(default)]
        font_size: FontSize,
        color: Option<Color>,
    },
    Chart {
        sample_interval_secs: Option<u64>,
        color: Option<Color>,
        axis_color: Option<Color>,
    },
    Calendar {
        #[serde(default)]
        font_size: FontSize,
        color: Option<Color>,
        highlight: Option<Color>,
    },
}

/// One widget table entry in the skin.
#[derive(Debug, Clone, Deserialize)]
pub struct WidgetConfig {
    pub name: String,
    #[serde(flatten)]
    pub placement: Placement,
    pub background: Option<Color>,
    #[serde(flatten)]
    pub kind: WidgetKind,
}

/// The skin: screen geometry, background, widget table.
#[derive(Debug, Clone, Deserialize)]
pub struct SkinConfig {
    pub width: u32,
    pub height: u32,
    pub background: Option<Color>,
    pub background_image: Option<PathBuf>,
    pub background_url: Option<String>,
    #[serde(default, rename = "widget")]
    pub widgets: Vec<WidgetConfig>,
}

/// Upper bound on skin width/height. Keeps pixel index arithmetic well
/// inside u32 and rejects obviously wrong skins (8192^2 is 67M pixels).
pub const MAX_SCREEN_DIMENSION: u32 = 8192;

impl SkinConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let skin: SkinConfig =
            toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let bounds = 1..=MAX_SCREEN_DIMENSION;
        if !bounds.contains(&skin.width) || !bounds.contains(&skin.height) {
            return Err(ConfigError::InvalidRegion {
                widget: "screen".to_string(),
                reason: format!(
                    "{}x{} outside 1..={}",
                    skin.width, skin.height, MAX_SCREEN_DIMENSION
                ),
            });
        }
        Ok(skin)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Polls the skin file's mtime so the main loop can rebuild widgets when
/// the file is edited.
pub struct SkinWatcher {
    path: PathBuf,
    last_mtime: Option<SystemTime>,
}

impl SkinWatcher {
    pub fn new(path: &Path) -> Self {
        Self {
            last_mtime: mtime(path),
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True once per observed modification.
    pub fn changed(&mut self) -> bool {
        let current = mtime(&self.path);
        if current != self.last_mtime {
            self.last_mtime = current;
            return true;
        }
        false
    }
}

fn mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
