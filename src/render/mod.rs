// Render module - the pixel surface, the display backend seam, and the
// frame-rate limiter

pub mod backend;
pub mod limiter;
pub mod surface;

pub use backend::{DisplayBackend, FramebufferBackend, InputEvent, PngBackend};
pub use limiter::FrameLimiter;
pub use surface::Surface;
