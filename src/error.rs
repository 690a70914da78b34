// error.rs - Failure types for the host boundary
//
// Nothing here ever reaches JS as an exception. The wasm API logs these and
// falls back to a no-op so the dashboard keeps running.

use thiserror::Error;

/// Problems binding to the browser's drawing surface or frame clock.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("no global window")]
    NoWindow,

    #[error("window has no document")]
    NoDocument,

    #[error("canvas element '{0}' not found")]
    CanvasNotFound(String),

    #[error("element '{0}' is not a canvas")]
    NotACanvas(String),

    #[error("2d context unavailable: {0}")]
    ContextUnavailable(String),

    #[error("animation frame request failed: {0}")]
    FrameRequest(String),

    #[error("event listener registration failed: {0}")]
    Listener(String),
}

/// Rejected simulation configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config must be a plain object")]
    NotAnObject,

    #[error("config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("config field `{field}` must be finite and non-negative, got {value}")]
    Negative { field: &'static str, value: f32 },

    #[error("config field `{field}` must be greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f32 },
}
