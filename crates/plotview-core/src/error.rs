//! Error handling for PlotView
//!
//! Provides error types for the viewer layers:
//! - Viewer errors (call-order and viewport violations, backend failures)
//! - Data errors (plot point loading and decoding)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Viewer error type
///
/// Raised when an operation runs before the component it depends on has
/// been initialized, or when the rendering backend rejects a frame.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewerError {
    /// A required component has not been created yet
    #[error("{component} is not initialized")]
    NotInitialized {
        /// The missing component ("camera", "controls", "renderer", "scene").
        component: &'static str,
    },

    /// Viewport dimensions cannot produce a valid projection
    #[error("Invalid viewport size {width}x{height}")]
    InvalidViewport {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// The render backend failed to present a frame
    #[error("Render failed: {0}")]
    Render(String),
}

impl ViewerError {
    /// Shorthand for [`ViewerError::NotInitialized`]
    pub fn not_initialized(component: &'static str) -> Self {
        ViewerError::NotInitialized { component }
    }
}

/// Plot data error type
#[derive(Error, Debug)]
pub enum DataError {
    /// The data file could not be read
    #[error("Failed to read plot data: {0}")]
    Io(#[from] std::io::Error),

    /// The data is not a JSON array of `{px, py, pz}` records
    #[error("Invalid plot data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Main error type for PlotView
#[derive(Error, Debug)]
pub enum Error {
    /// Viewer error
    #[error(transparent)]
    Viewer(#[from] ViewerError),

    /// Plot data error
    #[error(transparent)]
    Data(#[from] DataError),
}

impl Error {
    /// Check if this is a call-order error
    pub fn is_not_initialized(&self) -> bool {
        matches!(self, Error::Viewer(ViewerError::NotInitialized { .. }))
    }
}

/// Result type for PlotView operations
pub type Result<T> = std::result::Result<T, Error>;

/// Result type for viewer state operations
pub type ViewerResult<T> = std::result::Result<T, ViewerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewer_error_display() {
        let err = ViewerError::not_initialized("camera");
        assert_eq!(err.to_string(), "camera is not initialized");

        let err = ViewerError::InvalidViewport {
            width: 800,
            height: 0,
        };
        assert_eq!(err.to_string(), "Invalid viewport size 800x0");

        let err = ViewerError::Render("surface lost".to_string());
        assert_eq!(err.to_string(), "Render failed: surface lost");
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = ViewerError::not_initialized("renderer").into();
        assert!(err.is_not_initialized());
        assert_eq!(err.to_string(), "renderer is not initialized");

        let json_err = serde_json::from_str::<Vec<u32>>("{").unwrap_err();
        let err: Error = DataError::from(json_err).into();
        assert!(matches!(err, Error::Data(DataError::Json(_))));
        assert!(!err.is_not_initialized());
    }
}
