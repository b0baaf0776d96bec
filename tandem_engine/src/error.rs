//! Error types for the Tandem renderer
//!
//! Every fallible operation returns [`Result`]. Errors are grouped into three
//! kinds (see [`ErrorKind`]) so callers can decide between aborting, rebuilding
//! the presentable image chain, or carrying on without the failed resource.

use std::fmt;

/// Result type for Tandem operations
pub type Result<T> = std::result::Result<T, Error>;

/// Tandem errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Initialization failed (instance, device, chain, pipelines)
    InitializationFailed(String),

    /// Backend-specific error (Vulkan call failure outside of setup)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (bad dimensions, missing default texture, ...)
    InvalidResource(String),

    /// The presentation surface no longer matches the image chain
    SwapchainOutOfDate,

    /// A model, texture or shader file could not be loaded
    LoadFailed(String),

    /// A handle refers to a resource that has been removed
    StaleHandle(String),
}

/// How an error should be handled by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unrecoverable: abort initialization or the process
    Setup,

    /// Rebuild the image chain and retry the frame
    FrameTransient,

    /// The requested resource is unavailable; rendering can continue
    Load,
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InitializationFailed(_)
            | Error::BackendError(_)
            | Error::OutOfMemory
            | Error::InvalidResource(_) => ErrorKind::Setup,
            Error::SwapchainOutOfDate => ErrorKind::FrameTransient,
            Error::LoadFailed(_) | Error::StaleHandle(_) => ErrorKind::Load,
        }
    }

    /// True when the frame should be retried after a chain rebuild
    pub fn is_frame_transient(&self) -> bool {
        self.kind() == ErrorKind::FrameTransient
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::SwapchainOutOfDate => write!(f, "Swapchain out of date"),
            Error::LoadFailed(msg) => write!(f, "Load failed: {}", msg),
            Error::StaleHandle(msg) => write!(f, "Stale handle: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
