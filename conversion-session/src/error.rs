use std::fmt;

/// Error produced while converting a single image
#[derive(Debug, Clone, PartialEq)]
pub enum ConvertError {
    /// Source bytes could not be decoded as PNG
    Decode(String),
    /// The WebP encoder rejected the raster
    Encode(String),
    /// Background worker panicked or was cancelled
    Worker(String),
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConvertError::Decode(msg) => write!(f, "Decode error: {}", msg),
            ConvertError::Encode(msg) => write!(f, "Encode error: {}", msg),
            ConvertError::Worker(msg) => write!(f, "Worker error: {}", msg),
        }
    }
}

impl std::error::Error for ConvertError {}

impl From<image::ImageError> for ConvertError {
    fn from(e: image::ImageError) -> Self {
        ConvertError::Decode(e.to_string())
    }
}

/// Error produced while packaging the archive
#[derive(Debug)]
pub enum ExportError {
    /// At least one image has no converted result yet (or there are none)
    NotReady,
    Archive(zip::result::ZipError),
    Io(std::io::Error),
    Worker(String),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExportError::NotReady => write!(f, "Not all images have been converted yet"),
            ExportError::Archive(e) => write!(f, "Archive error: {}", e),
            ExportError::Io(e) => write!(f, "IO error: {}", e),
            ExportError::Worker(msg) => write!(f, "Worker error: {}", msg),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<zip::result::ZipError> for ExportError {
    fn from(e: zip::result::ZipError) -> Self {
        ExportError::Archive(e)
    }
}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        ExportError::Io(e)
    }
}

/// Error returned by session-level operations
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    InvalidQuality(i64),
    /// The driver task has stopped and no longer accepts commands
    DriverClosed,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SessionError::InvalidQuality(v) => {
                write!(f, "Quality must be between 1 and 100, got {}", v)
            }
            SessionError::DriverClosed => write!(f, "Session driver is no longer running"),
        }
    }
}

impl std::error::Error for SessionError {}
