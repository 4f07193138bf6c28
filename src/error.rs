use conversion_session::ExportError;
use std::fmt;

/// Central error types for the converter app
#[derive(Debug)]
pub enum AppError {
    /// Archive could not be built
    Export(ExportError),
    /// Filesystem error (desktop downloads)
    Filesystem(std::io::Error),
    /// Talking to the page failed (clipboard, downloads, timers)
    Bridge(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Export(e) => write!(f, "{}", e),
            AppError::Filesystem(e) => write!(f, "Filesystem error: {}", e),
            AppError::Bridge(msg) => write!(f, "Browser bridge error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<ExportError> for AppError {
    fn from(e: ExportError) -> Self {
        AppError::Export(e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Filesystem(e)
    }
}

/// User-friendly error messages for notices
impl AppError {
    pub fn user_message(&self) -> String {
        match self {
            AppError::Export(ExportError::NotReady) => {
                "Please wait until every image has been converted.".to_string()
            }
            AppError::Export(e) => e.to_string(),
            AppError::Filesystem(_) => {
                "Could not save the archive. Please check folder permissions.".to_string()
            }
            AppError::Bridge(msg) => msg.clone(),
        }
    }
}
