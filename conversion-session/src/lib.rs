//! # Conversion Session
//!
//! Client-side PNG to WebP conversion, without any UI dependency.
//!
//! This crate provides:
//! - Input filtering for picker, drag-drop and clipboard batches (PNG only)
//! - Lossy WebP re-encoding at a session-wide quality level (libwebp
//!   natively, the platform canvas in browsers)
//! - A sans-IO session state machine that hands out conversion jobs
//! - Card projections with previews and size savings
//! - ZIP packaging of all converted images
//! - A tokio actor driving the session headless (native only)
//!
//! ## Separation of Concerns
//!
//! The session never runs conversions itself. Its owner executes the jobs
//! (in a Dioxus coroutine or [`SessionDriver`]) and feeds the results back.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use conversion_session::{CandidateFile, ConversionSession, LibwebpEncoder, SessionDriver};
//! use std::sync::Arc;
//!
//! let (handle, mut events) =
//!     SessionDriver::spawn(ConversionSession::default(), Arc::new(LibwebpEncoder));
//! handle.ingest(vec![CandidateFile::new("logo.png", "image/png", bytes)])?;
//! while let Some(event) = events.recv().await {
//!     // render cards, show notices, enable the download button
//! }
//! let archive = handle.export().await?;
//! ```

#[cfg(target_arch = "wasm32")]
pub mod browser;
pub mod convert;
#[cfg(not(target_arch = "wasm32"))]
pub mod driver;
pub mod error;
pub mod export;
pub mod ingest;
pub mod models;
pub mod notice;
pub mod session;
pub mod view;

#[cfg(target_arch = "wasm32")]
pub use browser::CanvasEncoder;
pub use convert::{
    check_platform_support, check_webp_support, run_platform_job, yield_now, ConversionJob,
    ConversionResult, GenerationWatch, WebpEncoder,
};
#[cfg(not(target_arch = "wasm32"))]
pub use convert::{run_job, LibwebpEncoder};
#[cfg(not(target_arch = "wasm32"))]
pub use driver::{SessionDriver, SessionHandle};
pub use error::{ConvertError, ExportError, SessionError};
pub use export::{
    archive_entry_name, archive_file_name, build_archive, export_archive, ArchiveBuilder,
    ArchiveEntry, ExportedArchive,
};
pub use ingest::{select_clipboard_images, ClipboardItem};
pub use models::{
    ArchiveCompression, CandidateFile, EncodedImage, ImageId, ImageRecord, Quality, SessionConfig,
};
pub use notice::{Notice, NoticeBoard, NoticeId, NoticeKind};
pub use session::{ConversionSession, SessionCommand, SessionEvent, Step};
pub use view::{format_file_size, ConvertedView, ImageCardView, SizeDelta, SizeInfo, Trend};
