use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use ulid::Ulid;

use crate::error::SessionError;

static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Identifier of an image: creation time in milliseconds plus a
/// process-wide sequence number in the random part of the ULID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(Ulid);

impl ImageId {
    pub fn new() -> Self {
        let millis = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let sequence = NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self(Ulid::from_parts(millis, sequence as u128))
    }
}

impl Default for ImageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// WebP quality level, always within 1..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 100;

    pub fn new(value: i64) -> Result<Self, SessionError> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(SessionError::InvalidQuality(value))
        }
    }

    /// Clamps arbitrary slider input into the valid range
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Fraction in 0.0..=1.0 expected by encoders that work on a unit scale
    pub fn encoder_factor(self) -> f32 {
        self.0 as f32 / 100.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

impl TryFrom<i64> for Quality {
    type Error = SessionError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(q: Quality) -> Self {
        q.0
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// A file offered by one of the input surfaces (picker, drop, paste)
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFile {
    pub name: String,
    /// Declared media type, e.g. `image/png`
    pub media_type: String,
    pub bytes: Arc<[u8]>,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Result of one successful WebP encode
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub bytes: Arc<[u8]>,
    pub quality: Quality,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// One user-supplied image and its conversion state
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    pub id: ImageId,
    pub name: String,
    original: Arc<[u8]>,
    pub converted: Option<EncodedImage>,
    /// Generation of the newest conversion dispatched for this record
    pub requested_generation: u64,
}

impl ImageRecord {
    pub fn new(name: impl Into<String>, original: Arc<[u8]>) -> Self {
        Self {
            id: ImageId::new(),
            name: name.into(),
            original,
            converted: None,
            requested_generation: 0,
        }
    }

    pub fn original(&self) -> &Arc<[u8]> {
        &self.original
    }

    pub fn original_size(&self) -> u64 {
        self.original.len() as u64
    }

    pub fn converted_size(&self) -> Option<u64> {
        self.converted.as_ref().map(|c| c.len() as u64)
    }

    pub fn is_converted(&self) -> bool {
        self.converted.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// ZIP compression used for the exported archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveCompression {
    /// WebP is already compressed, so storing is the default
    #[default]
    Stored,
    Deflated,
}

/// Configuration for a conversion session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub default_quality: Quality,
    /// How long transient notices stay visible
    pub notice_timeout: Duration,
    pub compression: ArchiveCompression,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_quality: Quality::default(),
            notice_timeout: Duration::from_secs(5),
            compression: ArchiveCompression::Stored,
        }
    }
}
