//! User-facing notifications.
//!
//! Every error is caught at the boundary of the operation that produced it
//! and turned into a [`Notice`]. Every notice carries a timeout after which
//! the UI dismisses it; the user may dismiss it earlier.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// A candidate file was not a PNG
    UnsupportedInput,
    /// An image could not be decoded or encoded
    Decode,
    /// Building or offering the archive failed
    Export,
    /// The runtime cannot produce WebP
    Capability,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub timeout: Duration,
}

impl Notice {
    pub fn transient(kind: NoticeKind, message: impl Into<String>, timeout: Duration) -> Self {
        Self {
            kind,
            message: message.into(),
            timeout,
        }
    }

    pub fn unsupported_input(name: &str, timeout: Duration) -> Self {
        Self::transient(
            NoticeKind::UnsupportedInput,
            format!("\"{}\" is not a PNG file and was skipped.", name),
            timeout,
        )
    }

    pub fn export_failed(reason: impl std::fmt::Display, timeout: Duration) -> Self {
        Self::transient(
            NoticeKind::Export,
            format!("Error creating ZIP: {}", reason),
            timeout,
        )
    }

    /// Reported once at startup; advisory, the app stays usable
    pub fn webp_unsupported(timeout: Duration) -> Self {
        Self::transient(
            NoticeKind::Capability,
            "This environment cannot encode WebP images. Conversions will fail until a WebP-capable runtime is used.",
            timeout,
        )
    }
}

pub type NoticeId = u64;

/// Active notices in display order (newest first)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoticeBoard {
    next_id: NoticeId,
    entries: Vec<(NoticeId, Notice)>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notice: Notice) -> NoticeId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(0, (id, notice));
        id
    }

    /// Returns false if the notice was already gone
    pub fn dismiss(&mut self, id: NoticeId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &(NoticeId, Notice)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
