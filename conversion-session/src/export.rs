use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::sync::Arc;

use crate::error::ExportError;
use crate::models::ArchiveCompression;

const TARGET_EXTENSION: &str = ".webp";
const SOURCE_EXTENSION: &str = ".png";

/// One file inside the exported archive
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveEntry {
    pub name: String,
    pub bytes: Arc<[u8]>,
}

/// Finished archive, ready to be offered as a download
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedArchive {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Replaces a trailing `.png` (any case) with `.webp`, or appends `.webp`
pub fn archive_entry_name(source_name: &str) -> String {
    let len = source_name.len();
    let has_png_ext = len >= SOURCE_EXTENSION.len()
        && source_name.is_char_boundary(len - SOURCE_EXTENSION.len())
        && source_name[len - SOURCE_EXTENSION.len()..].eq_ignore_ascii_case(SOURCE_EXTENSION);

    if has_png_ext {
        format!("{}{}", &source_name[..len - SOURCE_EXTENSION.len()], TARGET_EXTENSION)
    } else {
        format!("{}{}", source_name, TARGET_EXTENSION)
    }
}

/// Makes entry names unique: `a.webp`, `a (2).webp`, `a (3).webp`, ...
pub fn dedupe_entry_names(entries: &mut [ArchiveEntry]) {
    let mut taken: HashSet<String> = HashSet::new();
    for entry in entries.iter_mut() {
        if taken.insert(entry.name.to_lowercase()) {
            continue;
        }
        let stem = entry
            .name
            .strip_suffix(TARGET_EXTENSION)
            .unwrap_or(&entry.name)
            .to_string();
        let mut n = 2;
        loop {
            let candidate = format!("{} ({}){}", stem, n, TARGET_EXTENSION);
            if taken.insert(candidate.to_lowercase()) {
                log::debug!("Renamed duplicate archive entry {} -> {}", entry.name, candidate);
                entry.name = candidate;
                break;
            }
            n += 1;
        }
    }
}

/// `converted-images-<unix millis>.zip`
pub fn archive_file_name(now: DateTime<Utc>) -> String {
    format!("converted-images-{}.zip", now.timestamp_millis())
}

/// In-memory ZIP written one entry at a time
pub struct ArchiveBuilder {
    zip: zip::ZipWriter<Cursor<Vec<u8>>>,
    options: zip::write::FileOptions<'static, ()>,
    entries: usize,
}

impl ArchiveBuilder {
    pub fn new(compression: ArchiveCompression) -> Self {
        let method = match compression {
            ArchiveCompression::Stored => zip::CompressionMethod::Stored,
            ArchiveCompression::Deflated => zip::CompressionMethod::Deflated,
        };
        Self {
            zip: zip::ZipWriter::new(Cursor::new(Vec::new())),
            options: zip::write::FileOptions::default().compression_method(method),
            entries: 0,
        }
    }

    pub fn add(&mut self, entry: &ArchiveEntry) -> Result<(), ExportError> {
        self.zip.start_file(entry.name.as_str(), self.options)?;
        self.zip.write_all(&entry.bytes)?;
        self.entries += 1;
        Ok(())
    }

    pub fn finish(self) -> Result<Vec<u8>, ExportError> {
        let bytes = self.zip.finish()?.into_inner();
        log::info!("Built archive with {} entries ({} bytes)", self.entries, bytes.len());
        Ok(bytes)
    }
}

/// Writes all entries into an in-memory ZIP
pub fn build_archive(
    entries: &[ArchiveEntry],
    compression: ArchiveCompression,
) -> Result<Vec<u8>, ExportError> {
    let mut builder = ArchiveBuilder::new(compression);
    for entry in entries {
        builder.add(entry)?;
    }
    builder.finish()
}

/// Packages the entries without blocking the interactive thread: on the
/// blocking pool natively, one entry per event-loop turn in browsers
pub async fn export_archive(
    entries: Vec<ArchiveEntry>,
    compression: ArchiveCompression,
) -> Result<ExportedArchive, ExportError> {
    if entries.is_empty() {
        return Err(ExportError::NotReady);
    }

    #[cfg(not(target_arch = "wasm32"))]
    let bytes = tokio::task::spawn_blocking(move || build_archive(&entries, compression))
        .await
        .map_err(|e| ExportError::Worker(format!("Task join error: {}", e)))??;

    #[cfg(target_arch = "wasm32")]
    let bytes = {
        let mut builder = ArchiveBuilder::new(compression);
        for entry in &entries {
            builder.add(entry)?;
            crate::convert::yield_now().await;
        }
        builder.finish()?
    };

    Ok(ExportedArchive {
        file_name: archive_file_name(Utc::now()),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Read;

    fn entry(name: &str, bytes: &[u8]) -> ArchiveEntry {
        ArchiveEntry {
            name: name.to_string(),
            bytes: Arc::from(bytes),
        }
    }

    #[test]
    fn test_entry_name_replaces_png_case_insensitive() {
        assert_eq!(archive_entry_name("photo.png"), "photo.webp");
        assert_eq!(archive_entry_name("PHOTO.PNG"), "PHOTO.webp");
        assert_eq!(archive_entry_name("mixed.PnG"), "mixed.webp");
        assert_eq!(archive_entry_name("archive.png.png"), "archive.png.webp");
        assert_eq!(archive_entry_name("no-extension"), "no-extension.webp");
        assert_eq!(archive_entry_name("pngpng"), "pngpng.webp");
        assert_eq!(archive_entry_name("bild-ä.png"), "bild-ä.webp");
        assert_eq!(archive_entry_name("ä"), "ä.webp");
    }

    #[test]
    fn test_dedupe_entry_names() {
        let mut entries = vec![
            entry("a.webp", b"1"),
            entry("A.webp", b"2"),
            entry("a.webp", b"3"),
            entry("b.webp", b"4"),
        ];
        dedupe_entry_names(&mut entries);
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.webp", "A (2).webp", "a (3).webp", "b.webp"]);
    }

    #[test]
    fn test_archive_file_name() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(archive_file_name(now), "converted-images-1700000000123.zip");
    }

    #[test]
    fn test_build_archive_roundtrip() {
        let entries = vec![entry("one.webp", b"first"), entry("two.webp", b"second")];

        for compression in [ArchiveCompression::Stored, ArchiveCompression::Deflated] {
            let bytes = build_archive(&entries, compression).unwrap();
            let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
            assert_eq!(archive.len(), 2);

            let mut content = String::new();
            archive
                .by_name("two.webp")
                .unwrap()
                .read_to_string(&mut content)
                .unwrap();
            assert_eq!(content, "second");
        }
    }

    #[test]
    fn test_builder_counts_entries_incrementally() {
        let mut builder = ArchiveBuilder::new(ArchiveCompression::Deflated);
        builder.add(&entry("a.webp", b"alpha")).unwrap();
        builder.add(&entry("b.webp", b"beta")).unwrap();
        assert_eq!(builder.entries, 2);

        let bytes = builder.finish().unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<_> = archive.file_names().collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"a.webp") && names.contains(&"b.webp"));
    }

    #[tokio::test]
    async fn test_export_archive_names_file() {
        let exported = export_archive(vec![entry("a.webp", b"x")], ArchiveCompression::Stored)
            .await
            .unwrap();
        assert!(exported.file_name.starts_with("converted-images-"));
        assert!(exported.file_name.ends_with(".zip"));

        let empty = export_archive(Vec::new(), ArchiveCompression::Stored).await;
        assert!(matches!(empty, Err(ExportError::NotReady)));
    }
}
