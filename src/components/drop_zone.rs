use conversion_session::CandidateFile;
use dioxus::prelude::*;
use dioxus::html::{FileData, HasFileData};
use std::path::Path;

/// Media type to use when the platform did not declare one
fn guess_media_type(name: &str) -> &'static str {
    match Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

fn declared_media_type(name: &str, declared: Option<String>) -> String {
    declared
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| guess_media_type(name).to_string())
}

/// Remount counter for the hidden file input. A remounted input starts with
/// an empty value, so choosing the same file again still fires `change`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct PickerGeneration(u32);

impl PickerGeneration {
    fn key(self) -> String {
        format!("picker-{}", self.0)
    }

    fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Reads picked or dropped files into candidates.
/// Unreadable files keep their name and type with empty content, so the
/// pipeline reports them like any other undecodable image.
async fn read_candidates(files: Vec<FileData>) -> Vec<CandidateFile> {
    let mut candidates = Vec::with_capacity(files.len());
    for file in files {
        let name = file.name();
        let media_type = declared_media_type(&name, file.content_type());
        let bytes = match file.read_bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(e) => {
                log::error!("Could not read {}: {:?}", name, e);
                Vec::new()
            }
        };
        candidates.push(CandidateFile::new(name, media_type, bytes));
    }
    candidates
}

#[component]
pub fn DropZone(on_files: EventHandler<Vec<CandidateFile>>) -> Element {
    let mut drag_over = use_signal(|| false);
    let mut picker = use_signal(PickerGeneration::default);
    let picker_key = picker().key();

    rsx! {
        label {
            class: if drag_over() { "drop-zone drag-over" } else { "drop-zone" },
            ondragover: move |evt| {
                evt.prevent_default();
                drag_over.set(true);
            },
            ondragleave: move |evt| {
                evt.prevent_default();
                drag_over.set(false);
            },
            ondrop: move |evt| {
                evt.prevent_default();
                drag_over.set(false);
                let files = evt.files();
                spawn(async move {
                    let candidates = read_candidates(files).await;
                    if !candidates.is_empty() {
                        on_files.call(candidates);
                    }
                });
            },
            div { class: "drop-zone-icon", "🖼️" }
            p { class: "drop-zone-title", "Drop PNG images here or click to choose" }
            p { class: "drop-zone-hint", "You can also paste images from the clipboard" }
            for key in std::iter::once(picker_key) {
                input {
                    key: "{key}",
                    r#type: "file",
                    accept: "image/png",
                    multiple: true,
                    style: "display: none;",
                    onchange: move |evt| async move {
                        let files = evt.files();
                        let next = picker.peek().next();
                        picker.set(next);
                        let candidates = read_candidates(files).await;
                        if !candidates.is_empty() {
                            on_files.call(candidates);
                        }
                    },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_type_wins() {
        assert_eq!(
            declared_media_type("photo.png", Some("image/jpeg".to_string())),
            "image/jpeg"
        );
    }

    #[test]
    fn test_picker_key_changes_after_each_selection() {
        let first = PickerGeneration::default();
        let second = first.next();
        let third = second.next();
        assert_ne!(first.key(), second.key());
        assert_ne!(second.key(), third.key());
        assert_eq!(PickerGeneration(u32::MAX).next(), PickerGeneration(0));
    }

    #[test]
    fn test_missing_type_is_guessed_from_name() {
        assert_eq!(declared_media_type("Logo.PNG", None), "image/png");
        assert_eq!(declared_media_type("photo.jpeg", Some(String::new())), "image/jpeg");
        assert_eq!(declared_media_type("README", None), "application/octet-stream");
    }
}
