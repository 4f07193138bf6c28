use crate::models::CandidateFile;

pub const SOURCE_MEDIA_TYPE: &str = "image/png";

/// Whether a declared media type identifies a PNG
pub fn is_supported_media_type(media_type: &str) -> bool {
    let essence = media_type.split(';').next().unwrap_or("").trim();
    essence.eq_ignore_ascii_case(SOURCE_MEDIA_TYPE)
}

/// Splits a batch into accepted PNGs and rejected candidates, keeping order
pub fn partition_candidates(batch: Vec<CandidateFile>) -> (Vec<CandidateFile>, Vec<CandidateFile>) {
    batch
        .into_iter()
        .partition(|candidate| is_supported_media_type(&candidate.media_type))
}

/// An item found on the clipboard during a paste
#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardItem {
    pub content_type: String,
    pub name: Option<String>,
    pub bytes: Vec<u8>,
}

/// Picks the image items of a paste.
///
/// Returns `None` when nothing image-like was pasted, in which case the paste
/// must be left to its default handling.
pub fn select_clipboard_images(items: Vec<ClipboardItem>) -> Option<Vec<CandidateFile>> {
    let images: Vec<CandidateFile> = items
        .into_iter()
        .filter(|item| item.content_type.contains("image"))
        .enumerate()
        .map(|(index, item)| {
            let name = item
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| pasted_name(index, &item.content_type));
            CandidateFile::new(name, item.content_type, item.bytes)
        })
        .collect();

    if images.is_empty() {
        None
    } else {
        Some(images)
    }
}

fn pasted_name(index: usize, content_type: &str) -> String {
    let ext = content_type
        .strip_prefix("image/")
        .map(|s| s.split(';').next().unwrap_or(s).trim())
        .filter(|s| !s.is_empty())
        .unwrap_or("img");
    format!("pasted-image-{}.{}", index + 1, ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_matching() {
        assert!(is_supported_media_type("image/png"));
        assert!(is_supported_media_type("IMAGE/PNG"));
        assert!(is_supported_media_type("image/png; charset=binary"));
        assert!(!is_supported_media_type("image/jpeg"));
        assert!(!is_supported_media_type(""));
        assert!(!is_supported_media_type("image/apng"));
    }

    #[test]
    fn test_partition_keeps_order() {
        let batch = vec![
            CandidateFile::new("a.png", "image/png", vec![1u8]),
            CandidateFile::new("b.jpg", "image/jpeg", vec![2u8]),
            CandidateFile::new("c.png", "image/png", vec![3u8]),
        ];
        let (accepted, rejected) = partition_candidates(batch);
        let names: Vec<_> = accepted.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "c.png"]);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].name, "b.jpg");
    }

    #[test]
    fn test_clipboard_without_images_is_unhandled() {
        let items = vec![ClipboardItem {
            content_type: "text/plain".to_string(),
            name: None,
            bytes: b"hello".to_vec(),
        }];
        assert_eq!(select_clipboard_images(items), None);
        assert_eq!(select_clipboard_images(Vec::new()), None);
    }

    #[test]
    fn test_clipboard_images_get_names() {
        let items = vec![
            ClipboardItem {
                content_type: "text/html".to_string(),
                name: None,
                bytes: Vec::new(),
            },
            ClipboardItem {
                content_type: "image/png".to_string(),
                name: None,
                bytes: vec![1, 2],
            },
            ClipboardItem {
                content_type: "image/jpeg".to_string(),
                name: Some("shot.jpg".to_string()),
                bytes: vec![3],
            },
        ];
        let files = select_clipboard_images(items).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].name, "pasted-image-1.png");
        assert_eq!(files[0].media_type, "image/png");
        assert_eq!(files[1].name, "shot.jpg");
    }
}
