//! Page-level glue that Dioxus events do not cover: clipboard paste,
//! offering a download, and timers.

use base64::{engine::general_purpose, Engine as _};
use conversion_session::{ClipboardItem, ExportedArchive};
use dioxus::prelude::*;
use serde::Deserialize;
#[cfg(target_arch = "wasm32")]
use serde::Serialize;
use std::time::Duration;

use crate::error::AppError;

/// Listens for paste events and forwards image items as base64.
/// Only calls `preventDefault` when at least one image was pasted.
const PASTE_LISTENER: &str = r#"
    const toBase64 = (bytes) => {
        let binary = "";
        const chunk = 0x8000;
        for (let i = 0; i < bytes.length; i += chunk) {
            binary += String.fromCharCode.apply(null, bytes.subarray(i, i + chunk));
        }
        return btoa(binary);
    };
    document.addEventListener("paste", async (e) => {
        const items = Array.from((e.clipboardData && e.clipboardData.items) || []);
        const images = items.filter((item) => item.type.indexOf("image") !== -1);
        if (images.length === 0) {
            return;
        }
        e.preventDefault();
        const payload = [];
        for (const item of images) {
            const file = item.getAsFile();
            if (!file) {
                continue;
            }
            const bytes = new Uint8Array(await file.arrayBuffer());
            payload.push({
                content_type: file.type || item.type,
                name: file.name || null,
                data: toBase64(bytes),
            });
        }
        dioxus.send(payload);
    });
"#;

#[cfg(target_arch = "wasm32")]
const DOWNLOAD_SCRIPT: &str = r#"
    const payload = await dioxus.recv();
    const binary = atob(payload.data);
    const bytes = new Uint8Array(binary.length);
    for (let i = 0; i < binary.length; i++) {
        bytes[i] = binary.charCodeAt(i);
    }
    const url = URL.createObjectURL(new Blob([bytes], { type: "application/zip" }));
    const a = document.createElement("a");
    a.href = url;
    a.download = payload.file_name;
    document.body.appendChild(a);
    a.click();
    document.body.removeChild(a);
    URL.revokeObjectURL(url);
    return true;
"#;

#[derive(Debug, Deserialize)]
struct PastedItem {
    content_type: String,
    name: Option<String>,
    data: String,
}

#[cfg(target_arch = "wasm32")]
#[derive(Debug, Serialize)]
struct DownloadPayload<'a> {
    file_name: &'a str,
    data: String,
}

impl PastedItem {
    fn decode(self) -> Result<ClipboardItem, AppError> {
        let bytes = general_purpose::STANDARD
            .decode(self.data)
            .map_err(|e| AppError::Bridge(format!("Invalid clipboard data: {}", e)))?;
        Ok(ClipboardItem {
            content_type: self.content_type,
            name: self.name,
            bytes,
        })
    }
}

/// Installs the paste listener and calls `on_paste` for every image paste
pub async fn listen_for_paste(mut on_paste: impl FnMut(Vec<ClipboardItem>)) {
    let mut eval = document::eval(PASTE_LISTENER);
    loop {
        let items: Vec<PastedItem> = match eval.recv().await {
            Ok(items) => items,
            Err(e) => {
                log::warn!("Paste listener stopped: {:?}", e);
                break;
            }
        };

        let mut decoded = Vec::with_capacity(items.len());
        for item in items {
            match item.decode() {
                Ok(item) => decoded.push(item),
                Err(e) => log::error!("{}", e),
            }
        }
        if !decoded.is_empty() {
            on_paste(decoded);
        }
    }
}

/// Hands the finished archive to the user
#[cfg(target_arch = "wasm32")]
pub async fn offer_download(archive: &ExportedArchive, _download_dir: &str) -> Result<(), AppError> {
    let eval = document::eval(DOWNLOAD_SCRIPT);
    eval.send(DownloadPayload {
        file_name: &archive.file_name,
        data: general_purpose::STANDARD.encode(&archive.bytes),
    })
    .map_err(|e| AppError::Bridge(format!("{:?}", e)))?;
    eval.await
        .map_err(|e| AppError::Bridge(format!("{:?}", e)))?;
    log::info!("Offered {} for download", archive.file_name);
    Ok(())
}

/// Hands the finished archive to the user
#[cfg(not(target_arch = "wasm32"))]
pub async fn offer_download(archive: &ExportedArchive, download_dir: &str) -> Result<(), AppError> {
    let path = std::path::Path::new(download_dir).join(&archive.file_name);
    std::fs::create_dir_all(download_dir)?;
    std::fs::write(&path, &archive.bytes)?;
    log::info!("Saved archive to {}", path.display());
    Ok(())
}

/// Waits without blocking the UI thread
pub async fn delay(duration: Duration) {
    #[cfg(target_arch = "wasm32")]
    {
        let mut eval = document::eval(&format!(
            "setTimeout(() => dioxus.send(true), {});",
            duration.as_millis()
        ));
        let _ = eval.recv::<bool>().await;
    }

    #[cfg(not(target_arch = "wasm32"))]
    tokio::time::sleep(duration).await;
}
