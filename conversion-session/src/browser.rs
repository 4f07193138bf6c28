//! Browser encoding path.
//!
//! The platform decodes the PNG (`createImageBitmap`) and encodes WebP
//! (`canvas.toBlob`). Both are promises, so the page stays responsive while
//! an image is being converted.

use js_sys::{Array, Promise, Uint8Array};
use std::sync::Arc;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Blob, BlobPropertyBag, CanvasRenderingContext2d, HtmlCanvasElement, ImageBitmap, Window,
};

use crate::error::ConvertError;
use crate::ingest::SOURCE_MEDIA_TYPE;
use crate::models::{EncodedImage, Quality};

const TARGET_MEDIA_TYPE: &str = "image/webp";

fn js_message(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

fn window() -> Result<Window, ConvertError> {
    web_sys::window().ok_or_else(|| ConvertError::Worker("No window available".to_string()))
}

fn canvas(width: u32, height: u32) -> Result<HtmlCanvasElement, ConvertError> {
    let document = window()?
        .document()
        .ok_or_else(|| ConvertError::Worker("No document available".to_string()))?;
    let canvas = document
        .create_element("canvas")
        .map_err(|e| ConvertError::Worker(js_message(&e)))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| ConvertError::Worker("Element is not a canvas".to_string()))?;
    canvas.set_width(width);
    canvas.set_height(height);
    Ok(canvas)
}

async fn decode(source: &[u8]) -> Result<ImageBitmap, ConvertError> {
    let parts = Array::new();
    parts.push(&Uint8Array::from(source));
    let options = BlobPropertyBag::new();
    options.set_type(SOURCE_MEDIA_TYPE);
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)
        .map_err(|e| ConvertError::Decode(js_message(&e)))?;

    let promise = window()?
        .create_image_bitmap_with_blob(&blob)
        .map_err(|e| ConvertError::Decode(js_message(&e)))?;
    JsFuture::from(promise)
        .await
        .map_err(|e| ConvertError::Decode(js_message(&e)))?
        .dyn_into::<ImageBitmap>()
        .map_err(|_| ConvertError::Decode("Not an image bitmap".to_string()))
}

async fn to_webp_blob(canvas: &HtmlCanvasElement, quality: Quality) -> Result<Blob, ConvertError> {
    let factor = JsValue::from_f64(quality.encoder_factor() as f64);
    let mut scheduled = Ok(());
    let promise = Promise::new(&mut |resolve, _reject| {
        scheduled = canvas.to_blob_with_type_and_encoder_options(&resolve, TARGET_MEDIA_TYPE, &factor);
    });
    scheduled.map_err(|e| ConvertError::Encode(js_message(&e)))?;

    let value = JsFuture::from(promise)
        .await
        .map_err(|e| ConvertError::Encode(js_message(&e)))?;
    if value.is_null() || value.is_undefined() {
        return Err(ConvertError::Encode("Canvas produced no output".to_string()));
    }
    let blob = value
        .dyn_into::<Blob>()
        .map_err(|_| ConvertError::Encode("Canvas output is not a blob".to_string()))?;

    // Browsers without WebP fall back to PNG silently
    if blob.type_() != TARGET_MEDIA_TYPE {
        return Err(ConvertError::Encode(format!(
            "Browser produced {} instead of WebP",
            blob.type_()
        )));
    }
    Ok(blob)
}

async fn blob_bytes(blob: &Blob) -> Result<Vec<u8>, ConvertError> {
    let buffer = JsFuture::from(blob.array_buffer())
        .await
        .map_err(|e| ConvertError::Encode(js_message(&e)))?;
    Ok(Uint8Array::new(&buffer).to_vec())
}

/// Encoder backed by the browser's image decoder and canvas
#[derive(Debug, Clone, Copy, Default)]
pub struct CanvasEncoder;

impl CanvasEncoder {
    pub async fn encode(&self, source: &[u8], quality: Quality) -> Result<EncodedImage, ConvertError> {
        let bitmap = decode(source).await?;
        let (width, height) = (bitmap.width(), bitmap.height());

        // Native size, no scaling
        let canvas = canvas(width, height)?;
        let context = canvas
            .get_context("2d")
            .map_err(|e| ConvertError::Encode(js_message(&e)))?
            .ok_or_else(|| ConvertError::Encode("2d context unavailable".to_string()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| ConvertError::Encode("2d context unavailable".to_string()))?;
        context
            .draw_image_with_image_bitmap(&bitmap, 0.0, 0.0)
            .map_err(|e| ConvertError::Encode(js_message(&e)))?;
        bitmap.close();

        let blob = to_webp_blob(&canvas, quality).await?;
        let bytes = blob_bytes(&blob).await?;
        log::debug!("Canvas encoded {}x{} at {} ({} bytes)", width, height, quality, bytes.len());

        Ok(EncodedImage {
            bytes: Arc::from(bytes),
            quality,
            width,
            height,
        })
    }
}

/// True when the canvas can serialise WebP
pub fn check_webp_support() -> Result<(), ConvertError> {
    let canvas = canvas(1, 1)?;
    let url = canvas
        .to_data_url_with_type(TARGET_MEDIA_TYPE)
        .map_err(|e| ConvertError::Encode(js_message(&e)))?;
    if url.starts_with("data:image/webp") {
        Ok(())
    } else {
        Err(ConvertError::Encode(
            "Canvas cannot produce WebP in this browser".to_string(),
        ))
    }
}

/// Resolves on the next macrotask, letting the page handle input and paint
pub async fn next_tick() {
    let promise = Promise::new(&mut |resolve, _reject| {
        let scheduled = web_sys::window().map(|w| {
            w.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, 0)
                .is_ok()
        });
        if scheduled != Some(true) {
            let _ = resolve.call0(&JsValue::NULL);
        }
    });
    let _ = JsFuture::from(promise).await;
}
