use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::ConvertError;
use crate::models::{EncodedImage, ImageId, Quality};

/// Encodes PNG source bytes into WebP at a given quality
pub trait WebpEncoder: Send + Sync {
    fn encode(&self, source: &[u8], quality: Quality) -> Result<EncodedImage, ConvertError>;
}

/// Native encoder: `image` decodes the PNG, libwebp encodes lossy WebP
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct LibwebpEncoder;

#[cfg(not(target_arch = "wasm32"))]
impl WebpEncoder for LibwebpEncoder {
    fn encode(&self, source: &[u8], quality: Quality) -> Result<EncodedImage, ConvertError> {
        let img = image::load_from_memory_with_format(source, ImageFormat::Png)?;

        // Native size, no scaling
        let raster = img.to_rgba8();
        let (width, height) = raster.dimensions();
        log::debug!("Decoded {}x{} raster, encoding at {}", width, height, quality);

        let encoder = webp::Encoder::from_rgba(raster.as_raw(), width, height);
        let memory = encoder
            .encode_simple(false, quality.encoder_factor() * 100.0)
            .map_err(|e| ConvertError::Encode(format!("libwebp failed: {:?}", e)))?;

        Ok(EncodedImage {
            bytes: Arc::from(&*memory),
            quality,
            width,
            height,
        })
    }
}

/// A unit of conversion work handed out by the session
#[derive(Debug, Clone)]
pub struct ConversionJob {
    pub id: ImageId,
    pub name: String,
    pub source: Arc<[u8]>,
    pub quality: Quality,
    pub generation: u64,
}

/// Completion of a [`ConversionJob`], fed back into the session
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub id: ImageId,
    pub name: String,
    pub generation: u64,
    pub outcome: Result<EncodedImage, ConvertError>,
}

impl ConversionJob {
    pub fn run(self, encoder: &dyn WebpEncoder) -> ConversionResult {
        log::debug!(
            "Converting {} ({} bytes) at {} [gen {}]",
            self.name,
            self.source.len(),
            self.quality,
            self.generation
        );
        let outcome = encoder.encode(&self.source, self.quality);
        self.finish(outcome)
    }

    fn finish(self, outcome: Result<EncodedImage, ConvertError>) -> ConversionResult {
        ConversionResult {
            id: self.id,
            name: self.name,
            generation: self.generation,
            outcome,
        }
    }
}

/// Runs a job on the blocking pool
#[cfg(not(target_arch = "wasm32"))]
pub async fn run_job(job: ConversionJob, encoder: Arc<dyn WebpEncoder>) -> ConversionResult {
    let fallback = job.clone();
    match tokio::task::spawn_blocking(move || job.run(&*encoder)).await {
        Ok(result) => result,
        Err(e) => fallback.finish(Err(ConvertError::Worker(format!("Task join error: {}", e)))),
    }
}

/// Runs a job with the platform's encoder without blocking the interactive
/// thread: libwebp on the blocking pool natively, the canvas in browsers
pub async fn run_platform_job(job: ConversionJob) -> ConversionResult {
    #[cfg(not(target_arch = "wasm32"))]
    {
        run_job(job, Arc::new(LibwebpEncoder)).await
    }

    #[cfg(target_arch = "wasm32")]
    {
        log::debug!("Converting {} at {} [gen {}]", job.name, job.quality, job.generation);
        let outcome = crate::browser::CanvasEncoder.encode(&job.source, job.quality).await;
        job.finish(outcome)
    }
}

/// Probes the encoder [`run_platform_job`] uses
pub fn check_platform_support() -> Result<(), ConvertError> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        check_webp_support(&LibwebpEncoder)
    }

    #[cfg(target_arch = "wasm32")]
    {
        crate::browser::check_webp_support()
    }
}

/// Lets queued input events run before the next piece of work
pub async fn yield_now() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        tokio::task::yield_now().await;
    }

    #[cfg(target_arch = "wasm32")]
    {
        crate::browser::next_tick().await;
    }
}

/// Newest generation the session has issued, shared with pending jobs.
///
/// A job whose generation is older has been re-issued at a newer quality and
/// its result would be discarded, so it can be skipped before encoding.
#[derive(Debug, Clone, Default)]
pub struct GenerationWatch(Arc<AtomicU64>);

impl GenerationWatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, generation: u64) {
        self.0.fetch_max(generation, Ordering::Relaxed);
    }

    pub fn latest(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn is_superseded(&self, job: &ConversionJob) -> bool {
        job.generation < self.latest()
    }
}

/// Encodes a 1x1 image and decodes the result to prove WebP works here
pub fn check_webp_support(encoder: &dyn WebpEncoder) -> Result<(), ConvertError> {
    let sample = tiny_png()?;
    let encoded = encoder.encode(&sample, Quality::default())?;
    image::load_from_memory_with_format(&encoded.bytes, ImageFormat::WebP)
        .map_err(|e| ConvertError::Decode(format!("WebP output unreadable: {}", e)))?;
    Ok(())
}

fn tiny_png() -> Result<Vec<u8>, ConvertError> {
    let img = RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255]));
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| ConvertError::Encode(format!("Failed to build sample PNG: {}", e)))?;
    Ok(buffer.into_inner())
}
