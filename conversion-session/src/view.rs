//! Projection of image records into what a card displays.
//!
//! Nothing here touches a rendering environment, so the whole card state can
//! be checked in plain unit tests.

use base64::{engine::general_purpose, Engine as _};
use std::sync::Arc;

use crate::models::{ImageId, ImageRecord};

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Human-readable size in 1024-based units, at most two decimals
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    // Integer steps; a float log misplaces exact powers of 1024
    let mut exponent = 0;
    while exponent < SIZE_UNITS.len() - 1 && bytes >= 1u64 << (10 * (exponent + 1)) {
        exponent += 1;
    }
    let value = bytes as f64 / (1u64 << (10 * exponent)) as f64;

    format!("{} {}", trim_decimals(value, 2), SIZE_UNITS[exponent])
}

fn trim_decimals(value: f64, places: usize) -> String {
    let fixed = format!("{:.*}", places, value);
    if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        fixed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Shrink,
    Grow,
}

impl Trend {
    pub fn css_class(self) -> &'static str {
        match self {
            Trend::Shrink => "size-savings shrink",
            Trend::Grow => "size-savings grow",
        }
    }
}

/// Percentage change from the original to the converted size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeDelta {
    /// Savings in percent, rounded to one decimal; negative means growth
    pub savings: f64,
    pub trend: Trend,
}

impl SizeDelta {
    pub fn between(original: u64, converted: u64) -> Self {
        if original == 0 {
            return Self {
                savings: 0.0,
                trend: Trend::Grow,
            };
        }

        let raw = (original as f64 - converted as f64) / original as f64 * 100.0;
        let savings = (raw * 10.0).round() / 10.0;
        let trend = if savings > 0.0 {
            Trend::Shrink
        } else {
            Trend::Grow
        };
        Self { savings, trend }
    }

    pub fn label(&self) -> String {
        let sign = match self.trend {
            Trend::Shrink => '-',
            Trend::Grow => '+',
        };
        format!("{}{:.1}%", sign, self.savings.abs())
    }
}

/// Sizes line shown under both previews
#[derive(Debug, Clone, PartialEq)]
pub struct SizeInfo {
    pub original: String,
    pub converted: String,
    pub delta: SizeDelta,
}

impl SizeInfo {
    pub fn new(original: u64, converted: u64) -> Self {
        Self {
            original: format_file_size(original),
            converted: format_file_size(converted),
            delta: SizeDelta::between(original, converted),
        }
    }
}

pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(bytes))
}

/// The converted half of a card, replaced whenever a re-conversion lands
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedView {
    pub preview: Arc<str>,
    pub dimensions: String,
    pub sizes: SizeInfo,
}

impl ConvertedView {
    pub fn project(record: &ImageRecord) -> Option<Self> {
        let converted = record.converted.as_ref()?;
        Some(Self {
            preview: Arc::from(data_url("image/webp", &converted.bytes)),
            dimensions: format!("{} × {}", converted.width, converted.height),
            sizes: SizeInfo::new(record.original_size(), converted.len() as u64),
        })
    }
}

/// Everything one image card renders
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCardView {
    pub id: ImageId,
    pub name: String,
    pub original_preview: Arc<str>,
    pub converted: ConvertedView,
}

impl ImageCardView {
    /// `None` until the record has a converted result
    pub fn project(record: &ImageRecord) -> Option<Self> {
        let converted = ConvertedView::project(record)?;
        Some(Self {
            id: record.id,
            name: record.name.clone(),
            original_preview: Arc::from(data_url("image/png", record.original())),
            converted,
        })
    }

    /// Swaps in a newer converted half; the original preview is kept.
    /// The superseded preview is dropped here.
    pub fn refresh(&mut self, id: ImageId, converted: ConvertedView) -> bool {
        if id != self.id {
            return false;
        }
        self.converted = converted;
        true
    }
}
