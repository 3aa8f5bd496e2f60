//! QR code encoder

use crate::error::{Error, Result};
use crate::qr::{EncodeRequest, EncodedImage, QrRenderer};
use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use qrcode::{EcLevel, QrCode};
use std::io::Cursor;

/// Pixels per module when the requested width cannot fit the symbol.
const FALLBACK_SCALE: f64 = 4.0;

/// QR code encoder
#[derive(Debug, Clone, Copy)]
pub struct QrEncoder {
    /// Error correction level
    ecc_level: EcLevel,
}

impl QrEncoder {
    /// Create a new QR encoder with default settings (Medium ECC)
    pub fn new() -> Self {
        Self {
            ecc_level: EcLevel::M,
        }
    }

    /// Create a new QR encoder with a specific error correction level
    pub fn with_ecc_level(ecc_level: EcLevel) -> Self {
        Self { ecc_level }
    }

    /// Error correction level used for new symbols
    pub fn ecc_level(&self) -> EcLevel {
        self.ecc_level
    }

    /// Encode a request into a colored PNG.
    ///
    /// The module grid, margin included, is stretched over `request.width`
    /// pixels. If the grid has more modules than that, every module is drawn
    /// 4 px wide instead and the image comes out larger than requested.
    pub fn encode(&self, request: &EncodeRequest) -> Result<EncodedImage> {
        let code = QrCode::with_error_correction_level(request.text.as_bytes(), self.ecc_level)
            .map_err(|e| Error::QrEncode(format!("Failed to create QR code: {}", e)))?;

        let modules = code.width();
        let colors = code.to_colors();
        let margin = request.margin as usize;
        let grid = modules + margin * 2;

        let (scale, side) = if request.width as usize >= grid {
            (f64::from(request.width) / grid as f64, request.width)
        } else {
            (FALLBACK_SCALE, (grid as f64 * FALLBACK_SCALE) as u32)
        };
        let scaled_margin = margin as f64 * scale;
        let inner_end = f64::from(side) - scaled_margin;

        let dark = Rgba(request.dark.to_rgba());
        let light = Rgba(request.light.to_rgba());

        let image = RgbaImage::from_fn(side, side, |x, y| {
            let (x, y) = (f64::from(x), f64::from(y));
            if x < scaled_margin || y < scaled_margin || x >= inner_end || y >= inner_end {
                return light;
            }
            let col = ((x - scaled_margin) / scale).floor() as usize;
            let row = ((y - scaled_margin) / scale).floor() as usize;
            if col >= modules || row >= modules {
                return light;
            }
            match colors[row * modules + col] {
                qrcode::Color::Dark => dark,
                qrcode::Color::Light => light,
            }
        });

        let mut png = Vec::new();
        DynamicImage::ImageRgba8(image).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

        tracing::debug!(
            modules,
            side,
            requested = request.width,
            bytes = png.len(),
            "Encoded QR code"
        );

        Ok(EncodedImage {
            png: Bytes::from(png),
            width: side,
            height: side,
        })
    }
}

impl Default for QrEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QrRenderer for QrEncoder {
    async fn render(&self, request: &EncodeRequest) -> Result<EncodedImage> {
        let encoder = *self;
        let request = request.clone();
        tokio::task::spawn_blocking(move || encoder.encode(&request)).await?
    }
}

/// Parse an error correction level name (`L`, `M`, `Q` or `H`, case-insensitive).
pub fn parse_ec_level(value: &str) -> Option<EcLevel> {
    match value.trim().to_ascii_uppercase().as_str() {
        "L" | "LOW" => Some(EcLevel::L),
        "M" | "MEDIUM" => Some(EcLevel::M),
        "Q" | "QUARTILE" => Some(EcLevel::Q),
        "H" | "HIGH" => Some(EcLevel::H),
        _ => None,
    }
}
