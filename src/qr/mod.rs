//! QR code rendering
//!
//! The encoder collaborator is modelled by the [`QrRenderer`] trait: it turns an
//! [`EncodeRequest`] into PNG bytes. [`QrEncoder`] is the default implementation
//! backed by the `qrcode` and `image` crates.

mod encoder;

pub use encoder::{QrEncoder, parse_ec_level};

use crate::error::Result;
use crate::form::{Color, FormSettings};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat};
use serde::Serialize;

/// Quiet zone around the symbol, in modules.
pub const MARGIN_MODULES: u32 = 1;

/// Parameters handed to the encoder collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeRequest {
    /// Content to encode
    pub text: String,
    /// Requested image width (and height) in pixels
    pub width: u32,
    /// Quiet zone in modules
    pub margin: u32,
    /// Color of dark modules
    pub dark: Color,
    /// Color of light modules and margin
    pub light: Color,
}

impl EncodeRequest {
    /// Build the request for a settings snapshot.
    pub fn from_settings(settings: &FormSettings) -> Self {
        Self {
            text: settings.text.clone(),
            width: settings.size.px(),
            margin: MARGIN_MODULES,
            dark: settings.foreground,
            light: settings.background,
        }
    }
}

/// PNG output of the encoder collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// PNG file contents
    pub png: Bytes,
    /// Pixel width
    pub width: u32,
    /// Pixel height
    pub height: u32,
}

/// Anything able to render text as a colored QR raster
#[async_trait]
pub trait QrRenderer: Send + Sync {
    /// Render `request` into a PNG image.
    async fn render(&self, request: &EncodeRequest) -> Result<EncodedImage>;
}

/// A generated QR image together with the settings it was produced from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    #[serde(skip)]
    image: EncodedImage,
    settings: FormSettings,
}

impl Artifact {
    /// Pair an encoded image with the snapshot used to request it.
    pub fn new(image: EncodedImage, settings: FormSettings) -> Self {
        Self { image, settings }
    }

    /// PNG bytes. Cloning the returned handle does not copy the data.
    pub fn png(&self) -> &Bytes {
        &self.image.png
    }

    /// Image width in pixels
    pub fn width(&self) -> u32 {
        self.image.width
    }

    /// Image height in pixels
    pub fn height(&self) -> u32 {
        self.image.height
    }

    /// Settings at the moment generation was requested
    pub fn settings(&self) -> &FormSettings {
        &self.settings
    }

    /// `data:image/png;base64,...` reference suitable for embedding.
    pub fn data_url(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.image.png))
    }

    /// Decode the PNG back into pixels.
    pub fn to_image(&self) -> Result<DynamicImage> {
        Ok(image::load_from_memory_with_format(
            &self.image.png,
            ImageFormat::Png,
        )?)
    }
}
