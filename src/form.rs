//! Form state: the values a user edits before generating a QR code
//!
//! Every setter replaces exactly one field and notifies subscribers through a
//! [`tokio::sync::watch`] channel so a renderer can redraw on change.

use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tokio::sync::watch;

/// Text the form starts with when nothing else is configured.
pub const DEFAULT_TEXT: &str = "https://example.com";

/// An RGBA color parsed from CSS hex notation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct Color {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
    /// Alpha channel (255 = opaque)
    pub a: u8,
}

impl Color {
    /// Opaque black, the default foreground.
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    /// Opaque white, the default background.
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    /// Build an opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa`. The leading `#` is optional.
    pub fn parse(value: &str) -> Result<Self> {
        let digits = value.trim().trim_start_matches('#');
        let expanded: String = match digits.len() {
            3 | 4 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 | 8 => digits.to_string(),
            _ => return Err(Error::InvalidColor(value.to_string())),
        };

        let bytes = hex::decode(&expanded).map_err(|_| Error::InvalidColor(value.to_string()))?;
        match bytes.as_slice() {
            [r, g, b] => Ok(Self::rgb(*r, *g, *b)),
            [r, g, b, a] => Ok(Self {
                r: *r,
                g: *g,
                b: *b,
                a: *a,
            }),
            _ => Err(Error::InvalidColor(value.to_string())),
        }
    }

    /// Channels in `image::Rgba` order.
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", hex::encode([self.r, self.g, self.b]))?;
        if self.a != 255 {
            write!(f, "{}", hex::encode([self.a]))?;
        }
        Ok(())
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Edge length of the generated image in pixels: 100..=400 in steps of 10
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "u32")]
pub struct QrSize(u32);

impl QrSize {
    /// Smallest selectable size
    pub const MIN: u32 = 100;
    /// Largest selectable size
    pub const MAX: u32 = 400;
    /// Granularity of the size control
    pub const STEP: u32 = 10;
    /// Initial size
    pub const DEFAULT: QrSize = QrSize(200);

    /// Accept a size only if it lies on the control's grid.
    pub fn new(px: u32) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&px) && px % Self::STEP == 0 {
            Ok(Self(px))
        } else {
            Err(Error::InvalidSize(px))
        }
    }

    /// Clamp into range and snap to the nearest step, as a slider would.
    pub fn clamped(px: u32) -> Self {
        let bounded = px.clamp(Self::MIN, Self::MAX);
        let steps = (bounded - Self::MIN + Self::STEP / 2) / Self::STEP;
        Self((Self::MIN + steps * Self::STEP).min(Self::MAX))
    }

    /// Size in pixels
    pub fn px(self) -> u32 {
        self.0
    }
}

impl Default for QrSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<QrSize> for u32 {
    fn from(size: QrSize) -> Self {
        size.0
    }
}

impl fmt::Display for QrSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}px", self.0)
    }
}

/// Current values of every form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormSettings {
    /// URL or free text to encode; may be empty
    pub text: String,
    /// Output edge length
    pub size: QrSize,
    /// Color of dark modules
    pub foreground: Color,
    /// Color of light modules and the margin
    pub background: Color,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEXT.to_string(),
            size: QrSize::DEFAULT,
            foreground: Color::BLACK,
            background: Color::WHITE,
        }
    }
}

impl FormSettings {
    /// Whether there is anything to encode.
    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }

    /// File name offered when exporting: `{text}-QR.png`.
    pub fn export_file_name(&self) -> String {
        format!("{}-QR.png", self.text)
    }
}

/// Holder for the live form values
#[derive(Debug)]
pub struct FormState {
    tx: watch::Sender<FormSettings>,
}

impl FormState {
    /// Create a form pre-filled with `initial`.
    pub fn new(initial: FormSettings) -> Self {
        Self {
            tx: watch::Sender::new(initial),
        }
    }

    /// Snapshot of the current values.
    pub fn settings(&self) -> FormSettings {
        self.tx.borrow().clone()
    }

    /// Current text.
    pub fn text(&self) -> String {
        self.tx.borrow().text.clone()
    }

    /// Replace the text.
    pub fn set_text(&self, text: impl Into<String>) {
        let text = text.into();
        self.tx.send_modify(|s| s.text = text);
    }

    /// Replace the size. Callers clamp beforehand via [`QrSize::clamped`].
    pub fn set_size(&self, size: QrSize) {
        self.tx.send_modify(|s| s.size = size);
    }

    /// Replace the foreground color.
    pub fn set_foreground(&self, color: Color) {
        self.tx.send_modify(|s| s.foreground = color);
    }

    /// Replace the background color.
    pub fn set_background(&self, color: Color) {
        self.tx.send_modify(|s| s.background = color);
    }

    /// Receive every subsequent change of the form values.
    pub fn subscribe(&self) -> watch::Receiver<FormSettings> {
        self.tx.subscribe()
    }
}

impl Default for FormState {
    fn default() -> Self {
        Self::new(FormSettings::default())
    }
}
