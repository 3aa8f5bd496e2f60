//! qrgen - QR code generator with a live form, preview and PNG export
//!
//! The crate models a single form: the user edits text, size and colors,
//! triggers generation, looks at the preview and downloads it as a PNG.
//!
//! # Features
//!
//! - **Form state**: field setters with change notification over `tokio::sync::watch`
//! - **Generation**: one encoder call at a time, with the last good preview kept on failure
//! - **Export**: saves `{text}-QR.png` through a pluggable save target
//! - **Async-first**: built on Tokio; encoding runs on the blocking pool
//!
//! # Example
//!
//! ```no_run
//! use qrgen::{DirectorySaver, FormSettings, QrApp, QrEncoder};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let app = QrApp::new(FormSettings::default(), QrEncoder::new(), DirectorySaver::new("."));
//!
//!     app.set_text("https://example.com");
//!     app.generate().await;
//!
//!     if let Some(receipt) = app.download()? {
//!         println!("Saved {}", receipt.file_name);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs, rust_2024_compatibility)]

pub mod app;
pub mod config;
pub mod error;
pub mod export;
pub mod form;
pub mod generate;
pub mod logging;
pub mod output;
pub mod qr;

// Re-exports for convenience
pub use error::{Error, Result};

pub use app::{PreviewInfo, QrApp, ViewChanges, ViewModel};
pub use config::{ExportOptions, FormOptions, LogRotation, LoggingOptions, QrgenConfig};
pub use export::{DirectorySaver, ExportReceipt, MemorySaver, SaveTarget};
pub use form::{Color, FormSettings, FormState, QrSize};
pub use generate::{GenerateOutcome, GenerationState, Generator};
pub use qr::{Artifact, EncodeRequest, EncodedImage, QrEncoder, QrRenderer};
