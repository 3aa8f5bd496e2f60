//! Generate a QR code and save it to the current directory
//!
//! Usage: cargo run --example generate_qr

use qrgen::{Color, DirectorySaver, FormSettings, GenerateOutcome, QrApp, QrEncoder, QrSize};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let app = QrApp::new(
        FormSettings::default(),
        QrEncoder::new(),
        DirectorySaver::new("."),
    );

    // Default form: https://example.com, 200px, black on white
    if let GenerateOutcome::Generated(artifact) = app.generate().await {
        println!("✓ Generated {}x{} QR code", artifact.width(), artifact.height());
    }
    if let Some(receipt) = app.download()? {
        println!("✓ Saved as {}", receipt.file_name);
    }

    // A larger, colored variant
    app.set_text("Hello from qrgen!");
    app.set_size(QrSize::clamped(320));
    app.set_foreground(Color::parse("#1e3a8a")?);
    app.set_background(Color::parse("#f8fafc")?);

    app.generate().await;
    if let Some(receipt) = app.download()? {
        println!("✓ Saved as {}", receipt.file_name);
        if let Some(path) = receipt.location {
            println!("  Location: {}", path.display());
        }
    }

    Ok(())
}
