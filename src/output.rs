//! Helpers for rendering the form and export results for a terminal

use crate::app::ViewModel;
use crate::export::ExportReceipt;
use crate::generate::GenerateOutcome;
use serde_json::{Value, json};

/// Combined structured and human-readable representation of the form
#[derive(Debug, Clone)]
pub struct RenderedView {
    /// Structured JSON representation suitable for downstream consumers
    pub json: Value,
    /// Human-readable lines for terminal presentation
    pub human: Vec<String>,
}

/// Render the view model into both JSON and human-readable forms.
pub fn render_view(view: &ViewModel) -> RenderedView {
    let json = serde_json::to_value(view).unwrap_or_else(|err| json!({ "error": err.to_string() }));
    let settings = &view.settings;
    let mut human = Vec::new();

    human.push("QR Code Settings".to_string());
    human.push(format!("  URL or Text: {}", format_text_snippet(&settings.text)));
    human.push(format!("  QR Code Size: {}", settings.size));
    human.push(format!("  QR Color: {}", settings.foreground));
    human.push(format!("  Background: {}", settings.background));
    human.push(format!(
        "  [{}]{}",
        view.generate_label,
        disabled_marker(view.generate_enabled)
    ));

    human.push("QR Code Preview".to_string());
    match (&view.preview, view.placeholder) {
        (Some(preview), _) => {
            human.push(format!(
                "  {}x{} PNG ({} bytes) for {}",
                preview.width,
                preview.height,
                preview.bytes,
                format_text_snippet(&preview.text)
            ));
            human.push(format!("  Shown at {}px", preview.display_px));
            human.push(format!(
                "  [Download QR Code]{}",
                disabled_marker(view.download_enabled)
            ));
        }
        (None, Some(placeholder)) => human.push(format!("  {placeholder}")),
        (None, None) => {}
    }

    RenderedView { json, human }
}

/// Describe a generate call in one line.
pub fn describe_outcome(outcome: &GenerateOutcome) -> String {
    match outcome {
        GenerateOutcome::Skipped => "Nothing to encode; enter a URL or text first".to_string(),
        GenerateOutcome::Busy => "A QR code is already being generated".to_string(),
        GenerateOutcome::Generated(artifact) => format!(
            "Generated {}x{} QR code",
            artifact.width(),
            artifact.height()
        ),
        // Failures are only logged; the preview keeps its previous contents.
        GenerateOutcome::Failed => String::new(),
    }
}

/// Structured representation of an export, `null` when nothing was saved.
pub fn receipt_value(receipt: Option<&ExportReceipt>) -> Value {
    match receipt {
        Some(receipt) => json!({
            "file_name": receipt.file_name,
            "location": receipt.location.as_ref().map(|p| p.display().to_string()),
            "bytes": receipt.bytes,
        }),
        None => Value::Null,
    }
}

/// Describe an export in one line.
pub fn describe_receipt(receipt: Option<&ExportReceipt>) -> String {
    match receipt {
        Some(ExportReceipt {
            location: Some(path),
            ..
        }) => format!("Saved {}", path.display()),
        Some(receipt) => format!("Saved {}", receipt.file_name),
        None => "No QR code to download yet".to_string(),
    }
}

fn disabled_marker(enabled: bool) -> &'static str {
    if enabled { "" } else { " (disabled)" }
}

fn format_text_snippet(text: &str) -> String {
    const MAX: usize = 120;
    if text.is_empty() {
        return "(empty)".to_string();
    }
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let snippet: String = text.chars().take(MAX).collect();
        let total = text.chars().count();
        format!("{}... ({} chars)", snippet, total)
    }
}
