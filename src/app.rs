//! The QR generator form: settings, generation and export wired together

use crate::error::Result;
use crate::export::{ExportReceipt, SaveTarget, export};
use crate::form::{Color, FormSettings, FormState, QrSize};
use crate::generate::{GenerateOutcome, GenerationState, Generator};
use crate::qr::QrRenderer;
use serde::Serialize;
use tokio::sync::watch;

/// Label of the generate action while idle.
pub const GENERATE_LABEL: &str = "Generate QR Code";
/// Label of the generate action while a call is outstanding.
pub const GENERATING_LABEL: &str = "Generating...";
/// Shown in place of the preview until something has been generated.
pub const PREVIEW_PLACEHOLDER: &str = "QR code preview will appear here";

/// Form, generator and save target composed into one component
pub struct QrApp<R, S> {
    form: FormState,
    generator: Generator<R>,
    saver: S,
}

impl<R: QrRenderer, S: SaveTarget> QrApp<R, S> {
    /// Create the app with `initial` form values.
    pub fn new(initial: FormSettings, renderer: R, saver: S) -> Self {
        Self {
            form: FormState::new(initial),
            generator: Generator::new(renderer),
            saver,
        }
    }

    /// Form state holder
    pub fn form(&self) -> &FormState {
        &self.form
    }

    /// Generation state machine
    pub fn generator(&self) -> &Generator<R> {
        &self.generator
    }

    /// Save target used by [`QrApp::download`]
    pub fn saver(&self) -> &S {
        &self.saver
    }

    /// Replace the text.
    pub fn set_text(&self, text: impl Into<String>) {
        self.form.set_text(text);
    }

    /// Replace the size.
    pub fn set_size(&self, size: QrSize) {
        self.form.set_size(size);
    }

    /// Replace the foreground color.
    pub fn set_foreground(&self, color: Color) {
        self.form.set_foreground(color);
    }

    /// Replace the background color.
    pub fn set_background(&self, color: Color) {
        self.form.set_background(color);
    }

    /// Whether the generate action is available.
    pub fn can_generate(&self) -> bool {
        self.form.settings().has_text() && !self.generator.is_in_flight()
    }

    /// Whether the download action is available.
    pub fn can_download(&self) -> bool {
        self.generator.artifact().is_some()
    }

    /// Generate from the values currently in the form.
    pub async fn generate(&self) -> GenerateOutcome {
        self.generator.generate(self.form.settings()).await
    }

    /// Save the current artifact as `{text}-QR.png`, using the text in the form now.
    pub fn download(&self) -> Result<Option<ExportReceipt>> {
        export(
            self.generator.artifact().as_ref(),
            &self.form.text(),
            &self.saver,
        )
    }

    /// Everything a renderer needs to draw the form.
    pub fn view(&self) -> ViewModel {
        let settings = self.form.settings();
        let state = self.generator.state();
        let in_flight = self.generator.is_in_flight();

        let preview = state.preview().map(|artifact| PreviewInfo {
            text: artifact.settings().text.clone(),
            width: artifact.width(),
            height: artifact.height(),
            display_px: settings.size.px(),
            bytes: artifact.png().len(),
        });

        ViewModel {
            generate_enabled: settings.has_text() && !in_flight,
            generate_label: if in_flight {
                GENERATING_LABEL
            } else {
                GENERATE_LABEL
            },
            download_enabled: preview.is_some(),
            placeholder: preview.is_none().then_some(PREVIEW_PLACEHOLDER),
            state: state.label(),
            settings,
            preview,
        }
    }

    /// Observe form edits and generation transitions.
    pub fn changes(&self) -> ViewChanges {
        ViewChanges {
            form: self.form.subscribe(),
            generation: self.generator.subscribe(),
        }
    }
}

/// Snapshot of the form as it should be drawn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewModel {
    /// Current field values
    pub settings: FormSettings,
    /// Generation state name
    pub state: &'static str,
    /// Whether the generate action can be triggered
    pub generate_enabled: bool,
    /// Text of the generate action
    pub generate_label: &'static str,
    /// Whether the download action can be triggered
    pub download_enabled: bool,
    /// The artifact on display, if any
    pub preview: Option<PreviewInfo>,
    /// Text shown when there is no preview
    pub placeholder: Option<&'static str>,
}

/// What the preview area shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewInfo {
    /// Text the artifact encodes
    pub text: String,
    /// Artifact width in pixels
    pub width: u32,
    /// Artifact height in pixels
    pub height: u32,
    /// Edge length the preview is drawn at (the current size setting)
    pub display_px: u32,
    /// PNG size in bytes
    pub bytes: usize,
}

/// Stream of "something changed" notifications for a renderer
pub struct ViewChanges {
    form: watch::Receiver<FormSettings>,
    generation: watch::Receiver<GenerationState>,
}

impl ViewChanges {
    /// Wait for the next change. Returns `false` once the app has been dropped.
    pub async fn changed(&mut self) -> bool {
        tokio::select! {
            res = self.form.changed() => res.is_ok(),
            res = self.generation.changed() => res.is_ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::MemorySaver;
    use crate::qr::QrEncoder;

    fn app(text: &str) -> QrApp<QrEncoder, MemorySaver> {
        let settings = FormSettings {
            text: text.to_string(),
            ..FormSettings::default()
        };
        QrApp::new(settings, QrEncoder::new(), MemorySaver::new())
    }

    #[test]
    fn test_initial_view() {
        let app = app("https://example.com");
        let view = app.view();

        assert!(view.generate_enabled);
        assert_eq!(view.generate_label, GENERATE_LABEL);
        assert!(!view.download_enabled);
        assert!(view.preview.is_none());
        assert_eq!(view.placeholder, Some(PREVIEW_PLACEHOLDER));
        assert_eq!(view.state, "idle");
    }

    #[test]
    fn test_empty_text_disables_generate() {
        let app = app("");
        assert!(!app.can_generate());
        assert!(!app.view().generate_enabled);
    }

    #[tokio::test]
    async fn test_preview_is_a_snapshot() {
        let app = app("https://example.com");
        assert!(matches!(app.generate().await, GenerateOutcome::Generated(_)));

        app.set_size(QrSize::clamped(400));
        app.set_text("changed");

        let preview = app.view().preview.unwrap();
        assert_eq!(preview.text, "https://example.com");
        assert_eq!((preview.width, preview.height), (200, 200));
        assert_eq!(preview.display_px, 400);
    }

    #[tokio::test]
    async fn test_download_uses_current_text() {
        let app = app("first");
        app.generate().await;
        app.set_text("second");

        let receipt = app.download().unwrap().unwrap();
        assert_eq!(receipt.file_name, "second-QR.png");
        assert_eq!(app.saver().saved().len(), 1);
    }

    #[test]
    fn test_download_without_artifact() {
        let app = app("nothing yet");
        assert!(!app.can_download());
        assert!(app.download().unwrap().is_none());
        assert!(app.saver().saved().is_empty());
    }

    #[tokio::test]
    async fn test_changes_fire_on_edit() {
        let app = app("x");
        let mut changes = app.changes();

        app.set_foreground(Color::rgb(1, 1, 1));
        assert!(changes.changed().await);
    }
}
