use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Notify;

use qrgen::app::{GENERATE_LABEL, GENERATING_LABEL, PREVIEW_PLACEHOLDER};
use qrgen::{
    Color, EncodeRequest, EncodedImage, Error, FormSettings, GenerateOutcome, MemorySaver, QrApp,
    QrEncoder, QrRenderer, QrSize, Result,
};

fn decode_text(png: &[u8]) -> String {
    let gray = image::load_from_memory(png).expect("load png").to_luma8();
    let mut prepared = rqrr::PreparedImage::prepare(gray);
    let grids = prepared.detect_grids();
    assert!(!grids.is_empty(), "no QR code detected");
    grids[0].decode().expect("decode grid").1
}

/// Real encoder that can be told to fail and can hold a call open.
struct ScriptedRenderer {
    inner: QrEncoder,
    fail: AtomicBool,
    hold: AtomicBool,
    calls: AtomicUsize,
    entered: Notify,
    release: Notify,
}

impl ScriptedRenderer {
    fn new() -> Self {
        Self {
            inner: QrEncoder::new(),
            fail: AtomicBool::new(false),
            hold: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl QrRenderer for ScriptedRenderer {
    async fn render(&self, request: &EncodeRequest) -> Result<EncodedImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hold.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::QrEncode("encoder rejected input".to_string()));
        }
        self.inner.render(request).await
    }
}

fn app_with(text: &str) -> QrApp<ScriptedRenderer, MemorySaver> {
    let settings = FormSettings {
        text: text.to_string(),
        ..FormSettings::default()
    };
    QrApp::new(settings, ScriptedRenderer::new(), MemorySaver::new())
}

#[tokio::test]
async fn example_url_generates_and_downloads() {
    let app = app_with("https://example.com");
    app.set_size(QrSize::new(200).unwrap());
    app.set_foreground(Color::parse("#000000").unwrap());
    app.set_background(Color::parse("#ffffff").unwrap());

    let outcome = app.generate().await;
    let GenerateOutcome::Generated(artifact) = outcome else {
        panic!("expected generation to succeed, got {outcome:?}");
    };
    assert_eq!((artifact.width(), artifact.height()), (200, 200));
    assert_eq!(decode_text(artifact.png()), "https://example.com");
    assert!(artifact.data_url().starts_with("data:image/png;base64,"));

    let view = app.view();
    assert!(view.download_enabled);
    assert!(view.placeholder.is_none());

    let receipt = app.download().unwrap().expect("artifact present");
    assert_eq!(receipt.file_name, "https://example.com-QR.png");

    let saved = app.saver().saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].name, "https://example.com-QR.png");
    assert_eq!(&saved[0].png, artifact.png());
}

#[tokio::test]
async fn empty_text_never_reaches_the_encoder() {
    let app = app_with("");

    assert!(!app.view().generate_enabled);
    assert_eq!(app.generate().await, GenerateOutcome::Skipped);
    assert_eq!(app.generator().renderer().calls.load(Ordering::SeqCst), 0);

    let view = app.view();
    assert!(view.preview.is_none());
    assert_eq!(view.placeholder, Some(PREVIEW_PLACEHOLDER));
    assert!(app.download().unwrap().is_none());
    assert!(app.saver().saved().is_empty());
}

#[tokio::test]
async fn failed_generation_keeps_previous_preview() {
    let app = app_with("first");
    let GenerateOutcome::Generated(first) = app.generate().await else {
        panic!("first generation should succeed");
    };

    app.generator().renderer().fail.store(true, Ordering::SeqCst);
    app.set_text("second");
    assert_eq!(app.generate().await, GenerateOutcome::Failed);

    assert!(!app.generator().is_in_flight());
    let view = app.view();
    assert_eq!(view.state, "failed");
    assert_eq!(view.generate_label, GENERATE_LABEL);
    let preview = view.preview.expect("previous preview still shown");
    assert_eq!(preview.text, "first");
    assert_eq!(app.generator().artifact(), Some(first));
}

#[tokio::test]
async fn artifact_width_is_fixed_at_request_time() {
    let app = Arc::new(app_with("snapshot"));
    app.set_size(QrSize::new(300).unwrap());
    app.generator().renderer().hold.store(true, Ordering::SeqCst);

    let task = {
        let app = Arc::clone(&app);
        tokio::spawn(async move { app.generate().await })
    };

    app.generator().renderer().entered.notified().await;
    let view = app.view();
    assert!(!view.generate_enabled);
    assert_eq!(view.generate_label, GENERATING_LABEL);
    assert!(app.generator().is_in_flight());

    // Edits made while the call is outstanding do not leak into its result.
    app.set_size(QrSize::new(120).unwrap());
    app.set_foreground(Color::rgb(200, 0, 0));

    app.generator().renderer().release.notify_one();
    let GenerateOutcome::Generated(artifact) = task.await.unwrap() else {
        panic!("held generation should succeed");
    };

    assert!(!app.generator().is_in_flight());
    assert_eq!(artifact.width(), 300);
    assert_eq!(artifact.settings().size.px(), 300);
    assert_eq!(artifact.settings().foreground, Color::BLACK);
    assert_eq!(app.view().preview.unwrap().display_px, 120);
}

#[tokio::test]
async fn colors_reach_the_image() {
    let app = app_with("colors");
    app.set_foreground(Color::parse("#1e90ff").unwrap());
    app.set_background(Color::parse("#fafad2").unwrap());

    let GenerateOutcome::Generated(artifact) = app.generate().await else {
        panic!("generation should succeed");
    };

    let pixels = artifact.to_image().unwrap().to_rgba8();
    assert_eq!(pixels.get_pixel(0, 0).0, [0xfa, 0xfa, 0xd2, 0xff]);
    let dark = pixels.pixels().filter(|p| p.0 == [0x1e, 0x90, 0xff, 0xff]).count();
    assert!(dark > 0, "foreground color missing from image");
}
