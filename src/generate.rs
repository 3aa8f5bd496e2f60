//! Generation workflow: one encoder call at a time, tracked as a state machine
//!
//! ```text
//! Idle ──generate──▶ InFlight ──ok──▶ Ready(artifact)
//!   ▲                   │                   │
//!   │                   └──err──▶ Failed ◀──┘ (via InFlight)
//! ```
//!
//! A new request re-enters `InFlight` from any state except `InFlight` itself.
//! The last good artifact rides along through `InFlight` and `Failed` so the
//! preview keeps showing it until a newer one replaces it.

use crate::form::FormSettings;
use crate::qr::{Artifact, EncodeRequest, QrRenderer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Where the generator currently is
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GenerationState {
    /// Nothing generated yet
    #[default]
    Idle,
    /// An encoder call is outstanding
    InFlight {
        /// Artifact shown before this request, if any
        previous: Option<Artifact>,
    },
    /// Last request succeeded
    Ready(Artifact),
    /// Last request failed; behaves like `Idle` for display purposes
    Failed {
        /// Artifact shown before the failed request, if any
        previous: Option<Artifact>,
    },
}

impl GenerationState {
    /// Artifact to display, if any.
    pub fn preview(&self) -> Option<&Artifact> {
        match self {
            Self::Idle => None,
            Self::Ready(artifact) => Some(artifact),
            Self::InFlight { previous } | Self::Failed { previous } => previous.as_ref(),
        }
    }

    /// Whether an encoder call is outstanding.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::InFlight { .. })
    }

    /// Short lowercase name, used in logs and JSON output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::InFlight { .. } => "in_flight",
            Self::Ready(_) => "ready",
            Self::Failed { .. } => "failed",
        }
    }

    fn into_preview(self) -> Option<Artifact> {
        match self {
            Self::Idle => None,
            Self::Ready(artifact) => Some(artifact),
            Self::InFlight { previous } | Self::Failed { previous } => previous,
        }
    }
}

/// Result of a single `generate` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// Text was empty; nothing happened
    Skipped,
    /// Another generation was still running; nothing happened
    Busy,
    /// A new artifact replaced the preview
    Generated(Artifact),
    /// The encoder rejected the request; the error was logged
    Failed,
}

/// Runs the encoder collaborator behind a single-flight guard
pub struct Generator<R> {
    renderer: R,
    in_flight: AtomicBool,
    state: watch::Sender<GenerationState>,
}

impl<R: QrRenderer> Generator<R> {
    /// Create an idle generator around `renderer`.
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            in_flight: AtomicBool::new(false),
            state: watch::Sender::new(GenerationState::Idle),
        }
    }

    /// Generate an artifact from a settings snapshot.
    ///
    /// Empty text and overlapping calls return without touching the encoder.
    /// Encoder failures are logged and reported as [`GenerateOutcome::Failed`];
    /// they never surface as errors.
    pub async fn generate(&self, settings: FormSettings) -> GenerateOutcome {
        if !settings.has_text() {
            debug!("Ignoring generate request with empty text");
            return GenerateOutcome::Skipped;
        }

        let Some(_guard) = InFlightGuard::acquire(self) else {
            debug!("Generate request ignored while another is in flight");
            return GenerateOutcome::Busy;
        };

        self.state.send_modify(|state| {
            let previous = std::mem::take(state).into_preview();
            *state = GenerationState::InFlight { previous };
        });

        let request = EncodeRequest::from_settings(&settings);
        let started = Instant::now();

        match self.renderer.render(&request).await {
            Ok(image) => {
                let artifact = Artifact::new(image, settings);
                info!(
                    width = artifact.width(),
                    height = artifact.height(),
                    bytes = artifact.png().len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Generated QR code"
                );
                self.state
                    .send_replace(GenerationState::Ready(artifact.clone()));
                GenerateOutcome::Generated(artifact)
            }
            Err(err) => {
                error!(error = %err, "Error generating QR code");
                self.settle_failed();
                GenerateOutcome::Failed
            }
        }
    }

    /// Whether an encoder call is outstanding.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> GenerationState {
        self.state.borrow().clone()
    }

    /// Latest artifact, kept through later in-flight and failed requests.
    pub fn artifact(&self) -> Option<Artifact> {
        self.state.borrow().preview().cloned()
    }

    /// Receive every state transition.
    pub fn subscribe(&self) -> watch::Receiver<GenerationState> {
        self.state.subscribe()
    }

    /// The wrapped encoder collaborator
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    fn settle_failed(&self) {
        self.state.send_if_modified(|state| {
            if !state.is_in_flight() {
                return false;
            }
            let previous = std::mem::take(state).into_preview();
            *state = GenerationState::Failed { previous };
            true
        });
    }
}

/// Holds the in-flight flag; dropping it releases the flag whatever the outcome.
struct InFlightGuard<'a, R: QrRenderer> {
    generator: &'a Generator<R>,
}

impl<'a, R: QrRenderer> InFlightGuard<'a, R> {
    fn acquire(generator: &'a Generator<R>) -> Option<Self> {
        generator
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { generator })
    }
}

impl<R: QrRenderer> Drop for InFlightGuard<'_, R> {
    fn drop(&mut self) {
        // A cancelled or panicking call never reached Ready/Failed.
        self.generator.settle_failed();
        self.generator.in_flight.store(false, Ordering::Release);
    }
}
