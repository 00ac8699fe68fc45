//! Single-stream playback control.
//!
//! One [`SpeechPlayer`] owns at most one playback at a time. Pressing play
//! while something is loading or speaking stops it instead of starting a
//! second stream.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;

use super::{AudioOutput, SpeechAdapter, SpeechOutcome};

/// Where a [`SpeechPlayer`] is in its play/stop cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing queued or playing.
    Idle,
    /// Waiting for synthesis.
    Loading,
    /// Audio or the local voice is playing.
    Speaking,
}

/// What a [`SpeechPlayer::toggle`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    /// A new playback was started.
    Started,
    /// The active playback was cancelled.
    Stopped,
}

#[derive(Debug, Default)]
struct PlayerInner {
    cancel: Option<CancellationToken>,
    generation: u64,
    /// Last synthesized `(text, locale)` and its outcome.
    cached: Option<(String, String, SpeechOutcome)>,
}

/// Play/stop toggle over a [`SpeechAdapter`] and an [`AudioOutput`].
///
/// At most one playback is active. Toggling while loading or speaking
/// cancels it; toggling while idle starts a new one, replaying cached audio
/// when the text and locale match the previous request.
#[derive(Debug)]
pub struct SpeechPlayer {
    adapter: Arc<SpeechAdapter>,
    output: Arc<dyn AudioOutput>,
    inner: Mutex<PlayerInner>,
    state: watch::Sender<PlaybackState>,
}

impl SpeechPlayer {
    pub fn new(adapter: Arc<SpeechAdapter>, output: Arc<dyn AudioOutput>) -> Arc<Self> {
        let (state, _) = watch::channel(PlaybackState::Idle);
        Arc::new(Self {
            adapter,
            output,
            inner: Mutex::new(PlayerInner::default()),
            state,
        })
    }

    pub fn state(&self) -> PlaybackState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state.subscribe()
    }

    /// Resolves once nothing is loading or playing.
    pub async fn wait_until_idle(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|s| *s == PlaybackState::Idle).await;
    }

    /// Start reading `text` aloud, or stop the current playback.
    pub async fn toggle(self: &Arc<Self>, text: &str, locale: &str) -> ToggleAction {
        let mut inner = self.inner.lock().await;

        if let Some(cancel) = inner.cancel.take() {
            cancel.cancel();
            inner.generation += 1;
            self.state.send_replace(PlaybackState::Idle);
            tracing::info!(name: "speech.playback.stopped", "Playback stopped");
            return ToggleAction::Stopped;
        }

        inner.generation += 1;
        let generation = inner.generation;
        let cancel = CancellationToken::new();
        inner.cancel = Some(cancel.clone());
        let cached = inner
            .cached
            .as_ref()
            .filter(|(t, l, _)| t == text && l == locale)
            .map(|(_, _, outcome)| outcome.clone());
        self.state.send_replace(PlaybackState::Loading);
        drop(inner);

        let player = Arc::clone(self);
        let text = text.to_string();
        let locale = locale.to_string();
        tokio::spawn(async move {
            player.run(generation, cancel, text, locale, cached).await;
        });
        ToggleAction::Started
    }

    async fn run(
        &self,
        generation: u64,
        cancel: CancellationToken,
        text: String,
        locale: String,
        cached: Option<SpeechOutcome>,
    ) {
        let outcome = match cached {
            Some(outcome) => outcome,
            None => {
                let outcome = tokio::select! {
                    outcome = self.adapter.speak(&text, &locale) => outcome,
                    () = cancel.cancelled() => return,
                };
                self.inner.lock().await.cached = Some((text, locale, outcome.clone()));
                outcome
            }
        };

        if !self.advance(generation, PlaybackState::Speaking).await {
            return;
        }

        tracing::info!(
            name: "speech.playback.started",
            remote = outcome.is_remote(),
            "Playback started"
        );
        if let Err(err) = self.output.play(&outcome, cancel).await {
            tracing::warn!(name: "speech.playback.failed", error = %err, "Playback failed");
        }

        let mut inner = self.inner.lock().await;
        if inner.generation == generation {
            inner.cancel = None;
            self.state.send_replace(PlaybackState::Idle);
        }
    }

    /// Move to `state` if this playback is still the current one.
    async fn advance(&self, generation: u64, state: PlaybackState) -> bool {
        let inner = self.inner.lock().await;
        if inner.generation != generation {
            return false;
        }
        self.state.send_replace(state);
        true
    }
}
