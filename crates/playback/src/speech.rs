//! Speech output port: the narrow surface the player drives to narrate text.
//!
//! Engines complete asynchronously. They report per-utterance progress by
//! sending [`SpeechEvent`]s into the channel handed to them at construction;
//! the session loop owning the player feeds those events back into it. An
//! engine never calls into the player directly.

use tokio::sync::mpsc;

/// Identity of one submitted utterance, unique within a player session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtteranceId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueMode {
    /// Interrupt the active utterance and drop anything pending.
    Flush,
    /// Append behind whatever is already queued.
    Enqueue,
}

/// Outcome of selecting a narration language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageStatus {
    Available,
    MissingData,
    Unsupported,
}

/// Progress signals for a submitted utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechEvent {
    Started(UtteranceId),
    Done(UtteranceId),
    Error(UtteranceId),
}

pub trait SpeechEngine: Send {
    /// Selects the narration language, e.g. `"zh-CN"`.
    fn set_language(&mut self, tag: &str) -> LanguageStatus;

    /// Submits one utterance. Completion arrives later as a [`SpeechEvent`].
    fn speak(&mut self, text: &str, mode: QueueMode, utterance: UtteranceId);

    /// Stops the active utterance and clears the pending queue. No events are
    /// delivered for utterances discarded this way.
    fn stop(&mut self);

    /// Releases engine resources. The engine is unusable afterwards.
    fn shutdown(&mut self);
}

/// An engine that narrates nothing and completes every utterance at once.
///
/// Used when no narration command is configured, so the player still steps
/// through playlists with the same event flow a real engine produces.
pub struct SilentEngine {
    events: mpsc::UnboundedSender<SpeechEvent>,
}

impl SilentEngine {
    pub fn new(events: mpsc::UnboundedSender<SpeechEvent>) -> Self {
        Self { events }
    }
}

impl SpeechEngine for SilentEngine {
    fn set_language(&mut self, _tag: &str) -> LanguageStatus {
        LanguageStatus::Available
    }

    fn speak(&mut self, _text: &str, _mode: QueueMode, utterance: UtteranceId) {
        let _ = self.events.send(SpeechEvent::Started(utterance));
        let _ = self.events.send(SpeechEvent::Done(utterance));
    }

    fn stop(&mut self) {}

    fn shutdown(&mut self) {}
}
