//! The playback sequencer: walks a word list, narrating each word through
//! the speech engine and advancing when the engine reports completion.
//!
//! The player is single-owner state. It is driven from one task (see
//! [`crate::session`]); engine completions reach it as [`SpeechEvent`]
//! messages, never as direct calls from another thread.

use thiserror::Error;
use tracing::{debug, warn};

use crate::observable::{Notifier, Observable};
use crate::playlist::Word;
use crate::speech::{LanguageStatus, QueueMode, SpeechEngine, SpeechEvent, UtteranceId};

/// One of the three independently toggleable narration components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrationPart {
    Word,
    Spelling,
    Translation,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PlayerError {
    #[error("at least one narration part must stay enabled")]
    LastNarrationPart,
    #[error("the player session is closed")]
    SessionClosed,
}

/// Where the sequencer currently stands. `Speaking` also covers the gap
/// between one utterance finishing and the next one starting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Paused,
    Speaking,
}

/// Read model of the player state at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    pub playlist: Vec<Word>,
    pub current_index: usize,
    pub current_word: Option<Word>,
    pub playing: bool,
    pub speak_word: bool,
    pub speak_spelling: bool,
    pub speak_translation: bool,
}

impl PlaybackSnapshot {
    pub fn phase(&self) -> Phase {
        if self.playing {
            Phase::Speaking
        } else if self.current_word.is_some() {
            Phase::Paused
        } else {
            Phase::Idle
        }
    }
}

struct InFlight {
    utterance: UtteranceId,
    continuous: bool,
}

pub struct Player {
    engine: Box<dyn SpeechEngine>,
    language: String,
    engine_ready: bool,
    trouble_reported: bool,
    playlist: Observable<Vec<Word>>,
    current_index: Observable<usize>,
    current_word: Observable<Option<Word>>,
    playing: Observable<bool>,
    speak_word: bool,
    speak_spelling: bool,
    speak_translation: bool,
    notices: Notifier<String>,
    utterance_counter: u64,
    in_flight: Option<InFlight>,
}

impl Player {
    /// All three narration parts start enabled; `init_engine` must run before
    /// the first utterance can be produced.
    pub fn new(engine: Box<dyn SpeechEngine>, language: impl Into<String>) -> Self {
        Self {
            engine,
            language: language.into(),
            engine_ready: false,
            trouble_reported: false,
            playlist: Observable::new(Vec::new()),
            current_index: Observable::new(0),
            current_word: Observable::new(None),
            playing: Observable::new(false),
            speak_word: true,
            speak_spelling: true,
            speak_translation: true,
            notices: Notifier::new(),
            utterance_counter: 0,
            in_flight: None,
        }
    }

    /// Selects the narration language on the engine. A failure is surfaced
    /// once as a notice; narration then stays silently off.
    pub fn init_engine(&mut self) {
        match self.engine.set_language(&self.language) {
            LanguageStatus::Available => {
                self.engine_ready = true;
                debug!(language = %self.language, "speech engine ready");
            }
            LanguageStatus::MissingData => {
                warn!(language = %self.language, "voice data missing");
                self.report_trouble_once(&format!(
                    "voice data for {} is not installed; narration is off",
                    self.language
                ));
            }
            LanguageStatus::Unsupported => {
                warn!(language = %self.language, "language unsupported");
                self.report_trouble_once(&format!(
                    "narration does not support {}; narration is off",
                    self.language
                ));
            }
        }
    }

    /// Replaces the playlist. Any running narration stops; the player ends up
    /// paused on `words[start_index]`, or idle when the index is past the end.
    pub fn load_playlist(&mut self, words: Vec<Word>, start_index: usize) {
        self.stop_speech();
        self.set_playing(false);
        let index = start_index.min(words.len());
        let word = words.get(index).cloned();
        self.playlist.set(words);
        self.current_index.set(index);
        self.current_word.set(word);
        debug!(index, "playlist loaded");
    }

    /// Play/pause. Starting narrates continuously from the current word;
    /// without a current word this is a no-op.
    pub fn toggle(&mut self) {
        if *self.playing.get() {
            self.pause();
        } else {
            self.start_playback(true);
        }
    }

    /// Stops narration immediately, mid-utterance included. Idempotent.
    pub fn pause(&mut self) {
        self.stop_speech();
        self.set_playing(false);
    }

    /// Moves the cursor to `index` (clamped past the end at most). `resume`
    /// decides what happens there: `None` leaves the player paused,
    /// `Some(true)` narrates continuously onward, `Some(false)` narrates that
    /// one word only.
    pub fn seek(&mut self, index: usize, resume: Option<bool>) {
        self.stop_speech();
        self.set_playing(false);
        let index = index.min(self.playlist.get().len());
        self.current_index.set(index);
        if let Some(word) = self.playlist.get().get(index).cloned() {
            self.current_word.set(Some(word));
            if let Some(continuous) = resume {
                self.start_playback(continuous);
            }
        }
        // Past the end there is nothing to show: the current word is left
        // exactly as it was.
    }

    /// Steps to the following word and resumes continuous narration, paused
    /// or not. At the last word the call changes nothing.
    pub fn next(&mut self) {
        let index = *self.current_index.get();
        if index + 1 >= self.playlist.get().len() {
            return;
        }
        self.jump_and_resume(index + 1);
    }

    /// Steps to the preceding word and resumes continuous narration, paused
    /// or not. At the first word the call changes nothing.
    pub fn previous(&mut self) {
        let index = *self.current_index.get();
        if index == 0 {
            return;
        }
        self.jump_and_resume(index - 1);
    }

    /// Enables or disables one narration part. Disabling the last enabled
    /// part is rejected and leaves every toggle as it was; a change applies
    /// from the next composed utterance on.
    pub fn set_narration(&mut self, part: NarrationPart, enabled: bool) -> Result<(), PlayerError> {
        if !enabled && !self.narration_remains_without(part) {
            return Err(PlayerError::LastNarrationPart);
        }
        match part {
            NarrationPart::Word => self.speak_word = enabled,
            NarrationPart::Spelling => self.speak_spelling = enabled,
            NarrationPart::Translation => self.speak_translation = enabled,
        }
        Ok(())
    }

    /// Ad-hoc narration outside the playlist. `flush` pauses playlist
    /// playback and replaces queued speech; otherwise the text queues up
    /// behind whatever is pending. Never advances the cursor.
    pub fn speak_text(&mut self, text: &str, flush: bool) {
        if flush {
            self.pause();
        }
        if !self.engine_ready {
            return;
        }
        self.utterance_counter += 1;
        let utterance = UtteranceId(self.utterance_counter);
        let mode = if flush { QueueMode::Flush } else { QueueMode::Enqueue };
        debug!(utterance = utterance.0, flush, "ad-hoc narration");
        self.engine.speak(text, mode, utterance);
    }

    /// Feeds one engine completion back into the state machine. Events for
    /// utterances that are no longer in flight are ignored, so a `Done`
    /// racing a `pause` or `seek` cannot advance the cursor afterwards.
    pub fn handle_speech_event(&mut self, event: SpeechEvent) {
        match event {
            SpeechEvent::Started(utterance) => {
                debug!(utterance = utterance.0, "utterance started");
            }
            SpeechEvent::Done(utterance) => self.utterance_done(utterance),
            SpeechEvent::Error(utterance) => self.utterance_error(utterance),
        }
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            playlist: self.playlist.get().clone(),
            current_index: *self.current_index.get(),
            current_word: self.current_word.get().clone(),
            playing: *self.playing.get(),
            speak_word: self.speak_word,
            speak_spelling: self.speak_spelling,
            speak_translation: self.speak_translation,
        }
    }

    pub fn phase(&self) -> Phase {
        if *self.playing.get() {
            Phase::Speaking
        } else if self.current_word.get().is_some() {
            Phase::Paused
        } else {
            Phase::Idle
        }
    }

    /// Stops the engine and releases it. The session loop calls this once,
    /// after the last handle is gone.
    pub fn shutdown(&mut self) {
        self.engine.stop();
        self.engine.shutdown();
        debug!("speech engine released");
    }
}

/// Subscription points for the presentation layer. Listeners run
/// synchronously on the owning task, in mutation order.
impl Player {
    pub fn observe_playlist(&mut self, listener: impl FnMut(&Vec<Word>) + Send + 'static) {
        self.playlist.subscribe(listener);
    }

    pub fn observe_current_index(&mut self, listener: impl FnMut(&usize) + Send + 'static) {
        self.current_index.subscribe(listener);
    }

    pub fn observe_current_word(&mut self, listener: impl FnMut(&Option<Word>) + Send + 'static) {
        self.current_word.subscribe(listener);
    }

    pub fn observe_playing(&mut self, listener: impl FnMut(&bool) + Send + 'static) {
        self.playing.subscribe(listener);
    }

    /// One-shot user-visible notices, currently only speech engine trouble.
    pub fn observe_notice(&mut self, listener: impl FnMut(&String) + Send + 'static) {
        self.notices.subscribe(listener);
    }
}

impl Player {
    fn start_playback(&mut self, continuous: bool) {
        if !self.engine_ready || self.current_word.get().is_none() {
            return;
        }
        self.set_playing(true);
        self.speak_current(continuous);
    }

    fn speak_current(&mut self, continuous: bool) {
        let Some(word) = self.current_word.get().clone() else {
            self.set_playing(false);
            return;
        };
        let text = self.compose_utterance(&word);
        self.utterance_counter += 1;
        let utterance = UtteranceId(self.utterance_counter);
        self.in_flight = Some(InFlight {
            utterance,
            continuous,
        });
        debug!(utterance = utterance.0, continuous, text = %text, "narrating");
        self.engine.speak(&text, QueueMode::Flush, utterance);
    }

    /// Joins the enabled parts with single spaces: word text, letters one by
    /// one, then the meaning. "cat" / "猫" with everything on becomes
    /// "cat c a t 猫".
    fn compose_utterance(&self, word: &Word) -> String {
        let mut parts: Vec<String> = Vec::new();
        if self.speak_word && !word.text.is_empty() {
            parts.push(word.text.clone());
        }
        if self.speak_spelling {
            let letters: Vec<String> = word
                .text
                .chars()
                .filter(|letter| !letter.is_whitespace())
                .map(|letter| letter.to_string())
                .collect();
            if !letters.is_empty() {
                parts.push(letters.join(" "));
            }
        }
        if self.speak_translation && !word.meaning.is_empty() {
            parts.push(word.meaning.clone());
        }
        parts.join(" ")
    }

    fn utterance_done(&mut self, utterance: UtteranceId) {
        let Some(in_flight) = &self.in_flight else {
            return;
        };
        if in_flight.utterance != utterance {
            debug!(utterance = utterance.0, "ignoring a stale completion");
            return;
        }
        let continuous = in_flight.continuous;
        self.in_flight = None;
        let next_index = *self.current_index.get() + 1;
        let next_word = if continuous {
            self.playlist.get().get(next_index).cloned()
        } else {
            None
        };
        match next_word {
            Some(word) => {
                self.current_index.set(next_index);
                self.current_word.set(Some(word));
                self.speak_current(true);
            }
            None => self.set_playing(false),
        }
    }

    fn utterance_error(&mut self, utterance: UtteranceId) {
        match &self.in_flight {
            Some(in_flight) if in_flight.utterance == utterance => {
                self.in_flight = None;
                self.set_playing(false);
                warn!(utterance = utterance.0, "utterance failed, stopping playback");
                self.report_trouble_once("narration failed; playback stopped");
            }
            _ => debug!(utterance = utterance.0, "ignoring an error for a stale utterance"),
        }
    }

    fn jump_and_resume(&mut self, index: usize) {
        self.stop_speech();
        let word = self.playlist.get().get(index).cloned();
        self.current_index.set(index);
        self.current_word.set(word);
        self.start_playback(true);
    }

    fn narration_remains_without(&self, part: NarrationPart) -> bool {
        match part {
            NarrationPart::Word => self.speak_spelling || self.speak_translation,
            NarrationPart::Spelling => self.speak_word || self.speak_translation,
            NarrationPart::Translation => self.speak_word || self.speak_spelling,
        }
    }

    fn stop_speech(&mut self) {
        self.in_flight = None;
        self.engine.stop();
    }

    fn set_playing(&mut self, playing: bool) {
        if *self.playing.get() != playing {
            self.playing.set(playing);
        }
    }

    fn report_trouble_once(&mut self, message: &str) {
        if self.trouble_reported {
            return;
        }
        self.trouble_reported = true;
        self.notices.notify(&message.to_string());
    }
}
