//! State machine tests for the playback sequencer.
//!
//! A recording fake stands in for the speech engine; completions are fed
//! back into the player by hand, so every transition is exercised
//! deterministically without a runtime or real narration.

use std::sync::{Arc, Mutex};

use playback::{
    LanguageStatus, NarrationPart, Phase, Player, PlayerError, QueueMode, SpeechEngine,
    SpeechEvent, UtteranceId, Word,
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct SpokenUtterance {
    text: String,
    mode: QueueMode,
    utterance: UtteranceId,
}

#[derive(Default)]
struct EngineLog {
    spoken: Mutex<Vec<SpokenUtterance>>,
    stops: Mutex<usize>,
}

impl EngineLog {
    fn spoken(&self) -> Vec<SpokenUtterance> {
        self.spoken.lock().unwrap().clone()
    }

    fn last(&self) -> SpokenUtterance {
        self.spoken
            .lock()
            .unwrap()
            .last()
            .expect("nothing was spoken")
            .clone()
    }

    fn stops(&self) -> usize {
        *self.stops.lock().unwrap()
    }
}

/// Records every call and completes nothing on its own.
struct FakeEngine {
    log: Arc<EngineLog>,
    language: LanguageStatus,
}

impl SpeechEngine for FakeEngine {
    fn set_language(&mut self, _tag: &str) -> LanguageStatus {
        self.language
    }

    fn speak(&mut self, text: &str, mode: QueueMode, utterance: UtteranceId) {
        self.log.spoken.lock().unwrap().push(SpokenUtterance {
            text: text.to_string(),
            mode,
            utterance,
        });
    }

    fn stop(&mut self) {
        *self.log.stops.lock().unwrap() += 1;
    }

    fn shutdown(&mut self) {}
}

fn make_player(language: LanguageStatus) -> (Player, Arc<EngineLog>) {
    let log = Arc::new(EngineLog::default());
    let engine = FakeEngine {
        log: Arc::clone(&log),
        language,
    };
    let mut player = Player::new(Box::new(engine), "zh-CN");
    player.init_engine();
    (player, log)
}

fn review_words() -> Vec<Word> {
    vec![
        Word::new("abandon", "əˈbændən", "放弃"),
        Word::new("beautiful", "ˈbjuːtɪfl", "美丽的"),
        Word::new("challenge", "ˈtʃælɪndʒ", "挑战"),
    ]
}

#[test]
fn load_playlist_lands_paused_on_the_start_word() {
    let words = review_words();
    for start in 0..words.len() {
        let (mut player, log) = make_player(LanguageStatus::Available);
        player.load_playlist(words.clone(), start);

        let snapshot = player.snapshot();
        assert_eq!(snapshot.current_index, start);
        assert_eq!(snapshot.current_word.as_ref(), Some(&words[start]));
        assert!(!snapshot.playing);
        assert_eq!(snapshot.phase(), Phase::Paused);
        assert!(log.spoken().is_empty());
    }
}

#[test]
fn load_playlist_past_the_end_is_idle() {
    let (mut player, _) = make_player(LanguageStatus::Available);
    player.load_playlist(review_words(), 99);

    let snapshot = player.snapshot();
    assert_eq!(snapshot.current_index, 3);
    assert_eq!(snapshot.current_word, None);
    assert_eq!(snapshot.phase(), Phase::Idle);
}

#[test]
fn toggle_without_a_current_word_does_nothing() {
    let (mut player, log) = make_player(LanguageStatus::Available);
    player.toggle();

    assert!(!player.snapshot().playing);
    assert!(log.spoken().is_empty());

    player.load_playlist(Vec::new(), 0);
    player.toggle();

    assert!(!player.snapshot().playing);
    assert!(log.spoken().is_empty());
}

#[test]
fn the_last_narration_part_cannot_be_disabled() {
    let (mut player, _) = make_player(LanguageStatus::Available);
    assert!(player.set_narration(NarrationPart::Spelling, false).is_ok());
    assert!(player
        .set_narration(NarrationPart::Translation, false)
        .is_ok());

    let rejected = player.set_narration(NarrationPart::Word, false);
    assert_eq!(rejected, Err(PlayerError::LastNarrationPart));

    let snapshot = player.snapshot();
    assert!(snapshot.speak_word);
    assert!(!snapshot.speak_spelling);
    assert!(!snapshot.speak_translation);
}

#[test]
fn continuous_playback_stops_on_the_last_word() {
    let (mut player, log) = make_player(LanguageStatus::Available);
    player.load_playlist(review_words(), 0);
    player.toggle();
    assert!(player.snapshot().playing);

    for _ in 0..3 {
        player.handle_speech_event(SpeechEvent::Done(log.last().utterance));
    }

    let snapshot = player.snapshot();
    assert!(!snapshot.playing);
    assert_eq!(snapshot.current_index, 2);
    assert_eq!(snapshot.phase(), Phase::Paused);

    let spoken = log.spoken();
    assert_eq!(spoken.len(), 3);
    assert!(spoken[0].text.starts_with("abandon"));
    assert!(spoken[1].text.starts_with("beautiful"));
    assert!(spoken[2].text.starts_with("challenge"));
}

#[test]
fn next_at_the_last_word_changes_nothing() {
    let (mut player, log) = make_player(LanguageStatus::Available);
    player.load_playlist(review_words(), 2);
    player.toggle();
    let spoken_before = log.spoken().len();

    player.next();

    let snapshot = player.snapshot();
    assert_eq!(snapshot.current_index, 2);
    assert!(snapshot.playing, "playing is left as it was");
    assert_eq!(log.spoken().len(), spoken_before);
}

#[test]
fn next_at_the_last_word_stays_paused_too() {
    let (mut player, log) = make_player(LanguageStatus::Available);
    player.load_playlist(review_words(), 2);

    player.next();

    let snapshot = player.snapshot();
    assert_eq!(snapshot.current_index, 2);
    assert!(!snapshot.playing);
    assert!(log.spoken().is_empty());
}

#[test]
fn previous_at_the_first_word_changes_nothing() {
    let (mut player, log) = make_player(LanguageStatus::Available);
    player.load_playlist(review_words(), 0);

    player.previous();

    let snapshot = player.snapshot();
    assert_eq!(snapshot.current_index, 0);
    assert!(!snapshot.playing);
    assert!(log.spoken().is_empty());
}

#[test]
fn next_and_previous_resume_narration_even_when_paused() {
    let (mut player, log) = make_player(LanguageStatus::Available);
    player.load_playlist(review_words(), 1);

    player.next();
    let snapshot = player.snapshot();
    assert_eq!(snapshot.current_index, 2);
    assert!(snapshot.playing);
    assert!(log.last().text.starts_with("challenge"));

    player.previous();
    let snapshot = player.snapshot();
    assert_eq!(snapshot.current_index, 1);
    assert!(snapshot.playing);
    assert!(log.last().text.starts_with("beautiful"));
}

#[test]
fn utterance_composition_follows_the_enabled_parts() {
    let (mut player, log) = make_player(LanguageStatus::Available);
    player.load_playlist(vec![Word::new("cat", "kæt", "猫")], 0);

    player.toggle();
    assert_eq!(log.last().text, "cat c a t 猫");

    player.pause();
    player
        .set_narration(NarrationPart::Spelling, false)
        .unwrap();
    player
        .set_narration(NarrationPart::Translation, false)
        .unwrap();
    player.toggle();
    assert_eq!(log.last().text, "cat");
}

#[test]
fn a_stale_completion_after_pause_is_ignored() {
    let (mut player, log) = make_player(LanguageStatus::Available);
    player.load_playlist(review_words(), 0);
    player.toggle();
    let stale = log.last().utterance;

    player.pause();
    player.handle_speech_event(SpeechEvent::Done(stale));

    let snapshot = player.snapshot();
    assert_eq!(snapshot.current_index, 0);
    assert!(!snapshot.playing);
    assert_eq!(log.spoken().len(), 1);
    assert!(log.stops() >= 1);
}

#[test]
fn seek_without_resume_is_a_pure_cursor_move() {
    let (mut player, log) = make_player(LanguageStatus::Available);
    player.load_playlist(review_words(), 0);

    player.seek(2, None);

    let snapshot = player.snapshot();
    assert_eq!(snapshot.current_index, 2);
    assert_eq!(snapshot.current_word, Some(review_words()[2].clone()));
    assert!(!snapshot.playing);
    assert!(log.spoken().is_empty());
}

#[test]
fn seek_with_single_shot_resume_speaks_one_word_only() {
    let (mut player, log) = make_player(LanguageStatus::Available);
    player.load_playlist(review_words(), 0);

    player.seek(1, Some(false));
    assert!(player.snapshot().playing);
    assert!(log.last().text.starts_with("beautiful"));

    player.handle_speech_event(SpeechEvent::Done(log.last().utterance));

    let snapshot = player.snapshot();
    assert_eq!(snapshot.current_index, 1, "single shot does not advance");
    assert!(!snapshot.playing);
    assert_eq!(log.spoken().len(), 1);
}

#[test]
fn seek_with_continuous_resume_keeps_going() {
    let (mut player, log) = make_player(LanguageStatus::Available);
    player.load_playlist(review_words(), 0);

    player.seek(1, Some(true));
    player.handle_speech_event(SpeechEvent::Done(log.last().utterance));

    let snapshot = player.snapshot();
    assert_eq!(snapshot.current_index, 2);
    assert!(snapshot.playing);
    assert!(log.last().text.starts_with("challenge"));
}

#[test]
fn seek_past_the_end_keeps_the_current_word() {
    let (mut player, _) = make_player(LanguageStatus::Available);
    player.load_playlist(review_words(), 0);

    player.seek(99, Some(true));

    let snapshot = player.snapshot();
    assert_eq!(snapshot.current_index, 3);
    assert_eq!(snapshot.current_word, Some(review_words()[0].clone()));
    assert!(!snapshot.playing, "nothing to narrate past the end");
}

#[test]
fn engine_trouble_is_reported_once_then_narration_noops() {
    let log = Arc::new(EngineLog::default());
    let engine = FakeEngine {
        log: Arc::clone(&log),
        language: LanguageStatus::MissingData,
    };
    let mut player = Player::new(Box::new(engine), "zh-CN");
    let notices = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&notices);
    player.observe_notice(move |notice| sink.lock().unwrap().push(notice.clone()));

    player.init_engine();
    player.load_playlist(review_words(), 0);
    player.toggle();
    player.toggle();

    assert_eq!(notices.lock().unwrap().len(), 1);
    assert!(log.spoken().is_empty());
    assert!(!player.snapshot().playing);
}

#[test]
fn an_utterance_error_stops_playback() {
    let (mut player, log) = make_player(LanguageStatus::Available);
    let notices = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&notices);
    player.observe_notice(move |notice| sink.lock().unwrap().push(notice.clone()));
    player.load_playlist(review_words(), 0);
    player.toggle();
    let failing = log.last().utterance;

    player.handle_speech_event(SpeechEvent::Error(failing));
    assert!(!player.snapshot().playing);
    assert_eq!(notices.lock().unwrap().len(), 1);

    // A stale error for the same id must not disturb the restarted run,
    // and the notice is not repeated.
    player.toggle();
    player.handle_speech_event(SpeechEvent::Error(failing));
    assert!(player.snapshot().playing);
    assert_eq!(notices.lock().unwrap().len(), 1);
}

#[test]
fn adhoc_narration_leaves_the_cursor_alone() {
    let (mut player, log) = make_player(LanguageStatus::Available);
    player.load_playlist(review_words(), 1);

    player.speak_text("hello there", false);
    let call = log.last();
    assert_eq!(call.mode, QueueMode::Enqueue);
    assert_eq!(call.text, "hello there");

    player.handle_speech_event(SpeechEvent::Done(call.utterance));

    let snapshot = player.snapshot();
    assert_eq!(snapshot.current_index, 1);
    assert!(!snapshot.playing);
}

#[test]
fn adhoc_flush_interrupts_playlist_narration() {
    let (mut player, log) = make_player(LanguageStatus::Available);
    player.load_playlist(review_words(), 0);
    player.toggle();
    let interrupted = log.last().utterance;

    player.speak_text("好的", true);
    assert!(!player.snapshot().playing);
    assert_eq!(log.last().mode, QueueMode::Flush);

    // The flushed playlist utterance completing late must not resume.
    player.handle_speech_event(SpeechEvent::Done(interrupted));
    let snapshot = player.snapshot();
    assert_eq!(snapshot.current_index, 0);
    assert!(!snapshot.playing);
}

#[test]
fn observers_are_notified_in_mutation_order() {
    let (mut player, _) = make_player(LanguageStatus::Available);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    player.observe_current_index(move |index| sink.lock().unwrap().push(format!("index:{index}")));
    let sink = Arc::clone(&seen);
    player.observe_current_word(move |word| {
        let text = word.as_ref().map(|w| w.text.as_str()).unwrap_or("-");
        sink.lock().unwrap().push(format!("word:{text}"));
    });

    player.load_playlist(review_words(), 1);

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["index:1".to_string(), "word:beautiful".to_string()]
    );
}
