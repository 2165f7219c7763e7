//! The session task that owns a [`Player`].
//!
//! Exactly one task mutates player state: it drains command messages from
//! the handles and completion events from the speech engine, so engine
//! callbacks never touch the player from their own thread. Handle clones are
//! the session's owner count; dropping the last one closes the command
//! channel, the loop exits, and the speech engine is released right there,
//! not at some collector's leisure.

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::player::{NarrationPart, PlaybackSnapshot, Player, PlayerError};
use crate::playlist::Word;
use crate::speech::SpeechEvent;

enum Command {
    LoadPlaylist {
        words: Vec<Word>,
        start_index: usize,
    },
    Toggle,
    Pause,
    Seek {
        index: usize,
        resume: Option<bool>,
    },
    Next,
    Previous,
    SetNarration {
        part: NarrationPart,
        enabled: bool,
        reply: oneshot::Sender<Result<(), PlayerError>>,
    },
    Speak {
        text: String,
        flush: bool,
    },
    Snapshot {
        reply: oneshot::Sender<PlaybackSnapshot>,
    },
}

/// Moves the player onto its own task and returns the first handle to it.
///
/// Observers must already be wired: the engine language is selected inside
/// the task, so an engine-trouble notice lands on subscribers registered
/// before this call.
pub fn spawn(mut player: Player, mut events: mpsc::UnboundedReceiver<SpeechEvent>) -> PlayerHandle {
    let (commands, mut inbox) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        player.init_engine();
        loop {
            tokio::select! {
                command = inbox.recv() => {
                    let Some(command) = command else { break };
                    apply(&mut player, command);
                }
                Some(event) = events.recv() => player.handle_speech_event(event),
            }
        }
        player.shutdown();
        debug!("player session ended");
    });
    PlayerHandle { commands }
}

fn apply(player: &mut Player, command: Command) {
    match command {
        Command::LoadPlaylist { words, start_index } => player.load_playlist(words, start_index),
        Command::Toggle => player.toggle(),
        Command::Pause => player.pause(),
        Command::Seek { index, resume } => player.seek(index, resume),
        Command::Next => player.next(),
        Command::Previous => player.previous(),
        Command::SetNarration {
            part,
            enabled,
            reply,
        } => {
            let _ = reply.send(player.set_narration(part, enabled));
        }
        Command::Speak { text, flush } => player.speak_text(&text, flush),
        Command::Snapshot { reply } => {
            let _ = reply.send(player.snapshot());
        }
    }
}

/// Cloneable front door to a player session. Every surface that can drive
/// playback holds one; transport commands are fire-and-forget.
#[derive(Clone)]
pub struct PlayerHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl PlayerHandle {
    pub fn load_playlist(&self, words: Vec<Word>, start_index: usize) {
        self.send(Command::LoadPlaylist { words, start_index });
    }

    pub fn toggle(&self) {
        self.send(Command::Toggle);
    }

    pub fn pause(&self) {
        self.send(Command::Pause);
    }

    pub fn seek(&self, index: usize, resume: Option<bool>) {
        self.send(Command::Seek { index, resume });
    }

    pub fn next(&self) {
        self.send(Command::Next);
    }

    pub fn previous(&self) {
        self.send(Command::Previous);
    }

    pub fn speak(&self, text: impl Into<String>, flush: bool) {
        self.send(Command::Speak {
            text: text.into(),
            flush,
        });
    }

    /// Waits for the player's verdict so the caller can revert a control
    /// when the change is rejected.
    pub async fn set_narration(
        &self,
        part: NarrationPart,
        enabled: bool,
    ) -> Result<(), PlayerError> {
        let (reply, verdict) = oneshot::channel();
        self.commands
            .send(Command::SetNarration {
                part,
                enabled,
                reply,
            })
            .map_err(|_| PlayerError::SessionClosed)?;
        verdict.await.map_err(|_| PlayerError::SessionClosed)?
    }

    pub async fn snapshot(&self) -> Result<PlaybackSnapshot, PlayerError> {
        let (reply, snapshot) = oneshot::channel();
        self.commands
            .send(Command::Snapshot { reply })
            .map_err(|_| PlayerError::SessionClosed)?;
        snapshot.await.map_err(|_| PlayerError::SessionClosed)
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("player session is gone, command dropped");
        }
    }
}
