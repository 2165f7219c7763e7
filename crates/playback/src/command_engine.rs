//! Speech engine backed by an external narration command (espeak-style).
//!
//! Each utterance runs the configured program once with the text as the last
//! argument. A worker task owns the pending queue and the active child
//! process; the engine itself only posts messages to it, so `speak`/`stop`
//! stay non-blocking.

use std::collections::VecDeque;
use std::io;
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::speech::{LanguageStatus, QueueMode, SpeechEngine, SpeechEvent, UtteranceId};

/// Replaced with the language tag in every configured argument.
pub const LANGUAGE_PLACEHOLDER: &str = "{lang}";

pub struct CommandEngine {
    program: String,
    args: Vec<String>,
    events: mpsc::UnboundedSender<SpeechEvent>,
    worker: Option<mpsc::UnboundedSender<WorkerMessage>>,
}

impl CommandEngine {
    /// `program` and `args` come from the narration command line, split on
    /// whitespace; `{lang}` in an argument is substituted by `set_language`.
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        events: mpsc::UnboundedSender<SpeechEvent>,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            events,
            worker: None,
        }
    }
}

impl SpeechEngine for CommandEngine {
    fn set_language(&mut self, tag: &str) -> LanguageStatus {
        if self.program.is_empty() {
            return LanguageStatus::Unsupported;
        }
        if let Some(previous) = self.worker.take() {
            let _ = previous.send(WorkerMessage::Shutdown);
        }
        let args = self
            .args
            .iter()
            .map(|arg| arg.replace(LANGUAGE_PLACEHOLDER, tag))
            .collect();
        self.worker = Some(spawn_worker(
            self.program.clone(),
            args,
            self.events.clone(),
        ));
        // A subprocess engine cannot probe voice-data availability up front;
        // a broken command surfaces as an Error event on the first utterance.
        LanguageStatus::Available
    }

    fn speak(&mut self, text: &str, mode: QueueMode, utterance: UtteranceId) {
        match &self.worker {
            Some(worker) => {
                let _ = worker.send(WorkerMessage::Speak {
                    text: text.to_string(),
                    mode,
                    utterance,
                });
            }
            None => {
                let _ = self.events.send(SpeechEvent::Error(utterance));
            }
        }
    }

    fn stop(&mut self) {
        if let Some(worker) = &self.worker {
            let _ = worker.send(WorkerMessage::Stop);
        }
    }

    fn shutdown(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.send(WorkerMessage::Shutdown);
        }
    }
}

enum WorkerMessage {
    Speak {
        text: String,
        mode: QueueMode,
        utterance: UtteranceId,
    },
    Stop,
    Shutdown,
}

fn spawn_worker(
    program: String,
    args: Vec<String>,
    events: mpsc::UnboundedSender<SpeechEvent>,
) -> mpsc::UnboundedSender<WorkerMessage> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut queue: VecDeque<(String, UtteranceId)> = VecDeque::new();
        // Children spawn with kill_on_drop, so discarding `active` both stops
        // the narration and suppresses any completion event for it.
        let mut active: Option<(UtteranceId, Child)> = None;
        loop {
            if active.is_none() {
                while let Some((text, utterance)) = queue.pop_front() {
                    match start_narration(&program, &args, &text) {
                        Ok(child) => {
                            let _ = events.send(SpeechEvent::Started(utterance));
                            active = Some((utterance, child));
                            break;
                        }
                        Err(error) => {
                            warn!(%error, %program, "failed to start the narration command");
                            let _ = events.send(SpeechEvent::Error(utterance));
                        }
                    }
                }
            }
            tokio::select! {
                message = rx.recv() => match message {
                    Some(WorkerMessage::Speak { text, mode, utterance }) => {
                        if mode == QueueMode::Flush {
                            active = None;
                            queue.clear();
                        }
                        queue.push_back((text, utterance));
                    }
                    Some(WorkerMessage::Stop) => {
                        active = None;
                        queue.clear();
                    }
                    Some(WorkerMessage::Shutdown) | None => break,
                },
                status = wait_active(&mut active), if active.is_some() => {
                    if let Some((utterance, _)) = active.take() {
                        let event = match status {
                            Ok(status) if status.success() => SpeechEvent::Done(utterance),
                            Ok(status) => {
                                warn!(?status, "narration command exited abnormally");
                                SpeechEvent::Error(utterance)
                            }
                            Err(error) => {
                                warn!(%error, "lost track of the narration command");
                                SpeechEvent::Error(utterance)
                            }
                        };
                        let _ = events.send(event);
                    }
                }
            }
        }
        debug!("narration worker stopped");
    });
    tx
}

async fn wait_active(active: &mut Option<(UtteranceId, Child)>) -> io::Result<ExitStatus> {
    match active {
        Some((_, child)) => child.wait().await,
        None => std::future::pending().await,
    }
}

fn start_narration(program: &str, args: &[String], text: &str) -> io::Result<Child> {
    Command::new(program)
        .args(args)
        .arg(text)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
}
