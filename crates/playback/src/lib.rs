mod command_engine;
mod observable;
mod player;
mod playlist;
pub mod session;
mod speech;

pub use command_engine::{CommandEngine, LANGUAGE_PLACEHOLDER};
pub use observable::{Notifier, Observable, SubscriptionId};
pub use player::{NarrationPart, Phase, PlaybackSnapshot, Player, PlayerError};
pub use playlist::{Playlist, Word};
pub use session::PlayerHandle;
pub use speech::{LanguageStatus, QueueMode, SilentEngine, SpeechEngine, SpeechEvent, UtteranceId};
