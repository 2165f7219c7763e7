use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::storage::Storage;

pub const LYRICS_KEY: &str = "lyrics";

/// A song line that anchors a word in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricSnippet {
    pub word_id: i64,
    pub word: String,
    pub lyric: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

#[derive(Clone)]
pub struct LyricStore {
    storage: Storage,
}

impl LyricStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// The snippet for a word, preferring user entries over the built-ins.
    pub async fn get(&self, word_id: i64) -> anyhow::Result<Option<LyricSnippet>> {
        let stored = self.load().await?;
        if let Some(snippet) = stored.get(&word_id) {
            return Ok(Some(snippet.clone()));
        }
        Ok(builtin_lyric(word_id))
    }

    pub async fn set(&self, snippet: LyricSnippet) -> anyhow::Result<()> {
        let mut stored = self.load().await?;
        stored.insert(snippet.word_id, snippet);
        self.storage.write_json(LYRICS_KEY, &stored).await
    }

    async fn load(&self) -> anyhow::Result<BTreeMap<i64, LyricSnippet>> {
        Ok(self.storage.read_json(LYRICS_KEY).await?.unwrap_or_default())
    }
}

/// Lines that ship with the app.
fn builtin_lyric(word_id: i64) -> Option<LyricSnippet> {
    match word_id {
        1 => Some(LyricSnippet {
            word_id: 1,
            word: String::from("abandon"),
            lyric: String::from("There was nothing in sight But memories left abandoned"),
            background: Some(String::from(
                "https://www.cccimg.com/view.php/960ac328e376bd21794ece4d2367446a.png",
            )),
            audio_url: None,
        }),
        _ => None,
    }
}
