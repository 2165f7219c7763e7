use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::images::ImageStore;
use crate::storage::Storage;

pub const WORDS_KEY: &str = "words";

/// One sense of a word. `order` is 1-based and kept contiguous by [`reorder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Definition {
    pub meaning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<String>,
    pub order: u32,
}

impl Definition {
    pub fn new(meaning: impl Into<String>, part_of_speech: Option<&str>, order: u32) -> Self {
        Self {
            meaning: meaning.into(),
            part_of_speech: part_of_speech.map(String::from),
            order,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordRecord {
    pub id: i64,
    pub text: String,
    pub phonetic: String,
    pub definitions: Vec<Definition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_definition: Option<String>,
    /// Url of the display image, filled in on lookup from the image store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_memory: Option<String>,
    pub is_memorized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memorized_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_collected: bool,
}

/// Moves one definition to a new position and renumbers the rest so `order`
/// stays contiguous from 1. Returns `None` when nothing should change, which
/// also means nothing should be written back.
pub fn reorder(definitions: &[Definition], from: usize, to: usize) -> Option<Vec<Definition>> {
    if from == to || from >= definitions.len() || to >= definitions.len() {
        return None;
    }
    let mut next = definitions.to_vec();
    let dragged = next.remove(from);
    next.insert(to, dragged);
    for (position, definition) in next.iter_mut().enumerate() {
        definition.order = position as u32 + 1;
    }
    Some(next)
}

/// The working set a fresh install starts from.
pub fn initial_words() -> Vec<WordRecord> {
    let mut abandon = starter_word(
        1,
        "abandon",
        "/əˈbændən/",
        vec![
            Definition::new("放弃，抛弃", Some("v."), 1),
            Definition::new("沉溺于", Some("v."), 2),
            Definition::new("放任，放纵", Some("v."), 3),
        ],
        "He decided to abandon the project.",
    );
    abandon.custom_definition = Some(String::from("大家都爱写代码，一言不合一写，最后放弃。"));
    vec![
        abandon,
        starter_word(
            2,
            "serendipity",
            "/ˌserənˈdɪpɪti/",
            vec![Definition::new("意外发现美好事物的能力", Some("n."), 1)],
            "Finding this book was pure serendipity.",
        ),
        starter_word(
            3,
            "eloquent",
            "/ˈeləkwənt/",
            vec![Definition::new("雄辩的，有说服力的", Some("adj."), 1)],
            "She gave an eloquent speech.",
        ),
        starter_word(
            4,
            "nostalgia",
            "/nɒˈstældʒə/",
            vec![Definition::new("怀旧，思乡之情", Some("n."), 1)],
            "The music filled him with nostalgia.",
        ),
        starter_word(
            5,
            "ubiquitous",
            "/juːˈbɪkwɪtəs/",
            vec![Definition::new("无所不在的，普遍存在的", Some("adj."), 1)],
            "Mobile phones are now ubiquitous.",
        ),
    ]
}

fn starter_word(
    id: i64,
    text: &str,
    phonetic: &str,
    definitions: Vec<Definition>,
    example: &str,
) -> WordRecord {
    WordRecord {
        id,
        text: text.to_owned(),
        phonetic: phonetic.to_owned(),
        definitions,
        example: Some(example.to_owned()),
        custom_definition: None,
        image_memory: None,
        is_memorized: false,
        memorized_at: None,
        is_collected: false,
    }
}

#[derive(Clone)]
pub struct WordStore {
    storage: Storage,
    images: ImageStore,
}

impl WordStore {
    pub fn new(storage: Storage) -> Self {
        Self {
            images: ImageStore::new(storage.clone()),
            storage,
        }
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    pub async fn list(&self) -> anyhow::Result<Vec<WordRecord>> {
        match self.storage.read_json(WORDS_KEY).await? {
            Some(words) => Ok(words),
            None => Ok(initial_words()),
        }
    }

    /// A single word with its display image attached.
    pub async fn get_by_id(&self, id: i64) -> anyhow::Result<Option<WordRecord>> {
        let words = self.list().await?;
        let Some(mut word) = words.into_iter().find(|word| word.id == id) else {
            return Ok(None);
        };
        if let Some(image) = self.images.active_image(id).await? {
            word.image_memory = Some(image.url);
        }
        Ok(Some(word))
    }

    /// Looks a word up by spelling, tolerating small typos.
    pub async fn find_by_text(&self, query: &str) -> anyhow::Result<Option<WordRecord>> {
        let words = self.list().await?;
        let query = query.to_lowercase();
        if let Some(exact) = words.iter().find(|word| word.text.to_lowercase() == query) {
            return Ok(Some(exact.clone()));
        }
        let mut scored = words
            .iter()
            .map(|word| (word, strsim::jaro(&word.text.to_lowercase(), &query)))
            .collect::<Vec<(&WordRecord, f64)>>();
        // most similar at the start
        scored.sort_unstable_by(|(_, a), (_, b)| (-a).partial_cmp(&-b).unwrap());
        let Some((best, score)) = scored.first() else {
            return Ok(None);
        };
        let runner_up = scored.get(1).map_or(0.0, |(_, score)| *score);
        if *score > 0.9 && score - runner_up > 0.25 {
            return Ok(Some((*best).clone()));
        }
        Ok(None)
    }

    pub async fn update(&self, record: WordRecord) -> anyhow::Result<Option<WordRecord>> {
        let id = record.id;
        self.modify(id, move |word| *word = record).await
    }

    pub async fn set_memorized(
        &self,
        id: i64,
        memorized: bool,
    ) -> anyhow::Result<Option<WordRecord>> {
        self.modify(id, move |word| {
            word.is_memorized = memorized;
            word.memorized_at = memorized.then(Utc::now);
        })
        .await
    }

    pub async fn set_custom_definition(
        &self,
        id: i64,
        text: impl Into<String>,
    ) -> anyhow::Result<Option<WordRecord>> {
        let text = text.into();
        self.modify(id, move |word| word.custom_definition = Some(text))
            .await
    }

    pub async fn set_collected(
        &self,
        id: i64,
        collected: bool,
    ) -> anyhow::Result<Option<WordRecord>> {
        self.modify(id, move |word| word.is_collected = collected)
            .await
    }

    pub async fn set_definitions(
        &self,
        id: i64,
        definitions: Vec<Definition>,
    ) -> anyhow::Result<Option<WordRecord>> {
        self.modify(id, move |word| word.definitions = definitions)
            .await
    }

    /// Moves one definition and persists the renumbered list. Same-place and
    /// out-of-range drops leave the stored list untouched.
    pub async fn reorder_definitions(
        &self,
        id: i64,
        from: usize,
        to: usize,
    ) -> anyhow::Result<Option<WordRecord>> {
        let words = self.list().await?;
        let Some(word) = words.iter().find(|word| word.id == id) else {
            return Ok(None);
        };
        match reorder(&word.definitions, from, to) {
            Some(reordered) => self.set_definitions(id, reordered).await,
            None => Ok(Some(word.clone())),
        }
    }

    /// The next word in id order, wrapping at the end of the list.
    pub async fn next_after(&self, id: i64) -> anyhow::Result<Option<WordRecord>> {
        let mut words = self.list().await?;
        if words.is_empty() {
            return Ok(None);
        }
        words.sort_by_key(|word| word.id);
        let next = match words.iter().position(|word| word.id == id) {
            Some(current) => (current + 1) % words.len(),
            None => 0,
        };
        Ok(words.into_iter().nth(next))
    }

    /// The previous word in id order, wrapping at the start of the list.
    pub async fn prev_before(&self, id: i64) -> anyhow::Result<Option<WordRecord>> {
        let mut words = self.list().await?;
        if words.is_empty() {
            return Ok(None);
        }
        words.sort_by_key(|word| word.id);
        let previous = match words.iter().position(|word| word.id == id) {
            Some(current) => (current + words.len() - 1) % words.len(),
            None => words.len() - 1,
        };
        Ok(words.into_iter().nth(previous))
    }

    pub async fn random(&self) -> anyhow::Result<Option<WordRecord>> {
        let words = self.list().await?;
        Ok(words.choose(&mut rand::thread_rng()).cloned())
    }

    /// The most recently memorized word, taken as the highest memorized id.
    pub async fn last_memorized(&self) -> anyhow::Result<Option<WordRecord>> {
        let words = self.list().await?;
        Ok(words
            .into_iter()
            .filter(|word| word.is_memorized)
            .max_by_key(|word| word.id))
    }

    /// How much of the working set is memorized, in whole percent.
    pub async fn progress_percent(&self) -> anyhow::Result<u32> {
        let words = self.list().await?;
        if words.is_empty() {
            return Ok(0);
        }
        let memorized = words.iter().filter(|word| word.is_memorized).count();
        Ok((memorized as f64 / words.len() as f64 * 100.0).round() as u32)
    }

    async fn modify(
        &self,
        id: i64,
        change: impl FnOnce(&mut WordRecord),
    ) -> anyhow::Result<Option<WordRecord>> {
        let mut words = self.list().await?;
        let Some(word) = words.iter_mut().find(|word| word.id == id) else {
            return Ok(None);
        };
        change(word);
        // The display image is derived on lookup; it never lands in the blob.
        word.image_memory = None;
        let updated = word.clone();
        self.storage.write_json(WORDS_KEY, &words).await?;
        Ok(Some(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::SqlitePool;

    async fn store() -> WordStore {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("in-memory database");
        WordStore::new(Storage::with_pool(pool).await.expect("blob table"))
    }

    fn definitions(meanings: &[&str]) -> Vec<Definition> {
        meanings
            .iter()
            .enumerate()
            .map(|(index, meaning)| Definition::new(*meaning, Some("v."), index as u32 + 1))
            .collect()
    }

    #[test]
    fn reordering_moves_one_definition_and_renumbers_the_rest() {
        let original = definitions(&["a", "b", "c"]);
        let reordered = reorder(&original, 0, 2).unwrap();
        let meanings: Vec<&str> = reordered.iter().map(|d| d.meaning.as_str()).collect();
        assert_eq!(meanings, ["b", "c", "a"]);
        let orders: Vec<u32> = reordered.iter().map(|d| d.order).collect();
        assert_eq!(orders, [1, 2, 3]);
    }

    #[test]
    fn dropping_a_definition_where_it_started_changes_nothing() {
        let original = definitions(&["a", "b"]);
        assert!(reorder(&original, 1, 1).is_none());
    }

    #[test]
    fn out_of_range_positions_are_ignored() {
        let original = definitions(&["a", "b"]);
        assert!(reorder(&original, 0, 5).is_none());
        assert!(reorder(&original, 7, 0).is_none());
    }

    #[tokio::test]
    async fn a_fresh_store_serves_the_starter_words() {
        let words = store().await;
        let list = words.list().await.unwrap();
        assert_eq!(list.len(), 5);
        assert_eq!(list[0].text, "abandon");
        assert_eq!(list[0].definitions.len(), 3);
        assert!(list[0].custom_definition.is_some());
    }

    #[tokio::test]
    async fn memorizing_stamps_the_time_and_counts_toward_progress() {
        let words = store().await;
        let updated = words.set_memorized(2, true).await.unwrap().unwrap();
        assert!(updated.is_memorized);
        assert!(updated.memorized_at.is_some());
        assert_eq!(words.progress_percent().await.unwrap(), 20);
        let reverted = words.set_memorized(2, false).await.unwrap().unwrap();
        assert!(reverted.memorized_at.is_none());
        assert_eq!(words.progress_percent().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn browsing_wraps_around_both_ends() {
        let words = store().await;
        assert_eq!(words.next_after(5).await.unwrap().unwrap().id, 1);
        assert_eq!(words.prev_before(1).await.unwrap().unwrap().id, 5);
        assert_eq!(words.next_after(2).await.unwrap().unwrap().id, 3);
    }

    #[tokio::test]
    async fn the_custom_definition_survives_a_reload() {
        let words = store().await;
        words.set_custom_definition(3, "口若悬河的那种人").await.unwrap();
        let reloaded = words.get_by_id(3).await.unwrap().unwrap();
        assert_eq!(
            reloaded.custom_definition.as_deref(),
            Some("口若悬河的那种人")
        );
    }

    #[tokio::test]
    async fn unknown_ids_update_nothing() {
        let words = store().await;
        assert!(words.set_memorized(99, true).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn the_display_image_rides_along_on_lookup() {
        let words = store().await;
        let word = words.get_by_id(1).await.unwrap().unwrap();
        let url = word.image_memory.expect("active image url");
        assert!(url.contains("unsplash"));
    }

    #[tokio::test]
    async fn saving_a_looked_up_word_does_not_persist_the_display_image() {
        let words = store().await;
        let word = words.get_by_id(1).await.unwrap().unwrap();
        assert!(word.image_memory.is_some());
        words.update(word).await.unwrap();
        let stored = words.list().await.unwrap();
        assert_eq!(stored[0].image_memory, None);
    }

    #[tokio::test]
    async fn reordering_through_the_store_persists() {
        let words = store().await;
        words.reorder_definitions(1, 0, 2).await.unwrap();
        let reloaded = words.get_by_id(1).await.unwrap().unwrap();
        let meanings: Vec<&str> = reloaded
            .definitions
            .iter()
            .map(|d| d.meaning.as_str())
            .collect();
        assert_eq!(meanings, ["沉溺于", "放任，放纵", "放弃，抛弃"]);
        assert_eq!(reloaded.definitions[0].order, 1);
    }

    #[tokio::test]
    async fn lookup_by_spelling_tolerates_small_typos() {
        let words = store().await;
        assert_eq!(
            words.find_by_text("ubiquitous").await.unwrap().unwrap().id,
            5
        );
        assert_eq!(
            words.find_by_text("ubiquitos").await.unwrap().unwrap().id,
            5
        );
        assert!(words.find_by_text("zzzz").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn the_last_memorized_word_is_the_highest_memorized_id() {
        let words = store().await;
        words.set_memorized(4, true).await.unwrap();
        words.set_memorized(2, true).await.unwrap();
        assert_eq!(words.last_memorized().await.unwrap().unwrap().id, 4);
    }
}
