#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    pub phonetic: String,
    pub meaning: String,
}

impl Word {
    pub fn new(
        text: impl Into<String>,
        phonetic: impl Into<String>,
        meaning: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            phonetic: phonetic.into(),
            meaning: meaning.into(),
        }
    }
}

/// A named, ordered word list. `is_current` is a display hint for list
/// pickers, nothing enforces that only one playlist carries it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    pub name: String,
    pub words: Vec<Word>,
    pub is_current: bool,
}

impl Playlist {
    pub fn new(name: impl Into<String>, words: Vec<Word>) -> Self {
        Self {
            name: name.into(),
            words,
            is_current: false,
        }
    }
}
