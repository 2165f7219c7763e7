use std::path::PathBuf;

/// Runtime settings, read once at startup from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub speech_command: Option<String>,
    pub speech_language: String,
    pub asset_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| String::from("sqlite://memory-workshop.db"));
        let speech_command = std::env::var("SPEECH_COMMAND")
            .ok()
            .filter(|command| !command.trim().is_empty());
        let speech_language =
            std::env::var("SPEECH_LANGUAGE").unwrap_or_else(|_| String::from("zh-CN"));
        let asset_dir = std::env::var("WEB_ASSET_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("web/dist"));
        Self {
            database_url,
            speech_command,
            speech_language,
            asset_dir,
        }
    }

    /// Splits the configured speech command line into a program and its arguments.
    /// Returns `None` when no command is configured, which selects the silent engine.
    pub fn speech_engine_parts(&self) -> Option<(String, Vec<String>)> {
        let command = self.speech_command.as_deref()?;
        let mut parts = command.split_ascii_whitespace().map(String::from);
        let program = parts.next()?;
        Some((program, parts.collect()))
    }
}
