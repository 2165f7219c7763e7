//! The surface the embedded detail page talks to: narration requests, device
//! facts, and lookup of its bundled asset files.

use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use playback::PlayerHandle;

pub struct Bridge {
    player: PlayerHandle,
    assets: AssetResolver,
}

impl Bridge {
    pub fn new(player: PlayerHandle, asset_dir: PathBuf) -> Self {
        Self {
            player,
            assets: AssetResolver::new(asset_dir),
        }
    }

    /// Narrates page text behind whatever the playlist is already saying.
    pub fn speak(&self, text: &str) {
        self.player.speak(text, false);
    }

    /// Facts the page may ask for, as a JSON string.
    pub fn device_info(&self) -> String {
        let info = DeviceInfo {
            platform: std::env::consts::OS,
            version: env!("CARGO_PKG_VERSION"),
        };
        serde_json::to_string(&info).unwrap_or_default()
    }

    /// Resolves a page request to a bundled file and its MIME type.
    pub fn asset(&self, request: &str) -> Option<(PathBuf, &'static str)> {
        self.assets.resolve(request)
    }
}

#[derive(Serialize)]
struct DeviceInfo {
    platform: &'static str,
    version: &'static str,
}

/// Maps page urls onto files under the bundled asset directory. Requests may
/// not step outside it.
pub struct AssetResolver {
    root: PathBuf,
}

impl AssetResolver {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// `/` serves the page entry point. Paths with parent or absolute
    /// components resolve to nothing.
    pub fn resolve(&self, request: &str) -> Option<(PathBuf, &'static str)> {
        let trimmed = request.trim_start_matches('/');
        let relative = if trimmed.is_empty() {
            "index.html"
        } else {
            trimmed
        };
        let mut path = self.root.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => path.push(part),
                _ => return None,
            }
        }
        if !path.is_file() {
            return None;
        }
        let mime = mime_for(&path);
        Some((path, mime))
    }
}

fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()).unwrap_or("") {
        "html" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff2" => "font/woff2",
        "m4a" => "audio/mp4",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use playback::{
        session, LanguageStatus, Player, QueueMode, SilentEngine, SpeechEngine, SpeechEvent,
        UtteranceId,
    };
    use tokio::sync::mpsc;

    struct CapturingEngine {
        spoken: Arc<Mutex<Vec<(String, QueueMode)>>>,
        events: mpsc::UnboundedSender<SpeechEvent>,
    }

    impl SpeechEngine for CapturingEngine {
        fn set_language(&mut self, _tag: &str) -> LanguageStatus {
            LanguageStatus::Available
        }

        fn speak(&mut self, text: &str, mode: QueueMode, utterance: UtteranceId) {
            self.spoken.lock().unwrap().push((text.to_owned(), mode));
            let _ = self.events.send(SpeechEvent::Started(utterance));
            let _ = self.events.send(SpeechEvent::Done(utterance));
        }

        fn stop(&mut self) {}

        fn shutdown(&mut self) {}
    }

    async fn silent_bridge() -> Bridge {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let player = Player::new(Box::new(SilentEngine::new(events_tx)), "zh-CN");
        Bridge::new(session::spawn(player, events_rx), PathBuf::from("web/dist"))
    }

    #[tokio::test]
    async fn page_narration_enqueues_behind_playlist_speech() {
        let spoken = Arc::new(Mutex::new(Vec::new()));
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let engine = CapturingEngine {
            spoken: spoken.clone(),
            events: events_tx,
        };
        let player = Player::new(Box::new(engine), "zh-CN");
        let handle = session::spawn(player, events_rx);
        let bridge = Bridge::new(handle.clone(), PathBuf::from("web/dist"));

        bridge.speak("你好，世界");
        // commands apply in order, so once a snapshot returns the narration
        // request has been handled
        handle.snapshot().await.expect("live session");

        let spoken = spoken.lock().unwrap();
        assert_eq!(
            spoken.as_slice(),
            [(String::from("你好，世界"), QueueMode::Enqueue)]
        );
    }

    #[tokio::test]
    async fn device_info_reports_platform_and_version() {
        let bridge = silent_bridge().await;
        let info: serde_json::Value = serde_json::from_str(&bridge.device_info()).unwrap();
        assert_eq!(info["platform"], std::env::consts::OS);
        assert_eq!(info["version"], env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn assets_resolve_inside_the_bundle_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>").unwrap();
        std::fs::create_dir(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/app.js"), "js").unwrap();
        let assets = AssetResolver::new(dir.path().to_path_buf());

        let (entry, mime) = assets.resolve("/").unwrap();
        assert!(entry.ends_with("index.html"));
        assert_eq!(mime, "text/html");

        let (script, mime) = assets.resolve("assets/app.js").unwrap();
        assert!(script.ends_with("assets/app.js"));
        assert_eq!(mime, "application/javascript");

        assert!(assets.resolve("../secrets.txt").is_none());
        assert!(assets.resolve("assets/../../escape.js").is_none());
        assert!(assets.resolve("missing.css").is_none());
    }
}
