use std::sync::{Arc, Mutex};

use playback::{
    session, CommandEngine, NarrationPart, Player, PlayerHandle, SilentEngine, SpeechEngine,
};
use tokio::sync::mpsc;

use bridge::Bridge;
use config::AppConfig;
use drag::DragTracker;
use images::{ImageKind, ImageMetadata};
use lyrics::{LyricSnippet, LyricStore};
use storage::Storage;
use utilities::{input, parse_switch};
use words::{WordRecord, WordStore};

mod bridge;
mod catalog;
mod config;
mod drag;
mod images;
mod lyrics;
mod storage;
mod utilities;
mod words;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    let storage = Storage::open(&config.database_url).await?;
    let word_store = WordStore::new(storage.clone());
    let lyric_store = LyricStore::new(storage.clone());

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let engine: Box<dyn SpeechEngine> = match config.speech_engine_parts() {
        Some((program, args)) => Box::new(CommandEngine::new(program, args, events_tx)),
        None => {
            println!("No SPEECH_COMMAND set; narration runs silent.");
            Box::new(SilentEngine::new(events_tx))
        }
    };

    let mut player = Player::new(engine, config.speech_language.as_str());

    let position = Arc::new(Mutex::new(0usize));
    let position_for_index = position.clone();
    player.observe_current_index(move |index| {
        if let Ok(mut current) = position_for_index.lock() {
            *current = *index;
        }
    });
    let position_for_word = position.clone();
    player.observe_current_word(move |word| {
        if let Some(word) = word {
            let at = position_for_word
                .lock()
                .map(|current| *current + 1)
                .unwrap_or_default();
            println!("[{at}] {} {} {}", word.text, word.phonetic, word.meaning);
        }
    });
    player.observe_playing(|playing| {
        if *playing {
            println!("narration resumed");
        } else {
            println!("narration paused");
        }
    });
    player.observe_playlist(|words| {
        println!("playlist loaded: {} words", words.len());
    });
    player.observe_notice(|notice| {
        println!("! {notice}");
    });

    let player = session::spawn(player, events_rx);
    let bridge = Bridge::new(player.clone(), config.asset_dir.clone());

    player.load_playlist(catalog::default_words(), 0);
    println!("Memory Workshop. Type 'help' to list commands.");

    let mut last_detail: Option<i64> = None;
    loop {
        let line = input(">> ")?;
        let line = line.trim();
        let mut parts = line.split_ascii_whitespace();
        if let Some(command) = parts.next() {
            match command {
                "exit" | "leave" | "quit" | "e" | "q" => {
                    break;
                }
                "help" | "h" => {
                    print_help();
                }
                "play" | "p" => {
                    player.toggle();
                }
                "pause" => {
                    player.pause();
                }
                "next" | "n" => {
                    player.next();
                }
                "prev" | "previous" => {
                    player.previous();
                }
                "seek" => {
                    let target = parts.next().and_then(|raw| raw.parse::<usize>().ok());
                    seek(&player, target, parts.next());
                }
                "narrate" => {
                    let part = parts.next().map(str::to_lowercase);
                    let enabled = parts.next().and_then(parse_switch);
                    set_narration(&player, part.as_deref(), enabled).await;
                }
                "say" => {
                    let mut rest = parts.peekable();
                    let flush = rest.peek() == Some(&"-f");
                    if flush {
                        rest.next();
                    }
                    let text = rest.collect::<Vec<&str>>().join(" ");
                    if text.is_empty() {
                        println!("Usage: say [-f] <text>");
                    } else {
                        player.speak(text, flush);
                    }
                }
                "lists" => {
                    for (number, list) in catalog::playlists().iter().enumerate() {
                        let marker = if list.is_current { " *" } else { "" };
                        println!(
                            "[{}] {} ({} words){marker}",
                            number + 1,
                            list.name,
                            list.words.len()
                        );
                    }
                }
                "use" => {
                    load_playlist(&player, parts.next());
                }
                "words" => {
                    list_words(&word_store).await?;
                }
                "detail" | "d" => {
                    let query = parts.collect::<Vec<&str>>().join(" ");
                    if let Some(id) = show_detail(&word_store, &lyric_store, &query).await? {
                        last_detail = Some(id);
                    }
                }
                "dnext" => {
                    if let Some(id) = last_detail {
                        if let Some(word) = word_store.next_after(id).await? {
                            last_detail = Some(word.id);
                            print_word_line(&word);
                        }
                    } else {
                        println!("Open a word with 'detail' first.");
                    }
                }
                "dprev" => {
                    if let Some(id) = last_detail {
                        if let Some(word) = word_store.prev_before(id).await? {
                            last_detail = Some(word.id);
                            print_word_line(&word);
                        }
                    } else {
                        println!("Open a word with 'detail' first.");
                    }
                }
                "random" | "r" => {
                    if let Some(word) = word_store.random().await? {
                        last_detail = Some(word.id);
                        print_word_line(&word);
                    }
                }
                "remember" => {
                    mark_memorized(&word_store, parts.next(), true).await?;
                }
                "forget" => {
                    mark_memorized(&word_store, parts.next(), false).await?;
                }
                "collect" => {
                    mark_collected(&word_store, parts.next(), true).await?;
                }
                "uncollect" => {
                    mark_collected(&word_store, parts.next(), false).await?;
                }
                "mydef" => {
                    let id = parts.next().and_then(|raw| raw.parse::<i64>().ok());
                    let text = parts.collect::<Vec<&str>>().join(" ");
                    set_custom_definition(&word_store, id, text).await?;
                }
                "example" => {
                    let id = parts.next().and_then(|raw| raw.parse::<i64>().ok());
                    let text = parts.collect::<Vec<&str>>().join(" ");
                    set_example(&word_store, id, text).await?;
                }
                "reorder" => {
                    let id = parts.next().and_then(|raw| raw.parse::<i64>().ok());
                    let from = parts.next().and_then(|raw| raw.parse::<usize>().ok());
                    let to = parts.next().and_then(|raw| raw.parse::<usize>().ok());
                    reorder_definitions(&word_store, id, from, to).await?;
                }
                "lyric" => {
                    let id = parts.next().and_then(|raw| raw.parse::<i64>().ok());
                    let text = parts.collect::<Vec<&str>>().join(" ");
                    lyric_command(&word_store, &lyric_store, id, text).await?;
                }
                "images" => {
                    show_images(&word_store, parts.next()).await?;
                }
                "addimg" => {
                    let id = parts.next().and_then(|raw| raw.parse::<i64>().ok());
                    let url = parts.next().map(str::to_owned);
                    let caption = parts.collect::<Vec<&str>>().join(" ");
                    add_image(&word_store, id, url, caption).await?;
                }
                "useimg" => {
                    activate_image(&word_store, parts.next(), parts.next()).await?;
                }
                "editimg" => {
                    let id = parts.next().and_then(|raw| raw.parse::<i64>().ok());
                    let image_id = parts.next().map(str::to_owned);
                    let caption = parts.collect::<Vec<&str>>().join(" ");
                    edit_image(&word_store, id, image_id, caption).await?;
                }
                "delimg" => {
                    delete_image(&word_store, parts.next(), parts.next()).await?;
                }
                "cleanimg" => {
                    let removed = word_store.images().cleanup_temporary().await?;
                    println!("removed {removed} stale images");
                }
                "favorites" => {
                    for word in catalog::favorites() {
                        println!("★ {word}");
                    }
                }
                "books" => {
                    for book in catalog::word_books() {
                        let studying = if book.is_studying { " [学习中]" } else { "" };
                        println!(
                            "{}. {} {}/{} ({}%) {} {}{studying}",
                            book.id,
                            book.title,
                            book.learned_count,
                            book.word_count,
                            book.progress(),
                            book.category,
                            book.difficulty
                        );
                    }
                }
                "progress" => {
                    let percent = word_store.progress_percent().await?;
                    println!("进度: {percent}%");
                    if let Some(word) = word_store.last_memorized().await? {
                        println!("最近记住: {}", word.text);
                    }
                }
                "stats" => {
                    let list = word_store.list().await?;
                    let memorized = list.iter().filter(|word| word.is_memorized).count();
                    let collected = list.iter().filter(|word| word.is_collected).count();
                    println!(
                        "{} words, {memorized} memorized, {collected} collected",
                        list.len()
                    );
                }
                "reset" => {
                    let mut cleared = 0;
                    for key in [words::WORDS_KEY, images::IMAGES_KEY, lyrics::LYRICS_KEY] {
                        if storage.remove(key).await? {
                            cleared += 1;
                        }
                    }
                    println!("cleared {cleared} stored collections, fixtures are back");
                }
                "pronounce" => {
                    let text = parts.collect::<Vec<&str>>().join(" ");
                    if text.is_empty() {
                        println!("Usage: pronounce <text>");
                    } else {
                        bridge.speak(&text);
                    }
                }
                "device" => {
                    println!("{}", bridge.device_info());
                }
                "asset" => match parts.next() {
                    Some(request) => match bridge.asset(request) {
                        Some((path, mime)) => println!("{} ({mime})", path.display()),
                        None => println!("Not part of the bundle."),
                    },
                    None => println!("Usage: asset <path>"),
                },
                _ => {
                    println!("Unknown command {command}.");
                }
            }
        }
    }
    Ok(())
}

fn print_help() {
    println!(
        "playback:  play pause next prev seek <pos> [once|play] lists use <n|default>
           narrate <word|spelling|meaning> <on|off> say [-f] <text>
words:     words detail <id|word> dnext dprev random remember <id> forget <id>
           collect <id> uncollect <id> mydef <id> <text> example <id> <text>
           reorder <id> <from> <to> lyric <id> [new line]
images:    images <id> addimg <id> <url> [caption] useimg <id> <image-id>
           editimg <id> <image-id> <caption> delimg <id> <image-id> cleanimg
study:     books favorites progress stats
page:      pronounce <text> device asset <path>
data:      reset
exit:      exit quit q"
    );
}

fn seek(player: &PlayerHandle, target: Option<usize>, mode: Option<&str>) {
    let Some(position) = target else {
        println!("Usage: seek <position> [once|play]");
        return;
    };
    let resume = match mode {
        Some("once") => Some(false),
        Some("play") => Some(true),
        _ => None,
    };
    player.seek(position.saturating_sub(1), resume);
}

async fn set_narration(player: &PlayerHandle, part: Option<&str>, enabled: Option<bool>) {
    let part = match part {
        Some("word") => NarrationPart::Word,
        Some("spelling") | Some("letters") => NarrationPart::Spelling,
        Some("meaning") | Some("translation") => NarrationPart::Translation,
        _ => {
            println!("Usage: narrate <word|spelling|meaning> <on|off>");
            return;
        }
    };
    let Some(enabled) = enabled else {
        println!("Usage: narrate <word|spelling|meaning> <on|off>");
        return;
    };
    match player.set_narration(part, enabled).await {
        Ok(()) => println!("narration part updated"),
        Err(error) => {
            println!("至少保留一个选项 ({error})");
            // show the state the player kept so the user sees nothing changed
            if let Ok(snapshot) = player.snapshot().await {
                println!(
                    "word {} / spelling {} / meaning {}",
                    on_off(snapshot.speak_word),
                    on_off(snapshot.speak_spelling),
                    on_off(snapshot.speak_translation)
                );
            }
        }
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

fn load_playlist(player: &PlayerHandle, choice: Option<&str>) {
    match choice {
        Some("default") => player.load_playlist(catalog::default_words(), 0),
        Some(raw) => match raw.parse::<usize>() {
            Ok(number) => {
                let mut lists = catalog::playlists();
                if number >= 1 && number <= lists.len() {
                    let list = lists.swap_remove(number - 1);
                    player.load_playlist(list.words, 0);
                } else {
                    println!("No playlist numbered {number}.");
                }
            }
            Err(_) => println!("Usage: use <number|default>"),
        },
        None => println!("Usage: use <number|default>"),
    }
}

async fn list_words(words: &WordStore) -> anyhow::Result<()> {
    for word in words.list().await? {
        print_word_line(&word);
    }
    Ok(())
}

fn print_word_line(word: &WordRecord) {
    let meaning = word
        .definitions
        .first()
        .map(|definition| definition.meaning.as_str())
        .unwrap_or("");
    let memorized = if word.is_memorized { " ✓" } else { "" };
    let collected = if word.is_collected { " ★" } else { "" };
    println!(
        "#{} {} {} {meaning}{memorized}{collected}",
        word.id, word.text, word.phonetic
    );
}

async fn show_detail(
    words: &WordStore,
    lyrics: &LyricStore,
    query: &str,
) -> anyhow::Result<Option<i64>> {
    if query.is_empty() {
        println!("Usage: detail <id|word>");
        return Ok(None);
    }
    let word = match query.parse::<i64>() {
        Ok(id) => words.get_by_id(id).await?,
        Err(_) => match words.find_by_text(query).await? {
            // repeat the id lookup so the display image rides along
            Some(found) => words.get_by_id(found.id).await?,
            None => None,
        },
    };
    let Some(word) = word else {
        println!("No word matches '{query}'.");
        return Ok(None);
    };
    println!("#{} {} {}", word.id, word.text, word.phonetic);
    print_definitions(&word);
    if let Some(example) = &word.example {
        println!("  例句: {example}");
    }
    if let Some(custom) = &word.custom_definition {
        println!("  我的释义: {custom}");
    }
    if let Some(image) = &word.image_memory {
        println!("  图片: {image}");
    }
    if word.is_memorized {
        println!("  已记住 ✓");
    }
    if word.is_collected {
        println!("  已收藏 ★");
    }
    if let Some(snippet) = lyrics.get(word.id).await? {
        println!("  歌词: {}", snippet.lyric);
    }
    Ok(Some(word.id))
}

fn print_definitions(word: &WordRecord) {
    for definition in &word.definitions {
        match &definition.part_of_speech {
            Some(part) => println!("  {}. {part} {}", definition.order, definition.meaning),
            None => println!("  {}. {}", definition.order, definition.meaning),
        }
    }
}

async fn mark_memorized(words: &WordStore, id: Option<&str>, memorized: bool) -> anyhow::Result<()> {
    let Some(id) = id.and_then(|raw| raw.parse::<i64>().ok()) else {
        println!("Usage: remember <id> / forget <id>");
        return Ok(());
    };
    match words.set_memorized(id, memorized).await? {
        Some(word) if memorized => println!("记住了 {} ✓", word.text),
        Some(word) => println!("忘了 {}，再来一遍", word.text),
        None => println!("No word with id {id}."),
    }
    Ok(())
}

async fn mark_collected(words: &WordStore, id: Option<&str>, collected: bool) -> anyhow::Result<()> {
    let Some(id) = id.and_then(|raw| raw.parse::<i64>().ok()) else {
        println!("Usage: collect <id> / uncollect <id>");
        return Ok(());
    };
    match words.set_collected(id, collected).await? {
        Some(word) if collected => println!("已收藏 {}", word.text),
        Some(word) => println!("已取消收藏 {}", word.text),
        None => println!("No word with id {id}."),
    }
    Ok(())
}

async fn set_custom_definition(
    words: &WordStore,
    id: Option<i64>,
    text: String,
) -> anyhow::Result<()> {
    let Some(id) = id else {
        println!("Usage: mydef <id> <text>");
        return Ok(());
    };
    if text.is_empty() {
        println!("Usage: mydef <id> <text>");
        return Ok(());
    }
    match words.set_custom_definition(id, text).await? {
        Some(word) => println!("我的释义已更新: {}", word.text),
        None => println!("No word with id {id}."),
    }
    Ok(())
}

async fn set_example(words: &WordStore, id: Option<i64>, text: String) -> anyhow::Result<()> {
    let Some(id) = id else {
        println!("Usage: example <id> <text>");
        return Ok(());
    };
    if text.is_empty() {
        println!("Usage: example <id> <text>");
        return Ok(());
    }
    let Some(mut word) = words.get_by_id(id).await? else {
        println!("No word with id {id}.");
        return Ok(());
    };
    word.example = Some(text);
    match words.update(word).await? {
        Some(word) => println!("例句已更新: {}", word.text),
        None => println!("No word with id {id}."),
    }
    Ok(())
}

async fn reorder_definitions(
    words: &WordStore,
    id: Option<i64>,
    from: Option<usize>,
    to: Option<usize>,
) -> anyhow::Result<()> {
    let (Some(id), Some(from), Some(to)) = (id, from, to) else {
        println!("Usage: reorder <id> <from> <to> (1-based)");
        return Ok(());
    };
    let (from, to) = (from.saturating_sub(1), to.saturating_sub(1));
    // run the same gesture the page performs with the row grip
    let mut drag = DragTracker::new();
    drag.press_handle(from);
    drag.moved(0.0, 24.0 * to as f32, 160, Some(to));
    match drag.release() {
        Some((from, to)) => match words.reorder_definitions(id, from, to).await? {
            Some(word) => print_definitions(&word),
            None => println!("No word with id {id}."),
        },
        None => println!("Nothing to move."),
    }
    Ok(())
}

async fn lyric_command(
    words: &WordStore,
    lyrics: &LyricStore,
    id: Option<i64>,
    text: String,
) -> anyhow::Result<()> {
    let Some(id) = id else {
        println!("Usage: lyric <id> [new line]");
        return Ok(());
    };
    if text.is_empty() {
        match lyrics.get(id).await? {
            Some(snippet) => {
                println!("{}: {}", snippet.word, snippet.lyric);
                if let Some(background) = &snippet.background {
                    println!("背景: {background}");
                }
            }
            None => println!("No lyric line for word {id}."),
        }
        return Ok(());
    }
    let Some(word) = words.get_by_id(id).await? else {
        println!("No word with id {id}.");
        return Ok(());
    };
    let current = lyrics.get(id).await?;
    lyrics
        .set(LyricSnippet {
            word_id: id,
            word: word.text,
            lyric: text,
            background: current
                .as_ref()
                .and_then(|snippet| snippet.background.clone()),
            audio_url: current.and_then(|snippet| snippet.audio_url),
        })
        .await?;
    println!("歌词已更新");
    Ok(())
}

async fn show_images(words: &WordStore, id: Option<&str>) -> anyhow::Result<()> {
    let Some(id) = id.and_then(|raw| raw.parse::<i64>().ok()) else {
        println!("Usage: images <id>");
        return Ok(());
    };
    let collection = words.images().images_for(id).await?;
    for image in &collection.images {
        let marker = if collection.active_image_id.as_deref() == Some(image.id.as_str()) {
            " *"
        } else {
            ""
        };
        let caption = image.description.as_deref().unwrap_or("");
        println!("{} [{}] {} {caption}{marker}", image.id, image.kind.label(), image.url);
    }
    Ok(())
}

async fn add_image(
    words: &WordStore,
    id: Option<i64>,
    url: Option<String>,
    caption: String,
) -> anyhow::Result<()> {
    let (Some(id), Some(url)) = (id, url) else {
        println!("Usage: addimg <id> <url> [caption]");
        return Ok(());
    };
    let description = (!caption.is_empty()).then_some(caption);
    let added = words
        .images()
        .add_image(id, ImageKind::UserUrl, url, description, ImageMetadata::default())
        .await?;
    println!("added {} (inactive; activate with useimg)", added.id);
    Ok(())
}

async fn activate_image(
    words: &WordStore,
    id: Option<&str>,
    image_id: Option<&str>,
) -> anyhow::Result<()> {
    let (Some(id), Some(image_id)) = (id.and_then(|raw| raw.parse::<i64>().ok()), image_id) else {
        println!("Usage: useimg <id> <image-id>");
        return Ok(());
    };
    if words.images().set_active(id, image_id).await? {
        println!("display image updated");
    } else {
        println!("No image {image_id} on word {id}.");
    }
    Ok(())
}

async fn edit_image(
    words: &WordStore,
    id: Option<i64>,
    image_id: Option<String>,
    caption: String,
) -> anyhow::Result<()> {
    let (Some(id), Some(image_id)) = (id, image_id) else {
        println!("Usage: editimg <id> <image-id> <caption>");
        return Ok(());
    };
    if caption.is_empty() {
        println!("Usage: editimg <id> <image-id> <caption>");
        return Ok(());
    }
    if words
        .images()
        .update_image(id, &image_id, Some(caption), None)
        .await?
    {
        println!("caption updated");
    } else {
        println!("No image {image_id} on word {id}.");
    }
    Ok(())
}

async fn delete_image(
    words: &WordStore,
    id: Option<&str>,
    image_id: Option<&str>,
) -> anyhow::Result<()> {
    let (Some(id), Some(image_id)) = (id.and_then(|raw| raw.parse::<i64>().ok()), image_id) else {
        println!("Usage: delimg <id> <image-id>");
        return Ok(());
    };
    if words.images().delete_image(id, image_id).await? {
        println!("image removed");
    } else {
        println!("Could not remove {image_id} (system images stay).");
    }
    Ok(())
}
