//! Built-in playlists and word books. These ship with the app and are not
//! persisted; the stores in [`crate::words`] hold the editable working set.

use playback::{Playlist, Word};

/// The five words the player opens with.
pub fn default_words() -> Vec<Word> {
    vec![
        Word::new("abandon", "/əˈbændən/", "放弃，抛弃"),
        Word::new("beautiful", "/ˈbjuːtɪfəl/", "美丽的，漂亮的"),
        Word::new("challenge", "/tʃælɪndʒ/", "挑战，质疑"),
        Word::new("determine", "/dɪtɜːrmɪn/", "决定，确定"),
        Word::new("essential", "/ɪsenʃl/", "必要的，基本的"),
    ]
}

/// The curated playlists offered by the playlist picker.
pub fn playlists() -> Vec<Playlist> {
    let mut review = Playlist::new(
        "今日复习",
        vec![
            Word::new("abandon", "/əˈbændən/", "放弃，抛弃"),
            Word::new("beautiful", "/ˈbjuːtɪfəl/", "美丽的，漂亮的"),
            Word::new("challenge", "/ˈtʃælɪndʒ/", "挑战，质疑"),
            Word::new("difficult", "/ˈdɪfɪkəlt/", "困难的，艰难的"),
            Word::new("efficient", "/ɪˈfɪʃənt/", "高效的，有效的"),
            Word::new("fascinate", "/ˈfæsɪneɪt/", "迷住，使着迷"),
            Word::new("generous", "/ˈdʒenərəs/", "慷慨的，大方的"),
            Word::new("harmony", "/ˈhɑːrməni/", "和谐，协调"),
            Word::new("illustrate", "/ˈɪləstreɪt/", "说明，阐明"),
            Word::new("journey", "/ˈdʒɜːrni/", "旅程，旅行"),
            Word::new("knowledge", "/ˈnɒlɪdʒ/", "知识，学问"),
            Word::new("language", "/ˈlæŋɡwɪdʒ/", "语言，言语"),
        ],
    );
    review.is_current = true;
    vec![
        review,
        Playlist::new(
            "我的收藏",
            vec![
                Word::new("essential", "/ɪˈsenʃəl/", "必要的，基本的"),
                Word::new("fantastic", "/fænˈtæstɪk/", "极好的，了不起的"),
                Word::new("grateful", "/ˈɡreɪtfəl/", "感激的，感谢的"),
                Word::new("harmonious", "/hɑːrˈmoʊniəs/", "和谐的，协调的"),
                Word::new("inspiring", "/ɪnˈspaɪərɪŋ/", "鼓舞人心的"),
                Word::new("joyful", "/ˈdʒɔɪfəl/", "快乐的，令人愉快的"),
                Word::new("kindness", "/ˈkaɪndnəs/", "仁慈，善良"),
                Word::new("lovely", "/ˈlʌvli/", "可爱的，美好的"),
                Word::new("magnificent", "/mæɡˈnɪfɪsənt/", "壮丽的，宏伟的"),
                Word::new("noble", "/ˈnoʊbl/", "高尚的，崇高的"),
                Word::new("optimistic", "/ˌɑːptɪˈmɪstɪk/", "乐观的"),
                Word::new("peaceful", "/ˈpiːsfəl/", "和平的，安宁的"),
            ],
        ),
        Playlist::new(
            "怎么也记不住系列",
            vec![
                Word::new("ambiguous", "/æmˈbɪɡjuəs/", "模糊的，不明确的"),
                Word::new("benevolent", "/bəˈnevələnt/", "仁慈的，慈善的"),
                Word::new("conscientious", "/ˌkɒnʃiˈenʃəs/", "认真的，尽责的"),
                Word::new("dilemma", "/dɪˈlemə/", "困境，进退两难"),
                Word::new("exacerbate", "/ɪɡˈzæsərbeɪt/", "使恶化，加剧"),
                Word::new("flabbergasted", "/ˈflæbərɡæstɪd/", "目瞪口呆的，大吃一惊的"),
                Word::new("gregarious", "/ɡrɪˈɡeriəs/", "爱交际的，群居的"),
                Word::new("hierarchy", "/ˈhaɪərɑːrki/", "等级制度，层级"),
                Word::new("idiosyncrasy", "/ˌɪdiəˈsɪŋkrəsi/", "特质，癖好"),
                Word::new("juxtaposition", "/ˌdʒʌkstəpəˈzɪʃn/", "并置，并列"),
                Word::new("kaleidoscope", "/kəˈlaɪdəskoʊp/", "万花筒，变化多端"),
                Word::new("labyrinthine", "/ˌlæbəˈrɪnθaɪn/", "迷宫般的，复杂的"),
            ],
        ),
    ]
}

/// Starred words, mirroring the 我的收藏 playlist.
pub fn favorites() -> Vec<String> {
    [
        "essential",
        "fantastic",
        "grateful",
        "harmonious",
        "inspiring",
        "joyful",
        "kindness",
        "lovely",
        "magnificent",
        "noble",
        "optimistic",
        "peaceful",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// A themed word book with study progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordBook {
    pub id: String,
    pub title: String,
    pub word_count: u32,
    pub learned_count: u32,
    pub category: String,
    pub difficulty: String,
    pub is_studying: bool,
}

impl WordBook {
    /// Whole-percent study progress. Empty books count as untouched.
    pub fn progress(&self) -> u32 {
        if self.word_count == 0 {
            0
        } else {
            self.learned_count * 100 / self.word_count
        }
    }
}

pub fn word_books() -> Vec<WordBook> {
    vec![
        book("1", "四级核心词汇", 3000, 450, "考试词汇", "中级", true),
        book("2", "雅思必备词汇", 5000, 1200, "考试词汇", "高级", false),
        book("3", "托福高频词汇", 4000, 0, "考试词汇", "高级", false),
        book("4", "考研英语词汇", 5500, 2800, "考试词汇", "高级", false),
        book("5", "日常生活词汇", 2000, 1500, "生活词汇", "初级", true),
        book("6", "商务英语词汇", 2500, 2500, "专业词汇", "中级", false),
        book("7", "医学英语词汇", 3000, 800, "专业词汇", "高级", false),
        book("8", "计算机英语词汇", 1800, 0, "专业词汇", "中级", false),
        book("9", "旅游英语词汇", 1200, 1200, "生活词汇", "初级", false),
        book("10", "美食英语词汇", 800, 600, "生活词汇", "初级", false),
    ]
}

fn book(
    id: &str,
    title: &str,
    word_count: u32,
    learned_count: u32,
    category: &str,
    difficulty: &str,
    is_studying: bool,
) -> WordBook {
    WordBook {
        id: id.to_owned(),
        title: title.to_owned(),
        word_count,
        learned_count,
        category: category.to_owned(),
        difficulty: difficulty.to_owned(),
        is_studying,
    }
}
