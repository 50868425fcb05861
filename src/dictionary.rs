/*!
 * Dictionary store for text transformation.
 *
 * Holds the immutable mapping tables consumed by the style passes:
 * - colloquial-to-written register vocabulary
 * - restricted-word list with euphemisms
 * - English-to-Chinese glossary
 * - numeral exclusion words and post-conversion fixes
 *
 * The store is populated once at startup (built-in tables, optionally
 * merged with JSON override files) and is read-only afterwards, so it is
 * safe to share across threads without synchronization.
 */

use anyhow::{Context, Result};
use log::{debug, info};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Placeholder character used when masking restricted words
pub const MASK_CHAR: char = '★';

/// Optional JSON override files for the built-in tables.
///
/// Each file is a flat JSON object of source term to replacement.
/// Entries override built-ins with the same key.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DictionaryFiles {
    /// Colloquial-to-written register vocabulary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub register: Option<PathBuf>,

    /// Restricted words mapped to euphemisms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profanity: Option<PathBuf>,

    /// English terms mapped to Chinese translations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub english: Option<PathBuf>,
}

/// Immutable mapping tables shared by all transform passes.
#[derive(Debug, Clone)]
pub struct DictionaryStore {
    /// Colloquial-to-written pairs, longest key first
    register: Vec<(String, String)>,
    /// Register keys converted even in the semi style
    semi_must_convert: HashSet<String>,
    /// Register keys preserved in the semi style; wins over must-convert
    semi_keep: HashSet<String>,
    /// Restricted term to euphemism pairs, longest key first
    profanity: Vec<(String, String)>,
    /// Lowercased English term to Chinese translation
    english: HashMap<String, String>,
    /// Words containing numeral characters that are not quantities
    numeral_exclusions: Vec<String>,
    /// Known mis-conversions repaired after the register pass
    post_fixes: Vec<(String, String)>,
}

impl DictionaryStore {
    /// Build the store from the built-in tables only.
    pub fn builtin() -> Self {
        let register = sort_longest_first(builtin_register());
        let profanity = sort_longest_first(builtin_profanity());
        let english = builtin_english()
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();

        Self {
            register,
            semi_must_convert: SEMI_MUST_CONVERT.iter().map(|s| s.to_string()).collect(),
            semi_keep: SEMI_KEEP.iter().map(|s| s.to_string()).collect(),
            profanity,
            english,
            numeral_exclusions: NUMERAL_EXCLUSIONS.iter().map(|s| s.to_string()).collect(),
            post_fixes: builtin_post_fixes(),
        }
    }

    /// Build the store from the built-ins merged with JSON override files.
    ///
    /// Missing files are an error; absent entries in `files` simply keep
    /// the corresponding built-in table.
    pub fn with_overrides(files: &DictionaryFiles) -> Result<Self> {
        let mut store = Self::builtin();

        if let Some(path) = &files.register {
            let overrides = load_table(path)?;
            store.register = merge_pairs(store.register, overrides);
            debug!("Merged register overrides from {:?}", path);
        }

        if let Some(path) = &files.profanity {
            let overrides = load_table(path)?;
            store.profanity = merge_pairs(store.profanity, overrides);
            debug!("Merged profanity overrides from {:?}", path);
        }

        if let Some(path) = &files.english {
            let overrides = load_table(path)?;
            for (k, v) in overrides {
                store.english.insert(k.to_lowercase(), v);
            }
            debug!("Merged english overrides from {:?}", path);
        }

        info!(
            "Dictionary loaded: register={}, profanity={}, english={}",
            store.register.len(),
            store.profanity.len(),
            store.english.len()
        );

        Ok(store)
    }

    /// Register-conversion pairs ordered longest key first.
    pub fn register_pairs(&self) -> &[(String, String)] {
        &self.register
    }

    /// Whether the semi style converts this register key.
    ///
    /// The keep list wins when a key appears in both lists.
    pub fn semi_converts(&self, key: &str) -> bool {
        !self.semi_keep.contains(key) && self.semi_must_convert.contains(key)
    }

    /// Restricted-word pairs ordered longest term first.
    pub fn profanity_pairs(&self) -> &[(String, String)] {
        &self.profanity
    }

    /// Look up the Chinese translation of an English term (case-insensitive).
    pub fn lookup_english(&self, term: &str) -> Option<&str> {
        self.english.get(&term.to_lowercase()).map(String::as_str)
    }

    /// Words protected from the numeral-word-to-digit conversion.
    pub fn numeral_exclusions(&self) -> &[String] {
        &self.numeral_exclusions
    }

    /// Known mis-conversion fixes applied after the register pass.
    pub fn post_fix_pairs(&self) -> &[(String, String)] {
        &self.post_fixes
    }
}

impl Default for DictionaryStore {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Process-wide default store, initialized on first use.
pub static DEFAULT_DICTIONARY: Lazy<DictionaryStore> = Lazy::new(DictionaryStore::builtin);

fn load_table(path: &Path) -> Result<Vec<(String, String)>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dictionary file: {:?}", path))?;
    let table: HashMap<String, String> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse dictionary file: {:?}", path))?;
    Ok(table.into_iter().collect())
}

fn merge_pairs(base: Vec<(String, String)>, overrides: Vec<(String, String)>) -> Vec<(String, String)> {
    let mut merged: HashMap<String, String> = base.into_iter().collect();
    for (k, v) in overrides {
        merged.insert(k, v);
    }
    sort_longest_first(merged.into_iter().collect())
}

/// Order pairs so multi-character phrases match before their substrings.
fn sort_longest_first(mut pairs: Vec<(String, String)>) -> Vec<(String, String)> {
    pairs.sort_by(|a, b| {
        b.0.chars()
            .count()
            .cmp(&a.0.chars().count())
            .then_with(|| a.0.cmp(&b.0))
    });
    pairs
}

/// Register keys the semi style still converts
const SEMI_MUST_CONVERT: &[&str] = &[
    "係", "喺", "佢", "嚟", "搵", "話", "唔係", "即係", "點解", "乜嘢", "邊度", "而家",
    "今日", "琴日", "聽日", "頭先", "好彩", "呢啲", "嗰啲", "加埋", "個鐘", "蚊", "我哋",
    "佢哋", "你哋", "呢度", "嗰度", "瞓覺", "食飯", "搞掂",
];

/// Colloquial words the semi style keeps as-is
const SEMI_KEEP: &[&str] = &["睇", "靚", "啲", "咁", "咗", "嘅", "冇", "唔"];

/// Common words containing numeral characters that are not quantities
const NUMERAL_EXCLUSIONS: &[&str] = &[
    "一定", "一起", "一樣", "一直", "一切", "第一", "統一", "唯一", "一下", "一次",
    "一個", "一點", "一些", "一般", "一邊", "一旦", "二手", "二次", "不二", "十分",
    "九成", "七十二", "三十六", "星期一", "星期二", "星期三", "星期四", "星期五",
    "星期六", "星期日", "第三", "第四", "第五", "第六", "第七", "第八", "第九", "第十",
];

fn builtin_register() -> Vec<(String, String)> {
    [
        ("係", "是"),
        ("喺", "在"),
        ("唔係", "不是"),
        ("唔好", "不要"),
        ("唔", "不"),
        ("嘅", "的"),
        ("咗", "了"),
        ("冇問題", "沒有問題"),
        ("冇", "沒有"),
        ("佢哋", "他們"),
        ("佢", "他"),
        ("我哋", "我們"),
        ("你哋", "你們"),
        ("嚟", "來"),
        ("搵", "找"),
        ("睇", "看"),
        ("靚女", "美女"),
        ("靚仔", "帥哥"),
        ("靚", "漂亮"),
        ("啲", "一些"),
        ("咁", "這麼"),
        ("好彩", "幸運"),
        ("頭先", "剛才"),
        ("琴日", "昨天"),
        ("聽日", "明天"),
        ("今日", "今天"),
        ("而家", "現在"),
        ("即係", "就是"),
        ("點解", "為什麼"),
        ("乜嘢", "什麼"),
        ("邊度", "哪裡"),
        ("呢啲", "這些"),
        ("嗰啲", "那些"),
        ("呢度", "這裡"),
        ("嗰度", "那裡"),
        ("加埋", "加上"),
        ("個鐘", "小時"),
        ("蚊", "元"),
        ("話", "說"),
        ("畀", "給"),
        ("攰", "累"),
        ("食飯", "吃飯"),
        ("食", "吃"),
        ("飲", "喝"),
        ("瞓覺", "睡覺"),
        ("瞓", "睡"),
        ("行", "走"),
        ("企", "站"),
        ("傾偈", "聊天"),
        ("搞掂", "完成"),
        ("得閒", "有空"),
        ("幾多", "多少"),
        ("咩", "什麼"),
        ("嗰", "那"),
        ("呢", "這"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn builtin_profanity() -> Vec<(String, String)> {
    [
        ("冚家鏟", "非常過分"),
        ("含家鏟", "非常過分"),
        ("仆街", "糟糕"),
        ("戇鳩", "愚蠢"),
        ("好撚", "非常"),
        ("撚", "很"),
        ("鳩", "亂"),
        ("柒", "笨"),
        ("粉腸", "傢伙"),
        ("死仔", "臭小子"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn builtin_english() -> Vec<(String, String)> {
    [
        ("hello", "你好"),
        ("hi", "你好"),
        ("thank you", "謝謝"),
        ("thanks", "謝謝"),
        ("sorry", "抱歉"),
        ("ok", "好"),
        ("okay", "好"),
        ("yes", "是"),
        ("no", "不是"),
        ("good", "好"),
        ("morning", "早晨"),
        ("apple", "蘋果"),
        ("computer", "電腦"),
        ("phone", "電話"),
        ("money", "金錢"),
        ("friend", "朋友"),
        ("happy", "開心"),
        ("birthday", "生日"),
        ("weekend", "週末"),
        ("boss", "老闆"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn builtin_post_fixes() -> Vec<(String, String)> {
    // Sound-alike errors the upstream converter tends to produce
    [
        ("脫了", "除了"),
        ("便宜時", "平時"),
        ("逢係", "凡是"),
        ("逢是", "凡是"),
        ("視顧", "覺得"),
        ("告運作", "就運作"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}
