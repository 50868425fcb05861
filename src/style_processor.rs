/*!
 * Multi-pass text transform engine for subtitle display text.
 *
 * Every segment runs through the same fixed pass order: register conversion,
 * foreign-language policy, restricted-vocabulary policy, numeral policy, then
 * display cleanup. Long lines are re-split afterwards at the entry level.
 * Later passes assume the normalization done by earlier ones, so the order is
 * not configurable. All passes are total over string input; a dictionary miss
 * leaves the source token unchanged.
 */

use anyhow::{anyhow, Result};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::dictionary::{DictionaryStore, MASK_CHAR};
use crate::numerals;
use crate::segment_merger::CandidateSegment;
use crate::subtitle::SubtitleEntry;

/// Matches a contiguous run of Latin-script words joined by spaces, hyphens
/// or apostrophes.
static ENGLISH_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z]+(?:[\s\-'][a-zA-Z]+)*").unwrap());

/// Brackets the recognizer tends to hallucinate, removed anywhere in a line.
const STRIPPED_BRACKETS: [char; 12] = [
    '(', ')', '（', '）', '﹙', '﹚', '[', ']', '【', '】', '「', '」',
];

/// Sentence punctuation removed from line ends.
const TRAILING_PUNCTUATION: [char; 13] = [
    '。', '，', '！', '？', '；', '：', '、', '.', '!', '?', ',', ';', ':',
];

/// Punctuation preferred as a split point for overlong lines.
const SPLIT_PUNCTUATION: [char; 10] = ['，', '。', '！', '？', '、', ',', '.', ';', '?', '!'];

/// Register conversion style
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RegisterStyle {
    // @style: keep the colloquial Cantonese register untouched
    #[default]
    Spoken,
    // @style: convert only the high-frequency colloquial markers
    Semi,
    // @style: convert every dictionary-covered token to written Chinese
    Written,
}

impl RegisterStyle {
    // @returns: Capitalized style name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Spoken => "Spoken",
            Self::Semi => "Semi-written",
            Self::Written => "Written",
        }
    }

    // @returns: Lowercase style identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Spoken => "spoken".to_string(),
            Self::Semi => "semi".to_string(),
            Self::Written => "written".to_string(),
        }
    }
}

impl std::fmt::Display for RegisterStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for RegisterStyle {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "spoken" => Ok(Self::Spoken),
            "semi" => Ok(Self::Semi),
            "written" => Ok(Self::Written),
            _ => Err(anyhow!("Invalid register style: {}", s)),
        }
    }
}

/// Policy for runs of Latin-script text
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EnglishMode {
    #[default]
    Keep,
    Translate,
    Bilingual,
}

impl std::fmt::Display for EnglishMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Keep => "keep",
            Self::Translate => "translate",
            Self::Bilingual => "bilingual",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for EnglishMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "keep" => Ok(Self::Keep),
            "translate" => Ok(Self::Translate),
            "bilingual" => Ok(Self::Bilingual),
            _ => Err(anyhow!("Invalid english mode: {}", s)),
        }
    }
}

/// Numeral notation policy
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NumberMode {
    #[default]
    Arabic,
    Chinese,
}

impl std::fmt::Display for NumberMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Arabic => "arabic",
            Self::Chinese => "chinese",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for NumberMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "arabic" => Ok(Self::Arabic),
            "chinese" => Ok(Self::Chinese),
            _ => Err(anyhow!("Invalid number mode: {}", s)),
        }
    }
}

/// Restricted-vocabulary policy
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProfanityMode {
    #[default]
    Keep,
    Mask,
    Mild,
}

impl std::fmt::Display for ProfanityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Keep => "keep",
            Self::Mask => "mask",
            Self::Mild => "mild",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for ProfanityMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "keep" => Ok(Self::Keep),
            "mask" => Ok(Self::Mask),
            "mild" => Ok(Self::Mild),
            _ => Err(anyhow!("Invalid profanity mode: {}", s)),
        }
    }
}

/// Per-run transform configuration, consumed read-only.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StyleOptions {
    /// Register conversion style
    #[serde(default)]
    pub style: RegisterStyle,

    /// Latin-script run policy
    #[serde(default)]
    pub english: EnglishMode,

    /// Numeral notation policy
    #[serde(default)]
    pub numbers: NumberMode,

    /// Restricted-vocabulary policy
    #[serde(default)]
    pub profanity: ProfanityMode,

    /// Re-split lines longer than the threshold
    #[serde(default)]
    pub split_long: bool,

    /// Maximum characters per display line before a split is attempted
    #[serde(default = "default_split_threshold")]
    pub split_threshold: usize,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            style: RegisterStyle::default(),
            english: EnglishMode::default(),
            numbers: NumberMode::default(),
            profanity: ProfanityMode::default(),
            split_long: false,
            split_threshold: default_split_threshold(),
        }
    }
}

fn default_split_threshold() -> usize {
    25
}

/// Applies the transform passes to segment text and renders subtitle entries.
#[derive(Debug, Clone)]
pub struct StyleProcessor {
    options: StyleOptions,
    dictionary: DictionaryStore,
}

impl StyleProcessor {
    /// Create a processor with the given options and dictionary.
    pub fn new(options: StyleOptions, dictionary: DictionaryStore) -> Self {
        Self {
            options,
            dictionary,
        }
    }

    /// Create a processor with default options and the built-in dictionary.
    pub fn with_defaults() -> Self {
        Self::new(StyleOptions::default(), DictionaryStore::builtin())
    }

    /// The options this processor applies.
    pub fn options(&self) -> &StyleOptions {
        &self.options
    }

    /// Run the full pass order over one line of text.
    ///
    /// Register conversion, foreign-language policy, restricted vocabulary,
    /// numeral notation, then display cleanup. Splitting is an entry-level
    /// concern and is not part of this function.
    pub fn transform_text(&self, text: &str) -> String {
        let registered = self.apply_register(text, &self.options.style);
        let englished = self.apply_english(&registered);
        let filtered = self.apply_profanity(&englished);
        let numbered = self.apply_numerals(&filtered);
        Self::cleanup(&numbered)
    }

    /// Render a subtitle entry for one segment.
    ///
    /// The colloquial variant is the segment text with every pass except
    /// register conversion applied; the formal variant is present only when
    /// a written or semi-written register was requested and is derived from
    /// the colloquial line by the register pass.
    pub fn render_entry(&self, start: f64, end: f64, text: &str) -> SubtitleEntry {
        let englished = self.apply_english(text);
        let filtered = self.apply_profanity(&englished);
        let numbered = self.apply_numerals(&filtered);
        let colloquial = Self::cleanup(&numbered);
        let formal = self.formal_for(&colloquial);
        SubtitleEntry::new(start, end, colloquial, formal)
    }

    /// Transform a batch of merged segments into subtitle entries, checking
    /// the cancellation flag between segments. Returns `None` once
    /// cancellation is observed.
    pub fn transform_segments(
        &self,
        segments: &[CandidateSegment],
        cancel: &AtomicBool,
    ) -> Option<Vec<SubtitleEntry>> {
        let mut entries = Vec::with_capacity(segments.len());
        for segment in segments {
            if cancel.load(Ordering::SeqCst) {
                return None;
            }
            entries.push(self.render_entry(segment.start, segment.end, &segment.text));
        }
        Some(self.split_long_entries(entries))
    }

    /// Split every entry whose colloquial line exceeds the threshold.
    pub fn split_long_entries(&self, entries: Vec<SubtitleEntry>) -> Vec<SubtitleEntry> {
        if !self.options.split_long {
            return entries;
        }
        entries
            .into_iter()
            .flat_map(|entry| self.split_entry(entry))
            .collect()
    }

    fn formal_for(&self, colloquial: &str) -> Option<String> {
        if self.options.style == RegisterStyle::Spoken || colloquial.trim().is_empty() {
            return None;
        }
        Some(self.apply_register(colloquial, &self.options.style))
    }

    /// Token-level register substitution, longest dictionary key first.
    fn apply_register(&self, text: &str, style: &RegisterStyle) -> String {
        match style {
            RegisterStyle::Spoken => text.to_string(),
            RegisterStyle::Written => {
                let mut out = text.to_string();
                for (colloquial, written) in self.dictionary.register_pairs() {
                    if out.contains(colloquial.as_str()) {
                        out = out.replace(colloquial.as_str(), written);
                    }
                }
                self.apply_post_fixes(out)
            }
            RegisterStyle::Semi => {
                let mut out = text.to_string();
                for (colloquial, written) in self.dictionary.register_pairs() {
                    if self.dictionary.semi_converts(colloquial) && out.contains(colloquial.as_str())
                    {
                        out = out.replace(colloquial.as_str(), written);
                    }
                }
                self.apply_post_fixes(out)
            }
        }
    }

    /// Known mis-conversions the register table tends to produce.
    fn apply_post_fixes(&self, mut text: String) -> String {
        for (wrong, right) in self.dictionary.post_fix_pairs() {
            if text.contains(wrong.as_str()) {
                text = text.replace(wrong.as_str(), right);
            }
        }
        text
    }

    fn apply_english(&self, text: &str) -> String {
        match self.options.english {
            EnglishMode::Keep => text.to_string(),
            EnglishMode::Translate => self.translate_runs(text),
            EnglishMode::Bilingual => {
                let translated = self.translate_runs(text);
                // Only add the second line when the translation changed something.
                if translated != text {
                    format!("{}\n{}", text, translated)
                } else {
                    text.to_string()
                }
            }
        }
    }

    /// Replace each Latin-script run that the glossary can resolve.
    fn translate_runs(&self, text: &str) -> String {
        ENGLISH_RUN
            .replace_all(text, |caps: &regex::Captures<'_>| {
                let run = &caps[0];
                self.translate_run(run).unwrap_or_else(|| run.to_string())
            })
            .into_owned()
    }

    /// Resolve a whole run first, then word by word. The word-by-word path
    /// is all or nothing: one unresolved word passes the run through intact.
    fn translate_run(&self, run: &str) -> Option<String> {
        if let Some(hit) = self.dictionary.lookup_english(run) {
            return Some(hit.to_string());
        }

        let words: Vec<&str> = run
            .split(|c: char| c.is_whitespace() || c == '-' || c == '\'')
            .filter(|w| !w.is_empty())
            .collect();
        if words.len() < 2 {
            return None;
        }

        let mut parts: Vec<&str> = Vec::with_capacity(words.len());
        for word in &words {
            parts.push(self.dictionary.lookup_english(word)?);
        }
        debug!("Translated run '{}' word by word", run);
        Some(parts.concat())
    }

    fn apply_profanity(&self, text: &str) -> String {
        match self.options.profanity {
            ProfanityMode::Keep => text.to_string(),
            ProfanityMode::Mask => {
                let mut out = text.to_string();
                for (term, _) in self.dictionary.profanity_pairs() {
                    if out.contains(term.as_str()) {
                        let mask = MASK_CHAR.to_string().repeat(term.chars().count());
                        out = out.replace(term.as_str(), &mask);
                    }
                }
                out
            }
            ProfanityMode::Mild => {
                let mut out = text.to_string();
                for (term, euphemism) in self.dictionary.profanity_pairs() {
                    if out.contains(term.as_str()) {
                        out = out.replace(term.as_str(), euphemism);
                    }
                }
                out
            }
        }
    }

    fn apply_numerals(&self, text: &str) -> String {
        match self.options.numbers {
            NumberMode::Chinese => numerals::digits_to_chinese(text),
            NumberMode::Arabic => {
                numerals::chinese_to_digits(text, self.dictionary.numeral_exclusions())
            }
        }
    }

    /// Strip hallucinated brackets anywhere and sentence punctuation at the
    /// end of the line. Runs for every style including `spoken`.
    fn cleanup(text: &str) -> String {
        let without_brackets: String = text
            .chars()
            .filter(|c| !STRIPPED_BRACKETS.contains(c))
            .collect();
        without_brackets
            .trim()
            .trim_end_matches(&TRAILING_PUNCTUATION[..])
            .trim_end()
            .to_string()
    }

    fn split_entry(&self, entry: SubtitleEntry) -> Vec<SubtitleEntry> {
        let length = entry.colloquial.chars().count();
        // Bilingual cues already span two display lines; leave them alone.
        if length <= self.options.split_threshold || entry.colloquial.contains('\n') {
            return vec![entry];
        }

        let Some(split_after) = Self::best_split_point(&entry.colloquial) else {
            return vec![entry];
        };

        let chars: Vec<char> = entry.colloquial.chars().collect();
        let left: String = chars[..=split_after]
            .iter()
            .collect::<String>()
            .trim()
            .to_string();
        let right: String = chars[split_after + 1..]
            .iter()
            .collect::<String>()
            .trim()
            .to_string();
        if left.is_empty() || right.is_empty() {
            return vec![entry];
        }

        // Time is divided proportionally to the character counts of the halves.
        let left_count = left.chars().count() as f64;
        let right_count = right.chars().count() as f64;
        let midpoint =
            entry.start + (entry.end - entry.start) * (left_count / (left_count + right_count));

        let left_formal = self.formal_for(&left);
        let right_formal = self.formal_for(&right);
        let first = SubtitleEntry::new(entry.start, midpoint, left, left_formal);
        let second = SubtitleEntry::new(midpoint, entry.end, right, right_formal);

        let mut out = self.split_entry(first);
        out.extend(self.split_entry(second));
        out
    }

    /// Index of the character after which to split: sentence punctuation
    /// nearest the midpoint, then any whitespace, otherwise none.
    fn best_split_point(text: &str) -> Option<usize> {
        let chars: Vec<char> = text.chars().collect();
        if chars.len() < 2 {
            return None;
        }
        let midpoint = chars.len() / 2;

        let nearest = |is_candidate: fn(char) -> bool| -> Option<usize> {
            chars[..chars.len() - 1]
                .iter()
                .enumerate()
                .filter(|(_, c)| is_candidate(**c))
                .min_by_key(|(i, _)| i.abs_diff(midpoint))
                .map(|(i, _)| i)
        };

        nearest(|c| SPLIT_PUNCTUATION.contains(&c)).or_else(|| nearest(|c| c.is_whitespace()))
    }
}
