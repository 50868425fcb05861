/*!
 * Numeral normalization between Arabic digits and Chinese numeral words.
 *
 * Two directions, used by the numeral pass of the style processor:
 * - `digits_to_chinese` rewrites every run of Arabic digits digit-by-digit
 *   (123 becomes 一二三, no magnitude words are introduced).
 * - `chinese_to_digits` rewrites numeral-word runs into digits, handling the
 *   tens magnitude word: 十 is 10, 十一 is 11, 二十 is 20, 二十一 is 21.
 *
 * A single bare numeral character is never converted since it is almost
 * always part of a word rather than a quantity, and callers can protect an
 * exclusion list of common words (第一, 星期一, ...) from conversion.
 */

use once_cell::sync::Lazy;
use regex::Regex;

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

// A tens form with optional leading and trailing digit, or a plain run of
// at least two numeral characters. Order matters: the tens form must win
// at the same starting position.
static NUMERAL_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[零一二三四五六七八九]?十[零一二三四五六七八九]?|[零一二三四五六七八九]{2,}")
        .unwrap()
});

const DIGIT_WORDS: [char; 10] = ['零', '一', '二', '三', '四', '五', '六', '七', '八', '九'];

fn digit_value(c: char) -> Option<u32> {
    DIGIT_WORDS.iter().position(|&w| w == c).map(|p| p as u32)
}

/// Rewrite every maximal run of Arabic digits into numeral words, one word
/// per digit.
pub fn digits_to_chinese(text: &str) -> String {
    DIGIT_RUN
        .replace_all(text, |caps: &regex::Captures| {
            caps[0]
                .chars()
                .map(|c| {
                    c.to_digit(10)
                        .map(|d| DIGIT_WORDS[d as usize])
                        .unwrap_or(c)
                })
                .collect::<String>()
        })
        .into_owned()
}

/// Rewrite numeral-word runs into Arabic digits, skipping any run that
/// overlaps an occurrence of an excluded word.
pub fn chinese_to_digits(text: &str, exclusions: &[String]) -> String {
    let protected = protected_ranges(text, exclusions);

    let mut result = String::with_capacity(text.len());
    let mut last_end = 0;

    for m in NUMERAL_RUN.find_iter(text) {
        result.push_str(&text[last_end..m.start()]);
        if overlaps_protected(&protected, m.start(), m.end()) {
            result.push_str(m.as_str());
        } else {
            result.push_str(&numeral_run_to_digits(m.as_str()));
        }
        last_end = m.end();
    }
    result.push_str(&text[last_end..]);
    result
}

/// Convert one matched numeral-word run.
fn numeral_run_to_digits(run: &str) -> String {
    let chars: Vec<char> = run.chars().collect();

    if let Some(pos) = chars.iter().position(|&c| c == '十') {
        // Tens form: a bare 十 implies a leading one.
        let tens = if pos == 0 {
            1
        } else {
            digit_value(chars[pos - 1]).unwrap_or(1)
        };
        let ones = chars
            .get(pos + 1)
            .and_then(|&c| digit_value(c))
            .unwrap_or(0);
        return (tens * 10 + ones).to_string();
    }

    // Plain run: digit by digit, no magnitude math.
    chars
        .iter()
        .filter_map(|&c| digit_value(c))
        .map(|d| char::from_digit(d, 10).unwrap_or('0'))
        .collect()
}

/// Byte ranges of every occurrence of every excluded word.
fn protected_ranges(text: &str, exclusions: &[String]) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    for word in exclusions {
        if word.is_empty() {
            continue;
        }
        for (start, matched) in text.match_indices(word.as_str()) {
            ranges.push((start, start + matched.len()));
        }
    }
    ranges.sort_unstable();
    ranges
}

fn overlaps_protected(ranges: &[(usize, usize)], start: usize, end: usize) -> bool {
    ranges.iter().any(|&(s, e)| start < e && s < end)
}
