/*!
 * Unit tests for numeral conversion functionality
 */

use cantosub::dictionary::DEFAULT_DICTIONARY;
use cantosub::numerals;

fn exclusions() -> &'static [String] {
    DEFAULT_DICTIONARY.numeral_exclusions()
}

/// Test that a numeral run overlapping a protected word is left untouched
#[test]
fn test_chineseToDigits_withRunOverlappingExclusion_shouldKeepRun() {
    // 一一 shares its first character with the protected 星期一
    let result = numerals::chinese_to_digits("星期一一齊去", exclusions());
    assert_eq!(result, "星期一一齊去");
}

/// Test that a full tens form with leading and trailing digits converts
#[test]
fn test_chineseToDigits_withFullTensForm_shouldApplyMagnitudeMath() {
    let result = numerals::chinese_to_digits("二十一隻貓", exclusions());
    assert_eq!(result, "21隻貓");
}

/// Test that several runs in one line convert independently
#[test]
fn test_chineseToDigits_withMultipleRuns_shouldConvertEach() {
    let result = numerals::chinese_to_digits("三十五蚊買二十個", exclusions());
    assert_eq!(result, "35蚊買20個");
}

/// Test that a bare tens word converts even as a single character
#[test]
fn test_chineseToDigits_withBareTensWord_shouldConvertToTen() {
    let result = numerals::chinese_to_digits("十個人", exclusions());
    assert_eq!(result, "10個人");
}

/// Test that a plain run including zero converts digit by digit
#[test]
fn test_chineseToDigits_withZeroInRun_shouldConvertDigitByDigit() {
    let result = numerals::chinese_to_digits("一零三號房", exclusions());
    assert_eq!(result, "103號房");
}

/// Test digit runs embedded in Chinese text convert to numeral words
#[test]
fn test_digitsToChinese_withEmbeddedRun_shouldConvertRunOnly() {
    assert_eq!(numerals::digits_to_chinese("我有42蚊"), "我有四二蚊");
    assert_eq!(numerals::digits_to_chinese("電話係9012"), "電話係九零一二");
}

/// Test that the default exclusion list protects ordinals and weekdays
#[test]
fn test_chineseToDigits_withDefaultExclusions_shouldProtectCommonWords() {
    assert_eq!(numerals::chinese_to_digits("第十名", exclusions()), "第十名");
    assert_eq!(numerals::chinese_to_digits("十分好", exclusions()), "十分好");
    assert_eq!(
        numerals::chinese_to_digits("星期三放假", exclusions()),
        "星期三放假"
    );
}
