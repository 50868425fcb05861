/*!
 * Unit tests for text transform and styling functionality
 */

use cantosub::dictionary::DictionaryStore;
use cantosub::style_processor::{
    EnglishMode, NumberMode, ProfanityMode, RegisterStyle, StyleOptions, StyleProcessor,
};

fn processor_with(options: StyleOptions) -> StyleProcessor {
    StyleProcessor::new(options, DictionaryStore::builtin())
}

/// Test that the semi style derives a formal variant while keeping the colloquial line
#[test]
fn test_renderEntry_withSemiStyle_shouldDeriveFormalVariant() {
    let processor = processor_with(StyleOptions {
        style: RegisterStyle::Semi,
        ..StyleOptions::default()
    });

    let entry = processor.render_entry(0.0, 2.0, "我哋今日去睇戲");

    // 睇 is on the semi keep list, 我哋 and 今日 are converted
    assert_eq!(entry.colloquial, "我哋今日去睇戲");
    assert_eq!(entry.formal.as_deref(), Some("我們今天去睇戲"));
}

/// Test that the spoken style never produces a formal variant
#[test]
fn test_renderEntry_withSpokenStyle_shouldHaveNoFormalVariant() {
    let processor = StyleProcessor::with_defaults();

    let entry = processor.render_entry(0.0, 1.0, "我哋今日去睇戲");

    assert_eq!(entry.colloquial, "我哋今日去睇戲");
    assert!(entry.formal.is_none());
}

/// Test that translated English feeds the register pass of the formal variant
#[test]
fn test_renderEntry_withWrittenStyleAndTranslate_shouldConvertBothLayers() {
    let processor = processor_with(StyleOptions {
        style: RegisterStyle::Written,
        english: EnglishMode::Translate,
        ..StyleOptions::default()
    });

    let entry = processor.render_entry(0.0, 1.5, "boss話ok");

    assert_eq!(entry.colloquial, "老闆話好");
    assert_eq!(entry.formal.as_deref(), Some("老闆說好"));
}

/// Test that the mild profanity policy swaps in euphemisms
#[test]
fn test_transformText_withMildProfanity_shouldUseEuphemism() {
    let processor = processor_with(StyleOptions {
        profanity: ProfanityMode::Mild,
        ..StyleOptions::default()
    });

    assert_eq!(processor.transform_text("你真係好撚煩"), "你真係非常煩");
}

/// Test that a glossary miss inside a multi-word run keeps the whole run
#[test]
fn test_transformText_withTranslate_shouldBeAllOrNothingPerRun() {
    let processor = processor_with(StyleOptions {
        english: EnglishMode::Translate,
        ..StyleOptions::default()
    });

    // Whole-run glossary hit
    assert_eq!(processor.transform_text("thank you"), "謝謝");
    // "thank" alone is not in the glossary, so the run passes through
    assert_eq!(processor.transform_text("thank you boss"), "thank you boss");
    // Hyphenated run resolved word by word
    assert_eq!(processor.transform_text("good-morning"), "好早晨");
}

/// Test that the numeral pass respects the exclusion list in a full transform
#[test]
fn test_transformText_withArabicNumbers_shouldProtectExcludedWords() {
    let processor = StyleProcessor::with_defaults();

    assert_eq!(processor.transform_text("星期一去買五十six"), "星期一去買50six");
    // The run overlapping 星期一 is left alone entirely
    assert_eq!(processor.transform_text("星期一一齊去"), "星期一一齊去");
}

/// Test that Chinese number mode rewrites digit runs digit by digit
#[test]
fn test_transformText_withChineseNumbers_shouldRewriteDigitRuns() {
    let processor = processor_with(StyleOptions {
        numbers: NumberMode::Chinese,
        ..StyleOptions::default()
    });

    assert_eq!(processor.transform_text("我有42蚊"), "我有四二蚊");
}

/// Test that long entries split at punctuation with proportional timing
#[test]
fn test_splitLongEntries_withPunctuation_shouldSplitProportionally() {
    let processor = processor_with(StyleOptions {
        style: RegisterStyle::Semi,
        split_long: true,
        split_threshold: 8,
        ..StyleOptions::default()
    });

    let entry = processor.render_entry(0.0, 3.4, "我哋係朋友，佢哋係同事，你哋係家人");
    let pieces = processor.split_long_entries(vec![entry]);

    assert_eq!(pieces.len(), 3);
    assert_eq!(pieces[0].colloquial, "我哋係朋友，");
    assert_eq!(pieces[1].colloquial, "佢哋係同事，");
    assert_eq!(pieces[2].colloquial, "你哋係家人");

    // Each piece re-derives its own formal variant
    assert_eq!(pieces[0].formal.as_deref(), Some("我們是朋友，"));
    assert_eq!(pieces[2].formal.as_deref(), Some("你們是家人"));

    // Timeline stays contiguous across the split
    assert!((pieces[0].start - 0.0).abs() < f64::EPSILON);
    assert!((pieces[2].end - 3.4).abs() < f64::EPSILON);
    for pair in pieces.windows(2) {
        assert_eq!(
            pair[0].end, pair[1].start,
            "Split pieces must share their boundary timestamp"
        );
    }
}

/// Test that splitting falls back to whitespace when no punctuation exists
#[test]
fn test_splitLongEntries_withoutPunctuation_shouldSplitAtWhitespace() {
    let processor = processor_with(StyleOptions {
        split_long: true,
        split_threshold: 10,
        ..StyleOptions::default()
    });

    let entry = processor.render_entry(0.0, 3.0, "hello there friends");
    let pieces = processor.split_long_entries(vec![entry]);

    let texts: Vec<&str> = pieces.iter().map(|p| p.colloquial.as_str()).collect();
    assert_eq!(texts, vec!["hello", "there", "friends"]);
    for piece in &pieces {
        assert!(piece.colloquial.chars().count() <= 10);
    }
}

/// Test that bilingual two-line cues are never split
#[test]
fn test_splitLongEntries_withBilingualCue_shouldLeaveItAlone() {
    let processor = processor_with(StyleOptions {
        english: EnglishMode::Bilingual,
        split_long: true,
        split_threshold: 4,
        ..StyleOptions::default()
    });

    let entry = processor.render_entry(0.0, 1.0, "hello朋友");
    assert!(entry.colloquial.contains('\n'), "Bilingual cue should be two lines");

    let pieces = processor.split_long_entries(vec![entry]);
    assert_eq!(pieces.len(), 1);
    assert_eq!(pieces[0].colloquial, "hello朋友\n你好朋友");
}

/// Test that entries at or under the threshold pass through the splitter
#[test]
fn test_splitLongEntries_withShortEntry_shouldNotSplit() {
    let processor = processor_with(StyleOptions {
        split_long: true,
        split_threshold: 25,
        ..StyleOptions::default()
    });

    let entry = processor.render_entry(0.0, 1.0, "短句");
    let pieces = processor.split_long_entries(vec![entry]);

    assert_eq!(pieces.len(), 1);
    assert_eq!(pieces[0].colloquial, "短句");
}

/// Test that every style enum round-trips through Display and FromStr
#[test]
fn test_styleEnums_shouldRoundTripThroughStrings() {
    for style in ["spoken", "semi", "written"] {
        let parsed: RegisterStyle = style.parse().expect("Style should parse");
        assert_eq!(parsed.to_string(), style);
    }
    for mode in ["keep", "translate", "bilingual"] {
        let parsed: EnglishMode = mode.parse().expect("English mode should parse");
        assert_eq!(parsed.to_string(), mode);
    }
    for mode in ["arabic", "chinese"] {
        let parsed: NumberMode = mode.parse().expect("Number mode should parse");
        assert_eq!(parsed.to_string(), mode);
    }
    for mode in ["keep", "mask", "mild"] {
        let parsed: ProfanityMode = mode.parse().expect("Profanity mode should parse");
        assert_eq!(parsed.to_string(), mode);
    }

    assert!("formal".parse::<RegisterStyle>().is_err());
}

/// Test that options deserialized from an empty object use the documented defaults
#[test]
fn test_styleOptions_fromEmptyJson_shouldUseDefaults() {
    let options: StyleOptions = serde_json::from_str("{}").expect("Empty object should parse");

    assert_eq!(options.style, RegisterStyle::Spoken);
    assert_eq!(options.english, EnglishMode::Keep);
    assert_eq!(options.numbers, NumberMode::Arabic);
    assert_eq!(options.profanity, ProfanityMode::Keep);
    assert!(!options.split_long);
    assert_eq!(options.split_threshold, 25);
}
