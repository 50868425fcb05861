/*!
 * Unit tests for dictionary store overrides
 */

use anyhow::Result;
use cantosub::dictionary::{DictionaryFiles, DictionaryStore};

use crate::common;

/// Test that a register override file adds new pairs alongside the built-ins
#[test]
fn test_withOverrides_withRegisterFile_shouldAddNewPairs() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        &temp_dir.path().to_path_buf(),
        "register.json",
        r#"{"老細": "老闆"}"#,
    )?;

    let store = DictionaryStore::with_overrides(&DictionaryFiles {
        register: Some(path),
        ..DictionaryFiles::default()
    })?;

    let pairs = store.register_pairs();
    assert!(pairs.iter().any(|(k, v)| k == "老細" && v == "老闆"));
    // Built-ins survive the merge
    assert!(pairs.iter().any(|(k, v)| k == "係" && v == "是"));
    Ok(())
}

/// Test that an override with an existing key replaces the built-in value
#[test]
fn test_withOverrides_withExistingKey_shouldReplaceBuiltinValue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        &temp_dir.path().to_path_buf(),
        "register.json",
        r#"{"係": "爲"}"#,
    )?;

    let store = DictionaryStore::with_overrides(&DictionaryFiles {
        register: Some(path),
        ..DictionaryFiles::default()
    })?;

    let replaced = store
        .register_pairs()
        .iter()
        .find(|(k, _)| k == "係")
        .map(|(_, v)| v.as_str());
    assert_eq!(replaced, Some("爲"));
    Ok(())
}

/// Test that English override keys are matched case-insensitively
#[test]
fn test_withOverrides_withUppercaseEnglishKey_shouldLowercaseIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        &temp_dir.path().to_path_buf(),
        "english.json",
        r#"{"HELLO": "哈囉"}"#,
    )?;

    let store = DictionaryStore::with_overrides(&DictionaryFiles {
        english: Some(path),
        ..DictionaryFiles::default()
    })?;

    assert_eq!(store.lookup_english("hello"), Some("哈囉"));
    assert_eq!(store.lookup_english("Hello"), Some("哈囉"));
    Ok(())
}

/// Test that a configured but missing override file is an error
#[test]
fn test_withOverrides_withMissingFile_shouldFail() {
    let files = DictionaryFiles {
        profanity: Some("/nonexistent/profanity.json".into()),
        ..DictionaryFiles::default()
    };

    assert!(DictionaryStore::with_overrides(&files).is_err());
}

/// Test that a non-object override file is rejected
#[test]
fn test_withOverrides_withMalformedJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        &temp_dir.path().to_path_buf(),
        "register.json",
        r#"["not", "an", "object"]"#,
    )?;

    let files = DictionaryFiles {
        register: Some(path),
        ..DictionaryFiles::default()
    };
    assert!(DictionaryStore::with_overrides(&files).is_err());
    Ok(())
}

/// Test that an empty override set reproduces the built-in store
#[test]
fn test_withOverrides_withNoFiles_shouldMatchBuiltin() -> Result<()> {
    let builtin = DictionaryStore::builtin();
    let store = DictionaryStore::with_overrides(&DictionaryFiles::default())?;

    assert_eq!(store.register_pairs().len(), builtin.register_pairs().len());
    assert_eq!(store.profanity_pairs().len(), builtin.profanity_pairs().len());
    Ok(())
}
