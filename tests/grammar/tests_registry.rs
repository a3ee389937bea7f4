use std::sync::Arc;

use arbor::grammar::{ABI_VERSION, CompiledUnit};
use arbor::{GrammarError, Registry, parse_batch};
use rstest::rstest;
use tempfile::TempDir;

use crate::helpers::grammars::{LANGUAGES, javascript, python};
use crate::helpers::source_fixtures::{JS_FUNCTION, JS_PROGRAM};

fn unit_on_disk() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("languages.json");
    LANGUAGES.write_to(&path).unwrap();
    (dir, path)
}

#[test]
fn test_load_from_path() {
    let (_dir, path) = unit_on_disk();
    let registry = Registry::new();
    let grammar = registry.load(&path, "javascript").unwrap();
    assert_eq!(grammar.name(), "javascript");
    assert!(grammar.external_scanner().is_none());

    let python = registry.load(&path, "python").unwrap();
    assert_eq!(python.external_scanner(), Some("indent"));
    assert_eq!(registry.cached_count(), 2);
}

#[test]
fn test_repeated_load_is_shared() {
    let (_dir, path) = unit_on_disk();
    let registry = Registry::new();
    let first = registry.load(&path, "python").unwrap();
    let second = registry.load(&path, "python").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.cached_count(), 1);

    assert!(Arc::ptr_eq(&python(), &python()));
}

#[test]
fn test_bytes_and_unit_sources_agree() {
    let registry = Registry::new();
    let bytes = LANGUAGES.to_vec().unwrap();
    let from_bytes = registry.load(&bytes[..], "javascript").unwrap();
    let from_unit = registry.load_unit(&LANGUAGES, "javascript").unwrap();
    assert!(Arc::ptr_eq(&from_bytes, &from_unit));
}

#[test]
fn test_repeated_unit_load_is_shared() {
    let registry = Registry::new();
    let first = registry.load_unit(&LANGUAGES, "python").unwrap();
    let second = registry.load_unit(&LANGUAGES, "python").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.cached_count(), 1);
}

#[test]
fn test_edited_unit_is_not_served_from_cache() {
    let registry = Registry::new();
    let mut unit = CompiledUnit::clone(&LANGUAGES);
    let original = registry.load_unit(&unit, "python").unwrap();
    assert_eq!(original.external_scanner(), Some("indent"));

    unit.languages_mut()[0].external_scanner = Some("heredoc".to_string());
    let err = registry.load_unit(&unit, "python").unwrap_err();
    assert!(matches!(err, GrammarError::UnknownScanner(ref name) if name == "heredoc"), "{err:?}");
    assert_eq!(registry.cached_count(), 1);
}

#[test]
fn test_unknown_language() {
    let (_dir, path) = unit_on_disk();
    let err = Registry::new().load(&path, "cobol").unwrap_err();
    assert!(err.is_not_found(), "{err}");
    assert!(!err.is_load_error());
    match err {
        GrammarError::NotFound { language, available } => {
            assert_eq!(language, "cobol");
            assert_eq!(available, ["python", "javascript"]);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_abi_mismatch() {
    let mut unit = CompiledUnit::clone(&LANGUAGES);
    unit.set_abi_version(ABI_VERSION + 1);
    let bytes = unit.to_vec().unwrap();

    let err = Registry::new().load(&bytes[..], "python").unwrap_err();
    assert!(err.is_load_error());
    assert!(matches!(err, GrammarError::AbiMismatch { found, expected } if found == ABI_VERSION + 1 && expected == ABI_VERSION));
}

#[rstest]
#[case(b"".as_slice())]
#[case(b"not json".as_slice())]
#[case(br#"{"abi_version": 1}"#.as_slice())]
#[case(br#"{"abi_version": 1, "languages": [{"name": "x"}]}"#.as_slice())]
fn test_garbage_is_a_load_error(#[case] bytes: &[u8]) {
    let err = Registry::new().load(bytes, "python").unwrap_err();
    assert!(err.is_load_error(), "{err}");
    assert!(matches!(err, GrammarError::Json(_)), "{err:?}");
}

#[test]
fn test_missing_file_is_a_load_error() {
    let dir = TempDir::new().unwrap();
    let err = Registry::new().load(&dir.path().join("absent.json"), "python").unwrap_err();
    assert!(matches!(err, GrammarError::Io(_)));
}

#[test]
fn test_corrupted_table_is_rejected() {
    let mut unit = CompiledUnit::clone(&LANGUAGES);
    unit.languages_mut()[1].productions[0].lhs = 0;
    let err = Registry::new().load_unit(&unit, "javascript").unwrap_err();
    assert!(matches!(err, GrammarError::Malformed { .. }), "{err:?}");
}

#[test]
fn test_unregistered_scanner() {
    let mut unit = CompiledUnit::clone(&LANGUAGES);
    unit.languages_mut()[0].external_scanner = Some("heredoc".to_string());
    let err = Registry::new().load_unit(&unit, "python").unwrap_err();
    assert!(matches!(err, GrammarError::UnknownScanner(ref name) if name == "heredoc"));
}

#[test]
fn test_parse_batch_keeps_order() {
    let grammar = javascript();
    let texts = [JS_FUNCTION, "a();", JS_PROGRAM, "", "x(;"];
    let results = parse_batch(&grammar, &texts);
    assert_eq!(results.len(), texts.len());
    for (text, result) in texts.iter().zip(&results) {
        let tree = result.as_ref().unwrap();
        assert_eq!(tree.text(), *text);
        assert_eq!(tree.root_node().end_byte(), text.len());
    }
    assert!(results[4].as_ref().unwrap().root_node().has_error());
}
