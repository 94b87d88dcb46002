//! Property tests for filename derivation and field injection

use std::fs;

use llyfr_bibtex::{parse_first_record, JournalAbbreviations, LibraryEntry};
use llyfr_core::{derive_filename, inject_file_field, resolve_unique_path, slugify_title};
use proptest::prelude::*;
use regex::Regex;

fn kind() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("article"), Just("ARTICLE"), Just("book"), Just("misc")]
}

/// Records laid out one field per line, like ADS exports, with and without
/// an existing `file` field
fn multi_line_record() -> impl Strategy<Value = String> {
    let existing_file = prop_oneof![
        Just(String::new()),
        Just(",\n  file = {:old.pdf:PDF}".to_string()),
        Just(",\n  File = {:a.pdf:PDF;\n     :b.pdf:PDF}".to_string()),
        Just(",\n\tfile = \"old.pdf\"".to_string()),
        Just(",\n  file = (:old.pdf:PDF)".to_string()),
    ];
    (
        kind(),
        "[a-z][a-z0-9]{0,8}",
        "[A-Za-z][A-Za-z ]{0,20}",
        1900u32..2100,
        existing_file,
        prop_oneof![Just(""), Just(","), Just(",\n")],
        prop_oneof![Just(""), Just("\n"), Just("\n\n\n")],
    )
        .prop_map(|(kind, key, title, year, file, comma, trailing)| {
            format!("@{kind}{{{key},\n  title = {{{title}}},\n  year = {year}{file}{comma}\n}}{trailing}")
        })
}

/// Hand-typed records with every field on one line, the last one sharing
/// the line with the closing brace
fn single_line_record() -> impl Strategy<Value = String> {
    let existing_file = prop_oneof![
        Just(""),
        Just(", file = {:old.pdf:PDF}"),
        Just(", FILE = \"old.pdf\""),
        Just(", file = (:old.pdf:PDF)"),
    ];
    (
        kind(),
        "[a-z][a-z0-9]{0,8}",
        "[A-Za-z][A-Za-z ]{0,20}",
        1900u32..2100,
        existing_file,
        any::<bool>(),
    )
        .prop_map(|(kind, key, title, year, file, file_last)| {
            if file_last {
                format!("@{kind}{{{key}, title = {{{title}}}, year = {year}{file}}}")
            } else {
                format!("@{kind}{{{key}, title = {{{title}}}{file}, year = {{{year}}}}}")
            }
        })
}

fn record() -> impl Strategy<Value = String> {
    prop_oneof![multi_line_record(), single_line_record()]
}

fn filename() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9._ -]{0,30}".prop_map(|stem| format!("{stem}.pdf"))
}

fn read_back_file(text: &str) -> Option<String> {
    let parsed = parse_first_record(text).unwrap();
    LibraryEntry::from_record(&parsed, &JournalAbbreviations::default()).file
}

proptest! {
    #[test]
    fn test_injection_is_idempotent(record in record(), filename in filename()) {
        let once = inject_file_field(&record, &filename);
        prop_assert_eq!(inject_file_field(&once, &filename), once);
    }

    #[test]
    fn test_injected_file_reads_back(record in record(), filename in filename()) {
        let injected = inject_file_field(&record, &filename);
        prop_assert_eq!(read_back_file(&injected), Some(filename));
        prop_assert_eq!(injected.to_lowercase().matches("file =").count(), 1);
    }

    #[test]
    fn test_derived_filename_reads_back(
        record in record(),
        title in "\\PC{0,40}",
        authors in prop::collection::vec("[A-Za-z][A-Za-z.:/ ]{0,11}", 0..4),
        year in 0u32..3000,
    ) {
        let filename = derive_filename(&title, &authors, year);
        prop_assert!(!filename.contains(':'), "filename {:?}", filename);
        let injected = inject_file_field(&record, &filename);
        prop_assert_eq!(read_back_file(&injected), Some(filename));
    }

    #[test]
    fn test_slug_is_filesystem_safe(title in "\\PC{0,120}") {
        let safe = Regex::new(r"^[a-z0-9_]{0,60}$").unwrap();
        let slug = slugify_title(&title);
        prop_assert!(safe.is_match(&slug), "slug {:?}", slug);
        prop_assert!(!slug.starts_with('_') && !slug.ends_with('_'));
        prop_assert!(!slug.contains("__"));
    }

    #[test]
    fn test_derive_filename_is_deterministic(
        title in "\\PC{0,40}",
        authors in prop::collection::vec("[A-Za-z. ]{1,12}", 0..5),
        year in 0u32..3000,
    ) {
        prop_assert_eq!(
            derive_filename(&title, &authors, year),
            derive_filename(&title, &authors, year)
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn test_resolved_path_is_unused(taken in 0usize..25) {
        let dir = tempfile::tempdir().unwrap();
        let mut existing = Vec::new();
        for n in 0..taken {
            let name = if n == 0 {
                "doc.pdf".to_string()
            } else {
                format!("doc_{}.pdf", n + 1)
            };
            fs::write(dir.path().join(&name), b"x").unwrap();
            existing.push(dir.path().join(name));
        }

        let path = resolve_unique_path(dir.path(), "doc.pdf").unwrap();
        prop_assert!(!existing.contains(&path));
        prop_assert!(!path.exists());
    }
}
