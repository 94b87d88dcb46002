//! Library parsing integration tests

use llyfr_bibtex::{parse_library, EntryKind, JournalAbbreviations, ParseError};
use proptest::prelude::*;
use rstest::rstest;

const LIBRARY: &str = r#"% llyfr bibliography

@ARTICLE{2020PhRvL.124a5101S,
       author = {{Smith}, Alice and {Jones}, Bob},
        title = "{Weak Turbulence in Plasmas}",
      journal = {Physical Review Letters},
         year = 2020,
         file = {:Smith.Jones_2020_weak_turbulence_in_plasmas.pdf:PDF}
}

@PHDTHESIS{2018PhDT........12L,
       author = {{Lee}, Chris},
        title = "{An Ab Initio Study of Shocks}",
       school = {University of Somewhere},
         year = 2018
}

@BOOK{knuth,
  author = {Donald E. Knuth},
  title  = {The {Art} of Computer Programming},
  year   = {1968},
}

@misc{untitled-note,
  note = {Reminder to find the title}
}
"#;

#[test]
fn test_parse_library_file() {
    let entries = parse_library(LIBRARY, &JournalAbbreviations::default()).unwrap();
    assert_eq!(entries.len(), 4);

    let titles: Vec<_> = entries.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "An Ab Initio Study of Shocks",
            "The Art of Computer Programming",
            "untitled",
            "Weak Turbulence in Plasmas",
        ]
    );

    let plasma = &entries[3];
    assert_eq!(plasma.kind, EntryKind::Paper);
    assert_eq!(plasma.authors, vec!["Smith", "Jones"]);
    assert_eq!(plasma.journal.as_deref(), Some("PRL"));
    assert_eq!(
        plasma.file.as_deref(),
        Some("Smith.Jones_2020_weak_turbulence_in_plasmas.pdf")
    );

    let thesis = &entries[0];
    assert_eq!(thesis.kind, EntryKind::Thesis);
    assert_eq!(thesis.year, 2018);

    let book = &entries[1];
    assert_eq!(book.kind, EntryKind::Book);
    assert_eq!(book.authors, vec!["Donald E. Knuth"]);
    assert!(book.raw_bibtex.contains("title  = {The {Art} of Computer Programming}"));

    assert_eq!(entries[2].year, 0);
}

#[test]
fn test_empty_library() {
    let entries = parse_library("", &JournalAbbreviations::default()).unwrap();
    assert!(entries.is_empty());
}

#[test]
fn test_unparseable_library_reports_line() {
    let text = format!("{LIBRARY}\n@article{{broken,\n  title = {{Never closed\n");
    let err = parse_library(&text, &JournalAbbreviations::default()).unwrap_err();
    assert!(matches!(err, ParseError::UnbalancedBraces { line: 28 }));
}

#[test]
fn test_duplicate_records_are_kept() {
    let text = "@misc{a, title = {Same}, year = 2000}\n@misc{a, title = {Same}, year = 2000}";
    let entries = parse_library(text, &JournalAbbreviations::default()).unwrap();
    assert_eq!(entries.len(), 2);
}

#[rstest]
#[case(None, EntryKind::Misc)]
#[case(Some(""), EntryKind::Misc)]
#[case(Some("article"), EntryKind::Paper)]
#[case(Some("inbook"), EntryKind::Book)]
#[case(Some("book"), EntryKind::Book)]
#[case(Some("mastersthesis"), EntryKind::Thesis)]
#[case(Some("phdthesis"), EntryKind::Thesis)]
#[case(Some("inproceedings"), EntryKind::Misc)]
#[case(Some("software"), EntryKind::Misc)]
fn test_type_mapping(#[case] tag: Option<&str>, #[case] expected: EntryKind) {
    assert_eq!(EntryKind::from_type_tag(tag), expected);
}

proptest! {
    #[test]
    fn test_type_mapping_is_total(tag in ".{0,20}") {
        let kind = EntryKind::from_type_tag(Some(&tag));
        prop_assert!(matches!(
            kind,
            EntryKind::Paper | EntryKind::Book | EntryKind::Thesis | EntryKind::Misc
        ));
    }

    #[test]
    fn test_year_is_never_negative(year in "[-0-9a-z ]{0,8}") {
        let text = format!("@misc{{k, year = {{{year}}}}}");
        let entries = parse_library(&text, &JournalAbbreviations::default()).unwrap();
        let digits: String = year.trim().chars().take_while(char::is_ascii_digit).collect();
        prop_assert_eq!(entries[0].year, digits.parse::<u32>().unwrap_or(0));
    }
}
