//! Library entries: the canonical view of a bibliography record

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use serde::Serialize;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::entry::{BibTeXEntry, EntryKind};
use crate::journals::JournalAbbreviations;
use crate::latex::decode_latex;
use crate::names::split_authors;
use crate::parser::{parse, ParseError};

/// Title used for records without one
pub const UNTITLED: &str = "untitled";

/// Read-only view of one bibliography record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryEntry {
    pub cite_key: String,
    pub title: String,
    pub authors: Vec<String>,
    /// Publication year; 0 when absent or unparseable
    pub year: u32,
    pub kind: EntryKind,
    pub journal: Option<String>,
    /// Verbatim source text of the record
    pub raw_bibtex: String,
    /// Document filename from the `file` field
    pub file: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
}

impl LibraryEntry {
    pub fn from_record(record: &BibTeXEntry, journals: &JournalAbbreviations) -> Self {
        let title = record
            .title()
            .map(decode_latex)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNTITLED.to_string());

        let authors = record
            .author()
            .map(|field| {
                split_authors(field)
                    .iter()
                    .map(|name| name.display().to_string())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            cite_key: record.cite_key.clone(),
            title,
            authors,
            year: record.year().map_or(0, parse_year),
            kind: record.kind(),
            journal: record
                .journal()
                .filter(|j| !j.trim().is_empty())
                .map(|j| journals.abbreviate(j)),
            raw_bibtex: record.raw_bibtex.clone(),
            file: record.file().and_then(file_reference),
            url: record
                .get_field("url")
                .or_else(|| record.get_field("adsurl"))
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty()),
            abstract_text: record
                .abstract_text()
                .map(decode_latex)
                .filter(|a| !a.is_empty()),
        }
    }

    /// Abbreviated author list for one-line display
    pub fn short_authors(&self) -> String {
        if self.authors.len() > 3 {
            let first = &self.authors[0];
            if first.contains("Collaboration") {
                first.clone()
            } else {
                format!("{first}, et al.")
            }
        } else {
            self.authors.join(", ")
        }
    }

    /// Extra terms a search matches besides the title
    pub fn keywords(&self) -> Vec<String> {
        let mut keywords = self.authors.clone();
        keywords.push(self.year.to_string());
        keywords.push(self.journal.clone().unwrap_or_default());
        keywords
    }

    /// Whether every whitespace-separated term of `query` occurs
    /// (case-insensitively) in the title or a keyword
    pub fn matches(&self, query: &str) -> bool {
        let haystack = std::iter::once(self.title.clone())
            .chain(self.keywords())
            .map(|s| s.to_lowercase())
            .collect::<Vec<_>>();
        query
            .split_whitespace()
            .map(str::to_lowercase)
            .all(|term| haystack.iter().any(|h| h.contains(&term)))
    }

    /// Location of the attached document inside `library_dir`
    pub fn document_path(&self, library_dir: &Path) -> Option<PathBuf> {
        self.file.as_ref().map(|name| library_dir.join(name))
    }
}

/// Parse bibliography text into entries sorted by title.
///
/// Fails as a whole if any record cannot be tokenized.
pub fn parse_library(
    text: &str,
    journals: &JournalAbbreviations,
) -> Result<Vec<LibraryEntry>, ParseError> {
    let mut entries: Vec<LibraryEntry> = parse(text)?
        .iter()
        .map(|record| LibraryEntry::from_record(record, journals))
        .collect();
    entries.sort_by(|a, b| compare_titles(&a.title, &b.title));
    Ok(entries)
}

/// Leading digits of the trimmed value, or 0
fn parse_year(value: &str) -> u32 {
    let value = decode_latex(value);
    let digits: String = value.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

/// Filename from a `:name:kind` file value
fn file_reference(value: &str) -> Option<String> {
    value
        .split(':')
        .nth(1)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Locale-style title comparison.
///
/// Titles compare first ignoring case and diacritics, then by accents, then
/// with lowercase ordered before uppercase.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    fold(a)
        .cmp(&fold(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| invert_case(a).cmp(&invert_case(b)))
}

fn fold(s: &str) -> String {
    s.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn invert_case(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_uppercase() {
                c.to_ascii_lowercase()
            } else {
                c.to_ascii_uppercase()
            }
        })
        .collect()
}
