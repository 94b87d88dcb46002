//! BibTeX record parsing for llyfr
//!
//! Turns the text of a hand-maintained bibliography into canonical
//! [`LibraryEntry`] values while keeping every record's original source text.
//!
//! Features:
//! - Nom-based tokenizer with whole-file failure on malformed records
//! - LaTeX accent decoding for titles, authors and journals
//! - Author name extraction
//! - Journal abbreviation table with AASTeX macro expansion
//! - Locale-aware title ordering

mod entry;
mod journals;
mod latex;
mod library;
mod names;
pub mod parser;

pub use entry::{BibTeXEntry, BibTeXField, EntryKind};
pub use journals::JournalAbbreviations;
pub use latex::decode_latex;
pub use library::{compare_titles, parse_library, LibraryEntry, UNTITLED};
pub use names::{split_authors, PersonName};
pub use parser::{parse, parse_first_record, ParseError};
