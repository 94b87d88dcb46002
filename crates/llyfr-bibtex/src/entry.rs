//! BibTeX record data structures

use serde::Serialize;

/// Coarse category of a record, derived from its `@type` tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Paper,
    Book,
    Thesis,
    Misc,
}

impl EntryKind {
    /// Map a BibTeX type tag to a kind.
    ///
    /// Only `article` is a paper. Any tag containing `book` (`inbook`,
    /// `booklet`) is a book and any tag containing `thesis` (`phdthesis`,
    /// `mastersthesis`) is a thesis. Everything else, including a missing
    /// tag, is misc.
    pub fn from_type_tag(tag: Option<&str>) -> Self {
        let Some(tag) = tag else {
            return Self::Misc;
        };
        let tag = tag.to_lowercase();
        if tag == "article" {
            Self::Paper
        } else if tag.contains("book") {
            Self::Book
        } else if tag.contains("thesis") {
            Self::Thesis
        } else {
            Self::Misc
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paper => "paper",
            Self::Book => "book",
            Self::Thesis => "thesis",
            Self::Misc => "misc",
        }
    }
}

/// A single BibTeX field (key-value pair)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibTeXField {
    pub key: String,
    pub value: String,
}

/// A tokenized BibTeX record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibTeXEntry {
    pub cite_key: String,
    /// Type tag as written, e.g. `Article`
    pub entry_type: String,
    pub fields: Vec<BibTeXField>,
    /// Exact source text from `@` through the closing brace
    pub raw_bibtex: String,
    /// 1-based line of the `@` in the parsed input
    pub line: u32,
}

impl BibTeXEntry {
    pub fn new(cite_key: impl Into<String>, entry_type: impl Into<String>) -> Self {
        Self {
            cite_key: cite_key.into(),
            entry_type: entry_type.into(),
            fields: Vec::new(),
            raw_bibtex: String::new(),
            line: 1,
        }
    }

    pub fn add_field(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.push(BibTeXField {
            key: key.into(),
            value: value.into(),
        });
    }

    /// Get a field value by key (case-insensitive)
    pub fn get_field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.key.eq_ignore_ascii_case(key))
            .map(|f| f.value.as_str())
    }

    pub fn kind(&self) -> EntryKind {
        EntryKind::from_type_tag(Some(&self.entry_type))
    }

    pub fn title(&self) -> Option<&str> {
        self.get_field("title")
    }

    pub fn author(&self) -> Option<&str> {
        self.get_field("author")
    }

    pub fn year(&self) -> Option<&str> {
        self.get_field("year")
    }

    pub fn journal(&self) -> Option<&str> {
        self.get_field("journal")
    }

    pub fn abstract_text(&self) -> Option<&str> {
        self.get_field("abstract")
    }

    pub fn file(&self) -> Option<&str> {
        self.get_field("file")
    }
}
