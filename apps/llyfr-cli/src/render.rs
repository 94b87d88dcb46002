//! Plain-text rendering of library entries and ADS results

use std::path::Path;

use llyfr_core::ads::{AdsRecord, AdsSearchDoc};
use llyfr_core::LibraryEntry;

const ATTACHED: &str = "*";

/// One line per entry: attachment marker, title, authors, year, journal
pub fn list_line(entry: &LibraryEntry) -> String {
    let marker = if entry.file.is_some() { ATTACHED } else { " " };
    let year = if entry.year == 0 {
        String::new()
    } else {
        entry.year.to_string()
    };
    let mut line = format!("{marker} {}", entry.title);
    for part in [
        entry.short_authors(),
        year,
        entry.journal.clone().unwrap_or_default(),
    ] {
        if !part.is_empty() {
            line.push_str(" | ");
            line.push_str(&part);
        }
    }
    line
}

pub fn details(entry: &LibraryEntry, library_dir: &Path) -> String {
    let mut out = format!("# {}\n\n", entry.title);
    field(&mut out, "Key", &entry.cite_key);
    field(&mut out, "Type", entry.kind.as_str());
    field(&mut out, "Authors", &entry.authors.join("; "));
    if entry.year != 0 {
        field(&mut out, "Year", &entry.year.to_string());
    }
    if let Some(journal) = &entry.journal {
        field(&mut out, "Journal", journal);
    }
    if let Some(url) = &entry.url {
        field(&mut out, "URL", url);
    }
    if let Some(path) = entry.document_path(library_dir) {
        let status = if path.exists() { "" } else { " (missing)" };
        field(&mut out, "Document", &format!("{}{status}", path.display()));
    }
    if let Some(abstract_text) = &entry.abstract_text {
        out.push_str(&format!("\n{abstract_text}\n"));
    }
    out.push_str(&format!("\n{}\n", entry.raw_bibtex));
    out
}

pub fn search_line(doc: &AdsSearchDoc) -> String {
    format!(
        "{}  {} | {} | {}",
        doc.bibcode,
        doc.title(),
        short_names(doc.authors()),
        doc.year.as_deref().unwrap_or("")
    )
}

pub fn ads_details(record: &AdsRecord) -> String {
    let mut out = format!("# {}\n\n", record.title());
    field(&mut out, "Bibcode", &record.bibcode);
    field(&mut out, "Authors", &record.authors().join("; "));
    if let Some(year) = &record.year {
        field(&mut out, "Year", year);
    }
    if let Some(publication) = &record.publication {
        field(&mut out, "Journal", publication);
    }
    if let Some(doi) = record.doi() {
        field(&mut out, "DOI", doi);
    }
    if let Some(abstract_text) = &record.abstract_text {
        out.push_str(&format!("\n{abstract_text}\n"));
    }
    out
}

fn field(out: &mut String, label: &str, value: &str) {
    if !value.is_empty() {
        out.push_str(&format!("{label:>9}: {value}\n"));
    }
}

/// ADS author lists follow the listing rule: more than three collapse to
/// the first author
fn short_names(authors: &[String]) -> String {
    match authors {
        [first, _, _, _, ..] if first.contains("Collaboration") => first.clone(),
        [first, _, _, _, ..] => format!("{first}, et al."),
        _ => authors.join("; "),
    }
}
