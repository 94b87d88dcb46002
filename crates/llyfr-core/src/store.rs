//! Library store: the bibliography file plus its directory of documents
//!
//! Ingestion runs as a strict sequence (parse, create directory, resolve a
//! filename, copy, inject, append). A failure stops the sequence where it
//! happened; earlier steps are not rolled back, so a failed append can leave
//! a copied document without a record.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{LlyfrError, Result, Stage};
use crate::filename::{derive_filename, resolve_unique_path};
use crate::inject::inject_file_field;
use llyfr_bibtex::{parse_first_record, parse_library, JournalAbbreviations, LibraryEntry};

/// Result of a successful ingestion
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    /// Basename of the copied document
    pub filename: String,
    pub document_path: PathBuf,
    /// The record text as appended, without the trailing separator
    pub record: String,
}

#[derive(Debug, Clone)]
pub struct LibraryStore {
    library_dir: PathBuf,
    bibliography: PathBuf,
    journals: JournalAbbreviations,
}

impl LibraryStore {
    pub fn new(library_dir: impl Into<PathBuf>, bibliography: impl Into<PathBuf>) -> Self {
        Self {
            library_dir: library_dir.into(),
            bibliography: bibliography.into(),
            journals: JournalAbbreviations::default(),
        }
    }

    /// Replace the journal abbreviation table used when reading
    pub fn with_journals(mut self, journals: JournalAbbreviations) -> Self {
        self.journals = journals;
        self
    }

    pub fn library_dir(&self) -> &Path {
        &self.library_dir
    }

    pub fn bibliography(&self) -> &Path {
        &self.bibliography
    }

    pub fn journals(&self) -> &JournalAbbreviations {
        &self.journals
    }

    /// Read and parse the whole bibliography, sorted by title.
    ///
    /// A bibliography that does not exist yet is an empty library.
    pub fn load(&self) -> Result<Vec<LibraryEntry>> {
        let text = match fs::read_to_string(&self.bibliography) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.bibliography.display(), "bibliography not found, library is empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(LlyfrError::io(Stage::ReadBibliography, &self.bibliography)(e)),
        };
        Ok(parse_library(&text, &self.journals)?)
    }

    /// Copy `document` into the library and append `raw_record` to the
    /// bibliography with a `file` field pointing at the copy.
    ///
    /// Only the first record of `raw_record` names the document. The source
    /// document is left in place.
    pub fn ingest(&self, document: &Path, raw_record: &str) -> Result<IngestOutcome> {
        if document.as_os_str().to_string_lossy().trim().is_empty() || raw_record.trim().is_empty() {
            return Err(LlyfrError::Validation("Missing document or BibTeX".to_string()));
        }

        let record = parse_first_record(raw_record)?;
        let entry = LibraryEntry::from_record(&record, &self.journals);

        fs::create_dir_all(&self.library_dir)
            .map_err(LlyfrError::io(Stage::CreateDirectory, &self.library_dir))?;

        let desired = derive_filename(&entry.title, &entry.authors, entry.year);
        let document_path = resolve_unique_path(&self.library_dir, &desired)?;
        let filename = document_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or(desired);
        debug!(cite_key = %entry.cite_key, %filename, "resolved document filename");

        copy_document(document, &document_path)?;

        let injected = inject_file_field(raw_record, &filename);
        let record = injected.trim_end().to_string();
        append_record(&self.bibliography, &record)?;

        info!(
            cite_key = %entry.cite_key,
            %filename,
            bibliography = %self.bibliography.display(),
            "added record to library"
        );

        Ok(IngestOutcome {
            filename,
            document_path,
            record,
        })
    }
}

/// Ingest a document and record into an ad-hoc store, returning the final
/// document filename
pub fn ingest(
    document: &Path,
    raw_record: &str,
    library_dir: &Path,
    bibliography: &Path,
) -> Result<String> {
    LibraryStore::new(library_dir, bibliography)
        .ingest(document, raw_record)
        .map(|outcome| outcome.filename)
}

/// Copy `source` to `target`, naming whichever side failed
fn copy_document(source: &Path, target: &Path) -> Result<()> {
    let mut reader = File::open(source).map_err(LlyfrError::io(Stage::CopyDocument, source))?;
    let mut writer =
        File::create(target).map_err(LlyfrError::io(Stage::CopyDocument, target))?;
    io::copy(&mut reader, &mut writer).map_err(LlyfrError::io(Stage::CopyDocument, target))?;
    writer
        .sync_all()
        .map_err(LlyfrError::io(Stage::CopyDocument, target))
}

/// Append `record` followed by exactly one blank line.
///
/// When the file does not already end in a blank line a separator is written
/// first, so a hand-edited file without a trailing newline stays valid.
fn append_record(bibliography: &Path, record: &str) -> Result<()> {
    let map_err = |e: io::Error| LlyfrError::io(Stage::AppendRecord, bibliography)(e);

    let mut file = OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(bibliography)
        .map_err(map_err)?;

    let separator = leading_separator(&mut file).map_err(map_err)?;
    file.write_all(format!("{separator}{record}\n\n").as_bytes())
        .map_err(map_err)?;
    file.flush().map_err(map_err)
}

fn leading_separator(file: &mut File) -> io::Result<&'static str> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok("");
    }

    let tail_len = len.min(2) as usize;
    file.seek(SeekFrom::End(-(tail_len as i64)))?;
    let mut buf = [0u8; 2];
    let tail = &mut buf[..tail_len];
    file.read_exact(tail)?;

    Ok(match &*tail {
        [.., b'\n', b'\n'] => "",
        [.., b'\n'] => "\n",
        _ => "\n\n",
    })
}
