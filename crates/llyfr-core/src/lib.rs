//! Library store for llyfr
//!
//! Maintains a personal bibliography: a single BibTeX file plus a directory
//! of attached documents.
//!
//! Features:
//! - Deterministic, collision-free document filenames
//! - Idempotent `file` field injection that edits record text in place
//! - Sequential ingestion with stage-tagged errors
//! - TOML configuration with environment overrides
//! - NASA ADS search, export and full-text download (`native` feature)

pub mod ads;
pub mod config;
pub mod error;
pub mod filename;
pub mod inject;
pub mod store;

pub use config::LlyfrConfig;
pub use error::{LlyfrError, Result, Stage};
pub use filename::{derive_filename, resolve_unique_path, slugify_title, MAX_COLLISION_ATTEMPTS};
pub use inject::{file_field_line, inject_file_field};
pub use store::{ingest, IngestOutcome, LibraryStore};

// Read side, re-exported for callers that only depend on this crate
pub use llyfr_bibtex::{parse_library, EntryKind, JournalAbbreviations, LibraryEntry};
