//! Document filename derivation
//!
//! Attached documents are named `{authors}_{year}_{title_slug}.pdf`, e.g.
//! `A. Smith.etal_2020_weak_turbulence_in_plasmas.pdf`. The name depends only
//! on the record; collisions with files already in the library are resolved
//! separately by [`resolve_unique_path`].

use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::{LlyfrError, Result, Stage};
use llyfr_bibtex::UNTITLED;

/// Numeric suffixes `_2` up to this bound are tried before falling back to a
/// timestamp suffix
pub const MAX_COLLISION_ATTEMPTS: u32 = 10_000;

const MAX_SLUG_LEN: usize = 60;
const UNKNOWN_YEAR: &str = "????";
const UNKNOWN_AUTHOR: &str = "unknown";

lazy_static! {
    static ref NON_ALNUM_RUN: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
}

/// Derive the document filename for a record.
pub fn derive_filename(title: &str, authors: &[String], year: u32) -> String {
    let title = if title.trim().is_empty() {
        UNTITLED
    } else {
        title
    };
    let year = if year == 0 {
        UNKNOWN_YEAR.to_string()
    } else {
        year.to_string()
    };
    format!(
        "{}_{}_{}.pdf",
        author_component(authors),
        year,
        slugify_title(title)
    )
}

/// Filesystem-safe title segment matching `^[a-z0-9_]{0,60}$`, with no
/// leading, trailing or doubled underscores.
pub fn slugify_title(title: &str) -> String {
    let folded = title
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    let spaced = NON_ALNUM_RUN.replace_all(&folded, " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let slug = joined.trim_matches('_');

    if slug.len() > MAX_SLUG_LEN {
        // ASCII only at this point, so byte slicing is safe
        slug[..MAX_SLUG_LEN].trim_end_matches('_').to_string()
    } else {
        slug.to_string()
    }
}

/// Author segment: `unknown`, `A`, `A.B` or `A.etal`.
///
/// Names are kept as displayed, except that path separators and colons
/// become `-`. A colon would end the name inside a `:name:PDF` file field.
pub fn author_component(authors: &[String]) -> String {
    match authors {
        [] => UNKNOWN_AUTHOR.to_string(),
        [only] => path_safe(only),
        [first, second] => format!("{}.{}", path_safe(first), path_safe(second)),
        [first, ..] => format!("{}.etal", path_safe(first)),
    }
}

fn path_safe(name: &str) -> String {
    name.replace(['/', '\\', ':'], "-")
}

/// Pick a path for `filename` inside `dir` that no existing file occupies.
///
/// Tries the name itself, then `stem_2.ext`, `stem_3.ext`, … and finally a
/// timestamp-suffixed name that is accepted without checking. The check and a
/// later write are not atomic.
pub fn resolve_unique_path(dir: &Path, filename: &str) -> Result<PathBuf> {
    let candidate = dir.join(filename);
    if !exists(&candidate)? {
        return Ok(candidate);
    }

    let (stem, ext) = split_extension(filename);
    for suffix in 2..MAX_COLLISION_ATTEMPTS {
        let candidate = dir.join(format!("{stem}_{suffix}{ext}"));
        if !exists(&candidate)? {
            debug!(filename = %candidate.display(), "resolved filename collision");
            return Ok(candidate);
        }
    }

    let stamp = chrono::Utc::now().timestamp_micros();
    warn!(
        filename,
        attempts = MAX_COLLISION_ATTEMPTS,
        "numeric suffixes exhausted, using timestamp suffix"
    );
    Ok(dir.join(format!("{stem}_{stamp}{ext}")))
}

fn exists(path: &Path) -> Result<bool> {
    path.try_exists()
        .map_err(LlyfrError::io(Stage::ResolvePath, path))
}

/// `("name", ".pdf")` for `name.pdf`; the extension part may be empty
fn split_extension(filename: &str) -> (&str, String) {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    (&filename[..filename.len() - ext.len()], ext)
}
