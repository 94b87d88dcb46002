//! Journal name abbreviation
//!
//! Maps full journal names to their customary abbreviations. AASTeX journal
//! macros (as exported by ADS, e.g. `\apj`) are expanded to full names first.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::latex::decode_latex;

/// Built-in full name → abbreviation pairs
const DEFAULT_ABBREVIATIONS: &[(&str, &str)] = &[
    ("The Astrophysical Journal", "ApJ"),
    ("Astrophysical Journal", "ApJ"),
    ("Astrophysical Journal Letters", "ApJL"),
    ("Astrophysical Journal Supplement", "ApJS"),
    ("Astrophysical Journal: Supplement", "ApJS"),
    ("Monthly Notices of the Royal Astronomical Society", "MNRAS"),
    ("Astronomy & Astrophysics", "A&A"),
    ("The Astronomical Journal", "AJ"),
    ("Physical Review Letters", "PRL"),
    ("Physical Review Research", "PRR"),
    ("Physical Review D", "PRD"),
    ("Physical Review C", "PRC"),
    ("Physical Review X", "PRX"),
    ("Journal of Plasma Physics", "JPP"),
    ("Annual Review of Astronomy and Astrophysics", "ARAA"),
    ("Space Science Reviews", "SSR"),
    ("Reviews of Modern Physics", "Rev. Mod. Phys."),
    ("Computer Physics Communications", "Comp. Phys. Comm."),
    ("arXiv e-prints", "arXiv"),
    ("\\nat", "Nature"),
];

lazy_static! {
    /// AASTeX journal macros, keyed without the backslash
    static ref MACROS: HashMap<&'static str, &'static str> = HashMap::from([
        ("aj", "The Astronomical Journal"),
        ("apj", "The Astrophysical Journal"),
        ("apjl", "Astrophysical Journal Letters"),
        ("apjlett", "Astrophysical Journal Letters"),
        ("apjs", "Astrophysical Journal Supplement"),
        ("apjsupp", "Astrophysical Journal Supplement"),
        ("mnras", "Monthly Notices of the Royal Astronomical Society"),
        ("aap", "Astronomy & Astrophysics"),
        ("astap", "Astronomy & Astrophysics"),
        ("araa", "Annual Review of Astronomy and Astrophysics"),
        ("ssr", "Space Science Reviews"),
        ("prl", "Physical Review Letters"),
        ("prc", "Physical Review C"),
        ("prd", "Physical Review D"),
        ("nat", "Nature"),
        ("sci", "Science"),
        ("pasp", "Publications of the Astronomical Society of the Pacific"),
        ("pasj", "Publications of the Astronomical Society of Japan"),
        ("jcap", "Journal of Cosmology and Astroparticle Physics"),
        ("physrep", "Physics Reports"),
        ("solphys", "Solar Physics"),
        ("icarus", "Icarus"),
        ("jgr", "Journal of Geophysical Research"),
        ("grl", "Geophysical Research Letters"),
        ("apss", "Astrophysics and Space Science"),
        ("procspie", "Proceedings of the SPIE"),
    ]);
}

/// Immutable journal abbreviation table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalAbbreviations {
    table: HashMap<String, String>,
}

impl Default for JournalAbbreviations {
    fn default() -> Self {
        Self::new(DEFAULT_ABBREVIATIONS.iter().copied())
    }
}

impl JournalAbbreviations {
    pub fn new<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            table: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// A table that abbreviates nothing
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Exact, case-sensitive table lookup
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.table.get(name).map(String::as_str)
    }

    /// Abbreviate a raw `journal` value.
    ///
    /// The raw value is looked up first, then its macro expansion, then its
    /// LaTeX-decoded form. A value that matches nothing is returned unchanged.
    pub fn abbreviate(&self, raw: &str) -> String {
        let raw = raw.trim();
        if let Some(abbrev) = self.lookup(raw) {
            return abbrev.to_string();
        }

        if let Some(full) = expand_macro(raw) {
            return self.lookup(full).unwrap_or(full).to_string();
        }

        let decoded = decode_latex(raw);
        self.lookup(&decoded).unwrap_or(raw).to_string()
    }
}

/// Expand an AASTeX journal macro such as `\apj` (optionally braced)
pub fn expand_macro(raw: &str) -> Option<&'static str> {
    let name = raw
        .trim_start_matches('{')
        .trim_end_matches('}')
        .trim()
        .strip_prefix('\\')?;
    MACROS.get(name.to_lowercase().as_str()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_lookup() {
        let journals = JournalAbbreviations::default();
        assert_eq!(journals.abbreviate("The Astrophysical Journal"), "ApJ");
        assert_eq!(journals.abbreviate("Physical Review Letters"), "PRL");
        assert_eq!(journals.abbreviate("\\nat"), "Nature");
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let journals = JournalAbbreviations::default();
        assert_eq!(
            journals.abbreviate("the astrophysical journal"),
            "the astrophysical journal"
        );
    }

    #[test]
    fn test_unmapped_passes_through() {
        let journals = JournalAbbreviations::default();
        assert_eq!(journals.abbreviate("Icarus Quarterly"), "Icarus Quarterly");
    }

    #[test]
    fn test_macro_expansion() {
        let journals = JournalAbbreviations::default();
        assert_eq!(journals.abbreviate("\\apj"), "ApJ");
        assert_eq!(journals.abbreviate("\\mnras"), "MNRAS");
        assert_eq!(journals.abbreviate("{\\aap}"), "A&A");
        assert_eq!(journals.abbreviate("\\pasp"), "Publications of the Astronomical Society of the Pacific");
        assert_eq!(journals.abbreviate("\\unknownmacro"), "\\unknownmacro");
    }

    #[test]
    fn test_decoded_lookup() {
        let journals = JournalAbbreviations::default();
        assert_eq!(journals.abbreviate("Astronomy {\\&} Astrophysics"), "A&A");
    }

    #[test]
    fn test_substituted_table() {
        let journals = JournalAbbreviations::new([("Nature", "Nat.")]);
        assert_eq!(journals.abbreviate("Nature"), "Nat.");
        assert_eq!(journals.abbreviate("The Astrophysical Journal"), "The Astrophysical Journal");
        assert_eq!(JournalAbbreviations::empty().abbreviate("\\apj"), "The Astrophysical Journal");
    }
}
