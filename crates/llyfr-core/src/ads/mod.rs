//! NASA ADS (Astrophysics Data System) access
//!
//! API docs: https://ui.adsabs.harvard.edu/help/api/
//!
//! Response payloads are typed with every field optional except the bibcode,
//! so a sparse record is a checked case. The parsers here are pure; the HTTP
//! client lives behind the `native` feature.

#[cfg(feature = "native")]
mod client;

#[cfg(feature = "native")]
pub use client::{add_from_ads, AdsClient};

use serde::Deserialize;

use crate::error::{LlyfrError, Result};

/// Fields requested for search results
pub const SEARCH_FIELDS: &str = "bibcode,title,author,year";
/// Fields requested for a single record
pub const RECORD_FIELDS: &str = "bibcode,title,author,year,pub,abstract,doi";

/// Full-text gateway endpoints, tried in order
pub const DOCUMENT_ENDPOINTS: [&str; 2] = ["EPRINT_PDF", "PUB_PDF"];

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    response: Option<Body<T>>,
}

#[derive(Debug, Deserialize)]
struct Body<T> {
    #[serde(default = "Vec::new")]
    docs: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ExportResponse {
    export: Option<String>,
}

/// One search hit
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AdsSearchDoc {
    pub bibcode: String,
    pub title: Option<Vec<String>>,
    pub author: Option<Vec<String>>,
    #[serde(deserialize_with = "deserialize_year", default)]
    pub year: Option<String>,
    #[serde(rename = "pub")]
    pub publication: Option<String>,
}

/// A single record with abstract and DOI
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AdsRecord {
    pub bibcode: String,
    pub title: Option<Vec<String>>,
    pub author: Option<Vec<String>>,
    #[serde(deserialize_with = "deserialize_year", default)]
    pub year: Option<String>,
    #[serde(rename = "pub")]
    pub publication: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub doi: Option<Vec<String>>,
}

impl AdsSearchDoc {
    pub fn title(&self) -> &str {
        first(&self.title)
    }

    pub fn authors(&self) -> &[String] {
        self.author.as_deref().unwrap_or_default()
    }
}

impl AdsRecord {
    pub fn title(&self) -> &str {
        first(&self.title)
    }

    pub fn authors(&self) -> &[String] {
        self.author.as_deref().unwrap_or_default()
    }

    pub fn doi(&self) -> Option<&str> {
        self.doi.as_ref().and_then(|d| d.first()).map(String::as_str)
    }
}

fn first(values: &Option<Vec<String>>) -> &str {
    values
        .as_ref()
        .and_then(|v| v.first())
        .map_or("", String::as_str)
}

/// Year as text; ADS sends either a string or a number
fn deserialize_year<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Year {
        Text(String),
        Number(i64),
    }

    Ok(Option::<Year>::deserialize(deserializer)?.map(|year| match year {
        Year::Text(text) => text,
        Year::Number(n) => n.to_string(),
    }))
}

fn malformed(e: serde_json::Error) -> LlyfrError {
    LlyfrError::Remote(format!("Malformed ADS response: {e}"))
}

/// Search hits; a response without docs is an empty result
pub fn parse_search_response(json: &str) -> Result<Vec<AdsSearchDoc>> {
    let envelope: Envelope<AdsSearchDoc> = serde_json::from_str(json).map_err(malformed)?;
    Ok(envelope.response.map(|body| body.docs).unwrap_or_default())
}

/// The first record of a bibcode query
pub fn parse_record_response(json: &str) -> Result<AdsRecord> {
    let envelope: Envelope<AdsRecord> = serde_json::from_str(json).map_err(malformed)?;
    envelope
        .response
        .and_then(|body| body.docs.into_iter().next())
        .ok_or_else(|| LlyfrError::Remote("No ADS record found".to_string()))
}

/// BibTeX text of an export response, trimmed
pub fn parse_bibtex_export(json: &str) -> Result<String> {
    let response: ExportResponse = serde_json::from_str(json).map_err(malformed)?;
    response
        .export
        .map(|bibtex| bibtex.trim().to_string())
        .filter(|bibtex| !bibtex.is_empty())
        .ok_or_else(|| LlyfrError::Remote("No BibTeX returned from ADS".to_string()))
}

/// Temporary document name for a download; path separators in the bibcode
/// are replaced
pub fn download_filename(bibcode: &str, millis: i64) -> String {
    let safe: String = bibcode
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("llyfr_{safe}_{millis}.pdf")
}
