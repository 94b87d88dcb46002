//! Native ADS client using reqwest

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::{
    download_filename, parse_bibtex_export, parse_record_response, parse_search_response,
    AdsRecord, AdsSearchDoc, DOCUMENT_ENDPOINTS, RECORD_FIELDS, SEARCH_FIELDS,
};
use crate::config::LlyfrConfig;
use crate::error::{LlyfrError, Result, Stage};
use crate::store::{IngestOutcome, LibraryStore};

pub struct AdsClient {
    client: Client,
    token: String,
    api_url: String,
    gateway_url: String,
    rows: u32,
}

impl AdsClient {
    /// Build a client from configuration; the ADS token is required
    pub fn from_config(config: &LlyfrConfig) -> Result<Self> {
        let token = config.validate_ads()?.to_string();
        let client = Client::builder()
            .timeout(Duration::from_secs(config.ads.timeout_secs))
            .user_agent(concat!("llyfr/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LlyfrError::Remote(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            token,
            api_url: config.ads.api_url.trim_end_matches('/').to_string(),
            gateway_url: config.ads.gateway_url.trim_end_matches('/').to_string(),
            rows: config.ads.rows,
        })
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| LlyfrError::Remote(format!("{what} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LlyfrError::Remote(format!(
                "{what} failed (HTTP {})",
                status.as_u16()
            )));
        }
        Ok(response)
    }

    async fn text(response: Response, what: &str) -> Result<String> {
        response
            .text()
            .await
            .map_err(|e| LlyfrError::Remote(format!("{what} failed: {e}")))
    }

    async fn query(&self, q: &str, fields: &str, rows: u32, what: &str) -> Result<String> {
        let rows = rows.to_string();
        let request = self
            .client
            .get(format!("{}/search/query", self.api_url))
            .query(&[("q", q), ("fl", fields), ("rows", rows.as_str())]);
        let response = self.send(request, what).await?;
        Self::text(response, what).await
    }

    /// Free-form ADS search
    pub async fn search(&self, query: &str) -> Result<Vec<AdsSearchDoc>> {
        debug!(query, rows = self.rows, "searching ADS");
        let body = self.query(query, SEARCH_FIELDS, self.rows, "ADS search").await?;
        parse_search_response(&body)
    }

    /// Full metadata for one bibcode
    pub async fn fetch_record(&self, bibcode: &str) -> Result<AdsRecord> {
        let q = format!("bibcode:\"{bibcode}\"");
        let body = self.query(&q, RECORD_FIELDS, 1, "ADS query").await?;
        parse_record_response(&body)
    }

    /// BibTeX export for one bibcode
    pub async fn export_bibtex(&self, bibcode: &str) -> Result<String> {
        let what = "ADS BibTeX export";
        let request = self
            .client
            .post(format!("{}/export/bibtex", self.api_url))
            .json(&serde_json::json!({ "bibcode": [bibcode] }));
        let response = self.send(request, what).await?;
        parse_bibtex_export(&Self::text(response, what).await?)
    }

    /// Download the full text into `dir`, trying each gateway endpoint in
    /// turn. Error statuses and HTML pages move on to the next endpoint.
    pub async fn download_document(&self, bibcode: &str, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(download_filename(
            bibcode,
            chrono::Utc::now().timestamp_millis(),
        ));

        for endpoint in DOCUMENT_ENDPOINTS {
            let url = format!(
                "{}/{}/{endpoint}",
                self.gateway_url,
                urlencoding::encode(bibcode)
            );
            let request = self.client.get(&url);
            let response = match self.send(request, endpoint).await {
                Ok(response) => response,
                Err(e) => {
                    debug!(bibcode, endpoint, error = %e, "document endpoint failed");
                    continue;
                }
            };

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_lowercase();
            if content_type.contains("text/html") {
                warn!(bibcode, endpoint, "document endpoint returned HTML, skipping");
                continue;
            }

            if let Err(e) = stream_to_file(response, &path).await {
                if let Err(cleanup) = tokio::fs::remove_file(&path).await {
                    debug!(path = %path.display(), error = %cleanup, "partial download not removed");
                }
                return Err(e);
            }
            info!(bibcode, endpoint, path = %path.display(), "downloaded document");
            return Ok(path);
        }

        Err(LlyfrError::Remote(format!(
            "Could not download PDF from ADS ({} failed)",
            DOCUMENT_ENDPOINTS.join(" and ")
        )))
    }
}

async fn stream_to_file(mut response: Response, path: &Path) -> Result<()> {
    let io_err = |e: std::io::Error| LlyfrError::io(Stage::Download, path)(e);

    let mut file = tokio::fs::File::create(path).await.map_err(io_err)?;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| LlyfrError::Remote(format!("Document download failed: {e}")))?
    {
        file.write_all(&chunk).await.map_err(io_err)?;
    }
    file.flush().await.map_err(io_err)
}

/// Fetch the BibTeX export and the document for `bibcode` concurrently and
/// ingest them into `store`.
///
/// The downloaded temporary document is removed afterwards, whether or not
/// ingestion succeeded.
pub async fn add_from_ads(
    client: &AdsClient,
    store: &LibraryStore,
    bibcode: &str,
) -> Result<IngestOutcome> {
    let temp_dir = std::env::temp_dir();
    let (bibtex, document) = tokio::join!(
        client.export_bibtex(bibcode),
        client.download_document(bibcode, &temp_dir)
    );

    let document = match document {
        Ok(path) => path,
        Err(e) => return Err(bibtex.err().unwrap_or(e)),
    };

    let outcome = bibtex.and_then(|bibtex| store.ingest(&document, &bibtex));

    if let Err(e) = tokio::fs::remove_file(&document).await {
        debug!(path = %document.display(), error = %e, "could not remove temporary document");
    }
    outcome
}
