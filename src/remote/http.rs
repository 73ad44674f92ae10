//! HTTP delta source implementation
//!
//! Downloads the remote export over HTTPS and unpacks it in memory. The
//! export travels as a ZIP archive whose single `export.json` entry holds the
//! delta payload; the server's "updated to" instant rides in the
//! `X-Export-Date` header (RFC 3339), with the standard `Date` header as a
//! fallback.

use std::io::{Cursor, Read};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info};
use url::Url;

use super::records::DeltaPayload;
use super::{DeltaResponse, DeltaSource, FetchError};

/// Header carrying the export's authoritative "updated to" instant.
pub const EXPORT_DATE_HEADER: &str = "X-Export-Date";

/// Name of the payload entry inside the export archive.
const EXPORT_ENTRY: &str = "export.json";

const USER_AGENT: &str = concat!("termsync/", env!("CARGO_PKG_VERSION"));

/// Delta source fetching ZIP-compressed exports over HTTP.
pub struct HttpDeltaSource {
    client: reqwest::Client,
}

impl HttpDeltaSource {
    /// Create a source whose fetches are bounded by `fetch_timeout`.
    pub fn new(fetch_timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::from)?;

        Ok(Self { client })
    }

    fn build_url(url: &str, since: Option<DateTime<Utc>>) -> Result<Url, FetchError> {
        let mut url = Url::parse(url).map_err(|err| FetchError::Transport {
            message: format!("invalid subscription URL: {err}"),
        })?;

        if let Some(since) = since {
            url.query_pairs_mut()
                .append_pair("updatedSince", &since.to_rfc3339());
        }

        Ok(url)
    }

    fn updated_to_from_headers(headers: &reqwest::header::HeaderMap) -> Result<DateTime<Utc>, FetchError> {
        if let Some(value) = headers.get(EXPORT_DATE_HEADER)
            && let Ok(text) = value.to_str()
        {
            return DateTime::parse_from_rfc3339(text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|err| FetchError::Protocol {
                    message: format!("unparseable {EXPORT_DATE_HEADER} header '{text}': {err}"),
                });
        }

        if let Some(value) = headers.get(reqwest::header::DATE)
            && let Ok(text) = value.to_str()
            && let Ok(dt) = DateTime::parse_from_rfc2822(text)
        {
            return Ok(dt.with_timezone(&Utc));
        }

        Err(FetchError::Protocol {
            message: "response carried no usable export date header".to_string(),
        })
    }

    fn unpack(bytes: &[u8]) -> Result<DeltaPayload, FetchError> {
        let mut archive =
            zip::ZipArchive::new(Cursor::new(bytes)).map_err(|err| FetchError::Protocol {
                message: format!("payload is not a readable ZIP archive: {err}"),
            })?;

        let mut entry = archive
            .by_name(EXPORT_ENTRY)
            .map_err(|err| FetchError::Protocol {
                message: format!("archive has no {EXPORT_ENTRY} entry: {err}"),
            })?;

        let mut raw = String::new();
        entry
            .read_to_string(&mut raw)
            .map_err(|err| FetchError::Protocol {
                message: format!("failed to read {EXPORT_ENTRY}: {err}"),
            })?;

        serde_json::from_str(&raw).map_err(|err| FetchError::Protocol {
            message: format!("failed to decode {EXPORT_ENTRY}: {err}"),
        })
    }
}

#[async_trait]
impl DeltaSource for HttpDeltaSource {
    async fn fetch_updates(
        &self,
        url: &str,
        token: Option<&str>,
        since: Option<DateTime<Utc>>,
    ) -> Result<DeltaResponse, FetchError> {
        let url = Self::build_url(url, since)?;

        debug!(url = %url, since = ?since, "Fetching delta export");

        let mut request = self.client.get(url.clone()).header("Accept", "application/zip");
        if let Some(token) = token {
            request = request.header("Authorization", format!("Token {token}"));
        }

        let response = request.send().await.map_err(FetchError::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Transport {
                message: format!("remote returned HTTP {status} for {url}"),
            });
        }

        let updated_to = Self::updated_to_from_headers(response.headers())?;

        let bytes = response.bytes().await.map_err(FetchError::from)?;
        let payload = Self::unpack(&bytes)?;

        let record_count = payload.records.len();
        info!(
            record_count,
            updated_to = %updated_to,
            "Fetched delta export"
        );

        Ok(DeltaResponse {
            records: payload.records,
            record_count,
            updated_to,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn since_bound_rides_as_a_query_parameter() {
        let since = DateTime::parse_from_rfc3339("2025-05-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let url =
            HttpDeltaSource::build_url("https://concepts.example.org/sources/ciel", Some(since))
                .unwrap();
        assert!(url.query().unwrap().contains("updatedSince=2025-05-01"));

        let bare =
            HttpDeltaSource::build_url("https://concepts.example.org/sources/ciel", None).unwrap();
        assert!(bare.query().is_none());
    }

    #[test]
    fn garbage_bytes_are_a_protocol_failure() {
        let result = HttpDeltaSource::unpack(b"definitely not a zip");
        assert!(matches!(result, Err(FetchError::Protocol { .. })));
    }
}
