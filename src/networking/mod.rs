use std::time::Duration;

use log::{debug, info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::engine::models::{Manifest, string_or_number};
use crate::env::CLIENT_REVISION;
use crate::error::{AblistError, Result};

#[derive(Debug, Serialize)]
struct VersionRequest<'a> {
    cvr: &'a str,
    provider: &'a str,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    data: VersionData,
}

#[derive(Debug, Deserialize)]
struct VersionData {
    #[serde(deserialize_with = "string_or_number")]
    version: String,
}

#[derive(Clone)]
pub struct NetworkClient {
    client: Client,
}

impl NetworkClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|err| {
                warn!("network: falling back to default HTTP client configuration ({err})");
                Client::new()
            });
        Self { client }
    }

    /// Ask the version endpoint which asset-bundle release is current.
    pub async fn fetch_protocol_version(&self, url: &str, provider: &str) -> Result<String> {
        let body = VersionRequest {
            cvr: CLIENT_REVISION,
            provider,
        };
        let bytes = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AblistError::network(format!("version request to {url} failed"), e))?
            .error_for_status()
            .map_err(|e| AblistError::network("version request bad status", e))?
            .bytes()
            .await
            .map_err(|e| AblistError::network("version body error", e))?;
        let version = parse_version_response(&bytes)?;
        info!("network: remote asset version is {version}");
        Ok(version)
    }

    /// Download a manifest, returning the raw body alongside the parsed form.
    pub async fn fetch_manifest(&self, url: &str) -> Result<(Vec<u8>, Manifest)> {
        debug!("network: GET {url}");
        let bytes = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AblistError::network(format!("manifest request to {url} failed"), e))?
            .error_for_status()
            .map_err(|e| AblistError::network("manifest request bad status", e))?
            .bytes()
            .await
            .map_err(|e| AblistError::network("manifest body error", e))?;
        let manifest = Manifest::from_slice(&bytes)?;
        info!(
            "network: fetched manifest baseVersion={} ({} entries)",
            manifest.base_version,
            manifest.data.len()
        );
        Ok((bytes.to_vec(), manifest))
    }
}

fn parse_version_response(bytes: &[u8]) -> Result<String> {
    let parsed: VersionResponse = serde_json::from_slice(bytes)
        .map_err(|e| AblistError::parse("version response parse error", e))?;
    Ok(parsed.data.version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_version_from_response() {
        let raw = br#"{"code":0,"data":{"version":"2024112801","force":false}}"#;
        assert_eq!(parse_version_response(raw).unwrap(), "2024112801");
    }

    #[test]
    fn accepts_numeric_version() {
        let raw = br#"{"data":{"version":31}}"#;
        assert_eq!(parse_version_response(raw).unwrap(), "31");
    }

    #[test]
    fn missing_version_field_is_a_parse_error() {
        let err = parse_version_response(br#"{"data":{}}"#).unwrap_err();
        assert!(matches!(err, AblistError::Parse { .. }));

        let err = parse_version_response(b"<html>maintenance</html>").unwrap_err();
        assert!(matches!(err, AblistError::Parse { .. }));
    }

    #[test]
    fn version_request_body_matches_endpoint_contract() {
        let body = VersionRequest {
            cvr: CLIENT_REVISION,
            provider: "dmm",
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"cvr":"1","provider":"dmm"}"#
        );
    }
}
