//! HTTP adapter for Circle's Iris attestation API (v2).

use crate::domain::attestation::AttestationMessage;
use crate::domain::chain::Domain;
use crate::domain::ports::{AttestationService, AttestationServiceError};
use alloy_primitives::TxHash;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    messages: Vec<AttestationMessage>,
}

#[derive(Debug, Clone)]
pub struct IrisAttestationService {
    base_url: String,
    client: reqwest::Client,
}

impl IrisAttestationService {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AttestationServiceError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AttestationServiceError> {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(AttestationServiceError::Network(
                "attestation api_url is empty".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AttestationServiceError::Network(format!("failed to build http client: {e}")))?;
        Ok(Self { base_url, client })
    }

    fn messages_url(&self, source_domain: Domain) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{base}/v2/messages/{source_domain}")
    }
}

#[async_trait]
impl AttestationService for IrisAttestationService {
    async fn fetch(
        &self,
        source_domain: Domain,
        tx_hash: TxHash,
    ) -> Result<Option<AttestationMessage>, AttestationServiceError> {
        let url = self.messages_url(source_domain);
        let hash = format!("0x{}", hex::encode(tx_hash));
        debug!(url = %url, tx = %hash, "Querying attestation service");

        let resp = self
            .client
            .get(&url)
            .query(&[("transactionHash", hash.as_str())])
            .send()
            .await
            .map_err(|e| AttestationServiceError::Network(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AttestationServiceError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: MessagesResponse = resp
            .json()
            .await
            .map_err(|e| AttestationServiceError::Decode(e.to_string()))?;
        Ok(parsed.messages.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::attestation::AttestationRecord;
    use alloy_primitives::B256;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tx() -> TxHash {
        B256::repeat_byte(0xab)
    }

    fn tx_param() -> String {
        format!("0x{}", "ab".repeat(32))
    }

    #[tokio::test]
    async fn test_complete_message_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/messages/6"))
            .and(query_param("transactionHash", tx_param().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messages": [{
                    "status": "complete",
                    "message": "0xdeadbeef",
                    "attestation": "0x0102",
                    "eventNonce": "12"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = IrisAttestationService::new(server.uri()).unwrap();
        let message = service.fetch(Domain(6), tx()).await.unwrap().unwrap();

        let record = AttestationRecord::from_message(Domain(6), &message).unwrap();
        assert_eq!(record.message().to_vec(), vec![0xde, 0xad, 0xbe, 0xef]);
    }

    #[tokio::test]
    async fn test_not_found_means_not_yet_available() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/messages/0"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let service = IrisAttestationService::new(server.uri()).unwrap();
        assert!(service.fetch(Domain(0), tx()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_message_list_means_not_yet_available() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/messages/3"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "messages": [] })),
            )
            .mount(&server)
            .await;

        let service = IrisAttestationService::new(format!("{}/", server.uri())).unwrap();
        assert!(service.fetch(Domain(3), tx()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let service = IrisAttestationService::new(server.uri()).unwrap();
        let err = service.fetch(Domain(6), tx()).await.unwrap_err();
        assert!(matches!(
            err,
            AttestationServiceError::HttpStatus { status: 503, ref body } if body == "maintenance"
        ));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let service = IrisAttestationService::new(server.uri()).unwrap();
        assert!(matches!(
            service.fetch(Domain(6), tx()).await,
            Err(AttestationServiceError::Decode(_))
        ));
    }
}
