use super::{LedgerClient, LedgerQuery};
use crate::domain::LedgerEntrypoint;
use crate::foundation::{Identity, QuestDropError, Result, TransactionId};
use crate::infrastructure::config::LedgerConfig;
use async_trait::async_trait;
use log::{debug, info, trace};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::time::{sleep, Instant};

const SEAL_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// HTTP client for the ledger transaction gateway. The gateway holds the
/// admin authorization and the script/template sources; we submit named
/// templates with the identity as the single argument and poll for seal
/// status.
pub struct HttpLedgerClient {
    client: reqwest::Client,
    gateway_url: String,
    contract_address: String,
    authorizer: String,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    value: bool,
}

#[derive(Debug, Deserialize)]
struct MutateResponse {
    transaction_id: String,
}

#[derive(Debug, Deserialize)]
struct SealStatusResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
}

impl HttpLedgerClient {
    pub fn new(config: &LedgerConfig, call_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(call_timeout)
            .build()
            .map_err(|err| QuestDropError::ConfigError(format!("ledger http client: {err}")))?;
        Ok(Self {
            client,
            gateway_url: config.gateway_url.trim_end_matches('/').to_string(),
            contract_address: config.contract_address.clone(),
            authorizer: config.authorizer.clone(),
        })
    }

    fn unavailable(operation: &str, err: impl std::fmt::Display) -> QuestDropError {
        QuestDropError::LedgerUnavailable { operation: operation.to_string(), details: err.to_string() }
    }

    /// Duplicate registrations and issuances come back from the gateway as
    /// application-level rejections; everything else non-2xx is transport.
    fn classify_rejection(entrypoint: LedgerEntrypoint, identity: &Identity, body: &str) -> Option<QuestDropError> {
        let lowered = body.to_ascii_lowercase();
        if !lowered.contains("already") {
            return None;
        }
        Some(match entrypoint {
            LedgerEntrypoint::IssueAirdrop => QuestDropError::AlreadyClaimed { identity: identity.to_string() },
            LedgerEntrypoint::RegisterSlacker => QuestDropError::AlreadyRegistered {
                identity: identity.to_string(),
                objective: "SLACKER".to_string(),
            },
            LedgerEntrypoint::RegisterOverachiever => QuestDropError::AlreadyRegistered {
                identity: identity.to_string(),
                objective: "OVERACHIEVER".to_string(),
            },
        })
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn query(&self, query: LedgerQuery, identity: &Identity) -> Result<bool> {
        let operation = query.script_id();
        trace!("ledger query script={} identity={}", operation, identity);
        let response = self
            .client
            .post(format!("{}/v1/scripts/{}", self.gateway_url, operation))
            .json(&json!({
                "contract": self.contract_address,
                "args": [identity.as_str()],
            }))
            .send()
            .await
            .map_err(|err| Self::unavailable(operation, err))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(QuestDropError::Unauthorized { details: format!("script {operation}: {status}") });
        }
        if !status.is_success() {
            return Err(Self::unavailable(operation, format!("status {status}")));
        }
        let parsed: QueryResponse = response.json().await.map_err(|err| Self::unavailable(operation, err))?;
        debug!("ledger query script={} identity={} value={}", operation, identity, parsed.value);
        Ok(parsed.value)
    }

    async fn mutate(&self, entrypoint: LedgerEntrypoint, identity: &Identity) -> Result<TransactionId> {
        let operation = entrypoint.template_id();
        info!("ledger mutate template={} identity={}", operation, identity);
        let response = self
            .client
            .post(format!("{}/v1/transactions/{}", self.gateway_url, operation))
            .json(&json!({
                "contract": self.contract_address,
                "authorizer": self.authorizer,
                "args": [identity.as_str()],
            }))
            .send()
            .await
            .map_err(|err| Self::unavailable(operation, err))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(QuestDropError::Unauthorized { details: format!("template {operation}: {status}") });
        }
        if status == reqwest::StatusCode::CONFLICT || status == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
            let body = response.text().await.unwrap_or_default();
            if let Some(err) = Self::classify_rejection(entrypoint, identity, &body) {
                return Err(err);
            }
            return Err(Self::unavailable(operation, format!("status {status}: {body}")));
        }
        if !status.is_success() {
            return Err(Self::unavailable(operation, format!("status {status}")));
        }

        let parsed: MutateResponse = response.json().await.map_err(|err| Self::unavailable(operation, err))?;
        parsed.transaction_id.parse()
    }

    async fn await_sealed(&self, tx_id: &TransactionId, deadline: Duration) -> Result<()> {
        let operation = "await_sealed";
        let started = Instant::now();
        loop {
            let response = self
                .client
                .get(format!("{}/v1/transaction_results/{}", self.gateway_url, tx_id))
                .send()
                .await
                .map_err(|err| Self::unavailable(operation, err))?;
            if response.status().is_success() {
                let parsed: SealStatusResponse = response.json().await.map_err(|err| Self::unavailable(operation, err))?;
                match parsed.status.as_str() {
                    "sealed" => {
                        debug!("ledger tx sealed tx_id={} waited_ms={}", tx_id, started.elapsed().as_millis());
                        return Ok(());
                    }
                    "expired" | "failed" => {
                        return Err(QuestDropError::Message(format!(
                            "transaction {tx_id} {}: {}",
                            parsed.status,
                            parsed.error_message.unwrap_or_default()
                        )));
                    }
                    // pending / executed but not yet sealed: keep polling
                    _ => {}
                }
            }

            if started.elapsed() >= deadline {
                return Err(QuestDropError::SealDeadlineExpired {
                    tx_id: tx_id.to_string(),
                    waited_ms: started.elapsed().as_millis() as u64,
                });
            }
            sleep(SEAL_POLL_INTERVAL).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_rejections_classify_by_entrypoint() {
        let identity = Identity::parse("0xabcdef0123456789").expect("identity");
        let err = HttpLedgerClient::classify_rejection(LedgerEntrypoint::IssueAirdrop, &identity, "NFT already airdropped")
            .expect("classified");
        assert!(matches!(err, QuestDropError::AlreadyClaimed { .. }));

        let err =
            HttpLedgerClient::classify_rejection(LedgerEntrypoint::RegisterSlacker, &identity, "already registered")
                .expect("classified");
        assert!(matches!(err, QuestDropError::AlreadyRegistered { .. }));

        assert!(HttpLedgerClient::classify_rejection(LedgerEntrypoint::RegisterSlacker, &identity, "boom").is_none());
    }
}
