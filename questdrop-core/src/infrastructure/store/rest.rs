use super::ObjectiveStore;
use crate::domain::ObjectiveCode;
use crate::foundation::{Identity, QuestDropError, Result};
use crate::infrastructure::config::StoreConfig;
use async_trait::async_trait;
use log::{debug, trace};
use serde::Deserialize;
use std::time::Duration;

/// REST client for the quest platform's record store. Queries the discovery
/// table with service-role credentials; never writes.
pub struct RestObjectiveStore {
    client: reqwest::Client,
    base_url: String,
    table: String,
    service_key: String,
}

#[derive(Debug, Deserialize)]
struct DiscoveryRow {
    wallet_address: String,
}

impl RestObjectiveStore {
    pub fn new(config: &StoreConfig, call_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(call_timeout)
            .build()
            .map_err(|err| QuestDropError::ConfigError(format!("store http client: {err}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            table: config.table.clone(),
            service_key: config.service_key.clone(),
        })
    }

    fn rows_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    async fn fetch_rows(&self, operation: &str, query: &[(&str, String)]) -> Result<Vec<DiscoveryRow>> {
        trace!("store query operation={} url={}", operation, self.rows_url());
        let response = self
            .client
            .get(self.rows_url())
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .query(query)
            .send()
            .await
            .map_err(|err| QuestDropError::StoreUnavailable { operation: operation.to_string(), details: err.to_string() })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(QuestDropError::Unauthorized { details: format!("store rejected service key: {status}") });
        }
        if !status.is_success() {
            return Err(QuestDropError::StoreUnavailable {
                operation: operation.to_string(),
                details: format!("status {status}"),
            });
        }

        response
            .json::<Vec<DiscoveryRow>>()
            .await
            .map_err(|err| QuestDropError::StoreUnavailable { operation: operation.to_string(), details: err.to_string() })
    }
}

#[async_trait]
impl ObjectiveStore for RestObjectiveStore {
    async fn get_success(&self, identity: &Identity, code: ObjectiveCode) -> Result<bool> {
        let rows = self
            .fetch_rows(
                "get_success",
                &[
                    ("select", "wallet_address".to_string()),
                    ("wallet_address", format!("eq.{identity}")),
                    ("code_entered", format!("eq.{}", code.store_code())),
                    ("success", "eq.true".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        let found = !rows.is_empty();
        debug!("store get_success identity={} objective={} found={}", identity, code, found);
        Ok(found)
    }

    async fn fully_complete_identities(&self) -> Result<Vec<Identity>> {
        // One query per required code; the intersection is the fully-complete set.
        let mut per_code: Vec<std::collections::HashSet<Identity>> = Vec::new();
        for code in ObjectiveCode::REQUIRED {
            let rows = self
                .fetch_rows(
                    "fully_complete_identities",
                    &[
                        ("select", "wallet_address".to_string()),
                        ("code_entered", format!("eq.{}", code.store_code())),
                        ("success", "eq.true".to_string()),
                    ],
                )
                .await?;
            let identities = rows
                .into_iter()
                .filter_map(|row| match Identity::parse(&row.wallet_address) {
                    Ok(identity) => Some(identity),
                    Err(_) => {
                        debug!("skipping malformed wallet_address in store row: {}", row.wallet_address);
                        None
                    }
                })
                .collect();
            per_code.push(identities);
        }

        let mut iter = per_code.into_iter();
        let mut complete = iter.next().unwrap_or_default();
        for set in iter {
            complete.retain(|identity| set.contains(identity));
        }
        let mut out: Vec<Identity> = complete.into_iter().collect();
        out.sort();
        debug!("store discovery found {} fully-complete identities", out.len());
        Ok(out)
    }
}
