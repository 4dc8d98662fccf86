use crate::alerting::model::{DataStoreSnapshot, StorageFillFact};
use crate::alerting::rules::storage_fill_facts;
use crate::error::{AlertingError, Result};
use crate::traits::FactSource;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

/// HTTP client for the analyzer service
pub struct AnalyzerClient {
    /// Base URL, without trailing slash
    base_url: String,
    http_client: Client,
}

impl AnalyzerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http_client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch every data store the analyzer knows about
    pub async fn get_data_stores(&self) -> Result<Vec<DataStoreSnapshot>> {
        let url = format!("{}/dataStores", self.base_url);
        let response = self.http_client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "Analyzer request failed");
            return Err(AlertingError::Analyzer(format!(
                "Failed to get data stores: {}",
                status
            )));
        }

        let data_stores: Vec<DataStoreSnapshot> = response
            .json()
            .await
            .map_err(|e| AlertingError::Analyzer(format!("Invalid data store response: {}", e)))?;
        debug!(count = data_stores.len(), "Fetched data stores");
        Ok(data_stores)
    }
}

#[async_trait]
impl FactSource for AnalyzerClient {
    /// Every overfilled store is reported; a partial batch would deprecate
    /// the alerts of the stores left out
    async fn fetch_storage_fill_facts(&self) -> Result<Vec<StorageFillFact>> {
        let data_stores = self.get_data_stores().await?;
        Ok(storage_fill_facts(&data_stores, None))
    }
}
