use crate::alerting::model::StorageFillFact;
use crate::error::Result;
use async_trait::async_trait;

/// Supplies the current storage fill facts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FactSource: Send + Sync {
    /// Data stores above their high-water mark, at most one entry per store
    async fn fetch_storage_fill_facts(&self) -> Result<Vec<StorageFillFact>>;
}
