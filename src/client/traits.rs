use async_trait::async_trait;
use serde_json::Value;

use crate::criteria::SearchCriteria;
use crate::model::{AdvertId, ClientError, SearchPage};

/// Paged access to the advertisement search endpoint.
#[async_trait]
pub trait AdSource: Send + Sync {
    async fn search_page(
        &self,
        criteria: &SearchCriteria,
        page: u64,
        page_size: u64,
    ) -> Result<SearchPage, ClientError>;
}

/// Access to the per-advertisement detail endpoint.
#[async_trait]
pub trait DetailSource: Send + Sync {
    async fn advert_details(&self, id: &AdvertId) -> Result<Value, ClientError>;
}
