// Sequential per-advertisement detail retrieval.
use std::time::Instant;

use tracing::debug;

use crate::client::DetailSource;
use crate::model::{AdvertId, AdvertRecord, ClientError};

pub struct DetailFetcher<'a> {
    source: &'a dyn DetailSource,
}

impl<'a> DetailFetcher<'a> {
    pub fn new(source: &'a dyn DetailSource) -> Self {
        Self { source }
    }

    /// Fetch the raw nested record for one advertisement, timing the call.
    pub async fn fetch(&self, id: &AdvertId) -> Result<AdvertRecord, ClientError> {
        let started = Instant::now();
        let raw = self.source.advert_details(id).await?;
        let elapsed = started.elapsed();
        debug!("'{}' details fetched in {:.3}s", id, elapsed.as_secs_f64());

        Ok(AdvertRecord {
            id: id.clone(),
            raw,
            elapsed,
        })
    }
}
