// Reference-data lookups backed by the TTL cache.
use tracing::debug;

use crate::cache::ReferenceDataCache;
use crate::client::RiaClient;
use crate::client::ria::CATEGORY_CARS;
use crate::model::{CacheError, RefItem, ReferenceTable};

/// Every lookup table a search run may need, fetched (or cache-loaded) once
/// up front.
pub struct ReferenceTables {
    pub makes: ReferenceTable,
    pub bodies: ReferenceTable,
    pub gearboxes: ReferenceTable,
    pub options: ReferenceTable,
    pub fuel_types: ReferenceTable,
    pub colors: ReferenceTable,
    pub countries: ReferenceTable,
}

pub struct ReferenceService<'a> {
    client: &'a RiaClient,
    cache: &'a ReferenceDataCache,
}

impl<'a> ReferenceService<'a> {
    pub fn new(client: &'a RiaClient, cache: &'a ReferenceDataCache) -> Self {
        Self { client, cache }
    }

    pub async fn load_all(&self) -> Result<ReferenceTables, CacheError> {
        Ok(ReferenceTables {
            makes: self.makes().await?,
            bodies: self.bodies().await?,
            gearboxes: self.gearboxes().await?,
            options: self.options().await?,
            fuel_types: self.fuel_types().await?,
            colors: self.colors().await?,
            countries: self.countries().await?,
        })
    }

    pub async fn makes(&self) -> Result<ReferenceTable, CacheError> {
        self.table("makes", None, format!("/auto/categories/{CATEGORY_CARS}/marks"))
            .await
    }

    pub async fn bodies(&self) -> Result<ReferenceTable, CacheError> {
        self.table(
            "styles",
            None,
            format!("/auto/categories/{CATEGORY_CARS}/bodystyles"),
        )
        .await
    }

    pub async fn gearboxes(&self) -> Result<ReferenceTable, CacheError> {
        self.table(
            "gearboxes",
            None,
            format!("/auto/categories/{CATEGORY_CARS}/gearboxes"),
        )
        .await
    }

    pub async fn options(&self) -> Result<ReferenceTable, CacheError> {
        self.table(
            "options",
            None,
            format!("/auto/categories/{CATEGORY_CARS}/options"),
        )
        .await
    }

    pub async fn fuel_types(&self) -> Result<ReferenceTable, CacheError> {
        self.table("fuel_types", None, "/auto/type".to_string()).await
    }

    pub async fn colors(&self) -> Result<ReferenceTable, CacheError> {
        self.table("colors", None, "/auto/colors".to_string()).await
    }

    pub async fn countries(&self) -> Result<ReferenceTable, CacheError> {
        self.table("countries", None, "/auto/countries".to_string())
            .await
    }

    /// Models of one make; cached per make id.
    pub async fn models(&self, make_id: i64) -> Result<ReferenceTable, CacheError> {
        let suffix = make_id.to_string();
        let path = format!("/auto/categories/{CATEGORY_CARS}/marks/{make_id}/models");
        let items: Vec<RefItem> = self
            .cache
            .get("models", Some(&suffix), || async {
                self.client.reference_list(&path).await
            })
            .await?;
        Ok(ReferenceTable(items))
    }

    async fn table(
        &self,
        key: &str,
        suffix: Option<&str>,
        path: String,
    ) -> Result<ReferenceTable, CacheError> {
        debug!("checking available {} to search", key);
        let items: Vec<RefItem> = self
            .cache
            .get(key, suffix, || async {
                self.client.reference_list(&path).await
            })
            .await?;
        Ok(ReferenceTable(items))
    }
}
