// Pagination-aware aggregation of advertisement ids.
use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use crate::client::AdSource;
use crate::confirm::Confirmer;
use crate::criteria::SearchCriteria;
use crate::model::{AdvertId, ClientError};

/// Ids requested per search page.
pub const PAGE_SIZE: u64 = 100;

#[derive(Debug)]
pub enum SearchOutcome {
    /// Ordered ids across all fetched pages, first-seen order preserved.
    Found(Vec<AdvertId>),
    /// The declared total was zero. Terminal, not an error.
    NoMatches,
    /// The operator declined the continuation checkpoint.
    Cancelled,
}

pub struct SearchAggregator<'a> {
    source: &'a dyn AdSource,
    confirmer: &'a dyn Confirmer,
    page_size: u64,
}

impl<'a> SearchAggregator<'a> {
    pub fn new(source: &'a dyn AdSource, confirmer: &'a dyn Confirmer) -> Self {
        Self::with_page_size(source, confirmer, PAGE_SIZE)
    }

    pub fn with_page_size(
        source: &'a dyn AdSource,
        confirmer: &'a dyn Confirmer,
        page_size: u64,
    ) -> Self {
        Self {
            source,
            confirmer,
            page_size,
        }
    }

    /// Run the paginated search. `label` names the search in operator-facing
    /// messages ("Ford Focus").
    pub async fn search(
        &self,
        criteria: &SearchCriteria,
        label: &str,
    ) -> Result<SearchOutcome, ClientError> {
        let first = self.source.search_page(criteria, 0, self.page_size).await?;
        let total = first.count;

        if total == 0 {
            info!("No cars found by given criteria");
            return Ok(SearchOutcome::NoMatches);
        }

        println!("Found {total} matches for \"{label}\" with given criteria");
        if !self.confirmer.confirm("Get? (y/n)") {
            info!("Search is cancelled by user");
            return Ok(SearchOutcome::Cancelled);
        }

        let mut ids = first.ids;

        if total > self.page_size {
            // Page 0 already covered one full page when the total divides
            // evenly, so one extra page less in that case.
            let mut extra = total / self.page_size;
            if total % self.page_size == 0 {
                extra -= 1;
            }

            let bar = ProgressBar::new(extra);
            for page in 1..=extra {
                debug!("searching cars on page {}", page + 1);
                let next = self.source.search_page(criteria, page, self.page_size).await?;
                if next.ids.is_empty() {
                    // The declared total overstated what the server can
                    // deliver; stop paging with what we have.
                    break;
                }
                ids.extend(next.ids);
                bar.inc(1);
            }
            bar.finish_and_clear();
            debug!("got ids for {} matching car(s)", ids.len());
        }

        if ids.len() as u64 != total {
            warn!(
                "advertisement ids count mismatch: found {}, got {}",
                total,
                ids.len()
            );
        }

        Ok(SearchOutcome::Found(ids))
    }
}
