pub mod batch;
pub mod fetcher;

pub use batch::{BatchReport, BatchState, StopReason, run_batch};
pub use fetcher::DetailFetcher;
