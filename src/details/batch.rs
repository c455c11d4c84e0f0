// Fail-fast batch driver for detail fetches.
use indicatif::ProgressBar;
use tracing::warn;

use crate::details::fetcher::DetailFetcher;
use crate::model::{AdvertId, AdvertRecord, ClientError};

/// Why the batch stopped before exhausting the id list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// A detail fetch failed; the remaining ids were not attempted.
    FetchFailed(AdvertId),
}

/// Batch driver state. The first per-item failure transitions
/// `Running -> Stopped` and no further fetches are issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchState {
    Running,
    Completed,
    Stopped(StopReason),
}

#[derive(Debug)]
pub struct BatchReport {
    pub records: Vec<AdvertRecord>,
    pub state: BatchState,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        matches!(self.state, BatchState::Completed)
    }
}

/// Fetch details for every id, strictly in order, one request at a time.
///
/// An authorization rejection bypasses batch handling entirely and is
/// returned as the error it is; any other failure stops the batch with the
/// partial records collected so far.
pub async fn run_batch(
    fetcher: &DetailFetcher<'_>,
    ids: &[AdvertId],
) -> Result<BatchReport, ClientError> {
    let bar = ProgressBar::new(ids.len() as u64);
    let mut records = Vec::with_capacity(ids.len());
    let mut state = BatchState::Running;

    for id in ids {
        match fetcher.fetch(id).await {
            Ok(record) => {
                records.push(record);
                bar.inc(1);
            }
            Err(ClientError::AuthRejected(message)) => {
                bar.abandon();
                return Err(ClientError::AuthRejected(message));
            }
            Err(err) => {
                warn!("'{}' details fetch failed: {}", id, err);
                state = BatchState::Stopped(StopReason::FetchFailed(id.clone()));
                break;
            }
        }
    }

    if state == BatchState::Running {
        state = BatchState::Completed;
        bar.finish_and_clear();
    } else {
        bar.abandon();
    }

    Ok(BatchReport { records, state })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::DetailSource;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::Mutex;

    struct MockDetails {
        responses: Mutex<Vec<Result<Value, ClientError>>>,
        calls: Mutex<usize>,
    }

    impl MockDetails {
        fn new(responses: Vec<Result<Value, ClientError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl DetailSource for MockDetails {
        async fn advert_details(&self, _id: &AdvertId) -> Result<Value, ClientError> {
            *self.calls.lock().unwrap() += 1;
            self.responses.lock().unwrap().remove(0)
        }
    }

    fn ids(count: i64) -> Vec<AdvertId> {
        (0..count).map(AdvertId::from).collect()
    }

    #[tokio::test]
    async fn completes_in_order_when_every_fetch_succeeds() {
        let source = MockDetails::new(vec![
            Ok(json!({"autoData": {"autoId": 0}})),
            Ok(json!({"autoData": {"autoId": 1}})),
            Ok(json!({"autoData": {"autoId": 2}})),
        ]);
        let fetcher = DetailFetcher::new(&source);

        let report = run_batch(&fetcher, &ids(3)).await.unwrap();
        assert!(report.is_complete());
        assert_eq!(report.state, BatchState::Completed);
        assert_eq!(report.records.len(), 3);
        let order: Vec<&str> = report.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(order, vec!["0", "1", "2"]);
    }

    #[tokio::test]
    async fn first_failure_stops_the_batch() {
        let source = MockDetails::new(vec![
            Ok(json!({"ok": true})),
            Err(ClientError::Timeout),
            Ok(json!({"ok": true})),
            Ok(json!({"ok": true})),
        ]);
        let fetcher = DetailFetcher::new(&source);

        let report = run_batch(&fetcher, &ids(4)).await.unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(
            report.state,
            BatchState::Stopped(StopReason::FetchFailed(AdvertId::from(1)))
        );
        // Fail-fast: nothing after the failed item was requested.
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn auth_rejection_bypasses_batch_policy() {
        let source = MockDetails::new(vec![
            Ok(json!({"ok": true})),
            Err(ClientError::AuthRejected("key expired".into())),
        ]);
        let fetcher = DetailFetcher::new(&source);

        let err = run_batch(&fetcher, &ids(3)).await.unwrap_err();
        assert!(matches!(err, ClientError::AuthRejected(_)));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn empty_id_list_completes_immediately() {
        let source = MockDetails::new(Vec::new());
        let fetcher = DetailFetcher::new(&source);

        let report = run_batch(&fetcher, &[]).await.unwrap();
        assert!(report.is_complete());
        assert!(report.records.is_empty());
        assert_eq!(source.calls(), 0);
    }
}
