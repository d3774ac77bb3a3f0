use crate::config::ConvergenceConfig;
use crate::domain::entities::namespace::{Page, Scope};
use crate::domain::entities::records::{Include, QueryRecords};
use crate::domain::ports::vector_store::VectorStore;
use crate::domain::values::api_result::ApiResult;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Poll delays: start at `initial`, grow by `step`, never exceed `max`.
#[derive(Debug, Clone)]
pub struct PollSchedule {
    next: Duration,
    step: Duration,
    max: Duration,
}

impl PollSchedule {
    pub fn new(config: &ConvergenceConfig) -> Self {
        Self {
            next: config.initial_interval.min(config.max_interval),
            step: config.step,
            max: config.max_interval,
        }
    }
}

impl Iterator for PollSchedule {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.next;
        self.next = (self.next + self.step).min(self.max);
        Some(current)
    }
}

/// Waits until freshly added records are countable and queryable.
///
/// Never fails: store errors during polling just mean "not yet".
pub struct ConvergenceWaiter {
    store: Arc<dyn VectorStore>,
    scope: Scope,
    config: ConvergenceConfig,
}

impl ConvergenceWaiter {
    pub fn new(store: Arc<dyn VectorStore>, scope: Scope, config: ConvergenceConfig) -> Self {
        Self {
            store,
            scope,
            config,
        }
    }

    /// True once the collection reports at least `expected` records and a
    /// similarity query around `probe` returns as many rows (bounded by the
    /// configured cap). False when the timeout runs out first.
    pub async fn wait(&self, collection_id: &str, expected: usize, probe: &[f32]) -> bool {
        let started = Instant::now();
        let mut schedule = PollSchedule::new(&self.config);
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let budget = self.config.timeout.saturating_sub(started.elapsed());
            let visible =
                match tokio::time::timeout(budget, self.converged(collection_id, expected, probe))
                    .await
                {
                    Ok(visible) => visible,
                    Err(_) => {
                        tracing::debug!(collection_id = %collection_id, attempts, "poll outlived the wait window");
                        false
                    }
                };
            if visible {
                tracing::info!(
                    collection_id = %collection_id,
                    expected,
                    attempts,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "records visible"
                );
                return true;
            }

            let remaining = self.config.timeout.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                tracing::warn!(
                    collection_id = %collection_id,
                    expected,
                    attempts,
                    "gave up waiting for records to become visible"
                );
                return false;
            }

            let delay = schedule.next().unwrap_or(self.config.max_interval);
            tokio::time::sleep(delay.min(remaining)).await;
        }
    }

    async fn converged(&self, collection_id: &str, expected: usize, probe: &[f32]) -> bool {
        let Scope { tenant, database } = &self.scope;

        let count = match self
            .store
            .count_records(tenant, database, collection_id)
            .await
        {
            ApiResult::Success { data, .. } => data as usize,
            ApiResult::Failure { error, status } => {
                tracing::debug!(status, error = %error, "count poll failed");
                return false;
            }
        };
        if count < expected {
            tracing::debug!(count, expected, "records not yet counted");
            return false;
        }
        if probe.is_empty() {
            return true;
        }

        let query = QueryRecords {
            query_embeddings: vec![probe.to_vec()],
            n_results: Some(self.config.verify_cap),
            include: vec![Include::Metadatas],
            ..Default::default()
        };
        match self
            .store
            .query_records(tenant, database, collection_id, &query, Page::default())
            .await
        {
            ApiResult::Success { data, .. } => {
                let rows = data.row_count(0);
                let needed = expected.min(self.config.verify_cap as usize);
                if rows < needed {
                    tracing::debug!(rows, needed, "records counted but not yet queryable");
                }
                rows >= needed
            }
            ApiResult::Failure { error, status } => {
                tracing::debug!(status, error = %error, "verify query failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_grows_linearly_then_caps() {
        let config = ConvergenceConfig::default();
        let delays: Vec<u64> = PollSchedule::new(&config)
            .take(10)
            .map(|d| d.as_millis() as u64)
            .collect();
        assert_eq!(
            delays,
            vec![2000, 2500, 3000, 3500, 4000, 4500, 5000, 5000, 5000, 5000]
        );
    }

    #[test]
    fn test_schedule_initial_above_max_is_capped() {
        let config = ConvergenceConfig {
            initial_interval: Duration::from_secs(10),
            ..ConvergenceConfig::default()
        };
        let first = PollSchedule::new(&config).next().unwrap();
        assert_eq!(first, config.max_interval);
    }
}
