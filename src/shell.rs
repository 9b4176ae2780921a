//! The shell core: config → pollers → store → query execution.
//!
//! This is everything the interactive shell needs except the line editor:
//! it owns the store, keeps the pollers running, and turns query strings
//! into rendered results.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use common_config::{load_providers_file, QueryConfig, SaqConfig};
use common_error::SaqResult;
use saq_engine::{Executor, QueryOutcome};
use saq_query::{render, QueryValue};
use saq_storage::{PollerSet, ProviderHandle, ProviderSpec, SaoStore};

/// A running SAQ instance.
pub struct Shell {
    store: Arc<SaoStore>,
    executor: Executor,
    pollers: Option<PollerSet>,
}

impl Shell {
    /// Load the providers file, handshake every provider, and start the
    /// polling workers.
    pub async fn connect(config: &SaqConfig, providers_path: &Path) -> SaqResult<Self> {
        let entries = load_providers_file(providers_path)?;
        let specs: Vec<ProviderSpec> = entries
            .into_iter()
            .map(|entry| ProviderSpec {
                url: entry.url,
                interval: entry.interval.unwrap_or_else(|| config.poll.default_interval()),
            })
            .collect();

        let store = Arc::new(SaoStore::new());
        let pollers = PollerSet::spawn(Arc::clone(&store), specs, &config.poll).await;

        Ok(Self {
            store,
            executor: Executor::new(config.query.clone()),
            pollers: Some(pollers),
        })
    }

    /// A shell over an existing store, with no pollers. Used by tests and
    /// embedders that feed the store themselves.
    pub fn with_store(store: Arc<SaoStore>, query_config: QueryConfig) -> Self {
        Self {
            store,
            executor: Executor::new(query_config),
            pollers: None,
        }
    }

    /// The underlying store handle.
    pub fn store(&self) -> &Arc<SaoStore> {
        &self.store
    }

    /// Handles for the registered providers.
    pub fn providers(&self) -> &[Arc<ProviderHandle>] {
        self.pollers.as_ref().map_or(&[], |p| p.handles())
    }

    /// Wait until every polled provider completed its first fetch attempt.
    pub async fn wait_for_initial_data(&self, timeout: Duration) -> bool {
        match &self.pollers {
            Some(pollers) => pollers.wait_for_initial_data(timeout).await,
            None => true,
        }
    }

    /// Run a query against the current snapshot.
    pub fn query(&self, query: &str) -> SaqResult<QueryOutcome> {
        self.executor.run(query, self.store.snapshot())
    }

    /// Run a query and render the result for terminal output.
    pub fn query_rendered(&self, query: &str) -> SaqResult<String> {
        let outcome = self.query(query)?;
        Ok(render(&outcome.value))
    }

    /// Run a query, discarding everything but the value.
    pub fn query_value(&self, query: &str) -> SaqResult<QueryValue> {
        Ok(self.query(query)?.value)
    }

    /// Stop the polling workers and wait for them to finish.
    pub async fn shutdown(mut self) {
        if let Some(pollers) = self.pollers.take() {
            pollers.shutdown().await;
        }
    }
}
