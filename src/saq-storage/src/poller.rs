//! Provider polling workers.
//!
//! One tokio task per provider keeps the store current: fetch `/all_data`,
//! publish the contribution, sleep until `last_attempt + interval`, repeat.
//! Fetches for one provider never overlap; across providers any
//! interleaving is valid. The blocking HTTP client runs under
//! `spawn_blocking` so workers suspend only at await points.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{info, warn};

use common_config::PollConfig;

use crate::provider::{FetchError, ProviderClient, ProviderMode};
use crate::store::SaoStore;

/// A provider to poll.
#[derive(Debug, Clone)]
pub struct ProviderSpec {
    /// Base URL.
    pub url: String,
    /// Poll interval.
    pub interval: Duration,
}

/// Observable state of one provider's worker.
#[derive(Debug, Clone, Default)]
pub struct PollerStatus {
    /// Completed fetch attempts.
    pub attempts: u64,
    /// Completed successful fetches.
    pub successes: u64,
    /// Failures since the last success.
    pub consecutive_failures: u32,
    /// Whether the contribution was cleared after a malformed payload.
    pub degraded: bool,
    /// Cause of the most recent failure, if any.
    pub last_error: Option<String>,
}

/// Handle to one registered provider.
#[derive(Debug)]
pub struct ProviderHandle {
    /// Provider-declared source name.
    pub name: String,
    /// Base URL.
    pub url: String,
    /// Publishing mode.
    pub mode: ProviderMode,
    status: Mutex<PollerStatus>,
}

impl ProviderHandle {
    /// Current worker status.
    pub fn status(&self) -> PollerStatus {
        self.status.lock().clone()
    }

    fn record_success(&self) {
        let mut status = self.status.lock();
        status.attempts += 1;
        status.successes += 1;
        status.consecutive_failures = 0;
        status.degraded = false;
        status.last_error = None;
    }

    fn record_failure(&self, message: String, degraded: bool) {
        let mut status = self.status.lock();
        status.attempts += 1;
        status.consecutive_failures += 1;
        status.degraded = status.degraded || degraded;
        status.last_error = Some(message);
    }
}

/// The set of polling workers for all configured providers.
pub struct PollerSet {
    handles: Vec<Arc<ProviderHandle>>,
    tasks: Vec<JoinHandle<()>>,
    shutdown: watch::Sender<bool>,
}

impl PollerSet {
    /// Perform the `/hello` handshake with every provider and spawn a
    /// polling worker for each `ALL_AT_ONCE` one.
    ///
    /// Providers that fail the handshake are skipped with a warning; the
    /// rest keep working.
    pub async fn spawn(store: Arc<SaoStore>, specs: Vec<ProviderSpec>, poll: &PollConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        let mut handles = Vec::new();
        let mut tasks = Vec::new();

        for spec in specs {
            let client = ProviderClient::new(&spec.url, poll);
            let hello_client = client.clone();
            let hello = common_runtime::run_blocking(move || hello_client.hello()).await;

            let info = match hello {
                Ok(Ok(info)) => info,
                Ok(Err(e)) => {
                    warn!(url = %spec.url, error = %e, "provider handshake failed, skipping");
                    continue;
                }
                Err(e) => {
                    warn!(url = %spec.url, error = %e, "provider handshake panicked, skipping");
                    continue;
                }
            };

            info!(
                name = %info.name,
                url = %spec.url,
                mode = ?info.mode,
                version = %info.version,
                "connected to provider"
            );
            store.register_provider(&info.name);

            let handle = Arc::new(ProviderHandle {
                name: info.name,
                url: spec.url.clone(),
                mode: info.mode,
                status: Mutex::new(PollerStatus::default()),
            });
            handles.push(Arc::clone(&handle));

            match info.mode {
                ProviderMode::AllAtOnce => {
                    tasks.push(common_runtime::spawn(poll_loop(
                        Arc::clone(&store),
                        client,
                        handle,
                        spec.interval,
                        shutdown.subscribe(),
                    )));
                }
                ProviderMode::OnDemand => {
                    info!(name = %handle.name, "on-demand provider registered, not polled");
                }
            }
        }

        Self {
            handles,
            tasks,
            shutdown,
        }
    }

    /// Handles for all registered providers.
    pub fn handles(&self) -> &[Arc<ProviderHandle>] {
        &self.handles
    }

    /// Wait until every polled provider has completed at least one fetch
    /// attempt, or `timeout` elapses. Returns whether all became ready.
    pub async fn wait_for_initial_data(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let ready = self
                .handles
                .iter()
                .filter(|h| h.mode == ProviderMode::AllAtOnce)
                .all(|h| h.status().attempts > 0);
            if ready {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    /// Stop all workers at their next quiescent point and wait for them.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

async fn poll_loop(
    store: Arc<SaoStore>,
    client: ProviderClient,
    handle: Arc<ProviderHandle>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let attempt_started = Instant::now();
        let fetch_client = client.clone();
        let outcome = common_runtime::run_blocking(move || fetch_client.all_data()).await;

        match outcome {
            Ok(Ok(objects)) => {
                let count = objects.len();
                store.replace_provider(&handle.name, objects);
                handle.record_success();
                info!(provider = %handle.name, objects = count, "published contribution");
            }
            Ok(Err(FetchError::Transport(message))) => {
                // Previous contribution stays; retry at the next interval.
                warn!(provider = %handle.name, error = %message, "fetch failed, keeping last snapshot");
                handle.record_failure(message, false);
            }
            Ok(Err(FetchError::Malformed(message))) => {
                warn!(provider = %handle.name, error = %message, "malformed payload, clearing contribution");
                store.clear_provider(&handle.name);
                handle.record_failure(message, true);
            }
            Err(error) => {
                warn!(provider = %handle.name, error = %error, "fetch task failed");
                handle.record_failure(error.to_string(), false);
            }
        }

        let deadline = attempt_started + interval;
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            () = tokio::time::sleep_until(deadline) => {}
        }
    }
}
