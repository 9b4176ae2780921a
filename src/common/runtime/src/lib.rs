//! Async runtime utilities for SAQ.
//!
//! The poller runs on tokio; query evaluation is synchronous. These helpers
//! let synchronous entry points (the CLI, tests) drive the async side
//! without owning a runtime themselves.

use std::future::Future;

use common_error::{SaqError, SaqResult};
use tokio::runtime::Runtime;

/// Build a multi-threaded Tokio runtime for blocking entry points.
pub fn get_runtime() -> SaqResult<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("saq-worker")
        .build()
        .map_err(|e| SaqError::internal(format!("failed to create runtime: {e}")))
}

/// Block on a future using a fresh runtime.
pub fn block_on<F: Future>(future: F) -> SaqResult<F::Output> {
    let runtime = get_runtime()?;
    Ok(runtime.block_on(future))
}

/// Spawn a task on the current runtime.
pub fn spawn<F>(future: F) -> tokio::task::JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::spawn(future)
}

/// Run a blocking closure off the async executor threads.
pub async fn run_blocking<F, T>(f: F) -> SaqResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SaqError::internal(format!("blocking task panicked: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_on() {
        let out = block_on(async { 40 + 2 }).unwrap();
        assert_eq!(out, 42);
    }

    #[tokio::test]
    async fn test_run_blocking() {
        let out = run_blocking(|| "done").await.unwrap();
        assert_eq!(out, "done");
    }
}
