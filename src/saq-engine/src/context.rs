//! Evaluation context.

use std::sync::Arc;

use common_config::QueryConfig;
use saq_storage::StoreSnapshot;

use crate::metrics::Profiler;
use crate::registry::Registry;

/// Everything an operator needs while a query runs.
///
/// The snapshot pins one consistent view of the store for the whole
/// evaluation; the link stack bounds and cycle-checks lazy link
/// resolution.
pub struct EvalContext {
    /// Operator table.
    pub registry: Arc<Registry>,
    /// The store view this query evaluates against.
    pub snapshot: StoreSnapshot,
    /// Timing collection.
    pub profiler: Profiler,
    /// Maximum link-resolution depth.
    pub link_depth_limit: usize,
    /// Link queries currently being resolved (cycle detection).
    pub link_stack: Vec<String>,
    pub(crate) at_root: bool,
}

impl EvalContext {
    /// Create a context for one query evaluation.
    pub fn new(registry: Arc<Registry>, snapshot: StoreSnapshot, config: &QueryConfig) -> Self {
        Self {
            registry,
            snapshot,
            profiler: Profiler::new(config.profile),
            link_depth_limit: config.link_depth_limit,
            link_stack: Vec::new(),
            at_root: false,
        }
    }

    /// Whether the step being evaluated is the first step of the root
    /// chain, i.e. its context is the whole store. Index fast paths are
    /// only valid here.
    pub fn at_root(&self) -> bool {
        self.at_root
    }
}
