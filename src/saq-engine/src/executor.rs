//! Query execution entry point.

use std::sync::Arc;

use common_config::QueryConfig;
use common_error::SaqResult;
use saq_optimizer::{optimize_with_trace, RuleTrace};
use saq_query::{parse_query, Parsed, QueryValue};
use saq_storage::StoreSnapshot;

use crate::context::EvalContext;
use crate::eval::evaluate_root;
use crate::registry::Registry;

/// The result of running one query.
#[derive(Debug)]
pub struct QueryOutcome {
    /// The evaluated value.
    pub value: QueryValue,
    /// Optimizer decisions, observable for debugging.
    pub rewrites: Vec<RuleTrace>,
    /// Profiler report, when profiling is enabled.
    pub profile: Option<String>,
}

/// Parses, optimizes, and evaluates queries against store snapshots.
pub struct Executor {
    registry: Arc<Registry>,
    config: QueryConfig,
}

impl Executor {
    /// Create an executor with the standard operator set.
    pub fn new(config: QueryConfig) -> Self {
        Self {
            registry: Arc::new(Registry::standard()),
            config,
        }
    }

    /// The operator registry.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Run `query` against `snapshot`.
    pub fn run(&self, query: &str, snapshot: StoreSnapshot) -> SaqResult<QueryOutcome> {
        let chain = match parse_query(query)? {
            Parsed::Value(v) => {
                return Ok(QueryOutcome {
                    value: QueryValue::Value(v),
                    rewrites: Vec::new(),
                    profile: None,
                });
            }
            Parsed::Chain(chain) => chain,
        };

        let optimized = optimize_with_trace(chain)?;

        let mut ctx = EvalContext::new(Arc::clone(&self.registry), snapshot, &self.config);
        for trace in optimized.trace.iter().filter(|t| t.changed) {
            ctx.profiler
                .note(format!("{}: {} → {}", trace.rule_name, trace.before, trace.after));
        }

        let value = evaluate_root(&mut ctx, &optimized.chain)?;
        let profile = ctx.profiler.enabled().then(|| ctx.profiler.report());

        Ok(QueryOutcome {
            value,
            rewrites: optimized.trace,
            profile,
        })
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(QueryConfig::default())
    }
}
