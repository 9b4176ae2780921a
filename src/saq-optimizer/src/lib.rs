//! Chain optimizer for SAQ.
//!
//! Peephole rewrites that replace head-of-chain filters with direct index
//! lookups when they are provably equivalent:
//!
//! - **TypeIndexLookup**: `filter(.__types__.includes('T'))` → `filter_by_type('T')`
//! - **IdIndexLookup**: `filter(.__id__ =~ '^x$')` → `get_by_id('x')` (anchored
//!   literal patterns only)
//! - **TypePrefilter**: `filter(and(<type test>, <rest>))` →
//!   `filter_by_type('T').filter(<rest>)`
//!
//! Rewrites fire only on the first step of the root chain; equivalence
//! holds because the type and id indexes are projections of the same
//! primary storage. Every decision is recorded in a [`RuleTrace`] so it
//! stays observable for debugging.

pub mod rules;

pub use rules::{
    IdIndexLookup, OptimizedChain, Optimizer, OptimizerConfig, RewriteRule, RuleTrace,
    Transformed, TypeIndexLookup, TypePrefilter,
};

use common_error::SaqResult;
use saq_query::Chain;

/// Optimize a chain using the standard rule set.
pub fn optimize(chain: Chain) -> SaqResult<OptimizedChain> {
    Optimizer::default().optimize(chain)
}

/// Optimize a chain with per-rule tracing enabled.
pub fn optimize_with_trace(chain: Chain) -> SaqResult<OptimizedChain> {
    Optimizer::with_config(
        Optimizer::standard_rules(),
        OptimizerConfig::default().with_trace(true),
    )
    .optimize(chain)
}
