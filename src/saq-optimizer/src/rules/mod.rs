//! Rewrite rules and the framework that applies them.

mod id_index;
mod optimizer;
mod patterns;
mod rule;
mod type_index;
mod type_prefilter;

pub use id_index::IdIndexLookup;
pub use optimizer::{Optimizer, OptimizerConfig};
pub use patterns::is_plain_literal;
pub use rule::{OptimizedChain, RewriteRule, RuleTrace, Transformed};
pub use type_index::TypeIndexLookup;
pub use type_prefilter::TypePrefilter;
