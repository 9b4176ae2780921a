//! Rule application framework.

use common_error::SaqResult;
use saq_query::Chain;

use crate::rules::id_index::IdIndexLookup;
use crate::rules::rule::{OptimizedChain, RewriteRule, RuleTrace, Transformed};
use crate::rules::type_index::TypeIndexLookup;
use crate::rules::type_prefilter::TypePrefilter;

/// Optimizer configuration.
#[derive(Debug, Clone, Default)]
pub struct OptimizerConfig {
    /// Record a before/after trace per rule.
    pub trace: bool,
}

impl OptimizerConfig {
    /// Enable or disable tracing.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}

/// Applies the rewrite rules to query chains.
///
/// All rules anchor on the chain head, so a single pass in order is
/// enough; there is no fixed point to iterate towards.
pub struct Optimizer {
    rules: Vec<Box<dyn RewriteRule>>,
    config: OptimizerConfig,
}

impl Optimizer {
    /// Optimizer with the standard rule set.
    pub fn new() -> Self {
        Self::with_config(Self::standard_rules(), OptimizerConfig::default())
    }

    /// Optimizer with explicit rules and configuration.
    pub fn with_config(rules: Vec<Box<dyn RewriteRule>>, config: OptimizerConfig) -> Self {
        Self { rules, config }
    }

    /// The standard rule set, in application order.
    pub fn standard_rules() -> Vec<Box<dyn RewriteRule>> {
        vec![
            Box::new(TypeIndexLookup),
            Box::new(IdIndexLookup),
            Box::new(TypePrefilter),
        ]
    }

    /// Apply every rule once, in order.
    pub fn optimize(&self, chain: Chain) -> SaqResult<OptimizedChain> {
        let mut current = chain;
        let mut rules_applied = 0;
        let mut trace = Vec::new();

        for rule in &self.rules {
            let before = self.config.trace.then(|| current.to_string());
            let Transformed { chain, changed } = rule.apply(current)?;
            current = chain;
            if changed {
                rules_applied += 1;
            }
            if let Some(before) = before {
                trace.push(RuleTrace::new(
                    rule.name(),
                    before,
                    current.to_string(),
                    changed,
                ));
            }
        }

        Ok(OptimizedChain {
            chain: current,
            rules_applied,
            trace,
        })
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}
