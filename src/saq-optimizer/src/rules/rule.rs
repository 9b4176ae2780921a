//! Rewrite rule trait and framework.

use common_error::SaqResult;
use saq_query::Chain;

/// A single rewrite rule over a query chain.
///
/// A rewrite is legal only when it is provably equivalent to naive
/// execution: the secondary indexes are projections of the primary
/// storage, so swapping a scan for an index lookup never changes results.
/// Rules must decline anything they cannot prove.
pub trait RewriteRule: Send + Sync {
    /// Get the name of this rule.
    fn name(&self) -> &'static str;

    /// Get a description of what this rule does.
    fn description(&self) -> &'static str {
        "No description available"
    }

    /// Apply this rule to the chain, returning a potentially rewritten chain.
    fn apply(&self, chain: Chain) -> SaqResult<Transformed>;
}

/// The result of applying a rewrite rule.
#[derive(Debug, Clone)]
pub struct Transformed {
    /// The (potentially rewritten) chain.
    pub chain: Chain,
    /// Whether the chain was actually changed.
    pub changed: bool,
}

impl Transformed {
    /// The rule fired and changed the chain.
    pub fn yes(chain: Chain) -> Self {
        Self {
            chain,
            changed: true,
        }
    }

    /// The rule did not apply.
    pub fn no(chain: Chain) -> Self {
        Self {
            chain,
            changed: false,
        }
    }
}

/// A trace entry for a single rule application, kept so optimizer
/// decisions stay observable for debugging.
#[derive(Debug, Clone)]
pub struct RuleTrace {
    /// The name of the rule that was applied.
    pub rule_name: String,
    /// Chain before the rule, rendered.
    pub before: String,
    /// Chain after the rule, rendered.
    pub after: String,
    /// Whether the rule actually changed the chain.
    pub changed: bool,
}

impl RuleTrace {
    /// Create a new trace entry.
    pub fn new(
        rule_name: impl Into<String>,
        before: impl Into<String>,
        after: impl Into<String>,
        changed: bool,
    ) -> Self {
        Self {
            rule_name: rule_name.into(),
            before: before.into(),
            after: after.into(),
            changed,
        }
    }
}

/// The outcome of optimizing one chain.
#[derive(Debug, Clone)]
pub struct OptimizedChain {
    /// The final chain.
    pub chain: Chain,
    /// Number of rules that changed the chain.
    pub rules_applied: usize,
    /// Per-rule trace (only populated when tracing is enabled).
    pub trace: Vec<RuleTrace>,
}

impl OptimizedChain {
    /// Format the trace as a human-readable string.
    pub fn format_trace(&self) -> String {
        let mut output = format!("{} rewrite(s) applied\n", self.rules_applied);
        for entry in self.trace.iter().filter(|t| t.changed) {
            output.push_str(&format!(
                "--- {} ---\nbefore: {}\nafter:  {}\n",
                entry.rule_name, entry.before, entry.after
            ));
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoOpRule;

    impl RewriteRule for NoOpRule {
        fn name(&self) -> &'static str {
            "NoOp"
        }

        fn apply(&self, chain: Chain) -> SaqResult<Transformed> {
            Ok(Transformed::no(chain))
        }
    }

    #[test]
    fn test_transformed() {
        let unchanged = Transformed::no(Chain::default());
        assert!(!unchanged.changed);
        let changed = Transformed::yes(Chain::default());
        assert!(changed.changed);
    }

    #[test]
    fn test_noop_rule() {
        let out = NoOpRule.apply(Chain::default()).unwrap();
        assert!(!out.changed);
    }
}
