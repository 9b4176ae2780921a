//! Type pre-filter for complex predicates.

use common_error::SaqResult;
use saq_query::{Argument, Chain, OpCall};

use crate::rules::patterns::{filter_predicate, lookup_call, type_test_conjunction};
use crate::rules::rule::{RewriteRule, Transformed};

/// Splits a head-of-chain `filter(and(<type test>, <rest>))` into a
/// type-index lookup followed by the remaining predicate, so the index
/// reduces the candidate set before the expensive part runs.
pub struct TypePrefilter;

impl RewriteRule for TypePrefilter {
    fn name(&self) -> &'static str {
        "TypePrefilter"
    }

    fn description(&self) -> &'static str {
        "Use the type index to shrink the candidate set of a conjunctive filter"
    }

    fn apply(&self, chain: Chain) -> SaqResult<Transformed> {
        let Some(head) = chain.head() else {
            return Ok(Transformed::no(chain));
        };
        let Some((type_name, rest)) = filter_predicate(head).and_then(type_test_conjunction)
        else {
            return Ok(Transformed::no(chain));
        };

        let lookup = lookup_call("filter_by_type", type_name, head);
        let residual = OpCall::new("filter", vec![Argument::Chain(rest.clone())], head.span);

        let mut calls = Vec::with_capacity(chain.calls.len() + 1);
        calls.push(lookup);
        calls.push(residual);
        calls.extend(chain.calls.into_iter().skip(1));
        Ok(Transformed::yes(Chain::new(calls)))
    }
}
