//! Type-index fast path.

use common_error::SaqResult;
use saq_query::Chain;

use crate::rules::patterns::{filter_predicate, lookup_call, type_membership_test};
use crate::rules::rule::{RewriteRule, Transformed};

/// Rewrites a head-of-chain `filter(.__types__.includes('T'))` into a
/// direct type-index lookup.
///
/// Only the first step of the root chain qualifies: after any reducing
/// step the context is no longer the root object list and the index would
/// answer a different question.
pub struct TypeIndexLookup;

impl RewriteRule for TypeIndexLookup {
    fn name(&self) -> &'static str {
        "TypeIndexLookup"
    }

    fn description(&self) -> &'static str {
        "Replace a leading type-membership filter with a type-index lookup"
    }

    fn apply(&self, chain: Chain) -> SaqResult<Transformed> {
        let Some(head) = chain.head() else {
            return Ok(Transformed::no(chain));
        };
        let Some(type_name) = filter_predicate(head).and_then(type_membership_test) else {
            return Ok(Transformed::no(chain));
        };

        let replacement = lookup_call("filter_by_type", type_name, head);
        let mut calls = chain.calls;
        calls[0] = replacement;
        Ok(Transformed::yes(Chain::new(calls)))
    }
}
