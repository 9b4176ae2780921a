//! Id-index fast path.

use common_error::SaqResult;
use saq_query::Chain;

use crate::rules::patterns::{anchored_id_literal, filter_predicate, lookup_call};
use crate::rules::rule::{RewriteRule, Transformed};

/// Rewrites a head-of-chain `filter(.__id__ =~ '^x$')` into a direct
/// id-index lookup when the pattern is a purely anchored literal.
pub struct IdIndexLookup;

impl RewriteRule for IdIndexLookup {
    fn name(&self) -> &'static str {
        "IdIndexLookup"
    }

    fn description(&self) -> &'static str {
        "Replace a leading anchored-literal id filter with an id-index lookup"
    }

    fn apply(&self, chain: Chain) -> SaqResult<Transformed> {
        let Some(head) = chain.head() else {
            return Ok(Transformed::no(chain));
        };
        let Some(id) = filter_predicate(head).and_then(anchored_id_literal) else {
            return Ok(Transformed::no(chain));
        };

        let replacement = lookup_call("get_by_id", id, head);
        let mut calls = chain.calls;
        calls[0] = replacement;
        Ok(Transformed::yes(Chain::new(calls)))
    }
}
