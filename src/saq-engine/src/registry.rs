//! Operator registry.

use std::collections::HashMap;

use common_error::SaqResult;
use saq_query::ops::Arity;
use saq_query::{OpCall, QueryValue};

use crate::context::EvalContext;

/// An operator body.
pub type OperatorFn =
    fn(&mut EvalContext, QueryValue, &OpCall) -> SaqResult<QueryValue>;

/// A registered operator: name, declared arity, and body.
#[derive(Debug, Clone, Copy)]
pub struct Operator {
    /// Surface name.
    pub name: &'static str,
    /// Declared arity, re-checked at evaluation time for synthesized
    /// chains that never went through the parser.
    pub arity: Arity,
    /// The body.
    pub run: OperatorFn,
}

/// Name → handler table, populated at init.
pub struct Registry {
    table: HashMap<&'static str, Operator>,
}

impl Registry {
    /// The standard operator set.
    pub fn standard() -> Self {
        Self {
            table: crate::operators::standard_table(),
        }
    }

    /// Look up an operator by name.
    pub fn get(&self, name: &str) -> Option<&Operator> {
        self.table.get(name)
    }

    /// Registered names.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.table.keys().copied()
    }

    /// Number of registered operators.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_matches_parser_signatures() {
        let registry = Registry::standard();
        assert_eq!(registry.len(), saq_query::ops::SIGNATURES.len());
        for sig in saq_query::ops::SIGNATURES {
            let op = registry
                .get(sig.name)
                .unwrap_or_else(|| panic!("operator '{}' not registered", sig.name));
            assert_eq!(op.arity, sig.arity, "arity mismatch for '{}'", sig.name);
        }
    }
}
