//! Operator implementations, grouped by family.

mod aggregate;
mod comparison;
mod field;
mod list;
mod logical;
mod object;

use std::collections::HashMap;

use common_error::{SaqError, SaqResult, Span};
use saq_core::{ObjectList, Value};
use saq_query::{Argument, Chain, OpCall, QueryValue};

use crate::context::EvalContext;
use crate::eval::eval_argument;
use crate::registry::Operator;

/// Build the standard name → handler table.
pub(crate) fn standard_table() -> HashMap<&'static str, Operator> {
    let operators = [
        field::GET_FIELD,
        field::HAS_FIELD,
        list::FILTER,
        list::SELECT,
        list::MAP,
        list::COUNT,
        list::ANY,
        list::CONTAINS,
        list::INCLUDES,
        list::FLATTEN,
        list::UNIQUE,
        list::INDEX,
        list::SLICE,
        comparison::EQUALS,
        comparison::REGEX_MATCH,
        logical::AND,
        logical::OR,
        logical::NOT,
        aggregate::LOWEST,
        aggregate::GROUPED_LOWEST,
        aggregate::GROUPED_FILTER,
        aggregate::SINGLE,
        aggregate::VALUE,
        object::FILTER_BY_TYPE,
        object::FILTER_BY_SOURCE,
        object::GET_BY_ID,
        object::TO_JSON,
        object::SHOW_PLAN,
    ];

    let mut table = HashMap::with_capacity(operators.len());
    for op in operators {
        table.insert(op.name, op);
    }
    table
}

/// Coerce a context into an object list; a single object acts as a
/// one-element list.
pub(crate) fn object_list(
    op: &str,
    context: QueryValue,
    span: Span,
) -> SaqResult<ObjectList> {
    match context {
        QueryValue::Objects(list) => Ok(list),
        QueryValue::Object(obj) => Ok([obj].into_iter().collect()),
        other => Err(SaqError::type_error(
            op,
            "an ObjectList",
            other.kind_name(),
            span,
        )),
    }
}

/// The argument at `idx`, which must be an unevaluated chain.
pub(crate) fn chain_argument<'a>(op: &str, call: &'a OpCall, idx: usize) -> SaqResult<&'a Chain> {
    match &call.args[idx] {
        Argument::Chain(chain) => Ok(chain),
        Argument::Value(v) => Err(SaqError::type_error(
            op,
            "an expression argument",
            v.kind_name(),
            call.span,
        )),
    }
}

/// Evaluate the argument at `idx` to a string. `None` means the argument
/// absorbed.
pub(crate) fn str_argument(
    ctx: &mut EvalContext,
    call: &OpCall,
    idx: usize,
    what: &str,
    context: &QueryValue,
) -> SaqResult<Option<String>> {
    match eval_argument(ctx, &call.args[idx], context)? {
        QueryValue::Absent => Ok(None),
        QueryValue::Value(Value::Str(s)) => Ok(Some(s)),
        other => Err(SaqError::type_error(
            call.name.clone(),
            what,
            other.kind_name(),
            call.span,
        )),
    }
}
