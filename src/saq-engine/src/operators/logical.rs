//! Short-circuiting logical operators.

use common_error::{SaqError, SaqResult, Span};
use saq_query::ops::Arity;
use saq_query::{OpCall, QueryValue};

use crate::context::EvalContext;
use crate::eval::eval_argument;
use crate::registry::Operator;

pub(crate) const AND: Operator = Operator {
    name: "and",
    arity: Arity::Exact(2),
    run: and,
};

pub(crate) const OR: Operator = Operator {
    name: "or",
    arity: Arity::Exact(2),
    run: or,
};

pub(crate) const NOT: Operator = Operator {
    name: "not",
    arity: Arity::Exact(1),
    run: not,
};

/// Truthiness of an operand; `None` means the operand absorbed.
fn truthiness(op: &str, value: &QueryValue, span: Span) -> SaqResult<Option<bool>> {
    match value {
        QueryValue::Absent => Ok(None),
        QueryValue::Value(v) => Ok(Some(v.is_truthy())),
        QueryValue::Object(_) => Ok(Some(true)),
        QueryValue::Objects(list) => Ok(Some(!list.is_empty())),
        QueryValue::Grouping(grouping) => Ok(Some(!grouping.is_empty())),
        QueryValue::Chain(_) => Err(SaqError::type_error(
            op,
            "a boolean operand",
            "Chain",
            span,
        )),
    }
}

fn and(ctx: &mut EvalContext, context: QueryValue, call: &OpCall) -> SaqResult<QueryValue> {
    let left = eval_argument(ctx, &call.args[0], &context)?;
    match truthiness("and", &left, call.span)? {
        None => Ok(QueryValue::Absent),
        Some(false) => Ok(QueryValue::from(false)),
        Some(true) => {
            let right = eval_argument(ctx, &call.args[1], &context)?;
            match truthiness("and", &right, call.span)? {
                None => Ok(QueryValue::Absent),
                Some(b) => Ok(QueryValue::from(b)),
            }
        }
    }
}

fn or(ctx: &mut EvalContext, context: QueryValue, call: &OpCall) -> SaqResult<QueryValue> {
    let left = eval_argument(ctx, &call.args[0], &context)?;
    match truthiness("or", &left, call.span)? {
        None => Ok(QueryValue::Absent),
        Some(true) => Ok(QueryValue::from(true)),
        Some(false) => {
            let right = eval_argument(ctx, &call.args[1], &context)?;
            match truthiness("or", &right, call.span)? {
                None => Ok(QueryValue::Absent),
                Some(b) => Ok(QueryValue::from(b)),
            }
        }
    }
}

fn not(ctx: &mut EvalContext, context: QueryValue, call: &OpCall) -> SaqResult<QueryValue> {
    let operand = eval_argument(ctx, &call.args[0], &context)?;
    match truthiness("not", &operand, call.span)? {
        None => Ok(QueryValue::Absent),
        Some(b) => Ok(QueryValue::from(!b)),
    }
}
