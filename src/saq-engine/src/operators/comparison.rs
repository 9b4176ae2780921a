//! Comparison operators.

use regex::Regex;

use common_error::{SaqError, SaqResult};
use saq_core::Value;
use saq_query::ops::Arity;
use saq_query::{OpCall, QueryValue};

use crate::context::EvalContext;
use crate::eval::eval_argument;
use crate::registry::Operator;

pub(crate) const EQUALS: Operator = Operator {
    name: "equals",
    arity: Arity::Exact(2),
    run: equals,
};

pub(crate) const REGEX_MATCH: Operator = Operator {
    name: "regex_match",
    arity: Arity::Between(1, 2),
    run: regex_match,
};

fn equals(ctx: &mut EvalContext, context: QueryValue, call: &OpCall) -> SaqResult<QueryValue> {
    let left = eval_argument(ctx, &call.args[0], &context)?;
    if left.is_absent() {
        return Ok(QueryValue::Absent);
    }
    let right = eval_argument(ctx, &call.args[1], &context)?;
    if right.is_absent() {
        return Ok(QueryValue::Absent);
    }
    Ok(QueryValue::from(query_values_equal(&left, &right)))
}

/// Comparison by value. String vs number is false; collections compare
/// elementwise; objects compare by full field equality.
fn query_values_equal(left: &QueryValue, right: &QueryValue) -> bool {
    match (left, right) {
        (QueryValue::Value(a), QueryValue::Value(b)) => a == b,
        (QueryValue::Object(a), QueryValue::Object(b)) => a == b,
        (QueryValue::Objects(a), QueryValue::Objects(b)) => a == b,
        (QueryValue::Grouping(a), QueryValue::Grouping(b)) => a == b,
        _ => false,
    }
}

fn regex_match(
    ctx: &mut EvalContext,
    context: QueryValue,
    call: &OpCall,
) -> SaqResult<QueryValue> {
    // One argument: the context is the subject. Two: both sides are
    // explicit (the literal-subject infix form).
    let (subject, pattern_arg) = if call.args.len() == 1 {
        (context.clone(), &call.args[0])
    } else {
        (eval_argument(ctx, &call.args[0], &context)?, &call.args[1])
    };

    let subject = match subject {
        QueryValue::Absent => return Ok(QueryValue::Absent),
        QueryValue::Value(Value::Str(s)) => s,
        other => {
            return Err(SaqError::type_error(
                "regex_match",
                "a string subject",
                other.kind_name(),
                call.span,
            ));
        }
    };
    let pattern = match eval_argument(ctx, pattern_arg, &context)? {
        QueryValue::Absent => return Ok(QueryValue::Absent),
        QueryValue::Value(Value::Str(p)) => p,
        other => {
            return Err(SaqError::type_error(
                "regex_match",
                "a string pattern",
                other.kind_name(),
                call.span,
            ));
        }
    };

    let regex = Regex::new(&pattern)
        .map_err(|e| SaqError::value(format!("invalid regex pattern '{pattern}': {e}")))?;
    Ok(QueryValue::from(regex.is_match(&subject)))
}
