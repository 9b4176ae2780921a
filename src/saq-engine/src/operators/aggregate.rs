//! Aggregation and grouping operators.

use std::cmp::Ordering;
use std::sync::Arc;

use common_error::{SaqError, SaqResult, Span};
use saq_core::{GroupKey, ObjectGrouping, ObjectList, SaObject, Value};
use saq_query::ops::Arity;
use saq_query::{Chain, OpCall, QueryValue};

use crate::context::EvalContext;
use crate::eval::eval_nested;
use crate::operators::{chain_argument, object_list};
use crate::registry::Operator;

pub(crate) const LOWEST: Operator = Operator {
    name: "lowest",
    arity: Arity::Exact(1),
    run: lowest,
};

pub(crate) const GROUPED_LOWEST: Operator = Operator {
    name: "grouped_lowest",
    arity: Arity::Exact(2),
    run: grouped_lowest,
};

pub(crate) const GROUPED_FILTER: Operator = Operator {
    name: "grouped_filter",
    arity: Arity::Exact(2),
    run: grouped_filter,
};

pub(crate) const SINGLE: Operator = Operator {
    name: "single",
    arity: Arity::Exact(0),
    run: single,
};

pub(crate) const VALUE: Operator = Operator {
    name: "value",
    arity: Arity::Exact(0),
    run: value,
};

fn lowest(ctx: &mut EvalContext, context: QueryValue, call: &OpCall) -> SaqResult<QueryValue> {
    let list = object_list("lowest", context, call.span)?;
    let expr = chain_argument("lowest", call, 0)?;
    match lowest_of(ctx, &list, expr, call.span)? {
        Some(winner) => Ok(QueryValue::Object(winner)),
        None => Ok(QueryValue::Absent),
    }
}

/// Element minimizing `expr`, earliest-wins on ties. Elements whose
/// expression absorbs are skipped.
fn lowest_of(
    ctx: &mut EvalContext,
    list: &ObjectList,
    expr: &Chain,
    span: Span,
) -> SaqResult<Option<Arc<SaObject>>> {
    let mut best: Option<(Arc<SaObject>, Value)> = None;

    for obj in list.iter() {
        let candidate = match eval_nested(ctx, expr, QueryValue::Object(Arc::clone(obj)))? {
            QueryValue::Absent => continue,
            QueryValue::Value(v) => v,
            other => {
                return Err(SaqError::type_error(
                    "lowest",
                    "a comparable value",
                    other.kind_name(),
                    span,
                ));
            }
        };

        match &best {
            None => best = Some((Arc::clone(obj), candidate)),
            Some((_, current)) => match candidate.compare(current) {
                Some(Ordering::Less) => best = Some((Arc::clone(obj), candidate)),
                Some(_) => {}
                None => {
                    return Err(SaqError::type_error(
                        "lowest",
                        format!("values comparable with {}", current.kind_name()),
                        candidate.kind_name(),
                        span,
                    ));
                }
            },
        }
    }

    Ok(best.map(|(obj, _)| obj))
}

/// Group `list` by the key expression. Elements whose key absorbs are
/// skipped.
fn group_by(
    ctx: &mut EvalContext,
    list: &ObjectList,
    keys: &Chain,
    span: Span,
) -> SaqResult<ObjectGrouping> {
    let mut grouping = ObjectGrouping::new();
    for obj in list.iter() {
        let key = match eval_nested(ctx, keys, QueryValue::Object(Arc::clone(obj)))? {
            QueryValue::Absent => continue,
            QueryValue::Value(v) => GroupKey::from_value(v),
            other => {
                return Err(SaqError::type_error(
                    "grouping",
                    "a primitive grouping key",
                    other.kind_name(),
                    span,
                ));
            }
        };
        grouping.insert(key, Arc::clone(obj));
    }
    Ok(grouping)
}

fn grouped_lowest(
    ctx: &mut EvalContext,
    context: QueryValue,
    call: &OpCall,
) -> SaqResult<QueryValue> {
    let list = object_list("grouped_lowest", context, call.span)?;
    let expr = chain_argument("grouped_lowest", call, 0)?;
    let keys = chain_argument("grouped_lowest", call, 1)?;

    let groups = group_by(ctx, &list, keys, call.span)?;
    let mut result = ObjectGrouping::new();
    for (key, members) in groups.iter() {
        if let Some(winner) = lowest_of(ctx, members, expr, call.span)? {
            result.set(key.clone(), [winner].into_iter().collect());
        }
    }
    Ok(QueryValue::Grouping(result))
}

fn grouped_filter(
    ctx: &mut EvalContext,
    context: QueryValue,
    call: &OpCall,
) -> SaqResult<QueryValue> {
    let list = object_list("grouped_filter", context, call.span)?;
    let predicate = chain_argument("grouped_filter", call, 0)?;
    let keys = chain_argument("grouped_filter", call, 1)?;

    let groups = group_by(ctx, &list, keys, call.span)?;
    let mut survivors = ObjectList::empty();
    for (_, members) in groups.iter() {
        match eval_nested(ctx, predicate, QueryValue::Objects(members.clone()))? {
            QueryValue::Absent => {}
            QueryValue::Value(Value::Bool(true)) => {
                for obj in members.iter() {
                    survivors.push(Arc::clone(obj));
                }
            }
            QueryValue::Value(Value::Bool(false)) => {}
            other => {
                return Err(SaqError::type_error(
                    "grouped_filter",
                    "a boolean predicate result",
                    other.kind_name(),
                    call.span,
                ));
            }
        }
    }
    Ok(QueryValue::Objects(survivors))
}

fn single(_ctx: &mut EvalContext, context: QueryValue, call: &OpCall) -> SaqResult<QueryValue> {
    let QueryValue::Value(Value::List(items)) = context else {
        return Err(SaqError::type_error(
            "single",
            "a list of values (project a field first)",
            context.kind_name(),
            call.span,
        ));
    };

    let Some(first) = items.first() else {
        return Ok(QueryValue::Absent);
    };
    for item in &items[1..] {
        if item != first {
            return Err(SaqError::SingleDisagreement(format!(
                "{} vs {}",
                first.display_string(),
                item.display_string()
            )));
        }
    }
    Ok(QueryValue::Value(first.clone()))
}

fn value(_ctx: &mut EvalContext, context: QueryValue, call: &OpCall) -> SaqResult<QueryValue> {
    let QueryValue::Value(Value::List(items)) = context else {
        return Err(SaqError::type_error(
            "value",
            "a one-element list",
            context.kind_name(),
            call.span,
        ));
    };
    if items.len() != 1 {
        return Err(SaqError::value(format!(
            "value() expects exactly one element, got {}",
            items.len()
        )));
    }
    Ok(QueryValue::Value(items.into_iter().next().expect("len checked")))
}
