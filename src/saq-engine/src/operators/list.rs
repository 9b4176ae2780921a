//! List and object-list operators.

use std::sync::Arc;

use common_error::{SaqError, SaqResult};
use saq_core::{is_reserved, ObjectList, SaObject, Value};
use saq_query::ops::Arity;
use saq_query::{Argument, OpCall, QueryValue};

use crate::context::EvalContext;
use crate::eval::{eval_argument, eval_nested};
use crate::operators::{chain_argument, object_list};
use crate::registry::Operator;

pub(crate) const FILTER: Operator = Operator {
    name: "filter",
    arity: Arity::Exact(1),
    run: filter,
};

pub(crate) const SELECT: Operator = Operator {
    name: "select",
    arity: Arity::AtLeast(1),
    run: select,
};

pub(crate) const MAP: Operator = Operator {
    name: "map",
    arity: Arity::Exact(1),
    run: map,
};

pub(crate) const COUNT: Operator = Operator {
    name: "count",
    arity: Arity::Exact(0),
    run: count,
};

pub(crate) const ANY: Operator = Operator {
    name: "any",
    arity: Arity::Exact(0),
    run: any,
};

pub(crate) const CONTAINS: Operator = Operator {
    name: "contains",
    arity: Arity::Exact(1),
    run: contains,
};

/// `includes` is the surface spelling used by the type-filter desugaring;
/// same behavior as `contains`.
pub(crate) const INCLUDES: Operator = Operator {
    name: "includes",
    arity: Arity::Exact(1),
    run: contains,
};

pub(crate) const FLATTEN: Operator = Operator {
    name: "flatten",
    arity: Arity::Exact(0),
    run: flatten,
};

pub(crate) const UNIQUE: Operator = Operator {
    name: "unique",
    arity: Arity::Exact(0),
    run: unique,
};

pub(crate) const INDEX: Operator = Operator {
    name: "index",
    arity: Arity::Exact(1),
    run: index,
};

pub(crate) const SLICE: Operator = Operator {
    name: "slice",
    arity: Arity::Exact(2),
    run: slice,
};

fn filter(ctx: &mut EvalContext, context: QueryValue, call: &OpCall) -> SaqResult<QueryValue> {
    let list = object_list("filter", context, call.span)?;
    let predicate = chain_argument("filter", call, 0)?;

    let mut survivors = ObjectList::empty();
    for obj in list.iter() {
        match eval_nested(ctx, predicate, QueryValue::Object(Arc::clone(obj)))? {
            // A missing field silently removes the object from results.
            QueryValue::Absent => {}
            QueryValue::Value(Value::Bool(true)) => survivors.push(Arc::clone(obj)),
            QueryValue::Value(Value::Bool(false)) => {}
            other => {
                return Err(SaqError::type_error(
                    "filter",
                    "a boolean predicate result",
                    other.kind_name(),
                    call.span,
                ));
            }
        }
    }
    Ok(QueryValue::Objects(survivors))
}

fn select(ctx: &mut EvalContext, context: QueryValue, call: &OpCall) -> SaqResult<QueryValue> {
    let single = matches!(context, QueryValue::Object(_));
    let list = object_list("select", context, call.span)?;

    let mut projected = ObjectList::empty();
    for obj in list.iter() {
        let mut fields = obj.reserved_fields();
        for arg in &call.args {
            let Argument::Chain(chain) = arg else {
                return Err(SaqError::type_error(
                    "select",
                    "chains beginning with a field access",
                    arg.kind_name(),
                    call.span,
                ));
            };
            let Some(head) = chain.head().filter(|c| c.name == "get_field") else {
                return Err(SaqError::type_error(
                    "select",
                    "chains beginning with a field access",
                    "Chain",
                    call.span,
                ));
            };
            let Some(field_name) = head.lone_str_arg() else {
                return Err(SaqError::type_error(
                    "select",
                    "a literal field name",
                    "Chain",
                    call.span,
                ));
            };
            if is_reserved(field_name) {
                continue;
            }

            // A bare `.field` keeps the raw value; longer chains compute
            // a derived value stored under the same name. An absorbed
            // value skips the field only; the object stays in the result.
            let value = if chain.calls.len() == 1 {
                obj.field(field_name).cloned()
            } else {
                match eval_nested(ctx, chain, QueryValue::Object(Arc::clone(obj)))? {
                    QueryValue::Absent => None,
                    QueryValue::Value(v) => Some(v),
                    other => {
                        return Err(SaqError::type_error(
                            "select",
                            "a plain projected value",
                            other.kind_name(),
                            call.span,
                        ));
                    }
                }
            };
            if let Some(v) = value {
                fields.insert(field_name.to_string(), v);
            }
        }
        projected.push(Arc::new(SaObject::new(fields)?));
    }

    if single {
        let obj = projected.get(0).expect("single object context");
        Ok(QueryValue::Object(Arc::clone(obj)))
    } else {
        Ok(QueryValue::Objects(projected))
    }
}

fn map(ctx: &mut EvalContext, context: QueryValue, call: &OpCall) -> SaqResult<QueryValue> {
    let list = object_list("map", context, call.span)?;
    let expr = chain_argument("map", call, 0)?;

    let mut out = Vec::with_capacity(list.len());
    for obj in list.iter() {
        match eval_nested(ctx, expr, QueryValue::Object(Arc::clone(obj)))? {
            QueryValue::Absent => {}
            QueryValue::Value(v) => out.push(v),
            other => {
                return Err(SaqError::type_error(
                    "map",
                    "a plain mapped value",
                    other.kind_name(),
                    call.span,
                ));
            }
        }
    }
    Ok(QueryValue::Value(Value::List(out)))
}

fn count(_ctx: &mut EvalContext, context: QueryValue, call: &OpCall) -> SaqResult<QueryValue> {
    let len = match &context {
        QueryValue::Objects(list) => list.len(),
        QueryValue::Grouping(grouping) => grouping.len(),
        QueryValue::Value(Value::List(items)) => items.len(),
        other => {
            return Err(SaqError::type_error(
                "count",
                "an ObjectList, grouping, or list",
                other.kind_name(),
                call.span,
            ));
        }
    };
    Ok(QueryValue::from(len as i64))
}

fn any(_ctx: &mut EvalContext, context: QueryValue, call: &OpCall) -> SaqResult<QueryValue> {
    let result = match &context {
        QueryValue::Objects(list) => !list.is_empty(),
        QueryValue::Grouping(grouping) => !grouping.is_empty(),
        QueryValue::Value(Value::List(items)) => !items.is_empty(),
        QueryValue::Value(v) => v.is_truthy(),
        other => {
            return Err(SaqError::type_error(
                "any",
                "an ObjectList, list, or primitive",
                other.kind_name(),
                call.span,
            ));
        }
    };
    Ok(QueryValue::from(result))
}

fn contains(ctx: &mut EvalContext, context: QueryValue, call: &OpCall) -> SaqResult<QueryValue> {
    let needle = match eval_argument(ctx, &call.args[0], &context)? {
        QueryValue::Absent => return Ok(QueryValue::Absent),
        QueryValue::Value(v) => v,
        other => {
            return Err(SaqError::type_error(
                "contains",
                "a plain value to search for",
                other.kind_name(),
                call.span,
            ));
        }
    };

    match &context {
        QueryValue::Value(Value::List(items)) => {
            let mut flat = Vec::new();
            flatten_fully(items, &mut flat);
            Ok(QueryValue::from(flat.iter().any(|v| **v == needle)))
        }
        QueryValue::Value(v) => Ok(QueryValue::from(*v == needle)),
        other => Err(SaqError::type_error(
            "contains",
            "a list or scalar",
            other.kind_name(),
            call.span,
        )),
    }
}

fn flatten_fully<'a>(items: &'a [Value], out: &mut Vec<&'a Value>) {
    for item in items {
        match item {
            Value::List(inner) => flatten_fully(inner, out),
            other => out.push(other),
        }
    }
}

fn flatten(_ctx: &mut EvalContext, context: QueryValue, call: &OpCall) -> SaqResult<QueryValue> {
    let QueryValue::Value(Value::List(items)) = context else {
        return Err(SaqError::type_error(
            "flatten",
            "a list",
            context.kind_name(),
            call.span,
        ));
    };
    // One level only, and only when every element is itself a list.
    if !items.is_empty() && items.iter().all(|i| matches!(i, Value::List(_))) {
        let flat = items
            .into_iter()
            .flat_map(|i| match i {
                Value::List(inner) => inner,
                _ => unreachable!("all elements checked to be lists"),
            })
            .collect();
        Ok(QueryValue::Value(Value::List(flat)))
    } else {
        Ok(QueryValue::Value(Value::List(items)))
    }
}

fn unique(_ctx: &mut EvalContext, context: QueryValue, call: &OpCall) -> SaqResult<QueryValue> {
    let QueryValue::Value(Value::List(items)) = context else {
        return Err(SaqError::type_error(
            "unique",
            "a list",
            context.kind_name(),
            call.span,
        ));
    };
    let mut out: Vec<Value> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    Ok(QueryValue::Value(Value::List(out)))
}

fn index(ctx: &mut EvalContext, context: QueryValue, call: &OpCall) -> SaqResult<QueryValue> {
    let n = match eval_argument(ctx, &call.args[0], &context)? {
        QueryValue::Absent => return Ok(QueryValue::Absent),
        QueryValue::Value(Value::Int(n)) => n,
        other => {
            return Err(SaqError::type_error(
                "index",
                "an integer index",
                other.kind_name(),
                call.span,
            ));
        }
    };

    match &context {
        QueryValue::Objects(list) => {
            let i = resolve_index(n, list.len())?;
            Ok(QueryValue::Object(Arc::clone(
                list.get(i).expect("bounds checked"),
            )))
        }
        QueryValue::Value(Value::List(items)) => {
            let i = resolve_index(n, items.len())?;
            Ok(QueryValue::Value(items[i].clone()))
        }
        other => Err(SaqError::type_error(
            "index",
            "an ObjectList or list",
            other.kind_name(),
            call.span,
        )),
    }
}

/// Bounds-checked index resolution; negative indexes address from the end.
fn resolve_index(n: i64, len: usize) -> SaqResult<usize> {
    let resolved = if n < 0 { n + len as i64 } else { n };
    if resolved < 0 || resolved as usize >= len {
        return Err(SaqError::IndexOutOfRange { index: n, len });
    }
    Ok(resolved as usize)
}

fn slice(ctx: &mut EvalContext, context: QueryValue, call: &OpCall) -> SaqResult<QueryValue> {
    let start = slice_bound(ctx, call, 0, &context)?;
    let end = slice_bound(ctx, call, 1, &context)?;

    match &context {
        QueryValue::Objects(list) => {
            let (lo, hi) = resolve_slice(start, end, list.len());
            Ok(QueryValue::Objects(
                list.iter().skip(lo).take(hi - lo).cloned().collect(),
            ))
        }
        QueryValue::Value(Value::List(items)) => {
            let (lo, hi) = resolve_slice(start, end, items.len());
            Ok(QueryValue::Value(Value::List(items[lo..hi].to_vec())))
        }
        other => Err(SaqError::type_error(
            "slice",
            "an ObjectList or list",
            other.kind_name(),
            call.span,
        )),
    }
}

fn slice_bound(
    ctx: &mut EvalContext,
    call: &OpCall,
    idx: usize,
    context: &QueryValue,
) -> SaqResult<Option<i64>> {
    match eval_argument(ctx, &call.args[idx], context)? {
        QueryValue::Value(Value::Null) => Ok(None),
        QueryValue::Value(Value::Int(n)) => Ok(Some(n)),
        other => Err(SaqError::type_error(
            "slice",
            "an integer bound or open end",
            other.kind_name(),
            call.span,
        )),
    }
}

/// Clamping slice-bound resolution; negatives address from the end.
fn resolve_slice(start: Option<i64>, end: Option<i64>, len: usize) -> (usize, usize) {
    let clamp = |bound: i64| -> usize {
        let resolved = if bound < 0 { bound + len as i64 } else { bound };
        resolved.clamp(0, len as i64) as usize
    };
    let lo = start.map_or(0, clamp);
    let hi = end.map_or(len, clamp);
    (lo, hi.max(lo))
}
