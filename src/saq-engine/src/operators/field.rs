//! Field access operators.

use std::sync::Arc;

use common_error::{SaqError, SaqResult};
use saq_core::{Link, ObjectList, Value};
use saq_query::ops::Arity;
use saq_query::{OpCall, Parsed, QueryValue};

use crate::context::EvalContext;
use crate::eval::evaluate;
use crate::operators::str_argument;
use crate::registry::Operator;

pub(crate) const GET_FIELD: Operator = Operator {
    name: "get_field",
    arity: Arity::Exact(1),
    run: get_field,
};

pub(crate) const HAS_FIELD: Operator = Operator {
    name: "has_field",
    arity: Arity::Exact(1),
    run: has_field,
};

fn get_field(
    ctx: &mut EvalContext,
    context: QueryValue,
    call: &OpCall,
) -> SaqResult<QueryValue> {
    let Some(name) = str_argument(ctx, call, 0, "a field name", &context)? else {
        return Ok(QueryValue::Absent);
    };

    match context {
        QueryValue::Object(obj) => match obj.field(&name) {
            Some(value) => field_value(ctx, value),
            None => Ok(QueryValue::Absent),
        },
        QueryValue::Objects(list) => get_field_per_element(ctx, &list, &name, call),
        QueryValue::Value(Value::Map(map)) => match map.get(&name) {
            Some(value) => field_value(ctx, value),
            None => Ok(QueryValue::Absent),
        },
        other => Err(SaqError::type_error(
            "get_field",
            "an object, object list, or map",
            other.kind_name(),
            call.span,
        )),
    }
}

/// Per-element field access over a list. Objects missing the field are
/// skipped. Link fields resolve and merge into a single object list; a
/// field cannot mix link and plain values across elements.
fn get_field_per_element(
    ctx: &mut EvalContext,
    list: &ObjectList,
    name: &str,
    call: &OpCall,
) -> SaqResult<QueryValue> {
    let mut plain: Vec<Value> = Vec::new();
    let mut linked = ObjectList::empty();

    for obj in list.iter() {
        let Some(value) = obj.field(name) else {
            continue;
        };
        match field_value(ctx, value)? {
            QueryValue::Absent => {}
            QueryValue::Value(v) => plain.push(v),
            QueryValue::Object(o) => linked.push(o),
            QueryValue::Objects(objs) => {
                for o in objs.iter() {
                    linked.push(Arc::clone(o));
                }
            }
            other => {
                return Err(SaqError::type_error(
                    "get_field",
                    "plain values or link targets",
                    other.kind_name(),
                    call.span,
                ));
            }
        }
    }

    match (plain.is_empty(), linked.is_empty()) {
        (false, false) => Err(SaqError::type_error(
            "get_field",
            "a field holding either links or plain values, not both",
            "mixed",
            call.span,
        )),
        (true, false) => Ok(QueryValue::Objects(linked)),
        _ => Ok(QueryValue::Value(Value::List(plain))),
    }
}

/// Wrap a raw field value, resolving links lazily.
fn field_value(ctx: &mut EvalContext, value: &Value) -> SaqResult<QueryValue> {
    match Link::detect(value) {
        Some(Ok(link)) => resolve_link(ctx, &link),
        Some(Err(e)) => Err(e),
        None => Ok(QueryValue::Value(value.clone())),
    }
}

/// Run a link's query against the global store.
///
/// Depth-bounded with a visited set: re-entering a query already on the
/// stack is a cycle.
fn resolve_link(ctx: &mut EvalContext, link: &Link) -> SaqResult<QueryValue> {
    if ctx.link_stack.len() >= ctx.link_depth_limit {
        return Err(SaqError::link(format!(
            "link resolution depth limit ({}) exceeded at '{}'",
            ctx.link_depth_limit, link.query
        )));
    }
    if ctx.link_stack.contains(&link.query) {
        return Err(SaqError::link(format!(
            "link cycle detected at '{}'",
            link.query
        )));
    }

    let parsed = saq_query::parse_query(&link.query)
        .map_err(|e| SaqError::link(format!("invalid link query '{}': {e}", link.query)))?;
    let chain = match parsed {
        Parsed::Value(v) => return Ok(QueryValue::Value(v)),
        Parsed::Chain(chain) => saq_optimizer::optimize(chain)?.chain,
    };

    ctx.link_stack.push(link.query.clone());
    let saved = ctx.at_root;
    ctx.at_root = true;
    let root = QueryValue::Objects(ctx.snapshot.all().clone());
    let result = evaluate(ctx, &chain, root);
    ctx.at_root = saved;
    ctx.link_stack.pop();

    result.map_err(|e| match e {
        e @ SaqError::LinkResolution(_) => e,
        other => SaqError::link(format!("link query '{}' failed: {other}", link.query)),
    })
}

fn has_field(
    ctx: &mut EvalContext,
    context: QueryValue,
    call: &OpCall,
) -> SaqResult<QueryValue> {
    let Some(name) = str_argument(ctx, call, 0, "a field name", &context)? else {
        return Ok(QueryValue::Absent);
    };

    match &context {
        QueryValue::Object(obj) => Ok(QueryValue::from(obj.has_field(&name))),
        QueryValue::Objects(list) if list.len() == 1 => Ok(QueryValue::from(
            list.get(0).expect("len checked").has_field(&name),
        )),
        QueryValue::Value(Value::Map(map)) => Ok(QueryValue::from(map.contains_key(&name))),
        other => Err(SaqError::type_error(
            "has_field",
            "a single object or map",
            other.kind_name(),
            call.span,
        )),
    }
}
