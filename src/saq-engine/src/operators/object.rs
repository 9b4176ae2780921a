//! Object-list operators backed by the store indexes.

use std::sync::Arc;

use common_error::{SaqError, SaqResult};
use saq_core::Value;
use saq_query::ops::Arity;
use saq_query::{Argument, OpCall, QueryValue};

use crate::context::EvalContext;
use crate::operators::{object_list, str_argument};
use crate::registry::Operator;

pub(crate) const FILTER_BY_TYPE: Operator = Operator {
    name: "filter_by_type",
    arity: Arity::Exact(1),
    run: filter_by_type,
};

pub(crate) const FILTER_BY_SOURCE: Operator = Operator {
    name: "filter_by_source",
    arity: Arity::Exact(1),
    run: filter_by_source,
};

pub(crate) const GET_BY_ID: Operator = Operator {
    name: "get_by_id",
    arity: Arity::Exact(1),
    run: get_by_id,
};

pub(crate) const TO_JSON: Operator = Operator {
    name: "to_json",
    arity: Arity::Exact(0),
    run: to_json,
};

pub(crate) const SHOW_PLAN: Operator = Operator {
    name: "show_plan",
    arity: Arity::Exact(1),
    run: show_plan,
};

fn filter_by_type(
    ctx: &mut EvalContext,
    context: QueryValue,
    call: &OpCall,
) -> SaqResult<QueryValue> {
    let Some(type_name) = str_argument(ctx, call, 0, "a type name", &context)? else {
        return Ok(QueryValue::Absent);
    };

    // At the head of the root chain the type index answers the same
    // question as a full scan.
    if ctx.at_root() {
        let hits = ctx.snapshot.objects_of_type(&type_name);
        ctx.profiler
            .note(format!("filter → type_index ('{type_name}', {} objects)", hits.len()));
        return Ok(QueryValue::Objects(hits));
    }

    let list = object_list("filter_by_type", context, call.span)?;
    Ok(QueryValue::Objects(
        list.iter()
            .filter(|obj| obj.has_type(&type_name))
            .map(Arc::clone)
            .collect(),
    ))
}

fn filter_by_source(
    ctx: &mut EvalContext,
    context: QueryValue,
    call: &OpCall,
) -> SaqResult<QueryValue> {
    let Some(source) = str_argument(ctx, call, 0, "a source name", &context)? else {
        return Ok(QueryValue::Absent);
    };
    let list = object_list("filter_by_source", context, call.span)?;
    Ok(QueryValue::Objects(
        list.iter()
            .filter(|obj| obj.source() == source)
            .map(Arc::clone)
            .collect(),
    ))
}

fn get_by_id(ctx: &mut EvalContext, context: QueryValue, call: &OpCall) -> SaqResult<QueryValue> {
    let Some(id) = str_argument(ctx, call, 0, "an id", &context)? else {
        return Ok(QueryValue::Absent);
    };

    if ctx.at_root() {
        let hits = ctx.snapshot.objects_with_id(&id);
        ctx.profiler
            .note(format!("filter → id_index ('{id}', {} objects)", hits.len()));
        return Ok(QueryValue::Objects(hits));
    }

    let list = object_list("get_by_id", context, call.span)?;
    Ok(QueryValue::Objects(
        list.iter()
            .filter(|obj| obj.id() == id)
            .map(Arc::clone)
            .collect(),
    ))
}

fn to_json(_ctx: &mut EvalContext, context: QueryValue, call: &OpCall) -> SaqResult<QueryValue> {
    match context {
        QueryValue::Object(obj) => Ok(QueryValue::Value(Value::from(obj.to_json()))),
        QueryValue::Objects(list) => Ok(QueryValue::Value(Value::List(
            list.iter().map(|obj| Value::from(obj.to_json())).collect(),
        ))),
        v @ QueryValue::Value(_) => Ok(v),
        other => Err(SaqError::type_error(
            "to_json",
            "an object, object list, or value",
            other.kind_name(),
            call.span,
        )),
    }
}

fn show_plan(_ctx: &mut EvalContext, _context: QueryValue, call: &OpCall) -> SaqResult<QueryValue> {
    match &call.args[0] {
        Argument::Chain(chain) => Ok(QueryValue::Chain(chain.clone())),
        Argument::Value(_) => Err(SaqError::type_error(
            "show_plan",
            "a chain",
            "literal",
            call.span,
        )),
    }
}
