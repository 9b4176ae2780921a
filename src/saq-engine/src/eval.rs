//! Chain evaluation.

use std::time::Instant;

use common_error::{SaqError, SaqResult};
use saq_query::{Argument, Chain, QueryValue};

use crate::context::EvalContext;

/// Evaluate `chain` against the whole store (the root object list).
pub fn evaluate_root(ctx: &mut EvalContext, chain: &Chain) -> SaqResult<QueryValue> {
    let root = QueryValue::Objects(ctx.snapshot.all().clone());
    ctx.at_root = true;
    let result = evaluate(ctx, chain, root);
    ctx.at_root = false;
    result
}

/// Evaluate `chain` step by step, feeding each step's output into the
/// next. An absorbing-none context short-circuits the rest of the chain.
pub fn evaluate(ctx: &mut EvalContext, chain: &Chain, context: QueryValue) -> SaqResult<QueryValue> {
    let mut current = context;

    for (i, call) in chain.calls.iter().enumerate() {
        if i > 0 {
            ctx.at_root = false;
        }

        let op = *ctx.registry.get(&call.name).ok_or_else(|| {
            SaqError::internal(format!("operator '{}' is not registered", call.name))
        })?;
        if !op.arity.accepts(call.args.len()) {
            return Err(SaqError::arity(op.name, op.arity.to_string(), call.args.len()));
        }

        if current.is_absent() {
            return Ok(QueryValue::Absent);
        }

        ctx.profiler.enter(op.name);
        let started = Instant::now();
        let result = (op.run)(ctx, current, call);
        ctx.profiler.exit(started.elapsed());
        current = result?;
    }

    Ok(current)
}

/// Evaluate a sub-chain (predicate, key expression, link target) without
/// inheriting root status.
pub fn eval_nested(
    ctx: &mut EvalContext,
    chain: &Chain,
    context: QueryValue,
) -> SaqResult<QueryValue> {
    let saved = ctx.at_root;
    ctx.at_root = false;
    let result = evaluate(ctx, chain, context);
    ctx.at_root = saved;
    result
}

/// Evaluate a positional argument against the current context: literals
/// pass through, chains re-enter the evaluator.
pub fn eval_argument(
    ctx: &mut EvalContext,
    arg: &Argument,
    context: &QueryValue,
) -> SaqResult<QueryValue> {
    match arg {
        Argument::Value(v) => Ok(QueryValue::Value(v.clone())),
        Argument::Chain(chain) => eval_nested(ctx, chain, context.clone()),
    }
}
