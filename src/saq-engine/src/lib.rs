//! Operator runtime for SAQ.
//!
//! Evaluates parsed chains against store snapshots. Operators are
//! registered by name in a [`Registry`]; each receives the current
//! context plus its unevaluated argument chains and decides when and
//! against which context to evaluate them. The absorbing-none sentinel
//! propagates through scalar operators and is skipped by iterating ones.

mod context;
mod eval;
mod executor;
mod metrics;
mod operators;
mod registry;

pub use context::EvalContext;
pub use eval::{eval_argument, eval_nested, evaluate, evaluate_root};
pub use executor::{Executor, QueryOutcome};
pub use metrics::{OpStats, Profiler};
pub use registry::{Operator, OperatorFn, Registry};
