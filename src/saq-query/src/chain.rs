//! Parsed, unevaluated chains of operator calls.

use std::fmt;

use common_error::Span;
use saq_core::Value;

/// A positional argument to an operator call.
///
/// Arguments stay unevaluated at parse time: predicates are handed to their
/// operator as chains, and the operator decides when and against which
/// context to evaluate them.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// A literal value.
    Value(Value),
    /// An unevaluated sub-chain.
    Chain(Chain),
}

impl Argument {
    /// Kind name for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Value(v) => v.kind_name(),
            Self::Chain(_) => "Chain",
        }
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(Value::Str(s)) => write!(f, "'{}'", escape_str(s)),
            Self::Value(v) => write!(f, "{}", v.display_string()),
            Self::Chain(chain) => write!(f, "{chain}"),
        }
    }
}

/// One step of a chain: an operator name plus its argument list.
#[derive(Debug, Clone)]
pub struct OpCall {
    /// Registered operator name.
    pub name: String,
    /// Positional arguments, possibly empty.
    pub args: Vec<Argument>,
    /// Source position of the call.
    pub span: Span,
}

impl OpCall {
    /// Create a call.
    pub fn new(name: impl Into<String>, args: Vec<Argument>, span: Span) -> Self {
        Self {
            name: name.into(),
            args,
            span,
        }
    }

    /// The single string-literal argument, if that is the call's shape.
    pub fn lone_str_arg(&self) -> Option<&str> {
        match self.args.as_slice() {
            [Argument::Value(Value::Str(s))] => Some(s),
            _ => None,
        }
    }
}

// Spans are positional metadata; two calls are the same call if they name
// the same operator with the same arguments.
impl PartialEq for OpCall {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.args == other.args
    }
}

impl fmt::Display for OpCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{arg}")?;
        }
        write!(f, ")")
    }
}

/// An ordered list of operator calls.
///
/// Evaluation feeds the context through the calls left to right.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chain {
    /// The calls, in evaluation order.
    pub calls: Vec<OpCall>,
}

impl Chain {
    /// Create a chain from calls.
    pub fn new(calls: Vec<OpCall>) -> Self {
        Self { calls }
    }

    /// A chain holding a single call.
    pub fn single(call: OpCall) -> Self {
        Self { calls: vec![call] }
    }

    /// Whether the chain has no steps (the bare-context query `*`).
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// First call, if any.
    pub fn head(&self) -> Option<&OpCall> {
        self.calls.first()
    }

    /// Source span covering the whole chain.
    pub fn span(&self) -> Span {
        match (self.calls.first(), self.calls.last()) {
            (Some(first), Some(last)) => first.span.join(last.span),
            _ => Span::synthetic(),
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.calls.is_empty() {
            return write!(f, "*");
        }
        for call in &self.calls {
            write!(f, ".{call}")?;
        }
        Ok(())
    }
}

fn escape_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}
