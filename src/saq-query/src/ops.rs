//! Operator signatures.
//!
//! The parser validates operator names and fixed arities at parse time;
//! the engine registers a handler for every signature listed here (checked
//! by a test on the engine side).

/// Declared arity of an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly `n` arguments.
    Exact(usize),
    /// At least `n` arguments.
    AtLeast(usize),
    /// Between `min` and `max` arguments inclusive.
    Between(usize, usize),
}

impl Arity {
    /// Whether `count` satisfies this arity.
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Self::Exact(n) => count == n,
            Self::AtLeast(n) => count >= n,
            Self::Between(min, max) => (min..=max).contains(&count),
        }
    }
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Exact(n) => write!(f, "{n}"),
            Self::AtLeast(n) => write!(f, "at least {n}"),
            Self::Between(min, max) => write!(f, "{min} to {max}"),
        }
    }
}

/// Name and arity of a registered operator.
#[derive(Debug, Clone, Copy)]
pub struct OpSig {
    /// Surface name.
    pub name: &'static str,
    /// Declared arity.
    pub arity: Arity,
}

/// Every operator the surface syntax may name.
pub const SIGNATURES: &[OpSig] = &[
    OpSig { name: "get_field", arity: Arity::Exact(1) },
    OpSig { name: "has_field", arity: Arity::Exact(1) },
    OpSig { name: "filter", arity: Arity::Exact(1) },
    OpSig { name: "select", arity: Arity::AtLeast(1) },
    OpSig { name: "map", arity: Arity::Exact(1) },
    OpSig { name: "count", arity: Arity::Exact(0) },
    OpSig { name: "any", arity: Arity::Exact(0) },
    OpSig { name: "equals", arity: Arity::Exact(2) },
    // regex_match takes its subject from the context in the one-argument
    // form, or both sides explicitly in the two-argument form.
    OpSig { name: "regex_match", arity: Arity::Between(1, 2) },
    OpSig { name: "and", arity: Arity::Exact(2) },
    OpSig { name: "or", arity: Arity::Exact(2) },
    OpSig { name: "not", arity: Arity::Exact(1) },
    OpSig { name: "contains", arity: Arity::Exact(1) },
    OpSig { name: "includes", arity: Arity::Exact(1) },
    OpSig { name: "flatten", arity: Arity::Exact(0) },
    OpSig { name: "unique", arity: Arity::Exact(0) },
    OpSig { name: "lowest", arity: Arity::Exact(1) },
    OpSig { name: "grouped_lowest", arity: Arity::Exact(2) },
    OpSig { name: "grouped_filter", arity: Arity::Exact(2) },
    OpSig { name: "single", arity: Arity::Exact(0) },
    OpSig { name: "value", arity: Arity::Exact(0) },
    OpSig { name: "index", arity: Arity::Exact(1) },
    OpSig { name: "slice", arity: Arity::Exact(2) },
    OpSig { name: "to_json", arity: Arity::Exact(0) },
    OpSig { name: "show_plan", arity: Arity::Exact(1) },
    OpSig { name: "filter_by_type", arity: Arity::Exact(1) },
    OpSig { name: "filter_by_source", arity: Arity::Exact(1) },
    OpSig { name: "get_by_id", arity: Arity::Exact(1) },
];

/// Look up a signature by name.
pub fn signature(name: &str) -> Option<&'static OpSig> {
    SIGNATURES.iter().find(|sig| sig.name == name)
}
