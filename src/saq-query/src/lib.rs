//! Query language surface for SAQ.
//!
//! This crate owns everything between raw query text and the operator
//! runtime: the tokenizer, the parser with its shorthand desugarings, the
//! unevaluated [`Chain`] representation, the full [`QueryValue`] taxonomy,
//! and the textual renderer for results.

mod chain;
pub mod ops;
mod parser;
mod render;
mod token;
mod value;

pub use chain::{Argument, Chain, OpCall};
pub use parser::{parse_query, Parsed};
pub use render::render;
pub use token::{tokenize, Token, TokenKind};
pub use value::QueryValue;
