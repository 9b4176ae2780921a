//! Query parser.
//!
//! Turns surface syntax into a [`Chain`]. Shorthand forms desugar here:
//!
//! - `person` (head identifier) → `filter_by_type('person')`
//! - `#a` → `get_by_id('a')`; `#job-*` → `filter(.__id__ =~ '^job-.*$')`
//! - `@hr` → `filter_by_source('hr')`
//! - `.name` → `get_field('name')`; `.#`/`.@` → id/source field access
//! - `[expr]` → `filter(expr)`; `[2]` → `index(2)`; `[1:3]` → `slice(1, 3)`
//! - `{.a, .b}` → `select(.a, .b)`
//! - `a == b` → `equals(a, b)`; `a =~ p` appends `regex_match(p)` to `a`
//! - `x && y`/`AND` → `and(x, y)`; `||`/`OR` → `or(x, y)`; `!x`/`NOT x` →
//!   `not(x)`
//!
//! Infix operators are left-associative with precedence
//! `OR < AND < == / =~ < !` (postfix binds tightest).

use common_error::{SaqError, SaqResult, Span};
use saq_core::{Value, ID_KEY, SOURCE_KEY};

use crate::chain::{Argument, Chain, OpCall};
use crate::ops;
use crate::token::{tokenize, Token, TokenKind};

/// A parsed query: either a bare literal or a chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    /// The query was a literal expression.
    Value(Value),
    /// The query was a chain of operator calls.
    Chain(Chain),
}

impl Parsed {
    /// Convert into an operator argument.
    pub fn into_argument(self) -> Argument {
        match self {
            Self::Value(v) => Argument::Value(v),
            Self::Chain(c) => Argument::Chain(c),
        }
    }
}

/// Parse a query string.
pub fn parse_query(input: &str) -> SaqResult<Parsed> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(SaqError::parse("empty query", Span::new(0, input.len())));
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        input_len: input.len(),
    };
    let parsed = parser.parse_expr()?;
    if let Some(token) = parser.peek() {
        return Err(SaqError::parse(
            format!("unexpected token {:?}", token.kind),
            token.span,
        ));
    }
    Ok(parsed)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    input_len: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn peek_kind_at(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| &t.kind)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn here(&self) -> Span {
        self.peek().map_or(
            Span::new(self.input_len, self.input_len),
            |t| t.span,
        )
    }

    fn prev_span(&self) -> Span {
        if self.pos == 0 {
            Span::new(0, 0)
        } else {
            self.tokens[self.pos - 1].span
        }
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek_kind() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> SaqResult<Span> {
        if self.peek_kind() == Some(kind) {
            let span = self.here();
            self.pos += 1;
            Ok(span)
        } else {
            Err(SaqError::parse(format!("expected {what}"), self.here()))
        }
    }

    fn eat_keyword(&mut self, word: &str) -> bool {
        if matches!(self.peek_kind(), Some(TokenKind::Ident(s)) if s == word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    // ------------------------------------------------------------------
    // Expression grammar
    // ------------------------------------------------------------------

    fn parse_expr(&mut self) -> SaqResult<Parsed> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> SaqResult<Parsed> {
        let start = self.here();
        let mut left = self.parse_and()?;
        while self.eat(&TokenKind::OrOr) || self.eat_keyword("OR") {
            let right = self.parse_and()?;
            left = self.binary("or", left, right, start);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> SaqResult<Parsed> {
        let start = self.here();
        let mut left = self.parse_cmp()?;
        while self.eat(&TokenKind::AndAnd) || self.eat_keyword("AND") {
            let right = self.parse_cmp()?;
            left = self.binary("and", left, right, start);
        }
        Ok(left)
    }

    fn parse_cmp(&mut self) -> SaqResult<Parsed> {
        let start = self.here();
        let mut left = self.parse_unary()?;
        loop {
            if self.eat(&TokenKind::EqEq) {
                let right = self.parse_unary()?;
                left = self.binary("equals", left, right, start);
            } else if self.eat(&TokenKind::RegexEq) {
                let right = self.parse_unary()?;
                let span = start.join(self.prev_span());
                left = match left {
                    // `.field =~ p` reads its subject from the context the
                    // chain is evaluated against.
                    Parsed::Chain(mut chain) => {
                        chain
                            .calls
                            .push(OpCall::new("regex_match", vec![right.into_argument()], span));
                        Parsed::Chain(chain)
                    }
                    Parsed::Value(v) => Parsed::Chain(Chain::single(OpCall::new(
                        "regex_match",
                        vec![Argument::Value(v), right.into_argument()],
                        span,
                    ))),
                };
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> SaqResult<Parsed> {
        let start = self.here();
        if self.eat(&TokenKind::Bang) || self.eat_keyword("NOT") {
            let operand = self.parse_unary()?;
            let span = start.join(self.prev_span());
            return Ok(Parsed::Chain(Chain::single(OpCall::new(
                "not",
                vec![operand.into_argument()],
                span,
            ))));
        }
        self.parse_postfix()
    }

    fn binary(&mut self, op: &str, left: Parsed, right: Parsed, start: Span) -> Parsed {
        let span = start.join(self.prev_span());
        Parsed::Chain(Chain::single(OpCall::new(
            op,
            vec![left.into_argument(), right.into_argument()],
            span,
        )))
    }

    // ------------------------------------------------------------------
    // Postfix chain
    // ------------------------------------------------------------------

    fn parse_postfix(&mut self) -> SaqResult<Parsed> {
        let mut current = match self.peek_kind() {
            // `[...]` / `{...}` at the head filter or project the context.
            Some(TokenKind::LBracket | TokenKind::LBrace) => Parsed::Chain(Chain::default()),
            _ => self.parse_primary()?,
        };

        loop {
            let call = match self.peek_kind() {
                Some(TokenKind::Dot) => {
                    self.next();
                    self.parse_dot_step()?
                }
                Some(TokenKind::LBracket) => self.parse_bracket_step()?,
                Some(TokenKind::LBrace) => self.parse_brace_step()?,
                _ => break,
            };

            current = match current {
                Parsed::Chain(mut chain) => {
                    chain.calls.push(call);
                    Parsed::Chain(chain)
                }
                Parsed::Value(_) => {
                    return Err(SaqError::parse(
                        "operators cannot follow a literal",
                        call.span,
                    ));
                }
            };
        }

        Ok(current)
    }

    fn parse_primary(&mut self) -> SaqResult<Parsed> {
        let token = self
            .next()
            .ok_or_else(|| SaqError::parse("unexpected end of query", self.here()))?;

        match token.kind {
            TokenKind::Dot => Ok(Parsed::Chain(Chain::single(self.parse_dot_step()?))),
            TokenKind::Star => Ok(Parsed::Chain(Chain::default())),
            TokenKind::Str(s) => Ok(Parsed::Value(Value::Str(s))),
            TokenKind::Int(i) => Ok(Parsed::Value(Value::Int(i))),
            TokenKind::Float(f) => Ok(Parsed::Value(Value::Float(f))),
            TokenKind::Hash => {
                let (name, span) = self.accumulate_name(token.span, true)?;
                if name.contains('*') {
                    // `#job-*` matches ids by anchored wildcard pattern.
                    let pattern = format!("^{}$", name.replace('*', ".*"));
                    let predicate = Chain::new(vec![
                        OpCall::new(
                            "get_field",
                            vec![Argument::Value(Value::from(ID_KEY))],
                            span,
                        ),
                        OpCall::new(
                            "regex_match",
                            vec![Argument::Value(Value::Str(pattern))],
                            span,
                        ),
                    ]);
                    Ok(Parsed::Chain(Chain::single(OpCall::new(
                        "filter",
                        vec![Argument::Chain(predicate)],
                        span,
                    ))))
                } else {
                    Ok(Parsed::Chain(Chain::single(OpCall::new(
                        "get_by_id",
                        vec![Argument::Value(Value::Str(name))],
                        span,
                    ))))
                }
            }
            TokenKind::At => {
                let (name, span) = self.accumulate_name(token.span, false)?;
                Ok(Parsed::Chain(Chain::single(OpCall::new(
                    "filter_by_source",
                    vec![Argument::Value(Value::Str(name))],
                    span,
                ))))
            }
            TokenKind::Ident(word) => match word.as_str() {
                "true" => Ok(Parsed::Value(Value::Bool(true))),
                "false" => Ok(Parsed::Value(Value::Bool(false))),
                "null" => Ok(Parsed::Value(Value::Null)),
                _ => {
                    let (name, span) = self.continue_name(word, token.span, false)?;
                    Ok(Parsed::Chain(Chain::single(OpCall::new(
                        "filter_by_type",
                        vec![Argument::Value(Value::Str(name))],
                        span,
                    ))))
                }
            },
            TokenKind::LParen => {
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            other => Err(SaqError::parse(
                format!("unexpected token {other:?}"),
                token.span,
            )),
        }
    }

    /// One `.something` step: field access, operator call, or the `.#`/`.@`
    /// reserved-field shorthands. The leading dot is already consumed.
    fn parse_dot_step(&mut self) -> SaqResult<OpCall> {
        let token = self
            .next()
            .ok_or_else(|| SaqError::parse("expected a name after '.'", self.here()))?;

        match token.kind {
            TokenKind::Hash => Ok(OpCall::new(
                "get_field",
                vec![Argument::Value(Value::from(ID_KEY))],
                token.span,
            )),
            TokenKind::At => Ok(OpCall::new(
                "get_field",
                vec![Argument::Value(Value::from(SOURCE_KEY))],
                token.span,
            )),
            TokenKind::Ident(name) => {
                if self.peek_kind() == Some(&TokenKind::LParen) {
                    self.parse_operator_call(name, token.span)
                } else {
                    let (field, span) = self.continue_name(name, token.span, false)?;
                    Ok(OpCall::new(
                        "get_field",
                        vec![Argument::Value(Value::Str(field))],
                        span,
                    ))
                }
            }
            other => Err(SaqError::parse(
                format!("expected a field or operator name after '.', got {other:?}"),
                token.span,
            )),
        }
    }

    fn parse_operator_call(&mut self, name: String, name_span: Span) -> SaqResult<OpCall> {
        let Some(sig) = ops::signature(&name) else {
            return Err(SaqError::parse(
                format!("unknown operator '{name}'"),
                name_span,
            ));
        };

        self.expect(&TokenKind::LParen, "'('")?;
        let mut args = Vec::new();
        if !self.eat(&TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?.into_argument());
                if self.eat(&TokenKind::Comma) {
                    continue;
                }
                self.expect(&TokenKind::RParen, "')' or ','")?;
                break;
            }
        }

        if !sig.arity.accepts(args.len()) {
            return Err(SaqError::arity(name, sig.arity.to_string(), args.len()));
        }

        Ok(OpCall::new(name, args, name_span.join(self.prev_span())))
    }

    /// `[...]`: integer indexing, slicing, or a filter predicate.
    fn parse_bracket_step(&mut self) -> SaqResult<OpCall> {
        let open = self.expect(&TokenKind::LBracket, "'['")?;

        // `[n]`
        if let (Some(TokenKind::Int(n)), Some(TokenKind::RBracket)) =
            (self.peek_kind(), self.peek_kind_at(1))
        {
            let n = *n;
            self.next();
            self.next();
            return Ok(OpCall::new(
                "index",
                vec![Argument::Value(Value::Int(n))],
                open.join(self.prev_span()),
            ));
        }

        // `[a:b]`, `[a:]`, `[:b]`
        let starts_slice = matches!(self.peek_kind(), Some(TokenKind::Colon))
            || (matches!(self.peek_kind(), Some(TokenKind::Int(_)))
                && matches!(self.peek_kind_at(1), Some(TokenKind::Colon)));
        if starts_slice {
            let start = match self.peek_kind() {
                Some(&TokenKind::Int(n)) => {
                    self.next();
                    Value::Int(n)
                }
                _ => Value::Null,
            };
            self.expect(&TokenKind::Colon, "':'")?;
            let end = match self.peek_kind() {
                Some(&TokenKind::Int(n)) => {
                    self.next();
                    Value::Int(n)
                }
                _ => Value::Null,
            };
            self.expect(&TokenKind::RBracket, "']'")?;
            return Ok(OpCall::new(
                "slice",
                vec![Argument::Value(start), Argument::Value(end)],
                open.join(self.prev_span()),
            ));
        }

        let inner = self.parse_expr()?;
        self.expect(&TokenKind::RBracket, "']'")?;
        let span = open.join(self.prev_span());
        match inner {
            Parsed::Chain(chain) => Ok(OpCall::new(
                "filter",
                vec![Argument::Chain(chain)],
                span,
            )),
            Parsed::Value(_) => Err(SaqError::parse(
                "filter predicate must be an expression",
                span,
            )),
        }
    }

    /// `{.a, .b}`: projection shorthand for `select`.
    fn parse_brace_step(&mut self) -> SaqResult<OpCall> {
        let open = self.expect(&TokenKind::LBrace, "'{'")?;
        let mut args = Vec::new();
        loop {
            let element = self.parse_expr()?;
            let span = open.join(self.prev_span());
            match element {
                Parsed::Chain(chain)
                    if chain.head().is_some_and(|call| call.name == "get_field") =>
                {
                    args.push(Argument::Chain(chain));
                }
                _ => {
                    return Err(SaqError::parse(
                        "projection elements must start with a field access",
                        span,
                    ));
                }
            }
            if self.eat(&TokenKind::Comma) {
                continue;
            }
            self.expect(&TokenKind::RBrace, "'}' or ','")?;
            break;
        }
        Ok(OpCall::new("select", args, open.join(self.prev_span())))
    }

    // ------------------------------------------------------------------
    // Names
    // ------------------------------------------------------------------

    /// Read a name after `#`/`@`, allowing hyphenated fragments (and `*`
    /// for id wildcards).
    fn accumulate_name(&mut self, sigil_span: Span, allow_star: bool) -> SaqResult<(String, Span)> {
        let token = self
            .next()
            .ok_or_else(|| SaqError::parse("expected a name", self.here()))?;
        let (first, span) = match token.kind {
            TokenKind::Ident(s) => (s, token.span),
            TokenKind::Int(i) if i >= 0 => (i.to_string(), token.span),
            TokenKind::Star if allow_star => ("*".to_string(), token.span),
            other => {
                return Err(SaqError::parse(
                    format!("expected a name, got {other:?}"),
                    token.span,
                ));
            }
        };
        if span.start != sigil_span.end {
            return Err(SaqError::parse("expected a name", span));
        }
        self.continue_name(first, sigil_span.join(span), allow_star)
    }

    /// Extend `name` with directly adjacent `-fragment` / `*` tokens, so
    /// hyphenated identifiers survive tokenization.
    fn continue_name(
        &mut self,
        mut name: String,
        mut span: Span,
        allow_star: bool,
    ) -> SaqResult<(String, Span)> {
        loop {
            match self.peek_kind() {
                Some(TokenKind::Star) if allow_star && self.here().start == span.end => {
                    name.push('*');
                    span = span.join(self.here());
                    self.next();
                }
                Some(TokenKind::Minus) if self.here().start == span.end => {
                    let minus_span = self.here();
                    let next = self.peek_kind_at(1).cloned();
                    let adjacent = self
                        .tokens
                        .get(self.pos + 1)
                        .is_some_and(|t| t.span.start == minus_span.end);
                    let fragment = match next {
                        Some(TokenKind::Ident(s)) if adjacent => s,
                        Some(TokenKind::Int(i)) if adjacent && i >= 0 => i.to_string(),
                        Some(TokenKind::Star) if adjacent && allow_star => "*".to_string(),
                        _ => break,
                    };
                    name.push('-');
                    name.push_str(&fragment);
                    self.next();
                    span = span.join(self.here());
                    self.next();
                }
                _ => break,
            }
        }
        Ok((name, span))
    }
}
