//! Query tokenizer.

use common_error::{SaqError, SaqResult, Span};

/// A lexical token kind.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifier fragment (`[A-Za-z_][A-Za-z0-9_]*`).
    Ident(String),
    /// Integer literal.
    Int(i64),
    /// Float literal.
    Float(f64),
    /// String literal, escapes already decoded.
    Str(String),
    /// `.`
    Dot,
    /// `#`
    Hash,
    /// `@`
    At,
    /// `*`
    Star,
    /// `!`
    Bang,
    /// `-` between identifier fragments.
    Minus,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `==`
    EqEq,
    /// `=~`
    RegexEq,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
}

/// A token with its byte span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What was read.
    pub kind: TokenKind,
    /// Where it was read from.
    pub span: Span,
}

/// Split `input` into tokens.
pub fn tokenize(input: &str) -> SaqResult<Vec<Token>> {
    let bytes = input.as_bytes();
    let mut tokens: Vec<Token> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let start = i;
        let kind = match c {
            '.' => {
                // A dot directly followed by a digit would be ambiguous;
                // floats are only recognized as <digits>.<digits>.
                i += 1;
                TokenKind::Dot
            }
            '#' => {
                i += 1;
                TokenKind::Hash
            }
            '@' => {
                i += 1;
                TokenKind::At
            }
            '*' => {
                i += 1;
                TokenKind::Star
            }
            '!' => {
                i += 1;
                TokenKind::Bang
            }
            '(' => {
                i += 1;
                TokenKind::LParen
            }
            ')' => {
                i += 1;
                TokenKind::RParen
            }
            '[' => {
                i += 1;
                TokenKind::LBracket
            }
            ']' => {
                i += 1;
                TokenKind::RBracket
            }
            '{' => {
                i += 1;
                TokenKind::LBrace
            }
            '}' => {
                i += 1;
                TokenKind::RBrace
            }
            ',' => {
                i += 1;
                TokenKind::Comma
            }
            ':' => {
                i += 1;
                TokenKind::Colon
            }
            '=' => match bytes.get(i + 1).copied() {
                Some(b'=') => {
                    i += 2;
                    TokenKind::EqEq
                }
                Some(b'~') => {
                    i += 2;
                    TokenKind::RegexEq
                }
                _ => {
                    return Err(SaqError::parse(
                        "expected '==' or '=~', got a lone '='",
                        Span::new(start, start + 1),
                    ));
                }
            },
            '&' => {
                if bytes.get(i + 1) == Some(&b'&') {
                    i += 2;
                    TokenKind::AndAnd
                } else {
                    return Err(SaqError::parse(
                        "expected '&&', got a lone '&'",
                        Span::new(start, start + 1),
                    ));
                }
            }
            '|' => {
                if bytes.get(i + 1) == Some(&b'|') {
                    i += 2;
                    TokenKind::OrOr
                } else {
                    return Err(SaqError::parse(
                        "expected '||', got a lone '|'",
                        Span::new(start, start + 1),
                    ));
                }
            }
            '\'' | '"' => {
                let (s, next) = read_string(input, i, c)?;
                i = next;
                TokenKind::Str(s)
            }
            '-' => {
                // A minus begins a negative number literal unless the
                // previous token could end an expression.
                let prev_binds = matches!(
                    tokens.last().map(|t| &t.kind),
                    Some(
                        TokenKind::Ident(_)
                            | TokenKind::Int(_)
                            | TokenKind::Float(_)
                            | TokenKind::Str(_)
                            | TokenKind::RParen
                            | TokenKind::RBracket
                    )
                );
                if !prev_binds && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) {
                    let (kind, next) = read_number(input, i)?;
                    i = next;
                    kind
                } else {
                    i += 1;
                    TokenKind::Minus
                }
            }
            _ if c.is_ascii_digit() => {
                let (kind, next) = read_number(input, i)?;
                i = next;
                kind
            }
            _ if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = i + 1;
                while end < bytes.len()
                    && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_')
                {
                    end += 1;
                }
                let ident = input[i..end].to_string();
                i = end;
                TokenKind::Ident(ident)
            }
            other => {
                return Err(SaqError::parse(
                    format!("unexpected character '{other}'"),
                    Span::new(start, start + other.len_utf8()),
                ));
            }
        };

        tokens.push(Token {
            kind,
            span: Span::new(start, i),
        });
    }

    Ok(tokens)
}

fn read_string(input: &str, start: usize, quote: char) -> SaqResult<(String, usize)> {
    let mut out = String::new();
    let mut chars = input[start + 1..].char_indices();

    while let Some((offset, c)) = chars.next() {
        let abs = start + 1 + offset;
        match c {
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, '\\')) => out.push('\\'),
                Some((_, '\'')) => out.push('\''),
                Some((_, '"')) => out.push('"'),
                Some((_, other)) => {
                    return Err(SaqError::parse(
                        format!("unsupported escape '\\{other}'"),
                        Span::new(abs, abs + 1 + other.len_utf8()),
                    ));
                }
                None => break,
            },
            _ if c == quote => return Ok((out, abs + c.len_utf8())),
            _ => out.push(c),
        }
    }

    Err(SaqError::parse(
        "unterminated string",
        Span::new(start, input.len()),
    ))
}

fn read_number(input: &str, start: usize) -> SaqResult<(TokenKind, usize)> {
    let bytes = input.as_bytes();
    let mut end = start;
    if bytes[end] == b'-' {
        end += 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }

    // A fractional part needs a digit right after the dot; otherwise the
    // dot is a chain separator.
    let mut is_float = false;
    if end < bytes.len()
        && bytes[end] == b'.'
        && bytes.get(end + 1).is_some_and(u8::is_ascii_digit)
    {
        is_float = true;
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }

    let text = &input[start..end];
    let span = Span::new(start, end);
    let kind = if is_float {
        let f: f64 = text
            .parse()
            .map_err(|_| SaqError::parse(format!("invalid float literal '{text}'"), span))?;
        TokenKind::Float(f)
    } else {
        let i: i64 = text.parse().map_err(|_| {
            SaqError::parse(format!("integer literal '{text}' out of range"), span)
        })?;
        TokenKind::Int(i)
    };
    Ok((kind, end))
}
