//! Shared predicate-shape matching for the rewrite rules.

use saq_core::{Value, ID_KEY, TYPES_KEY};
use saq_query::{Argument, Chain, OpCall};

/// If `call` is `filter(<chain>)`, return the predicate chain.
pub fn filter_predicate(call: &OpCall) -> Option<&Chain> {
    if call.name != "filter" {
        return None;
    }
    match call.args.as_slice() {
        [Argument::Chain(pred)] => Some(pred),
        _ => None,
    }
}

/// Match `get_field('__types__').includes('<lit>')` (or the `contains`
/// alias), returning the type literal.
pub fn type_membership_test(pred: &Chain) -> Option<&str> {
    match pred.calls.as_slice() {
        [field, membership] => {
            if field.name != "get_field" || field.lone_str_arg() != Some(TYPES_KEY) {
                return None;
            }
            if membership.name != "includes" && membership.name != "contains" {
                return None;
            }
            membership.lone_str_arg()
        }
        _ => None,
    }
}

/// Match `get_field('__id__') =~ '^<lit>$'` where `<lit>` is a pure
/// literal (no regex metacharacters), returning the id.
pub fn anchored_id_literal(pred: &Chain) -> Option<&str> {
    match pred.calls.as_slice() {
        [field, regex] => {
            if field.name != "get_field" || field.lone_str_arg() != Some(ID_KEY) {
                return None;
            }
            if regex.name != "regex_match" {
                return None;
            }
            let pattern = regex.lone_str_arg()?;
            let inner = pattern.strip_prefix('^')?.strip_suffix('$')?;
            is_plain_literal(inner).then_some(inner)
        }
        _ => None,
    }
}

/// Match a predicate of the form `and(<type test>, <rest>)`, returning
/// the type literal and the remaining predicate.
pub fn type_test_conjunction(pred: &Chain) -> Option<(&str, &Chain)> {
    match pred.calls.as_slice() {
        [conj] if conj.name == "and" => match conj.args.as_slice() {
            [Argument::Chain(left), Argument::Chain(rest)] => {
                let type_name = type_membership_test(left)?;
                Some((type_name, rest))
            }
            _ => None,
        },
        _ => None,
    }
}

/// Whether `text` contains no regex metacharacters.
pub fn is_plain_literal(text: &str) -> bool {
    !text.is_empty()
        && !text
            .chars()
            .any(|c| matches!(c, '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']'
                | '{' | '}' | '^' | '$'))
}

/// Build the replacement single-argument call, keeping the original span.
pub fn lookup_call(name: &str, literal: &str, original: &OpCall) -> OpCall {
    OpCall::new(
        name,
        vec![Argument::Value(Value::Str(literal.to_string()))],
        original.span,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use saq_query::{parse_query, Parsed};

    fn chain(input: &str) -> Chain {
        match parse_query(input).unwrap() {
            Parsed::Chain(c) => c,
            Parsed::Value(_) => panic!("expected chain"),
        }
    }

    #[test]
    fn test_type_membership_test() {
        let c = chain(".filter(.get_field('__types__').includes('person'))");
        let pred = filter_predicate(&c.calls[0]).unwrap();
        assert_eq!(type_membership_test(pred), Some("person"));

        let c = chain(".filter(.__types__.contains('person'))");
        let pred = filter_predicate(&c.calls[0]).unwrap();
        assert_eq!(type_membership_test(pred), Some("person"));

        let c = chain(".filter(.name.includes('person'))");
        let pred = filter_predicate(&c.calls[0]).unwrap();
        assert_eq!(type_membership_test(pred), None);
    }

    #[test]
    fn test_anchored_id_literal() {
        let c = chain(".filter(.__id__ =~ '^a-1$')");
        let pred = filter_predicate(&c.calls[0]).unwrap();
        assert_eq!(anchored_id_literal(pred), Some("a-1"));

        // Metacharacters disqualify the rewrite.
        let c = chain(".filter(.__id__ =~ '^a.*$')");
        let pred = filter_predicate(&c.calls[0]).unwrap();
        assert_eq!(anchored_id_literal(pred), None);

        // Unanchored patterns disqualify the rewrite.
        let c = chain(".filter(.__id__ =~ 'a')");
        let pred = filter_predicate(&c.calls[0]).unwrap();
        assert_eq!(anchored_id_literal(pred), None);
    }

    #[test]
    fn test_is_plain_literal() {
        assert!(is_plain_literal("job-17_b"));
        assert!(!is_plain_literal("a.*"));
        assert!(!is_plain_literal(""));
        assert!(!is_plain_literal("a|b"));
    }
}
