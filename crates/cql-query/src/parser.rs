//! Query parser.
//!
//! Parses case-folded query text into a validated AST by recursive descent
//! over the combinators in [`crate::combinator`].
//!
//! # Grammar
//!
//! ```text
//! query    → ws term EOF
//! term     → or_expr
//! or_expr  → and_expr ("or" and_expr)*
//! and_expr → unary ("and" unary)*
//! unary    → "not"? primary
//! primary  → atom | "(" term ")"
//! atom     → FIELD (STRING_OP value | LIST_OP list)
//! value    → QUOTED | BARE
//! list     → "(" item ("," item)* ")"
//! ```
//!
//! # Precedence (highest to lowest)
//!
//! 1. Grouping: `(...)`
//! 2. Negation: `not`
//! 3. AND
//! 4. OR
//!
//! Both binary operators are left-associative.

use log::{debug, trace};

use crate::{
    ast::{AtomOperator, BinaryOperator, CqlAtom, CqlListAtom, CqlSingleAtom, CqlTerm},
    combinator::{Input, Reply, alt, map, opt, parse_all, terminated},
    error::QueryError,
    lexer::{leading, list, single_value, token},
    lexicon::{self, close_group, connective, list_operator, open_group, string_operator},
    validate::{is_valid_atom, is_valid_operator},
};

/// Parses: term → or_expr
fn term(input: Input<'_>) -> Reply<'_, CqlTerm> {
    or_expr(input)
}

/// Parses: or_expr → and_expr ("or" and_expr)*
fn or_expr(input: Input<'_>) -> Reply<'_, CqlTerm> {
    chain(input, and_expr, "or", BinaryOperator::Or)
}

/// Parses: and_expr → unary ("and" unary)*
fn and_expr(input: Input<'_>) -> Reply<'_, CqlTerm> {
    chain(input, unary, "and", BinaryOperator::And)
}

/// Left-folds operands joined by the connective `word` into nested binary nodes.
///
/// Once a connective is consumed its right operand is required, so `a and`
/// fails at the missing operand rather than at the `and`.
fn chain<'a>(
    input: Input<'a>,
    operand: fn(Input<'a>) -> Reply<'a, CqlTerm>,
    word: &'static str,
    operator: BinaryOperator,
) -> Reply<'a, CqlTerm> {
    let (mut acc, mut input) = operand(input)?;
    while let Ok(((), after)) = connective(word)(input) {
        let (next, rest) = operand(after)?;
        acc = CqlTerm::binary(operator, acc, next);
        input = rest;
    }
    Ok((acc, input))
}

/// Parses: unary → "not"? primary
fn unary(input: Input<'_>) -> Reply<'_, CqlTerm> {
    let (negated, input) = opt(connective("not"))(input)?;
    let (term, input) = primary(input)?;
    let term = match negated {
        Some(()) => CqlTerm::not(term),
        None => term,
    };
    Ok((term, input))
}

/// Parses: primary → atom | "(" term ")"
fn primary(input: Input<'_>) -> Reply<'_, CqlTerm> {
    alt(map(atom, CqlTerm::Atom), group)(input)
}

/// Deepest group nesting accepted.
const MAX_DEPTH: usize = 64;

/// Parses a parenthesized sub-term.
///
/// Groups nested more than [`MAX_DEPTH`] deep fail just inside their opening
/// bracket.
fn group(input: Input<'_>) -> Reply<'_, CqlTerm> {
    let depth = input.depth();
    let ((), inside) = open_group(input)?;
    if depth >= MAX_DEPTH {
        return Err(inside.fail("shallower nesting"));
    }
    let (term, rest) = terminated(term, close_group)(inside.at_depth(depth + 1))?;
    Ok((term, rest.at_depth(depth)))
}

/// Parses either kind of atom operator; string operators are tried first.
fn atom_operator(input: Input<'_>) -> Reply<'_, AtomOperator> {
    alt(
        map(string_operator, AtomOperator::String),
        map(list_operator, AtomOperator::List),
    )(input)
}

/// Parses and validates: atom → FIELD (STRING_OP value | LIST_OP list)
///
/// An atom that is well-formed but fails validation is a parse failure,
/// reported at its operator or at its value.
fn atom(input: Input<'_>) -> Reply<'_, CqlAtom> {
    let (field, operator_input) = token(lexicon::field)(input)?;
    let (operator, value_input) = token(atom_operator)(operator_input)?;

    let (atom, rest) = match operator {
        AtomOperator::String(operator) => {
            let (value, rest) = token(single_value)(value_input)?;
            let atom = CqlAtom::Single(CqlSingleAtom {
                operator,
                field,
                value,
            });
            (atom, rest)
        }
        AtomOperator::List(operator) => {
            let (value, rest) = token(list)(value_input)?;
            let atom = CqlAtom::List(CqlListAtom {
                operator,
                field,
                value,
            });
            (atom, rest)
        }
    };

    if is_valid_atom(&atom) {
        Ok((atom, rest))
    } else if !is_valid_operator(field, operator) {
        Err(operator_input.fail("operator allowed for this field"))
    } else {
        Err(value_input.fail("value allowed for this field"))
    }
}

/// Parses a CQL query into an AST.
///
/// The whole query is lowercased first, so keywords, field names and values
/// are all case-insensitive and values come back lowercased. The query must
/// be consumed entirely; trailing spaces are allowed.
///
/// # Errors
///
/// Returns [`QueryError`] for any syntax error, illegal field/operator/value
/// combination, unconsumed input, or an empty query.
///
/// # Example
///
/// ```
/// use cql_query::{CqlTerm, Field, StringOperator, parse_cql};
///
/// let term = parse_cql("title ~ \"Auto\"").unwrap();
/// assert_eq!(term, CqlTerm::single(Field::Title, StringOperator::Contains, "auto"));
/// ```
pub fn parse_cql(query: &str) -> Result<CqlTerm, QueryError> {
    let folded = query.to_lowercase();
    match parse_all(leading(term), &folded, 0) {
        Ok(term) => {
            trace!("parsed query {folded:?}");
            Ok(term)
        }
        Err(failure) => {
            debug!(
                "rejected query {folded:?} at offset {}: expected {}",
                failure.position, failure.expected
            );
            Err(QueryError::new(failure, folded))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::ast::{Field, ListOperator, StringOperator};

    fn title(value: &str) -> CqlTerm {
        CqlTerm::single(Field::Title, StringOperator::Contains, value)
    }

    fn space(value: &str) -> CqlTerm {
        CqlTerm::single(Field::Space, StringOperator::Equals, value)
    }

    fn label(value: &str) -> CqlTerm {
        CqlTerm::single(Field::Label, StringOperator::Equals, value)
    }

    fn labels(values: &[&str]) -> CqlTerm {
        CqlTerm::list(Field::Label, ListOperator::In, values.iter().copied())
    }

    fn and(a: CqlTerm, b: CqlTerm) -> CqlTerm {
        CqlTerm::and(a, b)
    }

    fn or(a: CqlTerm, b: CqlTerm) -> CqlTerm {
        CqlTerm::or(a, b)
    }

    fn not(a: CqlTerm) -> CqlTerm {
        CqlTerm::not(a)
    }

    fn rejects(query: &str) {
        assert!(parse_cql(query).is_err(), "{query:?} should be rejected");
    }

    #[test]
    fn title_query() {
        assert_eq!(parse_cql("title ~ \"auto\"").unwrap(), title("auto"));
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(parse_cql("TITLE ~ \"AUTO\"").unwrap(), title("auto"));
        assert_eq!(parse_cql("Label IN (A)").unwrap(), labels(&["a"]));
    }

    #[test]
    fn single_quotes() {
        assert_eq!(parse_cql("title ~ 'auto'").unwrap(), title("auto"));
    }

    #[test]
    fn quoted_content_is_verbatim() {
        assert_eq!(parse_cql("title ~ 'auto test'").unwrap(), title("auto test"));
        assert_eq!(parse_cql("title ~ 'auto123'").unwrap(), title("auto123"));
        assert_eq!(parse_cql("title ~ 'auto&test$%-'").unwrap(), title("auto&test$%-"));
        assert_eq!(parse_cql("title ~ \"tim's plan\"").unwrap(), title("tim's plan"));
    }

    #[test]
    fn whitespace_is_optional() {
        assert_eq!(parse_cql("title~\"auto\"").unwrap(), title("auto"));
        assert_eq!(parse_cql("title ~ \"auto\"     ").unwrap(), title("auto"));
        assert_eq!(parse_cql("    title ~ \"auto\"").unwrap(), title("auto"));
    }

    #[test]
    fn bare_values() {
        assert_eq!(parse_cql("title ~ auto").unwrap(), title("auto"));
        assert_eq!(
            parse_cql("space = abc").unwrap(),
            CqlTerm::single(Field::Space, StringOperator::Equals, "abc")
        );
    }

    #[test]
    fn space_query() {
        assert_eq!(parse_cql("space = 'DEV'").unwrap(), space("dev"));
    }

    #[test]
    fn space_key_alias() {
        assert_eq!(parse_cql("space.key = ABC").unwrap(), space("abc"));
    }

    #[test]
    fn all_string_operators() {
        let cases = [
            ("label = x", StringOperator::Equals),
            ("label != x", StringOperator::NotEquals),
            ("title ~ x", StringOperator::Contains),
            ("title !~ x", StringOperator::NotContains),
        ];
        for (query, operator) in cases {
            let CqlTerm::Atom(CqlAtom::Single(atom)) = parse_cql(query).unwrap() else {
                panic!("{query:?} should parse to a single atom");
            };
            assert_eq!(atom.operator, operator, "{query}");
        }
    }

    #[test]
    fn list_with_quoted_items() {
        assert_eq!(
            parse_cql("label in (\"test\", \"dev\", \"abc\")").unwrap(),
            labels(&["test", "dev", "abc"])
        );
    }

    #[test]
    fn list_with_bare_items() {
        assert_eq!(
            parse_cql("label in (test, dev, abc)").unwrap(),
            labels(&["test", "dev", "abc"])
        );
    }

    #[test]
    fn not_in_operator() {
        let expected = CqlTerm::list(Field::Label, ListOperator::NotIn, ["test", "dev", "abc"]);
        assert_eq!(
            parse_cql("label not in (\"test\", \"dev\", \"abc\")").unwrap(),
            expected
        );
        assert_eq!(
            parse_cql("label not    in (\"test\", \"dev\", \"abc\")").unwrap(),
            expected
        );
    }

    #[test]
    fn singleton_list() {
        assert_eq!(parse_cql("label in (test    )").unwrap(), labels(&["test"]));
    }

    #[test]
    fn list_ignores_unquoted_whitespace() {
        assert_eq!(
            parse_cql("label in (test    , abc)").unwrap(),
            labels(&["test", "abc"])
        );
    }

    #[test]
    fn list_keeps_duplicates() {
        assert_eq!(parse_cql("label in (a, a)").unwrap(), labels(&["a", "a"]));
    }

    #[test]
    fn unquoted_list_item_with_space() {
        rejects("label in (test dev, abc)");
    }

    #[test]
    fn redundant_brackets() {
        assert_eq!(parse_cql("(title ~ \"auto\")").unwrap(), title("auto"));
        assert_eq!(parse_cql("((title ~ \"auto\"))").unwrap(), title("auto"));
        assert_eq!(
            parse_cql("(label in (\"test\", \"dev\", \"abc\"))").unwrap(),
            labels(&["test", "dev", "abc"])
        );
    }

    #[test]
    fn type_field() {
        for name in ["page", "blogpost", "comment", "attachment"] {
            assert_eq!(
                parse_cql(&format!("type = {name}")).unwrap(),
                CqlTerm::single(Field::Type, StringOperator::Equals, name)
            );
        }
        assert_eq!(
            parse_cql("type IN (blogpost, page)").unwrap(),
            CqlTerm::list(Field::Type, ListOperator::In, ["blogpost", "page"])
        );
    }

    #[test]
    fn numeric_ids() {
        assert_eq!(
            parse_cql("parent = '12345'").unwrap(),
            CqlTerm::single(Field::Parent, StringOperator::Equals, "12345")
        );
        assert_eq!(
            parse_cql("ancestor = '12345'").unwrap(),
            CqlTerm::single(Field::Ancestor, StringOperator::Equals, "12345")
        );
        assert_eq!(
            parse_cql("ancestor in (1234,567)").unwrap(),
            CqlTerm::list(Field::Ancestor, ListOperator::In, ["1234", "567"])
        );
    }

    #[test]
    fn alphanumeric_spaces() {
        assert_eq!(
            parse_cql("space in (abcd,efg)").unwrap(),
            CqlTerm::list(Field::Space, ListOperator::In, ["abcd", "efg"])
        );
    }

    #[test]
    fn contains_only_on_title() {
        for field in ["ancestor", "creator", "label", "parent", "space"] {
            rejects(&format!("{field} ~ '123'"));
        }
        rejects("type ~ page");
    }

    #[test]
    fn lists_rejected_on_parent_and_title() {
        rejects("parent in (123, 456)");
        rejects("parent not in (123, 456)");
        rejects("title in (123, 456)");
        rejects("title not in (123, 456)");
    }

    #[test]
    fn invalid_values() {
        rejects("parent = '1234ABC'");
        rejects("ancestor = '1234ABC'");
        rejects("ancestor in (1234,ABC)");
        rejects("ancestor in (abc!,def)");
        rejects("creator = abc!@");
        rejects("space = abc!@");
        rejects("type = xyz");
        rejects("label = 'ABC#'");
        rejects("label in (abc, ser.)");
    }

    #[test]
    fn malformed_queries() {
        rejects("");
        rejects("   ");
        rejects("xyz");
        rejects("title > \"auto\"");
        rejects("title ~ ");
        rejects("title ~ \"auto");
        rejects("label in ()");
        rejects("label in (abc,)");
        rejects("label in (abc");
        rejects("space = \"DEV\"123\"");
        rejects("title ~ 'auto' dcdwcwed");
        rejects("(title ~ auto");
        rejects("title ~ auto)");
    }

    #[test]
    fn simple_not() {
        let expected = not(title("auto"));
        assert_eq!(parse_cql("NOT title ~ \"auto\"").unwrap(), expected);
        assert_eq!(parse_cql("NOT (title ~ \"auto\")").unwrap(), expected);
        assert_eq!(parse_cql("(NOT title ~ \"auto\")").unwrap(), expected);
        assert_eq!(parse_cql("(NOT (title ~ \"auto\"))").unwrap(), expected);
        assert_eq!(parse_cql("not(title ~ auto)").unwrap(), expected);
    }

    #[test]
    fn not_requires_boundary() {
        rejects("nottitle ~ auto");
    }

    #[test]
    fn simple_and() {
        assert_eq!(
            parse_cql("title ~ \"auto\" AND space = 'DEV'").unwrap(),
            and(title("auto"), space("dev"))
        );
    }

    #[test]
    fn simple_or() {
        assert_eq!(
            parse_cql("title ~ \"auto\" OR space = 'DEV'").unwrap(),
            or(title("auto"), space("dev"))
        );
    }

    #[test]
    fn operand_order_is_kept() {
        assert_eq!(
            parse_cql("space = 'DEV' AND title ~ \"auto\"").unwrap(),
            and(space("dev"), title("auto"))
        );
    }

    #[test]
    fn missing_right_operand() {
        rejects("title ~ \"auto\" AND ");
        rejects("title ~ \"auto\" OR");
    }

    #[test]
    fn invalid_right_operand() {
        rejects("title ~ \"auto\" AND space ~ 'DEV'");
    }

    #[test]
    fn chained_and_with_brackets() {
        assert_eq!(
            parse_cql("label = 'test' AND (title ~ \"auto\" AND space = 'DEV')").unwrap(),
            and(label("test"), and(title("auto"), space("dev")))
        );
    }

    #[test]
    fn chained_and_is_left_associative() {
        assert_eq!(
            parse_cql("label in ('test') AND title ~ \"auto\" AND space = 'DEV'").unwrap(),
            and(and(labels(&["test"]), title("auto")), space("dev"))
        );
    }

    #[test]
    fn chained_or_is_left_associative() {
        assert_eq!(
            parse_cql("label = a or label = b or label = c").unwrap(),
            or(or(label("a"), label("b")), label("c"))
        );
    }

    #[test]
    fn bracketed_operands() {
        assert_eq!(
            parse_cql("(title ~ \"auto\") AND (space = 'DEV')").unwrap(),
            and(title("auto"), space("dev"))
        );
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert_eq!(
            parse_cql("label = 'test' OR space = 'DEV' AND title ~ \"auto\"").unwrap(),
            or(label("test"), and(space("dev"), title("auto")))
        );
    }

    #[test]
    fn brackets_override_precedence() {
        assert_eq!(
            parse_cql("(label = 'test' OR space = 'DEV') AND title ~ \"auto\"").unwrap(),
            and(or(label("test"), space("dev")), title("auto"))
        );
    }

    #[test]
    fn mixed_precedence_queries() {
        assert!(parse_cql("title = process AND (label = xyz OR space = CS)").is_ok());
        assert!(parse_cql("(title = process AND label = xyz) OR space = CS").is_ok());
        assert!(parse_cql("(title = process AND label = xyz)").is_ok());
    }

    #[test]
    fn not_binds_tighter_than_and() {
        assert_eq!(
            parse_cql("not label = a and label = b").unwrap(),
            and(not(label("a")), label("b"))
        );
    }

    #[test]
    fn connectives_need_boundaries() {
        rejects("title ~ \"auto\" andx space = dev");
        rejects("title ~ \"auto\" order");
    }

    #[test]
    fn quoted_value_next_to_keyword() {
        assert_eq!(
            parse_cql("title ~ \"auto\"and space = dev").unwrap(),
            and(title("auto"), space("dev"))
        );
    }

    #[test]
    fn deterministic() {
        let query = "label = 'test' OR (space = 'DEV' AND NOT title ~ \"auto\")";
        assert_eq!(parse_cql(query).unwrap(), parse_cql(query).unwrap());
    }

    #[test]
    fn error_at_trailing_input() {
        let err = parse_cql("title ~ \"auto\" dcdwcwed").unwrap_err();
        assert_eq!(err.position, 15);
        assert_eq!(err.expected, "end of query");
    }

    #[test]
    fn error_at_invalid_operator() {
        let err = parse_cql("ancestor ~ '123'").unwrap_err();
        assert_eq!(err.position, 9);
        assert_eq!(err.expected, "operator allowed for this field");
    }

    #[test]
    fn error_at_invalid_value() {
        let err = parse_cql("parent = '1234ABC'").unwrap_err();
        assert_eq!(err.position, 9);
        assert_eq!(err.expected, "value allowed for this field");
        assert_eq!(err.query, "parent = '1234abc'");
    }

    #[test]
    fn error_inside_list() {
        let err = parse_cql("label in (abc,)").unwrap_err();
        assert_eq!(err.position, 14);
    }

    #[test]
    fn error_after_committed_connective() {
        let err = parse_cql("title ~ auto and space ~ dev").unwrap_err();
        assert_eq!(err.position, 23);
        assert_eq!(err.expected, "operator allowed for this field");
    }

    #[test]
    fn empty_query_error() {
        let err = parse_cql("").unwrap_err();
        assert_eq!(err.position, 0);
        assert_eq!(err.expected, "field name");
    }

    #[test]
    fn deep_nesting() {
        let query = format!(
            "{}title ~ auto{}",
            "(".repeat(MAX_DEPTH),
            ")".repeat(MAX_DEPTH)
        );
        assert_eq!(parse_cql(&query).unwrap(), title("auto"));
    }

    #[test]
    fn nesting_past_limit() {
        let depth = MAX_DEPTH + 1;
        let query = format!("{}title ~ auto{}", "(".repeat(depth), ")".repeat(depth));
        let err = parse_cql(&query).unwrap_err();
        assert_eq!(err.position, depth);
        assert_eq!(err.expected, "shallower nesting");
    }

    #[test]
    fn unbalanced_brackets_do_not_recurse_unbounded() {
        let err = parse_cql(&"(".repeat(10_000)).unwrap_err();
        assert_eq!(err.position, MAX_DEPTH + 1);
        assert_eq!(err.expected, "shallower nesting");
    }

    #[test]
    fn sibling_groups_reset_depth() {
        let nested = format!(
            "{}title ~ auto{}",
            "(".repeat(MAX_DEPTH),
            ")".repeat(MAX_DEPTH)
        );
        let query = format!("{nested} and {nested}");
        assert_eq!(
            parse_cql(&query).unwrap(),
            and(title("auto"), title("auto"))
        );
    }

    #[test]
    fn performance_many_queries() {
        let queries = [
            "title ~ auto",
            "label in (a, b, c)",
            "label = 'test' OR space = 'DEV' AND title ~ \"auto\"",
            "(label = 'test' OR space = 'DEV') AND NOT title ~ \"auto\"",
            "ancestor in (1, 2, 3) and type not in (page, comment)",
        ];

        let start = Instant::now();
        for _ in 0..1000 {
            for query in &queries {
                parse_cql(query).unwrap();
            }
        }
        let elapsed = start.elapsed();

        assert!(
            elapsed.as_millis() < 2000,
            "Parsing 5,000 queries took {elapsed:?}, expected < 2s"
        );
    }
}
