//! Field keywords, operator tokens and per-field rules.
//!
//! [`FIELD_RULES`] is the single table both the recognizer and the validator
//! read from.

use crate::{
    ast::{Field, ListOperator, StringOperator},
    combinator::{Input, Reply, alt, tag, value},
    lexer::{keyword, token},
};

/// The shape a field's values must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValueShape {
    /// Any text.
    Any,
    /// ASCII digits only.
    Digits,
    /// One or more lowercase letters or digits.
    AlphaNumeric,
    /// Any text without the characters in [`INVALID_LABEL_CHARACTERS`].
    Label,
    /// One of a closed set of names.
    OneOf(&'static [&'static str]),
}

/// Characters with a special meaning in CQL text searches, rejected in labels.
pub(crate) const INVALID_LABEL_CHARACTERS: &str = "!#&()*,.:;<>@[]^";

/// Content types accepted by the `type` field.
pub(crate) const CONTENT_TYPES: &[&str] = &["page", "attachment", "comment", "blogpost"];

/// Everything the grammar and validator know about one field.
#[derive(Debug)]
pub(crate) struct FieldRule {
    /// The field described.
    pub field: Field,
    /// Source spellings, tried in order, so longer aliases come first.
    pub keywords: &'static [&'static str],
    /// Constraint on each value.
    pub shape: ValueShape,
    /// Whether `~` and `!~` apply.
    pub allows_contains: bool,
    /// Whether `in` and `not in` apply.
    pub allows_lists: bool,
}

/// Rules for every field, in [`Field::ALL`] order.
pub(crate) static FIELD_RULES: [FieldRule; 7] = [
    FieldRule {
        field: Field::Ancestor,
        keywords: &["ancestor"],
        shape: ValueShape::Digits,
        allows_contains: false,
        allows_lists: true,
    },
    FieldRule {
        field: Field::Creator,
        keywords: &["creator"],
        shape: ValueShape::AlphaNumeric,
        allows_contains: false,
        allows_lists: true,
    },
    FieldRule {
        field: Field::Label,
        keywords: &["label"],
        shape: ValueShape::Label,
        allows_contains: false,
        allows_lists: true,
    },
    FieldRule {
        field: Field::Parent,
        keywords: &["parent"],
        shape: ValueShape::Digits,
        allows_contains: false,
        allows_lists: false,
    },
    FieldRule {
        field: Field::Space,
        keywords: &["space.key", "space"],
        shape: ValueShape::AlphaNumeric,
        allows_contains: false,
        allows_lists: true,
    },
    FieldRule {
        field: Field::Title,
        keywords: &["title"],
        shape: ValueShape::Any,
        allows_contains: true,
        allows_lists: false,
    },
    FieldRule {
        field: Field::Type,
        keywords: &["type"],
        shape: ValueShape::OneOf(CONTENT_TYPES),
        allows_contains: false,
        allows_lists: true,
    },
];

/// Returns the rule for `field`.
pub(crate) fn rule(field: Field) -> &'static FieldRule {
    &FIELD_RULES[field as usize]
}

/// Recognizes a field keyword; the first matching spelling wins.
pub(crate) fn field(input: Input<'_>) -> Reply<'_, Field> {
    for rule in &FIELD_RULES {
        for keyword in rule.keywords {
            if input.rest().starts_with(keyword) {
                return Ok((rule.field, input.advance(keyword.len())));
            }
        }
    }
    Err(input.fail("field name"))
}

/// Recognizes `=`, `!=`, `~` or `!~`.
pub(crate) fn string_operator(input: Input<'_>) -> Reply<'_, StringOperator> {
    let expected = "comparison operator";
    alt(
        alt(
            value(tag("=", expected), StringOperator::Equals),
            value(tag("!=", expected), StringOperator::NotEquals),
        ),
        alt(
            value(tag("~", expected), StringOperator::Contains),
            value(tag("!~", expected), StringOperator::NotContains),
        ),
    )(input)
}

/// Recognizes `in`, or `not` and `in` separated by any number of spaces, including none.
pub(crate) fn list_operator(input: Input<'_>) -> Reply<'_, ListOperator> {
    alt(
        value(keyword("in", "list operator"), ListOperator::In),
        value(not_in, ListOperator::NotIn),
    )(input)
}

/// Recognizes the two words of `not in`.
fn not_in(input: Input<'_>) -> Reply<'_, &str> {
    let (_, input) = token(tag("not", "list operator"))(input)?;
    keyword("in", "list operator")(input)
}

/// Recognizes a connective keyword together with its trailing whitespace.
pub(crate) fn connective<'a>(word: &'static str) -> impl Fn(Input<'a>) -> Reply<'a, ()> {
    value(token(keyword(word, word)), ())
}

/// Recognizes `(` and any whitespace after it.
pub(crate) fn open_group(input: Input<'_>) -> Reply<'_, ()> {
    value(token(tag("(", "'('")), ())(input)
}

/// Recognizes `)` and any whitespace after it.
pub(crate) fn close_group(input: Input<'_>) -> Reply<'_, ()> {
    value(token(tag(")", "')'")), ())(input)
}
