//! Atom validation.
//!
//! Decides which operators and value shapes are legal for each field. The
//! parser runs these checks on every atom it builds, so an invalid atom is
//! rejected exactly like a syntax error.

use crate::{
    ast::{AtomOperator, CqlAtom, Field, ListOperator, StringOperator},
    lexicon::{INVALID_LABEL_CHARACTERS, ValueShape, rule},
};

/// Returns true if `value` has the shape `field` requires.
pub fn is_valid_value(field: Field, value: &str) -> bool {
    match rule(field).shape {
        ValueShape::Any => true,
        ValueShape::Digits => value.chars().all(|c| c.is_ascii_digit()),
        ValueShape::AlphaNumeric => {
            !value.is_empty()
                && value
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        }
        ValueShape::Label => !value.contains(|c: char| INVALID_LABEL_CHARACTERS.contains(c)),
        ValueShape::OneOf(allowed) => allowed.contains(&value),
    }
}

/// Returns true if `operator` may be applied to `field`.
///
/// `=` and `!=` apply everywhere, `~` and `!~` only to fields that allow
/// substring matching, and `in`/`not in` only to fields that allow lists.
pub fn is_valid_operator(field: Field, operator: AtomOperator) -> bool {
    let rule = rule(field);
    match operator {
        AtomOperator::String(StringOperator::Equals | StringOperator::NotEquals) => true,
        AtomOperator::String(StringOperator::Contains | StringOperator::NotContains) => {
            rule.allows_contains
        }
        AtomOperator::List(ListOperator::In | ListOperator::NotIn) => rule.allows_lists,
    }
}

/// Returns true if the atom's operator suits its field and every value has the field's shape.
///
/// One bad element invalidates a whole list.
pub fn is_valid_atom(atom: &CqlAtom) -> bool {
    let field = atom.field();
    is_valid_operator(field, atom.operator())
        && atom.values().iter().all(|v| is_valid_value(field, v))
}
