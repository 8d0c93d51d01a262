//! CQL abstract syntax tree.
//!
//! Represents a parsed and validated query, ready to be interpreted against a
//! content repository. Trees are built bottom-up by the parser and never
//! mutated afterwards.

use std::{fmt, slice};

use serde::{Deserialize, Serialize};

/// A content attribute a predicate filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    /// Any page above the content in the page tree (numeric id).
    Ancestor,
    /// The user who created the content.
    Creator,
    /// A label attached to the content.
    Label,
    /// The direct parent page (numeric id).
    Parent,
    /// The key of the space holding the content.
    Space,
    /// The content title.
    Title,
    /// The kind of content.
    Type,
}

impl Field {
    /// Every field, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Ancestor,
        Self::Creator,
        Self::Label,
        Self::Parent,
        Self::Space,
        Self::Title,
        Self::Type,
    ];

    /// Returns the canonical lowercase name of the field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ancestor => "ancestor",
            Self::Creator => "creator",
            Self::Label => "label",
            Self::Parent => "parent",
            Self::Space => "space",
            Self::Title => "title",
            Self::Type => "type",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operators comparing a field against a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StringOperator {
    /// `=`
    #[serde(rename = "=")]
    Equals,
    /// `!=`
    #[serde(rename = "!=")]
    NotEquals,
    /// `~`
    #[serde(rename = "~")]
    Contains,
    /// `!~`
    #[serde(rename = "!~")]
    NotContains,
}

impl StringOperator {
    /// Returns the operator's source symbol.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::NotEquals => "!=",
            Self::Contains => "~",
            Self::NotContains => "!~",
        }
    }
}

/// Operators comparing a field against a list of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListOperator {
    /// `in`
    #[serde(rename = "in")]
    In,
    /// `not in`
    #[serde(rename = "not_in")]
    NotIn,
}

impl ListOperator {
    /// Returns the operator's source spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::NotIn => "not in",
        }
    }
}

/// Either kind of atom operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtomOperator {
    /// A single-value operator.
    String(StringOperator),
    /// A list-value operator.
    List(ListOperator),
}

impl From<StringOperator> for AtomOperator {
    fn from(op: StringOperator) -> Self {
        Self::String(op)
    }
}

impl From<ListOperator> for AtomOperator {
    fn from(op: ListOperator) -> Self {
        Self::List(op)
    }
}

/// Connectives joining two terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryOperator {
    /// Both terms must match.
    And,
    /// At least one term must match.
    Or,
}

/// Prefix operators applied to a single term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnaryOperator {
    /// The term must not match.
    Not,
}

/// A predicate comparing a field against one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CqlSingleAtom {
    /// Comparison operator.
    pub operator: StringOperator,
    /// Field being filtered.
    pub field: Field,
    /// Value compared against, quotes stripped.
    pub value: String,
}

/// A predicate comparing a field against a list of values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CqlListAtom {
    /// Membership operator.
    pub operator: ListOperator,
    /// Field being filtered.
    pub field: Field,
    /// Values in source order. Duplicates are kept.
    pub value: Vec<String>,
}

/// A leaf predicate.
///
/// Atoms from [`parse_cql`](crate::parse_cql) are always valid. Atoms built
/// directly or deserialized are not checked; run [`is_valid_atom`](crate::is_valid_atom)
/// on them before trusting the field/operator/value combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CqlAtom {
    /// Single-valued predicate.
    Single(CqlSingleAtom),
    /// List-valued predicate.
    List(CqlListAtom),
}

impl CqlAtom {
    /// Returns the field the atom filters on.
    pub fn field(&self) -> Field {
        match self {
            Self::Single(atom) => atom.field,
            Self::List(atom) => atom.field,
        }
    }

    /// Returns the atom's operator.
    pub fn operator(&self) -> AtomOperator {
        match self {
            Self::Single(atom) => atom.operator.into(),
            Self::List(atom) => atom.operator.into(),
        }
    }

    /// Returns the atom's values; a single atom yields one value.
    pub fn values(&self) -> &[String] {
        match self {
            Self::Single(atom) => slice::from_ref(&atom.value),
            Self::List(atom) => &atom.value,
        }
    }
}

/// A binary connective over two sub-terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinOp {
    /// The connective.
    pub operator: BinaryOperator,
    /// Left operand.
    pub term1: Box<CqlTerm>,
    /// Right operand.
    pub term2: Box<CqlTerm>,
}

/// A unary operator over one sub-term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnOp {
    /// The operator.
    pub operator: UnaryOperator,
    /// Operand.
    pub term: Box<CqlTerm>,
}

/// A parsed query: any node of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CqlTerm {
    /// Binary connective.
    Bin(BinOp),
    /// Negation.
    Un(UnOp),
    /// Leaf predicate.
    Atom(CqlAtom),
}

impl CqlTerm {
    /// Joins two terms with a binary operator.
    pub fn binary(operator: BinaryOperator, term1: Self, term2: Self) -> Self {
        Self::Bin(BinOp {
            operator,
            term1: Box::new(term1),
            term2: Box::new(term2),
        })
    }

    /// Creates `term1 AND term2`.
    pub fn and(term1: Self, term2: Self) -> Self {
        Self::binary(BinaryOperator::And, term1, term2)
    }

    /// Creates `term1 OR term2`.
    pub fn or(term1: Self, term2: Self) -> Self {
        Self::binary(BinaryOperator::Or, term1, term2)
    }

    /// Creates `NOT term`.
    pub fn not(term: Self) -> Self {
        Self::Un(UnOp {
            operator: UnaryOperator::Not,
            term: Box::new(term),
        })
    }

    /// Creates a single-valued atom.
    pub fn single(field: Field, operator: StringOperator, value: impl Into<String>) -> Self {
        Self::Atom(CqlAtom::Single(CqlSingleAtom {
            operator,
            field,
            value: value.into(),
        }))
    }

    /// Creates a list-valued atom.
    pub fn list<I, S>(field: Field, operator: ListOperator, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Atom(CqlAtom::List(CqlListAtom {
            operator,
            field,
            value: values.into_iter().map(Into::into).collect(),
        }))
    }

    /// Formats the term as a tree structure with the given indentation level.
    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let prefix = "  ".repeat(indent);
        match self {
            Self::Bin(bin) => {
                let name = match bin.operator {
                    BinaryOperator::And => "And",
                    BinaryOperator::Or => "Or",
                };
                writeln!(f, "{prefix}{name}")?;
                bin.term1.fmt_tree(f, indent + 1)?;
                bin.term2.fmt_tree(f, indent + 1)
            }
            Self::Un(un) => {
                writeln!(f, "{prefix}Not")?;
                un.term.fmt_tree(f, indent + 1)
            }
            Self::Atom(CqlAtom::Single(atom)) => writeln!(
                f,
                "{prefix}{} {} {:?}",
                atom.field,
                atom.operator.as_str(),
                atom.value
            ),
            Self::Atom(CqlAtom::List(atom)) => writeln!(
                f,
                "{prefix}{} {} {:?}",
                atom.field,
                atom.operator.as_str(),
                atom.value
            ),
        }
    }
}

impl fmt::Display for CqlTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}
