//! Lexical primitives.
//!
//! Whitespace, quoted strings, bare words, bracket contents and
//! comma-separated lists. The query is case-folded before any of these run.

use crate::combinator::{
    Input, Parser, Reply, alt, delimited, map, parse_all, preceded, separated1, tag, take_while,
    take_while1, terminated,
};

/// The only character treated as whitespace between tokens.
const SPACE: char = ' ';

/// Skips zero or more spaces.
pub(crate) fn whitespace(input: Input<'_>) -> Reply<'_, ()> {
    map(take_while(|c| c == SPACE), |_| ())(input)
}

/// Runs `parser`, then skips any trailing whitespace.
pub(crate) fn token<'a, T>(parser: impl Parser<'a, T>) -> impl Fn(Input<'a>) -> Reply<'a, T> {
    terminated(parser, whitespace)
}

/// Reads the text between a quote character and the next occurrence of the same character.
fn quoted_with<'a>(
    quote: &'static str,
    expected: &'static str,
) -> impl Fn(Input<'a>) -> Reply<'a, &'a str> {
    move |input: Input<'a>| {
        let (_, inside) = tag(quote, expected)(input)?;
        match inside.rest().find(quote) {
            Some(len) => Ok((&inside.rest()[..len], inside.advance(len + quote.len()))),
            None => Err(input.fail("closing quote")),
        }
    }
}

/// Reads a `"` or `'` quoted string, returning its content without the quotes.
///
/// The other quote character may appear inside; there are no escapes.
pub(crate) fn quoted(input: Input<'_>) -> Reply<'_, &str> {
    alt(quoted_with("\"", "quoted value"), quoted_with("'", "quoted value"))(input)
}

/// Returns true for characters that end an unquoted single value.
fn ends_bare_word(c: char) -> bool {
    matches!(c, SPACE | ')' | '"' | '\'' | ',')
}

/// Reads an unquoted single value.
pub(crate) fn bare_word(input: Input<'_>) -> Reply<'_, &str> {
    take_while1(|c| !ends_bare_word(c), "value")(input)
}

/// Reads a single value, quoted or bare.
pub(crate) fn single_value(input: Input<'_>) -> Reply<'_, String> {
    map(alt(quoted, bare_word), str::to_owned)(input)
}

/// Reads the flat text between `(` and the next `)`.
///
/// Brackets do not nest here: the first `)` always closes.
pub(crate) fn bracketed(input: Input<'_>) -> Reply<'_, &str> {
    delimited(
        tag("(", "'('"),
        take_while(|c| c != ')'),
        tag(")", "')'"),
    )(input)
}

/// Reads one unquoted list item.
fn bare_item(input: Input<'_>) -> Reply<'_, &str> {
    take_while1(|c| c != ',' && c != SPACE, "list item")(input)
}

/// Reads one list item, quoted or bare, with surrounding whitespace.
fn list_item(input: Input<'_>) -> Reply<'_, String> {
    delimited(whitespace, map(alt(quoted, bare_item), str::to_owned), whitespace)(input)
}

/// Splits the content of a list into its items.
///
/// Empty content and a dangling trailing comma are rejected.
pub(crate) fn comma_list(input: Input<'_>) -> Reply<'_, Vec<String>> {
    separated1(list_item, tag(",", "','"))(input)
}

/// Reads a bracketed, comma-separated list.
///
/// The bracket content must be consumed entirely by the item grammar; failures
/// inside it are reported at their offset in the enclosing query.
pub(crate) fn list(input: Input<'_>) -> Reply<'_, Vec<String>> {
    let (content, rest) = bracketed(input)?;
    let content_start = input.position() + 1;
    let items = parse_all(comma_list, content, content_start)?;
    Ok((items, rest))
}

/// Reads a keyword that must not run into a following identifier character.
///
/// `and` matches in `and (` and `and"x"` but not in `andx`.
pub(crate) fn keyword<'a>(
    word: &'static str,
    expected: &'static str,
) -> impl Fn(Input<'a>) -> Reply<'a, &'a str> {
    move |input: Input<'a>| {
        let (matched, rest) = tag(word, expected)(input)?;
        match rest.peek() {
            Some(c) if is_word_char(c) => Err(input.fail(expected)),
            _ => Ok((matched, rest)),
        }
    }
}

/// Characters that continue an identifier.
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '-')
}

/// Skips leading whitespace, then runs `parser`.
pub(crate) fn leading<'a, T>(parser: impl Parser<'a, T>) -> impl Fn(Input<'a>) -> Reply<'a, T> {
    preceded(whitespace, parser)
}
