//! A small parser-combinator core.
//!
//! A parser is anything callable as `Fn(Input) -> Reply<T>`. [`Input`] is a
//! `Copy` cursor over the query text, so every alternative starts from its own
//! snapshot and a failed branch never consumes input. Recursive rules are
//! plain `fn` items referenced by name, which keeps the grammar lazy.

/// A cursor into the text being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Input<'a> {
    /// The complete text.
    src: &'a str,
    /// Byte offset of the cursor.
    pos: usize,
    /// Number of enclosing groups.
    depth: usize,
}

impl<'a> Input<'a> {
    /// Creates a cursor at the start of `src`.
    pub(crate) fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            depth: 0,
        }
    }

    /// Byte offset of the cursor.
    pub(crate) fn position(self) -> usize {
        self.pos
    }

    /// The unconsumed text.
    pub(crate) fn rest(self) -> &'a str {
        &self.src[self.pos..]
    }

    /// Returns true if nothing is left to consume.
    pub(crate) fn is_empty(self) -> bool {
        self.pos >= self.src.len()
    }

    /// The next unconsumed character.
    pub(crate) fn peek(self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Returns a cursor `len` bytes further on.
    pub(crate) fn advance(self, len: usize) -> Self {
        Self {
            pos: self.pos + len,
            ..self
        }
    }

    /// Number of groups the cursor is nested in.
    pub(crate) fn depth(self) -> usize {
        self.depth
    }

    /// Returns the same cursor with its nesting depth set to `depth`.
    pub(crate) fn at_depth(self, depth: usize) -> Self {
        Self { depth, ..self }
    }

    /// Creates a failure at the cursor.
    pub(crate) fn fail(self, expected: &'static str) -> Failure {
        Failure {
            position: self.pos,
            expected,
        }
    }
}

/// Where and why a parser gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Failure {
    /// Byte offset of the failure.
    pub position: usize,
    /// What the grammar expected at that offset.
    pub expected: &'static str,
}

impl Failure {
    /// Keeps whichever failure got further into the input, preferring `self` on ties.
    pub(crate) fn furthest(self, other: Self) -> Self {
        if other.position > self.position {
            other
        } else {
            self
        }
    }
}

/// The outcome of running a parser: a value and the remaining input, or a failure.
pub(crate) type Reply<'a, T> = Result<(T, Input<'a>), Failure>;

/// Anything that can parse a `T` from an [`Input`].
pub(crate) trait Parser<'a, T> {
    /// Runs the parser from `input`.
    fn parse(&self, input: Input<'a>) -> Reply<'a, T>;
}

impl<'a, T, F> Parser<'a, T> for F
where
    F: Fn(Input<'a>) -> Reply<'a, T>,
{
    fn parse(&self, input: Input<'a>) -> Reply<'a, T> {
        self(input)
    }
}

/// Matches `literal` exactly.
pub(crate) fn tag<'a>(
    literal: &'static str,
    expected: &'static str,
) -> impl Fn(Input<'a>) -> Reply<'a, &'a str> {
    move |input: Input<'a>| {
        if input.rest().starts_with(literal) {
            Ok((&input.rest()[..literal.len()], input.advance(literal.len())))
        } else {
            Err(input.fail(expected))
        }
    }
}

/// Consumes the longest prefix whose characters satisfy `pred`, which may be empty.
pub(crate) fn take_while<'a>(
    pred: impl Fn(char) -> bool,
) -> impl Fn(Input<'a>) -> Reply<'a, &'a str> {
    move |input: Input<'a>| {
        let rest = input.rest();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        Ok((&rest[..len], input.advance(len)))
    }
}

/// Like [`take_while`], but fails unless at least one character matches.
pub(crate) fn take_while1<'a>(
    pred: impl Fn(char) -> bool,
    expected: &'static str,
) -> impl Fn(Input<'a>) -> Reply<'a, &'a str> {
    let inner = take_while(pred);
    move |input: Input<'a>| match inner(input)? {
        ("", _) => Err(input.fail(expected)),
        matched => Ok(matched),
    }
}

/// Succeeds only when no input remains.
pub(crate) fn end_of_input(input: Input<'_>) -> Reply<'_, ()> {
    if input.is_empty() {
        Ok(((), input))
    } else {
        Err(input.fail("end of query"))
    }
}

/// Transforms a parser's value.
pub(crate) fn map<'a, A, B>(
    parser: impl Parser<'a, A>,
    f: impl Fn(A) -> B,
) -> impl Fn(Input<'a>) -> Reply<'a, B> {
    move |input: Input<'a>| {
        let (value, rest) = parser.parse(input)?;
        Ok((f(value), rest))
    }
}

/// Replaces a parser's value with a constant.
pub(crate) fn value<'a, A, B: Clone>(
    parser: impl Parser<'a, A>,
    constant: B,
) -> impl Fn(Input<'a>) -> Reply<'a, B> {
    map(parser, move |_| constant.clone())
}

/// Runs two parsers in sequence and keeps both values.
pub(crate) fn pair<'a, A, B>(
    first: impl Parser<'a, A>,
    second: impl Parser<'a, B>,
) -> impl Fn(Input<'a>) -> Reply<'a, (A, B)> {
    move |input: Input<'a>| {
        let (a, input) = first.parse(input)?;
        let (b, input) = second.parse(input)?;
        Ok(((a, b), input))
    }
}

/// Runs two parsers in sequence and keeps the second value.
pub(crate) fn preceded<'a, A, B>(
    first: impl Parser<'a, A>,
    second: impl Parser<'a, B>,
) -> impl Fn(Input<'a>) -> Reply<'a, B> {
    map(pair(first, second), |(_, b)| b)
}

/// Runs two parsers in sequence and keeps the first value.
pub(crate) fn terminated<'a, A, B>(
    first: impl Parser<'a, A>,
    second: impl Parser<'a, B>,
) -> impl Fn(Input<'a>) -> Reply<'a, A> {
    map(pair(first, second), |(a, _)| a)
}

/// Runs three parsers in sequence and keeps the middle value.
pub(crate) fn delimited<'a, A, B, C>(
    open: impl Parser<'a, A>,
    inner: impl Parser<'a, B>,
    close: impl Parser<'a, C>,
) -> impl Fn(Input<'a>) -> Reply<'a, B> {
    preceded(open, terminated(inner, close))
}

/// Ordered choice: tries `first`, then `second` from the same position.
///
/// When both fail, the failure that got further is reported.
pub(crate) fn alt<'a, T>(
    first: impl Parser<'a, T>,
    second: impl Parser<'a, T>,
) -> impl Fn(Input<'a>) -> Reply<'a, T> {
    move |input: Input<'a>| match first.parse(input) {
        Ok(done) => Ok(done),
        Err(first_failure) => second
            .parse(input)
            .map_err(|second_failure| first_failure.furthest(second_failure)),
    }
}

/// Tries a parser, yielding `None` without consuming input if it fails.
pub(crate) fn opt<'a, T>(parser: impl Parser<'a, T>) -> impl Fn(Input<'a>) -> Reply<'a, Option<T>> {
    move |input: Input<'a>| match parser.parse(input) {
        Ok((value, rest)) => Ok((Some(value), rest)),
        Err(_) => Ok((None, input)),
    }
}

/// Parses one or more `item`s separated by `separator`.
///
/// A trailing separator is an error: once a separator is consumed, an item must follow.
pub(crate) fn separated1<'a, T, S>(
    item: impl Parser<'a, T>,
    separator: impl Parser<'a, S>,
) -> impl Fn(Input<'a>) -> Reply<'a, Vec<T>> {
    move |input: Input<'a>| {
        let (first, mut input) = item.parse(input)?;
        let mut values = vec![first];
        while let Ok((_, after_separator)) = separator.parse(input) {
            let (next, rest) = item.parse(after_separator)?;
            values.push(next);
            input = rest;
        }
        Ok((values, input))
    }
}

/// Runs `parser` over the whole of `src`, failing if anything is left over.
///
/// Failure offsets are shifted by `offset` so they point into the enclosing text.
pub(crate) fn parse_all<'a, T>(
    parser: impl Parser<'a, T>,
    src: &'a str,
    offset: usize,
) -> Result<T, Failure> {
    terminated(parser, end_of_input)
        .parse(Input::new(src))
        .map(|(value, _)| value)
        .map_err(|failure| Failure {
            position: failure.position + offset,
            expected: failure.expected,
        })
}
