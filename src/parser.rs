use std::iter::Peekable;

use nom::{
    bytes::complete::{is_not, tag, take_while1},
    character::complete::char,
    combinator::{map, opt},
    sequence::{pair, preceded, tuple},
    IResult,
};

use thiserror::Error;

use crate::lexer::Lexer;
use crate::types::{Body, Header, Record, Value};

/// Key under which unstructured leading text is collected when it
/// cannot be merged into the first key/value pair.
const MESSAGE_KEY: &str = "_message";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Invalid audit log header: {0}")]
    InvalidHeader(String),
    #[error("Invalid audit log body: {0}")]
    InvalidBody(String),
}

/// Parse a single log line as produced by _auditd(8)_.
pub fn parse_line(line: &str) -> Result<Record, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (body, header) =
        parse_header(line).map_err(|_| ParseError::InvalidHeader(line.to_string()))?;
    let body = parse_body(body)?;
    Ok(Record { header, body })
}

/// Parse a batch of log lines, in input order.
///
/// Empty lines are skipped; the first malformed line fails the whole
/// call. With `flatten` set, each record's body is collapsed into
/// dot-joined keys (see [`crate::flatten`]).
pub fn parse(text: &str, flatten: bool) -> Result<Vec<Record>, ParseError> {
    let mut records = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let mut record = parse_line(line)?;
        if flatten {
            record = record.into_flat();
        }
        records.push(record);
    }
    Ok(records)
}

/// Recognize the "type=… msg=audit(…):" header prefix.
///
/// Returns the header and the remaining body text, with at most one
/// space after the colon trimmed (the lexer absorbs any further
/// whitespace).
fn parse_header(input: &str) -> IResult<&str, Header> {
    map(
        tuple((
            preceded(tag("type="), is_not(" \t")),
            preceded(
                pair(take_while1(|c| c == ' '), tag("msg=audit(")),
                is_not(")"),
            ),
            tag("):"),
            opt(char(' ')),
        )),
        |(ty, inner, _, _): (&str, &str, _, _)| Header {
            r#type: ty.to_string(),
            msg: format!("audit({})", inner),
        },
    )(input)
}

/// Parse body text into a mapping: leading-text phase first, then
/// key/value pairs until the token stream is exhausted.
///
/// Also invoked recursively for the inner text of single-quoted
/// sub-records.
fn parse_body(text: &str) -> Result<Body, ParseError> {
    let mut tokens = Lexer::new(text).peekable();
    let mut body = Body::new();
    resolve_leading_text(text, &mut tokens, &mut body)?;
    collect_pairs(text, &mut tokens, &mut body, false)?;
    Ok(body)
}

/// Resolve bare words appearing before the first `KEY=VALUE` token.
///
/// A single word followed by a `pid` key is merged into a `"<word>
/// pid"` entry; any other run of words is collected under `_message`
/// with one trailing comma stripped. Bare words with no key/value
/// token anywhere in the stream are not leading text but a malformed
/// body.
fn resolve_leading_text<'a>(
    text: &str,
    tokens: &mut Peekable<Lexer<'a>>,
    body: &mut Body,
) -> Result<(), ParseError> {
    let mut words: Vec<&str> = Vec::new();
    while let Some(&tok) = tokens.peek() {
        if split_pair(tok).is_some() {
            break;
        }
        words.push(tok);
        tokens.next();
    }
    if words.is_empty() {
        return Ok(());
    }
    let first = match tokens.peek() {
        Some(&tok) => split_pair(tok),
        None => return Err(ParseError::InvalidBody(text.to_string())),
    };
    match first {
        Some(("pid", value)) if words.len() == 1 => {
            tokens.next();
            let value = read_value(text, value, tokens)?;
            body.insert(format!("{} pid", words[0]), value);
        }
        _ => {
            let mut message = words.join(" ");
            if let Some(stripped) = message.strip_suffix(',') {
                message.truncate(stripped.len());
            }
            body.insert(MESSAGE_KEY.to_string(), Value::Str(message));
        }
    }
    Ok(())
}

/// Assemble key/value pairs from the token stream.
///
/// In brace mode the scan ends at the standalone `}` (which is
/// consumed); running out of tokens first is an error. Outside brace
/// mode the stream is drained, and a stray `}` or bare word is an
/// error.
fn collect_pairs<'a>(
    text: &str,
    tokens: &mut Peekable<Lexer<'a>>,
    body: &mut Body,
    in_brace: bool,
) -> Result<(), ParseError> {
    while let Some(tok) = tokens.next() {
        if tok == "}" {
            if in_brace {
                return Ok(());
            }
            return Err(ParseError::InvalidBody(text.to_string()));
        }
        let (key, value) =
            split_pair(tok).ok_or_else(|| ParseError::InvalidBody(text.to_string()))?;
        let value = read_value(text, value, tokens)?;
        body.insert(key.to_string(), value);
    }
    if in_brace {
        Err(ParseError::InvalidBody(text.to_string()))
    } else {
        Ok(())
    }
}

/// Turn the raw value text of one pair into a [`Value`], recursing for
/// brace-delimited structures and single-quoted sub-records.
fn read_value<'a>(
    text: &str,
    raw: &'a str,
    tokens: &mut Peekable<Lexer<'a>>,
) -> Result<Value, ParseError> {
    if raw == "{" {
        let mut nested = Body::new();
        collect_pairs(text, tokens, &mut nested, true)?;
        Ok(Value::Map(nested))
    } else if let Some(inner) = raw.strip_prefix('\'') {
        let inner = inner.strip_suffix('\'').unwrap_or(inner);
        Ok(Value::Map(parse_body(inner)?))
    } else {
        Ok(Value::Str(raw.to_string()))
    }
}

/// Split a token at its first `=` into key and value text. Tokens
/// without `=` (or with nothing before it) are not key/value pairs.
fn split_pair(tok: &str) -> Option<(&str, &str)> {
    match tok.find('=') {
        Some(i) if i > 0 => Some((&tok[..i], &tok[i + 1..])),
        _ => None,
    }
}
