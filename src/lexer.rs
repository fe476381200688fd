//! Tokenizer for audit record bodies.
//!
//! The body grammar is irregular enough (quote spans, one level of
//! brace nesting, structures glued onto a prior value without a
//! separator) that it is handled by a small explicit-state scanner
//! walking the input byte by byte rather than by combinators.

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Plain,
    DoubleQuoted,
    SingleQuoted,
}

/// Splits body text into raw tokens.
///
/// Tokens are whitespace-delimited slices of the input, with three
/// overrides:
///
/// * a `"…"` or `'…'` span protects embedded whitespace; the quotes
///   stay part of the token,
/// * a `{` directly following `=` terminates the token right after the
///   brace; the matching standalone `}` is emitted as its own token,
/// * an uppercase `KEY={` glued onto the end of a previous value
///   (`saddr=0011SADDR={`) is split off into a token of its own.
///
/// Tokens never span a newline. The lexer is cheap to construct, so a
/// scan can be restarted from the beginning with [`Lexer::new`].
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input, pos: 0 }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let bytes = self.input.as_bytes();

        while self.pos < bytes.len() && is_sep(bytes[self.pos]) {
            self.pos += 1;
        }
        if self.pos >= bytes.len() {
            return None;
        }

        let start = self.pos;
        let mut state = State::Plain;
        let mut first_eq = None;

        while self.pos < bytes.len() {
            let c = bytes[self.pos];
            match state {
                State::Plain => match c {
                    b' ' | b'\t' | b'\n' | b'\r' => break,
                    b'"' => state = State::DoubleQuoted,
                    b'\'' => state = State::SingleQuoted,
                    b'=' => {
                        first_eq.get_or_insert(self.pos);
                    }
                    b'{' if self.pos > start && bytes[self.pos - 1] == b'=' => {
                        if let Some(cut) = glued_split(bytes, start, self.pos - 1, first_eq) {
                            self.pos = cut;
                            return Some(&self.input[start..cut]);
                        }
                        self.pos += 1;
                        return Some(&self.input[start..self.pos]);
                    }
                    _ => (),
                },
                State::DoubleQuoted => match c {
                    b'"' => state = State::Plain,
                    b'\n' | b'\r' => break,
                    _ => (),
                },
                State::SingleQuoted => match c {
                    b'\'' => state = State::Plain,
                    b'\n' | b'\r' => break,
                    _ => (),
                },
            }
            self.pos += 1;
        }

        Some(&self.input[start..self.pos])
    }
}

/// Find the split point for a glued field.
///
/// Called with the cursor on a `{` that follows `=` at `eq`. If the
/// token already carried a key/value pair and the `=` is preceded by a
/// non-empty run of uppercase letters/underscores that does not start
/// the token, the structure was glued onto the previous value and the
/// token must be re-split at the start of that run.
fn glued_split(bytes: &[u8], start: usize, eq: usize, first_eq: Option<usize>) -> Option<usize> {
    let mut run = eq;
    while run > start && (bytes[run - 1].is_ascii_uppercase() || bytes[run - 1] == b'_') {
        run -= 1;
    }
    if run == eq || run == start {
        return None;
    }
    match first_eq {
        Some(e) if e < run => Some(run),
        _ => None,
    }
}

#[inline(always)]
fn is_sep(c: u8) -> bool {
    c == b' ' || c == b'\t' || c == b'\n' || c == b'\r'
}
