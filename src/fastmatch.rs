//! Delimiter based field extraction.
//!
//! A fastmatch template uses the same `%{field}` placeholders as Grok, but the
//! text between placeholders is matched literally instead of as a regex. A
//! field's value is everything up to the next occurrence of the literal that
//! follows it, so matching is a handful of substring searches.
//!
//! ```
//! use grokmatch::fastmatch;
//!
//! let pattern = fastmatch::compile("%{src} -> %{dst}: %{msg}").unwrap();
//! let fields = pattern.match_against("10.0.0.1 -> 10.0.0.2: accepted").unwrap();
//! assert_eq!(fields[2], ("msg", "accepted".into()));
//! ```
//!
//! A field enclosed in matching `"` or `'` quotes, as in `"%{path}"`, may
//! contain backslash escapes, including an escaped quote. Such values are
//! unescaped while matching.

use std::borrow::Cow;
use std::str::CharIndices;

use tracing::debug;

use crate::template::{self, Component};
use crate::{Error, Field, Matcher};

/// A field placeholder together with the literal text that ends it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delimiter {
    match_text: String,
    field: String,
    quote: Option<char>,
}

impl Delimiter {
    /// The literal that follows the field. Empty only for the field that takes
    /// the rest of the input.
    pub fn match_text(&self) -> &str {
        &self.match_text
    }

    /// The field name. An empty name matches but is not reported.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The quote character enclosing the field, if any.
    pub fn quote(&self) -> Option<char> {
        self.quote
    }
}

/// A compiled fastmatch template.
///
/// Patterns hold no per-match state and can be shared between threads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    prefix: String,
    delimiters: Vec<Delimiter>,
    fields: Vec<String>,
}

/// Returns the quote enclosing a field, given the character right before the
/// placeholder and the literal right after it.
fn enclosing_quote(before: Option<char>, after: &str) -> Option<char> {
    match (before, after.chars().next()) {
        (Some(open), Some(close)) if open == close && (open == '"' || open == '\'') => Some(open),
        _ => None,
    }
}

/// Compiles a fastmatch template.
pub fn compile(pattern: &str) -> Result<Pattern, Error> {
    let mut prefix = String::new();
    let mut delimiters = Vec::new();
    // The placeholder waiting for its delimiter, and the character before it.
    let mut open: Option<(&str, Option<char>)> = None;
    let mut last_char = None;

    for component in template::split(pattern) {
        match component.map_err(|e| e.into_error(pattern))? {
            Component::Literal { text, .. } => {
                match open.take() {
                    None => prefix.push_str(text),
                    Some((field, before)) => delimiters.push(Delimiter {
                        match_text: text.to_string(),
                        field: field.to_string(),
                        quote: enclosing_quote(before, text),
                    }),
                }
                last_char = text.chars().last();
            }
            Component::Tag { tag, body, .. } => {
                if !body.is_empty() && !template::is_field_name(body) {
                    return Err(Error::InvalidFieldName {
                        pattern: pattern.to_string(),
                        tag: tag.to_string(),
                    });
                }
                if let Some((field, _)) = open.replace((body, last_char.take())) {
                    delimiters.push(Delimiter {
                        match_text: String::new(),
                        field: field.to_string(),
                        quote: None,
                    });
                }
            }
        }
    }

    if let Some((field, _)) = open {
        delimiters.push(Delimiter {
            match_text: String::new(),
            field: field.to_string(),
            quote: None,
        });
    }
    if delimiters.is_empty() {
        return Err(Error::NoFields(pattern.to_string()));
    }

    // Only the last field, or the first of two adjacent fields ending the
    // template, may go without a delimiter.
    let terminal = match &delimiters[..] {
        [.., before, last] if last.match_text.is_empty() && before.match_text.is_empty() => 2,
        _ => 1,
    };
    let open_ended = &delimiters[..delimiters.len() - terminal];
    if let Some(delimiter) = open_ended.iter().find(|d| d.match_text.is_empty()) {
        return Err(Error::MissingDelimiter {
            pattern: pattern.to_string(),
            field: delimiter.field.clone(),
        });
    }

    let fields = delimiters
        .iter()
        .filter(|d| !d.field.is_empty())
        .map(|d| d.field.clone())
        .collect::<Vec<_>>();
    debug!(
        delimiters = delimiters.len(),
        fields = fields.len(),
        "compiled fastmatch pattern"
    );

    Ok(Pattern {
        prefix,
        delimiters,
        fields,
    })
}

impl Pattern {
    /// Returns the number of named fields.
    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    /// Returns the name of the `index`-th named field.
    ///
    /// # Panics
    ///
    /// If `index` is not less than [`Pattern::num_fields`].
    pub fn field_name(&self, index: usize) -> &str {
        &self.fields[index]
    }

    /// Returns the names of all named fields, in match order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|s| s.as_str())
    }

    /// Returns the literal text the input has to start with.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the delimiters, one per placeholder.
    pub fn delimiters(&self) -> &[Delimiter] {
        &self.delimiters
    }

    /// Matches `input` and appends the fields to `dst`.
    ///
    /// On error, `dst` is truncated back to the length it had on entry.
    pub fn match_string<'a>(
        &'a self,
        input: &'a str,
        dst: &mut Vec<Field<'a>>,
    ) -> Result<(), Error> {
        let len = dst.len();
        let result = self.extract(input, dst);
        if result.is_err() {
            dst.truncate(len);
        }
        result
    }

    /// Matches `input` and returns the fields.
    pub fn match_against<'a>(&'a self, input: &'a str) -> Result<Vec<Field<'a>>, Error> {
        let mut fields = Vec::with_capacity(self.fields.len());
        self.match_string(input, &mut fields)?;
        Ok(fields)
    }

    fn extract<'a>(&'a self, input: &'a str, dst: &mut Vec<Field<'a>>) -> Result<(), Error> {
        let mut tail = input
            .strip_prefix(self.prefix.as_str())
            .ok_or(Error::NoMatch)?;

        for delimiter in &self.delimiters {
            let value = if delimiter.match_text.is_empty() {
                let value = Cow::Borrowed(tail);
                tail = "";
                value
            } else {
                match delimiter.quote {
                    Some(quote) if tail.contains('\\') => {
                        let offset = input.len() - tail.len();
                        let (value, end) = unquote(tail, quote, offset)?;
                        tail = tail[end..]
                            .strip_prefix(delimiter.match_text.as_str())
                            .ok_or(Error::NoMatch)?;
                        Cow::Owned(value)
                    }
                    _ => {
                        let (value, rest) = tail
                            .split_once(delimiter.match_text.as_str())
                            .ok_or(Error::NoMatch)?;
                        tail = rest;
                        Cow::Borrowed(value)
                    }
                }
            };

            if !delimiter.field.is_empty() {
                dst.push((delimiter.field.as_str(), value));
            }
            if delimiter.match_text.is_empty() {
                break;
            }
        }
        Ok(())
    }
}

impl Matcher for Pattern {
    fn match_string<'a>(
        &'a self,
        input: &'a str,
        dst: &mut Vec<Field<'a>>,
    ) -> Result<(), Error> {
        Pattern::match_string(self, input, dst)
    }
}

/// Unescapes `text` up to the first unescaped `quote`.
///
/// Returns the unescaped value and the byte offset of the closing quote in
/// `text`. `offset` is the position of `text` in the whole input and is used
/// for error reporting.
fn unquote(text: &str, quote: char, offset: usize) -> Result<(String, usize), Error> {
    let mut value = String::with_capacity(text.len());
    let mut chars = text.char_indices();
    while let Some((index, c)) = chars.next() {
        match c {
            '\\' => {
                let c = unescape(&mut chars).ok_or(Error::MalformedEscape {
                    offset: offset + index,
                })?;
                value.push(c);
            }
            c if c == quote => return Ok((value, index)),
            c => value.push(c),
        }
    }
    // Unterminated quote
    Err(Error::NoMatch)
}

/// Decodes one escape sequence, with `chars` positioned right after the
/// backslash.
fn unescape(chars: &mut CharIndices<'_>) -> Option<char> {
    let (_, c) = chars.next()?;
    let c = match c {
        'a' => '\x07',
        'b' => '\x08',
        'f' => '\x0c',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'v' => '\x0b',
        '\\' | '"' | '\'' | '/' => c,
        'x' => char::from_u32(digits(chars, 2, 16, 0)?)?,
        'u' => char::from_u32(digits(chars, 4, 16, 0)?)?,
        'U' => char::from_u32(digits(chars, 8, 16, 0)?)?,
        '0'..='7' => {
            let value = digits(chars, 2, 8, c.to_digit(8)?)?;
            if value > 0xff {
                return None;
            }
            char::from_u32(value)?
        }
        _ => return None,
    };
    Some(c)
}

/// Reads exactly `count` digits in the given radix, accumulating onto `value`.
fn digits(chars: &mut CharIndices<'_>, count: usize, radix: u32, mut value: u32) -> Option<u32> {
    for _ in 0..count {
        let (_, c) = chars.next()?;
        value = value * radix + c.to_digit(radix)?;
    }
    Some(value)
}
