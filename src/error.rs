use crate::MAX_RECURSION;

/// Errors that can occur when compiling or matching patterns.
///
/// Everything except [`Error::NoMatch`] and [`Error::MalformedEscape`] is a
/// compile-time failure: the pattern definition itself is wrong and has to be
/// fixed. The two match-time variants are routine, since a line is commonly
/// tried against several candidate patterns.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A `%{` was opened but never closed.
    #[error("unterminated tag at offset {offset} in pattern {pattern:?}")]
    UnterminatedTag { pattern: String, offset: usize },

    /// A pattern name is not of the form `[A-Z][A-Z0-9_]*`.
    #[error("invalid pattern name in {tag:?} of pattern {pattern:?}")]
    InvalidPatternName { pattern: String, tag: String },

    /// A field name is not of the form `[A-Za-z_][A-Za-z0-9_]*`.
    #[error("invalid field name in {tag:?} of pattern {pattern:?}")]
    InvalidFieldName { pattern: String, tag: String },

    /// A pattern references itself, directly or through other patterns.
    #[error("recursive pattern {name}: {}", .chain.join(" -> "))]
    RecursivePattern { name: String, chain: Vec<String> },

    /// The recursion while compiling has exhausted the limit.
    #[error("recursion while compiling reached the limit of {}", MAX_RECURSION)]
    RecursionTooDeep,

    /// A referenced pattern is neither registered nor part of the batch.
    #[error("unresolved pattern {name} referenced by {pattern:?}")]
    UnresolvedPattern { pattern: String, name: String },

    /// The name is already taken in the registry.
    #[error("duplicate pattern {name}, already defined as {existing:?}")]
    DuplicatePattern { name: String, existing: String },

    /// The same name appears twice in one block of definition text.
    #[error("duplicate definition of {name} at line {line}")]
    DuplicateDefinition { name: String, line: usize },

    /// A line of definition text is not `NAME pattern`.
    #[error("invalid pattern definition at line {line}: {text:?}")]
    InvalidDefinition { line: usize, text: String },

    /// The compiled regex was rejected by the underlying engine.
    #[error("regex of pattern {pattern:?} failed compilation in the underlying engine: {reason}")]
    RegexCompilationFailed { pattern: String, reason: String },

    /// After compiling, the resulting compiled regex pattern is empty.
    #[error("the given pattern {0:?} ended up compiling into an empty regex")]
    CompiledPatternIsEmpty(String),

    /// Two fastmatch fields follow each other without literal text in between.
    #[error("missing delimiter after field {field:?} in pattern {pattern:?}")]
    MissingDelimiter { pattern: String, field: String },

    /// A fastmatch template without any `%{field}` placeholder.
    #[error("pattern {0:?} has no fields")]
    NoFields(String),

    /// The input does not match the pattern.
    #[error("no match")]
    NoMatch,

    /// A quoted field holds a backslash escape that cannot be decoded.
    #[error("malformed escape sequence at offset {offset}")]
    MalformedEscape { offset: usize },
}

impl Error {
    /// Returns `true` for failures that only concern the input being matched,
    /// rather than the pattern itself.
    pub fn is_match_error(&self) -> bool {
        matches!(self, Error::NoMatch | Error::MalformedEscape { .. })
    }
}
