use std::ops::Range;

use crate::Error;

/// The template could not be split into components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateError {
    /// A `%{` at this byte offset has no closing `}`.
    UnterminatedTag(usize),
}

impl TemplateError {
    /// Attaches the name (or source text) of the enclosing pattern.
    pub(crate) fn into_error(self, pattern: &str) -> Error {
        match self {
            TemplateError::UnterminatedTag(offset) => Error::UnterminatedTag {
                pattern: pattern.to_string(),
                offset,
            },
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum Component<'a> {
    /// Text outside of any placeholder.
    Literal { range: Range<usize>, text: &'a str },
    /// A `%{...}` placeholder. `body` is the text between the braces.
    Tag {
        range: Range<usize>,
        tag: &'a str,
        body: &'a str,
    },
}

impl std::fmt::Debug for Component<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Component::Literal { text, .. } => write!(f, "{text:?}"),
            Component::Tag { body, .. } => write!(f, "%{{ body={body:?} }}"),
        }
    }
}

impl std::fmt::Display for Component<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Component::Literal { text, .. } => f.write_str(text),
            Component::Tag { tag, .. } => f.write_str(tag),
        }
    }
}

/// An iterator over the components of a template.
///
/// Literal components are maximal: two literals never follow each other. A `%`
/// that is not followed by `{` is ordinary literal text.
pub struct TemplateSplit<'a> {
    string: &'a str,
    offset: usize,
}

impl<'a> Iterator for TemplateSplit<'a> {
    type Item = Result<Component<'a>, TemplateError>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.offset;
        let rest = &self.string[start..];
        if rest.is_empty() {
            return None;
        }

        if let Some(inner) = rest.strip_prefix("%{") {
            let Some(len) = inner.find('}') else {
                // Fuse the iterator if we error out
                self.offset = self.string.len();
                return Some(Err(TemplateError::UnterminatedTag(start)));
            };
            let end = start + 2 + len + 1;
            self.offset = end;
            return Some(Ok(Component::Tag {
                range: start..end,
                tag: &self.string[start..end],
                body: &inner[..len],
            }));
        }

        let end = start + rest.find("%{").unwrap_or(rest.len());
        self.offset = end;
        Some(Ok(Component::Literal {
            range: start..end,
            text: &self.string[start..end],
        }))
    }
}

pub fn split<S: AsRef<str> + ?Sized>(string: &S) -> TemplateSplit<'_> {
    TemplateSplit {
        string: string.as_ref(),
        offset: 0,
    }
}

/// `^[A-Z][A-Z0-9_]*$`
pub fn is_pattern_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some('A'..='Z'))
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// `^[A-Za-z_][A-Za-z0-9_]*$`
pub fn is_field_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(template: &str) -> Vec<String> {
        split(template)
            .map(|c| c.expect("split failed").to_string())
            .collect()
    }

    #[test]
    fn test_split() {
        assert_eq!(parts("Hello, %{name}!"), vec!["Hello, ", "%{name}", "!"]);
        assert_eq!(parts("%{a}%{b}"), vec!["%{a}", "%{b}"]);
        assert_eq!(parts(""), Vec::<String>::new());
        assert_eq!(parts("no tags"), vec!["no tags"]);
    }

    #[test]
    fn test_tag_body_and_range() {
        let components = split("x=%{INT:x} ").collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(
            components[1],
            Component::Tag {
                range: 2..10,
                tag: "%{INT:x}",
                body: "INT:x"
            }
        );
        assert_eq!(
            components[2],
            Component::Literal {
                range: 10..11,
                text: " "
            }
        );
    }

    #[test]
    fn test_lone_percent_is_literal() {
        assert_eq!(parts("100% %{x}"), vec!["100% ", "%{x}"]);
        assert_eq!(parts("(?:%[0-9]+)?"), vec!["(?:%[0-9]+)?"]);
        assert_eq!(parts("%%{x}%"), vec!["%", "%{x}", "%"]);
        assert_eq!(parts("%"), vec!["%"]);
    }

    #[test]
    fn test_empty_tag() {
        assert_eq!(parts("a%{}b"), vec!["a", "%{}", "b"]);
    }

    #[test]
    fn test_unterminated_tag() {
        for (template, offset) in [("%{name", 0), ("abc %{", 4), ("%{a} %{b", 5)] {
            let last = split(template).last().unwrap();
            assert_eq!(Err(TemplateError::UnterminatedTag(offset)), last, "{template}");
        }
        // Fused after the error
        let mut it = split("ab %{x");
        assert!(it.next().unwrap().is_ok());
        assert!(it.next().unwrap().is_err());
        assert!(it.next().is_none());
    }

    #[test]
    fn test_pattern_names() {
        for name in ["A", "IPV4", "TIMESTAMP_ISO8601", "X_1_"] {
            assert!(is_pattern_name(name), "{name}");
        }
        for name in ["", "a", "_A", "1A", "Ab", "A-B", "A B"] {
            assert!(!is_pattern_name(name), "{name}");
        }
    }

    #[test]
    fn test_field_names() {
        for name in ["a", "_", "remote_ip", "Field9", "_x"] {
            assert!(is_field_name(name), "{name}");
        }
        for name in ["", "9a", "a-b", "a.b", "a b", "é"] {
            assert!(!is_field_name(name), "{name}");
        }
    }
}
