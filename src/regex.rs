use ::regex::{Captures, Regex};

pub(crate) const ENGINE: crate::Engine = crate::Engine::Regex;

/// A regex compiled by the `regex` crate.
#[derive(Debug)]
pub(crate) struct RegexPattern {
    regex: Regex,
}

impl RegexPattern {
    /// Compiles the rendered regex source.
    pub(crate) fn new(regex: &str) -> Result<Self, String> {
        match Regex::new(regex) {
            Ok(regex) => Ok(Self { regex }),
            Err(e) => Err(format!("{e}")),
        }
    }

    /// Returns the name of every capture group by index, group 0 included.
    pub(crate) fn group_names(&self) -> Vec<Option<String>> {
        self.regex
            .capture_names()
            .map(|name| name.map(str::to_string))
            .collect()
    }

    /// Matches this compiled regex against the text and returns the captures.
    pub(crate) fn captures<'t>(&self, text: &'t str) -> Option<RegexCaptures<'t>> {
        self.regex.captures(text).map(|captures| RegexCaptures { captures })
    }
}

/// The groups of one successful match.
#[derive(Debug)]
pub(crate) struct RegexCaptures<'t> {
    captures: Captures<'t>,
}

impl<'t> RegexCaptures<'t> {
    /// Gets the text of the group at `index`, `None` if it did not participate.
    pub(crate) fn get(&self, index: usize) -> Option<&'t str> {
        self.captures.get(index).map(|m| m.as_str())
    }
}
