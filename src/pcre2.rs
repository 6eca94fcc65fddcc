use ::pcre2::bytes::{Captures, Regex, RegexBuilder};

pub(crate) const ENGINE: crate::Engine = crate::Engine::Pcre2;

/// A regex compiled by PCRE2, with JIT when available.
#[derive(Debug)]
pub(crate) struct Pcre2Pattern {
    regex: Regex,
}

impl Pcre2Pattern {
    /// Compiles the rendered regex source.
    pub(crate) fn new(regex: &str) -> Result<Self, String> {
        let mut builder = RegexBuilder::new();
        builder.jit_if_available(true);
        builder.utf(true);
        match builder.build(regex) {
            Ok(regex) => Ok(Self { regex }),
            Err(e) => Err(format!("{e}")),
        }
    }

    /// Returns the name of every capture group by index, group 0 included.
    pub(crate) fn group_names(&self) -> Vec<Option<String>> {
        self.regex.capture_names().to_vec()
    }

    /// Matches this compiled regex against the text and returns the captures.
    pub(crate) fn captures<'t>(&self, text: &'t str) -> Option<Pcre2Captures<'t>> {
        self.regex
            .captures(text.as_bytes())
            .ok()
            .flatten()
            .map(|captures| Pcre2Captures { text, captures })
    }
}

/// The groups of one successful match.
#[derive(Debug)]
pub(crate) struct Pcre2Captures<'t> {
    text: &'t str,
    captures: Captures<'t>,
}

impl<'t> Pcre2Captures<'t> {
    /// Gets the text of the group at `index`, `None` if it did not participate.
    ///
    /// The regex is built in UTF mode, so group boundaries fall on char
    /// boundaries of `text`.
    pub(crate) fn get(&self, index: usize) -> Option<&'t str> {
        self.captures
            .get(index)
            .map(|m| &self.text[m.start()..m.end()])
    }
}
