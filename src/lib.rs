#![doc = include_str!("../README.md")]

include!(concat!(env!("OUT_DIR"), "/default_patterns.rs"));

use std::borrow::Cow;

#[cfg(feature = "fancy-regex")]
mod fancy_regex;
#[cfg(feature = "onig")]
mod onig;
#[cfg(feature = "pcre2")]
mod pcre2;
#[cfg(feature = "regex")]
mod regex;

mod error;
pub mod fastmatch;
mod grok;
mod template;

pub use crate::error::Error;
pub use crate::grok::{read_pattern_definitions, Grok, Pattern};

// Enable features in the following preferred order. If multiple features are
// enabled, the first one in the list is used.

// 0. pcre2
// 1. fancy-regex
// 2. onig
// 3. regex

/// The regex engine Grok patterns are compiled with.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[allow(unused)]
pub enum Engine {
    Pcre2,
    FancyRegex,
    Onig,
    Regex,
}

#[doc(hidden)]
#[cfg(feature = "pcre2")]
use crate::pcre2::{Pcre2Captures as CapturesInner, Pcre2Pattern as InnerPattern, ENGINE};

#[doc(hidden)]
#[cfg(all(not(feature = "pcre2"), feature = "fancy-regex"))]
use crate::fancy_regex::{
    FancyRegexCaptures as CapturesInner, FancyRegexPattern as InnerPattern, ENGINE,
};

#[doc(hidden)]
#[cfg(all(not(feature = "pcre2"), not(feature = "fancy-regex"), feature = "onig"))]
use crate::onig::{OnigCaptures as CapturesInner, OnigPattern as InnerPattern, ENGINE};

#[doc(hidden)]
#[cfg(all(
    not(feature = "pcre2"),
    not(feature = "fancy-regex"),
    not(feature = "onig"),
    feature = "regex"
))]
use crate::regex::{RegexCaptures as CapturesInner, RegexPattern as InnerPattern, ENGINE};

#[cfg(all(
    not(feature = "onig"),
    not(feature = "fancy-regex"),
    not(feature = "regex"),
    not(feature = "pcre2")
))]
compile_error!("No regex engine selected. Please enable one of the following features: regex, onig, fancy-regex, pcre2");

/// Deepest chain of nested pattern references. Expansion recurses once per
/// level, and the regex engines cap group nesting at 250.
const MAX_RECURSION: usize = 128;

/// Returns the builtin patterns, also loaded by [`Grok::new`].
pub fn patterns() -> &'static [(&'static str, &'static str)] {
    PATTERNS
}

/// One extracted field: its name and the text matched for it.
///
/// The name borrows from the compiled pattern. The value borrows from the
/// input line, unless it had to be unescaped.
pub type Field<'a> = (&'a str, Cow<'a, str>);

/// The matching contract shared by [`grok::Pattern`](Pattern) and
/// [`fastmatch::Pattern`].
///
/// A log pipeline typically holds one matcher per known format and tries them
/// in turn until one accepts the line.
pub trait Matcher {
    /// Matches `input` and appends the extracted fields to `dst`, in the
    /// order the fields appear in the template.
    ///
    /// On error `dst` is left exactly as it was passed in, so the same buffer
    /// can be handed to the next candidate pattern.
    fn match_string<'a>(&'a self, input: &'a str, dst: &mut Vec<Field<'a>>)
        -> Result<(), Error>;

    /// Matches `input` and returns the extracted fields.
    fn match_against<'a>(&'a self, input: &'a str) -> Result<Vec<Field<'a>>, Error> {
        let mut fields = Vec::new();
        self.match_string(input, &mut fields)?;
        Ok(fields)
    }
}
