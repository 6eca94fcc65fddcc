use ::onig::{MatchParam, Regex, Region, SearchOptions};

pub(crate) const ENGINE: crate::Engine = crate::Engine::Onig;

/// A regex compiled by Oniguruma.
///
/// Oniguruma does not capture plain `(...)` groups once a pattern contains a
/// named group, so every group it reports here is a named one.
#[derive(Debug)]
pub(crate) struct OnigPattern {
    regex: Regex,
}

impl OnigPattern {
    /// Compiles the rendered regex source.
    pub(crate) fn new(regex: &str) -> Result<Self, String> {
        match Regex::new(regex) {
            Ok(regex) => Ok(Self { regex }),
            Err(e) => Err(format!("{e:?}")),
        }
    }

    /// Returns the name of every capture group by index, group 0 included.
    pub(crate) fn group_names(&self) -> Vec<Option<String>> {
        let mut names = vec![None; self.regex.captures_len() + 1];
        self.regex.foreach_name(|name, indices| {
            for &index in indices {
                if let Some(slot) = names.get_mut(index as usize) {
                    *slot = Some(name.to_string());
                }
            }
            true
        });
        names
    }

    /// Matches this compiled regex against the text and returns the captures.
    pub(crate) fn captures<'t>(&self, text: &'t str) -> Option<OnigCaptures<'t>> {
        // Inlined version of the onig methods that cause an internal panic
        let mut region = Region::new();
        let options = SearchOptions::SEARCH_OPTION_NONE;
        let match_param = MatchParam::default();
        let result = self.regex.search_with_param(
            text,
            0,
            text.len(),
            options,
            Some(&mut region),
            match_param,
        );

        match result {
            Ok(r) => r,
            Err(_) => None,
        }
        .map(|_| OnigCaptures { text, region })
    }
}

/// The groups of one successful match.
#[derive(Debug)]
pub(crate) struct OnigCaptures<'t> {
    text: &'t str,
    region: Region,
}

impl<'t> OnigCaptures<'t> {
    /// Gets the text of the group at `index`, `None` if it did not participate.
    pub(crate) fn get(&self, index: usize) -> Option<&'t str> {
        self.region
            .pos(index)
            .map(|(start, end)| &self.text[start..end])
    }
}
