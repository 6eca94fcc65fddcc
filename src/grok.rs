use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::template::{self, Component};
use crate::{CapturesInner, Engine, Error, Field, InnerPattern, Matcher, ENGINE, MAX_RECURSION, PATTERNS};

/// Prefix of the regex group names generated for `%{NAME:field}` references.
/// The digits that follow index into the field table of the pattern.
const FIELD_GROUP_PREFIX: &str = "_gm";

/// One piece of an expanded pattern.
#[derive(Debug)]
enum Node {
    /// Regular expression text, copied verbatim into the rendered regex.
    Regex(String),
    /// A `%{NAME}` or `%{NAME:field}` reference and the expansion of `NAME`.
    Pattern {
        #[allow(unused)]
        name: String,
        field: Option<String>,
        body: Arc<[Node]>,
    },
}

/// Renders expanded nodes into regex syntax, collecting the field name of
/// every generated named group.
fn render(nodes: &[Node], regex: &mut String, fields: &mut Vec<String>) {
    for node in nodes {
        match node {
            Node::Regex(text) => regex.push_str(text),
            Node::Pattern {
                field: None, body, ..
            } => {
                regex.push_str("(?:");
                render(body, regex, fields);
                regex.push(')');
            }
            Node::Pattern {
                field: Some(field),
                body,
                ..
            } => {
                regex.push_str("(?<");
                regex.push_str(FIELD_GROUP_PREFIX);
                regex.push_str(&fields.len().to_string());
                regex.push('>');
                fields.push(field.clone());
                render(body, regex, fields);
                regex.push(')');
            }
        }
    }
}

/// The `Pattern` represents a compiled Grok pattern, ready to be matched
/// against arbitrary text.
///
/// A pattern matches only if it covers the whole input. Matching yields one
/// field per named capture group, in the order the fields appear in the
/// template. This includes fields declared inside referenced patterns. A field
/// whose group did not take part in the match, for example inside an optional
/// group, is reported with an empty value. The shape of the result therefore
/// only depends on the pattern.
pub struct Pattern {
    source: String,
    regex: String,
    inner: InnerPattern,
    capture_names: Vec<String>,
    nodes: Arc<[Node]>,
}

impl Pattern {
    /// Renders the expanded `nodes` and compiles them with the regex engine.
    fn build(owner: &str, source: &str, nodes: Vec<Node>) -> Result<Self, Error> {
        let mut regex = String::with_capacity(source.len() * 4);
        let mut fields = Vec::new();
        regex.push_str(r"\A(?:");
        render(&nodes, &mut regex, &mut fields);
        regex.push_str(r")\z");

        let inner = InnerPattern::new(&regex).map_err(|reason| Error::RegexCompilationFailed {
            pattern: owner.to_string(),
            reason,
        })?;

        let capture_names = inner
            .group_names()
            .into_iter()
            .map(|name| match name {
                Some(name) => name
                    .strip_prefix(FIELD_GROUP_PREFIX)
                    .and_then(|index| index.parse::<usize>().ok())
                    .and_then(|index| fields.get(index))
                    .cloned()
                    .unwrap_or(name),
                None => String::new(),
            })
            .collect();

        Ok(Self {
            source: source.to_string(),
            regex,
            inner,
            capture_names,
            nodes: nodes.into(),
        })
    }

    /// Matches `input` and appends the fields to `dst`.
    ///
    /// Fails with [`Error::NoMatch`] and leaves `dst` untouched if the pattern
    /// does not match.
    pub fn match_string<'a>(
        &'a self,
        input: &'a str,
        dst: &mut Vec<Field<'a>>,
    ) -> Result<(), Error> {
        let captures: CapturesInner<'a> = self.inner.captures(input).ok_or(Error::NoMatch)?;
        for (index, name) in self.capture_names.iter().enumerate() {
            if name.is_empty() {
                continue;
            }
            let value = captures.get(index).unwrap_or_default();
            dst.push((name.as_str(), Cow::Borrowed(value)));
        }
        Ok(())
    }

    /// Matches `input` and returns the fields.
    pub fn match_against<'a>(&'a self, input: &'a str) -> Result<Vec<Field<'a>>, Error> {
        let mut fields = Vec::with_capacity(self.capture_names.len());
        self.match_string(input, &mut fields)?;
        Ok(fields)
    }

    /// Returns the names of all fields, in match order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.capture_names
            .iter()
            .filter(|name| !name.is_empty())
            .map(|name| name.as_str())
    }

    /// Returns the template this pattern was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the regex this pattern was rendered into.
    pub fn regex(&self) -> &str {
        &self.regex
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

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.debug_struct("Pattern")
                .field("source", &self.source)
                .field("regex", &self.regex)
                .field("fields", &self.field_names().collect::<Vec<_>>())
                .finish()
        } else {
            f.debug_struct("Pattern")
                .field("source", &self.source)
                .field(
                    "fields",
                    &format!("{{ {:?} field(s) }}", self.field_names().count()),
                )
                .finish()
        }
    }
}

/// Parses pattern definitions, one `NAME pattern` per line.
///
/// Blank lines and lines starting with `#` are skipped. The name starts at the
/// beginning of the line and is separated from the pattern by whitespace. A
/// name defined twice in the same text is an error.
pub fn read_pattern_definitions(text: &str) -> Result<BTreeMap<String, String>, Error> {
    let mut definitions = BTreeMap::new();
    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let invalid = || Error::InvalidDefinition {
            line: line_number,
            text: line.to_string(),
        };
        let (name, body) = line.split_once(char::is_whitespace).ok_or_else(invalid)?;
        let body = body.trim_start();
        if name.is_empty() || body.is_empty() {
            return Err(invalid());
        }

        if definitions
            .insert(name.to_string(), body.to_string())
            .is_some()
        {
            return Err(Error::DuplicateDefinition {
                name: name.to_string(),
                line: line_number,
            });
        }
    }
    Ok(definitions)
}

/// The `Grok` struct is the registry of named patterns, and the main entry
/// point into using the regex engine.
///
/// Cloning is cheap: compiled patterns are shared between clones.
#[derive(Clone)]
pub struct Grok {
    engine: Engine,
    patterns: BTreeMap<String, Arc<Pattern>>,
}

impl Grok {
    /// Creates a new `Grok` instance with no patterns.
    pub const fn empty() -> Self {
        Self {
            engine: ENGINE,
            patterns: BTreeMap::new(),
        }
    }

    /// Creates a new `Grok` instance and compiles all the builtin patterns.
    ///
    /// For more information, see the [`mod@crate::patterns`] module.
    ///
    /// # Panics
    ///
    /// If the builtin library fails to compile with the selected regex engine.
    pub fn new() -> Self {
        let mut grok = Self::empty();
        if let Err(e) = grok.set_map(PATTERNS.iter().copied()) {
            panic!("builtin pattern library is malformed: {e}");
        }
        grok
    }

    /// Compiles and registers one named pattern.
    ///
    /// The name must be of the form `[A-Z][A-Z0-9_]*` and must not be
    /// registered yet.
    pub fn set(&mut self, name: &str, pattern: &str) -> Result<(), Error> {
        self.set_map([(name, pattern)])
    }

    /// Compiles and registers a batch of named patterns, which may reference
    /// each other in any order.
    ///
    /// Either all patterns are registered or, on error, none are.
    pub fn set_map<I, K, V>(&mut self, definitions: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut pending = BTreeMap::new();
        for (name, pattern) in definitions {
            let (name, pattern) = (name.into(), pattern.into());
            if !template::is_pattern_name(&name) {
                return Err(Error::InvalidPatternName {
                    tag: name.clone(),
                    pattern: name,
                });
            }
            if let Some(existing) = self.patterns.get(&name) {
                return Err(Error::DuplicatePattern {
                    name,
                    existing: existing.source.clone(),
                });
            }
            if let Some(existing) = pending.insert(name.clone(), pattern) {
                return Err(Error::DuplicatePattern { name, existing });
            }
        }

        let mut compiler = Compiler::new(self, &pending);
        for (name, pattern) in &pending {
            if compiler.defined.contains_key(name) {
                continue;
            }
            if let Err(e) = compiler.define(name, pattern) {
                debug!(pattern = %name, error = %e, "failed to register patterns");
                return Err(e);
            }
        }

        let defined = compiler.defined;
        debug!(count = defined.len(), "registered patterns");
        self.patterns.extend(defined);
        Ok(())
    }

    /// Parses definition text with [`read_pattern_definitions`] and registers
    /// the result with [`Grok::set_map`].
    pub fn add_definitions(&mut self, text: &str) -> Result<(), Error> {
        let definitions = read_pattern_definitions(text)?;
        self.set_map(definitions)
    }

    /// Compiles an anonymous pattern, without registering it.
    pub fn compile(&self, pattern: &str) -> Result<Pattern, Error> {
        if pattern.is_empty() {
            return Err(Error::CompiledPatternIsEmpty(pattern.into()));
        }
        let pending = BTreeMap::new();
        let mut compiler = Compiler::new(self, &pending);
        let nodes = compiler.expand(pattern, pattern)?;
        Pattern::build(pattern, pattern, nodes)
    }

    /// Returns the registered pattern with the given name.
    pub fn get(&self, name: &str) -> Option<&Pattern> {
        self.patterns.get(name).map(|p| p.as_ref())
    }

    /// Returns `true` if a pattern with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.patterns.contains_key(name)
    }

    /// Returns the names of all registered patterns, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.patterns.keys().map(|s| s.as_str())
    }

    /// Returns the number of registered patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns `true` if no pattern is registered.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Returns the regex engine patterns are compiled with.
    pub fn engine(&self) -> Engine {
        self.engine
    }
}

/// The Default implementation for Grok which will load the builtin patterns.
impl Default for Grok {
    fn default() -> Grok {
        Grok::new()
    }
}

impl fmt::Debug for Grok {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grok")
            .field("engine", &self.engine)
            .field("patterns", &format!("{{ {:?} pattern(s) }}", self.len()))
            .finish()
    }
}

/// Expands templates against a registry and a batch of not yet compiled
/// definitions. Patterns compiled along the way are kept in `defined` until
/// the caller decides to keep them.
struct Compiler<'g> {
    grok: &'g Grok,
    pending: &'g BTreeMap<String, String>,
    defined: BTreeMap<String, Arc<Pattern>>,
    /// Names of the patterns currently being expanded, outermost first.
    chain: Vec<String>,
}

impl<'g> Compiler<'g> {
    fn new(grok: &'g Grok, pending: &'g BTreeMap<String, String>) -> Self {
        Self {
            grok,
            pending,
            defined: BTreeMap::new(),
            chain: Vec::new(),
        }
    }

    /// Compiles the named pattern and records it in `defined`.
    fn define(&mut self, name: &str, pattern: &str) -> Result<Arc<Pattern>, Error> {
        if self.chain.len() >= MAX_RECURSION {
            return Err(Error::RecursionTooDeep);
        }
        if pattern.is_empty() {
            return Err(Error::CompiledPatternIsEmpty(name.into()));
        }

        self.chain.push(name.to_string());
        let nodes = self.expand(name, pattern);
        self.chain.pop();

        let compiled = Arc::new(Pattern::build(name, pattern, nodes?)?);
        self.defined.insert(name.to_string(), compiled.clone());
        Ok(compiled)
    }

    /// Splits a template into nodes, resolving every reference.
    fn expand(&mut self, owner: &str, pattern: &str) -> Result<Vec<Node>, Error> {
        let mut nodes = Vec::new();
        for component in template::split(pattern) {
            match component.map_err(|e| e.into_error(owner))? {
                Component::Literal { text, .. } => nodes.push(Node::Regex(text.to_string())),
                Component::Tag { tag, body, .. } => {
                    let (name, field) = match body.split_once(':') {
                        Some((name, field)) => (name, Some(field)),
                        None => (body, None),
                    };
                    if !template::is_pattern_name(name) {
                        return Err(Error::InvalidPatternName {
                            pattern: owner.to_string(),
                            tag: tag.to_string(),
                        });
                    }
                    if field.is_some_and(|field| !template::is_field_name(field)) {
                        return Err(Error::InvalidFieldName {
                            pattern: owner.to_string(),
                            tag: tag.to_string(),
                        });
                    }

                    let body = self.resolve(owner, name)?;
                    nodes.push(Node::Pattern {
                        name: name.to_string(),
                        field: field.map(str::to_string),
                        body,
                    });
                }
            }
        }
        Ok(nodes)
    }

    /// Finds the expansion of `name`, compiling it first if it is part of the
    /// pending batch.
    fn resolve(&mut self, owner: &str, name: &str) -> Result<Arc<[Node]>, Error> {
        if self.chain.iter().any(|n| n == name) {
            let mut chain = self.chain.clone();
            chain.push(name.to_string());
            return Err(Error::RecursivePattern {
                name: name.to_string(),
                chain,
            });
        }

        if let Some(pattern) = self
            .defined
            .get(name)
            .or_else(|| self.grok.patterns.get(name))
        {
            return Ok(pattern.nodes.clone());
        }

        let pending = self.pending;
        match pending.get(name) {
            Some(pattern) => Ok(self.define(name, pattern)?.nodes.clone()),
            None => Err(Error::UnresolvedPattern {
                pattern: owner.to_string(),
                name: name.to_string(),
            }),
        }
    }
}
