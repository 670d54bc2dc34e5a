//! Filter descriptors: a pattern and what to replace its matches with.
//!
//! A filter is only applied when its pattern is a compiled regular expression
//! and its replacement is a template string or a function. Anything else is
//! representable (so configuration mistakes survive loading) but inert.

use std::fmt;
use std::sync::Arc;

use regex::{Captures, Regex, RegexBuilder};
use retext_config::{Config, FilterConfig, ReplaceValue};

/// Replacement function, called once per match.
pub type ReplaceFn = Arc<dyn Fn(&Captures<'_>) -> String + Send + Sync>;

/// What a filter looks for.
#[derive(Clone, Debug)]
pub enum Pattern {
    /// A compiled regular expression.
    Regex(Regex),
    /// A plain string. Not a regular expression, so the filter is skipped.
    Plain(String),
}

impl Pattern {
    /// The compiled expression, if this is one.
    #[must_use]
    pub fn regex(&self) -> Option<&Regex> {
        match self {
            Self::Regex(regex) => Some(regex),
            Self::Plain(_) => None,
        }
    }

    /// Source text of the pattern.
    #[must_use]
    pub fn source(&self) -> &str {
        match self {
            Self::Regex(regex) => regex.as_str(),
            Self::Plain(source) => source,
        }
    }
}

impl From<Regex> for Pattern {
    fn from(regex: Regex) -> Self {
        Self::Regex(regex)
    }
}

impl From<&str> for Pattern {
    fn from(source: &str) -> Self {
        Self::Plain(source.to_owned())
    }
}

impl From<String> for Pattern {
    fn from(source: String) -> Self {
        Self::Plain(source)
    }
}

/// What matched text is replaced with.
#[derive(Clone)]
pub enum Replacement {
    /// Template with `$&`, `$1`, `$<name>` style references.
    Template(String),
    /// Function of the match.
    Function(ReplaceFn),
    /// Neither a string nor a function; the filter is skipped.
    Unsupported(String),
}

impl Replacement {
    /// Wrap a closure as a replacement.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&Captures<'_>) -> String + Send + Sync + 'static,
    {
        Self::Function(Arc::new(f))
    }

    /// Whether this replacement can be applied.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }
}

impl fmt::Debug for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template(template) => f.debug_tuple("Template").field(template).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
            Self::Unsupported(value) => f.debug_tuple("Unsupported").field(value).finish(),
        }
    }
}

impl fmt::Display for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template(template) => f.write_str(template),
            Self::Function(_) => f.write_str("<function>"),
            Self::Unsupported(value) => write!(f, "<unsupported: {value}>"),
        }
    }
}

impl From<&str> for Replacement {
    fn from(template: &str) -> Self {
        Self::Template(template.to_owned())
    }
}

impl From<String> for Replacement {
    fn from(template: String) -> Self {
        Self::Template(template)
    }
}

/// A pattern/replacement rule. Immutable once built.
#[derive(Clone, Debug)]
pub struct Filter {
    pattern: Pattern,
    replacement: Replacement,
}

impl Filter {
    /// Build a filter. No validation beyond the shape of the arguments.
    pub fn new(pattern: impl Into<Pattern>, replacement: impl Into<Replacement>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }

    /// Build a filter from a configured rule.
    ///
    /// A pattern that does not compile yields a [`Pattern::Plain`], and a
    /// missing or non-string replacement yields [`Replacement::Unsupported`],
    /// so the rule is kept but never applied.
    #[must_use]
    pub fn from_config(config: &FilterConfig) -> Self {
        let pattern = match RegexBuilder::new(&config.pattern)
            .case_insensitive(config.has_flag('i'))
            .multi_line(config.has_flag('m'))
            .dot_matches_new_line(config.has_flag('s'))
            .ignore_whitespace(config.has_flag('x'))
            .build()
        {
            Ok(regex) => Pattern::Regex(regex),
            Err(e) => {
                tracing::debug!(
                    pattern = %config.pattern,
                    error = %e,
                    "Filter pattern does not compile"
                );
                Pattern::Plain(config.pattern.clone())
            }
        };
        let replacement = match &config.replace {
            Some(ReplaceValue::Text(template)) => Replacement::Template(template.clone()),
            Some(ReplaceValue::Other(value)) => Replacement::Unsupported(value.to_string()),
            None => Replacement::Unsupported("missing".to_owned()),
        };
        Self {
            pattern,
            replacement,
        }
    }

    #[must_use]
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    #[must_use]
    pub fn replacement(&self) -> &Replacement {
        &self.replacement
    }

    /// The regex and replacement, or `None` if this filter is malformed.
    #[must_use]
    pub fn active(&self) -> Option<(&Regex, &Replacement)> {
        let regex = self.pattern.regex()?;
        self.replacement.is_usable().then_some((regex, &self.replacement))
    }
}

/// Build a filter descriptor.
pub fn make_filter(pattern: impl Into<Pattern>, replacement: impl Into<Replacement>) -> Filter {
    Filter::new(pattern, replacement)
}

/// Ordered sequence of filters.
#[derive(Clone, Debug, Default)]
pub struct FilterSet {
    filters: Vec<Filter>,
}

impl FilterSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters for every rule in `config`, in file order.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        config.filters.iter().map(Filter::from_config).collect()
    }

    /// Append a filter; it runs after all filters already in the set.
    pub fn push(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Filter> {
        self.filters.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl From<Filter> for FilterSet {
    fn from(filter: Filter) -> Self {
        Self {
            filters: vec![filter],
        }
    }
}

impl From<Vec<Filter>> for FilterSet {
    fn from(filters: Vec<Filter>) -> Self {
        Self { filters }
    }
}

impl FromIterator<Filter> for FilterSet {
    fn from_iter<I: IntoIterator<Item = Filter>>(iter: I) -> Self {
        Self {
            filters: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FilterSet {
    type Item = &'a Filter;
    type IntoIter = std::slice::Iter<'a, Filter>;

    fn into_iter(self) -> Self::IntoIter {
        self.filters.iter()
    }
}
