// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use entitlement::{AttrValue, Attribute, ContentAttributes};
use globset::{GlobBuilder, GlobMatcher};
use strum::Display;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("invalid {key} pattern `{pattern}`: {source}")]
    InvalidPattern {
        key: FilterKey,
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// Filterable keys, named after the content attributes they inspect
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum FilterKey {
    Label,
    Name,
    Arches,
    RequiredTags,
    Isos,
    Debug,
    Source,
}

impl FilterKey {
    #[must_use]
    pub fn attribute(self) -> Attribute {
        match self {
            Self::Label | Self::Isos | Self::Debug | Self::Source => Attribute::Label,
            Self::Name => Attribute::Name,
            Self::Arches => Attribute::Arches,
            Self::RequiredTags => Attribute::RequiredTags,
        }
    }

    // Media variants are recognized by label fragments like
    // `rhel-8-for-x86_64-baseos-debug-rpms`
    fn media_marker(self) -> Option<&'static str> {
        match self {
            Self::Isos => Some("-iso"),
            Self::Debug => Some("-debug"),
            Self::Source => Some("-source"),
            _ => None,
        }
    }
}

/// Shell style wildcard pattern, anchored to the whole value.
///
/// Only `*`, `?` and `[...]` are wildcards. An unclosed `[` and braces are
/// literal characters.
#[derive(Clone, Debug)]
pub struct Pattern {
    matcher: GlobMatcher,
}

impl Pattern {
    /// # Errors
    /// Fails if `text` is not a valid glob, e.g. on a reversed range
    pub fn new(text: &str) -> Result<Self, globset::Error> {
        let matcher = GlobBuilder::new(&literal_braces(text))
            .literal_separator(false)
            .backslash_escape(false)
            .allow_unclosed_class(true)
            .build()?
            .compile_matcher();
        Ok(Self { matcher })
    }

    #[must_use]
    pub fn is_match(&self, value: &str) -> bool {
        self.matcher.is_match(value)
    }
}

// globset alternation syntax is escaped into single character classes;
// bracket expressions are copied untouched
fn literal_braces(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut glob = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    glob.extend(&chars[i..=end]);
                    i = end;
                }
                None => glob.push_str("[[]"),
            },
            c @ ('{' | '}' | ',') => {
                glob.push('[');
                glob.push(c);
                glob.push(']');
            }
            c => glob.push(c),
        }
        i += 1;
    }
    glob
}

/// Index of the `]` closing the class opened at `start`; a leading `!` or
/// `]` belongs to the class
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut first = start + 1;
    if chars.get(first) == Some(&'!') {
        first += 1;
    }
    if chars.get(first) == Some(&']') {
        first += 1;
    }
    chars
        .get(first..)?
        .iter()
        .position(|&c| c == ']')
        .map(|pos| first + pos)
}

#[derive(Clone, Debug)]
pub enum Criterion {
    Glob(Pattern),
    Contains(&'static str),
}

impl Criterion {
    fn test(&self, value: &str) -> bool {
        match self {
            Self::Glob(pattern) => pattern.is_match(value),
            Self::Contains(marker) => value.contains(marker),
        }
    }

    /// List values match if any element does
    #[must_use]
    pub fn evaluate(&self, value: AttrValue<'_>) -> bool {
        match value {
            AttrValue::Single(v) => self.test(v),
            AttrValue::Many(values) => values.iter().any(|v| self.test(v)),
        }
    }
}

/// Ordered set of filter criteria; a `None` criterion puts no constraint
#[derive(Clone, Debug, Default)]
pub struct FilterSpec {
    pairs: Vec<(FilterKey, Option<Criterion>)>,
}

impl FilterSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// Fails if `pattern` is not a valid glob
    pub fn with_glob(self, key: FilterKey, pattern: &str) -> Result<Self, FilterError> {
        let pattern = Pattern::new(pattern).map_err(|source| FilterError::InvalidPattern {
            key,
            pattern: pattern.to_owned(),
            source,
        })?;
        Ok(self.with(key, Some(Criterion::Glob(pattern))))
    }

    /// Media flag; a cleared flag (or a non-media key) is unconstrained
    #[must_use]
    pub fn with_flag(self, key: FilterKey, enabled: bool) -> Self {
        let criterion = key
            .media_marker()
            .filter(|_| enabled)
            .map(Criterion::Contains);
        self.with(key, criterion)
    }

    #[must_use]
    pub fn with(mut self, key: FilterKey, criterion: Option<Criterion>) -> Self {
        self.pairs.push((key, criterion));
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (FilterKey, Option<&Criterion>)> {
        self.pairs.iter().map(|(key, c)| (*key, c.as_ref()))
    }
}

/// Decide whether `entry` passes `spec`.
///
/// Unset criteria always pass. Criteria on attributes the entry does not
/// carry are skipped entirely. With `match_all` the first failing criterion
/// ends evaluation; otherwise any passing criterion is enough.
pub fn matches<C: ContentAttributes + ?Sized>(entry: &C, spec: &FilterSpec, match_all: bool) -> bool {
    if spec.is_empty() {
        return true;
    }
    let mut results = Vec::with_capacity(spec.len());
    for (key, criterion) in spec.pairs() {
        let Some(criterion) = criterion else {
            results.push(true);
            continue;
        };
        let Some(value) = entry.attribute(key.attribute()) else {
            continue;
        };
        let res = criterion.evaluate(value);
        if match_all && !res {
            return false;
        }
        results.push(res);
    }

    if match_all {
        results.iter().all(|r| *r)
    } else {
        results.iter().any(|r| *r)
    }
}
