// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use entitlement::{AttrValue, ContentAttributes};
use serde::{Deserialize, Serialize};

use crate::filter::{FilterSpec, matches};

pub const DEFAULT_CDN: &str = "https://cdn.redhat.com";
const RELEASEVER: &str = "$releasever";

/// Flat, serializable view of one content entry
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ContentRecord {
    label: String,
    name: String,
    url: String,
    tags: Vec<String>,
    certificate: String,
}

impl ContentRecord {
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Certificate file the entry came from
    #[must_use]
    pub fn certificate(&self) -> &str {
        &self.certificate
    }
}

/// Builds `ContentRecord`s, prefixing URL fragments with the CDN origin
#[derive(Clone, Debug)]
pub struct Projector {
    cdn: String,
    releasever: Option<String>,
}

impl Default for Projector {
    fn default() -> Self {
        Self::new(DEFAULT_CDN)
    }
}

impl Projector {
    #[must_use]
    pub fn new(cdn: impl Into<String>) -> Self {
        Self {
            cdn: cdn.into(),
            releasever: None,
        }
    }

    /// Substitute `$releasever` in generated URLs
    #[must_use]
    pub fn with_releasever(self, releasever: Option<String>) -> Self {
        Self { releasever, ..self }
    }

    /// Plain concatenation, no slash or percent normalization
    #[must_use]
    pub fn url(&self, fragment: &str) -> String {
        let url = format!("{}{fragment}", self.cdn);
        match &self.releasever {
            Some(releasever) => url.replace(RELEASEVER, releasever),
            None => url,
        }
    }

    pub fn record<C: ContentAttributes + ?Sized>(&self, entry: &C, source: &str) -> ContentRecord {
        ContentRecord {
            label: text(entry.label()),
            name: text(entry.name()),
            url: self.url(&text(entry.url())),
            tags: list(entry.required_tags()),
            certificate: source.to_owned(),
        }
    }

    /// One record per matching entry, in input order
    pub fn project<'a, C, I>(
        &self,
        entries: I,
        filters: &FilterSpec,
        match_all: bool,
        source: &str,
    ) -> Vec<ContentRecord>
    where
        C: ContentAttributes + 'a,
        I: IntoIterator<Item = &'a C>,
    {
        entries
            .into_iter()
            .filter(|entry| matches(*entry, filters, match_all))
            .map(|entry| self.record(entry, source))
            .collect()
    }
}

/// Project with the default CDN origin
pub fn project<'a, C, I>(
    entries: I,
    filters: &FilterSpec,
    match_all: bool,
    source: &str,
) -> Vec<ContentRecord>
where
    C: ContentAttributes + 'a,
    I: IntoIterator<Item = &'a C>,
{
    Projector::default().project(entries, filters, match_all, source)
}

fn text(value: Option<AttrValue<'_>>) -> String {
    match value {
        Some(AttrValue::Single(s)) => s.to_owned(),
        Some(AttrValue::Many(values)) => values.join(","),
        None => String::new(),
    }
}

fn list(value: Option<AttrValue<'_>>) -> Vec<String> {
    match value {
        Some(AttrValue::Single(s)) => vec![s.to_owned()],
        Some(AttrValue::Many(values)) => values.to_vec(),
        None => Vec::new(),
    }
}
