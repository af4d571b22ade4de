// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::project::ContentRecord;

// Trailing "(RPMs)", "(Debug RPMs)", "(Source ISOs)" and singular forms
static MEDIA_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*\(\s*(?:(?:Debug|Source)\s*)?(?:RPM|ISO)s?\s*\)\s*$").expect("Invalid regex")
});

#[must_use]
pub fn strip_media_suffix(name: &str) -> &str {
    MEDIA_SUFFIX
        .find(name)
        .map_or(name, |suffix| &name[..suffix.start()])
}

#[must_use]
pub fn distinct_tags(records: &[ContentRecord]) -> BTreeSet<String> {
    records
        .iter()
        .flat_map(|r| r.tags().iter().cloned())
        .collect()
}

/// Product names with the media descriptor removed, so the RPM, debug and
/// source variants of one product collapse into a single name
#[must_use]
pub fn distinct_product_names(records: &[ContentRecord]) -> BTreeSet<String> {
    records
        .iter()
        .map(|r| strip_media_suffix(r.name()).to_owned())
        .collect()
}
