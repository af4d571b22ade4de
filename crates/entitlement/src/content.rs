// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Content attributes that filters may refer to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Attribute {
    Label,
    Name,
    Url,
    RequiredTags,
    Arches,
}

/// Value of a single content attribute, either scalar or list-valued
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttrValue<'a> {
    Single(&'a str),
    Many(&'a [String]),
}

/// Read-only view of a content entry (repository grant).
///
/// Every accessor returns `None` when the certificate does not carry the
/// attribute, which is distinct from an empty list.
pub trait ContentAttributes {
    fn label(&self) -> Option<AttrValue<'_>>;
    fn name(&self) -> Option<AttrValue<'_>>;
    fn url(&self) -> Option<AttrValue<'_>>;
    fn required_tags(&self) -> Option<AttrValue<'_>>;
    fn arches(&self) -> Option<AttrValue<'_>>;

    fn attribute(&self, attr: Attribute) -> Option<AttrValue<'_>> {
        match attr {
            Attribute::Label => self.label(),
            Attribute::Name => self.name(),
            Attribute::Url => self.url(),
            Attribute::RequiredTags => self.required_tags(),
            Attribute::Arches => self.arches(),
        }
    }
}

// Field names match the `content` objects of the v3 entitlement payload
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Content {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub content_type: Option<String>,
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(rename = "path", default)]
    pub url: Option<String>,
    #[serde(default)]
    pub gpg_url: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub metadata_expire: Option<String>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub required_tags: Vec<String>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub arches: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Product {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub content: Vec<Content>,
}

impl ContentAttributes for Content {
    fn label(&self) -> Option<AttrValue<'_>> {
        Some(AttrValue::Single(&self.label))
    }

    fn name(&self) -> Option<AttrValue<'_>> {
        Some(AttrValue::Single(&self.name))
    }

    fn url(&self) -> Option<AttrValue<'_>> {
        self.url.as_deref().map(AttrValue::Single)
    }

    fn required_tags(&self) -> Option<AttrValue<'_>> {
        Some(AttrValue::Many(&self.required_tags))
    }

    fn arches(&self) -> Option<AttrValue<'_>> {
        Some(AttrValue::Many(&self.arches))
    }
}

// Candlepin emits ids and expiry both as strings and as numbers
fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn nullable_list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(d)?.unwrap_or_default())
}
