// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

pub mod certificate;
pub mod content;
pub mod error;
pub mod manifest;

#[cfg(test)]
pub(crate) mod test;

pub use certificate::{CertificateInfo, EntitlementCertificate};
pub use content::{AttrValue, Attribute, Content, ContentAttributes, Product};
pub use error::EntitlementError;
pub use manifest::{extract_certificates, is_manifest};
