// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use thiserror::Error;
use x509_parser::error::{PEMError, X509Error};

#[derive(Error, Debug)]
pub enum EntitlementError {
    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed PEM data: {0}")]
    Pem(#[from] PEMError),

    #[error("malformed X.509 certificate: {0}")]
    X509(#[from] X509Error),

    #[error("cannot decompress entitlement data: {0}")]
    Payload(#[source] std::io::Error),

    #[error("cannot decode entitlement data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed manifest archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("{} has no {entry} entry", archive.display())]
    MissingEntry { archive: PathBuf, entry: String },

    #[error("certificate carries neither entitlement data nor content extensions")]
    NoContent,

    #[error("invalid content extension {oid}: {reason}")]
    Extension { oid: String, reason: &'static str },
}

impl EntitlementError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
