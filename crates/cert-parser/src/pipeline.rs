// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use anyhow::{Context, bail};
use entitlement::{EntitlementCertificate, extract_certificates, is_manifest};
use tracing::debug;

use crate::filter::FilterSpec;
use crate::project::{ContentRecord, Projector};

/// Loads certificates (directly or out of manifests) and collects the
/// matching content of all of them, in input order
#[derive(Clone, Debug)]
pub struct Pipeline {
    filters: FilterSpec,
    match_all: bool,
    projector: Projector,
    certs_dir: PathBuf,
}

impl Pipeline {
    /// `certs_dir` receives certificates extracted from manifests
    #[must_use]
    pub fn new(filters: FilterSpec, match_all: bool, projector: Projector, certs_dir: PathBuf) -> Self {
        Self {
            filters,
            match_all,
            projector,
            certs_dir,
        }
    }

    /// Replace manifests by the certificates extracted from them
    ///
    /// # Errors
    /// Fails if a manifest cannot be extracted
    pub fn resolve(&self, inputs: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
        let mut certs = Vec::new();
        for input in inputs {
            if is_manifest(input) {
                let extracted = extract_certificates(input, &self.certs_dir)
                    .with_context(|| format!("while extracting {}", input.display()))?;
                certs.extend(extracted);
            } else {
                certs.push(input.clone());
            }
        }
        Ok(certs)
    }

    /// Nothing is returned unless every input loads
    ///
    /// # Errors
    /// Fails on a missing input or on any extraction or decoding failure
    pub fn run(&self, inputs: &[PathBuf]) -> anyhow::Result<Vec<ContentRecord>> {
        ensure_inputs_exist(inputs)?;

        let mut records = Vec::new();
        for path in self.resolve(inputs)? {
            let cert = EntitlementCertificate::from_file(&path)
                .with_context(|| format!("while loading {}", path.display()))?;
            if let Some(info) = cert.info() {
                debug!(
                    certificate = cert.source(),
                    serial = %info.serial,
                    version = info.version.as_deref().unwrap_or("1.0"),
                    valid_until = %info.not_after,
                    "loaded certificate"
                );
            }
            let matched =
                self.projector
                    .project(cert.content(), &self.filters, self.match_all, cert.source());
            debug!(
                certificate = cert.source(),
                total = cert.content().count(),
                matched = matched.len(),
                "projected content"
            );
            records.extend(matched);
        }
        Ok(records)
    }
}

/// # Errors
/// Names the first input that does not exist
pub fn ensure_inputs_exist(inputs: &[PathBuf]) -> anyhow::Result<()> {
    if let Some(missing) = inputs.iter().find(|p| !p.exists()) {
        bail!("No such file: {}. Please check and try again", missing.display());
    }
    Ok(())
}
