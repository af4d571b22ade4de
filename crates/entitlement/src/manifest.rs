// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use std::fs::{self, File};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::EntitlementError;

pub const CONSUMER_EXPORT: &str = "consumer_export.zip";
pub const ENTITLEMENT_CERTIFICATES: &str = "export/entitlement_certificates/";

/// Manifests are recognized by their (lowercase) `.zip` extension
#[must_use]
pub fn is_manifest(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "zip")
}

/// Extract every entitlement certificate from a subscription manifest.
///
/// The manifest wraps a `consumer_export.zip` archive; each file directly
/// under `export/entitlement_certificates/` is written to `dest_dir` with its
/// original name. Paths are returned in archive order.
///
/// # Errors
/// Fails if either archive is unreadable, the nested export is missing,
/// or a certificate cannot be written
pub fn extract_certificates(
    manifest: &Path,
    dest_dir: &Path,
) -> Result<Vec<PathBuf>, EntitlementError> {
    let export = read_consumer_export(manifest)?;
    let mut archive = ZipArchive::new(Cursor::new(export))?;
    fs::create_dir_all(dest_dir).map_err(EntitlementError::io(dest_dir))?;

    let mut paths = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        let Some(file_name) = certificate_file_name(entry.name()).map(str::to_owned) else {
            continue;
        };
        let mut data = Vec::new();
        entry
            .read_to_end(&mut data)
            .map_err(EntitlementError::io(manifest))?;
        let target = dest_dir.join(&file_name);
        fs::write(&target, data).map_err(EntitlementError::io(&target))?;
        paths.push(target);
    }

    if paths.is_empty() {
        warn!("{} contains no entitlement certificates", manifest.display());
    } else {
        info!(
            "extracted {} certificates from {} into {}",
            paths.len(),
            manifest.display(),
            dest_dir.display()
        );
    }
    Ok(paths)
}

fn read_consumer_export(manifest: &Path) -> Result<Vec<u8>, EntitlementError> {
    let file = File::open(manifest).map_err(EntitlementError::io(manifest))?;
    let mut archive = ZipArchive::new(file)?;
    let mut export = archive.by_name(CONSUMER_EXPORT).map_err(|e| match e {
        ZipError::FileNotFound => EntitlementError::MissingEntry {
            archive: manifest.to_path_buf(),
            entry: CONSUMER_EXPORT.to_owned(),
        },
        e => e.into(),
    })?;
    let mut data = Vec::new();
    export
        .read_to_end(&mut data)
        .map_err(EntitlementError::io(manifest))?;
    Ok(data)
}

fn certificate_file_name(entry: &str) -> Option<&str> {
    entry
        .strip_prefix(ENTITLEMENT_CERTIFICATES)
        .filter(|name| !name.is_empty() && !name.contains('/'))
}
