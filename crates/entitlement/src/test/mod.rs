// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0


use std::io::{Cursor, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub use data::{V1_CERTIFICATE, V3_CERTIFICATE};

/// PEM document holding only an `ENTITLEMENT DATA` block for `payload`
pub fn entitlement_pem(payload: &serde_json::Value) -> String {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(payload.to_string().as_bytes())
        .unwrap();
    let encoded = STANDARD.encode(encoder.finish().unwrap());

    let mut pem = String::from("-----BEGIN ENTITLEMENT DATA-----\n");
    for line in encoded.as_bytes().chunks(64) {
        pem.push_str(std::str::from_utf8(line).unwrap());
        pem.push('\n');
    }
    pem.push_str("-----END ENTITLEMENT DATA-----\n");
    pem
}

pub fn zip_archive(entries: &[(&str, &[u8])]) -> anyhow::Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer.start_file(*name, SimpleFileOptions::default())?;
        writer.write_all(data)?;
    }
    Ok(writer.finish()?.into_inner())
}

/// Manifest layout: `consumer_export.zip` nested in the outer archive
pub fn manifest_zip(export_entries: &[(&str, &str)]) -> anyhow::Result<Vec<u8>> {
    let entries: Vec<(&str, &[u8])> = export_entries
        .iter()
        .map(|(name, data)| (*name, data.as_bytes()))
        .collect();
    let export = zip_archive(&entries)?;
    zip_archive(&[
        ("signature", b"0000".as_slice()),
        ("consumer_export.zip", export.as_slice()),
    ])
}
