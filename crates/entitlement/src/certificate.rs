// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use flate2::read::ZlibDecoder;
use serde::Deserialize;
use tracing::debug;
use x509_parser::error::X509Error;
use x509_parser::pem::Pem;
use x509_parser::prelude::*;

use crate::content::{Content, Product};
use crate::error::EntitlementError;

const PEM_CERTIFICATE: &str = "CERTIFICATE";
const PEM_ENTITLEMENT_DATA: &str = "ENTITLEMENT DATA";

// Red Hat OID namespace
const ENTITLEMENT_VERSION_OID: &str = "1.3.6.1.4.1.2312.9.6";
const CONTENT_OID_PREFIX: &str = "1.3.6.1.4.1.2312.9.2.";

// UTF8String, PrintableString, IA5String, OCTET STRING
const DER_STRING_TAGS: [u8; 4] = [0x0c, 0x13, 0x16, 0x04];

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CertificateInfo {
    pub serial: String,
    pub subject: String,
    pub not_before: String,
    pub not_after: String,
    pub version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Subscription {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    sku: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EntitlementPayload {
    #[serde(default)]
    consumer: Option<String>,
    #[serde(default)]
    subscription: Option<Subscription>,
    #[serde(default)]
    products: Vec<Product>,
}

/// Decoded entitlement certificate, holding the content it grants
#[derive(Clone, Debug)]
pub struct EntitlementCertificate {
    source: String,
    info: Option<CertificateInfo>,
    products: Vec<Product>,
}

impl EntitlementCertificate {
    /// Read a certificate file; the file name becomes the certificate source.
    ///
    /// # Errors
    /// Fails if the file cannot be read or decoded
    pub fn from_file(path: &Path) -> Result<Self, EntitlementError> {
        let data = std::fs::read(path).map_err(EntitlementError::io(path))?;
        let source = path.file_name().map_or_else(
            || path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        );
        Self::from_pem(&data, source)
    }

    /// Decode PEM encoded certificate data.
    ///
    /// Version 3 certificates carry their content in an `ENTITLEMENT DATA`
    /// block, older ones in X.509 extensions of the certificate itself.
    ///
    /// # Errors
    /// Fails on malformed PEM, X.509 or payload, or if no content is found
    pub fn from_pem(data: &[u8], source: impl Into<String>) -> Result<Self, EntitlementError> {
        let source = source.into();
        let mut info = None;
        let mut extensions = Vec::new();
        let mut payload = None;

        for pem in Pem::iter_from_buffer(data) {
            let pem = pem?;
            match pem.label.as_str() {
                PEM_CERTIFICATE => {
                    let (cert_info, content_exts) = parse_certificate(&pem.contents)?;
                    info = Some(cert_info);
                    extensions = content_exts;
                }
                PEM_ENTITLEMENT_DATA => payload = Some(decode_payload(&pem.contents)?),
                other => debug!("{source}: skipping PEM block {other}"),
            }
        }

        let products = match payload {
            Some(payload) => {
                debug!(
                    certificate = %source,
                    consumer = payload.consumer.as_deref().unwrap_or("-"),
                    subscription = payload
                        .subscription
                        .as_ref()
                        .and_then(|s| s.name.as_deref().or(s.sku.as_deref()))
                        .unwrap_or("-"),
                    "decoded entitlement data"
                );
                payload.products
            }
            None if !extensions.is_empty() => {
                let content = content_from_extensions(
                    extensions.iter().map(|(oid, value)| (oid.as_str(), value.as_slice())),
                )?;
                vec![Product {
                    content,
                    ..Product::default()
                }]
            }
            None => return Err(EntitlementError::NoContent),
        };

        Ok(Self {
            source,
            info,
            products,
        })
    }

    /// Name of the file (or other origin) the certificate was read from
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn info(&self) -> Option<&CertificateInfo> {
        self.info.as_ref()
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// All content entries of all products, in certificate order
    pub fn content(&self) -> impl Iterator<Item = &Content> {
        self.products.iter().flat_map(|p| p.content.iter())
    }
}

type RawExtension = (String, Vec<u8>);

fn parse_certificate(der: &[u8]) -> Result<(CertificateInfo, Vec<RawExtension>), X509Error> {
    let (_, x509) = parse_x509_certificate(der)?;
    let mut info = CertificateInfo {
        serial: x509.tbs_certificate.raw_serial_as_string(),
        subject: x509.subject().to_string(),
        not_before: x509.validity().not_before.to_string(),
        not_after: x509.validity().not_after.to_string(),
        version: None,
    };
    let mut content = Vec::new();
    for ext in x509.extensions() {
        let oid = ext.oid.to_id_string();
        if oid == ENTITLEMENT_VERSION_OID {
            info.version = der_string(ext.value).ok();
        } else if oid.starts_with(CONTENT_OID_PREFIX) {
            content.push((oid, ext.value.to_vec()));
        }
    }
    debug!(serial = %info.serial, subject = %info.subject, "parsed certificate");
    Ok((info, content))
}

fn decode_payload(compressed: &[u8]) -> Result<EntitlementPayload, EntitlementError> {
    let mut json = Vec::new();
    ZlibDecoder::new(compressed)
        .read_to_end(&mut json)
        .map_err(EntitlementError::Payload)?;
    Ok(serde_json::from_slice(&json)?)
}

/// Build content from version 1 extensions `<prefix>.<id>.<type>.<field>`
fn content_from_extensions<'a, I>(extensions: I) -> Result<Vec<Content>, EntitlementError>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut groups: Vec<(String, BTreeMap<u32, String>)> = Vec::new();
    for (oid, value) in extensions {
        let Some(rest) = oid.strip_prefix(CONTENT_OID_PREFIX) else {
            continue;
        };
        let parts: Vec<&str> = rest.split('.').collect();
        let [id, kind, field] = parts.as_slice() else {
            continue;
        };
        let invalid = |reason: &'static str| EntitlementError::Extension {
            oid: oid.to_owned(),
            reason,
        };
        let field: u32 = field.parse().map_err(|_| invalid("non-numeric field"))?;
        let value = der_string(value).map_err(invalid)?;
        let key = format!("{id}.{kind}");
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, fields)) => {
                fields.insert(field, value);
            }
            None => groups.push((key, BTreeMap::from([(field, value)]))),
        }
    }

    groups
        .into_iter()
        .map(|(key, mut fields)| {
            let missing = |reason: &'static str| EntitlementError::Extension {
                oid: format!("{CONTENT_OID_PREFIX}{key}"),
                reason,
            };
            let content_type = match key.rsplit('.').next() {
                Some("1") => Some("yum".to_owned()),
                Some("2") => Some("file".to_owned()),
                Some("3") => Some("kickstart".to_owned()),
                _ => None,
            };
            Ok(Content {
                id: key.split('.').next().map(str::to_owned),
                content_type,
                name: fields.remove(&1).ok_or_else(|| missing("missing name"))?,
                label: fields.remove(&2).ok_or_else(|| missing("missing label"))?,
                vendor: fields.remove(&5),
                url: fields.remove(&6),
                gpg_url: fields.remove(&7),
                enabled: fields.remove(&8).map(|v| v == "1" || v == "true"),
                metadata_expire: fields.remove(&9),
                required_tags: fields
                    .remove(&10)
                    .map(|tags| {
                        tags.split(',')
                            .map(str::trim)
                            .filter(|t| !t.is_empty())
                            .map(str::to_owned)
                            .collect()
                    })
                    .unwrap_or_default(),
                arches: Vec::new(),
            })
        })
        .collect()
}

/// Extension values are DER strings; anything else is taken as raw text
fn der_string(raw: &[u8]) -> Result<String, &'static str> {
    let body = match raw {
        [tag, rest @ ..] if DER_STRING_TAGS.contains(tag) => der_body(rest)?,
        _ => raw,
    };
    String::from_utf8(body.to_vec()).map_err(|_| "value is not UTF-8")
}

fn der_body(rest: &[u8]) -> Result<&[u8], &'static str> {
    let (len, body) = match rest {
        [len @ 0..=0x7f, body @ ..] => (usize::from(*len), body),
        [0x81, len, body @ ..] => (usize::from(*len), body),
        [0x82, hi, lo, body @ ..] => ((usize::from(*hi) << 8) | usize::from(*lo), body),
        _ => return Err("unsupported DER length"),
    };
    body.get(..len).ok_or("truncated DER value")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{V1_CERTIFICATE, V3_CERTIFICATE, entitlement_pem};
    use serde_json::json;

    #[test]
    fn decode_v3_entitlement_data() -> anyhow::Result<()> {
        let pem = entitlement_pem(&json!({
            "consumer": "7d5f1c1e",
            "subscription": {"sku": "RH00003", "name": "Red Hat Enterprise Linux Server"},
            "products": [
                {
                    "id": "479",
                    "name": "Red Hat Enterprise Linux for x86_64",
                    "content": [
                        {"type": "yum", "label": "rhel-8-for-x86_64-baseos-rpms",
                         "name": "Red Hat Enterprise Linux 8 for x86_64 - BaseOS (RPMs)",
                         "path": "/content/dist/rhel8/$releasever/x86_64/baseos/os",
                         "required_tags": ["rhel-8-x86_64"], "arches": ["x86_64"]},
                        {"type": "yum", "label": "rhel-8-for-x86_64-baseos-debug-rpms",
                         "name": "Red Hat Enterprise Linux 8 for x86_64 - BaseOS (Debug RPMs)",
                         "path": "/content/dist/rhel8/$releasever/x86_64/baseos/debug"}
                    ]
                },
                {"id": 69, "name": "Empty product"}
            ]
        }));
        let cert = EntitlementCertificate::from_pem(pem.as_bytes(), "1234.pem")?;
        assert_eq!(cert.source(), "1234.pem");
        assert!(cert.info().is_none());
        assert_eq!(cert.products().len(), 2);
        assert_eq!(cert.products()[1].id.as_deref(), Some("69"));

        let labels: Vec<&str> = cert.content().map(|c| c.label.as_str()).collect();
        assert_eq!(
            labels,
            [
                "rhel-8-for-x86_64-baseos-rpms",
                "rhel-8-for-x86_64-baseos-debug-rpms"
            ]
        );
        let debug = cert.content().nth(1).unwrap();
        assert!(debug.required_tags.is_empty());
        Ok(())
    }

    #[test]
    fn v1_certificate() -> anyhow::Result<()> {
        let cert = EntitlementCertificate::from_pem(V1_CERTIFICATE.as_bytes(), "4711.pem")?;
        let info = cert.info().expect("certificate block");
        assert_eq!(info.serial, "1f:2e:3d:4c");
        assert_eq!(info.subject, "CN=8a85f98c6267d2d9016284ecfa2c1ea2");
        assert!(info.not_after.contains("2036"));
        assert_eq!(info.version.as_deref(), Some("1.0"));

        let content: Vec<&Content> = cert.content().collect();
        assert_eq!(content.len(), 2);
        let server = content[0];
        assert_eq!(server.id.as_deref(), Some("4711"));
        assert_eq!(server.label, "rhel-6-server-rpms");
        assert_eq!(server.name, "Red Hat Enterprise Linux 6 Server (RPMs)");
        assert_eq!(server.vendor.as_deref(), Some("Red Hat"));
        assert_eq!(
            server.url.as_deref(),
            Some("/content/dist/rhel/server/6/$releasever/x86_64/os")
        );
        assert_eq!(server.enabled, Some(true));
        assert_eq!(server.required_tags, ["rhel-6", "rhel-6-server"]);

        let debug = content[1];
        assert_eq!(debug.label, "rhel-6-server-debug-rpms");
        assert_eq!(debug.content_type.as_deref(), Some("yum"));
        assert_eq!(debug.required_tags, ["rhel-6"]);
        Ok(())
    }

    #[test]
    fn entitlement_data_wins_over_extensions() -> anyhow::Result<()> {
        let cert = EntitlementCertificate::from_pem(V3_CERTIFICATE.as_bytes(), "4713.pem")?;
        let info = cert.info().expect("certificate block");
        assert_eq!(info.serial, "1f:2e:3d:4c");

        assert_eq!(cert.products().len(), 1);
        assert_eq!(cert.products()[0].name.as_deref(), Some("Red Hat Enterprise Linux Server"));
        let labels: Vec<&str> = cert.content().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["rhel-6-server-optional-rpms"]);
        Ok(())
    }

    #[test]
    fn certificate_from_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("4711.pem");
        std::fs::write(&path, V1_CERTIFICATE)?;
        let cert = EntitlementCertificate::from_file(&path)?;
        assert_eq!(cert.source(), "4711.pem");
        assert_eq!(cert.content().count(), 2);
        Ok(())
    }

    #[test]
    fn unknown_blocks_are_skipped() -> anyhow::Result<()> {
        let mut pem = String::from("-----BEGIN RSA SIGNATURE-----\nAAAA\n-----END RSA SIGNATURE-----\n");
        pem.push_str(&entitlement_pem(&json!({"products": []})));
        let cert = EntitlementCertificate::from_pem(pem.as_bytes(), "sig.pem")?;
        assert_eq!(cert.content().count(), 0);
        Ok(())
    }

    #[test]
    fn missing_content_is_an_error() {
        let res = EntitlementCertificate::from_pem(b"not a certificate at all\n", "junk.pem");
        assert!(matches!(res, Err(EntitlementError::NoContent)));
    }

    #[test]
    fn corrupt_payload_is_an_error() {
        let pem = "-----BEGIN ENTITLEMENT DATA-----\nAAECAwQF\n-----END ENTITLEMENT DATA-----\n";
        let res = EntitlementCertificate::from_pem(pem.as_bytes(), "bad.pem");
        assert!(matches!(res, Err(EntitlementError::Payload(_))));
    }

    #[test]
    fn from_file_reports_path() {
        let err = EntitlementCertificate::from_file(Path::new("/nonexistent/42.pem")).unwrap_err();
        assert!(format!("{err}").starts_with("cannot access /nonexistent/42.pem"));
    }

    #[test]
    fn der_strings() {
        assert_eq!(der_string(b"\x0c\x03yum"), Ok("yum".to_owned()));
        assert_eq!(der_string(b"plain"), Ok("plain".to_owned()));
        assert_eq!(der_string(b"\x0c\x05yum"), Err("truncated DER value"));

        let mut long = vec![0x0c, 0x81, 200];
        long.extend(std::iter::repeat_n(b'a', 200));
        assert_eq!(der_string(&long).map(|s| s.len()), Ok(200));
    }

    #[test]
    fn v1_content_extensions() -> anyhow::Result<()> {
        let exts: Vec<(String, Vec<u8>)> = vec![
            ("1.3.6.1.4.1.2312.9.2.4711.1".into(), b"\x0c\x03yum".to_vec()),
            ("1.3.6.1.4.1.2312.9.2.4711.1.1".into(), b"\x0c\x0bRHEL Server".to_vec()),
            ("1.3.6.1.4.1.2312.9.2.4711.1.2".into(), b"\x0c\x0brhel-server".to_vec()),
            ("1.3.6.1.4.1.2312.9.2.4711.1.6".into(), b"/content/dist/rhel/server".to_vec()),
            ("1.3.6.1.4.1.2312.9.2.4711.1.8".into(), b"\x0c\x011".to_vec()),
            ("1.3.6.1.4.1.2312.9.2.4711.1.10".into(), b"rhel-6, rhel-6-server".to_vec()),
            ("1.3.6.1.4.1.2312.9.2.815.2.1".into(), b"Files".to_vec()),
            ("1.3.6.1.4.1.2312.9.2.815.2.2".into(), b"files-label".to_vec()),
        ];
        let content =
            content_from_extensions(exts.iter().map(|(o, v)| (o.as_str(), v.as_slice())))?;
        assert_eq!(content.len(), 2);

        let server = &content[0];
        assert_eq!(server.id.as_deref(), Some("4711"));
        assert_eq!(server.content_type.as_deref(), Some("yum"));
        assert_eq!(server.name, "RHEL Server");
        assert_eq!(server.label, "rhel-server");
        assert_eq!(server.url.as_deref(), Some("/content/dist/rhel/server"));
        assert_eq!(server.enabled, Some(true));
        assert_eq!(server.required_tags, ["rhel-6", "rhel-6-server"]);

        assert_eq!(content[1].content_type.as_deref(), Some("file"));
        assert_eq!(content[1].label, "files-label");
        Ok(())
    }

    #[test]
    fn v1_content_without_label() {
        let exts = [("1.3.6.1.4.1.2312.9.2.1.1.1", b"name".as_slice())];
        let err = content_from_extensions(exts).unwrap_err();
        assert_eq!(
            format!("{err}"),
            "invalid content extension 1.3.6.1.4.1.2312.9.2.1.1: missing label"
        );
    }
}
