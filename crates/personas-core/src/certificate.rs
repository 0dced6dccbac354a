//! Default self-signed certificate lookup and export-bundle decoding.
//!
//! A node joining a deployment must have its self-signed server certificate
//! trusted by the primary first. The certificate is found by its friendly
//! name, exported as a ZIP bundle, and the PEM entry inside is stored by the
//! appliance in rune-reversed order, which [`decode_utf8`] undoes.

use std::io::{Cursor, Read};

use personas_api::models::SystemCertificate;
use serde::Serialize;
use thiserror::Error;

/// Friendly name of a node's default self-signed server certificate.
/// Matched exactly and case-sensitively.
pub const DEFAULT_CERTIFICATE_FRIENDLY_NAME: &str = "Default self-signed server certificate";

/// The only entry the export bundle is expected to carry.
pub const EXPORT_ENTRY_NAME: &str = "Defaultselfsignedservercerti.pem";

/// Outcome of importing a node's certificate into the primary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CertificateImport {
    /// The certificate was exported and imported into the primary's
    /// trusted store under `trusted_name`.
    Imported {
        certificate_id: String,
        trusted_name: String,
    },
    /// The node has no default self-signed certificate; nothing was
    /// exported or imported.
    CertificateNotFound,
}

/// Why an export bundle could not be turned into PEM text.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("not a readable ZIP archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("archive has no 'Defaultselfsignedservercerti.pem' entry (entries: {entries})")]
    MissingEntry { entries: String },

    #[error("failed to read the PEM entry: {0}")]
    Read(#[from] std::io::Error),

    #[error("the PEM entry is empty")]
    Empty,
}

/// Id of the default self-signed certificate in a node's certificate list.
pub fn find_default_certificate_id(certificates: &[SystemCertificate]) -> Option<&str> {
    certificates
        .iter()
        .find(|cert| cert.friendly_name.as_deref() == Some(DEFAULT_CERTIFICATE_FRIENDLY_NAME))
        .map(|cert| cert.id.as_str())
}

/// Name the imported certificate gets in the primary's trusted store.
pub fn trusted_certificate_name(hostname: &str) -> String {
    format!("{hostname}-self-signed")
}

/// Read the PEM entry out of an in-memory export bundle.
pub fn extract_pem(bundle: &[u8]) -> Result<Vec<u8>, BundleError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bundle))?;
    let entries = archive
        .file_names()
        .map(String::from)
        .collect::<Vec<_>>()
        .join(", ");

    let mut entry = match archive.by_name(EXPORT_ENTRY_NAME) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(BundleError::MissingEntry { entries });
        }
        Err(e) => return Err(e.into()),
    };

    let mut pem = Vec::new();
    entry.read_to_end(&mut pem)?;
    if pem.is_empty() {
        return Err(BundleError::Empty);
    }
    Ok(pem)
}

/// Reverse a UTF-8 byte sequence rune by rune.
///
/// Repeatedly strips the last rune off the input and appends it to the
/// output. Bytes that do not end a valid UTF-8 sequence decode as U+FFFD
/// one byte at a time. For valid UTF-8 input, applying this twice yields
/// the original text.
pub fn decode_utf8(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut rest = bytes;
    while !rest.is_empty() {
        let (ch, size) = decode_last_rune(rest);
        out.push(ch);
        rest = rest.split_at(rest.len() - size).0;
    }
    out
}

/// Decode the rune that ends `bytes`, returning it and its encoded width.
fn decode_last_rune(bytes: &[u8]) -> (char, usize) {
    for size in 1..=bytes.len().min(4) {
        let tail = bytes.split_at(bytes.len() - size).1;
        if let Ok(text) = std::str::from_utf8(tail) {
            let mut chars = text.chars();
            if let (Some(ch), None) = (chars.next(), chars.next()) {
                return (ch, size);
            }
        }
    }
    (char::REPLACEMENT_CHARACTER, 1)
}
