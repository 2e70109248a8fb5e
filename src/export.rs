//! Export pipeline: a keystore entry to file bytes in the chosen format.

use crate::entry::KeystoreEntry;
use crate::error::{Error, Result};
use crate::password::PasswordInput;
use crate::store::{Keystore, StoreFormat};

/// The target formats an entry can be exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pem,
    Pkcs12,
    Jks,
    Der,
}

/// What to export and under which output password.
///
/// The password is typed twice; the copies must match exactly before any
/// output is produced. An empty pair means unprotected output, which PEM
/// renders as a plaintext key block and which a container export with a key
/// entry rejects.
pub struct ExportRequest {
    pub format: ExportFormat,
    pub include_key: bool,
    pub include_cert: bool,
    /// Export the whole chain rather than just the entity certificate.
    pub include_chain: bool,
    pub password: PasswordInput,
    pub verification: PasswordInput,
}

/// Checks that the output password matches its verification copy.
fn verified_password(password: &PasswordInput, verification: &PasswordInput) -> Result<String> {
    match (password.as_str(), verification.as_str()) {
        (Some(a), Some(b)) if a == b => Ok(a.to_string()),
        (Some(_), Some(_)) => Err(Error::PasswordMismatch),
        _ => Err(Error::Cancelled),
    }
}

/// Exports one entry per the request, returning the file bytes.
pub fn export_entry(entry: &KeystoreEntry, request: &ExportRequest) -> Result<Vec<u8>> {
    let password = verified_password(&request.password, &request.verification)?;
    if request.include_key && !matches!(entry, KeystoreEntry::PrivateKey { .. }) {
        return Err(Error::Validation("entry has no private key".into()));
    }

    match request.format {
        ExportFormat::Pem => export_pem(entry, request, &password),
        ExportFormat::Pkcs12 => export_container(StoreFormat::Pkcs12, entry, request, &password),
        ExportFormat::Jks => export_container(StoreFormat::Jks, entry, request, &password),
        ExportFormat::Der => export_der(entry, request),
    }
}

/// PEM output: the key block first (shrouded when the output password is
/// non-empty), then the certificates, entity certificate first.
fn export_pem(entry: &KeystoreEntry, request: &ExportRequest, password: &str) -> Result<Vec<u8>> {
    let mut output = String::new();

    if request.include_key {
        if let KeystoreEntry::PrivateKey { key, .. } = entry {
            let block = if password.is_empty() {
                pem::Pem::new("PRIVATE KEY", key.to_pkcs8_der()?)
            } else {
                pem::Pem::new(
                    "ENCRYPTED PRIVATE KEY",
                    key.to_encrypted_pkcs8_der(password)?,
                )
            };
            output.push_str(&pem::encode(&block));
        }
    }

    if request.include_cert {
        for certificate in selected_certificates(entry, request.include_chain) {
            output.push_str(&certificate.to_pem()?);
        }
    }

    if output.is_empty() {
        return Err(Error::Validation("nothing selected for export".into()));
    }
    Ok(output.into_bytes())
}

/// Container output: a fresh store holding the ancestors under synthetic
/// `issuerN` aliases, plus either the key entry with its chain or the entity
/// certificate under the entry's own alias.
fn export_container(
    format: StoreFormat,
    entry: &KeystoreEntry,
    request: &ExportRequest,
    password: &str,
) -> Result<Vec<u8>> {
    let mut store = Keystore::new(format);
    let certificates = selected_certificates(entry, request.include_key || request.include_chain);

    for (index, ancestor) in certificates.iter().enumerate().skip(1) {
        store.set_certificate_entry(&format!("issuer{index}"), (*ancestor).clone())?;
    }

    if request.include_key {
        if let KeystoreEntry::PrivateKey { alias, key, chain } = entry {
            store.set_key_entry(alias, key, password, chain.clone())?;
        }
    } else if let Some(leaf) = certificates.first() {
        store.set_certificate_entry(entry.alias(), (*leaf).clone())?;
    }

    store.store(password)
}

/// DER output: concatenated certificates only. Key material never leaves in
/// this format.
fn export_der(entry: &KeystoreEntry, request: &ExportRequest) -> Result<Vec<u8>> {
    if request.include_key {
        return Err(Error::Validation(
            "a private key cannot be exported as DER certificates".into(),
        ));
    }
    let certificates = selected_certificates(entry, request.include_chain);
    if certificates.is_empty() {
        return Err(Error::Validation("entry has no certificate".into()));
    }
    let mut output = Vec::new();
    for certificate in certificates {
        output.extend_from_slice(&certificate.to_der()?);
    }
    Ok(output)
}

fn selected_certificates(
    entry: &KeystoreEntry,
    include_chain: bool,
) -> Vec<&crate::cert::Certificate> {
    match entry {
        KeystoreEntry::PrivateKey { chain, .. } => {
            if include_chain {
                chain.iter().collect()
            } else {
                chain.iter().take(1).collect()
            }
        }
        KeystoreEntry::TrustedCertificate { certificate, .. } => vec![certificate],
    }
}
