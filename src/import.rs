//! Import pipeline: file bytes to reviewed keystore entries.
//!
//! Parsing is driven entirely by the format the user picked; nothing sniffs
//! file contents. A parse failure aborts the import before the destination
//! container is touched.

use crate::cert::Certificate;
use crate::entry::KeystoreEntry;
use crate::error::{Error, Result};
use crate::key::KeyPair;
use crate::password::{PasswordInput, PasswordPrompt};
use crate::store::{Keystore, StoreFormat};

/// Alias given to an imported key entry when the destination container does
/// not already know its certificate.
pub const DEFAULT_KEY_ALIAS: &str = "New key";

/// Lines tolerated in front of the first PEM block (mail headers, humans).
const MAX_LEADING_GARBAGE_LINES: usize = 9;

/// The source formats an import can read. Picked explicitly by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Pem,
    Pkcs12,
    Jks,
    DerCertificates,
}

/// Everything a source file yielded: at most one private key, and the
/// certificates in the order the source presented them.
pub struct ImportedMaterial {
    pub key: Option<KeyPair>,
    pub certificates: Vec<Certificate>,
}

/// Reads an import source.
///
/// `label` names the source in password prompts, typically the file name.
/// Container formats prompt once for the container password; a cancelled
/// prompt aborts with [`Error::Cancelled`]. A PEM source prompts per
/// encrypted key block, and cancelling there merely skips the key.
pub fn read_source(
    format: ImportFormat,
    bytes: &[u8],
    label: &str,
    prompt: &mut dyn PasswordPrompt,
) -> Result<ImportedMaterial> {
    match format {
        ImportFormat::Pem => read_pem(bytes, label, prompt),
        ImportFormat::Pkcs12 => read_container(StoreFormat::Pkcs12, bytes, label, prompt),
        ImportFormat::Jks => read_container(StoreFormat::Jks, bytes, label, prompt),
        ImportFormat::DerCertificates => Ok(ImportedMaterial {
            key: None,
            certificates: Certificate::decode_all(bytes)?,
        }),
    }
}

fn read_pem(bytes: &[u8], label: &str, prompt: &mut dyn PasswordPrompt) -> Result<ImportedMaterial> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| Error::Import("not a text file".to_string()))?;

    let mut leading = 0usize;
    let mut start = None;
    for (offset, line) in line_offsets(text) {
        if line.trim_start().starts_with("-----BEGIN ") {
            start = Some(offset);
            break;
        }
        if !line.trim().is_empty() {
            leading += 1;
            if leading > MAX_LEADING_GARBAGE_LINES {
                break;
            }
        }
    }
    let start = start.ok_or_else(|| Error::Import("no PEM data found".to_string()))?;

    let blocks = pem::parse_many(&text[start..])?;
    let mut key = None;
    let mut certificates = Vec::new();
    for block in &blocks {
        match block.tag() {
            "CERTIFICATE" => certificates.push(Certificate::from_der(block.contents())?),
            "PRIVATE KEY" if key.is_none() => {
                key = Some(KeyPair::from_pkcs8_der(block.contents())?);
            }
            "ENCRYPTED PRIVATE KEY" if key.is_none() => {
                match prompt.request(label) {
                    PasswordInput::Cancelled => {}
                    input => {
                        let password = input.as_str().unwrap_or_default();
                        key = Some(KeyPair::from_encrypted_pkcs8_der(block.contents(), password)?);
                    }
                }
            }
            "RSA PRIVATE KEY" if key.is_none() => {
                key = Some(KeyPair::from_pkcs1_der(block.contents())?);
            }
            "EC PRIVATE KEY" if key.is_none() => {
                key = Some(KeyPair::from_sec1_der(block.contents())?);
            }
            _ => {}
        }
    }
    if key.is_none() && certificates.is_empty() {
        return Err(Error::Import("no usable PEM blocks found".to_string()));
    }
    Ok(ImportedMaterial { key, certificates })
}

fn line_offsets(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split_inclusive('\n').scan(0usize, |offset, line| {
        let start = *offset;
        *offset += line.len();
        Some((start, line))
    })
}

fn read_container(
    format: StoreFormat,
    bytes: &[u8],
    label: &str,
    prompt: &mut dyn PasswordPrompt,
) -> Result<ImportedMaterial> {
    let input = prompt.request(label);
    let password = input.as_str().ok_or(Error::Cancelled)?;
    let store = Keystore::load(format, bytes, password)?;

    let mut key = None;
    let mut certificates = Vec::new();
    for alias in store.aliases() {
        if store.is_key_entry(&alias) {
            // With several key entries the last one wins.
            key = Some(store.key(&alias, password)?);
            if let Some(chain) = store.certificate_chain(&alias) {
                certificates.extend(chain.iter().cloned());
            }
        } else if let Some(certificate) = store.certificate(&alias) {
            certificates.push(certificate);
        }
    }
    Ok(ImportedMaterial { key, certificates })
}

/// Turns imported material into the entries an import would create in
/// `destination`, without touching it.
///
/// With a key: the certificate certifying the key becomes the entity
/// certificate of a key entry whose chain is rebuilt by issuer/subject name
/// matching, stopping at a self-signed root or the first gap. Every
/// certificate outside that chain, and any certificate when there is no key,
/// becomes a trusted-certificate entry unless the destination already holds
/// the exact same certificate.
pub fn plan_entries(
    material: &ImportedMaterial,
    destination: &Keystore,
) -> Result<Vec<KeystoreEntry>> {
    let mut planned = Vec::new();
    let mut chain: Vec<Certificate> = Vec::new();

    if let Some(key) = &material.key {
        let public = key.public_key();
        let leaf = material
            .certificates
            .iter()
            .find(|certificate| {
                certificate
                    .public_key()
                    .map(|candidate| candidate == public)
                    .unwrap_or(false)
            })
            .ok_or_else(|| {
                Error::Import("no certificate in the source matches the key".to_string())
            })?;

        chain.push(leaf.clone());
        loop {
            let current = chain.last().filter(|c| !c.is_self_signed());
            let Some(current) = current else { break };
            let issuer_name = current.issuer_der()?;
            let parent = material.certificates.iter().find(|&candidate| {
                candidate
                    .subject_der()
                    .map(|name| name == issuer_name)
                    .unwrap_or(false)
                    && !chain.contains(candidate)
            });
            match parent {
                Some(parent) => chain.push(parent.clone()),
                None => break,
            }
        }

        let alias = destination
            .certificate_alias(leaf)
            .unwrap_or_else(|| DEFAULT_KEY_ALIAS.to_string());
        planned.push(KeystoreEntry::PrivateKey {
            alias,
            key: key.clone(),
            chain: chain.clone(),
        });
    }

    for certificate in &material.certificates {
        if chain.contains(certificate) {
            continue;
        }
        if destination.certificate_alias(certificate).is_some() {
            continue;
        }
        let already_planned = planned
            .iter()
            .any(|entry| entry.certificate() == Some(certificate));
        if already_planned {
            continue;
        }
        planned.push(KeystoreEntry::TrustedCertificate {
            alias: certificate.subject(),
            certificate: certificate.clone(),
        });
    }

    Ok(planned)
}

/// The two pages of the import flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardPage {
    SourceSelection,
    Review,
}

/// The import flow as a two-page state machine.
///
/// Page one selects the source; moving forward parses it and plans the
/// entries. Page two reviews and renames the planned entries before they are
/// committed. Going back keeps the selected source but drops nothing until
/// the next forward transition re-parses it.
pub struct ImportWizard {
    page: WizardPage,
    source: Option<Source>,
    planned: Vec<KeystoreEntry>,
}

struct Source {
    format: ImportFormat,
    bytes: Vec<u8>,
    label: String,
}

impl ImportWizard {
    pub fn new() -> Self {
        ImportWizard {
            page: WizardPage::SourceSelection,
            source: None,
            planned: Vec::new(),
        }
    }

    pub fn page(&self) -> WizardPage {
        self.page
    }

    /// Selects the source to import. Only valid on the source page.
    pub fn select_source(
        &mut self,
        format: ImportFormat,
        bytes: Vec<u8>,
        label: impl Into<String>,
    ) -> Result<()> {
        if self.page != WizardPage::SourceSelection {
            return Err(Error::Validation("source already selected".into()));
        }
        self.source = Some(Source {
            format,
            bytes,
            label: label.into(),
        });
        Ok(())
    }

    /// Moves from source selection to review, parsing the source and planning
    /// entries against `destination`. Failures keep the wizard on the source
    /// page.
    pub fn advance(
        &mut self,
        destination: &Keystore,
        prompt: &mut dyn PasswordPrompt,
    ) -> Result<()> {
        if self.page != WizardPage::SourceSelection {
            return Err(Error::Validation("already on the review page".into()));
        }
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| Error::Validation("no source selected".into()))?;
        let material = read_source(source.format, &source.bytes, &source.label, prompt)?;
        let planned = plan_entries(&material, destination)?;
        if planned.is_empty() {
            return Err(Error::Import("nothing new to import".to_string()));
        }
        self.planned = planned;
        self.page = WizardPage::Review;
        Ok(())
    }

    /// Returns to the source page. The planned entries stay visible until the
    /// next forward transition replaces them.
    pub fn back(&mut self) {
        self.page = WizardPage::SourceSelection;
    }

    /// The planned entries in discovery order.
    pub fn entries(&self) -> &[KeystoreEntry] {
        &self.planned
    }

    /// Renames the planned entry at `index`.
    pub fn rename(&mut self, index: usize, alias: impl Into<String>) -> Result<()> {
        if self.page != WizardPage::Review {
            return Err(Error::Validation("nothing to rename yet".into()));
        }
        let entry = self
            .planned
            .get(index)
            .ok_or_else(|| Error::Validation(format!("no planned entry {index}")))?;
        self.planned[index] = entry.copy(alias);
        Ok(())
    }

    /// Writes every reviewed entry into `store` under one shared password, in
    /// reverse discovery order so issuers land before their dependents.
    ///
    /// Preconditions are checked before the first write: a key entry requires
    /// a non-empty password, and no planned alias may displace an existing
    /// key entry. The container is untouched when commit fails.
    pub fn commit(&self, store: &mut Keystore, password: &str) -> Result<()> {
        if self.page != WizardPage::Review {
            return Err(Error::Validation("nothing to commit yet".into()));
        }
        for entry in &self.planned {
            match entry {
                KeystoreEntry::PrivateKey { .. } if password.is_empty() => {
                    return Err(Error::Validation(
                        "key entries require a non-empty password".into(),
                    ));
                }
                KeystoreEntry::TrustedCertificate { alias, .. }
                    if store.is_key_entry(alias) =>
                {
                    return Err(Error::Container(format!(
                        "alias {alias} already holds a key entry"
                    )));
                }
                _ => {}
            }
        }
        for entry in self.planned.iter().rev() {
            entry.add_to(store, password)?;
        }
        Ok(())
    }
}

impl Default for ImportWizard {
    fn default() -> Self {
        Self::new()
    }
}
