//! In-memory keystore container with JKS and PKCS#12 serializations.
//!
//! Private keys never sit in memory in the clear: [`Keystore::set_key_entry`]
//! shrouds them as PBES2-encrypted PKCS#8 under the entry password and
//! [`Keystore::key`] unshrouds on demand. One password covers the container
//! and every key entry in it.

pub mod jks;
pub mod pkcs12;

use crate::cert::Certificate;
use crate::error::{Error, Result};
use crate::key::KeyPair;

/// The on-disk serializations a [`Keystore`] can round-trip through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFormat {
    Jks,
    Pkcs12,
}

enum Record {
    Key {
        /// PBES2-encrypted PKCS#8 document.
        encrypted_key: Vec<u8>,
        /// Entity certificate first, root last.
        chain: Vec<Certificate>,
    },
    TrustedCert(Certificate),
}

/// A decrypted record, used at the codec boundary.
pub(crate) enum PlainRecord {
    Key {
        /// Plaintext PKCS#8 document.
        key_der: Vec<u8>,
        chain: Vec<Certificate>,
    },
    TrustedCert(Certificate),
}

/// An alias-addressed collection of key and trusted-certificate entries.
///
/// Enumeration order is insertion order; callers wanting a sorted view apply
/// the comparators in [`entry`](crate::entry) themselves.
pub struct Keystore {
    format: StoreFormat,
    records: Vec<(String, Record)>,
}

impl Keystore {
    pub fn new(format: StoreFormat) -> Self {
        Keystore {
            format,
            records: Vec::new(),
        }
    }

    pub fn format(&self) -> StoreFormat {
        self.format
    }

    pub fn aliases(&self) -> Vec<String> {
        self.records.iter().map(|(alias, _)| alias.clone()).collect()
    }

    fn record(&self, alias: &str) -> Option<&Record> {
        self.records
            .iter()
            .find(|(name, _)| name == alias)
            .map(|(_, record)| record)
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.record(alias).is_some()
    }

    pub fn is_key_entry(&self, alias: &str) -> bool {
        matches!(self.record(alias), Some(Record::Key { .. }))
    }

    /// The certificate stored under `alias`: the entity certificate for a key
    /// entry, the certificate itself for a trusted-certificate entry.
    pub fn certificate(&self, alias: &str) -> Option<Certificate> {
        match self.record(alias)? {
            Record::Key { chain, .. } => chain.first().cloned(),
            Record::TrustedCert(certificate) => Some(certificate.clone()),
        }
    }

    /// The certificate chain of a key entry, entity certificate first.
    pub fn certificate_chain(&self, alias: &str) -> Option<&[Certificate]> {
        match self.record(alias)? {
            Record::Key { chain, .. } => Some(chain),
            Record::TrustedCert(_) => None,
        }
    }

    /// The first alias whose stored certificate is exactly `certificate`.
    pub fn certificate_alias(&self, certificate: &Certificate) -> Option<String> {
        self.records.iter().find_map(|(alias, _)| {
            if self.certificate(alias).as_ref() == Some(certificate) {
                Some(alias.clone())
            } else {
                None
            }
        })
    }

    /// Stores a key entry, replacing any existing entry under the alias.
    ///
    /// Key entries require a non-empty password and a chain whose first
    /// element certifies the key.
    pub fn set_key_entry(
        &mut self,
        alias: &str,
        key: &KeyPair,
        password: &str,
        chain: Vec<Certificate>,
    ) -> Result<()> {
        if password.is_empty() {
            return Err(Error::Validation(
                "key entries require a non-empty password".into(),
            ));
        }
        if chain.is_empty() {
            return Err(Error::Validation(
                "key entries require a certificate chain".into(),
            ));
        }
        let encrypted_key = key.to_encrypted_pkcs8_der(password)?;
        self.put(alias, Record::Key {
            encrypted_key,
            chain,
        });
        Ok(())
    }

    /// Stores a trusted-certificate entry, replacing any existing
    /// trusted-certificate entry under the alias. Refuses to displace a key
    /// entry.
    pub fn set_certificate_entry(&mut self, alias: &str, certificate: Certificate) -> Result<()> {
        if self.is_key_entry(alias) {
            return Err(Error::Container(format!(
                "alias {alias} already holds a key entry"
            )));
        }
        self.put(alias, Record::TrustedCert(certificate));
        Ok(())
    }

    fn put(&mut self, alias: &str, record: Record) {
        match self.records.iter_mut().find(|(name, _)| name == alias) {
            Some((_, slot)) => *slot = record,
            None => self.records.push((alias.to_string(), record)),
        }
    }

    /// Removes the entry under `alias` if one exists.
    pub fn delete_entry(&mut self, alias: &str) {
        self.records.retain(|(name, _)| name != alias);
    }

    /// Recovers the private key of a key entry.
    pub fn key(&self, alias: &str, password: &str) -> Result<KeyPair> {
        match self.record(alias) {
            Some(Record::Key { encrypted_key, .. }) => {
                KeyPair::from_encrypted_pkcs8_der(encrypted_key, password)
            }
            Some(Record::TrustedCert(_)) => Err(Error::Container(format!(
                "alias {alias} holds a trusted certificate, not a key"
            ))),
            None => Err(Error::Container(format!("no entry under alias {alias}"))),
        }
    }

    /// Deserializes a container from `bytes` under one password.
    pub fn load(format: StoreFormat, bytes: &[u8], password: &str) -> Result<Self> {
        let plain = match format {
            StoreFormat::Jks => jks::decode(bytes, password)?,
            StoreFormat::Pkcs12 => pkcs12::decode(bytes, password)?,
        };
        let mut store = Keystore::new(format);
        for (alias, record) in plain {
            match record {
                PlainRecord::Key { key_der, chain } => {
                    let pair = KeyPair::from_pkcs8_der(&key_der)?;
                    store.put(&alias, Record::Key {
                        encrypted_key: pair.to_encrypted_pkcs8_der(password)?,
                        chain,
                    });
                }
                PlainRecord::TrustedCert(certificate) => {
                    store.put(&alias, Record::TrustedCert(certificate));
                }
            }
        }
        Ok(store)
    }

    /// Serializes the container under one password.
    pub fn store(&self, password: &str) -> Result<Vec<u8>> {
        let mut plain = Vec::with_capacity(self.records.len());
        for (alias, record) in &self.records {
            let decoded = match record {
                Record::Key {
                    encrypted_key,
                    chain,
                } => {
                    let pair = KeyPair::from_encrypted_pkcs8_der(encrypted_key, password)?;
                    PlainRecord::Key {
                        key_der: pair.to_pkcs8_der()?,
                        chain: chain.clone(),
                    }
                }
                Record::TrustedCert(certificate) => PlainRecord::TrustedCert(certificate.clone()),
            };
            plain.push((alias.clone(), decoded));
        }
        match self.format {
            StoreFormat::Jks => jks::encode(&plain, password),
            StoreFormat::Pkcs12 => pkcs12::encode(&plain, password),
        }
    }
}
