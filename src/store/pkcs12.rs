//! PKCS#12 container codec, backed by the `p12-keystore` crate.

use digest::Digest;
use p12_keystore::{KeyStore, KeyStoreEntry, PrivateKeyChain};
use sha1::Sha1;

use crate::cert::Certificate;
use crate::error::{Error, Result};
use crate::store::PlainRecord;

/// Serializes records into PKCS#12 bytes under the store password.
pub(crate) fn encode(records: &[(String, PlainRecord)], password: &str) -> Result<Vec<u8>> {
    let mut keystore = KeyStore::new();
    for (alias, record) in records {
        let entry = match record {
            PlainRecord::Key { key_der, chain } => {
                let mut certificates = Vec::with_capacity(chain.len());
                for certificate in chain {
                    certificates.push(to_p12_certificate(certificate)?);
                }
                // The local key id ties the key bag to its certificate bag.
                let local_key_id = Sha1::digest(key_der).to_vec();
                KeyStoreEntry::PrivateKeyChain(PrivateKeyChain::new(
                    key_der.clone(),
                    local_key_id,
                    certificates,
                ))
            }
            PlainRecord::TrustedCert(certificate) => {
                KeyStoreEntry::Certificate(to_p12_certificate(certificate)?)
            }
        };
        keystore.add_entry(alias, entry);
    }
    keystore
        .writer(password)
        .write()
        .map_err(|e| Error::Container(e.to_string()))
}

/// Deserializes PKCS#12 bytes.
pub(crate) fn decode(data: &[u8], password: &str) -> Result<Vec<(String, PlainRecord)>> {
    let keystore =
        KeyStore::from_pkcs12(data, password).map_err(|e| Error::Container(e.to_string()))?;
    let mut records = Vec::new();
    for (alias, entry) in keystore.entries() {
        match entry {
            KeyStoreEntry::PrivateKeyChain(chain) => {
                let mut certificates = Vec::with_capacity(chain.chain().len());
                for certificate in chain.chain() {
                    certificates.push(Certificate::from_der(certificate.as_der())?);
                }
                records.push((
                    alias.clone(),
                    PlainRecord::Key {
                        key_der: chain.key().to_vec(),
                        chain: certificates,
                    },
                ));
            }
            KeyStoreEntry::Certificate(certificate) => {
                records.push((
                    alias.clone(),
                    PlainRecord::TrustedCert(Certificate::from_der(certificate.as_der())?),
                ));
            }
        }
    }
    Ok(records)
}

fn to_p12_certificate(certificate: &Certificate) -> Result<p12_keystore::Certificate> {
    p12_keystore::Certificate::from_der(&certificate.to_der()?)
        .map_err(|e| Error::Container(e.to_string()))
}
