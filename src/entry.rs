//! Keystore entries as values: a private key with its chain, or a single
//! trusted certificate.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use crate::cert::Certificate;
use crate::dn;
use crate::error::Result;
use crate::key::KeyPair;
use crate::store::Keystore;

/// The two entry kinds, in their canonical display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryKind {
    Key,
    TrustedCertificate,
}

/// One keystore entry.
///
/// Identity is the pair (kind, alias) with the alias compared
/// case-insensitively; two key entries under the same alias are the same
/// entry no matter what they hold.
#[derive(Clone)]
pub enum KeystoreEntry {
    PrivateKey {
        alias: String,
        key: KeyPair,
        /// Entity certificate first, root last.
        chain: Vec<Certificate>,
    },
    TrustedCertificate {
        alias: String,
        certificate: Certificate,
    },
}

impl KeystoreEntry {
    pub fn alias(&self) -> &str {
        match self {
            KeystoreEntry::PrivateKey { alias, .. } => alias,
            KeystoreEntry::TrustedCertificate { alias, .. } => alias,
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            KeystoreEntry::PrivateKey { .. } => EntryKind::Key,
            KeystoreEntry::TrustedCertificate { .. } => EntryKind::TrustedCertificate,
        }
    }

    /// The entry's certificate: the entity certificate of a key entry, or the
    /// trusted certificate itself.
    pub fn certificate(&self) -> Option<&Certificate> {
        match self {
            KeystoreEntry::PrivateKey { chain, .. } => chain.first(),
            KeystoreEntry::TrustedCertificate { certificate, .. } => Some(certificate),
        }
    }

    /// A display name: the common name of the certificate subject, falling
    /// back to the alias when there is none.
    pub fn subject_name(&self) -> String {
        self.certificate()
            .and_then(|certificate| dn::common_name(&certificate.subject()))
            .unwrap_or_else(|| self.alias().to_string())
    }

    /// The same entry content under a different alias.
    pub fn copy(&self, new_alias: impl Into<String>) -> Self {
        let mut copied = self.clone();
        match &mut copied {
            KeystoreEntry::PrivateKey { alias, .. } => *alias = new_alias.into(),
            KeystoreEntry::TrustedCertificate { alias, .. } => *alias = new_alias.into(),
        }
        copied
    }

    /// Writes the entry into a container. Key entries require a non-empty
    /// password; trusted-certificate entries ignore it.
    pub fn add_to(&self, store: &mut Keystore, password: &str) -> Result<()> {
        match self {
            KeystoreEntry::PrivateKey { alias, key, chain } => {
                store.set_key_entry(alias, key, password, chain.clone())
            }
            KeystoreEntry::TrustedCertificate { alias, certificate } => {
                store.set_certificate_entry(alias, certificate.clone())
            }
        }
    }

    /// Reads entries out of a container in its enumeration order, filtered by
    /// kind. The password is needed to recover private keys and is unused
    /// when `include_keys` is false.
    pub fn list_all(
        store: &Keystore,
        include_keys: bool,
        include_certs: bool,
        password: &str,
    ) -> Result<Vec<KeystoreEntry>> {
        let mut entries = Vec::new();
        for alias in store.aliases() {
            if store.is_key_entry(&alias) {
                if !include_keys {
                    continue;
                }
                let key = store.key(&alias, password)?;
                let chain = store
                    .certificate_chain(&alias)
                    .map(<[Certificate]>::to_vec)
                    .unwrap_or_default();
                entries.push(KeystoreEntry::PrivateKey { alias, key, chain });
            } else if include_certs {
                if let Some(certificate) = store.certificate(&alias) {
                    entries.push(KeystoreEntry::TrustedCertificate { alias, certificate });
                }
            }
        }
        Ok(entries)
    }
}

impl std::fmt::Debug for KeystoreEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeystoreEntry")
            .field("kind", &self.kind())
            .field("alias", &self.alias())
            .finish_non_exhaustive()
    }
}

impl PartialEq for KeystoreEntry {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.alias().eq_ignore_ascii_case(other.alias())
    }
}

impl Eq for KeystoreEntry {}

impl Hash for KeystoreEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        self.alias().to_ascii_lowercase().hash(state);
    }
}

/// Orders entries by kind (key entries first), then by alias,
/// case-insensitively.
pub fn type_alias_order(a: &KeystoreEntry, b: &KeystoreEntry) -> Ordering {
    a.kind()
        .cmp(&b.kind())
        .then_with(|| alias_order(a, b))
}

/// Orders entries by alias alone, case-insensitively.
pub fn alias_order(a: &KeystoreEntry, b: &KeystoreEntry) -> Ordering {
    a.alias()
        .to_lowercase()
        .cmp(&b.alias().to_lowercase())
}
