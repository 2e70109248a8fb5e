use bon::Builder;
use time::OffsetDateTime;

use crate::cert::{Certificate, SignatureAlgorithm};
use crate::error::Result;
use crate::key::{KeyAlgorithm, KeyPair, PublicKey};

/// The basic-constraints state of a certificate, as three explicit cases.
///
/// `Omit` emits no extension at all. `EndEntity` emits a critical
/// `BasicConstraints { cA: false }`. `Ca(limit)` emits a critical
/// `BasicConstraints { cA: true }` with the optional path length limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BasicConstraints {
    #[default]
    Omit,
    EndEntity,
    Ca(Option<u8>),
}

/// Issuer identity and signing key for certificate issuance.
#[derive(Clone)]
pub struct IssuerInfo {
    /// The issuer distinguished name, copied into the issued certificate.
    pub distinguished_name: String,
    /// The issuer private key that signs the certificate.
    pub key: KeyPair,
}

/// Parameters for issuing an X.509 certificate.
///
/// Built once and consumed by [`issue`]; a fresh config is built for every
/// issuance.
///
/// Exactly one key source may be set: `subject_key` (use this pair's public
/// key), `subject_public_key` (certify a foreign key), or `key_algorithm`
/// (generate a pair during issuance). When none is set an RSA-2048 pair is
/// generated. Without `issuer` the certificate is self-signed, which requires
/// a subject private key.
///
/// [`issue`]: crate::issuer::issue
#[derive(Clone, Builder)]
pub struct CertificateConfig {
    /// Certificate serial number content bytes. Always caller-supplied; the
    /// issuance path never assigns or deduplicates serial numbers.
    pub serial_number: Vec<u8>,
    /// Subject distinguished name in RFC 4514 string form, typically from
    /// [`DnBuilder`](crate::dn::DnBuilder).
    #[builder(into)]
    pub subject: String,
    /// Start of validity; defaults to today at midnight UTC.
    pub not_before: Option<OffsetDateTime>,
    /// End of validity (exclusive); defaults to two years after `not_before`.
    pub not_after: Option<OffsetDateTime>,
    /// Subject key pair.
    pub subject_key: Option<KeyPair>,
    /// Subject public key without the private half.
    pub subject_public_key: Option<PublicKey>,
    /// Parameters for generating a fresh subject key pair.
    pub key_algorithm: Option<KeyAlgorithm>,
    /// Issuer identity; absent means self-signed.
    pub issuer: Option<IssuerInfo>,
    #[builder(default = SignatureAlgorithm::Sha256WithRsa)]
    pub signature_algorithm: SignatureAlgorithm,
    #[builder(default)]
    pub basic_constraints: BasicConstraints,
}

impl CertificateConfig {
    /// Starts a config from an existing certificate for the re-sign workflow:
    /// serial number, subject, validity, public key, signature algorithm and
    /// basic constraints are copied verbatim. Add an issuer (or a subject key
    /// for self-signing) before issuing.
    pub fn from_certificate(certificate: &Certificate) -> Result<Self> {
        Ok(CertificateConfig {
            serial_number: certificate.serial_number().to_vec(),
            subject: certificate.subject(),
            not_before: Some(certificate.not_before()),
            not_after: Some(certificate.not_after()),
            subject_key: None,
            subject_public_key: Some(certificate.public_key()?),
            key_algorithm: None,
            issuer: None,
            signature_algorithm: certificate.signature_algorithm()?,
            basic_constraints: certificate.basic_constraints()?,
        })
    }
}

/// The outcome of an issuance: the certificate, plus the subject key pair
/// when one was generated on the caller's behalf.
pub struct Issued {
    pub certificate: Certificate,
    pub generated_key: Option<KeyPair>,
}
