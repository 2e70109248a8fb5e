pub mod params;

use std::fmt;
use std::str::FromStr;

use const_oid::ObjectIdentifier;
use der::asn1::Null;
use der::{Any, Decode, Encode, EncodePem, Reader, SliceReader};
use time::OffsetDateTime;
use x509_cert::certificate::CertificateInner;

use crate::error::{Error, Result};
use crate::key::{KeyFamily, PublicKey};
use params::BasicConstraints;

const SHA_1_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.5");
const MD_5_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.4");
const DSA_WITH_SHA_1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10040.4.3");
const DSA_WITH_SHA_256: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.3.2");

/// Represents the supported certificate signature algorithms.
///
/// The list is fixed; callers pick from [`SignatureAlgorithm::for_family`]
/// rather than composing digest and key family freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// SHA-1 with RSA encryption.
    Sha1WithRsa,
    /// MD5 with RSA encryption (legacy, import compatibility only).
    Md5WithRsa,
    /// SHA-256 with RSA encryption.
    Sha256WithRsa,
    /// SHA-1 with DSA.
    Sha1WithDsa,
    /// SHA-256 with DSA.
    Sha256WithDsa,
    /// SHA-256 with ECDSA (P-256 keys).
    Sha256WithEcdsa,
    /// SHA-384 with ECDSA (P-384 keys).
    Sha384WithEcdsa,
    /// SHA-512 with ECDSA (P-521 keys).
    Sha512WithEcdsa,
}

impl SignatureAlgorithm {
    pub const ALL: [SignatureAlgorithm; 8] = [
        SignatureAlgorithm::Sha1WithRsa,
        SignatureAlgorithm::Md5WithRsa,
        SignatureAlgorithm::Sha256WithRsa,
        SignatureAlgorithm::Sha1WithDsa,
        SignatureAlgorithm::Sha256WithDsa,
        SignatureAlgorithm::Sha256WithEcdsa,
        SignatureAlgorithm::Sha384WithEcdsa,
        SignatureAlgorithm::Sha512WithEcdsa,
    ];

    pub fn family(self) -> KeyFamily {
        match self {
            SignatureAlgorithm::Sha1WithRsa
            | SignatureAlgorithm::Md5WithRsa
            | SignatureAlgorithm::Sha256WithRsa => KeyFamily::Rsa,
            SignatureAlgorithm::Sha1WithDsa | SignatureAlgorithm::Sha256WithDsa => KeyFamily::Dsa,
            SignatureAlgorithm::Sha256WithEcdsa
            | SignatureAlgorithm::Sha384WithEcdsa
            | SignatureAlgorithm::Sha512WithEcdsa => KeyFamily::Ecdsa,
        }
    }

    /// The algorithms usable with a key of the given family, in display order.
    pub fn for_family(family: KeyFamily) -> Vec<SignatureAlgorithm> {
        Self::ALL
            .iter()
            .copied()
            .filter(|algorithm| algorithm.family() == family)
            .collect()
    }

    pub fn oid(self) -> ObjectIdentifier {
        match self {
            SignatureAlgorithm::Sha1WithRsa => SHA_1_WITH_RSA,
            SignatureAlgorithm::Md5WithRsa => MD_5_WITH_RSA,
            SignatureAlgorithm::Sha256WithRsa => const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha1WithDsa => DSA_WITH_SHA_1,
            SignatureAlgorithm::Sha256WithDsa => DSA_WITH_SHA_256,
            SignatureAlgorithm::Sha256WithEcdsa => const_oid::db::rfc5912::ECDSA_WITH_SHA_256,
            SignatureAlgorithm::Sha384WithEcdsa => const_oid::db::rfc5912::ECDSA_WITH_SHA_384,
            SignatureAlgorithm::Sha512WithEcdsa => const_oid::db::rfc5912::ECDSA_WITH_SHA_512,
        }
    }

    pub fn from_oid(oid: ObjectIdentifier) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|algorithm| algorithm.oid() == oid)
            .ok_or_else(|| Error::Decoding(format!("unsupported signature algorithm: {oid}")))
    }

    /// Converts into the X.509 `AlgorithmIdentifier`. RSA algorithms carry an
    /// explicit NULL parameter per RFC 3279; the others omit parameters.
    pub fn to_algorithm_identifier(self) -> Result<x509_cert::spki::AlgorithmIdentifierOwned> {
        let parameters = match self.family() {
            KeyFamily::Rsa => Some(
                Any::encode_from(&Null).map_err(|e| Error::Encoding(e.to_string()))?,
            ),
            KeyFamily::Dsa | KeyFamily::Ecdsa => None,
        };
        Ok(x509_cert::spki::AlgorithmIdentifierOwned {
            oid: self.oid(),
            parameters,
        })
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignatureAlgorithm::Sha1WithRsa => "SHA1withRSA",
            SignatureAlgorithm::Md5WithRsa => "MD5withRSA",
            SignatureAlgorithm::Sha256WithRsa => "SHA256withRSA",
            SignatureAlgorithm::Sha1WithDsa => "SHA1withDSA",
            SignatureAlgorithm::Sha256WithDsa => "SHA256withDSA",
            SignatureAlgorithm::Sha256WithEcdsa => "SHA256withECDSA",
            SignatureAlgorithm::Sha384WithEcdsa => "SHA384withECDSA",
            SignatureAlgorithm::Sha512WithEcdsa => "SHA512withECDSA",
        };
        f.write_str(name)
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|algorithm| algorithm.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Validation(format!("unknown signature algorithm: {s}")))
    }
}

/// Represents an X.509 certificate.
///
/// This struct wraps the decoded certificate and provides the accessors the
/// rest of the crate works in terms of: DN strings, raw name DER for chain
/// matching, and the re-encoded document.
#[derive(Debug, Clone)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
}

impl Certificate {
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner =
            CertificateInner::from_der(der).map_err(|e| Error::Decoding(e.to_string()))?;
        Ok(Certificate { inner })
    }

    /// Decodes one or more certificates from concatenated DER documents.
    pub fn decode_all(der: &[u8]) -> Result<Vec<Self>> {
        let mut reader =
            SliceReader::new(der).map_err(|e| Error::Decoding(e.to_string()))?;
        let mut certificates = Vec::new();
        while !reader.is_finished() {
            let inner = CertificateInner::decode(&mut reader)
                .map_err(|e| Error::Decoding(e.to_string()))?;
            certificates.push(Certificate { inner });
        }
        if certificates.is_empty() {
            return Err(Error::Decoding("no certificates in input".to_string()));
        }
        Ok(certificates)
    }

    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| Error::Encoding(e.to_string()))
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> Result<String> {
        self.inner
            .to_pem(pkcs8::LineEnding::LF)
            .map_err(|e| Error::Encoding(e.to_string()))
    }

    /// The subject distinguished name in RFC 4514 string form.
    pub fn subject(&self) -> String {
        self.inner.tbs_certificate.subject.to_string()
    }

    /// The issuer distinguished name in RFC 4514 string form.
    pub fn issuer(&self) -> String {
        self.inner.tbs_certificate.issuer.to_string()
    }

    /// The DER encoding of the subject name, for exact name comparison.
    pub fn subject_der(&self) -> Result<Vec<u8>> {
        self.inner
            .tbs_certificate
            .subject
            .to_der()
            .map_err(|e| Error::Encoding(e.to_string()))
    }

    /// The DER encoding of the issuer name, for exact name comparison.
    pub fn issuer_der(&self) -> Result<Vec<u8>> {
        self.inner
            .tbs_certificate
            .issuer
            .to_der()
            .map_err(|e| Error::Encoding(e.to_string()))
    }

    pub fn serial_number(&self) -> &[u8] {
        self.inner.tbs_certificate.serial_number.as_bytes()
    }

    pub fn not_before(&self) -> OffsetDateTime {
        OffsetDateTime::from(self.inner.tbs_certificate.validity.not_before.to_system_time())
    }

    pub fn not_after(&self) -> OffsetDateTime {
        OffsetDateTime::from(self.inner.tbs_certificate.validity.not_after.to_system_time())
    }

    /// The subject public key.
    pub fn public_key(&self) -> Result<PublicKey> {
        let spki = self
            .inner
            .tbs_certificate
            .subject_public_key_info
            .to_der()
            .map_err(|e| Error::Encoding(e.to_string()))?;
        PublicKey::from_spki_der(&spki)
    }

    /// The basic-constraints state of the certificate.
    ///
    /// A missing extension reads as [`BasicConstraints::Omit`]; `cA=true`
    /// without a path length reads as an unconstrained CA.
    pub fn basic_constraints(&self) -> Result<BasicConstraints> {
        let extensions = match &self.inner.tbs_certificate.extensions {
            Some(extensions) => extensions,
            None => return Ok(BasicConstraints::Omit),
        };
        for extension in extensions {
            if extension.extn_id == const_oid::db::rfc5280::ID_CE_BASIC_CONSTRAINTS {
                let decoded = x509_cert::ext::pkix::BasicConstraints::from_der(
                    extension.extn_value.as_bytes(),
                )
                .map_err(|e| Error::Decoding(e.to_string()))?;
                return Ok(if decoded.ca {
                    BasicConstraints::Ca(decoded.path_len_constraint)
                } else {
                    BasicConstraints::EndEntity
                });
            }
        }
        Ok(BasicConstraints::Omit)
    }

    pub fn signature_algorithm(&self) -> Result<SignatureAlgorithm> {
        SignatureAlgorithm::from_oid(self.inner.signature_algorithm.oid)
    }

    /// Whether subject and issuer name are byte-identical.
    pub fn is_self_signed(&self) -> bool {
        match (self.subject_der(), self.issuer_der()) {
            (Ok(subject), Ok(issuer)) => subject == issuer,
            _ => false,
        }
    }
}

impl PartialEq for Certificate {
    /// Two certificates are equal when their DER encodings are equal.
    fn eq(&self, other: &Self) -> bool {
        match (self.to_der(), other.to_der()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}
