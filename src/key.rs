//! Key generation, import/export and signing for the supported key types.

use const_oid::ObjectIdentifier;
use der::Encode;
use der::asn1::Uint;
use digest::Digest;
use dsa::SigningKey as DsaSigningKey;
use md5::Md5;
use p256::ecdsa::SigningKey as P256SigningKey;
use p384::ecdsa::SigningKey as P384SigningKey;
use p521::ecdsa::SigningKey as P521SigningKey;
use p521::elliptic_curve::sec1::ToEncodedPoint;
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::Sha256;
use signature::{DigestSigner, SignatureEncoding, Signer};

use crate::cert::SignatureAlgorithm;
use crate::error::{Error, Result};

pub(crate) const ID_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
pub(crate) const ID_DSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10040.4.1");
pub(crate) const ID_EC_PUBLIC_KEY: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const ID_SECP256R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
const ID_SECP384R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");
const ID_SECP521R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.35");

/// The public-key algorithm families the workbench knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFamily {
    Rsa,
    Dsa,
    Ecdsa,
}

impl KeyFamily {
    pub fn name(self) -> &'static str {
        match self {
            KeyFamily::Rsa => "RSA",
            KeyFamily::Dsa => "DSA",
            KeyFamily::Ecdsa => "ECDSA",
        }
    }
}

/// A named elliptic curve usable for ECDSA key generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcCurve {
    NistP256,
    NistP384,
    NistP521,
}

impl EcCurve {
    pub fn name(self) -> &'static str {
        match self {
            EcCurve::NistP256 => "P-256",
            EcCurve::NistP384 => "P-384",
            EcCurve::NistP521 => "P-521",
        }
    }
}

impl std::str::FromStr for EcCurve {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "P-256" | "prime256v1" | "secp256r1" => Ok(EcCurve::NistP256),
            "P-384" | "secp384r1" => Ok(EcCurve::NistP384),
            "P-521" | "secp521r1" => Ok(EcCurve::NistP521),
            other => Err(Error::KeyGeneration(format!("unknown curve: {other}"))),
        }
    }
}

/// Key generation parameters: a bit length for RSA/DSA, a named curve for
/// ECDSA. The two parameterizations are mutually exclusive by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    Rsa { bits: usize },
    Dsa { bits: u32 },
    Ecdsa { curve: EcCurve },
}

impl KeyAlgorithm {
    pub fn family(self) -> KeyFamily {
        match self {
            KeyAlgorithm::Rsa { .. } => KeyFamily::Rsa,
            KeyAlgorithm::Dsa { .. } => KeyFamily::Dsa,
            KeyAlgorithm::Ecdsa { .. } => KeyFamily::Ecdsa,
        }
    }
}

/// A private/public key pair of one of the supported types.
#[derive(Clone)]
pub enum KeyPair {
    Rsa {
        private: Box<RsaPrivateKey>,
        public: RsaPublicKey,
    },
    Dsa {
        signing_key: Box<DsaSigningKey>,
    },
    EcdsaP256 {
        signing_key: P256SigningKey,
    },
    EcdsaP384 {
        signing_key: P384SigningKey,
    },
    EcdsaP521 {
        signing_key: P521SigningKey,
    },
}

impl KeyPair {
    /// Generates a fresh key pair for the given parameters.
    pub fn generate(algorithm: KeyAlgorithm) -> Result<Self> {
        let mut rng = rand_core::OsRng;
        match algorithm {
            KeyAlgorithm::Rsa { bits } => {
                let private = RsaPrivateKey::new(&mut rng, bits)
                    .map_err(|e| Error::KeyGeneration(e.to_string()))?;
                let public = RsaPublicKey::from(&private);
                Ok(KeyPair::Rsa {
                    private: Box::new(private),
                    public,
                })
            }
            KeyAlgorithm::Dsa { bits } => {
                let key_size = match bits {
                    // 1024-bit DSA survives for compatibility with old keystores.
                    #[allow(deprecated)]
                    1024 => dsa::KeySize::DSA_1024_160,
                    2048 => dsa::KeySize::DSA_2048_256,
                    3072 => dsa::KeySize::DSA_3072_256,
                    other => {
                        return Err(Error::KeyGeneration(format!(
                            "unsupported DSA key size: {other}"
                        )));
                    }
                };
                let components = dsa::Components::generate(&mut rng, key_size);
                let signing_key = DsaSigningKey::generate(&mut rng, components);
                Ok(KeyPair::Dsa {
                    signing_key: Box::new(signing_key),
                })
            }
            KeyAlgorithm::Ecdsa { curve } => Ok(match curve {
                EcCurve::NistP256 => KeyPair::EcdsaP256 {
                    signing_key: P256SigningKey::random(&mut rng),
                },
                EcCurve::NistP384 => KeyPair::EcdsaP384 {
                    signing_key: P384SigningKey::random(&mut rng),
                },
                EcCurve::NistP521 => KeyPair::EcdsaP521 {
                    signing_key: P521SigningKey::random(&mut rng),
                },
            }),
        }
    }

    pub fn family(&self) -> KeyFamily {
        match self {
            KeyPair::Rsa { .. } => KeyFamily::Rsa,
            KeyPair::Dsa { .. } => KeyFamily::Dsa,
            KeyPair::EcdsaP256 { .. } | KeyPair::EcdsaP384 { .. } | KeyPair::EcdsaP521 { .. } => {
                KeyFamily::Ecdsa
            }
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match self {
            KeyPair::Rsa { public, .. } => PublicKey::Rsa(public.clone()),
            KeyPair::Dsa { signing_key } => PublicKey::Dsa(signing_key.verifying_key().clone()),
            KeyPair::EcdsaP256 { signing_key } => PublicKey::EcdsaP256(*signing_key.verifying_key()),
            KeyPair::EcdsaP384 { signing_key } => PublicKey::EcdsaP384(*signing_key.verifying_key()),
            KeyPair::EcdsaP521 { signing_key } => {
                PublicKey::EcdsaP521(p521::ecdsa::VerifyingKey::from(signing_key))
            }
        }
    }

    /// Signs `data` with the requested signature algorithm.
    ///
    /// The algorithm must belong to this key's family; for ECDSA the digest
    /// length must additionally match the curve. The returned bytes are the
    /// X.509 `signatureValue` content (PKCS#1 v1.5 for RSA, DER-encoded
    /// (r, s) for DSA and ECDSA).
    pub fn sign(&self, algorithm: SignatureAlgorithm, data: &[u8]) -> Result<Vec<u8>> {
        if algorithm.family() != self.family() {
            return Err(Error::Signing(format!(
                "{algorithm} cannot be used with a {} key",
                self.family().name()
            )));
        }
        match self {
            KeyPair::Rsa { private, .. } => {
                let key = private.as_ref().clone();
                let signature = match algorithm {
                    SignatureAlgorithm::Sha1WithRsa => {
                        rsa::pkcs1v15::SigningKey::<Sha1>::new(key).try_sign(data)?
                    }
                    SignatureAlgorithm::Md5WithRsa => {
                        rsa::pkcs1v15::SigningKey::<Md5>::new(key).try_sign(data)?
                    }
                    SignatureAlgorithm::Sha256WithRsa => {
                        rsa::pkcs1v15::SigningKey::<Sha256>::new(key).try_sign(data)?
                    }
                    _ => unreachable!("family checked above"),
                };
                Ok(signature.to_vec())
            }
            KeyPair::Dsa { signing_key } => {
                let signature: dsa::Signature = match algorithm {
                    SignatureAlgorithm::Sha1WithDsa => {
                        signing_key.try_sign_digest(Sha1::new_with_prefix(data))?
                    }
                    SignatureAlgorithm::Sha256WithDsa => {
                        signing_key.try_sign_digest(Sha256::new_with_prefix(data))?
                    }
                    _ => unreachable!("family checked above"),
                };
                encode_dsa_signature(&signature)
            }
            KeyPair::EcdsaP256 { signing_key } => {
                if algorithm != SignatureAlgorithm::Sha256WithEcdsa {
                    return Err(Error::Signing(format!("{algorithm} requires a P-256 key")));
                }
                let signature: p256::ecdsa::Signature = signing_key.try_sign(data)?;
                Ok(signature.to_der().to_vec())
            }
            KeyPair::EcdsaP384 { signing_key } => {
                if algorithm != SignatureAlgorithm::Sha384WithEcdsa {
                    return Err(Error::Signing(format!("{algorithm} requires a P-384 key")));
                }
                let signature: p384::ecdsa::Signature = signing_key.try_sign(data)?;
                Ok(signature.to_der().to_vec())
            }
            KeyPair::EcdsaP521 { signing_key } => {
                if algorithm != SignatureAlgorithm::Sha512WithEcdsa {
                    return Err(Error::Signing(format!("{algorithm} requires a P-521 key")));
                }
                let signature: p521::ecdsa::Signature = signing_key.try_sign(data)?;
                Ok(signature.to_der().to_vec())
            }
        }
    }

    /// Serializes the private key as a PKCS#8 `PrivateKeyInfo` document.
    pub fn to_pkcs8_der(&self) -> Result<Vec<u8>> {
        let document = match self {
            KeyPair::Rsa { private, .. } => private.to_pkcs8_der(),
            KeyPair::Dsa { signing_key } => signing_key.to_pkcs8_der(),
            KeyPair::EcdsaP256 { signing_key } => signing_key.to_pkcs8_der(),
            KeyPair::EcdsaP384 { signing_key } => signing_key.to_pkcs8_der(),
            KeyPair::EcdsaP521 { signing_key } => p521_secret(signing_key)?.to_pkcs8_der(),
        }
        .map_err(|e| Error::Encoding(e.to_string()))?;
        Ok(document.as_bytes().to_vec())
    }

    /// Parses a PKCS#8 `PrivateKeyInfo` document, dispatching on the inner
    /// algorithm identifier.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let info = pkcs8::PrivateKeyInfo::try_from(der)
            .map_err(|e| Error::Decoding(e.to_string()))?;
        match info.algorithm.oid {
            ID_RSA_ENCRYPTION => {
                let private = RsaPrivateKey::from_pkcs8_der(der)
                    .map_err(|e| Error::Decoding(e.to_string()))?;
                let public = RsaPublicKey::from(&private);
                Ok(KeyPair::Rsa {
                    private: Box::new(private),
                    public,
                })
            }
            ID_DSA => {
                let signing_key = DsaSigningKey::from_pkcs8_der(der)
                    .map_err(|e| Error::Decoding(e.to_string()))?;
                Ok(KeyPair::Dsa {
                    signing_key: Box::new(signing_key),
                })
            }
            ID_EC_PUBLIC_KEY => {
                let curve = info
                    .algorithm
                    .parameters_oid()
                    .map_err(|e| Error::Decoding(e.to_string()))?;
                match curve {
                    ID_SECP256R1 => Ok(KeyPair::EcdsaP256 {
                        signing_key: P256SigningKey::from_pkcs8_der(der)
                            .map_err(|e| Error::Decoding(e.to_string()))?,
                    }),
                    ID_SECP384R1 => Ok(KeyPair::EcdsaP384 {
                        signing_key: P384SigningKey::from_pkcs8_der(der)
                            .map_err(|e| Error::Decoding(e.to_string()))?,
                    }),
                    ID_SECP521R1 => {
                        let secret = p521::SecretKey::from_pkcs8_der(der)
                            .map_err(|e| Error::Decoding(e.to_string()))?;
                        Ok(KeyPair::EcdsaP521 {
                            signing_key: p521_signing_key(&secret)?,
                        })
                    }
                    other => Err(Error::UnsupportedKeyType(format!("EC curve {other}"))),
                }
            }
            other => Err(Error::UnsupportedKeyType(other.to_string())),
        }
    }

    /// Parses a legacy PKCS#1 `RSAPrivateKey` document.
    pub fn from_pkcs1_der(der: &[u8]) -> Result<Self> {
        let private =
            RsaPrivateKey::from_pkcs1_der(der).map_err(|e| Error::Decoding(e.to_string()))?;
        let public = RsaPublicKey::from(&private);
        Ok(KeyPair::Rsa {
            private: Box::new(private),
            public,
        })
    }

    /// Parses a SEC1 `ECPrivateKey` document, trying each supported curve.
    pub fn from_sec1_der(der: &[u8]) -> Result<Self> {
        if let Ok(secret) = p256::SecretKey::from_sec1_der(der) {
            return Ok(KeyPair::EcdsaP256 {
                signing_key: P256SigningKey::from(&secret),
            });
        }
        if let Ok(secret) = p384::SecretKey::from_sec1_der(der) {
            return Ok(KeyPair::EcdsaP384 {
                signing_key: P384SigningKey::from(&secret),
            });
        }
        if let Ok(secret) = p521::SecretKey::from_sec1_der(der) {
            return Ok(KeyPair::EcdsaP521 {
                signing_key: p521_signing_key(&secret)?,
            });
        }
        Err(Error::Decoding("not a SEC1 EC private key on a supported curve".into()))
    }

    /// Serializes the private key as a PBES2-encrypted PKCS#8 document.
    pub fn to_encrypted_pkcs8_der(&self, password: &str) -> Result<Vec<u8>> {
        let plain = self.to_pkcs8_der()?;
        let info = pkcs8::PrivateKeyInfo::try_from(plain.as_slice())
            .map_err(|e| Error::Encoding(e.to_string()))?;
        let document = info
            .encrypt(rand_core::OsRng, password.as_bytes())
            .map_err(|e| Error::Encoding(e.to_string()))?;
        Ok(document.as_bytes().to_vec())
    }

    /// Decrypts a PBES2-encrypted PKCS#8 document with the given password.
    pub fn from_encrypted_pkcs8_der(der: &[u8], password: &str) -> Result<Self> {
        let info = pkcs8::EncryptedPrivateKeyInfo::try_from(der)
            .map_err(|e| Error::Decoding(e.to_string()))?;
        let document = info
            .decrypt(password.as_bytes())
            .map_err(|e| Error::Container(format!("cannot recover key: {e}")))?;
        KeyPair::from_pkcs8_der(document.as_bytes())
    }
}

// p521's ECDSA key types carry no pkcs8 codec of their own; everything
// serialization-shaped goes through p521::SecretKey and p521::PublicKey.

fn p521_secret(signing_key: &P521SigningKey) -> Result<p521::SecretKey> {
    p521::SecretKey::from_slice(&signing_key.to_bytes())
        .map_err(|e| Error::Encoding(e.to_string()))
}

fn p521_signing_key(secret: &p521::SecretKey) -> Result<P521SigningKey> {
    P521SigningKey::from_slice(&secret.to_bytes()).map_err(|e| Error::Decoding(e.to_string()))
}

fn p521_public(key: &p521::ecdsa::VerifyingKey) -> Result<p521::PublicKey> {
    p521::PublicKey::from_affine(*key.as_affine()).map_err(|e| Error::Encoding(e.to_string()))
}

#[derive(der::Sequence)]
struct DsaSignatureValue {
    r: Uint,
    s: Uint,
}

fn encode_dsa_signature(signature: &dsa::Signature) -> Result<Vec<u8>> {
    let value = DsaSignatureValue {
        r: Uint::new(&signature.r().to_bytes_be())?,
        s: Uint::new(&signature.s().to_bytes_be())?,
    };
    Ok(value.to_der()?)
}

/// The public half of a [`KeyPair`], or a key extracted from a certificate.
#[derive(Clone)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    Dsa(dsa::VerifyingKey),
    EcdsaP256(p256::ecdsa::VerifyingKey),
    EcdsaP384(p384::ecdsa::VerifyingKey),
    EcdsaP521(p521::ecdsa::VerifyingKey),
}

impl PublicKey {
    pub fn from_key_pair(pair: &KeyPair) -> Self {
        pair.public_key()
    }

    pub fn family(&self) -> KeyFamily {
        match self {
            PublicKey::Rsa(_) => KeyFamily::Rsa,
            PublicKey::Dsa(_) => KeyFamily::Dsa,
            PublicKey::EcdsaP256(_) | PublicKey::EcdsaP384(_) | PublicKey::EcdsaP521(_) => {
                KeyFamily::Ecdsa
            }
        }
    }

    /// Serializes as a DER `SubjectPublicKeyInfo` document.
    pub fn to_spki_der(&self) -> Result<Vec<u8>> {
        let document = match self {
            PublicKey::Rsa(key) => key.to_public_key_der(),
            PublicKey::Dsa(key) => key.to_public_key_der(),
            PublicKey::EcdsaP256(key) => key.to_public_key_der(),
            PublicKey::EcdsaP384(key) => key.to_public_key_der(),
            PublicKey::EcdsaP521(key) => p521_public(key)?.to_public_key_der(),
        }
        .map_err(|e| Error::Encoding(e.to_string()))?;
        Ok(document.as_bytes().to_vec())
    }

    /// Parses a DER `SubjectPublicKeyInfo` document.
    pub fn from_spki_der(der: &[u8]) -> Result<Self> {
        let spki = x509_cert::spki::SubjectPublicKeyInfoRef::try_from(der)
            .map_err(|e| Error::Decoding(e.to_string()))?;
        match spki.algorithm.oid {
            ID_RSA_ENCRYPTION => Ok(PublicKey::Rsa(
                RsaPublicKey::from_public_key_der(der)
                    .map_err(|e| Error::Decoding(e.to_string()))?,
            )),
            ID_DSA => Ok(PublicKey::Dsa(
                dsa::VerifyingKey::from_public_key_der(der)
                    .map_err(|e| Error::Decoding(e.to_string()))?,
            )),
            ID_EC_PUBLIC_KEY => {
                let curve = spki
                    .algorithm
                    .parameters_oid()
                    .map_err(|e| Error::Decoding(e.to_string()))?;
                match curve {
                    ID_SECP256R1 => Ok(PublicKey::EcdsaP256(
                        p256::ecdsa::VerifyingKey::from_public_key_der(der)
                            .map_err(|e| Error::Decoding(e.to_string()))?,
                    )),
                    ID_SECP384R1 => Ok(PublicKey::EcdsaP384(
                        p384::ecdsa::VerifyingKey::from_public_key_der(der)
                            .map_err(|e| Error::Decoding(e.to_string()))?,
                    )),
                    ID_SECP521R1 => {
                        let public = p521::PublicKey::from_public_key_der(der)
                            .map_err(|e| Error::Decoding(e.to_string()))?;
                        let point = public.to_encoded_point(false);
                        Ok(PublicKey::EcdsaP521(
                            p521::ecdsa::VerifyingKey::from_sec1_bytes(point.as_bytes())
                                .map_err(|e| Error::Decoding(e.to_string()))?,
                        ))
                    }
                    other => Err(Error::UnsupportedKeyType(format!("EC curve {other}"))),
                }
            }
            other => Err(Error::UnsupportedKeyType(other.to_string())),
        }
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicKey")
            .field("family", &self.family())
            .finish_non_exhaustive()
    }
}

impl PartialEq for PublicKey {
    /// Two public keys are equal when their SPKI encodings are equal.
    fn eq(&self, other: &Self) -> bool {
        match (self.to_spki_der(), other.to_spki_der()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}
