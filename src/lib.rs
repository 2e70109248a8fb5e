//! # CertForge - A Personal Certificate-Authority Workbench
//!
//! CertForge is a library for running a small certificate authority by hand:
//! issuing and re-signing X.509 certificates, keeping keys and certificates in
//! JKS or PKCS#12 containers, and moving material in and out through PEM, DER
//! and container files. It is built entirely on rustcrypto libraries, with no
//! openssl dependency.
//!
//! ## Supported Key Types
//!
//! - **RSA**: any modulus size the caller asks for (2048-bit default)
//! - **DSA**: 1024, 2048, and 3072-bit keys
//! - **ECDSA**: P-256, P-384, and P-521 curves
//!
//! ## Capabilities
//!
//! - **Issuance**: self-signed or CA-signed certificates from a one-shot
//!   config record, with an explicit three-way basic-constraints state
//! - **Distinguished names**: RFC 2253-style escaping and common-name
//!   extraction via [`dn`]
//! - **Containers**: an in-memory keystore that round-trips through JKS and
//!   PKCS#12, private keys held PBES2-encrypted
//! - **Import**: a two-page wizard that reads PEM, DER, JKS and PKCS#12
//!   sources, rebuilds certificate chains, and commits reviewed entries
//!   atomically
//! - **Export**: single entries to PEM (key plus chain), fresh containers, or
//!   concatenated certificate DER
//! - **SSH**: `authorized_keys` lines for RSA and DSA public keys
//!
//! ## Quick Start
//!
//! ### Issuing a Self-Signed Certificate
//!
//! ```rust,no_run
//! use certforge::cert::params::{BasicConstraints, CertificateConfig};
//! use certforge::dn::DnBuilder;
//! use certforge::issuer;
//! use certforge::key::{EcCurve, KeyAlgorithm};
//!
//! # fn main() -> Result<(), certforge::error::Error> {
//! let mut subject = DnBuilder::new();
//! subject.add("C", "CH").add("O", "Example Corp").add("CN", "Example Root CA");
//!
//! let config = CertificateConfig::builder()
//!     .serial_number(vec![1])
//!     .subject(subject.build())
//!     .key_algorithm(KeyAlgorithm::Ecdsa { curve: EcCurve::NistP256 })
//!     .signature_algorithm(certforge::cert::SignatureAlgorithm::Sha256WithEcdsa)
//!     .basic_constraints(BasicConstraints::Ca(None))
//!     .build();
//!
//! let issued = issuer::issue(&config)?;
//! println!("{}", issued.certificate.to_pem()?);
//! # Ok(())
//! # }
//! ```
//!
//! ### Keeping the Result in a Container
//!
//! ```rust,no_run
//! use certforge::store::{Keystore, StoreFormat};
//! # fn main() -> Result<(), certforge::error::Error> {
//! # let issued = certforge::issuer::issue(&certforge::cert::params::CertificateConfig::builder()
//! #     .serial_number(vec![1]).subject("CN=x").build())?;
//! let mut store = Keystore::new(StoreFormat::Jks);
//! let key = issued.generated_key.as_ref().unwrap();
//! store.set_key_entry("root-ca", key, "changeit", vec![issued.certificate.clone()])?;
//! let bytes = store.store("changeit")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`dn`]: distinguished name assembly and attribute extraction
//! - [`key`]: key generation, import/export, and signing
//! - [`cert`]: certificate type, signature algorithms, and issuance config
//! - [`issuer`]: certificate issuance
//! - [`entry`]: keystore entries as values, with ordering and equality
//! - [`store`]: the in-memory container and its JKS/PKCS#12 codecs
//! - [`import`], [`export`]: the file pipelines
//! - [`ssh`]: OpenSSH public-key encoding
//! - [`password`]: the three-state password prompt collaborator
//! - [`error`]: crate-wide error type

pub mod cert;
pub mod dn;
pub mod entry;
pub mod error;
pub mod export;
pub mod import;
pub mod issuer;
pub mod key;
pub mod password;
pub mod ssh;
pub mod store;
