use thiserror::Error;

/// Errors surfaced by certforge operations.
///
/// Every failure is terminal for the operation that raised it; nothing in the
/// crate retries or swallows errors.
#[derive(Debug, Error, Clone)]
pub enum Error {
    /// Bad caller input caught before any mutation (bad date range, empty
    /// serial number, conflicting key parameters, missing password).
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Key generation failed or the requested parameters are unsupported.
    #[error("Key generation error: {0}")]
    KeyGeneration(String),

    /// The issuer key is incompatible with the requested signature algorithm,
    /// or the signing primitive itself failed.
    #[error("Signing error: {0}")]
    Signing(String),

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    Encoding(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    Decoding(String),

    /// An import source could not be turned into entries.
    #[error("Import error: {0}")]
    Import(String),

    /// Underlying container load/store/key-retrieval failure. The message is
    /// deliberately generic: a wrong password and a corrupt file are usually
    /// indistinguishable.
    #[error("Keystore error: {0}")]
    Container(String),

    /// Output password and its verification differ.
    #[error("output password and verification are different")]
    PasswordMismatch,

    /// The key type has no encoding in the requested format.
    #[error("Unsupported key type: {0}")]
    UnsupportedKeyType(String),

    /// The user dismissed a required password prompt.
    #[error("operation cancelled")]
    Cancelled,
}

impl From<der::Error> for Error {
    fn from(err: der::Error) -> Self {
        Error::Decoding(err.to_string())
    }
}

impl From<pem::PemError> for Error {
    fn from(err: pem::PemError) -> Self {
        Error::Decoding(err.to_string())
    }
}

impl From<x509_cert::spki::Error> for Error {
    fn from(err: x509_cert::spki::Error) -> Self {
        Error::Encoding(err.to_string())
    }
}

impl From<signature::Error> for Error {
    fn from(err: signature::Error) -> Self {
        Error::Signing(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
