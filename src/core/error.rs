//! Error types for the passport core.

use thiserror::Error;

/// Result type alias for passport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Storage,
    Decryption,
    IdentityCreation,
    Issuance,
    Parse,
    Validation,
    Resolution,
    Crypto,
    Config,
    Internal,
}

/// Errors that can occur in passport operations.
#[derive(Error, Debug)]
pub enum Error {
    // Persistence errors
    #[error("Storage error: {0}")]
    Storage(String),

    // Key store errors
    #[error("Decryption failed: {0}")]
    Decryption(String),

    // Identity errors
    #[error("Identity creation failed: {0}")]
    IdentityCreation(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    // Credential errors
    #[error("Credential issuance failed: {0}")]
    Issuance(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    // Ledger errors
    #[error("Ledger resolution failed: {0}")]
    Resolution(String),

    // Cryptography errors
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Storage(_) | Error::Io(_) => ErrorKind::Storage,
            Error::Decryption(_) => ErrorKind::Decryption,
            Error::IdentityCreation(_) => ErrorKind::IdentityCreation,
            Error::Issuance(_) => ErrorKind::Issuance,
            Error::Parse(_) | Error::Serialization(_) | Error::InvalidIdentifier(_) => {
                ErrorKind::Parse
            }
            Error::Validation(_) => ErrorKind::Validation,
            Error::Resolution(_) => ErrorKind::Resolution,
            Error::SignatureVerificationFailed | Error::InvalidKeyFormat(_) => ErrorKind::Crypto,
            Error::Config(_) => ErrorKind::Config,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<ed25519_dalek::SignatureError> for Error {
    fn from(_: ed25519_dalek::SignatureError) -> Self {
        Error::SignatureVerificationFailed
    }
}
