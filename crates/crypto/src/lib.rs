//! Cryptographic helpers for the congress API
//!
//! Password hashing (PBKDF2-HMAC-SHA256 via `ring`), attendee QR codes and
//! HMAC-derived diploma verification codes.

use thiserror::Error;

pub mod password;
pub mod qr;
pub mod verification;

pub use password::*;
pub use qr::*;
pub use verification::*;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CryptoError {
    #[error("iteration count must be positive")]
    InvalidIterations,

    #[error("secure random generator failure")]
    RandomFailure,

    #[error("malformed password hash")]
    MalformedHash,

    #[error("invalid HMAC key: {0}")]
    InvalidKey(String),

    #[error("QR payload is empty")]
    EmptyQr,

    #[error("QR code must have {expected} characters, got {actual}")]
    InvalidQrLength { expected: usize, actual: usize },

    #[error("QR code contains invalid character '{0}'")]
    InvalidQrCharacter(char),
}
