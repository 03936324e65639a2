use crate::CryptoError;
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use std::num::NonZeroU32;

static ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;
const CREDENTIAL_LEN: usize = ring::digest::SHA256_OUTPUT_LEN;
const SALT_LEN: usize = 16;
const SCHEME: &str = "pbkdf2-sha256";

pub const DEFAULT_PASSWORD_ITERATIONS: u32 = 100_000;

/// Salted PBKDF2 password hasher.
///
/// Hashes are encoded as `pbkdf2-sha256$<iterations>$<salt hex>$<hash hex>`;
/// verification reads the iteration count from the stored hash, so changing
/// the configured cost does not invalidate existing passwords.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    iterations: NonZeroU32,
    rng: SystemRandom,
}

impl PasswordHasher {
    pub fn new(iterations: u32) -> Result<Self, CryptoError> {
        let iterations = NonZeroU32::new(iterations).ok_or(CryptoError::InvalidIterations)?;
        Ok(Self {
            iterations,
            rng: SystemRandom::new(),
        })
    }

    pub fn hash(&self, password: &str) -> Result<String, CryptoError> {
        let mut salt = [0u8; SALT_LEN];
        self.rng
            .fill(&mut salt)
            .map_err(|_| CryptoError::RandomFailure)?;

        let mut credential = [0u8; CREDENTIAL_LEN];
        pbkdf2::derive(
            ALGORITHM,
            self.iterations,
            &salt,
            password.as_bytes(),
            &mut credential,
        );

        Ok(format!(
            "{}${}${}${}",
            SCHEME,
            self.iterations,
            hex::encode(salt),
            hex::encode(credential)
        ))
    }

    pub fn verify(&self, password: &str, stored: &str) -> Result<bool, CryptoError> {
        let parts: Vec<&str> = stored.split('$').collect();
        if parts.len() != 4 || parts[0] != SCHEME {
            return Err(CryptoError::MalformedHash);
        }

        let iterations = parts[1]
            .parse::<u32>()
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or(CryptoError::MalformedHash)?;
        let salt = hex::decode(parts[2]).map_err(|_| CryptoError::MalformedHash)?;
        let credential = hex::decode(parts[3]).map_err(|_| CryptoError::MalformedHash)?;

        Ok(pbkdf2::verify(
            ALGORITHM,
            iterations,
            &salt,
            password.as_bytes(),
            &credential,
        )
        .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new(1_000).unwrap();
        let hash = hasher.hash("correct horse").unwrap();

        assert!(hash.starts_with("pbkdf2-sha256$1000$"));
        assert!(hasher.verify("correct horse", &hash).unwrap());
        assert!(!hasher.verify("wrong horse", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let hasher = PasswordHasher::new(1_000).unwrap();
        assert_ne!(hasher.hash("same").unwrap(), hasher.hash("same").unwrap());
    }

    #[test]
    fn test_verify_uses_stored_cost() {
        let cheap = PasswordHasher::new(500).unwrap();
        let hash = cheap.hash("secret-pass").unwrap();
        let other = PasswordHasher::new(2_000).unwrap();
        assert!(other.verify("secret-pass", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash() {
        let hasher = PasswordHasher::new(1_000).unwrap();
        assert_eq!(
            hasher.verify("x", "plaintext"),
            Err(CryptoError::MalformedHash)
        );
        assert_eq!(
            hasher.verify("x", "pbkdf2-sha256$0$00$00"),
            Err(CryptoError::MalformedHash)
        );
        assert!(PasswordHasher::new(0).is_err());
    }
}
