// Keysafe — Cipher error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Encryption key is not set — export KEYSAFE_ENCRYPTION_KEY or pass --encryption-key")]
    MissingKey,

    #[error("Invalid encryption key: {0}")]
    InvalidKey(String),

    #[error("Key derivation error: {0}")]
    Derivation(String),

    #[error("Failed to encrypt value")]
    Encryption,

    #[error("Malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    #[error("Value could not be decrypted — ciphertext is corrupted or the key does not match")]
    Decryption,
}
