// Keysafe — Cipher Module
//
// Reversible encryption of secret values. Values are sealed with AES-256-GCM
// and stored as hex text, so the same representation goes to the database
// and the cache. Key material is validated when the cipher is built.

mod aead;
mod error;
mod key;

pub use aead::{AesGcmCipher, Cipher};
pub use error::CryptoError;
pub use key::{generate_key_hex, KeyMaterial};
