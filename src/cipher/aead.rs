// Keysafe — AES-256-GCM Cipher
//
// Each call to `encrypt` draws a fresh 96-bit nonce. The stored form is
// hex(nonce || ciphertext || tag), which is plain text and can be written to
// both SQLite and the cache unchanged.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;

use super::{CryptoError, KeyMaterial};

/// AES-GCM nonce size (96 bits).
const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag size.
const TAG_LEN: usize = 16;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Reversible string encryption. `decrypt(encrypt(x)) == x` for every string.
pub trait Cipher {
    /// Encrypt a plaintext value into its printable stored form.
    fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError>;

    /// Decrypt a stored value. Malformed or tampered input is an error,
    /// never an empty or partial plaintext.
    fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError>;
}

// ─── AES-256-GCM Implementation ─────────────────────────────────────────────

pub struct AesGcmCipher {
    aead: Aes256Gcm,
}

impl AesGcmCipher {
    pub fn new(key: &KeyMaterial) -> Result<Self, CryptoError> {
        let aead = Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|e| CryptoError::InvalidKey(format!("AES-256-GCM rejected key: {}", e)))?;
        Ok(Self { aead })
    }

    /// Build a cipher straight from the configured key string.
    pub fn from_config(raw_key: Option<&str>, salt_label: &str) -> Result<Self, CryptoError> {
        let key = KeyMaterial::from_config(raw_key, salt_label)?;
        Self::new(&key)
    }
}

impl Cipher for AesGcmCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let sealed = self
            .aead
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::Encryption)?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&sealed);
        Ok(hex::encode(out))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError> {
        let raw = hex::decode(ciphertext.trim())
            .map_err(|e| CryptoError::MalformedCiphertext(format!("not valid hex: {}", e)))?;

        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::MalformedCiphertext(format!(
                "{} bytes is shorter than nonce and tag",
                raw.len()
            )));
        }

        let (nonce_bytes, sealed) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .aead
            .decrypt(Nonce::from_slice(nonce_bytes), sealed)
            .map_err(|_| CryptoError::Decryption)?;

        String::from_utf8(plaintext)
            .map_err(|_| CryptoError::MalformedCiphertext("plaintext is not UTF-8".to_string()))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
