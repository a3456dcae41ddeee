// Keysafe — Key Material
//
// Turns the configured encryption key into the 32 bytes AES-256-GCM needs.
//
// Accepted forms:
//   1. 64 hex characters: used as the raw key
//   2. Anything else: treated as a passphrase and stretched with Argon2id
//      over a deterministic salt, so the same passphrase always yields the
//      same key for a given salt label
//
// Key bytes live in `Zeroizing` buffers and are wiped on drop.

use std::fmt;

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::CryptoError;

// ─── Constants ───────────────────────────────────────────────────────────────

/// Length of the AES-256 key in bytes.
pub(crate) const KEY_LEN: usize = 32;

/// Domain prefix mixed into every passphrase salt.
const SALT_DOMAIN: &str = "keysafe";

// Argon2id parameters: m=65536 (64 MiB), t=3, p=4
const ARGON2_M_COST: u32 = 65536;
const ARGON2_T_COST: u32 = 3;
const ARGON2_P_COST: u32 = 4;

// ─── Key Material ────────────────────────────────────────────────────────────

/// A validated 256-bit symmetric key.
pub struct KeyMaterial {
    bytes: Zeroizing<Vec<u8>>,
}

impl KeyMaterial {
    /// Build key material from the configured key string.
    ///
    /// Fails with `MissingKey` when nothing (or only whitespace) is configured,
    /// so a missing key surfaces at startup instead of on first use.
    pub fn from_config(raw: Option<&str>, salt_label: &str) -> Result<Self, CryptoError> {
        let raw = raw
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(CryptoError::MissingKey)?;

        if is_hex_key(raw) {
            Self::from_hex(raw)
        } else {
            Self::derive_from_passphrase(raw, salt_label)
        }
    }

    /// Decode a hex-encoded 32-byte key.
    pub fn from_hex(hex_key: &str) -> Result<Self, CryptoError> {
        let bytes = Zeroizing::new(
            hex::decode(hex_key.trim())
                .map_err(|e| CryptoError::InvalidKey(format!("not valid hex: {}", e)))?,
        );

        if bytes.len() != KEY_LEN {
            return Err(CryptoError::InvalidKey(format!(
                "expected {} bytes, got {}",
                KEY_LEN,
                bytes.len()
            )));
        }

        Ok(Self { bytes })
    }

    /// Stretch a passphrase into a key with Argon2id.
    pub fn derive_from_passphrase(passphrase: &str, salt_label: &str) -> Result<Self, CryptoError> {
        if passphrase.is_empty() {
            return Err(CryptoError::MissingKey);
        }

        let salt = build_salt(salt_label);

        let params = Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, Some(KEY_LEN))
            .map_err(|e| CryptoError::Derivation(format!("invalid Argon2 params: {}", e)))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut derived = Zeroizing::new(vec![0u8; KEY_LEN]);
        argon2
            .hash_password_into(passphrase.as_bytes(), &salt, &mut derived)
            .map_err(|e| CryptoError::Derivation(format!("Argon2id hash failed: {}", e)))?;

        tracing::debug!("Derived encryption key from passphrase");
        Ok(Self { bytes: derived })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Never print key bytes.
impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Generate a fresh random key, hex-encoded, suitable for `KEYSAFE_ENCRYPTION_KEY`.
pub fn generate_key_hex() -> Zeroizing<String> {
    let mut key = Zeroizing::new(vec![0u8; KEY_LEN]);
    rand::rng().fill_bytes(&mut key);
    Zeroizing::new(hex::encode(key.as_slice()))
}

fn is_hex_key(candidate: &str) -> bool {
    candidate.len() == KEY_LEN * 2 && candidate.chars().all(|c| c.is_ascii_hexdigit())
}

/// Salt = SHA-256(SALT_DOMAIN || "::" || label)
fn build_salt(label: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(SALT_DOMAIN.as_bytes());
    hasher.update(b"::");
    hasher.update(label.as_bytes());
    hasher.finalize().to_vec()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const HEX_KEY: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    #[test]
    fn test_missing_key_is_rejected() {
        assert!(matches!(
            KeyMaterial::from_config(None, "keysafe"),
            Err(CryptoError::MissingKey)
        ));
        assert!(matches!(
            KeyMaterial::from_config(Some("   "), "keysafe"),
            Err(CryptoError::MissingKey)
        ));
    }

    #[test]
    fn test_hex_key_is_used_verbatim() {
        let key = KeyMaterial::from_config(Some(HEX_KEY), "keysafe").unwrap();
        assert_eq!(key.as_bytes(), hex::decode(HEX_KEY).unwrap().as_slice());
    }

    #[test]
    fn test_short_hex_key_is_invalid() {
        let result = KeyMaterial::from_hex("abcd");
        assert!(matches!(result, Err(CryptoError::InvalidKey(_))));
    }

    #[test]
    fn test_non_hex_is_invalid_for_from_hex() {
        let result = KeyMaterial::from_hex("zz");
        assert!(matches!(result, Err(CryptoError::InvalidKey(_))));
    }

    #[test]
    fn test_passphrase_derivation_is_deterministic() {
        let a = KeyMaterial::from_config(Some("correct horse battery staple"), "keysafe").unwrap();
        let b = KeyMaterial::from_config(Some("correct horse battery staple"), "keysafe").unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_eq!(a.as_bytes().len(), KEY_LEN);
    }

    #[test]
    fn test_salt_label_changes_derived_key() {
        let a = KeyMaterial::derive_from_passphrase("hunter2", "prod").unwrap();
        let b = KeyMaterial::derive_from_passphrase("hunter2", "staging").unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_debug_redacts_key_bytes() {
        let key = KeyMaterial::from_hex(HEX_KEY).unwrap();
        let debug_output = format!("{:?}", key);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("0123456789abcdef"));
    }

    #[test]
    fn test_generated_key_parses_back() {
        let generated = generate_key_hex();
        assert_eq!(generated.len(), KEY_LEN * 2);
        assert!(KeyMaterial::from_hex(&generated).is_ok());
        assert_ne!(generated.as_str(), generate_key_hex().as_str());
    }
}
