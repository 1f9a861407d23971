//! AES-256-GCM sealing of provider access tokens stored at rest.
//!
//! A sealed value is the base64 encoding of a random 12-byte nonce followed by the
//! ciphertext, so it fits a text column. The key is 32 bytes, hex-encoded.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::Rng;

use crate::error::{storage_error, Error, ErrorKind, SettingsErrorKind, StorageErrorKind};

const NONCE_SIZE: usize = 12;
const KEY_SIZE: usize = 32;

/// Seals and opens access tokens with one key.
#[derive(Clone)]
pub struct TokenCipher {
    cipher: Aes256Gcm,
}

impl TokenCipher {
    /// Build a cipher from a 64 character hex key.
    pub fn from_hex(key_hex: &str) -> Result<Self, Error> {
        let key = hex::decode(key_hex).map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::Settings(SettingsErrorKind::Invalid),
        })?;
        if key.len() != KEY_SIZE {
            return Err(Error {
                source: Some(
                    format!("encryption key must be {} bytes, got {}", KEY_SIZE, key.len()).into(),
                ),
                error_kind: ErrorKind::Settings(SettingsErrorKind::Invalid),
            });
        }
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|_| storage_error(StorageErrorKind::EncryptionFailed, "invalid key"))?;
        Ok(Self { cipher })
    }

    pub fn seal(&self, plaintext: &str) -> Result<String, Error> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill(&mut nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|_| storage_error(StorageErrorKind::EncryptionFailed, "encryption failed"))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend(ciphertext);
        Ok(BASE64.encode(combined))
    }

    pub fn open(&self, sealed: &str) -> Result<String, Error> {
        let combined = BASE64.decode(sealed).map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::Storage(StorageErrorKind::DecryptionFailed),
        })?;
        if combined.len() < NONCE_SIZE {
            return Err(storage_error(
                StorageErrorKind::DecryptionFailed,
                "sealed value too short",
            ));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| {
                storage_error(
                    StorageErrorKind::DecryptionFailed,
                    "corrupted value or wrong key",
                )
            })?;

        String::from_utf8(plaintext)
            .map_err(|e| Error {
                source: Some(Box::new(e)),
                error_kind: ErrorKind::Storage(StorageErrorKind::DecryptionFailed),
            })
    }
}

impl std::fmt::Debug for TokenCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenCipher(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    #[test]
    fn test_seal_then_open() {
        let cipher = TokenCipher::from_hex(TEST_KEY).unwrap();
        let sealed = cipher.seal("tok123").unwrap();

        assert_ne!(sealed, "tok123");
        assert_eq!(cipher.open(&sealed).unwrap(), "tok123");
    }

    #[test]
    fn test_nonce_varies_per_seal() {
        let cipher = TokenCipher::from_hex(TEST_KEY).unwrap();
        assert_ne!(cipher.seal("tok").unwrap(), cipher.seal("tok").unwrap());
    }

    #[test]
    fn test_rejects_bad_keys() {
        for key in ["short", "abcd", "zz23456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef"] {
            let err = TokenCipher::from_hex(key).unwrap_err();
            assert_eq!(err.error_kind, ErrorKind::Settings(SettingsErrorKind::Invalid));
        }
    }

    #[test]
    fn test_wrong_key_cannot_open() {
        let sealed = TokenCipher::from_hex(TEST_KEY).unwrap().seal("secret").unwrap();
        let other = TokenCipher::from_hex(&"f".repeat(64)).unwrap();

        let err = other.open(&sealed).unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Storage(StorageErrorKind::DecryptionFailed)
        );
    }

    #[test]
    fn test_garbage_cannot_open() {
        let cipher = TokenCipher::from_hex(TEST_KEY).unwrap();
        for sealed in ["not_valid_base64!!!", "YWJj"] {
            let err = cipher.open(sealed).unwrap_err();
            assert_eq!(
                err.error_kind,
                ErrorKind::Storage(StorageErrorKind::DecryptionFailed)
            );
        }
    }
}
