// SPDX-FileCopyrightText: 2026 MyDolphin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-entry cipher context producing and reading credential tokens.
//!
//! A token is URL-safe base64 (unpadded) of
//! `version (1 byte) || nonce (12 bytes) || ciphertext || tag (16 bytes)`.
//! The version byte is also bound as AAD, so a token cannot be replayed
//! under a different format version.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use mydolphin_core::MyDolphinError;
use zeroize::Zeroizing;

use crate::crypto::{self, KEY_LEN, NONCE_LEN, TAG_LEN};
use crate::key::EncryptionKey;

/// Current token format version.
pub const TOKEN_VERSION: u8 = 1;

const HEADER_LEN: usize = 1 + NONCE_LEN;

/// Authenticated encryption bound to one entry's key.
pub struct CipherContext {
    key: Zeroizing<[u8; KEY_LEN]>,
}

impl std::fmt::Debug for CipherContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherContext")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl CipherContext {
    pub fn new(key: &EncryptionKey) -> Result<Self, MyDolphinError> {
        Ok(Self {
            key: crypto::derive_cipher_key(key.expose().as_bytes())?,
        })
    }

    /// Encrypt an optional value. `None` stays `None`.
    pub fn encrypt(&self, plaintext: Option<&str>) -> Result<Option<String>, MyDolphinError> {
        plaintext.map(|p| self.encrypt_str(p)).transpose()
    }

    /// Decrypt an optional token. `None` and `""` come back unchanged.
    pub fn decrypt(&self, token: Option<&str>) -> Result<Option<String>, MyDolphinError> {
        match token {
            None => Ok(None),
            Some("") => Ok(Some(String::new())),
            Some(token) => self.decrypt_str(token).map(Some),
        }
    }

    pub fn encrypt_str(&self, plaintext: &str) -> Result<String, MyDolphinError> {
        let (ciphertext, nonce) = crypto::seal(&self.key, plaintext.as_bytes(), &[TOKEN_VERSION])?;

        let mut token = Vec::with_capacity(HEADER_LEN + ciphertext.len());
        token.push(TOKEN_VERSION);
        token.extend_from_slice(&nonce);
        token.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(token))
    }

    /// Decrypt a token, failing on any malformed, foreign, or tampered input.
    pub fn decrypt_str(&self, token: &str) -> Result<String, MyDolphinError> {
        let raw = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|e| MyDolphinError::Crypto(format!("malformed token: {e}")))?;

        if raw.len() < HEADER_LEN + TAG_LEN {
            return Err(MyDolphinError::Crypto(format!(
                "malformed token: {} bytes is shorter than the minimum {}",
                raw.len(),
                HEADER_LEN + TAG_LEN
            )));
        }
        if raw[0] != TOKEN_VERSION {
            return Err(MyDolphinError::Crypto(format!(
                "unsupported token version {}",
                raw[0]
            )));
        }

        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&raw[1..HEADER_LEN]);
        let plaintext = Zeroizing::new(crypto::open(
            &self.key,
            &nonce,
            &raw[HEADER_LEN..],
            &[TOKEN_VERSION],
        )?);

        String::from_utf8(plaintext.to_vec())
            .map_err(|_| MyDolphinError::Crypto("decrypted value is not valid UTF-8".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(material: &str) -> CipherContext {
        CipherContext::new(&EncryptionKey::from_material(material).unwrap()).unwrap()
    }

    #[test]
    fn round_trips_various_plaintexts() {
        let cipher = context("k1");
        let long = "x".repeat(4096);
        for plaintext in ["p", "", "pässwörd with spaces", "🐬🐬🐬", long.as_str()] {
            let token = cipher.encrypt_str(plaintext).unwrap();
            assert_eq!(cipher.decrypt_str(&token).unwrap(), plaintext);
        }
    }

    #[test]
    fn none_and_empty_pass_through() {
        let cipher = context("k1");
        assert_eq!(cipher.encrypt(None).unwrap(), None);
        assert_eq!(cipher.decrypt(None).unwrap(), None);
        assert_eq!(cipher.decrypt(Some("")).unwrap(), Some(String::new()));
    }

    #[test]
    fn encrypting_empty_string_still_produces_a_token() {
        let cipher = context("k1");
        let token = cipher.encrypt(Some("")).unwrap().unwrap();
        assert!(!token.is_empty());
        assert_eq!(cipher.decrypt(Some(&token)).unwrap(), Some(String::new()));
    }

    #[test]
    fn token_never_contains_plaintext() {
        let cipher = context("k1");
        let token = cipher.encrypt_str("hunter2").unwrap();
        assert!(!token.contains("hunter2"));
    }

    #[test]
    fn foreign_key_is_a_crypto_error() {
        let token = context("K1").encrypt_str("p").unwrap();
        let err = context("K2").decrypt_str(&token).unwrap_err();
        assert!(err.is_crypto());
    }

    #[test]
    fn malformed_tokens_are_crypto_errors() {
        let cipher = context("k1");
        assert!(cipher.decrypt_str("not base64 !!").unwrap_err().is_crypto());
        assert!(cipher.decrypt_str("AAAA").unwrap_err().is_crypto());

        let mut raw = URL_SAFE_NO_PAD
            .decode(cipher.encrypt_str("p").unwrap())
            .unwrap();
        raw[0] = 9;
        let err = cipher.decrypt_str(&URL_SAFE_NO_PAD.encode(&raw)).unwrap_err();
        assert!(err.to_string().contains("unsupported token version"));
    }

    #[test]
    fn flipped_bit_is_detected() {
        let cipher = context("k1");
        let mut raw = URL_SAFE_NO_PAD
            .decode(cipher.encrypt_str("p").unwrap())
            .unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x80;
        assert!(cipher.decrypt_str(&URL_SAFE_NO_PAD.encode(&raw)).unwrap_err().is_crypto());
    }
}
