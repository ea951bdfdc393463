// SPDX-FileCopyrightText: 2026 MyDolphin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entry key material.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use mydolphin_core::MyDolphinError;
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

use crate::crypto;

/// The symmetric key material of one entry, as it is persisted.
///
/// Generated keys are 32 random bytes in URL-safe base64, the same shape as
/// the keys older releases wrote to the legacy key file. Any non-empty
/// string is accepted so legacy keys can be adopted unchanged.
pub struct EncryptionKey(SecretString);

impl EncryptionKey {
    /// Generate fresh key material from the system CSPRNG.
    pub fn generate() -> Result<Self, MyDolphinError> {
        let bytes = Zeroizing::new(crypto::random_bytes::<{ crypto::KEY_LEN }>()?);
        Ok(Self(SecretString::from(URL_SAFE.encode(&bytes[..]))))
    }

    /// Wrap existing key material. Empty material is rejected.
    pub fn from_material(material: impl Into<String>) -> Result<Self, MyDolphinError> {
        let material = material.into();
        if material.trim().is_empty() {
            return Err(MyDolphinError::Crypto(
                "encryption key material is empty".to_string(),
            ));
        }
        Ok(Self(SecretString::from(material)))
    }

    /// The key material, for persisting into the entry's record.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Clone for EncryptionKey {
    fn clone(&self) -> Self {
        Self(SecretString::from(self.expose().to_string()))
    }
}

impl PartialEq for EncryptionKey {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for EncryptionKey {}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_are_fernet_shaped_and_unique() {
        let a = EncryptionKey::generate().unwrap();
        let b = EncryptionKey::generate().unwrap();
        assert_eq!(a.expose().len(), 44);
        assert_eq!(URL_SAFE.decode(a.expose()).unwrap().len(), 32);
        assert_ne!(a, b);
    }

    #[test]
    fn arbitrary_material_is_kept_verbatim() {
        let key = EncryptionKey::from_material("abc123").unwrap();
        assert_eq!(key.expose(), "abc123");
    }

    #[test]
    fn empty_material_is_rejected() {
        assert!(EncryptionKey::from_material("  \n").unwrap_err().is_crypto());
    }

    #[test]
    fn debug_is_redacted() {
        let key = EncryptionKey::from_material("abc123").unwrap();
        assert!(!format!("{key:?}").contains("abc123"));
    }
}
