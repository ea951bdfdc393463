// SPDX-FileCopyrightText: 2026 MyDolphin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Low-level AES-256-GCM seal/open and HKDF key derivation.
//!
//! Every call to [`seal`] draws a fresh random 96-bit nonce from the system
//! CSPRNG. Nonce reuse under one key would break GCM.

use mydolphin_core::MyDolphinError;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::hkdf;
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

/// GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

const HKDF_SALT: &[u8] = b"mydolphin-plus/credential-key";
const HKDF_INFO: &[u8] = b"aes-256-gcm/v1";

/// Encrypt `plaintext` with AES-256-GCM under a random nonce.
///
/// Returns `(ciphertext_with_tag, nonce)`; both are needed to decrypt.
pub fn seal(
    key: &[u8; KEY_LEN],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<(Vec<u8>, [u8; NONCE_LEN]), MyDolphinError> {
    let less_safe = less_safe_key(key)?;
    let nonce_bytes: [u8; NONCE_LEN] = random_bytes()?;

    let mut in_out = plaintext.to_vec();
    less_safe
        .seal_in_place_append_tag(
            Nonce::assume_unique_for_key(nonce_bytes),
            Aad::from(aad),
            &mut in_out,
        )
        .map_err(|_| MyDolphinError::Crypto("AES-256-GCM encryption failed".to_string()))?;

    Ok((in_out, nonce_bytes))
}

/// Decrypt and authenticate `ciphertext` (tag appended) with AES-256-GCM.
pub fn open(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, MyDolphinError> {
    let less_safe = less_safe_key(key)?;

    let mut in_out = ciphertext.to_vec();
    let plaintext = less_safe
        .open_in_place(
            Nonce::assume_unique_for_key(*nonce),
            Aad::from(aad),
            &mut in_out,
        )
        .map_err(|_| {
            MyDolphinError::Crypto(
                "AES-256-GCM decryption failed -- wrong key or corrupted data".to_string(),
            )
        })?;

    Ok(plaintext.to_vec())
}

/// Fill an `N`-byte array from the system CSPRNG.
pub fn random_bytes<const N: usize>() -> Result<[u8; N], MyDolphinError> {
    let mut out = [0u8; N];
    SystemRandom::new()
        .fill(&mut out)
        .map_err(|_| MyDolphinError::Crypto("system random generator failed".to_string()))?;
    Ok(out)
}

/// Derive the AES-256 key from stored key material with HKDF-SHA256.
///
/// Key material is an arbitrary string (generated keys are base64, legacy
/// keys are whatever the old file held), so it always goes through HKDF
/// instead of being used as raw key bytes.
pub fn derive_cipher_key(material: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>, MyDolphinError> {
    let prk = hkdf::Salt::new(hkdf::HKDF_SHA256, HKDF_SALT).extract(material);
    let info = [HKDF_INFO];
    let okm = prk
        .expand(&info, hkdf::HKDF_SHA256)
        .map_err(|_| MyDolphinError::Crypto("HKDF expansion failed".to_string()))?;

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    okm.fill(&mut key[..])
        .map_err(|_| MyDolphinError::Crypto("HKDF output fill failed".to_string()))?;
    Ok(key)
}

fn less_safe_key(key: &[u8; KEY_LEN]) -> Result<LessSafeKey, MyDolphinError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| MyDolphinError::Crypto("failed to create AES-256-GCM key".to_string()))?;
    Ok(LessSafeKey::new(unbound))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_roundtrip() {
        let key: [u8; KEY_LEN] = random_bytes().unwrap();
        let (ciphertext, nonce) = seal(&key, b"pool robot password", b"v1").unwrap();
        assert_eq!(ciphertext.len(), b"pool robot password".len() + TAG_LEN);
        assert_eq!(
            open(&key, &nonce, &ciphertext, b"v1").unwrap(),
            b"pool robot password"
        );
    }

    #[test]
    fn nonces_differ_between_seals() {
        let key: [u8; KEY_LEN] = random_bytes().unwrap();
        let (ct1, nonce1) = seal(&key, b"same", b"").unwrap();
        let (ct2, nonce2) = seal(&key, b"same", b"").unwrap();
        assert_ne!(nonce1, nonce2);
        assert_ne!(ct1, ct2);
    }

    #[test]
    fn wrong_key_fails() {
        let key1: [u8; KEY_LEN] = random_bytes().unwrap();
        let key2: [u8; KEY_LEN] = random_bytes().unwrap();
        let (ciphertext, nonce) = seal(&key1, b"secret", b"").unwrap();
        assert!(open(&key2, &nonce, &ciphertext, b"").unwrap_err().is_crypto());
    }

    #[test]
    fn wrong_aad_fails() {
        let key: [u8; KEY_LEN] = random_bytes().unwrap();
        let (ciphertext, nonce) = seal(&key, b"secret", b"v1").unwrap();
        assert!(open(&key, &nonce, &ciphertext, b"v2").is_err());
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let key: [u8; KEY_LEN] = random_bytes().unwrap();
        let (mut ciphertext, nonce) = seal(&key, b"do not tamper", b"").unwrap();
        ciphertext[0] ^= 0x01;
        assert!(open(&key, &nonce, &ciphertext, b"").is_err());
    }

    #[test]
    fn derivation_is_deterministic_and_material_sensitive() {
        let a1 = derive_cipher_key(b"abc123").unwrap();
        let a2 = derive_cipher_key(b"abc123").unwrap();
        let b = derive_cipher_key(b"abc124").unwrap();
        assert_eq!(*a1, *a2);
        assert_ne!(*a1, *b);
    }
}
