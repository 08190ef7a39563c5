//! AES-256-GCM encryption of stored credentials.

use crate::error::{Result, SecurityError};
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Length of the random nonce prepended to every ciphertext.
const NONCE_LEN: usize = 12;

/// Encryption service for stored provider API keys.
#[derive(Clone)]
pub struct Encryption {
    key: Zeroizing<[u8; 32]>,
}

impl Encryption {
    /// Create from 32 raw key bytes.
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() != 32 {
            return Err(SecurityError::InvalidKey("key must be 32 bytes".to_string()));
        }

        let mut key_array = Zeroizing::new([0u8; 32]);
        key_array.copy_from_slice(key);

        Ok(Self { key: key_array })
    }

    /// Create from a hex-encoded 32-byte key.
    pub fn from_hex(hex_key: &str) -> Result<Self> {
        let key = hex::decode(hex_key)
            .map_err(|e| SecurityError::InvalidKey(format!("invalid hex key: {e}")))?;
        Self::new(&key)
    }

    /// Derive a key from an arbitrary passphrase via SHA-256.
    ///
    /// This is how deployments configure `ENCRYPTION_KEY` as a plain secret
    /// string rather than raw key material.
    #[must_use]
    pub fn from_passphrase(passphrase: &str) -> Self {
        let digest = Sha256::digest(passphrase.as_bytes());
        let mut key_array = Zeroizing::new([0u8; 32]);
        key_array.copy_from_slice(&digest);
        Self { key: key_array }
    }

    /// Generate a new random key.
    #[must_use]
    pub fn generate_key() -> [u8; 32] {
        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        key
    }

    /// Encrypt with AES-256-GCM; output is `nonce || ciphertext`.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let cipher = Aes256Gcm::new_from_slice(&*self.key)
            .map_err(|e| SecurityError::Encryption(format!("failed to create cipher: {e}")))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| SecurityError::Encryption(format!("encryption failed: {e}")))?;

        let mut result = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend(ciphertext);

        Ok(result)
    }

    /// Decrypt `nonce || ciphertext` produced by [`Self::encrypt`].
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.len() < NONCE_LEN {
            return Err(SecurityError::Decryption("ciphertext too short".to_string()));
        }

        let cipher = Aes256Gcm::new_from_slice(&*self.key)
            .map_err(|e| SecurityError::Decryption(format!("failed to create cipher: {e}")))?;

        let nonce = Nonce::from_slice(&ciphertext[..NONCE_LEN]);

        cipher
            .decrypt(nonce, &ciphertext[NONCE_LEN..])
            .map_err(|e| SecurityError::Decryption(format!("decryption failed: {e}")))
    }

    /// Encrypt a string and return base64.
    pub fn encrypt_string(&self, plaintext: &str) -> Result<String> {
        let encrypted = self.encrypt(plaintext.as_bytes())?;
        Ok(base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            encrypted,
        ))
    }

    /// Decrypt a base64 string produced by [`Self::encrypt_string`].
    pub fn decrypt_string(&self, ciphertext: &str) -> Result<String> {
        let data = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, ciphertext)
            .map_err(|e| SecurityError::Decryption(format!("invalid base64: {e}")))?;
        let decrypted = self.decrypt(&data)?;
        String::from_utf8(decrypted)
            .map_err(|e| SecurityError::Decryption(format!("invalid UTF-8: {e}")))
    }
}

impl std::fmt::Debug for Encryption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encryption")
            .field("key", &"[REDACTED]")
            .finish()
    }
}
