//! Encryption-at-rest envelope using AES-256-GCM.
//!
//! The whole plaintext file is sealed as one blob:
//! `ENG` + base64(`nonce (12 bytes) || ciphertext || tag (16 bytes)`).
//! The `ENG` marker lets a reader tell sealed files from plaintext ones.

use aes_gcm::{
    aead::{generic_array::GenericArray, Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Prefix marking a sealed file
pub const SEALED_MARKER: &str = "ENG";
/// Size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// Size of the GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;
/// Size of the GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Derive the cipher key from a passphrase with SHA-256.
pub fn derive_key(passphrase: &str) -> [u8; KEY_SIZE] {
    Sha256::digest(passphrase.as_bytes()).into()
}

/// Whether `text` carries the sealed marker
pub fn is_sealed(text: &str) -> bool {
    text.starts_with(SEALED_MARKER)
}

/// Seals and opens whole-file payloads with one key.
pub struct Envelope {
    cipher: Aes256Gcm,
}

impl Envelope {
    /// Creates an envelope from a raw key.
    pub fn new(key: &[u8; KEY_SIZE]) -> Self {
        let cipher = Aes256Gcm::new(GenericArray::from_slice(key));
        Self { cipher }
    }

    /// Creates an envelope keyed from a passphrase. The passphrase is not kept.
    pub fn from_passphrase(passphrase: &str) -> Self {
        Self::new(&derive_key(passphrase))
    }

    /// Encrypts `plaintext` under a fresh random nonce.
    pub fn seal(&self, plaintext: &str) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| Error::Encryption("encryption error".to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend(ciphertext);

        Ok(format!("{}{}", SEALED_MARKER, STANDARD.encode(sealed)))
    }

    /// Decrypts a payload produced by [`seal`](Self::seal).
    ///
    /// # Errors
    ///
    /// `Decryption` if the marker is missing, the encoding or nonce is
    /// malformed, or authentication fails (wrong key or tampered data).
    pub fn open(&self, sealed: &str) -> Result<String> {
        let encoded = sealed
            .trim()
            .strip_prefix(SEALED_MARKER)
            .ok_or_else(|| Error::Decryption("sealed marker is missing".to_string()))?;

        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| Error::Decryption(format!("invalid encoding: {}", e)))?;

        if bytes.len() < NONCE_SIZE + TAG_SIZE {
            return Err(Error::Decryption("ciphertext too short".to_string()));
        }

        let nonce = Nonce::from_slice(&bytes[..NONCE_SIZE]);
        let plaintext = self
            .cipher
            .decrypt(nonce, &bytes[NONCE_SIZE..])
            .map_err(|_| Error::Decryption("wrong key or tampered data".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|_| Error::Decryption("plaintext is not valid UTF-8".to_string()))
    }
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope")
            .field("cipher", &"Aes256Gcm")
            .finish()
    }
}
