//! Password-based encryption for the vault and text tools.
//!
//! Two unrelated schemes live here and must not be mixed:
//!
//! | Scheme | Key | Cipher | Envelope |
//! |--------|-----|--------|----------|
//! | [`vault`] | SHA-256(password) | AES-256-CBC, PKCS#7 | `iv[16] ‖ ciphertext` |
//! | [`text`] | PBKDF2-HMAC-SHA256, 100 000 rounds, salted | AES-256-GCM | `b64(salt).b64(iv).b64(ct‖tag)` |
//!
//! The vault scheme has no integrity check: a wrong password usually fails on
//! padding but can also produce garbage. The text scheme is authenticated and
//! rejects wrong passwords and tampered data deterministically.
//!
//! Keys are derived from the password on every call and zeroized on drop.
//! Nothing is cached.

pub mod text;
pub mod vault;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Required input (text, bundle, password) was empty.
    #[error("{0}")]
    Validation(String),
    /// The input does not have the envelope shape.
    #[error("Invalid encrypted data format: {0}")]
    Format(String),
    /// The cipher rejected the input: wrong key, corrupted or tampered data.
    #[error("Decryption failed. Check password or data integrity.")]
    Decrypt,
    #[error("Encryption failed: {0}")]
    Encrypt(String),
}
