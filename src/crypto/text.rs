//! Authenticated text encryption: PBKDF2-HMAC-SHA256 + AES-256-GCM.
//!
//! The result of [`encrypt`] is a single printable bundle:
//!
//! ```text
//! base64(salt[16]) . base64(iv[12]) . base64(ciphertext ‖ tag[16])
//! ```
//!
//! Standard padded base64, exactly two `.` separators. Each bundle carries its
//! own random salt and IV; the key is re-derived from the password every time.

use super::CryptoError;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroizing;

pub const SALT_LEN: usize = 16;
pub const IV_LEN: usize = 12;
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Decoded `salt.iv.ciphertext` bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub salt: Vec<u8>,
    pub iv: Vec<u8>,
    /// Ciphertext with the 16-byte GCM tag appended.
    pub ciphertext: Vec<u8>,
}

impl FromStr for Envelope {
    type Err = CryptoError;

    fn from_str(bundle: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = bundle.trim().split('.').collect();
        if parts.len() != 3 {
            return Err(CryptoError::Format(format!(
                "expected 3 dot-separated segments, found {}",
                parts.len()
            )));
        }
        let decode = |name: &str, segment: &str| {
            STANDARD
                .decode(segment)
                .map_err(|_| CryptoError::Format(format!("{name} segment is not valid base64")))
        };
        let salt = decode("salt", parts[0])?;
        let iv = decode("iv", parts[1])?;
        let ciphertext = decode("ciphertext", parts[2])?;
        if iv.len() != IV_LEN {
            return Err(CryptoError::Format(format!(
                "iv must be {IV_LEN} bytes, found {}",
                iv.len()
            )));
        }
        Ok(Self {
            salt,
            iv,
            ciphertext,
        })
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            STANDARD.encode(&self.salt),
            STANDARD.encode(&self.iv),
            STANDARD.encode(&self.ciphertext)
        )
    }
}

/// Derive the 256-bit AES key from password and salt.
pub fn derive_key(password: &str, salt: &[u8]) -> Zeroizing<[u8; 32]> {
    let mut key = Zeroizing::new([0u8; 32]);
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key[..]);
    key
}

fn cipher_for(password: &str, salt: &[u8]) -> Result<Aes256Gcm, CryptoError> {
    let key = derive_key(password, salt);
    Aes256Gcm::new_from_slice(&key[..]).map_err(|e| CryptoError::Encrypt(e.to_string()))
}

/// Encrypt `plaintext` and return the bundled envelope string.
pub fn encrypt(plaintext: &str, password: &str) -> Result<String, CryptoError> {
    if plaintext.is_empty() || password.is_empty() {
        return Err(CryptoError::Validation(
            "Please enter text and a password.".into(),
        ));
    }

    let mut salt = vec![0u8; SALT_LEN];
    let mut iv = vec![0u8; IV_LEN];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut iv);

    let ciphertext = cipher_for(password, &salt)?
        .encrypt(Nonce::from_slice(&iv), plaintext.as_bytes())
        .map_err(|e| CryptoError::Encrypt(e.to_string()))?;

    Ok(Envelope {
        salt,
        iv,
        ciphertext,
    }
    .to_string())
}

/// Decrypt a bundled envelope string.
///
/// The envelope shape is checked before any key derivation, so malformed
/// input fails fast with [`CryptoError::Format`]. Tag mismatch (wrong
/// password, tampered bytes) is [`CryptoError::Decrypt`]. Plaintext is
/// decoded as UTF-8, replacing invalid sequences.
pub fn decrypt(bundle: &str, password: &str) -> Result<String, CryptoError> {
    if bundle.trim().is_empty() || password.is_empty() {
        return Err(CryptoError::Validation(
            "Please enter encrypted text and a password.".into(),
        ));
    }

    let envelope: Envelope = bundle.parse()?;
    let plaintext = cipher_for(password, &envelope.salt)?
        .decrypt(Nonce::from_slice(&envelope.iv), envelope.ciphertext.as_ref())
        .map_err(|_| CryptoError::Decrypt)?;

    Ok(String::from_utf8_lossy(&plaintext).into_owned())
}
