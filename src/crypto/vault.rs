//! Vault blob encryption: SHA-256 password key, AES-256-CBC, IV prefix.
//!
//! Every `index.vault` and every file part is one blob:
//!
//! ```text
//! [ iv: 16 bytes ][ AES-256-CBC ciphertext, PKCS#7 padded ]
//! ```
//!
//! There is no salt and no authentication tag.

use super::CryptoError;
use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Length of the IV prefix on every blob.
pub const IV_LEN: usize = 16;

type BlobDecryptor = cbc::Decryptor<Aes256>;
type BlobEncryptor = cbc::Encryptor<Aes256>;

/// Derive the vault key: the raw SHA-256 digest of the UTF-8 password.
pub fn derive_key(password: &str) -> Zeroizing<[u8; 32]> {
    let digest = Sha256::digest(password.as_bytes());
    let mut key = Zeroizing::new([0u8; 32]);
    key.copy_from_slice(&digest);
    key
}

/// Decrypt one blob with a key freshly derived from `password`.
///
/// Fails with [`CryptoError::Decrypt`] when the blob is shorter than the IV,
/// the ciphertext is not block-aligned, or the padding is invalid. A wrong
/// password that happens to produce valid padding returns garbage instead.
pub fn open_blob(blob: &[u8], password: &str) -> Result<Vec<u8>, CryptoError> {
    if blob.len() < IV_LEN {
        return Err(CryptoError::Decrypt);
    }
    let (iv, ciphertext) = blob.split_at(IV_LEN);
    let key = derive_key(password);
    BlobDecryptor::new_from_slices(&key[..], iv)
        .map_err(|_| CryptoError::Decrypt)?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::Decrypt)
}

/// Encrypt `plaintext` into a blob with a random IV.
pub fn seal_blob(plaintext: &[u8], password: &str) -> Result<Vec<u8>, CryptoError> {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);
    let key = derive_key(password);
    let ciphertext = BlobEncryptor::new_from_slices(&key[..], &iv)
        .map_err(|e| CryptoError::Encrypt(e.to_string()))?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut blob = Vec::with_capacity(IV_LEN + ciphertext.len());
    blob.extend_from_slice(&iv);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_sha256_of_password() {
        let key = derive_key("abc");
        // SHA-256("abc")
        assert_eq!(
            key[..4],
            [0xba, 0x78, 0x16, 0xbf],
            "first bytes of the well-known abc digest"
        );
    }

    #[test]
    fn seal_then_open_round_trip() {
        let blob = seal_blob(b"vault index body", "hunter2").unwrap();
        assert_eq!(open_blob(&blob, "hunter2").unwrap(), b"vault index body");
    }

    #[test]
    fn blob_layout_is_iv_then_whole_blocks() {
        let blob = seal_blob(b"0123456789", "pw").unwrap();
        // 10 bytes pad to one 16-byte block
        assert_eq!(blob.len(), IV_LEN + 16);

        let blob = seal_blob(&[7u8; 16], "pw").unwrap();
        // a full block gains a whole padding block
        assert_eq!(blob.len(), IV_LEN + 32);
    }

    #[test]
    fn random_iv_per_blob() {
        let a = seal_blob(b"same", "pw").unwrap();
        let b = seal_blob(b"same", "pw").unwrap();
        assert_ne!(a[..IV_LEN], b[..IV_LEN]);
    }

    #[test]
    fn empty_plaintext_round_trips() {
        let blob = seal_blob(b"", "pw").unwrap();
        assert_eq!(open_blob(&blob, "pw").unwrap(), b"");
    }

    #[test]
    fn wrong_password_fails_or_differs() {
        let plaintext = b"{\"Files\":{},\"Vaults\":{},\"IdCounter\":0}".to_vec();
        let blob = seal_blob(&plaintext, "right").unwrap();
        match open_blob(&blob, "wrong") {
            Err(err) => assert_eq!(err, CryptoError::Decrypt),
            Ok(bytes) => assert_ne!(bytes, plaintext),
        }
    }

    #[test]
    fn short_blob_is_decrypt_error() {
        assert_eq!(open_blob(&[0u8; 15], "pw"), Err(CryptoError::Decrypt));
        assert_eq!(open_blob(&[], "pw"), Err(CryptoError::Decrypt));
    }

    #[test]
    fn iv_only_blob_is_decrypt_error() {
        assert_eq!(open_blob(&[1u8; IV_LEN], "pw"), Err(CryptoError::Decrypt));
    }

    #[test]
    fn misaligned_ciphertext_is_decrypt_error() {
        let mut blob = seal_blob(b"hello", "pw").unwrap();
        blob.pop();
        assert_eq!(open_blob(&blob, "pw"), Err(CryptoError::Decrypt));
    }
}
