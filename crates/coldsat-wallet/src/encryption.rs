//! AES-256-CBC with PBKDF2-HMAC-SHA256 password stretching.
//!
//! These are the primitives under the wallet container. Padding is PKCS#7 on
//! encrypt; on decrypt it is stripped by hand so that a bad pad byte surfaces
//! as [`WalletError::BadPassword`] rather than a cipher error.

use aes::Aes256;
use cbc::cipher::block_padding::{NoPadding, Pkcs7};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use sha2::Sha256;
use zeroize::Zeroizing;

use coldsat_core::constants::{AES_BLOCK_LEN, IV_LEN, KEY_LEN};

use crate::error::WalletError;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Stretch a password into a 256-bit key.
pub fn derive_key(password: &[u8], salt: &[u8], iterations: u32) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, key.as_mut_slice());
    key
}

/// PKCS#7-pad and encrypt.
pub fn encrypt(key: &[u8; KEY_LEN], iv: &[u8; IV_LEN], plaintext: &[u8]) -> Vec<u8> {
    Aes256CbcEnc::new(&(*key).into(), &(*iv).into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

/// Decrypt and strip PKCS#7 padding.
///
/// The ciphertext must be a non-empty whole number of blocks
/// ([`WalletError::Format`] otherwise).
pub fn decrypt(
    key: &[u8; KEY_LEN],
    iv: &[u8; IV_LEN],
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>, WalletError> {
    if ciphertext.is_empty() || ciphertext.len() % AES_BLOCK_LEN != 0 {
        return Err(WalletError::Format(format!(
            "ciphertext length {} is not a positive multiple of {AES_BLOCK_LEN}",
            ciphertext.len()
        )));
    }
    let mut plaintext = Zeroizing::new(
        Aes256CbcDec::new(&(*key).into(), &(*iv).into())
            .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
            .map_err(|_| WalletError::BadPassword)?,
    );
    let len = unpadded_len(&plaintext)?;
    plaintext.truncate(len);
    Ok(plaintext)
}

/// Length of `buf` without its trailing PKCS#7 padding.
fn unpadded_len(buf: &[u8]) -> Result<usize, WalletError> {
    let pad = *buf.last().ok_or(WalletError::BadPassword)? as usize;
    if pad == 0 || pad > AES_BLOCK_LEN || pad > buf.len() {
        return Err(WalletError::BadPassword);
    }
    Ok(buf.len() - pad)
}
