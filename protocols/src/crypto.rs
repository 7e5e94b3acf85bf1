//! AES-256-CBC as produced by `openssl enc -aes-256-cbc -md md5 -nosalt -k <passphrase>`,
//! which is what deployed agents pipe their output through.

use aes::Aes256;
use cbc::cipher::block_padding::{NoPadding, Pkcs7};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use md5::{Digest, Md5};

pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 16;
pub const BLOCK_LEN: usize = 16;

type Aes256CbcDec = cbc::Decryptor<Aes256>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    #[error("no ciphertext")]
    Empty,
    #[error("ciphertext length {0} is not a multiple of the block size")]
    Unaligned(usize),
}

/// OpenSSL `EVP_BytesToKey` with MD5, no salt and a single round:
/// `D_i = MD5(D_{i-1} || passphrase)` until key and IV are covered.
pub fn derive_key_and_iv(passphrase: &[u8]) -> ([u8; KEY_LEN], [u8; IV_LEN]) {
    let mut derived: Vec<u8> = Vec::with_capacity(KEY_LEN + IV_LEN + 16);
    let mut block: Vec<u8> = Vec::new();

    while derived.len() < KEY_LEN + IV_LEN {
        let mut hasher: Md5 = Md5::new();
        hasher.update(&block);
        hasher.update(passphrase);
        block = hasher.finalize().to_vec();
        derived.extend_from_slice(&block);
    }

    let mut key: [u8; KEY_LEN] = [0u8; KEY_LEN];
    let mut iv: [u8; IV_LEN] = [0u8; IV_LEN];
    key.copy_from_slice(&derived[..KEY_LEN]);
    iv.copy_from_slice(&derived[KEY_LEN..KEY_LEN + IV_LEN]);
    (key, iv)
}

/// Decrypts an agent package and strips OpenSSL's fill bytes.
///
/// The fill is removed by trusting the last byte as a count; it is not checked
/// against a real padding pattern. A wrong passphrase therefore usually yields
/// garbage (possibly truncated) instead of an error.
pub fn decrypt_package(ciphertext: &[u8], passphrase: &str) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.is_empty() {
        return Err(CryptoError::Empty);
    }
    if ciphertext.len() % BLOCK_LEN != 0 {
        return Err(CryptoError::Unaligned(ciphertext.len()));
    }

    let (key, iv) = derive_key_and_iv(passphrase.as_bytes());
    let mut buffer: Vec<u8> = ciphertext.to_vec();
    let plain_len: usize = Aes256CbcDec::new(&key.into(), &iv.into())
        .decrypt_padded_mut::<NoPadding>(&mut buffer)
        .map_err(|_| CryptoError::Unaligned(ciphertext.len()))?
        .len();
    buffer.truncate(plain_len);

    Ok(strip_fill_bytes(buffer))
}

/// Counterpart of [`decrypt_package`], PKCS#7-padded like `openssl enc`.
pub fn encrypt_package(plaintext: &[u8], passphrase: &str) -> Vec<u8> {
    let (key, iv) = derive_key_and_iv(passphrase.as_bytes());
    Aes256CbcEnc::new(&key.into(), &iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

fn strip_fill_bytes(mut plain: Vec<u8>) -> Vec<u8> {
    let fill: usize = plain.last().copied().map_or(0, usize::from);
    plain.truncate(plain.len().saturating_sub(fill));
    plain
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
