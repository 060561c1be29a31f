//! Cipher codec - password based AES-CBC encryption of small payloads
//!
//! Every call draws a fresh 20 byte salt and 16 byte IV, derives the key with
//! PBKDF2-HMAC-SHA1 from a SHA-256 digest of the password, and returns a
//! [`CipherBlock`] carrying the salt and IV next to the ciphertext. Nothing
//! secret is kept on the codec between calls.

use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::Rng;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::domain::result::{Error, Result};
use crate::domain::{
    resolve_key_length, CipherBlock, KeyLength, KeyLengthAdvisory, DEFAULT_KDF_ITERATIONS,
    IV_LEN, MAX_KDF_ITERATIONS, MAX_KEY_LENGTH, SALT_LEN,
};

/// Password based encryption with a fixed key length and KDF cost
#[derive(Debug, Clone)]
pub struct CipherCodec {
    key_length: KeyLength,
    iterations: u32,
    advisory: Option<KeyLengthAdvisory>,
}

impl Default for CipherCodec {
    fn default() -> Self {
        Self {
            key_length: KeyLength::Aes256,
            iterations: DEFAULT_KDF_ITERATIONS,
            advisory: None,
        }
    }
}

impl CipherCodec {
    /// Codec for `requested_bits`, limited by AES's own maximum
    pub fn new(requested_bits: u32) -> Result<Self> {
        Self::with_policy(requested_bits, MAX_KEY_LENGTH, DEFAULT_KDF_ITERATIONS)
    }

    /// Codec with an explicit key length policy and KDF iteration count
    pub fn with_policy(requested_bits: u32, policy_max: u32, iterations: u32) -> Result<Self> {
        if iterations == 0 || iterations > MAX_KDF_ITERATIONS {
            return Err(Error::validation(format!(
                "KDF iteration count must be between 1 and {}",
                MAX_KDF_ITERATIONS
            )));
        }
        let (key_length, advisory) = resolve_key_length(requested_bits, policy_max)?;
        Ok(Self {
            key_length,
            iterations,
            advisory,
        })
    }

    pub fn key_length(&self) -> KeyLength {
        self.key_length
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Set when the requested key length had to be clamped
    pub fn advisory(&self) -> Option<KeyLengthAdvisory> {
        self.advisory
    }

    /// Derive the AES key for one salt
    fn derive_key(&self, password: &str, salt: &[u8]) -> Vec<u8> {
        // Unsalted single-round digest first; kept for file compatibility
        let hashed = Sha256::digest(password.as_bytes());

        let mut key = vec![0u8; self.key_length.bytes()];
        pbkdf2::pbkdf2_hmac::<Sha1>(hashed.as_slice(), salt, self.iterations, &mut key);
        key
    }

    /// Encrypt `plaintext` under a key derived from `password`
    pub fn encrypt(&self, password: &str, plaintext: &[u8]) -> Result<CipherBlock> {
        let mut rng = rand::thread_rng();
        let salt: [u8; SALT_LEN] = rng.gen();
        let iv: [u8; IV_LEN] = rng.gen();

        let key = self.derive_key(password, &salt);
        let ciphertext = match self.key_length {
            KeyLength::Aes128 => encrypt_with::<cbc::Encryptor<Aes128>>(&key, &iv, plaintext)?,
            KeyLength::Aes192 => encrypt_with::<cbc::Encryptor<Aes192>>(&key, &iv, plaintext)?,
            KeyLength::Aes256 => encrypt_with::<cbc::Encryptor<Aes256>>(&key, &iv, plaintext)?,
        };

        Ok(CipherBlock {
            iv,
            ciphertext,
            salt,
        })
    }

    /// Decrypt a block produced by [`CipherCodec::encrypt`] with the same key length
    pub fn decrypt(&self, password: &str, block: &CipherBlock) -> Result<Vec<u8>> {
        let key = self.derive_key(password, &block.salt);
        match self.key_length {
            KeyLength::Aes128 => {
                decrypt_with::<cbc::Decryptor<Aes128>>(&key, &block.iv, &block.ciphertext)
            }
            KeyLength::Aes192 => {
                decrypt_with::<cbc::Decryptor<Aes192>>(&key, &block.iv, &block.ciphertext)
            }
            KeyLength::Aes256 => {
                decrypt_with::<cbc::Decryptor<Aes256>>(&key, &block.iv, &block.ciphertext)
            }
        }
    }

    /// Encrypt text into a hex framed block
    pub fn encrypt_str(&self, password: &str, text: &str) -> Result<String> {
        Ok(self.encrypt(password, text.as_bytes())?.to_hex())
    }

    /// Decrypt a hex framed block back into text
    pub fn decrypt_str(&self, password: &str, block: &str) -> Result<String> {
        let block = CipherBlock::from_hex(block)?;
        let plaintext = self.decrypt(password, &block)?;
        String::from_utf8(plaintext)
            .map_err(|_| Error::decryption("plaintext is not valid UTF-8"))
    }
}

fn encrypt_with<C>(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>
where
    C: BlockEncryptMut + KeyIvInit,
{
    let cipher = C::new_from_slices(key, iv)
        .map_err(|e| Error::Encryption(format!("invalid key or IV length: {}", e)))?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn decrypt_with<C>(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>
where
    C: BlockDecryptMut + KeyIvInit,
{
    let cipher = C::new_from_slices(key, iv)
        .map_err(|e| Error::decryption(format!("invalid key or IV length: {}", e)))?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Error::decryption("bad padding (wrong password or corrupted data)"))
}
