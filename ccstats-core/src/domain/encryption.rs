//! Encryption domain models

use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// Default AES key length in bits
pub const DEFAULT_KEY_LENGTH: u32 = 256;
/// Largest key AES supports
pub const MAX_KEY_LENGTH: u32 = 256;
/// Default PBKDF2 iteration count
pub const DEFAULT_KDF_ITERATIONS: u32 = 65536;
/// Highest PBKDF2 iteration count accepted from settings or a store file
pub const MAX_KDF_ITERATIONS: u32 = 10 * DEFAULT_KDF_ITERATIONS;

pub const SALT_LEN: usize = 20;
pub const IV_LEN: usize = 16;
pub const BLOCK_LEN: usize = 16;

/// An AES key size
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyLength {
    Aes128,
    Aes192,
    #[default]
    Aes256,
}

impl KeyLength {
    pub fn bits(self) -> u32 {
        match self {
            KeyLength::Aes128 => 128,
            KeyLength::Aes192 => 192,
            KeyLength::Aes256 => 256,
        }
    }

    pub fn bytes(self) -> usize {
        self.bits() as usize / 8
    }

    /// Exact AES key sizes only
    pub fn from_bits(bits: u32) -> Result<Self> {
        match bits {
            128 => Ok(KeyLength::Aes128),
            192 => Ok(KeyLength::Aes192),
            256 => Ok(KeyLength::Aes256),
            other => Err(Error::validation(format!(
                "unsupported AES key length: {} bits",
                other
            ))),
        }
    }
}

/// Raised once when a requested key length exceeds the allowed policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyLengthAdvisory {
    pub requested: u32,
    pub effective: u32,
}

impl KeyLengthAdvisory {
    pub fn message(&self) -> String {
        format!(
            "maximum AES key length policy is {} bits; key length limited from {} to {} bits",
            self.effective, self.requested, self.effective
        )
    }
}

/// Resolve a requested key length against a policy maximum.
///
/// Accepts 128, 192, 256 or any power of two above 256. Requests above the
/// policy are clamped and reported through the advisory.
pub fn resolve_key_length(
    requested: u32,
    policy_max: u32,
) -> Result<(KeyLength, Option<KeyLengthAdvisory>)> {
    let max = KeyLength::from_bits(policy_max)
        .map_err(|_| Error::validation(format!("invalid key length policy: {} bits", policy_max)))?;

    if requested > MAX_KEY_LENGTH && !requested.is_power_of_two() {
        return Err(Error::validation(format!(
            "key length must be a power of two, got {} bits",
            requested
        )));
    }

    if requested > max.bits() {
        let advisory = KeyLengthAdvisory {
            requested,
            effective: max.bits(),
        };
        return Ok((max, Some(advisory)));
    }

    Ok((KeyLength::from_bits(requested)?, None))
}

/// Output of one encryption call: everything decryption needs besides the
/// password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherBlock {
    pub iv: [u8; IV_LEN],
    pub ciphertext: Vec<u8>,
    pub salt: [u8; SALT_LEN],
}

impl CipherBlock {
    /// Hex of `iv || ciphertext || salt`
    pub fn to_hex(&self) -> String {
        let mut framed = Vec::with_capacity(IV_LEN + self.ciphertext.len() + SALT_LEN);
        framed.extend_from_slice(&self.iv);
        framed.extend_from_slice(&self.ciphertext);
        framed.extend_from_slice(&self.salt);
        hex::encode(framed)
    }

    /// Split a hex block back into its parts
    pub fn from_hex(text: &str) -> Result<Self> {
        let bytes = hex::decode(text.trim())
            .map_err(|e| Error::decryption(format!("block is not valid hex: {}", e)))?;

        if bytes.len() < IV_LEN + BLOCK_LEN + SALT_LEN {
            return Err(Error::decryption(format!(
                "block too short: {} bytes",
                bytes.len()
            )));
        }

        let (iv, rest) = bytes.split_at(IV_LEN);
        let (ciphertext, salt) = rest.split_at(rest.len() - SALT_LEN);
        if ciphertext.len() % BLOCK_LEN != 0 {
            return Err(Error::decryption(format!(
                "ciphertext length {} is not a multiple of the block size",
                ciphertext.len()
            )));
        }

        let mut block = CipherBlock {
            iv: [0u8; IV_LEN],
            ciphertext: ciphertext.to_vec(),
            salt: [0u8; SALT_LEN],
        };
        block.iv.copy_from_slice(iv);
        block.salt.copy_from_slice(salt);
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_key_length_within_policy() {
        let (length, advisory) = resolve_key_length(192, 256).unwrap();
        assert_eq!(length, KeyLength::Aes192);
        assert!(advisory.is_none());
    }

    #[test]
    fn test_resolve_key_length_clamps() {
        let (length, advisory) = resolve_key_length(256, 128).unwrap();
        assert_eq!(length, KeyLength::Aes128);
        assert_eq!(
            advisory,
            Some(KeyLengthAdvisory {
                requested: 256,
                effective: 128
            })
        );

        let (length, advisory) = resolve_key_length(512, 256).unwrap();
        assert_eq!(length, KeyLength::Aes256);
        assert!(advisory.unwrap().message().contains("512"));
    }

    #[test]
    fn test_resolve_key_length_rejects_invalid() {
        assert!(resolve_key_length(100, 256).is_err());
        assert!(resolve_key_length(300, 256).is_err());
        assert!(resolve_key_length(64, 256).is_err());
        assert!(resolve_key_length(256, 100).is_err());
    }

    #[test]
    fn test_block_framing() {
        let block = CipherBlock {
            iv: [1u8; IV_LEN],
            ciphertext: vec![2u8; 32],
            salt: [3u8; SALT_LEN],
        };
        let text = block.to_hex();
        assert_eq!(text.len(), (IV_LEN + 32 + SALT_LEN) * 2);
        assert!(text.starts_with("0101"));
        assert!(text.ends_with("0303"));
        assert_eq!(CipherBlock::from_hex(&text).unwrap(), block);
    }

    #[test]
    fn test_block_rejects_garbage() {
        assert!(CipherBlock::from_hex("not hex").unwrap_err().is_decryption());
        assert!(CipherBlock::from_hex("abcd").unwrap_err().is_decryption());

        // 16 + 17 + 20 bytes: ciphertext not block aligned
        let odd = hex::encode(vec![0u8; IV_LEN + 17 + SALT_LEN]);
        assert!(CipherBlock::from_hex(&odd).is_err());
    }
}
