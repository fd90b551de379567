//! SHA-512 hashing implementation for BTPC
//!
//! All hashing in BTPC uses SHA-512 for quantum resistance and Bitcoin compatibility.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq, ConstantTimeLess};

use crate::crypto::constants::SHA512_HASH_SIZE;

/// A SHA-512 hash value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hash([u8; SHA512_HASH_SIZE]);

impl Hash {
    /// Create a hash from a byte array
    pub fn from_bytes(bytes: [u8; SHA512_HASH_SIZE]) -> Self {
        Hash(bytes)
    }

    /// Create a hash from a slice, returning error if wrong length
    pub fn from_slice(slice: &[u8]) -> Result<Self, HashError> {
        if slice.len() != SHA512_HASH_SIZE {
            return Err(HashError::InvalidLength);
        }
        let mut bytes = [0u8; SHA512_HASH_SIZE];
        bytes.copy_from_slice(slice);
        Ok(Hash(bytes))
    }

    /// Create a hash from a hex string
    pub fn from_hex(hex: &str) -> Result<Self, HashError> {
        let hex = hex.trim_start_matches("0x");
        if hex.len() != SHA512_HASH_SIZE * 2 {
            return Err(HashError::InvalidHexLength);
        }

        let mut bytes = [0u8; SHA512_HASH_SIZE];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let hex_byte =
                std::str::from_utf8(chunk).map_err(|_| HashError::InvalidHexCharacter)?;
            bytes[i] =
                u8::from_str_radix(hex_byte, 16).map_err(|_| HashError::InvalidHexCharacter)?;
        }

        Ok(Hash(bytes))
    }

    /// Create a hash from an integer (for testing)
    pub fn from_int(value: u64) -> Self {
        let mut hasher = Sha512::new();
        hasher.update(value.to_le_bytes());
        Hash(hasher.finalize().into())
    }

    /// Create a zero hash
    pub fn zero() -> Self {
        Hash([0u8; SHA512_HASH_SIZE])
    }

    /// Create a random hash (for testing)
    pub fn random() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; SHA512_HASH_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Hash(bytes)
    }

    /// Get the hash as a byte array
    pub fn as_bytes(&self) -> &[u8; SHA512_HASH_SIZE] {
        &self.0
    }

    /// Get the hash as a slice
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Check if hash is zero (all bytes are 0)
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Single SHA-512 hash of data
    pub fn hash(data: &[u8]) -> Self {
        let mut hasher = Sha512::new();
        hasher.update(data);
        Hash(hasher.finalize().into())
    }

    /// Double SHA-512 hash of data (Bitcoin-compatible)
    pub fn double_sha512(data: &[u8]) -> Self {
        let first_hash = Self::hash(data);
        Self::hash(first_hash.as_slice())
    }

    /// Check if this hash meets the given difficulty target
    ///
    /// This uses constant-time comparison to prevent timing attacks.
    /// The comparison is lexicographic: returns true if self <= target.
    pub fn meets_target(&self, target: &[u8; SHA512_HASH_SIZE]) -> bool {
        // Constant-time lexicographic comparison for self <= target
        //
        // Algorithm:
        // - Track if we've found a definitive result (less or greater)
        // - For each byte position:
        //   - If already found difference, maintain that result
        //   - Otherwise, check current byte:
        //     - If self[i] < target[i]: result is true, mark as found
        //     - If self[i] > target[i]: result is false, mark as found
        //     - If self[i] == target[i]: continue to next byte
        // - If all bytes equal, result is true (equality part of <=)

        let mut result = Choice::from(1u8); // Assume true (equal case)
        let mut found_difference = Choice::from(0u8); // Haven't found difference yet

        for i in 0..SHA512_HASH_SIZE {
            let self_byte = self.0[i];
            let target_byte = target[i];

            // Constant-time comparisons
            let less = u8::ct_lt(&self_byte, &target_byte);
            let equal = u8::ct_eq(&self_byte, &target_byte);
            let greater = !(less | equal);

            // Compute what the new result should be if we need to update:
            // If self_byte < target_byte: result should be true (1)
            // If self_byte > target_byte: result should be false (0)
            let new_result = Choice::conditional_select(&Choice::from(0u8), &Choice::from(1u8), less);

            // Only update result if bytes are NOT equal AND we haven't found difference yet
            // This preserves the result when bytes are equal
            let should_update = !equal & !found_difference;
            result = Choice::conditional_select(&result, &new_result, should_update);

            // Mark that we found a difference if bytes are not equal
            found_difference |= !equal;
        }

        bool::from(result)
    }

    /// Calculate the difficulty of this hash
    pub fn difficulty(&self) -> f64 {
        // Count leading zero bits
        let mut leading_zeros = 0;
        for byte in &self.0 {
            if *byte == 0 {
                leading_zeros += 8;
            } else {
                leading_zeros += byte.leading_zeros() as usize;
                break;
            }
        }
        2.0_f64.powi(leading_zeros as i32)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::LowerHex for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; SHA512_HASH_SIZE]> for Hash {
    fn from(bytes: [u8; SHA512_HASH_SIZE]) -> Self {
        Hash(bytes)
    }
}

impl From<Hash> for [u8; SHA512_HASH_SIZE] {
    fn from(hash: Hash) -> Self {
        hash.0
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Error types for hash operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    /// Invalid hash length
    InvalidLength,
    /// Invalid hex string length
    InvalidHexLength,
    /// Invalid hex character
    InvalidHexCharacter,
}

impl fmt::Display for HashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashError::InvalidLength => write!(f, "Invalid hash length"),
            HashError::InvalidHexLength => write!(f, "Invalid hex string length"),
            HashError::InvalidHexCharacter => write!(f, "Invalid hex character"),
        }
    }
}

impl std::error::Error for HashError {}

// Custom serialization implementation for Hash
impl Serialize for Hash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where S: serde::Serializer {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: serde::Deserializer<'de> {
        if deserializer.is_human_readable() {
            let hex_str = String::deserialize(deserializer)?;
            Hash::from_hex(&hex_str).map_err(serde::de::Error::custom)
        } else {
            use serde::de::{self, Visitor};

            struct HashVisitor;

            impl<'de> Visitor<'de> for HashVisitor {
                type Value = [u8; SHA512_HASH_SIZE];

                fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                    formatter.write_str("a 64-byte array")
                }

                fn visit_bytes<E>(self, value: &[u8]) -> Result<Self::Value, E>
                where E: de::Error {
                    if value.len() == SHA512_HASH_SIZE {
                        let mut bytes = [0u8; SHA512_HASH_SIZE];
                        bytes.copy_from_slice(value);
                        Ok(bytes)
                    } else {
                        Err(E::custom(format!(
                            "expected {} bytes, got {}",
                            SHA512_HASH_SIZE,
                            value.len()
                        )))
                    }
                }

                fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
                where A: de::SeqAccess<'de> {
                    let mut bytes = [0u8; SHA512_HASH_SIZE];
                    for i in 0..SHA512_HASH_SIZE {
                        bytes[i] = seq
                            .next_element()?
                            .ok_or_else(|| de::Error::invalid_length(i, &self))?;
                    }
                    Ok(bytes)
                }
            }

            let bytes = deserializer.deserialize_bytes(HashVisitor)?;
            Ok(Hash(bytes))
        }
    }
}
