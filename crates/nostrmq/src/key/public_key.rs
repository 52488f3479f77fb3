// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Public key

use core::fmt;
use core::ops::Deref;
use core::str::FromStr;

use secp256k1::XOnlyPublicKey;
use serde::de::Error as DeserializerError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::Error;
use crate::util::hex;

/// Public key (x-only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublicKey(XOnlyPublicKey);

impl Deref for PublicKey {
    type Target = XOnlyPublicKey;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<XOnlyPublicKey> for PublicKey {
    fn from(inner: XOnlyPublicKey) -> Self {
        Self(inner)
    }
}

impl PublicKey {
    /// Parse from a 64-char hex string
    pub fn from_hex<S>(hex: S) -> Result<Self, Error>
    where
        S: AsRef<str>,
    {
        let bytes: [u8; 32] =
            hex::decode_to_array(hex.as_ref()).map_err(|_| Error::InvalidPublicKey)?;
        Self::from_slice(&bytes)
    }

    /// Parse from 32 bytes
    pub fn from_slice(data: &[u8]) -> Result<Self, Error> {
        Ok(Self(
            XOnlyPublicKey::from_slice(data).map_err(|_| Error::InvalidPublicKey)?,
        ))
    }

    /// Get public key as 32 bytes
    #[inline]
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.serialize()
    }

    /// Get public key as lowercase hex
    #[inline]
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

impl FromStr for PublicKey {
    type Err = Error;

    fn from_str(hex: &str) -> Result<Self, Self::Err> {
        Self::from_hex(hex)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex: String = String::deserialize(deserializer)?;
        Self::from_hex(hex).map_err(DeserializerError::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEX: &str = "379e863e8357163b5bce5d2688dc4f1dcc2d505222fb8d74db600f30535dfdfe";

    #[test]
    fn test_hex_round_trip() {
        let public_key = PublicKey::from_hex(HEX).unwrap();
        assert_eq!(public_key.to_hex(), HEX);
        assert_eq!(public_key.to_string(), HEX);
    }

    #[test]
    fn test_serde_hex_string() {
        let public_key = PublicKey::from_hex(HEX).unwrap();
        let json: String = serde_json::to_string(&public_key).unwrap();
        assert_eq!(json, format!("\"{HEX}\""));
        let back: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, public_key);
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(
            PublicKey::from_hex("not-hex").unwrap_err(),
            Error::InvalidPublicKey
        );
        assert_eq!(
            PublicKey::from_hex("abcd").unwrap_err(),
            Error::InvalidPublicKey
        );
    }
}
