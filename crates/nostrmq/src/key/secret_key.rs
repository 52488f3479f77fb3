// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Secret key

use core::fmt;
use core::ops::Deref;
use core::str::FromStr;

use secp256k1::rand::rngs::OsRng;
use secp256k1::rand::Rng;

use super::Error;
use crate::util::hex;

/// Secret key
///
/// The `Debug` implementation is redacted: secret material must never reach
/// logs or error messages.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(secp256k1::SecretKey);

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey(<redacted>)")
    }
}

impl Deref for SecretKey {
    type Target = secp256k1::SecretKey;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<secp256k1::SecretKey> for SecretKey {
    fn from(inner: secp256k1::SecretKey) -> Self {
        Self(inner)
    }
}

impl SecretKey {
    /// Parse from a 64-char hex string
    pub fn from_hex<S>(hex: S) -> Result<Self, Error>
    where
        S: AsRef<str>,
    {
        let bytes: [u8; 32] =
            hex::decode_to_array(hex.as_ref()).map_err(|_| Error::InvalidSecretKey)?;
        Self::from_slice(&bytes)
    }

    /// Parse from 32 bytes
    pub fn from_slice(data: &[u8]) -> Result<Self, Error> {
        Ok(Self(
            secp256k1::SecretKey::from_slice(data).map_err(|_| Error::InvalidSecretKey)?,
        ))
    }

    /// Generate a random secret key
    pub fn generate() -> Self {
        Self::generate_with_rng(&mut OsRng)
    }

    /// Generate a random secret key using a custom random source
    pub fn generate_with_rng<R>(rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut data: [u8; 32] = [0u8; 32];
        loop {
            rng.fill(&mut data[..]);
            // All-zero or over-curve-order values are rejected; retry.
            if let Ok(secret_key) = secp256k1::SecretKey::from_slice(&data) {
                return Self(secret_key);
            }
        }
    }

    /// Get secret key as 32 bytes
    #[inline]
    pub fn to_secret_bytes(&self) -> [u8; 32] {
        self.0.secret_bytes()
    }

    /// Get secret key as lowercase hex.
    ///
    /// Deliberately not a `Display` impl, so the secret can't leak through
    /// format strings by accident.
    #[inline]
    pub fn to_secret_hex(&self) -> String {
        hex::encode(self.to_secret_bytes())
    }
}

impl FromStr for SecretKey {
    type Err = Error;

    fn from_str(hex: &str) -> Result<Self, Self::Err> {
        Self::from_hex(hex)
    }
}
