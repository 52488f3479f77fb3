// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Keys
//!
//! The long-term identity of a node: a secp256k1 secret key and its derived
//! x-only public key, hex-encoded on every external interface.

use core::fmt;
use core::str::FromStr;
use std::sync::OnceLock;

use secp256k1::rand::rngs::OsRng;
use secp256k1::rand::Rng;
use secp256k1::schnorr::Signature;
use secp256k1::{Keypair, Message, XOnlyPublicKey};

pub mod public_key;
pub mod secret_key;

pub use self::public_key::PublicKey;
pub use self::secret_key::SecretKey;
use crate::SECP256K1;

/// [`Keys`] error
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// Invalid secret key
    #[error("invalid secret key")]
    InvalidSecretKey,
    /// Invalid public key
    #[error("invalid public key")]
    InvalidPublicKey,
}

/// Node keys
#[derive(Clone)]
pub struct Keys {
    /// Public key
    pub public_key: PublicKey,
    secret_key: SecretKey,
    key_pair: OnceLock<Keypair>,
}

impl fmt::Debug for Keys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keys")
            .field("public_key", &self.public_key)
            .finish()
    }
}

impl PartialEq for Keys {
    fn eq(&self, other: &Self) -> bool {
        self.public_key == other.public_key
    }
}

impl Eq for Keys {}

impl Keys {
    /// Initialize keys from a secret key.
    ///
    /// Internally constructs the [`Keypair`] and derives the [`PublicKey`].
    pub fn new(secret_key: SecretKey) -> Self {
        let key_pair: Keypair = Keypair::from_secret_key(&SECP256K1, &secret_key);
        let (public_key, _) = XOnlyPublicKey::from_keypair(&key_pair);

        Self {
            public_key: PublicKey::from(public_key),
            secret_key,
            key_pair: OnceLock::from(key_pair),
        }
    }

    /// Parse a secret key from hex and compose keys
    #[inline]
    pub fn parse<S>(secret_key: S) -> Result<Self, Error>
    where
        S: AsRef<str>,
    {
        let secret_key: SecretKey = SecretKey::from_hex(secret_key)?;
        Ok(Self::new(secret_key))
    }

    /// Generate random keys
    #[inline]
    pub fn generate() -> Self {
        Self::generate_with_rng(&mut OsRng)
    }

    /// Generate random keys using a custom random source
    #[inline]
    pub fn generate_with_rng<R>(rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        Self::new(SecretKey::generate_with_rng(rng))
    }

    /// Get public key
    #[inline]
    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    /// Get secret key
    #[inline]
    pub fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    #[inline]
    fn key_pair(&self) -> &Keypair {
        self.key_pair
            .get_or_init(|| Keypair::from_secret_key(&SECP256K1, &self.secret_key))
    }

    /// Create a Schnorr signature of `message` (BIP-340).
    #[inline]
    pub fn sign_schnorr(&self, message: &Message) -> Signature {
        SECP256K1.sign_schnorr_with_rng(message, self.key_pair(), &mut OsRng)
    }
}

impl FromStr for Keys {
    type Err = Error;

    /// Try to parse [`Keys`] from a **secret key** hex string
    #[inline]
    fn from_str(secret_key: &str) -> Result<Self, Self::Err> {
        Self::parse(secret_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_derives_public_key() {
        // Keys from the NIP-04 reference vectors
        let keys =
            Keys::parse("6b911fd37cdf5c81d4c0adb1ab7fa822ed253ab0ad9aa18d77257c88b29b718e")
                .unwrap();
        assert_eq!(keys.public_key().to_hex().len(), 64);

        // Same secret, same identity
        let again =
            Keys::parse("6b911fd37cdf5c81d4c0adb1ab7fa822ed253ab0ad9aa18d77257c88b29b718e")
                .unwrap();
        assert_eq!(keys, again);
    }

    #[test]
    fn test_sign_and_verify() {
        let keys = Keys::generate();
        let digest: [u8; 32] = [7u8; 32];
        let message = Message::from_digest(digest);
        let sig = keys.sign_schnorr(&message);
        assert!(SECP256K1
            .verify_schnorr(&sig, &message, &keys.public_key())
            .is_ok());
    }

    #[test]
    fn test_debug_hides_secret() {
        let keys = Keys::generate();
        let debug = format!("{keys:?}");
        assert!(!debug.contains(&keys.secret_key().to_secret_hex()));
    }
}
