// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! NIP-04 payload encryption
//!
//! ECDH shared secret + AES-256-CBC, ciphertext encoded as
//! `<base64 ciphertext>?iv=<base64 iv>`.
//!
//! <https://github.com/nostr-protocol/nips/blob/master/04.md>

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes256;
use base64::engine::{general_purpose, Engine};
use cbc::{Decryptor, Encryptor};
use secp256k1::{ecdh, Parity};

use crate::key::{PublicKey, SecretKey};

type Aes256CbcEnc = Encryptor<Aes256>;
type Aes256CbcDec = Decryptor<Aes256>;

/// NIP-04 error
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// Invalid content format
    #[error("invalid content format")]
    InvalidContentFormat,
    /// Error while decoding from base64
    #[error("error while decoding from base64")]
    Base64Decode,
    /// Invalid initialization vector length
    #[error("invalid initialization vector length")]
    InvalidIvLength,
    /// Error while encoding to UTF-8
    #[error("error while encoding to UTF-8")]
    Utf8Encode,
    /// Wrong encryption block mode
    #[error("wrong encryption block mode: content must be encrypted using CBC mode")]
    WrongBlockMode,
}

/// Encrypt `text` for `public_key`
pub fn encrypt<T>(secret_key: &SecretKey, public_key: &PublicKey, text: T) -> Result<String, Error>
where
    T: AsRef<[u8]>,
{
    let key: [u8; 32] = generate_shared_key(secret_key, public_key);
    let iv: [u8; 16] = rand::random();

    let cipher = Aes256CbcEnc::new(&key.into(), &iv.into());
    let result: Vec<u8> = cipher.encrypt_padded_vec_mut::<Pkcs7>(text.as_ref());

    Ok(format!(
        "{}?iv={}",
        general_purpose::STANDARD.encode(result),
        general_purpose::STANDARD.encode(iv)
    ))
}

/// Decrypt content received from `public_key`
pub fn decrypt<S>(
    secret_key: &SecretKey,
    public_key: &PublicKey,
    encrypted_content: S,
) -> Result<String, Error>
where
    S: AsRef<str>,
{
    let parts: Vec<&str> = encrypted_content.as_ref().split("?iv=").collect();
    if parts.len() != 2 {
        return Err(Error::InvalidContentFormat);
    }

    let ciphertext: Vec<u8> = general_purpose::STANDARD
        .decode(parts[0])
        .map_err(|_| Error::Base64Decode)?;
    let iv: Vec<u8> = general_purpose::STANDARD
        .decode(parts[1])
        .map_err(|_| Error::Base64Decode)?;
    let iv: [u8; 16] = iv.try_into().map_err(|_| Error::InvalidIvLength)?;

    let key: [u8; 32] = generate_shared_key(secret_key, public_key);

    let cipher = Aes256CbcDec::new(&key.into(), &iv.into());
    let result: Vec<u8> = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| Error::WrongBlockMode)?;

    String::from_utf8(result).map_err(|_| Error::Utf8Encode)
}

/// Derive the shared AES key: the x coordinate of the ECDH point.
pub fn generate_shared_key(secret_key: &SecretKey, public_key: &PublicKey) -> [u8; 32] {
    // NIP-04 fixes the parity of the peer key to even
    let pk: secp256k1::PublicKey =
        secp256k1::PublicKey::from_x_only_public_key(**public_key, Parity::Even);
    let ssp: [u8; 64] = ecdh::shared_secret_point(&pk, secret_key);
    let mut shared_key: [u8; 32] = [0u8; 32];
    shared_key.copy_from_slice(&ssp[..32]);
    shared_key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Keys;

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let sender =
            Keys::parse("6b911fd37cdf5c81d4c0adb1ab7fa822ed253ab0ad9aa18d77257c88b29b718e")
                .unwrap();
        let receiver =
            Keys::parse("7b911fd37cdf5c81d4c0adb1ab7fa822ed253ab0ad9aa18d77257c88b29b718e")
                .unwrap();

        let content = String::from("Saturn, bringer of old age");

        let encrypted =
            encrypt(sender.secret_key(), &receiver.public_key(), &content).unwrap();
        assert_eq!(
            decrypt(receiver.secret_key(), &sender.public_key(), &encrypted).unwrap(),
            content
        );
    }

    #[test]
    fn test_decrypt_reference_vector() {
        let sender =
            Keys::parse("6b911fd37cdf5c81d4c0adb1ab7fa822ed253ab0ad9aa18d77257c88b29b718e")
                .unwrap();
        let receiver =
            Keys::parse("7b911fd37cdf5c81d4c0adb1ab7fa822ed253ab0ad9aa18d77257c88b29b718e")
                .unwrap();

        let encrypted_from_outside =
            "dJc+WbBgaFCD2/kfg1XCWJParplBDxnZIdJGZ6FCTOg=?iv=M6VxRPkMZu7aIdD+10xPuw==";
        assert_eq!(
            decrypt(
                receiver.secret_key(),
                &sender.public_key(),
                encrypted_from_outside
            )
            .unwrap(),
            "Saturn, bringer of old age"
        );
    }

    #[test]
    fn test_decrypt_malformed_content() {
        let sender = Keys::generate();
        let receiver = Keys::generate();

        assert_eq!(
            decrypt(
                sender.secret_key(),
                &receiver.public_key(),
                "invalidcontentformat"
            )
            .unwrap_err(),
            Error::InvalidContentFormat
        );
        assert_eq!(
            decrypt(
                sender.secret_key(),
                &receiver.public_key(),
                "badbase64?iv=encode"
            )
            .unwrap_err(),
            Error::Base64Decode
        );
        // AES-256-GCM payload: right format, wrong block mode
        assert_eq!(
            decrypt(
                Keys::parse("6b911fd37cdf5c81d4c0adb1ab7fa822ed253ab0ad9aa18d77257c88b29b718e")
                    .unwrap()
                    .secret_key(),
                &Keys::parse("7b911fd37cdf5c81d4c0adb1ab7fa822ed253ab0ad9aa18d77257c88b29b718e")
                    .unwrap()
                    .public_key(),
                "nseh0cQPEFID5C0CxYdcPwp091NhRQ==?iv=8PHy8/T19vf4+fr7/P3+/w=="
            )
            .unwrap_err(),
            Error::WrongBlockMode
        );
    }

    #[test]
    fn test_decrypt_with_wrong_key_fails() {
        let sender = Keys::generate();
        let receiver = Keys::generate();
        let intruder = Keys::generate();

        let encrypted = encrypt(sender.secret_key(), &receiver.public_key(), "payload").unwrap();
        assert!(decrypt(intruder.secret_key(), &sender.public_key(), &encrypted).is_err());
    }
}
