// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! AES-CTR encryption/decryption and HMAC-SHA256 signing for PubSub
//! security, per OPC UA Part 14 / Part 2 CryptoProvider profiles.
//!
//! # Security Properties
//!
//! - **Confidentiality**: AES-128/256 in counter mode.
//! - **Integrity**: HMAC-SHA256 (32-byte tag) over the final message bytes.
//! - **Counter**: `keyNonce || msgNonceRandom || securitySequenceNumber`,
//!   zero-padded to the 16-byte CTR counter block; never reused because the
//!   sequence number is caller-enforced monotonic (see
//!   [`crate::dispatch::SequenceTracker`]).
//!
//! Decryption is encryption again: AES-CTR XORs a keystream derived purely
//! from the counter, so running the same transform over ciphertext yields
//! plaintext (mirrors the upstream C source, which literally calls its
//! encrypt routine from its decrypt routine).

use aes::cipher::{KeyIvInit, StreamCipher};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::SIGNATURE_LEN;
use crate::security::error::SecurityError;

type Aes128Ctr = ctr::Ctr128BE<aes::Aes128>;
type Aes256Ctr = ctr::Ctr128BE<aes::Aes256>;

/// Assemble the 16-byte AES-CTR initial counter block from three
/// components: the group's 4-byte `keyNonce`, the message's 4-byte random
/// nonce, and the 4-byte security sequence number
/// (little-endian, matching the wire encoding). The trailing 4 bytes are
/// the block counter and start at zero.
pub fn build_counter_block(key_nonce: [u8; 4], msg_nonce_random: [u8; 4], seq_num: u32) -> [u8; 16] {
    let mut block = [0u8; 16];
    block[0..4].copy_from_slice(&key_nonce);
    block[4..8].copy_from_slice(&msg_nonce_random);
    block[8..12].copy_from_slice(&seq_num.to_le_bytes());
    // block[12..16] left at zero: initial block counter.
    block
}

/// Apply AES-CTR in place. Symmetric: the same call encrypts or decrypts.
pub fn aes_ctr_apply(key: &[u8], counter_block: [u8; 16], data: &mut [u8]) -> Result<(), SecurityError> {
    match key.len() {
        16 => {
            let mut cipher = Aes128Ctr::new(key.into(), &counter_block.into());
            cipher.apply_keystream(data);
        }
        32 => {
            let mut cipher = Aes256Ctr::new(key.into(), &counter_block.into());
            cipher.apply_keystream(data);
        }
        _ => return Err(SecurityError::InvalidKeyLength),
    }
    Ok(())
}

/// HMAC-SHA256 over `data`, keyed by `signing_key`.
pub fn hmac_sha256_sign(signing_key: &[u8], data: &[u8]) -> [u8; SIGNATURE_LEN] {
    let mut mac = Hmac::<Sha256>::new_from_slice(signing_key).expect("HMAC accepts any key length");
    mac.update(data);
    let tag = mac.finalize().into_bytes();
    let mut out = [0u8; SIGNATURE_LEN];
    out.copy_from_slice(&tag);
    out
}

/// Constant-time HMAC-SHA256 verification.
pub fn hmac_sha256_verify(signing_key: &[u8], data: &[u8], tag: &[u8]) -> Result<(), SecurityError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(signing_key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.verify_slice(tag).map_err(|_| SecurityError::SignatureInvalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aes_ctr_is_its_own_inverse() {
        let key = [0x11u8; 32];
        let block = build_counter_block([1, 2, 3, 4], [5, 6, 7, 8], 42);
        let plaintext = b"hello uadp payload".to_vec();

        let mut encrypted = plaintext.clone();
        aes_ctr_apply(&key, block, &mut encrypted).unwrap();
        assert_ne!(encrypted, plaintext);

        let mut decrypted = encrypted.clone();
        aes_ctr_apply(&key, block, &mut decrypted).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn rejects_wrong_key_length() {
        let key = [0u8; 10];
        let block = [0u8; 16];
        let mut data = vec![1, 2, 3];
        assert_eq!(
            aes_ctr_apply(&key, block, &mut data).unwrap_err(),
            SecurityError::InvalidKeyLength
        );
    }

    #[test]
    fn hmac_roundtrip_and_tamper_detection() {
        let key = b"signing-key-material";
        let data = b"header || encrypted-payload";
        let tag = hmac_sha256_sign(key, data);
        assert!(hmac_sha256_verify(key, data, &tag).is_ok());

        let mut tampered = data.to_vec();
        tampered[0] ^= 0xFF;
        assert_eq!(
            hmac_sha256_verify(key, &tampered, &tag).unwrap_err(),
            SecurityError::SignatureInvalid
        );
    }
}
