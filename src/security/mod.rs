// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-group security context and the key/nonce lookup seams a caller
//! plugs in.
//!
//! This crate never generates randomness or reads a clock itself: the
//! message nonce is produced by whatever [`NonceSource`]
//! the embedder supplies, and key material is produced by whatever
//! [`SecurityKeyLookup`] the embedder supplies. This mirrors how the
//! upstream C implementation receives a `SOPC_PubSubSKS_Manager` rather than
//! touching OpenSSL's RNG directly.

#[cfg(feature = "security")]
pub mod crypto;
pub mod error;

pub use error::SecurityError;

/// Sign-only vs sign-and-encrypt. `None` means the security
/// header is omitted entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecurityMode {
    #[default]
    None,
    Sign,
    SignAndEncrypt,
}

/// Key material and replay state for one `{tokenId, publisherId,
/// writerGroupId}` triple. Constructed by the embedder from
/// whatever key store it maintains; this crate only ever reads from it.
#[derive(Debug, Clone)]
pub struct SecurityCtx {
    pub mode: SecurityMode,
    pub token_id: u32,
    /// Signing key (HMAC-SHA256); always present when `mode != None`.
    pub signing_key: Vec<u8>,
    /// Encryption key (AES-128 or AES-256); present when `mode ==
    /// SignAndEncrypt`.
    pub encrypt_key: Vec<u8>,
    /// The group's 4-byte key nonce, distinct from the
    /// per-message random nonce.
    pub key_nonce: [u8; 4],
    /// Outgoing security sequence number, incremented by the caller after
    /// each successful encode (this crate does not mutate it itself since
    /// a `&SecurityCtx` is all encode needs for confidentiality/integrity;
    /// the embedder owns sequencing).
    pub sequence_number: u32,
}

impl SecurityCtx {
    pub fn new_signed(token_id: u32, signing_key: Vec<u8>, key_nonce: [u8; 4]) -> Self {
        Self {
            mode: SecurityMode::Sign,
            token_id,
            signing_key,
            encrypt_key: Vec::new(),
            key_nonce,
            sequence_number: 0,
        }
    }

    pub fn new_encrypted(
        token_id: u32,
        signing_key: Vec<u8>,
        encrypt_key: Vec<u8>,
        key_nonce: [u8; 4],
    ) -> Self {
        Self {
            mode: SecurityMode::SignAndEncrypt,
            token_id,
            signing_key,
            encrypt_key,
            key_nonce,
            sequence_number: 0,
        }
    }
}

/// Looks up the [`SecurityCtx`] to use for a given token id, keyed by the
/// `{tokenId, publisherId, writerGroupId}` triple.
/// Implemented by the embedder against its own key store (e.g. an
/// `SOPC_PubSubSKS_Manager`-style security keys service); decoding fails with
/// [`crate::Error::SecurityUnknownToken`] when this returns `None`.
///
/// Returns a mutable reference because the decoder advances
/// `SecurityCtx::sequence_number` after a message passes the replay check,
/// so the next message's sequence number is checked against this one, not
/// a stale snapshot.
pub trait SecurityKeyLookup {
    fn lookup(
        &mut self,
        token_id: u32,
        publisher_id: Option<&crate::model::PublisherId>,
        writer_group_id: u16,
    ) -> Option<&mut SecurityCtx>;
}

/// 32-bit sequence number replay check (OPC UA Part 14 Table 75):
/// `received` is accepted iff its forward distance from `last`, computed
/// modulo 2^32, is strictly positive and less than half the number space.
/// An exact repeat (`received == last`, distance 0) is a replay, not a
/// fresh message — a duplicate retransmission of the last-accepted message
/// must not be re-delivered.
pub fn sequence_number_is_fresh(last: u32, received: u32) -> bool {
    let delta = received.wrapping_sub(last);
    delta != 0 && (delta as u64) < (1u64 << 30)
}

/// 16-bit per-writer DSM sequence number freshness check:
/// `(received - 1 - last) mod 2^16 < 2^15`, computed via wrapping u16 math.
pub fn dsm_sequence_number_is_fresh(last: u16, received: u16) -> bool {
    let delta = received.wrapping_sub(1).wrapping_sub(last);
    (delta as u32) < (1u32 << 15)
}

/// Produces the 4-byte random component of the per-message nonce.
/// Kept as a caller-supplied seam rather than an internal
/// RNG so this crate has no platform-randomness dependency.
pub trait NonceSource {
    fn next_nonce(&mut self) -> [u8; 4];
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticKeyStore(SecurityCtx);

    impl SecurityKeyLookup for StaticKeyStore {
        fn lookup(
            &mut self,
            token_id: u32,
            _publisher_id: Option<&crate::model::PublisherId>,
            _writer_group_id: u16,
        ) -> Option<&mut SecurityCtx> {
            if token_id == self.0.token_id {
                Some(&mut self.0)
            } else {
                None
            }
        }
    }

    #[test]
    fn lookup_rejects_unknown_token() {
        let mut store = StaticKeyStore(SecurityCtx::new_signed(7, vec![0u8; 32], [0; 4]));
        assert!(store.lookup(7, None, 42).is_some());
        assert!(store.lookup(8, None, 42).is_none());
    }

    #[test]
    fn sequence_number_freshness_accepts_forward_progress_and_rejects_replay() {
        let last: u32 = 1000;
        assert!(sequence_number_is_fresh(last, last + 1));
        assert!(sequence_number_is_fresh(last, last + (1 << 30) - 1));
        assert!(!sequence_number_is_fresh(last, last));
        assert!(!sequence_number_is_fresh(last, last - 1));
        assert!(!sequence_number_is_fresh(last, last + (1 << 30)));
        // wraparound: last near u32::MAX, received wrapped to a small value.
        assert!(sequence_number_is_fresh(u32::MAX - 1, 1));
    }

    #[test]
    fn dsm_sequence_number_freshness_accepts_forward_progress_and_rejects_replay() {
        assert!(dsm_sequence_number_is_fresh(10, 11));
        assert!(!dsm_sequence_number_is_fresh(10, 10));
        assert!(!dsm_sequence_number_is_fresh(10, 5));
    }
}
