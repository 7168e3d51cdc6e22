// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Compile-time wire constants and buffer sizing.
//!
//! These are normative (part of the wire format or of the reference
//! implementation's resource budget) rather than user-tunable.

/// Compile-time cap on an encoded UADP datagram, mirroring the C
/// implementation's `PUBSUB_BUFFER_SIZE`. A single UDP/Ethernet datagram
/// never needs to exceed this; [`Error::WriteOverflow`](crate::Error::WriteOverflow)
/// is returned if an encode would.
pub const PUBSUB_BUFFER_SIZE: usize = 1024 * 64;

/// Only UADP version 1 is supported by this codec (OPC UA Part 14).
pub const UADP_VERSION: u8 = 1;

/// Length in bytes of the security nonce on the wire (`keyNonce` length
/// field is fixed at 8 for this implementation: 4 bytes of group key nonce
/// prefix are implicit in the key material, 4 bytes are the per-message
/// random nonce carried on the wire).
pub const SECURITY_NONCE_LEN: usize = 8;

/// Length in bytes of the per-message random nonce component
/// (`msg_nonce_random`), the trailing portion of the 8-byte wire nonce.
pub const MSG_NONCE_RANDOM_LEN: usize = 4;

/// HMAC-SHA256 signature length in bytes, appended to the encoded message
/// when `Sign` or `SignAndEncrypt` is active.
pub const SIGNATURE_LEN: usize = 32;
