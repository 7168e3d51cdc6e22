// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Crate-wide error type.
//!
//! Variants are grouped along the code-space partition used by the C
//! implementation this crate is modeled on: `Write_*` (encode-time),
//! `Read_*` (decode-time malformed bytes), `Read_NoMatching*` (decode-time
//! filter miss — not a fault), `Unsupported_*` (feature not implemented),
//! and `Json*` (JSON encoder). The decoder stops at the first error and
//! returns it; it never panics on malformed input.

use std::fmt;

/// Result alias used throughout this crate.
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ========================================================================
    // Write_* — encode-time buffer/security failure
    // ========================================================================
    /// A write would exceed the buffer's `max_capacity`.
    WriteOverflow,
    /// Encoding was attempted with a configuration the encoder refuses to
    /// emit (e.g. a `PublisherId::String` with no string support asked of
    /// the decoder side, or JSON + security requested together).
    WriteInvalidConfig(&'static str),
    /// The security key lookup rejected the write (missing key material).
    WriteSecurityFailed,

    // ========================================================================
    // Read_* — decode-time malformed bytes
    // ========================================================================
    /// Ran out of bytes while reading a fixed-size primitive.
    ReadShortFailed,
    /// Ran out of bytes while reading a variable-length field (string,
    /// variant body).
    ReadIntFailed,
    /// A DSM's `validFlag` bit (DataSetFlags1 bit 0) was not set. Per the
    /// upstream C source this aborts the whole NetworkMessage, not just the
    /// offending DSM (see DESIGN.md Open Question (a)).
    ReadInvalidBit,
    /// A declared per-DSM size did not match the number of bytes actually
    /// consumed while decoding that DSM.
    ReadDsmSizeCheckFailed,
    /// A Variant carried a builtin type id this crate does not implement.
    ReadUnsupportedVariantType(u8),

    // ========================================================================
    // Read_NoMatching* — decode-time filter miss, not an application error
    // ========================================================================
    /// No configured reader group matched this message's
    /// `{publisherId, groupId, groupVersion}`; decoding stopped at the group
    /// header. The message is simply not addressed to this subscriber.
    NoMatchingGroup,
    /// The group matched but every DSM's writer id was rejected by
    /// `get_reader`; decoding stopped after the payload header.
    NoMatchingReader,

    // ========================================================================
    // Unsupported_* — decode-time feature not implemented
    // ========================================================================
    UnsupportedVersion,
    /// The NetworkMessage omitted GroupHeader or PayloadHeader; this
    /// implementation always emits both and expects both on decode.
    UnsupportedMessageLayout,
    UnsupportedFlags1,
    UnsupportedFlags2,
    /// A DSM declared `RawData` or `DataValue` field encoding; only
    /// `Variant` is implemented.
    UnsupportedFieldEncoding,
    UnsupportedPublisherIdType,
    UnsupportedGroupFlags,
    UnsupportedDeltaFrame,
    UnsupportedSecurityFooter,
    UnsupportedSecurityKeyReset,

    // ========================================================================
    // Security — cryptographic failures (always discard the whole message)
    // ========================================================================
    /// `SecurityEnabled` was clear on the wire but the resolved reader
    /// expects `Sign` or `SignAndEncrypt`.
    SecurityNoneFailed,
    /// `get_security` returned no context for the token id on the wire.
    SecurityUnknownToken,
    /// HMAC-SHA256 verification failed.
    SecuritySignatureInvalid,
    /// The security sequence number was not strictly newer than the last
    /// one accepted for this `{tokenId, publisherId, groupId}` (replay).
    SecurityReplay,
    /// The security nonce was not exactly 8 bytes.
    SecurityInvalidNonceLength,

    // ========================================================================
    // Json* — JSON (ua-data) encoder
    // ========================================================================
    /// A Variant's builtin type has no JSON encoding in this implementation
    /// (e.g. Int64/UInt64 are deliberately unsupported, per the upstream
    /// source).
    JsonNetworkMessageNotSupported(u8),
    /// JSON encoding was requested for a message with security enabled;
    /// JSON security is out of scope.
    JsonSecurityUnsupported,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteOverflow => write!(f, "write would exceed buffer max_capacity"),
            Self::WriteInvalidConfig(reason) => write!(f, "invalid encode configuration: {reason}"),
            Self::WriteSecurityFailed => write!(f, "security context rejected the encode"),
            Self::ReadShortFailed => write!(f, "unexpected end of buffer reading a primitive"),
            Self::ReadIntFailed => write!(f, "unexpected end of buffer reading a variable-length field"),
            Self::ReadInvalidBit => write!(f, "DataSetMessage validFlag bit was not set"),
            Self::ReadDsmSizeCheckFailed => write!(f, "declared DSM size did not match decoded length"),
            Self::ReadUnsupportedVariantType(id) => write!(f, "unsupported variant builtin type id {id}"),
            Self::NoMatchingGroup => write!(f, "no reader group matched this network message"),
            Self::NoMatchingReader => write!(f, "no reader matched any DataSetMessage in this network message"),
            Self::UnsupportedVersion => write!(f, "unsupported UADP version"),
            Self::UnsupportedMessageLayout => write!(f, "NetworkMessage is missing GroupHeader or PayloadHeader"),
            Self::UnsupportedFlags1 => write!(f, "unsupported ExtendedFlags1 (timestamp/picoseconds)"),
            Self::UnsupportedFlags2 => write!(f, "unsupported ExtendedFlags2 (chunk/promoted-fields/message-type)"),
            Self::UnsupportedFieldEncoding => write!(f, "only Variant field encoding is supported"),
            Self::UnsupportedPublisherIdType => write!(f, "unsupported PublisherId type (string)"),
            Self::UnsupportedGroupFlags => write!(f, "unsupported GroupFlags (NetworkMessageNumber/SequenceNumber)"),
            Self::UnsupportedDeltaFrame => write!(f, "DeltaFrame DataSetMessages are not supported"),
            Self::UnsupportedSecurityFooter => write!(f, "security footer is not supported"),
            Self::UnsupportedSecurityKeyReset => write!(f, "security key-reset flow is not supported"),
            Self::SecurityNoneFailed => write!(f, "reader expects signed/encrypted messages but none was sent"),
            Self::SecurityUnknownToken => write!(f, "no security context for token id on the wire"),
            Self::SecuritySignatureInvalid => write!(f, "HMAC-SHA256 signature verification failed"),
            Self::SecurityReplay => write!(f, "security sequence number is not newer (replay)"),
            Self::SecurityInvalidNonceLength => write!(f, "security nonce was not 8 bytes"),
            Self::JsonNetworkMessageNotSupported(id) => write!(f, "JSON encoding not supported for builtin type id {id}"),
            Self::JsonSecurityUnsupported => write!(f, "JSON encoding of secured messages is not supported"),
        }
    }
}

impl std::error::Error for Error {}
