// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Tagged identity of a publisher (NetworkMessageHeader field).

use crate::core::Buffer;
use crate::error::{Error, Result};

/// Type tag occupying bits 0..2 of ExtendedFlags1, per OPC UA Part 14.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PublisherIdType {
    Byte = 0,
    UInt16 = 1,
    UInt32 = 2,
    UInt64 = 3,
    String = 4,
}

/// Tagged union of the five wire representations a `PublisherId` may take.
///
/// `Byte` is packed directly into the header flags byte area (no
/// ExtendedFlags1 needed); every other variant forces ExtendedFlags1 to be
/// emitted so the decoder knows how many bytes of PublisherId follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublisherId {
    Byte(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    String(String),
}

impl PublisherId {
    pub fn type_tag(&self) -> PublisherIdType {
        match self {
            Self::Byte(_) => PublisherIdType::Byte,
            Self::UInt16(_) => PublisherIdType::UInt16,
            Self::UInt32(_) => PublisherIdType::UInt32,
            Self::UInt64(_) => PublisherIdType::UInt64,
            Self::String(_) => PublisherIdType::String,
        }
    }

    /// ExtendedFlags1 is only required when the PublisherId is not a plain
    /// byte (or when other ExtendedFlags1 triggers apply — see
    /// [`crate::model::header`]).
    pub fn requires_extended_flags1(&self) -> bool {
        !matches!(self, Self::Byte(_))
    }

    pub(crate) fn encode(&self, buf: &mut Buffer) -> Result<()> {
        match self {
            Self::Byte(v) => buf.write_u8(*v),
            Self::UInt16(v) => buf.write_u16_le(*v),
            Self::UInt32(v) => buf.write_u32_le(*v),
            Self::UInt64(v) => buf.write_u64_le(*v),
            Self::String(s) => buf.write_string(Some(s)),
        }
    }

    pub(crate) fn decode(buf: &mut Buffer, tag: PublisherIdType) -> Result<Self> {
        Ok(match tag {
            PublisherIdType::Byte => Self::Byte(buf.read_u8()?),
            PublisherIdType::UInt16 => Self::UInt16(buf.read_u16_le()?),
            PublisherIdType::UInt32 => Self::UInt32(buf.read_u32_le()?),
            PublisherIdType::UInt64 => Self::UInt64(buf.read_u64_le()?),
            // String PublisherIds are rejected on decode.
            PublisherIdType::String => return Err(Error::UnsupportedPublisherIdType),
        })
    }
}

impl TryFrom<u8> for PublisherIdType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            0 => Self::Byte,
            1 => Self::UInt16,
            2 => Self::UInt32,
            3 => Self::UInt64,
            4 => Self::String,
            _ => return Err(Error::UnsupportedPublisherIdType),
        })
    }
}
