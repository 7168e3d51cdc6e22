// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! OPC UA `Variant` field encoding (scalar only — see Non-goals).
//!
//! Only the builtin types actually carried by DataSetMessage fields in this
//! implementation are represented; raw-data and DataValue field encodings
//! (DataSetFlags1 bits 1-2 values `01`/`10`) are out of scope, so every
//! field on the wire uses the Variant encoding: a single type-id byte
//! (bits 6-7 clear — no array, no array-dimensions, matching the scalar-only
//! DataSetMessage fields this crate produces and consumes) followed by the
//! value body.

use crate::core::Buffer;
use crate::error::{Error, Result};

/// OPC UA builtin type id, as written in the low 6 bits of a Variant's
/// encoding byte (Part 6 Table: Builtin type ids). Only the subset needed
/// by PubSub DataSetMessage fields is implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BuiltinType {
    Boolean = 1,
    SByte = 2,
    Byte = 3,
    Int16 = 4,
    UInt16 = 5,
    Int32 = 6,
    UInt32 = 7,
    Int64 = 8,
    UInt64 = 9,
    Float = 10,
    Double = 11,
    String = 12,
}

impl TryFrom<u8> for BuiltinType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            1 => Self::Boolean,
            2 => Self::SByte,
            3 => Self::Byte,
            4 => Self::Int16,
            5 => Self::UInt16,
            6 => Self::Int32,
            7 => Self::UInt32,
            8 => Self::Int64,
            9 => Self::UInt64,
            10 => Self::Float,
            11 => Self::Double,
            12 => Self::String,
            other => return Err(Error::ReadUnsupportedVariantType(other)),
        })
    }
}

/// A single DataSetMessage field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    Boolean(bool),
    SByte(i8),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    /// `None` encodes as an OPC UA null string (length `-1`).
    String(Option<String>),
}

impl Variant {
    pub fn builtin_type(&self) -> BuiltinType {
        match self {
            Self::Boolean(_) => BuiltinType::Boolean,
            Self::SByte(_) => BuiltinType::SByte,
            Self::Byte(_) => BuiltinType::Byte,
            Self::Int16(_) => BuiltinType::Int16,
            Self::UInt16(_) => BuiltinType::UInt16,
            Self::Int32(_) => BuiltinType::Int32,
            Self::UInt32(_) => BuiltinType::UInt32,
            Self::Int64(_) => BuiltinType::Int64,
            Self::UInt64(_) => BuiltinType::UInt64,
            Self::Float(_) => BuiltinType::Float,
            Self::Double(_) => BuiltinType::Double,
            Self::String(_) => BuiltinType::String,
        }
    }

    /// Encode the type-id byte followed by the value body.
    pub fn encode(&self, buf: &mut Buffer) -> Result<()> {
        buf.write_u8(self.builtin_type() as u8)?;
        match self {
            Self::Boolean(v) => buf.write_u8(u8::from(*v)),
            Self::SByte(v) => buf.write_i8(*v),
            Self::Byte(v) => buf.write_u8(*v),
            Self::Int16(v) => buf.write_i16_le(*v),
            Self::UInt16(v) => buf.write_u16_le(*v),
            Self::Int32(v) => buf.write_i32_le(*v),
            Self::UInt32(v) => buf.write_u32_le(*v),
            Self::Int64(v) => buf.write_i64_le(*v),
            Self::UInt64(v) => buf.write_u64_le(*v),
            Self::Float(v) => buf.write_f32_le(*v),
            Self::Double(v) => buf.write_f64_le(*v),
            Self::String(v) => buf.write_string(v.as_deref()),
        }
    }

    /// Decode a type-id byte followed by its value body.
    pub fn decode(buf: &mut Buffer) -> Result<Self> {
        let tag_byte = buf.read_u8()?;
        // bits 6-7 (array / array-dimensions present) are never set by this
        // implementation's encoder; reject anything that claims otherwise
        // rather than silently misreading the body.
        if tag_byte & 0xC0 != 0 {
            return Err(Error::ReadUnsupportedVariantType(tag_byte));
        }
        let builtin = BuiltinType::try_from(tag_byte)?;
        Ok(match builtin {
            BuiltinType::Boolean => Self::Boolean(buf.read_u8()? != 0),
            BuiltinType::SByte => Self::SByte(buf.read_i8()?),
            BuiltinType::Byte => Self::Byte(buf.read_u8()?),
            BuiltinType::Int16 => Self::Int16(buf.read_i16_le()?),
            BuiltinType::UInt16 => Self::UInt16(buf.read_u16_le()?),
            BuiltinType::Int32 => Self::Int32(buf.read_i32_le()?),
            BuiltinType::UInt32 => Self::UInt32(buf.read_u32_le()?),
            BuiltinType::Int64 => Self::Int64(buf.read_i64_le()?),
            BuiltinType::UInt64 => Self::UInt64(buf.read_u64_le()?),
            BuiltinType::Float => Self::Float(buf.read_f32_le()?),
            BuiltinType::Double => Self::Double(buf.read_f64_le()?),
            BuiltinType::String => Self::String(buf.read_string()?),
        })
    }
}
