// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Publisher-side preencoded-buffer optimization.
//!
//! A [`PreencodeCtx`] is built once from a [`NetworkMessage`] (a full
//! [`crate::codec::encode`]) and then cheaply [`PreencodeCtx::refresh`]ed on
//! every publication cycle: only the bytes that actually change — per-DSM
//! sequence numbers and fixed-size field values — are patched in place, with
//! no further allocation and no re-walk of the flags/header logic.
//!
//! `PreencodeCtx` never stores a back-pointer into the `NetworkMessage` it
//! was built from; `refresh` is always handed a fresh `&NetworkMessage`, so
//! there is no possibility of the two drifting out of sync via a stale
//! reference (also noted on [`crate::model::NetworkMessage`]).
//!
//! Security is out of scope for this fast path: a preencoded buffer is
//! built and refreshed unsecured, then handed to
//! [`crate::codec::encode`] machinery separately if signing/encryption is
//! required, since both apply a transform over the *entire* serialized
//! message and would otherwise have to be redone on every refresh anyway.

use crate::codec;
use crate::error::{Error, Result};
use crate::model::dataset_message::DataSetMessageType;
use crate::model::{NetworkMessage, PublisherId, Variant};

/// A preencoded wire buffer plus the byte offsets needed to patch it.
#[derive(Debug, Clone)]
pub struct PreencodeCtx {
    buffer: Vec<u8>,
    dsm_seq_offsets: Vec<Option<usize>>,
    dsm_field_offsets: Vec<Vec<Option<usize>>>,
}

impl PreencodeCtx {
    /// Encode `msg` once and record where its mutable fields live in the
    /// resulting buffer.
    pub fn build(msg: &NetworkMessage) -> Result<Self> {
        let buffer = codec::encode(msg, None)?;
        let (dsm_seq_offsets, dsm_field_offsets) = compute_offsets(msg)?;
        Ok(Self {
            buffer,
            dsm_seq_offsets,
            dsm_field_offsets,
        })
    }

    /// The current preencoded bytes, ready to send as-is.
    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Patch sequence numbers and fixed-size field values to match `msg`'s
    /// current state. `msg` must have the same shape (DSM count, field
    /// count, and field types) as the message this context was built from;
    /// a structural change returns [`Error::WriteInvalidConfig`] rather than
    /// silently corrupting the buffer.
    pub fn refresh(&mut self, msg: &NetworkMessage) -> Result<()> {
        if msg.dsms.len() != self.dsm_seq_offsets.len() {
            return Err(Error::WriteInvalidConfig("preencode refresh: DataSetMessage count changed"));
        }
        for (i, dsm) in msg.dsms.iter().enumerate() {
            if let Some(offset) = self.dsm_seq_offsets[i] {
                self.buffer[offset..offset + 2].copy_from_slice(&dsm.seq_num.to_le_bytes());
            }

            let field_offsets = &self.dsm_field_offsets[i];
            if dsm.fields.len() != field_offsets.len() {
                return Err(Error::WriteInvalidConfig("preencode refresh: field count changed"));
            }
            for (field, offset) in dsm.fields.iter().zip(field_offsets.iter()) {
                let Some(offset) = offset else {
                    // Variable-length (String) field: left at its build-time
                    // value, since patching it in place could change the
                    // message's total length.
                    continue;
                };
                write_fixed_field_at(&mut self.buffer, *offset, field)?;
            }
        }
        Ok(())
    }
}

fn write_fixed_field_at(buffer: &mut [u8], offset: usize, field: &Variant) -> Result<()> {
    match field {
        Variant::Boolean(v) => buffer[offset] = u8::from(*v),
        Variant::SByte(v) => buffer[offset] = *v as u8,
        Variant::Byte(v) => buffer[offset] = *v,
        Variant::Int16(v) => buffer[offset..offset + 2].copy_from_slice(&v.to_le_bytes()),
        Variant::UInt16(v) => buffer[offset..offset + 2].copy_from_slice(&v.to_le_bytes()),
        Variant::Int32(v) => buffer[offset..offset + 4].copy_from_slice(&v.to_le_bytes()),
        Variant::UInt32(v) => buffer[offset..offset + 4].copy_from_slice(&v.to_le_bytes()),
        Variant::Int64(v) => buffer[offset..offset + 8].copy_from_slice(&v.to_le_bytes()),
        Variant::UInt64(v) => buffer[offset..offset + 8].copy_from_slice(&v.to_le_bytes()),
        Variant::Float(v) => buffer[offset..offset + 4].copy_from_slice(&v.to_bits().to_le_bytes()),
        Variant::Double(v) => buffer[offset..offset + 8].copy_from_slice(&v.to_bits().to_le_bytes()),
        Variant::String(_) => {
            return Err(Error::WriteInvalidConfig("preencode cannot patch a String field in place"))
        }
    }
    Ok(())
}

/// Mirrors the byte layout [`crate::codec::encoder`] produces, without
/// writing anything, so offsets can be computed ahead of the first encode.
/// Any change to the encoder's wire layout must be reflected here too.
fn compute_offsets(msg: &NetworkMessage) -> Result<(Vec<Option<usize>>, Vec<Vec<Option<usize>>>)> {
    let mut pos = 1usize; // flags0
    if msg.header.requires_extended_flags1(false) {
        pos += 1;
    }
    if let Some(pid) = &msg.header.publisher_id {
        pos += publisher_id_wire_size(pid);
    }
    pos += 1 + 2 + 4; // GroupFlags, group id, group version
    pos += 1 + 2 * msg.dsms.len(); // dsm_count, writer ids
    if msg.dsms.len() > 1 {
        pos += 2 * msg.dsms.len(); // per-DSM size table
    }

    let mut dsm_seq_offsets = Vec::with_capacity(msg.dsms.len());
    let mut dsm_field_offsets = Vec::with_capacity(msg.dsms.len());

    for dsm in &msg.dsms {
        pos += 1; // DataSetFlags1
        if dsm.conf.message_type != DataSetMessageType::KeyFrame {
            pos += 1; // DataSetFlags2
        }

        let seq_offset = if dsm.conf.seq_num_flag {
            let offset = pos;
            pos += 2;
            Some(offset)
        } else {
            None
        };
        if dsm.conf.status_flag {
            pos += 2;
        }
        if dsm.conf.major_ver_flag {
            pos += 4;
        }
        if dsm.conf.minor_ver_flag {
            pos += 4;
        }
        if dsm.conf.timestamp_flag {
            pos += 8;
        }
        if dsm.conf.picos_flag {
            pos += 2;
        }

        let mut field_offsets = Vec::with_capacity(dsm.fields.len());
        if dsm.conf.message_type != DataSetMessageType::KeepAlive {
            pos += 2; // field count
            for field in &dsm.fields {
                pos += 1; // type id byte
                match fixed_field_size(field) {
                    Some(size) => {
                        field_offsets.push(Some(pos));
                        pos += size;
                    }
                    None => {
                        field_offsets.push(None);
                        pos += variable_field_size(field);
                    }
                }
            }
        }

        dsm_seq_offsets.push(seq_offset);
        dsm_field_offsets.push(field_offsets);
    }

    Ok((dsm_seq_offsets, dsm_field_offsets))
}

fn publisher_id_wire_size(pid: &PublisherId) -> usize {
    match pid {
        PublisherId::Byte(_) => 1,
        PublisherId::UInt16(_) => 2,
        PublisherId::UInt32(_) => 4,
        PublisherId::UInt64(_) => 8,
        PublisherId::String(s) => 4 + s.len(),
    }
}

fn fixed_field_size(field: &Variant) -> Option<usize> {
    Some(match field {
        Variant::Boolean(_) | Variant::SByte(_) | Variant::Byte(_) => 1,
        Variant::Int16(_) | Variant::UInt16(_) => 2,
        Variant::Int32(_) | Variant::UInt32(_) | Variant::Float(_) => 4,
        Variant::Int64(_) | Variant::UInt64(_) | Variant::Double(_) => 8,
        Variant::String(_) => return None,
    })
}

fn variable_field_size(field: &Variant) -> usize {
    match field {
        Variant::String(None) => 4,
        Variant::String(Some(s)) => 4 + s.len(),
        _ => unreachable!("fixed_field_size already handles every non-String variant"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NetworkMessageBuilder, PublisherId};

    fn sample(seq: u16, a: u32, b: f32) -> NetworkMessage {
        let mut msg = NetworkMessageBuilder::new(1)
            .publisher_id(PublisherId::Byte(46))
            .group(42, 1000)
            .build();
        let dsm = msg.add_dataset_message(255, DataSetMessageType::KeyFrame);
        dsm.set_sequence_number(seq);
        dsm.push_field(Variant::UInt32(a));
        dsm.push_field(Variant::Float(b));
        msg
    }

    #[test]
    fn build_matches_a_plain_encode() {
        let msg = sample(1, 100, 1.5);
        let ctx = PreencodeCtx::build(&msg).unwrap();
        assert_eq!(ctx.bytes(), codec::encode(&msg, None).unwrap());
    }

    #[test]
    fn refresh_patches_sequence_number_and_fields_in_place() {
        let original = sample(1, 100, 1.5);
        let mut ctx = PreencodeCtx::build(&original).unwrap();

        let updated = sample(2, 200, -3.25);
        ctx.refresh(&updated).unwrap();

        assert_eq!(ctx.bytes(), codec::encode(&updated, None).unwrap());
    }

    #[test]
    fn refresh_rejects_a_changed_field_count() {
        let original = sample(1, 100, 1.5);
        let mut ctx = PreencodeCtx::build(&original).unwrap();

        let mut changed = sample(2, 200, -3.25);
        changed.dataset_message_mut(0).unwrap().push_field(Variant::Byte(1));

        assert!(matches!(ctx.refresh(&changed), Err(Error::WriteInvalidConfig(_))));
    }
}
