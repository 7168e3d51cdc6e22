// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! UADP encoder.
//!
//! Wire order is `NetworkMessageHeader | GroupHeader | PayloadHeader |
//! SecurityHeader | Payload (DataSetMessages, encrypted if configured) |
//! SecurityFooter (HMAC-SHA256 signature)`. The signature, when present,
//! covers every byte written before it — header through (encrypted)
//! payload — matching the upstream C encoder's `DataToSign` scope.

use crate::codec::{
    publisher_id_type_bits, DSM_FLAG_FIELD_ENCODING_MASK, DSM_FLAG_FLAGS2_PRESENT, DSM_FLAG_MAJOR_VERSION,
    DSM_FLAG_MINOR_VERSION, DSM_FLAG_SEQ_NUM, DSM_FLAG_STATUS, DSM_FLAG_VALID, EXT1_PUBLISHER_ID_TYPE_MASK,
    EXT1_SECURITY_ENABLED, FLAG_EXTENDED_FLAGS1, FLAG_GROUP_HEADER, FLAG_PAYLOAD_HEADER, FLAG_PUBLISHER_ID,
    GROUP_FLAG_GROUP_VERSION, GROUP_FLAG_WRITER_GROUP_ID, SECURITY_FLAG_ENCRYPTED, SECURITY_FLAG_SIGNED,
};
use crate::config::{PUBSUB_BUFFER_SIZE, SECURITY_NONCE_LEN};
use crate::core::Buffer;
use crate::error::{Error, Result};
use crate::model::dataset_message::FieldEncoding;
use crate::model::{DataSetMessage, DataSetMessageType, NetworkMessage};
use crate::security::SecurityCtx;

#[cfg(feature = "security")]
use crate::security::{crypto, SecurityMode};

/// Security material and per-message nonce needed to sign/encrypt on encode.
/// The caller owns sequencing: `ctx.sequence_number` is written verbatim to
/// the wire and is expected to have already been advanced for this message.
pub struct EncodeSecurity<'a> {
    pub ctx: &'a SecurityCtx,
    pub nonce_random: [u8; 4],
}

/// Encode `msg` to a freshly allocated byte vector.
pub fn encode(msg: &NetworkMessage, security: Option<EncodeSecurity<'_>>) -> Result<Vec<u8>> {
    let mut buf = Buffer::with_capacity(256, PUBSUB_BUFFER_SIZE);
    encode_into(msg, security, &mut buf)?;
    Ok(buf.into_vec())
}

/// Encode `msg` into a caller-supplied [`Buffer`], appending at its current
/// position. Used directly by [`crate::preencode`] to produce the initial
/// preencoded form.
pub fn encode_into(msg: &NetworkMessage, security: Option<EncodeSecurity<'_>>, buf: &mut Buffer) -> Result<()> {
    if msg.dsms.len() > u8::MAX as usize {
        return Err(Error::WriteInvalidConfig("more than 255 DataSetMessages"));
    }

    let security_enabled = security.is_some();
    let needs_ext1 = msg.header.requires_extended_flags1(security_enabled);

    let mut flags0 = msg.header.version & 0x0F;
    if msg.header.publisher_id.is_some() {
        flags0 |= FLAG_PUBLISHER_ID;
    }
    flags0 |= FLAG_GROUP_HEADER;
    flags0 |= FLAG_PAYLOAD_HEADER;
    if needs_ext1 {
        flags0 |= FLAG_EXTENDED_FLAGS1;
    }
    buf.write_u8(flags0)?;

    if needs_ext1 {
        let mut ext1 = 0u8;
        if let Some(pid) = &msg.header.publisher_id {
            ext1 |= publisher_id_type_bits(pid.type_tag()) & EXT1_PUBLISHER_ID_TYPE_MASK;
        }
        if security_enabled {
            ext1 |= EXT1_SECURITY_ENABLED;
        }
        buf.write_u8(ext1)?;
    }

    if let Some(pid) = &msg.header.publisher_id {
        pid.encode(buf)?;
    }

    // GroupHeader: this implementation always carries writer group id and
    // group version. NetworkMessageNumber/SequenceNumber at the group
    // level are out of scope.
    let group_flags = GROUP_FLAG_WRITER_GROUP_ID | GROUP_FLAG_GROUP_VERSION;
    buf.write_u8(group_flags)?;
    buf.write_u16_le(msg.group.group_id)?;
    buf.write_u32_le(msg.group.group_version)?;

    // PayloadHeader: writer ids live in cleartext (the subscriber needs them
    // for reader lookup before it can even find the right SecurityCtx to
    // decrypt with); the per-DSM size table, when there is more than one
    // DSM, is part of the payload buffer instead — it sits inside the
    // encrypt/sign scope, right before the DSM bodies it describes, matching
    // `buffer_payload` in the original encoder.
    let bodies: Vec<Vec<u8>> = msg
        .dsms
        .iter()
        .map(|dsm| {
            let mut dsm_buf = Buffer::with_capacity(64, PUBSUB_BUFFER_SIZE);
            encode_dataset_message(dsm, &mut dsm_buf)?;
            Ok(dsm_buf.into_vec())
        })
        .collect::<Result<_>>()?;

    buf.write_u8(msg.dsms.len() as u8)?;
    for dsm in &msg.dsms {
        buf.write_u16_le(dsm.writer_id)?;
    }

    #[cfg(feature = "security")]
    if let Some(sec) = &security {
        let mut security_flags = SECURITY_FLAG_SIGNED;
        if sec.ctx.mode == SecurityMode::SignAndEncrypt {
            security_flags |= SECURITY_FLAG_ENCRYPTED;
        }
        buf.write_u8(security_flags)?;
        buf.write_u32_le(sec.ctx.token_id)?;
        buf.write_u8(SECURITY_NONCE_LEN as u8)?;
        buf.write_bytes(&sec.nonce_random)?;
        buf.write_u32_le(sec.ctx.sequence_number)?;
    }
    #[cfg(not(feature = "security"))]
    if security.is_some() {
        return Err(Error::WriteSecurityFailed);
    }

    let payload_start = buf.len();
    if bodies.len() > 1 {
        for body in &bodies {
            if body.len() > u16::MAX as usize {
                return Err(Error::WriteInvalidConfig("DataSetMessage body exceeds 65535 bytes"));
            }
            buf.write_u16_le(body.len() as u16)?;
        }
    }
    for body in &bodies {
        buf.write_bytes(body)?;
    }

    #[cfg(feature = "security")]
    if let Some(sec) = &security {
        if sec.ctx.mode == SecurityMode::SignAndEncrypt {
            let counter = crypto::build_counter_block(sec.ctx.key_nonce, sec.nonce_random, sec.ctx.sequence_number);
            let mut payload = buf.as_slice()[payload_start..].to_vec();
            crypto::aes_ctr_apply(&sec.ctx.encrypt_key, counter, &mut payload).map_err(|_| Error::WriteSecurityFailed)?;
            buf.overwrite_at(payload_start, &payload)?;
        }
        let tag = crypto::hmac_sha256_sign(&sec.ctx.signing_key, buf.as_slice());
        buf.write_bytes(&tag)?;
    }
    #[cfg(not(feature = "security"))]
    let _ = payload_start;

    Ok(())
}

fn encode_dataset_message(dsm: &DataSetMessage, buf: &mut Buffer) -> Result<()> {
    if !matches!(dsm.conf.field_encoding, FieldEncoding::Variant) {
        return Err(Error::WriteInvalidConfig("only Variant field encoding is supported"));
    }

    let flags2_present = dsm.conf.message_type != DataSetMessageType::KeyFrame;

    let mut flags1 = 0u8;
    if dsm.conf.valid {
        flags1 |= DSM_FLAG_VALID;
    }
    flags1 |= (encoding_bits(dsm.conf.field_encoding) << 1) & DSM_FLAG_FIELD_ENCODING_MASK;
    if dsm.conf.seq_num_flag {
        flags1 |= DSM_FLAG_SEQ_NUM;
    }
    if dsm.conf.status_flag {
        flags1 |= DSM_FLAG_STATUS;
    }
    if dsm.conf.major_ver_flag {
        flags1 |= DSM_FLAG_MAJOR_VERSION;
    }
    if dsm.conf.minor_ver_flag {
        flags1 |= DSM_FLAG_MINOR_VERSION;
    }
    if flags2_present {
        flags1 |= DSM_FLAG_FLAGS2_PRESENT;
    }
    buf.write_u8(flags1)?;

    if flags2_present {
        let mut flags2 = dsm.conf.message_type.wire_value();
        if dsm.conf.timestamp_flag {
            flags2 |= 1 << 4;
        }
        if dsm.conf.picos_flag {
            flags2 |= 1 << 5;
        }
        buf.write_u8(flags2)?;
    }

    if dsm.conf.seq_num_flag {
        buf.write_u16_le(dsm.seq_num)?;
    }
    // Status/ConfigurationVersion are tracked as flags only (no value is
    // modeled on DataSetMessage) — not exercised by this implementation's
    // public API, but the wire format still needs a placeholder body if a
    // caller sets one of these bits directly.
    if dsm.conf.status_flag {
        buf.write_u16_le(0)?;
    }
    if dsm.conf.major_ver_flag {
        buf.write_u32_le(0)?;
    }
    if dsm.conf.minor_ver_flag {
        buf.write_u32_le(0)?;
    }
    if dsm.conf.timestamp_flag {
        buf.write_u64_le(dsm.timestamp)?;
    }
    if dsm.conf.picos_flag {
        buf.write_u16_le(0)?;
    }

    // KeepAlive DSMs carry no field count and no fields at all.
    if dsm.conf.message_type != DataSetMessageType::KeepAlive {
        if dsm.fields.len() > u16::MAX as usize {
            return Err(Error::WriteInvalidConfig("more than 65535 fields in a DataSetMessage"));
        }
        buf.write_u16_le(dsm.fields.len() as u16)?;
        for field in &dsm.fields {
            field.encode(buf)?;
        }
    }

    Ok(())
}

fn encoding_bits(encoding: FieldEncoding) -> u8 {
    match encoding {
        FieldEncoding::Variant => 0,
        FieldEncoding::RawData => 1,
        FieldEncoding::DataValue => 2,
    }
}
