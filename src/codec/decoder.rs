// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! UADP decoder.
//!
//! Decoding stops at the first malformed byte or unsupported feature and
//! returns an error; it never panics on attacker-controlled input. Group
//! filtering and per-DSM delivery bookkeeping (sequence-number gaps, receive
//! timeouts) are [`crate::dispatch`]'s job, not this module's. Per-DSM
//! *reader* filtering is a partial exception: passing a [`ReaderLookup`] to
//! [`decode`] lets a multi-DSM message with a size table (spec.md §4.4 step
//! 7/8) skip DSMs with no matching reader by cursor arithmetic alone,
//! without decoding their body — so an unmatched DSM using a field encoding
//! or type this decoder doesn't support can't fail the whole message. With
//! no `ReaderLookup` (or for a single/zero-DSM message, which has no size
//! table to skip by), every DSM is fully decoded, as before.

use crate::codec::{
    DSM_FLAG_FIELD_ENCODING_MASK, DSM_FLAG_FLAGS2_PRESENT, DSM_FLAG_MAJOR_VERSION, DSM_FLAG_MINOR_VERSION,
    DSM_FLAG_SEQ_NUM, DSM_FLAG_STATUS, DSM_FLAG_VALID, EXT1_DATASET_CLASS_ID, EXT1_FLAGS2_PRESENT, EXT1_PICOSECONDS,
    EXT1_PUBLISHER_ID_TYPE_MASK, EXT1_SECURITY_ENABLED, EXT1_TIMESTAMP, FLAG_EXTENDED_FLAGS1, FLAG_GROUP_HEADER,
    FLAG_PAYLOAD_HEADER, FLAG_PUBLISHER_ID, GROUP_FLAG_GROUP_VERSION, GROUP_FLAG_NETWORK_MESSAGE_NUMBER,
    GROUP_FLAG_SEQUENCE_NUMBER, GROUP_FLAG_WRITER_GROUP_ID, SECURITY_FLAG_ENCRYPTED, SECURITY_FLAG_FOOTER,
    SECURITY_FLAG_KEY_RESET, SECURITY_FLAG_SIGNED,
};
use crate::config::{MSG_NONCE_RANDOM_LEN, SECURITY_NONCE_LEN, SIGNATURE_LEN, UADP_VERSION};
use crate::core::Buffer;
use crate::error::{Error, Result};
use crate::model::dataset_message::FieldEncoding;
use crate::model::{
    DataSetMessage, DataSetMessageConf, DataSetMessageType, GroupDescriptor, NetworkMessage, NetworkMessageHeader,
    PublisherId, PublisherIdType, Variant,
};
use crate::dispatch::ReaderLookup;
use crate::security::SecurityKeyLookup;

#[cfg(feature = "security")]
use crate::security::{crypto, sequence_number_is_fresh};

/// Security key store consulted when the wire's ExtendedFlags1 indicates a
/// secured message. Not needed (and not consulted) for an unsecured message.
pub struct DecodeSecurity<'a> {
    pub lookup: &'a mut dyn SecurityKeyLookup,
}

/// Decode a single UADP NetworkMessage from `bytes`.
///
/// `reader`, when given, lets DSMs with no matching reader be skipped by
/// size instead of decoded (see the module doc); the returned
/// [`NetworkMessage`] then omits those DSMs. Pass `None` to always decode
/// every DSM.
pub fn decode(bytes: &[u8], security: Option<DecodeSecurity<'_>>, reader: Option<&dyn ReaderLookup>) -> Result<NetworkMessage> {
    let mut buf = Buffer::from_vec(bytes.to_vec());

    let flags0 = buf.read_u8()?;
    if flags0 & 0x0F != UADP_VERSION {
        return Err(Error::UnsupportedVersion);
    }
    let publisher_id_present = flags0 & FLAG_PUBLISHER_ID != 0;
    let ext1_present = flags0 & FLAG_EXTENDED_FLAGS1 != 0;
    if flags0 & FLAG_GROUP_HEADER == 0 || flags0 & FLAG_PAYLOAD_HEADER == 0 {
        return Err(Error::UnsupportedMessageLayout);
    }

    let (publisher_id_type, security_enabled) = if ext1_present {
        let ext1 = buf.read_u8()?;
        // DataSetClassId correlation, the network-message-level Timestamp and
        // Picoseconds fields are all out of scope (spec.md §1 Non-goals); a
        // wire message that claims any of them can't be safely parsed past
        // this point, since this decoder never reads those fields' bytes.
        if ext1 & (EXT1_DATASET_CLASS_ID | EXT1_TIMESTAMP | EXT1_PICOSECONDS) != 0 {
            return Err(Error::UnsupportedFlags1);
        }
        if ext1 & EXT1_FLAGS2_PRESENT != 0 {
            let ext2 = buf.read_u8()?;
            if ext2 != 0 {
                return Err(Error::UnsupportedFlags2);
            }
        }
        (
            PublisherIdType::try_from(ext1 & EXT1_PUBLISHER_ID_TYPE_MASK)?,
            ext1 & EXT1_SECURITY_ENABLED != 0,
        )
    } else {
        (PublisherIdType::Byte, false)
    };

    let publisher_id = if publisher_id_present {
        Some(PublisherId::decode(&mut buf, publisher_id_type)?)
    } else {
        None
    };

    let group_flags = buf.read_u8()?;
    if group_flags & GROUP_FLAG_WRITER_GROUP_ID == 0 || group_flags & GROUP_FLAG_GROUP_VERSION == 0 {
        return Err(Error::UnsupportedGroupFlags);
    }
    // NetworkMessageNumber and the group-level SequenceNumber are both out of
    // scope (spec.md §1 Non-goals); their wire fields are never read, so a
    // message that declares either can't be safely parsed past this point.
    if group_flags & (GROUP_FLAG_NETWORK_MESSAGE_NUMBER | GROUP_FLAG_SEQUENCE_NUMBER) != 0 {
        return Err(Error::UnsupportedGroupFlags);
    }
    let group_id = buf.read_u16_le()?;
    let group_version = buf.read_u32_le()?;

    let dsm_count = buf.read_u8()? as usize;
    let mut writer_ids = Vec::with_capacity(dsm_count);
    for _ in 0..dsm_count {
        writer_ids.push(buf.read_u16_le()?);
    }

    let trailer_len = if security_enabled {
        decode_secured(&mut buf, security, group_id, publisher_id.as_ref())?
    } else if security.is_some() {
        // A reader configured for security received an unsecured message.
        return Err(Error::SecurityNoneFailed);
    } else {
        0
    };

    // The per-DSM size table lives inside the payload buffer (decrypted by
    // `decode_secured` above when encrypted), right before the DSM bodies it
    // describes — not in the cleartext PayloadHeader.
    let sizes: Option<Vec<u16>> = if dsm_count > 1 {
        let mut v = Vec::with_capacity(dsm_count);
        for _ in 0..dsm_count {
            v.push(buf.read_u16_le()?);
        }
        Some(v)
    } else {
        None
    };

    let payload_start = buf.position();
    let payload_end = buf.len() - trailer_len;

    let mut dsms = Vec::with_capacity(dsm_count);
    for i in 0..dsm_count {
        let dsm_start = buf.position();

        // Step 8: a DSM with no matching reader can only be skipped (rather
        // than decoded and discarded) when its size is known up front.
        if let (Some(sizes), Some(reader)) = (&sizes, reader) {
            if !reader.accepts(writer_ids[i], i) {
                buf.set_position(dsm_start + sizes[i] as usize)?;
                continue;
            }
        }

        let dsm = decode_dataset_message(&mut buf, writer_ids[i])?;
        let consumed = buf.position() - dsm_start;
        let expected = match &sizes {
            Some(sizes) => sizes[i] as usize,
            None => payload_end - payload_start,
        };
        if consumed != expected {
            return Err(Error::ReadDsmSizeCheckFailed);
        }
        dsms.push(dsm);
    }

    Ok(NetworkMessage {
        header: NetworkMessageHeader { version: flags0 & 0x0F, publisher_id },
        group: GroupDescriptor { group_id, group_version },
        dsms,
    })
}

/// Parse the security header, verify the HMAC-SHA256 footer, decrypt the
/// payload in place if configured, and enforce the 32-bit sequence number
/// replay rule (`Error::SecurityReplay`).
///
/// Returns the length of the trailing footer (the HMAC signature, when
/// signed) so the caller can exclude it from the DSM payload bounds it
/// checks decoded DSM sizes against.
#[cfg(feature = "security")]
fn decode_secured(
    buf: &mut Buffer,
    security: Option<DecodeSecurity<'_>>,
    group_id: u16,
    publisher_id: Option<&PublisherId>,
) -> Result<usize> {
    let Some(security) = security else {
        return Err(Error::SecurityNoneFailed);
    };

    let security_flags = buf.read_u8()?;
    if security_flags & SECURITY_FLAG_FOOTER != 0 {
        return Err(Error::UnsupportedSecurityFooter);
    }
    if security_flags & SECURITY_FLAG_KEY_RESET != 0 {
        return Err(Error::UnsupportedSecurityKeyReset);
    }
    let signed = security_flags & SECURITY_FLAG_SIGNED != 0;
    let encrypted = security_flags & SECURITY_FLAG_ENCRYPTED != 0;
    let token_id = buf.read_u32_le()?;
    let nonce_len = buf.read_u8()?;
    if nonce_len as usize != SECURITY_NONCE_LEN {
        return Err(Error::SecurityInvalidNonceLength);
    }
    let mut nonce_random = [0u8; 4];
    nonce_random.copy_from_slice(buf.read_bytes(MSG_NONCE_RANDOM_LEN)?);
    let seq_num = buf.read_u32_le()?;

    let ctx = security
        .lookup
        .lookup(token_id, publisher_id, group_id)
        .ok_or(Error::SecurityUnknownToken)?;

    let trailer_len = if signed { SIGNATURE_LEN } else { 0 };

    if signed {
        let total_len = buf.len();
        let payload_end = total_len.checked_sub(SIGNATURE_LEN).ok_or(Error::ReadShortFailed)?;
        let (data, tag) = buf.as_slice().split_at(payload_end);
        crypto::hmac_sha256_verify(&ctx.signing_key, data, tag).map_err(|_| Error::SecuritySignatureInvalid)?;
    }

    if !sequence_number_is_fresh(ctx.sequence_number, seq_num) {
        return Err(Error::SecurityReplay);
    }
    ctx.sequence_number = seq_num;

    if encrypted {
        let payload_start = buf.position();
        let payload_end = buf.len().saturating_sub(trailer_len);
        let counter = crypto::build_counter_block(ctx.key_nonce, nonce_random, seq_num);
        let mut plaintext = buf.as_slice()[payload_start..payload_end].to_vec();
        crypto::aes_ctr_apply(&ctx.encrypt_key, counter, &mut plaintext).map_err(|_| Error::SecuritySignatureInvalid)?;
        buf.overwrite_at(payload_start, &plaintext)?;
    }

    Ok(trailer_len)
}

#[cfg(not(feature = "security"))]
fn decode_secured(
    _buf: &mut Buffer,
    _security: Option<DecodeSecurity<'_>>,
    _group_id: u16,
    _publisher_id: Option<&PublisherId>,
) -> Result<usize> {
    Err(Error::SecurityUnknownToken)
}

fn decode_dataset_message(buf: &mut Buffer, writer_id: u16) -> Result<DataSetMessage> {
    let flags1 = buf.read_u8()?;
    if flags1 & DSM_FLAG_VALID == 0 {
        return Err(Error::ReadInvalidBit);
    }
    let field_encoding_bits = (flags1 & DSM_FLAG_FIELD_ENCODING_MASK) >> 1;
    if field_encoding_bits != 0 {
        return Err(Error::UnsupportedFieldEncoding);
    }
    let seq_num_flag = flags1 & DSM_FLAG_SEQ_NUM != 0;
    let status_flag = flags1 & DSM_FLAG_STATUS != 0;
    let major_ver_flag = flags1 & DSM_FLAG_MAJOR_VERSION != 0;
    let minor_ver_flag = flags1 & DSM_FLAG_MINOR_VERSION != 0;
    let flags2_present = flags1 & DSM_FLAG_FLAGS2_PRESENT != 0;

    let mut message_type = DataSetMessageType::KeyFrame;
    let mut timestamp_flag = false;
    let mut picos_flag = false;
    if flags2_present {
        let flags2 = buf.read_u8()?;
        message_type = DataSetMessageType::from_wire_value(flags2 & 0x0F).ok_or(Error::UnsupportedFlags2)?;
        if message_type == DataSetMessageType::DeltaFrame {
            return Err(Error::UnsupportedDeltaFrame);
        }
        timestamp_flag = flags2 & (1 << 4) != 0;
        picos_flag = flags2 & (1 << 5) != 0;
    }

    let seq_num = if seq_num_flag { buf.read_u16_le()? } else { 0 };
    if status_flag {
        buf.read_u16_le()?; // status value is not modeled, consumed and discarded
    }
    if major_ver_flag {
        buf.read_u32_le()?;
    }
    if minor_ver_flag {
        buf.read_u32_le()?;
    }
    let timestamp = if timestamp_flag { buf.read_u64_le()? } else { 0 };
    if picos_flag {
        buf.read_u16_le()?;
    }

    let fields = if message_type == DataSetMessageType::KeepAlive {
        Vec::new()
    } else {
        let field_count = buf.read_u16_le()?;
        let mut fields = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            fields.push(Variant::decode(buf)?);
        }
        fields
    };

    Ok(DataSetMessage {
        writer_id,
        conf: DataSetMessageConf {
            valid: true,
            field_encoding: FieldEncoding::Variant,
            seq_num_flag,
            status_flag,
            major_ver_flag,
            minor_ver_flag,
            message_type,
            timestamp_flag,
            picos_flag,
        },
        seq_num,
        timestamp,
        fields,
    })
}
