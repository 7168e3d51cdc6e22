// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Companion `ua-data` JSON encoding (OPC UA Part 14 §7.2.3), gated behind
//! the `json` feature.
//!
//! This is a human/debug-facing sibling of the UADP binary encoder, not a
//! wire-compatible alternative to it: it shares the in-memory
//! [`crate::model::NetworkMessage`] but has its own, much smaller, set of
//! supported types and no security story: `Error::JsonSecurityUnsupported`
//! is returned rather than silently emitting an unsigned/unencrypted JSON
//! document for a secured message.

use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::model::{DataSetMessage, NetworkMessage, PublisherId, Variant};

/// Encode `msg` as a single `ua-data` JSON document.
///
/// `security_enabled` reflects whether the embedder would otherwise have
/// signed/encrypted this message on the binary side; JSON encoding of a
/// secured message is refused outright rather than emitting a deceptively
/// plain document.
pub fn encode_ua_data(msg: &NetworkMessage, security_enabled: bool) -> Result<Value> {
    if security_enabled {
        return Err(Error::JsonSecurityUnsupported);
    }

    let mut messages = Vec::with_capacity(msg.dsms.len());
    for (dsm_idx, dsm) in msg.dsms.iter().enumerate() {
        messages.push(encode_dataset_message(dsm_idx, dsm)?);
    }

    let dsm_seq_num = msg.dsms.first().map_or(0, |dsm| dsm.seq_num);
    Ok(json!({
        "MessageId": format!("{}-{}", msg.group.group_id, dsm_seq_num),
        "MessageType": "ua-data",
        "PublisherId": encode_publisher_id(msg.header.publisher_id.as_ref()),
        "Messages": messages,
    }))
}

fn encode_publisher_id(pid: Option<&PublisherId>) -> Value {
    match pid {
        None => Value::Null,
        Some(PublisherId::Byte(v)) => json!(v),
        Some(PublisherId::UInt16(v)) => json!(v),
        Some(PublisherId::UInt32(v)) => json!(v),
        // A u64 publisher id can exceed JSON's safe integer range; encode as
        // a string rather than risk silent precision loss in a reader.
        Some(PublisherId::UInt64(v)) => json!(v.to_string()),
        Some(PublisherId::String(v)) => json!(v),
    }
}

fn encode_dataset_message(dsm_idx: usize, dsm: &DataSetMessage) -> Result<Value> {
    let mut payload = serde_json::Map::with_capacity(dsm.fields.len());
    for (field_idx, field) in dsm.fields.iter().enumerate() {
        payload.insert(format!("{dsm_idx}-{field_idx}"), encode_variant(field)?);
    }
    Ok(json!({
        "DataSetWriterId": dsm.writer_id,
        "MessageType": dsm.conf.message_type.json_message_type(),
        "Payload": Value::Object(payload),
    }))
}

/// Each field is wrapped as `{"Type": <builtin type id>, "Body": <value>}`
/// per OPC UA Part 14 §7.2.3's `ua-data` variant encoding.
fn encode_variant(v: &Variant) -> Result<Value> {
    let body = match v {
        Variant::Boolean(b) => json!(b),
        Variant::SByte(n) => json!(n),
        Variant::Byte(n) => json!(n),
        Variant::Int16(n) => json!(n),
        Variant::UInt16(n) => json!(n),
        Variant::Int32(n) => json!(n),
        Variant::UInt32(n) => json!(n),
        // Int64/UInt64 are deliberately unsupported by the JSON encoder,
        // matching the binary-only scope this was distilled from.
        Variant::Int64(_) | Variant::UInt64(_) => {
            return Err(Error::JsonNetworkMessageNotSupported(v.builtin_type() as u8))
        }
        Variant::Float(f) => json!(encode_float(*f as f64)),
        Variant::Double(d) => json!(encode_float(*d)),
        Variant::String(s) => json!(s),
    };
    Ok(json!({ "Type": v.builtin_type() as u8, "Body": body }))
}

/// OPC UA JSON mapping represents non-finite floats as the strings `"NaN"`,
/// `"Infinity"`, `"-Infinity"` since JSON numbers cannot carry them.
fn encode_float(f: f64) -> Value {
    if f.is_nan() {
        json!("NaN")
    } else if f.is_infinite() {
        json!(if f > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        json!(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DataSetMessageType, NetworkMessageBuilder};

    #[test]
    fn encodes_scalar_fields() {
        let mut msg = NetworkMessageBuilder::new(1)
            .publisher_id(PublisherId::Byte(46))
            .group(42, 1000)
            .build();
        let dsm = msg.add_dataset_message(255, DataSetMessageType::KeyFrame);
        dsm.set_sequence_number(7);
        dsm.push_field(Variant::UInt32(12_071_982));
        dsm.push_field(Variant::Float(0.12));

        let doc = encode_ua_data(&msg, false).unwrap();
        assert_eq!(doc["MessageId"], "42-7");
        assert_eq!(doc["MessageType"], "ua-data");
        assert_eq!(doc["PublisherId"], 46);
        assert_eq!(doc["Messages"][0]["DataSetWriterId"], 255);
        assert_eq!(doc["Messages"][0]["MessageType"], "ua-keyframe");
        assert_eq!(doc["Messages"][0]["Payload"]["0-0"]["Type"], 7);
        assert_eq!(doc["Messages"][0]["Payload"]["0-0"]["Body"], 12_071_982);
    }

    #[test]
    fn non_finite_floats_become_quoted_strings() {
        let mut msg = NetworkMessageBuilder::new(1).group(1, 1).build();
        let dsm = msg.add_dataset_message(1, DataSetMessageType::KeyFrame);
        dsm.push_field(Variant::Double(f64::NAN));
        dsm.push_field(Variant::Float(f32::INFINITY));
        dsm.push_field(Variant::Float(f32::NEG_INFINITY));
        dsm.push_field(Variant::String(Some("hello".into())));

        let doc = encode_ua_data(&msg, false).unwrap();
        assert_eq!(doc["Messages"][0]["Payload"]["0-0"]["Body"], "NaN");
        assert_eq!(doc["Messages"][0]["Payload"]["0-1"]["Body"], "Infinity");
        assert_eq!(doc["Messages"][0]["Payload"]["0-2"]["Body"], "-Infinity");
        assert_eq!(doc["Messages"][0]["Payload"]["0-3"]["Body"], "hello");
    }

    #[test]
    fn int64_is_rejected() {
        let mut msg = NetworkMessageBuilder::new(1).group(1, 1).build();
        let dsm = msg.add_dataset_message(1, DataSetMessageType::KeyFrame);
        dsm.push_field(Variant::Int64(-1));
        assert!(matches!(
            encode_ua_data(&msg, false),
            Err(Error::JsonNetworkMessageNotSupported(_))
        ));
    }

    #[test]
    fn rejects_secured_messages() {
        let msg = NetworkMessageBuilder::new(1).group(1, 1).build();
        assert_eq!(encode_ua_data(&msg, true).unwrap_err(), Error::JsonSecurityUnsupported);
    }
}
