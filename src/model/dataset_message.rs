// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! A single DataSetMessage (DSM): one dataset snapshot inside a
//! `NetworkMessage`.

use crate::model::Variant;

/// DataSetFlags1 bits 1-2. Only `Variant` is implemented by this codec;
/// `RawData`/`DataValue` are recognized as wire values but rejected if
/// configured for encode and rejected (`Unsupported_*`-style failure is not
/// specified for this bit, but the encoder refuses to emit anything else)
/// — see Non-goals in spec.md §1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldEncoding {
    #[default]
    Variant,
    RawData,
    DataValue,
}

/// DataSetFlags2 bits 0-3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataSetMessageType {
    #[default]
    KeyFrame,
    DeltaFrame,
    Event,
    KeepAlive,
}

impl DataSetMessageType {
    pub(crate) fn wire_value(self) -> u8 {
        match self {
            Self::KeyFrame => 0,
            Self::DeltaFrame => 1,
            Self::Event => 2,
            Self::KeepAlive => 3,
        }
    }

    pub(crate) fn from_wire_value(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::KeyFrame,
            1 => Self::DeltaFrame,
            2 => Self::Event,
            3 => Self::KeepAlive,
            _ => return None,
        })
    }

    /// The `"MessageType"` string OPC UA Part 14 §7.2.3 uses for a DSM in
    /// the `ua-data` JSON encoding.
    pub(crate) fn json_message_type(self) -> &'static str {
        match self {
            Self::KeyFrame => "ua-keyframe",
            Self::DeltaFrame => "ua-deltaframe",
            Self::Event => "ua-event",
            Self::KeepAlive => "ua-keepalive",
        }
    }
}

/// Per-DSM flags1/flags2, set once by configuration and immutable
/// thereafter (spec.md §3). In this implementation `valid` is always
/// `true` and `field_encoding` is always `Variant`; the fields exist so the
/// decoder can represent what it actually read off the wire, including a
/// DSM whose `valid` bit was clear (see DESIGN.md Open Question (a)).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataSetMessageConf {
    pub valid: bool,
    pub field_encoding: FieldEncoding,
    pub seq_num_flag: bool,
    pub status_flag: bool,
    pub major_ver_flag: bool,
    pub minor_ver_flag: bool,
    pub message_type: DataSetMessageType,
    pub timestamp_flag: bool,
    pub picos_flag: bool,
}

impl Default for DataSetMessageConf {
    fn default() -> Self {
        Self {
            valid: true,
            field_encoding: FieldEncoding::Variant,
            seq_num_flag: true,
            status_flag: false,
            major_ver_flag: false,
            minor_ver_flag: false,
            message_type: DataSetMessageType::KeyFrame,
            timestamp_flag: false,
            picos_flag: false,
        }
    }
}

/// A dataset snapshot: writer id, flags, sequence number and fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSetMessage {
    pub writer_id: u16,
    pub conf: DataSetMessageConf,
    pub seq_num: u16,
    pub timestamp: u64,
    pub fields: Vec<Variant>,
}

impl DataSetMessage {
    pub fn new(writer_id: u16, message_type: DataSetMessageType) -> Self {
        Self {
            writer_id,
            conf: DataSetMessageConf {
                message_type,
                ..DataSetMessageConf::default()
            },
            seq_num: 0,
            timestamp: 0,
            fields: Vec::new(),
        }
    }

    /// Toggle whether the per-DSM sequence number is carried on the wire
    /// (DataSetFlags1 bit 3).
    pub fn set_sequence_number_enabled(&mut self, enabled: bool) -> &mut Self {
        self.conf.seq_num_flag = enabled;
        self
    }

    pub fn set_sequence_number(&mut self, seq_num: u16) -> &mut Self {
        self.seq_num = seq_num;
        self
    }

    pub fn set_timestamp(&mut self, timestamp: u64) -> &mut Self {
        self.timestamp = timestamp;
        self
    }

    /// Preallocate `n` fields, each a `Variant::Byte(0)` placeholder, ready
    /// for [`DataSetMessage::set_field`].
    pub fn allocate_fields(&mut self, n: usize) -> &mut Self {
        self.fields = (0..n).map(|_| Variant::Byte(0)).collect();
        self
    }

    pub fn push_field(&mut self, value: Variant) -> &mut Self {
        self.fields.push(value);
        self
    }

    /// Set the variant at `index`, dropping and replacing whatever was
    /// there before (spec.md §4.2: "Setting a variant at an already-populated
    /// slot clears and replaces").
    pub fn set_field(&mut self, index: usize, value: Variant) -> &mut Self {
        self.fields[index] = value;
        self
    }
}
