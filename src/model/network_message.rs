// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The full decoded/encodable `NetworkMessage` tree and its builder.

use crate::model::dataset_message::DataSetMessageType;
use crate::model::{DataSetMessage, GroupDescriptor, NetworkMessageHeader, PublisherId};

/// A complete UADP network message: header, group descriptor, and an
/// ordered sequence of DataSetMessages (0..=255).
///
/// Owns its DSMs and, transitively, their Variant fields. [`crate::preencode::PreencodeCtx`]
/// never stores a back-pointer into this tree — it is handed a `&NetworkMessage`
/// each time it needs to read current field values.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkMessage {
    pub header: NetworkMessageHeader,
    pub group: GroupDescriptor,
    pub dsms: Vec<DataSetMessage>,
}

impl NetworkMessage {
    /// Append a new DataSetMessage and return a mutable handle for
    /// configuring it in place.
    pub fn add_dataset_message(
        &mut self,
        writer_id: u16,
        message_type: DataSetMessageType,
    ) -> &mut DataSetMessage {
        self.dsms.push(DataSetMessage::new(writer_id, message_type));
        self.dsms.last_mut().expect("just pushed")
    }

    pub fn dataset_message_mut(&mut self, index: usize) -> Option<&mut DataSetMessage> {
        self.dsms.get_mut(index)
    }

    pub fn dataset_message(&self, index: usize) -> Option<&DataSetMessage> {
        self.dsms.get(index)
    }
}

/// Builder for [`NetworkMessage`], mirroring the construction surface
/// described in spec.md §4.2 (create empty; create with N preallocated
/// DSMs; set publisher id; set group id/version).
pub struct NetworkMessageBuilder {
    header: NetworkMessageHeader,
    group: GroupDescriptor,
    dsms: Vec<DataSetMessage>,
}

impl NetworkMessageBuilder {
    pub fn new(version: u8) -> Self {
        Self {
            header: NetworkMessageHeader::new(version),
            group: GroupDescriptor::default(),
            dsms: Vec::new(),
        }
    }

    /// Create a builder with `n` preallocated, default-configured
    /// KeyFrame DSMs (writer id 0), ready to be configured via
    /// [`NetworkMessage::dataset_message_mut`].
    pub fn with_dataset_messages(version: u8, n: usize) -> Self {
        let mut b = Self::new(version);
        b.dsms = (0..n)
            .map(|_| DataSetMessage::new(0, DataSetMessageType::KeyFrame))
            .collect();
        b
    }

    pub fn publisher_id(mut self, publisher_id: PublisherId) -> Self {
        self.header.publisher_id = Some(publisher_id);
        self
    }

    pub fn group(mut self, group_id: u16, group_version: u32) -> Self {
        self.group = GroupDescriptor::new(group_id, group_version);
        self
    }

    pub fn build(self) -> NetworkMessage {
        NetworkMessage {
            header: self.header,
            group: self.group,
            dsms: self.dsms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_with_preallocated_dsms() {
        let mut msg = NetworkMessageBuilder::with_dataset_messages(1, 3).build();
        assert_eq!(msg.dsms.len(), 3);
        msg.dataset_message_mut(1).unwrap().set_sequence_number(7);
        assert_eq!(msg.dataset_message(1).unwrap().seq_num, 7);
    }

    #[test]
    fn add_dataset_message_returns_mutable_handle() {
        let mut msg = NetworkMessageBuilder::new(1)
            .publisher_id(PublisherId::Byte(46))
            .group(42, 1000)
            .build();
        let dsm = msg.add_dataset_message(255, DataSetMessageType::KeyFrame);
        dsm.push_field(crate::model::Variant::Byte(1));
        assert_eq!(msg.dsms.len(), 1);
        assert_eq!(msg.dsms[0].writer_id, 255);
    }
}
