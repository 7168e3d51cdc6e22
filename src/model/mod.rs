// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-memory representation of a UADP `NetworkMessage`: a header, a group
//! descriptor, and an ordered sequence of `DataSetMessage`s, each owning an
//! ordered sequence of `Variant` fields.

pub mod dataset_message;
pub mod group;
pub mod header;
pub mod network_message;
pub mod publisher_id;
pub mod variant;

pub use dataset_message::{DataSetMessage, DataSetMessageConf, DataSetMessageType, FieldEncoding};
pub use group::GroupDescriptor;
pub use header::NetworkMessageHeader;
pub use network_message::{NetworkMessage, NetworkMessageBuilder};
pub use publisher_id::{PublisherId, PublisherIdType};
pub use variant::{BuiltinType, Variant};
