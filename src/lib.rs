// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # UADP PubSub codec
//!
//! This crate implements the hard core of an OPC UA PubSub stack: the
//! UADP (UA Datagram Protocol) network-message codec.
//!
//! ## Overview
//!
//! UADP is the binary wire format used by OPC UA Part 14 PubSub to carry one
//! or more `DataSetMessage`s (dataset snapshots) inside a single datagram.
//! This crate covers:
//!
//! - [`core::buffer::Buffer`] — growable byte buffer with cursor-style
//!   little-endian primitive read/write.
//! - [`model`] — the in-memory `NetworkMessage` tree (header, group
//!   descriptor, ordered `DataSetMessage`s, each owning ordered `Variant`
//!   fields).
//! - [`security`] — AES-CTR + HMAC-SHA256 sign/encrypt wrapper keyed by a
//!   `{tokenId, publisherId, writerGroupId}` tuple.
//! - [`codec`] — the UADP encoder and decoder.
//! - [`dispatch`] — the reader-side filtering/dispatch pipeline that matches
//!   incoming datagrams to configured readers.
//! - [`preencode`] — the publisher-side preencoded-buffer optimization.
//! - [`json`] — the companion ua-data JSON encoder (no security).
//!
//! Transport sockets, scheduler threads, SKS key lookup, clocks/timers and
//! the crypto primitives themselves are external collaborators; this crate
//! consumes them through narrow traits rather than owning them.
//!
//! ## Quick start
//!
//! ```
//! use uadp_pubsub::model::{NetworkMessageBuilder, PublisherId, Variant, DataSetMessageType};
//! use uadp_pubsub::codec::encode;
//!
//! let mut msg = NetworkMessageBuilder::new(1)
//!     .publisher_id(PublisherId::Byte(46))
//!     .group(42, 1000)
//!     .build();
//! let dsm = msg.add_dataset_message(255, DataSetMessageType::KeyFrame);
//! dsm.set_sequence_number(1);
//! dsm.push_field(Variant::UInt32(12_071_982));
//!
//! let bytes = encode(&msg, None).expect("encode");
//! assert!(!bytes.is_empty());
//! ```

pub mod config;
pub mod core;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod preencode;
pub mod security;

pub mod codec;

#[cfg(feature = "json")]
pub mod json;

pub use error::{Error, Result};
