// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reader-side filtering and dispatch: matches a decoded [`NetworkMessage`]
//! against configured reader groups/readers and hands accepted
//! DataSetMessages to a sink.
//!
//! The seams below are trait objects rather than a C-style function-pointer
//! table, following this crate's demux/dispatch conventions: a
//! `Send + Sync` trait the embedder implements once against its own reader
//! configuration and subscription store.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::model::{DataSetMessage, NetworkMessage, PublisherId};
use crate::security::dsm_sequence_number_is_fresh;

/// Does this message belong to one of our configured reader groups?
/// Implemented against whatever subscription configuration the embedder
/// keeps (`{publisherId, groupId, groupVersion}`).
pub trait ReaderGroupLookup: Send + Sync {
    fn matches(&self, publisher_id: Option<&PublisherId>, group_id: u16, group_version: u32) -> bool;
}

/// Is there a configured reader for this DSM, within a group that already
/// matched?
///
/// `index` is the DSM's position within the NetworkMessage's payload,
/// mirroring `get_reader(group, flags, writer_id, index)`'s signature
/// (spec.md §6): a reader group configured with writer id 0 on every
/// DataSetReader dispatches by `index` instead of `writer_id` (spec.md §3's
/// "writer_ids are either all non-zero ... or all absent" rule), so both are
/// always available to the lookup rather than forcing two call shapes.
pub trait ReaderLookup: Send + Sync {
    fn accepts(&self, writer_id: u16, index: usize) -> bool;
}

/// Receives each DataSetMessage accepted by a [`ReaderLookup`], already
/// past the replay check.
pub trait DsmSink: Send + Sync {
    fn on_dataset_message(&self, writer_id: u16, dsm: &DataSetMessage);
}

/// Per-writer 16-bit DSM sequence number gap check, and subscriber
/// receive-timeout bookkeeping (spec.md §6 `is_newer_dsm_seq` /
/// `update_timeout`).
///
/// A message whose `seq_num_flag` is clear is not checked: freshness is
/// only meaningful when the field is actually carried.
pub trait SequenceTracker: Send + Sync {
    /// Is `seq_num` newer than the last one stored for `writer_id`? Updates
    /// the stored value only when it is. A `false` result is a gap, not a
    /// reason to drop the message — the original's
    /// `dsmSnGapCallback`/"is not newer still decode dataSetMessage" contract
    /// (`examples/original_source/src/PubSub/network/sopc_network_layer.c`)
    /// notifies and keeps going; [`dispatch`] still hands the DSM to the sink.
    fn is_newer_dsm_seq(&mut self, writer_id: u16, seq_num: u16) -> bool;

    /// Reset the subscriber's receive timeout for `writer_id`. Called for
    /// every DSM handed to the sink, KeepAlive or not — a KeepAlive DSM's
    /// entire purpose is to reset this timeout (spec.md glossary).
    fn update_timeout(&mut self, writer_id: u16);
}

/// Match `msg` against the configured reader groups/readers, run the
/// per-writer gap check, and hand every accepted DSM to `sink`.
///
/// Returns [`Error::NoMatchingGroup`] if no reader group matches — this is
/// an ordinary filter miss, not a fault, and callers typically log it at
/// debug level rather than surfacing it as a failure. Likewise
/// [`Error::NoMatchingReader`] when the group matched but no DSM's writer
/// id had a configured reader. A stale DSM sequence number is not one of
/// these failures: the DSM is still delivered, only logged as a gap.
pub fn dispatch(
    msg: &NetworkMessage,
    reader_group: &dyn ReaderGroupLookup,
    reader: &dyn ReaderLookup,
    sequence_tracker: &mut dyn SequenceTracker,
    sink: &dyn DsmSink,
) -> Result<()> {
    if !reader_group.matches(msg.header.publisher_id.as_ref(), msg.group.group_id, msg.group.group_version) {
        return Err(Error::NoMatchingGroup);
    }

    let mut matched_any = false;
    for (index, dsm) in msg.dsms.iter().enumerate() {
        if !reader.accepts(dsm.writer_id, index) {
            continue;
        }
        matched_any = true;

        if dsm.conf.seq_num_flag && !sequence_tracker.is_newer_dsm_seq(dsm.writer_id, dsm.seq_num) {
            log::warn!("DataSetMessage sequence number gap from writer {}", dsm.writer_id);
        }

        sequence_tracker.update_timeout(dsm.writer_id);
        sink.on_dataset_message(dsm.writer_id, dsm);
    }

    if !matched_any {
        return Err(Error::NoMatchingReader);
    }
    Ok(())
}

/// A thread-safe, in-memory [`SequenceTracker`] keyed by writer id. Enough
/// for a single-process subscriber; a multi-node deployment would back this
/// with shared/persistent storage instead.
#[derive(Default)]
pub struct InMemorySequenceTracker {
    last_seen: Mutex<HashMap<u16, u16>>,
}

impl InMemorySequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SequenceTracker for InMemorySequenceTracker {
    fn is_newer_dsm_seq(&mut self, writer_id: u16, seq_num: u16) -> bool {
        let mut last_seen = self.last_seen.lock().expect("sequence tracker mutex poisoned");
        let fresh = match last_seen.get(&writer_id) {
            Some(&last) => dsm_sequence_number_is_fresh(last, seq_num),
            None => true,
        };
        if fresh {
            last_seen.insert(writer_id, seq_num);
        }
        fresh
    }

    /// A no-op here: this tracker only keeps sequence-number state, not
    /// wall-clock deadlines. Actual receive-timeout tracking reads a clock,
    /// which is an external collaborator this crate never touches
    /// (spec.md §1 Non-goals); an embedder that wants the timeout reset to
    /// do something wires its own [`SequenceTracker`] impl instead of this one.
    fn update_timeout(&mut self, _writer_id: u16) {}
}
