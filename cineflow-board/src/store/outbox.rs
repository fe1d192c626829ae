//! Local writes the backend hasn't echoed back yet
//!
//! When the backend echoes one of our own writes, the writes still queued or
//! in flight are laid over the echo, so a client never rolls back its own
//! edits while they are on their way. Snapshots written by anyone else are
//! adopted as they are. A write leaves the outbox when a snapshot reflecting
//! it arrives, or when the backend rejects it.

use crate::types::{Document, DocumentPatch};
use std::collections::VecDeque;

#[derive(Debug)]
struct Outgoing {
    seq: u64,
    patch: DocumentPatch,
    /// Handed to the gateway; only sent writes can be echoed
    sent: bool,
}

#[derive(Debug, Default)]
pub(super) struct Outbox {
    next_seq: u64,
    entries: VecDeque<Outgoing>,
}

impl Outbox {
    /// Record a local write, returning its sequence number
    pub fn push(&mut self, patch: DocumentPatch) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push_back(Outgoing {
            seq,
            patch,
            sent: false,
        });
        seq
    }

    /// Swap the patch of a write that hasn't been sent yet
    pub fn replace(&mut self, seq: u64, patch: DocumentPatch) -> bool {
        match self.entries.iter_mut().find(|e| e.seq == seq && !e.sent) {
            Some(entry) => {
                entry.patch = patch;
                true
            }
            None => false,
        }
    }

    pub fn mark_sent(&mut self, seq: u64) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.seq == seq) {
            entry.sent = true;
        }
    }

    /// Forget a write the backend refused
    pub fn discard(&mut self, seq: u64) {
        self.entries.retain(|e| e.seq != seq);
    }

    /// Forget every sent write. Used after snapshots were skipped, since
    /// their echoes may never arrive.
    pub fn forget_sent(&mut self) {
        self.entries.retain(|e| !e.sent);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Resolve a snapshot into the state to show.
    ///
    /// An echo of a sent write retires it along with every write sent
    /// before it, since writes reach the backend in order, and gets the
    /// remaining writes laid over it. Any other snapshot comes from another
    /// writer and is returned unchanged.
    pub fn rebase(&mut self, mut snapshot: Document) -> Document {
        let Some(echoed) = self
            .entries
            .iter()
            .position(|e| e.sent && e.patch.is_reflected_in(&snapshot))
        else {
            return snapshot;
        };

        let mut index = 0;
        self.entries.retain(|e| {
            let keep = !e.sent || index > echoed;
            index += 1;
            keep
        });

        for entry in &self.entries {
            snapshot.apply(entry.patch.clone());
        }
        snapshot
    }
}
