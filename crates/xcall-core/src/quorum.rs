//! Multi-path confirmation.
//!
//! A message declaring two or more paths is trusted only after every declared
//! path has delivered byte-identical content. Votes are keyed by the hash of
//! the delivered payload, so paths that disagree on content vote for different
//! keys and never complete each other's quorum.
//!
//! Messages declaring zero or one path never reach this tracker: the single
//! authorised path (declared or default) is checked by the caller and is a
//! quorum on its own.
//!
//! Requests and results are tracked in separate sets so that a request and a
//! result can never pool votes even if their payload hashes collide.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::hash::Digest;

/// Which vote set a delivery counts towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteKind {
    /// Inbound request
    Request,
    /// Inbound result
    Result,
}

/// Outcome of recording a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    /// Some declared paths have not delivered yet.
    Pending {
        /// Distinct paths that have delivered
        confirmed: usize,
        /// Paths required
        required: usize,
    },
    /// Every declared path has delivered; the vote set was cleared.
    Complete,
}

/// Pending votes for requests and results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumTracker {
    requests: BTreeMap<Digest, BTreeSet<String>>,
    results: BTreeMap<Digest, BTreeSet<String>>,
}

impl QuorumTracker {
    /// Record that `path` delivered the payload hashing to `key`.
    ///
    /// `path` must already be known to be one of `declared`. Repeated votes
    /// from the same path count once.
    pub fn record(&mut self, kind: VoteKind, key: Digest, path: &str, declared: &[String]) -> Vote {
        let votes = match kind {
            VoteKind::Request => &mut self.requests,
            VoteKind::Result => &mut self.results,
        };

        let voters = votes.entry(key).or_default();
        voters.insert(path.to_string());

        let required = declared.iter().collect::<BTreeSet<_>>().len();
        let confirmed = voters.len();
        if confirmed < required {
            return Vote::Pending { confirmed, required };
        }

        votes.remove(&key);
        Vote::Complete
    }

    /// Paths that have voted for `key` so far.
    pub fn voters(&self, kind: VoteKind, key: &Digest) -> Vec<String> {
        self.votes(kind, key).map(|set| set.iter().cloned().collect()).unwrap_or_default()
    }

    pub(crate) fn votes(&self, kind: VoteKind, key: &Digest) -> Option<&BTreeSet<String>> {
        match kind {
            VoteKind::Request => self.requests.get(key),
            VoteKind::Result => self.results.get(key),
        }
    }

    /// Put back the votes for `key` as they were before a reverted change.
    pub(crate) fn restore(&mut self, kind: VoteKind, key: Digest, prior: Option<BTreeSet<String>>) {
        let votes = match kind {
            VoteKind::Request => &mut self.requests,
            VoteKind::Result => &mut self.results,
        };
        match prior {
            Some(voters) => votes.insert(key, voters),
            None => votes.remove(&key),
        };
    }

    /// Whether no vote is pending.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty() && self.results.is_empty()
    }
}
