//! Undo log for entry-point transactions.
//!
//! Transactional entry points change [`CallState`] only through the methods
//! below. Each one records the prior value of what it touches, so reverting a
//! failed entry point or handler replays just those records backwards instead
//! of restoring a copy of the whole state.

use std::collections::BTreeSet;

use crate::{
    error::CallError,
    hash::Digest,
    ledger::OutboundCall,
    proxy::ProxyRequest,
    quorum::{Vote, VoteKind},
    state::CallState,
};

use super::CallService;

/// Prior value of one piece of state.
#[derive(Debug, Clone)]
enum Undo {
    LastSn(u128),
    LastReqId(u128),
    Rollback { sn: u128, prior: Option<OutboundCall> },
    Proxy { req_id: u128, prior: Option<ProxyRequest> },
    Votes { kind: VoteKind, key: Digest, prior: Option<BTreeSet<String>> },
    Success(u128),
}

/// Changes made since the outermost open transaction began.
#[derive(Debug, Clone, Default)]
pub(super) struct Journal {
    entries: Vec<Undo>,
}

impl Journal {
    /// Position to revert or commit to.
    pub(super) fn mark(&self) -> usize {
        self.entries.len()
    }

    /// Forget the changes recorded after `mark`; they become permanent.
    pub(super) fn commit(&mut self, mark: usize) {
        self.entries.truncate(mark);
    }

    /// Undo every change recorded after `mark`, newest first.
    pub(super) fn revert(&mut self, mark: usize, state: &mut CallState) {
        for undo in self.entries.drain(mark..).rev() {
            match undo {
                Undo::LastSn(sn) => state.last_sn = sn,
                Undo::LastReqId(req_id) => state.last_req_id = req_id,
                Undo::Rollback { sn, prior } => state.rollbacks.restore(sn, prior),
                Undo::Proxy { req_id, prior } => state.proxy_requests.restore(req_id, prior),
                Undo::Votes { kind, key, prior } => state.quorum.restore(kind, key, prior),
                Undo::Success(sn) => {
                    state.successful.remove(&sn);
                },
            }
        }
    }

    #[cfg(test)]
    pub(super) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CallService {
    pub(super) fn next_sn(&mut self) -> Result<u128, CallError> {
        let prior = self.state.last_sn;
        let sn = self.state.next_sn()?;
        self.journal.entries.push(Undo::LastSn(prior));
        Ok(sn)
    }

    pub(super) fn next_req_id(&mut self) -> Result<u128, CallError> {
        let prior = self.state.last_req_id;
        let req_id = self.state.next_req_id()?;
        self.journal.entries.push(Undo::LastReqId(prior));
        Ok(req_id)
    }

    pub(super) fn insert_rollback(&mut self, sn: u128, call: OutboundCall) {
        let prior = self.state.rollbacks.get(sn).cloned();
        self.state.rollbacks.insert(sn, call);
        self.journal.entries.push(Undo::Rollback { sn, prior });
    }

    pub(super) fn enable_rollback(&mut self, sn: u128) -> Result<(), CallError> {
        let prior = self.state.rollbacks.get(sn).cloned();
        self.state.rollbacks.enable(sn)?;
        self.journal.entries.push(Undo::Rollback { sn, prior });
        Ok(())
    }

    pub(super) fn take_enabled_rollback(&mut self, sn: u128) -> Result<OutboundCall, CallError> {
        let call = self.state.rollbacks.take_enabled(sn)?;
        self.journal.entries.push(Undo::Rollback { sn, prior: Some(call.clone()) });
        Ok(call)
    }

    /// Drop the rollback record of `sn` and remember it as successful.
    pub(super) fn complete_call(&mut self, sn: u128) {
        if let Some(call) = self.state.rollbacks.remove(sn) {
            self.journal.entries.push(Undo::Rollback { sn, prior: Some(call) });
        }
        if self.state.successful.insert(sn) {
            self.journal.entries.push(Undo::Success(sn));
        }
    }

    pub(super) fn insert_proxy(&mut self, req_id: u128, request: ProxyRequest) {
        let prior = self.state.proxy_requests.get(req_id).cloned();
        self.state.proxy_requests.insert(req_id, request);
        self.journal.entries.push(Undo::Proxy { req_id, prior });
    }

    pub(super) fn take_verified_proxy(
        &mut self,
        req_id: u128,
        data: &[u8],
    ) -> Result<ProxyRequest, CallError> {
        let request = self.state.proxy_requests.take_verified(req_id, data)?;
        self.journal.entries.push(Undo::Proxy { req_id, prior: Some(request.clone()) });
        Ok(request)
    }

    pub(super) fn take_proxy(&mut self, req_id: u128) -> Result<ProxyRequest, CallError> {
        let request = self.state.proxy_requests.take(req_id)?;
        self.journal.entries.push(Undo::Proxy { req_id, prior: Some(request.clone()) });
        Ok(request)
    }

    pub(super) fn record_vote(
        &mut self,
        kind: VoteKind,
        key: Digest,
        path: &str,
        declared: &[String],
    ) -> Vote {
        let prior = self.state.quorum.votes(kind, &key).cloned();
        let vote = self.state.quorum.record(kind, key, path, declared);
        self.journal.entries.push(Undo::Votes { kind, key, prior });
        vote
    }
}
