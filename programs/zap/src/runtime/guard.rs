//! Per-contract re-entrancy locks.
//!
//! The lock set lives outside the snapshot-able [`State`](super::State): a
//! rollback must never resurrect or drop a lock that a live frame holds.

use std::{cell::RefCell, collections::BTreeSet, rc::Rc};

use solana_sdk::pubkey::Pubkey;

use crate::error::{Result, ZapError};

#[derive(Debug, Clone, Default)]
pub struct Locks {
    held: Rc<RefCell<BTreeSet<Pubkey>>>,
}

impl Locks {
    /// Take the lock for `contract`, or fail with `ReentrantCall` if a frame
    /// further up the stack already holds it.
    pub fn acquire(&self, contract: Pubkey) -> Result<LockGuard> {
        if !self.held.borrow_mut().insert(contract) {
            return Err(ZapError::ReentrantCall);
        }
        Ok(LockGuard {
            held: Rc::clone(&self.held),
            contract,
        })
    }

    pub fn is_held(&self, contract: &Pubkey) -> bool {
        self.held.borrow().contains(contract)
    }
}

/// Releases its lock when dropped, on success and error paths alike.
#[derive(Debug)]
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard {
    held: Rc<RefCell<BTreeSet<Pubkey>>>,
    contract: Pubkey,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.held.borrow_mut().remove(&self.contract);
    }
}
