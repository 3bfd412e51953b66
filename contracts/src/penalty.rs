//! # Penalty Book
//!
//! Per-depositor rolling deadlines. Every successful deposit overwrites the
//! depositor's deadline with `now + window`, so even a small top-up restarts
//! the clock for that account. Entries are never removed, only superseded;
//! an account with no entry has no deadline and never pays a penalty.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use vault_protocol::Address;

/// Deadlines keyed by depositor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyBook {
    deadlines: HashMap<Address, u64>,
}

impl PenaltyBook {
    /// An empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `account`'s deadline, returning the one it replaced.
    pub fn arm(&mut self, account: Address, deadline: u64) -> Option<u64> {
        self.deadlines.insert(account, deadline)
    }

    /// Puts back a previous deadline (or absence) after a failed operation.
    pub(crate) fn restore(&mut self, account: Address, previous: Option<u64>) {
        match previous {
            Some(deadline) => {
                self.deadlines.insert(account, deadline);
            }
            None => {
                self.deadlines.remove(&account);
            }
        }
    }

    /// Deadline of `account`, if it ever deposited.
    pub fn deadline_of(&self, account: &Address) -> Option<u64> {
        self.deadlines.get(account).copied()
    }

    /// `true` when `account` has no deadline or `now >= deadline`.
    pub fn has_passed(&self, account: &Address, now: u64) -> bool {
        match self.deadline_of(account) {
            Some(deadline) => now >= deadline,
            None => true,
        }
    }

    /// Whether a withdrawal by `account` at `now` pays the penalty.
    pub fn applies(&self, account: &Address, now: u64, penalty_paused: bool) -> bool {
        !penalty_paused && !self.has_passed(account, now)
    }

    /// Number of accounts that ever deposited.
    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    /// `true` if nobody ever deposited.
    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::from_label("alice")
    }

    #[test]
    fn unknown_account_has_passed() {
        let book = PenaltyBook::new();
        assert_eq!(book.deadline_of(&alice()), None);
        assert!(book.has_passed(&alice(), 0));
        assert!(!book.applies(&alice(), 0, false));
    }

    #[test]
    fn deadline_boundary_is_inclusive() {
        let mut book = PenaltyBook::new();
        book.arm(alice(), 1_000);
        assert!(!book.has_passed(&alice(), 999));
        assert!(book.has_passed(&alice(), 1_000));
        assert!(book.applies(&alice(), 999, false));
        assert!(!book.applies(&alice(), 1_000, false));
    }

    #[test]
    fn pause_disables_penalty() {
        let mut book = PenaltyBook::new();
        book.arm(alice(), 1_000);
        assert!(!book.applies(&alice(), 10, true));
    }

    #[test]
    fn rearm_supersedes_and_restore_reverts() {
        let mut book = PenaltyBook::new();
        assert_eq!(book.arm(alice(), 100), None);
        assert_eq!(book.arm(alice(), 200), Some(100));
        assert_eq!(book.deadline_of(&alice()), Some(200));

        book.restore(alice(), Some(100));
        assert_eq!(book.deadline_of(&alice()), Some(100));

        book.restore(alice(), None);
        assert!(book.is_empty());
    }
}
