// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Share Vault Contracts
//!
//! The stateful half of the vault: depositors hand over a fungible asset and
//! receive shares that redeem for a growing slice of the pool as the treasury
//! injects rewards.
//!
//! - **Vault** — pool totals, deposit/withdraw/reward orchestration, and the
//!   read-only queries.
//! - **Admin** — role-gated setters and the reward reconciliation hatch.
//! - **Penalty** — per-depositor rolling deadlines for the early-withdrawal
//!   fee.
//! - **Guard** — thread-safe handle that serializes callers and rejects
//!   reentrant calls.
//! - **Ledger** — an in-memory token usable as both asset and share ledger.
//!
//! ## Design Principles
//!
//! 1. All monetary operations check for overflow. Products go through a
//!    256-bit intermediate and every division truncates in the pool's favour.
//! 2. State is committed before any external ledger call, and a failed call
//!    leaves no net change behind.
//! 3. Role checks gate every privileged operation and run before validation.
//! 4. Every event and snapshot is serializable (serde) for reports and
//!    persistence.

pub mod admin;
pub mod error;
pub mod events;
pub mod guard;
pub mod ledger;
pub mod penalty;
pub mod settings;
pub mod vault;

pub use error::{ConfigError, ConfigField, NotReadyReason, VaultError};
pub use events::VaultEvent;
pub use guard::SharedVault;
pub use ledger::MemoryToken;
pub use penalty::PenaltyBook;
pub use settings::VaultSettings;
pub use vault::{Collaborators, Vault, VaultSnapshot, Withdrawal};
