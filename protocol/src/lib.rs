// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Share Vault Protocol — Core Primitives
//!
//! The building blocks every vault component shares: addresses, protocol
//! constants, wide fixed-point math, the rate engine, and the contracts that
//! external collaborators (asset ledger, share ledger, role checker, clock)
//! must satisfy.
//!
//! ## Architecture
//!
//! - **address** — 20-byte account identifiers with hex encoding.
//! - **config** — Protocol constants and vault construction parameters.
//! - **math** — `a * b / c` through a 256-bit intermediate, truncating.
//! - **rate** — Pool totals and asset/share conversion.
//! - **token** — `AssetLedger` and `ShareLedger` traits.
//! - **access** — Roles, the `RoleChecker` trait, an in-memory registry.
//! - **clock** — Wall-clock and manual time sources.
//!
//! ## Design Philosophy
//!
//! 1. Integer arithmetic only. Every division truncates toward zero, and the
//!    pool keeps the dust.
//! 2. No component here mutates vault state; that is the contracts crate's
//!    job, behind its own guard.
//! 3. If it touches money, it has tests. Plural.

pub mod access;
pub mod address;
pub mod clock;
pub mod config;
pub mod math;
pub mod rate;
pub mod token;

pub use access::{AccessControl, AccessError, Role, RoleChecker};
pub use address::{Address, AddressError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use math::MathError;
pub use rate::{Pool, RateError};
pub use token::{AssetLedger, ShareLedger, TokenError};
