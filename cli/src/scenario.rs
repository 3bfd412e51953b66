//! # Scenario Runner
//!
//! A scenario is a JSON document describing initial balances and an ordered
//! list of steps. The runner builds a fresh vault on in-memory ledgers with a
//! manual clock, replays every step, and returns a [`Report`].
//!
//! Accounts are referred to by label (`"alice"`, `"treasury"`); each label
//! maps to a deterministic address via [`Address::from_label`].
//!
//! ```json
//! {
//!   "start_time": 1700000000,
//!   "vault": { "penalty_fee_bps": 500 },
//!   "balances": { "alice": 100, "treasury": 100 },
//!   "steps": [
//!     { "op": "deposit", "account": "alice", "amount": 50 },
//!     { "op": "reward", "amount": 100 },
//!     { "op": "advance", "days": 14 },
//!     { "op": "withdraw", "account": "alice" }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use tracing::{info, warn};
use vault_contracts::{
    Collaborators, MemoryToken, SharedVault, Vault, VaultError, VaultEvent, VaultSnapshot,
};
use vault_protocol::config::{
    VaultParams, DEFAULT_PENALTY_DEADLINE_SECS, DEFAULT_PENALTY_FEE_BPS, PROTOCOL_VERSION,
    SECONDS_PER_DAY,
};
use vault_protocol::{AccessControl, AccessError, Address, ManualClock, Pool, Role, TokenError};

use crate::metrics::VaultMetrics;

/// Errors that stop a scenario from running to completion.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The vault could not be constructed from the scenario parameters.
    #[error("vault setup failed: {0}")]
    Setup(#[source] VaultError),

    /// Seeding balances or minter grants failed.
    #[error("ledger setup failed: {0}")]
    Ledger(#[from] TokenError),

    /// A role grant was refused.
    #[error("role setup failed: {0}")]
    Access(#[from] AccessError),

    /// A step failed in strict mode.
    #[error("step {index} ({op}) failed: {source}")]
    StepFailed {
        /// Zero-based step index.
        index: usize,
        /// Step operation name.
        op: &'static str,
        /// The vault's error.
        source: VaultError,
    },
}

// ---------------------------------------------------------------------------
// Scenario Format
// ---------------------------------------------------------------------------

/// An asset or share amount in smallest units.
///
/// Accepts a JSON number or a decimal string. Amounts past `u64::MAX` (any
/// real 18-decimal balance) must use the string form, since JSON numbers
/// that large do not survive parsing. Serializes as a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(pub u128);

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AmountVisitor;

        impl<'de> Visitor<'de> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or a decimal string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
                Ok(Amount(v as u128))
            }

            fn visit_u128<E: de::Error>(self, v: u128) -> Result<Amount, E> {
                Ok(Amount(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
                u128::try_from(v)
                    .map(Amount)
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
                v.replace('_', "")
                    .parse::<u128>()
                    .map(Amount)
                    .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}

/// Vault construction knobs. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultSection {
    /// Label of the custody account.
    pub vault: String,
    /// Label of the treasury.
    pub treasury: String,
    /// Label holding both roles and owning the ledgers.
    pub admin: String,
    /// Early-withdrawal fee, bps.
    pub penalty_fee_bps: u32,
    /// Penalty window, seconds.
    pub penalty_deadline_secs: u64,
}

impl Default for VaultSection {
    fn default() -> Self {
        Self {
            vault: "vault".into(),
            treasury: "treasury".into(),
            admin: "admin".into(),
            penalty_fee_bps: DEFAULT_PENALTY_FEE_BPS,
            penalty_deadline_secs: DEFAULT_PENALTY_DEADLINE_SECS,
        }
    }
}

/// An extra role grant applied before the first step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    /// Account label.
    pub account: String,
    /// Role to grant.
    pub role: Role,
}

/// One scenario step. `caller` defaults to the admin label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Deposit asset.
    Deposit {
        /// Depositor label.
        account: String,
        /// Asset amount.
        amount: Amount,
    },
    /// Redeem shares. Omitting `shares` redeems the full balance.
    Withdraw {
        /// Redeemer label.
        account: String,
        /// Shares to burn.
        #[serde(default)]
        shares: Option<Amount>,
    },
    /// Treasury reward. `account` defaults to the current treasury.
    Reward {
        /// Asset amount.
        amount: Amount,
        /// Caller label.
        #[serde(default)]
        account: Option<String>,
    },
    /// Move the clock forward.
    Advance {
        /// Whole days.
        #[serde(default)]
        days: u64,
        /// Extra seconds.
        #[serde(default)]
        secs: u64,
    },
    /// Raw asset transfer into custody, bypassing the vault.
    Donate {
        /// Sender label.
        from: String,
        /// Asset amount.
        amount: Amount,
    },
    /// `set_penalty_fee`.
    SetPenaltyFee {
        /// Caller label.
        #[serde(default)]
        caller: Option<String>,
        /// New fee.
        bps: u32,
    },
    /// `set_penalty_deadline`.
    SetPenaltyDeadline {
        /// Caller label.
        #[serde(default)]
        caller: Option<String>,
        /// New window.
        secs: u64,
    },
    /// `set_treasury_address`.
    SetTreasury {
        /// Caller label.
        #[serde(default)]
        caller: Option<String>,
        /// New treasury label.
        account: String,
    },
    /// `set_deposit_pause`.
    SetDepositPause {
        /// Caller label.
        #[serde(default)]
        caller: Option<String>,
        /// New state.
        paused: bool,
    },
    /// `set_withdraw_pause`.
    SetWithdrawPause {
        /// Caller label.
        #[serde(default)]
        caller: Option<String>,
        /// New state.
        paused: bool,
    },
    /// `set_penalty_pause`.
    SetPenaltyPause {
        /// Caller label.
        #[serde(default)]
        caller: Option<String>,
        /// New state.
        paused: bool,
    },
    /// `reset_rewards`.
    ResetRewards {
        /// Caller label.
        #[serde(default)]
        caller: Option<String>,
        /// Sweep target label.
        to: String,
    },
}

impl Step {
    /// Snake-case operation name, matching the serialized `op` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Step::Deposit { .. } => "deposit",
            Step::Withdraw { .. } => "withdraw",
            Step::Reward { .. } => "reward",
            Step::Advance { .. } => "advance",
            Step::Donate { .. } => "donate",
            Step::SetPenaltyFee { .. } => "set_penalty_fee",
            Step::SetPenaltyDeadline { .. } => "set_penalty_deadline",
            Step::SetTreasury { .. } => "set_treasury",
            Step::SetDepositPause { .. } => "set_deposit_pause",
            Step::SetWithdrawPause { .. } => "set_withdraw_pause",
            Step::SetPenaltyPause { .. } => "set_penalty_pause",
            Step::ResetRewards { .. } => "reset_rewards",
        }
    }
}

fn default_start_time() -> u64 {
    1_700_000_000
}

/// A complete scenario file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Initial clock reading, unix seconds.
    #[serde(default = "default_start_time")]
    pub start_time: u64,
    /// Vault construction knobs.
    #[serde(default)]
    pub vault: VaultSection,
    /// Initial asset balances by label. Every funded account pre-approves
    /// the vault for its whole balance.
    #[serde(default)]
    pub balances: BTreeMap<String, Amount>,
    /// Extra role grants.
    #[serde(default)]
    pub grants: Vec<Grant>,
    /// Steps, replayed in order.
    pub steps: Vec<Step>,
}

impl Scenario {
    /// The scenario written by `share-vault init`: the deposit, reward and
    /// withdraw walk-through plus an early exit and a donation sweep.
    pub fn starter() -> Self {
        const UNIT: u128 = 1_000_000_000_000_000_000;
        let balances = BTreeMap::from([
            ("alice".to_string(), Amount(50 * UNIT)),
            ("bob".to_string(), Amount(30 * UNIT)),
            ("carol".to_string(), Amount(10 * UNIT)),
            ("treasury".to_string(), Amount(100 * UNIT)),
        ]);
        let steps = vec![
            Step::Deposit {
                account: "alice".into(),
                amount: Amount(50 * UNIT),
            },
            Step::Reward {
                amount: Amount(100 * UNIT),
                account: None,
            },
            Step::Deposit {
                account: "bob".into(),
                amount: Amount(30 * UNIT),
            },
            Step::Withdraw {
                account: "bob".into(),
                shares: None,
            },
            Step::Advance { days: 14, secs: 0 },
            Step::Withdraw {
                account: "alice".into(),
                shares: None,
            },
            Step::Donate {
                from: "carol".into(),
                amount: Amount(10 * UNIT),
            },
            Step::SetDepositPause {
                caller: None,
                paused: true,
            },
            Step::SetWithdrawPause {
                caller: None,
                paused: true,
            },
            Step::ResetRewards {
                caller: None,
                to: "treasury".into(),
            },
        ];
        Self {
            start_time: default_start_time(),
            vault: VaultSection::default(),
            balances,
            grants: Vec::new(),
            steps,
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Result of one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Zero-based step index.
    pub index: usize,
    /// Operation name.
    pub op: String,
    /// Clock reading when the step ran.
    pub at: u64,
    /// Whether the step succeeded.
    pub ok: bool,
    /// Step-specific result (minted shares, payout split, swept amount).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Error code on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Error message on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Ledger balances of one labelled account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalances {
    /// Asset balance.
    pub asset: u128,
    /// Share balance.
    pub shares: u128,
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Protocol version the run used.
    pub protocol_version: String,
    /// Per-step outcomes, in order.
    pub steps: Vec<StepOutcome>,
    /// Journaled events, in order.
    pub events: Vec<VaultEvent>,
    /// Final pool totals.
    pub pool: Pool,
    /// Final rate, scaled by `RATE_SCALE`.
    pub rate: u128,
    /// Custody account's observable asset balance.
    pub custody_balance: u128,
    /// Final balances of every labelled account.
    pub accounts: BTreeMap<String, AccountBalances>,
    /// Final vault state.
    pub snapshot: VaultSnapshot,
    /// Prometheus text output, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<String>,
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// A vault wired to in-memory collaborators, addressed by label.
pub struct Simulation {
    vault: SharedVault,
    asset: Arc<MemoryToken>,
    shares: Arc<MemoryToken>,
    clock: Arc<ManualClock>,
    vault_address: Address,
    admin: Address,
    labels: BTreeMap<String, Address>,
}

impl Simulation {
    /// Builds the vault and seeds balances and grants.
    pub fn new(scenario: &Scenario) -> Result<Self, ScenarioError> {
        let mut labels = BTreeMap::new();
        let section = &scenario.vault;
        let admin = label(&mut labels, &section.admin);
        let vault_address = label(&mut labels, &section.vault);
        let treasury = label(&mut labels, &section.treasury);

        let asset = Arc::new(MemoryToken::with_symbol(
            Address::from_label("asset-ledger"),
            admin,
            "ASSET",
        ));
        let shares = Arc::new(MemoryToken::with_symbol(
            Address::from_label("share-ledger"),
            admin,
            "SHARE",
        ));
        shares.grant_minter(&admin, vault_address)?;
        let roles = Arc::new(AccessControl::new(admin));
        let clock = Arc::new(ManualClock::new(scenario.start_time));

        for grant in &scenario.grants {
            let account = label(&mut labels, &grant.account);
            roles.grant_role(&admin, grant.role, account)?;
        }

        let params = VaultParams {
            vault_address,
            penalty_fee_bps: section.penalty_fee_bps,
            penalty_deadline_secs: section.penalty_deadline_secs,
            treasury,
        };
        let vault = Vault::new(
            params,
            Collaborators {
                asset: asset.clone(),
                shares: shares.clone(),
                roles,
                clock: clock.clone(),
            },
        )
        .map_err(ScenarioError::Setup)?;

        for (name, amount) in &scenario.balances {
            let account = label(&mut labels, name);
            asset.mint(&admin, &account, amount.0)?;
            asset.approve(&account, &vault_address, u128::MAX);
        }

        Ok(Self {
            vault: SharedVault::new(vault),
            asset,
            shares,
            clock,
            vault_address,
            admin,
            labels,
        })
    }

    /// Handle to the vault under simulation.
    pub fn vault(&self) -> &SharedVault {
        &self.vault
    }

    fn resolve(&mut self, name: &str) -> Address {
        label(&mut self.labels, name)
    }

    fn caller(&mut self, caller: &Option<String>) -> Address {
        match caller {
            Some(name) => self.resolve(name),
            None => self.admin,
        }
    }

    /// Applies one step, returning its JSON result.
    pub fn apply(&mut self, step: &Step) -> Result<serde_json::Value, VaultError> {
        match step {
            Step::Deposit { account, amount } => {
                let who = self.resolve(account);
                let minted = self.vault.deposit(&who, amount.0)?;
                Ok(serde_json::json!({ "shares_out": minted.to_string() }))
            }
            Step::Withdraw { account, shares } => {
                let who = self.resolve(account);
                let amount = match shares {
                    Some(shares) => shares.0,
                    None => self.shares.balance_of(&who),
                };
                let w = self.vault.withdraw(&who, amount)?;
                Ok(serde_json::json!({
                    "shares_in": w.shares_in.to_string(),
                    "asset_out": w.asset_out.to_string(),
                    "fee": w.fee.to_string(),
                    "net": w.net.to_string(),
                }))
            }
            Step::Reward { amount, account } => {
                let who = match account {
                    Some(name) => self.resolve(name),
                    None => self.vault.with(|v| v.treasury())?,
                };
                self.vault.reward(&who, amount.0)?;
                Ok(serde_json::json!({ "amount": amount.to_string() }))
            }
            Step::Advance { days, secs } => {
                let delta = days
                    .checked_mul(SECONDS_PER_DAY)
                    .and_then(|d| d.checked_add(*secs))
                    .ok_or(vault_protocol::MathError::Overflow)?;
                let now = self.clock.advance(delta);
                Ok(serde_json::json!({ "now": now }))
            }
            Step::Donate { from, amount } => {
                let who = self.resolve(from);
                self.asset.transfer(&who, &self.vault_address, amount.0)?;
                Ok(serde_json::json!({ "amount": amount.to_string() }))
            }
            Step::SetPenaltyFee { caller, bps } => {
                let who = self.caller(caller);
                self.vault.set_penalty_fee(&who, *bps)?;
                Ok(serde_json::json!({ "bps": bps }))
            }
            Step::SetPenaltyDeadline { caller, secs } => {
                let who = self.caller(caller);
                self.vault.set_penalty_deadline(&who, *secs)?;
                Ok(serde_json::json!({ "secs": secs }))
            }
            Step::SetTreasury { caller, account } => {
                let who = self.caller(caller);
                let treasury = self.resolve(account);
                self.vault.set_treasury_address(&who, treasury)?;
                Ok(serde_json::json!({ "treasury": treasury }))
            }
            Step::SetDepositPause { caller, paused } => {
                let who = self.caller(caller);
                self.vault.set_deposit_pause(&who, *paused)?;
                Ok(serde_json::json!({ "paused": paused }))
            }
            Step::SetWithdrawPause { caller, paused } => {
                let who = self.caller(caller);
                self.vault.set_withdraw_pause(&who, *paused)?;
                Ok(serde_json::json!({ "paused": paused }))
            }
            Step::SetPenaltyPause { caller, paused } => {
                let who = self.caller(caller);
                self.vault.set_penalty_pause(&who, *paused)?;
                Ok(serde_json::json!({ "paused": paused }))
            }
            Step::ResetRewards { caller, to } => {
                let who = self.caller(caller);
                let target = self.resolve(to);
                let swept = self.vault.reset_rewards(&who, target)?;
                Ok(serde_json::json!({ "swept": swept.to_string() }))
            }
        }
    }

    fn now(&self) -> u64 {
        use vault_protocol::Clock;
        self.clock.now()
    }

    fn balances(&self) -> BTreeMap<String, AccountBalances> {
        self.labels
            .iter()
            .map(|(name, address)| {
                (
                    name.clone(),
                    AccountBalances {
                        asset: self.asset.balance_of(address),
                        shares: self.shares.balance_of(address),
                    },
                )
            })
            .collect()
    }
}

fn label(labels: &mut BTreeMap<String, Address>, name: &str) -> Address {
    *labels
        .entry(name.to_string())
        .or_insert_with(|| Address::from_label(name))
}

/// Replays `scenario` against a fresh vault.
///
/// Failing steps are recorded in the report and the run continues, unless
/// `strict` is set, in which case the first failure aborts the run.
pub fn run(
    scenario: &Scenario,
    strict: bool,
    metrics: Option<&VaultMetrics>,
) -> Result<Report, ScenarioError> {
    let mut sim = Simulation::new(scenario)?;
    let mut outcomes = Vec::with_capacity(scenario.steps.len());
    let mut events = Vec::new();

    for (index, step) in scenario.steps.iter().enumerate() {
        let at = sim.now();
        let outcome = match sim.apply(step) {
            Ok(result) => StepOutcome {
                index,
                op: step.name().to_string(),
                at,
                ok: true,
                result: Some(result),
                error: None,
                message: None,
            },
            Err(err) => {
                warn!(index, op = step.name(), error = %err, "step rejected");
                if let Some(m) = metrics {
                    m.observe_rejection(&err);
                }
                if strict {
                    return Err(ScenarioError::StepFailed {
                        index,
                        op: step.name(),
                        source: err,
                    });
                }
                StepOutcome {
                    index,
                    op: step.name().to_string(),
                    at,
                    ok: false,
                    result: None,
                    error: Some(err.code().to_string()),
                    message: Some(err.to_string()),
                }
            }
        };
        outcomes.push(outcome);

        let drained = sim.vault.drain_events().map_err(|source| ScenarioError::StepFailed {
            index,
            op: step.name(),
            source,
        })?;
        if let Some(m) = metrics {
            drained.iter().for_each(|e| m.observe_event(e));
        }
        events.extend(drained);
    }

    let finish = |source| ScenarioError::StepFailed {
        index: scenario.steps.len(),
        op: "report",
        source,
    };
    let snapshot = sim.vault.snapshot().map_err(finish)?;
    let rate = sim.vault.rate().map_err(finish)?;
    if let Some(m) = metrics {
        m.observe_pool(&snapshot.pool);
    }
    let metrics_text = match metrics {
        Some(m) => match m.encode() {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(error = %e, "failed to encode metrics");
                None
            }
        },
        None => None,
    };

    let ok = outcomes.iter().filter(|o| o.ok).count();
    info!(steps = outcomes.len(), ok, events = events.len(), "scenario finished");

    Ok(Report {
        protocol_version: PROTOCOL_VERSION.to_string(),
        steps: outcomes,
        events,
        pool: snapshot.pool,
        rate,
        custody_balance: sim.asset.balance_of(&sim.vault_address),
        accounts: sim.balances(),
        snapshot,
        metrics: metrics_text,
    })
}
