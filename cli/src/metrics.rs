//! # Prometheus Metrics
//!
//! Vault activity counters fed from the event journal. The simulator renders
//! them in the Prometheus text exposition format at the end of a run.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] under
//! the `share_vault` prefix so they do not collide with the default global
//! registry.

use prometheus::{
    Counter, Encoder, Gauge, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use vault_contracts::{VaultError, VaultEvent};
use vault_protocol::Pool;

/// Holds all Prometheus metric handles for one vault.
#[derive(Clone)]
pub struct VaultMetrics {
    registry: Registry,
    /// Committed deposits.
    pub deposits_total: IntCounter,
    /// Committed withdrawals.
    pub withdrawals_total: IntCounter,
    /// Committed rewards.
    pub rewards_total: IntCounter,
    /// Asset units routed to the treasury as early-withdrawal fees.
    pub penalty_fees_collected: Counter,
    /// Admin calls that changed a setting.
    pub admin_updates_total: IntCounter,
    /// Pool counter for locked asset.
    pub total_locked_asset: Gauge,
    /// Pool counter for outstanding shares.
    pub total_shares: Gauge,
    /// Rejected operations, labelled by error code.
    pub rejected_operations_total: IntCounterVec,
}

impl VaultMetrics {
    /// Creates and registers all metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("share_vault".into()), None)?;

        let deposits_total = IntCounter::new("deposits_total", "Committed deposits")?;
        registry.register(Box::new(deposits_total.clone()))?;

        let withdrawals_total = IntCounter::new("withdrawals_total", "Committed withdrawals")?;
        registry.register(Box::new(withdrawals_total.clone()))?;

        let rewards_total = IntCounter::new("rewards_total", "Committed treasury rewards")?;
        registry.register(Box::new(rewards_total.clone()))?;

        let penalty_fees_collected = Counter::new(
            "penalty_fees_collected",
            "Asset units paid to the treasury as early-withdrawal fees",
        )?;
        registry.register(Box::new(penalty_fees_collected.clone()))?;

        let admin_updates_total =
            IntCounter::new("admin_updates_total", "Settings changed by admin calls")?;
        registry.register(Box::new(admin_updates_total.clone()))?;

        let total_locked_asset =
            Gauge::new("total_locked_asset", "Asset accounted to the pool")?;
        registry.register(Box::new(total_locked_asset.clone()))?;

        let total_shares = Gauge::new("total_shares", "Outstanding shares")?;
        registry.register(Box::new(total_shares.clone()))?;

        let rejected_operations_total = IntCounterVec::new(
            Opts::new(
                "rejected_operations_total",
                "Operations rejected by the vault, by error code",
            ),
            &["error"],
        )?;
        registry.register(Box::new(rejected_operations_total.clone()))?;

        Ok(Self {
            registry,
            deposits_total,
            withdrawals_total,
            rewards_total,
            penalty_fees_collected,
            admin_updates_total,
            total_locked_asset,
            total_shares,
            rejected_operations_total,
        })
    }

    /// Counts one journaled event.
    pub fn observe_event(&self, event: &VaultEvent) {
        match event {
            VaultEvent::Deposit { .. } => self.deposits_total.inc(),
            VaultEvent::Withdraw { .. } => self.withdrawals_total.inc(),
            VaultEvent::RewardAdded { .. } => self.rewards_total.inc(),
            VaultEvent::PenaltyCharged { fee, .. } => {
                self.penalty_fees_collected.inc_by(*fee as f64)
            }
            VaultEvent::RewardsReset { .. } => {}
            VaultEvent::PenaltyFeeUpdated { .. }
            | VaultEvent::PenaltyDeadlineUpdated { .. }
            | VaultEvent::TreasuryAddressUpdated { .. }
            | VaultEvent::DepositPaused { .. }
            | VaultEvent::WithdrawPaused { .. }
            | VaultEvent::PenaltyPaused { .. } => self.admin_updates_total.inc(),
        }
    }

    /// Mirrors the pool counters. Gauges are `f64`; very large totals lose
    /// precision.
    pub fn observe_pool(&self, pool: &Pool) {
        self.total_locked_asset.set(pool.total_locked_asset as f64);
        self.total_shares.set(pool.total_shares as f64);
    }

    /// Counts one rejected operation.
    pub fn observe_rejection(&self, err: &VaultError) {
        self.rejected_operations_total
            .with_label_values(&[err.code()])
            .inc();
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
