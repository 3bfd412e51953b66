//! Integration tests for the vault lifecycle.
//!
//! These walk deposits, rewards and withdrawals across the shared handle and
//! the in-memory ledgers: the seed rate, reward compounding, the penalty
//! split, rolling deadlines, pause switches, and donation immunity.

mod common;

use common::{treasury, user, vault_addr, Harness, GENESIS, UNIT};
use vault_contracts::{VaultError, VaultEvent};
use vault_protocol::config::{RATE_SCALE, SECONDS_PER_DAY};

const WINDOW: u64 = 14 * SECONDS_PER_DAY;

// ---------------------------------------------------------------------------
// Rate & Rewards
// ---------------------------------------------------------------------------

#[test]
fn deposit_reward_withdraw_scenario() {
    let h = Harness::new();
    let alice = user("alice");
    h.fund(&alice, 50 * UNIT);
    h.fund(&treasury(), 100 * UNIT);

    // 1. Seed deposit mints 1:1.
    assert_eq!(h.vault.deposit(&alice, 50 * UNIT).unwrap(), 50 * UNIT);
    assert_eq!(h.vault.rate().unwrap(), RATE_SCALE);

    // 2. Reward: 150 asset over 50 shares.
    h.vault.reward(&treasury(), 100 * UNIT).unwrap();
    assert_eq!(h.vault.rate().unwrap(), 3 * RATE_SCALE);
    assert_eq!(h.vault.total_shares().unwrap(), 50 * UNIT);
    assert_eq!(h.vault.amount_at_rate(10 * UNIT).unwrap(), 30 * UNIT);

    // 3. Past the window, the whole position redeems fee-free.
    h.clock.advance(WINDOW);
    let w = h.vault.withdraw(&alice, 50 * UNIT).unwrap();
    assert_eq!(w.asset_out, 150 * UNIT);
    assert_eq!(w.fee, 0);
    assert_eq!(h.asset_of(&alice), 150 * UNIT);
    assert_eq!(h.vault.total_shares().unwrap(), 0);
    assert_eq!(h.vault.total_locked_asset().unwrap(), 0);
    assert_eq!(h.vault.rate().unwrap(), 0);
}

#[test]
fn later_depositor_buys_in_at_current_rate() {
    let h = Harness::new();
    let alice = user("alice");
    let bob = user("bob");
    h.fund(&treasury(), 150 * UNIT);
    h.fund(&alice, 50 * UNIT);
    h.fund(&bob, 100 * UNIT);

    // Treasury seeds the pool like any depositor.
    h.vault.deposit(&treasury(), 50 * UNIT).unwrap();
    h.vault.deposit(&alice, 50 * UNIT).unwrap();
    h.vault.reward(&treasury(), 100 * UNIT).unwrap();
    assert_eq!(h.vault.rate().unwrap(), 2 * RATE_SCALE);

    // 100 asset at rate 2 buys 50 shares, leaving the rate untouched.
    assert_eq!(h.vault.deposit(&bob, 100 * UNIT).unwrap(), 50 * UNIT);
    assert_eq!(h.vault.rate().unwrap(), 2 * RATE_SCALE);
    assert_eq!(h.vault.amount_at_rate(10 * UNIT).unwrap(), 20 * UNIT);
}

#[test]
fn reward_strictly_raises_rate_and_mints_nothing() {
    let h = Harness::new();
    let alice = user("alice");
    h.fund(&alice, 1_000);
    h.fund(&treasury(), 1_000);
    h.vault.deposit(&alice, 1_000).unwrap();

    let mut last_rate = h.vault.rate().unwrap();
    for _ in 0..5 {
        h.vault.reward(&treasury(), 1).unwrap();
        let rate = h.vault.rate().unwrap();
        assert!(rate > last_rate);
        assert_eq!(h.vault.total_shares().unwrap(), 1_000);
        last_rate = rate;
    }
    let names: Vec<_> = h
        .vault
        .drain_events()
        .unwrap()
        .iter()
        .map(|e| e.name())
        .collect();
    assert_eq!(names.iter().filter(|n| **n == "reward_added").count(), 5);
}

#[test]
fn only_treasury_may_reward() {
    let h = Harness::new();
    let alice = user("alice");
    h.fund(&alice, 10);
    assert_eq!(
        h.vault.reward(&alice, 10),
        Err(VaultError::NotTreasury { caller: alice })
    );
    assert_eq!(h.asset_of(&alice), 10);
}

// ---------------------------------------------------------------------------
// Penalty
// ---------------------------------------------------------------------------

#[test]
fn early_withdrawal_splits_fee_to_treasury() {
    let h = Harness::with_params(|p| p.penalty_fee_bps = 500);
    let alice = user("alice");
    h.fund(&alice, 100 * UNIT);
    h.vault.deposit(&alice, 100 * UNIT).unwrap();

    let w = h.vault.withdraw(&alice, 50 * UNIT).unwrap();
    assert_eq!(w.asset_out, 50 * UNIT);
    assert_eq!(w.fee, 5 * UNIT / 2);
    assert_eq!(h.asset_of(&treasury()), 5 * UNIT / 2);
    assert_eq!(h.asset_of(&alice), 95 * UNIT / 2);

    let events = h.vault.drain_events().unwrap();
    assert_eq!(
        events[1],
        VaultEvent::Withdraw {
            account: alice,
            shares_in: 50 * UNIT,
            asset_out: 50 * UNIT,
        }
    );
    assert_eq!(
        events[2],
        VaultEvent::PenaltyCharged {
            account: alice,
            fee: 5 * UNIT / 2,
            treasury: treasury(),
        }
    );
}

#[test]
fn deposit_then_exit_matches_fee_formula() {
    let h = Harness::new();
    let alice = user("alice");
    let amount = 123_456_789u128;
    h.fund(&alice, amount);
    let minted = h.vault.deposit(&alice, amount).unwrap();
    h.vault.withdraw(&alice, minted).unwrap();

    let fee = amount * 60 / 10_000;
    assert_eq!(h.asset_of(&treasury()), fee);
    assert_eq!(h.asset_of(&alice), amount - fee);
}

#[test]
fn penalty_pause_waives_fee() {
    let h = Harness::new();
    let alice = user("alice");
    h.fund(&alice, 10_000);
    h.vault.deposit(&alice, 10_000).unwrap();
    h.vault.set_penalty_pause(&common::admin(), true).unwrap();

    assert!(!h.vault.has_user_deadline_passed(&alice).unwrap());
    let w = h.vault.withdraw(&alice, 10_000).unwrap();
    assert_eq!(w.fee, 0);
    assert_eq!(h.asset_of(&alice), 10_000);
    assert_eq!(h.asset_of(&treasury()), 0);
}

#[test]
fn deposit_while_penalty_paused_still_arms_window() {
    let h = Harness::new();
    let alice = user("alice");
    h.fund(&alice, 100);
    h.vault.set_penalty_pause(&common::admin(), true).unwrap();

    h.vault.deposit(&alice, 100).unwrap();
    // The pause waives the fee but the window is tracked regardless, so
    // unpausing makes it bite again.
    assert_eq!(h.vault.user_deadline_of(&alice).unwrap(), GENESIS + WINDOW);
    assert!(!h.vault.has_user_deadline_passed(&alice).unwrap());

    h.vault.set_penalty_pause(&common::admin(), false).unwrap();
    let w = h.vault.withdraw(&alice, 100).unwrap();
    assert_eq!(w.fee, 100 * 60 / 10_000);
}

#[test]
fn each_deposit_restarts_the_window() {
    let h = Harness::new();
    let alice = user("alice");
    h.fund(&alice, 200);

    h.vault.deposit(&alice, 100).unwrap();
    assert_eq!(h.vault.user_deadline_of(&alice).unwrap(), GENESIS + WINDOW);

    h.clock.advance(10 * SECONDS_PER_DAY);
    h.vault.deposit(&alice, 1).unwrap();
    let rearmed = GENESIS + 10 * SECONDS_PER_DAY + WINDOW;
    assert_eq!(h.vault.user_deadline_of(&alice).unwrap(), rearmed);

    // The first deadline is behind us, the top-up's is not.
    h.clock.advance(5 * SECONDS_PER_DAY);
    assert!(!h.vault.has_user_deadline_passed(&alice).unwrap());

    h.clock.set(rearmed);
    assert!(h.vault.has_user_deadline_passed(&alice).unwrap());
}

#[test]
fn unknown_account_has_no_deadline() {
    let h = Harness::new();
    let stranger = user("stranger");
    assert_eq!(h.vault.user_deadline_of(&stranger).unwrap(), 0);
    assert!(h.vault.has_user_deadline_passed(&stranger).unwrap());
}

// ---------------------------------------------------------------------------
// Pauses
// ---------------------------------------------------------------------------

#[test]
fn paused_operations_rejected_without_side_effects() {
    let h = Harness::new();
    let alice = user("alice");
    h.fund(&alice, 100);
    h.vault.deposit(&alice, 50).unwrap();

    h.vault.set_deposit_pause(&common::admin(), true).unwrap();
    assert_eq!(h.vault.deposit(&alice, 50), Err(VaultError::DepositPaused));

    h.vault.set_withdraw_pause(&common::admin(), true).unwrap();
    assert_eq!(h.vault.withdraw(&alice, 50), Err(VaultError::WithdrawPaused));

    assert_eq!(h.vault.total_locked_asset().unwrap(), 50);
    assert_eq!(h.asset_of(&alice), 50);
    assert_eq!(h.shares_of(&alice), 50);
}

// ---------------------------------------------------------------------------
// Donations
// ---------------------------------------------------------------------------

#[test]
fn direct_transfer_does_not_move_the_rate() {
    let h = Harness::new();
    let attacker = user("attacker");
    let victim = user("victim");
    h.fund(&attacker, 1_000_001 * UNIT);
    h.fund(&victim, 100 * UNIT);

    // Classic front-run: seed with dust, then inflate the share price with a
    // raw transfer so the victim's deposit rounds down to nothing.
    h.vault.deposit(&attacker, 1).unwrap();
    h.asset
        .transfer(&attacker, &vault_addr(), 1_000_000 * UNIT)
        .unwrap();
    assert_eq!(h.vault.rate().unwrap(), RATE_SCALE);

    assert_eq!(h.vault.deposit(&victim, 100 * UNIT).unwrap(), 100 * UNIT);
    h.clock.advance(WINDOW);
    let w = h.vault.withdraw(&victim, 100 * UNIT).unwrap();
    assert_eq!(w.asset_out, 100 * UNIT);

    // The donation stays parked as unaccounted custody balance.
    let admin = common::admin();
    h.vault.set_deposit_pause(&admin, true).unwrap();
    h.vault.set_withdraw_pause(&admin, true).unwrap();
    let sink = user("sink");
    assert_eq!(h.vault.reset_rewards(&admin, sink).unwrap(), 1_000_000 * UNIT);
    assert_eq!(h.asset_of(&sink), 1_000_000 * UNIT);
    assert_eq!(h.asset_of(&vault_addr()), h.vault.total_locked_asset().unwrap());
}

// ---------------------------------------------------------------------------
// Failure Atomicity
// ---------------------------------------------------------------------------

#[test]
fn deposit_without_allowance_changes_nothing() {
    let h = Harness::new();
    let alice = user("alice");
    h.asset.mint(&common::admin(), &alice, 100).unwrap();

    let err = h.vault.deposit(&alice, 100).unwrap_err();
    assert!(matches!(err, VaultError::Token(_)));
    assert_eq!(h.vault.total_locked_asset().unwrap(), 0);
    assert_eq!(h.vault.user_deadline_of(&alice).unwrap(), 0);
    assert!(h.vault.drain_events().unwrap().is_empty());
}

#[test]
fn withdraw_with_custody_shortfall_rejected() {
    let h = Harness::new();
    let alice = user("alice");
    h.fund(&alice, 100);
    h.vault.deposit(&alice, 100).unwrap();

    // Drain custody behind the vault's back.
    h.asset.transfer(&vault_addr(), &user("thief"), 60).unwrap();

    assert_eq!(
        h.vault.withdraw(&alice, 100),
        Err(VaultError::InsufficientCustody {
            available: 40,
            required: 100
        })
    );
    assert_eq!(h.shares_of(&alice), 100);
    assert_eq!(h.vault.total_shares().unwrap(), 100);
}

#[test]
fn share_supply_tracks_pool() {
    let h = Harness::new();
    let names = ["a", "b", "c"];
    for (i, name) in names.iter().enumerate() {
        let account = user(name);
        h.fund(&account, 1_000 * (i as u128 + 1));
        h.vault.deposit(&account, 1_000 * (i as u128 + 1)).unwrap();
    }
    h.vault.withdraw(&user("b"), 500).unwrap();
    assert_eq!(h.shares.total_supply(), h.vault.total_shares().unwrap());
}
