//! # In-Memory Token Ledger
//!
//! A fungible token with balances, allowances, and a minter grant list.
//! [`MemoryToken`] implements both [`AssetLedger`] and [`ShareLedger`], so the
//! same type backs the underlying asset and the vault's share token in tests
//! and in the simulator.
//!
//! ## Security Model
//!
//! - **Mint gating**: only accounts on the minter list may mint or burn. The
//!   token owner starts on the list and is the only account that can change
//!   it. Granting the vault's custody account is how a vault gets its
//!   mint/burn capability.
//! - **Allowances**: `transfer_from` consumes the spender's allowance, the
//!   same pull model the vault uses for deposits and rewards.
//! - **Supply tracking**: total supply and balances move together; every
//!   credit is overflow-checked.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::trace;
use vault_protocol::{Address, AssetLedger, ShareLedger, TokenError};

/// Display metadata. The ledger never divides by `decimals`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Human-readable name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Decimal places for display.
    pub decimals: u8,
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<Address, u128>,
    allowances: HashMap<(Address, Address), u128>,
    minters: HashSet<Address>,
    total_supply: u128,
}

/// Thread-safe in-memory token.
#[derive(Debug)]
pub struct MemoryToken {
    address: Address,
    owner: Address,
    metadata: TokenMetadata,
    state: RwLock<LedgerState>,
}

impl MemoryToken {
    /// Creates a token living at `address`. `owner` may mint and manages the
    /// minter list.
    pub fn new(address: Address, owner: Address, metadata: TokenMetadata) -> Self {
        let mut state = LedgerState::default();
        state.minters.insert(owner);
        Self {
            address,
            owner,
            metadata,
            state: RwLock::new(state),
        }
    }

    /// Convenience constructor with an 18-decimal metadata block.
    pub fn with_symbol(address: Address, owner: Address, symbol: &str) -> Self {
        Self::new(
            address,
            owner,
            TokenMetadata {
                name: symbol.to_string(),
                symbol: symbol.to_string(),
                decimals: 18,
            },
        )
    }

    /// Address of this ledger.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Display metadata.
    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    /// Balance of `account`, 0 if never credited.
    pub fn balance_of(&self, account: &Address) -> u128 {
        self.state.read().balances.get(account).copied().unwrap_or(0)
    }

    /// Total supply.
    pub fn total_supply(&self) -> u128 {
        self.state.read().total_supply
    }

    /// Remaining amount `spender` may pull from `owner`.
    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.state
            .read()
            .allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    /// Sets `spender`'s allowance over `owner`'s balance. Overwrites, does
    /// not accumulate.
    pub fn approve(&self, owner: &Address, spender: &Address, amount: u128) {
        self.state
            .write()
            .allowances
            .insert((*owner, *spender), amount);
    }

    /// Adds `account` to the minter list. Only the token owner may call.
    pub fn grant_minter(&self, caller: &Address, account: Address) -> Result<(), TokenError> {
        if *caller != self.owner {
            return Err(TokenError::NotMinter(*caller));
        }
        if account.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        self.state.write().minters.insert(account);
        Ok(())
    }

    /// Removes `account` from the minter list. Only the token owner may call.
    pub fn revoke_minter(&self, caller: &Address, account: &Address) -> Result<(), TokenError> {
        if *caller != self.owner {
            return Err(TokenError::NotMinter(*caller));
        }
        self.state.write().minters.remove(account);
        Ok(())
    }

    /// `true` if `account` may mint and burn.
    pub fn is_minter(&self, account: &Address) -> bool {
        self.state.read().minters.contains(account)
    }

    /// Mints `amount` to `to`.
    pub fn mint(&self, minter: &Address, to: &Address, amount: u128) -> Result<(), TokenError> {
        if to.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        let mut state = self.state.write();
        if !state.minters.contains(minter) {
            return Err(TokenError::NotMinter(*minter));
        }
        let new_supply = state
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        let balance = state.balances.get(to).copied().unwrap_or(0);
        let new_balance = balance.checked_add(amount).ok_or(TokenError::Overflow)?;

        state.total_supply = new_supply;
        state.balances.insert(*to, new_balance);
        trace!(token = %self.metadata.symbol, %to, amount, "minted");
        Ok(())
    }

    /// Burns `amount` held by `from`.
    pub fn burn(&self, minter: &Address, from: &Address, amount: u128) -> Result<(), TokenError> {
        let mut state = self.state.write();
        if !state.minters.contains(minter) {
            return Err(TokenError::NotMinter(*minter));
        }
        let balance = state.balances.get(from).copied().unwrap_or(0);
        if balance < amount {
            return Err(TokenError::InsufficientBalance {
                account: *from,
                available: balance,
                required: amount,
            });
        }
        state.balances.insert(*from, balance - amount);
        // Supply >= any single balance, so this cannot underflow.
        state.total_supply -= amount;
        trace!(token = %self.metadata.symbol, %from, amount, "burned");
        Ok(())
    }

    /// Moves `amount` from `from` to `to`.
    pub fn transfer(&self, from: &Address, to: &Address, amount: u128) -> Result<(), TokenError> {
        let mut state = self.state.write();
        Self::move_balance(&mut state, from, to, amount)?;
        trace!(token = %self.metadata.symbol, %from, %to, amount, "transferred");
        Ok(())
    }

    /// Moves `amount` from `owner` to `to`, consuming `spender`'s allowance.
    pub fn transfer_from(
        &self,
        spender: &Address,
        owner: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TokenError> {
        let mut state = self.state.write();
        let key = (*owner, *spender);
        let allowed = state.allowances.get(&key).copied().unwrap_or(0);
        if allowed < amount {
            return Err(TokenError::InsufficientAllowance {
                owner: *owner,
                spender: *spender,
                allowed,
                required: amount,
            });
        }
        Self::move_balance(&mut state, owner, to, amount)?;
        state.allowances.insert(key, allowed - amount);
        trace!(token = %self.metadata.symbol, %spender, %owner, %to, amount, "pulled");
        Ok(())
    }

    fn move_balance(
        state: &mut LedgerState,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TokenError> {
        if from.is_zero() || to.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        let from_balance = state.balances.get(from).copied().unwrap_or(0);
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance {
                account: *from,
                available: from_balance,
                required: amount,
            });
        }
        if from == to {
            return Ok(());
        }
        let to_balance = state.balances.get(to).copied().unwrap_or(0);
        let new_to = to_balance.checked_add(amount).ok_or(TokenError::Overflow)?;
        state.balances.insert(*from, from_balance - amount);
        state.balances.insert(*to, new_to);
        Ok(())
    }
}

impl AssetLedger for MemoryToken {
    fn address(&self) -> Address {
        self.address
    }

    fn balance_of(&self, account: &Address) -> u128 {
        MemoryToken::balance_of(self, account)
    }

    fn transfer(&self, from: &Address, to: &Address, amount: u128) -> Result<(), TokenError> {
        MemoryToken::transfer(self, from, to, amount)
    }

    fn transfer_from(
        &self,
        spender: &Address,
        owner: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TokenError> {
        MemoryToken::transfer_from(self, spender, owner, to, amount)
    }
}

impl ShareLedger for MemoryToken {
    fn address(&self) -> Address {
        self.address
    }

    fn balance_of(&self, account: &Address) -> u128 {
        MemoryToken::balance_of(self, account)
    }

    fn total_supply(&self) -> u128 {
        MemoryToken::total_supply(self)
    }

    fn mint(&self, minter: &Address, to: &Address, amount: u128) -> Result<(), TokenError> {
        MemoryToken::mint(self, minter, to, amount)
    }

    fn burn(&self, minter: &Address, from: &Address, amount: u128) -> Result<(), TokenError> {
        MemoryToken::burn(self, minter, from, amount)
    }
}
