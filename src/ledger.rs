// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 The mutual-credit-rs authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! The authoritative store: currencies, accounts and the transaction trail.
//!
//! The [`Ledger`] owns every shared mutable resource in the system. All
//! balance mutation goes through the transfer engine's paired-update path;
//! nothing here writes a balance directly.
//!
//! # Account numbering
//!
//! Opening an account allocates the next free account sequence for its
//! currency with a linear probe over the number index. The probe runs under
//! the currency row lock, so concurrent account creation for one currency
//! serializes instead of racing on the stored counter.

use crate::account::{Account, AccountOwner, BALANCE_PRECISION};
use crate::account_number::{AccountNumber, AccountType, MAX_ACCOUNT_SEQUENCE, MAX_CURRENCY_NUMBER};
use crate::base::{AccountId, CurrencyId, TransactionId};
use crate::currency::Currency;
use crate::error::LedgerError;
use crate::transaction::TransactionEntry;
use crate::transaction_log::TransactionLog;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Point-in-time copy of an account row, safe to hand outside the store.
#[derive(Debug, Clone, Serialize)]
pub struct AccountSnapshot {
    pub id: AccountId,
    pub number: AccountNumber,
    pub currency_id: CurrencyId,
    pub account_type: AccountType,
    pub balance: Decimal,
    pub owner: Option<AccountOwner>,
}

/// The shared store of currencies, accounts and the append-only trail.
pub struct Ledger {
    /// Account rows indexed by surrogate id.
    accounts: DashMap<AccountId, Account>,
    /// Structured account number to surrogate id.
    numbers: DashMap<AccountNumber, AccountId>,
    /// Currency rows indexed by id.
    currencies: DashMap<CurrencyId, Currency>,
    /// Unique symbol to currency id.
    symbols: DashMap<String, CurrencyId>,
    /// Append-only transaction trail.
    log: TransactionLog,
    next_account_id: AtomicU32,
    next_currency_id: AtomicU32,
}

impl Ledger {
    /// Creates an empty store with no currencies or accounts.
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            numbers: DashMap::new(),
            currencies: DashMap::new(),
            symbols: DashMap::new(),
            log: TransactionLog::new(),
            next_account_id: AtomicU32::new(0),
            next_currency_id: AtomicU32::new(0),
        }
    }

    /// Registers a currency and creates its main account (sequence 0).
    ///
    /// # Errors
    ///
    /// - [`LedgerError::DuplicateSymbol`] if the symbol is taken.
    /// - [`LedgerError::InvalidAccountNumber`] if the currency number space
    ///   is exhausted.
    pub fn create_currency(&self, symbol: &str) -> Result<CurrencyId, LedgerError> {
        if symbol.is_empty() {
            return Err(LedgerError::Storage("empty currency symbol".into()));
        }

        let id = CurrencyId(self.next_currency_id.fetch_add(1, Ordering::Relaxed) + 1);
        if id.0 > u32::from(MAX_CURRENCY_NUMBER) {
            return Err(LedgerError::InvalidAccountNumber(
                "currency number exceeds 4 digits",
            ));
        }
        let currency_number = id.0 as u16;

        // Atomic check-and-insert on the symbol index.
        match self.symbols.entry(symbol.to_owned()) {
            Entry::Occupied(_) => return Err(LedgerError::DuplicateSymbol),
            Entry::Vacant(vacant) => {
                vacant.insert(id);
            }
        }

        let main_number = AccountNumber::new(AccountType::CurrencyMain, currency_number, 0)?;
        let main_id = self.insert_account(main_number, id, None);
        self.currencies
            .insert(id, Currency::new(id, symbol.to_owned(), currency_number, main_id));

        info!(currency = %id, %symbol, main = %main_number, "currency created");
        Ok(id)
    }

    /// Opens a member account in a currency.
    ///
    /// The account number's sequence component comes from a linear probe
    /// starting just past the currency's stored counter, serialized by the
    /// currency row lock.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAccountType`] for [`AccountType::CurrencyMain`]
    ///   (main accounts only exist through [`Ledger::create_currency`]).
    /// - [`LedgerError::CurrencyNotFound`] for an unknown currency.
    /// - [`LedgerError::InvalidAccountNumber`] if the sequence space is
    ///   exhausted.
    pub fn open_account(
        &self,
        currency_id: CurrencyId,
        account_type: AccountType,
        owner: Option<AccountOwner>,
    ) -> Result<AccountId, LedgerError> {
        if account_type == AccountType::CurrencyMain {
            return Err(LedgerError::InvalidAccountType);
        }
        let currency = self
            .currencies
            .get(&currency_id)
            .ok_or(LedgerError::CurrencyNotFound)?;

        // Serialize allocation per currency: probe, insert and counter
        // update all happen under the row lock.
        let mut data = currency.lock();
        let mut sequence = data.next_account_sequence;
        let number = loop {
            sequence += 1;
            if sequence > MAX_ACCOUNT_SEQUENCE {
                return Err(LedgerError::InvalidAccountNumber(
                    "account sequence exceeds 5 digits",
                ));
            }
            let candidate = AccountNumber::new(account_type, data.currency_number, sequence)?;
            if !self.numbers.contains_key(&candidate) {
                break candidate;
            }
        };

        let account_id = self.insert_account(number, currency_id, owner);
        data.next_account_sequence = sequence;

        debug!(account = %number, currency = %currency_id, %account_type, "account opened");
        Ok(account_id)
    }

    fn insert_account(
        &self,
        number: AccountNumber,
        currency_id: CurrencyId,
        owner: Option<AccountOwner>,
    ) -> AccountId {
        let id = AccountId(self.next_account_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.numbers.insert(number, id);
        self.accounts
            .insert(id, Account::new(id, number, currency_id, owner));
        id
    }

    /// Removes an account that holds exactly zero balance.
    ///
    /// The currency main account can never be closed.
    pub fn close_account(&self, id: AccountId) -> Result<(), LedgerError> {
        let (number, account_type, balance) = {
            let account = self.accounts.get(&id).ok_or(LedgerError::AccountNotFound)?;
            (account.number(), account.account_type(), account.balance())
        };
        if account_type == AccountType::CurrencyMain {
            return Err(LedgerError::InvalidAccountType);
        }
        if balance != Decimal::ZERO {
            return Err(LedgerError::NonZeroBalance);
        }

        // Re-check under the map's own removal guard; a concurrent transfer
        // may have moved the balance since the read above.
        let removed = self
            .accounts
            .remove_if(&id, |_, account| account.balance() == Decimal::ZERO);
        match removed {
            Some(_) => {
                self.numbers.remove(&number);
                debug!(account = %number, "account closed");
                Ok(())
            }
            None => Err(LedgerError::NonZeroBalance),
        }
    }

    // === Lookups ===

    pub fn currency_by_symbol(&self, symbol: &str) -> Option<CurrencyId> {
        self.symbols.get(symbol).map(|id| *id)
    }

    pub fn currency(
        &self,
        id: CurrencyId,
    ) -> Option<dashmap::mapref::one::Ref<'_, CurrencyId, Currency>> {
        self.currencies.get(&id)
    }

    /// The main account a currency's funding and redemption settles against.
    pub fn main_account_of(&self, currency_id: CurrencyId) -> Result<AccountId, LedgerError> {
        self.currencies
            .get(&currency_id)
            .map(|currency| currency.main_account())
            .ok_or(LedgerError::CurrencyNotFound)
    }

    pub fn account_id_by_number(&self, number: &AccountNumber) -> Option<AccountId> {
        self.numbers.get(number).map(|id| *id)
    }

    /// Resolves a rendered account number, validating its checksums first.
    pub fn account_id_by_number_str(&self, input: &str) -> Result<AccountId, LedgerError> {
        let number = AccountNumber::parse(input)?;
        self.account_id_by_number(&number)
            .ok_or(LedgerError::AccountNotFound)
    }

    pub(crate) fn account(
        &self,
        id: AccountId,
    ) -> Option<dashmap::mapref::one::Ref<'_, AccountId, Account>> {
        self.accounts.get(&id)
    }

    /// Point-in-time copy of one account row.
    pub fn snapshot(&self, id: AccountId) -> Option<AccountSnapshot> {
        self.accounts.get(&id).map(|account| AccountSnapshot {
            id,
            number: account.number(),
            currency_id: account.currency_id(),
            account_type: account.account_type(),
            balance: account.balance().round_dp(BALANCE_PRECISION),
            owner: account.owner(),
        })
    }

    /// Returns an iterator over all account rows.
    pub fn accounts(
        &self,
    ) -> impl Iterator<Item = dashmap::mapref::multiple::RefMulti<'_, AccountId, Account>> {
        self.accounts.iter()
    }

    /// The append-only transaction trail.
    pub fn log(&self) -> &TransactionLog {
        &self.log
    }

    /// All trail entries tagged to one account, in append order.
    pub fn transactions_for(&self, account_id: AccountId) -> Vec<Arc<TransactionEntry>> {
        self.log.for_account(account_id)
    }

    /// Looks up a single trail entry.
    pub fn transaction(&self, id: TransactionId) -> Option<Arc<TransactionEntry>> {
        self.log.get(id)
    }

    /// Verifies the mutual-credit invariant for one currency: the balances
    /// of all its accounts, main included, sum to zero.
    ///
    /// Valid whenever no mutation is in flight. A nonzero sum means the
    /// paired-update path was bypassed or broken and is fatal.
    pub fn check_zero_sum(&self, currency_id: CurrencyId) -> Result<(), LedgerError> {
        if !self.currencies.contains_key(&currency_id) {
            return Err(LedgerError::CurrencyNotFound);
        }
        let sum: Decimal = self
            .accounts
            .iter()
            .filter(|account| account.currency_id() == currency_id)
            .map(|account| account.balance())
            .sum();
        if sum != Decimal::ZERO {
            return Err(LedgerError::InvariantViolation(currency_id));
        }
        Ok(())
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
