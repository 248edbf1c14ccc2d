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

//! Account rows.
//!
//! An [`Account`] is a member's (or the currency's own) balance-bearing row.
//! The identity fields are immutable for the account's lifetime; only the
//! balance changes, and only through the transfer engine's paired-update
//! path.
//!
//! # Example
//!
//! ```
//! use mutual_credit_rs::{Account, AccountId, AccountNumber, AccountType, CurrencyId};
//! use rust_decimal::Decimal;
//!
//! let number = AccountNumber::new(AccountType::Personal, 1, 2).unwrap();
//! let account = Account::new(AccountId(7), number, CurrencyId(1), None);
//! assert_eq!(account.balance(), Decimal::ZERO);
//! ```

use crate::account_number::{AccountNumber, AccountType};
use crate::base::{AccountId, CurrencyId, MerchantId, UserId};
use crate::error::LedgerError;
use parking_lot::{Mutex, MutexGuard};
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde::Deserialize;

/// Balances and voucher amounts are stored to 2 fractional digits.
pub const BALANCE_PRECISION: u32 = 2;

/// Owner of a member account, resolved by the user/merchant services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountOwner {
    User(UserId),
    Merchant(MerchantId),
}

#[derive(Debug)]
pub(crate) struct AccountData {
    pub(crate) id: AccountId,
    pub(crate) number: AccountNumber,
    pub(crate) currency_id: CurrencyId,
    pub(crate) account_type: AccountType,
    pub(crate) balance: Decimal,
    pub(crate) owner: Option<AccountOwner>,
}

impl AccountData {
    fn assert_invariants(&self) {
        debug_assert!(
            self.account_type.may_go_negative() || self.balance >= Decimal::ZERO,
            "Invariant violated: member account {} balance went negative: {}",
            self.number,
            self.balance
        );
    }

    /// Increases the balance. Amount must already be validated positive.
    pub(crate) fn credit(&mut self, amount: Decimal) {
        self.balance += amount;
        self.assert_invariants();
    }

    /// Decreases the balance.
    ///
    /// Member accounts may not go below zero; the currency main account
    /// may, which is how credit issued to members is accounted for.
    pub(crate) fn debit(&mut self, amount: Decimal) -> Result<(), LedgerError> {
        if !self.account_type.may_go_negative() && self.balance < amount {
            return Err(LedgerError::InsufficientFunds);
        }
        self.balance -= amount;
        self.assert_invariants();
        Ok(())
    }
}

/// Ledger account.
///
/// Interior mutability follows the row-lock model: the transfer engine
/// locks both rows of a transfer for the duration of the atomic unit.
#[derive(Debug)]
pub struct Account {
    inner: Mutex<AccountData>,
}

impl Account {
    pub fn new(
        id: AccountId,
        number: AccountNumber,
        currency_id: CurrencyId,
        owner: Option<AccountOwner>,
    ) -> Self {
        Self {
            inner: Mutex::new(AccountData {
                id,
                number,
                currency_id,
                account_type: number.account_type(),
                balance: Decimal::ZERO,
                owner,
            }),
        }
    }

    pub fn id(&self) -> AccountId {
        self.inner.lock().id
    }

    pub fn number(&self) -> AccountNumber {
        self.inner.lock().number
    }

    pub fn currency_id(&self) -> CurrencyId {
        self.inner.lock().currency_id
    }

    pub fn account_type(&self) -> AccountType {
        self.inner.lock().account_type
    }

    pub fn balance(&self) -> Decimal {
        self.inner.lock().balance
    }

    pub fn owner(&self) -> Option<AccountOwner> {
        self.inner.lock().owner
    }

    /// Takes the row lock. Engine-internal; every multi-row mutation
    /// acquires locks in ascending [`AccountId`] order.
    pub(crate) fn lock(&self) -> MutexGuard<'_, AccountData> {
        self.inner.lock()
    }
}

impl Serialize for Account {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let data = self.inner.lock();
        let mut state = serializer.serialize_struct("Account", 5)?;
        state.serialize_field("number", &data.number.to_string())?;
        state.serialize_field("currency", &data.currency_id)?;
        state.serialize_field("type", &data.account_type)?;
        state.serialize_field("balance", &data.balance.round_dp(BALANCE_PRECISION))?;
        state.serialize_field("owner", &data.owner)?;
        state.end()
    }
}
