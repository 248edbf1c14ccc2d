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

//! Atomic transfer engine.
//!
//! The [`Engine`] performs every balance mutation in the system: direct
//! member-to-member transfers, plus the funding/refunding specialization
//! where one side is always the currency's main account.
//!
//! # Atomicity
//!
//! A transfer locks both account rows in ascending [`AccountId`] order,
//! performs every check before the first mutation, then applies both
//! balance changes and appends both trail entries before releasing either
//! lock. A failed transfer leaves balances and the trail untouched; a
//! partial transfer is never observable.
//!
//! # Example
//!
//! ```
//! use mutual_credit_rs::{AccountType, Engine, TransferKind};
//! use rust_decimal_macros::dec;
//!
//! let engine = Engine::new();
//! let currency = engine.ledger().create_currency("TST").unwrap();
//! let member = engine
//!     .ledger()
//!     .open_account(currency, AccountType::Personal, None)
//!     .unwrap();
//!
//! engine.fund(currency, member, dec!(10.00), "starting credit").unwrap();
//! assert_eq!(engine.ledger().snapshot(member).unwrap().balance, dec!(10.00));
//! ```

use crate::account::BALANCE_PRECISION;
use crate::base::{AccountId, CurrencyId, TransactionId, VoucherId};
use crate::error::LedgerError;
use crate::ledger::Ledger;
use crate::transaction::EntryKind;
use crate::transaction_log::EntryDraft;
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::debug;

/// Which pair of trail entry kinds a transfer writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// Member to member.
    Direct,
    /// Currency main account to member.
    Fund,
    /// Member back to the currency main account.
    Refund,
    /// Currency main account to claimant, redeeming a voucher.
    VoucherClaim(VoucherId),
}

impl TransferKind {
    /// The (outbound, inbound) entry kinds for a transfer from `source`
    /// to `dest`.
    fn entry_kinds(self, source: AccountId, dest: AccountId) -> (EntryKind, EntryKind) {
        match self {
            TransferKind::Direct => (
                EntryKind::TransferTo { counterparty: dest },
                EntryKind::ReceivedFrom { counterparty: source },
            ),
            TransferKind::Fund => (
                EntryKind::FundWithdrawal { counterparty: dest },
                EntryKind::FundAccount { counterparty: source },
            ),
            TransferKind::Refund => (
                EntryKind::RefundAccount { counterparty: dest },
                EntryKind::RefundDeposit { counterparty: source },
            ),
            TransferKind::VoucherClaim(voucher) => (
                EntryKind::VoucherFunding {
                    voucher,
                    counterparty: dest,
                },
                EntryKind::ClaimVoucher {
                    voucher,
                    counterparty: source,
                },
            ),
        }
    }
}

/// Proof of a committed transfer: the two trail entry ids and the amount
/// as applied (normalized to 2 fractional digits).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReceipt {
    pub outbound: TransactionId,
    pub inbound: TransactionId,
    pub amount: Decimal,
}

/// The single mutation path for account balances.
pub struct Engine {
    ledger: Ledger,
}

impl Engine {
    /// Creates an engine over an empty store.
    pub fn new() -> Self {
        Self {
            ledger: Ledger::new(),
        }
    }

    /// Creates an engine over an existing store.
    pub fn with_ledger(ledger: Ledger) -> Self {
        Self { ledger }
    }

    /// The underlying store.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Moves `amount` from `source` to `dest` atomically, appending one
    /// outbound and one inbound trail entry.
    ///
    /// The currency main account may go negative; member accounts may not.
    ///
    /// Not idempotent: calling twice with identical arguments transfers
    /// twice. Deduplication is a caller concern.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`]: amount not positive after
    ///   normalization to 2 fractional digits.
    /// - [`LedgerError::SelfTransfer`]: `source == dest`.
    /// - [`LedgerError::AccountNotFound`]: either account is unknown.
    /// - [`LedgerError::CurrencyMismatch`]: accounts in different
    ///   currencies.
    /// - [`LedgerError::InsufficientFunds`]: source is a member account
    ///   with balance below `amount`.
    ///
    /// Any error commits nothing.
    pub fn transfer(
        &self,
        kind: TransferKind,
        source: AccountId,
        dest: AccountId,
        amount: Decimal,
        description_out: &str,
        description_in: &str,
    ) -> Result<TransferReceipt, LedgerError> {
        let amount = amount.round_dp(BALANCE_PRECISION);
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        if source == dest {
            return Err(LedgerError::SelfTransfer);
        }

        let source_account = self
            .ledger
            .account(source)
            .ok_or(LedgerError::AccountNotFound)?;
        let dest_account = self
            .ledger
            .account(dest)
            .ok_or(LedgerError::AccountNotFound)?;

        // Canonical lock order: ascending account id. Every multi-row path
        // in the crate follows it, so lock acquisition cannot cycle.
        let (mut source_data, mut dest_data) = if source < dest {
            let s = source_account.lock();
            let d = dest_account.lock();
            (s, d)
        } else {
            let d = dest_account.lock();
            let s = source_account.lock();
            (s, d)
        };

        if source_data.currency_id != dest_data.currency_id {
            return Err(LedgerError::CurrencyMismatch);
        }
        let currency_id = source_data.currency_id;

        if !source_data.account_type.may_go_negative() && source_data.balance < amount {
            return Err(LedgerError::InsufficientFunds);
        }

        // All checks passed; both rows are exclusively held, so the two
        // balance writes and the two trail appends commit as one unit.

        source_data
            .debit(amount)
            .map_err(|e| LedgerError::Storage(format!("debit failed after checks: {e}")))?;
        dest_data.credit(amount);

        let (out_kind, in_kind) = kind.entry_kinds(source, dest);
        let now = Utc::now();
        let (outbound, inbound) = self.ledger.log().append_pair(
            EntryDraft {
                account_id: source,
                currency_id,
                amount,
                kind: out_kind,
                description: description_out.to_owned(),
                created_at: now,
            },
            EntryDraft {
                account_id: dest,
                currency_id,
                amount,
                kind: in_kind,
                description: description_in.to_owned(),
                created_at: now,
            },
        );

        debug!(
            %source,
            %dest,
            %amount,
            currency = %currency_id,
            ?kind,
            "transfer committed"
        );

        Ok(TransferReceipt {
            outbound,
            inbound,
            amount,
        })
    }

    /// Credits a member account from its currency's main account.
    ///
    /// The main account has no lower bound; its deficit is the credit
    /// issued to members.
    pub fn fund(
        &self,
        currency_id: CurrencyId,
        dest: AccountId,
        amount: Decimal,
        description: &str,
    ) -> Result<TransferReceipt, LedgerError> {
        let main = self.ledger.main_account_of(currency_id)?;
        self.transfer(TransferKind::Fund, main, dest, amount, description, description)
    }

    /// Returns value from a member account to its currency's main account.
    ///
    /// The ordinary sufficiency rule applies: the member account may not
    /// go below zero.
    pub fn refund(
        &self,
        currency_id: CurrencyId,
        source: AccountId,
        amount: Decimal,
        description: &str,
    ) -> Result<TransferReceipt, LedgerError> {
        let main = self.ledger.main_account_of(currency_id)?;
        self.transfer(TransferKind::Refund, source, main, amount, description, description)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
