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

//! Error types for ledger operations.

use crate::base::CurrencyId;
use thiserror::Error;

/// Ledger operation errors.
///
/// Business-rule outcomes (the bulk of the variants) never leave partial
/// effects behind. [`LedgerError::Storage`] is the one retry-safe kind:
/// the whole operation may be reissued because a failed operation commits
/// nothing. [`LedgerError::InvariantViolation`] indicates a broken atomic
/// boundary and must never be swallowed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Referenced account does not exist
    #[error("account not found")]
    AccountNotFound,

    /// Referenced currency does not exist
    #[error("currency not found")]
    CurrencyNotFound,

    /// Accounts (or voucher and claimant) belong to different currencies
    #[error("accounts do not share a currency")]
    CurrencyMismatch,

    /// Source and destination are the same account
    #[error("cannot transfer to the same account")]
    SelfTransfer,

    /// Amount is zero or negative
    #[error("invalid amount (must be positive)")]
    InvalidAmount,

    /// Transfer would take a member account below zero
    #[error("insufficient funds")]
    InsufficientFunds,

    /// Currency symbol is already registered
    #[error("currency symbol already in use")]
    DuplicateSymbol,

    /// Account type cannot be opened directly (currency main accounts
    /// are created with their currency)
    #[error("account type cannot be opened directly")]
    InvalidAccountType,

    /// Account still carries a balance and cannot be closed
    #[error("account balance is not zero")]
    NonZeroBalance,

    /// Account number failed structural or checksum validation
    #[error("invalid account number: {0}")]
    InvalidAccountNumber(&'static str),

    /// No voucher exists for the presented code
    #[error("voucher not found")]
    VoucherNotFound,

    /// Voucher is not in the issued state (already redeemed)
    #[error("voucher not available")]
    VoucherNotAvailable,

    /// Voucher expiration has passed
    #[error("voucher expired")]
    VoucherExpired,

    /// Sum of balances in a currency is nonzero; the atomic-commit
    /// boundary has been broken somewhere
    #[error("balance invariant violated for currency {0}")]
    InvariantViolation(CurrencyId),

    /// Underlying store failure; the whole operation may be retried
    #[error("storage error: {0}")]
    Storage(String),
}
