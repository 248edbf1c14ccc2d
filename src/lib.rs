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

//! # Mutual Credit Ledger
//!
//! A member-to-member community currency ledger. Every balance is a claim
//! against every other account in the same currency; the currency's main
//! account absorbs the offsetting negative balance, so the balances of all
//! accounts in a currency always sum to zero.
//!
//! ## Core Components
//!
//! - [`AccountNumber`]: structured, self-checking account identifiers
//! - [`Ledger`]: currencies, accounts and the append-only transaction trail
//! - [`Engine`]: atomic transfers, funding and refunding
//! - [`VoucherEngine`]: single-use, expiring value tokens
//! - [`LedgerError`]: typed business-rule and storage failures
//!
//! ## Example
//!
//! ```
//! use mutual_credit_rs::{AccountType, Engine, TransferKind};
//! use rust_decimal_macros::dec;
//!
//! let engine = Engine::new();
//! let currency = engine.ledger().create_currency("TST").unwrap();
//! let alice = engine
//!     .ledger()
//!     .open_account(currency, AccountType::Personal, None)
//!     .unwrap();
//! let bob = engine
//!     .ledger()
//!     .open_account(currency, AccountType::Personal, None)
//!     .unwrap();
//!
//! engine.fund(currency, alice, dec!(10.00), "starting credit").unwrap();
//! engine
//!     .transfer(TransferKind::Direct, alice, bob, dec!(2.50), "lunch", "lunch")
//!     .unwrap();
//!
//! assert_eq!(engine.ledger().snapshot(alice).unwrap().balance, dec!(7.50));
//! assert_eq!(engine.ledger().snapshot(bob).unwrap().balance, dec!(2.50));
//! engine.ledger().check_zero_sum(currency).unwrap();
//! ```
//!
//! ## Thread Safety
//!
//! All engines are shared-reference safe. Transfers lock both account
//! rows in canonical id order, so concurrent transfers over disjoint
//! accounts run in parallel and overlapping ones serialize without
//! deadlock or lost updates.

pub mod account;
pub mod account_number;
mod base;
mod currency;
mod engine;
pub mod error;
mod ledger;
mod transaction;
mod transaction_log;
mod voucher;

pub use account::{Account, AccountOwner, BALANCE_PRECISION};
pub use account_number::{AccountNumber, AccountType, MAX_ACCOUNT_SEQUENCE, MAX_CURRENCY_NUMBER};
pub use base::{AccountId, CurrencyId, MerchantId, TransactionId, UserId, VoucherId};
pub use currency::Currency;
pub use engine::{Engine, TransferKind, TransferReceipt};
pub use error::LedgerError;
pub use ledger::{AccountSnapshot, Ledger};
pub use transaction::{EntryKind, EntryStatus, TransactionEntry};
pub use transaction_log::TransactionLog;
pub use voucher::{Voucher, VoucherEngine, VoucherState, VoucherStatus};
