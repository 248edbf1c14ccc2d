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

//! Ledger entries.
//!
//! Every balance-changing operation appends exactly two entries, one per
//! account, each recording a positive magnitude plus an [`EntryKind`]
//! describing the direction and nature of that leg. Entries are immutable
//! once appended.

use crate::base::{AccountId, CurrencyId, TransactionId, VoucherId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The nature of one leg of a paired ledger mutation.
///
/// A closed enumeration instead of free-text labels: each variant carries
/// the references it needs, and matches are exhaustiveness-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// Outbound leg of a direct member-to-member transfer.
    TransferTo { counterparty: AccountId },
    /// Inbound leg of a direct member-to-member transfer.
    ReceivedFrom { counterparty: AccountId },
    /// Inbound leg of a funding operation (member side).
    FundAccount { counterparty: AccountId },
    /// Outbound leg of a funding operation (currency main side).
    FundWithdrawal { counterparty: AccountId },
    /// Outbound leg of a refund (member side).
    RefundAccount { counterparty: AccountId },
    /// Inbound leg of a refund (currency main side).
    RefundDeposit { counterparty: AccountId },
    /// Inbound leg of a voucher claim (claimant side).
    ClaimVoucher {
        voucher: VoucherId,
        counterparty: AccountId,
    },
    /// Outbound leg of a voucher claim (currency main side).
    VoucherFunding {
        voucher: VoucherId,
        counterparty: AccountId,
    },
}

impl EntryKind {
    /// Whether this leg debits the account it is tagged to.
    pub fn is_outbound(&self) -> bool {
        matches!(
            self,
            EntryKind::TransferTo { .. }
                | EntryKind::FundWithdrawal { .. }
                | EntryKind::RefundAccount { .. }
                | EntryKind::VoucherFunding { .. }
        )
    }

    /// The account on the other side of the paired mutation.
    pub fn counterparty(&self) -> AccountId {
        match self {
            EntryKind::TransferTo { counterparty }
            | EntryKind::ReceivedFrom { counterparty }
            | EntryKind::FundAccount { counterparty }
            | EntryKind::FundWithdrawal { counterparty }
            | EntryKind::RefundAccount { counterparty }
            | EntryKind::RefundDeposit { counterparty }
            | EntryKind::ClaimVoucher { counterparty, .. }
            | EntryKind::VoucherFunding { counterparty, .. } => *counterparty,
        }
    }

    /// Human-readable label, matching the wording used in statements.
    pub fn label(&self) -> &'static str {
        match self {
            EntryKind::TransferTo { .. } => "Transfer To",
            EntryKind::ReceivedFrom { .. } => "Received From",
            EntryKind::FundAccount { .. } => "Fund Account",
            EntryKind::FundWithdrawal { .. } => "Fund Withdrawal",
            EntryKind::RefundAccount { .. } => "Refund Account",
            EntryKind::RefundDeposit { .. } => "Refund Deposit",
            EntryKind::ClaimVoucher { .. } => "Claim Voucher",
            EntryKind::VoucherFunding { .. } => "Voucher Funding",
        }
    }
}

/// Entry settlement state. Only `Completed` is ever written; no pending
/// or partial state is modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    Completed,
}

/// One immutable row of the append-only transaction trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEntry {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub currency_id: CurrencyId,
    /// Positive magnitude; direction lives in `kind`.
    pub amount: Decimal,
    pub kind: EntryKind,
    pub description: String,
    pub status: EntryStatus,
    pub created_at: DateTime<Utc>,
}

impl TransactionEntry {
    /// The signed effect of this entry on its account's balance.
    pub fn signed_amount(&self) -> Decimal {
        if self.kind.is_outbound() {
            -self.amount
        } else {
            self.amount
        }
    }
}
