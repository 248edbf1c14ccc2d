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

//! Single-use, amount-bearing, expiring vouchers.
//!
//! Stored state machine: `Issued -> Redeemed` (terminal). Expiry is a
//! read-time classification only: a voucher past its expiration stays
//! `Issued` in storage and is rejected at claim time; no background
//! process rewrites stored status.
//!
//! Claiming redeems the voucher into a funding transfer (currency main
//! account to claimant) and flips the stored status under the voucher row
//! lock, so the funds movement and the status flip are one atomic outcome.

use crate::account::BALANCE_PRECISION;
use crate::base::{AccountId, CurrencyId, VoucherId};
use crate::engine::{Engine, TransferKind, TransferReceipt};
use crate::error::LedgerError;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Stored voucher status. `Expired` is intentionally absent: it is a
/// derived state, see [`VoucherState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum VoucherStatus {
    Issued,
    Redeemed,
}

/// Read-time classification of a voucher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoucherState {
    Issued,
    Redeemed,
    /// Stored status is still `Issued` but the expiration has passed.
    Expired,
}

#[derive(Debug)]
struct VoucherData {
    id: VoucherId,
    code: String,
    currency_id: CurrencyId,
    amount: Decimal,
    expiration: DateTime<Utc>,
    status: VoucherStatus,
}

/// A single-use value token redeemable for a credit into a claimant
/// account.
#[derive(Debug)]
pub struct Voucher {
    inner: Mutex<VoucherData>,
}

impl Voucher {
    pub fn id(&self) -> VoucherId {
        self.inner.lock().id
    }

    /// The globally unique opaque code presented by a claimant.
    pub fn code(&self) -> String {
        self.inner.lock().code.clone()
    }

    pub fn currency_id(&self) -> CurrencyId {
        self.inner.lock().currency_id
    }

    pub fn amount(&self) -> Decimal {
        self.inner.lock().amount
    }

    pub fn expiration(&self) -> DateTime<Utc> {
        self.inner.lock().expiration
    }

    /// The stored status; never `Expired`.
    pub fn status(&self) -> VoucherStatus {
        self.inner.lock().status
    }

    /// Classifies the voucher as of `now`.
    pub fn state_at(&self, now: DateTime<Utc>) -> VoucherState {
        let data = self.inner.lock();
        match data.status {
            VoucherStatus::Redeemed => VoucherState::Redeemed,
            VoucherStatus::Issued if now > data.expiration => VoucherState::Expired,
            VoucherStatus::Issued => VoucherState::Issued,
        }
    }
}

/// Issues and redeems vouchers against a transfer engine.
#[derive(Default)]
pub struct VoucherEngine {
    vouchers: DashMap<VoucherId, Arc<Voucher>>,
    codes: DashMap<String, VoucherId>,
    next_id: AtomicU32,
}

impl VoucherEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a voucher expiring `duration_days` calendar days from now.
    pub fn issue(
        &self,
        engine: &Engine,
        currency_id: CurrencyId,
        amount: Decimal,
        duration_days: i64,
    ) -> Result<VoucherId, LedgerError> {
        self.issue_at(engine, currency_id, amount, duration_days, Utc::now())
    }

    /// [`VoucherEngine::issue`] with an explicit issue time.
    pub fn issue_at(
        &self,
        engine: &Engine,
        currency_id: CurrencyId,
        amount: Decimal,
        duration_days: i64,
        now: DateTime<Utc>,
    ) -> Result<VoucherId, LedgerError> {
        let amount = amount.round_dp(BALANCE_PRECISION);
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        if engine.ledger().currency(currency_id).is_none() {
            return Err(LedgerError::CurrencyNotFound);
        }

        let id = VoucherId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let code = Uuid::new_v4().simple().to_string();
        let expiration = now + Duration::days(duration_days);

        self.codes.insert(code.clone(), id);
        self.vouchers.insert(
            id,
            Arc::new(Voucher {
                inner: Mutex::new(VoucherData {
                    id,
                    code,
                    currency_id,
                    amount,
                    expiration,
                    status: VoucherStatus::Issued,
                }),
            }),
        );

        info!(voucher = %id, currency = %currency_id, %amount, %expiration, "voucher issued");
        Ok(id)
    }

    /// Extends a voucher's expiration by `extra_days` calendar days.
    ///
    /// Additive from the *current* expiration, not from now: extending an
    /// already-lapsed voucher by 30 days yields its old expiration plus
    /// 30 days, which may still be in the past. A redeemed voucher cannot
    /// be modified; an expired-but-issued one can.
    pub fn modify(
        &self,
        voucher_id: VoucherId,
        extra_days: i64,
    ) -> Result<DateTime<Utc>, LedgerError> {
        let voucher = self
            .vouchers
            .get(&voucher_id)
            .ok_or(LedgerError::VoucherNotFound)?;
        let mut data = voucher.inner.lock();
        if data.status != VoucherStatus::Issued {
            return Err(LedgerError::VoucherNotAvailable);
        }
        data.expiration += Duration::days(extra_days);
        debug!(voucher = %voucher_id, expiration = %data.expiration, "voucher extended");
        Ok(data.expiration)
    }

    /// Redeems a voucher into a funding transfer to `claimant`.
    pub fn claim(
        &self,
        engine: &Engine,
        code: &str,
        claimant: AccountId,
    ) -> Result<TransferReceipt, LedgerError> {
        self.claim_at(engine, code, claimant, Utc::now())
    }

    /// [`VoucherEngine::claim`] with an explicit claim time.
    ///
    /// Requirements: stored status `Issued`, `now` not past expiration,
    /// claimant account in the voucher's currency. On success the
    /// currency's main account funds the claimant and the stored status
    /// flips to `Redeemed`; the voucher row lock is held across both, so
    /// a voucher is never `Redeemed` without the funds having moved, nor
    /// the reverse.
    pub fn claim_at(
        &self,
        engine: &Engine,
        code: &str,
        claimant: AccountId,
        now: DateTime<Utc>,
    ) -> Result<TransferReceipt, LedgerError> {
        let voucher_id = *self.codes.get(code).ok_or(LedgerError::VoucherNotFound)?;
        let voucher = self
            .vouchers
            .get(&voucher_id)
            .ok_or(LedgerError::VoucherNotFound)?;
        let voucher = Arc::clone(&voucher);

        // Row lock held for the whole redemption; a concurrent claim of
        // the same code blocks here and then fails the status check.
        let mut data = voucher.inner.lock();
        if data.status != VoucherStatus::Issued {
            return Err(LedgerError::VoucherNotAvailable);
        }
        if now > data.expiration {
            return Err(LedgerError::VoucherExpired);
        }

        let claimant_currency = engine
            .ledger()
            .snapshot(claimant)
            .ok_or(LedgerError::AccountNotFound)?
            .currency_id;
        if claimant_currency != data.currency_id {
            return Err(LedgerError::CurrencyMismatch);
        }

        let main = engine.ledger().main_account_of(data.currency_id)?;
        let receipt = engine.transfer(
            TransferKind::VoucherClaim(voucher_id),
            main,
            claimant,
            data.amount,
            &format!("Voucher {code} funding"),
            &format!("Claim voucher {code}"),
        )?;

        data.status = VoucherStatus::Redeemed;
        info!(voucher = %voucher_id, %claimant, amount = %receipt.amount, "voucher redeemed");
        Ok(receipt)
    }

    /// Looks up a voucher row by id.
    pub fn get(&self, id: VoucherId) -> Option<Arc<Voucher>> {
        self.vouchers.get(&id).map(|voucher| Arc::clone(&voucher))
    }

    /// Looks up a voucher row by its opaque code.
    pub fn find_by_code(&self, code: &str) -> Option<Arc<Voucher>> {
        let id = *self.codes.get(code)?;
        self.get(id)
    }
}
