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

//! Currency rows.
//!
//! A currency owns its symbol, its sequence number (the `CCCC` group of
//! every account number it issues), a back-reference to its main account,
//! and the per-currency account sequence allocator state. The allocator
//! state is guarded by the row mutex: account creation for one currency is
//! serialized, which closes the read-then-write race a bare counter would
//! have under concurrent account creation.

use crate::base::{AccountId, CurrencyId};
use parking_lot::{Mutex, MutexGuard};

#[derive(Debug)]
pub(crate) struct CurrencyData {
    pub(crate) id: CurrencyId,
    pub(crate) symbol: String,
    pub(crate) currency_number: u16,
    pub(crate) main_account: AccountId,
    /// Highest account sequence handed out so far for this currency.
    pub(crate) next_account_sequence: u32,
}

/// A community currency.
#[derive(Debug)]
pub struct Currency {
    inner: Mutex<CurrencyData>,
}

impl Currency {
    pub(crate) fn new(
        id: CurrencyId,
        symbol: String,
        currency_number: u16,
        main_account: AccountId,
    ) -> Self {
        Self {
            inner: Mutex::new(CurrencyData {
                id,
                symbol,
                currency_number,
                main_account,
                next_account_sequence: 0,
            }),
        }
    }

    pub fn id(&self) -> CurrencyId {
        self.inner.lock().id
    }

    pub fn symbol(&self) -> String {
        self.inner.lock().symbol.clone()
    }

    /// The `CCCC` component of account numbers issued for this currency.
    pub fn currency_number(&self) -> u16 {
        self.inner.lock().currency_number
    }

    /// The distinguished account all funding and redemption settles against.
    pub fn main_account(&self) -> AccountId {
        self.inner.lock().main_account
    }

    pub fn next_account_sequence(&self) -> u32 {
        self.inner.lock().next_account_sequence
    }

    /// Takes the row lock, serializing sequence allocation per currency.
    pub(crate) fn lock(&self) -> MutexGuard<'_, CurrencyData> {
        self.inner.lock()
    }
}
