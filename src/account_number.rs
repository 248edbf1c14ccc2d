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

//! Account number generation and validation.
//!
//! Account numbers are fixed-format, self-checking identifiers of the form
//! `TNM-CCCC-AAAAA` (14 characters):
//!
//! - `T`: account type digit
//! - `N`: checksum of the currency group, `digit_sum(CCCC) % 10`
//! - `M`: checksum of the account group, `digit_sum(AAAAA) % 10`
//! - `CCCC`: currency sequence number, zero-padded to 4 digits
//! - `AAAAA`: per-currency account sequence number, zero-padded to 5 digits
//!
//! The two checksum digits catch single-digit typos in numbers entered or
//! transmitted by hand, without a database round-trip. Generation and
//! validation are pure; allocation of the next free account sequence lives
//! in the [`Ledger`](crate::Ledger).
//!
//! # Example
//!
//! ```
//! use mutual_credit_rs::{AccountNumber, AccountType};
//!
//! let number = AccountNumber::new(AccountType::Personal, 1, 2).unwrap();
//! assert_eq!(number.to_string(), "212-0001-00002");
//! assert_eq!(AccountNumber::parse("212-0001-00002").unwrap(), number);
//! ```

use crate::error::LedgerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum currency sequence number representable in the `CCCC` group.
pub const MAX_CURRENCY_NUMBER: u16 = 9_999;

/// Maximum account sequence number representable in the `AAAAA` group.
pub const MAX_ACCOUNT_SEQUENCE: u32 = 99_999;

/// Account classification, encoded as the leading digit of the number.
///
/// Only [`AccountType::CurrencyMain`] may carry a negative balance: its
/// deficit is the system's accounting of credit issued to members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    /// The distinguished per-currency account all funding, refunding and
    /// voucher redemption settles against.
    CurrencyMain,
    /// A member account owned by a registered user.
    Personal,
    /// A member account owned by an onboarded merchant.
    Merchant,
    /// Reserved account for cashback programs; balance-constrained like
    /// member accounts.
    CurrencyCashback,
}

impl AccountType {
    /// The digit used as the `T` component of an account number.
    pub fn code(self) -> u8 {
        match self {
            AccountType::CurrencyMain => 1,
            AccountType::Personal => 2,
            AccountType::Merchant => 3,
            AccountType::CurrencyCashback => 4,
        }
    }

    /// Reverse of [`AccountType::code`].
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(AccountType::CurrencyMain),
            2 => Some(AccountType::Personal),
            3 => Some(AccountType::Merchant),
            4 => Some(AccountType::CurrencyCashback),
            _ => None,
        }
    }

    /// Whether this account type is permitted a negative balance.
    pub fn may_go_negative(self) -> bool {
        matches!(self, AccountType::CurrencyMain)
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccountType::CurrencyMain => "currency-main",
            AccountType::Personal => "personal",
            AccountType::Merchant => "merchant",
            AccountType::CurrencyCashback => "currency-cashback",
        };
        write!(f, "{name}")
    }
}

/// A parsed, structurally valid account number.
///
/// Construction always goes through [`AccountNumber::new`] or
/// [`AccountNumber::parse`], so a value of this type implies both range
/// validity and checksum consistency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountNumber {
    account_type: AccountType,
    currency_number: u16,
    account_sequence: u32,
}

/// Sum of the decimal digits of `value`, reduced modulo 10.
fn checksum(mut value: u32) -> u8 {
    let mut sum = 0u32;
    while value > 0 {
        sum += value % 10;
        value /= 10;
    }
    (sum % 10) as u8
}

impl AccountNumber {
    /// Composes an account number from its components.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidAccountNumber`] when a component does
    /// not fit its zero-padded group.
    pub fn new(
        account_type: AccountType,
        currency_number: u16,
        account_sequence: u32,
    ) -> Result<Self, LedgerError> {
        if currency_number > MAX_CURRENCY_NUMBER {
            return Err(LedgerError::InvalidAccountNumber(
                "currency number exceeds 4 digits",
            ));
        }
        if account_sequence > MAX_ACCOUNT_SEQUENCE {
            return Err(LedgerError::InvalidAccountNumber(
                "account sequence exceeds 5 digits",
            ));
        }
        Ok(Self {
            account_type,
            currency_number,
            account_sequence,
        })
    }

    /// Parses and validates a rendered account number.
    ///
    /// Rejects anything that is not exactly `\d{3}-\d{4}-\d{5}`, an unknown
    /// type digit, or a checksum mismatch in either group.
    pub fn parse(input: &str) -> Result<Self, LedgerError> {
        let bytes = input.as_bytes();
        if bytes.len() != 14 {
            return Err(LedgerError::InvalidAccountNumber("wrong length"));
        }
        if bytes[3] != b'-' || bytes[8] != b'-' {
            return Err(LedgerError::InvalidAccountNumber("misplaced separators"));
        }
        for (i, b) in bytes.iter().enumerate() {
            if i == 3 || i == 8 {
                continue;
            }
            if !b.is_ascii_digit() {
                return Err(LedgerError::InvalidAccountNumber("non-digit character"));
            }
        }

        let digit = |i: usize| (bytes[i] - b'0') as u8;
        let account_type = AccountType::from_code(digit(0))
            .ok_or(LedgerError::InvalidAccountNumber("unknown account type"))?;
        let currency_checksum = digit(1);
        let account_checksum = digit(2);

        // The format guarantees these slices are pure ASCII digits.
        let currency_number: u16 = input[4..8].parse().unwrap_or(0);
        let account_sequence: u32 = input[9..14].parse().unwrap_or(0);

        if checksum(u32::from(currency_number)) != currency_checksum {
            return Err(LedgerError::InvalidAccountNumber("currency checksum mismatch"));
        }
        if checksum(account_sequence) != account_checksum {
            return Err(LedgerError::InvalidAccountNumber("account checksum mismatch"));
        }

        Ok(Self {
            account_type,
            currency_number,
            account_sequence,
        })
    }

    pub fn account_type(&self) -> AccountType {
        self.account_type
    }

    pub fn currency_number(&self) -> u16 {
        self.currency_number
    }

    pub fn account_sequence(&self) -> u32 {
        self.account_sequence
    }

    /// Checksum digit `N` over the currency group.
    pub fn currency_checksum(&self) -> u8 {
        checksum(u32::from(self.currency_number))
    }

    /// Checksum digit `M` over the account group.
    pub fn account_checksum(&self) -> u8 {
        checksum(self.account_sequence)
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}-{:04}-{:05}",
            self.account_type.code(),
            self.currency_checksum(),
            self.account_checksum(),
            self.currency_number,
            self.account_sequence
        )
    }
}

impl FromStr for AccountNumber {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountNumber::parse(s)
    }
}

impl TryFrom<String> for AccountNumber {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        AccountNumber::parse(&value)
    }
}

impl From<AccountNumber> for String {
    fn from(value: AccountNumber) -> Self {
        value.to_string()
    }
}
