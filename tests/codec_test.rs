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

//! Account number codec public API tests.

use mutual_credit_rs::{AccountNumber, AccountType, LedgerError};

#[test]
fn generates_the_documented_format() {
    // T=2, N=digit_sum(0001)=1, M=digit_sum(00002)=2
    let number = AccountNumber::new(AccountType::Personal, 1, 2).unwrap();
    assert_eq!(number.to_string(), "212-0001-00002");

    // T=1, N=digit_sum(0001)=1, M=digit_sum(00000)=0
    let main = AccountNumber::new(AccountType::CurrencyMain, 1, 0).unwrap();
    assert_eq!(main.to_string(), "110-0001-00000");

    // Checksums wrap modulo 10: digit_sum(99999) = 45 -> 5
    let wrapped = AccountNumber::new(AccountType::Merchant, 9_999, 99_999).unwrap();
    assert_eq!(wrapped.to_string(), "365-9999-99999");
}

#[test]
fn every_type_digit_round_trips() {
    for account_type in [
        AccountType::CurrencyMain,
        AccountType::Personal,
        AccountType::Merchant,
        AccountType::CurrencyCashback,
    ] {
        let number = AccountNumber::new(account_type, 17, 4_242).unwrap();
        let parsed = AccountNumber::parse(&number.to_string()).unwrap();
        assert_eq!(parsed, number);
        assert_eq!(parsed.account_type(), account_type);
    }
}

#[test]
fn parse_rejects_each_corrupted_checksum() {
    let number = AccountNumber::new(AccountType::Personal, 123, 45_678).unwrap();
    let rendered = number.to_string();
    // N = digit_sum(123) = 6, M = digit_sum(45678) = 30 -> 0
    assert_eq!(rendered, "260-0123-45678");

    let mut corrupt_n = rendered.clone().into_bytes();
    corrupt_n[1] = b'7';
    assert_eq!(
        AccountNumber::parse(std::str::from_utf8(&corrupt_n).unwrap()),
        Err(LedgerError::InvalidAccountNumber("currency checksum mismatch"))
    );

    let mut corrupt_m = rendered.into_bytes();
    corrupt_m[2] = b'1';
    assert_eq!(
        AccountNumber::parse(std::str::from_utf8(&corrupt_m).unwrap()),
        Err(LedgerError::InvalidAccountNumber("account checksum mismatch"))
    );
}

#[test]
fn parse_rejects_every_single_digit_typo_in_groups() {
    let number = AccountNumber::new(AccountType::Personal, 123, 45_678).unwrap();
    let rendered = number.to_string();

    // Mutate each digit of the CCCC and AAAAA groups in turn; the digit
    // sum shifts by a nonzero delta below 10 so validation must fail.
    for position in (4..8).chain(9..14) {
        let mut bytes = rendered.clone().into_bytes();
        let original = bytes[position];
        bytes[position] = if original == b'9' { b'0' } else { original + 1 };
        let mutated = String::from_utf8(bytes).unwrap();
        assert!(
            AccountNumber::parse(&mutated).is_err(),
            "accepted mutated number {mutated}"
        );
    }
}

#[test]
fn parse_enforces_fixed_shape() {
    assert!(AccountNumber::parse("212-0001-00002 ").is_err());
    assert!(AccountNumber::parse(" 212-0001-00002").is_err());
    assert!(AccountNumber::parse("212–0001–00002").is_err()); // non-ASCII dashes
    assert!(AccountNumber::parse("212-0001").is_err());
}

#[test]
fn components_are_range_checked_at_generation() {
    assert_eq!(
        AccountNumber::new(AccountType::Personal, 10_000, 1),
        Err(LedgerError::InvalidAccountNumber("currency number exceeds 4 digits"))
    );
    assert_eq!(
        AccountNumber::new(AccountType::Personal, 1, 100_000),
        Err(LedgerError::InvalidAccountNumber("account sequence exceeds 5 digits"))
    );
}
