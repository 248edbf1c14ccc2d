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

//! Concurrency tests: lost updates, lock ordering and deadlock freedom.
//!
//! Transfers lock both account rows in ascending id order, so opposing
//! transfers over the same pair must serialize rather than deadlock. The
//! deadlock test uses parking_lot's built-in detector to catch cycles in
//! the lock graph.

use mutual_credit_rs::{AccountId, AccountType, Engine, TransferKind, VoucherEngine};
use parking_lot::deadlock;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn funded_pair(engine: &Engine) -> (AccountId, AccountId) {
    let currency = engine.ledger().create_currency("TST").unwrap();
    let a = engine
        .ledger()
        .open_account(currency, AccountType::Personal, None)
        .unwrap();
    let b = engine
        .ledger()
        .open_account(currency, AccountType::Personal, None)
        .unwrap();
    engine.fund(currency, a, dec!(10000.00), "seed").unwrap();
    engine.fund(currency, b, dec!(10000.00), "seed").unwrap();
    (a, b)
}

#[test]
fn opposing_transfers_do_not_deadlock() {
    let engine = Arc::new(Engine::new());
    let (a, b) = funded_pair(&engine);

    // Watchdog: fail loudly if parking_lot's deadlock detector ever
    // finds a cycle in the lock graph.
    let detector = thread::spawn(|| {
        for _ in 0..50 {
            thread::sleep(Duration::from_millis(100));
            let deadlocks = deadlock::check_deadlock();
            assert!(deadlocks.is_empty(), "deadlock detected: {} cycles", deadlocks.len());
        }
    });

    let mut handles = Vec::new();
    for i in 0..8 {
        let engine = Arc::clone(&engine);
        let (source, dest) = if i % 2 == 0 { (a, b) } else { (b, a) };
        handles.push(thread::spawn(move || {
            for _ in 0..500 {
                let _ = engine.transfer(
                    TransferKind::Direct,
                    source,
                    dest,
                    dec!(1.00),
                    "ping",
                    "pong",
                );
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let currency = engine.ledger().currency_by_symbol("TST").unwrap();
    engine.ledger().check_zero_sum(currency).unwrap();
    drop(detector); // watchdog may still be sleeping; don't block the test
}

#[test]
fn overlapping_transfers_lose_no_updates() {
    let engine = Arc::new(Engine::new());
    let (a, b) = funded_pair(&engine);
    let successes = Arc::new(AtomicU32::new(0));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let engine = Arc::clone(&engine);
        let successes = Arc::clone(&successes);
        handles.push(thread::spawn(move || {
            for _ in 0..1000 {
                if engine
                    .transfer(TransferKind::Direct, a, b, dec!(0.50), "x", "x")
                    .is_ok()
                {
                    successes.fetch_add(1, Ordering::Relaxed);
                }
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let moved = Decimal::from(successes.load(Ordering::Relaxed)) * dec!(0.50);
    assert_eq!(
        engine.ledger().snapshot(a).unwrap().balance,
        dec!(10000.00) - moved
    );
    assert_eq!(
        engine.ledger().snapshot(b).unwrap().balance,
        dec!(10000.00) + moved
    );

    let currency = engine.ledger().currency_by_symbol("TST").unwrap();
    engine.ledger().check_zero_sum(currency).unwrap();
}

#[test]
fn zero_sum_holds_under_parallel_mixed_load() {
    let engine = Arc::new(Engine::new());
    let currency = engine.ledger().create_currency("TST").unwrap();
    let accounts: Vec<AccountId> = (0..8)
        .map(|_| {
            engine
                .ledger()
                .open_account(currency, AccountType::Personal, None)
                .unwrap()
        })
        .collect();
    for account in &accounts {
        engine.fund(currency, *account, dec!(100.00), "seed").unwrap();
    }

    let mut handles = Vec::new();
    for (i, account) in accounts.iter().enumerate() {
        let engine = Arc::clone(&engine);
        let accounts = accounts.clone();
        let source = *account;
        handles.push(thread::spawn(move || {
            for round in 0..300 {
                let dest = accounts[(i + round + 1) % accounts.len()];
                match round % 3 {
                    0 => {
                        let _ = engine.transfer(
                            TransferKind::Direct,
                            source,
                            dest,
                            dec!(1.25),
                            "x",
                            "x",
                        );
                    }
                    1 => {
                        let _ = engine.fund(currency, source, dec!(0.75), "top up");
                    }
                    _ => {
                        let _ = engine.refund(currency, source, dec!(2.00), "trim");
                    }
                }
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    engine.ledger().check_zero_sum(currency).unwrap();
    // The trail only ever grows in pairs.
    assert_eq!(engine.ledger().log().len() % 2, 0);
}

#[test]
fn concurrent_account_opening_allocates_unique_numbers() {
    let engine = Arc::new(Engine::new());
    let currency = engine.ledger().create_currency("TST").unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            let mut opened = Vec::new();
            for _ in 0..50 {
                opened.push(
                    engine
                        .ledger()
                        .open_account(currency, AccountType::Personal, None)
                        .unwrap(),
                );
            }
            opened
        }));
    }

    let mut numbers = std::collections::HashSet::new();
    let mut total = 0;
    for handle in handles {
        for id in handle.join().unwrap() {
            total += 1;
            let number = engine.ledger().snapshot(id).unwrap().number;
            assert!(numbers.insert(number.to_string()), "duplicate number issued");
        }
    }
    assert_eq!(total, 400);
    assert_eq!(
        engine.ledger().currency(currency).unwrap().next_account_sequence(),
        400
    );
}

#[test]
fn concurrent_claims_redeem_a_voucher_exactly_once() {
    let engine = Arc::new(Engine::new());
    let vouchers = Arc::new(VoucherEngine::new());
    let currency = engine.ledger().create_currency("TST").unwrap();
    let claimant = engine
        .ledger()
        .open_account(currency, AccountType::Personal, None)
        .unwrap();

    let id = vouchers.issue(&engine, currency, dec!(9.00), 30).unwrap();
    let code = vouchers.get(id).unwrap().code();
    let successes = Arc::new(AtomicU32::new(0));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = Arc::clone(&engine);
        let vouchers = Arc::clone(&vouchers);
        let successes = Arc::clone(&successes);
        let code = code.clone();
        handles.push(thread::spawn(move || {
            if vouchers.claim(&engine, &code, claimant).is_ok() {
                successes.fetch_add(1, Ordering::Relaxed);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(successes.load(Ordering::Relaxed), 1);
    assert_eq!(engine.ledger().snapshot(claimant).unwrap().balance, dec!(9.00));
    engine.ledger().check_zero_sum(currency).unwrap();
}
