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

use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use mutual_credit_rs::{AccountType, Engine, TransferKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;

/// Mutual Credit Ledger - Replay ledger operations from a CSV file
///
/// Reads operations from a CSV file and outputs final account states to
/// stdout. Supports currency creation, account opening, funding, refunding
/// and direct transfers.
#[derive(Parser, Debug)]
#[command(name = "mutual-credit-rs")]
#[command(about = "A mutual-credit ledger that replays operation CSVs", long_about = None)]
struct Args {
    /// Path to CSV file with operations
    ///
    /// Expected format: op,currency,account,counterparty,amount
    /// Example: cargo run -- operations.csv > accounts.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    let engine = match replay_operations(BufReader::new(file)) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error processing operations: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = write_accounts(&engine, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Raw CSV record matching the input format.
///
/// Fields: `op, currency, account, counterparty, amount`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    op: String,
    currency: String,
    #[serde(default)]
    account: String,
    #[serde(default)]
    counterparty: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    amount: Option<Decimal>,
}

/// One account row of the output CSV.
#[derive(Debug, Serialize)]
struct OutputRecord {
    number: String,
    currency: String,
    #[serde(rename = "type")]
    account_type: String,
    balance: Decimal,
}

/// Replay operations from a CSV reader.
///
/// Rows are processed in order; malformed rows and rejected operations
/// are skipped (reported on stderr in debug builds), matching lenient
/// replay semantics: one bad row must not abort the run.
///
/// # CSV Format
///
/// Expected columns: `op, currency, account, counterparty, amount`
/// - `op`: `currency` | `account` | `merchant` | `fund` | `refund` | `transfer`
/// - `currency`: currency symbol
/// - `account`: account number (source for `transfer`)
/// - `counterparty`: destination account number for `transfer`
/// - `amount`: positive decimal, required for the money-moving ops
///
/// # Example
///
/// ```csv
/// op,currency,account,counterparty,amount
/// currency,TST,,,
/// account,TST,,,
/// fund,TST,211-0001-00001,,10.00
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is invalid.
pub fn replay_operations<R: Read>(reader: R) -> Result<Engine, csv::Error> {
    let engine = Engine::new();

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    for result in rdr.deserialize::<CsvRecord>() {
        match result {
            Ok(record) => {
                if let Err(e) = apply(&engine, &record) {
                    #[cfg(debug_assertions)]
                    eprintln!("Skipping {} row: {}", record.op, e);
                    #[cfg(not(debug_assertions))]
                    let _ = e;
                }
            }
            Err(e) => {
                #[cfg(debug_assertions)]
                eprintln!("Skipping malformed row: {}", e);
                #[cfg(not(debug_assertions))]
                let _ = e;
                continue;
            }
        }
    }

    Ok(engine)
}

fn apply(engine: &Engine, record: &CsvRecord) -> Result<(), String> {
    let ledger = engine.ledger();
    match record.op.to_lowercase().as_str() {
        "currency" => {
            ledger
                .create_currency(&record.currency)
                .map_err(|e| e.to_string())?;
        }
        "account" | "merchant" => {
            let currency = ledger
                .currency_by_symbol(&record.currency)
                .ok_or("currency not found")?;
            let account_type = if record.op.eq_ignore_ascii_case("merchant") {
                AccountType::Merchant
            } else {
                AccountType::Personal
            };
            ledger
                .open_account(currency, account_type, None)
                .map_err(|e| e.to_string())?;
        }
        "fund" => {
            let currency = ledger
                .currency_by_symbol(&record.currency)
                .ok_or("currency not found")?;
            let dest = ledger
                .account_id_by_number_str(&record.account)
                .map_err(|e| e.to_string())?;
            let amount = record.amount.ok_or("missing amount")?;
            engine
                .fund(currency, dest, amount, "Fund Account")
                .map_err(|e| e.to_string())?;
        }
        "refund" => {
            let currency = ledger
                .currency_by_symbol(&record.currency)
                .ok_or("currency not found")?;
            let source = ledger
                .account_id_by_number_str(&record.account)
                .map_err(|e| e.to_string())?;
            let amount = record.amount.ok_or("missing amount")?;
            engine
                .refund(currency, source, amount, "Refund Account")
                .map_err(|e| e.to_string())?;
        }
        "transfer" => {
            let source = ledger
                .account_id_by_number_str(&record.account)
                .map_err(|e| e.to_string())?;
            let dest = ledger
                .account_id_by_number_str(&record.counterparty)
                .map_err(|e| e.to_string())?;
            let amount = record.amount.ok_or("missing amount")?;
            engine
                .transfer(
                    TransferKind::Direct,
                    source,
                    dest,
                    amount,
                    "Transfer To",
                    "Received From",
                )
                .map_err(|e| e.to_string())?;
        }
        other => return Err(format!("unknown op '{other}'")),
    }
    Ok(())
}

/// Write account states to a CSV writer.
///
/// Outputs all accounts with balances at 2 decimal precision.
///
/// # CSV Format
///
/// Columns: `number, currency, type, balance`
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_accounts<W: Write>(engine: &Engine, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for account in engine.ledger().accounts() {
        let currency_id = account.currency_id();
        let symbol = engine
            .ledger()
            .currency(currency_id)
            .map(|currency| currency.symbol())
            .unwrap_or_default();
        wtr.serialize(OutputRecord {
            number: account.number().to_string(),
            currency: symbol,
            account_type: account.account_type().to_string(),
            balance: account
                .balance()
                .round_dp(mutual_credit_rs::BALANCE_PRECISION),
        })?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Cursor;

    #[test]
    fn replay_creates_currency_and_main_account() {
        let csv = "op,currency,account,counterparty,amount\ncurrency,TST,,,\n";
        let engine = replay_operations(Cursor::new(csv)).unwrap();

        let currency = engine.ledger().currency_by_symbol("TST").unwrap();
        let main = engine.ledger().main_account_of(currency).unwrap();
        assert_eq!(
            engine.ledger().snapshot(main).unwrap().number.to_string(),
            "110-0001-00000"
        );
    }

    #[test]
    fn replay_fund_sequence() {
        let csv = "op,currency,account,counterparty,amount\n\
                   currency,TST,,,\n\
                   account,TST,,,\n\
                   fund,TST,211-0001-00001,,10.00\n";
        let engine = replay_operations(Cursor::new(csv)).unwrap();

        let ledger = engine.ledger();
        let member = ledger.account_id_by_number_str("211-0001-00001").unwrap();
        assert_eq!(ledger.snapshot(member).unwrap().balance, dec!(10.00));

        let currency = ledger.currency_by_symbol("TST").unwrap();
        let main = ledger.main_account_of(currency).unwrap();
        assert_eq!(ledger.snapshot(main).unwrap().balance, dec!(-10.00));
    }

    #[test]
    fn replay_transfer_between_members() {
        let csv = "op,currency,account,counterparty,amount\n\
                   currency,TST,,,\n\
                   account,TST,,,\n\
                   account,TST,,,\n\
                   fund,TST,211-0001-00001,,10.00\n\
                   transfer,TST,211-0001-00001,212-0001-00002,4.00\n";
        let engine = replay_operations(Cursor::new(csv)).unwrap();

        let ledger = engine.ledger();
        let source = ledger.account_id_by_number_str("211-0001-00001").unwrap();
        let dest = ledger.account_id_by_number_str("212-0001-00002").unwrap();
        assert_eq!(ledger.snapshot(source).unwrap().balance, dec!(6.00));
        assert_eq!(ledger.snapshot(dest).unwrap().balance, dec!(4.00));
    }

    #[test]
    fn skip_rejected_and_malformed_rows() {
        let csv = "op,currency,account,counterparty,amount\n\
                   currency,TST,,,\n\
                   account,TST,,,\n\
                   fund,TST,211-0001-00001,,-5.00\n\
                   bogus,row,,,\n\
                   fund,TST,211-0001-00001,,3.00\n";
        let engine = replay_operations(Cursor::new(csv)).unwrap();

        let ledger = engine.ledger();
        let member = ledger.account_id_by_number_str("211-0001-00001").unwrap();
        assert_eq!(ledger.snapshot(member).unwrap().balance, dec!(3.00));
    }

    #[test]
    fn write_accounts_to_csv() {
        let csv = "op,currency,account,counterparty,amount\n\
                   currency,TST,,,\n\
                   account,TST,,,\n";
        let engine = replay_operations(Cursor::new(csv)).unwrap();

        let mut output = Vec::new();
        write_accounts(&engine, &mut output).unwrap();

        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.contains("number,currency,type,balance"));
        assert!(output_str.contains("211-0001-00001"));
    }
}
