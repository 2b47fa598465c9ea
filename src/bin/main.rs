// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
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

use clap::{Parser, ValueEnum};
use csv::{ReaderBuilder, Trim, Writer};
use rust_decimal::Decimal;
use serde::Deserialize;
use settlement_optimizer::{Bank, Optimizer, OptimizerConfig, SettlementResult, Transaction};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Separator between payment types in the banks CSV.
const PAYMENT_TYPE_SEPARATOR: char = '|';

/// Settlement Optimizer - Net bank debts into a minimal transfer plan
///
/// Reads banks and transactions from CSV files and prints the settlement
/// plan to stdout. Logging goes to stderr and is controlled by RUST_LOG.
#[derive(Parser, Debug)]
#[command(name = "settle")]
#[command(about = "Computes a payment-type aware settlement plan from bank debts", long_about = None)]
struct Args {
    /// Path to CSV file with banks
    ///
    /// Expected format: id,name,payment_types
    /// Example row: 1,Alpha Bank,UPI|WIRE
    #[arg(value_name = "BANKS")]
    banks: PathBuf,

    /// Path to CSV file with transactions
    ///
    /// Expected format: debtor,creditor,amount
    #[arg(value_name = "TRANSACTIONS")]
    transactions: PathBuf,

    /// Reject malformed input instead of tolerating it
    #[arg(long)]
    strict: bool,

    /// Include balances that could not be settled in the output
    #[arg(long)]
    report_unsettled: bool,

    /// Remainders at or below this amount count as settled
    #[arg(long, value_name = "AMOUNT", default_value_t = OptimizerConfig::DEFAULT_EPSILON)]
    epsilon: Decimal,

    /// Abort after this many matching rounds
    #[arg(long, value_name = "N")]
    max_iterations: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Full result as pretty-printed JSON
    Json,
    /// Settlement transfers only, as CSV
    Csv,
}

impl Args {
    fn config(&self) -> OptimizerConfig {
        OptimizerConfig {
            strict: self.strict,
            report_unsettled: self.report_unsettled,
            settlement_epsilon: self.epsilon,
            max_iterations: self.max_iterations,
        }
    }
}

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let banks = match open(&args.banks).map(read_banks) {
        Ok(banks) => banks,
        Err(e) => {
            eprintln!("Error reading banks from '{}': {}", args.banks.display(), e);
            process::exit(1);
        }
    };

    let transactions = match open(&args.transactions).map(read_transactions) {
        Ok(transactions) => transactions,
        Err(e) => {
            eprintln!(
                "Error reading transactions from '{}': {}",
                args.transactions.display(),
                e
            );
            process::exit(1);
        }
    };

    let result = match Optimizer::new(args.config()).optimize(&banks, &transactions) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error optimizing settlements: {}", e);
            process::exit(1);
        }
    };

    // Write results to stdout
    let written = match args.format {
        Format::Json => write_json(&result, std::io::stdout()),
        Format::Csv => write_settlements(&result, std::io::stdout()).map_err(Into::into),
    };
    if let Err(e) = written {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

fn open(path: &Path) -> Result<BufReader<File>, csv::Error> {
    Ok(BufReader::new(File::open(path)?))
}

/// Raw CSV record for a bank.
///
/// Fields: `id, name, payment_types`
#[derive(Debug, Deserialize)]
struct BankRecord {
    id: u32,
    name: String,
    payment_types: String,
}

impl BankRecord {
    fn into_bank(self) -> Bank {
        let payment_types = self
            .payment_types
            .split(PAYMENT_TYPE_SEPARATOR)
            .map(str::trim)
            .filter(|label| !label.is_empty());
        Bank::new(self.id.into(), self.name, payment_types)
    }
}

/// Raw CSV record for a transaction.
///
/// Fields: `debtor, creditor, amount`
#[derive(Debug, Deserialize)]
struct TransactionRecord {
    debtor: u32,
    creditor: u32,
    amount: Decimal,
}

impl From<TransactionRecord> for Transaction {
    fn from(record: TransactionRecord) -> Self {
        Transaction::new(record.debtor.into(), record.creditor.into(), record.amount)
    }
}

fn reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .trim(Trim::All) // Handle whitespace in fields like " UPI "
        .has_headers(true) // Skip first row as header
        .from_reader(reader)
}

/// Reads banks from CSV, skipping malformed rows.
///
/// ```csv
/// id,name,payment_types
/// 1,Alpha Bank,UPI|WIRE
/// 2,Beta Bank,UPI
/// ```
pub fn read_banks<R: Read>(input: R) -> Vec<Bank> {
    let mut rdr = reader(input);
    rdr.deserialize::<BankRecord>()
        .filter_map(|result| match result {
            Ok(record) => Some(record.into_bank()),
            Err(e) => {
                warn!(error = %e, "skipping malformed bank row");
                None
            }
        })
        .collect()
}

/// Reads transactions from CSV, skipping malformed rows.
///
/// Amount validity is left to the optimizer, which checks it in strict mode.
///
/// ```csv
/// debtor,creditor,amount
/// 1,2,100.00
/// ```
pub fn read_transactions<R: Read>(input: R) -> Vec<Transaction> {
    let mut rdr = reader(input);
    rdr.deserialize::<TransactionRecord>()
        .filter_map(|result| match result {
            Ok(record) => Some(record.into()),
            Err(e) => {
                warn!(error = %e, "skipping malformed transaction row");
                None
            }
        })
        .collect()
}

/// Writes the full result as pretty-printed JSON.
pub fn write_json<W: Write>(
    result: &SettlementResult,
    mut writer: W,
) -> Result<(), Box<dyn std::error::Error>> {
    serde_json::to_writer_pretty(&mut writer, result)?;
    writeln!(writer)?;
    Ok(())
}

/// Writes settlement transfers as CSV.
///
/// # CSV Format
///
/// Columns: `from, from_id, to, to_id, amount`
///
/// ```csv
/// from,from_id,to,to_id,amount
/// Alpha Bank,1,Beta Bank,2,100.00
/// ```
pub fn write_settlements<W: Write>(
    result: &SettlementResult,
    writer: W,
) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(["from", "from_id", "to", "to_id", "amount"])?;
    for s in &result.settlements {
        wtr.write_record([
            s.from.clone(),
            s.from_id.to_string(),
            s.to.clone(),
            s.to_id.to_string(),
            s.amount.to_string(),
        ])?;
    }

    // Flush to ensure all data is written
    wtr.flush()?;
    Ok(())
}
