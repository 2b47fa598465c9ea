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

//! Benchmarks for the settlement optimizer.
//!
//! Run with: cargo bench
//!
//! Benchmarks include:
//! - Priority queue push/pop throughput
//! - Net balance aggregation
//! - End-to-end optimization with dense and sparse compatibility
//! - Parallel independent invocations

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rayon::prelude::*;
use rust_decimal::Decimal;
use settlement_optimizer::{
    BalanceEntry, BalanceQueue, Bank, BankId, NetBalances, Transaction, optimize,
};

// =============================================================================
// Helper Functions
// =============================================================================

/// Builds `banks` banks and `txs` transactions. With `sparse`, each bank gets
/// one of four disjoint channels so most pairs are incompatible.
fn make_snapshot(banks: u32, txs: u32, sparse: bool) -> (Vec<Bank>, Vec<Transaction>) {
    let channels = ["UPI", "WIRE", "SWIFT", "ACH"];
    let bank_list = (0..banks)
        .map(|i| {
            let labels: Vec<&str> = if sparse {
                vec![channels[(i % 4) as usize]]
            } else {
                channels.to_vec()
            };
            Bank::new(BankId(i), format!("Bank {i}"), labels)
        })
        .collect();
    let tx_list = (0..txs)
        .map(|i| {
            let debtor = i.wrapping_mul(2_654_435_761) % banks;
            let creditor = (debtor + 1 + i % (banks - 1)) % banks;
            Transaction::new(
                BankId(debtor),
                BankId(creditor),
                Decimal::new(i64::from(i % 9_973 + 1) * 100, 2),
            )
        })
        .collect();
    (bank_list, tx_list)
}

// =============================================================================
// Component Benchmarks
// =============================================================================

fn bench_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("balance_queue");

    for count in [100u32, 1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(u64::from(*count)));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter(|| {
                let mut queue: BalanceQueue = (0..count)
                    .map(|i| {
                        let magnitude = Decimal::from(i.wrapping_mul(7_919) % 1_000);
                        BalanceEntry::new(BankId(i), magnitude)
                    })
                    .collect();
                while let Some(entry) = queue.pop() {
                    black_box(entry);
                }
            })
        });
    }
    group.finish();
}

fn bench_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation");

    for count in [100u32, 1_000, 10_000].iter() {
        let (banks, txs) = make_snapshot(50, *count, false);
        group.throughput(Throughput::Elements(u64::from(*count)));
        group.bench_with_input(BenchmarkId::from_parameter(count), &txs, |b, txs| {
            b.iter(|| black_box(NetBalances::aggregate(&banks, txs)))
        });
    }
    group.finish();
}

// =============================================================================
// End-to-End Benchmarks
// =============================================================================

fn bench_optimize(c: &mut Criterion) {
    let mut group = c.benchmark_group("optimize");

    for banks in [10u32, 50, 200].iter() {
        for (label, sparse) in [("dense", false), ("sparse", true)] {
            let (bank_list, txs) = make_snapshot(*banks, banks * 20, sparse);
            group.bench_with_input(
                BenchmarkId::new(label, banks),
                &(bank_list, txs),
                |b, (banks, txs)| b.iter(|| black_box(optimize(banks, txs))),
            );
        }
    }
    group.finish();
}

fn bench_parallel_invocations(c: &mut Criterion) {
    let inputs: Vec<_> = (0..64).map(|i| make_snapshot(20 + i, 400, i % 2 == 0)).collect();

    c.bench_function("parallel_64_snapshots", |b| {
        b.iter(|| {
            let results: Vec<_> = inputs
                .par_iter()
                .map(|(banks, txs)| optimize(banks, txs))
                .collect();
            black_box(results);
        })
    });
}

criterion_group!(components, bench_queue, bench_aggregation,);

criterion_group!(end_to_end, bench_optimize, bench_parallel_invocations,);

criterion_main!(components, end_to_end);
