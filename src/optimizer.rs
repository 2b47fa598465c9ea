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

//! Greedy settlement matcher.
//!
//! The [`Optimizer`] turns a snapshot of banks and directed transactions into
//! a settlement plan that reaches the same net positions with (usually) fewer
//! transfers.
//!
//! # Algorithm
//!
//! 1. Aggregate every bank's net position.
//! 2. Load net debtors and net creditors into two max-ordered queues keyed by
//!    the size of their position. Banks at exactly zero take no part.
//! 3. Pop the largest debtor, then pop creditors until one shares a payment
//!    channel with it. Skipped creditors go back into the queue unchanged.
//! 4. Transfer the smaller of the two magnitudes and re-queue whichever side
//!    still has more than [`OptimizerConfig::settlement_epsilon`] left.
//! 5. Repeat until either queue is empty.
//!
//! A debtor for which no creditor is compatible is dropped from the plan for
//! good. Its net position still appears in the balance summary, and it is
//! listed under `unsettled` when [`OptimizerConfig::report_unsettled`] is on.
//!
//! Pop order among exactly equal magnitudes follows heap structure and is not
//! meaningful.
//!
//! # Complexity
//!
//! O(E log E) for E banks with a non-zero position when compatibility is
//! dense, degrading to O(E² log E) when most pairs share no channel.
//!
//! # Thread Safety
//!
//! All working state is allocated per call. One [`Optimizer`] can be shared
//! across threads and invoked concurrently on independent inputs.

use crate::balance_queue::{BalanceEntry, BalanceQueue};
use crate::balances::NetBalances;
use crate::bank::Bank;
use crate::base::BankId;
use crate::error::OptimizerError;
use crate::result::{RawTransfer, RawUnsettled, SettlementResult, UnsettledReason};
use crate::transaction::Transaction;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Tuning knobs for an [`Optimizer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OptimizerConfig {
    /// Validate the snapshot before running instead of tolerating bad input.
    pub strict: bool,
    /// Report balances the matcher could not settle.
    pub report_unsettled: bool,
    /// Remainders at or below this are treated as fully settled. Must not
    /// be negative.
    pub settlement_epsilon: Decimal,
    /// Upper bound on matching rounds. `None` means unbounded.
    pub max_iterations: Option<usize>,
}

impl OptimizerConfig {
    /// One currency minor unit.
    pub const DEFAULT_EPSILON: Decimal = dec!(0.01);
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            strict: false,
            report_unsettled: false,
            settlement_epsilon: Self::DEFAULT_EPSILON,
            max_iterations: None,
        }
    }
}

/// What the matching loop produced before rounding and naming.
#[derive(Debug, Default)]
struct MatchOutcome {
    transfers: Vec<RawTransfer>,
    unsettled: Vec<RawUnsettled>,
    /// Stopped by `max_iterations` with work left in both queues.
    truncated: bool,
}

/// Cash-flow settlement optimizer.
///
/// # Example
///
/// ```
/// use settlement_optimizer::{Bank, BankId, Optimizer, Transaction};
/// use rust_decimal_macros::dec;
///
/// let banks = vec![
///     Bank::new(BankId(1), "Alpha", ["UPI"]),
///     Bank::new(BankId(2), "Beta", ["UPI"]),
///     Bank::new(BankId(3), "Gamma", ["UPI"]),
/// ];
/// let transactions = vec![
///     Transaction::new(BankId(1), BankId(2), dec!(100)),
///     Transaction::new(BankId(2), BankId(3), dec!(100)),
/// ];
///
/// let result = Optimizer::default().optimize(&banks, &transactions).unwrap();
/// assert_eq!(result.optimized_count, 1);
/// assert_eq!(result.settlements[0].from_id, BankId(1));
/// assert_eq!(result.settlements[0].to_id, BankId(3));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Optimizer {
    config: OptimizerConfig,
}

impl Optimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Computes a settlement plan for the given snapshot.
    ///
    /// # Errors
    ///
    /// Any mode fails with:
    ///
    /// - [`OptimizerError::NegativeEpsilon`] - `settlement_epsilon` below zero.
    /// - [`OptimizerError::IterationLimitExceeded`] - `max_iterations` reached.
    ///
    /// Strict mode additionally reports, in order of checking:
    ///
    /// - [`OptimizerError::InsufficientBanks`] - Fewer than two banks.
    /// - [`OptimizerError::NoTransactions`] - Empty transaction list.
    /// - [`OptimizerError::DuplicateBank`] - Same id listed twice.
    /// - [`OptimizerError::EmptyPaymentTypes`] - Bank without channels.
    /// - [`OptimizerError::InvalidAmount`] - Non-positive amount.
    /// - [`OptimizerError::SelfTransfer`] - Debtor equals creditor.
    /// - [`OptimizerError::UnknownEntityReference`] - Endpoint not in `banks`.
    /// - [`OptimizerError::AmountOverflow`] - Net position out of range.
    pub fn optimize(
        &self,
        banks: &[Bank],
        transactions: &[Transaction],
    ) -> Result<SettlementResult, OptimizerError> {
        // A zero remainder must never be re-queued.
        if self.config.settlement_epsilon < Decimal::ZERO {
            return Err(OptimizerError::NegativeEpsilon);
        }

        let balances = if self.config.strict {
            validate(banks, transactions)?;
            NetBalances::aggregate_strict(banks, transactions)?
        } else {
            NetBalances::aggregate(banks, transactions)
        };

        let directory = directory(banks);
        let outcome = self.settle(&balances, &directory);
        if outcome.truncated {
            // `truncated` is only set when a cap exists.
            let limit = self.config.max_iterations.unwrap_or_default();
            warn!(limit, "settlement matching hit iteration cap");
            return Err(OptimizerError::IterationLimitExceeded(limit));
        }

        Ok(self.assemble(transactions.len(), &outcome, &balances, &directory))
    }

    fn assemble(
        &self,
        original_count: usize,
        outcome: &MatchOutcome,
        balances: &NetBalances,
        directory: &HashMap<BankId, &Bank>,
    ) -> SettlementResult {
        let unsettled: &[RawUnsettled] = if self.config.report_unsettled {
            &outcome.unsettled
        } else {
            &[]
        };
        let result = SettlementResult::assemble(
            original_count,
            &outcome.transfers,
            unsettled,
            balances,
            |id| directory.get(&id).map(|bank| bank.name()),
        );
        info!(
            original = result.original_count,
            optimized = result.optimized_count,
            savings = result.savings,
            unsettled = outcome.unsettled.len(),
            "settlement plan computed"
        );
        result
    }

    /// Runs the greedy matching loop over non-zero positions.
    fn settle(&self, balances: &NetBalances, directory: &HashMap<BankId, &Bank>) -> MatchOutcome {
        let epsilon = self.config.settlement_epsilon;
        let mut debtors: BalanceQueue = balances
            .debtors()
            .map(|(id, owed)| BalanceEntry::new(id, owed))
            .collect();
        let mut creditors: BalanceQueue = balances
            .creditors()
            .map(|(id, due)| BalanceEntry::new(id, due))
            .collect();
        debug!(
            debtors = debtors.len(),
            creditors = creditors.len(),
            "loaded settlement queues"
        );

        let mut outcome = MatchOutcome::default();
        let mut rounds = 0usize;
        let mut skipped = Vec::new();

        while !debtors.is_empty() && !creditors.is_empty() {
            if self.config.max_iterations.is_some_and(|limit| rounds >= limit) {
                outcome.truncated = true;
                break;
            }
            rounds += 1;

            let Some(debtor) = debtors.pop() else {
                break;
            };

            let mut matched = None;
            while let Some(candidate) = creditors.pop() {
                if is_compatible(directory, debtor.bank_id, candidate.bank_id) {
                    matched = Some(candidate);
                    break;
                }
                debug!(
                    debtor = %debtor.bank_id,
                    creditor = %candidate.bank_id,
                    "skipping creditor with no shared payment type"
                );
                skipped.push(candidate);
            }
            creditors.extend(skipped.drain(..));

            let Some(creditor) = matched else {
                warn!(
                    debtor = %debtor.bank_id,
                    owed = %debtor.magnitude,
                    "no compatible creditor, leaving debtor unsettled"
                );
                outcome.unsettled.push(RawUnsettled {
                    bank_id: debtor.bank_id,
                    amount: -debtor.magnitude,
                    reason: UnsettledReason::NoCompatibleCreditor,
                });
                continue;
            };

            let amount = debtor.magnitude.min(creditor.magnitude);
            debug!(
                from = %debtor.bank_id,
                to = %creditor.bank_id,
                %amount,
                "emitting settlement transfer"
            );
            outcome.transfers.push(RawTransfer {
                from: debtor.bank_id,
                to: creditor.bank_id,
                amount,
            });

            let debtor_left = debtor.magnitude - amount;
            if debtor_left > epsilon {
                debtors.push(BalanceEntry::new(debtor.bank_id, debtor_left));
            }
            let creditor_left = creditor.magnitude - amount;
            if creditor_left > epsilon {
                creditors.push(BalanceEntry::new(creditor.bank_id, creditor_left));
            }
        }

        let mut leftovers: Vec<RawUnsettled> = debtors
            .drain()
            .map(|entry| RawUnsettled {
                bank_id: entry.bank_id,
                amount: -entry.magnitude,
                reason: UnsettledReason::Unmatched,
            })
            .chain(creditors.drain().map(|entry| RawUnsettled {
                bank_id: entry.bank_id,
                amount: entry.magnitude,
                reason: UnsettledReason::Unmatched,
            }))
            .collect();
        leftovers.sort_by_key(|u| u.bank_id);
        outcome.unsettled.extend(leftovers);

        outcome
    }
}

/// Computes a settlement plan with the default, lenient configuration.
///
/// Never fails: malformed references are tracked as extra balances,
/// out-of-range positions saturate and unmatched debtors are simply left out
/// of the plan.
pub fn optimize(banks: &[Bank], transactions: &[Transaction]) -> SettlementResult {
    let optimizer = Optimizer::default();
    let balances = NetBalances::aggregate(banks, transactions);
    let directory = directory(banks);
    let outcome = optimizer.settle(&balances, &directory);
    optimizer.assemble(transactions.len(), &outcome, &balances, &directory)
}

/// Checks the snapshot the way the request layer does before optimizing.
///
/// # Errors
///
/// See [`Optimizer::optimize`].
pub fn validate(banks: &[Bank], transactions: &[Transaction]) -> Result<(), OptimizerError> {
    if banks.len() < 2 {
        return Err(OptimizerError::InsufficientBanks(banks.len()));
    }
    if transactions.is_empty() {
        return Err(OptimizerError::NoTransactions);
    }

    let mut seen = HashSet::with_capacity(banks.len());
    for bank in banks {
        if !seen.insert(bank.id()) {
            return Err(OptimizerError::DuplicateBank(bank.id()));
        }
        bank.validate()?;
    }

    for tx in transactions {
        tx.validate()?;
    }
    Ok(())
}

fn directory(banks: &[Bank]) -> HashMap<BankId, &Bank> {
    banks.iter().map(|bank| (bank.id(), bank)).collect()
}

/// Ids missing from the snapshot have no channels and match nobody.
fn is_compatible(directory: &HashMap<BankId, &Bank>, debtor: BankId, creditor: BankId) -> bool {
    match (directory.get(&debtor), directory.get(&creditor)) {
        (Some(d), Some(c)) => crate::bank::compatible(d, c),
        _ => false,
    }
}
