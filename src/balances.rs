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

//! Net balance aggregation.
//!
//! Reduces directed transactions to one signed position per bank: amounts
//! owed to the bank count positive, amounts it owes count negative. No
//! rounding happens here, so the positions always sum to exactly zero unless
//! a position saturates at the edge of the [`Decimal`] range.

use crate::bank::Bank;
use crate::base::BankId;
use crate::error::OptimizerError;
use crate::transaction::Transaction;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::warn;

/// Signed net position per bank, in first-seen order.
///
/// Known banks come first in snapshot order, followed by any ids that were
/// only encountered as transaction endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetBalances {
    amounts: HashMap<BankId, Decimal>,
    order: Vec<BankId>,
}

impl NetBalances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregates `transactions` over `banks`.
    ///
    /// Every bank starts at zero so idle banks still appear. A transaction
    /// endpoint missing from `banks` is tracked anyway, starting from zero.
    /// A position that would leave the [`Decimal`] range saturates at
    /// [`Decimal::MAX`] or [`Decimal::MIN`].
    pub fn aggregate(banks: &[Bank], transactions: &[Transaction]) -> Self {
        let mut balances = Self::with_banks(banks);
        for tx in transactions {
            balances.apply(tx);
        }
        balances
    }

    /// Like [`NetBalances::aggregate`], but rejects references to unknown banks.
    ///
    /// # Errors
    ///
    /// - [`OptimizerError::UnknownEntityReference`] - First endpoint not present in `banks`.
    /// - [`OptimizerError::AmountOverflow`] - A position left the [`Decimal`] range.
    pub fn aggregate_strict(
        banks: &[Bank],
        transactions: &[Transaction],
    ) -> Result<Self, OptimizerError> {
        let mut balances = Self::with_banks(banks);
        for tx in transactions {
            for id in [tx.debtor, tx.creditor] {
                if !balances.amounts.contains_key(&id) {
                    return Err(OptimizerError::UnknownEntityReference(id));
                }
            }
            balances.apply_checked(tx)?;
        }
        Ok(balances)
    }

    fn with_banks(banks: &[Bank]) -> Self {
        let mut balances = Self {
            amounts: HashMap::with_capacity(banks.len()),
            order: Vec::with_capacity(banks.len()),
        };
        for bank in banks {
            balances.entry(bank.id());
        }
        balances
    }

    fn entry(&mut self, id: BankId) -> &mut Decimal {
        match self.amounts.entry(id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                self.order.push(id);
                entry.insert(Decimal::ZERO)
            }
        }
    }

    fn apply(&mut self, tx: &Transaction) {
        for (id, delta) in [(tx.debtor, -tx.amount), (tx.creditor, tx.amount)] {
            let balance = self.entry(id);
            *balance = match balance.checked_add(delta) {
                Some(next) => next,
                None => {
                    warn!(bank = %id, "net position overflowed, saturating");
                    balance.saturating_add(delta)
                }
            };
        }
    }

    fn apply_checked(&mut self, tx: &Transaction) -> Result<(), OptimizerError> {
        for (id, delta) in [(tx.debtor, -tx.amount), (tx.creditor, tx.amount)] {
            let balance = self.entry(id);
            *balance = balance
                .checked_add(delta)
                .ok_or(OptimizerError::AmountOverflow(id))?;
        }
        Ok(())
    }

    /// Net position of `id`, if it was seen.
    pub fn get(&self, id: &BankId) -> Option<Decimal> {
        self.amounts.get(id).copied()
    }

    /// Iterates `(id, net)` pairs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (BankId, Decimal)> + '_ {
        self.order.iter().map(|id| (*id, self.amounts[id]))
    }

    /// Banks with a negative position, as `(id, amount owed)`.
    pub fn debtors(&self) -> impl Iterator<Item = (BankId, Decimal)> + '_ {
        self.iter()
            .filter(|(_, net)| *net < Decimal::ZERO)
            .map(|(id, net)| (id, net.abs()))
    }

    /// Banks with a positive position, as `(id, amount owed to them)`.
    pub fn creditors(&self) -> impl Iterator<Item = (BankId, Decimal)> + '_ {
        self.iter().filter(|(_, net)| *net > Decimal::ZERO)
    }

    /// Sum of all positions, or `None` if the sum leaves the [`Decimal`] range.
    pub fn total(&self) -> Option<Decimal> {
        self.amounts
            .values()
            .try_fold(Decimal::ZERO, |acc, net| acc.checked_add(*net))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
