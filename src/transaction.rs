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

//! Directed debts between banks.

use crate::base::BankId;
use crate::error::OptimizerError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A directed obligation: `debtor` owes `creditor` the given `amount`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub debtor: BankId,
    pub creditor: BankId,
    pub amount: Decimal,
}

impl Transaction {
    pub fn new(debtor: BankId, creditor: BankId, amount: Decimal) -> Self {
        Self {
            debtor,
            creditor,
            amount,
        }
    }

    /// Checks that the transaction is well formed.
    ///
    /// # Errors
    ///
    /// - [`OptimizerError::InvalidAmount`] - Amount is zero or negative.
    /// - [`OptimizerError::SelfTransfer`] - Debtor and creditor are the same bank.
    pub fn validate(&self) -> Result<(), OptimizerError> {
        if self.amount <= Decimal::ZERO {
            return Err(OptimizerError::InvalidAmount);
        }
        if self.debtor == self.creditor {
            return Err(OptimizerError::SelfTransfer(self.debtor));
        }
        Ok(())
    }
}
