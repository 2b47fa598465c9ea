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

//! Banks and payment-channel compatibility.
//!
//! A direct settlement transfer between two banks is only possible when they
//! share at least one payment channel label. Labels are free-form and matched
//! case-sensitively.
//!
//! # Example
//!
//! ```
//! use settlement_optimizer::{Bank, BankId, compatible};
//!
//! let a = Bank::new(BankId(1), "Alpha", ["UPI", "WIRE"]);
//! let b = Bank::new(BankId(2), "Beta", ["WIRE"]);
//! let c = Bank::new(BankId(3), "Gamma", ["upi"]);
//!
//! assert!(compatible(&a, &b));
//! assert!(!compatible(&a, &c));
//! ```

use crate::base::BankId;
use crate::error::OptimizerError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A party holding a net position and a set of supported payment channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bank {
    id: BankId,
    name: String,
    payment_types: BTreeSet<String>,
}

impl Bank {
    pub fn new<I, S>(id: BankId, name: impl Into<String>, payment_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            name: name.into(),
            payment_types: payment_types.into_iter().map(Into::into).collect(),
        }
    }

    pub fn id(&self) -> BankId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payment_types(&self) -> &BTreeSet<String> {
        &self.payment_types
    }

    /// Returns `true` if both banks share at least one payment channel.
    pub fn is_compatible(&self, other: &Bank) -> bool {
        // Iterate the smaller set and probe the larger.
        let (small, large) = if self.payment_types.len() <= other.payment_types.len() {
            (&self.payment_types, &other.payment_types)
        } else {
            (&other.payment_types, &self.payment_types)
        };
        small.iter().any(|label| large.contains(label))
    }

    /// Checks that the bank declares at least one payment channel.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::EmptyPaymentTypes`] when the channel set is empty.
    pub fn validate(&self) -> Result<(), OptimizerError> {
        if self.payment_types.is_empty() {
            return Err(OptimizerError::EmptyPaymentTypes(self.id));
        }
        Ok(())
    }
}

/// Decides whether a direct transfer between `a` and `b` is permissible.
///
/// Symmetric. A bank with no payment channels is compatible with nobody.
pub fn compatible(a: &Bank, b: &Bank) -> bool {
    a.is_compatible(b)
}
