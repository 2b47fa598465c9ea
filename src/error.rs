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

//! Error types for settlement optimization.
//!
//! The default (lenient) optimizer never produces these. They are raised by
//! strict-mode validation, by an invalid configuration and by the optional
//! iteration cap.

use crate::base::BankId;
use thiserror::Error;

/// Settlement optimization errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptimizerError {
    /// A transaction references a bank that is not in the bank snapshot
    #[error("transaction references unknown bank {0}")]
    UnknownEntityReference(BankId),

    /// A bank declares no payment channels
    #[error("bank {0} has no payment types")]
    EmptyPaymentTypes(BankId),

    /// The same bank id appears more than once in the snapshot
    #[error("duplicate bank id {0}")]
    DuplicateBank(BankId),

    /// Transaction amount is zero or negative
    #[error("invalid amount (must be positive)")]
    InvalidAmount,

    /// Debtor and creditor of a transaction are the same bank
    #[error("bank {0} cannot owe itself")]
    SelfTransfer(BankId),

    /// Fewer than two banks were supplied
    #[error("need at least 2 banks to optimize, got {0}")]
    InsufficientBanks(usize),

    /// No transactions were supplied
    #[error("no transactions to optimize")]
    NoTransactions,

    /// A net position left the representable decimal range
    #[error("net position of bank {0} overflowed")]
    AmountOverflow(BankId),

    /// The settlement epsilon is below zero
    #[error("settlement epsilon must not be negative")]
    NegativeEpsilon,

    /// The matching loop ran past the configured cap
    #[error("settlement matching exceeded {0} iterations")]
    IterationLimitExceeded(usize),
}
