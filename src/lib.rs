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

//! # Settlement Optimizer
//!
//! This library nets a set of pairwise debts between banks and proposes a
//! smaller set of settlement transfers that reaches the same net positions,
//! only pairing banks that share a payment channel.
//!
//! ## Core Components
//!
//! - [`Optimizer`]: Greedy debtor/creditor matcher and its configuration
//! - [`NetBalances`]: Signed net position per bank
//! - [`BalanceQueue`]: Max-ordered priority queue driving the matcher
//! - [`Bank`] and [`compatible`]: Banks and the payment-channel predicate
//! - [`SettlementResult`]: Output contract (transfers plus balance summary)
//! - [`OptimizerError`]: Validation and iteration-cap failures
//!
//! ## Example
//!
//! ```
//! use settlement_optimizer::{Bank, BankId, Transaction, optimize};
//! use rust_decimal_macros::dec;
//!
//! let banks = vec![
//!     Bank::new(BankId(1), "Alpha", ["UPI"]),
//!     Bank::new(BankId(2), "Beta", ["UPI"]),
//!     Bank::new(BankId(3), "Gamma", ["UPI"]),
//! ];
//! let transactions = vec![
//!     Transaction::new(BankId(1), BankId(2), dec!(150)),
//!     Transaction::new(BankId(2), BankId(3), dec!(50)),
//! ];
//!
//! let result = optimize(&banks, &transactions);
//! assert_eq!(result.settlements.len(), 2);
//! assert_eq!(result.settlements[0].amount, dec!(100.00));
//! ```
//!
//! ## Thread Safety
//!
//! Every call works on freshly allocated state, so independent inputs can be
//! optimized in parallel without locking.

mod balance_queue;
mod balances;
pub mod bank;
mod base;
pub mod error;
mod optimizer;
pub mod result;
mod transaction;

pub use balance_queue::{BalanceEntry, BalanceQueue};
pub use balances::NetBalances;
pub use bank::{Bank, compatible};
pub use base::BankId;
pub use error::OptimizerError;
pub use optimizer::{Optimizer, OptimizerConfig, optimize, validate};
pub use result::{
    NetBalanceEntry, SettlementResult, SettlementTransfer, UnsettledBalance, UnsettledReason,
};
pub use transaction::Transaction;
