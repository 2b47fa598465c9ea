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

//! Settlement plan output contract.
//!
//! Everything reported here is rounded to [`DECIMAL_PRECISION`] places and
//! carries exactly that many digits, so `100` is reported as `100.00`.
//! Rounding is half-to-even, the [`Decimal::round_dp`] default.

use crate::balances::NetBalances;
use crate::base::BankId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Number of decimal places in every reported amount.
pub const DECIMAL_PRECISION: u32 = 2;

/// Display name used for ids that are not in the bank snapshot.
pub const UNKNOWN_BANK_NAME: &str = "Unknown";

/// Rounds `amount` to cents and pads it to exactly two decimal places.
pub fn round_amount(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp(DECIMAL_PRECISION);
    rounded.rescale(DECIMAL_PRECISION);
    if rounded.is_zero() {
        // -0.004 rounds to "-0.00" otherwise.
        rounded.set_sign_positive(true);
    }
    rounded
}

/// A single proposed payment from a net debtor to a net creditor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementTransfer {
    pub from: String,
    pub from_id: BankId,
    pub to: String,
    pub to_id: BankId,
    pub amount: Decimal,
}

/// A bank's net position in the result summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetBalanceEntry {
    #[serde(rename = "entityId")]
    pub bank_id: BankId,
    pub name: String,
    pub amount: Decimal,
}

/// Why a balance was left out of the settlement plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnsettledReason {
    /// The debtor shared no payment channel with any remaining creditor.
    NoCompatibleCreditor,
    /// Matching stopped while the balance was still queued.
    Unmatched,
}

/// A balance the greedy matcher could not settle.
///
/// `amount` is the remaining signed position: negative for debtors,
/// positive for creditors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsettledBalance {
    #[serde(rename = "entityId")]
    pub bank_id: BankId,
    pub name: String,
    pub amount: Decimal,
    pub reason: UnsettledReason,
}

/// Result of one optimizer run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResult {
    pub original_count: usize,
    pub optimized_count: usize,
    /// `original_count - optimized_count`. Negative when the greedy plan
    /// needs more transfers than the input had.
    pub savings: i64,
    pub settlements: Vec<SettlementTransfer>,
    pub net_balances: Vec<NetBalanceEntry>,
    /// Only populated when unsettled reporting is enabled.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unsettled: Vec<UnsettledBalance>,
}

/// Unrounded transfer emitted by the matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawTransfer {
    pub from: BankId,
    pub to: BankId,
    pub amount: Decimal,
}

/// Unrounded leftover recorded by the matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawUnsettled {
    pub bank_id: BankId,
    pub amount: Decimal,
    pub reason: UnsettledReason,
}

impl SettlementResult {
    /// Packages matcher output and balances into the reported shape.
    ///
    /// `name_of` resolves display names; ids it does not know are reported
    /// as [`UNKNOWN_BANK_NAME`].
    pub(crate) fn assemble<'a, F>(
        original_count: usize,
        transfers: &[RawTransfer],
        unsettled: &[RawUnsettled],
        balances: &NetBalances,
        name_of: F,
    ) -> Self
    where
        F: Fn(BankId) -> Option<&'a str>,
    {
        let name = |id: BankId| name_of(id).unwrap_or(UNKNOWN_BANK_NAME).to_owned();

        let settlements: Vec<SettlementTransfer> = transfers
            .iter()
            .map(|t| SettlementTransfer {
                from: name(t.from),
                from_id: t.from,
                to: name(t.to),
                to_id: t.to,
                amount: round_amount(t.amount),
            })
            .collect();

        let net_balances = balances
            .iter()
            .map(|(bank_id, net)| NetBalanceEntry {
                bank_id,
                name: name(bank_id),
                amount: round_amount(net),
            })
            .collect();

        let unsettled = unsettled
            .iter()
            .map(|u| UnsettledBalance {
                bank_id: u.bank_id,
                name: name(u.bank_id),
                amount: round_amount(u.amount),
                reason: u.reason,
            })
            .collect();

        let optimized_count = settlements.len();
        Self {
            original_count,
            optimized_count,
            savings: original_count as i64 - optimized_count as i64,
            settlements,
            net_balances,
            unsettled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Bank, Transaction};
    use rust_decimal_macros::dec;

    #[test]
    fn round_amount_pads_to_two_places() {
        assert_eq!(round_amount(dec!(100)).to_string(), "100.00");
        assert_eq!(round_amount(dec!(33.333)).to_string(), "33.33");
        assert_eq!(round_amount(dec!(-12.5)).to_string(), "-12.50");
    }

    #[test]
    fn round_amount_uses_bankers_rounding() {
        assert_eq!(round_amount(dec!(0.125)), dec!(0.12));
        assert_eq!(round_amount(dec!(0.135)), dec!(0.14));
    }

    #[test]
    fn round_amount_never_reports_negative_zero() {
        assert_eq!(round_amount(dec!(-0.004)).to_string(), "0.00");
    }

    #[test]
    fn assemble_counts_and_names() {
        let banks = [
            Bank::new(BankId(1), "Alpha", ["UPI"]),
            Bank::new(BankId(2), "Beta", ["UPI"]),
        ];
        let txs = [
            Transaction::new(BankId(1), BankId(2), dec!(60)),
            Transaction::new(BankId(1), BankId(2), dec!(40)),
        ];
        let balances = NetBalances::aggregate(&banks, &txs);
        let transfers = [RawTransfer {
            from: BankId(1),
            to: BankId(2),
            amount: dec!(100),
        }];

        let result = SettlementResult::assemble(txs.len(), &transfers, &[], &balances, |id| {
            banks.iter().find(|b| b.id() == id).map(Bank::name)
        });

        assert_eq!(result.original_count, 2);
        assert_eq!(result.optimized_count, 1);
        assert_eq!(result.savings, 1);
        assert_eq!(result.settlements[0].from, "Alpha");
        assert_eq!(result.settlements[0].to, "Beta");
        assert_eq!(result.settlements[0].amount.to_string(), "100.00");
        assert_eq!(result.net_balances.len(), 2);
        assert!(result.unsettled.is_empty());
    }

    #[test]
    fn savings_can_be_negative() {
        let balances = NetBalances::new();
        let transfers = [
            RawTransfer {
                from: BankId(1),
                to: BankId(2),
                amount: dec!(1),
            },
            RawTransfer {
                from: BankId(1),
                to: BankId(3),
                amount: dec!(1),
            },
        ];
        let result = SettlementResult::assemble(1, &transfers, &[], &balances, |_| None);
        assert_eq!(result.savings, -1);
        assert_eq!(result.settlements[0].from, UNKNOWN_BANK_NAME);
    }

    #[test]
    fn serializes_camel_case_contract() {
        let balances = NetBalances::aggregate(
            &[Bank::new(BankId(1), "A", ["UPI"]), Bank::new(BankId(2), "B", ["UPI"])],
            &[Transaction::new(BankId(1), BankId(2), dec!(5))],
        );
        let transfers = [RawTransfer {
            from: BankId(1),
            to: BankId(2),
            amount: dec!(5),
        }];
        let result = SettlementResult::assemble(1, &transfers, &[], &balances, |_| Some("X"));

        let json: serde_json::Value = serde_json::to_value(&result).unwrap();
        assert_eq!(json["originalCount"], 1);
        assert_eq!(json["optimizedCount"], 1);
        assert_eq!(json["savings"], 0);
        assert_eq!(json["settlements"][0]["fromId"], 1);
        assert_eq!(json["settlements"][0]["toId"], 2);
        assert_eq!(json["settlements"][0]["amount"], "5.00");
        assert_eq!(json["netBalances"][0]["entityId"], 1);
        assert_eq!(json["netBalances"][0]["amount"], "-5.00");
        assert!(json.get("unsettled").is_none());
    }
}
