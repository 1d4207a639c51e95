//! Settlement planning.
//!
//! Greedy largest-first matching of debtors to creditors. The plan is not
//! guaranteed to be the global minimum number of transfers, but it discharges
//! every balance and never needs more than `debtors + creditors - 1`
//! transfers.

use crate::allocator::Tally;
use crate::expense::ExpenseRecord;
use crate::money::Money;
use log::debug;
use serde::Serialize;
use std::cmp::Ordering;

/// A proposed payment from a family that owes to a family that is owed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transfer {
    pub debtor: String,
    pub creditor: String,
    pub amount: Money,
}

impl Transfer {
    pub fn new(debtor: impl Into<String>, creditor: impl Into<String>, amount: Money) -> Self {
        Transfer {
            debtor: debtor.into(),
            creditor: creditor.into(),
            amount,
        }
    }

    /// The expense record that registers this transfer as paid.
    pub fn to_record(&self, session: &str) -> ExpenseRecord {
        ExpenseRecord::settlement(session, &self.debtor, &self.creditor, self.amount)
    }
}

struct Position<'a> {
    family: &'a str,
    remaining: Money,
}

fn largest_first(a: &Position<'_>, b: &Position<'_>) -> Ordering {
    b.remaining.cmp(&a.remaining)
}

// The zero check keeps the sweep moving when `epsilon` is zero.
fn is_discharged(remaining: Money, epsilon: Money) -> bool {
    remaining < epsilon || remaining.is_zero()
}

/// Plans transfers that bring every net balance within `epsilon` of zero.
///
/// Transfers are returned in sweep order, largest debtor against largest
/// creditor first. Families with equal magnitudes keep their tally order.
pub fn plan_settlements(tally: &Tally, epsilon: Money) -> Vec<Transfer> {
    let mut debtors = Vec::new();
    let mut creditors = Vec::new();

    for (family, totals) in tally.iter() {
        let net = totals.net();
        if net < -epsilon {
            debtors.push(Position {
                family,
                remaining: net.abs(),
            });
        } else if net > epsilon {
            creditors.push(Position {
                family,
                remaining: net,
            });
        }
    }

    // `sort_by` is stable, so ties stay in tally order.
    debtors.sort_by(largest_first);
    creditors.sort_by(largest_first);

    let mut transfers = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < debtors.len() && j < creditors.len() {
        let amount = debtors[i].remaining.min(creditors[j].remaining);

        if amount > epsilon {
            debug!(
                "{} pays {} to {}",
                debtors[i].family, amount, creditors[j].family
            );
            transfers.push(Transfer::new(
                debtors[i].family,
                creditors[j].family,
                amount,
            ));
        }

        debtors[i].remaining -= amount;
        creditors[j].remaining -= amount;

        if is_discharged(debtors[i].remaining, epsilon) {
            i += 1;
        }
        if is_discharged(creditors[j].remaining, epsilon) {
            j += 1;
        }
    }

    transfers
}
