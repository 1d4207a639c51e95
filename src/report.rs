//! Balance report and CSV output.
//!
//! All amounts are rounded to cents here and nowhere earlier.

use crate::allocator::Tally;
use crate::error::Result;
use crate::expense::ExpenseRecord;
use crate::money::Money;
use crate::settlement::Transfer;
use serde::Serialize;
use std::fmt;
use std::io::Write;

/// Where a family stands once everything is netted out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    #[serde(rename = "Settled")]
    Settled,
    #[serde(rename = "To Receive")]
    ToReceive,
    #[serde(rename = "To Pay")]
    ToPay,
}

impl Status {
    /// Classifies `net`; anything within `epsilon` of zero is settled.
    pub fn from_net(net: Money, epsilon: Money) -> Self {
        if net > epsilon {
            Status::ToReceive
        } else if net < -epsilon {
            Status::ToPay
        } else {
            Status::Settled
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Status::Settled => "Settled",
            Status::ToReceive => "To Receive",
            Status::ToPay => "To Pay",
        };
        f.write_str(label)
    }
}

/// One line of the balance report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceRow {
    pub family: String,
    pub paid: Money,
    pub owed: Money,
    pub net: Money,
    pub status: Status,
}

/// Balances for every family, in tally order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalanceReport {
    rows: Vec<BalanceRow>,
}

impl BalanceReport {
    pub fn from_tally(tally: &Tally, epsilon: Money) -> Self {
        let rows = tally
            .iter()
            .map(|(family, totals)| {
                let net = totals.net();
                BalanceRow {
                    family: family.to_string(),
                    paid: totals.paid,
                    owed: totals.owed,
                    net,
                    status: Status::from_net(net, epsilon),
                }
            })
            .collect();
        BalanceReport { rows }
    }

    pub fn rows(&self) -> &[BalanceRow] {
        &self.rows
    }

    pub fn get(&self, family: &str) -> Option<&BalanceRow> {
        self.rows.iter().find(|r| r.family == family)
    }

    /// Sum of all net balances at full precision.
    pub fn net_total(&self) -> Money {
        self.rows.iter().map(|r| r.net).sum()
    }

    /// Writes `family,paid,owed,net,status` rows.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        if self.rows.is_empty() {
            csv_writer.write_record(["family", "paid", "owed", "net", "status"])?;
        }
        for row in &self.rows {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

#[derive(Serialize)]
struct LogRow<'a> {
    session: &'a str,
    item: &'a str,
    amount: Money,
    payer: &'a str,
    split: &'static str,
    participants: String,
}

/// Writes the expense log in the same column layout the expenses are read from.
pub fn write_log_csv<W: Write>(expenses: &[ExpenseRecord], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if expenses.is_empty() {
        csv_writer.write_record(["session", "item", "amount", "payer", "split", "participants"])?;
    }
    for expense in expenses {
        csv_writer.serialize(LogRow {
            session: &expense.session,
            item: &expense.item,
            amount: expense.amount,
            payer: &expense.payer,
            split: expense.split.label(),
            participants: expense.split.participants_label(),
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Writes `debtor,creditor,amount` rows in plan order.
pub fn write_plan_csv<W: Write>(transfers: &[Transfer], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if transfers.is_empty() {
        csv_writer.write_record(["debtor", "creditor", "amount"])?;
    }
    for transfer in transfers {
        csv_writer.serialize(transfer)?;
    }
    csv_writer.flush()?;
    Ok(())
}
