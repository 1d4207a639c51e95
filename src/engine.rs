//! In-memory expense store around the allocator and planner.
//!
//! The engine owns the roster and the current expense list. Every balance or
//! plan request hands a fresh snapshot to the pure [`allocate`] and
//! [`plan_settlements`] functions; nothing derived is cached.

use crate::allocator::{allocate, Tally};
use crate::error::Result;
use crate::expense::{ExpenseRecord, ExpenseRow};
use crate::family::Roster;
use crate::money::Money;
use crate::report::{write_log_csv, write_plan_csv, BalanceReport};
use crate::settlement::{plan_settlements, Transfer};
use csv::{ReaderBuilder, Trim};
use log::{debug, warn};
use std::io::{Read, Write};

/// Expense store for one roster.
pub struct TallyEngine {
    roster: Roster,

    expenses: Vec<ExpenseRecord>,

    /// Tolerance under which a balance counts as settled.
    epsilon: Money,
}

impl TallyEngine {
    pub fn new(roster: Roster) -> Self {
        TallyEngine {
            roster,
            expenses: Vec::new(),
            epsilon: Money::DEFAULT_EPSILON,
        }
    }

    pub fn with_epsilon(mut self, epsilon: Money) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Loads expense rows from CSV in streaming fashion.
    ///
    /// When `session` is set, rows from other sessions are skipped. Invalid
    /// rows are logged at warn level and skipped. Returns the number of
    /// records added.
    pub fn process_csv<R: Read>(&mut self, reader: R, session: Option<&str>) -> Result<usize> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut added = 0;
        for (row_idx, result) in csv_reader.deserialize::<ExpenseRow>().enumerate() {
            let row_num = row_idx + 2; // 1-indexed, accounting for header row

            let row = match result {
                Ok(row) => row,
                Err(e) => {
                    warn!("Row {}: CSV parse error: {}", row_num, e);
                    continue;
                }
            };

            match row.parse(row_num, &self.roster) {
                Ok(record) => {
                    if let Some(wanted) = session {
                        if record.session != wanted {
                            debug!(
                                "Row {}: Skipping expense from session '{}'",
                                row_num, record.session
                            );
                            continue;
                        }
                    }
                    debug!(
                        "Row {}: Loaded '{}' ({}) paid by {}",
                        row_num, record.item, record.amount, record.payer
                    );
                    self.expenses.push(record);
                    added += 1;
                }
                Err(e) => warn!("{}", e),
            }
        }

        Ok(added)
    }

    pub fn add_expense(&mut self, record: ExpenseRecord) {
        self.expenses.push(record);
    }

    /// Removes and returns the expense at `index`.
    pub fn remove_expense(&mut self, index: usize) -> Option<ExpenseRecord> {
        if index < self.expenses.len() {
            Some(self.expenses.remove(index))
        } else {
            None
        }
    }

    /// Appends the settlement record for a confirmed transfer.
    pub fn record_settlement(&mut self, transfer: &Transfer, session: &str) {
        debug!(
            "Recording settlement {} -> {} of {}",
            transfer.debtor, transfer.creditor, transfer.amount
        );
        self.expenses.push(transfer.to_record(session));
    }

    /// Drops every settlement record. Returns how many were removed.
    pub fn revert_settlements(&mut self) -> usize {
        let before = self.expenses.len();
        self.expenses.retain(|e| !e.is_settlement());
        before - self.expenses.len()
    }

    pub fn expenses(&self) -> &[ExpenseRecord] {
        &self.expenses
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn epsilon(&self) -> Money {
        self.epsilon
    }

    pub fn tally(&self) -> Result<Tally> {
        allocate(&self.roster, &self.expenses)
    }

    pub fn balances(&self) -> Result<BalanceReport> {
        Ok(BalanceReport::from_tally(&self.tally()?, self.epsilon))
    }

    pub fn plan(&self) -> Result<Vec<Transfer>> {
        Ok(plan_settlements(&self.tally()?, self.epsilon))
    }

    pub fn write_balances<W: Write>(&self, writer: W) -> Result<()> {
        self.balances()?.write_csv(writer)
    }

    pub fn write_plan<W: Write>(&self, writer: W) -> Result<()> {
        write_plan_csv(&self.plan()?, writer)
    }

    /// Writes the records the next computation will tally.
    pub fn write_log<W: Write>(&self, writer: W) -> Result<()> {
        write_log_csv(&self.expenses, writer)
    }
}
