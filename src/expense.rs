//! Expense records and the CSV ingestion boundary.
//!
//! Raw rows are normalised into a single typed [`ExpenseRecord`] before the
//! allocator sees them: the split policy is resolved once, and every
//! headcount is reduced to a plain integer count.

use crate::error::{EngineError, Result};
use crate::family::Roster;
use crate::money::Money;
use log::warn;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

/// Reserved item prefix marking a record as a past settlement transfer.
pub const SETTLEMENT_MARKER: &str = "[settlement]";

/// Separator between participant entries in the CSV `participants` column.
const PARTICIPANT_SEPARATOR: char = ';';

/// How the cost of an expense is distributed among participants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitPolicy {
    /// Every participating family owes the same share.
    EqualByFamily(BTreeSet<String>),

    /// Each family owes in proportion to how many of its members attended.
    ByHeadcount(BTreeMap<String, i64>),
}

impl SplitPolicy {
    /// Equal split between the given families. Duplicates collapse.
    pub fn equal<I, S>(families: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SplitPolicy::EqualByFamily(families.into_iter().map(Into::into).collect())
    }

    /// Headcount split. A repeated family keeps its last count.
    pub fn headcount<I, S>(counts: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        SplitPolicy::ByHeadcount(
            counts
                .into_iter()
                .map(|(name, count)| (name.into(), count))
                .collect(),
        )
    }

    /// Short name used in the `split` CSV column.
    pub fn label(&self) -> &'static str {
        match self {
            SplitPolicy::EqualByFamily(_) => "equal",
            SplitPolicy::ByHeadcount(_) => "headcount",
        }
    }

    /// Participants in the `participants` CSV column format.
    pub fn participants_label(&self) -> String {
        match self {
            SplitPolicy::EqualByFamily(families) => {
                families.iter().cloned().collect::<Vec<_>>().join(";")
            }
            SplitPolicy::ByHeadcount(counts) => counts
                .iter()
                .map(|(name, count)| format!("{}:{}", name, count))
                .collect::<Vec<_>>()
                .join(";"),
        }
    }

    /// Families named by this policy, in sorted order.
    pub fn families(&self) -> Vec<&str> {
        match self {
            SplitPolicy::EqualByFamily(families) => families.iter().map(String::as_str).collect(),
            SplitPolicy::ByHeadcount(counts) => counts.keys().map(String::as_str).collect(),
        }
    }
}

/// A single shared expense.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseRecord {
    /// Occasion the expense belongs to. Opaque to the allocator.
    pub session: String,

    /// Free-form label; may carry [`SETTLEMENT_MARKER`].
    pub item: String,

    /// Non-negative amount paid.
    pub amount: Money,

    /// Family that paid.
    pub payer: String,

    pub split: SplitPolicy,
}

impl ExpenseRecord {
    pub fn new(
        item: impl Into<String>,
        amount: Money,
        payer: impl Into<String>,
        split: SplitPolicy,
    ) -> Self {
        ExpenseRecord {
            session: String::new(),
            item: item.into(),
            amount,
            payer: payer.into(),
            split,
        }
    }

    pub fn with_session(mut self, session: impl Into<String>) -> Self {
        self.session = session.into();
        self
    }

    /// Builds the record that registers a transfer from `debtor` to `creditor`.
    ///
    /// The debtor pays and the creditor is the sole participant, so the pair's
    /// imbalance cancels on the next allocation.
    pub fn settlement(
        session: impl Into<String>,
        debtor: impl Into<String>,
        creditor: impl Into<String>,
        amount: Money,
    ) -> Self {
        let debtor = debtor.into();
        let creditor = creditor.into();
        ExpenseRecord {
            session: session.into(),
            item: format!("{} {} -> {}", SETTLEMENT_MARKER, debtor, creditor),
            amount,
            split: SplitPolicy::equal([creditor]),
            payer: debtor,
        }
    }

    pub fn is_settlement(&self) -> bool {
        self.item.trim_start().starts_with(SETTLEMENT_MARKER)
    }
}

/// Raw expense row as read from CSV.
///
/// Columns: `session,item,amount,payer,split,participants`.
#[derive(Debug, Deserialize)]
pub struct ExpenseRow {
    #[serde(default)]
    pub session: Option<String>,

    pub item: String,

    pub amount: Money,

    pub payer: String,

    /// `equal` or `headcount`, plus the long labels older exports used.
    pub split: String,

    /// `;`-separated participant entries.
    #[serde(default)]
    pub participants: Option<String>,
}

enum SplitKind {
    Equal,
    Headcount,
}

impl SplitKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "equal" | "family" | "by family" | "by family (equal)" => Some(SplitKind::Equal),
            "headcount" | "people" | "by people" | "by number of people" => {
                Some(SplitKind::Headcount)
            }
            _ => None,
        }
    }
}

impl ExpenseRow {
    /// Resolves the row into a typed record.
    ///
    /// Headcount entries take one of three shapes:
    /// - `Family:3` - an explicit count
    /// - `Family:Ann,Bob` - a list of attending member names, counted
    /// - `Family` - the whole family, sized from the roster
    pub fn parse(&self, row: usize, roster: &Roster) -> Result<ExpenseRecord> {
        let invalid = |message: String| EngineError::InvalidRecord { row, message };

        let payer = self.payer.trim();
        if payer.is_empty() {
            return Err(invalid("payer is empty".to_string()));
        }

        let amount = self.amount;
        if amount.is_negative() {
            return Err(invalid(format!("negative amount {}", amount)));
        }

        let kind = SplitKind::parse(&self.split)
            .ok_or_else(|| invalid(format!("unknown split '{}'", self.split)))?;

        let raw_participants = self.participants.as_deref().unwrap_or("");
        let entries = raw_participants
            .split(PARTICIPANT_SEPARATOR)
            .map(str::trim)
            .filter(|e| !e.is_empty());

        let split = match kind {
            SplitKind::Equal => SplitPolicy::equal(entries),
            SplitKind::Headcount => {
                let mut counts = BTreeMap::new();
                for entry in entries {
                    let (name, count) = parse_headcount_entry(entry, row, roster)?;
                    if counts.contains_key(&name) {
                        return Err(invalid(format!("{} is listed more than once", name)));
                    }
                    counts.insert(name, count);
                }
                SplitPolicy::ByHeadcount(counts)
            }
        };

        Ok(ExpenseRecord {
            session: self
                .session
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            item: self.item.trim().to_string(),
            amount,
            payer: payer.to_string(),
            split,
        })
    }
}

fn parse_headcount_entry(entry: &str, row: usize, roster: &Roster) -> Result<(String, i64)> {
    let invalid = |message: String| EngineError::InvalidRecord { row, message };

    let (name, count) = match entry.split_once(':') {
        Some((name, spec)) => {
            let spec = spec.trim();
            let count = match spec.parse::<i64>() {
                Ok(count) => count,
                Err(_) if Money::from_str(spec).is_ok() => {
                    return Err(invalid(format!(
                        "headcount {} for {} is not a whole number",
                        spec,
                        name.trim()
                    )));
                }
                Err(_) => spec
                    .split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .count() as i64,
            };
            (name.trim(), count)
        }
        None => match roster.size(entry) {
            Some(size) => (entry, i64::from(size)),
            None => {
                warn!(
                    "Row {}: No roster size for {}, counting 0 attendees",
                    row, entry
                );
                (entry, 0)
            }
        },
    };

    if name.is_empty() {
        return Err(invalid(format!("headcount entry '{}' has no family", entry)));
    }
    if count < 0 {
        return Err(invalid(format!("negative headcount {} for {}", count, name)));
    }

    Ok((name.to_string(), count))
}
