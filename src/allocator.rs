//! Expense allocation.
//!
//! Turns a roster and a snapshot of expense records into per-family paid and
//! owed totals. Pure: nothing here is retained between calls.

use crate::error::{EngineError, Result};
use crate::expense::{ExpenseRecord, SplitPolicy};
use crate::family::Roster;
use crate::money::Money;
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};

/// Running totals for one family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FamilyTally {
    /// Total the family paid out.
    pub paid: Money,

    /// Total of the shares the family consumed.
    pub owed: Money,
}

impl FamilyTally {
    pub fn new(paid: Money, owed: Money) -> Self {
        FamilyTally { paid, owed }
    }

    /// `paid - owed`. Positive means the group owes this family.
    pub fn net(&self) -> Money {
        self.paid - self.owed
    }
}

/// Per-family totals in a stable order.
///
/// Families appear in roster order, followed by any other family in the
/// order it was first mentioned by an expense.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tally {
    order: Vec<String>,
    entries: HashMap<String, FamilyTally>,
}

impl Tally {
    pub fn new() -> Self {
        Tally::default()
    }

    /// Admits `name` with zero totals if it is not already present.
    pub fn admit(&mut self, name: &str) -> &mut FamilyTally {
        if !self.entries.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.entries.entry(name.to_string()).or_default()
    }

    pub fn get(&self, name: &str) -> Option<&FamilyTally> {
        self.entries.get(name)
    }

    /// Iterates families in universe order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FamilyTally)> {
        self.order
            .iter()
            .filter_map(|name| self.entries.get(name).map(|t| (name.as_str(), t)))
    }

    /// Sum of every family's net balance.
    ///
    /// Close to zero unless some record had nobody to distribute its cost to.
    pub fn net_total(&self) -> Money {
        self.entries.values().map(FamilyTally::net).sum()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, FamilyTally)> for Tally {
    fn from_iter<I: IntoIterator<Item = (S, FamilyTally)>>(iter: I) -> Self {
        let mut tally = Tally::new();
        for (name, totals) in iter {
            let name = name.into();
            let entry = tally.admit(&name);
            entry.paid += totals.paid;
            entry.owed += totals.owed;
        }
        tally
    }
}

/// Computes paid and owed totals for every family in the universe.
///
/// The universe is the roster plus every payer and participant named by an
/// expense. The whole snapshot is validated before anything is tallied, so a
/// negative amount or headcount fails the computation without a partial
/// result. Records whose split has no divisor (no participants, or zero total
/// headcount) still credit the payer but distribute no owed share.
pub fn allocate(roster: &Roster, expenses: &[ExpenseRecord]) -> Result<Tally> {
    for expense in expenses {
        validate(expense)?;
    }

    let mut tally = Tally::new();
    for name in roster.names() {
        tally.admit(name);
    }
    for expense in expenses {
        tally.admit(&expense.payer);
        for family in expense.split.families() {
            tally.admit(family);
        }
    }

    for expense in expenses {
        tally.admit(&expense.payer).paid += expense.amount;

        match &expense.split {
            SplitPolicy::EqualByFamily(families) => {
                let n = families.len() as i64;
                if n == 0 {
                    warn!(
                        "Expense '{}' has no participants; {} paid {} with no owed share",
                        expense.item, expense.payer, expense.amount
                    );
                    continue;
                }
                let share = expense.amount.share(1, n);
                for family in families {
                    tally.admit(family).owed += share;
                }
            }
            SplitPolicy::ByHeadcount(counts) => {
                let total = headcount_total(counts).unwrap_or_default();
                if total == 0 {
                    warn!(
                        "Expense '{}' has zero total headcount; {} paid {} with no owed share",
                        expense.item, expense.payer, expense.amount
                    );
                    continue;
                }
                for (family, &count) in counts {
                    tally.admit(family).owed += expense.amount.share(count, total);
                }
            }
        }

        debug!(
            "Allocated '{}' ({}) paid by {}",
            expense.item, expense.amount, expense.payer
        );
    }

    Ok(tally)
}

fn validate(expense: &ExpenseRecord) -> Result<()> {
    if expense.amount.is_negative() {
        return Err(EngineError::validation(
            &expense.item,
            format!("negative amount {}", expense.amount),
        ));
    }
    if let SplitPolicy::ByHeadcount(counts) = &expense.split {
        if let Some((family, count)) = counts.iter().find(|(_, &count)| count < 0) {
            return Err(EngineError::validation(
                &expense.item,
                format!("negative headcount {} for {}", count, family),
            ));
        }
        if headcount_total(counts).is_none() {
            return Err(EngineError::validation(
                &expense.item,
                "total headcount overflows",
            ));
        }
    }
    Ok(())
}

/// Sum of all counts, or `None` on overflow.
fn headcount_total(counts: &BTreeMap<String, i64>) -> Option<i64> {
    counts
        .values()
        .try_fold(0i64, |total, &count| total.checked_add(count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn money(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    fn roster(pairs: &[(&str, u32)]) -> Roster {
        Roster::try_from_pairs(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn test_equal_split_between_two_families() {
        let expenses = vec![ExpenseRecord::new(
            "Dinner",
            money("100"),
            "A",
            SplitPolicy::equal(["A", "B"]),
        )];

        let tally = allocate(&roster(&[("A", 2), ("B", 2)]), &expenses).unwrap();
        let a = tally.get("A").unwrap();
        let b = tally.get("B").unwrap();
        assert_eq!(a.paid, money("100"));
        assert_eq!(a.owed, money("50"));
        assert_eq!(b.paid, Money::ZERO);
        assert_eq!(b.owed, money("50"));
        assert_eq!(a.net(), money("50"));
        assert_eq!(b.net(), money("-50"));
    }

    #[test]
    fn test_headcount_split_is_proportional() {
        let expenses = vec![ExpenseRecord::new(
            "Boat hire",
            money("120"),
            "A",
            SplitPolicy::headcount([("A", 1), ("B", 3)]),
        )];

        let tally = allocate(&roster(&[("A", 1), ("B", 3)]), &expenses).unwrap();
        assert_eq!(tally.get("A").unwrap().owed, money("30"));
        assert_eq!(tally.get("B").unwrap().owed, money("90"));
        assert_eq!(tally.get("A").unwrap().net(), money("90"));
    }

    #[test]
    fn test_headcount_may_be_below_roster_size() {
        let expenses = vec![ExpenseRecord::new(
            "Museum",
            money("60"),
            "B",
            SplitPolicy::headcount([("A", 1), ("B", 2)]),
        )];

        let tally = allocate(&roster(&[("A", 4), ("B", 4)]), &expenses).unwrap();
        assert_eq!(tally.get("A").unwrap().owed, money("20"));
        assert_eq!(tally.get("B").unwrap().owed, money("40"));
    }

    #[test]
    fn test_unknown_families_are_admitted() {
        let expenses = vec![ExpenseRecord::new(
            "Taxi",
            money("30"),
            "Guest",
            SplitPolicy::equal(["A", "Neighbour"]),
        )];

        let tally = allocate(&roster(&[("A", 2)]), &expenses).unwrap();
        let names: Vec<_> = tally.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["A", "Guest", "Neighbour"]);
        assert_eq!(tally.get("Guest").unwrap().paid, money("30"));
        assert_eq!(tally.get("Neighbour").unwrap().owed, money("15"));
    }

    #[test]
    fn test_roster_families_without_expenses_are_listed() {
        let tally = allocate(&roster(&[("A", 2), ("B", 1)]), &[]).unwrap();
        assert_eq!(tally.len(), 2);
        assert_eq!(*tally.get("B").unwrap(), FamilyTally::default());
    }

    #[test]
    fn test_empty_participants_credit_payer_only() {
        let expenses = vec![ExpenseRecord::new(
            "Tip",
            money("10"),
            "A",
            SplitPolicy::equal(Vec::<String>::new()),
        )];

        let tally = allocate(&roster(&[("A", 2)]), &expenses).unwrap();
        assert_eq!(tally.get("A").unwrap().paid, money("10"));
        assert_eq!(tally.get("A").unwrap().owed, Money::ZERO);
        assert_eq!(tally.net_total(), money("10"));
    }

    #[test]
    fn test_zero_headcount_credits_payer_only() {
        let expenses = vec![ExpenseRecord::new(
            "Snacks",
            money("8"),
            "B",
            SplitPolicy::headcount([("A", 0), ("B", 0)]),
        )];

        let tally = allocate(&roster(&[("A", 2), ("B", 2)]), &expenses).unwrap();
        assert_eq!(tally.get("B").unwrap().paid, money("8"));
        assert_eq!(tally.get("A").unwrap().owed, Money::ZERO);
        assert_eq!(tally.get("B").unwrap().owed, Money::ZERO);
    }

    #[test]
    fn test_negative_headcount_fails_without_partial_tally() {
        let expenses = vec![
            ExpenseRecord::new("Ok", money("10"), "A", SplitPolicy::equal(["A"])),
            ExpenseRecord::new(
                "Bad",
                money("10"),
                "A",
                SplitPolicy::headcount([("A", 2), ("B", -1)]),
            ),
        ];

        let err = allocate(&roster(&[("A", 2)]), &expenses).unwrap_err();
        assert!(matches!(err, EngineError::Validation { ref subject, .. } if subject == "Bad"));
    }

    #[test]
    fn test_headcount_total_overflow_is_a_validation_error() {
        let expenses = vec![ExpenseRecord::new(
            "Stadium",
            money("10"),
            "A",
            SplitPolicy::headcount([("A", i64::MAX), ("B", 1)]),
        )];

        let err = allocate(&roster(&[("A", 2)]), &expenses).unwrap_err();
        assert!(matches!(err, EngineError::Validation { ref subject, .. } if subject == "Stadium"));
    }

    #[test]
    fn test_large_amount_times_large_headcount_stays_bounded() {
        let amount = money("100000000000000");
        let expenses = vec![ExpenseRecord::new(
            "Festival",
            amount,
            "B",
            SplitPolicy::headcount([("A", 1_000_000_000_000_000), ("B", 1)]),
        )];

        let tally = allocate(&roster(&[("A", 2), ("B", 2)]), &expenses).unwrap();
        let a = tally.get("A").unwrap().owed;
        let b = tally.get("B").unwrap().owed;
        assert!(a <= amount);
        assert!((a + b - amount).abs() < money("0.0001"));
    }

    #[test]
    fn test_negative_amount_fails() {
        let expenses = vec![ExpenseRecord::new(
            "Refund",
            money("-10"),
            "A",
            SplitPolicy::equal(["A"]),
        )];
        assert!(allocate(&roster(&[("A", 2)]), &expenses).is_err());
    }

    #[test]
    fn test_thirds_conserve_within_tolerance() {
        let expenses = vec![ExpenseRecord::new(
            "Fuel",
            money("100"),
            "A",
            SplitPolicy::equal(["A", "B", "C"]),
        )];

        let tally = allocate(&Roster::new(), &expenses).unwrap();
        assert!(tally.net_total().abs() < money("0.000001"));
        assert_eq!(tally.get("B").unwrap().owed.to_string(), "33.33");
    }

    #[test]
    fn test_tally_from_pairs_merges_duplicates() {
        let tally: Tally = [
            ("A", FamilyTally::new(money("10"), Money::ZERO)),
            ("A", FamilyTally::new(money("5"), money("1"))),
        ]
        .into_iter()
        .collect();

        assert_eq!(tally.len(), 1);
        assert_eq!(tally.get("A").unwrap().net(), money("14"));
    }
}
