//! # Family Tally
//!
//! Splits shared expenses between families and plans the transfers that
//! settle every balance.
//!
//! ## Design Principles
//!
//! - **Full-precision accumulation**: shares are summed with `rust_decimal`
//!   and rounded to cents only when reported
//! - **Pure core**: [`allocate`] and [`plan_settlements`] work on snapshots
//!   and keep no state between calls
//! - **Order independence**: balances do not depend on expense order
//! - **Deterministic plans**: largest debtor against largest creditor, ties in
//!   roster order
//!
//! ## Example
//!
//! ```
//! use family_tally::{allocate, plan_settlements, ExpenseRecord, Money, Roster, SplitPolicy};
//!
//! let roster = Roster::try_from_pairs([("A", 2), ("B", 2)]).unwrap();
//! let expenses = vec![ExpenseRecord::new(
//!     "Dinner",
//!     Money::from_i64(100),
//!     "A",
//!     SplitPolicy::equal(["A", "B"]),
//! )];
//!
//! let tally = allocate(&roster, &expenses).unwrap();
//! let plan = plan_settlements(&tally, Money::DEFAULT_EPSILON);
//! assert_eq!(plan[0].debtor, "B");
//! assert_eq!(plan[0].amount.to_string(), "50.00");
//! ```

pub mod allocator;
pub mod config;
pub mod engine;
pub mod error;
pub mod expense;
pub mod family;
pub mod money;
pub mod report;
pub mod settlement;

pub use allocator::{allocate, FamilyTally, Tally};
pub use config::Config;
pub use engine::TallyEngine;
pub use error::{EngineError, Result};
pub use expense::{ExpenseRecord, ExpenseRow, SplitPolicy, SETTLEMENT_MARKER};
pub use family::{Family, Roster};
pub use money::Money;
pub use report::{write_log_csv, write_plan_csv, BalanceReport, BalanceRow, Status};
pub use settlement::{plan_settlements, Transfer};
