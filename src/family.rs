//! Family roster.

use crate::error::{EngineError, Result};
use csv::{ReaderBuilder, Trim};
use log::{debug, warn};
use serde::Deserialize;
use std::io::Read;

/// A participating household.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Family {
    /// Unique family name.
    pub name: String,

    /// Number of members, always at least one.
    pub size: u32,
}

/// Raw roster row as read from CSV.
#[derive(Debug, Deserialize)]
struct FamilyRecord {
    family: String,
    size: String,
}

/// Ordered set of families keyed by name.
///
/// Insertion order is kept so balance reports list families the way the
/// roster declares them.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    families: Vec<Family>,
}

impl Roster {
    pub fn new() -> Self {
        Roster::default()
    }

    /// Adds a family to the roster.
    ///
    /// Fails if the name is empty or already present, or if `size` is zero.
    pub fn insert(&mut self, name: impl Into<String>, size: u32) -> Result<()> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(EngineError::validation("roster", "family name is empty"));
        }
        if size == 0 {
            return Err(EngineError::validation(name, "family size must be positive"));
        }
        if self.contains(&name) {
            return Err(EngineError::validation(name, "duplicate family name"));
        }
        self.families.push(Family { name, size });
        Ok(())
    }

    /// Builds a roster from `(name, size)` pairs.
    pub fn try_from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let mut roster = Roster::new();
        for (name, size) in pairs {
            roster.insert(name, size)?;
        }
        Ok(roster)
    }

    /// Reads a `family,size` CSV.
    ///
    /// Invalid rows are logged at warn level and skipped.
    pub fn from_csv<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut roster = Roster::new();
        for (row_idx, result) in csv_reader.deserialize::<FamilyRecord>().enumerate() {
            let row_num = row_idx + 2;

            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    warn!("Roster row {}: CSV parse error: {}", row_num, e);
                    continue;
                }
            };

            let size = match record.size.parse::<u32>() {
                Ok(size) => size,
                Err(_) => {
                    warn!(
                        "Roster row {}: Invalid size '{}' for {}",
                        row_num, record.size, record.family
                    );
                    continue;
                }
            };

            match roster.insert(record.family, size) {
                Ok(()) => debug!("Roster row {}: Added family of {}", row_num, size),
                Err(e) => warn!("Roster row {}: {}", row_num, e),
            }
        }

        Ok(roster)
    }

    /// Returns the configured member count for `name`.
    pub fn size(&self, name: &str) -> Option<u32> {
        self.families
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.size)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.families.iter().any(|f| f.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.families.iter().map(|f| f.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Family> {
        self.families.iter()
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}
