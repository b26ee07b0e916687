//! Execution schedule vectors.
//!
//! A schedule alternates between sibling-order counters and loop iterators:
//! `[2, i, 0, j, 0]` is "the first statement inside loop `j`, inside loop
//! `i`, which is the third item at the top level".

use crate::utils::errors::{BuildError, BuildResult};
use serde::{Serialize, Deserialize};
use std::cmp::Ordering;
use std::fmt;

/// One dimension of a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScheduleEntry {
    /// An active loop iterator
    Symbolic(String),
    /// Position among siblings at one nesting level
    Literal(i64),
}

impl fmt::Display for ScheduleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleEntry::Symbolic(name) => write!(f, "{}", name),
            ScheduleEntry::Literal(value) => write!(f, "{}", value),
        }
    }
}

/// The in-progress schedule of the statement being visited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleVector {
    entries: Vec<ScheduleEntry>,
}

impl ScheduleVector {
    /// An empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a schedule from explicit entries.
    pub fn from_entries(entries: Vec<ScheduleEntry>) -> Self {
        Self { entries }
    }

    /// Move to the next sibling, opening a counter for a new level if needed.
    pub fn advance(&mut self) {
        match self.entries.last_mut() {
            Some(ScheduleEntry::Literal(n)) => *n += 1,
            _ => self.entries.push(ScheduleEntry::Literal(0)),
        }
    }

    /// Add the dimension of a loop being entered.
    pub fn enter_loop(&mut self, iterator: impl Into<String>) {
        self.entries.push(ScheduleEntry::Symbolic(iterator.into()));
    }

    /// Drop the loop dimension and the counter that was active inside it.
    pub fn exit_loop(&mut self) -> BuildResult<()> {
        if self.entries.len() < 2 {
            return Err(BuildError::internal(format!(
                "cannot exit a loop from a schedule of dimension {}",
                self.entries.len()
            )));
        }
        self.entries.truncate(self.entries.len() - 2);
        Ok(())
    }

    /// Number of dimensions.
    pub fn dimension(&self) -> usize {
        self.entries.len()
    }

    /// Append zero counters up to `target` dimensions.
    pub fn zero_pad(&mut self, target: usize) -> BuildResult<()> {
        if target < self.entries.len() {
            return Err(BuildError::internal(format!(
                "cannot pad a schedule of dimension {} down to {}",
                self.entries.len(),
                target
            )));
        }
        self.entries.resize(target, ScheduleEntry::Literal(0));
        Ok(())
    }

    /// The entries, outermost first.
    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    /// Order two schedules by their literal dimensions.
    ///
    /// Matching iterator dimensions are skipped. Returns `None` once two
    /// different iterators, or an iterator and a counter, meet before any
    /// counter differs: such schedules are only ordered by loop bounds.
    pub fn compare_literal_prefix(&self, other: &ScheduleVector) -> Option<Ordering> {
        for (a, b) in self.entries.iter().zip(other.entries.iter()) {
            match (a, b) {
                (ScheduleEntry::Literal(x), ScheduleEntry::Literal(y)) => {
                    if x != y {
                        return Some(x.cmp(y));
                    }
                }
                (ScheduleEntry::Symbolic(x), ScheduleEntry::Symbolic(y)) if x == y => {}
                _ => return None,
            }
        }
        Some(self.entries.len().cmp(&other.entries.len()))
    }
}

impl fmt::Display for ScheduleVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (n, entry) in self.entries.iter().enumerate() {
            if n > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", entry)?;
        }
        write!(f, "]")
    }
}
