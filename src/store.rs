//! Persistence boundary.
//!
//! The engine reads a whole [`Dataset`] once per run and writes back in a
//! single batch. [`AllocationStore`] is the seam a database-backed store
//! implements; [`MemoryStore`] is the in-process reference used by tests
//! and embedders.
//!
//! Every write keeps each row's `assigned` flag in step with its
//! assignment record.

use tracing::debug;

use crate::config::Weights;
use crate::error::StoreError;
use crate::models::{Assignment, Dataset, UnitKey};

/// A new `(person, unit)` link to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAssignment {
    pub person: String,
    pub unit: UnitKey,
}

impl NewAssignment {
    pub fn new(person: impl Into<String>, unit: UnitKey) -> Self {
        Self {
            person: person.into(),
            unit,
        }
    }
}

/// Storage operations the engine needs.
pub trait AllocationStore {
    /// Reads every record the engine uses.
    fn load(&self) -> Result<Dataset, StoreError>;

    /// Reads the weights singleton, defaulting any missing field.
    fn weights(&self) -> Result<Weights, StoreError>;

    fn set_weights(&mut self, weights: Weights) -> Result<(), StoreError>;

    /// Deletes every assignment and clears every `assigned` flag.
    fn clear_assignments(&mut self) -> Result<(), StoreError>;

    /// Writes a batch of links atomically.
    ///
    /// The batch is checked in full before anything is written. A unit
    /// with any row already taken is skipped whole. Returns the number of
    /// assignment records created.
    fn commit(&mut self, batch: &[NewAssignment]) -> Result<usize, StoreError>;

    /// Deletes every assignment and writes `batch` in its place, as one
    /// atomic write.
    ///
    /// The batch is checked before the clear; a rejected batch leaves the
    /// existing assignments untouched.
    fn replace_all(&mut self, batch: &[NewAssignment]) -> Result<usize, StoreError>;

    /// Gives every row of `unit` to `person`, replacing earlier holders.
    fn replace_group(&mut self, person: &str, unit: &UnitKey) -> Result<usize, StoreError>;

    /// Removes every assignment of `unit`. Returns the number removed.
    fn remove_group(&mut self, unit: &UnitKey) -> Result<usize, StoreError>;
}

/// Store backed by an in-memory [`Dataset`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Dataset,
    weights: Weights,
}

impl MemoryStore {
    pub fn new(data: Dataset) -> Self {
        Self {
            data,
            weights: Weights::default(),
        }
    }

    pub fn with_weights(mut self, weights: Weights) -> Self {
        self.weights = weights;
        self
    }

    /// The stored records.
    pub fn dataset(&self) -> &Dataset {
        &self.data
    }

    fn unit_rows(&self, unit: &UnitKey) -> Result<Vec<usize>, StoreError> {
        let rows: Vec<usize> = self
            .data
            .sessions
            .iter()
            .enumerate()
            .filter(|(_, s)| s.course == unit.course && s.group == unit.group)
            .map(|(i, _)| i)
            .collect();
        if rows.is_empty() {
            return Err(StoreError::UnknownUnit(unit.clone()));
        }
        Ok(rows)
    }

    fn ensure_person(&self, person: &str) -> Result<(), StoreError> {
        match self.data.person(person) {
            Some(_) => Ok(()),
            None => Err(StoreError::UnknownPerson(person.to_string())),
        }
    }

    /// Resolves every link to its rows without writing anything.
    fn plan<'b>(&self, batch: &'b [NewAssignment]) -> Result<Vec<(&'b str, Vec<usize>)>, StoreError> {
        let mut planned = Vec::with_capacity(batch.len());
        for link in batch {
            self.ensure_person(&link.person)?;
            planned.push((link.person.as_str(), self.unit_rows(&link.unit)?));
        }
        Ok(planned)
    }

    fn apply(&mut self, planned: Vec<(&str, Vec<usize>)>) -> usize {
        let mut created = 0;
        for (person, rows) in planned {
            let taken = rows.iter().any(|&r| {
                let session = &self.data.sessions[r];
                session.assigned || self.data.assignment_for(&session.id).is_some()
            });
            if taken {
                continue;
            }
            for r in rows {
                let session = &mut self.data.sessions[r];
                session.assigned = true;
                self.data
                    .assignments
                    .push(Assignment::new(session.id.clone(), person));
                created += 1;
            }
        }
        created
    }

    fn drop_rows(&mut self, rows: &[usize]) -> usize {
        let ids: Vec<String> = rows.iter().map(|&r| self.data.sessions[r].id.clone()).collect();
        let before = self.data.assignments.len();
        self.data.assignments.retain(|a| !ids.contains(&a.session));
        for &r in rows {
            self.data.sessions[r].assigned = false;
        }
        before - self.data.assignments.len()
    }
}

impl AllocationStore for MemoryStore {
    fn load(&self) -> Result<Dataset, StoreError> {
        Ok(self.data.clone())
    }

    fn weights(&self) -> Result<Weights, StoreError> {
        Ok(self.weights.clone())
    }

    fn set_weights(&mut self, weights: Weights) -> Result<(), StoreError> {
        self.weights = weights;
        Ok(())
    }

    fn clear_assignments(&mut self) -> Result<(), StoreError> {
        let removed = self.data.assignments.len();
        self.data.assignments.clear();
        for session in &mut self.data.sessions {
            session.assigned = false;
        }
        debug!(removed, "Cleared assignments");
        Ok(())
    }

    fn commit(&mut self, batch: &[NewAssignment]) -> Result<usize, StoreError> {
        let planned = self.plan(batch)?;
        let created = self.apply(planned);
        debug!(links = batch.len(), created, "Committed assignments");
        Ok(created)
    }

    fn replace_all(&mut self, batch: &[NewAssignment]) -> Result<usize, StoreError> {
        let planned = self.plan(batch)?;
        self.clear_assignments()?;
        let created = self.apply(planned);
        debug!(links = batch.len(), created, "Replaced all assignments");
        Ok(created)
    }

    fn replace_group(&mut self, person: &str, unit: &UnitKey) -> Result<usize, StoreError> {
        self.ensure_person(person)?;
        let rows = self.unit_rows(unit)?;
        self.drop_rows(&rows);
        for &r in &rows {
            let session = &mut self.data.sessions[r];
            session.assigned = true;
            self.data
                .assignments
                .push(Assignment::new(session.id.clone(), person));
        }
        debug!(person, %unit, rows = rows.len(), "Replaced group assignment");
        Ok(rows.len())
    }

    fn remove_group(&mut self, unit: &UnitKey) -> Result<usize, StoreError> {
        let rows = self.unit_rows(unit)?;
        let removed = self.drop_rows(&rows);
        debug!(%unit, removed, "Removed group assignment");
        Ok(removed)
    }
}
