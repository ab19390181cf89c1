//! Formula storage
//!
//! The engine only ever reads formulas through the [`FormulaStore`] seam;
//! the production repository (organisation-scoped database rows) lives
//! behind it. [`MemoryFormulaStore`] is the in-process implementation used
//! by tests and by callers that already hold an organisation's formulas.

use crate::error::StoreError;
use crate::validator;
use ahash::AHashMap;
use metron_core::{Formula, FormulaId, TokenDescriptor, UnitId};

/// Read access to stored formulas
///
/// Fetches return an owned snapshot: the evaluator works on immutable data
/// for the duration of one call, whatever the backing store does meanwhile.
pub trait FormulaStore {
    fn formula(&self, id: FormulaId) -> Option<Formula>;
}

/// In-memory formula repository
///
/// Mirrors the backing store's contract: create validates before anything
/// is persisted, names are unique, and a formula still referenced by
/// another one cannot be deleted.
#[derive(Debug, Default)]
pub struct MemoryFormulaStore {
    formulas: AHashMap<FormulaId, Formula>,
    next_id: u64,
}

impl MemoryFormulaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a descriptor sequence and persist it as a new formula
    ///
    /// Validation failure persists nothing. Whether the referenced
    /// parameter/formula/unit ids belong to the organisation is the
    /// authorization layer's check, not this one's.
    pub fn create(
        &mut self,
        name: impl Into<String>,
        unit_id: Option<UnitId>,
        descriptors: &[TokenDescriptor],
    ) -> Result<FormulaId, StoreError> {
        let name = name.into();
        if self.formulas.values().any(|f| f.name == name) {
            return Err(StoreError::DuplicateName(name));
        }

        let tokens = validator::validate(descriptors)?;
        let id = FormulaId(self.next_id + 1);
        let formula = Formula::new(id, name, unit_id, tokens)?;

        self.next_id += 1;
        self.formulas.insert(id, formula);
        Ok(id)
    }

    pub fn get(&self, id: FormulaId) -> Option<&Formula> {
        self.formulas.get(&id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Formula> {
        self.formulas.values().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.formulas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formulas.is_empty()
    }

    /// Delete a formula, cascading to its tokens
    ///
    /// Rejected while any other stored formula still references it.
    pub fn delete(&mut self, id: FormulaId) -> Result<Formula, StoreError> {
        if let Some(referrer) = self
            .formulas
            .values()
            .find(|f| f.id != id && f.references(id))
        {
            return Err(StoreError::StillReferenced(id, referrer.id));
        }
        self.formulas
            .remove(&id)
            .ok_or(StoreError::UnknownFormula(id))
    }
}

impl FormulaStore for MemoryFormulaStore {
    fn formula(&self, id: FormulaId) -> Option<Formula> {
        self.formulas.get(&id).cloned()
    }
}
