//! # Element Store
//!
//! The compiler never talks to a live model. It reads an [`ElementStore`]: an
//! immutable snapshot that enumerates elements and the named entities they
//! relate to.
//!
//! ## Contract
//!
//! - Enumeration order is stable for an unchanged snapshot. Compiling the same
//!   spec twice against it yields filters that agree on every element.
//! - [`ElementStore::phases`] is returned in phase sequence order; phase status
//!   filters rely on it.
//! - Element types are elements with `is_element_type` set.
//!
//! If the underlying model can change while filters are evaluated, hand the
//! compiler a fresh snapshot instead of a live view.
//!
//! ## Implementations
//!
//! - [`memory::MemoryStore`]: an owned, in-memory snapshot. Used by tests and
//!   by callers that materialise a model export.

use crate::model::{Element, ElementId, FamilyInfo, LevelInfo, NamedEntity};

pub mod memory;

/// Read-only enumeration of model elements and entities.
pub trait ElementStore {
    /// All elements, types included.
    fn elements(&self) -> &[Element];

    /// Look up one element by id.
    fn element(&self, id: ElementId) -> Option<&Element>;

    fn categories(&self) -> &[NamedEntity];

    fn levels(&self) -> &[LevelInfo];

    /// Phases in sequence order.
    fn phases(&self) -> &[NamedEntity];

    fn design_options(&self) -> &[NamedEntity];

    fn worksets(&self) -> &[NamedEntity];

    fn views(&self) -> &[NamedEntity];

    fn families(&self) -> &[FamilyInfo];

    /// Element types, in element order.
    fn element_types(&self) -> Vec<&Element> {
        self.elements()
            .iter()
            .filter(|element| element.is_element_type)
            .collect()
    }

    /// Elements belonging to the category `id`.
    fn elements_in_category(&self, id: ElementId) -> Vec<&Element> {
        self.elements()
            .iter()
            .filter(|element| element.category_id == Some(id))
            .collect()
    }
}
