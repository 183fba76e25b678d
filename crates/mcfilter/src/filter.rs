//! Compiled filters.
//!
//! An [`ElementFilter`] is a tree of [`Predicate`] leaves joined by AND/OR
//! nodes, plus the [`ElementFilter::Never`] sentinel that selects nothing.
//! Filters hold no mutable state and borrow nothing from the store they were
//! compiled against, so they can be evaluated from any thread.
//!
//! Build trees with [`or`] and [`and`] rather than the variants directly: they
//! apply the arity rules (zero, one, many) the rest of the crate relies on.

use std::collections::BTreeSet;

use crate::error::{FilterError, Result};
use crate::matcher::ParameterTest;
use crate::model::{Element, ElementId, PhaseStatus, StructuralType};
use crate::store::ElementStore;

/// A boolean test over a single element.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Element belongs to the category (or, inverted, does not).
    InCategory { id: ElementId, inverted: bool },
    /// Element's level or reference level is `id`.
    OnLevel(ElementId),
    /// Element has neither a level nor a reference level.
    WithoutLevel,
    /// Element sits on the sketch plane with this exact name.
    SketchPlaneNamed(String),
    OwnedByView(ElementId),
    /// Element is (or, with `false`, is not) view-specific.
    HasOwnerView(bool),
    InDesignOption { id: ElementId, inverted: bool },
    WithoutDesignOption,
    CreatedInPhase(ElementId),
    DemolishedInPhase(ElementId),
    WithoutPhaseCreated,
    WithoutPhaseDemolished,
    /// Element has `status` relative to `phases[phase]`.
    PhaseStatus {
        phases: Vec<ElementId>,
        phase: usize,
        status: PhaseStatus,
        inverted: bool,
    },
    InWorkset(ElementId),
    /// Element types of the family.
    TypeInFamily(ElementId),
    /// Instances of the element type.
    InstanceOf(ElementId),
    /// The element type itself or any of its instances.
    TypeOrInstanceOf(ElementId),
    IsElementType(bool),
    HasHost(bool),
    StructuralType { kind: StructuralType, inverted: bool },
    ClassName(String),
    /// Element is one of a precomputed set.
    ElementIn(BTreeSet<ElementId>),
    Parameter { name: String, test: ParameterTest },
}

impl Predicate {
    pub fn matches(&self, element: &Element) -> bool {
        match self {
            Predicate::InCategory { id, inverted } => {
                (element.category_id == Some(*id)) != *inverted
            }
            Predicate::OnLevel(id) => {
                element.level_id == Some(*id) || element.reference_level_id == Some(*id)
            }
            Predicate::WithoutLevel => {
                element.level_id.is_none() && element.reference_level_id.is_none()
            }
            Predicate::SketchPlaneNamed(name) => {
                element.sketch_plane.as_deref() == Some(name.as_str())
            }
            Predicate::OwnedByView(id) => element.owner_view_id == Some(*id),
            Predicate::HasOwnerView(flag) => element.owner_view_id.is_some() == *flag,
            Predicate::InDesignOption { id, inverted } => {
                (element.design_option_id == Some(*id)) != *inverted
            }
            Predicate::WithoutDesignOption => element.design_option_id.is_none(),
            Predicate::CreatedInPhase(id) => element.phase_created_id == Some(*id),
            Predicate::DemolishedInPhase(id) => element.phase_demolished_id == Some(*id),
            Predicate::WithoutPhaseCreated => element.phase_created_id.is_none(),
            Predicate::WithoutPhaseDemolished => element.phase_demolished_id.is_none(),
            Predicate::PhaseStatus {
                phases,
                phase,
                status,
                inverted,
            } => {
                let position = |id: Option<ElementId>| {
                    id.and_then(|id| phases.iter().position(|p| *p == id))
                };
                // Elements outside the phase sequence have no status at all.
                let Some(created) = position(element.phase_created_id) else {
                    return false;
                };
                let demolished = position(element.phase_demolished_id);
                (PhaseStatus::at(*phase, created, demolished) == *status) != *inverted
            }
            Predicate::InWorkset(id) => element.workset_id == Some(*id),
            Predicate::TypeInFamily(id) => {
                element.is_element_type && element.family_id == Some(*id)
            }
            Predicate::InstanceOf(id) => !element.is_element_type && element.type_id == Some(*id),
            Predicate::TypeOrInstanceOf(id) => element.id == *id || element.type_id == Some(*id),
            Predicate::IsElementType(flag) => element.is_element_type == *flag,
            Predicate::HasHost(flag) => element.host_id.is_some() == *flag,
            Predicate::StructuralType { kind, inverted } => {
                (element.structural_type == *kind) != *inverted
            }
            Predicate::ClassName(name) => element.class_name == *name,
            Predicate::ElementIn(ids) => ids.contains(&element.id),
            Predicate::Parameter { name, test } => test.matches(element, name),
        }
    }
}

/// A compiled filter tree.
#[derive(Debug, Clone)]
pub enum ElementFilter {
    /// Selects nothing. The result of a valid filter that resolved no entities.
    Never,
    Match(Predicate),
    And(Vec<ElementFilter>),
    Or(Vec<ElementFilter>),
}

impl ElementFilter {
    pub fn never() -> Self {
        ElementFilter::Never
    }

    pub fn is_never(&self) -> bool {
        matches!(self, ElementFilter::Never)
    }

    /// Evaluate against one element. AND stops at the first mismatch, OR at the
    /// first match.
    pub fn matches(&self, element: &Element) -> bool {
        match self {
            ElementFilter::Never => false,
            ElementFilter::Match(predicate) => predicate.matches(element),
            ElementFilter::And(children) => children.iter().all(|c| c.matches(element)),
            ElementFilter::Or(children) => children.iter().any(|c| c.matches(element)),
        }
    }

    /// Elements of `store` the filter selects, in store order.
    pub fn select<'s, S>(&self, store: &'s S) -> Vec<&'s Element>
    where
        S: ElementStore + ?Sized,
    {
        store
            .elements()
            .iter()
            .filter(|element| self.matches(element))
            .collect()
    }
}

impl From<Predicate> for ElementFilter {
    fn from(predicate: Predicate) -> Self {
        ElementFilter::Match(predicate)
    }
}

/// Join filters so that any may match.
///
/// No filters gives [`ElementFilter::Never`]; a single filter is returned
/// unwrapped.
pub fn or(mut filters: Vec<ElementFilter>) -> ElementFilter {
    match filters.len() {
        0 => ElementFilter::Never,
        1 => filters.remove(0),
        _ => ElementFilter::Or(filters),
    }
}

/// Join filters so that all must match.
///
/// The identity of AND is "always matches", which this algebra has no leaf for,
/// so an empty list is rejected. A single filter is returned unwrapped.
pub fn and(mut filters: Vec<ElementFilter>) -> Result<ElementFilter> {
    match filters.len() {
        0 => Err(FilterError::Validation(
            "cannot AND an empty list of filters".into(),
        )),
        1 => Ok(filters.remove(0)),
        _ => Ok(ElementFilter::And(filters)),
    }
}

/// `or` over predicates.
pub fn any_of(predicates: impl IntoIterator<Item = Predicate>) -> ElementFilter {
    or(predicates.into_iter().map(ElementFilter::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::StoreFixture;

    fn on_level(id: u64) -> ElementFilter {
        Predicate::OnLevel(ElementId(id)).into()
    }

    #[test]
    fn or_arity() {
        assert!(or(vec![]).is_never());
        assert!(matches!(or(vec![on_level(1)]), ElementFilter::Match(_)));
        assert!(matches!(or(vec![on_level(1), on_level(2)]), ElementFilter::Or(ref c) if c.len() == 2));
    }

    #[test]
    fn and_arity() {
        let err = and(vec![]).unwrap_err();
        assert!(err.is_defect());
        assert!(matches!(and(vec![on_level(1)]).unwrap(), ElementFilter::Match(_)));
        assert!(matches!(
            and(vec![on_level(1), on_level(2)]).unwrap(),
            ElementFilter::And(_)
        ));
    }

    #[test]
    fn never_matches_nothing() {
        let element = Element::new("Wall");
        assert!(!ElementFilter::never().matches(&element));
        assert!(!or(vec![ElementFilter::Never, ElementFilter::Never]).matches(&element));
    }

    #[test]
    fn level_predicates_cover_reference_level() {
        let placed = Element::new("Wall").on_level(ElementId(1));
        let referenced = Element::new("Beam").with_reference_level(ElementId(1));
        let elsewhere = Element::new("Slab").on_level(ElementId(2));
        let unplaced = Element::new("Grid");

        let filter = on_level(1);
        assert!(filter.matches(&placed));
        assert!(filter.matches(&referenced));
        assert!(!filter.matches(&elsewhere));

        let without = ElementFilter::from(Predicate::WithoutLevel);
        assert!(without.matches(&unplaced));
        assert!(!without.matches(&placed));
    }

    #[test]
    fn inverted_predicates() {
        let element = Element::new("Door").in_design_option(ElementId(5));
        let inside = Predicate::InDesignOption {
            id: ElementId(5),
            inverted: false,
        };
        let outside = Predicate::InDesignOption {
            id: ElementId(5),
            inverted: true,
        };
        assert!(inside.matches(&element));
        assert!(!outside.matches(&element));
    }

    #[test]
    fn phase_status_follows_sequence() {
        let fixture = StoreFixture::new()
            .with_phase("Existing")
            .with_phase("New Construction");
        let existing = fixture.id("Existing");
        let new = fixture.id("New Construction");
        let phases = vec![existing, new];

        let status = |status, inverted| Predicate::PhaseStatus {
            phases: phases.clone(),
            phase: 1,
            status,
            inverted,
        };
        let old_wall = Element::new("Old").created_in(existing);
        let new_wall = Element::new("New").created_in(new);
        let removed = Element::new("Gone").created_in(existing).demolished_in(new);
        let loose = Element::new("Loose");

        assert!(status(PhaseStatus::Existing, false).matches(&old_wall));
        assert!(status(PhaseStatus::New, false).matches(&new_wall));
        assert!(status(PhaseStatus::Demolished, false).matches(&removed));
        assert!(status(PhaseStatus::New, true).matches(&old_wall));
        assert!(!status(PhaseStatus::New, false).matches(&loose));
        assert!(!status(PhaseStatus::New, true).matches(&loose));
    }

    #[test]
    fn family_and_type_predicates() {
        let fixture = StoreFixture::new()
            .with_family("Door-Single", false)
            .with_type("36in", "Door-Single");
        let family = fixture.id("Door-Single");
        let door_type = fixture.id("36in");
        let fixture = fixture.with_element(Element::new("D1").of_type(door_type));
        let instance = fixture.store.element(fixture.id("D1")).unwrap();
        let symbol = fixture.store.element(door_type).unwrap();

        assert!(Predicate::TypeInFamily(family).matches(symbol));
        assert!(!Predicate::TypeInFamily(family).matches(instance));
        assert!(Predicate::InstanceOf(door_type).matches(instance));
        assert!(!Predicate::InstanceOf(door_type).matches(symbol));
        assert!(Predicate::TypeOrInstanceOf(door_type).matches(symbol));
        assert!(Predicate::TypeOrInstanceOf(door_type).matches(instance));
    }

    #[test]
    fn select_keeps_store_order() {
        let fixture = StoreFixture::new()
            .with_level("L1", 0.0)
            .with_level("L2", 10.0);
        let l1 = fixture.id("L1");
        let l2 = fixture.id("L2");
        let fixture = fixture
            .with_element(Element::new("A").on_level(l2))
            .with_element(Element::new("B").on_level(l1))
            .with_element(Element::new("C").on_level(l2));

        let filter = ElementFilter::from(Predicate::OnLevel(l2));
        let names: Vec<_> = filter
            .select(&fixture.store)
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn any_of_collapses_single_predicate() {
        let filter = any_of([Predicate::HasHost(true)]);
        assert!(matches!(filter, ElementFilter::Match(Predicate::HasHost(true))));
        assert!(any_of(Vec::<Predicate>::new()).is_never());
    }
}
