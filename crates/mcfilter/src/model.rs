//! # Domain Model: Model Elements and Queryable Entities
//!
//! This module defines the read-only view of a building model that filters are
//! compiled against and evaluated on.
//!
//! ## Elements
//!
//! An [`Element`] is anything a check can select: a wall, a door instance, a
//! door type. It carries the attributes filters test directly (name, class,
//! structural type, parameters) and the ids of the entities it relates to
//! (category, level, owner view, design option, phases, workset, host, type).
//!
//! ## Entities
//!
//! Categories, levels, phases, design options, worksets, views and families are
//! matched by name during compilation. They are exposed as [`NamedEntity`],
//! [`LevelInfo`] and [`FamilyInfo`]. Element types are ordinary elements with
//! `is_element_type` set.
//!
//! ## Parameters
//!
//! Parameters are keyed by name. A parameter that is absent is *undefined*; a
//! parameter present as [`ParamValue::Empty`] (or as empty text) is *defined
//! without a value*.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StructuralType {
    #[default]
    NonStructural,
    Beam,
    Brace,
    Column,
    Footing,
    UnknownFraming,
}

impl StructuralType {
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        [
            StructuralType::NonStructural,
            StructuralType::Beam,
            StructuralType::Brace,
            StructuralType::Column,
            StructuralType::Footing,
            StructuralType::UnknownFraming,
        ]
        .into_iter()
        .find(|kind| format!("{:?}", kind).eq_ignore_ascii_case(value))
    }
}

/// Status of an element relative to one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseStatus {
    Existing,
    New,
    Demolished,
    Temporary,
    Future,
    /// Created and demolished before the phase.
    Past,
}

impl PhaseStatus {
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        [
            PhaseStatus::Existing,
            PhaseStatus::New,
            PhaseStatus::Demolished,
            PhaseStatus::Temporary,
            PhaseStatus::Future,
            PhaseStatus::Past,
        ]
        .into_iter()
        .find(|status| format!("{:?}", status).eq_ignore_ascii_case(value))
    }

    /// Status of an element created at phase index `created` and optionally
    /// demolished at `demolished`, seen from phase index `phase`.
    pub fn at(phase: usize, created: usize, demolished: Option<usize>) -> Self {
        if created > phase {
            return PhaseStatus::Future;
        }
        match demolished {
            Some(d) if d == phase && created == phase => PhaseStatus::Temporary,
            Some(d) if d == phase => PhaseStatus::Demolished,
            Some(d) if d < phase => PhaseStatus::Past,
            _ if created == phase => PhaseStatus::New,
            _ => PhaseStatus::Existing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Empty,
    Text(String),
    Number(f64),
    Integer(i64),
    Id(ElementId),
}

impl ParamValue {
    pub fn has_value(&self) -> bool {
        match self {
            ParamValue::Empty => false,
            ParamValue::Text(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParamValue::Number(n) => Some(*n),
            ParamValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Text form used by string conditions.
    pub fn as_text(&self) -> String {
        match self {
            ParamValue::Empty => String::new(),
            ParamValue::Text(s) => s.clone(),
            ParamValue::Number(n) => n.to_string(),
            ParamValue::Integer(i) => i.to_string(),
            ParamValue::Id(id) => id.to_string(),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Number(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Integer(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub name: String,
    /// API class name, e.g. `Autodesk.Revit.DB.Wall`.
    pub class_name: String,
    pub category_id: Option<ElementId>,
    pub is_element_type: bool,
    /// For instances: the element type. For types: `None`.
    pub type_id: Option<ElementId>,
    /// For element types: the family they belong to.
    pub family_id: Option<ElementId>,
    pub level_id: Option<ElementId>,
    pub reference_level_id: Option<ElementId>,
    /// Name of the sketch plane the element is hosted on, e.g. `Level : L1`.
    pub sketch_plane: Option<String>,
    pub owner_view_id: Option<ElementId>,
    pub design_option_id: Option<ElementId>,
    pub phase_created_id: Option<ElementId>,
    pub phase_demolished_id: Option<ElementId>,
    pub workset_id: Option<ElementId>,
    pub host_id: Option<ElementId>,
    pub structural_type: StructuralType,
    pub parameters: BTreeMap<String, ParamValue>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ElementId(0),
            name: name.into(),
            class_name: String::new(),
            category_id: None,
            is_element_type: false,
            type_id: None,
            family_id: None,
            level_id: None,
            reference_level_id: None,
            sketch_plane: None,
            owner_view_id: None,
            design_option_id: None,
            phase_created_id: None,
            phase_demolished_id: None,
            workset_id: None,
            host_id: None,
            structural_type: StructuralType::NonStructural,
            parameters: BTreeMap::new(),
        }
    }

    /// An element type belonging to `family`.
    pub fn new_type(name: impl Into<String>, family: Option<ElementId>) -> Self {
        let mut element = Self::new(name);
        element.is_element_type = true;
        element.family_id = family;
        element
    }

    pub fn class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = class_name.into();
        self
    }

    pub fn in_category(mut self, id: ElementId) -> Self {
        self.category_id = Some(id);
        self
    }

    pub fn of_type(mut self, id: ElementId) -> Self {
        self.type_id = Some(id);
        self
    }

    pub fn on_level(mut self, id: ElementId) -> Self {
        self.level_id = Some(id);
        self
    }

    pub fn with_reference_level(mut self, id: ElementId) -> Self {
        self.reference_level_id = Some(id);
        self
    }

    pub fn on_sketch_plane(mut self, name: impl Into<String>) -> Self {
        self.sketch_plane = Some(name.into());
        self
    }

    pub fn owned_by_view(mut self, id: ElementId) -> Self {
        self.owner_view_id = Some(id);
        self
    }

    pub fn in_design_option(mut self, id: ElementId) -> Self {
        self.design_option_id = Some(id);
        self
    }

    pub fn created_in(mut self, phase: ElementId) -> Self {
        self.phase_created_id = Some(phase);
        self
    }

    pub fn demolished_in(mut self, phase: ElementId) -> Self {
        self.phase_demolished_id = Some(phase);
        self
    }

    pub fn in_workset(mut self, id: ElementId) -> Self {
        self.workset_id = Some(id);
        self
    }

    pub fn hosted_by(mut self, id: ElementId) -> Self {
        self.host_id = Some(id);
        self
    }

    pub fn structural(mut self, kind: StructuralType) -> Self {
        self.structural_type = kind;
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.get(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedEntity {
    pub id: ElementId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelInfo {
    pub id: ElementId,
    pub name: String,
    /// Elevation in internal units (feet).
    pub elevation: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyInfo {
    pub id: ElementId,
    pub name: String,
    pub is_in_place: bool,
    /// Element types (symbols) of this family.
    pub type_ids: Vec<ElementId>,
}
