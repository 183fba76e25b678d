//! Category grammar.
//!
//! This module is the single source of truth for which properties a filter
//! category offers and which conditions each (category, property) pair
//! accepts. Both the [`FilterSpec`](crate::spec::FilterSpec) constraint engine
//! and the [`compile`](crate::compile) dispatcher read from [`CATEGORIES`];
//! neither re-derives the grammar with its own branching.
//!
//! ## Shape of the table
//!
//! | Family | Properties | Conditions |
//! |--------|------------|------------|
//! | Named collections | `Name` | string set, optionally with existence and wildcard |
//! | Room / Space / View | `Name`, `Is Defined` | full string set on `Name`, `Equal`/`Not Equal` on `Is Defined` |
//! | Category | `Name` (or any category name) | string set on `Name`, `Included` otherwise |
//! | Level | `Name`, `Elevation` | string set on `Name`, ordering set otherwise |
//! | Parameter-like | custom | every value, existence and ordering condition |
//! | Boolean / status | fixed | `Equal` or `Equal`/`Not Equal` |
//!
//! Conditions are listed in display order. Wherever a list is non-empty and
//! the property is a fixed vocabulary entry, `Equal` comes first.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::units::UnitClass;

/// Well-known property names.
pub mod props {
    pub const NAME: &str = "Name";
    pub const NUMBER: &str = "Number";
    pub const IS_DEFINED: &str = "Is Defined";
    pub const IS_IN_PLACE: &str = "Is In Place";
    pub const IS_ELEMENT_TYPE: &str = "Is Element Type";
    pub const ELEVATION: &str = "Elevation";
    pub const VALUE: &str = "Value";
    pub const FULL_CLASS_NAME: &str = "Full Class Name";
    pub const LOCATION: &str = "Location";
    pub const TYPE: &str = "Type";
}

/// The kind of model entity a filter selects by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Parameter,
    HostParameter,
    ApiParameter,
    Category,
    Family,
    Type,
    TypeOrInstance,
    ApiType,
    Level,
    PhaseCreated,
    PhaseDemolished,
    PhaseStatus,
    DesignOption,
    View,
    Workset,
    Room,
    Space,
    StructuralType,
    Redundant,
    Host,
}

impl Category {
    pub const ALL: &'static [Category] = &[
        Category::Parameter,
        Category::HostParameter,
        Category::ApiParameter,
        Category::Category,
        Category::Family,
        Category::Type,
        Category::TypeOrInstance,
        Category::ApiType,
        Category::Level,
        Category::PhaseCreated,
        Category::PhaseDemolished,
        Category::PhaseStatus,
        Category::DesignOption,
        Category::View,
        Category::Workset,
        Category::Room,
        Category::Space,
        Category::StructuralType,
        Category::Redundant,
        Category::Host,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Parameter => "Parameter",
            Category::HostParameter => "Host Parameter",
            Category::ApiParameter => "API Parameter",
            Category::Category => "Category",
            Category::Family => "Family",
            Category::Type => "Type",
            Category::TypeOrInstance => "Type or Instance",
            Category::ApiType => "API Type",
            Category::Level => "Level",
            Category::PhaseCreated => "Phase Created",
            Category::PhaseDemolished => "Phase Demolished",
            Category::PhaseStatus => "Phase Status",
            Category::DesignOption => "Design Option",
            Category::View => "View",
            Category::Workset => "Workset",
            Category::Room => "Room",
            Category::Space => "Space",
            Category::StructuralType => "Structural Type",
            Category::Redundant => "Redundant",
            Category::Host => "Host",
        }
    }

    /// Categories whose property is a free-form parameter name.
    pub fn is_parameter_like(self) -> bool {
        matches!(
            self,
            Category::Parameter | Category::HostParameter | Category::ApiParameter
        )
    }

    pub fn spec(self) -> &'static CategorySpec {
        // Every variant has exactly one entry; the table test enforces it.
        CATEGORIES
            .iter()
            .find(|spec| spec.category == self)
            .unwrap_or(&EMPTY_GRAMMAR)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A comparison applied during compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Condition {
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    Contains,
    DoesNotContain,
    Defined,
    Undefined,
    HasValue,
    HasNoValue,
    WildCard,
    WildCardNoMatch,
    Duplicated,
    MatchesParameter,
    DoesNotMatchParameter,
    Included,
}

impl Condition {
    pub fn name(self) -> &'static str {
        match self {
            Condition::Equal => "Equal",
            Condition::NotEqual => "Not Equal",
            Condition::GreaterThan => "Greater Than",
            Condition::LessThan => "Less Than",
            Condition::GreaterOrEqual => "Greater or Equal",
            Condition::LessOrEqual => "Less or Equal",
            Condition::Contains => "Contains",
            Condition::DoesNotContain => "Does Not Contain",
            Condition::Defined => "Defined",
            Condition::Undefined => "Undefined",
            Condition::HasValue => "Has Value",
            Condition::HasNoValue => "Has No Value",
            Condition::WildCard => "Wildcard",
            Condition::WildCardNoMatch => "Wildcard No Match",
            Condition::Duplicated => "Duplicated",
            Condition::MatchesParameter => "Matches Parameter",
            Condition::DoesNotMatchParameter => "Does Not Match Parameter",
            Condition::Included => "Included",
        }
    }

    /// `>`, `<`, `>=`, `<=`.
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            Condition::GreaterThan
                | Condition::LessThan
                | Condition::GreaterOrEqual
                | Condition::LessOrEqual
        )
    }

    /// Conditions that can compare numbers, and so may carry a unit.
    pub fn is_numeric(self) -> bool {
        matches!(self, Condition::Equal | Condition::NotEqual) || self.is_ordering()
    }

    /// Conditions that test presence rather than content. They take no value.
    pub fn is_existence(self) -> bool {
        matches!(
            self,
            Condition::Defined
                | Condition::Undefined
                | Condition::HasValue
                | Condition::HasNoValue
                | Condition::Duplicated
        )
    }

    /// Conditions that compare text and therefore honour case folding.
    pub fn is_text_comparison(self) -> bool {
        matches!(
            self,
            Condition::Equal
                | Condition::NotEqual
                | Condition::Contains
                | Condition::DoesNotContain
                | Condition::WildCard
                | Condition::WildCardNoMatch
        )
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Variant names keep diagnostics greppable.
        write!(f, "{:?}", self)
    }
}

use Condition as C;

const EQ: &[Condition] = &[C::Equal];
const EQ_NE: &[Condition] = &[C::Equal, C::NotEqual];
const INCLUDED: &[Condition] = &[C::Included];

const TEXT: &[Condition] = &[C::Equal, C::NotEqual, C::Contains, C::DoesNotContain];

const TEXT_WILDCARD: &[Condition] = &[
    C::Equal,
    C::NotEqual,
    C::Contains,
    C::DoesNotContain,
    C::WildCard,
    C::WildCardNoMatch,
];

const TEXT_DEFINED_WILDCARD: &[Condition] = &[
    C::Equal,
    C::NotEqual,
    C::Contains,
    C::DoesNotContain,
    C::Defined,
    C::WildCard,
    C::WildCardNoMatch,
];

const TEXT_FULL: &[Condition] = &[
    C::Equal,
    C::NotEqual,
    C::Contains,
    C::DoesNotContain,
    C::Defined,
    C::Undefined,
    C::WildCard,
    C::WildCardNoMatch,
];

const ORDERING: &[Condition] = &[
    C::Equal,
    C::NotEqual,
    C::GreaterThan,
    C::LessThan,
    C::GreaterOrEqual,
    C::LessOrEqual,
];

const PARAMETER: &[Condition] = &[
    C::Equal,
    C::NotEqual,
    C::GreaterThan,
    C::LessThan,
    C::GreaterOrEqual,
    C::LessOrEqual,
    C::Contains,
    C::DoesNotContain,
    C::Defined,
    C::Undefined,
    C::HasValue,
    C::HasNoValue,
    C::WildCard,
    C::WildCardNoMatch,
    C::Duplicated,
    C::MatchesParameter,
    C::DoesNotMatchParameter,
];

/// Same as [`PARAMETER`] without the cross-parameter conditions.
const API_PARAMETER: &[Condition] = &[
    C::Equal,
    C::NotEqual,
    C::GreaterThan,
    C::LessThan,
    C::GreaterOrEqual,
    C::LessOrEqual,
    C::Contains,
    C::DoesNotContain,
    C::Defined,
    C::Undefined,
    C::HasValue,
    C::HasNoValue,
    C::WildCard,
    C::WildCardNoMatch,
    C::Duplicated,
];

/// Which property a condition rule applies to.
#[derive(Debug, Clone, Copy)]
enum PropertyMatch {
    Is(&'static str),
    Any,
}

#[derive(Debug, Clone, Copy)]
struct ConditionRule {
    property: PropertyMatch,
    conditions: &'static [Condition],
}

const fn on(property: &'static str, conditions: &'static [Condition]) -> ConditionRule {
    ConditionRule {
        property: PropertyMatch::Is(property),
        conditions,
    }
}

const fn otherwise(conditions: &'static [Condition]) -> ConditionRule {
    ConditionRule {
        property: PropertyMatch::Any,
        conditions,
    }
}

/// Grammar entry for one category.
#[derive(Debug, Clone)]
pub struct CategorySpec {
    pub category: Category,

    /// Fixed property vocabulary, in display order.
    pub properties: &'static [&'static str],

    /// Whether the property may be free text (a parameter or phase name).
    pub custom_property: bool,

    /// Whether values come from a fixed vocabulary regardless of property.
    pub fixed_values: bool,

    /// First matching rule wins.
    rules: &'static [ConditionRule],
}

impl CategorySpec {
    const fn new(category: Category, properties: &'static [&'static str]) -> Self {
        Self {
            category,
            properties,
            custom_property: false,
            fixed_values: false,
            rules: &[],
        }
    }

    const fn custom_property(mut self) -> Self {
        self.custom_property = true;
        self
    }

    const fn fixed_values(mut self) -> Self {
        self.fixed_values = true;
        self
    }

    const fn rules(mut self, rules: &'static [ConditionRule]) -> Self {
        self.rules = rules;
        self
    }

    /// Conditions valid for `property` under this category.
    pub fn conditions_for(&self, property: &str) -> &'static [Condition] {
        self.rules
            .iter()
            .find(|rule| match rule.property {
                PropertyMatch::Is(name) => name == property,
                PropertyMatch::Any => true,
            })
            .map(|rule| rule.conditions)
            .unwrap_or(&[])
    }
}

const EMPTY_GRAMMAR: CategorySpec = CategorySpec::new(Category::Redundant, &[]);

use props::*;

/// The grammar. Adding a category means adding an entry here.
pub const CATEGORIES: &[CategorySpec] = &[
    CategorySpec::new(Category::Parameter, &[])
        .custom_property()
        .rules(&[otherwise(PARAMETER)]),
    CategorySpec::new(Category::HostParameter, &[])
        .custom_property()
        .rules(&[otherwise(PARAMETER)]),
    CategorySpec::new(Category::ApiParameter, &[])
        .custom_property()
        .rules(&[otherwise(API_PARAMETER)]),
    // Any other property is a category name tested with `Included`.
    CategorySpec::new(Category::Category, &[NAME])
        .custom_property()
        .rules(&[on(NAME, TEXT), otherwise(INCLUDED)]),
    CategorySpec::new(Category::Family, &[NAME, IS_IN_PLACE])
        .rules(&[on(IS_IN_PLACE, EQ_NE), otherwise(TEXT_WILDCARD)]),
    CategorySpec::new(Category::Type, &[NAME]).rules(&[otherwise(TEXT_WILDCARD)]),
    CategorySpec::new(Category::TypeOrInstance, &[IS_ELEMENT_TYPE])
        .fixed_values()
        .rules(&[otherwise(EQ)]),
    CategorySpec::new(Category::ApiType, &[FULL_CLASS_NAME]).rules(&[otherwise(EQ)]),
    CategorySpec::new(Category::Level, &[NAME, ELEVATION])
        .rules(&[on(NAME, TEXT_FULL), otherwise(ORDERING)]),
    CategorySpec::new(Category::PhaseCreated, &[NAME]).rules(&[otherwise(TEXT_DEFINED_WILDCARD)]),
    CategorySpec::new(Category::PhaseDemolished, &[NAME]).rules(&[otherwise(TEXT_FULL)]),
    // The property is the name of the phase the status is measured against.
    CategorySpec::new(Category::PhaseStatus, &[])
        .custom_property()
        .fixed_values()
        .rules(&[otherwise(EQ_NE)]),
    CategorySpec::new(Category::DesignOption, &[NAME]).rules(&[otherwise(TEXT_FULL)]),
    CategorySpec::new(Category::View, &[NAME, IS_DEFINED])
        .rules(&[on(IS_DEFINED, EQ_NE), otherwise(TEXT_FULL)]),
    CategorySpec::new(Category::Workset, &[NAME]).rules(&[otherwise(TEXT_WILDCARD)]),
    CategorySpec::new(Category::Room, &[NAME, NUMBER, IS_DEFINED])
        .rules(&[on(IS_DEFINED, EQ_NE), otherwise(TEXT_FULL)]),
    CategorySpec::new(Category::Space, &[NAME, NUMBER, IS_DEFINED])
        .rules(&[on(IS_DEFINED, EQ_NE), otherwise(TEXT_FULL)]),
    CategorySpec::new(Category::StructuralType, &[VALUE])
        .fixed_values()
        .rules(&[otherwise(EQ_NE)]),
    CategorySpec::new(Category::Redundant, &[LOCATION, TYPE])
        .fixed_values()
        .rules(&[otherwise(EQ)]),
    CategorySpec::new(Category::Host, &[IS_DEFINED]).rules(&[otherwise(EQ)]),
];

/// Ordered property options for `category`. Empty when the property is free-form.
pub fn property_options(category: Category) -> &'static [&'static str] {
    category.spec().properties
}

/// Ordered condition options for a (category, property) pair.
pub fn condition_options(category: Category, property: &str) -> &'static [Condition] {
    category.spec().conditions_for(property)
}

/// Whether `category` accepts a property outside its fixed vocabulary.
pub fn allow_custom_property(category: Category) -> bool {
    category.spec().custom_property
}

/// Whether the value may be free text for this (category, property, condition).
pub fn allow_custom_value(category: Category, property: &str, condition: Condition) -> bool {
    if category == Category::Category && property != NAME {
        return false;
    }
    if category.spec().fixed_values {
        return false;
    }
    if condition.is_existence() {
        return false;
    }
    property != IS_IN_PLACE && property != IS_DEFINED
}

/// Whether the case-insensitive flag may be turned on.
pub fn allow_case_insensitive(
    category: Category,
    property: &str,
    condition: Condition,
    unit_class: UnitClass,
) -> bool {
    unit_class == UnitClass::None
        && allow_custom_value(category, property, condition)
        && condition.is_text_comparison()
}

pub const TRUE_FALSE: &[&str] = &["True", "False"];

pub const PHASE_STATUSES: &[&str] = &["Existing", "New", "Demolished", "Temporary", "Future", "Past"];

pub const STRUCTURAL_TYPES: &[&str] = &[
    "NonStructural",
    "Beam",
    "Brace",
    "Column",
    "Footing",
    "UnknownFraming",
];

/// Suggested values for the current selection; authoritative when custom
/// values are not allowed.
pub fn value_options(category: Category, property: &str, condition: Condition) -> &'static [&'static str] {
    match category {
        Category::PhaseStatus => PHASE_STATUSES,
        Category::StructuralType => STRUCTURAL_TYPES,
        Category::TypeOrInstance | Category::Redundant => TRUE_FALSE,
        Category::Category if property != NAME => TRUE_FALSE,
        _ if property == IS_IN_PLACE || property == IS_DEFINED => TRUE_FALSE,
        _ if condition.is_existence() => TRUE_FALSE,
        _ => &[],
    }
}
