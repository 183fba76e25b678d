//! # Filter Specifications
//!
//! A [`FilterSpec`] is one user-authored rule: *select elements whose
//! `category`/`property` satisfies `condition` against `value`*. Its state
//! always stays inside the grammar defined in [`crate::schema`].
//!
//! ## Mutation as a Reducer
//!
//! Every change goes through [`FilterSpec::apply`], a pure function
//! `(spec, change) -> (spec', changed_fields)`:
//!
//! 1. the new field value is applied (properties are trimmed);
//! 2. fields whose option lists depend on it are re-checked against
//!    the grammar;
//! 3. any field now outside its option list is coerced to the first option;
//! 4. the set of fields whose value actually differs is returned.
//!
//! There are no observers. Callers look at [`ChangedFields`] to decide what to
//! refresh. The `set_*` methods are thin wrappers that apply a change in place.
//!
//! ## Coercion Order
//!
//! | Step | Field | Rule |
//! |------|-------|------|
//! | 1 | `property` | first property option, unless custom properties are allowed or there are no options |
//! | 2 | `condition` | first condition option for (category, property) |
//! | 3 | `unit_class` / `unit` | cleared for non-parameter categories; unit reset to `Default` when invalid for the class |
//! | 4 | `value` | first value option when custom values are not allowed |
//! | 5 | `case_insensitive` | forced off unless allowed |
//!
//! Custom properties are preserved as typed: switching a spec to a parameter
//! category keeps its property as the parameter name.
//!
//! ## Serialization
//!
//! `FilterSpec` serializes field by field. Deserialization replays the fields
//! through the reducer, so a stored spec that no longer fits the grammar is
//! repaired on load rather than rejected.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::error::{FilterError, Result};
use crate::matcher;
use crate::schema::{self, props, Category, Condition};
use crate::units::{self, Unit, UnitClass};

/// How a spec combines with the one before it in a rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Operator {
    #[default]
    And,
    Or,
}

/// Names of the fields of a [`FilterSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Operator,
    Category,
    Property,
    Condition,
    Value,
    CaseInsensitive,
    UnitClass,
    Unit,
    IndentLevel,
    Selected,
    FieldIsUserDefined,
}

/// A requested change to one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldChange {
    Operator(Operator),
    Category(Category),
    Property(String),
    Condition(Condition),
    Value(String),
    CaseInsensitive(bool),
    UnitClass(UnitClass),
    Unit(Unit),
    IndentLevel(u32),
    Selected(bool),
    FieldIsUserDefined(bool),
}

/// Fields whose value differs after a change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedFields(BTreeSet<Field>);

impl ChangedFields {
    fn between(before: &FilterSpec, after: &FilterSpec) -> Self {
        let mut fields = BTreeSet::new();
        let mut mark = |changed: bool, field: Field| {
            if changed {
                fields.insert(field);
            }
        };
        mark(before.operator != after.operator, Field::Operator);
        mark(before.category != after.category, Field::Category);
        mark(before.property != after.property, Field::Property);
        mark(before.condition != after.condition, Field::Condition);
        mark(before.value != after.value, Field::Value);
        mark(
            before.case_insensitive != after.case_insensitive,
            Field::CaseInsensitive,
        );
        mark(before.unit_class != after.unit_class, Field::UnitClass);
        mark(before.unit != after.unit, Field::Unit);
        mark(before.indent_level != after.indent_level, Field::IndentLevel);
        mark(before.selected != after.selected, Field::Selected);
        mark(
            before.field_is_user_defined != after.field_is_user_defined,
            Field::FieldIsUserDefined,
        );
        Self(fields)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.iter().copied()
    }

    /// Whether option lists shown for the spec may have changed.
    pub fn affects_options(&self) -> bool {
        self.iter().any(|field| {
            matches!(
                field,
                Field::Category | Field::Property | Field::Condition | Field::UnitClass
            )
        })
    }
}

/// One filter rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterSpec {
    id: Uuid,
    operator: Operator,
    category: Category,
    property: String,
    condition: Condition,
    value: String,
    case_insensitive: bool,
    unit_class: UnitClass,
    unit: Unit,
    /// Display grouping only.
    indent_level: u32,
    selected: bool,
    field_is_user_defined: bool,
}

impl FilterSpec {
    /// A spec for `category` with its first property and condition selected.
    pub fn new(category: Category) -> Self {
        Self::with_id(Uuid::new_v4(), category)
    }

    pub fn with_id(id: Uuid, category: Category) -> Self {
        let mut spec = Self {
            id,
            operator: Operator::And,
            category,
            property: String::new(),
            condition: Condition::Equal,
            value: String::new(),
            case_insensitive: false,
            unit_class: UnitClass::None,
            unit: Unit::Default,
            indent_level: 0,
            selected: false,
            field_is_user_defined: false,
        };
        if let Some(first) = spec.property_options().first() {
            spec.property = first.to_string();
        }
        spec.normalize();
        spec
    }

    /// A copy with the same settings and a fresh id.
    pub fn duplicate(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            ..self.clone()
        }
    }

    // --- Reducer ---

    /// Apply `change` and return the resulting spec with the fields that differ.
    pub fn apply(&self, change: FieldChange) -> (FilterSpec, ChangedFields) {
        let mut next = self.clone();
        match change {
            FieldChange::Operator(operator) => next.operator = operator,
            FieldChange::Category(category) => next.category = category,
            FieldChange::Property(property) => next.property = property.trim().to_string(),
            FieldChange::Condition(condition) => next.condition = condition,
            FieldChange::Value(value) => next.value = value,
            FieldChange::CaseInsensitive(flag) => next.case_insensitive = flag,
            FieldChange::UnitClass(class) => {
                if class != next.unit_class {
                    next.unit_class = class;
                    next.unit = Unit::Default;
                }
            }
            FieldChange::Unit(unit) => next.unit = unit,
            FieldChange::IndentLevel(level) => next.indent_level = level,
            FieldChange::Selected(flag) => next.selected = flag,
            FieldChange::FieldIsUserDefined(flag) => next.field_is_user_defined = flag,
        }
        next.normalize();
        let changed = ChangedFields::between(self, &next);
        (next, changed)
    }

    fn update(&mut self, change: FieldChange) -> ChangedFields {
        let (next, changed) = self.apply(change);
        *self = next;
        changed
    }

    /// Bring every dependent field back inside the grammar.
    fn normalize(&mut self) {
        let properties = self.property_options();
        if !properties.is_empty()
            && !self.allow_custom_property()
            && !properties.contains(&self.property.as_str())
        {
            self.property = properties[0].to_string();
        }

        let conditions = self.condition_options();
        if !conditions.is_empty() && !conditions.contains(&self.condition) {
            self.condition = conditions[0];
        }

        if !self.category.is_parameter_like() {
            self.unit_class = UnitClass::None;
        }
        if !units::valid_units(self.unit_class).contains(&self.unit) {
            self.unit = Unit::Default;
        }

        if !self.allow_custom_value() {
            let values = self.value_options();
            let known = values.iter().any(|v| v.eq_ignore_ascii_case(&self.value));
            if !values.is_empty() && !known {
                self.value = values[0].to_string();
            }
        }

        if !self.allow_case_insensitive() {
            self.case_insensitive = false;
        }
    }

    // --- Guarded setters ---

    pub fn set_operator(&mut self, operator: Operator) -> ChangedFields {
        self.update(FieldChange::Operator(operator))
    }

    pub fn set_category(&mut self, category: Category) -> ChangedFields {
        self.update(FieldChange::Category(category))
    }

    pub fn set_property(&mut self, property: impl Into<String>) -> ChangedFields {
        self.update(FieldChange::Property(property.into()))
    }

    pub fn set_condition(&mut self, condition: Condition) -> ChangedFields {
        self.update(FieldChange::Condition(condition))
    }

    pub fn set_value(&mut self, value: impl Into<String>) -> ChangedFields {
        self.update(FieldChange::Value(value.into()))
    }

    pub fn set_case_insensitive(&mut self, flag: bool) -> ChangedFields {
        self.update(FieldChange::CaseInsensitive(flag))
    }

    /// Changing the class resets the unit to `Default`.
    pub fn set_unit_class(&mut self, class: UnitClass) -> ChangedFields {
        self.update(FieldChange::UnitClass(class))
    }

    pub fn set_unit(&mut self, unit: Unit) -> ChangedFields {
        self.update(FieldChange::Unit(unit))
    }

    pub fn set_indent_level(&mut self, level: u32) -> ChangedFields {
        self.update(FieldChange::IndentLevel(level))
    }

    pub fn set_selected(&mut self, flag: bool) -> ChangedFields {
        self.update(FieldChange::Selected(flag))
    }

    pub fn set_field_is_user_defined(&mut self, flag: bool) -> ChangedFields {
        self.update(FieldChange::FieldIsUserDefined(flag))
    }

    // --- Getters ---

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn condition(&self) -> Condition {
        self.condition
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    pub fn unit_class(&self) -> UnitClass {
        self.unit_class
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn indent_level(&self) -> u32 {
        self.indent_level
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn field_is_user_defined(&self) -> bool {
        self.field_is_user_defined
    }

    // --- Option queries ---

    pub fn property_options(&self) -> &'static [&'static str] {
        schema::property_options(self.category)
    }

    pub fn condition_options(&self) -> &'static [Condition] {
        schema::condition_options(self.category, &self.property)
    }

    pub fn value_options(&self) -> &'static [&'static str] {
        schema::value_options(self.category, &self.property, self.condition)
    }

    pub fn unit_options(&self) -> &'static [Unit] {
        units::valid_units(self.unit_class)
    }

    pub fn allow_custom_property(&self) -> bool {
        schema::allow_custom_property(self.category)
    }

    pub fn allow_custom_value(&self) -> bool {
        schema::allow_custom_value(self.category, &self.property, self.condition)
    }

    pub fn allow_case_insensitive(&self) -> bool {
        schema::allow_case_insensitive(
            self.category,
            &self.property,
            self.condition,
            self.unit_class,
        )
    }

    pub fn allow_unit_selection(&self) -> bool {
        self.unit_class != UnitClass::None
    }

    /// Whether the value should be shown with a unit suffix.
    pub fn show_unit_designators(&self) -> bool {
        matches!(self.category, Category::Parameter | Category::HostParameter)
            && !self.field_is_user_defined
            && self.condition.is_numeric()
    }

    /// The value as shown next to the rule, with its unit suffix when one applies.
    pub fn display_value(&self) -> String {
        if self.unit == Unit::Default || !self.show_unit_designators() {
            return self.value.clone();
        }
        match self.unit {
            Unit::Feet | Unit::Inches => format!("{}{}", self.value, units::unit_tag(self.unit)),
            _ => format!("{} {}", self.value, units::unit_tag(self.unit)),
        }
    }

    /// The value converted to internal units, when it is a number.
    pub fn numeric_value(&self) -> Result<f64> {
        let parsed = matcher::parse_number(&self.value)?;
        Ok(units::to_internal(parsed, self.unit))
    }

    /// Check the grammar invariants. Guarded setters keep these true, so a
    /// failure here is a defect.
    pub fn validate(&self) -> Result<()> {
        let properties = self.property_options();
        if !self.allow_custom_property()
            && !properties.is_empty()
            && !properties.contains(&self.property.as_str())
        {
            return Err(FilterError::Validation(format!(
                "property '{}' is not valid for {}",
                self.property, self.category
            )));
        }
        let conditions = self.condition_options();
        if !conditions.is_empty() && !conditions.contains(&self.condition) {
            return Err(FilterError::Validation(format!(
                "condition {} is not valid for {} / '{}'",
                self.condition, self.category, self.property
            )));
        }
        if self.case_insensitive && !self.allow_case_insensitive() {
            return Err(FilterError::Validation(format!(
                "case-insensitive matching is not available for {} / {}",
                self.category, self.condition
            )));
        }
        Ok(())
    }

    /// True when this rule's property is one of the fixed boolean properties.
    pub fn is_boolean_property(&self) -> bool {
        matches!(
            self.property.as_str(),
            props::IS_DEFINED | props::IS_IN_PLACE | props::IS_ELEMENT_TYPE
        )
    }
}

// Replays stored fields through the reducer so loaded specs satisfy the grammar.
impl<'de> Deserialize<'de> for FilterSpec {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let helper = FilterSpecHelper::deserialize(deserializer)?;

        let mut spec = FilterSpec::with_id(helper.id, helper.category);
        spec.set_operator(helper.operator);
        spec.set_property(helper.property);
        spec.set_condition(helper.condition);
        spec.set_unit_class(helper.unit_class);
        spec.set_unit(helper.unit);
        spec.set_value(helper.value);
        spec.set_case_insensitive(helper.case_insensitive);
        spec.set_indent_level(helper.indent_level);
        spec.set_selected(helper.selected);
        spec.set_field_is_user_defined(helper.field_is_user_defined);
        Ok(spec)
    }
}

#[derive(Deserialize)]
struct FilterSpecHelper {
    id: Uuid,
    #[serde(default)]
    operator: Operator,
    category: Category,
    #[serde(default)]
    property: String,
    condition: Condition,
    #[serde(default)]
    value: String,
    #[serde(default)]
    case_insensitive: bool,
    #[serde(default)]
    unit_class: UnitClass,
    #[serde(default)]
    unit: Unit,
    #[serde(default)]
    indent_level: u32,
    #[serde(default)]
    selected: bool,
    #[serde(default)]
    field_is_user_defined: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::props::*;

    #[test]
    fn new_spec_selects_first_options() {
        let spec = FilterSpec::new(Category::Level);
        assert_eq!(spec.property(), NAME);
        assert_eq!(spec.condition(), Condition::Equal);
        assert!(spec.validate().is_ok());

        let spec = FilterSpec::new(Category::TypeOrInstance);
        assert_eq!(spec.property(), IS_ELEMENT_TYPE);
        assert_eq!(spec.value(), "True");
    }

    #[test]
    fn new_parameter_spec_has_empty_property() {
        let spec = FilterSpec::new(Category::Parameter);
        assert_eq!(spec.property(), "");
        assert_eq!(spec.condition(), Condition::Equal);
    }

    #[test]
    fn every_category_starts_valid() {
        for category in Category::ALL {
            let spec = FilterSpec::new(*category);
            assert!(spec.validate().is_ok(), "{}", category);
        }
    }

    #[test]
    fn set_category_coerces_property_and_condition() {
        let mut spec = FilterSpec::new(Category::Level);
        spec.set_property(ELEVATION);
        spec.set_condition(Condition::GreaterThan);

        let changed = spec.set_category(Category::Family);

        assert_eq!(spec.property(), NAME);
        assert_eq!(spec.condition(), Condition::Equal);
        assert!(changed.contains(Field::Category));
        assert!(changed.contains(Field::Property));
        assert!(changed.contains(Field::Condition));
        assert!(!changed.contains(Field::Value));
    }

    #[test]
    fn set_category_keeps_property_when_still_valid() {
        let mut spec = FilterSpec::new(Category::Level);
        spec.set_condition(Condition::Contains);

        let changed = spec.set_category(Category::DesignOption);

        assert_eq!(spec.property(), NAME);
        assert_eq!(spec.condition(), Condition::Contains);
        assert!(!changed.contains(Field::Property));
        assert!(!changed.contains(Field::Condition));
    }

    #[test]
    fn custom_property_is_preserved() {
        let mut spec = FilterSpec::new(Category::Level);
        let changed = spec.set_category(Category::Parameter);
        assert_eq!(spec.property(), NAME);
        assert!(!changed.contains(Field::Property));

        spec.set_property("  Fire Rating ");
        assert_eq!(spec.property(), "Fire Rating");
    }

    #[test]
    fn invalid_property_is_coerced_to_first_option() {
        let mut spec = FilterSpec::new(Category::Level);
        let changed = spec.set_property("Height");
        assert_eq!(spec.property(), NAME);
        assert!(changed.is_empty());
    }

    #[test]
    fn property_change_recomputes_conditions() {
        let mut spec = FilterSpec::new(Category::Level);
        spec.set_condition(Condition::WildCard);

        let changed = spec.set_property(ELEVATION);

        assert_eq!(spec.condition(), Condition::Equal);
        assert!(changed.contains(Field::Property));
        assert!(changed.contains(Field::Condition));
        assert!(changed.affects_options());
    }

    #[test]
    fn invalid_condition_is_rejected_by_coercion() {
        let mut spec = FilterSpec::new(Category::TypeOrInstance);
        let changed = spec.set_condition(Condition::Contains);
        assert_eq!(spec.condition(), Condition::Equal);
        assert!(changed.is_empty());
    }

    #[test]
    fn apply_is_pure() {
        let spec = FilterSpec::new(Category::Level);
        let (next, changed) = spec.apply(FieldChange::Property(ELEVATION.into()));
        assert_eq!(spec.property(), NAME);
        assert_eq!(next.property(), ELEVATION);
        assert!(changed.contains(Field::Property));
        assert_eq!(next.id(), spec.id());
    }

    #[test]
    fn unchanged_value_reports_nothing() {
        let mut spec = FilterSpec::new(Category::Family);
        spec.set_value("Door");
        let changed = spec.set_value("Door");
        assert!(changed.is_empty());
    }

    #[test]
    fn case_insensitive_allowed_for_text_conditions() {
        let mut spec = FilterSpec::new(Category::Family);
        spec.set_condition(Condition::Contains);
        let changed = spec.set_case_insensitive(true);
        assert!(spec.case_insensitive());
        assert!(changed.contains(Field::CaseInsensitive));
    }

    #[test]
    fn case_insensitive_forced_off_for_existence_conditions() {
        let mut spec = FilterSpec::new(Category::Level);
        spec.set_case_insensitive(true);
        assert!(spec.case_insensitive());

        let changed = spec.set_condition(Condition::Defined);
        assert!(!spec.case_insensitive());
        assert!(changed.contains(Field::CaseInsensitive));

        spec.set_case_insensitive(true);
        assert!(!spec.case_insensitive());
    }

    #[test]
    fn case_insensitive_forced_off_by_units() {
        let mut spec = FilterSpec::new(Category::Parameter);
        spec.set_property("Width");
        spec.set_case_insensitive(true);
        assert!(spec.case_insensitive());

        let changed = spec.set_unit_class(UnitClass::Length);
        assert!(!spec.case_insensitive());
        assert!(changed.contains(Field::UnitClass));
        assert!(changed.contains(Field::CaseInsensitive));
    }

    #[test]
    fn case_insensitive_forced_off_for_fixed_values() {
        let mut spec = FilterSpec::new(Category::StructuralType);
        spec.set_case_insensitive(true);
        assert!(!spec.case_insensitive());
    }

    #[test]
    fn unit_class_resets_unit() {
        let mut spec = FilterSpec::new(Category::Parameter);
        spec.set_property("Width");
        spec.set_unit_class(UnitClass::Length);
        spec.set_unit(Unit::Millimeters);
        assert_eq!(spec.unit(), Unit::Millimeters);

        let changed = spec.set_unit_class(UnitClass::Area);
        assert_eq!(spec.unit(), Unit::Default);
        assert!(changed.contains(Field::Unit));
    }

    #[test]
    fn unit_outside_class_is_rejected() {
        let mut spec = FilterSpec::new(Category::Parameter);
        spec.set_unit_class(UnitClass::Length);
        spec.set_unit(Unit::Degrees);
        assert_eq!(spec.unit(), Unit::Default);
    }

    #[test]
    fn leaving_parameter_category_clears_units() {
        let mut spec = FilterSpec::new(Category::Parameter);
        spec.set_unit_class(UnitClass::Length);
        spec.set_unit(Unit::Meters);

        let changed = spec.set_category(Category::Level);

        assert_eq!(spec.unit_class(), UnitClass::None);
        assert_eq!(spec.unit(), Unit::Default);
        assert!(changed.contains(Field::UnitClass));
        assert!(changed.contains(Field::Unit));
    }

    #[test]
    fn fixed_values_are_coerced() {
        let mut spec = FilterSpec::new(Category::StructuralType);
        spec.set_value("Beam");
        assert_eq!(spec.value(), "Beam");
        spec.set_value("Slab");
        assert_eq!(spec.value(), "NonStructural");
    }

    #[test]
    fn boolean_values_accept_any_case() {
        let mut spec = FilterSpec::new(Category::View);
        spec.set_property(IS_DEFINED);
        spec.set_value("false");
        assert_eq!(spec.value(), "false");
    }

    #[test]
    fn numeric_value_converts_units() {
        let mut spec = FilterSpec::new(Category::Parameter);
        spec.set_property("Width");
        spec.set_unit_class(UnitClass::Length);
        spec.set_unit(Unit::Inches);
        spec.set_value("6");
        assert_eq!(spec.numeric_value().unwrap(), 0.5);

        spec.set_value("six");
        assert!(matches!(spec.numeric_value(), Err(FilterError::Parse { .. })));
        spec.set_value("NaN");
        assert!(spec.numeric_value().is_err());
    }

    #[test]
    fn display_value_uses_unit_tag() {
        let mut spec = FilterSpec::new(Category::Parameter);
        spec.set_property("Width");
        spec.set_unit_class(UnitClass::Length);
        spec.set_unit(Unit::Millimeters);
        spec.set_value("300");
        assert_eq!(spec.display_value(), "300 mm");

        spec.set_unit(Unit::Feet);
        assert_eq!(spec.display_value(), "300'");

        spec.set_field_is_user_defined(true);
        assert_eq!(spec.display_value(), "300");
    }

    #[test]
    fn duplicate_gets_new_id() {
        let mut spec = FilterSpec::new(Category::Family);
        spec.set_value("Door");
        let copy = spec.duplicate();
        assert_ne!(copy.id(), spec.id());
        assert_eq!(copy.value(), "Door");
    }

    #[test]
    fn bookkeeping_fields_do_not_cascade() {
        let mut spec = FilterSpec::new(Category::Family);
        let changed = spec.set_indent_level(2);
        assert_eq!(changed.len(), 1);
        assert!(!changed.affects_options());
        let changed = spec.set_selected(true);
        assert!(changed.contains(Field::Selected));
        assert!(spec.is_selected());
    }

    #[test]
    fn serde_round_trip_preserves_state() {
        let mut spec = FilterSpec::new(Category::Family);
        spec.set_condition(Condition::Contains);
        spec.set_value("Door");
        spec.set_case_insensitive(true);
        spec.set_operator(Operator::Or);

        let json = serde_json::to_string(&spec).unwrap();
        let loaded: FilterSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, spec);
    }

    #[test]
    fn deserialize_repairs_out_of_grammar_state() {
        let id = Uuid::new_v4();
        let json = format!(
            r#"{{"id":"{}","category":"Level","property":"Height","condition":"Contains","case_insensitive":true}}"#,
            id
        );
        let spec: FilterSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(spec.id(), id);
        assert_eq!(spec.property(), NAME);
        assert_eq!(spec.condition(), Condition::Contains);
        assert!(spec.case_insensitive());
        assert!(spec.validate().is_ok());
    }
}
