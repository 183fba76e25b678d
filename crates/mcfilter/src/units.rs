//! Display units for numeric parameter filters.
//!
//! Filter values are typed in the unit the user picked; model values are
//! stored in internal units (feet, square feet, cubic feet, radians).
//! [`to_internal`] bridges the two before any comparison happens.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UnitClass {
    #[default]
    None,
    Length,
    Area,
    Volume,
    Angle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Unit {
    /// Value is already in internal units.
    #[default]
    Default,
    Feet,
    Inches,
    Meters,
    Centimeters,
    Millimeters,
    SquareFeet,
    SquareMeters,
    CubicFeet,
    CubicMeters,
    Degrees,
    Radians,
}

const FEET_PER_METER: f64 = 1.0 / 0.3048;

/// Units selectable for `class`, `Default` first.
pub fn valid_units(class: UnitClass) -> &'static [Unit] {
    match class {
        UnitClass::None => &[Unit::Default],
        UnitClass::Length => &[
            Unit::Default,
            Unit::Feet,
            Unit::Inches,
            Unit::Meters,
            Unit::Centimeters,
            Unit::Millimeters,
        ],
        UnitClass::Area => &[Unit::Default, Unit::SquareFeet, Unit::SquareMeters],
        UnitClass::Volume => &[Unit::Default, Unit::CubicFeet, Unit::CubicMeters],
        UnitClass::Angle => &[Unit::Default, Unit::Degrees, Unit::Radians],
    }
}

/// Convert `value` expressed in `unit` to internal units.
pub fn to_internal(value: f64, unit: Unit) -> f64 {
    match unit {
        Unit::Default | Unit::Feet | Unit::SquareFeet | Unit::CubicFeet | Unit::Radians => value,
        Unit::Inches => value / 12.0,
        Unit::Meters => value * FEET_PER_METER,
        Unit::Centimeters => value * FEET_PER_METER / 100.0,
        Unit::Millimeters => value * FEET_PER_METER / 1000.0,
        Unit::SquareMeters => value * FEET_PER_METER * FEET_PER_METER,
        Unit::CubicMeters => value * FEET_PER_METER * FEET_PER_METER * FEET_PER_METER,
        Unit::Degrees => value.to_radians(),
    }
}

/// Short suffix shown after a value.
pub fn unit_tag(unit: Unit) -> &'static str {
    match unit {
        Unit::Default => "",
        Unit::Feet => "'",
        Unit::Inches => "\"",
        Unit::Meters => "m",
        Unit::Centimeters => "cm",
        Unit::Millimeters => "mm",
        Unit::SquareFeet => "ft²",
        Unit::SquareMeters => "m²",
        Unit::CubicFeet => "ft³",
        Unit::CubicMeters => "m³",
        Unit::Degrees => "°",
        Unit::Radians => "rad",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn default_is_first_in_every_class() {
        for class in [
            UnitClass::None,
            UnitClass::Length,
            UnitClass::Area,
            UnitClass::Volume,
            UnitClass::Angle,
        ] {
            assert_eq!(valid_units(class)[0], Unit::Default);
        }
    }

    #[test]
    fn length_conversions() {
        assert!(close(to_internal(12.0, Unit::Inches), 1.0));
        assert!(close(to_internal(0.3048, Unit::Meters), 1.0));
        assert!(close(to_internal(304.8, Unit::Millimeters), 1.0));
        assert!(close(to_internal(30.48, Unit::Centimeters), 1.0));
        assert!(close(to_internal(3.0, Unit::Feet), 3.0));
    }

    #[test]
    fn area_and_volume_conversions() {
        assert!(close(to_internal(0.09290304, Unit::SquareMeters), 1.0));
        assert!(close(to_internal(0.028316846592, Unit::CubicMeters), 1.0));
    }

    #[test]
    fn angles_are_stored_in_radians() {
        assert!(close(to_internal(180.0, Unit::Degrees), std::f64::consts::PI));
        assert!(close(to_internal(1.5, Unit::Radians), 1.5));
    }

    #[test]
    fn tags() {
        assert_eq!(unit_tag(Unit::Millimeters), "mm");
        assert_eq!(unit_tag(Unit::Default), "");
    }
}
