//! Value tests shared by every compiled predicate.
//!
//! A [`TextTest`] compares a name (or a parameter's text) against the filter
//! value. A [`NumericTest`] compares a rounded model number against a parsed
//! threshold. A [`ParameterTest`] combines both with the presence checks
//! parameter filters need.

use regex::{Regex, RegexBuilder};

use crate::config::EngineConfig;
use crate::error::{FilterError, Result};
use crate::model::{Element, ParamValue};
use crate::schema::Condition;
use crate::text::{self, Locale};

/// Round `value` to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Parse a number the way filter values are typed: invariant culture, surrounding
/// whitespace ignored.
pub fn parse_number(value: &str) -> Result<f64> {
    match value.trim().parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(number),
        _ => Err(FilterError::parse(value, "a number")),
    }
}

/// Parse a `True`/`False` literal, ignoring case.
pub fn parse_bool(value: &str) -> Result<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(FilterError::parse(value, "True or False"))
    }
}

/// A string comparison.
#[derive(Debug, Clone)]
pub enum TextTest {
    Equal { value: String, case_insensitive: bool },
    NotEqual { value: String, case_insensitive: bool },
    Contains { value: String, case_insensitive: bool, locale: Locale },
    DoesNotContain { value: String, case_insensitive: bool, locale: Locale },
    /// The filter value used directly as a regular expression.
    Pattern { regex: Regex, negate: bool },
}

impl TextTest {
    /// Build the test for a string-comparison `condition`.
    ///
    /// Wildcard values that are not valid regular expressions are reported as
    /// [`FilterError::InvalidPattern`].
    pub fn new(
        condition: Condition,
        value: &str,
        case_insensitive: bool,
        locale: Locale,
    ) -> Result<Self> {
        let value = value.to_string();
        let test = match condition {
            Condition::Equal => TextTest::Equal { value, case_insensitive },
            Condition::NotEqual => TextTest::NotEqual { value, case_insensitive },
            Condition::Contains => TextTest::Contains {
                value,
                case_insensitive,
                locale,
            },
            Condition::DoesNotContain => TextTest::DoesNotContain {
                value,
                case_insensitive,
                locale,
            },
            Condition::WildCard | Condition::WildCardNoMatch => {
                let regex = RegexBuilder::new(&value)
                    .case_insensitive(case_insensitive)
                    .build()
                    .map_err(|e| FilterError::InvalidPattern {
                        pattern: value.clone(),
                        message: e.to_string(),
                    })?;
                TextTest::Pattern {
                    regex,
                    negate: condition == Condition::WildCardNoMatch,
                }
            }
            other => {
                return Err(FilterError::Validation(format!(
                    "{} is not a text comparison",
                    other
                )))
            }
        };
        Ok(test)
    }

    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            TextTest::Equal { value, case_insensitive } => {
                text::equals(candidate, value, *case_insensitive)
            }
            TextTest::NotEqual { value, case_insensitive } => {
                !text::equals(candidate, value, *case_insensitive)
            }
            TextTest::Contains {
                value,
                case_insensitive,
                locale,
            } => text::contains(candidate, value, *case_insensitive, *locale),
            TextTest::DoesNotContain {
                value,
                case_insensitive,
                locale,
            } => !text::contains(candidate, value, *case_insensitive, *locale),
            TextTest::Pattern { regex, negate } => regex.is_match(candidate) != *negate,
        }
    }
}

/// A numeric comparison against a rounded model value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericTest {
    condition: Condition,
    threshold: f64,
    tolerance: f64,
    decimals: u32,
}

impl NumericTest {
    /// `threshold` must already be in internal units.
    pub fn new(condition: Condition, threshold: f64, config: &EngineConfig) -> Result<Self> {
        if !condition.is_numeric() {
            return Err(FilterError::Validation(format!(
                "{} is not a numeric comparison",
                condition
            )));
        }
        Ok(Self {
            condition,
            threshold,
            tolerance: config.numeric_tolerance,
            decimals: config.rounding_decimals,
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn matches(&self, value: f64) -> bool {
        let value = round_to(value, self.decimals);
        match self.condition {
            Condition::Equal => (value - self.threshold).abs() < self.tolerance,
            Condition::NotEqual => (value - self.threshold).abs() > self.tolerance,
            Condition::GreaterThan => value > self.threshold,
            Condition::LessThan => value < self.threshold,
            Condition::GreaterOrEqual => value >= self.threshold,
            Condition::LessOrEqual => value <= self.threshold,
            _ => false,
        }
    }
}

/// A test applied to one named parameter of an element.
///
/// Every variant except [`ParameterTest::Undefined`] fails on an element that
/// does not define the parameter.
#[derive(Debug, Clone)]
pub enum ParameterTest {
    Defined,
    Undefined,
    HasValue,
    HasNoValue,
    /// Numbers compare numerically when the filter value parses as one;
    /// everything else compares as text.
    Compare {
        text: TextTest,
        number: Option<NumericTest>,
    },
    /// Ordering conditions only apply to numeric parameters.
    Ordering(NumericTest),
    /// The parameter equals (or differs from) another parameter of the same element.
    SameAs {
        other: String,
        case_insensitive: bool,
        negate: bool,
    },
}

impl ParameterTest {
    pub fn matches(&self, element: &Element, name: &str) -> bool {
        let param = element.parameter(name);
        match self {
            ParameterTest::Undefined => param.is_none(),
            ParameterTest::Defined => param.is_some(),
            ParameterTest::HasValue => param.is_some_and(ParamValue::has_value),
            ParameterTest::HasNoValue => param.is_some_and(|p| !p.has_value()),
            ParameterTest::Compare { text, number } => match param {
                Some(p) => match (p.as_number(), number) {
                    (Some(value), Some(test)) => test.matches(value),
                    _ => text.matches(&p.as_text()),
                },
                None => false,
            },
            ParameterTest::Ordering(test) => param
                .and_then(ParamValue::as_number)
                .is_some_and(|value| test.matches(value)),
            ParameterTest::SameAs {
                other,
                case_insensitive,
                negate,
            } => match (param, element.parameter(other)) {
                (Some(a), Some(b)) => {
                    let same = match (a.as_number(), b.as_number()) {
                        (Some(x), Some(y)) => x == y,
                        _ => text::equals(&a.as_text(), &b.as_text(), *case_insensitive),
                    };
                    same != *negate
                }
                _ => false,
            },
        }
    }
}
