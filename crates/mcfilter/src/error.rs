use thiserror::Error;

use crate::schema::{Category, Condition};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// A filter is outside its own grammar. Guarded setters make this a defect.
    #[error("Invalid filter state: {0}")]
    Validation(String),

    #[error("Cannot read '{value}' as {expected}")]
    Parse {
        value: String,
        expected: &'static str,
    },

    #[error("Invalid wildcard pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("No filter rule for {category} / '{property}' / {condition}")]
    Unsupported {
        category: Category,
        property: String,
        condition: Condition,
    },

    #[error("Config error: {0}")]
    Config(String),
}

impl FilterError {
    pub fn parse(value: impl Into<String>, expected: &'static str) -> Self {
        FilterError::Parse {
            value: value.into(),
            expected,
        }
    }

    pub fn unsupported(category: Category, property: &str, condition: Condition) -> Self {
        FilterError::Unsupported {
            category,
            property: property.to_string(),
            condition,
        }
    }

    /// True for errors that indicate a bug rather than bad user input.
    pub fn is_defect(&self) -> bool {
        matches!(self, FilterError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, FilterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_validation_errors_are_defects() {
        assert!(FilterError::Validation("bad".into()).is_defect());
        assert!(!FilterError::parse("abc", "a number").is_defect());
        assert!(
            !FilterError::unsupported(Category::Room, "Name", Condition::Equal).is_defect()
        );
    }

    #[test]
    fn messages_name_the_offending_input() {
        let err = FilterError::parse("ten", "a number");
        assert_eq!(err.to_string(), "Cannot read 'ten' as a number");

        let err = FilterError::unsupported(Category::Room, "Name", Condition::Equal);
        assert_eq!(err.to_string(), "No filter rule for Room / 'Name' / Equal");
    }
}
