use thiserror::Error;

pub type Result<T> = std::result::Result<T, SelectorSyntaxError>;

/// Everything that can go wrong turning selector text (or a hand-built
/// requirement) into a selector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorSyntaxError {
    /// A run of special symbols the lexer has no token for.
    #[error("error expected: keyword found {literal}")]
    UnknownSymbol { literal: String },

    #[error("found '{found}', expected {expected}")]
    Unexpected { found: String, expected: &'static str },

    /// Key or value that selector text could not spell: empty key,
    /// whitespace, or one of `= ! ( ) , > <`.
    #[error("'{literal}' is not a valid selector identifier")]
    InvalidIdentifier { literal: String },

    #[error("for 'in' and 'notin' operator, values set can't be empty")]
    EmptyValues,

    #[error("exact-match compatibility requires one single value")]
    SingleValueRequired,

    #[error("values set must be empty for exists and does not exist")]
    ValuesNotAllowed,

    #[error("for 'gt' and 'lt' operators, exactly one value is required")]
    ComparisonArity,

    #[error("for 'gt' and 'lt' operators, the value must be an integer, found '{value}'")]
    NonIntegerComparison { value: String },

    #[error("operator {operator} not supported, valid operators are: {valid}")]
    UnsupportedOperator { operator: String, valid: String },

    #[error("unable to parse requirement: {0}")]
    Requirement(#[source] Box<SelectorSyntaxError>),
}

pub(crate) fn unexpected(found: &str, expected: &'static str) -> SelectorSyntaxError {
    SelectorSyntaxError::Unexpected {
        found: found.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn formats_unexpected_token() {
        let err = unexpected("=", "',' or 'end of string'");
        assert_eq!(err.to_string(), "found '=', expected ',' or 'end of string'");
    }

    #[test]
    fn formats_invalid_identifier() {
        let err = SelectorSyntaxError::InvalidIdentifier {
            literal: "my web".to_string(),
        };
        assert_eq!(err.to_string(), "'my web' is not a valid selector identifier");
    }

    #[test]
    fn requirement_wrapper_keeps_cause() {
        let err = SelectorSyntaxError::Requirement(Box::new(SelectorSyntaxError::EmptyValues));
        assert_eq!(
            err.to_string(),
            "unable to parse requirement: for 'in' and 'notin' operator, values set can't be empty"
        );
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), SelectorSyntaxError::EmptyValues.to_string());
    }
}
