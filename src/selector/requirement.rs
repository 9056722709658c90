use std::{collections::BTreeSet, fmt, str::FromStr};

use crate::{
    error::{Result, SelectorSyntaxError},
    selector::lexer::is_identifier,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operator {
    DoesNotExist, // !
    Equals,       // =
    DoubleEquals, // ==
    In,           // in
    NotEquals,    // !=
    NotIn,        // notin
    Exists,       // exists
    GreaterThan,  // gt
    LessThan,     // lt
}

impl Operator {
    pub const UNARY: [Operator; 1] = [Operator::DoesNotExist];

    pub const BINARY: [Operator; 7] = [
        Operator::In,
        Operator::NotIn,
        Operator::Equals,
        Operator::DoubleEquals,
        Operator::NotEquals,
        Operator::GreaterThan,
        Operator::LessThan,
    ];

    pub const ALL: [Operator; 9] = [
        Operator::In,
        Operator::NotIn,
        Operator::Equals,
        Operator::DoubleEquals,
        Operator::NotEquals,
        Operator::GreaterThan,
        Operator::LessThan,
        Operator::Exists,
        Operator::DoesNotExist,
    ];

    /// `in, notin, ...` listing for error messages.
    pub(crate) fn join(operators: &[Operator]) -> String {
        operators
            .iter()
            .map(|op| op.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Operator::DoesNotExist => "!",
            Operator::Equals => "=",
            Operator::DoubleEquals => "==",
            Operator::In => "in",
            Operator::NotEquals => "!=",
            Operator::NotIn => "notin",
            Operator::Exists => "exists",
            Operator::GreaterThan => "gt",
            Operator::LessThan => "lt",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = SelectorSyntaxError;

    fn from_str(s: &str) -> Result<Self> {
        Operator::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| SelectorSyntaxError::UnsupportedOperator {
                operator: s.to_string(),
                valid: Operator::join(&Operator::ALL),
            })
    }
}

/// A single constraint over a label map: key, operator and value set.
///
/// Always valid once built: key and values are identifiers the selector
/// grammar can express, the value set has the arity the operator needs,
/// and comparison operators carry an integer bound.
///
/// Ordered by key, then operator, then value set; selectors keep their
/// requirements in this order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Requirement {
    key: String,
    operator: Operator,
    values: BTreeSet<String>,
}

impl Requirement {
    /// Build a requirement, deduplicating `values` before checking them
    /// against the operator.
    ///
    /// The key must be a non-empty identifier and values must be (possibly
    /// empty) identifiers: no whitespace and none of `= ! ( ) , > <`.
    pub fn new<I, V>(key: impl Into<String>, operator: Operator, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let key = key.into();
        if key.is_empty() || !is_identifier(&key) {
            return Err(SelectorSyntaxError::InvalidIdentifier { literal: key });
        }

        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if let Some(value) = values.iter().find(|v| !is_identifier(v)) {
            return Err(SelectorSyntaxError::InvalidIdentifier {
                literal: value.clone(),
            });
        }

        match operator {
            Operator::In | Operator::NotIn => {
                if values.is_empty() {
                    return Err(SelectorSyntaxError::EmptyValues);
                }
            }
            Operator::Equals | Operator::DoubleEquals | Operator::NotEquals => {
                if values.len() != 1 {
                    return Err(SelectorSyntaxError::SingleValueRequired);
                }
            }
            Operator::Exists | Operator::DoesNotExist => {
                if !values.is_empty() {
                    return Err(SelectorSyntaxError::ValuesNotAllowed);
                }
            }
            Operator::GreaterThan | Operator::LessThan => {
                let mut iter = values.iter();
                let (Some(bound), None) = (iter.next(), iter.next()) else {
                    return Err(SelectorSyntaxError::ComparisonArity);
                };
                if bound.parse::<i64>().is_err() {
                    return Err(SelectorSyntaxError::NonIntegerComparison {
                        value: bound.clone(),
                    });
                }
            }
        }

        Ok(Self {
            key,
            operator,
            values,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Values in sorted order.
    pub fn values(&self) -> impl ExactSizeIterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }

    pub fn has_value(&self, value: &str) -> bool {
        self.values.contains(value)
    }
}

/// Canonical selector text for this requirement, e.g. `tier in (api,web)`.
impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self.operator {
            Operator::DoesNotExist => return write!(f, "!{}", self.key),
            Operator::Exists => return f.write_str(&self.key),
            Operator::In | Operator::NotIn => {
                let values: Vec<&str> = self.values().collect();
                return write!(f, "{} {} ({})", self.key, self.operator, values.join(","));
            }
            Operator::Equals => "=",
            Operator::DoubleEquals => "==",
            Operator::NotEquals => "!=",
            Operator::GreaterThan => ">",
            Operator::LessThan => "<",
        };
        let value = self.values().next().unwrap_or_default();
        write!(f, "{}{symbol}{value}", self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: [&str; 0] = [];

    #[test]
    fn operator_round_trips_through_text() {
        for op in Operator::ALL {
            assert_eq!(op.as_str().parse::<Operator>().unwrap(), op);
        }
    }

    #[test]
    fn unknown_operator_lists_valid_ones() {
        let err = "~=".parse::<Operator>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "operator ~= not supported, valid operators are: in, notin, =, ==, !=, gt, lt, exists, !"
        );
    }

    #[test]
    fn unary_and_binary_cover_everything_but_exists() {
        for op in Operator::ALL {
            let unary = Operator::UNARY.contains(&op);
            let binary = Operator::BINARY.contains(&op);
            assert_eq!(unary || binary, op != Operator::Exists, "{op}");
            assert!(!(unary && binary), "{op}");
        }
    }

    #[test]
    fn set_operators_need_values() {
        assert_eq!(
            Requirement::new("x", Operator::In, NONE),
            Err(SelectorSyntaxError::EmptyValues)
        );
        assert_eq!(
            Requirement::new("x", Operator::NotIn, NONE),
            Err(SelectorSyntaxError::EmptyValues)
        );
        assert!(Requirement::new("x", Operator::In, [""]).is_ok());
    }

    #[test]
    fn equality_needs_exactly_one_value() {
        for op in [Operator::Equals, Operator::DoubleEquals, Operator::NotEquals] {
            assert_eq!(
                Requirement::new("x", op, ["a", "b"]),
                Err(SelectorSyntaxError::SingleValueRequired)
            );
            assert_eq!(
                Requirement::new("x", op, NONE),
                Err(SelectorSyntaxError::SingleValueRequired)
            );
        }
        // duplicates collapse before the arity check
        assert!(Requirement::new("x", Operator::Equals, ["a", "a"]).is_ok());
    }

    #[test]
    fn existence_takes_no_values() {
        assert_eq!(
            Requirement::new("x", Operator::Exists, ["a"]),
            Err(SelectorSyntaxError::ValuesNotAllowed)
        );
        assert!(Requirement::new("x", Operator::DoesNotExist, NONE).is_ok());
    }

    #[test]
    fn comparison_needs_one_integer() {
        assert_eq!(
            Requirement::new("x", Operator::GreaterThan, ["1", "2"]),
            Err(SelectorSyntaxError::ComparisonArity)
        );
        assert_eq!(
            Requirement::new("x", Operator::LessThan, ["a"]),
            Err(SelectorSyntaxError::NonIntegerComparison {
                value: "a".to_string()
            })
        );
        assert!(Requirement::new("x", Operator::LessThan, ["-3"]).is_ok());
    }

    #[test]
    fn rejects_text_the_grammar_cannot_express() {
        let invalid = |literal: &str| SelectorSyntaxError::InvalidIdentifier {
            literal: literal.to_string(),
        };

        assert_eq!(Requirement::new("", Operator::Exists, NONE), Err(invalid("")));
        assert_eq!(Requirement::new("a,b", Operator::Exists, NONE), Err(invalid("a,b")));
        assert_eq!(Requirement::new("a b", Operator::DoesNotExist, NONE), Err(invalid("a b")));
        assert_eq!(
            Requirement::new("app", Operator::Equals, ["my web"]),
            Err(invalid("my web"))
        );
        assert_eq!(
            Requirement::new("app", Operator::In, ["ok", "x)"]),
            Err(invalid("x)"))
        );
        for symbol in ["=", "!", "(", ")", ",", ">", "<"] {
            assert!(Requirement::new("x", Operator::NotEquals, [symbol]).is_err(), "{symbol}");
        }

        // empty values and keyword-looking text are expressible
        assert!(Requirement::new("x", Operator::Equals, [""]).is_ok());
        assert!(Requirement::new("in", Operator::NotIn, ["notin"]).is_ok());
    }

    #[test]
    fn orders_by_key_then_operator_then_values() {
        let gt = Requirement::new("a", Operator::GreaterThan, ["1"]).unwrap();
        let lt = Requirement::new("a", Operator::LessThan, ["5"]).unwrap();
        let b = Requirement::new("b", Operator::Exists, NONE).unwrap();
        let in_x = Requirement::new("a", Operator::In, ["x"]).unwrap();
        let in_xy = Requirement::new("a", Operator::In, ["x", "y"]).unwrap();

        assert!(gt < lt);
        assert!(lt < b);
        assert!(in_x < in_xy);
    }

    #[test]
    fn equality_ignores_value_order() {
        let a = Requirement::new("x", Operator::In, ["a", "b"]).unwrap();
        let b = Requirement::new("x", Operator::In, ["b", "a", "b"]).unwrap();
        assert_eq!(a, b);

        let c = Requirement::new("x", Operator::NotIn, ["a", "b"]).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn renders_canonical_text() {
        let cases = [
            (Requirement::new("x", Operator::DoesNotExist, NONE), "!x"),
            (Requirement::new("x", Operator::Exists, NONE), "x"),
            (Requirement::new("x", Operator::Equals, ["a"]), "x=a"),
            (Requirement::new("x", Operator::DoubleEquals, ["a"]), "x==a"),
            (Requirement::new("x", Operator::NotEquals, [""]), "x!="),
            (Requirement::new("x", Operator::GreaterThan, ["1"]), "x>1"),
            (Requirement::new("x", Operator::LessThan, ["1"]), "x<1"),
            (Requirement::new("x", Operator::In, ["b", "a"]), "x in (a,b)"),
            (Requirement::new("x", Operator::NotIn, ["", "a"]), "x notin (,a)"),
        ];

        for (requirement, expected) in cases {
            assert_eq!(requirement.unwrap().to_string(), expected);
        }
    }
}
