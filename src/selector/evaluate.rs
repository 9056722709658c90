use log::debug;

use crate::{
    labels::Labels,
    selector::{
        Inner,
        Selector,
        requirement::{Operator, Requirement},
    },
};

impl Requirement {
    /// Whether `labels` satisfy this requirement. Keys and values compare
    /// case-sensitively.
    pub fn matches<L: Labels + ?Sized>(&self, labels: &L) -> bool {
        match self.operator() {
            Operator::In | Operator::Equals | Operator::DoubleEquals => labels
                .get(self.key())
                .is_some_and(|value| self.has_value(value)),
            Operator::NotIn | Operator::NotEquals => labels
                .get(self.key())
                .is_none_or(|value| !self.has_value(value)),
            Operator::Exists => labels.has(self.key()),
            Operator::DoesNotExist => !labels.has(self.key()),
            Operator::GreaterThan | Operator::LessThan => self.compare(labels),
        }
    }

    // A label value that is not an integer never satisfies a comparison.
    fn compare<L: Labels + ?Sized>(&self, labels: &L) -> bool {
        let Some(value) = labels.get(self.key()) else {
            return false;
        };
        let Some(bound) = self.values().next().and_then(|b| b.parse::<i64>().ok()) else {
            return false;
        };
        let Ok(actual) = value.parse::<i64>() else {
            debug!(
                "label {}={value:?} is not an integer, '{self}' does not match",
                self.key()
            );
            return false;
        };

        match self.operator() {
            Operator::GreaterThan => actual > bound,
            Operator::LessThan => actual < bound,
            _ => false,
        }
    }
}

impl Selector {
    /// Whether `labels` satisfy every requirement. Always true for
    /// `everything()`, always false for `nothing()`.
    pub fn matches<L: Labels + ?Sized>(&self, labels: &L) -> bool {
        match &self.0 {
            Inner::Requirements(requirements) => requirements.iter().all(|r| r.matches(labels)),
            Inner::Nothing => false,
        }
    }
}
