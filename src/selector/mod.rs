pub mod evaluate;
pub mod lexer;
pub mod parse;
pub mod requirement;

use std::{fmt, str::FromStr, sync::Arc};

use log::debug;
use once_cell::sync::Lazy;

use crate::{
    error::{Result, SelectorSyntaxError},
    selector::requirement::{Operator, Requirement},
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Inner {
    /// AND of requirements in `Requirement` order. Empty matches everything.
    Requirements(Arc<[Requirement]>),
    /// Matches no label map at all.
    Nothing,
}

/// An immutable label selector: a conjunction of requirements kept in
/// canonical order (see [`Requirement`]), or the `Nothing` sentinel.
///
/// ```
/// use std::collections::HashMap;
/// use labelsel::Selector;
///
/// let selector = Selector::parse("app=web, tier in (api, frontend)").unwrap();
/// let labels = HashMap::from([("app", "web"), ("tier", "api")]);
/// assert!(selector.matches(&labels));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector(Inner);

static EVERYTHING: Lazy<Selector> =
    Lazy::new(|| Selector(Inner::Requirements(Arc::from(Vec::new()))));

impl Selector {
    /// Selector with no requirements; matches every label map.
    pub fn everything() -> Self {
        EVERYTHING.clone()
    }

    /// Selector that matches no label map.
    pub const fn nothing() -> Self {
        Selector(Inner::Nothing)
    }

    /// Parse selector text into a selector in canonical order.
    pub fn parse(text: &str) -> Result<Self> {
        parse::parse(text)
            .map(Self::from_requirements)
            .inspect_err(|e| debug!("rejected label selector {text:?}: {e}"))
    }

    /// Selector over `requirements`, sorted by key, then operator, then
    /// values. The result does not depend on input order.
    pub fn from_requirements(requirements: impl IntoIterator<Item = Requirement>) -> Self {
        let mut requirements: Vec<Requirement> = requirements.into_iter().collect();
        requirements.sort();
        Selector(Inner::Requirements(requirements.into()))
    }

    /// Selector pinning every key of `labels` to its value with `=`.
    ///
    /// Fails with `InvalidIdentifier` for a key or value selector text
    /// cannot spell, e.g. one containing whitespace or `,`.
    pub fn from_labels<K, V>(labels: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let requirements = labels
            .into_iter()
            .map(|(key, value)| Requirement::new(key, Operator::Equals, [value]))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_requirements(requirements))
    }

    /// New selector with `requirements` added. `Nothing` stays `Nothing`.
    pub fn add(&self, requirements: impl IntoIterator<Item = Requirement>) -> Self {
        match &self.0 {
            Inner::Nothing => self.clone(),
            Inner::Requirements(existing) => {
                Self::from_requirements(existing.iter().cloned().chain(requirements))
            }
        }
    }

    /// Requirements in canonical order; none for `Nothing`.
    pub fn requirements(&self) -> &[Requirement] {
        match &self.0 {
            Inner::Requirements(requirements) => &requirements[..],
            Inner::Nothing => &[],
        }
    }

    /// True when there are no requirements, i.e. for `everything()`.
    ///
    /// `Nothing` holds no requirements either but reports `false`: an empty
    /// selector matches everything, and `Nothing` matches nothing.
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Inner::Requirements(requirements) => requirements.is_empty(),
            Inner::Nothing => false,
        }
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self.0, Inner::Nothing)
    }

    /// The value `key` is pinned to, if the first requirement on `key` is an
    /// `=`, `==` or single valued `in`.
    pub fn requires_exact_match(&self, key: &str) -> Option<&str> {
        let requirement = self.requirements().iter().find(|r| r.key() == key)?;
        match requirement.operator() {
            Operator::Equals | Operator::DoubleEquals | Operator::In => {
                let mut values = requirement.values();
                match (values.next(), values.next()) {
                    (Some(value), None) => Some(value),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self::everything()
    }
}

impl FromStr for Selector {
    type Err = SelectorSyntaxError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Canonical selector text; parsing it gives back an equal selector.
/// `Nothing` has no text form and renders empty.
impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, requirement) in self.requirements().iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{requirement}")?;
        }
        Ok(())
    }
}
