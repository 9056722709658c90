//! Kubernetes-style label selectors.
//!
//! Selector text such as `app=web,tier in (api,frontend),!canary` is parsed
//! into an immutable [`Selector`]: a conjunction of [`Requirement`]s kept in
//! canonical order (sorted by key, then operator and values), which can then be matched against any
//! label map implementing [`Labels`].

pub mod cache;
pub mod error;
pub mod labels;
pub mod selector;

pub use cache::SelectorCache;
pub use error::{Result, SelectorSyntaxError};
pub use labels::Labels;
pub use selector::{
    Selector,
    lexer::{Lexer, Token},
    requirement::{Operator, Requirement},
};
