//! Identifier transforms that templates call while rendering.
//!
//! - [`words`] - word segmentation and case conversion
//! - [`plural`] - pluralization aligned to the caller's casing
//! - [`types`] - per-ecosystem scalar type dictionaries
//! - [`custom`] - the run-scoped custom type registry
//! - [`text`] - small string helpers

pub mod custom;
pub mod plural;
pub mod text;
pub mod types;
pub mod words;

pub use custom::{CustomTypeRegistry, SharedCustomTypes};
pub use plural::{EnglishInflector, Pluralizer, pluralize, pluralize_with};
pub use types::{
    TypeDictionary, has_list_type, id_prop, is_java_type, is_sqlite_type, package_to_path,
    to_core_data_type, to_java_type, to_objective_c_type, to_rails_type, to_sqlite_type,
};
pub use words::{camelcase, snakecase, split_words, titlecase};
