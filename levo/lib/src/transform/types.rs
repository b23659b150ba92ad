//! Scalar type dictionaries for the supported target ecosystems.
//!
//! Every dictionary is keyed by the lowercased property type token. Tokens
//! that a dictionary does not know pass through unchanged, except for the
//! Core Data and Objective-C lookups which yield an empty string.

use strum::{Display, EnumIter, EnumString};

use crate::schema::{Model, ModelProperty};

use super::words::snakecase;

/// A target ecosystem with a fixed scalar type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum TypeDictionary {
    /// Embedded SQLite storage.
    Sqlite,
    /// General purpose JVM language types.
    Java,
    /// Apple Core Data attribute types.
    CoreData,
    /// Foundation object types.
    ObjectiveC,
    /// Rails migration column types.
    Rails,
}

const SQLITE: &[(&str, &str)] = &[
    ("int", "INTEGER"),
    ("integer", "INTEGER"),
    ("short", "INTEGER"),
    ("long", "INTEGER"),
    ("float", "REAL"),
    ("boolean", "INTEGER"),
    ("char", "TEXT"),
    ("character", "TEXT"),
    ("string", "TEXT"),
    ("byte", "TEXT"),
    ("void", "NONE"),
];

const JAVA: &[(&str, &str)] = &[
    ("int", "int"),
    ("integer", "int"),
    ("short", "short"),
    ("long", "long"),
    ("float", "float"),
    ("boolean", "boolean"),
    ("char", "char"),
    ("character", "char"),
    ("string", "String"),
    ("byte", "byte"),
    ("void", "NONE"),
];

const CORE_DATA: &[(&str, &str)] = &[
    ("int", "Integer 32"),
    ("integer", "Integer 32"),
    ("short", "Integer 16"),
    ("long", "Integer 64"),
    ("float", "Float"),
    ("boolean", "Boolean"),
    ("char", "String"),
    ("character", "String"),
    ("string", "String"),
    ("date", "Date"),
    ("byte", "NONE"),
    ("void", "NONE"),
];

const OBJECTIVE_C: &[(&str, &str)] = &[
    ("int", "NSNumber"),
    ("integer", "NSNumber"),
    ("short", "NSNumber"),
    ("long", "NSNumber"),
    ("float", "NSNumber"),
    ("boolean", "NSNumber"),
    ("char", "NSString"),
    ("character", "NSString"),
    ("string", "NSString"),
    ("date", "NSDate"),
    ("byte", "NONE"),
    ("void", "NONE"),
];

const RAILS: &[(&str, &str)] = &[
    ("int", "integer"),
    ("integer", "integer"),
    ("short", "integer"),
    ("long", "integer"),
    ("float", "float"),
    ("boolean", "boolean"),
    ("char", "string"),
    ("character", "string"),
    ("string", "string"),
    ("byte", "NONE"),
    ("void", "NONE"),
];

impl TypeDictionary {
    /// The raw `(token, replacement)` table.
    pub fn entries(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Sqlite => SQLITE,
            Self::Java => JAVA,
            Self::CoreData => CORE_DATA,
            Self::ObjectiveC => OBJECTIVE_C,
            Self::Rails => RAILS,
        }
    }

    /// Looks a type token up, ignoring case.
    pub fn lookup(self, token: &str) -> Option<&'static str> {
        let key = token.to_lowercase();
        self.entries()
            .iter()
            .find(|(candidate, _)| *candidate == key)
            .map(|(_, replacement)| *replacement)
    }

    /// Looks a token up, handing back the token itself on a miss.
    pub fn translate(self, token: &str) -> String {
        self.lookup(token)
            .map(str::to_string)
            .unwrap_or_else(|| token.to_string())
    }
}

/// True when the property is a SQLite scalar. Set types never are.
pub fn is_sqlite_type(property: &ModelProperty) -> bool {
    !property.is_set_type && TypeDictionary::Sqlite.lookup(&property.property_type).is_some()
}

pub fn to_sqlite_type(property: &ModelProperty) -> String {
    TypeDictionary::Sqlite.translate(&property.property_type)
}

pub fn is_java_type(property: &ModelProperty) -> bool {
    TypeDictionary::Java.lookup(&property.property_type).is_some()
}

/// Java spelling of the property type; set types become `List<T>`.
pub fn to_java_type(property: &ModelProperty) -> String {
    let java_type = TypeDictionary::Java.translate(&property.property_type);
    if property.is_set_type {
        format!("List<{java_type}>")
    } else {
        java_type
    }
}

pub fn to_core_data_type(token: &str) -> String {
    TypeDictionary::CoreData
        .lookup(token)
        .unwrap_or_default()
        .to_string()
}

pub fn to_objective_c_type(token: &str) -> String {
    TypeDictionary::ObjectiveC
        .lookup(token)
        .unwrap_or_default()
        .to_string()
}

/// Rails column type; every set type is an `Array`.
pub fn to_rails_type(property: &ModelProperty) -> String {
    if property.is_set_type {
        return "Array".to_string();
    }
    TypeDictionary::Rails.translate(&property.property_type)
}

/// True when any property of the model is a set type.
pub fn has_list_type(model: &Model) -> bool {
    model.properties.iter().any(|property| property.is_set_type)
}

/// Picks the identifying property and spells it as an upper snake-case constant.
///
/// The first property whose remote identifier contains `id` wins, otherwise
/// the first property. An empty list yields `UNKNOWN_PROPERTY`.
pub fn id_prop(properties: &[ModelProperty]) -> String {
    properties
        .iter()
        .find(|property| property.remote_identifier.contains("id"))
        .or_else(|| properties.first())
        .map(|property| snakecase(&property.remote_identifier).to_uppercase())
        .unwrap_or_else(|| "UNKNOWN_PROPERTY".to_string())
}

/// `com.example.app` becomes `com/example/app`.
pub fn package_to_path(package: &str) -> String {
    package.replace('.', "/")
}
