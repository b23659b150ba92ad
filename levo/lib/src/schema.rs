//! Schema and model store.
//!
//! A [`Schema`] is the validated set of data models one generation run works
//! from. It is usually loaded from a JSON document shaped like:
//!
//! ```json
//! {
//!   "Project": "Shop",
//!   "Models": [
//!     {
//!       "Name": "Order",
//!       "Parent": "Entity",
//!       "Properties": [
//!         { "RemoteIdentifier": "order_id", "PropertyType": "long" },
//!         { "RemoteIdentifier": "items", "LocalIdentifier": "lineItems", "PropertyType": "[]LineItem" }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EntityKind, LevoError, Result};

/// Marker that turns a property type into a collection of that type.
pub const SET_TYPE_MARKER: &str = "[]";

/// Project name plus its ordered models.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Schema {
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub models: Vec<Model>,
}

/// A named data model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Model {
    #[serde(default)]
    pub name: String,
    /// Name of the parent model. Resolved through [`Schema::parent_of`],
    /// never held as a reference.
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub properties: Vec<ModelProperty>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModelProperty {
    /// Identifier on the wire. Required.
    #[serde(default)]
    pub remote_identifier: String,
    /// Identifier in generated code. Defaults to the remote identifier.
    #[serde(default)]
    pub local_identifier: String,
    /// Element type token, with any set marker already stripped.
    #[serde(default)]
    pub property_type: String,
    #[serde(default)]
    pub is_set_type: bool,
}

/// Strips a leading or trailing `[]` from a type token.
///
/// Returns the bare token and whether a marker was present.
pub fn split_set_marker(token: &str) -> (&str, bool) {
    if let Some(bare) = token.strip_prefix(SET_TYPE_MARKER) {
        (bare, true)
    } else if let Some(bare) = token.strip_suffix(SET_TYPE_MARKER) {
        (bare, true)
    } else {
        (token, false)
    }
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Adds a property to the model.
    ///
    /// An empty local identifier falls back to the remote one. A `[]` marker on
    /// either end of the type token is stripped and marks the property as a set.
    ///
    /// ## Errors
    ///
    /// - [`LevoError::Validation`] if both identifiers are empty or the type is empty
    /// - [`LevoError::Duplicate`] if the local identifier is already taken
    pub fn add_property(
        &mut self,
        remote_identifier: &str,
        local_identifier: &str,
        property_type: &str,
    ) -> Result<&ModelProperty> {
        if remote_identifier.is_empty() && local_identifier.is_empty() {
            return Err(LevoError::validation(format!(
                "properties of model '{}' must have an identifier",
                self.name
            )));
        }

        let local_identifier = if local_identifier.is_empty() {
            remote_identifier
        } else {
            local_identifier
        };
        if self.property(local_identifier).is_some() {
            return Err(LevoError::duplicate(EntityKind::Property, local_identifier));
        }

        let (property_type, is_set_type) = split_set_marker(property_type);
        if property_type.is_empty() {
            return Err(LevoError::validation(format!(
                "property '{local_identifier}' of model '{}' must have a type",
                self.name
            )));
        }

        self.properties.push(ModelProperty {
            remote_identifier: remote_identifier.to_string(),
            local_identifier: local_identifier.to_string(),
            property_type: property_type.to_string(),
            is_set_type,
        });
        Ok(&self.properties[self.properties.len() - 1])
    }

    /// Looks a property up by its local identifier.
    pub fn property(&self, local_identifier: &str) -> Option<&ModelProperty> {
        self.properties
            .iter()
            .find(|property| property.local_identifier == local_identifier)
    }

    fn fill_local_identifiers(&mut self) {
        for property in &mut self.properties {
            if property.local_identifier.is_empty() {
                property.local_identifier = property.remote_identifier.clone();
            }
        }
    }
}

impl Schema {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            models: Vec::new(),
        }
    }

    /// Parses and validates a schema document.
    ///
    /// Besides [`Schema::validate`], this fills empty local identifiers, strips
    /// set markers from property types and rejects duplicate model names or
    /// duplicate local identifiers within a model.
    pub fn from_json_str(document: &str) -> Result<Self> {
        let mut schema: Schema = serde_json::from_str(document)?;
        schema.validate()?;
        schema.normalize()?;
        debug!(
            project = %schema.project,
            models = schema.models.len(),
            "Parsed schema document"
        );
        Ok(schema)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let document = std::fs::read_to_string(path).map_err(|source| LevoError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&document)
    }

    /// Appends a model, filling empty local identifiers from remote ones.
    ///
    /// ## Errors
    ///
    /// [`LevoError::Duplicate`] if a model with the same name exists. The
    /// schema is left untouched in that case.
    pub fn add_model(&mut self, mut model: Model) -> Result<&Model> {
        if self.position(&model.name).is_some() {
            return Err(LevoError::duplicate(EntityKind::Model, model.name));
        }
        model.fill_local_identifiers();
        self.models.push(model);
        Ok(&self.models[self.models.len() - 1])
    }

    /// Exact-match lookup by model name.
    pub fn model_for_name(&self, name: &str) -> Result<&Model> {
        self.models
            .iter()
            .find(|model| model.name == name)
            .ok_or_else(|| LevoError::not_found(EntityKind::Model, name))
    }

    pub fn model_for_name_mut(&mut self, name: &str) -> Result<&mut Model> {
        self.models
            .iter_mut()
            .find(|model| model.name == name)
            .ok_or_else(|| LevoError::not_found(EntityKind::Model, name))
    }

    /// Index of the named model in [`Schema::models`].
    pub fn position(&self, name: &str) -> Option<usize> {
        self.models.iter().position(|model| model.name == name)
    }

    /// Resolves a model's parent by name.
    pub fn parent_of(&self, model: &Model) -> Option<&Model> {
        let parent = model.parent.as_deref()?;
        self.model_for_name(parent).ok()
    }

    /// Checks every model has a name and every property a remote identifier.
    pub fn validate(&self) -> Result<()> {
        for model in &self.models {
            if model.name.is_empty() {
                return Err(LevoError::validation("at least one model is missing its Name"));
            }
            if let Some(property) = model
                .properties
                .iter()
                .find(|property| property.remote_identifier.is_empty())
            {
                return Err(LevoError::validation(format!(
                    "model '{}' has a property of type '{}' missing its RemoteIdentifier",
                    model.name, property.property_type
                )));
            }
        }
        Ok(())
    }

    fn normalize(&mut self) -> Result<()> {
        let mut names = HashSet::new();
        for model in &mut self.models {
            if !names.insert(model.name.clone()) {
                return Err(LevoError::duplicate(EntityKind::Model, model.name.clone()));
            }
            if model.parent.as_deref().is_some_and(str::is_empty) {
                model.parent = None;
            }
            model.fill_local_identifiers();

            let mut locals = HashSet::new();
            for property in &mut model.properties {
                if !locals.insert(property.local_identifier.clone()) {
                    return Err(LevoError::duplicate(
                        EntityKind::Property,
                        property.local_identifier.clone(),
                    ));
                }
                let (bare, is_set_type) = split_set_marker(&property.property_type);
                if is_set_type {
                    property.property_type = bare.to_string();
                    property.is_set_type = true;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "Project": "Shop",
        "Models": [
            {
                "Name": "Entity",
                "Properties": [{ "RemoteIdentifier": "id", "PropertyType": "long" }]
            },
            {
                "Name": "Order",
                "Parent": "Entity",
                "Properties": [
                    { "RemoteIdentifier": "order_id", "PropertyType": "long" },
                    { "RemoteIdentifier": "items", "LocalIdentifier": "lineItems", "PropertyType": "[]LineItem" },
                    { "RemoteIdentifier": "tags", "PropertyType": "string[]" }
                ]
            }
        ]
    }"#;

    #[test]
    fn add_model_rejects_duplicates_without_growing() {
        let mut schema = Schema::new("Shop");
        schema.add_model(Model::new("Order")).expect("first add");
        let err = schema.add_model(Model::new("Order")).expect_err("duplicate");
        assert!(matches!(err, LevoError::Duplicate { kind: EntityKind::Model, .. }));
        assert_eq!(schema.models.len(), 1);
    }

    #[test]
    fn add_model_fills_local_identifiers() {
        let mut model = Model::new("Order");
        model.properties.push(ModelProperty {
            remote_identifier: "order_id".to_string(),
            property_type: "long".to_string(),
            ..ModelProperty::default()
        });
        let mut schema = Schema::new("Shop");
        let added = schema.add_model(model).expect("add");
        assert_eq!(added.properties[0].local_identifier, "order_id");
    }

    #[test]
    fn add_property_requires_an_identifier() {
        let mut model = Model::new("Order");
        let err = model.add_property("", "", "string").expect_err("no identifier");
        assert!(matches!(err, LevoError::Validation(_)));
        assert!(model.properties.is_empty());
    }

    #[test]
    fn add_property_requires_a_type() {
        let mut model = Model::new("Order");
        assert!(matches!(
            model.add_property("total", "", ""),
            Err(LevoError::Validation(_))
        ));
        assert!(matches!(
            model.add_property("total", "", "[]"),
            Err(LevoError::Validation(_))
        ));
    }

    #[test]
    fn add_property_rejects_duplicate_local_identifiers() {
        let mut model = Model::new("Order");
        model.add_property("total", "", "float").expect("first");
        let err = model.add_property("sum", "total", "float").expect_err("dup");
        assert!(matches!(err, LevoError::Duplicate { kind: EntityKind::Property, .. }));
        assert_eq!(model.properties.len(), 1);
    }

    #[test]
    fn add_property_strips_set_markers() {
        let mut model = Model::new("Order");
        let leading = model.add_property("items", "", "[]LineItem").expect("leading").clone();
        assert_eq!(leading.property_type, "LineItem");
        assert!(leading.is_set_type);

        let trailing = model.add_property("tags", "", "string[]").expect("trailing").clone();
        assert_eq!(trailing.property_type, "string");
        assert!(trailing.is_set_type);

        let scalar = model.add_property("total", "", "float").expect("scalar");
        assert!(!scalar.is_set_type);
    }

    #[test]
    fn model_for_name_misses_with_not_found() {
        let schema = Schema::new("Shop");
        let err = schema.model_for_name("Ghost").expect_err("missing");
        assert!(matches!(err, LevoError::NotFound { kind: EntityKind::Model, .. }));
    }

    #[test]
    fn from_json_str_normalizes_properties() {
        let schema = Schema::from_json_str(DOCUMENT).expect("valid document");
        assert_eq!(schema.project, "Shop");

        let order = schema.model_for_name("Order").expect("order");
        assert_eq!(order.properties[0].local_identifier, "order_id");
        assert_eq!(order.properties[1].local_identifier, "lineItems");
        assert_eq!(order.properties[1].property_type, "LineItem");
        assert!(order.properties[1].is_set_type);
        assert_eq!(order.properties[2].property_type, "string");
        assert!(order.properties[2].is_set_type);
    }

    #[test]
    fn parent_is_resolved_by_name() {
        let schema = Schema::from_json_str(DOCUMENT).expect("valid document");
        let order = schema.model_for_name("Order").expect("order");
        let parent = schema.parent_of(order).expect("parent");
        assert_eq!(parent.name, "Entity");

        let entity = schema.model_for_name("Entity").expect("entity");
        assert!(schema.parent_of(entity).is_none());
    }

    #[test]
    fn from_json_str_requires_model_names() {
        let err = Schema::from_json_str(r#"{"Project": "p", "Models": [{"Properties": []}]}"#)
            .expect_err("unnamed model");
        assert!(matches!(err, LevoError::Validation(_)));
    }

    #[test]
    fn from_json_str_requires_remote_identifiers() {
        let document = r#"{"Models": [{"Name": "A", "Properties": [{"LocalIdentifier": "x", "PropertyType": "int"}]}]}"#;
        let err = Schema::from_json_str(document).expect_err("missing remote identifier");
        assert!(matches!(err, LevoError::Validation(_)));
    }

    #[test]
    fn from_json_str_rejects_duplicate_models() {
        let document = r#"{"Models": [{"Name": "A"}, {"Name": "A"}]}"#;
        let err = Schema::from_json_str(document).expect_err("duplicate model");
        assert!(matches!(err, LevoError::Duplicate { kind: EntityKind::Model, .. }));
    }

    #[test]
    fn from_json_str_reports_malformed_documents() {
        let err = Schema::from_json_str("{ not json").expect_err("malformed");
        assert!(matches!(err, LevoError::Schema(_)));
    }
}
