//! Mapping resolver.
//!
//! A [`Mapping`] binds a set of templates to a set of models. It holds
//! handles into the template registry and the schema, never copies, so a
//! model edited after the mapping was added is rendered in its edited form.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{EntityKind, LevoError, Result};
use crate::schema::{Model, Schema};
use crate::template::{TemplateId, TemplateRegistry, TemplateSource};

/// One unit of generation work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    templates: Vec<TemplateId>,
    /// Indices into [`Schema::models`]. Models are only ever appended, so
    /// these stay valid for the lifetime of the schema.
    models: Vec<usize>,
}

impl Mapping {
    /// Resolves file names and model names into a mapping.
    ///
    /// Template names may match several templates each (one per directory);
    /// the merged set is de-duplicated by `(file_name, directory)` and keeps
    /// first-seen order. Resolution stops at the first unknown name.
    ///
    /// ## Errors
    ///
    /// - [`LevoError::NotFound`] for an unknown template or model name
    /// - [`LevoError::Validation`] if no template names were given
    pub fn resolve<T, M>(
        templates: &TemplateRegistry,
        schema: &Schema,
        template_names: &[T],
        model_names: &[M],
    ) -> Result<Self>
    where
        T: AsRef<str>,
        M: AsRef<str>,
    {
        let mut resolved = Vec::new();
        let mut seen = HashSet::new();
        for name in template_names {
            for id in templates.ids_for_file_name(name.as_ref())? {
                // ids are unique per (file_name, directory)
                if seen.insert(id) {
                    resolved.push(id);
                }
            }
        }

        let models = model_names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                schema
                    .position(name)
                    .ok_or_else(|| LevoError::not_found(EntityKind::Model, name))
            })
            .collect::<Result<Vec<_>>>()?;

        if resolved.is_empty() {
            return Err(LevoError::validation(
                "mappings must reference at least one template",
            ));
        }

        debug!(
            templates = resolved.len(),
            models = models.len(),
            "Resolved mapping"
        );
        Ok(Self {
            templates: resolved,
            models,
        })
    }

    pub fn template_ids(&self) -> &[TemplateId] {
        &self.templates
    }

    pub fn model_indices(&self) -> &[usize] {
        &self.models
    }

    /// The mapped templates, in mapping order.
    pub fn templates<'a>(
        &'a self,
        registry: &'a TemplateRegistry,
    ) -> impl Iterator<Item = &'a TemplateSource> + 'a {
        self.templates.iter().filter_map(|id| registry.get(*id))
    }

    /// The mapped models as they currently stand in `schema`.
    pub fn models<'a>(&'a self, schema: &'a Schema) -> impl Iterator<Item = &'a Model> + 'a {
        self.models.iter().filter_map(|index| schema.models.get(*index))
    }
}
