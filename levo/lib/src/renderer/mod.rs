//! Renderer capability.
//!
//! The generation pipeline only ever talks to [`Renderer`] trait objects. A
//! renderer parses every registered template up front, then renders one
//! template at a time against a [`TemplateContext`] and carves the result into
//! [`GeneratedFile`]s.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Result;
use crate::schema::Model;
use crate::splitter::{self, GeneratedFile};
use crate::template::TemplateSource;
use crate::transform::package_to_path;

pub mod handlebars;
mod helpers;

pub use self::handlebars::HandlebarsRenderer;

/// Package used when the configured one sanitizes to nothing.
pub const DEFAULT_PACKAGE_NAME: &str = "com.example";

/// Handle to a renderer registered with a [`Generator`](crate::Generator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RendererId(pub(crate) usize);

impl RendererId {
    /// The renderer every generator starts with.
    pub const DEFAULT: RendererId = RendererId(0);
}

/// A template engine the pipeline can drive.
pub trait Renderer {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Drops state left behind by a previous run. Called before parsing.
    fn reset(&mut self) {}

    /// Prepares a source for rendering.
    ///
    /// Called once per registered template, in registration order, before any
    /// rendering, so templates may include one another.
    fn parse(&mut self, source: &TemplateSource) -> Result<()>;

    /// Renders a parsed source to text.
    fn render(&self, source: &TemplateSource, context: &TemplateContext) -> Result<String>;

    /// Splits rendered text into output files.
    fn extract_files(&self, output: &str, default_directory: &str) -> Result<Vec<GeneratedFile>> {
        Ok(splitter::extract_files(output, default_directory))
    }

    /// Render followed by extraction, with the source's directory as default.
    fn generate_files(
        &self,
        source: &TemplateSource,
        context: &TemplateContext,
    ) -> Result<Vec<GeneratedFile>> {
        let output = self.render(source, context)?;
        self.extract_files(&output, &source.directory)
    }
}

/// The data a template renders against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateContext {
    pub package_name: String,
    pub project_name: String,
    /// Package with `.` replaced by `/`.
    pub package_path: String,
    pub models: Vec<Model>,
    pub features: BTreeMap<String, bool>,
}

impl TemplateContext {
    pub fn new(
        project_name: &str,
        package_name: &str,
        models: Vec<Model>,
        features: BTreeMap<String, bool>,
    ) -> Self {
        Self {
            package_name: package_name.to_string(),
            project_name: project_name.to_string(),
            package_path: package_to_path(package_name),
            models,
            features,
        }
    }

    /// Strips characters that cannot appear in generated identifiers.
    ///
    /// Project, model, parent and property local names keep `[A-Za-z0-9_]`;
    /// the package also keeps `.` and falls back to [`DEFAULT_PACKAGE_NAME`]
    /// when nothing is left.
    pub fn sanitized(mut self) -> Self {
        self.package_name = clean_package_name(&self.package_name);
        self.package_path = package_to_path(&self.package_name);
        self.project_name = clean_name(&self.project_name);
        for model in &mut self.models {
            model.name = clean_name(&model.name);
            model.parent = model.parent.as_deref().map(clean_name);
            for property in &mut model.properties {
                property.local_identifier = clean_name(&property.local_identifier);
            }
        }
        self
    }
}

/// Keeps only `[A-Za-z0-9_]`.
pub fn clean_name(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// Keeps only `[A-Za-z0-9_.]`; empty results become [`DEFAULT_PACKAGE_NAME`].
pub fn clean_package_name(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.'))
        .collect();
    if cleaned.is_empty() {
        DEFAULT_PACKAGE_NAME.to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_name_keeps_identifier_characters() {
        assert_eq!(clean_name("Line-Item (v2)"), "LineItemv2");
        assert_eq!(clean_name("snake_case_ok"), "snake_case_ok");
        assert_eq!(clean_name("déjà"), "dj");
        assert_eq!(clean_name(""), "");
    }

    #[test]
    fn clean_package_name_keeps_dots_and_defaults() {
        assert_eq!(clean_package_name("com.acme-corp.shop"), "com.acmecorp.shop");
        assert_eq!(clean_package_name("com.my_app"), "com.my_app");
        assert_eq!(clean_package_name(""), DEFAULT_PACKAGE_NAME);
        assert_eq!(clean_package_name("!!"), DEFAULT_PACKAGE_NAME);
    }

    #[test]
    fn sanitized_context_cleans_identifier_fields() {
        let mut model = Model::new("Line Item").with_parent("Base-Entity");
        model.add_property("unit-price", "", "double").expect("property");

        let context =
            TemplateContext::new("My Shop!", "com.acme shop", vec![model], BTreeMap::new())
                .sanitized();

        assert_eq!(context.project_name, "MyShop");
        assert_eq!(context.package_name, "com.acmeshop");
        assert_eq!(context.package_path, "com/acmeshop");
        let model = &context.models[0];
        assert_eq!(model.name, "LineItem");
        assert_eq!(model.parent.as_deref(), Some("BaseEntity"));
        assert_eq!(model.properties[0].local_identifier, "unitprice");
        assert_eq!(model.properties[0].remote_identifier, "unit-price");
    }

    #[test]
    fn context_serializes_with_document_keys() {
        let mut features = BTreeMap::new();
        features.insert("tests".to_string(), true);
        let context = TemplateContext::new("Shop", "com.acme", Vec::new(), features);
        let value = serde_json::to_value(&context).expect("serialize");
        assert_eq!(value["PackagePath"], "com/acme");
        assert_eq!(value["ProjectName"], "Shop");
        assert_eq!(value["Features"]["tests"], true);
        assert!(value["Models"].as_array().is_some_and(Vec::is_empty));
    }
}
