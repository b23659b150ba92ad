//! Generation pipeline.
//!
//! A [`Generator`] owns everything one generation needs: configuration, the
//! schema, the template registry, the mappings and the renderers.
//! [`Generator::process_mappings`] parses every template, then renders each
//! mapping's templates against its models.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

use tracing::{debug, info, instrument};

use crate::error::{EntityKind, LevoError, Result};
use crate::mapping::Mapping;
use crate::renderer::{
    DEFAULT_PACKAGE_NAME, HandlebarsRenderer, Renderer, RendererId, TemplateContext,
};
use crate::schema::{Model, Schema};
use crate::splitter::GeneratedFile;
use crate::template::{TemplateBody, TemplateRegistry, TemplateSource};

/// Project name used when none is configured.
pub const DEFAULT_PROJECT_NAME: &str = "ExampleProject";

/// Identity and feature flags passed to every template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub project_name: String,
    pub package_name: String,
    /// Target language, informational only.
    pub language: Option<String>,
    /// Feature flags keyed by lowercased name.
    pub features: BTreeMap<String, bool>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            project_name: DEFAULT_PROJECT_NAME.to_string(),
            package_name: DEFAULT_PACKAGE_NAME.to_string(),
            language: None,
            features: BTreeMap::new(),
        }
    }
}

impl GeneratorConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = name.into();
        self
    }

    pub fn package_name(mut self, name: impl Into<String>) -> Self {
        self.package_name = name.into();
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Turn a feature flag on.
    pub fn feature(mut self, feature: &str) -> Self {
        self.features.insert(feature.to_lowercase(), true);
        self
    }
}

/// The generator's complete state.
pub struct Generator {
    config: GeneratorConfig,
    schema: Schema,
    templates: TemplateRegistry,
    mappings: Vec<Mapping>,
    renderers: Vec<Box<dyn Renderer>>,
}

impl Generator {
    /// A generator with [`HandlebarsRenderer`] as its default renderer.
    pub fn new(config: GeneratorConfig) -> Self {
        Self::with_renderer(config, Box::new(HandlebarsRenderer::new()))
    }

    /// A generator with a caller-supplied default renderer.
    pub fn with_renderer(config: GeneratorConfig, renderer: Box<dyn Renderer>) -> Self {
        Self {
            config,
            schema: Schema::default(),
            templates: TemplateRegistry::new(),
            mappings: Vec::new(),
            renderers: vec![renderer],
        }
    }

    /// Adds another renderer that templates can be bound to.
    pub fn register_renderer(&mut self, renderer: Box<dyn Renderer>) -> RendererId {
        self.renderers.push(renderer);
        RendererId(self.renderers.len() - 1)
    }

    pub fn renderer(&self, id: RendererId) -> Option<&dyn Renderer> {
        self.renderers.get(id.0).map(|renderer| renderer.as_ref())
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    // -- models --

    pub fn add_model(&mut self, model: Model) -> Result<&Model> {
        self.schema.add_model(model)
    }

    /// Adds an empty model.
    pub fn add_model_with_name(&mut self, name: &str) -> Result<&Model> {
        if name.is_empty() {
            return Err(LevoError::validation("models must have a name"));
        }
        self.schema.add_model(Model::new(name))
    }

    pub fn model_for_name(&self, name: &str) -> Result<&Model> {
        self.schema.model_for_name(name)
    }

    pub fn model_for_name_mut(&mut self, name: &str) -> Result<&mut Model> {
        self.schema.model_for_name_mut(name)
    }

    /// Adds every model of a parsed schema.
    ///
    /// Nothing is added if any model name is already taken. A non-empty
    /// schema project replaces the current one.
    pub fn load_schema(&mut self, schema: Schema) -> Result<()> {
        schema.validate()?;
        let mut incoming = HashSet::new();
        for model in &schema.models {
            if self.schema.position(&model.name).is_some() || !incoming.insert(&model.name) {
                return Err(LevoError::duplicate(EntityKind::Model, model.name.clone()));
            }
        }

        let Schema { project, models } = schema;
        debug!(models = models.len(), "Loading schema");
        if !project.is_empty() {
            self.schema.project = project;
        }
        for model in models {
            self.schema.add_model(model)?;
        }
        Ok(())
    }

    pub fn load_schema_file(&mut self, path: &Path) -> Result<()> {
        self.load_schema(Schema::from_json_file(path)?)
    }

    // -- templates --

    /// Registers a template with the default renderer.
    pub fn add_template(
        &mut self,
        file_name: &str,
        body: impl Into<Vec<u8>>,
        version: &str,
        directory: &str,
    ) -> Result<&TemplateSource> {
        self.add_template_with(file_name, body, version, directory, RendererId::DEFAULT)
    }

    /// Registers a template bound to a specific renderer.
    pub fn add_template_with(
        &mut self,
        file_name: &str,
        body: impl Into<Vec<u8>>,
        version: &str,
        directory: &str,
        renderer: RendererId,
    ) -> Result<&TemplateSource> {
        self.check_renderer(renderer)?;
        self.templates
            .add_template(file_name, body, version, directory, renderer)
    }

    /// Registers every file below `root` with the default renderer.
    pub fn add_template_directory(&mut self, root: &Path) -> Result<&[TemplateSource]> {
        self.templates
            .add_template_directory(root, RendererId::DEFAULT)
    }

    pub fn add_template_file_path(&mut self, path: &Path) -> Result<&TemplateSource> {
        self.templates
            .add_template_file_path(path, RendererId::DEFAULT)
    }

    pub fn find_template(&self, file_name: &str, directory: &str) -> Result<&TemplateSource> {
        self.templates.find_template(file_name, directory)
    }

    pub fn template_for_file_name(&self, file_name: &str) -> Result<Vec<&TemplateSource>> {
        self.templates.template_for_file_name(file_name)
    }

    // -- mappings and features --

    /// Binds templates (by file name) to models (by name).
    ///
    /// See [`Mapping::resolve`]. Nothing is appended on failure.
    #[instrument(skip_all, fields(templates = template_names.len(), models = model_names.len()))]
    pub fn add_mapping<T, M>(&mut self, template_names: &[T], model_names: &[M]) -> Result<&Mapping>
    where
        T: AsRef<str>,
        M: AsRef<str>,
    {
        let mapping = Mapping::resolve(&self.templates, &self.schema, template_names, model_names)?;
        self.mappings.push(mapping);
        Ok(&self.mappings[self.mappings.len() - 1])
    }

    pub fn add_feature(&mut self, feature: &str) {
        self.config.features.insert(feature.to_lowercase(), true);
    }

    pub fn remove_feature(&mut self, feature: &str) {
        self.config.features.insert(feature.to_lowercase(), false);
    }

    // -- pipeline --

    /// Runs the full generation.
    ///
    /// Every registered template is parsed (in registration order) before
    /// anything is rendered. Output keeps mapping order, then template order.
    /// The first failure aborts the run and no files are returned; registry
    /// and mapping state is untouched either way.
    #[instrument(
        skip(self),
        fields(mappings = self.mappings.len(), templates = self.templates.len())
    )]
    pub fn process_mappings(&mut self) -> Result<Vec<GeneratedFile>> {
        if self.mappings.is_empty() {
            return Err(LevoError::validation("no mappings to process"));
        }

        for renderer in &mut self.renderers {
            renderer.reset();
        }
        for source in self.templates.iter() {
            let renderer = self
                .renderers
                .get_mut(source.renderer.0)
                .ok_or_else(|| missing_renderer(source))?;
            renderer.parse(source)?;
        }
        debug!("Parsed all templates");

        let mut files = Vec::new();
        for mapping in &self.mappings {
            let context = TemplateContext::new(
                &self.config.project_name,
                &self.config.package_name,
                mapping.models(&self.schema).cloned().collect(),
                self.config.features.clone(),
            );
            for source in mapping.templates(&self.templates) {
                let generated = self.process_template(source, &context)?;
                debug!(template = %source.key(), files = generated.len(), "Processed template");
                files.extend(generated);
            }
        }

        info!(files = files.len(), "Generation complete");
        Ok(files)
    }

    fn process_template(
        &self,
        source: &TemplateSource,
        context: &TemplateContext,
    ) -> Result<Vec<GeneratedFile>> {
        let renderer = self
            .renderer(source.renderer)
            .ok_or_else(|| missing_renderer(source))?;

        match &source.body {
            TemplateBody::Template(_) => renderer.generate_files(source, context),
            TemplateBody::Passthrough(armored) => {
                let files = renderer.extract_files(armored, &source.directory)?;
                if !files.is_empty() {
                    return Ok(files);
                }
                Ok(vec![GeneratedFile::new(
                    source.file_name.clone(),
                    source.directory.clone(),
                    armored.as_bytes(),
                )])
            }
        }
    }

    fn check_renderer(&self, id: RendererId) -> Result<()> {
        if id.0 < self.renderers.len() {
            Ok(())
        } else {
            Err(LevoError::validation(format!(
                "no renderer registered for id {}",
                id.0
            )))
        }
    }
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let renderers: Vec<&str> = self.renderers.iter().map(|renderer| renderer.name()).collect();
        f.debug_struct("Generator")
            .field("config", &self.config)
            .field("schema", &self.schema)
            .field("templates", &self.templates.len())
            .field("mappings", &self.mappings.len())
            .field("renderers", &renderers)
            .finish()
    }
}

fn missing_renderer(source: &TemplateSource) -> LevoError {
    LevoError::Render {
        name: source.key(),
        reason: format!("no renderer registered for id {}", source.renderer.0),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::splitter::armor;

    fn generator() -> Generator {
        Generator::new(GeneratorConfig::new().project_name("Shop").package_name("com.acme"))
    }

    /// Records every call so tests can check ordering.
    struct RecordingRenderer {
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl Renderer for RecordingRenderer {
        fn name(&self) -> &str {
            "recording"
        }

        fn parse(&mut self, source: &TemplateSource) -> Result<()> {
            self.calls.borrow_mut().push(format!("parse {}", source.key()));
            Ok(())
        }

        fn render(&self, source: &TemplateSource, context: &TemplateContext) -> Result<String> {
            self.calls.borrow_mut().push(format!("render {}", source.key()));
            Ok(format!(
                "<<levo filename:{}.out>>{}<<levo>>",
                source.file_name,
                context.models.len()
            ))
        }
    }

    #[test]
    fn config_defaults_match_documented_values() {
        let config = GeneratorConfig::default();
        assert_eq!(config.project_name, "ExampleProject");
        assert_eq!(config.package_name, "com.example");
        assert!(config.features.is_empty());

        let config = GeneratorConfig::new().feature("Tests").language("java");
        assert_eq!(config.features.get("tests"), Some(&true));
        assert_eq!(config.language.as_deref(), Some("java"));
    }

    #[test]
    fn process_mappings_requires_a_mapping() {
        let mut generator = generator();
        generator.add_template("a.lt", "x", "1.0", "").expect("template");
        let err = generator.process_mappings().expect_err("no mappings");
        assert!(matches!(err, LevoError::Validation(_)));
    }

    #[test]
    fn single_block_template_yields_one_file() {
        let mut generator = generator();
        generator.add_model_with_name("Order").expect("model");
        generator
            .add_template(
                "Model.java.lt",
                "{{#each Models}}<<levo filename:{{Name}}.java directory:src/{{../PackagePath}}>>\nclass {{Name}} {}\n<<levo>>{{/each}}",
                "1.0",
                "",
            )
            .expect("template");
        generator.add_mapping(&["Model.java.lt"], &["Order"]).expect("mapping");

        let files = generator.process_mappings().expect("process");
        assert_eq!(files, vec![GeneratedFile::new("Order.java", "src/com/acme", "class Order {}")]);
    }

    #[test]
    fn parses_everything_before_rendering() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut generator = Generator::with_renderer(
            GeneratorConfig::new(),
            Box::new(RecordingRenderer {
                calls: Rc::clone(&calls),
            }),
        );
        generator.add_model_with_name("Order").expect("model");
        generator.add_template("a.lt", "", "1.0", "").expect("a");
        generator.add_template("b.lt", "", "1.0", "").expect("b");
        generator.add_template("c.lt", "", "1.0", "").expect("c");
        generator.add_mapping(&["b.lt"], &["Order"]).expect("first mapping");
        generator.add_mapping(&["a.lt"], &[] as &[&str]).expect("second mapping");

        let files = generator.process_mappings().expect("process");

        assert_eq!(
            *calls.borrow(),
            vec!["parse a.lt", "parse b.lt", "parse c.lt", "render b.lt", "render a.lt"]
        );
        let bodies: Vec<_> = files
            .iter()
            .map(|file| (file.file_name.as_str(), file.body_str()))
            .collect();
        assert_eq!(bodies, vec![("b.lt.out", Some("1")), ("a.lt.out", Some("0"))]);
    }

    #[test]
    fn passthrough_templates_copy_through() {
        let mut generator = generator();
        let payload = vec![0x89, b'P', b'N', b'G', 0x00, 0xff];
        generator
            .add_template("icon.png", payload.clone(), "1.0", "assets")
            .expect("template");
        generator.add_mapping(&["icon.png"], &[] as &[&str]).expect("mapping");

        let files = generator.process_mappings().expect("process");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name, "icon.png");
        assert_eq!(files[0].directory, "assets");
        assert_eq!(files[0].body, armor(&payload).into_bytes());
        assert_eq!(&*files[0].decoded_body().expect("decode"), payload.as_slice());
    }

    #[test]
    fn parse_failure_aborts_the_run() {
        let mut generator = generator();
        generator.add_template("good.lt", "<<levo filename:a>>a<<levo>>", "1.0", "").expect("good");
        generator.add_template("bad.lt", "{{#if}}", "1.0", "").expect("bad");
        generator.add_mapping(&["good.lt"], &[] as &[&str]).expect("mapping");

        let err = generator.process_mappings().expect_err("parse failure");
        assert!(matches!(err, LevoError::Parse { ref name, .. } if name == "bad.lt"));
        assert_eq!(generator.mappings().len(), 1);
    }

    #[test]
    fn failed_mapping_is_not_appended() {
        let mut generator = generator();
        generator.add_template("a.lt", "", "1.0", "").expect("template");
        let err = generator.add_mapping(&["a.lt"], &["Missing"]).expect_err("unknown model");
        assert!(matches!(err, LevoError::NotFound { .. }));
        assert!(generator.mappings().is_empty());
    }

    #[test]
    fn features_are_visible_to_templates() {
        let mut generator = generator();
        generator.add_feature("Persistence");
        generator.add_feature("Tests");
        generator.remove_feature("tests");
        generator
            .add_template(
                "flags.lt",
                "<<levo filename:flags>>{{#if Features.persistence}}db{{/if}}{{#if Features.tests}}tests{{/if}}<<levo>>",
                "1.0",
                "",
            )
            .expect("template");
        generator.add_mapping(&["flags.lt"], &[] as &[&str]).expect("mapping");

        let files = generator.process_mappings().expect("process");
        assert_eq!(files[0].body_str(), Some("db"));
        assert_eq!(generator.config().features.get("tests"), Some(&false));
    }

    #[test]
    fn add_model_with_name_requires_a_name() {
        let mut generator = generator();
        assert!(matches!(
            generator.add_model_with_name(""),
            Err(LevoError::Validation(_))
        ));
        generator.add_model_with_name("Order").expect("model");
        assert!(matches!(
            generator.add_model_with_name("Order"),
            Err(LevoError::Duplicate { .. })
        ));
        assert_eq!(generator.schema().models.len(), 1);
    }

    #[test]
    fn load_schema_is_all_or_nothing() {
        let mut generator = generator();
        generator.add_model_with_name("Customer").expect("model");

        let mut schema = Schema::new("Store");
        schema.add_model(Model::new("Order")).expect("order");
        schema.add_model(Model::new("Customer")).expect("customer");
        let err = generator.load_schema(schema).expect_err("collision");
        assert!(matches!(err, LevoError::Duplicate { .. }));
        assert_eq!(generator.schema().models.len(), 1);
        assert!(generator.schema().project.is_empty());

        let mut schema = Schema::new("Store");
        schema.add_model(Model::new("Order")).expect("order");
        generator.load_schema(schema).expect("load");
        assert_eq!(generator.schema().project, "Store");
        assert!(generator.model_for_name("Order").is_ok());
    }

    #[test]
    fn templates_bind_to_registered_renderers_only() {
        let mut generator = generator();
        let err = generator
            .add_template_with("a.lt", "", "1.0", "", RendererId(3))
            .expect_err("unknown renderer");
        assert!(matches!(err, LevoError::Validation(_)));

        let calls = Rc::new(RefCell::new(Vec::new()));
        let id = generator.register_renderer(Box::new(RecordingRenderer {
            calls: Rc::clone(&calls),
        }));
        generator.add_template_with("a.lt", "", "1.0", "", id).expect("bound");
        assert_eq!(generator.renderer(id).map(|renderer| renderer.name()), Some("recording"));
    }

    #[test]
    fn custom_types_do_not_leak_between_runs() {
        let mut generator = generator();
        let mut order = Model::new("Order");
        order.add_property("id", "", "long").expect("property");
        generator.add_model(order).expect("model");
        generator
            .add_template(
                "types.lt",
                "<<levo filename:types>>{{#if Features.declare}}{{registerCustomType \"swift\"}}{{setCustomType \"swift\" \"long\" \"Int64\"}}{{/if}}\
                 {{#each Models}}{{#each Properties}}{{toCustomType \"swift\" this}}{{/each}}{{/each}}<<levo>>",
                "1.0",
                "",
            )
            .expect("template");
        generator.add_mapping(&["types.lt"], &["Order"]).expect("mapping");

        generator.add_feature("declare");
        let first = generator.process_mappings().expect("first run");
        assert_eq!(first[0].body_str(), Some("Int64"));

        generator.remove_feature("declare");
        let second = generator.process_mappings().expect("second run");
        assert_eq!(second[0].body_str(), Some("long"));
    }

    #[tracing_test::traced_test]
    #[test]
    fn process_mappings_logs_a_summary() {
        let mut generator = generator();
        generator
            .add_template("a.lt", "<<levo filename:a>>a<<levo>>", "1.0", "")
            .expect("template");
        generator.add_mapping(&["a.lt"], &[] as &[&str]).expect("mapping");
        generator.process_mappings().expect("process");

        assert!(logs_contain("process_mappings"));
        assert!(logs_contain("Generation complete"));
    }
}
