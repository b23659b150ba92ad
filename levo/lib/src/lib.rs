//! Levo source generator library.
//!
//! Levo turns a schema of data models plus a directory of templates into a
//! set of generated source files. One template can emit any number of output
//! files by wrapping each in a `<<levo filename:NAME>>...<<levo>>` block.
//!
//! ## Modules
//!
//! - [`transform`] - Identifier transforms (case conversion, pluralization, type dictionaries)
//! - [`schema`] - Data models and schema document loading
//! - [`template`] - The template registry
//! - [`mapping`] - Binding templates to models
//! - [`renderer`] - The renderer capability and its Handlebars implementation
//! - [`generator`] - The generation pipeline
//! - [`splitter`] - Carving output files out of rendered text
//!
//! ## Example Usage
//!
//! ```
//! use levo_lib::{Generator, GeneratorConfig, Model};
//!
//! let mut generator = Generator::new(GeneratorConfig::new().package_name("com.acme"));
//! let mut order = Model::new("Order");
//! order.add_property("order_id", "", "long").unwrap();
//! generator.add_model(order).unwrap();
//! generator
//!     .add_template(
//!         "Model.java.lt",
//!         "{{#each Models}}<<levo filename:{{Name}}.java>>class {{Name}} {}<<levo>>{{/each}}",
//!         "1.0",
//!         "src",
//!     )
//!     .unwrap();
//! generator.add_mapping(&["Model.java.lt"], &["Order"]).unwrap();
//!
//! let files = generator.process_mappings().unwrap();
//! assert_eq!(files[0].relative_path().to_str(), Some("src/Order.java"));
//! assert_eq!(files[0].body_str(), Some("class Order {}"));
//! ```

pub mod error;
pub mod generator;
pub mod mapping;
pub mod renderer;
pub mod schema;
pub mod splitter;
pub mod template;
pub mod transform;

pub use error::{EntityKind, LevoError, Result};
pub use generator::{DEFAULT_PROJECT_NAME, Generator, GeneratorConfig};
pub use mapping::Mapping;
pub use renderer::{
    DEFAULT_PACKAGE_NAME, HandlebarsRenderer, Renderer, RendererId, TemplateContext,
};
pub use schema::{Model, ModelProperty, Schema};
pub use splitter::{BASE64_ARMOR, GeneratedFile, extract_files};
pub use template::{
    TEMPLATE_SUFFIX, TEMPLATER_VERSION, TemplateBody, TemplateId, TemplateRegistry,
    TemplateSource,
};
