//! [`Renderer`] backed by the `handlebars` crate.

use std::fmt;

use handlebars::{Handlebars, no_escape};
use tracing::{debug, instrument};

use super::{Renderer, TemplateContext, helpers};
use crate::error::{LevoError, Result};
use crate::template::{TEMPLATER_VERSION, TemplateBody, TemplateSource};
use crate::transform::{CustomTypeRegistry, SharedCustomTypes};

/// Renders `.lt` templates as Handlebars.
///
/// Templates are registered under their key (`directory/file_name`), so one
/// template includes another with `{{> src/partials/header.lt}}`. Output is
/// source code, so nothing is HTML-escaped.
pub struct HandlebarsRenderer {
    registry: Handlebars<'static>,
    custom_types: SharedCustomTypes,
}

impl HandlebarsRenderer {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(no_escape);
        let custom_types = CustomTypeRegistry::new().into_shared();
        helpers::register_all(&mut registry, &custom_types);
        Self {
            registry,
            custom_types,
        }
    }

    /// The custom type registry the template helpers read and write.
    pub fn custom_types(&self) -> &SharedCustomTypes {
        &self.custom_types
    }

    pub fn has_template(&self, key: &str) -> bool {
        self.registry.has_template(key)
    }
}

impl Default for HandlebarsRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HandlebarsRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlebarsRenderer")
            .field("templates", &self.registry.get_templates().len())
            .finish_non_exhaustive()
    }
}

impl Renderer for HandlebarsRenderer {
    fn name(&self) -> &str {
        "handlebars"
    }

    /// Custom types declared by one run never leak into the next.
    fn reset(&mut self) {
        match self.custom_types.write() {
            Ok(mut registry) => registry.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    #[instrument(skip_all, fields(template = %source.key()))]
    fn parse(&mut self, source: &TemplateSource) -> Result<()> {
        if source.version != TEMPLATER_VERSION {
            return Err(LevoError::Parse {
                name: source.key(),
                reason: format!(
                    "expected template version {TEMPLATER_VERSION}, found {}",
                    source.version
                ),
            });
        }

        let TemplateBody::Template(text) = &source.body else {
            debug!("Passthrough source, nothing to parse");
            return Ok(());
        };
        self.registry
            .register_template_string(&source.key(), text)
            .map_err(|err| LevoError::Parse {
                name: source.key(),
                reason: err.to_string(),
            })
    }

    fn render(&self, source: &TemplateSource, context: &TemplateContext) -> Result<String> {
        let key = source.key();
        if !self.registry.has_template(&key) {
            return Err(LevoError::Render {
                name: key,
                reason: "template has not been parsed".to_string(),
            });
        }

        let context = context.clone().sanitized();
        self.registry
            .render(&key, &context)
            .map_err(|err| LevoError::Render {
                name: key,
                reason: err.to_string(),
            })
    }
}
