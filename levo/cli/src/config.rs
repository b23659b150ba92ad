//! `levo.toml` project files.
//!
//! ```toml
//! project = "Shop"
//! package = "com.acme.shop"
//! schema = "schema.json"
//! templates = "templates/java"
//! output = "generated"
//! features = ["persistence"]
//!
//! [[mapping]]
//! templates = ["Model.java.lt"]
//! models = ["Order", "LineItem"]
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::CliError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LevoConfig {
    pub project: Option<String>,
    pub package: Option<String>,
    pub language: Option<String>,
    pub schema: Option<PathBuf>,
    pub templates: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub features: Vec<String>,
    #[serde(rename = "mapping")]
    pub mappings: Vec<MappingConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MappingConfig {
    pub templates: Vec<String>,
    pub models: Vec<String>,
}

impl LevoConfig {
    pub fn from_toml_str(document: &str, path: &Path) -> Result<Self, CliError> {
        toml::from_str(document).map_err(|source| CliError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads a config file and anchors its relative paths to the file's directory.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let document = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&document, path)?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for field in [&mut config.schema, &mut config.templates, &mut config.output] {
            if let Some(relative) = field.as_mut().filter(|p| p.is_relative()) {
                *relative = base.join(&*relative);
            }
        }
        debug!(path = %path.display(), mappings = config.mappings.len(), "Loaded config file");
        Ok(config)
    }
}
