//! Template registry.
//!
//! Every file that is part of a template set is registered here, whether it
//! is a real template (`*.lt`) or an opaque file that is copied through to
//! the output. Opaque bodies are base64-armored at registration time.

use std::collections::HashSet;
use std::path::{Component, Path};

use tracing::{debug, instrument, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{EntityKind, LevoError, Result};
use crate::renderer::RendererId;
use crate::splitter::armor;

/// File-name suffix that marks a source as a template.
pub const TEMPLATE_SUFFIX: &str = ".lt";

/// The template format version this generator understands.
pub const TEMPLATER_VERSION: &str = "1.0";

const SKIPPED_DIRECTORIES: &[&str] = &[".git", ".hg"];
const SKIPPED_FILES: &[&str] = &[".DS_Store"];

/// True when the file name carries the template suffix (any case).
pub fn is_template_file_name(file_name: &str) -> bool {
    file_name.to_lowercase().ends_with(TEMPLATE_SUFFIX)
}

/// Position of a template in its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(usize);

/// A template body: either source for the renderer or an opaque payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateBody {
    /// UTF-8 template source.
    Template(String),
    /// Binary passthrough content, base64-armored behind
    /// [`BASE64_ARMOR`](crate::splitter::BASE64_ARMOR).
    Passthrough(String),
}

impl TemplateBody {
    /// Picks the variant from the file name, never from the content.
    pub fn for_file(file_name: &str, body: Vec<u8>) -> Result<Self> {
        if !is_template_file_name(file_name) {
            return Ok(Self::Passthrough(armor(&body)));
        }
        String::from_utf8(body)
            .map(Self::Template)
            .map_err(|err| LevoError::Parse {
                name: file_name.to_string(),
                reason: format!("template is not valid UTF-8: {err}"),
            })
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Template(text) | Self::Passthrough(text) => text,
        }
    }

    pub fn is_passthrough(&self) -> bool {
        matches!(self, Self::Passthrough(_))
    }
}

/// One registered template file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSource {
    pub file_name: String,
    /// Directory relative to the template root; empty for the root itself.
    pub directory: String,
    pub version: String,
    pub body: TemplateBody,
    /// Renderer that parses and renders this source.
    pub renderer: RendererId,
}

impl TemplateSource {
    /// Name the renderer knows this source by, and the name other templates
    /// use to include it.
    pub fn key(&self) -> String {
        if self.directory.is_empty() {
            self.file_name.clone()
        } else {
            format!("{}/{}", self.directory, self.file_name)
        }
    }
}

/// Ordered set of template sources, unique by `(file_name, directory)`.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: Vec<TemplateSource>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one template.
    ///
    /// ## Errors
    ///
    /// - [`LevoError::Validation`] if the file name or version is empty
    /// - [`LevoError::Duplicate`] if `(file_name, directory)` is taken
    /// - [`LevoError::Parse`] if a `.lt` body is not UTF-8
    pub fn add_template(
        &mut self,
        file_name: &str,
        body: impl Into<Vec<u8>>,
        version: &str,
        directory: &str,
        renderer: RendererId,
    ) -> Result<&TemplateSource> {
        let source = build_source(file_name, body.into(), version, directory, renderer)?;
        if self.find_template(file_name, directory).is_ok() {
            return Err(LevoError::duplicate(EntityKind::Template, file_name));
        }
        self.templates.push(source);
        Ok(&self.templates[self.templates.len() - 1])
    }

    /// Registers a single file from disk, at the root of the template set.
    pub fn add_template_file_path(
        &mut self,
        path: &Path,
        renderer: RendererId,
    ) -> Result<&TemplateSource> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                LevoError::validation(format!("`{}` does not name a file", path.display()))
            })?;
        let body = read_file(path)?;
        self.add_template(&file_name, body, TEMPLATER_VERSION, "", renderer)
    }

    /// Registers every file below `root`.
    ///
    /// Version control directories are skipped entirely, as are OS metadata
    /// files. Each template's directory is recorded relative to `root`.
    /// Nothing is registered if any file fails to read or collides with an
    /// existing template.
    #[instrument(skip(self), fields(root = %root.display()))]
    pub fn add_template_directory(
        &mut self,
        root: &Path,
        renderer: RendererId,
    ) -> Result<&[TemplateSource]> {
        let mut pending = Vec::new();
        let mut seen = HashSet::new();

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_skipped_directory(entry));
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if SKIPPED_FILES.contains(&file_name.as_str()) {
                debug!(path = %entry.path().display(), "Skipping metadata file");
                continue;
            }

            let directory = relative_directory(root, entry.path());
            if self.find_template(&file_name, &directory).is_ok()
                || !seen.insert((file_name.clone(), directory.clone()))
            {
                return Err(LevoError::duplicate(EntityKind::Template, file_name));
            }

            let body = read_file(entry.path())?;
            pending.push(build_source(
                &file_name,
                body,
                TEMPLATER_VERSION,
                &directory,
                renderer,
            )?);
        }

        if pending.is_empty() {
            warn!("No template files found");
        }
        debug!(count = pending.len(), "Registered template directory");
        let first = self.templates.len();
        self.templates.extend(pending);
        Ok(&self.templates[first..])
    }

    /// Exact `(file_name, directory)` lookup.
    pub fn find_template(&self, file_name: &str, directory: &str) -> Result<&TemplateSource> {
        self.templates
            .iter()
            .find(|source| source.file_name == file_name && source.directory == directory)
            .ok_or_else(|| LevoError::not_found(EntityKind::Template, file_name))
    }

    /// Every template with this file name, in any directory.
    pub fn template_for_file_name(&self, file_name: &str) -> Result<Vec<&TemplateSource>> {
        let ids = self.ids_for_file_name(file_name)?;
        Ok(ids.into_iter().map(|id| &self.templates[id.0]).collect())
    }

    /// Like [`TemplateRegistry::template_for_file_name`], but yields handles.
    pub fn ids_for_file_name(&self, file_name: &str) -> Result<Vec<TemplateId>> {
        let ids: Vec<TemplateId> = self
            .templates
            .iter()
            .enumerate()
            .filter(|(_, source)| source.file_name == file_name)
            .map(|(index, _)| TemplateId(index))
            .collect();
        if ids.is_empty() {
            return Err(LevoError::not_found(EntityKind::Template, file_name));
        }
        Ok(ids)
    }

    pub fn get(&self, id: TemplateId) -> Option<&TemplateSource> {
        self.templates.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TemplateSource> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn build_source(
    file_name: &str,
    body: Vec<u8>,
    version: &str,
    directory: &str,
    renderer: RendererId,
) -> Result<TemplateSource> {
    if file_name.is_empty() {
        return Err(LevoError::validation("templates must have a file name"));
    }
    if version.is_empty() {
        return Err(LevoError::validation(format!(
            "template '{file_name}' must have a version"
        )));
    }
    Ok(TemplateSource {
        file_name: file_name.to_string(),
        directory: directory.to_string(),
        version: version.to_string(),
        body: TemplateBody::for_file(file_name, body)?,
        renderer,
    })
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| LevoError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn is_skipped_directory(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && SKIPPED_DIRECTORIES.contains(&entry.file_name().to_string_lossy().as_ref())
}

/// Parent directory of `path` relative to `root`, `/`-separated.
fn relative_directory(root: &Path, path: &Path) -> String {
    let parent = path.parent().unwrap_or(root);
    let relative = parent.strip_prefix(root).unwrap_or(parent);
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
