//! Carves named output files out of one rendered text blob.
//!
//! A rendered template marks each output file with a sentinel pair:
//!
//! ```text
//! <<levo filename:User.java directory:src/main/java>>
//! public class User {}
//! <<levo>>
//! ```
//!
//! The `directory:` part is optional; without it the caller's default
//! directory is used. Blocks are found left to right and never overlap: a
//! body runs to the first `<<levo>>` after its header, even if another header
//! appears in between. A header with no `<<levo>>` anywhere after it ends the
//! scan. Headers broken by a newline are not headers, and a block with an
//! empty file name is consumed without producing a file.

use std::borrow::Cow;
use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::Result;

/// Prefix marking a base64-armored passthrough body.
pub const BASE64_ARMOR: &str = "<<levobase64>>";

const HEADER_OPEN: &str = "<<levo filename:";
const HEADER_CLOSE: &str = ">>";
const DIRECTORY_FIELD: &str = " directory:";
const BLOCK_CLOSE: &str = "<<levo>>";

lazy_static! {
    /// Trailing `!>` joins a template line onto the next one.
    static ref LINE_CONTINUATION: Regex =
        Regex::new(r"[\t ]*!>\n").expect("line continuation pattern is valid");
}

/// One output file produced by a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub file_name: String,
    /// Directory relative to the output root; empty for the root itself.
    pub directory: String,
    pub body: Vec<u8>,
}

impl GeneratedFile {
    pub fn new(
        file_name: impl Into<String>,
        directory: impl Into<String>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            directory: directory.into(),
            body: body.into(),
        }
    }

    /// Output path relative to the output root.
    pub fn relative_path(&self) -> PathBuf {
        let mut path = PathBuf::new();
        if !self.directory.is_empty() {
            path.push(&self.directory);
        }
        path.push(&self.file_name);
        path
    }

    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// The bytes to write to disk.
    ///
    /// Passthrough bodies carry the [`BASE64_ARMOR`] prefix and are decoded;
    /// everything else is returned as is.
    pub fn decoded_body(&self) -> Result<Cow<'_, [u8]>> {
        match self.body.strip_prefix(BASE64_ARMOR.as_bytes()) {
            Some(encoded) => Ok(Cow::Owned(STANDARD.decode(encoded)?)),
            None => Ok(Cow::Borrowed(&self.body)),
        }
    }
}

/// Base64-armors an opaque payload.
pub fn armor(payload: &[u8]) -> String {
    format!("{BASE64_ARMOR}{}", STANDARD.encode(payload))
}

/// Extracts every sentinel-delimited file from `text`.
///
/// An empty result is not an error: it tells the caller the text was not a
/// multi-file template.
pub fn extract_files(text: &str, default_directory: &str) -> Vec<GeneratedFile> {
    let mut files = Vec::new();
    let mut cursor = 0;

    while let Some(found) = text[cursor..].find(HEADER_OPEN) {
        let start = cursor + found;
        let fields_start = start + HEADER_OPEN.len();

        let Some(header) = read_header(&text[fields_start..]) else {
            cursor = fields_start;
            continue;
        };
        let body_start = fields_start + header.len + HEADER_CLOSE.len();
        let rest = &text[body_start..];

        let Some(close) = rest.find(BLOCK_CLOSE) else {
            break;
        };

        if !header.file_name.is_empty() {
            let directory = match header.directory {
                Some(directory) if !directory.is_empty() => directory,
                _ => default_directory,
            };
            files.push(GeneratedFile::new(
                header.file_name,
                directory,
                clean_body(&rest[..close]),
            ));
        }
        cursor = body_start + close + BLOCK_CLOSE.len();
    }

    files
}

struct Header<'a> {
    file_name: &'a str,
    directory: Option<&'a str>,
    /// Length of the header fields, up to but excluding the closing `>>`.
    len: usize,
}

fn read_header(fields: &str) -> Option<Header<'_>> {
    let len = fields.find(HEADER_CLOSE)?;
    let raw = &fields[..len];
    if raw.contains('\n') {
        return None;
    }
    let (file_name, directory) = match raw.find(DIRECTORY_FIELD) {
        Some(split) => (&raw[..split], Some(&raw[split + DIRECTORY_FIELD.len()..])),
        None => (raw, None),
    };
    Some(Header {
        file_name,
        directory,
        len,
    })
}

fn clean_body(body: &str) -> String {
    LINE_CONTINUATION
        .replace_all(body, "")
        .trim_matches(|c| matches!(c, '\n' | '\t' | ' '))
        .to_string()
}
