use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use levo_lib::GeneratedFile;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

use crate::error::CliError;

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> CliError + '_ {
    move |source| CliError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Writes every generated file below `root`.
///
/// Each file is written to a temp file next to its destination and renamed
/// into place, so an interrupted run never leaves a half-written file. Paths
/// must stay below `root`; the first one that does not fails the whole batch
/// before anything is written.
#[instrument(skip(files), fields(files = files.len(), root = %root.display()))]
pub fn write_files(files: &[GeneratedFile], root: &Path) -> Result<Vec<PathBuf>, CliError> {
    let relative_paths = files
        .iter()
        .map(|file| contained_path(file.relative_path()))
        .collect::<Result<Vec<_>, _>>()?;

    let mut written = Vec::with_capacity(files.len());
    for (file, relative) in files.iter().zip(relative_paths) {
        let path = root.join(relative);
        let parent = path.parent().unwrap_or(root);
        fs::create_dir_all(parent).map_err(io_error(parent))?;

        let body = file.decoded_body()?;
        let mut temp_file = NamedTempFile::new_in(parent).map_err(io_error(parent))?;
        temp_file.write_all(&body).map_err(io_error(&path))?;
        temp_file
            .persist(&path)
            .map_err(|err| io_error(&path)(err.error))?;

        debug!(path = %path.display(), bytes = body.len(), "Wrote file");
        written.push(path);
    }
    info!(count = written.len(), "Wrote generated files");
    Ok(written)
}

/// Only plain names (and `.`) may appear, so joining onto the root cannot
/// replace it or climb out of it.
fn contained_path(path: PathBuf) -> Result<PathBuf, CliError> {
    let contained = path
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
    if contained {
        Ok(path)
    } else {
        Err(CliError::UnsafePath { path })
    }
}

/// Lists what would be written, one relative path per line.
pub fn print_plan(files: &[GeneratedFile]) {
    for file in files {
        println!("{}", file.relative_path().display());
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn writes_nested_and_armored_files() {
        let dir = TempDir::new().expect("temp dir");
        let files = vec![
            GeneratedFile::new("Order.java", "src/com/acme", "class Order {}"),
            GeneratedFile::new("logo.png", "", levo_lib::splitter::armor(&[1, 2, 3])),
        ];

        let written = write_files(&files, dir.path()).expect("write");
        assert_eq!(written.len(), 2);
        assert_eq!(
            fs::read_to_string(dir.path().join("src/com/acme/Order.java")).expect("read"),
            "class Order {}"
        );
        assert_eq!(fs::read(dir.path().join("logo.png")).expect("read"), vec![1, 2, 3]);
    }

    #[test]
    fn refuses_paths_outside_the_root() {
        let root = TempDir::new().expect("temp dir");
        let elsewhere = TempDir::new().expect("temp dir");
        let absolute = elsewhere.path().to_string_lossy().into_owned();

        let cases = [
            GeneratedFile::new("escaped.txt", absolute.as_str(), "x"),
            GeneratedFile::new("escaped.txt", "../..", "x"),
            GeneratedFile::new("escaped.txt", "src/../../up", "x"),
            GeneratedFile::new("../escaped.txt", "", "x"),
        ];
        for file in cases {
            let err = write_files(&[file.clone()], root.path()).expect_err("unsafe path");
            assert!(matches!(err, CliError::UnsafePath { .. }), "{file:?}");
        }
        assert!(!elsewhere.path().join("escaped.txt").exists());
        assert!(!root.path().parent().expect("parent").join("escaped.txt").exists());
    }

    #[test]
    fn unsafe_path_fails_the_batch_before_writing() {
        let root = TempDir::new().expect("temp dir");
        let files = vec![
            GeneratedFile::new("first.txt", "", "ok"),
            GeneratedFile::new("escaped.txt", "..", "x"),
        ];
        assert!(write_files(&files, root.path()).is_err());
        assert!(!root.path().join("first.txt").exists());
    }

    #[test]
    fn current_directory_components_are_allowed() {
        let root = TempDir::new().expect("temp dir");
        write_files(&[GeneratedFile::new("a.txt", "./src", "a")], root.path()).expect("write");
        assert_eq!(fs::read_to_string(root.path().join("src/a.txt")).expect("read"), "a");
    }

    #[test]
    fn overwrites_existing_files() {
        let dir = TempDir::new().expect("temp dir");
        fs::write(dir.path().join("a.txt"), "old").expect("seed");
        write_files(&[GeneratedFile::new("a.txt", "", "new")], dir.path()).expect("write");
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).expect("read"), "new");
    }
}
