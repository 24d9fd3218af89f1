//! Locating and reading Sigh source files.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::CoreError;

/// Extension of Sigh source files.
pub const SOURCE_EXTENSION: &str = "si";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub contents: String,
}

/// Load `root` itself when it is a file, or every `*.si` file beneath it
/// (sorted by path) when it is a directory.
pub fn load_sources(root: impl AsRef<Path>) -> Result<Vec<SourceFile>, CoreError> {
    let root = root.as_ref();
    if root.is_file() {
        let contents = fs::read_to_string(root)?;
        return Ok(vec![SourceFile {
            path: root.to_path_buf(),
            contents,
        }]);
    }
    if !root.is_dir() {
        return Err(CoreError::MissingSources(root.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|err| match err.into_io_error() {
            Some(io) => CoreError::SourceIo(io),
            None => CoreError::MissingSources(root.to_path_buf()),
        })?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION) {
            let contents = fs::read_to_string(path)?;
            files.push(SourceFile {
                path: path.to_path_buf(),
                contents,
            });
        }
    }
    if files.is_empty() {
        return Err(CoreError::MissingSources(root.to_path_buf()));
    }
    log::debug!("loaded {} source file(s) from {}", files.len(), root.display());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_a_single_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("main.si");
        fs::write(&path, "return 1").expect("write");
        let files = load_sources(&path).expect("load");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].contents, "return 1");
    }

    #[test]
    fn walks_directories_in_path_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("nested")).expect("mkdir");
        fs::write(dir.path().join("b.si"), "return 2").expect("write");
        fs::write(dir.path().join("a.si"), "return 1").expect("write");
        fs::write(dir.path().join("nested/c.si"), "return 3").expect("write");
        fs::write(dir.path().join("notes.txt"), "ignored").expect("write");

        let files = load_sources(dir.path()).expect("load");
        let names: Vec<_> = files
            .iter()
            .map(|f| f.path.strip_prefix(dir.path()).expect("prefix").to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.si"),
                PathBuf::from("b.si"),
                PathBuf::from("nested/c.si")
            ]
        );
    }

    #[test]
    fn reports_missing_sources() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            load_sources(dir.path()),
            Err(CoreError::MissingSources(_))
        ));
        assert!(matches!(
            load_sources(dir.path().join("absent.si")),
            Err(CoreError::MissingSources(_))
        ));
    }
}
