//! Plain-text corpus loading.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::document::Document;
use crate::error::{RagError, Result};

/// Read every file under `root` whose extension is in `extensions`.
///
/// A missing `root` is created and yields no documents. Files are returned
/// sorted by path. A file that cannot be read or is not valid UTF-8 is
/// skipped with a warning and the scan continues.
///
/// # Errors
///
/// Returns [`RagError::LoaderError`] if `root` exists but is not a directory
/// or cannot be created.
pub fn load_documents(root: impl AsRef<Path>, extensions: &[String]) -> Result<Vec<Document>> {
    let root = root.as_ref();
    if !root.exists() {
        fs::create_dir_all(root).map_err(|e| loader_error(root, e))?;
        debug!(path = %root.display(), "created empty data directory");
        return Ok(Vec::new());
    }
    if !root.is_dir() {
        return Err(RagError::LoaderError {
            path: root.display().to_string(),
            message: "not a directory".to_string(),
        });
    }

    let mut documents = Vec::new();
    for path in discover_text_files(root, extensions) {
        match fs::read_to_string(&path) {
            Ok(text) => {
                let relative = path.strip_prefix(root).unwrap_or(&path);
                documents.push(Document {
                    id: relative_id(relative),
                    path: path.display().to_string(),
                    text,
                });
            }
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable file"),
        }
    }
    Ok(documents)
}

fn discover_text_files(root: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut files = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| has_extension(entry.path(), extensions))
        .map(|entry| entry.into_path())
        .collect::<Vec<_>>();

    files.sort();
    files
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
}

fn relative_id(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn loader_error(path: &Path, e: std::io::Error) -> RagError {
    RagError::LoaderError { path: path.display().to_string(), message: e.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txt() -> Vec<String> {
        vec!["txt".to_string()]
    }

    #[test]
    fn loads_text_files_recursively_in_path_order() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("faq/shipping")).unwrap();
        fs::write(root.join("returns.txt"), "Returns within 14 days.").unwrap();
        fs::write(root.join("faq/shipping/intl.TXT"), "We ship abroad.").unwrap();
        fs::write(root.join("faq/notes.md"), "ignored").unwrap();

        let docs = load_documents(root, &txt()).unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["faq/shipping/intl.TXT", "returns.txt"]);
        assert_eq!(docs[1].text, "Returns within 14 days.");
    }

    #[test]
    fn missing_directory_is_created_and_empty() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("data");

        let docs = load_documents(&root, &txt()).unwrap();
        assert!(docs.is_empty());
        assert!(root.is_dir());
    }

    #[test]
    fn invalid_utf8_file_is_skipped() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("a.txt"), [0xff, 0xfe, 0x00]).unwrap();
        fs::write(temp.path().join("b.txt"), "readable").unwrap();

        let docs = load_documents(temp.path(), &txt()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "b.txt");
    }

    #[test]
    fn file_root_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("corpus.txt");
        fs::write(&file, "x").unwrap();

        let err = load_documents(&file, &txt()).unwrap_err();
        assert!(matches!(err, RagError::LoaderError { .. }));
    }
}
