//! Assertions over the directory tree a download produces

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Every regular file under `root`, relative to it, sorted
pub fn files_under(root: &Path) -> Vec<PathBuf> {
    if !root.exists() {
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.path().strip_prefix(root).ok().map(Path::to_path_buf))
        .collect();
    files.sort();
    files
}

/// Number of regular files under `root/sub`
pub fn count_files(root: &Path, sub: &str) -> usize {
    files_under(&root.join(sub)).len()
}

/// Assert that `path` holds exactly `expected`
pub fn assert_file_contents(path: &Path, expected: &str) {
    let actual = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
    assert_eq!(actual, expected, "unexpected contents in {}", path.display());
}
