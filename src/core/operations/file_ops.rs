use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error};

/// Result type for file operations
pub type FileOpResult<T> = Result<T, FileOpError>;

/// Error types for file operations
#[derive(Debug, Error)]
pub enum FileOpError {
    #[error("Copy failed: {0}")]
    CopyFailed(String),
    #[error("Create directory failed: {0}")]
    CreateDirFailed(String),
    #[error("Invalid file name: {0:?}")]
    InvalidFileName(PathBuf),
}

/// Create a directory and its parents. An existing directory is not an error,
/// so concurrent workers may call this for the same path.
pub fn ensure_dir(path: &Path) -> FileOpResult<()> {
    fs::create_dir_all(path).map_err(|e| {
        error!("Failed to create directory {:?}: {}", path, e);
        FileOpError::CreateDirFailed(format!("{:?}: {}", path, e))
    })
}

/// Copy `src` into `dest_dir`, keeping its file name. An existing file with
/// the same name is overwritten. The source is never modified.
///
/// # Returns
/// * `Ok(PathBuf)` with the destination path
/// * `Err(FileOpError)` if the name is unusable or the copy failed
pub fn copy_into_dir(src: &Path, dest_dir: &Path) -> FileOpResult<PathBuf> {
    let file_name = src
        .file_name()
        .ok_or_else(|| FileOpError::InvalidFileName(src.to_path_buf()))?;
    let dest = dest_dir.join(file_name);

    debug!("Copying {:?} to {:?}", src, dest);
    if let Err(e) = fs::copy(src, &dest) {
        error!("Failed to copy file from {:?} to {:?}: {}", src, dest, e);
        return Err(FileOpError::CopyFailed(format!(
            "Failed to copy from {:?} to {:?}: {}",
            src, dest, e
        )));
    }

    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_dir_is_idempotent() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("train").join("Tulip");
        ensure_dir(&target).unwrap();
        ensure_dir(&target).unwrap();
        assert!(target.is_dir());
    }

    #[test]
    fn test_copy_into_dir_keeps_source_and_overwrites() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("leaf.jpg");
        fs::write(&src, b"new").unwrap();
        let dest_dir = dir.path().join("out");
        fs::create_dir(&dest_dir).unwrap();
        fs::write(dest_dir.join("leaf.jpg"), b"old contents").unwrap();

        let dest = copy_into_dir(&src, &dest_dir).unwrap();
        assert_eq!(dest, dest_dir.join("leaf.jpg"));
        assert_eq!(fs::read(&dest).unwrap(), b"new");
        assert!(src.exists());
    }

    #[test]
    fn test_copy_into_dir_missing_source() {
        let dir = tempdir().unwrap();
        let result = copy_into_dir(&dir.path().join("gone.jpg"), dir.path());
        assert!(matches!(result, Err(FileOpError::CopyFailed(_))));
    }

    #[test]
    fn test_copy_into_dir_without_file_name() {
        let dir = tempdir().unwrap();
        let err = copy_into_dir(Path::new("/"), dir.path()).unwrap_err();
        assert!(matches!(err, FileOpError::InvalidFileName(_)));
        assert_eq!(err.to_string(), "Invalid file name: \"/\"");
    }

    #[test]
    fn test_ensure_dir_under_file_fails() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("train");
        fs::write(&blocker, b"x").unwrap();
        let err = ensure_dir(&blocker.join("Tulip")).unwrap_err();
        assert!(err.to_string().starts_with("Create directory failed: "));
    }
}
