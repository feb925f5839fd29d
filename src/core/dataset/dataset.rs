use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{SplitError, SplitResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetSplit {
    Train,
    Val,
}

impl DatasetSplit {
    pub const ALL: [DatasetSplit; 2] = [DatasetSplit::Train, DatasetSplit::Val];

    pub fn as_str(&self) -> &str {
        match self {
            DatasetSplit::Train => "train",
            DatasetSplit::Val => "val",
        }
    }
}

impl std::fmt::Display for DatasetSplit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of recognized image extensions, stored lowercased without the dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageExtensions {
    extensions: Vec<String>,
}

impl Default for ImageExtensions {
    fn default() -> Self {
        Self::new(["jpg", "jpeg", "png"])
    }
}

impl ImageExtensions {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut extensions: Vec<String> = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        extensions.sort();
        extensions.dedup();
        Self { extensions }
    }

    /// Case-insensitive match of the path's extension against the set.
    pub fn matches(&self, path: &Path) -> bool {
        match path.extension() {
            Some(ext) => {
                let ext = ext.to_string_lossy().to_lowercase();
                self.extensions.iter().any(|e| *e == ext)
            }
            None => false,
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.extensions
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

/// A class discovered in the source tree: one immediate subdirectory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDir {
    /// Display name, lossy for names that are not valid UTF-8
    pub name: String,
    /// Directory name exactly as on disk; destination paths are built from it
    pub dir_name: OsString,
    pub path: PathBuf,
}

/// Check that `source_dir` exists and is a directory.
pub fn validate_source_dir(source_dir: &Path) -> SplitResult<()> {
    match fs::metadata(source_dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(SplitError::NotADirectory(source_dir.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SplitError::NotFound(source_dir.to_path_buf()))
        }
        Err(e) => Err(SplitError::ReadDir {
            path: source_dir.to_path_buf(),
            source: e,
        }),
    }
}

/// Enumerate the immediate child directories of `source_dir` as classes,
/// sorted by name. Files at this level are ignored. So are `exclude` and its
/// `train`/`val` children, which keeps a destination nested in (or equal to)
/// the source from being split again.
pub fn discover_classes(source_dir: &Path, exclude: Option<&Path>) -> SplitResult<Vec<ClassDir>> {
    validate_source_dir(source_dir)?;

    let entries = fs::read_dir(source_dir).map_err(|e| SplitError::ReadDir {
        path: source_dir.to_path_buf(),
        source: e,
    })?;

    let excluded: Vec<PathBuf> = match exclude {
        Some(dest) => std::iter::once(dest.to_path_buf())
            .chain(DatasetSplit::ALL.iter().map(|split| dest.join(split.as_str())))
            .filter_map(|p| p.canonicalize().ok())
            .collect(),
        None => Vec::new(),
    };

    let mut classes = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SplitError::ReadDir {
            path: source_dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_dir() {
            debug!("Skipping non-directory entry: {:?}", path);
            continue;
        }

        if !excluded.is_empty() {
            if let Ok(canonical) = path.canonicalize() {
                if excluded.contains(&canonical) {
                    warn!("Skipping destination directory inside source: {:?}", path);
                    continue;
                }
            }
        }

        let dir_name = entry.file_name();
        let name = dir_name.to_string_lossy().into_owned();
        classes.push(ClassDir { name, dir_name, path });
    }

    // Byte order of the raw names, which is name order for UTF-8
    classes.sort_by(|a, b| a.dir_name.cmp(&b.dir_name));
    info!("Found {} classes in {:?}", classes.len(), source_dir);
    Ok(classes)
}

/// List the recognized image files directly inside `class_dir`, sorted.
/// Nested directories are not recursed into.
pub fn list_class_images(class_dir: &Path, extensions: &ImageExtensions) -> std::io::Result<Vec<PathBuf>> {
    let mut image_files = Vec::new();
    for entry in fs::read_dir(class_dir)? {
        let path = entry?.path();
        if path.is_file() && extensions.matches(&path) {
            image_files.push(path);
        }
    }

    // Sort files for consistent ordering
    image_files.sort();
    debug!("Found {} images in {:?}", image_files.len(), class_dir);
    Ok(image_files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_extensions_case_insensitive() {
        let exts = ImageExtensions::default();
        assert!(exts.matches(Path::new("a/leaf.JPG")));
        assert!(exts.matches(Path::new("a/leaf.jpeg")));
        assert!(exts.matches(Path::new("leaf.Png")));
        assert!(!exts.matches(Path::new("leaf.gif")));
        assert!(!exts.matches(Path::new("notes.txt")));
        assert!(!exts.matches(Path::new("README")));
    }

    #[test]
    fn test_extensions_normalized() {
        let exts = ImageExtensions::new([".JPG", "png", "jpg", ""]);
        assert_eq!(exts.as_slice(), &["jpg".to_string(), "png".to_string()]);
    }

    #[test]
    fn test_split_names() {
        assert_eq!(DatasetSplit::Train.as_str(), "train");
        assert_eq!(DatasetSplit::Val.to_string(), "val");
    }

    #[test]
    fn test_discover_classes_ignores_files() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("Tulip")).unwrap();
        fs::create_dir(dir.path().join("Aloe Vera")).unwrap();
        fs::write(dir.path().join("labels.json"), "[]").unwrap();

        let classes = discover_classes(dir.path(), None).unwrap();
        let names: Vec<&str> = classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Aloe Vera", "Tulip"]);
    }

    #[test]
    fn test_discover_classes_missing_source() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            discover_classes(&missing, None),
            Err(SplitError::NotFound(_))
        ));
    }

    #[test]
    fn test_discover_classes_source_is_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file.jpg");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(
            discover_classes(&file, None),
            Err(SplitError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_discover_classes_excludes_nested_destination() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("Orchid")).unwrap();
        fs::create_dir(dir.path().join("split_out")).unwrap();

        let classes = discover_classes(dir.path(), Some(dir.path().join("split_out").as_path())).unwrap();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].name, "Orchid");
    }

    #[test]
    fn test_discover_classes_excludes_split_dirs_of_destination() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("Orchid")).unwrap();
        fs::create_dir(dir.path().join("train")).unwrap();
        fs::create_dir(dir.path().join("val")).unwrap();

        // Destination equal to the source after a first run
        let classes = discover_classes(dir.path(), Some(dir.path())).unwrap();
        let names: Vec<&str> = classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Orchid"]);

        // Without a destination they are ordinary classes
        assert_eq!(discover_classes(dir.path(), None).unwrap().len(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_classes_keeps_raw_dir_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().unwrap();
        let first = OsStr::from_bytes(b"cls\xfe");
        let second = OsStr::from_bytes(b"cls\xff");
        fs::create_dir(dir.path().join(first)).unwrap();
        fs::create_dir(dir.path().join(second)).unwrap();

        let classes = discover_classes(dir.path(), None).unwrap();
        assert_eq!(classes.len(), 2);
        assert_eq!(classes[0].dir_name.as_os_str(), first);
        assert_eq!(classes[1].dir_name.as_os_str(), second);
        assert_eq!(classes[0].name, classes[1].name);
    }

    #[test]
    fn test_list_class_images_filters_and_does_not_recurse() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.jpg"), b"x").unwrap();
        fs::write(dir.path().join("a.PNG"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        fs::write(dir.path().join("anim.gif"), b"x").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.jpg"), b"x").unwrap();

        let images = list_class_images(dir.path(), &ImageExtensions::default()).unwrap();
        let names: Vec<String> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PNG", "b.jpg"]);
    }
}
