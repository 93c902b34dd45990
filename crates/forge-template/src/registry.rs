//! Named template registry.
//!
//! Code-generation handlers pick their template by name (`MonoBehaviour`,
//! `GameKitActor`, `ScriptableObject`). [`TemplateRegistry`] maps those names
//! to template text collected from inline strings and template directories.
//!
//! # Template Resolution
//!
//! 1. Inline templates (added via [`TemplateRegistry::add_inline`]) have the
//!    highest priority and overwrite each other.
//! 2. Directory templates are registered under their path relative to the
//!    directory root, with `/` separators, both with and without extension:
//!    `ai/Patrol.cs.tmpl` resolves as `"ai/Patrol.cs"` and `"ai/Patrol.cs.tmpl"`.
//!
//! # Supported Extensions
//!
//! | Priority | Extension |
//! |----------|-----------|
//! | 1 (highest) | `.tmpl` |
//! | 2 | `.template` |
//! | 3 (lowest) | `.txt` |
//!
//! If one directory holds the same base name with several extensions, the
//! higher-priority extension owns the extensionless name. The same name
//! coming from two different directories is a [`TemplateError::Collision`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, TemplateError};

/// Recognized template file extensions in priority order.
pub const TEMPLATE_EXTENSIONS: &[&str] = &[".tmpl", ".template", ".txt"];

/// A template file discovered during directory walking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    /// Resolution name without extension (e.g. `"ai/Patrol.cs"`).
    pub name: String,
    /// Resolution name with extension (e.g. `"ai/Patrol.cs.tmpl"`).
    pub name_with_ext: String,
    /// Full path for reading content.
    pub absolute_path: PathBuf,
    /// The template directory this file came from.
    pub source_dir: PathBuf,
}

impl TemplateFile {
    /// Returns the extension priority (lower is higher priority).
    ///
    /// Returns `usize::MAX` if the extension is not recognized.
    pub fn extension_priority(&self) -> usize {
        TEMPLATE_EXTENSIONS
            .iter()
            .position(|ext| self.name_with_ext.ends_with(ext))
            .unwrap_or(usize::MAX)
    }
}

/// Registry of named templates.
///
/// File contents are read once when a directory is added.
///
/// # Example
///
/// ```rust
/// use forge_template::TemplateRegistry;
///
/// let mut registry = TemplateRegistry::new();
/// registry.add_inline("Empty", "public class {{CLASS_NAME}} {}");
///
/// assert_eq!(registry.get("Empty").unwrap(), "public class {{CLASS_NAME}} {}");
/// assert!(registry.get("Missing").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    /// Inline templates (highest priority).
    inline: HashMap<String, String>,
    /// Directory templates: name → content.
    files: HashMap<String, String>,
    /// Origin of each directory template: name → (path, source_dir).
    sources: HashMap<String, (PathBuf, PathBuf)>,
}

impl TemplateRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an inline template, replacing any inline template of that name.
    pub fn add_inline(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.inline.insert(name.into(), content.into());
    }

    /// Walks `dir` and registers every template file found.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Io`] if the directory or a file cannot be
    /// read, and [`TemplateError::Collision`] if a name is already provided
    /// by another directory. On error nothing from `dir` is registered.
    pub fn add_template_dir(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        let files = walk_template_dir(dir.as_ref())?;
        debug!(dir = %dir.as_ref().display(), count = files.len(), "loading template directory");
        self.add_from_files(files)
    }

    /// Registers templates discovered by [`walk_template_dir`].
    ///
    /// # Errors
    ///
    /// See [`add_template_dir`](Self::add_template_dir).
    pub fn add_from_files(&mut self, files: Vec<TemplateFile>) -> Result<()> {
        let mut sorted = files;
        sorted.sort_by(|a, b| {
            a.extension_priority()
                .cmp(&b.extension_priority())
                .then_with(|| a.absolute_path.cmp(&b.absolute_path))
        });

        // Read and check everything first: an error leaves the registry as it was
        let mut sources: HashMap<String, (PathBuf, PathBuf)> = HashMap::new();
        let mut contents: Vec<(String, String)> = Vec::new();

        for file in sorted {
            let content =
                std::fs::read_to_string(&file.absolute_path).map_err(|source| TemplateError::Io {
                    path: file.absolute_path.clone(),
                    source,
                })?;

            let owner = sources
                .get(&file.name)
                .or_else(|| self.sources.get(&file.name));
            match owner {
                Some((existing, existing_dir)) if existing_dir != &file.source_dir => {
                    return Err(TemplateError::Collision {
                        name: file.name,
                        existing: existing.clone(),
                        conflicting: file.absolute_path,
                    });
                }
                // Same directory, lower-priority extension: full name only
                Some((existing, _))
                    if existing != &file.absolute_path || sources.contains_key(&file.name) => {}
                // New name, or the same file loaded again
                _ => {
                    sources.insert(
                        file.name.clone(),
                        (file.absolute_path.clone(), file.source_dir.clone()),
                    );
                    contents.push((file.name, content.clone()));
                }
            }

            contents.push((file.name_with_ext, content));
        }

        self.sources.extend(sources);
        self.files.extend(contents);
        Ok(())
    }

    /// Looks up a template by name.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NotFound`] if no template has this name.
    pub fn get(&self, name: &str) -> Result<&str> {
        self.inline
            .get(name)
            .or_else(|| self.files.get(name))
            .map(String::as_str)
            .ok_or_else(|| TemplateError::NotFound {
                name: name.to_string(),
            })
    }

    /// Returns true if a template is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.inline.contains_key(name) || self.files.contains_key(name)
    }

    /// Returns all registered names, sorted and deduplicated.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .inline
            .keys()
            .chain(self.files.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Returns the number of distinct registered names.
    pub fn len(&self) -> usize {
        self.names().len()
    }

    /// Returns true if no templates are registered.
    pub fn is_empty(&self) -> bool {
        self.inline.is_empty() && self.files.is_empty()
    }

    /// Removes every template.
    pub fn clear(&mut self) {
        self.inline.clear();
        self.files.clear();
        self.sources.clear();
    }
}

/// Recursively collects template files under `root`.
///
/// # Errors
///
/// Returns [`TemplateError::Io`] if `root` or one of its subdirectories
/// cannot be read.
pub fn walk_template_dir(root: impl AsRef<Path>) -> Result<Vec<TemplateFile>> {
    let root = root.as_ref();
    let root = root.canonicalize().map_err(|source| TemplateError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    walk_recursive(&root, &root, &mut files)?;
    Ok(files)
}

fn walk_recursive(current: &Path, root: &Path, files: &mut Vec<TemplateFile>) -> Result<()> {
    let io_error = |source| TemplateError::Io {
        path: current.to_path_buf(),
        source,
    };

    for entry in std::fs::read_dir(current).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(io_error)?;

        if file_type.is_dir() {
            walk_recursive(&path, root, files)?;
        } else if path.is_file() {
            // Symlinks are followed for files only, so links cannot form cycles
            if let Some(file) = template_file(&path, root) {
                files.push(file);
            }
        } else if file_type.is_symlink() {
            debug!(path = %path.display(), "skipping symlink that is not a file");
        }
    }

    Ok(())
}

/// Builds a [`TemplateFile`] if `path` has a recognized extension.
fn template_file(path: &Path, root: &Path) -> Option<TemplateFile> {
    let relative = path.strip_prefix(root).ok()?;
    let name_with_ext = relative
        .to_string_lossy()
        .replace(std::path::MAIN_SEPARATOR, "/");

    let extension = TEMPLATE_EXTENSIONS
        .iter()
        .find(|ext| name_with_ext.ends_with(*ext))?;
    let name = name_with_ext.strip_suffix(extension)?.to_string();
    if name.is_empty() || name.ends_with('/') {
        return None;
    }

    Some(TemplateFile {
        name,
        name_with_ext,
        absolute_path: path.to_path_buf(),
        source_dir: root.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn extension_priority() {
        let file = |ext: &str| TemplateFile {
            name: "a".into(),
            name_with_ext: format!("a{}", ext),
            absolute_path: PathBuf::new(),
            source_dir: PathBuf::new(),
        };
        assert_eq!(file(".tmpl").extension_priority(), 0);
        assert_eq!(file(".template").extension_priority(), 1);
        assert_eq!(file(".txt").extension_priority(), 2);
        assert_eq!(file(".cs").extension_priority(), usize::MAX);
    }

    #[test]
    fn inline_overwrites() {
        let mut registry = TemplateRegistry::new();
        registry.add_inline("t", "one");
        registry.add_inline("t", "two");
        assert_eq!(registry.get("t").unwrap(), "two");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn not_found() {
        let registry = TemplateRegistry::new();
        let err = registry.get("nope").unwrap_err();
        assert!(matches!(err, TemplateError::NotFound { ref name } if name == "nope"));
        assert!(registry.is_empty());
    }

    #[test]
    fn loads_directory_with_and_without_extension() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "MonoBehaviour.cs.tmpl", "class {{CLASS_NAME}}");
        write(dir.path(), "ai/Patrol.txt", "patrol");
        write(dir.path(), "README.md", "ignored");

        let mut registry = TemplateRegistry::new();
        registry.add_template_dir(dir.path()).unwrap();

        assert_eq!(registry.get("MonoBehaviour.cs").unwrap(), "class {{CLASS_NAME}}");
        assert_eq!(
            registry.get("MonoBehaviour.cs.tmpl").unwrap(),
            "class {{CLASS_NAME}}"
        );
        assert_eq!(registry.get("ai/Patrol").unwrap(), "patrol");
        assert!(!registry.contains("README"));
        assert_eq!(
            registry.names(),
            vec!["MonoBehaviour.cs", "MonoBehaviour.cs.tmpl", "ai/Patrol", "ai/Patrol.txt"]
        );
    }

    #[test]
    fn higher_priority_extension_wins_within_directory() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Actor.txt", "from txt");
        write(dir.path(), "Actor.tmpl", "from tmpl");

        let mut registry = TemplateRegistry::new();
        registry.add_template_dir(dir.path()).unwrap();

        assert_eq!(registry.get("Actor").unwrap(), "from tmpl");
        assert_eq!(registry.get("Actor.txt").unwrap(), "from txt");
    }

    #[test]
    fn collision_across_directories() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        write(first.path(), "Actor.tmpl", "a");
        write(second.path(), "Actor.txt", "b");
        // Sorted ahead of the colliding file
        write(second.path(), "Banner.tmpl", "banner");

        let mut registry = TemplateRegistry::new();
        registry.add_template_dir(first.path()).unwrap();
        let err = registry.add_template_dir(second.path()).unwrap_err();

        assert!(matches!(err, TemplateError::Collision { ref name, .. } if name == "Actor"));
        assert!(err.to_string().contains("Actor"));

        // Nothing from the failing directory is registered
        assert!(!registry.contains("Banner"));
        assert!(!registry.contains("Banner.tmpl"));
        assert!(!registry.contains("Actor.txt"));
        assert_eq!(registry.names(), vec!["Actor", "Actor.tmpl"]);
        assert_eq!(registry.get("Actor").unwrap(), "a");
    }

    #[test]
    fn reloading_a_directory_picks_up_changes() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Actor.tmpl", "old");

        let mut registry = TemplateRegistry::new();
        registry.add_template_dir(dir.path()).unwrap();
        write(dir.path(), "Actor.tmpl", "new");
        registry.add_template_dir(dir.path()).unwrap();

        assert_eq!(registry.get("Actor").unwrap(), "new");
        assert_eq!(registry.get("Actor.tmpl").unwrap(), "new");
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_not_followed() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "ai/Patrol.tmpl", "patrol");
        write(dir.path(), "shared.tmpl", "shared");
        // A cycle back to the root, and a link to a template file
        std::os::unix::fs::symlink(dir.path(), dir.path().join("ai/loop")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("shared.tmpl"), dir.path().join("Linked.tmpl"))
            .unwrap();

        let mut registry = TemplateRegistry::new();
        registry.add_template_dir(dir.path()).unwrap();

        assert_eq!(
            registry.names(),
            vec!["Linked", "Linked.tmpl", "ai/Patrol", "ai/Patrol.tmpl", "shared", "shared.tmpl"]
        );
        assert_eq!(registry.get("Linked").unwrap(), "shared");
    }

    #[test]
    fn inline_shadows_directory() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Actor.tmpl", "file");

        let mut registry = TemplateRegistry::new();
        registry.add_template_dir(dir.path()).unwrap();
        registry.add_inline("Actor", "inline");

        assert_eq!(registry.get("Actor").unwrap(), "inline");
    }

    #[test]
    fn missing_directory_is_io_error() {
        let mut registry = TemplateRegistry::new();
        let err = registry
            .add_template_dir("/definitely/not/a/template/dir")
            .unwrap_err();
        assert!(matches!(err, TemplateError::Io { .. }));
    }

    #[test]
    fn clear_removes_everything() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "A.tmpl", "a");

        let mut registry = TemplateRegistry::new();
        registry.add_template_dir(dir.path()).unwrap();
        registry.add_inline("B", "b");
        registry.clear();

        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);

        // Names are free again after clearing
        registry.add_template_dir(dir.path()).unwrap();
        assert!(registry.contains("A"));
    }
}
