//! Mapping from file-system paths to template names and storage keys.
//!
//! A path is a template when it ends with one of the configured extensions.
//! When several extensions match (`.html.tera` and `.tera` both match
//! `page.html.tera`) the longest one wins, so the key becomes `page` and not
//! `page.html`.
//!
//! The extension is stripped from the full path first and the result is then made
//! relative to the template root. Paths outside the root, and files whose name is
//! nothing but the extension, are not templates.

use std::path::{Component, MAIN_SEPARATOR_STR, Path, PathBuf};

/// Identity of a template file under the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePath {
    /// Root-relative path without extension, using the platform separator.
    pub name: String,
    /// Root-relative path without extension, always `/`-separated.
    pub key: String,
    /// The extension that matched, including its leading dot.
    pub extension: String,
}

/// Classifies paths under one template root.
#[derive(Debug, Clone)]
pub struct PathNormalizer {
    root: PathBuf,
    /// Sorted longest first.
    extensions: Vec<String>,
}

impl PathNormalizer {
    pub fn new<I, S>(root: impl Into<PathBuf>, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut extensions: Vec<String> = extensions.into_iter().map(Into::into).collect();
        extensions.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        extensions.dedup();
        Self {
            root: root.into(),
            extensions,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Extensions in matching order.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// The longest configured extension that `path` ends with.
    pub fn matching_extension(&self, path: &str) -> Option<&str> {
        self.extensions.iter().map(String::as_str).find(|ext| path.ends_with(ext))
    }

    /// Classify `path`, returning `None` when it is not a template.
    ///
    /// `path` may be absolute (it must then live under the root) or relative to
    /// the root.
    pub fn normalize(&self, path: &Path) -> Option<TemplatePath> {
        let raw = path.to_string_lossy();
        let extension = self.matching_extension(&raw)?;
        let stripped = &raw[..raw.len() - extension.len()];

        if stripped.is_empty() || stripped.ends_with('/') || stripped.ends_with('\\') {
            return None;
        }

        let stripped = Path::new(stripped);
        let relative = if stripped.is_absolute() {
            stripped.strip_prefix(&self.root).ok()?
        } else {
            stripped.strip_prefix(&self.root).unwrap_or(stripped)
        };

        let parts = relative_parts(relative)?;
        if parts.is_empty() {
            return None;
        }

        Some(TemplatePath {
            name: parts.join(MAIN_SEPARATOR_STR),
            key: parts.join("/"),
            extension: extension.to_string(),
        })
    }

    /// Canonical storage key for a name supplied by a caller or a template reference.
    ///
    /// Leading slashes and a trailing configured extension are removed and
    /// separators are normalized, so `/layouts/main.html` and `layouts/main`
    /// address the same entry.
    pub fn lookup_key(&self, name: &str) -> String {
        let unified = name.replace('\\', "/");
        let trimmed = unified.trim_start_matches('/');
        let trimmed = trimmed.strip_prefix("./").unwrap_or(trimmed);
        match self.matching_extension(trimmed) {
            Some(ext) if trimmed.len() > ext.len() => trimmed[..trimmed.len() - ext.len()].to_string(),
            _ => trimmed.to_string(),
        }
    }
}

/// Normal components of a relative path; `None` if it climbs out of the root.
fn relative_parts(path: &Path) -> Option<Vec<String>> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(parts)
}
