use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Errors from resource resolution.
#[derive(Debug, thiserror::Error)]
pub enum LocatorError {
    #[error("malformed resource url: {0}")]
    Malformed(String),
    #[error("unknown package '{package}' in {url}")]
    UnknownPackage { package: String, url: String },
}

/// Resolves resource urls found in robot descriptions (mesh files, textures)
/// to filesystem paths.
///
/// A locator is passed explicitly to whichever step needs it; nothing is
/// registered globally.
pub trait ResourceLocator {
    fn locate(&self, url: &str) -> Result<PathBuf, LocatorError>;
}

impl<F> ResourceLocator for F
where
    F: Fn(&str) -> Result<PathBuf, LocatorError>,
{
    fn locate(&self, url: &str) -> Result<PathBuf, LocatorError> {
        self(url)
    }
}

/// Locator for `package://<name>/<relative>` urls backed by a fixed table of
/// package roots.
///
/// `file://` urls and bare paths pass through unchanged.
#[derive(Debug, Clone, Default)]
pub struct PackageLocator {
    packages: BTreeMap<String, PathBuf>,
}

impl PackageLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the root directory of a package.
    pub fn with_package(mut self, name: impl Into<String>, root: impl AsRef<Path>) -> Self {
        self.insert(name, root);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, root: impl AsRef<Path>) {
        self.packages.insert(name.into(), root.as_ref().to_path_buf());
    }

    pub fn package_root(&self, name: &str) -> Option<&Path> {
        self.packages.get(name).map(PathBuf::as_path)
    }
}

impl ResourceLocator for PackageLocator {
    fn locate(&self, url: &str) -> Result<PathBuf, LocatorError> {
        if let Some(rest) = url.strip_prefix("package://") {
            let (package, relative) = rest
                .split_once('/')
                .ok_or_else(|| LocatorError::Malformed(url.to_string()))?;
            if package.is_empty() {
                return Err(LocatorError::Malformed(url.to_string()));
            }
            let root = self
                .packages
                .get(package)
                .ok_or_else(|| LocatorError::UnknownPackage {
                    package: package.to_string(),
                    url: url.to_string(),
                })?;
            return Ok(root.join(relative));
        }
        Ok(PathBuf::from(url.strip_prefix("file://").unwrap_or(url)))
    }
}
