//! Package resource roots.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::error::{ResourceError, ResourceResult};

/// Package name used when a caller does not name one.
///
/// Unless registered explicitly, it resolves against the process working
/// directory.
pub const MAIN_PACKAGE: &str = "__main__";

/// Locates a resource inside a named package.
pub trait ResourceLocator: Send + Sync {
	/// Returns the absolute path of `relative_path` inside `package`.
	///
	/// Fails when the package is unknown. Whether the resource itself exists
	/// is not checked.
	fn locate(&self, package: &str, relative_path: &str) -> ResourceResult<PathBuf>;
}

/// In-memory table of package resource roots.
///
/// # Examples
///
/// ```
/// use reinhardt_resource::{PackageRegistry, ResourceLocator};
/// use std::path::PathBuf;
///
/// let packages = PackageRegistry::new();
/// packages.register("blog", "/srv/blog");
///
/// assert_eq!(
///     packages.locate("blog", "templates/post.genshi").unwrap(),
///     PathBuf::from("/srv/blog/templates/post.genshi")
/// );
/// assert!(packages.locate("shop", "index.genshi").is_err());
/// ```
#[derive(Debug, Default)]
pub struct PackageRegistry {
	roots: RwLock<HashMap<String, PathBuf>>,
}

impl PackageRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a registry from `(package, root)` pairs.
	pub fn from_roots<I, K, P>(roots: I) -> Self
	where
		I: IntoIterator<Item = (K, P)>,
		K: Into<String>,
		P: Into<PathBuf>,
	{
		let registry = Self::new();
		for (package, root) in roots {
			registry.register(package, root);
		}
		registry
	}

	/// Registers (or replaces) the resource root of `package`.
	pub fn register(&self, package: impl Into<String>, root: impl Into<PathBuf>) {
		let package = package.into();
		let root = root.into();
		tracing::debug!(package = %package, root = %root.display(), "registered package root");
		self.roots.write().insert(package, root);
	}

	/// Returns the resource root registered for `package`.
	pub fn root(&self, package: &str) -> Option<PathBuf> {
		self.roots.read().get(package).cloned()
	}

	/// Returns `true` if `package` has a registered root.
	pub fn contains(&self, package: &str) -> bool {
		self.roots.read().contains_key(package)
	}

	fn resolve_root(&self, package: &str) -> ResourceResult<PathBuf> {
		if let Some(root) = self.root(package) {
			return Ok(root);
		}
		if package == MAIN_PACKAGE {
			return Ok(std::env::current_dir()?);
		}
		Err(ResourceError::PackageNotFound(package.to_string()))
	}
}

impl ResourceLocator for PackageRegistry {
	fn locate(&self, package: &str, relative_path: &str) -> ResourceResult<PathBuf> {
		let root = self.resolve_root(package)?;
		Ok(root.join(Path::new(relative_path)))
	}
}
