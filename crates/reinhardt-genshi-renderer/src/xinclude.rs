//! XInclude resolution.
//!
//! A template that contains `<xi:include href="..."/>` asks its resolver for
//! the included template. [`XIncludes`] resolves the `href` against the
//! including template's directory (or as a `package:path` resource spec),
//! serves already-loaded templates from a shared [`TemplateCache`], and
//! otherwise hands the path to a factory.
//!
//! Paths are normalized lexically: `.` and `..` segments are collapsed but
//! symbolic links are left untouched, so two links to the same file are two
//! cache entries.

use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use reinhardt_resource::{MAIN_PACKAGE, ResourceLocator, abspath_from_resource_spec, is_absolute};

use crate::error::Result;
use crate::template::Template;

/// How an included resource is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum XIncludeFormat {
	/// Parsed and rendered as a template.
	#[default]
	Xml,
	/// Included verbatim as escaped text.
	Text,
}

impl XIncludeFormat {
	/// Interprets the `parse` attribute of an include directive.
	pub fn from_parse_attribute(value: Option<&str>) -> Self {
		match value.map(str::trim) {
			Some("text") => Self::Text,
			_ => Self::Xml,
		}
	}

	/// Returns the attribute spelling of the format.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Xml => "xml",
			Self::Text => "text",
		}
	}
}

impl fmt::Display for XIncludeFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Loaded templates keyed by absolute, normalized path.
///
/// Clones share the same storage. Entries are never evicted; the first value
/// inserted for a path wins.
pub struct TemplateCache<T> {
	entries: Arc<RwLock<HashMap<PathBuf, T>>>,
}

impl<T: Clone> TemplateCache<T> {
	/// Creates an empty cache.
	pub fn new() -> Self {
		Self {
			entries: Arc::new(RwLock::new(HashMap::new())),
		}
	}

	/// Returns the entry for `path`.
	pub fn get(&self, path: &Path) -> Option<T> {
		self.entries.read().get(path).cloned()
	}

	/// Inserts `value` unless `path` is already cached, returning the cached value.
	pub fn insert(&self, path: PathBuf, value: T) -> T {
		self.entries.write().entry(path).or_insert(value).clone()
	}

	/// Returns `true` if `path` is cached.
	pub fn contains(&self, path: &Path) -> bool {
		self.entries.read().contains_key(path)
	}

	/// Returns the number of cached entries.
	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	/// Returns `true` if nothing is cached.
	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}

	/// Drops every entry.
	pub fn clear(&self) {
		self.entries.write().clear();
	}
}

impl<T: Clone> Default for TemplateCache<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Clone for TemplateCache<T> {
	fn clone(&self) -> Self {
		Self {
			entries: Arc::clone(&self.entries),
		}
	}
}

impl<T: Clone> FromIterator<(PathBuf, T)> for TemplateCache<T> {
	fn from_iter<I: IntoIterator<Item = (PathBuf, T)>>(iter: I) -> Self {
		let cache = Self::new();
		cache.entries.write().extend(iter);
		cache
	}
}

impl<T> fmt::Debug for TemplateCache<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TemplateCache")
			.field("paths", &self.entries.read().keys().collect::<Vec<_>>())
			.finish()
	}
}

/// Builds the value for an include that is not cached yet.
pub type IncludeFactory<T> = Arc<dyn Fn(&Path, XIncludeFormat) -> Result<T> + Send + Sync>;

/// Include factory producing compiled templates.
pub type TemplateFactory = IncludeFactory<Arc<dyn Template>>;

/// Resolves include directives to templates.
pub trait XIncludeResolver: Send + Sync {
	/// Returns the template referenced by `filename`.
	fn resolve(&self, filename: &str, format: XIncludeFormat) -> Result<Arc<dyn Template>>;
}

/// Everything an include resolver is built from.
pub struct XIncludeSetup {
	/// Shared cache of loaded templates.
	pub cache: TemplateCache<Arc<dyn Template>>,
	/// Directory of the including template.
	pub relpath: PathBuf,
	/// Factory for includes missing from the cache.
	pub factory: TemplateFactory,
	/// Locator for `package:path` hrefs.
	pub locator: Arc<dyn ResourceLocator>,
}

/// Constructor of the include resolver attached to each compiled template.
pub type XIncludesBuilder = fn(XIncludeSetup) -> Arc<dyn XIncludeResolver>;

static DEFAULT_XINCLUDES: OnceLock<XIncludesBuilder> = OnceLock::new();

/// Returns the resolver builder used when a template is compiled without one.
///
/// This is [`XIncludes::builder`] once [`XIncludes::activate`] has run and a
/// relative-path-only resolver before that.
pub fn default_xincludes_builder() -> XIncludesBuilder {
	DEFAULT_XINCLUDES
		.get()
		.copied()
		.unwrap_or(build_relative_xincludes)
}

fn build_xincludes(setup: XIncludeSetup) -> Arc<dyn XIncludeResolver> {
	Arc::new(XIncludes::from_setup(setup))
}

fn build_relative_xincludes(setup: XIncludeSetup) -> Arc<dyn XIncludeResolver> {
	Arc::new(XIncludes::from_setup(setup).without_resource_specs())
}

/// Dynamic XInclude registry.
///
/// # Examples
///
/// ```
/// use reinhardt_genshi_renderer::{Result, TemplateCache, XIncludeFormat, XIncludes};
/// use reinhardt_resource::PackageRegistry;
/// use std::path::Path;
/// use std::sync::Arc;
///
/// let cache = TemplateCache::new();
/// let xi = XIncludes::new(
///     cache,
///     "/srv/app/templates",
///     Arc::new(|path: &Path, _format: XIncludeFormat| -> Result<String> {
///         Ok(path.display().to_string())
///     }),
///     Arc::new(PackageRegistry::new()),
/// );
///
/// let resolved = xi.get("../shared/footer.genshi", XIncludeFormat::Xml).unwrap();
/// assert_eq!(resolved, "/srv/app/shared/footer.genshi");
/// ```
pub struct XIncludes<T> {
	registry: TemplateCache<T>,
	relpath: PathBuf,
	factory: IncludeFactory<T>,
	locator: Arc<dyn ResourceLocator>,
	resource_specs: bool,
}

impl<T: Clone> XIncludes<T> {
	/// Creates a registry resolving relative hrefs against `relpath`.
	pub fn new(
		registry: TemplateCache<T>,
		relpath: impl Into<PathBuf>,
		factory: IncludeFactory<T>,
		locator: Arc<dyn ResourceLocator>,
	) -> Self {
		Self {
			registry,
			relpath: relpath.into(),
			factory,
			locator,
			resource_specs: true,
		}
	}

	/// Treats hrefs containing `:` as plain relative paths.
	pub fn without_resource_specs(mut self) -> Self {
		self.resource_specs = false;
		self
	}

	/// Returns the base directory for relative hrefs.
	pub fn relpath(&self) -> &Path {
		&self.relpath
	}

	/// Resolves `filename` to an absolute, normalized path.
	pub fn resolve_path(&self, filename: &str) -> Result<PathBuf> {
		let path = if is_absolute(filename) {
			PathBuf::from(filename)
		} else if self.resource_specs && filename.contains(':') {
			abspath_from_resource_spec(filename, Some(MAIN_PACKAGE), self.locator.as_ref())?
		} else {
			self.relpath.join(filename)
		};
		Ok(normalize_path(&path))
	}

	/// Returns the cached value for `filename`, or builds it with the factory.
	///
	/// A cached value is returned whatever `format` is requested. The registry
	/// never inserts into the cache; that is left to the factory.
	pub fn get(&self, filename: &str, format: XIncludeFormat) -> Result<T> {
		let path = self.resolve_path(filename)?;
		if let Some(template) = self.registry.get(&path) {
			tracing::trace!(path = %path.display(), "xinclude cache hit");
			return Ok(template);
		}
		tracing::debug!(path = %path.display(), %format, "xinclude cache miss");
		(self.factory)(&path, format)
	}
}

impl XIncludes<Arc<dyn Template>> {
	/// Builds a registry from an engine-provided setup.
	pub fn from_setup(setup: XIncludeSetup) -> Self {
		Self::new(setup.cache, setup.relpath, setup.factory, setup.locator)
	}

	/// Returns the builder for this resolver, for explicit injection into
	/// [`TemplateOptions`](crate::TemplateOptions).
	pub fn builder() -> XIncludesBuilder {
		build_xincludes
	}

	/// Installs this resolver as the process-wide default.
	///
	/// Templates compiled afterwards without an explicit resolver resolve
	/// `package:path` hrefs through it. The installation cannot be undone;
	/// returns `false` if a default was already installed.
	pub fn activate() -> bool {
		let installed = DEFAULT_XINCLUDES.set(build_xincludes).is_ok();
		if installed {
			tracing::debug!("installed XIncludes as the default include resolver");
		} else {
			tracing::warn!("default include resolver already installed");
		}
		installed
	}

	/// Returns `true` once [`XIncludes::activate`] has run.
	pub fn is_active() -> bool {
		DEFAULT_XINCLUDES.get().is_some()
	}
}

impl XIncludeResolver for XIncludes<Arc<dyn Template>> {
	fn resolve(&self, filename: &str, format: XIncludeFormat) -> Result<Arc<dyn Template>> {
		self.get(filename, format)
	}
}

impl<T> fmt::Debug for XIncludes<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("XIncludes")
			.field("relpath", &self.relpath)
			.field("resource_specs", &self.resource_specs)
			.finish_non_exhaustive()
	}
}

/// Collapses `.` and `..` segments without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
	let mut normalized = PathBuf::new();
	for component in path.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => match normalized.components().next_back() {
				Some(Component::Normal(_)) => {
					normalized.pop();
				}
				Some(Component::RootDir | Component::Prefix(_)) => {}
				_ => normalized.push(".."),
			},
			other => normalized.push(other.as_os_str()),
		}
	}
	if normalized.as_os_str().is_empty() {
		PathBuf::from(".")
	} else {
		normalized
	}
}
