//! Renderer registry and configuration.
//!
//! The [`Registry`] is the host side of the renderer plugin contract: it maps
//! file extensions (or bare names) to renderer factories, caches one renderer
//! per template spec, and carries the services renderers consult while
//! rendering (settings, translation hook, response factory).

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use reinhardt_resource::{MAIN_PACKAGE, PackageRegistry, abspath_from_resource_spec, is_absolute};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::lookup::TemplateLookup;
use crate::renderer::TemplateRenderer;
use crate::response::{HtmlResponseFactory, Response, ResponseFactory};
use crate::settings::TemplateSettings;
use crate::template::{Bindings, GenshiEngine, Template, TemplateEngine, TranslateFn};
use crate::xinclude::{TemplateCache, XIncludesBuilder, normalize_path};

/// What a renderer factory is asked to build.
#[derive(Clone, Copy)]
pub struct RendererInfo<'a> {
	/// Template name as given by the caller.
	pub name: &'a str,
	/// Package package-relative names are resolved against.
	pub package: Option<&'a str>,
	/// Registry the renderer is created for.
	pub registry: &'a Registry,
}

impl fmt::Debug for RendererInfo<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RendererInfo")
			.field("name", &self.name)
			.field("package", &self.package)
			.finish_non_exhaustive()
	}
}

/// Builds a renderer for a template name.
pub type RendererFactory =
	Arc<dyn Fn(&RendererInfo<'_>) -> Result<Arc<dyn TemplateRenderer>> + Send + Sync>;

/// Lookup handed to renderers created through a [`Registry`].
///
/// Values are read when a renderer compiles its template, so settings
/// installed after the renderer was created still apply.
struct RegistryLookup {
	settings: RwLock<Option<TemplateSettings>>,
	translate: RwLock<Option<TranslateFn>>,
	xincludes: RwLock<Option<XIncludesBuilder>>,
	engine: RwLock<Arc<dyn TemplateEngine>>,
}

impl TemplateLookup for RegistryLookup {
	fn auto_reload(&self) -> bool {
		self.settings
			.read()
			.as_ref()
			.is_some_and(|settings| settings.reload_templates)
	}

	fn debug(&self) -> bool {
		self.settings
			.read()
			.as_ref()
			.is_some_and(|settings| settings.debug_templates)
	}

	fn translate(&self) -> Option<TranslateFn> {
		self.translate.read().clone()
	}

	fn engine(&self) -> Arc<dyn TemplateEngine> {
		self.engine.read().clone()
	}

	fn xincludes(&self) -> Option<XIncludesBuilder> {
		*self.xincludes.read()
	}
}

/// Renderer registry.
///
/// # Examples
///
/// ```no_run
/// use reinhardt_genshi_renderer::{Registry, TemplateSettings, render_template, includeme, Configurator};
/// use std::sync::Arc;
///
/// let registry = Arc::new(Registry::with_settings(
///     TemplateSettings::new().with_package("myapp", "/srv/myapp"),
/// ));
/// let mut config = Configurator::new(Arc::clone(&registry));
/// config.include(includeme);
///
/// let html = render_template(&registry, "myapp:templates/index.genshi", None, Default::default()).unwrap();
/// ```
pub struct Registry {
	packages: Arc<PackageRegistry>,
	templates: TemplateCache<Arc<dyn Template>>,
	lookup: Arc<RegistryLookup>,
	response_factory: RwLock<Option<Arc<dyn ResponseFactory>>>,
	factories: RwLock<HashMap<String, RendererFactory>>,
	renderers: RwLock<HashMap<String, Arc<dyn TemplateRenderer>>>,
}

impl Registry {
	/// Creates a registry without settings.
	pub fn new() -> Self {
		let packages = Arc::new(PackageRegistry::new());
		let templates = TemplateCache::new();
		let engine = GenshiEngine::with_cache(templates.clone(), packages.clone());
		Self {
			packages,
			templates,
			lookup: Arc::new(RegistryLookup {
				settings: RwLock::new(None),
				translate: RwLock::new(None),
				xincludes: RwLock::new(None),
				engine: RwLock::new(Arc::new(engine)),
			}),
			response_factory: RwLock::new(None),
			factories: RwLock::new(HashMap::new()),
			renderers: RwLock::new(HashMap::new()),
		}
	}

	/// Creates a registry with `settings` installed.
	pub fn with_settings(settings: TemplateSettings) -> Self {
		let registry = Self::new();
		registry.set_settings(settings);
		registry
	}

	/// Replaces the engine renderers compile their templates with.
	pub fn with_engine(self, engine: Arc<dyn TemplateEngine>) -> Self {
		*self.lookup.engine.write() = engine;
		self
	}

	/// Installs settings and registers their package roots.
	pub fn set_settings(&self, settings: TemplateSettings) {
		settings.register_packages(&self.packages);
		tracing::debug!(
			reload_templates = settings.reload_templates,
			debug_templates = settings.debug_templates,
			"installed template settings"
		);
		*self.lookup.settings.write() = Some(settings);
	}

	/// Returns a copy of the installed settings.
	pub fn settings(&self) -> Option<TemplateSettings> {
		self.lookup.settings.read().clone()
	}

	/// Returns the package resource locator.
	pub fn packages(&self) -> &Arc<PackageRegistry> {
		&self.packages
	}

	/// Returns the cache of templates loaded through includes.
	pub fn templates(&self) -> &TemplateCache<Arc<dyn Template>> {
		&self.templates
	}

	/// Returns the lookup renderers created by this registry consult.
	pub fn lookup(&self) -> Arc<dyn TemplateLookup> {
		self.lookup.clone()
	}

	/// Registers the translation hook passed to compiled templates.
	pub fn register_translate(&self, translate: TranslateFn) {
		*self.lookup.translate.write() = Some(translate);
	}

	/// Injects the include resolver used by templates compiled afterwards.
	pub fn register_xincludes(&self, builder: XIncludesBuilder) {
		*self.lookup.xincludes.write() = Some(builder);
	}

	/// Overrides the factory wrapping rendered bodies in responses.
	pub fn register_response_factory(&self, factory: impl ResponseFactory + 'static) {
		*self.response_factory.write() = Some(Arc::new(factory));
	}

	/// Returns the response factory, [`HtmlResponseFactory`] unless overridden.
	pub fn response_factory(&self) -> Arc<dyn ResponseFactory> {
		self.response_factory
			.read()
			.clone()
			.unwrap_or_else(|| Arc::new(HtmlResponseFactory))
	}

	/// Registers `factory` under a file extension (`.genshi`) or a bare name.
	pub fn add_renderer(&self, name: impl Into<String>, factory: RendererFactory) {
		let name = name.into();
		tracing::debug!(name = %name, "registered renderer factory");
		self.factories.write().insert(name, factory);
	}

	/// Returns the factory registered under `name`.
	pub fn renderer_factory(&self, name: &str) -> Option<RendererFactory> {
		self.factories.read().get(name).cloned()
	}

	fn cached_renderer(&self, key: &str) -> Option<Arc<dyn TemplateRenderer>> {
		self.renderers.read().get(key).cloned()
	}

	fn cache_renderer(
		&self,
		key: String,
		renderer: Arc<dyn TemplateRenderer>,
	) -> Arc<dyn TemplateRenderer> {
		self.renderers
			.write()
			.entry(key)
			.or_insert(renderer)
			.clone()
	}
}

impl Default for Registry {
	fn default() -> Self {
		Self::new()
	}
}

impl Drop for Registry {
	fn drop(&mut self) {
		// Cached includes hold resolvers that hold the cache.
		self.templates.clear();
	}
}

impl fmt::Debug for Registry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Registry")
			.field("settings", &*self.lookup.settings.read())
			.field("factories", &self.factories.read().keys().collect::<Vec<_>>())
			.field("renderers", &self.renderers.read().keys().collect::<Vec<_>>())
			.finish_non_exhaustive()
	}
}

/// Creates (or returns the cached) renderer for the template named by `info`.
///
/// Absolute names are used as they are. Other names are resource specs
/// resolved against `info.package`, then the configured default package, then
/// `__main__`. `ctor` builds the renderer from the template path and the
/// registry lookup; it is only called for a spec seen for the first time.
pub fn template_renderer_factory<F>(
	info: &RendererInfo<'_>,
	ctor: F,
) -> Result<Arc<dyn TemplateRenderer>>
where
	F: FnOnce(PathBuf, Arc<dyn TemplateLookup>) -> Arc<dyn TemplateRenderer>,
{
	let registry = info.registry;
	let (key, path) = if is_absolute(info.name) {
		(info.name.to_string(), PathBuf::from(info.name))
	} else {
		let default_package = registry
			.lookup
			.settings
			.read()
			.as_ref()
			.and_then(|settings| settings.default_package.clone());
		let package = info
			.package
			.or(default_package.as_deref())
			.unwrap_or(MAIN_PACKAGE);
		let key = if info.name.contains(':') {
			info.name.to_string()
		} else {
			format!("{package}:{}", info.name)
		};
		let path = abspath_from_resource_spec(info.name, Some(package), registry.packages.as_ref())?;
		(key, path)
	};

	if let Some(renderer) = registry.cached_renderer(&key) {
		return Ok(renderer);
	}

	let path = normalize_path(&path);
	if !path.is_file() {
		return Err(Error::MissingTemplate(path));
	}
	tracing::debug!(spec = %key, path = %path.display(), "creating template renderer");
	let renderer = ctor(path, registry.lookup());
	Ok(registry.cache_renderer(key, renderer))
}

/// Receives renderer factory registrations.
pub trait RendererConfig {
	/// Registers `factory` under a file extension or a bare name.
	fn add_renderer(&mut self, name: &str, factory: RendererFactory);
}

/// Application configurator backed by a [`Registry`].
#[derive(Debug, Clone)]
pub struct Configurator {
	registry: Arc<Registry>,
}

impl Configurator {
	/// Creates a configurator writing into `registry`.
	pub fn new(registry: Arc<Registry>) -> Self {
		Self { registry }
	}

	/// Returns the registry being configured.
	pub fn registry(&self) -> &Arc<Registry> {
		&self.registry
	}

	/// Runs an include function (such as [`includeme`](crate::includeme)) against this configurator.
	pub fn include<F>(&mut self, include: F) -> &mut Self
	where
		F: FnOnce(&mut Self),
	{
		include(self);
		self
	}
}

impl RendererConfig for Configurator {
	fn add_renderer(&mut self, name: &str, factory: RendererFactory) {
		self.registry.add_renderer(name, factory);
	}
}

/// Renders a template by name through the registry's renderer factories.
#[derive(Debug, Clone)]
pub struct RendererHelper<'a> {
	name: String,
	package: Option<String>,
	registry: &'a Registry,
}

impl<'a> RendererHelper<'a> {
	/// Creates a helper for the template `name`.
	pub fn new(name: impl Into<String>, package: Option<&str>, registry: &'a Registry) -> Self {
		Self {
			name: name.into(),
			package: package.map(str::to_string),
			registry,
		}
	}

	/// Returns the template name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Returns the key the factory is registered under: the file extension
	/// (with its dot), or the whole name when it has none.
	pub fn factory_name(&self) -> String {
		match Path::new(&self.name).extension() {
			Some(extension) => format!(".{}", extension.to_string_lossy()),
			None => self.name.clone(),
		}
	}

	/// Returns the renderer for the template.
	pub fn get_renderer(&self) -> Result<Arc<dyn TemplateRenderer>> {
		let factory_name = self.factory_name();
		let factory = self
			.registry
			.renderer_factory(&factory_name)
			.ok_or(Error::RendererNotFound(factory_name))?;
		factory(&RendererInfo {
			name: &self.name,
			package: self.package.as_deref(),
			registry: self.registry,
		})
	}

	/// Renders `value`; `system` defaults to the renderer name binding.
	pub fn render(&self, value: Value, system: Option<Bindings>) -> Result<String> {
		let renderer = self.get_renderer()?;
		renderer.render(value, system.unwrap_or_else(|| self.system_values()))
	}

	/// Renders `value` and wraps the result with the registry's response factory.
	pub fn render_to_response(&self, value: Value, system: Option<Bindings>) -> Result<Response> {
		let renderer = self.get_renderer()?;
		let factory = self.registry.response_factory();
		renderer.render_to_response(
			value,
			system.unwrap_or_else(|| self.system_values()),
			factory.as_ref(),
		)
	}

	fn system_values(&self) -> Bindings {
		let mut system = Bindings::new();
		system.insert("renderer_name".to_string(), Value::String(self.name.clone()));
		system
	}
}
