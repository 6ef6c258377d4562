//! Renderer plugin entry point and convenience functions.
//!
//! The convenience functions take the registry and the caller's package
//! explicitly. Template names may be absolute paths, package-relative paths
//! (resolved against `package`), or `package:relative/path` resource specs.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::lookup::TemplateLookup;
use crate::registry::{
	Registry, RendererConfig, RendererHelper, RendererInfo, template_renderer_factory,
};
use crate::renderer::{GenshiTemplateRenderer, TemplateRenderer};
use crate::response::Response;
use crate::template::{Bindings, Template};

/// File extension the renderer is registered under by [`includeme`].
pub const GENSHI_EXTENSION: &str = ".genshi";

/// Renderer factory creating [`GenshiTemplateRenderer`]s.
pub fn renderer_factory(info: &RendererInfo<'_>) -> Result<Arc<dyn TemplateRenderer>> {
	template_renderer_factory(info, genshi_renderer)
}

fn genshi_renderer(path: PathBuf, lookup: Arc<dyn TemplateLookup>) -> Arc<dyn TemplateRenderer> {
	Arc::new(GenshiTemplateRenderer::new(path, lookup))
}

/// Returns the renderer for the template `path`.
pub fn get_renderer(
	registry: &Registry,
	path: &str,
	package: Option<&str>,
) -> Result<Arc<dyn TemplateRenderer>> {
	RendererHelper::new(path, package, registry).get_renderer()
}

/// Returns the compiled template behind the renderer for `path`.
pub fn get_template(
	registry: &Registry,
	path: &str,
	package: Option<&str>,
) -> Result<Arc<dyn Template>> {
	get_renderer(registry, path, package)?.implementation()
}

/// Renders the template `path` with `kw` as top-level names.
///
/// # Examples
///
/// ```no_run
/// use reinhardt_genshi_renderer::{Bindings, Registry, render_template};
/// use serde_json::json;
///
/// let registry = Registry::new();
/// let mut kw = Bindings::new();
/// kw.insert("title".to_string(), json!("Home"));
///
/// let html = render_template(&registry, "/srv/app/templates/index.genshi", None, kw).unwrap();
/// ```
pub fn render_template(
	registry: &Registry,
	path: &str,
	package: Option<&str>,
	kw: Bindings,
) -> Result<String> {
	RendererHelper::new(path, package, registry).render(Value::Object(kw), None)
}

/// Renders the template `path` and wraps the result in a response built by
/// the registry's response factory.
pub fn render_template_to_response(
	registry: &Registry,
	path: &str,
	package: Option<&str>,
	kw: Bindings,
) -> Result<Response> {
	RendererHelper::new(path, package, registry).render_to_response(Value::Object(kw), None)
}

/// Registers [`renderer_factory`] for the `.genshi` extension.
pub fn includeme<C>(config: &mut C)
where
	C: RendererConfig + ?Sized,
{
	config.add_renderer(GENSHI_EXTENSION, Arc::new(renderer_factory));
}
