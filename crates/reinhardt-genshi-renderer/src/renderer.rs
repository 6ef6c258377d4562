//! Template renderers.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::lookup::TemplateLookup;
use crate::response::{Response, ResponseFactory};
use crate::template::{Bindings, Template};

/// Renderer contract expected by the renderer registry.
pub trait TemplateRenderer: Send + Sync {
	/// Renders with `value` merged over `system`.
	///
	/// `value` must be a JSON object.
	fn render(&self, value: Value, system: Bindings) -> Result<String>;

	/// Returns the compiled template backing this renderer.
	fn implementation(&self) -> Result<Arc<dyn Template>>;

	/// Renders and wraps the result with `factory`.
	fn render_to_response(
		&self,
		value: Value,
		system: Bindings,
		factory: &dyn ResponseFactory,
	) -> Result<Response> {
		let body = self.render(value, system)?;
		Ok(factory.make_response(body))
	}
}

/// Renderer for Genshi-style template files.
///
/// The template is compiled on first use, with the lookup's configuration at
/// that moment, and kept for the lifetime of the renderer.
///
/// # Examples
///
/// ```no_run
/// use reinhardt_genshi_renderer::{GenshiEngine, GenshiTemplateRenderer, StaticLookup, TemplateRenderer};
/// use reinhardt_resource::PackageRegistry;
/// use serde_json::json;
/// use std::sync::Arc;
///
/// let engine = GenshiEngine::new(Arc::new(PackageRegistry::new()));
/// let lookup = StaticLookup::new(Arc::new(engine)).with_auto_reload(true);
/// let renderer = GenshiTemplateRenderer::new("/srv/app/templates/index.genshi", Arc::new(lookup));
///
/// let html = renderer.render(json!({"title": "Home"}), Default::default()).unwrap();
/// ```
pub struct GenshiTemplateRenderer {
	path: PathBuf,
	lookup: Arc<dyn TemplateLookup>,
	template: OnceCell<Arc<dyn Template>>,
}

impl GenshiTemplateRenderer {
	/// Creates a renderer for the template at `path`.
	pub fn new(path: impl Into<PathBuf>, lookup: Arc<dyn TemplateLookup>) -> Self {
		Self {
			path: path.into(),
			lookup,
			template: OnceCell::new(),
		}
	}

	/// Returns the template path.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Returns `true` once the template has been compiled.
	pub fn is_compiled(&self) -> bool {
		self.template.get().is_some()
	}

	/// Returns the compiled template, compiling it on first call.
	pub fn template(&self) -> Result<&Arc<dyn Template>> {
		self.template.get_or_try_init(|| {
			tracing::debug!(path = %self.path.display(), "compiling template for renderer");
			self.lookup
				.engine()
				.compile(&self.path, &self.lookup.template_options())
		})
	}
}

impl TemplateRenderer for GenshiTemplateRenderer {
	fn render(&self, value: Value, mut system: Bindings) -> Result<String> {
		let Value::Object(value) = value else {
			return Err(Error::InvalidArgument(
				"renderer was passed non-dictionary as value".to_string(),
			));
		};
		system.extend(value);
		self.template()?.render(&system)
	}

	fn implementation(&self) -> Result<Arc<dyn Template>> {
		self.template().map(Arc::clone)
	}
}

impl fmt::Debug for GenshiTemplateRenderer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("GenshiTemplateRenderer")
			.field("path", &self.path)
			.field("compiled", &self.is_compiled())
			.finish_non_exhaustive()
	}
}
