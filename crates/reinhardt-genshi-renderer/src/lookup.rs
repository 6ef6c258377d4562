//! Renderer configuration sources.

use std::fmt;
use std::sync::Arc;

use crate::template::{TemplateEngine, TemplateOptions, TranslateFn};
use crate::xinclude::XIncludesBuilder;

/// Supplies the reload/debug/translate configuration and the engine a
/// renderer compiles its template with.
///
/// Renderers query their lookup when the template is first needed, not when
/// the renderer is created.
pub trait TemplateLookup: Send + Sync {
	/// Recompile templates when their source changes.
	fn auto_reload(&self) -> bool;

	/// Compile templates in debug mode.
	fn debug(&self) -> bool;

	/// Translation hook.
	fn translate(&self) -> Option<TranslateFn>;

	/// Engine used to compile templates.
	fn engine(&self) -> Arc<dyn TemplateEngine>;

	/// Include resolver injected into compiled templates, if any.
	fn xincludes(&self) -> Option<XIncludesBuilder> {
		None
	}

	/// Options assembled from this lookup.
	fn template_options(&self) -> TemplateOptions {
		let options = TemplateOptions::new()
			.auto_reload(self.auto_reload())
			.debug(self.debug())
			.translate(self.translate());
		match self.xincludes() {
			Some(builder) => options.with_xincludes(builder),
			None => options,
		}
	}
}

/// A lookup with fixed values.
#[derive(Clone)]
pub struct StaticLookup {
	/// Recompile templates when their source changes.
	pub auto_reload: bool,
	/// Compile templates in debug mode.
	pub debug: bool,
	/// Translation hook.
	pub translate: Option<TranslateFn>,
	engine: Arc<dyn TemplateEngine>,
}

impl StaticLookup {
	/// Creates a lookup compiling with `engine`, with every flag off.
	pub fn new(engine: Arc<dyn TemplateEngine>) -> Self {
		Self {
			auto_reload: false,
			debug: false,
			translate: None,
			engine,
		}
	}

	/// Sets the auto-reload flag.
	pub fn with_auto_reload(mut self, enabled: bool) -> Self {
		self.auto_reload = enabled;
		self
	}

	/// Sets the debug flag.
	pub fn with_debug(mut self, enabled: bool) -> Self {
		self.debug = enabled;
		self
	}

	/// Sets the translation hook.
	pub fn with_translate(mut self, translate: TranslateFn) -> Self {
		self.translate = Some(translate);
		self
	}
}

impl TemplateLookup for StaticLookup {
	fn auto_reload(&self) -> bool {
		self.auto_reload
	}

	fn debug(&self) -> bool {
		self.debug
	}

	fn translate(&self) -> Option<TranslateFn> {
		self.translate.clone()
	}

	fn engine(&self) -> Arc<dyn TemplateEngine> {
		Arc::clone(&self.engine)
	}
}

impl fmt::Debug for StaticLookup {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("StaticLookup")
			.field("auto_reload", &self.auto_reload)
			.field("debug", &self.debug)
			.field("translate", &self.translate.is_some())
			.finish_non_exhaustive()
	}
}
