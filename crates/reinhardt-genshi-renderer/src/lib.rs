//! # Reinhardt Genshi Renderer
//!
//! Genshi-style markup templates for the Reinhardt renderer registry.
//!
//! ## Features
//!
//! - `.genshi` renderer registered through [`includeme`]
//! - Template names as absolute paths, package-relative paths, or
//!   `package:relative/path` resource specs
//! - `<xi:include>` directives resolved relative to the including template or
//!   as resource specs ([`XIncludes`]), with a shared [`TemplateCache`]
//! - Lazily compiled templates honoring the `reload_templates` and
//!   `debug_templates` settings and a translation hook
//! - Response construction through an overridable [`ResponseFactory`]
//!
//! ## Example
//!
//! ```no_run
//! use reinhardt_genshi_renderer::{
//!     Bindings, Configurator, Registry, TemplateSettings, XIncludes, includeme,
//!     render_template_to_response,
//! };
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! XIncludes::activate();
//!
//! let settings = TemplateSettings::from_file("templates.toml")?.with_env_overrides()?;
//! let registry = Arc::new(Registry::with_settings(settings));
//! Configurator::new(Arc::clone(&registry)).include(includeme);
//!
//! let mut kw = Bindings::new();
//! kw.insert("user".to_string(), json!({"name": "Alice"}));
//! let response = render_template_to_response(&registry, "myapp:templates/home.genshi", None, kw)?;
//! assert_eq!(response.status, 200);
//! # Ok::<(), reinhardt_genshi_renderer::Error>(())
//! ```

pub mod api;
pub mod error;
pub mod lookup;
pub mod registry;
pub mod renderer;
pub mod response;
pub mod settings;
pub mod template;
pub mod xinclude;

pub use api::{
	GENSHI_EXTENSION, get_renderer, get_template, includeme, render_template,
	render_template_to_response, renderer_factory,
};
pub use error::{Error, Result};
pub use lookup::{StaticLookup, TemplateLookup};
pub use registry::{
	Configurator, Registry, RendererConfig, RendererFactory, RendererHelper, RendererInfo,
	template_renderer_factory,
};
pub use renderer::{GenshiTemplateRenderer, TemplateRenderer};
pub use response::{HTML_CONTENT_TYPE, HtmlResponseFactory, Response, ResponseFactory};
pub use settings::{DEBUG_TEMPLATES_ENV, RELOAD_TEMPLATES_ENV, TemplateSettings};
pub use template::{
	Bindings, GenshiEngine, GenshiTemplateFile, MAX_INCLUDE_DEPTH, Template, TemplateEngine,
	TemplateOptions, TextTemplate, TranslateFn,
};
pub use xinclude::{
	IncludeFactory, TemplateCache, TemplateFactory, XIncludeFormat, XIncludeResolver,
	XIncludeSetup, XIncludes, XIncludesBuilder, default_xincludes_builder, normalize_path,
};
