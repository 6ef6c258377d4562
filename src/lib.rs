//! # Reinhardt Genshi
//!
//! Genshi-style template rendering for Reinhardt applications.
//!
//! This crate bundles the member crates of the workspace:
//!
//! - [`resource`] - resolution of `package:relative/path` resource specs
//! - [`renderer`] - the `.genshi` renderer, XInclude support, the renderer
//!   registry and the convenience API
//!
//! ## Example
//!
//! ```rust,no_run
//! use reinhardt_genshi::{Bindings, Configurator, Registry, TemplateSettings, includeme, render_template};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(Registry::with_settings(
//!     TemplateSettings::new().with_package("myapp", "/srv/myapp"),
//! ));
//! Configurator::new(Arc::clone(&registry)).include(includeme);
//!
//! let html = render_template(&registry, "myapp:templates/index.genshi", None, Bindings::new())?;
//! # Ok::<(), reinhardt_genshi::Error>(())
//! ```

pub mod renderer;
pub mod resource;

pub use reinhardt_genshi_renderer::{
	Bindings, Configurator, Error, GENSHI_EXTENSION, Registry, RendererConfig, RendererHelper,
	Response, Result, TemplateRenderer, TemplateSettings, XIncludes, get_renderer, get_template,
	includeme, render_template, render_template_to_response, renderer_factory,
};
pub use reinhardt_resource::{PackageRegistry, ResourceLocator};
