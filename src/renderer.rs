//! Genshi renderer module.
//!
//! This module provides the `.genshi` template renderer, XInclude
//! resolution, and the renderer registry.
//!
//! # Examples
//!
//! ```rust,no_run
//! use reinhardt_genshi::renderer::{GenshiEngine, GenshiTemplateRenderer, StaticLookup};
//! use reinhardt_genshi::resource::PackageRegistry;
//! use std::sync::Arc;
//!
//! let engine = GenshiEngine::new(Arc::new(PackageRegistry::new()));
//! let renderer = GenshiTemplateRenderer::new(
//!     "/srv/app/templates/index.genshi",
//!     Arc::new(StaticLookup::new(Arc::new(engine))),
//! );
//! ```

pub use reinhardt_genshi_renderer::*;
