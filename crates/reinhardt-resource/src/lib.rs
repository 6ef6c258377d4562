//! # Reinhardt Resource
//!
//! Resolution of resource specifications into filesystem paths.
//!
//! A resource specification names a file in one of three ways:
//!
//! - an absolute path: `/srv/app/templates/index.genshi`
//! - a package-qualified path: `myapp:templates/index.genshi`
//! - a bare relative path, interpreted against a caller-supplied package
//!
//! Package names are mapped to resource roots by a [`ResourceLocator`],
//! usually a [`PackageRegistry`].
//!
//! ## Example
//!
//! ```
//! use reinhardt_resource::{PackageRegistry, abspath_from_resource_spec};
//! use std::path::PathBuf;
//!
//! let packages = PackageRegistry::new();
//! packages.register("myapp", "/srv/myapp");
//!
//! let path = abspath_from_resource_spec("myapp:templates/index.genshi", Some("other"), &packages)
//!     .unwrap();
//! assert_eq!(path, PathBuf::from("/srv/myapp/templates/index.genshi"));
//! ```

pub mod error;
pub mod locator;
pub mod spec;

pub use error::{ResourceError, ResourceResult};
pub use locator::{MAIN_PACKAGE, PackageRegistry, ResourceLocator};
pub use spec::{abspath_from_resource_spec, is_absolute, resolve_resource_spec};
