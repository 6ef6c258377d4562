//! Resource specification module.
//!
//! # Examples
//!
//! ```rust
//! use reinhardt_genshi::resource::resolve_resource_spec;
//!
//! assert_eq!(
//!     resolve_resource_spec("myapp:templates/index.genshi", None),
//!     (Some("myapp"), "templates/index.genshi"),
//! );
//! ```

pub use reinhardt_resource::*;
