//! Resource resolution error types.

use thiserror::Error;

/// Result type for resource operations.
pub type ResourceResult<T> = Result<T, ResourceError>;

/// Errors raised while locating package resources.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResourceError {
	/// No resource root is registered for the package.
	#[error("package not found: {0}")]
	PackageNotFound(String),

	/// IO error while determining a resource root.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}
