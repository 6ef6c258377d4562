//! Renderer error types.

use std::path::PathBuf;

use reinhardt_resource::ResourceError;
use thiserror::Error;

/// Result type for renderer operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while resolving, compiling, or rendering templates.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
	/// A renderer was called with arguments it cannot use.
	#[error("{0}")]
	InvalidArgument(String),

	/// The template named by a renderer spec does not exist.
	#[error("missing template file: {}", .0.display())]
	MissingTemplate(PathBuf),

	/// The template source could not be read.
	#[error("cannot read template {}: {source}", path.display())]
	TemplateNotFound {
		/// Template path.
		path: PathBuf,
		/// Underlying IO error.
		#[source]
		source: std::io::Error,
	},

	/// Resource specification could not be resolved.
	#[error(transparent)]
	Resource(#[from] ResourceError),

	/// The template failed to compile or render.
	#[error("template error in {}: {message}", path.display())]
	Template {
		/// Template path.
		path: PathBuf,
		/// Engine error message.
		message: String,
	},

	/// Settings could not be parsed.
	#[error("invalid template settings: {0}")]
	Settings(String),

	/// No renderer factory is registered under the name or extension.
	#[error("no renderer factory registered for '{0}'")]
	RendererNotFound(String),

	/// Nested includes went deeper than the engine allows.
	#[error("xinclude depth limit ({limit}) exceeded while rendering {}", path.display())]
	IncludeDepthExceeded {
		/// Template being rendered when the limit was hit.
		path: PathBuf,
		/// Configured limit.
		limit: usize,
	},

	/// The template engine cannot run on this target.
	#[error("Genshi templates are not supported on this platform")]
	UnsupportedPlatform,

	/// IO error.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}
