//! Resource specification parsing.

use std::path::{Path, PathBuf};

use crate::error::ResourceResult;
use crate::locator::ResourceLocator;

/// Separator between the package name and the relative path of a spec.
const PACKAGE_SEPARATOR: char = ':';

/// Returns `true` if `spec` is an absolute filesystem path.
pub fn is_absolute(spec: &str) -> bool {
	Path::new(spec).is_absolute()
}

/// Splits a resource specification into `(package, filename)`.
///
/// - An absolute `spec` resolves to `(None, spec)`; `default_package` is ignored.
/// - A spec containing `:` is split on the first `:` only, so any further
///   separators stay in the filename.
/// - Anything else is paired with `default_package`, which may be `None`.
///
/// # Examples
///
/// ```
/// use reinhardt_resource::resolve_resource_spec;
///
/// assert_eq!(resolve_resource_spec("/abs/path", Some("pkg")), (None, "/abs/path"));
/// assert_eq!(
///     resolve_resource_spec("other:rel/file.txt", Some("pkg")),
///     (Some("other"), "rel/file.txt")
/// );
/// assert_eq!(
///     resolve_resource_spec("rel/file.txt", Some("pkg")),
///     (Some("pkg"), "rel/file.txt")
/// );
/// assert_eq!(resolve_resource_spec("rel/file.txt", None), (None, "rel/file.txt"));
/// ```
pub fn resolve_resource_spec<'a>(
	spec: &'a str,
	default_package: Option<&'a str>,
) -> (Option<&'a str>, &'a str) {
	if is_absolute(spec) {
		return (None, spec);
	}
	match spec.split_once(PACKAGE_SEPARATOR) {
		Some((package, filename)) => (Some(package), filename),
		None => (default_package, spec),
	}
}

/// Resolves a resource specification to a filesystem path.
///
/// With no `default_package` the spec is returned verbatim, without being
/// parsed. Otherwise the spec is resolved with [`resolve_resource_spec`];
/// a resolved package of `None` (absolute input) returns the filename as-is,
/// and any named package is handed to `locator`. Locator failures propagate
/// unchanged.
pub fn abspath_from_resource_spec<L>(
	spec: &str,
	default_package: Option<&str>,
	locator: &L,
) -> ResourceResult<PathBuf>
where
	L: ResourceLocator + ?Sized,
{
	if default_package.is_none() {
		return Ok(PathBuf::from(spec));
	}
	match resolve_resource_spec(spec, default_package) {
		(None, filename) => Ok(PathBuf::from(filename)),
		(Some(package), filename) => locator.locate(package, filename),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ResourceError;
	use crate::locator::PackageRegistry;
	use rstest::rstest;

	#[rstest]
	#[case("/abs/path", Some("apackage"))]
	#[case("/abs/path", None)]
	#[case("/abs/with:colon", Some("apackage"))]
	fn test_absolute_spec_ignores_package(#[case] spec: &str, #[case] package: Option<&str>) {
		assert_eq!(resolve_resource_spec(spec, package), (None, spec));
	}

	#[rstest]
	fn test_package_relative_spec() {
		let (package, filename) = resolve_resource_spec("test_resource.rs", Some("myapp.tests"));

		assert_eq!(package, Some("myapp.tests"));
		assert_eq!(filename, "test_resource.rs");
	}

	#[rstest]
	fn test_qualified_spec_overrides_default() {
		let (package, filename) =
			resolve_resource_spec("myapp.nottests:test_resource.rs", Some("myapp.tests"));

		assert_eq!(package, Some("myapp.nottests"));
		assert_eq!(filename, "test_resource.rs");
	}

	#[rstest]
	fn test_only_first_separator_is_significant() {
		let (package, filename) = resolve_resource_spec("pkg:a:b/c.txt", None);

		assert_eq!(package, Some("pkg"));
		assert_eq!(filename, "a:b/c.txt");
	}

	#[rstest]
	fn test_no_default_package() {
		assert_eq!(
			resolve_resource_spec("test_resource.rs", None),
			(None, "test_resource.rs")
		);
	}

	#[rstest]
	#[case("abc")]
	#[case("/abc")]
	#[case("unknown:abc")]
	fn test_abspath_without_default_package_is_verbatim(#[case] spec: &str) {
		let packages = PackageRegistry::new();

		let path = abspath_from_resource_spec(spec, None, &packages).unwrap();

		assert_eq!(path, PathBuf::from(spec));
	}

	#[rstest]
	fn test_abspath_for_absolute_spec() {
		let packages = PackageRegistry::new();

		let path = abspath_from_resource_spec("/abc", Some("__main__"), &packages).unwrap();

		assert_eq!(path, PathBuf::from("/abc"));
	}

	#[rstest]
	fn test_abspath_package_relative() {
		let packages = PackageRegistry::new();
		packages.register("myapp.tests", "/srv/myapp/tests");

		let path = abspath_from_resource_spec("abc", Some("myapp.tests"), &packages).unwrap();

		assert_eq!(path, PathBuf::from("/srv/myapp/tests/abc"));
	}

	#[rstest]
	fn test_abspath_unknown_package_propagates() {
		let packages = PackageRegistry::new();

		let result = abspath_from_resource_spec("missing:abc", Some("myapp"), &packages);

		assert!(matches!(result, Err(ResourceError::PackageNotFound(name)) if name == "missing"));
	}
}
