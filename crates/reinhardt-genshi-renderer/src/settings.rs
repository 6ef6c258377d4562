//! Template settings.
//!
//! Settings are usually loaded from the `[templates]`-style TOML file of a
//! project and may be overridden from the environment:
//!
//! ```toml
//! reload_templates = true
//! debug_templates = false
//! default_package = "myapp"
//!
//! [packages]
//! myapp = "/srv/myapp"
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use reinhardt_resource::PackageRegistry;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable overriding [`TemplateSettings::reload_templates`].
pub const RELOAD_TEMPLATES_ENV: &str = "REINHARDT_RELOAD_TEMPLATES";

/// Environment variable overriding [`TemplateSettings::debug_templates`].
pub const DEBUG_TEMPLATES_ENV: &str = "REINHARDT_DEBUG_TEMPLATES";

/// Settings consumed by Genshi template renderers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSettings {
	/// Recompile templates when their source file changes.
	pub reload_templates: bool,

	/// Compile templates in debug mode.
	pub debug_templates: bool,

	/// Package used for package-relative template names.
	pub default_package: Option<String>,

	/// Resource roots of named packages.
	pub packages: HashMap<String, PathBuf>,
}

impl TemplateSettings {
	/// Creates settings with every flag off.
	pub fn new() -> Self {
		Self::default()
	}

	/// Parses settings from a TOML document.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_genshi_renderer::TemplateSettings;
	///
	/// let settings = TemplateSettings::from_toml_str("reload_templates = true").unwrap();
	/// assert!(settings.reload_templates);
	/// assert!(!settings.debug_templates);
	/// ```
	pub fn from_toml_str(source: &str) -> Result<Self> {
		toml::from_str(source).map_err(|e| Error::Settings(e.to_string()))
	}

	/// Reads and parses a TOML settings file.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
		let source = std::fs::read_to_string(path.as_ref())?;
		Self::from_toml_str(&source)
	}

	/// Applies overrides from the process environment.
	pub fn with_env_overrides(self) -> Result<Self> {
		self.with_overrides_from(|key| std::env::var(key).ok())
	}

	/// Applies overrides from an arbitrary variable source.
	pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(value) = lookup(RELOAD_TEMPLATES_ENV) {
			self.reload_templates = parse_flag(RELOAD_TEMPLATES_ENV, &value)?;
		}
		if let Some(value) = lookup(DEBUG_TEMPLATES_ENV) {
			self.debug_templates = parse_flag(DEBUG_TEMPLATES_ENV, &value)?;
		}
		Ok(self)
	}

	/// Sets the reload flag.
	pub fn with_reload_templates(mut self, enabled: bool) -> Self {
		self.reload_templates = enabled;
		self
	}

	/// Sets the debug flag.
	pub fn with_debug_templates(mut self, enabled: bool) -> Self {
		self.debug_templates = enabled;
		self
	}

	/// Registers a package resource root.
	pub fn with_package(mut self, name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
		self.packages.insert(name.into(), root.into());
		self
	}

	/// Sets the default package.
	pub fn with_default_package(mut self, name: impl Into<String>) -> Self {
		self.default_package = Some(name.into());
		self
	}

	/// Copies the configured package roots into `packages`.
	pub fn register_packages(&self, packages: &PackageRegistry) {
		for (name, root) in &self.packages {
			packages.register(name.clone(), root.clone());
		}
	}
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
	match value.trim().to_lowercase().as_str() {
		"true" | "1" | "yes" | "on" => Ok(true),
		"false" | "0" | "no" | "off" | "" => Ok(false),
		other => Err(Error::Settings(format!(
			"{key} must be a boolean, got '{other}'"
		))),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_defaults_are_off() {
		let settings = TemplateSettings::from_toml_str("").unwrap();

		assert_eq!(settings, TemplateSettings::default());
		assert!(!settings.reload_templates);
		assert!(!settings.debug_templates);
	}

	#[rstest]
	fn test_parse_full_document() {
		let settings = TemplateSettings::from_toml_str(
			r#"
			reload_templates = true
			debug_templates = true
			default_package = "blog"

			[packages]
			blog = "/srv/blog"
			"#,
		)
		.unwrap();

		assert!(settings.reload_templates);
		assert!(settings.debug_templates);
		assert_eq!(settings.default_package.as_deref(), Some("blog"));
		assert_eq!(settings.packages["blog"], PathBuf::from("/srv/blog"));
	}

	#[rstest]
	fn test_invalid_document() {
		let result = TemplateSettings::from_toml_str("reload_templates = \"maybe\"");

		assert!(matches!(result, Err(Error::Settings(_))));
	}

	#[rstest]
	#[case("true", true)]
	#[case("1", true)]
	#[case("yes", true)]
	#[case("ON", true)]
	#[case("false", false)]
	#[case("0", false)]
	#[case("off", false)]
	fn test_env_overrides(#[case] value: &str, #[case] expected: bool) {
		let settings = TemplateSettings::new()
			.with_reload_templates(!expected)
			.with_overrides_from(|key| (key == RELOAD_TEMPLATES_ENV).then(|| value.to_string()))
			.unwrap();

		assert_eq!(settings.reload_templates, expected);
		assert!(!settings.debug_templates);
	}

	#[rstest]
	fn test_invalid_env_override() {
		let result = TemplateSettings::new()
			.with_overrides_from(|key| (key == DEBUG_TEMPLATES_ENV).then(|| "sometimes".to_string()));

		assert!(matches!(result, Err(Error::Settings(msg)) if msg.contains(DEBUG_TEMPLATES_ENV)));
	}

	#[rstest]
	fn test_register_packages() {
		let settings = TemplateSettings::new().with_package("blog", "/srv/blog");
		let packages = PackageRegistry::new();

		settings.register_packages(&packages);

		assert_eq!(packages.root("blog"), Some(PathBuf::from("/srv/blog")));
	}
}
