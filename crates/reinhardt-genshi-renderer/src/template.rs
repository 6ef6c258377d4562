//! Genshi-style markup templates.
//!
//! Template files are XML-like markup with two kinds of dynamic content:
//!
//! - `${expr}` substitutions, evaluated as Tera expressions (so
//!   `${ user.name | upper }` works) and HTML-escaped whatever the file is
//!   called;
//! - `<xi:include href="..." parse="xml|text"/>` directives, resolved through
//!   the template's [`XIncludeResolver`] at render time.
//!
//! `$$` stands for a literal `$`. Everything else, Tera-looking braces
//! included, is emitted byte-for-byte.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use reinhardt_resource::ResourceLocator;
use serde_json::Value;
use tera::{Context, Tera};

use crate::error::{Error, Result};
use crate::xinclude::{
	TemplateCache, TemplateFactory, XIncludeFormat, XIncludeResolver, XIncludeSetup,
	XIncludesBuilder, default_xincludes_builder,
};

/// Top-level names visible to a template.
pub type Bindings = serde_json::Map<String, Value>;

/// Message translation hook, exposed to templates as `translate(msg=...)`.
pub type TranslateFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Maximum nesting of `xi:include` directives.
pub const MAX_INCLUDE_DEPTH: usize = 64;

static XINCLUDE_RE: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"(?s)<xi:include\b([^>]*?)(?:/>|>.*?</xi:include>)").expect("valid xinclude regex")
});

static ATTRIBUTE_RE: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r#"([A-Za-z_][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
		.expect("valid attribute regex")
});

static EXPRESSION_RE: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"\A\$\{([^}]*)\}").expect("valid expression regex"));

/// Options a template is compiled with.
#[derive(Clone, Default)]
pub struct TemplateOptions {
	/// Recompile when the source file's modification time changes.
	pub auto_reload: bool,
	/// Log expanded sources and report full engine error chains.
	pub debug: bool,
	/// Translation hook.
	pub translate: Option<TranslateFn>,
	/// Include resolver; falls back to [`default_xincludes_builder`].
	pub xincludes: Option<XIncludesBuilder>,
}

impl TemplateOptions {
	/// Creates options with reload and debug off.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the auto-reload flag.
	pub fn auto_reload(mut self, enabled: bool) -> Self {
		self.auto_reload = enabled;
		self
	}

	/// Sets the debug flag.
	pub fn debug(mut self, enabled: bool) -> Self {
		self.debug = enabled;
		self
	}

	/// Sets the translation hook.
	pub fn translate(mut self, translate: Option<TranslateFn>) -> Self {
		self.translate = translate;
		self
	}

	/// Injects the include resolver used by compiled templates.
	pub fn with_xincludes(mut self, builder: XIncludesBuilder) -> Self {
		self.xincludes = Some(builder);
		self
	}

	fn xincludes_builder(&self) -> XIncludesBuilder {
		self.xincludes.unwrap_or_else(default_xincludes_builder)
	}
}

impl fmt::Debug for TemplateOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TemplateOptions")
			.field("auto_reload", &self.auto_reload)
			.field("debug", &self.debug)
			.field("translate", &self.translate.is_some())
			.field("xincludes", &self.xincludes.is_some())
			.finish()
	}
}

/// A compiled template.
pub trait Template: Send + Sync {
	/// Source file of the template.
	fn path(&self) -> &Path;

	/// Options the template was compiled with.
	fn options(&self) -> &TemplateOptions;

	/// Renders at the given include nesting depth.
	fn render_at_depth(&self, bindings: &Bindings, depth: usize) -> Result<String>;

	/// Renders with `bindings` as top-level names.
	fn render(&self, bindings: &Bindings) -> Result<String> {
		self.render_at_depth(bindings, 0)
	}
}

impl fmt::Debug for dyn Template {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Template")
			.field("path", &self.path())
			.field("options", self.options())
			.finish()
	}
}

/// Compiles template files.
pub trait TemplateEngine: Send + Sync {
	/// Compiles the template at `path`.
	fn compile(&self, path: &Path, options: &TemplateOptions) -> Result<Arc<dyn Template>>;
}

/// Engine producing [`GenshiTemplateFile`]s.
///
/// Includes compiled on behalf of a template are stored in the engine's
/// [`TemplateCache`], keyed by absolute path, and reused by every template
/// compiled through the same engine.
#[derive(Clone)]
pub struct GenshiEngine {
	cache: TemplateCache<Arc<dyn Template>>,
	locator: Arc<dyn ResourceLocator>,
}

impl GenshiEngine {
	/// Creates an engine with an empty include cache.
	pub fn new(locator: Arc<dyn ResourceLocator>) -> Self {
		Self::with_cache(TemplateCache::new(), locator)
	}

	/// Creates an engine sharing `cache`.
	pub fn with_cache(
		cache: TemplateCache<Arc<dyn Template>>,
		locator: Arc<dyn ResourceLocator>,
	) -> Self {
		Self { cache, locator }
	}

	/// Returns the include cache.
	pub fn cache(&self) -> &TemplateCache<Arc<dyn Template>> {
		&self.cache
	}

	fn include_factory(&self, options: &TemplateOptions) -> TemplateFactory {
		let engine = self.clone();
		let options = options.clone();
		Arc::new(move |path: &Path, format: XIncludeFormat| -> Result<Arc<dyn Template>> {
			let template: Arc<dyn Template> = match format {
				XIncludeFormat::Xml => engine.compile(path, &options)?,
				XIncludeFormat::Text => {
					Arc::new(TextTemplate::load(path, options.auto_reload)?)
				}
			};
			Ok(engine.cache.insert(path.to_path_buf(), template))
		})
	}
}

impl TemplateEngine for GenshiEngine {
	fn compile(&self, path: &Path, options: &TemplateOptions) -> Result<Arc<dyn Template>> {
		if cfg!(target_arch = "wasm32") {
			return Err(Error::UnsupportedPlatform);
		}
		let relpath = path.parent().map(Path::to_path_buf).unwrap_or_default();
		let xincludes = (options.xincludes_builder())(XIncludeSetup {
			cache: self.cache.clone(),
			relpath,
			factory: self.include_factory(options),
			locator: Arc::clone(&self.locator),
		});
		Ok(Arc::new(GenshiTemplateFile::load(
			path,
			options.clone(),
			xincludes,
		)?))
	}
}

impl fmt::Debug for GenshiEngine {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("GenshiEngine")
			.field("cache", &self.cache)
			.finish_non_exhaustive()
	}
}

#[derive(Clone)]
struct IncludeSite {
	href: String,
	format: XIncludeFormat,
}

struct CompiledSource {
	tera: Tera,
	literals: Vec<String>,
	includes: Vec<IncludeSite>,
	modified: Option<SystemTime>,
}

/// A template file compiled from Genshi-style markup.
pub struct GenshiTemplateFile {
	path: PathBuf,
	name: String,
	options: TemplateOptions,
	xincludes: Arc<dyn XIncludeResolver>,
	compiled: RwLock<CompiledSource>,
}

impl GenshiTemplateFile {
	/// Reads and compiles the template at `path`.
	pub fn load(
		path: &Path,
		options: TemplateOptions,
		xincludes: Arc<dyn XIncludeResolver>,
	) -> Result<Self> {
		let name = path.to_string_lossy().into_owned();
		let compiled = compile_source(path, &name, &options)?;
		Ok(Self {
			path: path.to_path_buf(),
			name,
			options,
			xincludes,
			compiled: RwLock::new(compiled),
		})
	}

	/// Returns `true` if the template recompiles on change.
	pub fn auto_reload(&self) -> bool {
		self.options.auto_reload
	}

	/// Returns `true` if the template was compiled in debug mode.
	pub fn debug(&self) -> bool {
		self.options.debug
	}

	/// Returns the translation hook.
	pub fn translate(&self) -> Option<&TranslateFn> {
		self.options.translate.as_ref()
	}

	fn reload_if_modified(&self) -> Result<()> {
		let modified = modified_time(&self.path);
		if self.compiled.read().modified == modified {
			return Ok(());
		}
		tracing::debug!(path = %self.path.display(), "template changed on disk, recompiling");
		let fresh = compile_source(&self.path, &self.name, &self.options)?;
		*self.compiled.write() = fresh;
		Ok(())
	}

	fn engine_error(&self, error: tera::Error) -> Error {
		template_error(&self.path, &error, self.options.debug)
	}
}

impl Template for GenshiTemplateFile {
	fn path(&self) -> &Path {
		&self.path
	}

	fn options(&self) -> &TemplateOptions {
		&self.options
	}

	fn render_at_depth(&self, bindings: &Bindings, depth: usize) -> Result<String> {
		if depth > MAX_INCLUDE_DEPTH {
			return Err(Error::IncludeDepthExceeded {
				path: self.path.clone(),
				limit: MAX_INCLUDE_DEPTH,
			});
		}
		if self.options.auto_reload {
			self.reload_if_modified()?;
		}

		// Includes may render this same template, so no lock is held across them.
		let includes = self.compiled.read().includes.clone();
		let mut context = Context::new();
		for (name, value) in bindings {
			context.insert(name.as_str(), value);
		}
		for (index, site) in includes.iter().enumerate() {
			let included = self.xincludes.resolve(&site.href, site.format)?;
			let output = included.render_at_depth(bindings, depth + 1)?;
			context.insert(include_placeholder(index), &output);
		}

		let compiled = self.compiled.read();
		for (index, literal) in compiled.literals.iter().enumerate() {
			context.insert(literal_placeholder(index), literal);
		}
		compiled
			.tera
			.render(&self.name, &context)
			.map_err(|e| self.engine_error(e))
	}
}

impl fmt::Debug for GenshiTemplateFile {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("GenshiTemplateFile")
			.field("path", &self.path)
			.field("options", &self.options)
			.finish_non_exhaustive()
	}
}

struct EscapedText {
	escaped: String,
	modified: Option<SystemTime>,
}

/// A file included with `parse="text"`.
///
/// With `auto_reload` the file is re-read when its modification time changes.
pub struct TextTemplate {
	path: PathBuf,
	options: TemplateOptions,
	text: RwLock<EscapedText>,
}

impl TextTemplate {
	/// Reads `path` and escapes its content for inclusion in markup.
	pub fn load(path: &Path, auto_reload: bool) -> Result<Self> {
		Ok(Self {
			path: path.to_path_buf(),
			options: TemplateOptions::new().auto_reload(auto_reload),
			text: RwLock::new(read_escaped(path)?),
		})
	}

	fn reload_if_modified(&self) -> Result<()> {
		let modified = modified_time(&self.path);
		if self.text.read().modified == modified {
			return Ok(());
		}
		tracing::debug!(path = %self.path.display(), "text include changed on disk, reloading");
		let fresh = read_escaped(&self.path)?;
		*self.text.write() = fresh;
		Ok(())
	}
}

impl fmt::Debug for TextTemplate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TextTemplate")
			.field("path", &self.path)
			.field("auto_reload", &self.options.auto_reload)
			.finish_non_exhaustive()
	}
}

impl Template for TextTemplate {
	fn path(&self) -> &Path {
		&self.path
	}

	fn options(&self) -> &TemplateOptions {
		&self.options
	}

	fn render_at_depth(&self, _bindings: &Bindings, _depth: usize) -> Result<String> {
		if self.options.auto_reload {
			self.reload_if_modified()?;
		}
		Ok(self.text.read().escaped.clone())
	}
}

fn include_placeholder(index: usize) -> String {
	format!("__xinclude_{index}")
}

fn literal_placeholder(index: usize) -> String {
	format!("__literal_{index}")
}

fn read_escaped(path: &Path) -> Result<EscapedText> {
	let modified = modified_time(path);
	let content = read_source(path)?;
	Ok(EscapedText {
		escaped: tera::escape_html(&content),
		modified,
	})
}

fn read_source(path: &Path) -> Result<String> {
	fs::read_to_string(path).map_err(|source| Error::TemplateNotFound {
		path: path.to_path_buf(),
		source,
	})
}

fn modified_time(path: &Path) -> Option<SystemTime> {
	fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

fn compile_source(path: &Path, name: &str, options: &TemplateOptions) -> Result<CompiledSource> {
	let modified = modified_time(path);
	let source = read_source(path)?;
	let ExpandedSource {
		tera: expanded,
		literals,
		includes,
		..
	} = expand_source(&source);
	if options.debug {
		tracing::debug!(path = %path.display(), source = %expanded, "expanded template source");
	}

	let mut tera = Tera::default();
	// Every template name ends with "", so every substitution is escaped.
	tera.autoescape_on(vec![""]);
	tera.register_function("translate", translate_function(options.translate.clone()));
	tera.add_raw_template(name, &expanded)
		.map_err(|e| template_error(path, &e, options.debug))?;

	tracing::debug!(
		path = %path.display(),
		includes = includes.len(),
		auto_reload = options.auto_reload,
		debug = options.debug,
		"compiled template"
	);
	Ok(CompiledSource {
		tera,
		literals,
		includes,
		modified,
	})
}

/// Tera source of a template plus the values its placeholders are bound to.
#[derive(Default)]
struct ExpandedSource {
	tera: String,
	literals: Vec<String>,
	includes: Vec<IncludeSite>,
	// The last thing emitted is a literal placeholder that can still grow.
	literal_open: bool,
}

impl ExpandedSource {
	fn push_literal(&mut self, text: &str) {
		if text.is_empty() {
			return;
		}
		if self.literal_open {
			if let Some(last) = self.literals.last_mut() {
				last.push_str(text);
				return;
			}
		}
		let index = self.literals.len();
		self.literals.push(text.to_string());
		self.tera.push_str(&placeholder_tag(&literal_placeholder(index)));
		self.literal_open = true;
	}

	fn push_include(&mut self, site: IncludeSite) {
		let index = self.includes.len();
		self.includes.push(site);
		self.tera.push_str(&placeholder_tag(&include_placeholder(index)));
		self.literal_open = false;
	}

	fn push_expression(&mut self, expression: &str) {
		self.tera.push_str("{{ ");
		self.tera.push_str(expression.trim());
		self.tera.push_str(" }}");
		self.literal_open = false;
	}

	/// Splits markup into literal runs and `${expr}` substitutions.
	fn push_markup(&mut self, mut markup: &str) {
		while let Some(position) = markup.find('$') {
			self.push_literal(&markup[..position]);
			let rest = &markup[position..];
			if let Some(rest) = rest.strip_prefix("$$") {
				self.push_literal("$");
				markup = rest;
			} else if let Some(caps) = EXPRESSION_RE.captures(rest) {
				self.push_expression(&caps[1]);
				markup = &rest[caps[0].len()..];
			} else {
				self.push_literal("$");
				markup = &rest[1..];
			}
		}
		self.push_literal(markup);
	}
}

fn placeholder_tag(name: &str) -> String {
	format!("{{{{ {name} | safe }}}}")
}

/// Rewrites a template into Tera source.
///
/// Literal markup never reaches the Tera parser: each run is bound to a
/// `__literal_N` value, each include to a `__xinclude_N` value, and only
/// `${expr}` bodies become Tera expressions.
fn expand_source(source: &str) -> ExpandedSource {
	let mut expanded = ExpandedSource::default();
	let mut last = 0;
	for caps in XINCLUDE_RE.captures_iter(source) {
		let Some(directive) = caps.get(0) else {
			continue;
		};
		let attributes = parse_attributes(&caps[1]);
		let Some(href) = attributes.get("href") else {
			continue;
		};
		expanded.push_markup(&source[last..directive.start()]);
		expanded.push_include(IncludeSite {
			href: href.clone(),
			format: XIncludeFormat::from_parse_attribute(attributes.get("parse").map(String::as_str)),
		});
		last = directive.end();
	}
	expanded.push_markup(&source[last..]);
	expanded
}

fn parse_attributes(raw: &str) -> HashMap<String, String> {
	ATTRIBUTE_RE
		.captures_iter(raw)
		.map(|caps| {
			let value = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
			(caps[1].to_string(), value.to_string())
		})
		.collect()
}

fn translate_function(
	translate: Option<TranslateFn>,
) -> impl Fn(&HashMap<String, tera::Value>) -> tera::Result<tera::Value> + Send + Sync + 'static {
	move |args: &HashMap<String, tera::Value>| {
		let msg = args
			.get("msg")
			.and_then(tera::Value::as_str)
			.ok_or_else(|| tera::Error::msg("translate() requires a string `msg` argument"))?;
		let translated = match &translate {
			Some(translate) => translate(msg),
			None => msg.to_string(),
		};
		Ok(tera::Value::String(translated))
	}
}

fn template_error(path: &Path, error: &tera::Error, debug: bool) -> Error {
	let message = if debug {
		let mut message = error.to_string();
		let mut source = std::error::Error::source(error);
		while let Some(cause) = source {
			message.push_str(": ");
			message.push_str(&cause.to_string());
			source = std::error::Error::source(cause);
		}
		message
	} else {
		error.to_string()
	};
	Error::Template {
		path: path.to_path_buf(),
		message,
	}
}
