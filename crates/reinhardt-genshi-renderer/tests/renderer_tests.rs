//! Renderer registry integration tests
//!
//! Exercises the convenience API against on-disk fixtures.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hyper::StatusCode;
use hyper::header::CONTENT_TYPE;
use reinhardt_genshi_renderer::{
	Bindings, Configurator, Error, GENSHI_EXTENSION, HTML_CONTENT_TYPE, Registry, RendererConfig,
	RendererFactory, RendererInfo, Response, Result, Template, TemplateOptions, TemplateRenderer,
	TemplateSettings, TranslateFn, XIncludes, get_renderer, get_template, includeme,
	render_template, render_template_to_response,
};
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use tempfile::TempDir;

const MINIMAL: &str = "<div xmlns=\"http://www.w3.org/1999/xhtml\">\n</div>";

fn fixtures_dir() -> PathBuf {
	Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

fn template_path(name: &str) -> String {
	fixtures_dir().join(name).to_string_lossy().into_owned()
}

#[fixture]
fn registry() -> Arc<Registry> {
	let registry = Arc::new(Registry::with_settings(
		TemplateSettings::new().with_package("fixtures", fixtures_dir()),
	));
	Configurator::new(Arc::clone(&registry)).include(includeme);
	registry
}

struct DummyTemplate {
	options: TemplateOptions,
}

impl Template for DummyTemplate {
	fn path(&self) -> &Path {
		Path::new("dummy")
	}

	fn options(&self) -> &TemplateOptions {
		&self.options
	}

	fn render_at_depth(&self, _bindings: &Bindings, _depth: usize) -> Result<String> {
		Ok("dummy".to_string())
	}
}

struct DummyRenderer {
	template: Arc<dyn Template>,
}

impl TemplateRenderer for DummyRenderer {
	fn render(&self, _value: Value, _system: Bindings) -> Result<String> {
		Ok(String::new())
	}

	fn implementation(&self) -> Result<Arc<dyn Template>> {
		Ok(Arc::clone(&self.template))
	}
}

fn register_dummy(registry: &Registry) -> Arc<DummyRenderer> {
	let renderer = Arc::new(DummyRenderer {
		template: Arc::new(DummyTemplate {
			options: TemplateOptions::new(),
		}),
	});
	let shared: Arc<dyn TemplateRenderer> = renderer.clone();
	registry.add_renderer(
		"foo",
		Arc::new(
			move |_info: &RendererInfo<'_>| -> Result<Arc<dyn TemplateRenderer>> {
				Ok(Arc::clone(&shared))
			},
		),
	);
	renderer
}

#[rstest]
fn test_render_template(registry: Arc<Registry>) {
	let result = render_template(&registry, &template_path("minimal.genshi"), None, Bindings::new())
		.unwrap();

	assert_eq!(result, MINIMAL);
}

#[rstest]
fn test_render_template_resource_spec(registry: Arc<Registry>) {
	let result = render_template(&registry, "fixtures:minimal.genshi", None, Bindings::new()).unwrap();

	assert_eq!(result, MINIMAL);
}

#[rstest]
fn test_render_template_package_relative(registry: Arc<Registry>) {
	let result =
		render_template(&registry, "minimal.genshi", Some("fixtures"), Bindings::new()).unwrap();

	assert_eq!(result, MINIMAL);
}

#[rstest]
fn test_render_template_to_response(registry: Arc<Registry>) {
	let response = render_template_to_response(
		&registry,
		&template_path("minimal.genshi"),
		None,
		Bindings::new(),
	)
	.unwrap();

	assert_eq!(response.status, StatusCode::OK);
	assert_eq!(response.headers.len(), 2);
	assert_eq!(response.headers[CONTENT_TYPE], HTML_CONTENT_TYPE);
	assert_eq!(response.text(), Some(MINIMAL));
}

#[rstest]
fn test_response_factory_override(registry: Arc<Registry>) {
	registry.register_response_factory(|body: String| {
		let mut response = Response::new(StatusCode::NON_AUTHORITATIVE_INFORMATION);
		response.body = body.into();
		response
	});

	let response = render_template_to_response(
		&registry,
		&template_path("minimal.genshi"),
		None,
		Bindings::new(),
	)
	.unwrap();

	assert_eq!(response.status, StatusCode::NON_AUTHORITATIVE_INFORMATION);
	assert!(response.headers.is_empty());
	assert_eq!(response.text(), Some(MINIMAL));
}

#[rstest]
fn test_get_renderer(registry: Arc<Registry>) {
	let renderer = register_dummy(&registry);

	let result = get_renderer(&registry, "foo", None).unwrap();

	let expected: Arc<dyn TemplateRenderer> = renderer;
	assert!(Arc::ptr_eq(&result, &expected));
}

#[rstest]
fn test_get_template(registry: Arc<Registry>) {
	let renderer = register_dummy(&registry);

	let result = get_template(&registry, "foo", None).unwrap();

	assert!(Arc::ptr_eq(&result, &renderer.template));
}

#[rstest]
fn test_get_template_compiles_fixture(registry: Arc<Registry>) {
	let path = template_path("minimal.genshi");

	let template = get_template(&registry, &path, None).unwrap();

	assert_eq!(template.path(), Path::new(&path));
	assert_eq!(template.render(&Bindings::new()).unwrap(), MINIMAL);
}

#[rstest]
fn test_renderer_cached_across_calls(registry: Arc<Registry>) {
	let first = get_renderer(&registry, "fixtures:minimal.genshi", None).unwrap();
	let second = get_renderer(&registry, "minimal.genshi", Some("fixtures")).unwrap();

	assert!(Arc::ptr_eq(&first, &second));
	assert!(Arc::ptr_eq(
		&first.implementation().unwrap(),
		&second.implementation().unwrap()
	));
}

#[rstest]
fn test_missing_template(registry: Arc<Registry>) {
	let result = render_template(&registry, "fixtures:nope.genshi", None, Bindings::new());

	assert!(matches!(result, Err(Error::MissingTemplate(_))));
}

#[rstest]
fn test_unregistered_extension() {
	let registry = Registry::new();

	let result = render_template(&registry, &template_path("minimal.genshi"), None, Bindings::new());

	assert!(matches!(result, Err(Error::RendererNotFound(name)) if name == ".genshi"));
}

#[rstest]
fn test_includes_and_translation(registry: Arc<Registry>) {
	let translate: TranslateFn = Arc::new(|msg: &str| msg.to_uppercase());
	registry.register_translate(translate);
	registry.register_xincludes(XIncludes::builder());
	let mut kw = Bindings::new();
	kw.insert("title".to_string(), json!("Home"));
	kw.insert("name".to_string(), json!("Alice"));

	let result = render_template(&registry, "fixtures:page.genshi", None, kw).unwrap();

	assert_eq!(
		result,
		"<html xmlns=\"http://www.w3.org/1999/xhtml\" xmlns:xi=\"http://www.w3.org/2001/XInclude\">\n\
		 <h1>Home</h1>\n\
		 <p>WELCOME, Alice</p>\n\
		 Copyright &lt;Reinhardt&gt;\n\
		 </html>"
	);
	assert!(
		registry
			.templates()
			.contains(&fixtures_dir().join("includes").join("header.genshi"))
	);
	assert!(
		registry
			.templates()
			.contains(&fixtures_dir().join("includes").join("footer.txt"))
	);
}

#[rstest]
fn test_reload_templates_setting(registry: Arc<Registry>) {
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("page.genshi");
	std::fs::write(&path, "<p>one</p>").unwrap();
	registry.set_settings(TemplateSettings::new().with_reload_templates(true));
	let name = path.to_string_lossy().into_owned();
	assert_eq!(
		render_template(&registry, &name, None, Bindings::new()).unwrap(),
		"<p>one</p>"
	);

	std::fs::write(&path, "<p>two</p>").unwrap();
	std::fs::File::options()
		.write(true)
		.open(&path)
		.unwrap()
		.set_modified(std::time::SystemTime::now() + std::time::Duration::from_secs(60))
		.unwrap();

	assert_eq!(
		render_template(&registry, &name, None, Bindings::new()).unwrap(),
		"<p>two</p>"
	);
}

#[derive(Default)]
struct DummyConfigurator {
	renderers: HashMap<String, RendererFactory>,
}

impl RendererConfig for DummyConfigurator {
	fn add_renderer(&mut self, name: &str, factory: RendererFactory) {
		self.renderers.insert(name.to_string(), factory);
	}
}

#[rstest]
fn test_includeme() {
	let mut config = DummyConfigurator::default();

	includeme(&mut config);

	assert_eq!(config.renderers.len(), 1);
	let factory = &config.renderers[GENSHI_EXTENSION];
	let registry = Registry::new();
	let path = template_path("minimal.genshi");
	let renderer = factory(&RendererInfo {
		name: &path,
		package: None,
		registry: &registry,
	})
	.unwrap();
	assert_eq!(renderer.render(json!({}), Bindings::new()).unwrap(), MINIMAL);
}
