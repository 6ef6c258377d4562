//! Process-wide XIncludes activation
//!
//! Kept in its own test binary: activation is global and cannot be undone.

use std::path::Path;
use std::sync::Arc;

use reinhardt_genshi_renderer::{
	Bindings, Configurator, Error, Registry, TemplateSettings, XIncludes, includeme,
	render_template,
};

fn registry() -> Arc<Registry> {
	let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures");
	let registry = Arc::new(Registry::with_settings(
		TemplateSettings::new().with_package("fixtures", fixtures),
	));
	Configurator::new(Arc::clone(&registry)).include(includeme);
	registry
}

fn bindings() -> Bindings {
	let mut kw = Bindings::new();
	kw.insert("title".to_string(), "Home".into());
	kw.insert("name".to_string(), "Alice".into());
	kw
}

#[test]
fn test_activate_installs_resource_spec_includes() {
	// Before activation only relative includes resolve.
	assert!(!XIncludes::is_active());
	let result = render_template(&registry(), "fixtures:page.genshi", None, bindings());
	assert!(matches!(result, Err(Error::TemplateNotFound { path, .. }) if path.ends_with("fixtures:includes/footer.txt")));

	assert!(XIncludes::activate());
	assert!(XIncludes::is_active());
	assert!(!XIncludes::activate());

	let html = render_template(&registry(), "fixtures:page.genshi", None, bindings()).unwrap();
	assert!(html.contains("<h1>Home</h1>"));
	assert!(html.contains("<p>Welcome, Alice</p>"));
	assert!(html.contains("Copyright &lt;Reinhardt&gt;"));
}
