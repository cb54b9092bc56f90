#![allow(dead_code)]

use std::sync::Arc;

use restable::{Bundle, BundleBuilder, Config, EngineOptions, IdMapBuilder, PackageBuilder, ResId, ResourceEngine};

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().with_max_level(tracing::Level::DEBUG).try_init();
}

pub fn fr() -> Config {
	Config::default().with_locale("fr", None)
}

pub fn de() -> Config {
	Config::default().with_locale("de", None)
}

pub fn bundle(path: &str, package: PackageBuilder) -> Arc<Bundle> {
	Arc::new(BundleBuilder::new(path).package(package).build().expect("bundle builds"))
}

pub fn overlay(path: &str, idmap: IdMapBuilder, package: PackageBuilder) -> Arc<Bundle> {
	Arc::new(BundleBuilder::new(path).overlay(idmap).package(package).build().expect("overlay builds"))
}

pub fn engine(bundles: Vec<Arc<Bundle>>, config: Config) -> ResourceEngine {
	init_tracing();
	let mut engine = ResourceEngine::new(EngineOptions::default());
	engine.set_bundles(bundles);
	engine.set_configuration(config);
	engine
}

/// Reads the string value of `id` under the engine's configuration.
pub fn string_of(engine: &ResourceEngine, id: ResId) -> String {
	let value = engine.get_resource(id, false, 0).expect("resource resolves");
	let cookie = value.cookie.expect("value has a cookie");
	engine.string(cookie, value.value).expect("value is a string").to_string()
}
