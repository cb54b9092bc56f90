//! Shared builders for unit tests.

use std::sync::Arc;

use restable_primitives::{Config, ResId, Value};

use crate::bundle::{Bundle, BundleBuilder, IdMapBuilder, PackageBuilder};
use crate::{EngineOptions, ResourceEngine};

pub(crate) fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().with_max_level(tracing::Level::TRACE).try_init();
}

pub(crate) fn fr() -> Config {
	Config::default().with_locale("fr", None)
}

pub(crate) fn de() -> Config {
	Config::default().with_locale("de", None)
}

pub(crate) fn bundle(path: &str, package: PackageBuilder) -> Arc<Bundle> {
	Arc::new(BundleBuilder::new(path).package(package).build().expect("fixture bundle builds"))
}

pub(crate) fn overlay(path: &str, idmap: IdMapBuilder, package: PackageBuilder) -> Arc<Bundle> {
	Arc::new(BundleBuilder::new(path).overlay(idmap).package(package).build().expect("fixture overlay builds"))
}

pub(crate) fn engine(bundles: Vec<Arc<Bundle>>, config: Config) -> ResourceEngine {
	init_tracing();
	let mut engine = ResourceEngine::new(EngineOptions::default());
	engine.set_bundles(bundles);
	engine.set_configuration(config);
	engine
}

/// Ids of the application fixture built by [`app_package`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct AppIds {
	pub(crate) hello: ResId,
	pub(crate) color_primary: ResId,
	pub(crate) color_accent: ResId,
	pub(crate) text_size: ResId,
	pub(crate) window_bg: ResId,
	pub(crate) red: ResId,
	pub(crate) base_theme: ResId,
	pub(crate) app_theme: ResId,
}

/// `com.example.app` (0x7f): a localized string, three attributes, a color,
/// and a two-level theme hierarchy.
///
/// - `Base` sets `colorPrimary`, `textSize`, `windowBackground`.
/// - `App` (parent `Base`) overrides `colorPrimary` and adds `colorAccent`.
pub(crate) fn app_package() -> (PackageBuilder, AppIds) {
	let mut pkg = PackageBuilder::new("com.example.app", 0x7f);
	let d = Config::default();
	let hello = pkg.value("string", "hello", &d, "hello");
	pkg.value("string", "hello", &fr(), "bonjour");

	let color_primary = pkg.value("attr", "colorPrimary", &d, Value::int(0));
	let color_accent = pkg.value("attr", "colorAccent", &d, Value::int(0));
	let text_size = pkg.value("attr", "textSize", &d, Value::int(0));
	let window_bg = pkg.value("attr", "windowBackground", &d, Value::int(0));

	let red = pkg.value("color", "red", &d, Value::color(0xffff_0000));

	let base_theme = pkg.bag(
		"style",
		"Base",
		&d,
		None,
		[
			(color_primary, Value::color(0xff00_0000)),
			(text_size, Value::int(14)),
			(window_bg, Value::reference(red)),
		],
	);
	let app_theme = pkg.bag(
		"style",
		"App",
		&d,
		Some(base_theme),
		[(color_primary, Value::color(0xff11_2233)), (color_accent, Value::color(0xff44_5566))],
	);

	(
		pkg,
		AppIds {
			hello,
			color_primary,
			color_accent,
			text_size,
			window_bg,
			red,
			base_theme,
			app_theme,
		},
	)
}
