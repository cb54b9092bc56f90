//! Overlay precedence through the public surface.

mod common;

use std::sync::Arc;

use common::{bundle, engine, fr, overlay, string_of};
use restable::{Bundle, Config, IdMapBuilder, PackageBuilder, RegistryDiagnostic, ResId, Value};

struct Target {
	pkg: PackageBuilder,
	title: ResId,
	greeting: ResId,
	accent: ResId,
}

fn target() -> Target {
	let mut pkg = PackageBuilder::new("com.example", 0x7f);
	let d = Config::default();
	let title = pkg.value("string", "title", &d, "Title");
	pkg.value("string", "title", &fr(), "Titre");
	let greeting = pkg.value("string", "greeting", &d, "Hi");
	let accent = pkg.value("color", "accent", &d, Value::color(0xff00_00ff));
	Target { pkg, title, greeting, accent }
}

fn overlay_bundle(t: &Target) -> Arc<Bundle> {
	let mut o = PackageBuilder::new("com.example.theme", 0x7f);
	let d = Config::default();
	let title = o.value("string", "title", &d, "Overlaid title");
	let greeting = o.value("string", "greeting", &d, "Hello there");
	let idmap = IdMapBuilder::new("/app.apk", 0x7f)
		.map(t.title, title)
		.map(t.greeting, greeting)
		.inline(t.accent, Config::default(), Value::color(0xffff_00ff));
	overlay("/theme_overlay.apk", idmap, o)
}

#[test]
fn overlay_supersedes_unless_strictly_worse() {
	let t = target();
	let o = overlay_bundle(&t);
	let (title, greeting, accent) = (t.title, t.greeting, t.accent);
	let app = bundle("/app.apk", t.pkg);

	let mut engine = engine(vec![app.clone(), o], Config::default());
	assert_eq!(string_of(&engine, title), "Overlaid title");
	assert_eq!(string_of(&engine, greeting), "Hello there");
	assert_eq!(engine.get_resource(accent, false, 0).unwrap().value, Value::color(0xffff_00ff));

	engine.set_configuration(fr());
	assert_eq!(string_of(&engine, title), "Titre");
	assert_eq!(string_of(&engine, greeting), "Hello there");

	engine.set_bundles(vec![app]);
	engine.set_configuration(Config::default());
	assert_eq!(string_of(&engine, title), "Title");
	assert_eq!(engine.get_resource(accent, false, 0).unwrap().value, Value::color(0xff00_00ff));
}

#[test]
fn overlay_before_target_in_load_order() {
	let t = target();
	let o = overlay_bundle(&t);
	let title = t.title;
	let engine = engine(vec![o, bundle("/app.apk", t.pkg)], Config::default());
	assert_eq!(string_of(&engine, title), "Overlaid title");
	assert_eq!(engine.resource_name(title).unwrap().to_string(), "com.example:string/title");
}

#[test]
fn overlay_without_target_has_no_effect() {
	let t = target();
	let o = overlay_bundle(&t);
	let mut other = PackageBuilder::new("com.other", 0x7f);
	other.value("string", "x", &Config::default(), "x");
	let engine = engine(vec![bundle("/other.apk", other), o], Config::default());

	assert!(matches!(
		engine.registry().diagnostics(),
		[RegistryDiagnostic::OverlayTargetMissing { .. }]
	));
	assert!(engine.registry().group(0x7f).unwrap().overlays().is_empty());
}

#[test]
fn resolution_trace_records_overlay_step() {
	let t = target();
	let o = overlay_bundle(&t);
	let title = t.title;
	let engine = engine(vec![bundle("/app.apk", t.pkg), o], Config::default());

	engine.set_resolution_logging(true);
	engine.resolve(title, 0, false).unwrap();
	let trace = engine.last_resolution().unwrap();
	assert!(trace.contains("Overlaid: com.example.theme (/theme_overlay.apk)"), "{trace}");
}
