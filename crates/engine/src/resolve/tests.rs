use std::sync::Arc;

use proptest::prelude::*;
use restable_primitives::{Config, ConfigAxes, NightMode, ResId, Value, ValueKind};

use super::*;
use crate::bundle::{BundleBuilder, IdMapBuilder, PackageBuilder};
use crate::test_fixtures::{app_package, bundle, engine, fr, overlay};

fn string_of(engine: &ResourceEngine, id: ResId) -> String {
	let value = engine.get_resource(id, false, 0).unwrap();
	engine.string(value.cookie.unwrap(), value.value).unwrap().to_string()
}

#[test]
fn picks_most_specific_locale() {
	let (pkg, ids) = app_package();
	let app = bundle("/app.apk", pkg);

	let default = engine(vec![app.clone()], Config::default());
	assert_eq!(string_of(&default, ids.hello), "hello");

	let french = engine(vec![app.clone()], fr());
	assert_eq!(string_of(&french, ids.hello), "bonjour");
	let selected = french.get_resource(ids.hello, false, 0).unwrap();
	assert_eq!(selected.config, fr());
	assert_eq!(selected.flags, ConfigAxes::LOCALE);

	let german = engine(vec![app], Config::default().with_locale("de", None));
	assert_eq!(string_of(&german, ids.hello), "hello");
}

#[test]
fn filtering_off_gives_same_answers() {
	let (pkg, ids) = app_package();
	let mut engine = ResourceEngine::new(crate::EngineOptions {
		filter_incompatible_configs: false,
		..Default::default()
	});
	engine.set_bundles(vec![bundle("/app.apk", pkg)]);
	engine.set_configuration(fr());
	assert_eq!(string_of(&engine, ids.hello), "bonjour");
}

#[test]
fn density_override_takes_slow_path() {
	let mut pkg = PackageBuilder::new("com.example", 0x7f);
	let icon = pkg.value("drawable", "icon", &Config::default().with_density(Config::DENSITY_MEDIUM), Value::int(1));
	pkg.value("drawable", "icon", &Config::default().with_density(Config::DENSITY_XHIGH), Value::int(2));
	let engine = engine(vec![bundle("/app.apk", pkg)], Config::default().with_density(Config::DENSITY_MEDIUM));

	assert_eq!(engine.get_resource(icon, false, 0).unwrap().value, Value::int(1));
	assert_eq!(engine.get_resource(icon, false, Config::DENSITY_XHIGH).unwrap().value, Value::int(2));
	assert_eq!(engine.get_resource(icon, false, Config::DENSITY_MEDIUM).unwrap().value, Value::int(1));
}

#[test]
fn ignoring_configuration_takes_first_defined() {
	let (pkg, ids) = app_package();
	let engine = engine(vec![bundle("/app.apk", pkg)], fr());
	let entry = engine.resolve(ids.hello, 0, true).unwrap();
	assert_eq!(entry.config, Config::default());
	assert_eq!(engine.resource_flags(ids.hello), Ok(ConfigAxes::LOCALE));
}

#[test]
fn loader_wins_on_equal_config() {
	let app = |s: &str| {
		let mut pkg = PackageBuilder::new("com.example", 0x7f);
		let id = pkg.value("string", "s", &Config::default(), s);
		(pkg, id)
	};
	let (base, id) = app("base");
	let (split, _) = app("split");
	let (loaded, _) = app("loader");

	let plain = engine(vec![bundle("/base.apk", base), bundle("/split.apk", split)], Config::default());
	assert_eq!(string_of(&plain, id), "base");

	let (base, _) = app("base");
	let loader = Arc::new(BundleBuilder::new("/loader.apk").loader().package(loaded).build().unwrap());
	let with_loader = engine(vec![bundle("/base.apk", base), loader], Config::default());
	assert_eq!(string_of(&with_loader, id), "loader");
}

#[test]
fn corrupt_chunk_is_skipped() {
	let (pkg, ids) = app_package();
	let mut built = BundleBuilder::new("/app.apk").package(pkg).build().unwrap();
	let spec = built.packages[0].type_specs[0].as_mut().unwrap();
	let fr_position = spec.configs.iter().position(|c| c.config == fr()).unwrap();
	spec.configs[fr_position].span = 0..3;

	let engine = engine(vec![Arc::new(built)], fr());
	assert_eq!(string_of(&engine, ids.hello), "hello");
}

#[test]
fn errors_for_bad_ids() {
	let (pkg, ids) = app_package();
	let engine = engine(vec![bundle("/app.apk", pkg)], Config::default());

	assert_eq!(engine.resolve(ResId(0x7f00_0001), 0, false).unwrap_err(), ResolveError::InvalidId(ResId(0x7f00_0001)));
	assert_eq!(
		engine.resolve(ResId(0x0301_0000), 0, false).unwrap_err(),
		ResolveError::UnknownPackage {
			id: ResId(0x0301_0000),
			package_id: 0x03
		}
	);
	let missing = ResId(ids.hello.get() + 100);
	assert_eq!(engine.resolve(missing, 0, false).unwrap_err(), ResolveError::NoEntry(missing));
}

#[test]
fn bags_answer_as_self_references() {
	let (pkg, ids) = app_package();
	let engine = engine(vec![bundle("/app.apk", pkg)], Config::default());

	assert_eq!(engine.get_resource(ids.app_theme, false, 0), Err(ResolveError::IsComplex(ids.app_theme)));
	let value = engine.get_resource(ids.app_theme, true, 0).unwrap();
	assert_eq!(value.value, Value::reference(ids.app_theme));

	let resolved = engine.resolve_reference(value).unwrap();
	assert_eq!(resolved.value, Value::reference(ids.app_theme));
}

#[test]
fn references_are_followed() {
	let mut pkg = PackageBuilder::new("com.example", 0x7f);
	let d = Config::default();
	let c = pkg.value("integer", "c", &d, Value::int(3));
	let b = pkg.value("integer", "b", &d, Value::reference(c));
	let a = pkg.value("integer", "a", &d, Value::reference(b));
	pkg.value("integer", "c", &fr(), Value::int(4));
	let engine = engine(vec![bundle("/app.apk", pkg)], fr());

	let resolved = engine.resolve_reference(engine.get_resource(a, false, 0).unwrap()).unwrap();
	assert_eq!(resolved.value, Value::int(4));
	assert_eq!(resolved.resid, c);
	assert_eq!(resolved.flags, ConfigAxes::LOCALE);

	let null = SelectedValue::new(Value::reference(ResId::NONE));
	assert_eq!(engine.resolve_reference(null.clone()), Ok(null));
}

#[test]
fn reference_cycle_terminates() {
	let mut pkg = PackageBuilder::new("com.example", 0x7f);
	let d = Config::default();
	let y = pkg.declare("integer", "y");
	let x = pkg.value("integer", "x", &d, Value::reference(y));
	pkg.value("integer", "y", &d, Value::reference(x));
	let engine = engine(vec![bundle("/app.apk", pkg)], d);

	let resolved = engine.resolve_reference(engine.get_resource(x, false, 0).unwrap()).unwrap();
	assert_eq!(resolved.value.kind, ValueKind::Reference);
}

#[test]
fn dynamic_references_are_rewritten() {
	let mut lib = PackageBuilder::new("com.lib", 0);
	let color = lib.value("color", "c", &Config::default(), Value::color(0xff12_3456));

	let mut app = PackageBuilder::new("com.example", 0x7f);
	app.references("com.lib", 0x09);
	let alias = app.value("color", "alias", &Config::default(), Value::dynamic_reference(color.with_package(0x09)));

	let engine = engine(vec![bundle("/app.apk", app), bundle("/lib.apk", lib)], Config::default());
	let value = engine.get_resource(alias, false, 0).unwrap();
	assert_eq!(value.value, Value::reference(color.with_package(0x02)));
	assert_eq!(engine.resolve_reference(value).unwrap().value, Value::color(0xff12_3456));
}

fn overlay_package() -> (PackageBuilder, ResId) {
	let mut pkg = PackageBuilder::new("com.example.app.overlay", 0x7f);
	let id = pkg.value("string", "hello", &Config::default(), "overlaid");
	(pkg, id)
}

#[test]
fn overlay_replaces_equal_config() {
	let (pkg, ids) = app_package();
	let (o, replacement) = overlay_package();
	let bundles = vec![
		bundle("/app.apk", pkg),
		overlay("/overlay.apk", IdMapBuilder::new("/app.apk", 0x7f).map(ids.hello, replacement), o),
	];

	let default = engine(bundles.clone(), Config::default());
	let value = default.get_resource(ids.hello, false, 0).unwrap();
	assert_eq!(value.cookie, Some(crate::Cookie(1)));
	assert_eq!(string_of(&default, ids.hello), "overlaid");
	assert_eq!(default.resource_name(ids.hello).unwrap().to_string(), "com.example.app:string/hello");

	// The target's French value is more specific than the overlay's default.
	let french = engine(bundles, fr());
	assert_eq!(string_of(&french, ids.hello), "bonjour");
}

#[test]
fn ignore_mode_still_applies_overlays() {
	let (pkg, ids) = app_package();
	let (o, replacement) = overlay_package();
	let bundles = vec![
		bundle("/app.apk", pkg),
		overlay("/overlay.apk", IdMapBuilder::new("/app.apk", 0x7f).map(ids.hello, replacement), o),
	];
	let engine = engine(bundles, Config::default());

	let normal = engine.resolve(ids.hello, 0, false).unwrap();
	let ignored = engine.resolve(ids.hello, 0, true).unwrap();
	assert_eq!(ignored.cookie, normal.cookie);
	assert_eq!(ignored.cookie, crate::Cookie(1));
	assert_eq!(ignored.origin.cookie, crate::Cookie(0));
	assert_eq!(engine.resource_name(ids.hello).unwrap().to_string(), "com.example.app:string/hello");
}

#[test]
fn ignore_mode_takes_last_package_that_defines_the_entry() {
	let mut base = PackageBuilder::new("com.example", 0x7f);
	let shared = base.value("string", "shared", &fr(), "base");
	let base_only = base.value("string", "base_only", &Config::default(), "only");
	let mut split = PackageBuilder::new("com.example", 0x7f);
	split.value("string", "shared", &Config::default(), "split");
	let engine = engine(vec![bundle("/base.apk", base), bundle("/split.apk", split)], fr());

	// The best match still comes from the more specific base config.
	assert_eq!(engine.resolve(shared, 0, false).unwrap().cookie, crate::Cookie(0));

	let ignored = engine.resolve(shared, 0, true).unwrap();
	assert_eq!(ignored.cookie, crate::Cookie(1));
	assert_eq!(ignored.config, Config::default());
	assert_eq!(engine.resolve(base_only, 0, true).unwrap().cookie, crate::Cookie(0));
}

#[test]
fn inline_overlay_values_apply() {
	let (pkg, ids) = app_package();
	let (o, _) = overlay_package();
	let idmap = IdMapBuilder::new("/app.apk", 0x7f)
		.inline(ids.text_size, Config::default(), Value::int(20))
		.inline(ids.text_size, fr(), Value::int(22));
	let bundles = vec![bundle("/app.apk", pkg), overlay("/overlay.apk", idmap, o)];

	let default = engine(bundles.clone(), Config::default());
	assert_eq!(default.get_resource(ids.text_size, false, 0).unwrap().value, Value::int(20));
	let french = engine(bundles, fr());
	let value = french.get_resource(ids.text_size, false, 0).unwrap();
	assert_eq!(value.value, Value::int(22));
	assert_eq!(value.cookie, Some(crate::Cookie(1)));
}

#[test]
fn loader_result_is_not_overlaid() {
	let (pkg, ids) = app_package();
	let (loaded, _) = app_package();
	let (o, replacement) = overlay_package();
	let bundles = vec![
		bundle("/app.apk", pkg),
		Arc::new(BundleBuilder::new("/loader.apk").loader().package(loaded).build().unwrap()),
		overlay("/overlay.apk", IdMapBuilder::new("/app.apk", 0x7f).map(ids.hello, replacement), o),
	];
	let engine = engine(bundles, Config::default());

	let value = engine.get_resource(ids.hello, false, 0).unwrap();
	assert_eq!(value.cookie, Some(crate::Cookie(1)));
	assert_eq!(string_of(&engine, ids.hello), "hello");
}

#[test]
fn resolution_trace_lists_candidates() {
	let (pkg, ids) = app_package();
	let engine = engine(vec![bundle("/app.apk", pkg)], fr());
	assert_eq!(engine.last_resolution(), None);

	engine.set_resolution_logging(true);
	engine.get_resource(ids.hello, false, 0).unwrap();
	let trace = engine.last_resolution().unwrap();
	assert!(trace.starts_with("Resolution for 0x7f010000 com.example.app:string/hello"), "{trace}");
	assert!(trace.contains("\n\tFor config - fr"), "{trace}");
	assert!(trace.contains("\n\tFound initial: com.example.app (/app.apk)\n"), "{trace}");
	assert!(trace.ends_with("\n\tFound better: com.example.app (/app.apk) - fr"), "{trace}");

	engine.set_resolution_logging(false);
	assert_eq!(engine.last_resolution(), None);
}

fn universe() -> Vec<Config> {
	let mut configs = Vec::new();
	for language in [None, Some("fr"), Some("de")] {
		for night in [NightMode::Any, NightMode::Yes, NightMode::No] {
			let mut config = Config::default().with_night_mode(night);
			if let Some(language) = language {
				config = config.with_locale(language, None);
			}
			configs.push(config);
		}
	}
	configs
}

fn resolve_with_order(order: &[usize], desired: &Config) -> Option<Value> {
	let configs = universe();
	let mut pkg = PackageBuilder::new("com.example", 0x7f);
	let id = pkg.declare("integer", "v");
	for &i in order {
		pkg.value("integer", "v", &configs[i], Value::int(i as i32));
	}
	let engine = engine(vec![bundle("/app.apk", pkg)], desired.clone());
	engine.get_resource(id, false, 0).ok().map(|v| v.value)
}

proptest! {
	#[test]
	fn prop_best_match_ignores_declaration_order(
		order in Just((0..9usize).collect::<Vec<_>>()).prop_shuffle(),
		take in 1..=9usize,
		desired in 0..9usize,
	) {
		let chosen = &order[..take];
		let reversed: Vec<usize> = chosen.iter().rev().copied().collect();
		let desired = &universe()[desired];
		prop_assert_eq!(resolve_with_order(chosen, desired), resolve_with_order(&reversed, desired));
	}
}
