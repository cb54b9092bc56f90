//! Name lookups in both directions.

mod common;

use common::{bundle, engine};
use restable::{Config, PackageBuilder, ResId, Value};

#[test]
fn every_named_resource_round_trips() {
	let mut pkg = PackageBuilder::new("com.example", 0x7f);
	let d = Config::default();
	let mut ids: Vec<(ResId, String)> = Vec::new();
	for (type_name, entries) in [("string", &["app_name", "ok"][..]), ("attr", &["tint"][..]), ("color", &["red", "green", "blue"][..])] {
		for entry in entries {
			let id = pkg.value(type_name, entry, &d, Value::int(1));
			ids.push((id, format!("com.example:{type_name}/{entry}")));
		}
	}
	let mut lib = PackageBuilder::new("com.lib", 0);
	let lib_id = lib.value("string", "shared", &d, "shared");
	let engine = engine(vec![bundle("/lib.apk", lib), bundle("/app.apk", pkg)], d);
	ids.push((lib_id.with_package(0x02), "com.lib:string/shared".to_string()));

	for (id, name) in ids {
		assert_eq!(engine.resource_id_by_name(&name, None, None), Ok(id), "{name}");
		assert_eq!(engine.resource_name(id).unwrap().to_string(), name);
		assert_eq!(engine.resource_id_by_name(&format!("@{name}"), None, None), Ok(id));
	}
}

#[test]
fn fallbacks_fill_missing_parts() {
	let mut pkg = PackageBuilder::new("com.example", 0x7f);
	let red = pkg.value("color", "red", &Config::default(), Value::color(0xffff_0000));
	let engine = engine(vec![bundle("/app.apk", pkg)], Config::default());

	assert_eq!(engine.resource_id_by_name("red", Some("color"), Some("com.example")), Ok(red));
	assert_eq!(engine.resource_id_by_name("color/red", None, Some("com.example")), Ok(red));
	assert!(engine.resource_id_by_name("red", None, Some("com.example")).is_err());
}
