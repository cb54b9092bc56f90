use pretty_assertions::assert_eq;
use restable_primitives::{Config, ConfigAxes, ResId, Value, ValueKind};

use super::*;
use crate::bundle::{BuildValue, PackageBuilder};
use crate::resolve::SelectedValue;
use crate::test_fixtures::{app_package, bundle, engine, fr};

#[test]
fn applied_style_includes_parent_items() {
	let (pkg, ids) = app_package();
	let engine = engine(vec![bundle("/app.apk", pkg)], Config::default());
	let mut theme = engine.new_theme();
	theme.apply_style(&engine, ids.app_theme, false).unwrap();

	assert_eq!(theme.attribute(ids.color_primary).unwrap().value, Value::color(0xff11_2233));
	assert_eq!(theme.attribute(ids.text_size).unwrap().value, Value::int(14));
	assert_eq!(theme.attribute(ids.color_accent).unwrap().cookie, Some(Cookie(0)));
	assert!(theme.attribute(ids.hello).is_none());
}

#[test]
fn unforced_apply_keeps_existing_values() {
	let (pkg, ids) = app_package();
	let engine = engine(vec![bundle("/app.apk", pkg)], Config::default());
	let mut theme = engine.new_theme();
	theme.apply_style(&engine, ids.app_theme, false).unwrap();

	theme.apply_style(&engine, ids.base_theme, false).unwrap();
	assert_eq!(theme.attribute(ids.color_primary).unwrap().value, Value::color(0xff11_2233));

	theme.apply_style(&engine, ids.base_theme, true).unwrap();
	assert_eq!(theme.attribute(ids.color_primary).unwrap().value, Value::color(0xff00_0000));
	assert_eq!(theme.attribute(ids.color_accent).unwrap().value, Value::color(0xff44_5566));
}

#[test]
fn long_attribute_chain_is_cut_off() {
	let mut pkg = PackageBuilder::new("com.example", 0x7f);
	let d = Config::default();
	let attrs: Vec<ResId> = (0..26).map(|i| pkg.value("attr", &format!("a{i}"), &d, Value::int(0))).collect();
	let mut items: Vec<(ResId, Value)> = attrs.windows(2).map(|w| (w[0], Value::attribute(w[1]))).collect();
	items.push((attrs[25], Value::int(7)));
	let style = pkg.bag("style", "Chain", &d, None, items);
	let engine = engine(vec![bundle("/app.apk", pkg)], d);

	let mut theme = engine.new_theme();
	theme.apply_style(&engine, style, false).unwrap();
	assert_eq!(theme.attribute(attrs[0]), None);
	assert_eq!(theme.attribute(attrs[5]).map(|v| v.value), Some(Value::int(7)));
}

#[test]
fn empty_marker_is_a_value_and_null_is_vacant() {
	let mut pkg = PackageBuilder::new("com.example", 0x7f);
	let d = Config::default();
	let x = pkg.value("attr", "x", &d, Value::int(0));
	let y = pkg.value("attr", "y", &d, Value::int(0));
	let first = pkg.bag("style", "First", &d, None, [(x, Value::empty()), (y, Value::null())]);
	let second = pkg.bag("style", "Second", &d, None, [(x, Value::int(1)), (y, Value::int(2))]);
	let engine = engine(vec![bundle("/app.apk", pkg)], d);

	let mut theme = engine.new_theme();
	theme.apply_style(&engine, first, false).unwrap();
	assert_eq!(theme.attribute(x).map(|v| v.value), Some(Value::empty()));
	assert_eq!(theme.attribute(y), None);

	theme.apply_style(&engine, second, false).unwrap();
	assert_eq!(theme.attribute(x).map(|v| v.value), Some(Value::empty()));
	assert_eq!(theme.attribute(y).map(|v| v.value), Some(Value::int(2)));
}

#[test]
fn attribute_reference_resolves_through_engine() {
	let (pkg, ids) = app_package();
	let engine = engine(vec![bundle("/app.apk", pkg)], Config::default());
	let mut theme = engine.new_theme();
	theme.apply_style(&engine, ids.app_theme, false).unwrap();

	let resolved = theme
		.resolve_attribute_reference(&engine, SelectedValue::new(Value::attribute(ids.window_bg)))
		.unwrap();
	assert_eq!(resolved.value, Value::color(0xffff_0000));
	assert_eq!(resolved.resid, ids.red);

	let missing = theme.resolve_attribute_reference(&engine, SelectedValue::new(Value::attribute(ids.hello)));
	assert_eq!(missing, Err(ResolveError::NoEntry(ids.hello)));
}

#[test]
fn theme_flags_accumulate_from_styles() {
	let mut pkg = PackageBuilder::new("com.example", 0x7f);
	let d = Config::default();
	let x = pkg.value("attr", "x", &d, Value::int(0));
	let style = pkg.bag("style", "S", &d, None, [(x, Value::int(1))]);
	pkg.bag("style", "S", &fr(), None, [(x, Value::int(2))]);
	let engine = engine(vec![bundle("/app.apk", pkg)], fr());

	let mut theme = engine.new_theme();
	theme.apply_style(&engine, style, false).unwrap();
	assert_eq!(theme.type_flags(), ConfigAxes::LOCALE);
	let value = theme.attribute(x).unwrap();
	assert_eq!(value.value, Value::int(2));
	assert_eq!(value.flags, ConfigAxes::LOCALE);

	theme.clear();
	assert_eq!(theme.type_flags(), ConfigAxes::empty());
	assert!(theme.attribute(x).is_none());
}

#[test]
fn foreign_engine_is_rejected() {
	let (pkg, ids) = app_package();
	let a = engine(vec![bundle("/app.apk", pkg)], Config::default());
	let (pkg, _) = app_package();
	let b = engine(vec![bundle("/app.apk", pkg)], Config::default());

	let mut theme = a.new_theme();
	assert_eq!(theme.apply_style(&b, ids.app_theme, false), Err(ResolveError::EngineMismatch));
	let other = b.new_theme();
	assert_eq!(theme.set_to(&a, &other, &a), Err(ResolveError::EngineMismatch));
}

#[test]
fn set_to_within_one_engine_copies() {
	let (pkg, ids) = app_package();
	let engine = engine(vec![bundle("/app.apk", pkg)], Config::default());
	let mut source = engine.new_theme();
	source.apply_style(&engine, ids.app_theme, false).unwrap();

	let mut copy = engine.new_theme();
	copy.set_to(&engine, &source, &engine).unwrap();
	assert_eq!(copy, source);
	assert!(copy.dump().contains(&ids.color_accent.to_string()));
}

struct LibIds {
	a: ResId,
	b: ResId,
	s: ResId,
	color: ResId,
	theme: ResId,
}

fn lib_package() -> (PackageBuilder, LibIds) {
	let mut lib = PackageBuilder::new("com.lib", 0);
	let d = Config::default();
	let a = lib.value("attr", "a", &d, Value::int(0));
	let b = lib.value("attr", "b", &d, Value::int(0));
	let s = lib.value("attr", "s", &d, Value::int(0));
	let color = lib.value("color", "c", &d, Value::color(0xff00_ff00));
	let theme = lib.bag("style", "LibTheme", &d, None, [(a, Value::dynamic_reference(color))]);
	(lib, LibIds { a, b, s, color, theme })
}

#[test]
fn set_to_across_engines_remaps_ids() {
	let (lib, ids) = lib_package();
	let mut extra = PackageBuilder::new("com.extra", 0x7f);
	extra.references("com.lib", 0x05);
	let d = Config::default();
	let extra_theme = extra.bag(
		"style",
		"Extra",
		&d,
		None,
		[(ids.b.with_package(0x05), BuildValue::from(Value::int(5))), (ids.s.with_package(0x05), BuildValue::from("text"))],
	);
	let lib = bundle("/lib.apk", lib);
	let src = engine(vec![lib, bundle("/extra.apk", extra)], d.clone());

	let (lib_again, _) = lib_package();
	let mut other = PackageBuilder::new("com.other", 0);
	other.value("string", "o", &d, "o");
	let dest = engine(vec![bundle("/other.apk", other), bundle("/lib.apk", lib_again)], d);

	let mut theme = src.new_theme();
	theme.apply_style(&src, ids.theme.with_package(0x02), false).unwrap();
	theme.apply_style(&src, extra_theme, false).unwrap();
	assert_eq!(theme.attribute(ids.s.with_package(0x02)).unwrap().value.kind, ValueKind::String);

	let mut copy = dest.new_theme();
	copy.set_to(&dest, &theme, &src).unwrap();

	let a = copy.entry(ids.a.with_package(0x03)).unwrap();
	assert_eq!(a.value, Value::reference(ids.color.with_package(0x03)));
	assert_eq!(a.cookie, Some(Cookie(1)));

	let b = copy.entry(ids.b.with_package(0x03)).unwrap();
	assert_eq!(b.value, Value::int(5));
	assert_eq!(b.cookie, None);

	assert_eq!(copy.attribute(ids.s.with_package(0x03)), None);
	assert!(copy.entry(ids.a.with_package(0x02)).is_none());

	let resolved = copy
		.resolve_attribute_reference(&dest, SelectedValue::new(Value::attribute(ids.a.with_package(0x03))))
		.unwrap();
	assert_eq!(resolved.value, Value::color(0xff00_ff00));
}
