//! Copying a theme between engines whose bundle lists differ.

use restable_primitives::{ResId, SYSTEM_PACKAGE_ID, Value, ValueKind};
use rustc_hash::FxHashMap as HashMap;

use super::{Theme, ThemeEntry};
use crate::ResourceEngine;
use crate::bundle::Cookie;

/// Source cookie to destination cookie, with each bundle's runtime package
/// id mapping.
#[derive(Debug, Default)]
struct BundleMap {
	cookies: HashMap<Cookie, Cookie>,
	package_ids: HashMap<Cookie, HashMap<u8, u8>>,
}

impl BundleMap {
	fn build(src: &ResourceEngine, dest: &ResourceEngine) -> Self {
		let mut map = Self::default();
		for (i, src_bundle) in src.bundles().iter().enumerate() {
			let src_cookie = Cookie(i as u32);
			let Some(j) = dest.bundles().iter().position(|b| b.path() == src_bundle.path()) else {
				continue;
			};
			let dest_cookie = Cookie(j as u32);
			let dest_bundle = &dest.bundles()[j];
			if src_bundle.packages().len() != dest_bundle.packages().len() {
				tracing::warn!(path = src_bundle.path(), "bundle has a different package list in the destination engine");
			}

			let mut ids = HashMap::default();
			for (p, (a, b)) in src_bundle.packages().iter().zip(dest_bundle.packages()).enumerate() {
				if a.name() != b.name() {
					continue;
				}
				if let (Some(from), Some(to)) = (src.registry().assigned_id(src_cookie, p), dest.registry().assigned_id(dest_cookie, p)) {
					ids.insert(from, to);
				}
			}
			map.cookies.insert(src_cookie, dest_cookie);
			map.package_ids.insert(src_cookie, ids);
		}
		map
	}

	fn package_id(&self, cookie: Cookie, package_id: u8) -> Option<u8> {
		self.package_ids.get(&cookie)?.get(&package_id).copied()
	}
}

/// Rebuilds `dest` from `src`, translating ids from `src_engine`'s runtime
/// package ids to `dest_engine`'s.
pub(super) fn transplant(dest: &mut Theme, dest_engine: &ResourceEngine, src: &Theme, src_engine: &ResourceEngine) {
	let map = BundleMap::build(src_engine, dest_engine);
	dest.type_flags = src.type_flags;
	dest.packages.clear();
	let mut dropped = 0usize;

	for (attr, entry) in src.entries() {
		match translate(&map, src_engine, attr, entry) {
			Some((attr, translated)) => *dest.slot_mut(attr) = translated,
			None => dropped += 1,
		}
	}
	tracing::debug!(dropped, "transplanted theme across engines");
}

fn translate(map: &BundleMap, src_engine: &ResourceEngine, attr: ResId, entry: &ThemeEntry) -> Option<(ResId, ThemeEntry)> {
	let is_reference = entry.value.is_reference_like();
	let mut data = entry.value.data;

	if is_reference {
		let target = ResId(data);
		let package_id = map.package_id(entry.cookie?, target.package_id())?;
		data = target.with_package(package_id).get();
	}

	let cookie = match entry.cookie.and_then(|c| map.cookies.get(&c)) {
		Some(&c) => Some(c),
		None if is_reference || entry.value.kind == ValueKind::String => return None,
		None => None,
	};

	let mut attr = attr;
	if attr.package_id() != SYSTEM_PACKAGE_ID {
		let defining = src_engine.find_entry(attr, 0, true, None).ok()?;
		attr = attr.with_package(map.package_id(defining.origin.cookie, attr.package_id())?);
	}

	Some((
		attr,
		ThemeEntry {
			cookie,
			type_flags: entry.type_flags,
			value: Value::new(entry.value.kind, data),
		},
	))
}
