use std::collections::BTreeSet;
use std::fmt::{self, Write as _};
use std::sync::Arc;

use restable_primitives::{Config, ResId, Value, ValueKind};

use crate::ResourceEngine;
use crate::bundle::{Bundle, Cookie};
use crate::error::ResolveError;

/// `package:type/entry` name of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceName {
	pub package: Arc<str>,
	pub type_name: Arc<str>,
	pub entry: Arc<str>,
}

impl fmt::Display for ResourceName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}/{}", self.package, self.type_name, self.entry)
	}
}

const PRIVATE_ATTR_TYPE: &str = "^attr-private";

impl ResourceEngine {
	/// Names `id` after the package that defines it. Overlays do not rename.
	pub fn resource_name(&self, id: ResId) -> Result<ResourceName, ResolveError> {
		let entry = self.find_entry(id, 0, true, None)?;
		let origin = entry.origin;
		let package = &self.bundles[origin.cookie.index()].packages[origin.package_index];
		let type_name = package
			.type_spec(origin.type_index)
			.and_then(|spec| package.type_names.get_arc(spec.name_index))
			.ok_or(ResolveError::NoEntry(id))?;
		let entry_name = package.key_names.get_arc(origin.key).ok_or(ResolveError::NoEntry(id))?;

		Ok(ResourceName {
			package: package.name.clone(),
			type_name: type_name.clone(),
			entry: entry_name.clone(),
		})
	}

	/// Runtime id of `package:type/entry`.
	///
	/// A miss on type `attr` retries the private attribute type.
	pub fn resource_id(&self, package: &str, type_name: &str, entry: &str) -> Result<ResId, ResolveError> {
		for group in self.registry.groups() {
			for configured in &group.packages {
				let bundle = &self.bundles[configured.cookie.index()];
				let candidate = &bundle.packages[configured.package_index];
				if candidate.name() != package {
					break;
				}
				let found = candidate.find_entry_by_name(bundle.arena(), type_name, entry).or_else(|| {
					(type_name == "attr")
						.then(|| candidate.find_entry_by_name(bundle.arena(), PRIVATE_ATTR_TYPE, entry))
						.flatten()
				});
				if let Some(id) = found {
					return Ok(id.with_package(group.id));
				}
			}
		}
		Err(ResolveError::UnknownName(format!("{package}:{type_name}/{entry}")))
	}

	/// Parses `[@][package:]type/entry` and looks it up. Missing parts fall
	/// back to `default_type` and `default_package`.
	pub fn resource_id_by_name(&self, name: &str, default_type: Option<&str>, default_package: Option<&str>) -> Result<ResId, ResolveError> {
		let bare = name.strip_prefix('@').unwrap_or(name);
		let (package, rest) = match bare.split_once(':') {
			Some((package, rest)) => (Some(package).filter(|p| !p.is_empty()), rest),
			None => (None, bare),
		};
		let (type_name, entry) = match rest.split_once('/') {
			Some((type_name, entry)) => (Some(type_name).filter(|t| !t.is_empty()), entry),
			None => (None, rest),
		};

		let bad = || ResolveError::BadName(name.to_string());
		let package = package.or(default_package).ok_or_else(bad)?;
		let type_name = type_name.or(default_type).ok_or_else(bad)?;
		if entry.is_empty() {
			return Err(bad());
		}
		self.resource_id(package, type_name, entry)
	}

	/// Returns the string a `String` value points at in its bundle's pool.
	pub fn string(&self, cookie: Cookie, value: Value) -> Option<&str> {
		if value.kind != ValueKind::String {
			return None;
		}
		self.bundle(cookie)?.strings.get(value.data)
	}

	fn is_system_overlay(&self, bundle: &Bundle) -> bool {
		bundle.is_overlay()
			&& bundle
				.idmap()
				.is_some_and(|idmap| self.bundles.iter().any(|b| b.is_system() && b.path() == idmap.target_path()))
	}

	fn is_excluded(&self, bundle: &Bundle, exclude_system: bool) -> bool {
		exclude_system && (bundle.is_system() || self.is_system_overlay(bundle))
	}

	/// Every configuration any registered package defines a type in.
	pub fn resource_configurations(&self, exclude_system: bool, exclude_mipmap: bool) -> BTreeSet<Config> {
		let mut configs = BTreeSet::new();
		for group in self.registry.groups() {
			for configured in &group.packages {
				let bundle = &self.bundles[configured.cookie.index()];
				if self.is_excluded(bundle, exclude_system) {
					continue;
				}
				let package = &bundle.packages[configured.package_index];
				for spec in package.type_specs() {
					if exclude_mipmap && package.type_name(spec.type_index) == Some("mipmap") {
						continue;
					}
					configs.extend(spec.configs.iter().map(|c| c.config.clone()));
				}
			}
		}
		configs
	}

	/// Every locale tag any registered package defines a value for.
	pub fn resource_locales(&self, exclude_system: bool) -> BTreeSet<String> {
		let mut locales = BTreeSet::new();
		for group in self.registry.groups() {
			for configured in &group.packages {
				let bundle = &self.bundles[configured.cookie.index()];
				if self.is_excluded(bundle, exclude_system) {
					continue;
				}
				let package = &bundle.packages[configured.package_index];
				locales.extend(package.type_specs().flat_map(|spec| spec.configs.iter().filter_map(|c| c.config.locale_tag())));
			}
		}
		locales
	}

	/// Paths of overlay bundles whose target is not a system bundle.
	pub fn non_system_overlay_paths(&self) -> Vec<Arc<str>> {
		self.bundles
			.iter()
			.filter(|b| b.is_overlay() && !self.is_system_overlay(b))
			.map(|b| b.path.clone())
			.collect()
	}

	/// Describes the loaded packages and their overlays. The text is also
	/// emitted at info level.
	pub fn dump(&self) -> String {
		let mut out = format!("ResourceEngine {:?} config [{}]", self.id(), self.configuration);
		for (i, bundle) in self.bundles.iter().enumerate() {
			let _ = write!(out, "\n  bundle {i}: {} ({:?})", bundle.path(), bundle.flags());
		}
		for (id, group_index) in self.registry.package_ids() {
			let group = &self.registry.groups()[group_index];
			let _ = write!(out, "\n  package 0x{id:02x} {}:", group.name());
			for configured in &group.packages {
				let bundle = &self.bundles[configured.cookie.index()];
				let package = &bundle.packages[configured.package_index];
				let _ = write!(
					out,
					"\n    {} (cookie {}, build id 0x{:02x}{})",
					bundle.path(),
					configured.cookie,
					package.build_id(),
					if configured.is_loader { ", loader" } else { "" }
				);
			}
			for overlay in &group.overlays {
				let path = self.bundle(overlay.cookie).map_or("?", |b| b.path());
				let _ = write!(out, "\n    overlay {path} (cookie {})", overlay.cookie);
			}
		}
		for diagnostic in self.registry.diagnostics() {
			let _ = write!(out, "\n  note: {diagnostic}");
		}
		tracing::info!("{out}");
		out
	}
}
