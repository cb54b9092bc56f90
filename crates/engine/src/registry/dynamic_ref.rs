use std::sync::Arc;

use restable_primitives::{APP_PACKAGE_ID, ResId, SYSTEM_PACKAGE_ID, Value, ValueKind};
use rustc_hash::FxHashMap as HashMap;

use crate::bundle::IdMap;
use crate::error::ResolveError;

/// Rewrites ids inside an overlay's own values so that references to
/// overlaid resources land on the target resource.
#[derive(Debug, Clone)]
pub(crate) struct OverlayRewrite {
	pub(crate) idmap: Arc<IdMap>,
	/// Build-time id of the overlay package.
	pub(crate) overlay_build_id: u8,
	/// Runtime id of the target group.
	pub(crate) target_runtime_id: u8,
}

/// Per-group map from build-time package ids to runtime ids.
#[derive(Debug, Clone)]
pub struct DynamicRefTable {
	assigned_id: u8,
	app_as_lib: bool,
	/// Package name to the build-time id this group's packages use for it.
	entries: HashMap<Arc<str>, u8>,
	/// Build-time id to runtime id; 0 means unmapped.
	lookup: [u8; 256],
	overlay: Option<OverlayRewrite>,
}

impl DynamicRefTable {
	pub(crate) fn new(assigned_id: u8, app_as_lib: bool) -> Self {
		Self {
			assigned_id,
			app_as_lib,
			entries: HashMap::default(),
			lookup: [0; 256],
			overlay: None,
		}
	}

	pub fn assigned_id(&self) -> u8 {
		self.assigned_id
	}

	/// True for a dynamic package compiled with the application id.
	pub fn app_as_lib(&self) -> bool {
		self.app_as_lib
	}

	pub(crate) fn set_overlay(&mut self, overlay: OverlayRewrite) {
		self.overlay = Some(overlay);
	}

	/// Declares that this group refers to `name` by `build_id`.
	pub(crate) fn add_entry(&mut self, name: Arc<str>, build_id: u8) {
		self.entries.insert(name, build_id);
	}

	/// Binds `name` to its runtime id. Ignored unless this group declared a
	/// reference to `name`.
	pub(crate) fn add_mapping(&mut self, name: &str, runtime_id: u8) {
		if let Some(&build_id) = self.entries.get(name) {
			self.lookup[build_id as usize] = runtime_id;
		}
	}

	/// Non-zero build-to-runtime mappings, for dumps.
	pub fn mappings(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
		self.lookup
			.iter()
			.enumerate()
			.filter(|&(_, &r)| r != 0)
			.map(|(b, &r)| (b as u8, r))
	}

	/// Rewrites a build-time id to its runtime form.
	///
	/// - The null id and system ids pass through.
	/// - Application ids pass through unless the package is an app loaded as
	///   a library.
	/// - Package 0 (and application ids of app-as-lib packages) are local and
	///   become this group's assigned id.
	/// - Anything else goes through the lookup table; an unmapped id fails.
	pub fn lookup_resource_id(&self, id: ResId) -> Result<ResId, ResolveError> {
		if let Some(overlay) = &self.overlay
			&& id.package_id() == overlay.overlay_build_id
		{
			if let Some(target) = overlay.idmap.target_of(id) {
				return Ok(target.with_package(overlay.target_runtime_id));
			}
			return Ok(id.with_package(self.assigned_id));
		}
		self.lookup_no_overlay(id)
	}

	fn lookup_no_overlay(&self, id: ResId) -> Result<ResId, ResolveError> {
		if id.is_none() {
			return Ok(id);
		}
		let package_id = id.package_id();
		if package_id == SYSTEM_PACKAGE_ID || (package_id == APP_PACKAGE_ID && !self.app_as_lib) {
			return Ok(id);
		}
		if package_id == 0 || package_id == APP_PACKAGE_ID {
			return Ok(id.with_package(self.assigned_id));
		}
		match self.lookup[package_id as usize] {
			0 => Err(ResolveError::UnresolvedReference(id)),
			runtime => Ok(id.with_package(runtime)),
		}
	}

	/// Rewrites a value's embedded id. Dynamic kinds become their plain
	/// counterparts; plain references are rewritten only for app-as-lib
	/// packages; other kinds pass through.
	pub fn lookup_resource_value(&self, value: Value) -> Result<Value, ResolveError> {
		let kind = match value.kind {
			ValueKind::DynamicReference => ValueKind::Reference,
			ValueKind::DynamicAttribute => ValueKind::Attribute,
			ValueKind::Reference | ValueKind::Attribute if self.app_as_lib || self.overlay.is_some() => value.kind,
			_ => return Ok(value),
		};
		let id = self.lookup_resource_id(ResId(value.data))?;
		Ok(Value::new(kind, id.get()))
	}
}
