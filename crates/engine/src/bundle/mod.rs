//! Bundle store data model.
//!
//! # Purpose
//!
//! A [`Bundle`] is an immutable, load-once unit holding one or more
//! [`Package`]s. Entry tables live in a single byte arena owned by the bundle;
//! packages refer to them by byte range, and every read goes through the
//! bounds-checked decoder in [`chunk`].
//!
//! # Invariants
//!
//! - Bundles are never mutated after [`BundleBuilder::build`]. Engines sharing a
//!   bundle only share read-only data.
//! - A [`TypeConfig`] span always lies inside the arena; malformed bytes inside
//!   the span surface as [`crate::DecodeError`] and are treated as absent entries.
//! - A [`Cookie`] names a bundle by its position in one engine's load order. It
//!   never names a runtime package id.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use bytes::Bytes;
use restable_primitives::{Config, ConfigAxes, ResId};

pub(crate) mod builder;
pub(crate) mod chunk;
mod idmap;
mod pool;

pub use builder::{BuildValue, BundleBuilder, PackageBuilder};
pub use chunk::{EntryBody, MapHandle, RawEntry, TypeChunk};
pub use idmap::{IdMap, IdMapBuilder, IdMapTarget};
pub use pool::StringPool;

use crate::error::DecodeError;


/// Position of a bundle in an engine's load order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cookie(pub u32);

impl Cookie {
	#[inline]
	pub fn index(self) -> usize {
		self.0 as usize
	}
}

impl fmt::Display for Cookie {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

bitflags::bitflags! {
	/// Bundle roles.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct BundleFlags: u8 {
		/// Part of the base platform.
		const SYSTEM = 0x01;
		/// Supplies substitutions for another bundle through an id-map.
		const OVERLAY = 0x02;
		/// Attached at runtime; wins over equally specific candidates and is
		/// never itself overlaid.
		const LOADER = 0x04;
	}
}

/// One configuration-qualified entry table of a type.
#[derive(Debug, Clone)]
pub struct TypeConfig {
	pub config: Config,
	pub(crate) span: Range<usize>,
}

/// All configurations of one resource type within a package.
#[derive(Debug, Clone)]
pub struct TypeSpec {
	/// 0-based type index.
	pub type_index: u8,
	pub name_index: u32,
	/// Per entry: axes its variants differ on.
	pub entry_flags: Vec<ConfigAxes>,
	pub configs: Vec<TypeConfig>,
}

impl TypeSpec {
	pub fn flags_for(&self, entry: u16) -> ConfigAxes {
		self.entry_flags.get(entry as usize).copied().unwrap_or_default()
	}
}

/// A named collection of typed resource tables sharing a build-time id.
#[derive(Debug, Clone)]
pub struct Package {
	pub(crate) name: Arc<str>,
	pub(crate) build_id: u8,
	pub(crate) dynamic: bool,
	/// Indexed by 0-based type index.
	pub(crate) type_specs: Vec<Option<TypeSpec>>,
	pub(crate) type_names: StringPool,
	pub(crate) key_names: StringPool,
	/// Referenced shared packages: name to the build-time id used for them.
	pub(crate) dynamic_package_map: Vec<(Arc<str>, u8)>,
}

impl Package {
	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn build_id(&self) -> u8 {
		self.build_id
	}

	/// True when the runtime id is assigned at load time.
	pub fn is_dynamic(&self) -> bool {
		self.dynamic
	}

	pub fn type_spec(&self, type_index: u8) -> Option<&TypeSpec> {
		self.type_specs.get(type_index as usize)?.as_ref()
	}

	pub fn type_specs(&self) -> impl Iterator<Item = &TypeSpec> {
		self.type_specs.iter().flatten()
	}

	pub fn type_name(&self, type_index: u8) -> Option<&str> {
		let spec = self.type_spec(type_index)?;
		self.type_names.get(spec.name_index)
	}

	pub fn key_name(&self, key: u32) -> Option<&str> {
		self.key_names.get(key)
	}

	pub fn dynamic_package_map(&self) -> &[(Arc<str>, u8)] {
		&self.dynamic_package_map
	}

	/// Finds the entry id of `type_name/entry_name`, as a build-time id.
	pub(crate) fn find_entry_by_name(&self, arena: &Bytes, type_name: &str, entry_name: &str) -> Option<ResId> {
		let key = self.key_names.position(entry_name)?;
		let spec = self.type_specs().find(|spec| self.type_names.get(spec.name_index) == Some(type_name))?;
		for config in &spec.configs {
			let chunk = match chunk_at(arena, &config.span) {
				Ok(chunk) => chunk,
				Err(err) => {
					tracing::warn!(package = %self.name, type_name, error = %err, "skipping corrupt entry table");
					continue;
				}
			};
			if let Some((index, _)) = chunk.keys().find(|&(_, k)| k == key) {
				return Some(ResId::new(self.build_id, spec.type_index + 1, index));
			}
		}
		None
	}
}

pub(crate) fn chunk_at(arena: &Bytes, span: &Range<usize>) -> Result<TypeChunk, DecodeError> {
	if span.start > span.end || span.end > arena.len() {
		return Err(DecodeError::Truncated {
			offset: span.start,
			needed: span.end.saturating_sub(span.start),
			len: arena.len(),
		});
	}
	TypeChunk::parse(arena.slice(span.clone()))
}

/// An immutable, load-once resource bundle.
#[derive(Debug, Clone)]
pub struct Bundle {
	pub(crate) path: Arc<str>,
	pub(crate) flags: BundleFlags,
	pub(crate) packages: Vec<Package>,
	pub(crate) strings: StringPool,
	pub(crate) idmap: Option<Arc<IdMap>>,
	pub(crate) arena: Bytes,
}

impl Bundle {
	/// Stable identity used for overlay targeting and theme transplantation.
	pub fn path(&self) -> &str {
		&self.path
	}

	pub fn flags(&self) -> BundleFlags {
		self.flags
	}

	pub fn is_overlay(&self) -> bool {
		self.flags.contains(BundleFlags::OVERLAY)
	}

	pub fn is_loader(&self) -> bool {
		self.flags.contains(BundleFlags::LOADER)
	}

	pub fn is_system(&self) -> bool {
		self.flags.contains(BundleFlags::SYSTEM)
	}

	pub fn packages(&self) -> &[Package] {
		&self.packages
	}

	pub fn strings(&self) -> &StringPool {
		&self.strings
	}

	pub fn idmap(&self) -> Option<&IdMap> {
		self.idmap.as_deref()
	}

	pub(crate) fn shared_idmap(&self) -> Option<&Arc<IdMap>> {
		self.idmap.as_ref()
	}

	/// Opens the entry table of `config`.
	pub fn chunk(&self, config: &TypeConfig) -> Result<TypeChunk, DecodeError> {
		chunk_at(&self.arena, &config.span)
	}

	pub(crate) fn arena(&self) -> &Bytes {
		&self.arena
	}
}
