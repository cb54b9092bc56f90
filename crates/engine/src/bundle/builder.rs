//! In-memory bundle assembly.
//!
//! Types and entries get ids in order of first appearance, so the id a
//! builder method returns is the id the finished bundle serves it under.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::BytesMut;
use restable_primitives::{Config, ConfigAxes, ResId, Value};
use rustc_hash::FxHashMap as HashMap;

use super::chunk::{EncodedEntry, encode_chunk};
use super::idmap::IdMapBuilder;
use super::pool::StringPoolBuilder;
use super::{Bundle, BundleFlags, Package, TypeConfig, TypeSpec};
use crate::error::BuildError;

/// A value as written by a builder. Strings are interned into the bundle's
/// pool when the bundle is built.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildValue {
	Value(Value),
	Str(String),
}

impl From<Value> for BuildValue {
	fn from(v: Value) -> Self {
		Self::Value(v)
	}
}

impl From<&str> for BuildValue {
	fn from(s: &str) -> Self {
		Self::Str(s.to_string())
	}
}

impl From<String> for BuildValue {
	fn from(s: String) -> Self {
		Self::Str(s)
	}
}

impl BuildValue {
	fn encode(&self, strings: &mut StringPoolBuilder) -> Value {
		match self {
			Self::Value(v) => *v,
			Self::Str(s) => Value::string(strings.intern(s)),
		}
	}
}

#[derive(Debug, Clone)]
enum DraftBody {
	Value(BuildValue),
	Bag { parent: ResId, items: Vec<(ResId, BuildValue)> },
}

#[derive(Debug, Default)]
struct TypeDraft {
	name: String,
	entries: Vec<String>,
	entry_ids: HashMap<String, u16>,
	configs: Vec<(Config, BTreeMap<u16, DraftBody>)>,
}

/// Assembles one [`Package`].
#[derive(Debug)]
pub struct PackageBuilder {
	name: String,
	id: u8,
	dynamic: bool,
	types: Vec<TypeDraft>,
	type_ids: HashMap<String, u8>,
	references: Vec<(String, u8)>,
	error: Option<BuildError>,
}

impl PackageBuilder {
	/// Starts a package with build-time id `id`. Id 0 declares a shared
	/// library whose runtime id is assigned at load time.
	pub fn new(name: impl Into<String>, id: u8) -> Self {
		Self {
			name: name.into(),
			id,
			dynamic: id == 0,
			types: Vec::new(),
			type_ids: HashMap::default(),
			references: Vec::new(),
			error: None,
		}
	}

	/// Marks the package as dynamic while keeping its declared id.
	pub fn dynamic(&mut self) -> &mut Self {
		self.dynamic = true;
		self
	}

	/// Records that values in this package refer to the shared package `name`
	/// using build-time id `build_id`.
	pub fn references(&mut self, name: impl Into<String>, build_id: u8) -> &mut Self {
		self.references.push((name.into(), build_id));
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn id_of(&self, type_name: &str, entry: &str) -> Option<ResId> {
		let type_index = *self.type_ids.get(type_name)?;
		let entry_index = *self.types[type_index as usize].entry_ids.get(entry)?;
		Some(ResId::new(self.id, type_index + 1, entry_index))
	}

	/// Reserves an id for `type_name/entry` without defining a value.
	pub fn declare(&mut self, type_name: &str, entry: &str) -> ResId {
		self.slot(type_name, entry).map(|(t, e)| ResId::new(self.id, t + 1, e)).unwrap_or(ResId::NONE)
	}

	/// Defines a scalar entry for `config`.
	pub fn value(&mut self, type_name: &str, entry: &str, config: &Config, value: impl Into<BuildValue>) -> ResId {
		self.define(type_name, entry, config, DraftBody::Value(value.into()))
	}

	/// Defines a bag entry for `config`. Items are kept in the given order.
	pub fn bag<V: Into<BuildValue>>(
		&mut self,
		type_name: &str,
		entry: &str,
		config: &Config,
		parent: Option<ResId>,
		items: impl IntoIterator<Item = (ResId, V)>,
	) -> ResId {
		let items = items.into_iter().map(|(k, v)| (k, v.into())).collect();
		self.define(
			type_name,
			entry,
			config,
			DraftBody::Bag {
				parent: parent.unwrap_or(ResId::NONE),
				items,
			},
		)
	}

	fn fail(&mut self, err: BuildError) {
		self.error.get_or_insert(err);
	}

	fn slot(&mut self, type_name: &str, entry: &str) -> Option<(u8, u16)> {
		let type_index = match self.type_ids.get(type_name) {
			Some(&t) => t,
			None => {
				if self.types.len() >= u8::MAX as usize {
					self.fail(BuildError::TooManyTypes {
						package: self.name.clone(),
					});
					return None;
				}
				let t = self.types.len() as u8;
				self.types.push(TypeDraft {
					name: type_name.to_string(),
					..TypeDraft::default()
				});
				self.type_ids.insert(type_name.to_string(), t);
				t
			}
		};
		let draft = &mut self.types[type_index as usize];
		let entry_index = match draft.entry_ids.get(entry) {
			Some(&e) => e,
			None => {
				if draft.entries.len() > u16::MAX as usize {
					let err = BuildError::TooManyEntries {
						package: self.name.clone(),
						type_name: type_name.to_string(),
					};
					self.fail(err);
					return None;
				}
				let e = draft.entries.len() as u16;
				draft.entries.push(entry.to_string());
				draft.entry_ids.insert(entry.to_string(), e);
				e
			}
		};
		Some((type_index, entry_index))
	}

	fn define(&mut self, type_name: &str, entry: &str, config: &Config, body: DraftBody) -> ResId {
		let Some((t, e)) = self.slot(type_name, entry) else {
			return ResId::NONE;
		};
		let id = ResId::new(self.id, t + 1, e);
		let draft = &mut self.types[t as usize];
		let table = match draft.configs.iter().position(|(c, _)| c == config) {
			Some(i) => &mut draft.configs[i].1,
			None => {
				draft.configs.push((config.clone(), BTreeMap::new()));
				let last = draft.configs.len() - 1;
				&mut draft.configs[last].1
			}
		};
		if table.insert(e, body).is_some() {
			let err = BuildError::DuplicateEntry {
				package: self.name.clone(),
				type_name: type_name.to_string(),
				entry: entry.to_string(),
				config: config.to_string(),
			};
			self.fail(err);
		}
		id
	}

	fn finish(self, arena: &mut BytesMut, strings: &mut StringPoolBuilder, force_dynamic: bool) -> Result<Package, BuildError> {
		if let Some(err) = self.error {
			return Err(err);
		}
		let mut type_names = StringPoolBuilder::default();
		let mut key_names = StringPoolBuilder::default();
		let mut type_specs = Vec::with_capacity(self.types.len());

		for (type_index, draft) in self.types.into_iter().enumerate() {
			let name_index = type_names.intern(&draft.name);
			let keys: Vec<u32> = draft.entries.iter().map(|e| key_names.intern(e)).collect();
			let mut entry_flags = vec![ConfigAxes::empty(); draft.entries.len()];
			let mut configs = Vec::with_capacity(draft.configs.len());

			for (config, entries) in draft.configs {
				let variance = Config::default().diff(&config);
				let mut table: Vec<Option<EncodedEntry>> = vec![None; draft.entries.len()];
				for (index, body) in entries {
					let i = index as usize;
					entry_flags[i] |= variance;
					let key = keys[i];
					table[i] = Some(match body {
						DraftBody::Value(v) => EncodedEntry::Value {
							key,
							value: v.encode(strings),
						},
						DraftBody::Bag { parent, items } => EncodedEntry::Map {
							key,
							parent,
							items: items.iter().map(|(k, v)| (*k, v.encode(strings))).collect(),
						},
					});
				}
				let span = encode_chunk(arena, &table);
				configs.push(TypeConfig { config, span });
			}

			type_specs.push(Some(TypeSpec {
				type_index: type_index as u8,
				name_index,
				entry_flags,
				configs,
			}));
		}

		Ok(Package {
			name: Arc::from(self.name),
			build_id: self.id,
			dynamic: self.dynamic || force_dynamic,
			type_specs,
			type_names: type_names.build(),
			key_names: key_names.build(),
			dynamic_package_map: self.references.into_iter().map(|(n, id)| (Arc::from(n), id)).collect(),
		})
	}
}

/// Assembles a [`Bundle`].
///
/// ```ignore
/// let mut pkg = PackageBuilder::new("com.example", 0x7f);
/// let hello = pkg.value("string", "hello", &Config::default(), "hello");
/// let bundle = BundleBuilder::new("/data/app/base.apk").package(pkg).build()?;
/// ```
#[derive(Debug)]
pub struct BundleBuilder {
	path: Arc<str>,
	flags: BundleFlags,
	packages: Vec<PackageBuilder>,
	idmap: Option<IdMapBuilder>,
}

impl BundleBuilder {
	pub fn new(path: impl Into<Arc<str>>) -> Self {
		Self {
			path: path.into(),
			flags: BundleFlags::empty(),
			packages: Vec::new(),
			idmap: None,
		}
	}

	pub fn system(mut self) -> Self {
		self.flags |= BundleFlags::SYSTEM;
		self
	}

	pub fn loader(mut self) -> Self {
		self.flags |= BundleFlags::LOADER;
		self
	}

	/// Makes this an overlay of the bundle named by the id-map's target path.
	/// Overlay packages always receive a load-time id.
	pub fn overlay(mut self, idmap: IdMapBuilder) -> Self {
		self.flags |= BundleFlags::OVERLAY;
		self.idmap = Some(idmap);
		self
	}

	pub fn package(mut self, package: PackageBuilder) -> Self {
		self.packages.push(package);
		self
	}

	pub fn build(self) -> Result<Bundle, BuildError> {
		if self.packages.len() > u8::MAX as usize {
			return Err(BuildError::TooManyPackages(self.path.to_string()));
		}
		let overlay = self.flags.contains(BundleFlags::OVERLAY);
		let mut arena = BytesMut::new();
		let mut strings = StringPoolBuilder::default();
		let packages = self
			.packages
			.into_iter()
			.map(|p| p.finish(&mut arena, &mut strings, overlay))
			.collect::<Result<Vec<_>, _>>()?;

		Ok(Bundle {
			path: self.path,
			flags: self.flags,
			packages,
			strings: strings.build(),
			idmap: self.idmap.map(|b| Arc::new(b.build())),
			arena: arena.freeze(),
		})
	}
}
