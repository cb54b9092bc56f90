#![cfg_attr(doc, allow(rustdoc::private_intra_doc_links))]
//! Runtime package id assignment.
//!
//! # Purpose
//!
//! Independently compiled bundles may reuse build-time package ids. The
//! registry gives every package a runtime id, groups packages that share one,
//! links overlays to the group they target, and fills each group's
//! [`DynamicRefTable`] so cross-package references resolve whatever the load
//! order.
//!
//! # Mental Model
//!
//! 1. Bundles are visited non-overlays first (stable), so an overlay always
//!    finds its target already assigned.
//! 2. Dynamic packages take the next free id from 0x02 upward; others keep
//!    their declared id. The first package claiming an id creates its group.
//! 3. An overlay's group is linked to its target group through a
//!    [`ConfiguredOverlay`]; a missing target is a diagnostic, not an error.
//! 4. Every group's table learns every other group's name to runtime id.
//!
//! # Invariants
//!
//! - One group per runtime id; a group never mixes package names.
//!   - Enforced in: [`PackageRegistry::build`] (conflicting non-dynamic packages are dropped).
//!   - Tested by: `registry::tests::conflicting_static_ids_are_not_merged`
//! - Overlays attach only to targets visited before them.
//!   - Enforced in: [`PackageRegistry::build`] (stable partition).
//!   - Tested by: `registry::tests::overlay_loaded_before_target_still_attaches`
//! - The registry is rebuilt wholesale on every bundle list change; nothing
//!   in it outlives the list it was built from.

use std::sync::Arc;

use restable_primitives::{APP_PACKAGE_ID, Config, ResId, Value};
use rustc_hash::FxHashMap as HashMap;
use smallvec::SmallVec;

use crate::bundle::{Bundle, Cookie, IdMap, IdMapTarget};
use crate::error::RegistryDiagnostic;

mod dynamic_ref;

pub use dynamic_ref::DynamicRefTable;
pub(crate) use dynamic_ref::OverlayRewrite;


const NO_GROUP: u8 = 0xff;
const FIRST_DYNAMIC_ID: u8 = 0x02;

/// A package registered in a group.
#[derive(Debug, Clone)]
pub struct ConfiguredPackage {
	pub(crate) cookie: Cookie,
	pub(crate) package_index: usize,
	pub(crate) is_loader: bool,
	/// Per type index: positions of the configs that match the current
	/// device configuration.
	pub(crate) filtered: Vec<SmallVec<[u16; 4]>>,
}

impl ConfiguredPackage {
	pub fn cookie(&self) -> Cookie {
		self.cookie
	}

	pub fn package_index(&self) -> usize {
		self.package_index
	}
}

/// An overlay attached to a target group.
#[derive(Debug, Clone)]
pub struct ConfiguredOverlay {
	pub(crate) cookie: Cookie,
	pub(crate) idmap: Arc<IdMap>,
	pub(crate) target_build_id: u8,
	pub(crate) target_runtime_id: u8,
	pub(crate) overlay_runtime_id: u8,
	/// Table of the overlay's own group, used for values it supplies.
	pub(crate) ref_table: Arc<DynamicRefTable>,
}

/// Substitute for a target resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OverlayEntry<'a> {
	Resource(ResId),
	Inline(&'a [(Config, Value)]),
}

impl ConfiguredOverlay {
	pub fn cookie(&self) -> Cookie {
		self.cookie
	}

	/// Looks up the substitute for runtime id `id` of the target group.
	pub(crate) fn lookup(&self, id: ResId) -> Option<OverlayEntry<'_>> {
		if id.package_id() != self.target_runtime_id {
			return None;
		}
		match self.idmap.lookup(id.with_package(self.target_build_id))? {
			IdMapTarget::Resource(overlay) => Some(OverlayEntry::Resource(overlay.with_package(self.overlay_runtime_id))),
			IdMapTarget::Inline(values) => Some(OverlayEntry::Inline(values)),
		}
	}
}

/// Packages sharing one runtime id, plus the overlays targeting them.
#[derive(Debug, Clone)]
pub struct PackageGroup {
	pub(crate) id: u8,
	pub(crate) name: Arc<str>,
	pub(crate) packages: Vec<ConfiguredPackage>,
	pub(crate) overlays: Vec<ConfiguredOverlay>,
	pub(crate) ref_table: Arc<DynamicRefTable>,
}

impl PackageGroup {
	pub fn id(&self) -> u8 {
		self.id
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn packages(&self) -> &[ConfiguredPackage] {
		&self.packages
	}

	pub fn overlays(&self) -> &[ConfiguredOverlay] {
		&self.overlays
	}

	pub fn ref_table(&self) -> &Arc<DynamicRefTable> {
		&self.ref_table
	}
}

struct PendingOverlay {
	target_group: usize,
	overlay_group: usize,
	cookie: Cookie,
	idmap: Arc<IdMap>,
	target_runtime_id: u8,
}

struct GroupDraft {
	id: u8,
	name: Arc<str>,
	packages: Vec<ConfiguredPackage>,
	table: DynamicRefTable,
}

/// Runtime id assignment for one bundle list.
#[derive(Debug, Clone)]
pub struct PackageRegistry {
	groups: Vec<PackageGroup>,
	package_ids: [u8; 256],
	/// Per cookie, per package index: assigned runtime id.
	assigned: Vec<Vec<Option<u8>>>,
	diagnostics: Vec<RegistryDiagnostic>,
}

impl Default for PackageRegistry {
	fn default() -> Self {
		Self {
			groups: Vec::new(),
			package_ids: [NO_GROUP; 256],
			assigned: Vec::new(),
			diagnostics: Vec::new(),
		}
	}
}

impl PackageRegistry {
	pub fn build(bundles: &[Arc<Bundle>]) -> Self {
		let mut order: Vec<usize> = (0..bundles.len()).collect();
		order.sort_by_key(|&i| bundles[i].is_overlay());

		let mut package_ids = [NO_GROUP; 256];
		let mut drafts: Vec<GroupDraft> = Vec::new();
		let mut pending: Vec<PendingOverlay> = Vec::new();
		let mut diagnostics = Vec::new();
		let mut target_ids: HashMap<Arc<str>, u8> = HashMap::default();
		let mut assigned: Vec<Vec<Option<u8>>> = bundles.iter().map(|b| vec![None; b.packages.len()]).collect();
		let mut next_dynamic = u16::from(FIRST_DYNAMIC_ID);

		for &bundle_index in &order {
			let bundle = &bundles[bundle_index];
			let cookie = Cookie(bundle_index as u32);

			for (package_index, package) in bundle.packages.iter().enumerate() {
				let runtime_id = if package.dynamic {
					while next_dynamic < u16::from(NO_GROUP)
						&& (package_ids[next_dynamic as usize] != NO_GROUP || next_dynamic == u16::from(APP_PACKAGE_ID))
					{
						next_dynamic += 1;
					}
					if next_dynamic >= u16::from(NO_GROUP) {
						tracing::warn!(bundle = %bundle.path, package = %package.name, "runtime package ids exhausted");
						continue;
					}
					let id = next_dynamic as u8;
					next_dynamic += 1;
					id
				} else {
					package.build_id
				};

				let mut group_index = package_ids[runtime_id as usize];
				if group_index == NO_GROUP {
					// Runtime ids are never 0, so there are at most 255 groups.
					group_index = drafts.len() as u8;
					package_ids[runtime_id as usize] = group_index;
					let mut table = DynamicRefTable::new(runtime_id, package.dynamic && package.build_id == APP_PACKAGE_ID);

					if bundle.is_overlay() {
						match bundle.shared_idmap() {
							Some(idmap) => match target_ids.get(idmap.target_path()) {
								Some(&target_runtime_id) => {
									table.set_overlay(OverlayRewrite {
										idmap: idmap.clone(),
										overlay_build_id: package.build_id,
										target_runtime_id,
									});
									pending.push(PendingOverlay {
										target_group: package_ids[target_runtime_id as usize] as usize,
										overlay_group: group_index as usize,
										cookie,
										idmap: idmap.clone(),
										target_runtime_id,
									});
								}
								None => {
									tracing::info!(
										overlay = %bundle.path,
										target = idmap.target_path(),
										"failed to find target package for overlay"
									);
									diagnostics.push(RegistryDiagnostic::OverlayTargetMissing {
										overlay: bundle.path.clone(),
										target: Arc::from(idmap.target_path()),
									});
								}
							},
							None => tracing::warn!(overlay = %bundle.path, "overlay bundle has no id-map"),
						}
					}

					drafts.push(GroupDraft {
						id: runtime_id,
						name: package.name.clone(),
						packages: Vec::new(),
						table,
					});
				} else if !package.dynamic && drafts[group_index as usize].name != package.name {
					let existing = drafts[group_index as usize].name.clone();
					tracing::warn!(
						bundle = %bundle.path,
						package = %package.name,
						id = runtime_id,
						%existing,
						"package id already assigned to a different package"
					);
					diagnostics.push(RegistryDiagnostic::PackageIdConflict {
						bundle: bundle.path.clone(),
						package: package.name.clone(),
						id: runtime_id,
						existing,
					});
					continue;
				}

				let draft = &mut drafts[group_index as usize];
				draft.packages.push(ConfiguredPackage {
					cookie,
					package_index,
					is_loader: bundle.is_loader(),
					filtered: Vec::new(),
				});
				for (name, build_id) in &package.dynamic_package_map {
					draft.table.add_entry(name.clone(), *build_id);
				}
				target_ids.entry(bundle.path.clone()).or_insert(runtime_id);
				assigned[bundle_index][package_index] = Some(runtime_id);
			}
		}

		let names: Vec<(Arc<str>, u8)> = drafts.iter().map(|d| (d.name.clone(), d.id)).collect();
		for draft in &mut drafts {
			for (name, id) in &names {
				draft.table.add_mapping(name, *id);
			}
		}

		let mut groups: Vec<PackageGroup> = drafts
			.into_iter()
			.map(|d| PackageGroup {
				id: d.id,
				name: d.name,
				packages: d.packages,
				overlays: Vec::new(),
				ref_table: Arc::new(d.table),
			})
			.collect();

		for p in pending {
			let ref_table = groups[p.overlay_group].ref_table.clone();
			let overlay_runtime_id = groups[p.overlay_group].id;
			let target_build_id = p.idmap.target_package_id();
			groups[p.target_group].overlays.push(ConfiguredOverlay {
				cookie: p.cookie,
				idmap: p.idmap,
				target_build_id,
				target_runtime_id: p.target_runtime_id,
				overlay_runtime_id,
				ref_table,
			});
		}

		Self {
			groups,
			package_ids,
			assigned,
			diagnostics,
		}
	}

	pub fn groups(&self) -> &[PackageGroup] {
		&self.groups
	}

	pub(crate) fn groups_mut(&mut self) -> &mut [PackageGroup] {
		&mut self.groups
	}

	/// Returns the group holding runtime package id `package_id`.
	pub fn group(&self, package_id: u8) -> Option<&PackageGroup> {
		match self.package_ids[package_id as usize] {
			NO_GROUP => None,
			index => self.groups.get(index as usize),
		}
	}

	/// Runtime id of package `package_index` of the bundle at `cookie`.
	pub fn assigned_id(&self, cookie: Cookie, package_index: usize) -> Option<u8> {
		*self.assigned.get(cookie.index())?.get(package_index)?
	}

	/// Runtime id to group index, for assigned ids only.
	pub fn package_ids(&self) -> impl Iterator<Item = (u8, usize)> + '_ {
		self.package_ids
			.iter()
			.enumerate()
			.filter(|&(_, &g)| g != NO_GROUP)
			.map(|(id, &g)| (id as u8, g as usize))
	}

	pub fn diagnostics(&self) -> &[RegistryDiagnostic] {
		&self.diagnostics
	}
}
