#![cfg_attr(doc, allow(rustdoc::private_intra_doc_links))]
//! Best-match entry selection.
//!
//! # Purpose
//!
//! Given a runtime resource id and the engine's configuration, pick the one
//! entry that applies: scan every package of the id's group and every config
//! that defines the entry, keep the best match, then let overlays substitute
//! it.
//!
//! # Mental Model
//!
//! - Fast path: with no density override and no ignore request, only the
//!   configs kept in the package's filtered list are scanned and none of them are
//!   re-matched.
//! - Slow path: every config is matched against the requested configuration
//!   (the current one with the override density applied).
//! - Ignore mode takes, from each package, the first config that has the
//!   entry; the last package of the group that has it wins. Overlays still
//!   apply and are accepted whatever their config.
//! - `type_flags` is the union of the entry's spec flags over every package
//!   of the group that declares the type, whether or not it won.
//!
//! # Invariants
//!
//! - Among candidates, a later package wins only when strictly better, except
//!   that a loader package also wins on an equal config.
//!   - Enforced in: [`ResourceEngine::find_entry`]
//!   - Tested by: `resolve::tests::loader_wins_on_equal_config`
//! - A candidate whose chunk fails to decode is treated as absent.
//!   - Enforced in: [`ResourceEngine::find_entry`]
//!   - Tested by: `resolve::tests::corrupt_chunk_is_skipped`
//! - Overlays never apply to loader results.
//!   - Enforced in: [`ResourceEngine::find_entry`]
//!   - Tested by: `resolve::tests::loader_result_is_not_overlaid`,
//!     `resolve::tests::ignore_mode_still_applies_overlays`
//! - Reference chasing stops after [`MAX_REFERENCE_HOPS`] or on a
//!   self-reference.
//!   - Enforced in: [`ResourceEngine::resolve_reference`]
//!   - Tested by: `resolve::tests::reference_cycle_terminates`

use std::sync::Arc;

use restable_primitives::{Config, ConfigAxes, ResId, Value, ValueKind};

use crate::ResourceEngine;
use crate::bundle::{Cookie, EntryBody, MapHandle};
use crate::error::ResolveError;
use crate::registry::{DynamicRefTable, PackageGroup};

mod filter;
mod overlay;
mod trace;

pub use trace::{Step, StepKind};
pub(crate) use trace::{TraceState, record};

#[cfg(test)]
mod tests;

/// Upper bound on reference indirections followed by
/// [`ResourceEngine::resolve_reference`].
pub const MAX_REFERENCE_HOPS: usize = 20;

/// Payload of a resolved entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryData {
	Value(Value),
	Map(MapHandle),
}

/// Package that supplied the winning entry before overlays, used for naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryOrigin {
	pub cookie: Cookie,
	pub package_index: usize,
	pub type_index: u8,
	/// Index into the package's key-name pool.
	pub key: u32,
}

/// The entry selected for a resource id.
#[derive(Debug, Clone)]
pub struct ResolvedEntry {
	/// Bundle the data came from; an overlay's cookie when one applied.
	pub cookie: Cookie,
	pub data: EntryData,
	pub config: Config,
	pub type_flags: ConfigAxes,
	/// Table that rewrites build-time ids found in `data`.
	pub ref_table: Arc<DynamicRefTable>,
	pub origin: EntryOrigin,
}

/// A scalar value together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedValue {
	pub value: Value,
	/// `None` when the value is not tied to a bundle (a theme entry copied
	/// from an engine with no matching bundle).
	pub cookie: Option<Cookie>,
	/// Axes that, if changed, could change this value.
	pub flags: ConfigAxes,
	/// Last resource the value was read from; `ResId::NONE` for theme values.
	pub resid: ResId,
	pub config: Config,
}

impl SelectedValue {
	pub fn new(value: Value) -> Self {
		Self {
			value,
			cookie: None,
			flags: ConfigAxes::empty(),
			resid: ResId::NONE,
			config: Config::default(),
		}
	}
}

struct Candidate<'a> {
	cookie: Cookie,
	package_index: usize,
	config: &'a Config,
	chunk: crate::bundle::TypeChunk,
	offset: usize,
}

impl ResourceEngine {
	/// Selects the entry for `id` under the current configuration.
	///
	/// `density_override` replaces the configured density when non-zero.
	/// `ignore_configuration` takes any defined entry instead of the best
	/// one: the first config of the last package that defines it.
	pub fn resolve(&self, id: ResId, density_override: u16, ignore_configuration: bool) -> Result<ResolvedEntry, ResolveError> {
		if !self.trace.lock().enabled {
			return self.find_entry(id, density_override, ignore_configuration, None);
		}

		let mut steps = Vec::new();
		let result = self.find_entry(id, density_override, ignore_configuration, Some(&mut steps));
		let desired = self.desired_config(density_override);
		let text = self.format_resolution(id, desired.as_ref().unwrap_or(&self.configuration), &steps);
		tracing::debug!(%id, "{text}");
		self.trace.lock().last = Some(text);
		result
	}

	fn desired_config(&self, density_override: u16) -> Option<Config> {
		(density_override != 0 && density_override != self.configuration.density)
			.then(|| self.configuration.clone().with_density(density_override))
	}

	pub(crate) fn find_entry(
		&self,
		id: ResId,
		density_override: u16,
		ignore_configuration: bool,
		mut steps: Option<&mut Vec<Step>>,
	) -> Result<ResolvedEntry, ResolveError> {
		let Some(type_index) = id.type_index().filter(|_| id.is_valid()) else {
			return Err(ResolveError::InvalidId(id));
		};
		let group = self.registry.group(id.package_id()).ok_or(ResolveError::UnknownPackage {
			id,
			package_id: id.package_id(),
		})?;

		let overridden = self.desired_config(density_override);
		let desired = overridden.as_ref().unwrap_or(&self.configuration);
		let fast_path = !ignore_configuration && overridden.is_none();

		let mut best = self.select_candidate(id, group, type_index, desired, fast_path, ignore_configuration, &mut steps)?;

		if !self.bundles[best.cookie.index()].is_loader() {
			self.apply_overlays(group, id, density_override, ignore_configuration, desired, &mut best, &mut steps);
		}
		Ok(best)
	}

	#[allow(clippy::too_many_arguments)]
	fn select_candidate(
		&self,
		id: ResId,
		group: &PackageGroup,
		type_index: u8,
		desired: &Config,
		fast_path: bool,
		ignore_configuration: bool,
		steps: &mut Option<&mut Vec<Step>>,
	) -> Result<ResolvedEntry, ResolveError> {
		let entry_index = id.entry_id();
		let mut best: Option<Candidate<'_>> = None;
		let mut type_flags = ConfigAxes::empty();

		for configured in &group.packages {
			let bundle = &self.bundles[configured.cookie.index()];
			let package = &bundle.packages[configured.package_index];
			let Some(spec) = package.type_spec(type_index) else {
				continue;
			};
			type_flags |= spec.flags_for(entry_index);

			let filtered = fast_path.then(|| configured.filtered.get(type_index as usize)).flatten();
			let prefiltered = filtered.is_some() && self.options.filter_incompatible_configs;
			let count = filtered.map_or(spec.configs.len(), |f| f.len());
			let loader = configured.is_loader;

			for i in 0..count {
				let position = filtered.map_or(i, |f| f[i] as usize);
				let Some(type_config) = spec.configs.get(position) else {
					continue;
				};
				let this = &type_config.config;
				if !prefiltered && !ignore_configuration && !self.matcher.matches(this, desired) {
					continue;
				}

				let kind = match &best {
					None => StepKind::Initial,
					Some(_) if ignore_configuration => StepKind::better(loader),
					Some(current) if self.matcher.is_better_than(this, current.config, desired) => StepKind::better(loader),
					Some(current) if loader && this == current.config => StepKind::OverlaidLoader,
					Some(_) => {
						record(steps, StepKind::skipped(loader), configured.cookie, this);
						continue;
					}
				};

				let chunk = match bundle.chunk(type_config) {
					Ok(chunk) => chunk,
					Err(err) => {
						tracing::warn!(%id, bundle = %bundle.path, config = %this, error = %err, "unreadable type chunk");
						continue;
					}
				};
				let offset = match chunk.entry_offset(entry_index) {
					Ok(Some(offset)) => offset,
					Ok(None) => {
						record(steps, StepKind::no_entry(loader), configured.cookie, this);
						continue;
					}
					Err(err) => {
						tracing::warn!(%id, bundle = %bundle.path, config = %this, error = %err, "unreadable entry offset");
						continue;
					}
				};

				record(steps, kind, configured.cookie, this);
				best = Some(Candidate {
					cookie: configured.cookie,
					package_index: configured.package_index,
					config: this,
					chunk,
					offset,
				});
				if ignore_configuration {
					break;
				}
			}
		}

		let best = best.ok_or(ResolveError::NoEntry(id))?;
		let raw = best.chunk.entry_at(best.offset).map_err(|err| {
			tracing::warn!(%id, cookie = %best.cookie, error = %err, "unreadable entry");
			ResolveError::NoEntry(id)
		})?;
		let data = match raw.body {
			EntryBody::Value(value) => EntryData::Value(value),
			EntryBody::Map(map) => EntryData::Map(map),
		};

		Ok(ResolvedEntry {
			cookie: best.cookie,
			data,
			config: best.config.clone(),
			type_flags,
			ref_table: group.ref_table.clone(),
			origin: EntryOrigin {
				cookie: best.cookie,
				package_index: best.package_index,
				type_index,
				key: raw.key,
			},
		})
	}

	/// Returns the scalar value of `id` with build-time ids rewritten.
	///
	/// A bag yields a reference to itself when `may_be_bag` is set and
	/// [`ResolveError::IsComplex`] otherwise.
	pub fn get_resource(&self, id: ResId, may_be_bag: bool, density_override: u16) -> Result<SelectedValue, ResolveError> {
		let entry = self.resolve(id, density_override, false)?;
		let value = match entry.data {
			EntryData::Map(_) if may_be_bag => Value::reference(id),
			EntryData::Map(_) => return Err(ResolveError::IsComplex(id)),
			EntryData::Value(value) => entry.ref_table.lookup_resource_value(value).inspect_err(|err| {
				tracing::warn!(%id, error = %err, "failed to rewrite resource value");
			})?,
		};

		Ok(SelectedValue {
			value,
			cookie: Some(entry.cookie),
			flags: entry.type_flags,
			resid: id,
			config: entry.config,
		})
	}

	/// Follows reference values to their target, accumulating flags.
	///
	/// Null references and non-reference values are returned as given.
	pub fn resolve_reference(&self, mut value: SelectedValue) -> Result<SelectedValue, ResolveError> {
		let mut last = ResId::NONE;
		for _ in 0..MAX_REFERENCE_HOPS {
			if value.value.kind != ValueKind::Reference || value.value.data == 0 {
				break;
			}
			let id = ResId(value.value.data);
			let mut next = self.get_resource(id, true, 0)?;
			next.flags |= value.flags;
			value = next;
			if last == id {
				break;
			}
			last = id;
		}
		Ok(value)
	}

	/// Union of the axes that can change the value of `id`.
	pub fn resource_flags(&self, id: ResId) -> Result<ConfigAxes, ResolveError> {
		Ok(self.find_entry(id, 0, true, None)?.type_flags)
	}
}
