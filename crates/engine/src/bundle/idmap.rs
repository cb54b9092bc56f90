//! Overlay id-maps.
//!
//! Keys and values are build-time ids: target ids carry the target package's
//! declared id, overlay ids the overlay package's. The registry rewrites
//! both sides to runtime ids at lookup time.

use std::sync::Arc;

use restable_primitives::{Config, ResId, Value};

/// What an id-map yields for a target resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdMapTarget<'a> {
	/// Re-resolve this overlay resource (build-time id).
	Resource(ResId),
	/// Adopt one of these values directly; the best matching config wins.
	Inline(&'a [(Config, Value)]),
}

#[derive(Debug, Clone)]
pub struct IdMap {
	target_path: Arc<str>,
	target_package_id: u8,
	/// Sorted by target id.
	target_entries: Vec<(ResId, ResId)>,
	/// Sorted by target id.
	inline_entries: Vec<(ResId, Vec<(Config, Value)>)>,
	/// Sorted by overlay id.
	overlay_entries: Vec<(ResId, ResId)>,
}

impl IdMap {
	/// Path of the bundle this overlay targets.
	pub fn target_path(&self) -> &str {
		&self.target_path
	}

	/// Build-time id of the overlaid package.
	pub fn target_package_id(&self) -> u8 {
		self.target_package_id
	}

	/// Looks up a target resource by its build-time id.
	pub fn lookup(&self, target: ResId) -> Option<IdMapTarget<'_>> {
		if let Ok(i) = self.target_entries.binary_search_by_key(&target, |&(t, _)| t) {
			return Some(IdMapTarget::Resource(self.target_entries[i].1));
		}
		self.inline_entries
			.binary_search_by_key(&target, |(t, _)| *t)
			.ok()
			.map(|i| IdMapTarget::Inline(&self.inline_entries[i].1))
	}

	/// Maps an overlay resource back to the target it overlays.
	pub fn target_of(&self, overlay: ResId) -> Option<ResId> {
		self.overlay_entries
			.binary_search_by_key(&overlay, |&(o, _)| o)
			.ok()
			.map(|i| self.overlay_entries[i].1)
	}

	pub fn is_empty(&self) -> bool {
		self.target_entries.is_empty() && self.inline_entries.is_empty()
	}
}

/// Assembles an [`IdMap`] for [`crate::BundleBuilder::overlay`].
#[derive(Debug, Clone)]
pub struct IdMapBuilder {
	target_path: Arc<str>,
	target_package_id: u8,
	target_entries: Vec<(ResId, ResId)>,
	inline_entries: Vec<(ResId, Vec<(Config, Value)>)>,
}

impl IdMapBuilder {
	pub fn new(target_path: impl Into<Arc<str>>, target_package_id: u8) -> Self {
		Self {
			target_path: target_path.into(),
			target_package_id,
			target_entries: Vec::new(),
			inline_entries: Vec::new(),
		}
	}

	/// Redirects `target` to the overlay resource `overlay`. A later mapping
	/// for the same target replaces an earlier one.
	pub fn map(mut self, target: ResId, overlay: ResId) -> Self {
		self.target_entries.retain(|&(t, _)| t != target);
		self.inline_entries.retain(|(t, _)| *t != target);
		self.target_entries.push((target, overlay));
		self
	}

	/// Overrides `target` with a literal value for `config`.
	pub fn inline(mut self, target: ResId, config: Config, value: Value) -> Self {
		self.target_entries.retain(|&(t, _)| t != target);
		match self.inline_entries.iter_mut().find(|(t, _)| *t == target) {
			Some((_, values)) => {
				values.retain(|(c, _)| *c != config);
				values.push((config, value));
			}
			None => self.inline_entries.push((target, vec![(config, value)])),
		}
		self
	}

	pub fn build(mut self) -> IdMap {
		self.target_entries.sort_unstable_by_key(|&(t, _)| t);
		self.inline_entries.sort_by_key(|(t, _)| *t);
		let mut overlay_entries: Vec<(ResId, ResId)> = self.target_entries.iter().map(|&(t, o)| (o, t)).collect();
		overlay_entries.sort_unstable_by_key(|&(o, _)| o);
		overlay_entries.dedup_by_key(|&mut (o, _)| o);
		IdMap {
			target_path: self.target_path,
			target_package_id: self.target_package_id,
			target_entries: self.target_entries,
			inline_entries: self.inline_entries,
			overlay_entries,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn resource_and_inline_lookups() {
		let map = IdMapBuilder::new("/app.apk", 0x7f)
			.map(ResId(0x7f01_0002), ResId(0x7f01_0000))
			.map(ResId(0x7f01_0000), ResId(0x7f01_0001))
			.inline(ResId(0x7f02_0000), Config::default(), Value::int(7))
			.build();

		assert_eq!(map.lookup(ResId(0x7f01_0000)), Some(IdMapTarget::Resource(ResId(0x7f01_0001))));
		assert_eq!(map.lookup(ResId(0x7f01_0002)), Some(IdMapTarget::Resource(ResId(0x7f01_0000))));
		assert_eq!(
			map.lookup(ResId(0x7f02_0000)),
			Some(IdMapTarget::Inline(&[(Config::default(), Value::int(7))]))
		);
		assert_eq!(map.lookup(ResId(0x7f01_0009)), None);
		assert_eq!(map.target_of(ResId(0x7f01_0001)), Some(ResId(0x7f01_0000)));
		assert_eq!(map.target_path(), "/app.apk");
	}

	#[test]
	fn later_mapping_replaces_earlier() {
		let map = IdMapBuilder::new("/app.apk", 0x7f)
			.inline(ResId(0x7f01_0000), Config::default(), Value::int(1))
			.map(ResId(0x7f01_0000), ResId(0x7f01_0005))
			.build();
		assert_eq!(map.lookup(ResId(0x7f01_0000)), Some(IdMapTarget::Resource(ResId(0x7f01_0005))));
	}
}
