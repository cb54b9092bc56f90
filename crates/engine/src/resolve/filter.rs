use restable_primitives::{Config, ConfigMatcher};
use smallvec::SmallVec;

use crate::ResourceEngine;
use crate::bundle::TypeSpec;

/// Positions of the configs of `spec` worth scanning on the fast path, in
/// declaration order. With filtering off every config is kept.
pub(crate) fn filter_type(spec: Option<&TypeSpec>, matcher: &dyn ConfigMatcher, desired: &Config, enabled: bool) -> SmallVec<[u16; 4]> {
	let Some(spec) = spec else {
		return SmallVec::new();
	};
	spec.configs
		.iter()
		.enumerate()
		.filter(|(_, c)| !enabled || matcher.matches(&c.config, desired))
		.map(|(i, _)| i as u16)
		.collect()
}

impl ResourceEngine {
	/// Recomputes every (package, type) candidate list for the current
	/// configuration.
	pub(crate) fn rebuild_filter_list(&mut self) {
		let enabled = self.options.filter_incompatible_configs;
		let matcher = &*self.matcher;
		let desired = &self.configuration;
		let bundles = &self.bundles;
		let (mut kept, mut total) = (0usize, 0usize);

		for group in self.registry.groups_mut() {
			for configured in &mut group.packages {
				let package = &bundles[configured.cookie.index()].packages[configured.package_index];
				configured.filtered = package
					.type_specs
					.iter()
					.map(|spec| {
						let filtered = filter_type(spec.as_ref(), matcher, desired, enabled);
						kept += filtered.len();
						total += spec.as_ref().map_or(0, |s| s.configs.len());
						filtered
					})
					.collect();
			}
		}
		tracing::debug!(kept, total, config = %desired, "rebuilt filtered config lists");
	}
}
