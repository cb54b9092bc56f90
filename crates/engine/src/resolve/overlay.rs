use restable_primitives::{Config, ResId, Value};

use super::{EntryData, ResolvedEntry, Step, StepKind, record};
use crate::ResourceEngine;
use crate::registry::{OverlayEntry, PackageGroup};

impl ResourceEngine {
	/// Lets each overlay attached to `group` replace `best`, in load order.
	///
	/// Inline values replace the data outright. Resource substitutes are
	/// resolved in the overlay's own group and win when at least as good as
	/// the current result, or always in ignore mode. The entry's origin is
	/// left alone so names still come from the target.
	#[allow(clippy::too_many_arguments)]
	pub(super) fn apply_overlays(
		&self,
		group: &PackageGroup,
		id: ResId,
		density_override: u16,
		ignore_configuration: bool,
		desired: &Config,
		best: &mut ResolvedEntry,
		steps: &mut Option<&mut Vec<Step>>,
	) {
		for link in &group.overlays {
			match link.lookup(id) {
				None => {}
				Some(OverlayEntry::Inline(values)) => {
					let Some((config, value)) = self.best_inline(values, desired, ignore_configuration) else {
						continue;
					};
					best.data = EntryData::Value(value);
					best.cookie = link.cookie;
					best.ref_table = link.ref_table.clone();
					record(steps, StepKind::OverlaidInline, link.cookie, config);
				}
				Some(OverlayEntry::Resource(overlay_id)) => {
					let overlay = match self.find_entry(overlay_id, density_override, ignore_configuration, None) {
						Ok(overlay) => overlay,
						Err(err) => {
							tracing::debug!(%id, overlay = %overlay_id, error = %err, "overlay substitute not found");
							continue;
						}
					};
					if !ignore_configuration
						&& overlay.config != best.config
						&& !self.matcher.is_better_than(&overlay.config, &best.config, desired) {
						continue;
					}
					record(steps, StepKind::Overlaid, overlay.cookie, &overlay.config);
					best.cookie = overlay.cookie;
					best.data = overlay.data;
					best.config = overlay.config;
					best.ref_table = link.ref_table.clone();
				}
			}
		}
	}

	fn best_inline<'a>(&self, values: &'a [(Config, Value)], desired: &Config, ignore_configuration: bool) -> Option<(&'a Config, Value)> {
		if ignore_configuration {
			return values.first().map(|(config, value)| (config, *value));
		}
		let mut chosen: Option<&(Config, Value)> = None;
		for candidate in values {
			if !self.matcher.matches(&candidate.0, desired) {
				continue;
			}
			if chosen.is_none_or(|current| self.matcher.is_better_than(&candidate.0, &current.0, desired)) {
				chosen = Some(candidate);
			}
		}
		chosen.map(|(config, value)| (config, *value))
	}
}
