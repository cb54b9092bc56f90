use std::fmt::Write as _;

use restable_primitives::{Config, ResId};

use crate::ResourceEngine;
use crate::bundle::Cookie;

/// Why a candidate was taken or passed over during a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
	Initial,
	BetterMatch,
	BetterMatchLoader,
	Overlaid,
	OverlaidInline,
	OverlaidLoader,
	Skipped,
	SkippedLoader,
	NoEntry,
	NoEntryLoader,
}

impl StepKind {
	pub fn label(self) -> &'static str {
		match self {
			Self::Initial => "Found initial",
			Self::BetterMatch => "Found better",
			Self::BetterMatchLoader => "Found better in loader",
			Self::Overlaid => "Overlaid",
			Self::OverlaidInline => "Overlaid inline",
			Self::OverlaidLoader => "Overlaid by loader",
			Self::Skipped => "Skipped",
			Self::SkippedLoader => "Skipped loader",
			Self::NoEntry => "No entry",
			Self::NoEntryLoader => "No entry in loader",
		}
	}

	pub(crate) fn skipped(loader: bool) -> Self {
		if loader { Self::SkippedLoader } else { Self::Skipped }
	}

	pub(crate) fn no_entry(loader: bool) -> Self {
		if loader { Self::NoEntryLoader } else { Self::NoEntry }
	}

	pub(crate) fn better(loader: bool) -> Self {
		if loader { Self::BetterMatchLoader } else { Self::BetterMatch }
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
	pub kind: StepKind,
	pub cookie: Cookie,
	/// Qualifier string of the candidate's configuration.
	pub config: String,
}

/// Collects steps for one lookup when tracing is on.
pub(crate) fn record(steps: &mut Option<&mut Vec<Step>>, kind: StepKind, cookie: Cookie, config: &Config) {
	tracing::trace!(step = kind.label(), %cookie, config = %config, "resolution step");
	if let Some(steps) = steps {
		steps.push(Step {
			kind,
			cookie,
			config: config.to_string(),
		});
	}
}

#[derive(Debug, Default)]
pub(crate) struct TraceState {
	pub(crate) enabled: bool,
	pub(crate) last: Option<String>,
}

impl ResourceEngine {
	/// Formats a finished lookup:
	///
	/// ```text
	/// Resolution for 0x7f010000 com.example:string/hello
	/// 	For config - fr
	/// 	Found initial: com.example (/base.apk)
	/// 	Found better: com.example (/base.apk) - fr
	/// ```
	pub(crate) fn format_resolution(&self, id: ResId, desired: &Config, steps: &[Step]) -> String {
		let mut out = format!("Resolution for {id}");
		if let Ok(name) = self.resource_name(id) {
			let _ = write!(out, " {name}");
		}
		let _ = write!(out, "\n\tFor config - {desired}");
		for step in steps {
			let (package, path) = match self.bundles.get(step.cookie.index()) {
				Some(bundle) => (
					bundle.packages.first().map_or("?", |p| p.name()),
					bundle.path(),
				),
				None => ("?", "?"),
			};
			let _ = write!(out, "\n\t{}: {package} ({path})", step.kind.label());
			if !step.config.is_empty() {
				let _ = write!(out, " - {}", step.config);
			}
		}
		out
	}

	/// Turns the resolution trace on or off. Turning it off drops the last
	/// recorded trace.
	pub fn set_resolution_logging(&self, enabled: bool) {
		let mut trace = self.trace.lock();
		trace.enabled = enabled;
		if !enabled {
			trace.last = None;
		}
	}

	/// Formatted trace of the most recent [`ResourceEngine::resolve`] call
	/// made while tracing was on.
	pub fn last_resolution(&self) -> Option<String> {
		self.trace.lock().last.clone()
	}
}
