//! The engine facade: bundle list, configuration, caches.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use restable_primitives::{Config, ConfigAxes, ConfigMatcher, QualifierMatcher};

use crate::bag::BagCache;
use crate::bundle::{Bundle, Cookie};
use crate::options::EngineOptions;
use crate::registry::PackageRegistry;
use crate::resolve::TraceState;
use crate::theme::Theme;

mod query;

pub use query::ResourceName;


static NEXT_ENGINE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a [`ResourceEngine`], carried by the themes it creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineId(u64);

/// Resolves resource ids against an ordered list of bundles and a device
/// configuration.
///
/// Lookups take `&self`; the bag cache and the resolution trace sit behind
/// locks. Changing bundles or configuration needs `&mut self`.
#[derive(Debug)]
pub struct ResourceEngine {
	id: EngineId,
	pub(crate) options: EngineOptions,
	pub(crate) matcher: Arc<dyn ConfigMatcher>,
	pub(crate) bundles: Vec<Arc<Bundle>>,
	pub(crate) registry: PackageRegistry,
	pub(crate) configuration: Config,
	pub(crate) bags: Mutex<BagCache>,
	pub(crate) trace: Mutex<TraceState>,
}

impl Default for ResourceEngine {
	fn default() -> Self {
		Self::new(EngineOptions::default())
	}
}

impl ResourceEngine {
	pub fn new(options: EngineOptions) -> Self {
		Self::with_matcher(options, Arc::new(QualifierMatcher))
	}

	pub fn with_matcher(options: EngineOptions, matcher: Arc<dyn ConfigMatcher>) -> Self {
		let trace = TraceState {
			enabled: options.resolution_logging,
			last: None,
		};
		Self {
			id: EngineId(NEXT_ENGINE_ID.fetch_add(1, Ordering::Relaxed)),
			options,
			matcher,
			bundles: Vec::new(),
			registry: PackageRegistry::default(),
			configuration: Config::default(),
			bags: Mutex::new(BagCache::default()),
			trace: Mutex::new(trace),
		}
	}

	pub fn id(&self) -> EngineId {
		self.id
	}

	pub fn options(&self) -> &EngineOptions {
		&self.options
	}

	/// Replaces the bundle list. Cookies are positions in `bundles`.
	///
	/// Runtime package ids are reassigned from scratch and every cached bag
	/// is dropped.
	pub fn set_bundles(&mut self, bundles: Vec<Arc<Bundle>>) {
		self.bundles = bundles;
		self.registry = PackageRegistry::build(&self.bundles);
		for diagnostic in self.registry.diagnostics() {
			tracing::debug!(%diagnostic, "package registry");
		}
		self.rebuild_filter_list();
		self.invalidate_caches(ConfigAxes::EVERYTHING);
		tracing::debug!(bundles = self.bundles.len(), groups = self.registry.groups().len(), "bundles set");
	}

	pub fn bundles(&self) -> &[Arc<Bundle>] {
		&self.bundles
	}

	pub fn bundle(&self, cookie: Cookie) -> Option<&Arc<Bundle>> {
		self.bundles.get(cookie.index())
	}

	pub fn registry(&self) -> &PackageRegistry {
		&self.registry
	}

	/// Installs a new device configuration. Caches are only touched when
	/// some axis actually changed.
	pub fn set_configuration(&mut self, configuration: Config) {
		let diff = self.matcher.diff(&self.configuration, &configuration);
		self.configuration = configuration;
		if !diff.is_empty() {
			self.rebuild_filter_list();
			self.invalidate_caches(diff);
		}
	}

	pub fn configuration(&self) -> &Config {
		&self.configuration
	}

	/// Drops cached bag stacks, and cached bags whose flags intersect
	/// `diff`.
	pub fn invalidate_caches(&mut self, diff: ConfigAxes) {
		let cache = self.bags.get_mut();
		let evicted = cache.invalidate(diff);
		tracing::debug!(?diff, evicted, kept = cache.len(), "invalidated bag cache");
	}

	pub fn new_theme(&self) -> Theme {
		Theme::new(self.id)
	}
}
