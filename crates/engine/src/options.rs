use serde::{Deserialize, Serialize};

use crate::error::OptionsError;

/// Engine tunables, usually read from a toml table.
///
/// ```toml
/// filter_incompatible_configs = true
/// resolution_logging = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineOptions {
	/// Drop configurations that cannot match the device when rebuilding the
	/// per-type candidate lists. When off, every configuration is kept and the
	/// lookup path tests each one.
	pub filter_incompatible_configs: bool,
	/// Start with the resolution trace enabled.
	pub resolution_logging: bool,
}

impl Default for EngineOptions {
	fn default() -> Self {
		Self {
			filter_incompatible_configs: true,
			resolution_logging: false,
		}
	}
}

impl EngineOptions {
	pub fn from_toml_str(src: &str) -> Result<Self, OptionsError> {
		Ok(toml::from_str(src)?)
	}
}
