//! Device configuration descriptor.
//!
//! A [`Config`] is both the qualifier set attached to a type configuration in
//! a bundle and the description of the device the engine resolves for. Zero
//! (or `None`/`Any`) on an axis means "unqualified" in the first role and
//! "unknown" in the second.
//!
//! The engine never interprets axes directly. Matching, ranking and diffing go
//! through a [`ConfigMatcher`]; [`QualifierMatcher`] is the stock one.

use std::fmt;

use serde::{Deserialize, Serialize};

mod axes;
mod matcher;

pub use axes::ConfigAxes;
pub use matcher::{ConfigMatcher, QualifierMatcher};


/// Screen orientation qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
	#[default]
	Any,
	Portrait,
	Landscape,
	Square,
}

/// Night mode qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NightMode {
	#[default]
	Any,
	No,
	Yes,
}

/// Layout direction qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutDirection {
	#[default]
	Any,
	Ltr,
	Rtl,
}

/// Configuration descriptor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	pub mcc: u16,
	pub mnc: u16,
	/// Lowercase ISO-639 language code.
	pub language: Option<String>,
	/// Uppercase ISO-3166 region code.
	pub region: Option<String>,
	pub layout_direction: LayoutDirection,
	pub smallest_width_dp: u16,
	pub screen_width_dp: u16,
	pub screen_height_dp: u16,
	pub orientation: Orientation,
	pub night_mode: NightMode,
	/// Dots per inch; see the `DENSITY_*` constants.
	pub density: u16,
	pub sdk_version: u16,
}

impl Config {
	pub const DENSITY_DEFAULT: u16 = 0;
	pub const DENSITY_LOW: u16 = 120;
	pub const DENSITY_MEDIUM: u16 = 160;
	pub const DENSITY_TV: u16 = 213;
	pub const DENSITY_HIGH: u16 = 240;
	pub const DENSITY_XHIGH: u16 = 320;
	pub const DENSITY_XXHIGH: u16 = 480;
	pub const DENSITY_XXXHIGH: u16 = 640;
	/// Resources usable at any density without scaling.
	pub const DENSITY_ANY: u16 = 0xfffe;
	/// Resources that must never be scaled.
	pub const DENSITY_NONE: u16 = 0xffff;

	/// Sets the locale; language is lowercased and region uppercased.
	pub fn with_locale(mut self, language: &str, region: Option<&str>) -> Self {
		self.language = Some(language.to_ascii_lowercase());
		self.region = region.map(str::to_ascii_uppercase);
		self
	}

	pub fn with_density(mut self, density: u16) -> Self {
		self.density = density;
		self
	}

	pub fn with_orientation(mut self, orientation: Orientation) -> Self {
		self.orientation = orientation;
		self
	}

	pub fn with_night_mode(mut self, night_mode: NightMode) -> Self {
		self.night_mode = night_mode;
		self
	}

	pub fn with_layout_direction(mut self, layout_direction: LayoutDirection) -> Self {
		self.layout_direction = layout_direction;
		self
	}

	pub fn with_smallest_width(mut self, dp: u16) -> Self {
		self.smallest_width_dp = dp;
		self
	}

	pub fn with_screen_size(mut self, width_dp: u16, height_dp: u16) -> Self {
		self.screen_width_dp = width_dp;
		self.screen_height_dp = height_dp;
		self
	}

	pub fn with_sdk_version(mut self, sdk: u16) -> Self {
		self.sdk_version = sdk;
		self
	}

	pub fn with_mcc_mnc(mut self, mcc: u16, mnc: u16) -> Self {
		self.mcc = mcc;
		self.mnc = mnc;
		self
	}

	/// True when no axis is qualified.
	pub fn is_default(&self) -> bool {
		*self == Self::default()
	}

	/// Returns the BCP-47 style locale tag (`fr-FR`), if a language is set.
	pub fn locale_tag(&self) -> Option<String> {
		let language = self.language.as_deref()?;
		Some(match self.region.as_deref() {
			Some(region) => format!("{language}-{region}"),
			None => language.to_string(),
		})
	}

	/// Returns the axes on which `self` and `other` differ.
	pub fn diff(&self, other: &Config) -> ConfigAxes {
		let mut axes = ConfigAxes::empty();
		if self.mcc != other.mcc {
			axes |= ConfigAxes::MCC;
		}
		if self.mnc != other.mnc {
			axes |= ConfigAxes::MNC;
		}
		if self.language != other.language || self.region != other.region {
			axes |= ConfigAxes::LOCALE;
		}
		if self.layout_direction != other.layout_direction {
			axes |= ConfigAxes::LAYOUT_DIR;
		}
		if self.smallest_width_dp != other.smallest_width_dp {
			axes |= ConfigAxes::SMALLEST_SCREEN_SIZE;
		}
		if self.screen_width_dp != other.screen_width_dp || self.screen_height_dp != other.screen_height_dp {
			axes |= ConfigAxes::SCREEN_SIZE;
		}
		if self.orientation != other.orientation {
			axes |= ConfigAxes::ORIENTATION;
		}
		if self.night_mode != other.night_mode {
			axes |= ConfigAxes::UI_MODE;
		}
		if self.density != other.density {
			axes |= ConfigAxes::DENSITY;
		}
		if self.sdk_version != other.sdk_version {
			axes |= ConfigAxes::VERSION;
		}
		axes
	}
}

fn density_name(density: u16) -> Option<&'static str> {
	Some(match density {
		Config::DENSITY_LOW => "ldpi",
		Config::DENSITY_MEDIUM => "mdpi",
		Config::DENSITY_TV => "tvdpi",
		Config::DENSITY_HIGH => "hdpi",
		Config::DENSITY_XHIGH => "xhdpi",
		Config::DENSITY_XXHIGH => "xxhdpi",
		Config::DENSITY_XXXHIGH => "xxxhdpi",
		Config::DENSITY_ANY => "anydpi",
		Config::DENSITY_NONE => "nodpi",
		_ => return None,
	})
}

/// Renders the qualifier string (`fr-rFR-land-xhdpi-v21`). The default
/// configuration renders as the empty string.
impl fmt::Display for Config {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut parts: Vec<String> = Vec::new();
		if self.mcc != 0 {
			parts.push(format!("mcc{}", self.mcc));
		}
		if self.mnc != 0 {
			parts.push(format!("mnc{}", self.mnc));
		}
		if let Some(language) = &self.language {
			parts.push(language.clone());
		}
		if let Some(region) = &self.region {
			parts.push(format!("r{region}"));
		}
		match self.layout_direction {
			LayoutDirection::Any => {}
			LayoutDirection::Ltr => parts.push("ldltr".into()),
			LayoutDirection::Rtl => parts.push("ldrtl".into()),
		}
		if self.smallest_width_dp != 0 {
			parts.push(format!("sw{}dp", self.smallest_width_dp));
		}
		if self.screen_width_dp != 0 {
			parts.push(format!("w{}dp", self.screen_width_dp));
		}
		if self.screen_height_dp != 0 {
			parts.push(format!("h{}dp", self.screen_height_dp));
		}
		match self.orientation {
			Orientation::Any => {}
			Orientation::Portrait => parts.push("port".into()),
			Orientation::Landscape => parts.push("land".into()),
			Orientation::Square => parts.push("square".into()),
		}
		match self.night_mode {
			NightMode::Any => {}
			NightMode::No => parts.push("notnight".into()),
			NightMode::Yes => parts.push("night".into()),
		}
		if self.density != Config::DENSITY_DEFAULT {
			match density_name(self.density) {
				Some(name) => parts.push(name.into()),
				None => parts.push(format!("{}dpi", self.density)),
			}
		}
		if self.sdk_version != 0 {
			parts.push(format!("v{}", self.sdk_version));
		}
		f.write_str(&parts.join("-"))
	}
}
