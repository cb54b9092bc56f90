use std::fmt;

use super::{Config, ConfigAxes, LayoutDirection, NightMode, Orientation};

/// Configuration semantics the resolution engine depends on.
///
/// These three functions are the only place axis meaning lives; the engine
/// treats [`Config`] values as opaque otherwise.
///
/// # Contract
///
/// - `matches(candidate, desired)`: `candidate` may be used on a device
///   described by `desired`.
/// - `is_better_than(a, b, desired)`: a strict order over candidates that
///   both match `desired`. Irreflexive: `is_better_than(a, a, _)` is false.
/// - `diff(old, new)`: axes that changed between two device configurations.
pub trait ConfigMatcher: Send + Sync + fmt::Debug {
	fn matches(&self, candidate: &Config, desired: &Config) -> bool;

	fn is_better_than(&self, a: &Config, b: &Config, desired: &Config) -> bool;

	fn diff(&self, old: &Config, new: &Config) -> ConfigAxes {
		old.diff(new)
	}
}

/// Stock matcher: qualified axes must equal (or, for size and version axes,
/// not exceed) the device value; more specific candidates win, axis by axis
/// in precedence order.
///
/// Precedence: mcc, mnc, language, region, layout direction, smallest width,
/// screen width, screen height, orientation, night mode, density, sdk version.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualifierMatcher;

fn unqualified_or_equal<T: PartialEq + Default>(candidate: &T, desired: &T) -> bool {
	*candidate == T::default() || candidate == desired
}

fn fits_within(candidate: u16, desired: u16) -> bool {
	candidate == 0 || candidate <= desired
}

/// Prefers the dimension closest to (not above) the requested size.
fn closer_dimension(a: u16, b: u16, requested: u16) -> Option<bool> {
	if a == b || requested == 0 {
		return None;
	}
	let delta_a = requested.saturating_sub(a);
	let delta_b = requested.saturating_sub(b);
	if delta_a == delta_b {
		return None;
	}
	Some(delta_a < delta_b)
}

/// Density bucket selection.
///
/// `DENSITY_ANY` always wins over a scaled bucket. Otherwise, when the request
/// lies above both buckets the larger wins, below both the smaller wins, and
/// in between the larger wins unless scaling the smaller up is cheaper.
fn better_density(a: u16, b: u16, requested: u16) -> Option<bool> {
	if a == b {
		return None;
	}
	let effective = |d: u16| if d == Config::DENSITY_DEFAULT { Config::DENSITY_MEDIUM } else { d };
	let (this, other) = (effective(a), effective(b));
	if this == Config::DENSITY_ANY {
		return Some(true);
	}
	if other == Config::DENSITY_ANY {
		return Some(false);
	}
	if this == other {
		return None;
	}

	let requested = match requested {
		Config::DENSITY_DEFAULT | Config::DENSITY_ANY => Config::DENSITY_MEDIUM,
		d => d,
	} as i64;

	let (mut high, mut low, mut a_is_higher) = (this as i64, other as i64, true);
	if low > high {
		std::mem::swap(&mut high, &mut low);
		a_is_higher = false;
	}

	if requested >= high {
		return Some(a_is_higher);
	}
	if low >= requested {
		return Some(!a_is_higher);
	}
	if (2 * low - requested) * high > requested * requested {
		Some(!a_is_higher)
	} else {
		Some(a_is_higher)
	}
}

impl ConfigMatcher for QualifierMatcher {
	fn matches(&self, candidate: &Config, desired: &Config) -> bool {
		unqualified_or_equal(&candidate.mcc, &desired.mcc)
			&& unqualified_or_equal(&candidate.mnc, &desired.mnc)
			&& unqualified_or_equal(&candidate.language, &desired.language)
			&& unqualified_or_equal(&candidate.region, &desired.region)
			&& unqualified_or_equal(&candidate.layout_direction, &desired.layout_direction)
			&& fits_within(candidate.smallest_width_dp, desired.smallest_width_dp)
			&& fits_within(candidate.screen_width_dp, desired.screen_width_dp)
			&& fits_within(candidate.screen_height_dp, desired.screen_height_dp)
			&& unqualified_or_equal(&candidate.orientation, &desired.orientation)
			&& unqualified_or_equal(&candidate.night_mode, &desired.night_mode)
			&& fits_within(candidate.sdk_version, desired.sdk_version)
	}

	fn is_better_than(&self, a: &Config, b: &Config, desired: &Config) -> bool {
		if a.mcc != b.mcc && desired.mcc != 0 {
			return a.mcc != 0;
		}
		if a.mnc != b.mnc && desired.mnc != 0 {
			return a.mnc != 0;
		}
		if a.language != b.language && desired.language.is_some() {
			return a.language.is_some();
		}
		if a.region != b.region && desired.region.is_some() {
			return a.region.is_some();
		}
		if a.layout_direction != b.layout_direction && desired.layout_direction != LayoutDirection::Any {
			return a.layout_direction != LayoutDirection::Any;
		}
		if a.smallest_width_dp != b.smallest_width_dp {
			return a.smallest_width_dp > b.smallest_width_dp;
		}
		if let Some(better) = closer_dimension(a.screen_width_dp, b.screen_width_dp, desired.screen_width_dp) {
			return better;
		}
		if let Some(better) = closer_dimension(a.screen_height_dp, b.screen_height_dp, desired.screen_height_dp) {
			return better;
		}
		if a.orientation != b.orientation && desired.orientation != Orientation::Any {
			return a.orientation != Orientation::Any;
		}
		if a.night_mode != b.night_mode && desired.night_mode != NightMode::Any {
			return a.night_mode != NightMode::Any;
		}
		if let Some(better) = better_density(a.density, b.density, desired.density) {
			return better;
		}
		if a.sdk_version != b.sdk_version && desired.sdk_version != 0 {
			return a.sdk_version > b.sdk_version;
		}
		false
	}
}
