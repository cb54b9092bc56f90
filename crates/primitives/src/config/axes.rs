bitflags::bitflags! {
	/// Configuration axes, used as a variance mask.
	///
	/// A type spec records, per entry, which axes its variants differ on; a
	/// configuration change produces the set of axes that changed. Caches keyed
	/// on resolved data are evicted only when the two masks intersect.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
	pub struct ConfigAxes: u32 {
		const MCC = 0x0001;
		const MNC = 0x0002;
		const LOCALE = 0x0004;
		const ORIENTATION = 0x0080;
		const DENSITY = 0x0100;
		const SCREEN_SIZE = 0x0200;
		const VERSION = 0x0400;
		const UI_MODE = 0x1000;
		const SMALLEST_SCREEN_SIZE = 0x2000;
		const LAYOUT_DIR = 0x4000;
	}
}

impl ConfigAxes {
	/// Mask signalling that every cached value must be discarded.
	pub const EVERYTHING: ConfigAxes = ConfigAxes::from_bits_retain(u32::MAX);

	/// True for the full-reload mask.
	#[inline]
	pub fn is_everything(self) -> bool {
		self.bits() == u32::MAX
	}
}
