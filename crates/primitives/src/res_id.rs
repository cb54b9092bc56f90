use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Build-time package id reserved for the base platform package.
pub const SYSTEM_PACKAGE_ID: u8 = 0x01;

/// Build-time package id conventionally used by application packages.
pub const APP_PACKAGE_ID: u8 = 0x7f;

/// A packed 32-bit resource identifier: `0xPPTTEEEE`.
///
/// - `PP`: package id (0 is invalid for lookups, but appears in references
///   local to a shared library).
/// - `TT`: type id, 1-based. Use [`ResId::type_index`] for the 0-based form.
/// - `EEEE`: entry index into the type's entry table.
///
/// A `ResId` is never interpreted as a table slot before its package id has
/// been resolved through the runtime registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResId(pub u32);

impl ResId {
	/// The null identifier.
	pub const NONE: ResId = ResId(0);

	/// Packs a package id, 1-based type id and entry index.
	#[inline]
	pub const fn new(package_id: u8, type_id: u8, entry_id: u16) -> Self {
		Self(((package_id as u32) << 24) | ((type_id as u32) << 16) | entry_id as u32)
	}

	/// Returns the raw packed value.
	#[inline]
	pub const fn get(self) -> u32 {
		self.0
	}

	#[inline]
	pub const fn package_id(self) -> u8 {
		(self.0 >> 24) as u8
	}

	/// Returns the 1-based type id.
	#[inline]
	pub const fn type_id(self) -> u8 {
		(self.0 >> 16) as u8
	}

	/// Returns the 0-based type index, or `None` when the type id is 0.
	#[inline]
	pub const fn type_index(self) -> Option<u8> {
		match self.type_id() {
			0 => None,
			t => Some(t - 1),
		}
	}

	#[inline]
	pub const fn entry_id(self) -> u16 {
		self.0 as u16
	}

	/// True when package and type ids are both non-zero.
	#[inline]
	pub const fn is_valid(self) -> bool {
		self.package_id() != 0 && self.type_id() != 0
	}

	/// True when the id carries a package but no type.
	///
	/// Such ids are internal bag keys (array indices, plural quantities, enum
	/// values) rather than references, and must never be rewritten through a
	/// dynamic reference table.
	#[inline]
	pub const fn is_internal(self) -> bool {
		(self.0 & 0xffff_0000) != 0 && (self.0 & 0x00ff_0000) == 0
	}

	/// Returns this id with its package byte replaced.
	#[inline]
	pub const fn with_package(self, package_id: u8) -> Self {
		Self((self.0 & 0x00ff_ffff) | ((package_id as u32) << 24))
	}

	#[inline]
	pub const fn is_none(self) -> bool {
		self.0 == 0
	}
}

impl From<u32> for ResId {
	fn from(raw: u32) -> Self {
		Self(raw)
	}
}

impl From<ResId> for u32 {
	fn from(id: ResId) -> Self {
		id.0
	}
}

impl fmt::Display for ResId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "0x{:08x}", self.0)
	}
}

/// Failure to parse a textual resource id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseResIdError {
	#[error("resource id must start with 0x: {0:?}")]
	MissingPrefix(String),
	#[error("invalid hex resource id {0:?}")]
	InvalidHex(String),
}

impl FromStr for ResId {
	type Err = ParseResIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let digits = s
			.strip_prefix("0x")
			.or_else(|| s.strip_prefix("0X"))
			.ok_or_else(|| ParseResIdError::MissingPrefix(s.to_string()))?;
		u32::from_str_radix(digits, 16)
			.map(ResId)
			.map_err(|_| ParseResIdError::InvalidHex(s.to_string()))
	}
}
