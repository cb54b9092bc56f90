use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ResId;

/// Type tag of a [`Value`]. The discriminants are the on-disk encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ValueKind {
	/// No value. `data` distinguishes undefined (0) from `@empty` (1).
	#[default]
	Null = 0x00,
	Reference = 0x01,
	Attribute = 0x02,
	/// Index into the owning bundle's string pool.
	String = 0x03,
	Float = 0x04,
	Dimension = 0x05,
	Fraction = 0x06,
	/// A reference whose package id is build-time and must be rewritten.
	DynamicReference = 0x07,
	/// An attribute whose package id is build-time and must be rewritten.
	DynamicAttribute = 0x08,
	IntDec = 0x10,
	IntHex = 0x11,
	IntBoolean = 0x12,
	IntColorArgb8 = 0x1c,
	IntColorRgb8 = 0x1d,
}

impl ValueKind {
	/// Decodes an on-disk type tag.
	pub const fn from_u8(raw: u8) -> Option<Self> {
		Some(match raw {
			0x00 => Self::Null,
			0x01 => Self::Reference,
			0x02 => Self::Attribute,
			0x03 => Self::String,
			0x04 => Self::Float,
			0x05 => Self::Dimension,
			0x06 => Self::Fraction,
			0x07 => Self::DynamicReference,
			0x08 => Self::DynamicAttribute,
			0x10 => Self::IntDec,
			0x11 => Self::IntHex,
			0x12 => Self::IntBoolean,
			0x1c => Self::IntColorArgb8,
			0x1d => Self::IntColorRgb8,
			_ => return None,
		})
	}

	#[inline]
	pub const fn as_u8(self) -> u8 {
		self as u8
	}

	/// True for kinds whose data is a resource id.
	#[inline]
	pub const fn is_reference_like(self) -> bool {
		matches!(
			self,
			Self::Reference | Self::Attribute | Self::DynamicReference | Self::DynamicAttribute
		)
	}
}

/// A typed scalar resource value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Value {
	pub kind: ValueKind,
	pub data: u32,
}

impl Value {
	/// Null data marking an undefined value.
	pub const DATA_NULL_UNDEFINED: u32 = 0;
	/// Null data marking an explicit `@empty` value.
	pub const DATA_NULL_EMPTY: u32 = 1;

	#[inline]
	pub const fn new(kind: ValueKind, data: u32) -> Self {
		Self { kind, data }
	}

	/// The undefined value. Theme slots start out holding this.
	#[inline]
	pub const fn null() -> Self {
		Self::new(ValueKind::Null, Self::DATA_NULL_UNDEFINED)
	}

	/// An explicit empty value, distinct from undefined.
	#[inline]
	pub const fn empty() -> Self {
		Self::new(ValueKind::Null, Self::DATA_NULL_EMPTY)
	}

	#[inline]
	pub const fn reference(id: ResId) -> Self {
		Self::new(ValueKind::Reference, id.get())
	}

	#[inline]
	pub const fn attribute(id: ResId) -> Self {
		Self::new(ValueKind::Attribute, id.get())
	}

	#[inline]
	pub const fn dynamic_reference(id: ResId) -> Self {
		Self::new(ValueKind::DynamicReference, id.get())
	}

	#[inline]
	pub const fn dynamic_attribute(id: ResId) -> Self {
		Self::new(ValueKind::DynamicAttribute, id.get())
	}

	#[inline]
	pub const fn string(pool_index: u32) -> Self {
		Self::new(ValueKind::String, pool_index)
	}

	#[inline]
	pub const fn int(v: i32) -> Self {
		Self::new(ValueKind::IntDec, v as u32)
	}

	#[inline]
	pub const fn boolean(v: bool) -> Self {
		Self::new(ValueKind::IntBoolean, if v { u32::MAX } else { 0 })
	}

	#[inline]
	pub const fn color(argb: u32) -> Self {
		Self::new(ValueKind::IntColorArgb8, argb)
	}

	#[inline]
	pub fn float(v: f32) -> Self {
		Self::new(ValueKind::Float, v.to_bits())
	}

	/// True for the undefined null value.
	///
	/// Theme writes treat such slots as vacant; attribute lookups treat them
	/// as a hard miss.
	#[inline]
	pub const fn is_unset(&self) -> bool {
		matches!(self.kind, ValueKind::Null) && self.data != Self::DATA_NULL_EMPTY
	}

	#[inline]
	pub const fn is_empty_marker(&self) -> bool {
		matches!(self.kind, ValueKind::Null) && self.data == Self::DATA_NULL_EMPTY
	}

	/// True when the value points at another resource (non-zero id).
	#[inline]
	pub const fn is_reference_like(&self) -> bool {
		self.kind.is_reference_like() && self.data != 0
	}

	/// Returns the referenced id for reference-like values.
	#[inline]
	pub const fn as_res_id(&self) -> Option<ResId> {
		if self.kind.is_reference_like() {
			Some(ResId(self.data))
		} else {
			None
		}
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.kind {
			ValueKind::Null if self.data == Self::DATA_NULL_EMPTY => write!(f, "@empty"),
			ValueKind::Null => write!(f, "@null"),
			ValueKind::Reference | ValueKind::DynamicReference => write!(f, "@0x{:08x}", self.data),
			ValueKind::Attribute | ValueKind::DynamicAttribute => write!(f, "?0x{:08x}", self.data),
			ValueKind::String => write!(f, "string[{}]", self.data),
			ValueKind::Float => write!(f, "{}", f32::from_bits(self.data)),
			ValueKind::IntDec => write!(f, "{}", self.data as i32),
			ValueKind::IntBoolean => write!(f, "{}", self.data != 0),
			ValueKind::IntColorArgb8 | ValueKind::IntColorRgb8 => write!(f, "#{:08x}", self.data),
			_ => write!(f, "(0x{:02x}) 0x{:08x}", self.kind.as_u8(), self.data),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn null_and_empty_are_distinct() {
		assert!(Value::null().is_unset());
		assert!(!Value::empty().is_unset());
		assert!(Value::empty().is_empty_marker());
		assert_eq!(Value::default(), Value::null());
	}

	#[test]
	fn kind_codes_roundtrip() {
		for kind in [
			ValueKind::Null,
			ValueKind::Reference,
			ValueKind::Attribute,
			ValueKind::String,
			ValueKind::DynamicAttribute,
			ValueKind::IntColorRgb8,
		] {
			assert_eq!(ValueKind::from_u8(kind.as_u8()), Some(kind));
		}
		assert_eq!(ValueKind::from_u8(0x42), None);
	}

	#[test]
	fn zero_reference_is_not_reference_like() {
		assert!(!Value::reference(ResId::NONE).is_reference_like());
		assert!(Value::attribute(ResId(0x0101_0000)).is_reference_like());
		assert!(!Value::int(3).is_reference_like());
	}
}
