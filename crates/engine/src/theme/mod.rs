#![cfg_attr(doc, allow(rustdoc::private_intra_doc_links))]
//! Themes: mutable attribute tables built from style bags.
//!
//! # Purpose
//!
//! A [`Theme`] maps attribute ids to values. Styles are applied on top of
//! each other; lookups follow attribute indirections inside the theme, then
//! references through the owning engine.
//!
//! # Mental Model
//!
//! Storage is sparse by id component: package slot, then type slot, then a
//! dense entry array that grows on demand. A slot whose value is the
//! undefined null is vacant; the `@empty` null is a real value.
//!
//! # Invariants
//!
//! - Without `force`, applying a style never overwrites an occupied slot.
//!   - Enforced in: [`Theme::apply_style`]
//!   - Tested by: `theme::tests::unforced_apply_keeps_existing_values`
//! - Attribute chains longer than [`MAX_ATTRIBUTE_HOPS`] resolve to nothing.
//!   - Enforced in: [`Theme::attribute`]
//!   - Tested by: `theme::tests::long_attribute_chain_is_cut_off`
//! - A theme is only used with the engine that created it.
//!   - Enforced in: [`Theme::apply_style`], [`Theme::set_to`], [`Theme::resolve_attribute_reference`]
//!   - Tested by: `theme::tests::foreign_engine_is_rejected`

use std::fmt::Write as _;

use restable_primitives::{ConfigAxes, ResId, Value, ValueKind};

use crate::ResourceEngine;
use crate::bundle::Cookie;
use crate::engine::EngineId;
use crate::error::ResolveError;
use crate::resolve::SelectedValue;

mod transplant;

#[cfg(test)]
mod tests;

/// Upper bound on attribute-to-attribute indirections inside a theme.
pub const MAX_ATTRIBUTE_HOPS: usize = 20;

/// One attribute slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThemeEntry {
	/// `None` for values not tied to a bundle of the owning engine.
	pub cookie: Option<Cookie>,
	pub type_flags: ConfigAxes,
	pub value: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ThemeType {
	entries: Vec<ThemeEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ThemePackage {
	/// Indexed by type id (1-based); slot 0 stays empty.
	types: Vec<Option<ThemeType>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
	engine: EngineId,
	type_flags: ConfigAxes,
	/// Indexed by runtime package id.
	packages: Vec<Option<ThemePackage>>,
}

impl Theme {
	pub(crate) fn new(engine: EngineId) -> Self {
		Self {
			engine,
			type_flags: ConfigAxes::empty(),
			packages: Vec::new(),
		}
	}

	pub fn engine_id(&self) -> EngineId {
		self.engine
	}

	/// Union of the flags of every applied style.
	pub fn type_flags(&self) -> ConfigAxes {
		self.type_flags
	}

	fn check_engine(&self, engine: &ResourceEngine) -> Result<(), ResolveError> {
		if engine.id() == self.engine { Ok(()) } else { Err(ResolveError::EngineMismatch) }
	}

	pub fn entry(&self, id: ResId) -> Option<&ThemeEntry> {
		self.packages
			.get(id.package_id() as usize)?
			.as_ref()?
			.types
			.get(id.type_id() as usize)?
			.as_ref()?
			.entries
			.get(id.entry_id() as usize)
	}

	/// Slot for `id`, growing storage as needed.
	pub(crate) fn slot_mut(&mut self, id: ResId) -> &mut ThemeEntry {
		let p = id.package_id() as usize;
		if self.packages.len() <= p {
			self.packages.resize_with(p + 1, || None);
		}
		let package = self.packages[p].get_or_insert_with(ThemePackage::default);

		let t = id.type_id() as usize;
		if package.types.len() <= t {
			package.types.resize_with(t + 1, || None);
		}
		let ty = package.types[t].get_or_insert_with(ThemeType::default);

		let e = id.entry_id() as usize;
		if ty.entries.len() <= e {
			ty.entries.resize(e + 1, ThemeEntry::default());
		}
		&mut ty.entries[e]
	}

	/// Applies the flattened bag `style`. Existing values are only replaced
	/// when `force` is set.
	///
	/// Every key is checked before anything is written, so a bag with an
	/// invalid key leaves the theme untouched.
	pub fn apply_style(&mut self, engine: &ResourceEngine, style: ResId, force: bool) -> Result<(), ResolveError> {
		self.check_engine(engine)?;
		let bag = engine.bag(style)?;
		if let Some(bad) = bag.entries().iter().find(|e| !e.key.is_valid()) {
			tracing::warn!(%style, key = %bad.key, "style has an invalid attribute key");
			return Err(ResolveError::InvalidId(bad.key));
		}

		let flags = bag.type_flags();
		self.type_flags |= flags;
		for item in bag.entries().iter().rev() {
			let slot = self.slot_mut(item.key);
			if force || slot.value.is_unset() {
				slot.cookie = Some(item.cookie);
				slot.type_flags |= flags;
				slot.value = item.value;
			}
		}
		tracing::trace!(%style, force, items = bag.len(), "applied style");
		Ok(())
	}

	/// Looks up attribute `id`, following attribute values inside the theme.
	///
	/// Vacant slots and chains longer than [`MAX_ATTRIBUTE_HOPS`] give
	/// `None`; `@empty` is a value.
	pub fn attribute(&self, id: ResId) -> Option<SelectedValue> {
		let mut current = id;
		let mut flags = ConfigAxes::empty();
		let mut hops = MAX_ATTRIBUTE_HOPS;
		loop {
			let entry = self.entry(current)?;
			flags |= entry.type_flags;
			if entry.value.kind == ValueKind::Attribute {
				if hops == 0 {
					tracing::debug!(attr = %id, "attribute chain too long");
					return None;
				}
				hops -= 1;
				current = ResId(entry.value.data);
				continue;
			}
			if entry.value.is_unset() {
				return None;
			}
			return Some(SelectedValue {
				cookie: entry.cookie,
				flags,
				..SelectedValue::new(entry.value)
			});
		}
	}

	/// Resolves `value` against this theme, then follows references through
	/// `engine`. Non-attribute values only go through reference resolution.
	pub fn resolve_attribute_reference(&self, engine: &ResourceEngine, value: SelectedValue) -> Result<SelectedValue, ResolveError> {
		self.check_engine(engine)?;
		if value.value.kind != ValueKind::Attribute {
			return engine.resolve_reference(value);
		}
		let attr = ResId(value.value.data);
		let found = self.attribute(attr).ok_or(ResolveError::NoEntry(attr))?;
		let mut resolved = engine.resolve_reference(found)?;
		resolved.flags |= value.flags;
		Ok(resolved)
	}

	pub fn clear(&mut self) {
		self.type_flags = ConfigAxes::empty();
		self.packages.clear();
	}

	/// Makes this theme a copy of `other`.
	///
	/// Both themes must belong to the engines passed with them. Across
	/// engines, cookies and package ids are remapped by bundle path; values
	/// that cannot be remapped are dropped.
	pub fn set_to(&mut self, engine: &ResourceEngine, other: &Theme, other_engine: &ResourceEngine) -> Result<(), ResolveError> {
		self.check_engine(engine)?;
		other.check_engine(other_engine)?;
		if engine.id() == other_engine.id() {
			self.type_flags = other.type_flags;
			self.packages = other.packages.clone();
			return Ok(());
		}
		transplant::transplant(self, engine, other, other_engine);
		Ok(())
	}

	/// Occupied slots in id order.
	pub fn entries(&self) -> impl Iterator<Item = (ResId, &ThemeEntry)> + '_ {
		self.packages.iter().enumerate().flat_map(|(p, package)| {
			package.iter().flat_map(move |package| {
				package.types.iter().enumerate().flat_map(move |(t, ty)| {
					ty.iter().flat_map(move |ty| {
						ty.entries
							.iter()
							.enumerate()
							.filter(|(_, e)| !e.value.is_unset())
							.map(move |(e, entry)| (ResId::new(p as u8, t as u8, e as u16), entry))
					})
				})
			})
		})
	}

	/// Lists the occupied slots. The text is also emitted at info level.
	pub fn dump(&self) -> String {
		let mut out = format!("Theme {:?} flags {:?}", self.engine, self.type_flags);
		for (id, entry) in self.entries() {
			let cookie = entry.cookie.map_or_else(|| "-".to_string(), |c| c.to_string());
			let _ = write!(out, "\n  {id}: {} (cookie {cookie}, flags {:?})", entry.value, entry.type_flags);
		}
		tracing::info!("{out}");
		out
	}
}
