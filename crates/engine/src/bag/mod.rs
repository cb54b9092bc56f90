#![cfg_attr(doc, allow(rustdoc::private_intra_doc_links))]
//! Flattened bags.
//!
//! # Purpose
//!
//! A bag (style, array, plural) is an ordered key/value list that may name a
//! parent. [`ResourceEngine::bag`] returns the bag merged with its whole
//! parent chain, keys rewritten to runtime ids, sorted by key, and caches the
//! result.
//!
//! # Mental Model
//!
//! - The child's items are rewritten through its group's table and sorted.
//! - The parent is fetched recursively (from cache when possible), then the
//!   two sorted lists are merged from the back; on equal keys the child's
//!   item wins.
//! - The merged bag's flags are the union of every ancestor's entry flags,
//!   so a configuration change evicts it when any link in the chain could
//!   change.
//!
//! # Invariants
//!
//! - Entries are strictly ascending by key.
//!   - Enforced in: [`merge_reverse`], [`ResourceEngine::rewrite_items`]
//!   - Tested by: `bag::tests::prop_merge_is_sorted_and_child_wins`
//! - A parent chain that loops terminates; the repeated parent is ignored.
//!   - Enforced in: [`ResourceEngine::bag`] (visited list)
//!   - Tested by: `bag::tests::parent_cycle_terminates`
//! - Internal keys (package set, type zero) are never rewritten.
//!   - Enforced in: [`ResourceEngine::rewrite_items`]
//!   - Tested by: `bag::tests::internal_keys_are_kept`

use std::sync::Arc;

use restable_primitives::{ConfigAxes, ResId, Value};
use smallvec::SmallVec;

use crate::ResourceEngine;
use crate::bundle::{Cookie, MapHandle};
use crate::error::ResolveError;
use crate::resolve::{EntryData, ResolvedEntry};

mod cache;

pub(crate) use cache::BagCache;


type Visited = SmallVec<[ResId; 8]>;

/// One item of a flattened bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BagEntry {
	pub key: ResId,
	/// Bundle the item's value came from.
	pub cookie: Cookie,
	pub value: Value,
	/// Bag in the parent chain that supplied the item.
	pub style: ResId,
}

/// A bag merged with its parents, sorted by key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bag {
	entries: Vec<BagEntry>,
	type_flags: ConfigAxes,
}

impl Bag {
	pub fn entries(&self) -> &[BagEntry] {
		&self.entries
	}

	pub fn type_flags(&self) -> ConfigAxes {
		self.type_flags
	}

	pub fn get(&self, key: ResId) -> Option<&BagEntry> {
		self.entries.binary_search_by_key(&key, |e| e.key).ok().map(|i| &self.entries[i])
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// Merges two key-sorted lists; on equal keys `child` wins.
pub(crate) fn merge_reverse(child: &[BagEntry], parent: &[BagEntry]) -> Vec<BagEntry> {
	let mut out = vec![BagEntry::default(); child.len() + parent.len()];
	let (mut c, mut p, mut w) = (child.len(), parent.len(), out.len());

	while c > 0 && p > 0 {
		let (ce, pe) = (child[c - 1], parent[p - 1]);
		w -= 1;
		if ce.key >= pe.key {
			out[w] = ce;
			c -= 1;
			if ce.key == pe.key {
				p -= 1;
			}
		} else {
			out[w] = pe;
			p -= 1;
		}
	}
	while c > 0 {
		c -= 1;
		w -= 1;
		out[w] = child[c];
	}
	while p > 0 {
		p -= 1;
		w -= 1;
		out[w] = parent[p];
	}

	out.drain(..w);
	out.shrink_to_fit();
	out
}

fn decode_map(id: ResId, map: &MapHandle) -> Result<(ResId, Vec<(ResId, Value)>), ResolveError> {
	let decoded = map.parent().and_then(|parent| Ok((parent, map.items()?)));
	decoded.map_err(|err| {
		tracing::warn!(%id, error = %err, "unreadable bag");
		ResolveError::NoEntry(id)
	})
}

impl ResourceEngine {
	/// Returns the bag `id` merged with its parent chain.
	pub fn bag(&self, id: ResId) -> Result<Arc<Bag>, ResolveError> {
		let mut visited = Visited::new();
		self.bag_inner(id, &mut visited)
	}

	fn bag_inner(&self, id: ResId, visited: &mut Visited) -> Result<Arc<Bag>, ResolveError> {
		{
			let cache = self.bags.lock();
			if let Some(bag) = cache.bag(id) {
				match cache.stack(id) {
					Some(stack) => visited.extend_from_slice(stack),
					None => visited.push(id),
				}
				return Ok(bag.clone());
			}
		}

		let entry = self.find_entry(id, 0, false, None)?;
		let EntryData::Map(map) = &entry.data else {
			return Err(ResolveError::NotComplex(id));
		};
		let (parent, items) = decode_map(id, map)?;

		let start = visited.len();
		visited.push(id);
		let own = self.rewrite_items(id, &entry, &items)?;

		let bag = match self.rewrite_parent(id, &entry, parent)? {
			Some(parent) if visited.contains(&parent) => {
				tracing::debug!(bag = %id, %parent, "bag parent cycle, ignoring parent");
				Bag {
					entries: own,
					type_flags: entry.type_flags,
				}
			}
			Some(parent) => {
				let parent_bag = self.bag_inner(parent, visited).map_err(|err| {
					tracing::warn!(bag = %id, %parent, error = %err, "failed to resolve bag parent");
					ResolveError::MissingParent { bag: id, parent }
				})?;
				Bag {
					entries: merge_reverse(&own, &parent_bag.entries),
					type_flags: entry.type_flags | parent_bag.type_flags,
				}
			}
			None => Bag {
				entries: own,
				type_flags: entry.type_flags,
			},
		};

		let bag = Arc::new(bag);
		self.bags.lock().insert(id, bag.clone(), visited[start..].to_vec());
		Ok(bag)
	}

	fn rewrite_parent(&self, id: ResId, entry: &ResolvedEntry, parent: ResId) -> Result<Option<ResId>, ResolveError> {
		if parent.is_none() {
			return Ok(None);
		}
		entry
			.ref_table
			.lookup_resource_id(parent)
			.map(Some)
			.map_err(|_| ResolveError::MissingParent { bag: id, parent })
	}

	/// Rewrites keys and values to runtime ids and sorts by key.
	fn rewrite_items(&self, id: ResId, entry: &ResolvedEntry, items: &[(ResId, Value)]) -> Result<Vec<BagEntry>, ResolveError> {
		let mut out: Vec<BagEntry> = Vec::with_capacity(items.len());
		let mut sorted = true;
		for &(key, value) in items {
			let key = if key.is_internal() {
				key
			} else {
				entry.ref_table.lookup_resource_id(key).inspect_err(|_| {
					tracing::warn!(bag = %id, %key, "failed to rewrite bag key");
				})?
			};
			let value = entry.ref_table.lookup_resource_value(value).inspect_err(|_| {
				tracing::warn!(bag = %id, %key, "failed to rewrite bag value");
			})?;
			if out.last().is_some_and(|prev| prev.key > key) {
				sorted = false;
			}
			out.push(BagEntry {
				key,
				cookie: entry.cookie,
				value,
				style: id,
			});
		}
		if !sorted {
			out.sort_by_key(|e| e.key);
		}
		Ok(out)
	}

	/// Ids of `id` and its ancestors, child first.
	pub fn bag_res_id_stack(&self, id: ResId) -> Result<Vec<ResId>, ResolveError> {
		if let Some(stack) = self.bags.lock().stack(id) {
			return Ok(stack.to_vec());
		}

		let mut stack = Visited::new();
		let mut current = id;
		loop {
			stack.push(current);
			let entry = self.find_entry(current, 0, false, None)?;
			let EntryData::Map(map) = &entry.data else {
				return Err(ResolveError::NotComplex(current));
			};
			let (parent, _) = decode_map(current, map)?;
			match self.rewrite_parent(current, &entry, parent)? {
				Some(parent) if !stack.contains(&parent) => current = parent,
				_ => break,
			}
		}

		let stack = stack.to_vec();
		self.bags.lock().insert_stack(id, stack.clone());
		Ok(stack)
	}
}
