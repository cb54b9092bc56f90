use std::sync::Arc;

use restable_primitives::{ConfigAxes, ResId};
use rustc_hash::FxHashMap as HashMap;

use super::Bag;

/// Flattened bags and their style stacks, keyed by runtime id.
#[derive(Debug, Default)]
pub(crate) struct BagCache {
	bags: HashMap<ResId, Arc<Bag>>,
	stacks: HashMap<ResId, Vec<ResId>>,
}

impl BagCache {
	pub(crate) fn bag(&self, id: ResId) -> Option<&Arc<Bag>> {
		self.bags.get(&id)
	}

	pub(crate) fn stack(&self, id: ResId) -> Option<&[ResId]> {
		self.stacks.get(&id).map(Vec::as_slice)
	}

	pub(crate) fn insert(&mut self, id: ResId, bag: Arc<Bag>, stack: Vec<ResId>) {
		self.bags.insert(id, bag);
		self.stacks.insert(id, stack);
	}

	pub(crate) fn insert_stack(&mut self, id: ResId, stack: Vec<ResId>) {
		self.stacks.insert(id, stack);
	}

	pub(crate) fn len(&self) -> usize {
		self.bags.len()
	}

	/// Clears every stack, and every bag that depends on an axis in `diff`.
	/// Returns how many bags were evicted.
	pub(crate) fn invalidate(&mut self, diff: ConfigAxes) -> usize {
		self.stacks.clear();
		let before = self.bags.len();
		if diff.is_everything() {
			self.bags.clear();
		} else {
			self.bags.retain(|_, bag| !bag.type_flags().intersects(diff));
		}
		before - self.bags.len()
	}
}
