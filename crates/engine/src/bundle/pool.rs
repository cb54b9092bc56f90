use std::sync::Arc;

use rustc_hash::FxHashMap as HashMap;

/// Immutable string table addressed by index.
#[derive(Debug, Clone, Default)]
pub struct StringPool {
	strings: Vec<Arc<str>>,
}

impl StringPool {
	pub fn get(&self, index: u32) -> Option<&str> {
		self.strings.get(index as usize).map(|s| &**s)
	}

	pub(crate) fn get_arc(&self, index: u32) -> Option<&Arc<str>> {
		self.strings.get(index as usize)
	}

	pub fn position(&self, needle: &str) -> Option<u32> {
		self.strings.iter().position(|s| &**s == needle).map(|i| i as u32)
	}

	pub fn len(&self) -> usize {
		self.strings.len()
	}

	pub fn is_empty(&self) -> bool {
		self.strings.is_empty()
	}
}

/// Interning builder for [`StringPool`].
#[derive(Debug, Default)]
pub(crate) struct StringPoolBuilder {
	strings: Vec<Arc<str>>,
	index: HashMap<Arc<str>, u32>,
}

impl StringPoolBuilder {
	pub(crate) fn intern(&mut self, s: &str) -> u32 {
		if let Some(&i) = self.index.get(s) {
			return i;
		}
		let i = self.strings.len() as u32;
		let s: Arc<str> = Arc::from(s);
		self.strings.push(s.clone());
		self.index.insert(s, i);
		i
	}

	pub(crate) fn build(self) -> StringPool {
		StringPool { strings: self.strings }
	}
}
