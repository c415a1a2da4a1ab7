//! Ordered keyed collection feeding the engine.

use log::debug;

/// Items stored in a [`DataSet`] are addressed by a string key.
pub trait Keyed {
	fn key(&self) -> &str;
}

/// Insertion-ordered collection of keyed items.
///
/// Every mutation bumps [`DataSet::revision`], which the engine compares
/// against the revision it last synced to decide whether to rebuild.
#[derive(Clone, Debug)]
pub struct DataSet<T> {
	items: Vec<T>,
	revision: u64,
}

impl<T> Default for DataSet<T> {
	fn default() -> Self {
		Self {
			items: Vec::new(),
			revision: 0,
		}
	}
}

impl<T: Keyed> DataSet<T> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts an item, replacing any existing item with the same key in place.
	pub fn add(&mut self, item: T) {
		match self.index_of(item.key()) {
			Some(idx) => {
				debug!("network: replacing existing item {}", item.key());
				self.items[idx] = item;
			}
			None => self.items.push(item),
		}
		self.revision += 1;
	}

	/// Applies `f` to the item with `key`. Returns `false` if there is none.
	pub fn update(&mut self, key: &str, f: impl FnOnce(&mut T)) -> bool {
		let Some(idx) = self.index_of(key) else {
			return false;
		};
		f(&mut self.items[idx]);
		self.revision += 1;
		true
	}

	pub fn remove(&mut self, key: &str) -> Option<T> {
		let idx = self.index_of(key)?;
		self.revision += 1;
		Some(self.items.remove(idx))
	}

	pub fn get(&self, key: &str) -> Option<&T> {
		self.items.iter().find(|i| i.key() == key)
	}

	pub fn contains(&self, key: &str) -> bool {
		self.index_of(key).is_some()
	}

	/// Replaces the whole content.
	pub fn replace(&mut self, items: impl IntoIterator<Item = T>) {
		self.items.clear();
		for item in items {
			match self.index_of(item.key()) {
				Some(idx) => self.items[idx] = item,
				None => self.items.push(item),
			}
		}
		self.revision += 1;
	}

	pub fn iter(&self) -> impl Iterator<Item = &T> {
		self.items.iter()
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn revision(&self) -> u64 {
		self.revision
	}

	fn index_of(&self, key: &str) -> Option<usize> {
		self.items.iter().position(|i| i.key() == key)
	}
}
