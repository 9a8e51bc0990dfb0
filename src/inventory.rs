use indexmap::IndexSet;

/// Items the player has picked up in this room. Items are only ever added.
#[derive(Debug, Default, Clone)]
pub struct Inventory {
	items: IndexSet<String>,
}

impl Inventory {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns true if the item was not held before.
	pub fn grant(&mut self, item: &str) -> bool {
		if self.items.contains(item) {
			return false;
		}
		self.items.insert(item.to_owned())
	}

	pub fn contains(&self, item: &str) -> bool {
		self.items.contains(item)
	}

	/// In the order they were picked up.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.items.iter().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn grant_is_idempotent() {
		let mut inv = Inventory::new();
		assert!(inv.grant("pen"));
		assert!(!inv.grant("pen"));
		assert_eq!(inv.len(), 1);
		assert!(inv.contains("pen"));
		assert!(!inv.contains("key"));
	}

	#[test]
	fn iterates_in_pickup_order() {
		let mut inv = Inventory::new();
		inv.grant("pen");
		inv.grant("key");
		inv.grant("pen");
		assert_eq!(inv.iter().collect::<Vec<_>>(), ["pen", "key"]);
	}
}
