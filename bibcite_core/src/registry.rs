use std::collections::HashMap;

use serde::Serialize;

/// Citation numbers keyed by citation key, in the order keys were first seen.
///
/// Numbers start at 1 and grow by one for every new key. A key keeps its
/// number for the lifetime of the registry and there is no way to remove one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitationRegistry {
	numbers: HashMap<String, usize>,
	order: Vec<String>,
}

/// One registry row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryEntry<'a> {
	pub key: &'a str,
	pub number: usize,
}

impl CitationRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Return the number for `key`, assigning the next one on first sight.
	pub fn number_of(&mut self, key: &str) -> usize {
		if let Some(&number) = self.numbers.get(key) {
			return number;
		}

		self.order.push(key.to_string());
		let number = self.order.len();
		self.numbers.insert(key.to_string(), number);
		number
	}

	/// The number already assigned to `key`, if any.
	pub fn get(&self, key: &str) -> Option<usize> {
		self.numbers.get(key).copied()
	}

	pub fn contains(&self, key: &str) -> bool {
		self.numbers.contains_key(key)
	}

	pub fn len(&self) -> usize {
		self.order.len()
	}

	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}

	/// Entries sorted by ascending number.
	pub fn iter(&self) -> impl Iterator<Item = RegistryEntry<'_>> {
		self.order
			.iter()
			.enumerate()
			.map(|(index, key)| RegistryEntry { key, number: index + 1 })
	}

	/// Keys sorted by ascending number.
	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.order.iter().map(String::as_str)
	}
}
