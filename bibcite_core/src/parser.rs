use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde::Serialize;

use crate::lexer::tokenize_fields;

/// Lines whose first non-blank character is `%`.
static COMMENT_LINE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?m)^[ \t]*%.*$").expect("valid comment line pattern"));

/// `@comment{...}` blocks, in any letter case.
static COMMENT_RECORD: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)@comment\s*\{[^}]*\}").expect("valid comment record pattern")
});

/// `@type{key, body` up to the first closing brace that starts a line.
static RECORD: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"@([A-Za-z0-9_]+)\s*\{\s*([^,\s]+)\s*,((?s:.)*?)\n\}\s*")
		.expect("valid record pattern")
});

/// One parsed bibliography item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
	/// The citation key exactly as written in the source.
	pub key: String,
	/// The lowercased record type, e.g. `article`.
	pub r#type: String,
	/// Lowercased field names mapped to cleaned values.
	pub fields: BTreeMap<String, String>,
}

impl Record {
	/// The value of a field, treating an empty value as absent.
	pub fn field(&self, name: &str) -> Option<&str> {
		self.fields
			.get(name)
			.map(|value| value.trim())
			.filter(|value| !value.is_empty())
	}
}

/// Records in source order, addressable by key.
///
/// A key that appears twice keeps its first position and takes the later
/// record's contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStore {
	records: Vec<Record>,
	index: HashMap<String, usize>,
}

impl RecordStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, record: Record) {
		if let Some(&position) = self.index.get(&record.key) {
			self.records[position] = record;
		} else {
			self.index.insert(record.key.clone(), self.records.len());
			self.records.push(record);
		}
	}

	pub fn get(&self, key: &str) -> Option<&Record> {
		self.index.get(key).map(|&position| &self.records[position])
	}

	pub fn contains(&self, key: &str) -> bool {
		self.index.contains_key(key)
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Record> {
		self.records.iter()
	}
}

impl FromIterator<Record> for RecordStore {
	fn from_iter<T: IntoIterator<Item = Record>>(iter: T) -> Self {
		let mut store = Self::new();
		for record in iter {
			store.insert(record);
		}
		store
	}
}

impl<'a> IntoIterator for &'a RecordStore {
	type IntoIter = std::slice::Iter<'a, Record>;
	type Item = &'a Record;

	fn into_iter(self) -> Self::IntoIter {
		self.records.iter()
	}
}

/// Remove comment lines and `@comment` blocks before records are scanned.
pub fn strip_comments(content: &str) -> String {
	let without_lines = COMMENT_LINE.replace_all(content, "");
	COMMENT_RECORD.replace_all(&without_lines, "").into_owned()
}

/// Parse bibliography text into records.
///
/// Parsing never fails: text that doesn't look like a record is skipped, and
/// a record whose body is malformed keeps the fields read before the problem.
/// Text without any record yields an empty store.
pub fn parse_bibliography(content: impl AsRef<str>) -> RecordStore {
	let text = strip_comments(content.as_ref());
	let mut store = RecordStore::new();

	for captures in RECORD.captures_iter(&text) {
		let r#type = captures[1].to_lowercase();
		let key = captures[2].trim().to_string();
		let fields = tokenize_fields(&captures[3]);

		tracing::trace!(%key, record_type = %r#type, fields = fields.len(), "parsed record");
		store.insert(Record { key, r#type, fields });
	}

	tracing::debug!(records = store.len(), "parsed bibliography");
	store
}
