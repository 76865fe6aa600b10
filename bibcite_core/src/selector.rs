use std::fmt::Display;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::CiteError;
use crate::CiteResult;
use crate::Element;

/// A compound selector: an optional tag name followed by class, id and
/// attribute conditions, e.g. `ol.sources-list` or `[data-cite]`.
///
/// Combinators and pseudo classes aren't supported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Selector {
	source: String,
	tag: Option<String>,
	conditions: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Condition {
	Class(String),
	Id(String),
	Attribute { name: String, value: Option<String> },
}

fn is_name_char(ch: char) -> bool {
	ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_')
}

struct SelectorParser<'a> {
	source: &'a str,
	chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> SelectorParser<'a> {
	fn new(source: &'a str) -> Self {
		Self {
			source,
			chars: source.char_indices().peekable(),
		}
	}

	fn error(&self, reason: impl Into<String>) -> CiteError {
		CiteError::InvalidSelector {
			selector: self.source.to_string(),
			reason: reason.into(),
		}
	}

	fn read_name(&mut self) -> String {
		let mut name = String::new();
		while let Some(&(_, ch)) = self.chars.peek() {
			if !is_name_char(ch) {
				break;
			}
			name.push(ch);
			self.chars.next();
		}
		name
	}

	fn read_required_name(&mut self, what: &str) -> CiteResult<String> {
		let name = self.read_name();
		if name.is_empty() {
			return Err(self.error(format!("expected {what} name")));
		}
		Ok(name)
	}

	fn read_attribute(&mut self) -> CiteResult<Condition> {
		let name = self.read_required_name("attribute")?;

		match self.chars.next() {
			Some((_, ']')) => Ok(Condition::Attribute { name, value: None }),
			Some((_, '=')) => {
				let value = self.read_attribute_value()?;
				Ok(Condition::Attribute {
					name,
					value: Some(value),
				})
			}
			Some((_, ch)) => Err(self.error(format!("unexpected `{ch}` in attribute condition"))),
			None => Err(self.error("missing `]`")),
		}
	}

	fn read_attribute_value(&mut self) -> CiteResult<String> {
		let quote = match self.chars.peek() {
			Some(&(_, ch @ ('"' | '\''))) => {
				self.chars.next();
				Some(ch)
			}
			_ => None,
		};

		let mut value = String::new();
		loop {
			match (self.chars.next(), quote) {
				(Some((_, ch)), Some(q)) if ch == q => {
					return match self.chars.next() {
						Some((_, ']')) => Ok(value),
						_ => Err(self.error("missing `]`")),
					};
				}
				(Some((_, ']')), None) => return Ok(value.trim().to_string()),
				(Some((_, ch)), _) => value.push(ch),
				(None, Some(_)) => return Err(self.error("unterminated quoted value")),
				(None, None) => return Err(self.error("missing `]`")),
			}
		}
	}

	fn parse(mut self) -> CiteResult<Selector> {
		if self.source.is_empty() {
			return Err(self.error("selector is empty"));
		}

		let tag = match self.chars.peek() {
			Some(&(_, '*')) => {
				self.chars.next();
				None
			}
			Some(&(_, ch)) if is_name_char(ch) => Some(self.read_name().to_ascii_lowercase()),
			_ => None,
		};

		let mut conditions = Vec::new();
		while let Some((_, ch)) = self.chars.next() {
			let condition = match ch {
				'.' => Condition::Class(self.read_required_name("class")?),
				'#' => Condition::Id(self.read_required_name("id")?),
				'[' => self.read_attribute()?,
				other => return Err(self.error(format!("unsupported character `{other}`"))),
			};
			conditions.push(condition);
		}

		Ok(Selector {
			source: self.source.to_string(),
			tag,
			conditions,
		})
	}
}

impl Selector {
	pub fn parse(source: impl AsRef<str>) -> CiteResult<Self> {
		SelectorParser::new(source.as_ref().trim()).parse()
	}

	pub fn as_str(&self) -> &str {
		&self.source
	}

	/// The first class this selector requires, used to name elements created
	/// for it.
	pub fn class_name(&self) -> Option<&str> {
		self.conditions.iter().find_map(|condition| {
			match condition {
				Condition::Class(class) => Some(class.as_str()),
				_ => None,
			}
		})
	}

	pub fn matches(&self, element: &Element) -> bool {
		if let Some(tag) = &self.tag {
			if !element.name.eq_ignore_ascii_case(tag) {
				return false;
			}
		}

		self.conditions.iter().all(|condition| {
			match condition {
				Condition::Class(class) => element.has_class(class),
				Condition::Id(id) => element.attribute("id") == Some(id.as_str()),
				Condition::Attribute { name, value: None } => element.attribute(name).is_some(),
				Condition::Attribute {
					name,
					value: Some(value),
				} => element.attribute(name) == Some(value.as_str()),
			}
		})
	}
}

impl FromStr for Selector {
	type Err = CiteError;

	fn from_str(source: &str) -> Result<Self, Self::Err> {
		Self::parse(source)
	}
}

impl TryFrom<String> for Selector {
	type Error = CiteError;

	fn try_from(source: String) -> Result<Self, Self::Error> {
		Self::parse(source)
	}
}

impl From<Selector> for String {
	fn from(selector: Selector) -> Self {
		selector.source
	}
}

impl Display for Selector {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.source)
	}
}
