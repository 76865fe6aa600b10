use std::fmt::Display;
use std::fmt::Write;

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::escape::partial_escape;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;

use crate::CiteError;
use crate::CiteResult;
use crate::Document;
use crate::Element;
use crate::Node;

/// HTML elements that never have content and may be written without a
/// closing tag.
const VOID_ELEMENTS: [&str; 14] = [
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
	"track", "wbr",
];

/// Elements whose content is raw text: it runs up to the closing tag, may
/// contain `<`, and is written back unescaped.
const RAW_TEXT_ELEMENTS: [&str; 3] = ["script", "style", "textarea"];

fn is_void(name: &str) -> bool {
	VOID_ELEMENTS
		.iter()
		.any(|void| void.eq_ignore_ascii_case(name))
}

fn is_raw_text(name: &str) -> bool {
	RAW_TEXT_ELEMENTS
		.iter()
		.any(|raw| raw.eq_ignore_ascii_case(name))
}

/// Markup with the content of every raw text element lifted out, so the
/// XML reader only sees `<script ...></script>`.
struct RawTextSplit {
	markup: String,
	/// Lifted contents in document order.
	contents: Vec<String>,
}

/// The byte offset just past the `>` closing the tag that starts at `start`,
/// skipping quoted attribute values.
fn tag_end(content: &str, start: usize) -> Option<usize> {
	let mut quote = None;
	for (offset, ch) in content[start..].char_indices() {
		match (quote, ch) {
			(Some(open), ch) if ch == open => quote = None,
			(Some(_), _) => {}
			(None, '"' | '\'') => quote = Some(ch),
			(None, '>') => return Some(start + offset + 1),
			(None, _) => {}
		}
	}
	None
}

/// The raw text element name opened by the tag at `start`, if any.
fn raw_text_tag(content: &str, start: usize) -> Option<&'static str> {
	let rest = content.get(start + 1..)?;
	RAW_TEXT_ELEMENTS.into_iter().find(|name| {
		rest.get(..name.len())
			.is_some_and(|prefix| prefix.eq_ignore_ascii_case(name))
			&& rest[name.len()..]
				.chars()
				.next()
				.is_some_and(|next| next == '>' || next == '/' || next.is_ascii_whitespace())
	})
}

/// Position of the `</name` closing tag at or after `from`.
fn find_closing(content: &str, from: usize, name: &str) -> Option<usize> {
	let needle = format!("</{name}");
	content[from..]
		.to_ascii_lowercase()
		.find(&needle)
		.map(|offset| from + offset)
}

fn split_raw_text(content: &str) -> CiteResult<RawTextSplit> {
	let mut split = RawTextSplit {
		markup: String::with_capacity(content.len()),
		contents: Vec::new(),
	};
	let mut cursor = 0;

	while let Some(offset) = content[cursor..].find('<') {
		let start = cursor + offset;

		if content[start..].starts_with("<!--") {
			let end = content[start..]
				.find("-->")
				.map_or(content.len(), |end| start + end + 3);
			split.markup.push_str(&content[cursor..end]);
			cursor = end;
			continue;
		}

		let Some(name) = raw_text_tag(content, start) else {
			// Copy other tags whole so a quoted `<script>` in an attribute stays put.
			let is_tag = content[start + 1..]
				.chars()
				.next()
				.is_some_and(|next| next.is_ascii_alphabetic() || next == '/');
			let end = if is_tag {
				tag_end(content, start).unwrap_or(start + 1)
			} else {
				start + 1
			};
			split.markup.push_str(&content[cursor..end]);
			cursor = end;
			continue;
		};

		let open_end = tag_end(content, start).ok_or_else(|| {
			markup_error(format!("unterminated <{name}> tag"), start as u64)
		})?;
		split.markup.push_str(&content[cursor..open_end]);
		cursor = open_end;

		if content[..open_end].ends_with("/>") {
			continue;
		}

		let close = find_closing(content, open_end, name).ok_or_else(|| {
			markup_error(format!("<{name}> is never closed"), start as u64)
		})?;
		split.contents.push(content[open_end..close].to_string());
		cursor = close;
	}

	split.markup.push_str(&content[cursor..]);
	Ok(split)
}

/// Builds the node tree from quick-xml events.
struct TreeBuilder {
	/// Elements opened but not yet closed.
	stack: Vec<Element>,
	/// Finished top-level nodes.
	nodes: Vec<Node>,
}

impl TreeBuilder {
	fn new() -> Self {
		Self {
			stack: Vec::new(),
			nodes: Vec::new(),
		}
	}

	fn push(&mut self, node: Node) {
		match self.stack.last_mut() {
			Some(parent) => parent.children.push(node),
			None => self.nodes.push(node),
		}
	}

	fn open(&mut self, mut element: Element, raw: &mut impl Iterator<Item = String>) {
		if is_raw_text(&element.name) {
			if let Some(content) = raw.next().filter(|content| !content.is_empty()) {
				element.children.push(Node::Raw(content));
			}
			self.stack.push(element);
		} else if is_void(&element.name) {
			self.push(Node::Element(element));
		} else {
			self.stack.push(element);
		}
	}

	/// Close the innermost open element named `name`, closing any elements
	/// opened inside it. A closing tag without a matching open element is
	/// dropped.
	fn close(&mut self, name: &str) {
		let Some(position) = self.stack.iter().rposition(|element| element.name == name) else {
			return;
		};

		while self.stack.len() > position {
			let Some(element) = self.stack.pop() else {
				break;
			};
			self.push(Node::Element(element));
		}
	}

	fn finish(mut self) -> Document {
		while let Some(element) = self.stack.pop() {
			self.push(Node::Element(element));
		}
		Document::new(self.nodes)
	}
}

fn markup_error(error: impl Display, position: u64) -> CiteError {
	CiteError::Markup(format!("{error} (at byte {position})"))
}

fn element_from_start(start: &BytesStart<'_>, position: u64) -> CiteResult<Element> {
	let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
	let mut element = Element::new(name);

	for attribute in start.html_attributes().with_checks(false) {
		let attribute = attribute.map_err(|error| markup_error(error, position))?;
		let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
		let value = match attribute.unescape_value() {
			Ok(value) => value.into_owned(),
			Err(_) => String::from_utf8_lossy(&attribute.value).into_owned(),
		};
		element.attributes.push((key, value));
	}

	Ok(element)
}

/// Parse XHTML-compatible markup into a [`Document`].
///
/// Void elements such as `<br>` don't need a closing tag, and a closing tag
/// closes any elements still open inside it. Attributes may be unquoted or
/// have no value. Text that can't be unescaped
/// (for example HTML-only entities like `&nbsp;`) is kept verbatim, and so is
/// the content of `script`, `style` and `textarea` elements.
pub fn parse_html(content: impl AsRef<str>) -> CiteResult<Document> {
	let split = split_raw_text(content.as_ref())?;
	let mut raw = split.contents.into_iter();

	let mut reader = Reader::from_str(&split.markup);
	reader.config_mut().trim_text_start = false;
	reader.config_mut().trim_text_end = false;
	reader.config_mut().check_end_names = false;
	reader.config_mut().allow_unmatched_ends = true;

	let mut builder = TreeBuilder::new();

	loop {
		let position = reader.buffer_position();
		match reader.read_event() {
			Ok(Event::Start(start)) => {
				builder.open(element_from_start(&start, position)?, &mut raw);
			}
			Ok(Event::Empty(start)) => {
				builder.push(Node::Element(element_from_start(&start, position)?));
			}
			Ok(Event::End(end)) => builder.close(&String::from_utf8_lossy(end.name().as_ref())),
			Ok(Event::Text(text)) => {
				let node = match text.unescape() {
					Ok(value) => Node::Text(value.into_owned()),
					Err(_) => Node::Raw(String::from_utf8_lossy(text.as_ref()).into_owned()),
				};
				builder.push(node);
			}
			Ok(Event::CData(data)) => {
				builder.push(Node::Text(String::from_utf8_lossy(data.as_ref()).into_owned()));
			}
			Ok(Event::Comment(comment)) => {
				builder.push(Node::Comment(
					String::from_utf8_lossy(comment.as_ref()).into_owned(),
				));
			}
			Ok(Event::DocType(doctype)) => {
				builder.push(Node::Raw(format!(
					"<!DOCTYPE {}>",
					String::from_utf8_lossy(doctype.as_ref()).trim()
				)));
			}
			Ok(Event::Decl(decl)) => {
				builder.push(Node::Raw(format!(
					"<?{}?>",
					String::from_utf8_lossy(decl.as_ref())
				)));
			}
			Ok(Event::PI(pi)) => {
				builder.push(Node::Raw(format!("<?{}?>", String::from_utf8_lossy(pi.as_ref()))));
			}
			Ok(Event::Eof) => break,
			Err(error) => return Err(markup_error(error, reader.error_position())),
		}
	}

	Ok(builder.finish())
}

fn write_nodes(out: &mut String, nodes: &[Node]) -> std::fmt::Result {
	for node in nodes {
		match node {
			Node::Element(element) => write_element(out, element)?,
			Node::Text(text) => out.push_str(&partial_escape(text.as_str())),
			Node::Comment(comment) => write!(out, "<!--{comment}-->")?,
			Node::Raw(raw) => out.push_str(raw),
		}
	}
	Ok(())
}

fn write_element(out: &mut String, element: &Element) -> std::fmt::Result {
	write!(out, "<{}", element.name)?;
	for (key, value) in &element.attributes {
		write!(out, " {key}=\"{}\"", escape(value.as_str()))?;
	}

	if is_void(&element.name) && element.children.is_empty() {
		out.push_str("/>");
		return Ok(());
	}

	out.push('>');
	write_nodes(out, &element.children)?;
	write!(out, "</{}>", element.name)
}

impl Document {
	/// Serialize the document back to markup.
	pub fn to_html(&self) -> String {
		self.to_string()
	}
}

impl Display for Document {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let mut out = String::new();
		write_nodes(&mut out, &self.nodes)?;
		f.write_str(&out)
	}
}

impl Display for Element {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let mut out = String::new();
		write_element(&mut out, self)?;
		f.write_str(&out)
	}
}
