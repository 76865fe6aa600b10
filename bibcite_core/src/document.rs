use derive_more::Deref;
use derive_more::DerefMut;

use crate::Selector;

/// A node in the host document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
	Element(Element),
	/// Unescaped text content.
	Text(String),
	/// Comment content without the `<!--`/`-->` delimiters.
	Comment(String),
	/// Markup written back verbatim, e.g. a doctype.
	Raw(String),
}

impl Node {
	pub fn as_element(&self) -> Option<&Element> {
		match self {
			Node::Element(element) => Some(element),
			_ => None,
		}
	}

	pub fn as_element_mut(&mut self) -> Option<&mut Element> {
		match self {
			Node::Element(element) => Some(element),
			_ => None,
		}
	}

	pub fn text(text: impl Into<String>) -> Self {
		Node::Text(text.into())
	}
}

impl From<Element> for Node {
	fn from(element: Element) -> Self {
		Node::Element(element)
	}
}

/// An element with its attributes in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
	pub name: String,
	pub attributes: Vec<(String, String)>,
	pub children: Vec<Node>,
}

impl Element {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			attributes: Vec::new(),
			children: Vec::new(),
		}
	}

	#[must_use]
	pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.set_attribute(name, value);
		self
	}

	#[must_use]
	pub fn with_child(mut self, child: impl Into<Node>) -> Self {
		self.children.push(child.into());
		self
	}

	#[must_use]
	pub fn with_text(self, text: impl Into<String>) -> Self {
		self.with_child(Node::Text(text.into()))
	}

	pub fn attribute(&self, name: &str) -> Option<&str> {
		self.attributes
			.iter()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value.as_str())
	}

	pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
		let name = name.into();
		let value = value.into();
		match self.attributes.iter_mut().find(|(key, _)| *key == name) {
			Some((_, existing)) => *existing = value,
			None => self.attributes.push((name, value)),
		}
	}

	pub fn has_class(&self, class: &str) -> bool {
		self.attribute("class")
			.is_some_and(|classes| classes.split_whitespace().any(|name| name == class))
	}

	/// Replace all children with a single text node.
	pub fn set_text(&mut self, text: impl Into<String>) {
		self.children = vec![Node::Text(text.into())];
	}

	/// The concatenated text of all descendant text nodes.
	pub fn text_content(&self) -> String {
		let mut text = String::new();
		collect_text(&self.children, &mut text);
		text
	}

	/// Element children paired with their index among all children.
	pub fn child_elements(&self) -> impl Iterator<Item = (usize, &Element)> {
		self.children
			.iter()
			.enumerate()
			.filter_map(|(index, node)| node.as_element().map(|element| (index, element)))
	}

	/// Paths, relative to this element, of descendants matching `selector` in
	/// document order. A match nested in another match follows it.
	pub fn select(&self, selector: &Selector) -> Vec<NodePath> {
		let mut found = Vec::new();
		select_into(&self.children, selector, &mut NodePath::default(), &mut found);
		found
	}

	/// Path of the first descendant matching `selector`, relative to this
	/// element.
	pub fn select_first(&self, selector: &Selector) -> Option<NodePath> {
		find_first(&self.children, selector, &mut NodePath::default())
	}
}

fn collect_text(nodes: &[Node], text: &mut String) {
	for node in nodes {
		match node {
			Node::Text(value) => text.push_str(value),
			Node::Element(element) => collect_text(&element.children, text),
			Node::Comment(_) | Node::Raw(_) => {}
		}
	}
}

fn select_into(nodes: &[Node], selector: &Selector, path: &mut NodePath, found: &mut Vec<NodePath>) {
	for (index, node) in nodes.iter().enumerate() {
		let Node::Element(element) = node else {
			continue;
		};

		path.push(index);
		if selector.matches(element) {
			found.push(path.clone());
		}
		select_into(&element.children, selector, path, found);
		path.pop();
	}
}

fn find_first(nodes: &[Node], selector: &Selector, path: &mut NodePath) -> Option<NodePath> {
	for (index, node) in nodes.iter().enumerate() {
		let Node::Element(element) = node else {
			continue;
		};

		path.push(index);
		if selector.matches(element) {
			return Some(path.clone());
		}
		if let Some(found) = find_first(&element.children, selector, path) {
			return Some(found);
		}
		path.pop();
	}

	None
}

/// Child indices leading from a list of nodes to one node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deref, DerefMut)]
pub struct NodePath(
	#[deref]
	#[deref_mut]
	Vec<usize>,
);

impl NodePath {
	/// This path followed by `relative`.
	#[must_use]
	pub fn join(&self, relative: &NodePath) -> NodePath {
		let mut joined = self.clone();
		joined.extend_from_slice(relative);
		joined
	}

	#[must_use]
	pub fn child(&self, index: usize) -> NodePath {
		let mut child = self.clone();
		child.push(index);
		child
	}
}

impl From<Vec<usize>> for NodePath {
	fn from(indices: Vec<usize>) -> Self {
		Self(indices)
	}
}

/// How a section participates in traversal, from its `data-visibility`
/// attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Visibility {
	#[default]
	Visible,
	Hidden,
	Uncounted,
}

impl Visibility {
	pub fn of(element: &Element) -> Self {
		match element.attribute("data-visibility") {
			Some("hidden") => Self::Hidden,
			Some("uncounted") => Self::Uncounted,
			_ => Self::Visible,
		}
	}
}

/// A parsed host document: its top-level nodes, usually a doctype and the
/// root element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
	pub nodes: Vec<Node>,
}

impl Document {
	pub fn new(nodes: Vec<Node>) -> Self {
		Self { nodes }
	}

	/// Path of the first top-level element.
	pub fn root_path(&self) -> Option<NodePath> {
		self.nodes
			.iter()
			.position(|node| matches!(node, Node::Element(_)))
			.map(|index| NodePath::from(vec![index]))
	}

	pub fn root(&self) -> Option<&Element> {
		self.nodes.iter().find_map(Node::as_element)
	}

	/// The `lang` attribute of the root element.
	pub fn lang(&self) -> Option<&str> {
		self.root().and_then(|root| root.attribute("lang"))
	}

	pub fn node(&self, path: &NodePath) -> Option<&Node> {
		let (first, rest) = path.split_first()?;
		let mut node = self.nodes.get(*first)?;
		for &index in rest {
			node = node.as_element()?.children.get(index)?;
		}
		Some(node)
	}

	pub fn node_mut(&mut self, path: &NodePath) -> Option<&mut Node> {
		let (first, rest) = path.split_first()?;
		let mut node = self.nodes.get_mut(*first)?;
		for &index in rest {
			node = node.as_element_mut()?.children.get_mut(index)?;
		}
		Some(node)
	}

	pub fn element(&self, path: &NodePath) -> Option<&Element> {
		self.node(path).and_then(Node::as_element)
	}

	pub fn element_mut(&mut self, path: &NodePath) -> Option<&mut Element> {
		self.node_mut(path).and_then(Node::as_element_mut)
	}

	/// Path of the first element anywhere in the document matching
	/// `selector`.
	pub fn select_first(&self, selector: &Selector) -> Option<NodePath> {
		find_first(&self.nodes, selector, &mut NodePath::default())
	}

	/// Path of the first descendant of the element at `within` matching
	/// `selector`.
	pub fn select_first_within(&self, within: &NodePath, selector: &Selector) -> Option<NodePath> {
		let element = self.element(within)?;
		element
			.select_first(selector)
			.map(|relative| within.join(&relative))
	}

	/// Paths of the descendants of the element at `within` matching
	/// `selector`, in document order, including matches nested in matches.
	pub fn select_within(&self, within: &NodePath, selector: &Selector) -> Vec<NodePath> {
		self.element(within).map_or_else(Vec::new, |element| {
			element
				.select(selector)
				.into_iter()
				.map(|relative| within.join(&relative))
				.collect()
		})
	}

	/// The element holding the slide sections: the first element with class
	/// `slides`, falling back to the root element.
	pub fn slides_path(&self) -> Option<NodePath> {
		self.find_class("slides").or_else(|| self.root_path())
	}

	fn find_class(&self, class: &str) -> Option<NodePath> {
		fn walk(nodes: &[Node], class: &str, path: &mut NodePath) -> Option<NodePath> {
			for (index, node) in nodes.iter().enumerate() {
				let Node::Element(element) = node else {
					continue;
				};
				path.push(index);
				if element.has_class(class) {
					return Some(path.clone());
				}
				if let Some(found) = walk(&element.children, class, path) {
					return Some(found);
				}
				path.pop();
			}
			None
		}

		walk(&self.nodes, class, &mut NodePath::default())
	}
}
