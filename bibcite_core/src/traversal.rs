use derive_more::Deref;

use crate::Document;
use crate::Element;
use crate::NodePath;
use crate::Selector;
use crate::Visibility;

/// Citation keys carried by one marker, in the order written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref)]
pub struct MarkerKeys(
	#[deref]
	Vec<String>,
);

impl MarkerKeys {
	/// Split a `,`/`;` separated key list, dropping empty entries.
	pub fn parse(raw: &str) -> Self {
		Self(
			raw.split([',', ';'])
				.map(str::trim)
				.filter(|key| !key.is_empty())
				.map(ToString::to_string)
				.collect(),
		)
	}

	/// The keys joined for display, e.g. in a tooltip.
	pub fn joined(&self) -> String {
		self.0.join(", ")
	}
}

/// An inline citation marker found during traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerOccurrence {
	/// Path of the marker element.
	pub path: NodePath,
	pub keys: MarkerKeys,
}

/// A leaf section eligible for numbering, with its markers in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionTraversal {
	pub path: NodePath,
	pub visibility: Visibility,
	pub markers: Vec<MarkerOccurrence>,
}

/// The immutable result of walking the document once: eligible sections in
/// document order and the markers inside each of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Traversal {
	pub sections: Vec<SectionTraversal>,
}

impl Traversal {
	/// Every marker in traversal order.
	pub fn markers(&self) -> impl Iterator<Item = &MarkerOccurrence> {
		self.sections.iter().flat_map(|section| section.markers.iter())
	}

	/// Every key occurrence in traversal order, including repeats.
	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.markers()
			.flat_map(|marker| marker.keys.iter().map(String::as_str))
	}
}

fn is_section(element: &Element) -> bool {
	element.name.eq_ignore_ascii_case("section")
}

/// A section that directly contains other sections only groups them.
pub fn is_stack(section: &Element) -> bool {
	section.child_elements().any(|(_, child)| is_section(child))
}

/// All slide sections in document order: every `section` child of the slide
/// container and every `section` child of those. Each entry carries whether
/// the section or its parent section is hidden.
fn collect_sections(document: &Document) -> Vec<(NodePath, Visibility, bool)> {
	let mut sections = Vec::new();
	let Some(slides_path) = document.slides_path() else {
		return sections;
	};
	let Some(slides) = document.element(&slides_path) else {
		return sections;
	};

	for (index, section) in slides.child_elements().filter(|(_, child)| is_section(child)) {
		let path = slides_path.child(index);
		let visibility = Visibility::of(section);
		let hidden = visibility == Visibility::Hidden;
		sections.push((path.clone(), visibility, hidden));

		for (child_index, child) in section.child_elements().filter(|(_, child)| is_section(child))
		{
			let child_visibility = Visibility::of(child);
			let child_hidden = hidden || child_visibility == Visibility::Hidden;
			sections.push((path.child(child_index), child_visibility, child_hidden));
		}
	}

	sections
}

/// Walk the document once and record the eligible sections and their
/// markers.
///
/// Stacks and hidden sections are skipped. Keys are read from
/// `key_attribute`; a marker without it carries no keys. Markers nested in
/// other markers are collected after their enclosing marker.
pub fn collect_traversal(
	document: &Document,
	marker_selector: &Selector,
	key_attribute: &str,
) -> Traversal {
	let mut traversal = Traversal::default();

	for (path, visibility, hidden) in collect_sections(document) {
		let Some(section) = document.element(&path) else {
			continue;
		};

		if hidden || is_stack(section) {
			tracing::trace!(?path, hidden, "skipping section");
			continue;
		}

		let markers = document
			.select_within(&path, marker_selector)
			.into_iter()
			.filter_map(|marker_path| {
				let marker = document.element(&marker_path)?;
				let keys = MarkerKeys::parse(marker.attribute(key_attribute).unwrap_or_default());
				Some(MarkerOccurrence {
					path: marker_path,
					keys,
				})
			})
			.collect();

		traversal.sections.push(SectionTraversal {
			path,
			visibility,
			markers,
		});
	}

	tracing::debug!(
		sections = traversal.sections.len(),
		markers = traversal.markers().count(),
		"collected citation traversal"
	);

	traversal
}
