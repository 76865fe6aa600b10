use std::collections::HashSet;
use std::sync::LazyLock;

use serde::Serialize;

use crate::BibSource;
use crate::CitationRegistry;
use crate::CiteConfig;
use crate::CiteResult;
use crate::Document;
use crate::Element;
use crate::Locale;
use crate::MarkerConfig;
use crate::MarkerOccurrence;
use crate::Node;
use crate::NodePath;
use crate::RecordStore;
use crate::Segment;
use crate::Selector;
use crate::SourcesConfig;
use crate::Traversal;
use crate::collect_traversal;
use crate::long_citation;
use crate::parse_bibliography;
use crate::short_citation;

/// The summary paragraph written by a previous run.
static GENERATED_SUMMARY: LazyLock<Selector> = LazyLock::new(|| {
	Selector::parse(r#"p[data-generated="true"]"#).expect("valid generated summary selector")
});

/// The list inside the bibliography container.
static SOURCES_LIST: LazyLock<Selector> =
	LazyLock::new(|| Selector::parse("ol.sources-list").expect("valid sources list selector"));

const SOURCES_LIST_CLASS: &str = "sources-list";
const DEFAULT_SOURCES_CLASS: &str = "sources";

/// The short citation summary built for one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionSummary {
	/// Path of the section element.
	#[serde(skip)]
	pub section: NodePath,
	/// Distinct keys cited in the section, in first-use order.
	pub keys: Vec<String>,
	/// `{n}. {short citation}` entries joined by `; `.
	pub text: String,
	/// Whether the section had a summary container to write into.
	pub written: bool,
}

/// Outcome of a resolution run.
#[derive(Debug, Clone)]
pub struct Resolution {
	/// Key numbers in first-appearance order. Handed back so the caller owns
	/// it after the run.
	pub registry: CitationRegistry,
	/// Numbered keys without a bibliography record, by ascending number.
	pub missing: Vec<String>,
	/// Number of markers rewritten into reference glyphs.
	pub markers: usize,
	/// One summary per eligible section that cites at least one key.
	pub summaries: Vec<SectionSummary>,
	/// Path of the populated bibliography list, if a container was found or
	/// created.
	pub bibliography: Option<NodePath>,
	/// Locale the bibliography text was rendered in.
	pub locale: Locale,
}

impl Resolution {
	/// Returns true when every cited key has a bibliography record.
	pub fn is_complete(&self) -> bool {
		self.missing.is_empty()
	}
}

/// Number every key in traversal order without touching the document.
pub fn discover_keys(traversal: &Traversal, registry: &mut CitationRegistry) {
	for key in traversal.keys() {
		registry.number_of(key);
	}
}

/// The `<sup>` glyph listing the numbers of `occurrence`'s keys.
pub fn reference_glyph(
	occurrence: &MarkerOccurrence,
	registry: &CitationRegistry,
	config: &MarkerConfig,
) -> Element {
	let numbers = occurrence
		.keys
		.iter()
		.filter_map(|key| registry.get(key))
		.map(|number| number.to_string())
		.collect::<Vec<_>>()
		.join(",");

	let text = if config.brackets {
		format!("[{numbers}]")
	} else {
		numbers
	};

	let mut glyph = Element::new("sup").with_attribute("class", &config.class);
	if config.tooltip {
		glyph.set_attribute("title", occurrence.keys.joined());
	}
	glyph.with_text(text)
}

fn rewrite_marker(document: &mut Document, occurrence: &MarkerOccurrence, glyph: Element, config: &MarkerConfig) {
	if config.replace {
		if let Some(node) = document.node_mut(&occurrence.path) {
			*node = Node::Element(glyph);
		}
	} else if let Some(marker) = document.element_mut(&occurrence.path) {
		marker.children = vec![Node::Element(glyph)];
	}
}

/// `{n}. {authors}, {year}` for each key, joined by `; `.
pub fn summary_text(keys: &[String], registry: &CitationRegistry, records: &RecordStore) -> String {
	keys.iter()
		.filter_map(|key| {
			let number = registry.get(key)?;
			Some(format!("{number}. {}", short_citation(records.get(key))))
		})
		.collect::<Vec<_>>()
		.join("; ")
}

/// Write `text` into the section's summary container, reusing a paragraph
/// generated by an earlier run. Returns false when the section has no
/// container.
fn write_summary(document: &mut Document, section: &NodePath, selector: &Selector, text: &str) -> bool {
	let Some(bar_path) = document.select_first_within(section, selector) else {
		return false;
	};

	let existing = document.select_first_within(&bar_path, &GENERATED_SUMMARY);
	let Some(bar) = document.element_mut(&bar_path) else {
		return false;
	};

	let paragraph = match existing {
		Some(path) => {
			let relative = NodePath::from(path[bar_path.len()..].to_vec());
			find_element_mut(bar, &relative)
		}
		None => {
			bar.children.push(Node::Element(
				Element::new("p").with_attribute("data-generated", "true"),
			));
			bar.children.last_mut().and_then(Node::as_element_mut)
		}
	};

	match paragraph {
		Some(paragraph) => {
			paragraph.set_text(text);
			true
		}
		None => false,
	}
}

fn find_element_mut<'a>(element: &'a mut Element, relative: &NodePath) -> Option<&'a mut Element> {
	let mut current = element;
	for &index in relative.iter() {
		current = current.children.get_mut(index)?.as_element_mut()?;
	}
	Some(current)
}

/// Locate the bibliography list, creating the container and the list as
/// needed. Returns the path of the list.
fn ensure_sources_list(document: &mut Document, config: &SourcesConfig, locale: Locale) -> Option<NodePath> {
	let container = match document.select_first(&config.selector) {
		Some(path) => path,
		None if config.create => {
			let slides_path = document.slides_path()?;
			let class = config
				.selector
				.class_name()
				.unwrap_or(DEFAULT_SOURCES_CLASS);
			let section = Element::new("section")
				.with_attribute("class", class)
				.with_child(Element::new("h2").with_text(config.title_for(locale)))
				.with_child(Element::new("ol").with_attribute("class", SOURCES_LIST_CLASS));

			let slides = document.element_mut(&slides_path)?;
			slides.children.push(Node::Element(section));
			tracing::debug!("created bibliography section");
			slides_path.child(slides.children.len() - 1)
		}
		None => {
			tracing::debug!(selector = %config.selector, "no bibliography container");
			return None;
		}
	};

	if let Some(list) = document.select_first_within(&container, &SOURCES_LIST) {
		return Some(list);
	}

	let element = document.element_mut(&container)?;
	element
		.children
		.push(Node::Element(Element::new("ol").with_attribute("class", SOURCES_LIST_CLASS)));
	Some(container.child(element.children.len() - 1))
}

/// The `<li>` for one numbered key.
pub fn bibliography_item(
	key: &str,
	number: usize,
	records: &RecordStore,
	config: &SourcesConfig,
	locale: Locale,
) -> Element {
	let record = records.get(key);
	let mut item = Element::new("li")
		.with_attribute("id", format!("{}{key}", config.id_prefix))
		.with_attribute("data-cite-key", key)
		.with_text(format!("{number}. "));

	for segment in long_citation(record, locale).iter() {
		let node = match segment {
			Segment::Text(text) => Node::text(text.clone()),
			Segment::Link { href, label } => {
				Node::Element(
					Element::new("a")
						.with_attribute("href", href.clone())
						.with_attribute("target", "_blank")
						.with_attribute("rel", "noopener noreferrer")
						.with_text(label.clone()),
				)
			}
		};
		item.children.push(node);
	}

	if record.is_none() {
		item.children.push(Node::text(format!(
			" ({}: {key})",
			locale.strings().missing_in_source
		)));
	}

	item
}

/// Resolve all citations in `document` against `records`.
///
/// The document is walked once; every key is numbered in that order before
/// any marker is rewritten. Then markers become reference glyphs, each
/// section's summary container receives its short citations, and the
/// bibliography list is rebuilt sorted by number. Keys without a record are
/// still numbered and listed with a missing note.
pub fn resolve_citations(
	document: &mut Document,
	records: &RecordStore,
	config: &CiteConfig,
	mut registry: CitationRegistry,
) -> Resolution {
	let locale = Locale::from_lang(document.lang());
	let traversal = collect_traversal(document, &config.markers.selector, &config.markers.attribute);

	discover_keys(&traversal, &mut registry);

	let mut markers = 0;
	let mut summaries = Vec::new();

	for section in &traversal.sections {
		let mut used: Vec<String> = Vec::new();
		let mut seen: HashSet<&str> = HashSet::new();
		let mut rewritten: Vec<&NodePath> = Vec::new();

		for occurrence in &section.markers {
			for key in occurrence.keys.iter() {
				registry.number_of(key);
				if seen.insert(key.as_str()) {
					used.push(key.clone());
				}
			}

			// A marker inside one already rewritten is gone from the document.
			if rewritten
				.iter()
				.any(|outer| occurrence.path.starts_with(outer.as_slice()))
			{
				continue;
			}

			let glyph = reference_glyph(occurrence, &registry, &config.markers);
			rewrite_marker(document, occurrence, glyph, &config.markers);
			rewritten.push(&occurrence.path);
			markers += 1;
		}

		if used.is_empty() {
			continue;
		}

		let text = summary_text(&used, &registry, records);
		let written = write_summary(document, &section.path, &config.summary.selector, &text);
		summaries.push(SectionSummary {
			section: section.path.clone(),
			keys: used,
			text,
			written,
		});
	}

	let missing: Vec<String> = registry
		.keys()
		.filter(|key| !records.contains(key))
		.map(ToString::to_string)
		.collect();

	for key in &missing {
		tracing::debug!(%key, "citation key has no bibliography record");
	}

	let bibliography = ensure_sources_list(document, &config.sources, locale);
	if let Some(list_path) = &bibliography {
		let items: Vec<Node> = registry
			.iter()
			.map(|entry| {
				Node::Element(bibliography_item(
					entry.key,
					entry.number,
					records,
					&config.sources,
					locale,
				))
			})
			.collect();

		if let Some(list) = document.element_mut(list_path) {
			list.children = items;
		}
	}

	tracing::debug!(
		keys = registry.len(),
		missing = missing.len(),
		markers,
		"resolved citations"
	);

	Resolution {
		registry,
		missing,
		markers,
		summaries,
		bibliography,
		locale,
	}
}

/// Fetch and parse the configured bibliography, then resolve `document`
/// against it.
///
/// A fetch failure returns before the document is changed.
pub fn run_citations(
	document: &mut Document,
	source: &impl BibSource,
	config: &CiteConfig,
) -> CiteResult<Resolution> {
	let text = source.fetch(&config.bib_file)?;
	let records = parse_bibliography(&text);

	Ok(resolve_citations(document, &records, config, CitationRegistry::new()))
}
