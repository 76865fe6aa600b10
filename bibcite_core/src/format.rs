use std::fmt::Display;
use std::sync::LazyLock;

use derive_more::Deref;
use derive_more::DerefMut;
use regex::Regex;

use crate::Locale;
use crate::Record;

/// The author list separator: `and` surrounded by whitespace, in any case.
static AUTHOR_SEPARATOR: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\s+and\s+").expect("valid author separator pattern"));

/// Short citation author placeholder for a missing author field.
pub const UNKNOWN_AUTHOR: &str = "Unknown";
/// Short citation year placeholder for a missing year field.
pub const NO_DATE: &str = "n.d.";
/// Long citation text for a key without a record.
pub const UNKNOWN_SOURCE: &str = "Unknown source";
/// Prefix for DOIs written without a URL scheme.
pub const DOI_RESOLVER: &str = "https://doi.org/";

/// A piece of a rendered long citation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
	Text(String),
	Link { href: String, label: String },
}

impl Display for Segment {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Segment::Text(text) => write!(f, "{text}"),
			Segment::Link { label, .. } => write!(f, "{label}"),
		}
	}
}

/// The full bibliography text for one record. Displays as the visible text,
/// with links shown by their label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, DerefMut)]
pub struct LongCitation(
	#[deref]
	#[deref_mut]
	Vec<Segment>,
);

impl LongCitation {
	fn push_text(&mut self, text: impl Into<String>) {
		self.0.push(Segment::Text(text.into()));
	}

	fn push_link(&mut self, href: impl Into<String>) {
		let href = href.into();
		self.0.push(Segment::Link {
			label: href.clone(),
			href,
		});
	}

	/// Links contained in the citation, in order.
	pub fn links(&self) -> impl Iterator<Item = &str> {
		self.0.iter().filter_map(|segment| {
			match segment {
				Segment::Link { href, .. } => Some(href.as_str()),
				Segment::Text(_) => None,
			}
		})
	}
}

impl Display for LongCitation {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		for segment in &self.0 {
			write!(f, "{segment}")?;
		}
		Ok(())
	}
}

/// The family name of one author: the text before the first comma for
/// `Last, First`, otherwise the final word.
pub fn last_name(name: &str) -> &str {
	let name = name.trim();
	match name.split_once(',') {
		Some((last, _)) => last.trim(),
		None => name.split_whitespace().next_back().unwrap_or_default(),
	}
}

/// Render an author field as `Last`, `Last & Last` or `Last et al.`.
pub fn format_authors(author: Option<&str>) -> String {
	let Some(author) = author else {
		return String::new();
	};

	let names: Vec<&str> = AUTHOR_SEPARATOR
		.split(author)
		.map(str::trim)
		.filter(|name| !name.is_empty())
		.collect();

	match names.as_slice() {
		[] => String::new(),
		[only] => last_name(only).to_string(),
		[first, second] => format!("{} & {}", last_name(first), last_name(second)),
		[first, ..] => format!("{} et al.", last_name(first)),
	}
}

/// `{authors}, {year}` with placeholders for missing parts. A missing record
/// renders as `Unknown, n.d.`.
pub fn short_citation(record: Option<&Record>) -> String {
	let authors = record
		.map(|record| format_authors(record.field("author")))
		.filter(|authors| !authors.is_empty())
		.unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
	let year = record.and_then(|record| record.field("year")).unwrap_or(NO_DATE);

	format!("{authors}, {year}")
}

/// Turn a DOI into a resolvable link. Values that already are `http(s)` URLs
/// pass through unchanged.
pub fn normalize_doi(doi: &str) -> String {
	let doi = doi.trim();
	if doi.is_empty() {
		return String::new();
	}

	if doi.starts_with("http://") || doi.starts_with("https://") {
		doi.to_string()
	} else {
		format!("{DOI_RESOLVER}{doi}")
	}
}

fn join_present(parts: &[&str], separator: &str) -> String {
	parts
		.iter()
		.filter(|part| !part.is_empty())
		.copied()
		.collect::<Vec<_>>()
		.join(separator)
}

/// Render the bibliography entry for a record.
///
/// The base text is `{authors}, {year} — {title}. {container}` with empty
/// parts and their punctuation left out. A DOI link wins over a URL; a URL is
/// followed by its access date or a visible marker when the date is missing.
pub fn long_citation(record: Option<&Record>, locale: Locale) -> LongCitation {
	let mut citation = LongCitation::default();
	let Some(record) = record else {
		citation.push_text(UNKNOWN_SOURCE);
		return citation;
	};

	let strings = locale.strings();
	let authors = format_authors(record.field("author"));
	let year = record.field("year").unwrap_or_default();
	let title = record.field("title").unwrap_or_default();
	let container = record
		.field("journal")
		.or_else(|| record.field("booktitle"))
		.or_else(|| record.field("publisher"))
		.unwrap_or_default();

	let head = join_present(&[&authors, year], ", ");
	let mid = join_present(&[title, container], ". ");
	citation.push_text(join_present(&[&head, &mid], " — "));

	if let Some(doi) = record.field("doi") {
		citation.push_text(". DOI: ");
		citation.push_link(normalize_doi(doi));
		return citation;
	}

	if let Some(url) = record.field("url") {
		citation.push_text(". ");
		citation.push_link(url);

		match record.field("urldate") {
			Some(date) => citation.push_text(format!(", {} {date}", strings.last_accessed)),
			None => citation.push_text(format!(" ({})", strings.missing_url_date)),
		}
	}

	citation
}
