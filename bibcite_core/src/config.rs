use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::CiteError;
use crate::CiteResult;
use crate::Locale;
use crate::Selector;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] =
	["bibcite.toml", ".bibcite.toml", ".config/bibcite.toml"];

/// Default bibliography location, relative to the project root.
pub const DEFAULT_BIB_FILE: &str = "bib/references.bib";

fn selector(source: &str) -> Selector {
	Selector::parse(source).unwrap_or_else(|e| panic!("invalid built-in selector `{source}`: {e}"))
}

/// Configuration loaded from a `bibcite.toml` file. Every field is optional.
///
/// ```toml
/// bib_file = "bib/references.bib"
///
/// [markers]
/// selector = "[data-cite]"
/// attribute = "data-cite"
/// class = "cite-sup"
/// brackets = false
/// tooltip = true
/// replace = true
///
/// [summary]
/// selector = ".citation-bar"
///
/// [sources]
/// selector = ".sources"
/// title = "References"
/// create = true
/// id_prefix = "src-"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiteConfig {
	/// Path of the bibliography file, relative to the project root.
	#[serde(default = "default_bib_file")]
	pub bib_file: PathBuf,
	/// Inline citation markers and the reference glyphs replacing them.
	#[serde(default)]
	pub markers: MarkerConfig,
	/// Per-section short citation summaries.
	#[serde(default)]
	pub summary: SummaryConfig,
	/// The bibliography list.
	#[serde(default)]
	pub sources: SourcesConfig,
}

fn default_bib_file() -> PathBuf {
	PathBuf::from(DEFAULT_BIB_FILE)
}

impl Default for CiteConfig {
	fn default() -> Self {
		Self {
			bib_file: default_bib_file(),
			markers: MarkerConfig::default(),
			summary: SummaryConfig::default(),
			sources: SourcesConfig::default(),
		}
	}
}

/// Controls which elements are citation markers and how they are rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct MarkerConfig {
	/// Elements matching this selector are citation markers.
	pub selector: Selector,
	/// The attribute holding the `,`/`;` separated key list.
	pub attribute: String,
	/// Class of the generated `<sup>` reference glyph.
	pub class: String,
	/// Render numbers as `[1,2]` instead of `1,2`.
	pub brackets: bool,
	/// Add a `title` tooltip listing the raw keys.
	pub tooltip: bool,
	/// Replace the marker element itself. When `false`, the marker is kept
	/// and its content is replaced by the glyph.
	pub replace: bool,
}

impl Default for MarkerConfig {
	fn default() -> Self {
		Self {
			selector: selector("[data-cite]"),
			attribute: "data-cite".to_string(),
			class: "cite-sup".to_string(),
			brackets: false,
			tooltip: true,
			replace: true,
		}
	}
}

/// Where per-section short citations are written. The container is part of
/// the slide markup; sections without one are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
	pub selector: Selector,
}

impl Default for SummaryConfig {
	fn default() -> Self {
		Self {
			selector: selector(".citation-bar"),
		}
	}
}

/// Where the bibliography list is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
	/// The bibliography container.
	pub selector: Selector,
	/// Heading of a created bibliography section. Defaults to the document
	/// locale's title.
	pub title: Option<String>,
	/// Append a bibliography section to the deck when no container exists.
	pub create: bool,
	/// Prefix of each list item's `id`, followed by the citation key.
	pub id_prefix: String,
}

impl Default for SourcesConfig {
	fn default() -> Self {
		Self {
			selector: selector(".sources"),
			title: None,
			create: true,
			id_prefix: "src-".to_string(),
		}
	}
}

impl SourcesConfig {
	/// The configured title, or the locale's default.
	pub fn title_for(&self, locale: Locale) -> &str {
		self.title
			.as_deref()
			.unwrap_or_else(|| locale.strings().sources_title)
	}
}

impl CiteConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> CiteResult<Option<CiteConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config = Self::from_toml(&content)?;
		tracing::debug!(path = %config_path.display(), "loaded config");

		Ok(Some(config))
	}

	/// Load the discovered config, falling back to defaults.
	pub fn load_or_default(root: &Path) -> CiteResult<CiteConfig> {
		Ok(Self::load(root)?.unwrap_or_default())
	}

	pub fn from_toml(content: &str) -> CiteResult<CiteConfig> {
		toml::from_str(content).map_err(|e| CiteError::ConfigParse(e.to_string()))
	}
}
