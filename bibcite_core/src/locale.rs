use serde::Deserialize;
use serde::Serialize;

/// The two languages bibliography text is rendered in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
	#[default]
	En,
	De,
}

/// Fixed strings for one locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocaleStrings {
	pub sources_title: &'static str,
	pub last_accessed: &'static str,
	pub missing_url_date: &'static str,
	pub missing_in_source: &'static str,
}

const EN: LocaleStrings = LocaleStrings {
	sources_title: "Sources",
	last_accessed: "Last accessed",
	missing_url_date: "MISSING: urldate",
	missing_in_source: "Missing in .bib",
};

const DE: LocaleStrings = LocaleStrings {
	sources_title: "Literaturverzeichnis",
	last_accessed: "Letzter Zugriff am",
	missing_url_date: "FEHLT: urldate",
	missing_in_source: "Fehlt in .bib",
};

impl Locale {
	/// Pick the locale for a document language tag such as `de-AT`. Anything
	/// that isn't German falls back to English.
	pub fn from_lang(lang: Option<&str>) -> Self {
		match lang {
			Some(lang) if lang.trim().to_ascii_lowercase().starts_with("de") => Self::De,
			_ => Self::En,
		}
	}

	pub fn strings(self) -> &'static LocaleStrings {
		match self {
			Self::En => &EN,
			Self::De => &DE,
		}
	}
}
