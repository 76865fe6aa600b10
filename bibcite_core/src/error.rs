use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum CiteError {
	#[error(transparent)]
	#[diagnostic(code(bibcite::io_error))]
	Io(#[from] std::io::Error),

	#[error("could not load bibliography file `{path}`: {reason}")]
	#[diagnostic(
		code(bibcite::fetch),
		help("check `bib_file` in bibcite.toml or pass `--bib <FILE>`")
	)]
	Fetch { path: String, reason: String },

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(bibcite::config_parse),
		help("check that bibcite.toml is valid TOML with [markers], [summary] and/or [sources] sections")
	)]
	ConfigParse(String),

	#[error("invalid selector `{selector}`: {reason}")]
	#[diagnostic(
		code(bibcite::invalid_selector),
		help("supported selectors: `tag`, `.class`, `#id`, `[attr]`, `[attr=value]` and compounds like `ol.sources-list`")
	)]
	InvalidSelector { selector: String, reason: String },

	#[error("failed to read document markup: {0}")]
	#[diagnostic(
		code(bibcite::markup),
		help("the deck must be well-formed XHTML; void elements like <br> may be left unclosed")
	)]
	Markup(String),
}

pub type CiteResult<T> = Result<T, CiteError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
