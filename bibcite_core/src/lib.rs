//! `bibcite_core` is the core library for `bibcite`. It reads a BibTeX bibliography, numbers the citation markers of a slide deck in reading order, and writes reference glyphs, per-slide short citations, and a numbered bibliography back into the deck.
//!
//! ## Processing Pipeline
//!
//! ```text
//! .bib text
//!   → Parser (strips comments, scans @type{key, ...} records)
//!   → Lexer (walks each record body into name = value fields)
//! HTML deck
//!   → Document (owned node tree)
//!   → Traversal (eligible slide sections and their markers, collected once)
//!   → Registry (numbers every key before anything is rewritten)
//!   → Engine (reference glyphs, section summaries, bibliography list)
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from `bibcite.toml`.
//!
//! ## Key Types
//!
//! - [`Record`] and [`RecordStore`]: Parsed bibliography items addressable by key.
//! - [`CitationRegistry`]: Key numbers in first-appearance order.
//! - [`Document`]: The deck as a tree of [`Node`]s.
//! - [`Selector`]: A compound CSS selector such as `section.sources` or `[data-cite]`.
//! - [`Resolution`]: What a run numbered, rewrote, and could not find.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bibcite_core::CiteConfig;
//! use bibcite_core::FileSource;
//! use bibcite_core::parse_html;
//! use bibcite_core::run_citations;
//! use std::path::Path;
//!
//! let root = Path::new(".");
//! let config = CiteConfig::load_or_default(root).unwrap();
//! let mut deck = parse_html(std::fs::read_to_string("index.html").unwrap()).unwrap();
//!
//! let resolution = run_citations(&mut deck, &FileSource::new(root), &config).unwrap();
//! if !resolution.is_complete() {
//!     eprintln!("missing records: {}", resolution.missing.join(", "));
//! }
//!
//! std::fs::write("index.html", deck.to_html()).unwrap();
//! ```

pub use config::*;
pub use document::*;
pub use engine::*;
pub use error::*;
pub use format::*;
pub use html::*;
pub use locale::*;
pub use parser::*;
pub use registry::*;
pub use selector::*;
pub use source::*;
pub use traversal::*;

pub mod config;
mod document;
mod engine;
#[allow(unused_assignments)]
mod error;
mod format;
mod html;
pub(crate) mod lexer;
mod locale;
mod parser;
mod registry;
mod selector;
mod source;
mod traversal;

#[cfg(test)]
mod __fixtures;
#[cfg(test)]
mod __tests;
