use crate::CiteConfig;
use crate::CiteResult;
use crate::Document;
use crate::RecordStore;
use crate::parse_bibliography;
use crate::parse_html;

pub const REFERENCES: &str = r"% sample library
@article{ada,
  author = {Ada LastAda},
  title = {On {Analytical} Engines},
  journal = {Notes},
  year = 2020,
  doi = {10.1000/xyz}
}

@comment{unused entries live below}

@misc{bob,
  author = {Bob LastBob1 and Carol LastBob2},
  title = {Web Thing},
  url = {https://example.org/thing}
}
";

pub const DECK: &str = r#"<html lang="en"><body><div class="reveal"><div class="slides"><section id="one"><p>A <span data-cite="ada"></span> and <span data-cite="bob; ada"></span></p><div class="citation-bar"></div></section><section id="two"><p><span data-cite="bob"></span></p><div class="citation-bar"></div></section><section class="sources"><h2>Sources</h2><ol class="sources-list"></ol></section></div></div></body></html>"#;

pub fn references() -> RecordStore {
	parse_bibliography(REFERENCES)
}

pub fn deck() -> CiteResult<Document> {
	parse_html(DECK)
}

pub fn slides(body: &str) -> CiteResult<Document> {
	parse_html(format!(r#"<div class="slides">{body}</div>"#))
}

pub fn config() -> CiteConfig {
	CiteConfig::default()
}
