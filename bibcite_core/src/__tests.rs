use std::path::Path;

use rstest::rstest;
use similar_asserts::assert_eq;
use tracing_test::traced_test;

use super::__fixtures::*;
use super::*;
use crate::lexer::clean_value;
use crate::lexer::tokenize_fields;

#[rstest]
#[case::braced("title = {Plain}", "Plain")]
#[case::nested_braces("title = {A {B} C}", "A B C")]
#[case::quoted(r#"title = "Quoted""#, "Quoted")]
#[case::escaped_quote(r#"title = "A \"B\" C""#, r#"A "B" C"#)]
#[case::latex_kept(r#"title = "Caf\'e""#, r"Caf\'e")]
#[case::bare("title = 2020", "2020")]
#[case::multiline("title = {First\n  Second}", "First\n  Second")]
#[case::unterminated("title = {Runs to the end", "Runs to the end")]
fn field_values(#[case] body: &str, #[case] expected: &str) {
	let fields = tokenize_fields(body);
	assert_eq!(fields.get("title").map(String::as_str), Some(expected));
}

#[test]
fn field_names_are_lowercased() {
	let fields = tokenize_fields("\n  Title = {X},\n  YEAR = 1999\n");
	assert_eq!(fields.get("title").map(String::as_str), Some("X"));
	assert_eq!(fields.get("year").map(String::as_str), Some("1999"));
}

#[test]
fn later_field_replaces_earlier() {
	let fields = tokenize_fields("year = 1999, year = {2001}");
	assert_eq!(fields.len(), 1);
	assert_eq!(fields["year"], "2001");
}

#[test]
fn clean_value_strips_every_brace() {
	assert_eq!(clean_value("  {{Nested} {Braces}}  "), "Nested Braces");
}

#[test]
fn parse_records_from_library() {
	let store = references();
	assert_eq!(store.len(), 2);

	let ada = store.get("ada").unwrap_or_else(|| panic!("ada is parsed"));
	assert_eq!(ada.r#type, "article");
	assert_eq!(ada.field("title"), Some("On Analytical Engines"));
	assert_eq!(ada.field("year"), Some("2020"));
	assert_eq!(ada.field("doi"), Some("10.1000/xyz"));

	let keys: Vec<&str> = store.iter().map(|record| record.key.as_str()).collect();
	assert_eq!(keys, vec!["ada", "bob"]);
}

#[test]
fn record_type_is_lowercased_and_key_kept() {
	let store = parse_bibliography("@ARTICLE{MixedCase2020,\n  title = {T}\n}\n");
	let record = store
		.get("MixedCase2020")
		.unwrap_or_else(|| panic!("record is parsed"));
	assert_eq!(record.r#type, "article");
	assert!(store.get("mixedcase2020").is_none());
}

#[test]
fn comments_are_ignored() {
	let input = "%@misc{commented,\n%  title = {Hidden}\n%}\n@comment{@misc{inner, title = {No}}\n\
	             @misc{kept,\n  % note = {dropped},\n  title = {Kept}\n}\n";
	let store = parse_bibliography(input);

	assert!(store.get("commented").is_none());
	assert!(store.get("inner").is_none());
	let kept = store.get("kept").unwrap_or_else(|| panic!("kept is parsed"));
	assert_eq!(kept.field("title"), Some("Kept"));
	assert_eq!(kept.field("note"), None);
}

#[test]
fn duplicate_key_keeps_position_and_takes_later_contents() {
	let input = "@misc{dup,\n  title = {First}\n}\n@misc{other,\n  title = {Other}\n}\n@book{dup,\n  \
	             title = {Second}\n}\n";
	let store = parse_bibliography(input);

	assert_eq!(store.len(), 2);
	let keys: Vec<&str> = store.iter().map(|record| record.key.as_str()).collect();
	assert_eq!(keys, vec!["dup", "other"]);

	let dup = store.get("dup").unwrap_or_else(|| panic!("dup is parsed"));
	assert_eq!(dup.r#type, "book");
	assert_eq!(dup.field("title"), Some("Second"));
}

#[rstest]
#[case::empty("")]
#[case::prose("Just some notes about engines.")]
#[case::no_key_separator("@misc{nokey}\n")]
#[case::only_comments("% one\n% two\n@comment{three}\n")]
fn text_without_records_is_empty(#[case] input: &str) {
	assert!(parse_bibliography(input).is_empty());
}

#[test]
fn malformed_body_keeps_fields_read_so_far() {
	let store = parse_bibliography("@misc{broken,\n  year = 2001,\n  = {orphan},\n  title = {Lost}\n}\n");
	let record = store.get("broken").unwrap_or_else(|| panic!("broken is parsed"));
	assert_eq!(record.field("year"), Some("2001"));
	assert_eq!(record.field("title"), None);
}

#[test]
fn empty_field_is_absent() {
	let store = parse_bibliography("@misc{blank,\n  author = {},\n  year = {  }\n}\n");
	let record = store.get("blank").unwrap_or_else(|| panic!("blank is parsed"));
	assert_eq!(record.field("author"), None);
	assert_eq!(short_citation(Some(record)), "Unknown, n.d.");
}

#[rstest]
#[case::absent(None, "")]
#[case::blank(Some("   "), "")]
#[case::single(Some("Ada Lovelace"), "Lovelace")]
#[case::last_first(Some("Lovelace, Ada"), "Lovelace")]
#[case::two(Some("Ada Lovelace and Charles Babbage"), "Lovelace & Babbage")]
#[case::two_last_first(Some("Lovelace, Ada and Babbage, Charles"), "Lovelace & Babbage")]
#[case::three(Some("A One and B Two AND C Three"), "One et al.")]
#[case::and_inside_name(Some("Alexander Sandberg"), "Sandberg")]
fn author_formatting(#[case] author: Option<&str>, #[case] expected: &str) {
	assert_eq!(format_authors(author), expected);
}

#[test]
fn short_citation_placeholders() {
	let store = references();
	assert_eq!(short_citation(store.get("ada")), "LastAda, 2020");
	assert_eq!(short_citation(store.get("bob")), "LastBob1 & LastBob2, n.d.");
	assert_eq!(short_citation(None), "Unknown, n.d.");
}

#[rstest]
#[case::bare("10.1000/xyz", "https://doi.org/10.1000/xyz")]
#[case::https("https://doi.org/10.1000/xyz", "https://doi.org/10.1000/xyz")]
#[case::http("http://dx.doi.org/10.1000/xyz", "http://dx.doi.org/10.1000/xyz")]
#[case::padded("  10.1/a  ", "https://doi.org/10.1/a")]
fn doi_normalization(#[case] doi: &str, #[case] expected: &str) {
	assert_eq!(normalize_doi(doi), expected);
}

#[test]
fn long_citation_prefers_doi_over_url() {
	let store = parse_bibliography(
		"@article{both,\n  author = {A Writer},\n  year = 2019,\n  title = {Both},\n  journal = \
		 {J},\n  doi = {10.5/both},\n  url = {https://example.org/both}\n}\n",
	);
	let citation = long_citation(store.get("both"), Locale::En);

	assert_eq!(citation.links().collect::<Vec<_>>(), vec!["https://doi.org/10.5/both"]);
	assert_eq!(
		citation.to_string(),
		"Writer, 2019 — Both. J. DOI: https://doi.org/10.5/both"
	);
}

#[test]
fn long_citation_url_with_access_date() {
	let store = parse_bibliography(
		"@online{site,\n  title = {Site},\n  publisher = {Pub},\n  url = {https://example.org},\n  \
		 urldate = {2024-01-31}\n}\n",
	);

	assert_eq!(
		long_citation(store.get("site"), Locale::En).to_string(),
		"Site. Pub. https://example.org, Last accessed 2024-01-31"
	);
	assert_eq!(
		long_citation(store.get("site"), Locale::De).to_string(),
		"Site. Pub. https://example.org, Letzter Zugriff am 2024-01-31"
	);
}

#[test]
fn long_citation_marks_missing_access_date() {
	let store = references();
	insta::assert_snapshot!(
		long_citation(store.get("bob"), Locale::En).to_string(),
		@"LastBob1 & LastBob2 — Web Thing. https://example.org/thing (MISSING: urldate)"
	);
}

#[test]
fn long_citation_container_precedence() {
	let store = parse_bibliography(
		"@inproceedings{talk,\n  title = {Talk},\n  booktitle = {Proc},\n  publisher = {Pub}\n}\n",
	);
	assert_eq!(long_citation(store.get("talk"), Locale::En).to_string(), "Talk. Proc");
}

#[test]
fn long_citation_for_missing_record() {
	assert_eq!(long_citation(None, Locale::De).to_string(), "Unknown source");
}

#[test]
fn registry_numbers_are_stable() {
	let mut registry = CitationRegistry::new();
	assert_eq!(registry.number_of("b"), 1);
	assert_eq!(registry.number_of("a"), 2);
	assert_eq!(registry.number_of("b"), 1);
	assert_eq!(registry.number_of("c"), 3);

	assert_eq!(registry.len(), 3);
	assert_eq!(registry.get("a"), Some(2));
	assert_eq!(registry.get("missing"), None);
	assert_eq!(registry.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
}

#[test]
fn registry_serializes_in_number_order() {
	let mut registry = CitationRegistry::new();
	registry.number_of("x");
	registry.number_of("y");

	let value = serde_json::to_value(registry.iter().collect::<Vec<_>>())
		.unwrap_or_else(|e| panic!("serialize: {e}"));
	assert_eq!(
		value,
		serde_json::json!([{ "key": "x", "number": 1 }, { "key": "y", "number": 2 }])
	);
}

#[rstest]
#[case::tag("section", r#"<section class="a"></section>"#, true)]
#[case::tag_case("SECTION", "<section></section>", true)]
#[case::class(".sources", r#"<div class="x sources"></div>"#, true)]
#[case::class_miss(".sources", r#"<div class="sources-list"></div>"#, false)]
#[case::id("#refs", r#"<div id="refs"></div>"#, true)]
#[case::attribute("[data-cite]", r#"<span data-cite=""></span>"#, true)]
#[case::attribute_value(r#"p[data-generated="true"]"#, r#"<p data-generated="true"></p>"#, true)]
#[case::attribute_value_miss("p[data-generated=true]", r#"<p data-generated="false"></p>"#, false)]
#[case::compound("ol.sources-list", r#"<ul class="sources-list"></ul>"#, false)]
fn selector_matching(#[case] selector: &str, #[case] markup: &str, #[case] expected: bool) -> CiteResult<()> {
	let selector = Selector::parse(selector)?;
	let document = parse_html(markup)?;
	let element = document.root().unwrap_or_else(|| panic!("markup has a root"));
	assert_eq!(selector.matches(element), expected);

	Ok(())
}

#[rstest]
#[case::empty("")]
#[case::combinator("div p")]
#[case::pseudo("li:first-child")]
#[case::unclosed_attribute("[data-cite")]
#[case::dangling_class("div.")]
#[case::unterminated_quote(r#"[a="b]"#)]
fn selector_rejects(#[case] source: &str) {
	let error = Selector::parse(source);
	assert!(matches!(error, Err(CiteError::InvalidSelector { .. })), "{error:?}");
}

#[test]
fn selector_class_name() -> CiteResult<()> {
	assert_eq!(Selector::parse("section.sources.wide")?.class_name(), Some("sources"));
	assert_eq!(Selector::parse("#refs")?.class_name(), None);

	Ok(())
}

#[test]
fn html_round_trip() -> CiteResult<()> {
	let input = r#"<!DOCTYPE html><html><head><meta charset="utf-8"><title>Deck</title></head><body><p>a &amp; b<br>c</p><!-- note --></body></html>"#;
	let document = parse_html(input)?;

	assert_eq!(
		document.to_html(),
		r#"<!DOCTYPE html><html><head><meta charset="utf-8"/><title>Deck</title></head><body><p>a &amp; b<br/>c</p><!-- note --></body></html>"#
	);

	Ok(())
}

#[test]
fn html_closing_tag_closes_inner_elements() -> CiteResult<()> {
	let document = parse_html("<div><p><b>bold</div><span>after</span>")?;
	assert_eq!(
		document.to_html(),
		"<div><p><b>bold</b></p></div><span>after</span>"
	);

	Ok(())
}

#[test]
fn html_reports_broken_markup() {
	let result = parse_html(r#"<div class="unterminated></div>"#);
	assert!(matches!(result, Err(CiteError::Markup(_))), "{result:?}");
}

#[test]
fn html_keeps_script_and_style_verbatim() -> CiteResult<()> {
	let input = r#"<html><head><style>.a > .b { content: "x"; }</style></head><body><script src="reveal.js"></script><script>Reveal.initialize({ hash: "yes", x: 'y' });</script></body></html>"#;
	let document = parse_html(input)?;

	assert_eq!(document.to_html(), input);

	Ok(())
}

#[test]
fn html_script_content_may_contain_markup_characters() -> CiteResult<()> {
	let input = "<body><script>for (let i = 0; i < n; i++) { s += '<b>' + i; }</script><p>after</p></body>";
	let document = parse_html(input)?;
	let body = document.root().unwrap_or_else(|| panic!("markup has a root"));

	assert_eq!(body.child_elements().count(), 2);
	assert_eq!(document.to_html(), input);

	Ok(())
}

#[test]
fn html_unclosed_script_is_a_markup_error() {
	let result = parse_html("<body><script>let a = 1;</body>");
	assert!(matches!(result, Err(CiteError::Markup(_))), "{result:?}");
}

#[test]
fn html_text_keeps_quotes_unescaped() -> CiteResult<()> {
	let document = parse_html(r#"<p>"quoted" &amp; 'single' &gt; less</p>"#)?;
	assert_eq!(
		document.to_html(),
		r#"<p>"quoted" &amp; 'single' &gt; less</p>"#
	);

	Ok(())
}

#[test]
fn resolve_leaves_deck_scripts_intact() -> CiteResult<()> {
	let input = r#"<html><body><div class="reveal"><div class="slides"><section><p>A<span data-cite="ada"></span></p></section></div></div><script>if (a < b && c > d) { Reveal.initialize({ hash: "yes" }); }</script></body></html>"#;
	let mut document = parse_html(input)?;
	resolve_citations(&mut document, &references(), &config(), CitationRegistry::new());
	let html = document.to_html();

	assert!(
		html.contains(r#"<script>if (a < b && c > d) { Reveal.initialize({ hash: "yes" }); }</script>"#),
		"{html}"
	);
	assert!(html.contains(r#"<sup class="cite-sup""#), "{html}");

	Ok(())
}

#[test]
fn marker_keys_split_on_commas_and_semicolons() {
	let keys = MarkerKeys::parse(" a, b;c ;; ,d ");
	assert_eq!(keys.to_vec(), vec!["a", "b", "c", "d"]);
	assert_eq!(keys.joined(), "a, b, c, d");
	assert!(MarkerKeys::parse(" ; , ").is_empty());
}

#[test]
fn traversal_skips_stacks_and_hidden_sections() -> CiteResult<()> {
	let document = slides(
		r#"<section><span data-cite="first"></span></section><section><span data-cite="stack-own"></span><section><span data-cite="vertical"></span></section><section data-visibility="hidden"><span data-cite="hidden-child"></span></section></section><section data-visibility="hidden"><section><span data-cite="hidden-parent"></span></section></section><section data-visibility="uncounted"><span data-cite="uncounted"></span></section>"#,
	)?;
	let config = config();
	let traversal = collect_traversal(&document, &config.markers.selector, &config.markers.attribute);

	assert_eq!(
		traversal.keys().collect::<Vec<_>>(),
		vec!["first", "vertical", "uncounted"]
	);

	Ok(())
}

#[test]
fn traversal_includes_markers_nested_in_markers() -> CiteResult<()> {
	let document = slides(
		r#"<section><span data-cite="outer"><span data-cite="inner"></span></span><span data-cite="after"></span></section>"#,
	)?;
	let config = config();
	let traversal = collect_traversal(&document, &config.markers.selector, &config.markers.attribute);

	assert_eq!(
		traversal.keys().collect::<Vec<_>>(),
		vec!["outer", "inner", "after"]
	);

	Ok(())
}

#[test]
fn resolve_numbers_keys_of_nested_markers() -> CiteResult<()> {
	let mut document = slides(
		r#"<section><p>X<span data-cite="ada"><span data-cite="bob"></span></span></p><div class="citation-bar"></div></section>"#,
	)?;
	let resolution = resolve_citations(&mut document, &references(), &config(), CitationRegistry::new());
	let html = document.to_html();

	assert_eq!(resolution.registry.keys().collect::<Vec<_>>(), vec!["ada", "bob"]);
	assert_eq!(resolution.markers, 1);
	assert_eq!(resolution.summaries.len(), 1);
	assert_eq!(resolution.summaries[0].keys, vec!["ada", "bob"]);
	assert!(!html.contains("data-cite"), "{html}");
	assert_eq!(html.matches("<li").count(), 2, "{html}");

	Ok(())
}

#[test]
fn resolve_numbers_in_first_appearance_order() -> CiteResult<()> {
	let mut document = deck()?;
	let resolution = resolve_citations(&mut document, &references(), &config(), CitationRegistry::new());

	assert_eq!(resolution.registry.keys().collect::<Vec<_>>(), vec!["ada", "bob"]);
	assert_eq!(resolution.markers, 3);
	assert!(resolution.is_complete());

	let html = document.to_html();
	assert!(html.contains(r#"<sup class="cite-sup" title="ada">1</sup>"#), "{html}");
	assert!(html.contains(r#"<sup class="cite-sup" title="bob, ada">2,1</sup>"#), "{html}");
	assert!(html.contains(r#"<p><sup class="cite-sup" title="bob">2</sup></p>"#), "{html}");
	assert!(!html.contains("data-cite="), "{html}");

	Ok(())
}

#[test]
fn resolve_two_section_deck() -> CiteResult<()> {
	let mut document = slides(
		r#"<section><span data-cite="ada"></span><span data-cite="ada,bob"></span><div class="citation-bar"></div></section><section><span data-cite="bob"></span><div class="citation-bar"></div></section>"#,
	)?;
	let resolution = resolve_citations(&mut document, &references(), &config(), CitationRegistry::new());

	assert_eq!(resolution.registry.get("ada"), Some(1));
	assert_eq!(resolution.registry.get("bob"), Some(2));
	assert_eq!(
		resolution.summaries[0].text,
		"1. LastAda, 2020; 2. LastBob1 & LastBob2, n.d."
	);
	assert_eq!(resolution.summaries[1].text, "2. LastBob1 & LastBob2, n.d.");

	let list_path = resolution
		.bibliography
		.unwrap_or_else(|| panic!("bibliography list exists"));
	let list = document
		.element(&list_path)
		.unwrap_or_else(|| panic!("list path is valid"));
	let keys: Vec<&str> = list
		.child_elements()
		.filter_map(|(_, item)| item.attribute("data-cite-key"))
		.collect();
	assert_eq!(keys, vec!["ada", "bob"]);

	Ok(())
}

#[test]
fn html_accepts_valueless_attributes() -> CiteResult<()> {
	let document = parse_html("<section data-auto-animate><p>x</p></section>")?;
	let section = document.root().unwrap_or_else(|| panic!("markup has a root"));
	assert_eq!(section.attribute("data-auto-animate"), Some(""));

	Ok(())
}

#[test]
fn resolve_writes_section_summaries() -> CiteResult<()> {
	let mut document = deck()?;
	let resolution = resolve_citations(&mut document, &references(), &config(), CitationRegistry::new());

	let texts: Vec<&str> = resolution
		.summaries
		.iter()
		.map(|summary| summary.text.as_str())
		.collect();
	assert_eq!(
		texts,
		vec![
			"1. LastAda, 2020; 2. LastBob1 & LastBob2, n.d.",
			"2. LastBob1 & LastBob2, n.d.",
		]
	);
	assert!(resolution.summaries.iter().all(|summary| summary.written));

	let html = document.to_html();
	assert!(
		html.contains(
			r#"<div class="citation-bar"><p data-generated="true">1. LastAda, 2020; 2. LastBob1 &amp; LastBob2, n.d.</p></div>"#
		),
		"{html}"
	);

	Ok(())
}

#[test]
fn resolve_fills_bibliography_in_number_order() -> CiteResult<()> {
	let mut document = deck()?;
	let resolution = resolve_citations(&mut document, &references(), &config(), CitationRegistry::new());

	let list_path = resolution
		.bibliography
		.unwrap_or_else(|| panic!("bibliography list exists"));
	let list = document
		.element(&list_path)
		.unwrap_or_else(|| panic!("list path is valid"));

	assert_eq!(
		list.to_string(),
		concat!(
			r#"<ol class="sources-list">"#,
			r#"<li id="src-ada" data-cite-key="ada">1. LastAda, 2020 — On Analytical Engines. Notes. DOI: "#,
			r#"<a href="https://doi.org/10.1000/xyz" target="_blank" rel="noopener noreferrer">https://doi.org/10.1000/xyz</a></li>"#,
			r#"<li id="src-bob" data-cite-key="bob">2. LastBob1 &amp; LastBob2 — Web Thing. "#,
			r#"<a href="https://example.org/thing" target="_blank" rel="noopener noreferrer">https://example.org/thing</a>"#,
			r#" (MISSING: urldate)</li>"#,
			"</ol>"
		)
	);

	Ok(())
}

#[test]
fn resolve_small_deck_exactly() -> CiteResult<()> {
	let mut document =
		slides(r#"<section><p>See <span data-cite="ada"></span>.</p><div class="citation-bar"></div></section>"#)?;
	resolve_citations(&mut document, &references(), &config(), CitationRegistry::new());

	insta::assert_snapshot!(
		document.to_html(),
		@r#"<div class="slides"><section><p>See <sup class="cite-sup" title="ada">1</sup>.</p><div class="citation-bar"><p data-generated="true">1. LastAda, 2020</p></div></section><section class="sources"><h2>Sources</h2><ol class="sources-list"><li id="src-ada" data-cite-key="ada">1. LastAda, 2020 — On Analytical Engines. Notes. DOI: <a href="https://doi.org/10.1000/xyz" target="_blank" rel="noopener noreferrer">https://doi.org/10.1000/xyz</a></li></ol></section></div>"#
	);

	Ok(())
}

#[test]
fn resolve_continues_an_existing_registry() -> CiteResult<()> {
	let mut registry = CitationRegistry::new();
	registry.number_of("bob");

	let mut document = deck()?;
	let resolution = resolve_citations(&mut document, &references(), &config(), registry);

	assert_eq!(resolution.registry.keys().collect::<Vec<_>>(), vec!["bob", "ada"]);
	assert!(document.to_html().contains(r#"title="bob, ada">1,2</sup>"#));

	Ok(())
}

#[test]
#[traced_test]
fn resolve_keeps_going_without_records() -> CiteResult<()> {
	let mut document = slides(
		r#"<section><span data-cite="ghost, ada"></span><div class="citation-bar"></div></section>"#,
	)?;
	let resolution = resolve_citations(&mut document, &references(), &config(), CitationRegistry::new());

	assert_eq!(resolution.missing, vec!["ghost".to_string()]);
	assert!(!resolution.is_complete());
	assert_eq!(resolution.summaries[0].text, "1. Unknown, n.d.; 2. LastAda, 2020");

	let html = document.to_html();
	assert!(
		html.contains(
			r#"<li id="src-ghost" data-cite-key="ghost">1. Unknown source (Missing in .bib: ghost)</li>"#
		),
		"{html}"
	);
	assert!(logs_contain("citation key has no bibliography record"));
	assert!(logs_contain("ghost"));

	Ok(())
}

#[test]
fn resolve_leaves_sections_without_citations_alone() -> CiteResult<()> {
	let mut document = slides(
		r#"<section><div class="citation-bar"><p>Keep me</p></div></section><section><span data-cite="ada"></span></section>"#,
	)?;
	let resolution = resolve_citations(&mut document, &references(), &config(), CitationRegistry::new());

	assert_eq!(resolution.summaries.len(), 1);
	assert!(!resolution.summaries[0].written);
	assert!(
		document
			.to_html()
			.contains(r#"<div class="citation-bar"><p>Keep me</p></div>"#)
	);

	Ok(())
}

#[test]
fn resolve_without_creating_bibliography() -> CiteResult<()> {
	let mut config = config();
	config.sources.create = false;
	let mut document = slides(r#"<section><span data-cite="ada"></span></section>"#)?;
	let resolution = resolve_citations(&mut document, &references(), &config, CitationRegistry::new());

	assert_eq!(resolution.bibliography, None);
	assert!(!document.to_html().contains("sources-list"));

	Ok(())
}

#[test]
fn resolve_adds_list_to_existing_container() -> CiteResult<()> {
	let mut document = slides(
		r#"<section><span data-cite="ada"></span></section><section class="sources"><h2>Refs</h2></section>"#,
	)?;
	resolve_citations(&mut document, &references(), &config(), CitationRegistry::new());

	let html = document.to_html();
	assert!(
		html.contains(r#"<section class="sources"><h2>Refs</h2><ol class="sources-list"><li id="src-ada""#),
		"{html}"
	);

	Ok(())
}

#[test]
fn resolve_uses_document_language() -> CiteResult<()> {
	let mut document = parse_html(
		r#"<html lang="de-AT"><body><div class="slides"><section><span data-cite="bob"></span></section></div></body></html>"#,
	)?;
	let resolution = resolve_citations(&mut document, &references(), &config(), CitationRegistry::new());

	assert_eq!(resolution.locale, Locale::De);
	let html = document.to_html();
	assert!(html.contains("<h2>Literaturverzeichnis</h2>"), "{html}");
	assert!(html.contains("(FEHLT: urldate)"), "{html}");

	Ok(())
}

#[test]
fn resolve_with_marker_options() -> CiteResult<()> {
	let mut config = config();
	config.markers.brackets = true;
	config.markers.tooltip = false;
	config.markers.replace = false;
	config.markers.class = "ref".to_string();

	let mut document = slides(r#"<section><span data-cite="bob,ada">[cite]</span></section>"#)?;
	resolve_citations(&mut document, &references(), &config, CitationRegistry::new());

	assert!(
		document
			.to_html()
			.contains(r#"<span data-cite="bob,ada"><sup class="ref">[1,2]</sup></span>"#)
	);

	Ok(())
}

#[test]
fn resolve_is_repeatable_when_markers_are_kept() -> CiteResult<()> {
	let mut config = config();
	config.markers.replace = false;

	let mut document = deck()?;
	resolve_citations(&mut document, &references(), &config, CitationRegistry::new());
	let first = document.to_html();

	resolve_citations(&mut document, &references(), &config, CitationRegistry::new());
	assert_eq!(document.to_html(), first);

	Ok(())
}

#[test]
fn run_citations_reads_from_source() -> CiteResult<()> {
	let source = |location: &Path| -> CiteResult<String> {
		assert_eq!(location, Path::new(DEFAULT_BIB_FILE));
		Ok(REFERENCES.to_string())
	};

	let mut document = deck()?;
	let resolution = run_citations(&mut document, &source, &config())?;
	assert_eq!(resolution.registry.len(), 2);

	Ok(())
}

#[test]
fn fetch_failure_leaves_document_untouched() -> CiteResult<()> {
	let source = |location: &Path| -> CiteResult<String> {
		Err(CiteError::Fetch {
			path: location.display().to_string(),
			reason: "offline".to_string(),
		})
	};

	let mut document = deck()?;
	let before = document.clone();
	let result = run_citations(&mut document, &source, &config());

	assert!(matches!(result, Err(CiteError::Fetch { .. })));
	assert_eq!(document, before);

	Ok(())
}

#[test]
fn file_source_reads_relative_to_root() -> CiteResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	std::fs::create_dir_all(tmp.path().join("bib"))?;
	std::fs::write(tmp.path().join(DEFAULT_BIB_FILE), REFERENCES)?;

	let source = FileSource::new(tmp.path());
	assert_eq!(source.fetch(Path::new(DEFAULT_BIB_FILE))?, REFERENCES);

	let missing = source.fetch(Path::new("bib/none.bib"));
	assert!(
		matches!(&missing, Err(CiteError::Fetch { path, .. }) if path == "bib/none.bib"),
		"{missing:?}"
	);

	Ok(())
}

#[test]
fn config_defaults() {
	let config = CiteConfig::default();
	assert_eq!(config.bib_file.as_path(), Path::new("bib/references.bib"));
	assert_eq!(config.markers.selector.as_str(), "[data-cite]");
	assert_eq!(config.markers.attribute, "data-cite");
	assert_eq!(config.markers.class, "cite-sup");
	assert!(config.markers.tooltip);
	assert!(config.markers.replace);
	assert!(!config.markers.brackets);
	assert_eq!(config.summary.selector.as_str(), ".citation-bar");
	assert_eq!(config.sources.selector.as_str(), ".sources");
	assert_eq!(config.sources.id_prefix, "src-");
	assert!(config.sources.create);
}

#[test]
fn config_from_toml_overrides_some_fields() -> CiteResult<()> {
	let config = CiteConfig::from_toml(
		"bib_file = \"refs.bib\"\n\n[markers]\nbrackets = true\n\n[sources]\nselector = \
		 \"section#refs\"\ntitle = \"References\"\n",
	)?;

	assert_eq!(config.bib_file.as_path(), Path::new("refs.bib"));
	assert!(config.markers.brackets);
	assert!(config.markers.tooltip);
	assert_eq!(config.sources.selector.as_str(), "section#refs");
	assert_eq!(config.sources.title_for(Locale::De), "References");
	assert_eq!(config.summary, SummaryConfig::default());

	Ok(())
}

#[test]
fn config_rejects_invalid_selector() {
	let result = CiteConfig::from_toml("[summary]\nselector = \"div > p\"\n");
	let Err(CiteError::ConfigParse(message)) = result else {
		panic!("expected a config error, got {result:?}");
	};
	assert!(message.contains("invalid selector"), "{message}");
}

#[test]
fn config_discovery_order() -> CiteResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	assert_eq!(CiteConfig::load(tmp.path())?, None);
	assert_eq!(CiteConfig::load_or_default(tmp.path())?, CiteConfig::default());

	std::fs::create_dir_all(tmp.path().join(".config"))?;
	std::fs::write(tmp.path().join(".config/bibcite.toml"), "bib_file = \"hidden.bib\"\n")?;
	std::fs::write(tmp.path().join("bibcite.toml"), "bib_file = \"top.bib\"\n")?;

	let config = CiteConfig::load(tmp.path())?.unwrap_or_else(|| panic!("config is found"));
	assert_eq!(config.bib_file.as_path(), Path::new("top.bib"));

	Ok(())
}

#[rstest]
#[case::absent(None, Locale::En)]
#[case::english(Some("en"), Locale::En)]
#[case::german(Some("de"), Locale::De)]
#[case::german_region(Some("DE-ch"), Locale::De)]
#[case::other(Some("fr"), Locale::En)]
fn locale_from_lang(#[case] lang: Option<&str>, #[case] expected: Locale) {
	assert_eq!(Locale::from_lang(lang), expected);
}
