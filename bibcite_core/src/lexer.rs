use std::collections::BTreeMap;
use std::ops::Range;

use logos::Logos;

/// Raw tokens produced by logos for the body of a single bibliography record.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum RawToken {
	#[token("{")]
	BraceOpen,
	#[token("}")]
	BraceClose,
	#[token("\"")]
	Quote,
	#[token("\\")]
	Backslash,
	#[token(",")]
	Comma,
	#[token("=")]
	Equals,
	#[token("\n")]
	Newline,
	#[regex(r"[^\S\n]+")]
	Whitespace,
	#[regex(r"[a-zA-Z_][a-zA-Z0-9_\-]*")]
	Ident,
	#[regex(r#"[^{}"\\,=\sa-zA-Z_]+"#)]
	Text,
}

/// Walks the logos token stream of a record body, collecting `name = value`
/// pairs. Every failure mode ends the walk for this body and keeps what was
/// collected so far.
struct FieldWalker<'a> {
	/// The record body between the key separator and the closing brace.
	source: &'a str,
	/// The collected raw tokens and their byte spans.
	raw_tokens: Vec<(Result<RawToken, ()>, Range<usize>)>,
	/// Current index into `raw_tokens`.
	cursor: usize,
	/// Collected fields; a later field with the same name replaces an earlier
	/// one.
	fields: BTreeMap<String, String>,
}

impl<'a> FieldWalker<'a> {
	fn new(source: &'a str) -> Self {
		let raw_tokens: Vec<_> = RawToken::lexer(source).spanned().collect();

		Self {
			source,
			raw_tokens,
			cursor: 0,
			fields: BTreeMap::new(),
		}
	}

	fn is_done(&self) -> bool {
		self.cursor >= self.raw_tokens.len()
	}

	/// The token under the cursor. Unrecognized bytes are reported as `None`.
	fn current(&self) -> Option<RawToken> {
		self.raw_tokens
			.get(self.cursor)
			.and_then(|(token, _)| token.as_ref().ok().copied())
	}

	/// Byte offset where the token under the cursor starts, or the end of the
	/// body once every token is consumed.
	fn offset(&self) -> usize {
		self.raw_tokens
			.get(self.cursor)
			.map_or(self.source.len(), |(_, span)| span.start)
	}

	fn current_slice(&self) -> &'a str {
		let (_, span) = &self.raw_tokens[self.cursor];
		&self.source[span.clone()]
	}

	fn skip_while(&mut self, predicate: impl Fn(Option<RawToken>) -> bool) {
		while !self.is_done() && predicate(self.current()) {
			self.cursor += 1;
		}
	}

	fn process(&mut self) {
		loop {
			self.skip_while(|token| {
				matches!(
					token,
					Some(RawToken::Whitespace | RawToken::Newline | RawToken::Comma)
				)
			});

			if self.is_done() || self.current() != Some(RawToken::Ident) {
				break;
			}

			let name = self.current_slice().to_ascii_lowercase();
			self.cursor += 1;

			self.skip_while(|token| {
				matches!(
					token,
					Some(RawToken::Whitespace | RawToken::Newline | RawToken::Equals)
				)
			});

			if self.is_done() {
				break;
			}

			let value = match self.current() {
				Some(RawToken::BraceOpen) => self.braced_value(),
				Some(RawToken::Quote) => self.quoted_value(),
				_ => self.bare_value(),
			};

			self.fields.insert(name, clean_value(&value));

			self.skip_while(|token| !matches!(token, Some(RawToken::Comma | RawToken::Newline)));
			if self.current() == Some(RawToken::Comma) {
				self.cursor += 1;
			}
		}
	}

	/// `{...}` with nested braces counted. An unterminated value runs to the
	/// end of the body.
	fn braced_value(&mut self) -> String {
		self.cursor += 1;
		let start = self.offset();
		let mut depth = 1usize;

		while !self.is_done() {
			match self.current() {
				Some(RawToken::BraceOpen) => depth += 1,
				Some(RawToken::BraceClose) => {
					depth -= 1;
					if depth == 0 {
						let end = self.offset();
						self.cursor += 1;
						return self.source[start..end].to_string();
					}
				}
				_ => {}
			}
			self.cursor += 1;
		}

		self.source[start..].to_string()
	}

	/// `"..."` where a backslash protects the following token from closing the
	/// value.
	fn quoted_value(&mut self) -> String {
		self.cursor += 1;
		let start = self.offset();

		while !self.is_done() && self.current() != Some(RawToken::Quote) {
			if self.current() == Some(RawToken::Backslash) && self.cursor + 1 < self.raw_tokens.len()
			{
				self.cursor += 2;
			} else {
				self.cursor += 1;
			}
		}

		let end = self.offset();
		if !self.is_done() {
			self.cursor += 1;
		}

		unescape_quotes(&self.source[start..end])
	}

	/// Anything up to the next comma or line break.
	fn bare_value(&mut self) -> String {
		let start = self.offset();
		self.skip_while(|token| !matches!(token, Some(RawToken::Comma | RawToken::Newline)));
		self.source[start..self.offset()].to_string()
	}
}

/// Replace `\"` with `"`. Other backslash sequences are LaTeX and stay as
/// written.
fn unescape_quotes(value: &str) -> String {
	value.replace("\\\"", "\"")
}

/// Trim the value and drop every remaining brace character.
///
/// Braces are removed even from quoted and bare values, so a literal `{`
/// written inside quotes does not survive.
pub fn clean_value(value: &str) -> String {
	value.trim().chars().filter(|ch| !matches!(ch, '{' | '}')).collect()
}

/// Tokenize a record body and collect its fields.
pub fn tokenize_fields(body: &str) -> BTreeMap<String, String> {
	let mut walker = FieldWalker::new(body);
	walker.process();
	walker.fields
}
