mod patterns;
mod token;

pub use token::{Token, TokenKind};

use crate::core::{CompileError, CompileErrorKind, Input};
use crate::tree::FilterCall;
use crate::util::split_top_level;
use patterns::*;

/// Strips `{# ... #}` comments (which may span multiple lines) from the raw
/// source, returning the cleaned text. Fails if the delimiters don't
/// balance.
pub fn strip_comments(source: &str) -> Result<String, CompileError> {
	if source_has_unmatched_close(source) {
		return Err(CompileError::new(CompileErrorKind::ParseError(
			"comment delimiters do not balance".into(),
		)));
	}

	let mut out = String::with_capacity(source.len());
	let mut rest = source;
	loop {
		match rest.find(COMMENT_OPEN) {
			None => {
				out.push_str(rest);
				break;
			}
			Some(open) => {
				out.push_str(&rest[..open]);
				let after_open = &rest[open + COMMENT_OPEN.len()..];
				match after_open.find(COMMENT_CLOSE) {
					None => {
						return Err(CompileError::new(CompileErrorKind::ParseError(
							"unterminated comment `{#`".into(),
						)));
					}
					Some(close) => {
						rest = &after_open[close + COMMENT_CLOSE.len()..];
					}
				}
			}
		}
	}
	Ok(out)
}

fn source_has_unmatched_close(source: &str) -> bool {
	let mut depth = 0i32;
	let mut rest = source;
	loop {
		let next_open = rest.find(COMMENT_OPEN);
		let next_close = rest.find(COMMENT_CLOSE);
		match (next_open, next_close) {
			(None, None) => return depth != 0,
			(Some(o), None) => {
				depth += 1;
				rest = &rest[o + COMMENT_OPEN.len()..];
			}
			(None, Some(c)) => {
				if depth == 0 {
					return true;
				}
				depth -= 1;
				rest = &rest[c + COMMENT_CLOSE.len()..];
			}
			(Some(o), Some(c)) => {
				if o < c {
					depth += 1;
					rest = &rest[o + COMMENT_OPEN.len()..];
				} else {
					if depth == 0 {
						return true;
					}
					depth -= 1;
					rest = &rest[c + COMMENT_CLOSE.len()..];
				}
			}
		}
	}
}

struct Candidate {
	len: usize,
	token: TokenKind,
}

/// Tries every directive pattern at the start of `text`, returning the one
/// selected by the tie-break rule: longest match wins; on a further tie,
/// any directive outranks `VARIABLE`.
fn match_directive(text: &str) -> Option<Candidate> {
	let mut best: Option<Candidate> = None;
	let mut consider = |len: usize, token: TokenKind| {
		let better = match &best {
			None => true,
			Some(b) => len > b.len || (len == b.len && token.is_directive() && !b.token.is_directive()),
		};
		if better {
			best = Some(Candidate { len, token });
		}
	};

	if let Some(m) = PARENT.find(text) {
		consider(m.end(), TokenKind::Parent);
	}
	if let Some(caps) = FOR_START.captures(text) {
		let m = caps.get(0).unwrap();
		consider(
			m.end(),
			TokenKind::ForStart {
				item_name: caps["item"].to_string(),
				iterable_expr: caps["iter"].trim().to_string(),
				filter_expr: caps.name("filter").map(|m| m.as_str().trim().to_string()),
			},
		);
	}
	if let Some(m) = FOR_END.find(text) {
		consider(m.end(), TokenKind::ForEnd);
	}
	if let Some(caps) = IF_START.captures(text) {
		let m = caps.get(0).unwrap();
		consider(
			m.end(),
			TokenKind::IfStart {
				predicate_expr: caps["pred"].trim().to_string(),
			},
		);
	}
	if let Some(caps) = ELSEIF.captures(text) {
		let m = caps.get(0).unwrap();
		consider(
			m.end(),
			TokenKind::Elseif {
				predicate_expr: caps["pred"].trim().to_string(),
			},
		);
	}
	if let Some(m) = ELSE.find(text) {
		consider(m.end(), TokenKind::Else);
	}
	if let Some(m) = IF_END.find(text) {
		consider(m.end(), TokenKind::IfEnd);
	}
	if let Some(caps) = EXTENDS.captures(text) {
		let m = caps.get(0).unwrap();
		consider(
			m.end(),
			TokenKind::Extends {
				parent_path: caps["path"].to_string(),
			},
		);
	}
	if let Some(caps) = BLOCK_START.captures(text) {
		let m = caps.get(0).unwrap();
		consider(
			m.end(),
			TokenKind::BlockStart {
				name: caps["name"].to_string(),
			},
		);
	}
	if let Some(m) = BLOCK_END.find(text) {
		consider(m.end(), TokenKind::BlockEnd);
	}
	if let Some(caps) = MACRO_START.captures(text) {
		let m = caps.get(0).unwrap();
		consider(
			m.end(),
			TokenKind::MacroStart {
				name: caps["name"].to_string(),
				signature: caps["sig"].trim().to_string(),
			},
		);
	}
	if let Some(m) = MACRO_END.find(text) {
		consider(m.end(), TokenKind::MacroEnd);
	}
	if let Some(caps) = IMPORT.captures(text) {
		let m = caps.get(0).unwrap();
		consider(
			m.end(),
			TokenKind::Import {
				path: caps["path"].to_string(),
				alias: caps["alias"].to_string(),
			},
		);
	}
	if let Some(caps) = VARIABLE.captures(text) {
		let m = caps.get(0).unwrap();
		let (expr, filters) = parse_variable_body(&caps["body"]);
		consider(m.end(), TokenKind::Variable { expr, filters });
	}

	best
}

fn parse_variable_body(body: &str) -> (String, Vec<FilterCall>) {
	let parts = split_top_level(body, '|');
	let mut parts = parts.into_iter();
	let expr = parts.next().unwrap_or_default().trim().to_string();
	let filters = parts
		.map(|segment| {
			let mut pieces = segment.splitn(2, ':');
			let name = pieces.next().unwrap_or_default().trim().to_string();
			let args = match pieces.next() {
				Some(rest) => split_top_level(rest, ',')
					.into_iter()
					.map(|a| a.trim().to_string())
					.collect(),
				None => Vec::new(),
			};
			FilterCall { name, args }
		})
		.collect();
	(expr, filters)
}

/// Scans comment-stripped source text into a flat token stream. `name` is
/// used only for error messages.
pub fn lex(input: &Input) -> Result<Vec<Token>, CompileError> {
	let mut tokens = Vec::new();
	let mut cursor = input.start();
	let source = input.text(..);

	loop {
		let offset = cursor.offset();
		let rest = &source[offset..];
		if rest.is_empty() {
			break;
		}

		// Find the next byte where a directive could start.
		let next_brace = ANY_BRACE.find(rest).map(|m| m.start());
		let gap_end = next_brace.unwrap_or(rest.len());

		if gap_end > 0 {
			let mut text_end = cursor.clone();
			text_end.seek(offset + gap_end);
			tokens.push(Token {
				kind: TokenKind::Text,
				lexeme: rest[..gap_end].to_string(),
				span: cursor.span_to(&text_end),
			});
			cursor = text_end;
			continue;
		}

		match match_directive(&source[cursor.offset()..]) {
			Some(candidate) => {
				let mut end = cursor.clone();
				end.seek(cursor.offset() + candidate.len);
				let lexeme = source[cursor.offset()..end.offset()].to_string();
				tokens.push(Token {
					kind: candidate.token,
					lexeme,
					span: cursor.span_to(&end),
				});
				cursor = end;
			}
			None => {
				return Err(CompileError::new(CompileErrorKind::ParseError(format!(
					"unrecognised or unterminated directive at {}",
					cursor.location()
				)))
				.at(cursor.span_to(&cursor)));
			}
		}
	}

	Ok(tokens)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tokens_of(source: &str) -> Vec<TokenKind> {
		let cleaned = strip_comments(source).unwrap();
		let input = Input::new("t", cleaned);
		lex(&input).unwrap().into_iter().map(|t| t.kind).collect()
	}

	#[test]
	fn lexes_variable_with_filters() {
		let kinds = tokens_of("Hi {{ name | trim | upper }}!");
		assert_eq!(kinds.len(), 3);
		assert_eq!(kinds[0], TokenKind::Text);
		match &kinds[1] {
			TokenKind::Variable { expr, filters } => {
				assert_eq!(expr, "name");
				assert_eq!(filters.len(), 2);
				assert_eq!(filters[0].name, "trim");
				assert_eq!(filters[1].name, "upper");
			}
			other => panic!("unexpected: {other:?}"),
		}
	}

	#[test]
	fn strips_multiline_comments() {
		let cleaned = strip_comments("a{# this\nis a comment #}b").unwrap();
		assert_eq!(cleaned, "ab");
	}

	#[test]
	fn unterminated_comment_is_an_error() {
		assert!(strip_comments("a{# oops").is_err());
	}

	#[test]
	fn parent_call_outranks_generic_variable_on_tie() {
		let kinds = tokens_of("{{ parent() }}");
		assert_eq!(kinds, vec![TokenKind::Parent]);
	}

	#[test]
	fn lexes_for_loop_with_filter_clause() {
		let kinds = tokens_of("{% for x in items if x > 0 %}{{ x }}{% endfor %}");
		match &kinds[0] {
			TokenKind::ForStart {
				item_name,
				iterable_expr,
				filter_expr,
			} => {
				assert_eq!(item_name, "x");
				assert_eq!(iterable_expr, "items");
				assert_eq!(filter_expr.as_deref(), Some("x > 0"));
			}
			other => panic!("unexpected: {other:?}"),
		}
	}

	#[test]
	fn rejects_unterminated_directive() {
		let input = Input::new("t", "Hi {{ name".to_string());
		assert!(lex(&input).is_err());
	}
}
