//! The constant folder (spec §4.5): given an expression string, returns a
//! folded replacement or the original, unchanged, when folding isn't safe.
//! Folding never errors — an uncertain input is simply not foldable.

use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").unwrap());
static QUOTED_STRING: Lazy<Regex> = Lazy::new(|| Regex::new(r#"'(?:[^'\\]|\\.)*'|"(?:[^"\\]|\\.)*""#).unwrap());

/// Folds `expr` into its canonical constant form, or returns it unchanged
/// if it contains a free identifier or isn't recognised by any of the
/// three sub-grammars.
pub fn fold(expr: &str) -> String {
	try_fold(expr).unwrap_or_else(|| expr.to_string())
}

/// Like [`fold`], but distinguishes "folded, and happened to render back to
/// the same text" from "not foldable at all" — needed by callers (the
/// compiler's lowering step) that must know whether an expression is
/// constant, not just what it folds to.
pub fn try_fold(expr: &str) -> Option<String> {
	let trimmed = expr.trim();
	if has_free_identifier(trimmed) {
		return None;
	}
	fold_arithmetic(trimmed)
		.or_else(|| fold_string_concat(trimmed))
		.or_else(|| fold_boolean(trimmed))
}

/// True if `text`, after removing quoted substrings, contains an
/// identifier-shaped token other than `true`/`false`/`null`. This also
/// catches dotted paths like `a.b`, since `a` alone is already such a
/// token.
fn has_free_identifier(text: &str) -> bool {
	let without_strings = QUOTED_STRING.replace_all(text, " ");
	IDENTIFIER
		.find_iter(&without_strings)
		.any(|m| !matches!(m.as_str(), "true" | "false" | "null"))
}

// ---------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------

#[derive(Copy, Clone, Debug, PartialEq)]
enum Num {
	Int(i64),
	Float(f64),
}

impl Num {
	fn as_f64(self) -> f64 {
		match self {
			Num::Int(i) => i as f64,
			Num::Float(f) => f,
		}
	}

	fn render(self) -> String {
		match self {
			Num::Int(i) => i.to_string(),
			Num::Float(f) => format!("{f}"),
		}
	}
}

fn fold_arithmetic(text: &str) -> Option<String> {
	if !text
		.chars()
		.all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '*' | '/' | '%' | '(' | ')' | '.') || c.is_whitespace())
	{
		return None;
	}
	if !text.chars().any(|c| c.is_ascii_digit()) {
		return None;
	}
	let chars: Vec<char> = text.chars().collect();
	let mut parser = ArithParser { chars, pos: 0 };
	let value = parser.parse_expr()?;
	parser.skip_ws();
	if parser.pos != parser.chars.len() {
		return None;
	}
	Some(value.render())
}

struct ArithParser {
	chars: Vec<char>,
	pos: usize,
}

impl ArithParser {
	fn skip_ws(&mut self) {
		while self.pos < self.chars.len() && self.chars[self.pos].is_whitespace() {
			self.pos += 1;
		}
	}

	fn peek(&mut self) -> Option<char> {
		self.skip_ws();
		self.chars.get(self.pos).copied()
	}

	fn parse_expr(&mut self) -> Option<Num> {
		let mut value = self.parse_term()?;
		loop {
			match self.peek() {
				Some('+') => {
					self.pos += 1;
					value = add(value, self.parse_term()?)?;
				}
				Some('-') => {
					self.pos += 1;
					value = sub(value, self.parse_term()?)?;
				}
				_ => break,
			}
		}
		Some(value)
	}

	fn parse_term(&mut self) -> Option<Num> {
		let mut value = self.parse_unary()?;
		loop {
			match self.peek() {
				Some('*') => {
					self.pos += 1;
					value = mul(value, self.parse_unary()?)?;
				}
				Some('/') => {
					self.pos += 1;
					value = div(value, self.parse_unary()?)?;
				}
				Some('%') => {
					self.pos += 1;
					value = rem(value, self.parse_unary()?)?;
				}
				_ => break,
			}
		}
		Some(value)
	}

	fn parse_unary(&mut self) -> Option<Num> {
		if self.peek() == Some('-') {
			self.pos += 1;
			let value = self.parse_unary()?;
			return Some(match value {
				Num::Int(i) => Num::Int(i.checked_neg()?),
				Num::Float(f) => Num::Float(-f),
			});
		}
		self.parse_primary()
	}

	fn parse_primary(&mut self) -> Option<Num> {
		match self.peek() {
			Some('(') => {
				self.pos += 1;
				let value = self.parse_expr()?;
				if self.peek() != Some(')') {
					return None;
				}
				self.pos += 1;
				Some(value)
			}
			Some(c) if c.is_ascii_digit() => self.parse_number(),
			_ => None,
		}
	}

	fn parse_number(&mut self) -> Option<Num> {
		let start = self.pos;
		let mut saw_dot = false;
		while let Some(&c) = self.chars.get(self.pos) {
			if c.is_ascii_digit() {
				self.pos += 1;
			} else if c == '.' && !saw_dot {
				saw_dot = true;
				self.pos += 1;
			} else {
				break;
			}
		}
		let text: String = self.chars[start..self.pos].iter().collect();
		if saw_dot {
			text.parse::<f64>().ok().map(Num::Float)
		} else {
			text.parse::<i64>().ok().map(Num::Int)
		}
	}
}

fn add(a: Num, b: Num) -> Option<Num> {
	match (a, b) {
		(Num::Int(a), Num::Int(b)) => a.checked_add(b).map(Num::Int),
		_ => Some(Num::Float(a.as_f64() + b.as_f64())),
	}
}

fn sub(a: Num, b: Num) -> Option<Num> {
	match (a, b) {
		(Num::Int(a), Num::Int(b)) => a.checked_sub(b).map(Num::Int),
		_ => Some(Num::Float(a.as_f64() - b.as_f64())),
	}
}

fn mul(a: Num, b: Num) -> Option<Num> {
	match (a, b) {
		(Num::Int(a), Num::Int(b)) => a.checked_mul(b).map(Num::Int),
		_ => Some(Num::Float(a.as_f64() * b.as_f64())),
	}
}

fn div(a: Num, b: Num) -> Option<Num> {
	match (a, b) {
		(Num::Int(a), Num::Int(b)) => {
			if b == 0 {
				None
			} else if a % b == 0 {
				Some(Num::Int(a / b))
			} else {
				Some(Num::Float(a as f64 / b as f64))
			}
		}
		_ => {
			if b.as_f64() == 0.0 {
				None
			} else {
				Some(Num::Float(a.as_f64() / b.as_f64()))
			}
		}
	}
}

fn rem(a: Num, b: Num) -> Option<Num> {
	match (a, b) {
		(Num::Int(a), Num::Int(b)) => {
			if b == 0 {
				None
			} else {
				a.checked_rem(b).map(Num::Int)
			}
		}
		_ => {
			if b.as_f64() == 0.0 {
				None
			} else {
				Some(Num::Float(a.as_f64() % b.as_f64()))
			}
		}
	}
}

// ---------------------------------------------------------------------
// String concatenation
// ---------------------------------------------------------------------

fn fold_string_concat(text: &str) -> Option<String> {
	let parts = split_concat_operands(text)?;
	let mut result = String::new();
	for part in &parts {
		result.push_str(&crate::util::unquote(part));
	}
	Some(render_string_literal(&result))
}

/// Splits `text` on top-level `~`/`.` operators, requiring every operand to
/// be a quoted string literal. Returns `None` if any operand isn't.
fn split_concat_operands(text: &str) -> Option<Vec<String>> {
	let mut parts = Vec::new();
	let mut current = String::new();
	let mut quote: Option<char> = None;
	let mut chars = text.chars().peekable();

	while let Some(ch) = chars.next() {
		match quote {
			Some(q) => {
				current.push(ch);
				if ch == '\\' {
					if let Some(next) = chars.next() {
						current.push(next);
					}
				} else if ch == q {
					quote = None;
				}
			}
			None => match ch {
				'\'' | '"' => {
					quote = Some(ch);
					current.push(ch);
				}
				'~' | '.' => {
					parts.push(std::mem::take(&mut current).trim().to_string());
				}
				c if c.is_whitespace() => {
					if !current.is_empty() {
						current.push(c);
					}
				}
				c => current.push(c),
			},
		}
	}
	parts.push(current.trim().to_string());

	if parts.iter().any(|p| !crate::util::is_quoted_string(p)) {
		return None;
	}
	Some(parts)
}

fn render_string_literal(raw: &str) -> String {
	let escaped = raw.replace('\\', "\\\\").replace('\'', "\\'");
	format!("'{escaped}'")
}

// ---------------------------------------------------------------------
// Boolean
// ---------------------------------------------------------------------

fn fold_boolean(text: &str) -> Option<String> {
	let chars: Vec<char> = text.chars().collect();
	let mut parser = BoolParser { chars, pos: 0 };
	let value = parser.parse_or()?;
	parser.skip_ws();
	if parser.pos != parser.chars.len() {
		return None;
	}
	Some(if value { "true" } else { "false" }.to_string())
}

struct BoolParser {
	chars: Vec<char>,
	pos: usize,
}

impl BoolParser {
	fn skip_ws(&mut self) {
		while self.pos < self.chars.len() && self.chars[self.pos].is_whitespace() {
			self.pos += 1;
		}
	}

	fn try_consume(&mut self, token: &str) -> bool {
		self.skip_ws();
		let rest: String = self.chars[self.pos..].iter().collect();
		if rest.starts_with(token) {
			// word-shaped tokens (`true`/`false`) need a boundary so they don't
			// match a prefix of a longer identifier like `truex`; `!`/`&&`/`||`
			// are operators, not keywords, so `!true` with no space is a fine
			// tight form.
			let is_word = token.chars().next().is_some_and(|c| c.is_alphanumeric() || c == '_');
			let boundary = if is_word {
				let after = rest[token.len()..].chars().next();
				after.map(|c| !c.is_alphanumeric() && c != '_').unwrap_or(true)
			} else {
				true
			};
			if boundary {
				self.pos += token.chars().count();
				return true;
			}
		}
		false
	}

	fn parse_or(&mut self) -> Option<bool> {
		let mut value = self.parse_and()?;
		while self.try_consume("||") {
			value = value || self.parse_and()?;
		}
		Some(value)
	}

	fn parse_and(&mut self) -> Option<bool> {
		let mut value = self.parse_unary()?;
		while self.try_consume("&&") {
			value = value && self.parse_unary()?;
		}
		Some(value)
	}

	fn parse_unary(&mut self) -> Option<bool> {
		if self.try_consume("!") {
			return self.parse_unary().map(|v| !v);
		}
		if self.try_consume("true") {
			return Some(true);
		}
		if self.try_consume("false") {
			return Some(false);
		}
		None
	}
}
