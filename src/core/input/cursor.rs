use super::{is_space, Input, Location, Span};

/// Indexes a byte offset in an [`Input`] and reads characters forward from
/// that position, tracking line/column/indent as it goes.
#[derive(Clone)]
pub struct Cursor {
	src: Input,
	pos: usize,
	location: Location,
}

impl Cursor {
	pub(crate) fn new(src: Input, pos: usize, location: Location) -> Self {
		assert!(pos <= src.len());
		Cursor { src, pos, location }
	}

	pub fn location(&self) -> Location {
		self.location
	}

	pub fn input(&self) -> &Input {
		&self.src
	}

	pub fn offset(&self) -> usize {
		self.pos
	}

	pub fn span_to(&self, end: &Cursor) -> Span {
		Span::new(self.clone(), end.clone())
	}

	pub fn has_next(&self) -> bool {
		self.pos < self.src.len()
	}

	pub fn at_end(&self) -> bool {
		!self.has_next()
	}

	pub fn rest(&self) -> &str {
		self.src.text(self.pos..)
	}

	/// Reads the next character, advancing the cursor. Normalises `\r\n` and
	/// lone `\r` to `\n`.
	pub fn read(&mut self) -> Option<char> {
		let text = self.rest();
		let mut chars = text.chars();
		let next = chars.next()?;
		self.pos += next.len_utf8();

		let next = if next == '\r' {
			if text.as_bytes().get(1) == Some(&b'\n') {
				self.pos += 1;
			}
			'\n'
		} else {
			next
		};

		self.location.advance(next);
		Some(next)
	}

	pub fn peek(&self) -> Option<char> {
		self.clone().read()
	}

	pub fn skip_while<P: Fn(char) -> bool>(&mut self, predicate: P) {
		let mut last_good = self.clone();
		while let Some(next) = self.peek() {
			if predicate(next) {
				self.read();
				last_good = self.clone();
			} else {
				break;
			}
		}
		*self = last_good;
	}

	pub fn skip_spaces(&mut self) {
		self.skip_while(is_space);
	}

	/// Advances the cursor to an absolute byte offset within the same input.
	pub fn seek(&mut self, offset: usize) {
		assert!(offset >= self.pos, "cursor can only move forward");
		while self.pos < offset {
			if self.read().is_none() {
				break;
			}
		}
	}
}

impl std::fmt::Display for Cursor {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}:{}", self.src.name(), self.location)
	}
}

impl std::fmt::Debug for Cursor {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "<cursor {}>", self)
	}
}

impl PartialEq for Cursor {
	fn eq(&self, other: &Self) -> bool {
		self.src == other.src && self.pos == other.pos
	}
}

impl Eq for Cursor {}
