use super::TAB_WIDTH;
use super::is_space;

/// A line/column/indent position inside an [`super::Input`].
///
/// Line numbers start at one. Column and indent are zero based, matching the
/// convention used for diagnostics elsewhere in the crate.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
pub struct Location {
	line: usize,
	column: usize,
	indent: usize,
}

impl Location {
	pub fn at_line(line: usize) -> Self {
		Self {
			line,
			column: 0,
			indent: 0,
		}
	}

	/// Advances the location by one character, updating line/column/indent.
	pub fn advance(&mut self, next: char) {
		let is_leading_space = self.is_indent();

		if next == '\n' {
			self.line += 1;
			self.column = 0;
		} else if next == '\t' {
			self.column += TAB_WIDTH - (self.column % TAB_WIDTH);
		} else {
			self.column += 1;
		}

		if next == '\n' || (is_space(next) && is_leading_space) {
			self.indent = self.column;
		}
	}

	pub fn line(&self) -> usize {
		self.line.max(1)
	}

	pub fn column(&self) -> usize {
		self.column + 1
	}

	pub fn indent(&self) -> usize {
		self.indent
	}

	pub fn is_indent(&self) -> bool {
		self.column == self.indent
	}
}

impl std::fmt::Display for Location {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}:{}", self.line(), self.column())
	}
}

impl std::fmt::Debug for Location {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{self}")
	}
}
