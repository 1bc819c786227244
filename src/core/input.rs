use std::ops::{Bound, RangeBounds};
use std::sync::Arc;

mod cursor;
mod location;
mod span;

pub use cursor::Cursor;
pub use location::Location;
pub use span::Span;

/// Tab width used to compute the next tab stop, for column/indent tracking.
pub const TAB_WIDTH: usize = 4;

pub fn is_space(ch: char) -> bool {
	matches!(ch, ' ' | '\t')
}

/// A named, immutable piece of template source text.
///
/// Cheap to clone: the backing text is reference counted.
#[derive(Clone)]
pub struct Input(Arc<InputData>);

struct InputData {
	name: String,
	text: String,
}

impl Input {
	pub fn new<N: Into<String>, T: Into<String>>(name: N, text: T) -> Self {
		Input(Arc::new(InputData {
			name: name.into(),
			text: text.into(),
		}))
	}

	pub fn name(&self) -> &str {
		&self.0.name
	}

	pub fn len(&self) -> usize {
		self.0.text.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.text.is_empty()
	}

	pub fn text<R: RangeBounds<usize>>(&self, range: R) -> &str {
		let sta = match range.start_bound() {
			Bound::Included(n) => *n,
			Bound::Excluded(n) => *n + 1,
			Bound::Unbounded => 0,
		};
		let end = match range.end_bound() {
			Bound::Included(n) => *n + 1,
			Bound::Excluded(n) => *n,
			Bound::Unbounded => self.len(),
		};
		&self.0.text[sta..end]
	}

	pub fn start(&self) -> Cursor {
		Cursor::new(self.clone(), 0, Location::at_line(1))
	}
}

impl PartialEq for Input {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0) || (self.name() == other.name() && self.text(..) == other.text(..))
	}
}

impl Eq for Input {}

impl std::fmt::Debug for Input {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "<input `{}`, {} bytes>", self.name(), self.len())
	}
}

impl std::fmt::Display for Input {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.name())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cursor_advances_and_tracks_location() {
		let input = Input::new("t", "ab\ncd");
		let mut cursor = input.start();
		assert_eq!(cursor.read(), Some('a'));
		assert_eq!(cursor.location().line(), 1);
		assert_eq!(cursor.read(), Some('b'));
		assert_eq!(cursor.read(), Some('\n'));
		assert_eq!(cursor.location().line(), 2);
		assert_eq!(cursor.location().column(), 1);
	}

	#[test]
	fn span_extracts_text_between_cursors() {
		let input = Input::new("t", "hello world");
		let mut sta = input.start();
		for _ in 0..6 {
			sta.read();
		}
		let mut end = sta.clone();
		for _ in 0..5 {
			end.read();
		}
		let span = sta.span_to(&end);
		assert_eq!(span.text(), "world");
	}
}
