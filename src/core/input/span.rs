use super::{Cursor, Input};

/// A range of text between two [`Cursor`] positions in the same [`Input`].
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Span {
	sta: Option<Cursor>,
	end: Option<Cursor>,
}

impl Span {
	pub fn new(sta: Cursor, end: Cursor) -> Self {
		assert!(sta.input() == end.input());
		if sta.offset() <= end.offset() {
			Span {
				sta: Some(sta),
				end: Some(end),
			}
		} else {
			Span::new(end, sta)
		}
	}

	pub fn input(&self) -> Option<&Input> {
		self.sta.as_ref().map(|c| c.input())
	}

	pub fn text(&self) -> &str {
		match (&self.sta, &self.end) {
			(Some(sta), Some(end)) => sta.input().text(sta.offset()..end.offset()),
			_ => "",
		}
	}

	pub fn location(&self) -> Option<super::Location> {
		self.sta.as_ref().map(|c| c.location())
	}
}

impl std::fmt::Display for Span {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match (&self.sta, &self.end) {
			(Some(sta), Some(end)) if sta != end => write!(f, "{sta}…{end}"),
			(Some(sta), _) => write!(f, "{sta}"),
			_ => write!(f, "<no span>"),
		}
	}
}

impl std::fmt::Debug for Span {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "<span {self}>")
	}
}
