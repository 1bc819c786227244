use std::collections::VecDeque;
use std::fmt::{Debug, Display, Formatter};

use crate::core::input::Span;

/// One failure reported by a pipeline pass.
///
/// `template` names the template the error was raised while compiling, when
/// known; loader-propagated errors may not have one yet.
#[derive(thiserror::Error, Debug, Clone)]
#[error("{kind}")]
pub struct CompileError {
	pub kind: CompileErrorKind,
	pub span: Option<Span>,
	pub template: Option<String>,
}

impl CompileError {
	pub fn new(kind: CompileErrorKind) -> Self {
		CompileError {
			kind,
			span: None,
			template: None,
		}
	}

	pub fn at(mut self, span: Span) -> Self {
		self.span = Some(span);
		self
	}

	pub fn in_template<T: Into<String>>(mut self, name: T) -> Self {
		self.template = Some(name.into());
		self
	}
}

impl Display for CompileErrorKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		Debug::fmt(self, f)
	}
}

/// The error taxonomy of the compilation core (spec §7).
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CompileErrorKind {
	#[error("malformed directive: {0}")]
	ParseError(String),
	#[error("unbalanced directive: {0}")]
	StructureError(String),
	#[error("invalid block directive: {0}")]
	InvalidBlockDirective(String),
	#[error("invalid extends directive: {0}")]
	InvalidExtendsDirective(String),
	#[error("invalid import directive: {0}")]
	InvalidImportDirective(String),
	#[error("invalid macro directive: {0}")]
	InvalidMacroDirective(String),
	#[error("cyclic inheritance: {}", .0.join(" -> "))]
	CyclicInheritance(Vec<String>),
	#[error("template not found: {0}")]
	TemplateNotFound(String),
	#[error("duplicate macro `{0}`")]
	DuplicateMacro(String),
	#[error("duplicate import alias `{0}`")]
	DuplicateAlias(String),
	#[error("unknown parameter `{0}` for macro `{1}`")]
	UnknownParameter(String, String),
	#[error("duplicate argument `{0}` for macro `{1}`")]
	DuplicateArgument(String, String),
	#[error("too many arguments for macro `{0}`")]
	TooManyArguments(String),
	#[error("missing required argument `{0}` for macro `{1}`")]
	MissingRequiredArgument(String, String),
	#[error("unknown filter `{0}`")]
	InvalidFilter(String),
	#[error("rate limit exceeded, retry in {wait_seconds}s")]
	RateLimitExceeded { wait_seconds: u64 },
}

/// An ordered collection of [`CompileError`], used where a single pass may
/// want to report more than one diagnostic before giving up.
///
/// Mirrors the "collector of diagnostics with context chaining" shape used
/// throughout this crate's pipeline passes, rather than failing fast on the
/// first problem found.
#[derive(Clone, Default)]
pub struct Errors {
	list: VecDeque<CompileError>,
}

impl Errors {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&mut self, error: CompileError) {
		self.list.push_back(error);
	}

	pub fn append(&mut self, other: Errors) {
		self.list.extend(other.list);
	}

	pub fn len(&self) -> usize {
		self.list.len()
	}

	pub fn is_empty(&self) -> bool {
		self.list.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &CompileError> {
		self.list.iter()
	}

	pub fn check(self) -> Result<(), Errors> {
		if self.is_empty() {
			Ok(())
		} else {
			Err(self)
		}
	}
}

impl From<CompileError> for Errors {
	fn from(error: CompileError) -> Self {
		let mut errors = Errors::new();
		errors.add(error);
		errors
	}
}

impl Display for Errors {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		if self.list.is_empty() {
			return Ok(());
		}
		writeln!(f, "compile errors:")?;
		for (n, err) in self.list.iter().enumerate() {
			write!(f, "\n[{}] ", n + 1)?;
			if let Some(template) = &err.template {
				write!(f, "{template}: ")?;
			}
			write!(f, "{}", err.kind)?;
			if let Some(span) = &err.span {
				write!(f, " (at {span})")?;
			}
		}
		Ok(())
	}
}

impl Debug for Errors {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{self}")
	}
}

impl std::error::Error for Errors {}

/// The result type used throughout the pipeline.
pub type Result<T> = std::result::Result<T, CompileError>;
