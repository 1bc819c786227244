use crate::core::{CompileError, CompileErrorKind};

/// External collaborator that resolves a template path to its source text.
///
/// Disk/in-memory storage, the persistent compilation cache, and any
/// rate-limiter wrapper around repeated loads are all the caller's
/// responsibility; the pipeline only ever calls [`Loader::load`].
pub trait Loader {
	fn load(&self, path: &str) -> Result<String, CompileError>;
}

/// A [`Loader`] backed by an in-memory map, handy for tests and embedding.
#[derive(Clone, Default)]
pub struct MapLoader {
	templates: std::collections::HashMap<String, String>,
}

impl MapLoader {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, path: impl Into<String>, source: impl Into<String>) -> Self {
		self.templates.insert(path.into(), source.into());
		self
	}
}

impl Loader for MapLoader {
	fn load(&self, path: &str) -> Result<String, CompileError> {
		self.templates
			.get(path)
			.cloned()
			.ok_or_else(|| CompileError::new(CompileErrorKind::TemplateNotFound(path.to_string())))
	}
}
