pub mod errors;
pub mod input;

pub use errors::{CompileError, CompileErrorKind, Errors, Result};
pub use input::{Cursor, Input, Location, Span};
