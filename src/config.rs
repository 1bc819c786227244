//! Compiler configuration (rate limiting, which optimisation passes run,
//! diagnostic limits). Constructible from defaults, builder methods, or
//! (in the CLI binary) a TOML file.

use serde::Deserialize;

/// Rate-limiter settings. `None` leaves rate limiting disabled.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct RateLimitOptions {
	pub max_attempts: usize,
	pub window_seconds: u64,
}

impl Default for RateLimitOptions {
	fn default() -> Self {
		RateLimitOptions {
			max_attempts: 30,
			window_seconds: 60,
		}
	}
}

/// Knobs for [`crate::compiler::Compiler`].
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
	pub rate_limit: Option<RateLimitOptions>,
	pub resolve_inheritance: bool,
	pub process_macros: bool,
	pub fold_constants: bool,
	pub eliminate_dead_branches: bool,
	pub inline_filters: bool,
	/// Upper bound on diagnostics collected by a pass before it gives up;
	/// single fatal conditions (cyclic inheritance, rate limit, loader
	/// failure) always short-circuit regardless of this value.
	pub max_errors: usize,
}

impl Default for CompilerOptions {
	fn default() -> Self {
		CompilerOptions {
			rate_limit: None,
			resolve_inheritance: true,
			process_macros: true,
			fold_constants: true,
			eliminate_dead_branches: true,
			inline_filters: true,
			max_errors: 100,
		}
	}
}

impl CompilerOptions {
	pub fn with_rate_limit(mut self, max_attempts: usize, window_seconds: u64) -> Self {
		self.rate_limit = Some(RateLimitOptions {
			max_attempts,
			window_seconds,
		});
		self
	}

	pub fn without_rate_limit(mut self) -> Self {
		self.rate_limit = None;
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_enable_every_optimisation_pass() {
		let options = CompilerOptions::default();
		assert!(options.resolve_inheritance);
		assert!(options.process_macros);
		assert!(options.fold_constants);
		assert!(options.eliminate_dead_branches);
		assert!(options.inline_filters);
		assert!(options.rate_limit.is_none());
	}

	#[test]
	fn parses_from_toml() {
		let toml = r#"
            max_errors = 5
            [rate_limit]
            max_attempts = 10
            window_seconds = 30
        "#;
		let options: CompilerOptions = toml::from_str(toml).unwrap();
		assert_eq!(options.max_errors, 5);
		assert_eq!(options.rate_limit.unwrap().max_attempts, 10);
		assert!(options.fold_constants); // untouched fields keep their default
	}
}
