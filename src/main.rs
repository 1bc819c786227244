use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tmplc::{CompileError, CompileErrorKind, CompilerOptions, Loader};
use tracing::error;

#[derive(Parser)]
#[command(name = "tmplc", about = "Compilation core for a block-and-macro templating language")]
struct Cli {
	/// Optional TOML file of `CompilerOptions` overrides.
	#[arg(long, global = true)]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Parse, resolve, and optimise FILE, reporting every diagnostic found.
	Check { file: PathBuf },
	/// Run the full pipeline on FILE and print the lowered artifact.
	Compile { file: PathBuf },
}

/// Loads templates relative to a file's parent directory, so `extends`/
/// `import` paths resolve as sibling files.
struct DiskLoader {
	root: PathBuf,
}

impl Loader for DiskLoader {
	fn load(&self, path: &str) -> Result<String, CompileError> {
		std::fs::read_to_string(self.root.join(path))
			.map_err(|_| CompileError::new(CompileErrorKind::TemplateNotFound(path.to_string())))
	}
}

fn load_options(config: Option<&Path>) -> CompilerOptions {
	let Some(path) = config else {
		return CompilerOptions::default();
	};
	match std::fs::read_to_string(path) {
		Ok(text) => match toml::from_str(&text) {
			Ok(options) => options,
			Err(err) => {
				error!(%err, path = %path.display(), "failed to parse config, using defaults");
				CompilerOptions::default()
			}
		},
		Err(err) => {
			error!(%err, path = %path.display(), "failed to read config, using defaults");
			CompilerOptions::default()
		}
	}
}

fn main() -> ExitCode {
	tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.init();

	let cli = Cli::parse();
	let options = load_options(cli.config.as_deref());
	let compiler = tmplc::Compiler::new(options);

	match cli.command {
		Command::Check { file } => run_check(&compiler, &file),
		Command::Compile { file } => run_compile(&compiler, &file),
	}
}

fn run_check(compiler: &tmplc::Compiler, file: &Path) -> ExitCode {
	let (name, source, loader) = match read_template(file) {
		Ok(parts) => parts,
		Err(code) => return code,
	};
	match compiler.check(&name, &source, &loader) {
		Ok(()) => {
			println!("{name}: ok");
			ExitCode::SUCCESS
		}
		Err(errors) => {
			eprintln!("{errors}");
			ExitCode::FAILURE
		}
	}
}

fn run_compile(compiler: &tmplc::Compiler, file: &Path) -> ExitCode {
	let (name, source, loader) = match read_template(file) {
		Ok(parts) => parts,
		Err(code) => return code,
	};
	match compiler.compile(Some(&name), &source, &loader) {
		Ok(compiled) => {
			println!("{:#?}", compiled.program);
			println!("content_hash = {:016x}", compiled.content_hash());
			ExitCode::SUCCESS
		}
		Err(err) => {
			eprintln!("{err}");
			ExitCode::FAILURE
		}
	}
}

fn read_template(file: &Path) -> Result<(String, String, DiskLoader), ExitCode> {
	let source = std::fs::read_to_string(file).map_err(|err| {
		eprintln!("error reading {}: {err}", file.display());
		ExitCode::FAILURE
	})?;
	let name = file
		.file_name()
		.map(|n| n.to_string_lossy().into_owned())
		.unwrap_or_else(|| file.display().to_string());
	let root = file.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
	Ok((name, source, DiskLoader { root }))
}
