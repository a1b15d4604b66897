//! CLI logic for the LR compiler.
//!
//! Reads an LR file, writes the generated Rust module and, unless disabled,
//! the JSON schema next to it.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{fs, path::Path};

use log::info;

use lrc::{Compiler, LrcError};

/// Run the LR compiler
///
/// # Errors
///
/// Returns `LrcError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Syntax, resolution, schema and code generation errors
/// - Schema serialization errors
pub fn run(args: &Args) -> Result<(), LrcError> {
    let output = args.output_path();
    info!(
        input_path = args.input,
        output_path = output.display().to_string();
        "Compiling resource definitions"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let compiler = Compiler::new(app_config);
    let compilation = compiler.compile_file(Path::new(&args.input))?;

    fs::write(&output, &compilation.code)?;
    info!(output_file = output.display().to_string(); "Generated code written");

    if let Some(schema_path) = args.schema_path() {
        let json = compiler.schema_json(&compilation.schema)?;
        fs::write(&schema_path, json)?;
        info!(schema_file = schema_path.display().to_string(); "Schema written");
    }

    Ok(())
}
