//! LRC - Compiler for the LR resource definition language.
//!
//! Parsing, import resolution, schema extraction and Rust code generation
//! for LR files. The generated code links against `lrc-core`.

pub mod codegen;
pub mod config;
pub mod overrides;
pub mod schema;

mod error;

pub use error::LrcError;

use std::{fs, path::Path};

use log::{debug, info, trace};

use lrc_parser::{FsLoader, ResolvedUnit, SourceLoader};

use config::AppConfig;
use overrides::OverrideSet;
use schema::Schema;

/// Output of a successful compilation.
#[derive(Debug, Clone)]
pub struct Compilation {
    /// Schema of every resource of the unit.
    pub schema: Schema,
    /// Generated Rust module.
    pub code: String,
}

/// Compiler for LR units.
///
/// # Examples
///
/// ```rust
/// use lrc::{Compiler, config::AppConfig};
///
/// let source = r#"
///     // A file on disk
///     os.file {
///       init(path string)
///       path string
///       size() int
///     }
/// "#;
///
/// let compiler = Compiler::new(AppConfig::default());
/// let compilation = compiler
///     .compile(source, &|path: &str| -> std::io::Result<String> {
///         Err(std::io::Error::new(std::io::ErrorKind::NotFound, path.to_string()))
///     })
///     .expect("Failed to compile");
///
/// assert!(compilation.code.contains("pub trait OsFile"));
/// assert_eq!(compilation.schema.resource("os.file").unwrap().title, "A file on disk");
/// ```
#[derive(Debug, Default)]
pub struct Compiler {
    config: AppConfig,
    overrides: OverrideSet,
}

impl Compiler {
    /// Create a new compiler with the given configuration.
    ///
    /// Resources listed in `[codegen] init_hooks` are marked for init hooks.
    pub fn new(config: AppConfig) -> Self {
        let overrides = OverrideSet::from_config(config.codegen());
        Self { config, overrides }
    }

    /// Mark `id` as having a hand-written init hook.
    pub fn with_init_hook(mut self, id: impl Into<String>) -> Self {
        self.overrides.register(id);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse `source` and resolve its imports through `loader`.
    ///
    /// # Errors
    ///
    /// Returns `LrcError::Parse` for syntax and resolution errors.
    pub fn parse(
        &self,
        source: &str,
        loader: &dyn SourceLoader,
    ) -> Result<ResolvedUnit, LrcError> {
        info!("Parsing unit");
        let resolved = lrc_parser::parse_and_resolve(source, loader)
            .map_err(|err| LrcError::new_parse_error(err, source))?;
        debug!(resources = resolved.unit().resources.len(); "Unit resolved");
        trace!(unit:? = resolved.unit(); "Resolved unit");
        Ok(resolved)
    }

    /// Compile `source` into its schema and generated code.
    ///
    /// # Errors
    ///
    /// Returns `LrcError::Parse` with every diagnostic of the first failing
    /// phase: syntax, resolution, schema or code generation.
    pub fn compile(
        &self,
        source: &str,
        loader: &dyn SourceLoader,
    ) -> Result<Compilation, LrcError> {
        let resolved = self.parse(source, loader)?;

        info!("Extracting schema");
        let schema = schema::extract(&resolved)
            .map_err(|err| LrcError::new_parse_error(err, source))?;

        let mut overrides = self.overrides.clone();
        overrides.check(resolved.unit());

        info!("Generating code");
        let code = codegen::generate(&resolved, &overrides)
            .map_err(|err| LrcError::new_parse_error(err, source))?;

        info!(resources = schema.resources.len(); "Compilation finished");
        Ok(Compilation { schema, code })
    }

    /// Read and compile the LR file at `path`.
    ///
    /// Imports are resolved relative to the file's directory.
    ///
    /// # Errors
    ///
    /// Returns `LrcError::Io` if the file cannot be read, otherwise the
    /// errors of [`Compiler::compile`].
    pub fn compile_file(&self, path: &Path) -> Result<Compilation, LrcError> {
        info!(path:? = path; "Reading input file");
        let source = fs::read_to_string(path)?;
        self.compile(&source, &FsLoader::for_file(path))
    }

    /// Serialize `schema` as configured by `[schema] pretty`.
    pub fn schema_json(&self, schema: &Schema) -> Result<String, LrcError> {
        Ok(schema.to_json(self.config.schema().pretty())?)
    }
}
