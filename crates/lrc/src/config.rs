//! Configuration types for LR compilation.
//!
//! This module provides configuration structures that control code
//! generation and schema output. All types implement [`serde::Deserialize`]
//! for loading from external sources.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining codegen and schema settings.
//! - [`CodegenConfig`] - Controls which resources opt into init hooks.
//! - [`SchemaConfig`] - Controls how the schema is serialized.
//!
//! # Example
//!
//! ```
//! # use lrc::config::AppConfig;
//! // Use default configuration
//! let config = AppConfig::default();
//! assert!(config.codegen().init_hooks().is_empty());
//! assert!(config.schema().pretty());
//! ```

use serde::Deserialize;

/// Top-level configuration combining codegen and schema settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Code generation section.
    #[serde(default)]
    codegen: CodegenConfig,

    /// Schema output section.
    #[serde(default)]
    schema: SchemaConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified sections.
    pub fn new(codegen: CodegenConfig, schema: SchemaConfig) -> Self {
        Self { codegen, schema }
    }

    /// Returns the code generation configuration.
    pub fn codegen(&self) -> &CodegenConfig {
        &self.codegen
    }

    /// Returns the schema configuration.
    pub fn schema(&self) -> &SchemaConfig {
        &self.schema
    }
}

/// Code generation configuration.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CodegenConfig {
    /// Resource ids whose factories call their hand-written
    /// [`InitHook`](lrc_core::InitHook) before validating arguments.
    #[serde(default)]
    init_hooks: Vec<String>,
}

impl CodegenConfig {
    /// Creates a new [`CodegenConfig`] with the given init hook resources.
    pub fn new(init_hooks: Vec<String>) -> Self {
        Self { init_hooks }
    }

    /// Returns the resource ids marked for init hooks.
    pub fn init_hooks(&self) -> &[String] {
        &self.init_hooks
    }
}

/// Schema serialization configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaConfig {
    /// Pretty-print the JSON schema.
    #[serde(default = "default_pretty")]
    pretty: bool,
}

fn default_pretty() -> bool {
    true
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            pretty: default_pretty(),
        }
    }
}

impl SchemaConfig {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Returns whether the schema JSON is indented.
    pub fn pretty(&self) -> bool {
        self.pretty
    }
}
