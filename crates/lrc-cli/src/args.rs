//! Command-line argument definitions for the LR compiler.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, schema output,
//! configuration file selection, and logging verbosity.

use std::path::{Path, PathBuf};

use clap::Parser;

/// Command-line arguments for the LR compiler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input LR file
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Path to the generated Rust file [default: <input stem>.rs next to the input]
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to the JSON schema [default: <input>.json next to the input]
    #[arg(long, conflicts_with = "no_schema")]
    pub schema: Option<String>,

    /// Skip writing the JSON schema
    #[arg(long)]
    pub no_schema: bool,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Where the generated code goes.
    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(output) => PathBuf::from(output),
            None => Path::new(&self.input).with_extension("rs"),
        }
    }

    /// Where the schema goes, or `None` with `--no-schema`.
    pub fn schema_path(&self) -> Option<PathBuf> {
        if self.no_schema {
            return None;
        }
        let path = match &self.schema {
            Some(schema) => PathBuf::from(schema),
            None => {
                let mut path = PathBuf::from(&self.input).into_os_string();
                path.push(".json");
                PathBuf::from(path)
            }
        };
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let args = Args::parse_from(["lrc", "providers/os.lr"]);
        assert_eq!(args.output_path(), PathBuf::from("providers/os.rs"));
        assert_eq!(args.schema_path(), Some(PathBuf::from("providers/os.lr.json")));
        assert_eq!(args.log_level, "info");
    }

    #[test]
    fn test_explicit_paths() {
        let args = Args::parse_from(["lrc", "os.lr", "-o", "src/os.rs", "--schema", "os.json"]);
        assert_eq!(args.output_path(), PathBuf::from("src/os.rs"));
        assert_eq!(args.schema_path(), Some(PathBuf::from("os.json")));

        let args = Args::parse_from(["lrc", "os.lr", "--no-schema"]);
        assert_eq!(args.schema_path(), None);
    }

    #[test]
    fn test_schema_flags_conflict() {
        assert!(Args::try_parse_from(["lrc", "os.lr", "--schema", "a.json", "--no-schema"]).is_err());
    }
}
