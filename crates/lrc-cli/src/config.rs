//! Configuration file discovery for the `lrc` command.
//!
//! An explicit `--config` path must exist. Without one, the first existing
//! file among [`search_paths`] is used, and the built-in defaults apply when
//! there is none.

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use lrc::{LrcError, config::AppConfig};

/// Project-local configuration, relative to the working directory.
const LOCAL_CONFIG: &str = "lrc/config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),
}

impl From<ConfigError> for LrcError {
    fn from(err: ConfigError) -> Self {
        LrcError::Config(err.to_string())
    }
}

/// Implicit configuration locations, most specific first.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG)];
    match ProjectDirs::from("com", "lrc", "lrc") {
        Some(dirs) => paths.push(dirs.config_dir().join("config.toml")),
        None => debug!("Could not determine platform-specific config directory"),
    }
    paths
}

/// Load the configuration for this run.
///
/// # Errors
///
/// Returns `LrcError::Config` if the explicit file is missing or any
/// selected file is not a valid configuration, and `LrcError::Io` if it
/// cannot be read.
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, LrcError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::MissingFile(path.to_path_buf()).into());
        }
        info!(path:? = path; "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let found = search_paths().into_iter().find(|path| {
        let exists = path.is_file();
        debug!(path:? = path, exists; "Checked configuration location");
        exists
    });
    match found {
        Some(path) => {
            info!(path:? = path; "Loading configuration");
            load_config_file(&path)
        }
        None => {
            debug!("No configuration file found, using default configuration");
            Ok(AppConfig::default())
        }
    }
}

fn load_config_file(path: &Path) -> Result<AppConfig, LrcError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.message().to_string(),
    })?;

    debug!(
        init_hooks = config.codegen().init_hooks().len(),
        pretty = config.schema().pretty();
        "Configuration loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_explicit_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[codegen]\ninit_hooks = [\"os.user\"]\n\n[schema]\npretty = false\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.codegen().init_hooks(), ["os.user"]);
        assert!(!config.schema().pretty());
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[codegen]\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert!(config.codegen().init_hooks().is_empty());
        assert!(config.schema().pretty());
    }

    #[test]
    fn test_local_config_is_searched_first() {
        assert_eq!(search_paths()[0], Path::new(LOCAL_CONFIG));
    }

    #[test]
    fn test_config_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            load_config(Some(&missing)),
            Err(LrcError::Config(message)) if message.contains("Missing configuration file")
        ));

        let invalid = dir.path().join("invalid.toml");
        fs::write(&invalid, "[codegen]\ninit_hooks = 3\n").unwrap();
        let Err(LrcError::Config(message)) = load_config(Some(&invalid)) else {
            panic!("expected a configuration error");
        };
        assert!(message.contains("invalid.toml"), "{message}");
    }
}
