//! Engine configuration.
//!
//! Configuration is a YAML document. Directives declared here are not
//! materialized when the configuration is read; the raw block is handed
//! to the directive controller and expanded lazily on first query, once
//! every runtime it depends on had a chance to register.
//!
//! ```yaml
//! model: ./model.graphql
//! directives:
//!   fromApi:
//!     resolver:
//!       handler: ./functions/fromApi.js
//!       runtime: node
//!     definition: directive @fromApi(url: String) on FIELD_DEFINITION
//! ```

use crate::error::Result;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    /// Base path used to resolve relative handler and model paths.
    ///
    /// Defaults to the directory of the configuration file when loaded
    /// from disk.
    #[serde(default)]
    pub base_path: Option<PathBuf>,

    /// Path to the user model SDL document.
    #[serde(default)]
    pub model: Option<PathBuf>,

    /// Directives declared in configuration, keyed by name.
    #[serde(default)]
    pub directives: IndexMap<String, DirectiveConfig>,
}

/// A directive declared in configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectiveConfig {
    /// The function resolving the directive.
    pub resolver: ResolverConfig,
    /// The directive's SDL declaration, injected into the schema.
    pub definition: String,
}

/// The resolver half of a configured directive.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// Path to the handler executed by the runtime.
    pub handler: PathBuf,
    /// Name of the runtime executing the handler.
    pub runtime: String,
}

impl EngineConfig {
    /// Parses a configuration document.
    pub fn from_yaml(source: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Loads a configuration file.
    ///
    /// The file's directory becomes the base path unless the document
    /// sets one explicitly.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&source)?;
        if config.base_path.is_none() {
            config.base_path = path.parent().map(Path::to_path_buf);
        }
        Ok(config)
    }

    /// Resolves a path against the configured base path.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match &self.base_path {
            Some(base) => base.join(path),
            None => path.to_path_buf(),
        }
    }
}
