//! TOML-driven formulary source.
//!
//! `TomlFormulary` parses a `FormularyConfig` from a TOML string or file,
//! validates it, and implements the `ConfigSource` trait from
//! dosewise-core. The parsed snapshot lives behind an `Arc` and is never
//! mutated after construction.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use dosewise_contracts::config::FormularyConfig;
use dosewise_contracts::error::{DosewiseError, DosewiseResult};
use dosewise_core::traits::ConfigSource;

use crate::validate::validate;

/// A `ConfigSource` backed by a TOML formulary document.
///
/// ```rust,ignore
/// use dosewise_formulary::TomlFormulary;
///
/// let formulary = TomlFormulary::from_file(Path::new("formulary/diabetes.toml"))?;
/// ```
#[derive(Debug, Clone)]
pub struct TomlFormulary {
    config: Arc<FormularyConfig>,
}

impl TomlFormulary {
    /// Parse `s` as TOML, validate it, and build a `TomlFormulary`.
    ///
    /// Returns `DosewiseError::ConfigError` if the TOML is malformed or does
    /// not match the `FormularyConfig` schema, and
    /// `DosewiseError::ConfigValidation` if a value is out of range.
    pub fn from_toml_str(s: &str) -> DosewiseResult<Self> {
        let config: FormularyConfig = toml::from_str(s).map_err(|e| DosewiseError::ConfigError {
            reason: format!("failed to parse formulary TOML: {}", e),
        })?;
        validate(&config)?;
        debug!(
            drugs = config.drugs.len(),
            estimates = config.glucose.a1c_estimates.len(),
            dosing_classes = config.dosing.classes.len(),
            "formulary parsed"
        );
        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Read the file at `path` and parse it as a TOML formulary.
    pub fn from_file(path: &Path) -> DosewiseResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| DosewiseError::ConfigError {
            reason: format!("failed to read formulary file '{}': {}", path.display(), e),
        })?;
        let formulary = Self::from_toml_str(&contents)?;
        info!(path = %path.display(), drugs = formulary.config.drugs.len(), "formulary loaded");
        Ok(formulary)
    }

    pub fn snapshot(&self) -> &FormularyConfig {
        &self.config
    }
}

impl ConfigSource for TomlFormulary {
    fn config(&self) -> Arc<FormularyConfig> {
        Arc::clone(&self.config)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
