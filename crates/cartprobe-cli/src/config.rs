//! CLI configuration

use serde::{Deserialize, Serialize};

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - summary lines only
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - per-attempt logging
    Verbose,
}

impl Verbosity {
    /// Whether quiet mode is active
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Whether verbose logging is requested
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose)
    }
}

/// Resolved CLI configuration shared by the commands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Base directory for export artifacts and screenshots
    pub output_dir: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Normal,
            output_dir: "test-results".to_string(),
        }
    }
}

impl CliConfig {
    /// Create a default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set the artifact directory
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<String>) -> Self {
        self.output_dir = dir.into();
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CliConfig::new();
        assert_eq!(config.output_dir, "test-results");
        assert!(!config.verbosity.is_quiet());
    }

    #[test]
    fn test_builders() {
        let config = CliConfig::new()
            .with_verbosity(Verbosity::Verbose)
            .with_output_dir("out");
        assert!(config.verbosity.is_verbose());
        assert_eq!(config.output_dir, "out");
    }
}
