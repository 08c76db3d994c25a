//! Engine options shared by both loaders.

use serde::{Deserialize, Serialize};

/// Compilation settings applied to every schema in a registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Treat `format` as an assertion (`date-time`, `uuid`, `email`, ...).
    ///
    /// Draft 2020-12 makes `format` an annotation, so this is off unless
    /// requested.
    pub validate_formats: bool,
}

impl EngineOptions {
    /// Toggle `format` assertion.
    pub fn with_format_validation(mut self, enabled: bool) -> Self {
        self.validate_formats = enabled;
        self
    }
}
