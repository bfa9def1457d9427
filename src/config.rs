use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CompileResult;

/// Knobs for the semantic actions run during parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserConfig {
    /// Require every branch and loop condition to be BOOL.
    pub strict_conditions: bool,
    /// Resolve identifiers holding a known constant to that constant, so
    /// expressions over them fold.
    pub propagate_constants: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            strict_conditions: false,
            propagate_constants: true,
        }
    }
}

impl ParserConfig {
    pub fn from_json(text: &str) -> CompileResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> CompileResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}
