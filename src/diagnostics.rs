use tracing::warn;

use crate::error::ParseError;

/// Ordered record of problems that did not stop the parse.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    entries: Vec<ParseError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, error: ParseError) {
        warn!(kind = %error.kind(), "{}", error);
        self.entries.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.entries.iter()
    }

    /// Human-readable messages, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }
}
