//! Terminal output formatting and utilities.
//!
//! Query results are written to stdout so they can be piped; everything meant
//! for a human goes to stderr.

pub mod colors;
pub mod errors;

use std::io::Write;

use pkgate_core::error::{GatewayError, GatewayResult};
use serde::Serialize;

/// Output handler for consistent terminal formatting
pub struct OutputHandler {
    colors: colors::ColorSupport,
}

impl OutputHandler {
    /// Create a new output handler
    pub fn new() -> Self {
        Self {
            colors: colors::ColorSupport::detect(),
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        eprintln!("{}", self.colors.dim(message));
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", self.colors.green("✓"), message);
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", self.colors.yellow("⚠"), message);
    }

    /// Print raw query output
    pub fn data(&self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        // Ignore a closed pipe
        let _ = writeln!(stdout, "{}", text.trim_end());
    }

    /// Print a value as pretty JSON
    pub fn json<T: Serialize>(&self, value: &T) -> GatewayResult<()> {
        let text = serde_json::to_string_pretty(value).map_err(|e| GatewayError::MalformedDocument {
            package: "output".to_string(),
            message: e.to_string(),
        })?;
        self.data(&text);
        Ok(())
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}
