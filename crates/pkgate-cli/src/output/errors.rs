//! Error message formatting with actionable suggestions.

use pkgate_core::error::GatewayError;
use super::colors::ColorSupport;
use std::error::Error;

/// Error formatter with suggestions
pub struct ErrorFormatter {
    colors: ColorSupport,
}

impl ErrorFormatter {
    pub fn new() -> Self {
        Self::with_colors(ColorSupport::detect())
    }

    pub fn with_colors(colors: ColorSupport) -> Self {
        Self { colors }
    }

    /// Format an error with its cause chain and a suggestion
    pub fn format_error(&self, error: &GatewayError) -> String {
        let mut output = format!("{}: {}\n", self.colors.red("error"), error);

        // Body text returned with the failed status
        if let GatewayError::UpstreamStatus { body, .. } = error {
            if !body.trim().is_empty() {
                output.push_str(&format!("{}: {}\n", self.colors.dim("response"), body.trim()));
            }
        }

        let mut source = error.source();
        while let Some(err) = source {
            output.push_str(&format!("{}: {}\n", self.colors.dim("caused by"), err));
            source = err.source();
        }

        if let Some(suggestion) = error.suggestion() {
            output.push_str(&format!("\n{}: {}\n", self.colors.dim("help"), suggestion));
        }

        output
    }

    /// Format a simple error message
    pub fn format_simple(&self, message: &str) -> String {
        format!("{}: {}", self.colors.red("error"), message)
    }
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self::new()
    }
}
