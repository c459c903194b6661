//! Error message formatting with actionable suggestions.

use std::error::Error;

use quay_core::error::QuayError;

use super::colors::ColorSupport;

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

    /// Format an error with its location, suggestion and cause chain
    pub fn format_error(&self, error: &QuayError) -> String {
        let mut output = format!("{}: {}\n", self.colors.red("error"), error);

        if let QuayError::TomlParse { line, column, .. } = error {
            output.push_str(&self.format_location("quay.toml", *line, *column));
            output.push('\n');
        }

        if let Some(suggestion) = error.suggestion() {
            output.push_str(&format!("\n{}: {}\n", self.colors.dim("help"), suggestion));
        }
        if error.is_recoverable() {
            output.push_str(&format!(
                "{}: this failure may be temporary, rerunning can succeed\n",
                self.colors.dim("note")
            ));
        }

        let mut source = error.source();
        while let Some(err) = source {
            output.push_str(&format!("{}: {}\n", self.colors.dim("caused by"), err));
            source = err.source();
        }

        output
    }

    /// Format an error that carries no structured information
    pub fn format_simple(&self, message: &str) -> String {
        format!("{}: {}", self.colors.red("error"), message)
    }

    fn format_location(&self, file: &str, line: usize, column: usize) -> String {
        format!("  {} {}:{}:{}", self.colors.dim("-->"), file, line, column)
    }
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self::new()
    }
}
