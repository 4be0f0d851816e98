//! Helpful error types for CLI commands
//!
//! Every error includes what went wrong, optional context, and `TRY:`
//! suggestions for the operator.

use std::fmt;
use std::path::Path;

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_suggestions(
        mut self,
        suggestions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.suggestions.extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    /// Inventory snapshot file does not exist
    pub fn file_not_found(path: &Path) -> Self {
        Self::new(format!("File not found: {}", path.display()))
            .with_context("The inventory snapshot file does not exist")
            .with_suggestions([
                format!("TRY: Check that the file exists: ls -la {}", path.display()),
                "TRY: Omit --inventory to audit against the last synced snapshot".to_string(),
            ])
    }

    /// Inventory snapshot is not a JSON array of assets
    pub fn json_parse_error(path: &Path, details: &str) -> Self {
        Self::new(format!("JSON parse error: {}", details))
            .with_context(format!("Failed to parse inventory snapshot: {}", path.display()))
            .with_suggestions([
                "TRY: The file must be a JSON array of {tag, location, status, category}".to_string(),
                "TRY: Status values are snake_case, e.g. in_use, decommissioned".to_string(),
            ])
    }

    /// Nothing to audit at the chosen location
    pub fn empty_location(location: &str) -> Self {
        Self::new(format!("No auditable assets recorded at '{}'", location))
            .with_context("Retired and promotional assets are never expected")
            .with_suggestions([
                "TRY: List locations with their counts: stocktake locations".to_string(),
                format!(
                    "TRY: Audit the empty room anyway: stocktake audit '{}' --allow-empty",
                    location
                ),
            ])
    }

    /// Report id is not in the database
    pub fn report_not_found(id: &str) -> Self {
        Self::new(format!("Report not found: {}", id)).with_suggestions([
            "TRY: List saved reports: stocktake reports list".to_string(),
        ])
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

/// Print an error as a JSON object on stdout for `--json` callers.
pub fn print_json_error(err: &anyhow::Error) {
    let value = match err.downcast_ref::<HelpfulError>() {
        Some(helpful) => serde_json::json!({
            "ok": false,
            "error": helpful.message,
            "context": helpful.context,
            "suggestions": helpful.suggestions,
        }),
        None => serde_json::json!({
            "ok": false,
            "error": format!("{:#}", err),
        }),
    };
    println!("{}", value);
}
