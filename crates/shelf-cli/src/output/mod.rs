//! Terminal output formatting.
//!
//! Results go to stdout, either as plain lines or as JSON with `--json`.
//! Status messages go to stderr so they never mix with results.

use serde::Serialize;

pub mod colors;
pub mod errors;

/// Output handler for consistent terminal formatting
pub struct OutputHandler {
    colors: colors::ColorSupport,
    json: bool,
}

impl OutputHandler {
    /// Create a new output handler
    pub fn new(json: bool) -> Self {
        Self {
            colors: colors::ColorSupport::detect(),
            json,
        }
    }

    /// Whether results are printed as JSON
    pub fn is_json(&self) -> bool {
        self.json
    }

    /// Print one result line
    pub fn result(&self, line: &str) {
        println!("{}", line);
    }

    /// Print a result as pretty JSON
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if !self.json {
            eprintln!("{}", self.colors.dim(message));
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if !self.json {
            eprintln!("{} {}", self.colors.green("✓"), message);
        }
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", self.colors.yellow("⚠"), message);
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new(false)
    }
}
