//! JSON report generation.
//!
//! # Example
//!
//! ```rust
//! use recall_report::{SessionReport, json::JsonGenerator};
//!
//! let report = SessionReport::default();
//! let generator = JsonGenerator::new(&report);
//!
//! let compact = generator.generate().unwrap();
//! assert!(!compact.contains('\n'));
//!
//! let pretty = generator.generate_pretty().unwrap();
//! assert!(pretty.contains("lesson_title"));
//! ```

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::{ReportError, Result, SessionReport};

/// JSON report generator.
pub struct JsonGenerator<'a> {
    report: &'a SessionReport,
}

impl<'a> JsonGenerator<'a> {
    /// Creates a new JSON generator for the given report.
    #[must_use]
    pub const fn new(report: &'a SessionReport) -> Self {
        Self { report }
    }

    /// Generates compact JSON output (single line).
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Serialization`] if JSON serialization fails.
    pub fn generate(&self) -> Result<String> {
        serde_json::to_string(self.report).map_err(ReportError::from)
    }

    /// Generates pretty-printed JSON output.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Serialization`] if JSON serialization fails.
    pub fn generate_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self.report).map_err(ReportError::from)
    }

    /// Writes the JSON report to a file, creating or overwriting it.
    ///
    /// Parent directories must exist.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Serialization`] if JSON serialization fails.
    /// Returns [`ReportError::Io`] if file creation or writing fails.
    pub fn write_to_file(&self, path: &Path, pretty: bool) -> Result<()> {
        let json = if pretty {
            self.generate_pretty()?
        } else {
            self.generate()?
        };

        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::sample_input;
    use crate::ReportGenerator;

    fn sample_report() -> SessionReport {
        ReportGenerator::new(sample_input()).generate().unwrap()
    }

    #[test]
    fn test_generate_compact_json() {
        let report = sample_report();
        let json = JsonGenerator::new(&report).generate().unwrap();

        assert!(!json.contains('\n'));
        assert!(json.contains(r#""lesson_title":"Week 3: Harbour Life""#));
        assert!(json.contains(r#""status":"completed""#));
        assert!(json.contains(r#""troublesome_words":["bravo"]"#));
    }

    #[test]
    fn test_generate_pretty_json() {
        let report = sample_report();
        let json = JsonGenerator::new(&report).generate_pretty().unwrap();

        assert!(json.contains('\n'));
        assert!(json.contains("  \"summary\""));
        assert!(json.contains("\"duration_seconds\": 75"));
    }

    #[test]
    fn test_write_to_file() {
        let report = sample_report();
        let path = std::env::temp_dir().join(format!(
            "recall_report_test_{}.json",
            std::process::id()
        ));

        JsonGenerator::new(&report).write_to_file(&path, true).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: SessionReport = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed, report);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let report = sample_report();
        let err = JsonGenerator::new(&report)
            .write_to_file(Path::new("/nonexistent/dir/report.json"), false)
            .unwrap_err();
        assert!(matches!(err, ReportError::Io(_)));
    }
}
