//! Markdown report generation.
//!
//! The Markdown report contains a summary table, a per-round table, and the
//! list of words the learner should revisit.

use chrono::{DateTime, Utc};
use std::fmt::Write;

use crate::{RoundSummary, SessionReport};

/// Generates Markdown reports from a [`SessionReport`].
pub struct MarkdownGenerator<'a> {
    report: &'a SessionReport,
}

impl<'a> MarkdownGenerator<'a> {
    /// Creates a new Markdown generator for the given report.
    #[must_use]
    pub const fn new(report: &'a SessionReport) -> Self {
        Self { report }
    }

    /// Generates the complete Markdown report.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = String::new();

        self.write_title(&mut output);
        self.write_summary(&mut output);
        self.write_rounds(&mut output);
        self.write_troublesome_words(&mut output);

        output
    }

    fn write_title(&self, output: &mut String) {
        let _ = writeln!(
            output,
            "# Recall Session Report: {}\n",
            escape_markdown(&self.report.lesson_title)
        );
    }

    fn write_summary(&self, output: &mut String) {
        let summary = &self.report.summary;

        let _ = writeln!(output, "## Summary\n");
        let _ = writeln!(output, "| Metric | Value |");
        let _ = writeln!(output, "|--------|-------|");
        let _ = writeln!(output, "| Status | {} |", summary.status.description());
        let _ = writeln!(output, "| Started | {} |", format_timestamp(&summary.started_at));
        let _ = writeln!(output, "| Duration | {} |", format_duration(summary.duration_seconds));
        let _ = writeln!(output, "| Rounds | {} |", summary.rounds);
        let _ = writeln!(output, "| Words | {} |", summary.total_words);
        let _ = writeln!(
            output,
            "| Forgotten at least once | {} |",
            summary.words_forgotten
        );
        let _ = writeln!(output);
    }

    fn write_rounds(&self, output: &mut String) {
        let _ = writeln!(output, "## Rounds\n");

        if self.report.rounds.is_empty() {
            let _ = writeln!(output, "_No round was finished._\n");
            return;
        }

        let _ = writeln!(output, "| Round | Reviewed | Known | Forgotten | Duration |");
        let _ = writeln!(output, "|-------|----------|-------|-----------|----------|");
        for round in &self.report.rounds {
            write_round_row(output, round);
        }
        let _ = writeln!(output);
    }

    fn write_troublesome_words(&self, output: &mut String) {
        let _ = writeln!(output, "## Words to Revisit\n");

        if self.report.troublesome_words.is_empty() {
            let _ = writeln!(output, "_Every word was known on the first try._");
            return;
        }

        for word in &self.report.troublesome_words {
            let _ = writeln!(output, "- {}", escape_markdown(word));
        }
    }
}

fn write_round_row(output: &mut String, round: &RoundSummary) {
    let forgotten = if round.forgotten_words.is_empty() {
        "0".to_string()
    } else {
        let words: Vec<String> = round
            .forgotten_words
            .iter()
            .map(|w| escape_markdown(w))
            .collect();
        format!("{} ({})", round.forgotten_words.len(), words.join(", "))
    };
    let _ = writeln!(
        output,
        "| {} | {} | {} | {} | {} |",
        round.round,
        round.reviewed,
        round.known,
        forgotten,
        format_duration(round.duration_seconds)
    );
}

/// Formats a duration in seconds as e.g. `1h 2m 3s`.
fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut parts = Vec::new();

    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if secs > 0 || parts.is_empty() {
        parts.push(format!("{secs}s"));
    }

    parts.join(" ")
}

/// Format: "YYYY-MM-DD HH:MM:SS UTC"
fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Escapes characters that would break Markdown formatting or tables.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for ch in text.chars() {
        match ch {
            '*' | '_' | '`' | '#' | '[' | ']' | '\\' | '<' | '>' | '|' => {
                result.push('\\');
                result.push(ch);
            }
            '\n' => result.push(' '),
            _ => result.push(ch),
        }
    }

    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::sample_input;
    use crate::ReportGenerator;

    #[test]
    fn test_markdown_report_snapshot() {
        let report = ReportGenerator::new(sample_input()).generate().unwrap();
        let markdown = MarkdownGenerator::new(&report).generate();

        insta::assert_snapshot!(markdown, @r"
        # Recall Session Report: Week 3: Harbour Life

        ## Summary

        | Metric | Value |
        |--------|-------|
        | Status | Completed |
        | Started | 2024-05-01 08:00:00 UTC |
        | Duration | 1m 15s |
        | Rounds | 2 |
        | Words | 3 |
        | Forgotten at least once | 1 |

        ## Rounds

        | Round | Reviewed | Known | Forgotten | Duration |
        |-------|----------|-------|-----------|----------|
        | 1 | 3 | 2 | 1 (bravo) | 50s |
        | 2 | 1 | 1 | 0 | 15s |

        ## Words to Revisit

        - bravo
        ");
    }

    #[test]
    fn test_markdown_abandoned_without_rounds() {
        let mut input = sample_input();
        input.completed = false;
        input.rounds.clear();
        input.troublesome_words.clear();
        let report = ReportGenerator::new(input).generate().unwrap();
        let markdown = MarkdownGenerator::new(&report).generate();

        assert!(markdown.contains("| Status | Ended early |"));
        assert!(markdown.contains("_No round was finished._"));
        assert!(markdown.contains("_Every word was known on the first try._"));
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("a|b"), "a\\|b");
        assert_eq!(escape_markdown("*bold*"), "\\*bold\\*");
        assert_eq!(escape_markdown("line\nbreak"), "line break");
        assert_eq!(escape_markdown("plain words"), "plain words");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(59), "59s");
        assert_eq!(format_duration(60), "1m");
        assert_eq!(format_duration(3725), "1h 2m 5s");
    }
}
