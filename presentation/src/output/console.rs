//! Console output formatter for finished turns

use crate::output::view::TurnView;
use colored::Colorize;
use superai_application::{TurnOutcome, TurnRecord};
use superai_domain::util::preview;
use superai_domain::{AnswerSource, ConversationTurn, ResponseCleaner};

/// Width of the prompt preview in history listings
const PREVIEW_BYTES: usize = 72;

/// Formats turns for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Every provider's answer, then the final answer
    pub fn format(turn: &ConversationTurn) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("superai"));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n",
            "Question:".cyan().bold(),
            turn.question().content()
        ));

        output.push_str(&Self::section_header("Provider answers"));
        for response in turn.responses() {
            let name = response.provider.display_name();
            if response.is_success() {
                output.push_str(&format!(
                    "\n{}\n{}\n",
                    format!("── {} ──", name).yellow().bold(),
                    ResponseCleaner::clean(&response.raw_text)
                ));
            } else {
                output.push_str(&format!(
                    "\n{}\nError: {}\n",
                    format!("── {} ──", name).red().bold(),
                    response.error_message.as_deref().unwrap_or("Unknown")
                ));
            }
        }

        output.push_str(&Self::section_header("Final answer"));
        match turn.final_answer() {
            Some(answer) => {
                let label = Self::source_label(&answer.source);
                let label = if answer.is_degraded() {
                    label.red().bold()
                } else {
                    label.green().bold()
                };
                output.push_str(&format!("\n{}\n\n{}\n", label, answer.text));
            }
            None => output.push_str(&format!("\n{}\n", "(no answer)".dimmed())),
        }

        output.push_str(&Self::footer());
        output
    }

    /// Only the final answer text
    pub fn format_answer_only(turn: &ConversationTurn) -> String {
        match turn.final_answer() {
            Some(answer) => format!("{}\n", answer.text),
            None => String::new(),
        }
    }

    /// Format as JSON
    pub fn format_json(outcome: &TurnOutcome) -> String {
        serde_json::to_string_pretty(&TurnView::from_outcome(outcome))
            .unwrap_or_else(|_| "{}".to_string())
    }

    /// One line per past turn, newest first
    pub fn format_history(records: &[TurnRecord]) -> String {
        if records.is_empty() {
            return format!("{}\n", "No turns recorded.".dimmed());
        }

        let mut output = String::new();
        for record in records {
            let marker = if record.degraded {
                "!".red()
            } else {
                "v".green()
            };
            output.push_str(&format!(
                "{} {} {}\n",
                marker,
                record
                    .completed_at
                    .format("%Y-%m-%d %H:%M")
                    .to_string()
                    .dimmed(),
                preview(&record.prompt, PREVIEW_BYTES)
            ));
        }
        output
    }

    fn source_label(source: &AnswerSource) -> String {
        match source {
            AnswerSource::Synthesized { model } => format!("Synthesized by {}", model),
            AnswerSource::Provider { provider } => {
                format!("Best single answer ({})", provider.display_name())
            }
            AnswerSource::Fallback { .. } => "Synthesis unavailable".to_string(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}
