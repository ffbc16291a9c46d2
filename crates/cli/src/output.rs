//! Output formatting utilities

use anyhow::Result;
use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use diag_lib::render::{self, Section, SectionBody};
use diag_lib::{DiagnosisReport, FailureCategory, FollowUpContext};
use serde::Serialize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text (default)
    #[default]
    Text,
    /// JSON format
    Json,
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Color a category by how urgent it is
pub fn category_badge(category: FailureCategory) -> ColoredString {
    let label = category.as_str();
    let colored = match category {
        FailureCategory::PodRunningHealthy | FailureCategory::ScannerTraffic => label.green(),
        FailureCategory::PodPending | FailureCategory::Unknown => label.yellow(),
        _ => label.red(),
    };
    colored.bold()
}

/// Print a report as titled blocks followed by its normalized evidence
pub fn print_report(target: &str, report: &DiagnosisReport) {
    println!("{} {}", "Pod Diagnosis".bold(), target.cyan());
    println!("{}", "=".repeat(60));
    println!("Category: {}", category_badge(report.category));
    println!();

    print_block("Summary", &report.summary);
    print_block("Likely Cause", &report.likely_cause);

    println!("{}", "Evidence Details".bold().underline());
    if let Some(heading) = render::heading(&report.evidence) {
        println!("{}", heading.bold());
    }
    let sections = render::normalize(&report.evidence);
    if sections.is_empty() {
        println!("{}", "(no evidence collected)".dimmed());
    }
    for section in &sections {
        print_section(section);
    }
    println!();

    print_block("Recommendation", &report.recommendation);
}

fn print_block(title: &str, text: &str) {
    println!("{}", title.bold().underline());
    println!("{}", text);
    println!();
}

fn print_section(section: &Section) {
    match &section.body {
        SectionBody::Line(text) => println!("{}: {}", section.title.bold(), text),
        SectionBody::Bullets(items) => {
            println!("{}:", section.title.bold());
            for item in items {
                println!("  - {}", item);
            }
        }
        SectionBody::Code(text) => {
            println!("{}:", section.title.bold());
            for line in text.lines() {
                println!("  {}", line.dimmed());
            }
        }
    }
}

/// Print the follow-up context and the prompt to hand to a Q&A model
pub fn print_follow_up(ctx: &FollowUpContext) {
    println!();
    println!("{}", "Follow-up Context".bold());
    println!("{}", "=".repeat(60));
    println!("{}", ctx.system_prompt());
}

/// Mark for the active row of a table
pub fn active_marker(active: bool) -> String {
    if active {
        "*".green().bold().to_string()
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_badge_keeps_label() {
        colored::control::set_override(false);

        assert_eq!(
            category_badge(FailureCategory::CrashLoopBackOff).to_string(),
            "crash_loop_back_off"
        );
        assert_eq!(active_marker(true), "*");
        assert_eq!(active_marker(false), "");
    }
}
