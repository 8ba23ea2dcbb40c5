// src/display.rs
//! Plain-text rendering of results, history and profile stats.

use std::fmt::Write;

use crate::history::{HistoryPage, HistoryStats, MemberLevel};
use crate::types::analysis::{
    stars, AnalysisDetails, AnalysisFeedback, AnalysisResult, HistoryEntry, ScoreBand,
};

fn push_list(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{}:", title);
    for item in items {
        let _ = writeln!(out, "  - {}", item);
    }
}

fn push_feedback(out: &mut String, feedback: &AnalysisFeedback) {
    if let Some(ats) = feedback.ats_score.filter(|s| *s > 0) {
        let _ = writeln!(out, "ATS Score: {}/100", ats);
    }
    push_list(out, "Strengths", &feedback.strengths);
    push_list(out, "Improvements", &feedback.improvements);
    if !feedback.keywords.is_empty() {
        let _ = writeln!(out, "\nKeywords: {}", feedback.keywords.join(", "));
    }
    push_list(out, "Suggestions", &feedback.suggestions);
}

pub fn render_result(result: &AnalysisResult, role: Option<&str>) -> String {
    let mut out = String::new();
    let band = result.band();

    match role {
        Some(role) => {
            let _ = writeln!(out, "Resume Score for {}", role);
        }
        None => {
            let _ = writeln!(out, "Resume Score");
        }
    }
    let _ = writeln!(
        out,
        "{}/100  ({}, {:.1}/5 stars)",
        result.score,
        band.label(),
        stars(result.score)
    );
    let _ = writeln!(out, "{}", band.message());
    push_feedback(&mut out, &result.analysis);
    let _ = writeln!(out, "\nAnalysis ID: {}", result.analysis_id);
    out
}

pub fn render_history(page: &HistoryPage<'_>) -> String {
    let mut out = String::new();

    if page.total == 0 {
        let _ = writeln!(out, "No analysis history yet");
        let _ = writeln!(out, "Upload and analyze your first resume to see it here");
        return out;
    }

    let _ = writeln!(
        out,
        "{:<26} {:<28} {:<24} {:>7} {:<5} {:<17}",
        "ID", "File", "Role", "Score", "Type", "Date"
    );
    let _ = writeln!(out, "{}", "-".repeat(112));
    for entry in &page.items {
        let _ = writeln!(
            out,
            "{:<26} {:<28} {:<24} {:>7} {:<5} {:<17}",
            entry.id,
            truncate(&entry.file_name, 28),
            truncate(&entry.target_role, 24),
            format!("{}/100", entry.score),
            entry.input_type.as_str(),
            entry.created_at.format("%Y-%m-%d %H:%M")
        );
    }
    let _ = writeln!(
        out,
        "\nPage {} of {} ({} analyses)",
        page.page + 1,
        page.page_count(),
        page.total
    );
    out
}

pub fn render_stats(stats: &HistoryStats, greeting_name: &str) -> String {
    let level = MemberLevel::from_count(stats.count);
    let mut out = String::new();
    let _ = writeln!(out, "Profile: {}", greeting_name);
    let _ = writeln!(out, "Member level: {} ({}%)", level.name(), level.progress());
    let _ = writeln!(out, "Total Analyses: {}", stats.count);
    let _ = writeln!(out, "Average Score: {}/100", stats.average_score);
    let _ = writeln!(out, "Best Score: {}/100", stats.best_score);
    out
}

/// Short list for the dashboard's "Recent Analyses" panel.
pub fn render_recent(entries: &[HistoryEntry]) -> String {
    let mut out = String::from("Recent Analyses\n");
    if entries.is_empty() {
        let _ = writeln!(out, "  No analyses yet");
    }
    for entry in entries {
        let _ = writeln!(
            out,
            "  {}/100  {} for {} ({})",
            entry.score,
            entry.file_name,
            entry.target_role,
            entry.created_at.format("%Y-%m-%d")
        );
    }
    out
}

pub fn render_details(details: &AnalysisDetails) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Analysis {}", details.id);
    if let Some(name) = &details.file_name {
        let _ = writeln!(out, "File: {}", name);
    }
    if let Some(role) = &details.target_role {
        let _ = writeln!(out, "Role: {}", role);
    }
    if let Some(created) = details.created_at {
        let _ = writeln!(out, "Date: {}", created.format("%Y-%m-%d %H:%M"));
    }
    if let Some(score) = details.score {
        let band = ScoreBand::from_score(score);
        let _ = writeln!(out, "Score: {}/100 ({})", score, band.label());
    }
    if let Some(feedback) = &details.analysis {
        push_feedback(&mut out, feedback);
    }
    out
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut cut: String = value.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
