// src/history.rs
//! Read-only views over loaded analysis history: search, paging, and the
//! aggregates shown on the history and profile pages.

use crate::types::analysis::HistoryEntry;

pub const DEFAULT_ROWS_PER_PAGE: usize = 10;
pub const RECENT_LIMIT: usize = 3;

/// Newest first; ties keep their relative order.
pub fn sort_newest_first(entries: &mut [HistoryEntry]) {
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Case-insensitive substring match over file name and role.
pub fn filter_entries<'a>(entries: &'a [HistoryEntry], term: &str) -> Vec<&'a HistoryEntry> {
    let term = term.trim().to_lowercase();
    entries
        .iter()
        .filter(|e| {
            term.is_empty()
                || e.file_name.to_lowercase().contains(&term)
                || e.target_role.to_lowercase().contains(&term)
        })
        .collect()
}

pub fn recent(entries: &[HistoryEntry], limit: usize) -> &[HistoryEntry] {
    &entries[..entries.len().min(limit)]
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPage<'a> {
    pub items: Vec<&'a HistoryEntry>,
    /// Zero-based.
    pub page: usize,
    pub rows_per_page: usize,
    pub total: usize,
}

impl HistoryPage<'_> {
    pub fn page_count(&self) -> usize {
        self.total.div_ceil(self.rows_per_page.max(1))
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.page_count()
    }
}

/// Slice one page out of an already filtered list.
pub fn paginate<'a>(
    entries: &[&'a HistoryEntry],
    page: usize,
    rows_per_page: usize,
) -> HistoryPage<'a> {
    let rows_per_page = rows_per_page.max(1);
    let start = page.saturating_mul(rows_per_page).min(entries.len());
    let end = start.saturating_add(rows_per_page).min(entries.len());

    HistoryPage {
        items: entries[start..end].to_vec(),
        page,
        rows_per_page,
        total: entries.len(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryStats {
    pub count: usize,
    pub average_score: u8,
    pub best_score: u8,
}

impl HistoryStats {
    pub fn from_entries(entries: &[HistoryEntry]) -> Self {
        if entries.is_empty() {
            return Self::default();
        }

        let total: u32 = entries.iter().map(|e| u32::from(e.score)).sum();
        let average = (f64::from(total) / entries.len() as f64).round() as u8;
        let best = entries.iter().map(|e| e.score).max().unwrap_or_default();

        Self {
            count: entries.len(),
            average_score: average,
            best_score: best,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl MemberLevel {
    pub fn from_count(total_analyses: usize) -> Self {
        match total_analyses {
            20.. => Self::Expert,
            10..=19 => Self::Advanced,
            5..=9 => Self::Intermediate,
            _ => Self::Beginner,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
            Self::Expert => "Expert",
        }
    }

    pub fn progress(&self) -> u8 {
        match self {
            Self::Beginner => 25,
            Self::Intermediate => 50,
            Self::Advanced => 75,
            Self::Expert => 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::analysis::InputType;
    use chrono::{Duration, TimeZone, Utc};

    fn entry(id: &str, file: &str, role: &str, score: u8, minutes: i64) -> HistoryEntry {
        HistoryEntry {
            id: id.to_string(),
            file_name: file.to_string(),
            target_role: role.to_string(),
            score,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
                + Duration::minutes(minutes),
            input_type: InputType::File,
        }
    }

    fn sample() -> Vec<HistoryEntry> {
        vec![
            entry("1", "jane_cv.pdf", "Data Scientist", 72, 0),
            entry("2", "Pasted Resume", "Backend Developer", 88, 5),
            entry("3", "resume-final.docx", "Product Manager", 55, 10),
        ]
    }

    #[test]
    fn test_sort_newest_first() {
        let mut entries = sample();
        sort_newest_first(&mut entries);
        let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "2", "1"]);
    }

    #[test]
    fn test_filter_matches_file_name_or_role() {
        let entries = sample();
        assert_eq!(filter_entries(&entries, "").len(), 3);
        assert_eq!(filter_entries(&entries, "JANE")[0].id, "1");
        assert_eq!(filter_entries(&entries, "developer")[0].id, "2");
        assert_eq!(filter_entries(&entries, " resume ").len(), 2);
        assert!(filter_entries(&entries, "designer").is_empty());
    }

    #[test]
    fn test_paginate() {
        let entries: Vec<_> = (0..23)
            .map(|i| entry(&i.to_string(), "cv.pdf", "Role", 70, i))
            .collect();
        let all: Vec<&HistoryEntry> = entries.iter().collect();

        let first = paginate(&all, 0, 10);
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.page_count(), 3);
        assert!(first.has_next());

        let last = paginate(&all, 2, 10);
        assert_eq!(last.items.len(), 3);
        assert_eq!(last.items[0].id, "20");
        assert!(!last.has_next());

        let beyond = paginate(&all, 9, 10);
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total, 23);

        let empty = paginate(&[], 0, 10);
        assert_eq!(empty.page_count(), 0);
    }

    #[test]
    fn test_stats() {
        assert_eq!(HistoryStats::from_entries(&[]), HistoryStats::default());

        let stats = HistoryStats::from_entries(&sample());
        assert_eq!(stats.count, 3);
        // (72 + 88 + 55) / 3 = 71.67
        assert_eq!(stats.average_score, 72);
        assert_eq!(stats.best_score, 88);
    }

    #[test]
    fn test_member_level() {
        assert_eq!(MemberLevel::from_count(0), MemberLevel::Beginner);
        assert_eq!(MemberLevel::from_count(5), MemberLevel::Intermediate);
        assert_eq!(MemberLevel::from_count(19), MemberLevel::Advanced);
        assert_eq!(MemberLevel::from_count(20).progress(), 100);
    }

    #[test]
    fn test_recent() {
        let entries = sample();
        assert_eq!(recent(&entries, RECENT_LIMIT).len(), 3);
        assert_eq!(recent(&entries, 1).len(), 1);
        assert!(recent(&[], 3).is_empty());
    }
}
