//! Ranking and the rendered leaderboard view

use std::fmt;

use crate::entry::ScoreEntry;

/// One displayed row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedRow {
    /// 1-indexed
    pub rank: usize,
    pub name: String,
    pub score: u64,
    /// Row mirrors the running game
    pub live: bool,
}

/// What the leaderboard shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaderboardView {
    /// "No scores yet"
    Empty,
    Ranked(Vec<RankedRow>),
}

impl LeaderboardView {
    pub const EMPTY_TEXT: &'static str = "No scores yet";

    /// Never `Ranked` with no rows
    pub fn from_entries(entries: &[ScoreEntry], limit: usize) -> Self {
        let rows = rank(entries, limit);
        if rows.is_empty() {
            return LeaderboardView::Empty;
        }
        LeaderboardView::Ranked(rows)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, LeaderboardView::Empty)
    }

    pub fn rows(&self) -> &[RankedRow] {
        match self {
            LeaderboardView::Empty => &[],
            LeaderboardView::Ranked(rows) => rows,
        }
    }
}

impl fmt::Display for LeaderboardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeaderboardView::Empty => write!(f, "{}", Self::EMPTY_TEXT),
            LeaderboardView::Ranked(rows) => {
                let name_width = rows.iter().map(|r| r.name.chars().count()).max().unwrap_or(0);
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(
                        f,
                        "{:>3}. {:<width$}  {:>6}",
                        row.rank,
                        row.name,
                        row.score,
                        width = name_width
                    )?;
                    if row.live {
                        write!(f, "  (live)")?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// Sort by score descending and keep the top `limit`.
///
/// The sort is stable and compares only scores, so ties keep storage order.
pub fn rank(entries: &[ScoreEntry], limit: usize) -> Vec<RankedRow> {
    let mut sorted: Vec<&ScoreEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| b.score.cmp(&a.score));

    sorted
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, e)| RankedRow {
            rank: i + 1,
            name: e.name.clone(),
            score: e.score,
            live: e.is_live(),
        })
        .collect()
}

/// Display surface for the leaderboard.
///
/// Each call replaces everything previously shown.
pub trait LeaderboardRenderer {
    fn render(&mut self, view: &LeaderboardView);
}

/// Renderer that shows nothing
#[derive(Debug, Default)]
pub struct NullRenderer;

impl LeaderboardRenderer for NullRenderer {
    fn render(&mut self, _view: &LeaderboardView) {}
}
