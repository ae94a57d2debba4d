use crate::league::LeagueError;
use crate::model::{MatchResult, PlayerId};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingsEntry {
    pub player_id: PlayerId,
    pub display_name: String,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub points: u32,
}

impl StandingsEntry {
    fn new(player_id: PlayerId, display_name: String) -> Self {
        Self {
            player_id,
            display_name,
            played: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            points: 0,
        }
    }

    fn apply(&mut self, result: MatchResult) {
        self.played += 1;
        match result {
            MatchResult::Win => self.wins += 1,
            MatchResult::Draw => self.draws += 1,
            MatchResult::Loss | MatchResult::TechnicalLoss => self.losses += 1,
        }
        self.points += result.points();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueStats {
    pub total_players: usize,
    pub total_matches_played: u32,
    pub total_wins: u32,
    pub total_draws: u32,
    pub total_losses: u32,
}

/// Per-player win/draw/loss counters.
///
/// Entries keep registration order; [`ranked`](Self::ranked) is a stable sort on
/// points, so ties stay in that order.
#[derive(Debug, Default)]
pub struct StandingsTable {
    entries: Vec<StandingsEntry>,
    index: HashMap<PlayerId, usize>,
}

impl StandingsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an empty entry. Registering the same player twice is a no-op.
    pub fn register_player(&mut self, player_id: PlayerId, display_name: impl Into<String>) {
        if self.index.contains_key(&player_id) {
            return;
        }
        self.index.insert(player_id, self.entries.len());
        self.entries
            .push(StandingsEntry::new(player_id, display_name.into()));
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.index.contains_key(&player_id)
    }

    pub fn record_result(&mut self, player_id: PlayerId, result: MatchResult) -> Result<(), LeagueError> {
        let slot = *self
            .index
            .get(&player_id)
            .ok_or(LeagueError::UnknownPlayer(player_id))?;
        self.entries[slot].apply(result);
        Ok(())
    }

    pub fn entry(&self, player_id: PlayerId) -> Option<&StandingsEntry> {
        self.index.get(&player_id).map(|&slot| &self.entries[slot])
    }

    /// Player ids in registration order.
    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.entries.iter().map(|e| e.player_id).collect()
    }

    pub fn ranked(&self) -> Vec<StandingsEntry> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.points.cmp(&a.points));
        ranked
    }

    pub fn champion(&self) -> Option<StandingsEntry> {
        self.ranked().into_iter().next()
    }

    pub fn stats(&self) -> LeagueStats {
        let played: u32 = self.entries.iter().map(|e| e.played).sum();
        LeagueStats {
            total_players: self.entries.len(),
            total_matches_played: played / 2,
            total_wins: self.entries.iter().map(|e| e.wins).sum(),
            total_draws: self.entries.iter().map(|e| e.draws).sum(),
            total_losses: self.entries.iter().map(|e| e.losses).sum(),
        }
    }

    /// Console table of the ranked standings.
    pub fn render_table(&self) -> String {
        render_standings(&self.ranked())
    }
}

/// Renders already ranked entries as a fixed-width table.
pub fn render_standings(ranked: &[StandingsEntry]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<4} {:<6} {:<16} {:>3} {:>3} {:>3} {:>3} {:>4}",
        "#", "ID", "NAME", "P", "W", "D", "L", "PTS"
    );
    for (rank, e) in ranked.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:<4} {:<6} {:<16} {:>3} {:>3} {:>3} {:>3} {:>4}",
            rank + 1,
            e.player_id.to_string(),
            e.display_name,
            e.played,
            e.wins,
            e.draws,
            e.losses,
            e.points
        );
    }
    out
}
