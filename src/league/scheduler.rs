use crate::league::LeagueError;
use crate::model::{MatchAssignment, MatchId, PlayerId, RefereeId};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// One round of the schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    /// Zero-based position in the schedule.
    pub index: usize,
    pub matches: Vec<MatchAssignment>,
    completed: HashSet<MatchId>,
}

impl Round {
    fn new(index: usize, matches: Vec<MatchAssignment>) -> Self {
        Self {
            index,
            matches,
            completed: HashSet::new(),
        }
    }

    pub fn round_id(&self) -> u32 {
        self.index as u32 + 1
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    pub fn is_completed(&self, match_id: MatchId) -> bool {
        self.completed.contains(&match_id)
    }

    pub fn find(&self, match_id: MatchId) -> Option<&MatchAssignment> {
        self.matches.iter().find(|m| m.match_id == match_id)
    }

    /// `true` once every match has a referee.
    pub fn is_assigned(&self) -> bool {
        self.matches.iter().all(|m| m.referee_id.is_some())
    }
}

/// Result of recording a finished match against the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Pending { completed: usize, total: usize },
    RoundComplete,
    Duplicate,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSummary {
    pub total_rounds: usize,
    /// One-based, `None` before the league starts or after it ends.
    pub current_round: Option<u32>,
    pub rounds: Vec<Vec<MatchAssignment>>,
}

/// Round-robin plan plus a cursor on the current round.
#[derive(Debug, Default)]
pub struct RoundScheduler {
    rounds: Vec<Round>,
    current: usize,
}

impl RoundScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the full schedule with the circle method and returns the number of rounds.
    ///
    /// With an odd number of players a bye slot is added; pairings against the bye
    /// are dropped. Player order decides the first round. Fewer than two players
    /// produce an empty schedule.
    pub fn generate_schedule(&mut self, players: &[PlayerId]) -> usize {
        self.rounds.clear();
        self.current = 0;
        if players.len() < 2 {
            return 0;
        }

        let mut slots: Vec<Option<PlayerId>> = players.iter().copied().map(Some).collect();
        if slots.len() % 2 == 1 {
            slots.push(None);
        }
        let n = slots.len();

        for index in 0..n - 1 {
            let round_id = index as u32 + 1;
            let mut matches = Vec::with_capacity(n / 2);
            for i in 0..n / 2 {
                if let (Some(player_a), Some(player_b)) = (slots[i], slots[n - 1 - i]) {
                    matches.push(MatchAssignment {
                        match_id: MatchId::new(round_id, matches.len() as u32 + 1),
                        round_id,
                        player_a,
                        player_b,
                        referee_id: None,
                    });
                }
            }
            self.rounds.push(Round::new(index, matches));
            // Slot 0 stays put, the rest turn one step.
            slots[1..].rotate_right(1);
        }

        debug!(players = players.len(), rounds = self.rounds.len(), "Schedule generated");
        self.rounds.len()
    }

    /// Hands the current round's matches to referees in turn: match `i` gets
    /// `referees[i % len]`.
    pub fn assign_referees(&mut self, referees: &[RefereeId]) -> Result<(), LeagueError> {
        if referees.is_empty() {
            return Err(LeagueError::NoRefereeAvailable);
        }
        let round = self
            .rounds
            .get_mut(self.current)
            .ok_or(LeagueError::LeagueNotStarted)?;
        for (i, assignment) in round.matches.iter_mut().enumerate() {
            assignment.referee_id = Some(referees[i % referees.len()]);
        }
        Ok(())
    }

    pub fn current_round(&self) -> Option<&Round> {
        self.rounds.get(self.current)
    }

    pub fn current_index(&self) -> Option<usize> {
        (self.current < self.rounds.len()).then_some(self.current)
    }

    /// Moves to the next round; `false` means the schedule is exhausted.
    pub fn advance_round(&mut self) -> bool {
        if self.current < self.rounds.len() {
            self.current += 1;
        }
        self.current < self.rounds.len()
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn total_matches(&self) -> usize {
        self.rounds.iter().map(|r| r.matches.len()).sum()
    }

    /// First unfinished match for `player`, looking from the current round onwards.
    pub fn player_next_match(&self, player: PlayerId) -> Option<&MatchAssignment> {
        self.rounds
            .iter()
            .skip(self.current)
            .flat_map(|round| {
                round
                    .matches
                    .iter()
                    .filter(move |m| !round.is_completed(m.match_id))
            })
            .find(|m| m.involves(player))
    }

    /// Counts a finished match towards the current round.
    ///
    /// Only distinct matches of the current round count; repeats and strangers are
    /// reported back without touching the counter.
    pub fn record_completion(&mut self, match_id: MatchId) -> Completion {
        let Some(round) = self.rounds.get_mut(self.current) else {
            return Completion::Unknown;
        };
        if round.find(match_id).is_none() {
            return Completion::Unknown;
        }
        if !round.completed.insert(match_id) {
            return Completion::Duplicate;
        }
        let total = round.matches.len();
        let completed = round.completed.len();
        if completed == total {
            Completion::RoundComplete
        } else {
            Completion::Pending { completed, total }
        }
    }

    pub fn summary(&self) -> ScheduleSummary {
        ScheduleSummary {
            total_rounds: self.rounds.len(),
            current_round: self.current_index().map(|i| i as u32 + 1),
            rounds: self.rounds.iter().map(|r| r.matches.clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn players(n: u32) -> Vec<PlayerId> {
        (1..=n).map(PlayerId).collect()
    }

    fn pair(m: &MatchAssignment) -> (PlayerId, PlayerId) {
        if m.player_a < m.player_b {
            (m.player_a, m.player_b)
        } else {
            (m.player_b, m.player_a)
        }
    }

    #[test]
    fn test_every_pair_exactly_once() {
        for n in 2..=9u32 {
            let mut scheduler = RoundScheduler::new();
            let rounds = scheduler.generate_schedule(&players(n));
            let expected_rounds = (if n % 2 == 0 { n - 1 } else { n }) as usize;
            assert_eq!(rounds, expected_rounds, "n = {n}");

            let mut pairs = HashSet::new();
            for round in scheduler.rounds() {
                assert!(!round.matches.is_empty());
                let mut seen = HashSet::new();
                for m in &round.matches {
                    assert_ne!(m.player_a, m.player_b);
                    assert!(seen.insert(m.player_a), "player twice in round, n = {n}");
                    assert!(seen.insert(m.player_b), "player twice in round, n = {n}");
                    assert!(pairs.insert(pair(m)), "pair repeated, n = {n}");
                }
            }
            assert_eq!(pairs.len() as u32, n * (n - 1) / 2);
            assert_eq!(scheduler.total_matches() as u32, n * (n - 1) / 2);
        }
    }

    #[test]
    fn test_too_few_players() {
        let mut scheduler = RoundScheduler::new();
        assert_eq!(scheduler.generate_schedule(&players(1)), 0);
        assert!(scheduler.current_round().is_none());
        assert!(!scheduler.advance_round());
    }

    #[test]
    fn test_match_ids_follow_rounds() {
        let mut scheduler = RoundScheduler::new();
        scheduler.generate_schedule(&players(4));
        let first = &scheduler.rounds()[0];
        assert_eq!(first.matches[0].match_id.to_string(), "R1M1");
        assert_eq!(first.matches[1].match_id.to_string(), "R1M2");
        assert_eq!(first.matches[0].round_id, 1);
        assert_eq!(scheduler.rounds()[2].round_id(), 3);
    }

    #[test]
    fn test_assign_referees_cycles() {
        let mut scheduler = RoundScheduler::new();
        scheduler.generate_schedule(&players(6));
        assert_eq!(
            scheduler.assign_referees(&[]),
            Err(LeagueError::NoRefereeAvailable)
        );
        assert!(!scheduler.current_round().unwrap().is_assigned());

        scheduler
            .assign_referees(&[RefereeId(1), RefereeId(2)])
            .unwrap();
        let refs: Vec<Option<RefereeId>> = scheduler
            .current_round()
            .unwrap()
            .matches
            .iter()
            .map(|m| m.referee_id)
            .collect();
        assert_eq!(
            refs,
            vec![Some(RefereeId(1)), Some(RefereeId(2)), Some(RefereeId(1))]
        );
    }

    #[test]
    fn test_round_completes_on_last_distinct_match() {
        let mut scheduler = RoundScheduler::new();
        scheduler.generate_schedule(&players(4));
        let ids: Vec<MatchId> = scheduler.rounds()[0]
            .matches
            .iter()
            .map(|m| m.match_id)
            .collect();

        assert_eq!(
            scheduler.record_completion(ids[0]),
            Completion::Pending {
                completed: 1,
                total: 2
            }
        );
        assert_eq!(scheduler.record_completion(ids[0]), Completion::Duplicate);
        assert_eq!(
            scheduler.record_completion(MatchId::new(2, 1)),
            Completion::Unknown
        );
        assert_eq!(scheduler.record_completion(ids[1]), Completion::RoundComplete);

        assert!(scheduler.advance_round());
        assert!(scheduler.advance_round());
        assert!(!scheduler.advance_round());
        assert!(scheduler.current_round().is_none());
        assert_eq!(scheduler.record_completion(ids[0]), Completion::Unknown);
    }

    #[test]
    fn test_player_next_match() {
        let mut scheduler = RoundScheduler::new();
        scheduler.generate_schedule(&players(4));
        let first = scheduler.player_next_match(PlayerId(1)).unwrap().clone();
        assert_eq!(first.round_id, 1);

        scheduler.record_completion(first.match_id);
        let next = scheduler.player_next_match(PlayerId(1)).unwrap();
        assert_eq!(next.round_id, 2);
        assert!(next.involves(PlayerId(1)));

        let summary = scheduler.summary();
        assert_eq!(summary.total_rounds, 3);
        assert_eq!(summary.current_round, Some(1));
    }
}
