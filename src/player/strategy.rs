use crate::model::{MatchId, ParityChoice, PlayerId};
use rand::Rng;

/// Picks a parity for a match.
pub trait ParityStrategy: Send + 'static {
    fn choose(&mut self, match_id: MatchId, opponent: Option<PlayerId>) -> ParityChoice;
}

/// Coin flip.
#[derive(Debug, Default, Clone)]
pub struct RandomParity;

impl ParityStrategy for RandomParity {
    fn choose(&mut self, _match_id: MatchId, _opponent: Option<PlayerId>) -> ParityChoice {
        if rand::thread_rng().gen_bool(0.5) {
            ParityChoice::Even
        } else {
            ParityChoice::Odd
        }
    }
}

/// Always the same answer.
#[derive(Debug, Clone)]
pub struct FixedParity(pub ParityChoice);

impl ParityStrategy for FixedParity {
    fn choose(&mut self, _match_id: MatchId, _opponent: Option<PlayerId>) -> ParityChoice {
        self.0
    }
}
