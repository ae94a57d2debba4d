use crate::model::{MatchResult, ParityChoice};
use rand::Rng;
use std::ops::RangeInclusive;

/// Result of applying a game rule to two choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub drawn_number: u32,
    pub result_a: MatchResult,
    pub result_b: MatchResult,
}

/// Decides a match from the two players' choices.
pub trait GameRule: Send + Sync + 'static {
    fn resolve(&self, choice_a: ParityChoice, choice_b: ParityChoice) -> Verdict;
}

/// Draw a number; whoever guessed its parity wins. Same guess (both right or both
/// wrong) is a draw.
#[derive(Debug, Clone)]
pub struct EvenOddRule {
    range: RangeInclusive<u32>,
}

impl Default for EvenOddRule {
    fn default() -> Self {
        Self { range: 1..=10 }
    }
}

impl EvenOddRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve_with(drawn_number: u32, choice_a: ParityChoice, choice_b: ParityChoice) -> Verdict {
        let (result_a, result_b) = match (choice_a.matches(drawn_number), choice_b.matches(drawn_number)) {
            (true, false) => (MatchResult::Win, MatchResult::Loss),
            (false, true) => (MatchResult::Loss, MatchResult::Win),
            _ => (MatchResult::Draw, MatchResult::Draw),
        };
        Verdict {
            drawn_number,
            result_a,
            result_b,
        }
    }
}

impl GameRule for EvenOddRule {
    fn resolve(&self, choice_a: ParityChoice, choice_b: ParityChoice) -> Verdict {
        let drawn = rand::thread_rng().gen_range(self.range.clone());
        Self::resolve_with(drawn, choice_a, choice_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ParityChoice::{Even, Odd};

    #[test]
    fn test_even_draw_even_vs_odd() {
        let verdict = EvenOddRule::resolve_with(4, Even, Odd);
        assert_eq!(verdict.result_a, MatchResult::Win);
        assert_eq!(verdict.result_b, MatchResult::Loss);
        assert_eq!(verdict.drawn_number, 4);
    }

    #[test]
    fn test_odd_draw_even_vs_odd() {
        let verdict = EvenOddRule::resolve_with(7, Even, Odd);
        assert_eq!((verdict.result_a, verdict.result_b), (MatchResult::Loss, MatchResult::Win));
    }

    #[test]
    fn test_same_choice_is_draw() {
        for n in 1..=10 {
            let verdict = EvenOddRule::resolve_with(n, Odd, Odd);
            assert_eq!((verdict.result_a, verdict.result_b), (MatchResult::Draw, MatchResult::Draw));
        }
    }

    #[test]
    fn test_random_draw_in_range() {
        let rule = EvenOddRule::new();
        for _ in 0..100 {
            let verdict = rule.resolve(Even, Odd);
            assert!((1..=10).contains(&verdict.drawn_number));
            assert_ne!(verdict.result_a, verdict.result_b);
        }
    }
}
