use parity_league::config::LeagueConfig;
use parity_league::lifecycle::LeagueSystem;
use parity_league::model::{LeagueState, MatchResult, ParityChoice};
use parity_league::player::{FixedParity, PlayerAgent, PlayerReply, PlayerRequest, RandomParity};
use parity_league::protocol::QueryType;
use std::time::Duration;
use tokio::time::timeout;

const LIMIT: Duration = Duration::from_secs(30);

fn config(min_players: usize) -> LeagueConfig {
    LeagueConfig {
        min_players,
        min_referees: 1,
        start_wait_secs: 0,
        join_timeout_secs: 2,
        choice_timeout_secs: 2,
        ..LeagueConfig::default()
    }
}

/// Full league with all real agents over the in-process network.
#[tokio::test]
async fn test_four_player_league_end_to_end() {
    let mut system = LeagueSystem::start(config(4));
    system.add_referee().await.expect("referee registers");
    let strategies: [Box<dyn parity_league::player::ParityStrategy>; 4] = [
        Box::new(FixedParity(ParityChoice::Even)),
        Box::new(FixedParity(ParityChoice::Odd)),
        Box::new(RandomParity),
        Box::new(FixedParity(ParityChoice::Even)),
    ];
    let names = ["Alice", "Bob", "Carol", "Dave"];
    for (name, strategy) in names.into_iter().zip(strategies) {
        system.add_player(name, strategy).await.expect("player registers");
    }

    let done = timeout(LIMIT, system.wait_for_completion())
        .await
        .expect("league finished in time")
        .expect("manager alive");

    assert_eq!(done.state, LeagueState::Completed);
    assert_eq!(done.total_rounds, 3);
    assert_eq!(done.matches_reported, 6);
    assert_eq!(done.standings.len(), 4);
    for entry in &done.standings {
        assert_eq!(entry.played, 3, "{} played {}", entry.player_id, entry.played);
        assert_eq!(entry.points, 3 * entry.wins + entry.draws);
    }
    // Every decided match hands out exactly one win and one loss, or two draws.
    let wins: u32 = done.standings.iter().map(|e| e.wins).sum();
    let losses: u32 = done.standings.iter().map(|e| e.losses).sum();
    assert_eq!(wins, losses);
    assert_eq!(done.champion.as_ref(), done.standings.first());

    for index in 0..4 {
        let history = system.player_history(index).await.unwrap();
        assert_eq!(history.len(), 3);
        assert!(history.iter().all(|g| g.drawn_number.is_some() && g.reason.is_none()));
    }

    system.shutdown().await.unwrap();
}

/// A player that never joins forfeits every match; its opponents get nothing either.
#[tokio::test]
async fn test_declining_player_takes_technical_losses() {
    let mut system = LeagueSystem::start(config(4));
    system.add_referee().await.unwrap();
    let quitter = system
        .add_player_agent(|endpoint| {
            PlayerAgent::new("Quitter", endpoint, Box::new(RandomParity)).declining()
        })
        .await
        .unwrap();
    for name in ["Bob", "Carol", "Dave"] {
        system.add_player(name, Box::new(RandomParity)).await.unwrap();
    }

    let done = timeout(LIMIT, system.wait_for_completion()).await.unwrap().unwrap();
    assert_eq!(done.matches_reported, 6);

    let entry = done
        .standings
        .iter()
        .find(|e| e.player_id == quitter)
        .expect("quitter is ranked");
    assert_eq!((entry.played, entry.points, entry.losses), (3, 0, 3));
    // Three forfeits, each a loss on both sides.
    let losses: u32 = done.standings.iter().map(|e| e.losses).sum();
    let wins: u32 = done.standings.iter().map(|e| e.wins).sum();
    assert_eq!(losses, wins + 6);

    let history = system.player_history(0).await.unwrap();
    assert_eq!(history.len(), 3);
    for game in history {
        assert_eq!(game.result, MatchResult::TechnicalLoss);
        assert_eq!(game.points_earned, 0);
        assert_eq!(game.reason.as_deref(), Some("join_timeout"));
    }

    system.shutdown().await.unwrap();
}

/// Odd field: one player sits out each round.
#[tokio::test]
async fn test_five_player_league_uses_byes() {
    let mut system = LeagueSystem::start(config(5));
    system.add_referee().await.unwrap();
    system.add_referee().await.unwrap();
    for name in ["A", "B", "C", "D", "E"] {
        system.add_player(name, Box::new(RandomParity)).await.unwrap();
    }

    let done = timeout(LIMIT, system.wait_for_completion()).await.unwrap().unwrap();
    assert_eq!(done.total_rounds, 5);
    assert_eq!(done.matches_reported, 10);
    assert!(done.standings.iter().all(|e| e.played == 4));
    assert_eq!(done.referees, 2);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_player_queries_through_the_manager() {
    let mut system = LeagueSystem::start(LeagueConfig {
        start_wait_secs: 60,
        ..config(2)
    });
    system.add_referee().await.unwrap();
    system.add_player("Alice", Box::new(RandomParity)).await.unwrap();
    system.add_player("Bob", Box::new(RandomParity)).await.unwrap();
    assert!(matches!(
        system.snapshot().await.unwrap().state,
        LeagueState::Starting { .. }
    ));

    let standings = match system.players[0]
        .call(PlayerRequest::Query(QueryType::Standings))
        .await
        .unwrap()
    {
        PlayerReply::QueryResult(value) => value,
        other => panic!("unexpected reply {other:?}"),
    };
    assert_eq!(standings.as_array().map(Vec::len), Some(2));

    // The countdown is skipped; the single match is played right away.
    system.start_now().await.unwrap();
    let done = timeout(LIMIT, system.wait_for_completion()).await.unwrap().unwrap();
    assert_eq!(done.matches_reported, 1);
    assert!(done.champion.is_some());

    system.shutdown().await.unwrap();
}

/// The league starts before any referee exists; the first real referee to join picks up round one.
#[tokio::test]
async fn test_late_referee_resumes_stalled_league() {
    let mut system = LeagueSystem::start(LeagueConfig {
        min_referees: 0,
        ..config(2)
    });
    system.add_player("Alice", Box::new(RandomParity)).await.unwrap();
    system.add_player("Bob", Box::new(RandomParity)).await.unwrap();
    timeout(LIMIT, async {
        while !matches!(
            system.snapshot().await.unwrap().state,
            LeagueState::InProgress { .. }
        ) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("league started without referees");

    timeout(Duration::from_secs(5), system.add_referee())
        .await
        .expect("registration answered")
        .expect("referee registers");

    let done = timeout(LIMIT, system.wait_for_completion()).await.unwrap().unwrap();
    assert_eq!(done.matches_reported, 1);
    assert_eq!(done.referees, 1);
    assert!(done.standings.iter().all(|e| e.played == 1));

    system.shutdown().await.unwrap();
}
