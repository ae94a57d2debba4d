use crate::clients::LeagueClient;
use crate::config::LeagueConfig;
use crate::framework::AgentClient;
use crate::league::{LeagueError, LeagueManager, LeagueSnapshot, ManagerContext, ManagerReply, ManagerRequest};
use crate::model::{Identity, LeagueState, PlayerId, RefereeId, Role};
use crate::player::{ParityStrategy, PlayerAgent, PlayerContext, PlayerReply, PlayerRequest};
use crate::protocol::GameOver;
use crate::referee::{EvenOddRule, GameRule, MatchTimeouts, RefereeAgent, RefereeContext, RefereeReply, RefereeRequest};
use crate::transport::{LocalNetwork, Transport};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

/// A whole league (manager, referees, players) wired onto one [`LocalNetwork`].
pub struct LeagueSystem {
    config: LeagueConfig,
    network: Arc<LocalNetwork>,
    rule: Arc<dyn GameRule>,
    pub manager: AgentClient<LeagueManager>,
    pub referees: Vec<AgentClient<RefereeAgent>>,
    pub players: Vec<AgentClient<PlayerAgent>>,
    status: watch::Receiver<LeagueSnapshot>,
    handles: Vec<JoinHandle<()>>,
}

fn unexpected<T: std::fmt::Debug>(reply: T) -> LeagueError {
    LeagueError::AgentCommunicationError(format!("unexpected reply {reply:?}"))
}

impl LeagueSystem {
    /// Spawns the manager and binds it at `config.manager_endpoint`.
    pub fn start(config: LeagueConfig) -> Self {
        Self::with_rule(config, Arc::new(EvenOddRule::new()))
    }

    pub fn with_rule(config: LeagueConfig, rule: Arc<dyn GameRule>) -> Self {
        let mut network = LocalNetwork::new();
        if let Some(limit) = config.request_timeout() {
            network = network.with_request_timeout(limit);
        }
        let network = Arc::new(network);

        let (server, manager, status) = LeagueManager::spawnable(config.clone());
        let context = ManagerContext {
            transport: network.clone(),
            self_client: manager.clone(),
        };
        let handle = tokio::spawn(server.run(context));
        network.bind(config.manager_endpoint.clone(), Arc::new(manager.clone()));
        info!(endpoint = %config.manager_endpoint, "League manager listening");

        Self {
            config,
            network,
            rule,
            manager,
            referees: Vec::new(),
            players: Vec::new(),
            status,
            handles: vec![handle],
        }
    }

    pub fn network(&self) -> Arc<LocalNetwork> {
        self.network.clone()
    }

    fn league_client(&self, provisional: Identity) -> LeagueClient {
        let transport: Arc<dyn Transport> = self.network.clone();
        LeagueClient::new(transport, self.config.manager_endpoint.clone(), provisional)
    }

    /// Spawns a referee, binds its endpoint and registers it with the manager.
    pub async fn add_referee(&mut self) -> Result<RefereeId, LeagueError> {
        let n = self.referees.len() + 1;
        let endpoint = format!("local://referee-{n}");
        let timeouts = MatchTimeouts {
            join: self.config.join_timeout(),
            choice: self.config.choice_timeout(),
        };
        let (server, client) = RefereeAgent::new(format!("Referee {n}"), endpoint.clone(), self.rule.clone(), timeouts)
            .with_max_concurrent_matches(self.config.referee_max_concurrent_matches)
            .spawnable(self.config.mailbox_capacity);
        let context = RefereeContext {
            transport: self.network.clone(),
            league: self.league_client(Identity {
                role: Role::Referee,
                name: format!("referee-{n}"),
            }),
            self_client: client.clone(),
        };
        self.handles.push(tokio::spawn(server.run(context)));
        self.network.bind(endpoint, Arc::new(client.clone()));
        self.referees.push(client.clone());

        match client.call(RefereeRequest::Register).await.map_err(|e| e.to_string())? {
            RefereeReply::Registered(id) => Ok(id),
            other => Err(unexpected(other)),
        }
    }

    /// Spawns a player, binds its endpoint and registers it with the manager.
    pub async fn add_player(&mut self, name: &str, strategy: Box<dyn ParityStrategy>) -> Result<PlayerId, LeagueError> {
        self.add_player_agent(|endpoint| PlayerAgent::new(name, endpoint, strategy)).await
    }

    /// Like [`add_player`](Self::add_player) for a pre-configured agent.
    pub async fn add_player_agent(&mut self, build: impl FnOnce(String) -> PlayerAgent) -> Result<PlayerId, LeagueError> {
        let n = self.players.len() + 1;
        let endpoint = format!("local://player-{n}");
        let (server, client) = build(endpoint.clone()).spawnable(self.config.mailbox_capacity);
        let context = PlayerContext {
            league: self.league_client(Identity {
                role: Role::Player,
                name: format!("player-{n}"),
            }),
        };
        self.handles.push(tokio::spawn(server.run(context)));
        self.network.bind(endpoint, Arc::new(client.clone()));
        self.players.push(client.clone());

        match client.call(PlayerRequest::Register).await.map_err(|e| e.to_string())? {
            PlayerReply::Registered(id) => Ok(id),
            other => Err(unexpected(other)),
        }
    }

    pub async fn snapshot(&self) -> Result<LeagueSnapshot, LeagueError> {
        match self.manager.call(ManagerRequest::Snapshot).await.map_err(|e| e.to_string())? {
            ManagerReply::Snapshot(snapshot) => Ok(snapshot),
            other => Err(unexpected(other)),
        }
    }

    /// Skips the start countdown.
    pub async fn start_now(&self) -> Result<(), LeagueError> {
        self.manager
            .call(ManagerRequest::StartNow)
            .await
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    /// Resolves once the manager reports the league as completed.
    pub async fn wait_for_completion(&mut self) -> Result<LeagueSnapshot, LeagueError> {
        let snapshot = self
            .status
            .wait_for(|s| s.state == LeagueState::Completed)
            .await
            .map_err(|_| LeagueError::AgentCommunicationError("league manager stopped".to_string()))?;
        Ok(snapshot.clone())
    }

    pub async fn player_history(&self, index: usize) -> Result<Vec<GameOver>, LeagueError> {
        let client = self
            .players
            .get(index)
            .ok_or_else(|| LeagueError::AgentCommunicationError(format!("no player #{index}")))?;
        match client.call(PlayerRequest::History).await.map_err(|e| e.to_string())? {
            PlayerReply::History(history) => Ok(history),
            other => Err(unexpected(other)),
        }
    }

    /// Stops every agent and waits for their tasks.
    ///
    /// Agents hold clients to their own mailbox (and the network holds clients to
    /// all of them), so channel closure alone never ends them: each gets an
    /// explicit `Shutdown`.
    pub async fn shutdown(self) -> Result<(), String> {
        for endpoint in self.network.endpoints() {
            self.network.unbind(&endpoint);
        }
        for player in &self.players {
            player.shutdown().await.map_err(|e| e.to_string())?;
        }
        for referee in &self.referees {
            referee.shutdown().await.map_err(|e| e.to_string())?;
        }
        self.manager.shutdown().await.map_err(|e| e.to_string())?;

        for handle in self.handles {
            handle.await.map_err(|e| e.to_string())?;
        }
        info!("League system shut down");
        Ok(())
    }
}
