use crate::league::LeagueError;
use crate::model::{
    AuthToken, Identity, Participant, PlayerId, PlayerRecord, RefereeId, RefereeRecord,
    UNKNOWN_NAME,
};
use crate::protocol::{PlayerMeta, RefereeMeta};
use std::collections::HashMap;
use tracing::{debug, info};

/// Outcome of one registration call.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration<I> {
    pub id: I,
    pub auth_token: AuthToken,
    /// `false` when an existing participant registered again.
    pub is_new: bool,
}

/// Who is in the league and which token each identity authenticates with.
///
/// Identifiers are handed out from monotonically increasing counters and are never
/// reused. A player whose sender identity already names a player id (`player:P07`)
/// keeps that id; the counter then skips past it so a minted id cannot collide.
#[derive(Debug)]
pub struct RegistrationLedger {
    players: HashMap<PlayerId, PlayerRecord>,
    player_order: Vec<PlayerId>,
    referees: HashMap<RefereeId, RefereeRecord>,
    referee_order: Vec<RefereeId>,
    next_player: u32,
    next_referee: u32,
    /// Sender identity string -> token.
    tokens: HashMap<String, AuthToken>,
}

impl Default for RegistrationLedger {
    fn default() -> Self {
        Self {
            players: HashMap::new(),
            player_order: Vec::new(),
            referees: HashMap::new(),
            referee_order: Vec::new(),
            next_player: 1,
            next_referee: 1,
            tokens: HashMap::new(),
        }
    }
}

impl RegistrationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_player(&mut self, sender: &str, meta: PlayerMeta) -> Registration<PlayerId> {
        let honored = sender
            .parse::<Identity>()
            .ok()
            .and_then(|identity| identity.player_id());

        let id = match honored {
            Some(id) => {
                self.next_player = self.next_player.max(id.0 + 1);
                id
            }
            None => {
                let id = PlayerId(self.next_player);
                self.next_player += 1;
                id
            }
        };

        let auth_token = AuthToken::generate();
        let record = Participant {
            id,
            display_name: meta.display_name.unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            endpoint: meta
                .contact_endpoint
                .unwrap_or_else(|| format!("unreachable://{id}")),
            auth_token: auth_token.clone(),
        };
        let is_new = self.players.insert(id, record).is_none();
        if is_new {
            self.player_order.push(id);
        }
        self.tokens
            .insert(Identity::player(id).to_string(), auth_token.clone());

        info!(player_id = %id, is_new, "Player registered");
        Registration {
            id,
            auth_token,
            is_new,
        }
    }

    pub fn register_referee(&mut self, meta: RefereeMeta) -> Registration<RefereeId> {
        let id = RefereeId(self.next_referee);
        self.next_referee += 1;

        let auth_token = AuthToken::generate();
        self.referees.insert(
            id,
            Participant {
                id,
                display_name: meta.display_name.unwrap_or_else(|| UNKNOWN_NAME.to_string()),
                endpoint: meta
                    .contact_endpoint
                    .unwrap_or_else(|| format!("unreachable://{id}")),
                auth_token: auth_token.clone(),
            },
        );
        self.referee_order.push(id);
        self.tokens
            .insert(Identity::referee(id).to_string(), auth_token.clone());

        info!(referee_id = %id, "Referee registered");
        Registration {
            id,
            auth_token,
            is_new: true,
        }
    }

    /// Checks that `token` is the one issued to `sender`.
    pub fn authorize(&self, sender: &str, token: Option<&AuthToken>) -> Result<Identity, LeagueError> {
        let identity: Identity = sender
            .parse()
            .map_err(|_| LeagueError::Unauthorized(format!("malformed sender {sender:?}")))?;
        match (self.tokens.get(sender), token) {
            (Some(expected), Some(given)) if expected == given => {
                debug!(%identity, "Authorized");
                Ok(identity)
            }
            (None, _) => Err(LeagueError::Unauthorized(format!("{sender} is not registered"))),
            _ => Err(LeagueError::Unauthorized(format!("bad token for {sender}"))),
        }
    }

    pub fn player(&self, id: PlayerId) -> Option<&PlayerRecord> {
        self.players.get(&id)
    }

    pub fn referee(&self, id: RefereeId) -> Option<&RefereeRecord> {
        self.referees.get(&id)
    }

    /// Player ids in registration order.
    pub fn player_ids(&self) -> &[PlayerId] {
        &self.player_order
    }

    /// Referee ids in registration order.
    pub fn referee_ids(&self) -> &[RefereeId] {
        &self.referee_order
    }

    pub fn player_count(&self) -> usize {
        self.player_order.len()
    }

    pub fn referee_count(&self) -> usize {
        self.referee_order.len()
    }
}
