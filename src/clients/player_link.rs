use crate::clients::WireClient;
use crate::model::{Identity, MatchId, ParityChoice, PlayerId};
use crate::protocol::{ChooseParityCall, GameInvitation, GameOver, Message, ProtocolError, Reply};
use crate::referee::MatchError;
use crate::transport::{Transport, TransportError};
use std::sync::Arc;
use tracing::instrument;

/// Referee-side client for the two players of a match.
#[derive(Clone)]
pub struct PlayerLink {
    transport: Arc<dyn Transport>,
    identity: Identity,
}

impl WireClient for PlayerLink {
    type Error = MatchError;

    fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    fn identity(&self) -> &Identity {
        &self.identity
    }
}

fn unexpected(expected: &'static str, reply: &Reply) -> MatchError {
    MatchError::DeliveryFailure(TransportError::Codec(ProtocolError::UnexpectedReply {
        expected,
        got: reply.kind().to_string(),
    }))
}

impl PlayerLink {
    pub fn new(transport: Arc<dyn Transport>, identity: Identity) -> Self {
        Self {
            transport,
            identity,
        }
    }

    /// Sends the join invitation; succeeds only on an accepting `GAME_JOIN_ACK`.
    #[instrument(skip(self, invitation), fields(match_id = %invitation.match_id))]
    pub async fn invite(&self, player: PlayerId, endpoint: &str, invitation: GameInvitation) -> Result<(), MatchError> {
        let match_id = invitation.match_id;
        match self.request(endpoint, Message::GameInvitation(invitation)).await? {
            Reply::GameJoinAck(ack) if ack.match_id == match_id && ack.accepted => Ok(()),
            Reply::GameJoinAck(ack) => Err(MatchError::JoinTimeout {
                player,
                detail: format!("declined {} (accepted = {})", ack.match_id, ack.accepted),
            }),
            other => Err(unexpected("GAME_JOIN_ACK", &other)),
        }
    }

    /// Asks for a parity choice and validates the answer.
    #[instrument(skip(self, call), fields(match_id = %call.match_id))]
    pub async fn choose_parity(&self, player: PlayerId, endpoint: &str, call: ChooseParityCall) -> Result<ParityChoice, MatchError> {
        let match_id: MatchId = call.match_id;
        match self.request(endpoint, Message::ChooseParityCall(call)).await? {
            Reply::ChooseParityResponse(response) if response.match_id == match_id => response
                .parity_choice
                .parse()
                .map_err(|_| MatchError::InvalidChoiceValue {
                    player,
                    value: response.parity_choice,
                }),
            Reply::ChooseParityResponse(response) => Err(MatchError::InvalidChoiceValue {
                player,
                value: format!("answer for {}", response.match_id),
            }),
            other => Err(unexpected("CHOOSE_PARITY_RESPONSE", &other)),
        }
    }

    #[instrument(skip(self, game_over), fields(match_id = %game_over.match_id))]
    pub async fn game_over(&self, endpoint: &str, game_over: GameOver) -> Result<(), MatchError> {
        self.request(endpoint, Message::GameOver(game_over)).await?;
        Ok(())
    }
}
