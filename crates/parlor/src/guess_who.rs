//! The Guess-Who client loop.
//!
//! Two players only. The host deals as soon as the guest says it is
//! ready, and again on [`GuessWhoClient::new_game`]; everything else is
//! symmetric: each side crosses characters out on its own board and
//! mirrors the opponent's set.

use parlor_game::guess_who::{
    self, Effect, GuessWhoMessage, GuessWhoState, guest_dispatch, host_dispatch,
};
use parlor_protocol::{JsonCodec, PeerId, Role, RoomCode};
use parlor_providers::CharacterPool;
use parlor_session::{PeerSession, Rendezvous, SessionEvent};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{ClientConfig, ClientUpdate, ParlorError};

/// One Guess-Who player, host or guest.
pub struct GuessWhoClient<R: Rendezvous> {
    session: PeerSession<GuessWhoMessage, R>,
    events: mpsc::Receiver<SessionEvent<GuessWhoMessage>>,
    state: GuessWhoState,
    characters: CharacterPool,
    character_providers: Vec<String>,
    /// Host: the guest we play against. Later arrivals are ignored.
    opponent: Option<PeerId>,
    /// Survives resets and is re-announced in every new room.
    name: Option<String>,
    rng: StdRng,
}

impl<R: Rendezvous> GuessWhoClient<R> {
    /// Creates an idle client with a random peer id and every character
    /// source available.
    ///
    /// # Errors
    /// [`ParlorError::Provider`] if the HTTP client cannot be built.
    pub fn new(rendezvous: R, config: ClientConfig) -> Result<Self, ParlorError> {
        let pool = CharacterPool::with_defaults(
            parlor_providers::http::client()?,
            config.guess_who.board_size,
        );
        let mut rng = StdRng::from_os_rng();
        let local_id = PeerId::generate(&mut rng);
        Ok(Self::with_parts(local_id, rendezvous, pool, config))
    }

    pub fn with_parts(
        local_id: PeerId,
        rendezvous: R,
        characters: CharacterPool,
        config: ClientConfig,
    ) -> Self {
        let (session, events) =
            PeerSession::with_parts(local_id, rendezvous, JsonCodec, config.session);
        Self {
            session,
            events,
            state: GuessWhoState::new(),
            characters,
            character_providers: config.character_providers,
            opponent: None,
            name: None,
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn state(&self) -> &GuessWhoState {
        &self.state
    }

    pub fn role(&self) -> Option<Role> {
        self.session.role()
    }

    pub fn local_id(&self) -> &PeerId {
        self.session.local_id()
    }

    pub fn room_code(&self) -> Option<&RoomCode> {
        self.session.room_code()
    }

    fn is_host(&self) -> bool {
        self.session.role().is_some_and(Role::is_host)
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    pub async fn create_room(&mut self) {
        self.session.create_room().await;
    }

    /// Joins a room. Once the host accepts, we announce we are ready and
    /// the host deals.
    pub async fn join_room(&mut self, code: RoomCode) {
        self.session.join_room(code).await;
    }

    pub async fn leave(&mut self) {
        self.session.cleanup().await;
        self.opponent = None;
        self.state.reset();
        info!(local_id = %self.session.local_id(), "left room");
    }

    /// Crosses a character out on our board, or back in.
    ///
    /// # Errors
    /// [`ParlorError::Game`] when no game has been dealt.
    pub async fn toggle_cross_out(&mut self, id: u32) -> Result<(), ParlorError> {
        let sync = self.state.toggle_cross_out(id)?;
        self.publish(&sync).await
    }

    /// Sets our display name and tells the opponent, if there is one.
    /// Blank names are ignored.
    pub async fn set_name(&mut self, name: &str) -> Result<(), ParlorError> {
        let Some(update) = self.state.set_my_name(name) else {
            return Ok(());
        };
        self.name = Some(self.state.my_name().to_string());
        if self.session.is_active() {
            self.publish(&update).await?;
        }
        Ok(())
    }

    pub fn add_win_to_me(&mut self) {
        self.state.add_win_to_me();
    }

    pub fn add_win_to_opponent(&mut self) {
        self.state.add_win_to_opponent();
    }

    /// Deals a fresh game to both players.
    ///
    /// # Errors
    /// [`ParlorError::NotHost`] for guests, [`ParlorError::NoOpponent`]
    /// before a guest has joined.
    pub async fn new_game(&mut self) -> Result<(), ParlorError> {
        if !self.is_host() {
            return Err(ParlorError::NotHost("deal a new game"));
        }
        if self.opponent.is_none() {
            return Err(ParlorError::NoOpponent);
        }
        self.deal().await
    }

    async fn deal(&mut self) -> Result<(), ParlorError> {
        let characters = self.characters.fetch(&self.character_providers).await;
        let deal = guess_who::deal(&characters, &mut self.rng)?;
        let start = self.state.begin_as_host(deal);
        self.publish(&start).await?;
        info!(board = characters.len(), "dealt new game");
        Ok(())
    }

    async fn publish(&self, msg: &GuessWhoMessage) -> Result<(), ParlorError> {
        self.session.broadcast(msg).await?;
        Ok(())
    }

    /// Re-announces a name chosen before this room existed.
    async fn announce_name(&mut self) {
        let Some(name) = self.name.clone() else {
            return;
        };
        if let Some(update) = self.state.set_my_name(&name) {
            if let Err(e) = self.publish(&update).await {
                warn!(error = %e, "could not send name");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Event loop
    // -----------------------------------------------------------------------

    /// Waits for the next thing worth showing.
    pub async fn step(&mut self) -> ClientUpdate {
        loop {
            let Some(event) = self.events.recv().await else {
                return ClientUpdate::SessionEnded;
            };
            if let Some(update) = self.on_session_event(event).await {
                return update;
            }
        }
    }

    async fn on_session_event(
        &mut self,
        event: SessionEvent<GuessWhoMessage>,
    ) -> Option<ClientUpdate> {
        if !self.session.is_active() && !matches!(event, SessionEvent::Error(_)) {
            debug!("dropping event from a closed session");
            return None;
        }

        match event {
            SessionEvent::RoomReady { code } => {
                self.state.enter_waiting();
                Some(ClientUpdate::RoomReady(code))
            }
            SessionEvent::PeerJoined(peer) => {
                if let Some(current) = &self.opponent {
                    warn!(%peer, opponent = %current, "room already has an opponent");
                    return None;
                }
                info!(%peer, "opponent joined");
                self.opponent = Some(peer);
                self.announce_name().await;
                Some(ClientUpdate::StateChanged)
            }
            SessionEvent::Connected { host } => {
                self.state.enter_waiting();
                self.opponent = Some(host);
                if let Err(e) = self.publish(&GuessWhoMessage::Ready).await {
                    return Some(self.abandon(format!("could not reach host: {e}")).await);
                }
                self.announce_name().await;
                self.session.room_code().cloned().map(ClientUpdate::RoomReady)
            }
            SessionEvent::Message { from, message } => {
                if self.opponent.as_ref() != Some(&from) {
                    debug!(%from, "message from a peer we are not playing");
                    return None;
                }
                let outcome = if self.is_host() {
                    host_dispatch(&mut self.state, &from, &message)
                } else {
                    guest_dispatch(&mut self.state, &message)
                };
                if !outcome.recognized {
                    debug!(%from, ?message, "ignoring unrecognized message");
                    return None;
                }
                for effect in outcome.effects {
                    match effect {
                        Effect::Send(to, msg) => {
                            if let Err(e) = self.session.send(&to, &msg).await {
                                warn!(?to, error = %e, "could not send");
                            }
                        }
                        Effect::Deal => {
                            if let Err(e) = self.deal().await {
                                warn!(error = %e, "deal failed");
                                return Some(ClientUpdate::Notice(format!("could not deal: {e}")));
                            }
                        }
                    }
                }
                Some(ClientUpdate::StateChanged)
            }
            SessionEvent::PeerLeft(peer) => {
                if self.opponent.as_ref() != Some(&peer) {
                    return None;
                }
                Some(self.abandon("Player disconnected".to_string()).await)
            }
            SessionEvent::Disconnected => {
                Some(self.abandon("Disconnected from host".to_string()).await)
            }
            SessionEvent::Error(e) if self.session.is_active() => {
                warn!(error = %e, "session error");
                Some(ClientUpdate::Notice(e.to_string()))
            }
            SessionEvent::Error(e) => Some(self.abandon(e.to_string()).await),
        }
    }

    /// Drops the room after the other side went away or a failure.
    async fn abandon(&mut self, reason: String) -> ClientUpdate {
        warn!(%reason, "leaving room");
        self.leave().await;
        ClientUpdate::Notice(reason)
    }
}
