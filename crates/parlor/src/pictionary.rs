//! The Pictionary client loop.
//!
//! A [`PictionaryClient`] owns one player's session, game state and
//! timers. Actions (`toggle_ready`, `guess`, ...) apply locally and send;
//! [`PictionaryClient::step`] waits for whatever happens next: a peer
//! message, a countdown tick or the scoreboard delay.
//!
//! On the host, every message goes through [`RoundHost`] and comes back
//! as a list of [`Effect`]s that this module executes in order. Guests
//! run the same executor on what [`guest_dispatch`] returns.

use parlor_game::pictionary::{
    self, DrawingEvent, Effect, GameState, PictionaryMessage, RoundHost, guest_dispatch,
};
use parlor_game::{GameError, Phase};
use parlor_protocol::{JsonCodec, PeerId, Role, RoomCode};
use parlor_providers::WordPicker;
use parlor_session::{PeerSession, Rendezvous, SessionEvent};
use parlor_timer::{Countdown, Delay, Tick};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{ClientConfig, ClientUpdate, ParlorError};

/// An input [`PictionaryClient::wait`] received and
/// [`PictionaryClient::handle`] has not processed yet.
pub struct Wake(Source);

enum Source {
    Session(Option<SessionEvent<PictionaryMessage>>),
    Tick(Tick),
    Scoreboard,
}

/// One Pictionary player, host or guest.
pub struct PictionaryClient<R: Rendezvous> {
    session: PeerSession<PictionaryMessage, R>,
    events: mpsc::Receiver<SessionEvent<PictionaryMessage>>,
    state: GameState,
    host: RoundHost,
    words: WordPicker,
    word_providers: Vec<String>,
    countdown: Countdown,
    scoreboard: Delay<()>,
    rng: StdRng,
}

impl<R: Rendezvous> PictionaryClient<R> {
    /// Creates an idle client with a random peer id and the default word
    /// providers.
    ///
    /// # Errors
    /// [`ParlorError::Provider`] if the HTTP client cannot be built.
    pub fn new(rendezvous: R, config: ClientConfig) -> Result<Self, ParlorError> {
        let words = WordPicker::with_defaults(parlor_providers::http::client()?);
        let mut rng = StdRng::from_os_rng();
        let local_id = PeerId::generate(&mut rng);
        Ok(Self::with_parts(local_id, rendezvous, words, config))
    }

    /// Creates an idle client from explicit parts.
    pub fn with_parts(
        local_id: PeerId,
        rendezvous: R,
        words: WordPicker,
        config: ClientConfig,
    ) -> Self {
        let (session, events) =
            PeerSession::with_parts(local_id.clone(), rendezvous, JsonCodec, config.session);
        Self {
            session,
            events,
            state: GameState::new(),
            countdown: Countdown::new(config.pictionary.round_duration_secs),
            host: RoundHost::new(config.pictionary, local_id),
            words,
            word_providers: config.word_providers,
            scoreboard: Delay::new(),
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn state(&self) -> &GameState {
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

    fn require_host(&self, action: &'static str) -> Result<(), ParlorError> {
        if self.is_host() {
            Ok(())
        } else {
            Err(ParlorError::NotHost(action))
        }
    }

    // -----------------------------------------------------------------------
    // Room
    // -----------------------------------------------------------------------

    /// Opens a room. The outcome arrives from [`step`](Self::step) as
    /// [`ClientUpdate::RoomReady`] or a [`ClientUpdate::Notice`].
    pub async fn create_room(&mut self) {
        self.session.create_room().await;
    }

    /// Joins the room registered under `code`. Reports like
    /// [`create_room`](Self::create_room).
    pub async fn join_room(&mut self, code: RoomCode) {
        self.session.join_room(code).await;
    }

    /// Leaves the room and returns to the menu. Guests of a leaving host
    /// are told the session closed.
    pub async fn leave(&mut self) {
        self.stop_timers();
        self.session.cleanup().await;
        self.state.reset();
        info!(local_id = %self.session.local_id(), "left room");
    }

    // -----------------------------------------------------------------------
    // Player actions
    // -----------------------------------------------------------------------

    pub async fn toggle_ready(&mut self) -> Result<(), ParlorError> {
        match pictionary::toggle_ready(&mut self.state, self.session.local_id()) {
            Some(msg) => self.publish(msg).await,
            None => Ok(()),
        }
    }

    /// Renames the local player. Blank names are ignored.
    pub async fn rename(&mut self, name: &str) -> Result<(), ParlorError> {
        match pictionary::rename(&mut self.state, self.session.local_id(), name) {
            Some(msg) => self.publish(msg).await,
            None => Ok(()),
        }
    }

    /// Records a stroke or clear. Ignored unless we are the active drawer.
    pub async fn draw(&mut self, event: DrawingEvent) -> Result<(), ParlorError> {
        match pictionary::draw(&mut self.state, self.session.local_id(), event) {
            Some(msg) => self.publish(msg).await,
            None => Ok(()),
        }
    }

    /// Submits a guess. The host judges its own guesses directly.
    pub async fn guess(&mut self, text: &str) -> Result<(), ParlorError> {
        let me = self.session.local_id().clone();
        if self.is_host() {
            let effects = self.host.guess(&mut self.state, &me, text);
            self.execute(effects).await;
            return Ok(());
        }
        self.publish(PictionaryMessage::Guess {
            player_id: me,
            guess: text.to_string(),
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Host actions
    // -----------------------------------------------------------------------

    /// Starts the first round once at least two players are in the lobby
    /// and all of them are ready.
    ///
    /// # Errors
    /// [`ParlorError::NotHost`] for guests, [`ParlorError::PlayersNotReady`]
    /// while someone is missing or unready, [`ParlorError::Game`] outside
    /// the lobby.
    pub async fn start_game(&mut self) -> Result<(), ParlorError> {
        self.require_host("start a round")?;
        self.require_phase(Phase::Lobby, Phase::Drawing)?;
        if self.state.players().len() < 2 || !self.state.all_ready() {
            return Err(ParlorError::PlayersNotReady);
        }
        let word = self.words.pick(&self.word_providers).await;
        let effects = self.host.start_round(&mut self.state, &word, &mut self.rng)?;
        self.execute(effects).await;
        Ok(())
    }

    /// From the scoreboard, starts the next round with a new drawer.
    pub async fn continue_game(&mut self) -> Result<(), ParlorError> {
        self.require_host("continue the game")?;
        self.require_phase(Phase::Scoreboard, Phase::Lobby)?;
        let word = self.words.pick(&self.word_providers).await;
        let effects = self.host.continue_game(&mut self.state, &word, &mut self.rng)?;
        self.execute(effects).await;
        Ok(())
    }

    /// From the scoreboard, ends the game for everyone and closes the room.
    pub async fn finish_game(&mut self) -> Result<(), ParlorError> {
        self.require_host("finish the game")?;
        let effects = self.host.finish(&mut self.state)?;
        self.execute(effects).await;
        Ok(())
    }

    fn require_phase(&self, from: Phase, to: Phase) -> Result<(), ParlorError> {
        let phase = self.state.phase();
        if phase == from {
            Ok(())
        } else {
            Err(GameError::InvalidTransition { from: phase, to }.into())
        }
    }

    // -----------------------------------------------------------------------
    // Event loop
    // -----------------------------------------------------------------------

    /// Waits for the next thing worth showing.
    ///
    /// Inputs that change nothing visible (a handshake, a stale message)
    /// are absorbed and the wait continues. Not cancel safe once an input
    /// is being handled; front-ends that race the client against their
    /// own input should use [`wait`](Self::wait) and
    /// [`handle`](Self::handle) instead.
    pub async fn step(&mut self) -> ClientUpdate {
        loop {
            let wake = self.wait().await;
            if let Some(update) = self.handle(wake).await {
                return update;
            }
        }
    }

    /// Waits for a session event, a countdown tick or the scoreboard
    /// delay. Cancel safe.
    pub async fn wait(&mut self) -> Wake {
        let source = tokio::select! {
            event = self.events.recv() => Source::Session(event),
            tick = self.countdown.tick() => Source::Tick(tick),
            () = self.scoreboard.fired() => Source::Scoreboard,
        };
        Wake(source)
    }

    /// Processes one input from [`wait`](Self::wait). Returns `None` when
    /// nothing visible changed.
    pub async fn handle(&mut self, wake: Wake) -> Option<ClientUpdate> {
        match wake.0 {
            Source::Session(Some(event)) => self.on_session_event(event).await,
            Source::Session(None) => Some(ClientUpdate::SessionEnded),
            Source::Tick(tick) => Some(self.on_tick(tick).await),
            Source::Scoreboard => {
                let effects = self.host.scoreboard_due(&mut self.state);
                if effects.is_empty() {
                    return None;
                }
                self.execute(effects).await;
                Some(ClientUpdate::StateChanged)
            }
        }
    }

    async fn on_session_event(
        &mut self,
        event: SessionEvent<PictionaryMessage>,
    ) -> Option<ClientUpdate> {
        // Anything still queued from a room we already left.
        if !self.session.is_active() && !matches!(event, SessionEvent::Error(_)) {
            debug!("dropping event from a closed session");
            return None;
        }

        match event {
            SessionEvent::RoomReady { code } => {
                self.host.open_lobby(&mut self.state);
                Some(ClientUpdate::RoomReady(code))
            }
            SessionEvent::PeerJoined(peer) => {
                let effects = self.host.peer_connected(&self.state, &peer);
                self.execute(effects).await;
                None
            }
            SessionEvent::Connected { host } => {
                self.state.reset();
                self.state.set_phase(Phase::Lobby);
                let hello = pictionary::introduce(&mut self.state, self.session.local_id());
                if let Err(e) = self.session.broadcast(&hello).await {
                    return Some(self.abandon(format!("could not introduce ourselves: {e}")).await);
                }
                info!(%host, "joined lobby");
                self.session.room_code().cloned().map(ClientUpdate::RoomReady)
            }
            SessionEvent::Message { from, message } => {
                let outcome = if self.is_host() {
                    self.host.handle_message(&mut self.state, &from, &message)
                } else {
                    guest_dispatch(&mut self.state, &message)
                };
                if !outcome.recognized {
                    debug!(%from, ?message, "ignoring unrecognized message");
                    return None;
                }
                if self.execute(outcome.effects).await {
                    Some(ClientUpdate::SessionEnded)
                } else {
                    Some(ClientUpdate::StateChanged)
                }
            }
            SessionEvent::PeerLeft(peer) => {
                let effects = self.host.peer_left(&mut self.state, &peer);
                self.execute(effects).await;
                Some(ClientUpdate::StateChanged)
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

    async fn on_tick(&mut self, tick: Tick) -> ClientUpdate {
        self.state.set_time_remaining(tick.remaining);
        if tick.expired && self.is_host() {
            let effects = self.host.timeout(&mut self.state);
            self.execute(effects).await;
            return ClientUpdate::StateChanged;
        }
        ClientUpdate::Tick(tick.remaining)
    }

    /// Runs effects in order. Returns `true` if one of them closed the
    /// session.
    async fn execute(&mut self, effects: Vec<Effect>) -> bool {
        let mut ended = false;
        for effect in effects {
            match effect {
                Effect::Send(to, msg) => {
                    if let Err(e) = self.session.send(&to, &msg).await {
                        warn!(?to, error = %e, "could not send");
                    }
                }
                Effect::StartCountdown(secs) => {
                    self.countdown.reset(Some(secs));
                    self.countdown.start();
                    self.state.set_time_remaining(secs);
                }
                Effect::StopCountdown => self.countdown.stop(),
                Effect::ScheduleScoreboard(after) => {
                    self.scoreboard.schedule(after, ());
                }
                Effect::CancelScoreboard => {
                    self.scoreboard.cancel();
                }
                Effect::EndSession => {
                    self.stop_timers();
                    self.session.cleanup().await;
                    self.state.reset();
                    ended = true;
                }
            }
        }
        ended
    }

    /// Sends a locally applied message to the rest of the room.
    async fn publish(&self, msg: PictionaryMessage) -> Result<(), ParlorError> {
        self.session.broadcast(&msg).await?;
        Ok(())
    }

    /// Drops the room after a failure and tells the player why.
    async fn abandon(&mut self, reason: String) -> ClientUpdate {
        warn!(%reason, "leaving room");
        self.leave().await;
        ClientUpdate::Notice(reason)
    }

    fn stop_timers(&mut self) {
        self.countdown.stop();
        self.scoreboard.cancel();
    }
}
