//! Game sessions and the computer's turns.
//!
//! Sessions live in a concurrent map keyed by id. Every mutation happens
//! inside a short synchronous section holding the map entry; no entry is held
//! across an await. Delayed computer moves carry only the session id and
//! re-validate everything when they fire.

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use parking_lot::Mutex;
use rand::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ai::{create_ai, ComputerPlayer};
use crate::config::GameSettings;
use crate::domain::render::render_session;
use crate::domain::{
    hint_for, ActionToken, Actor, Board, ChannelId, Difficulty, GameAction, GameMode, GameSession,
    Hint, Mark, MemberId, MoveRecord, SecondSeat, SessionId, SessionRequest, SessionStatus, Tally,
};
use crate::errors::domain::DomainError;
use crate::gateway::Gateway;
use crate::infra::scheduler::schedule_after;

/// Builds the computer player for a difficulty. The seed is drawn from the
/// service RNG, so a seeded service replays identically.
pub type ComputerFactory = Arc<dyn Fn(Difficulty, u64) -> Box<dyn ComputerPlayer> + Send + Sync>;

/// Serializable snapshot returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub mode: GameMode,
    pub player_a: MemberId,
    pub player_b: SecondSeat,
    pub board: Board,
    pub to_move: Mark,
    pub status: SessionStatus,
    pub tally: Tally,
    pub hint: Option<Hint>,
    pub rendered: String,
}

impl From<&GameSession> for SessionView {
    fn from(session: &GameSession) -> Self {
        let hint = if session.is_active() {
            hint_for(session.board(), session.to_move())
        } else {
            None
        };
        Self {
            session_id: session.id(),
            mode: session.mode(),
            player_a: session.player_a(),
            player_b: session.second_seat(),
            board: *session.board(),
            to_move: session.to_move(),
            status: session.status(),
            tally: session.tally(),
            hint,
            rendered: render_session(session),
        }
    }
}

pub struct GameService {
    settings: GameSettings,
    sessions: DashMap<SessionId, GameSession>,
    rng: Mutex<StdRng>,
    computer: ComputerFactory,
    gateway: Arc<dyn Gateway>,
    me: Weak<GameService>,
}

impl GameService {
    pub fn new(settings: GameSettings, gateway: Arc<dyn Gateway>) -> Arc<Self> {
        Self::with_computer(
            settings,
            gateway,
            Arc::new(|difficulty: Difficulty, seed: u64| create_ai(difficulty, Some(seed))),
        )
    }

    pub fn with_computer(
        settings: GameSettings,
        gateway: Arc<dyn Gateway>,
        computer: ComputerFactory,
    ) -> Arc<Self> {
        let rng = match settings.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Arc::new_cyclic(|me| Self {
            settings,
            sessions: DashMap::new(),
            rng: Mutex::new(rng),
            computer,
            gateway,
            me: me.clone(),
        })
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn get(&self, id: SessionId) -> Result<SessionView, DomainError> {
        self.sessions
            .get(&id)
            .map(|s| SessionView::from(&*s))
            .ok_or_else(|| DomainError::session_not_found(id))
    }

    /// Run `f` against the live session. The entry is released before returning.
    fn with_session<T>(
        &self,
        id: SessionId,
        f: impl FnOnce(&mut GameSession) -> Result<T, DomainError>,
    ) -> Result<(T, SessionView), DomainError> {
        let mut entry = self
            .sessions
            .get_mut(&id)
            .ok_or_else(|| DomainError::session_not_found(id))?;
        let out = f(entry.value_mut())?;
        Ok((out, SessionView::from(&*entry)))
    }

    /// Open a session. Human-vs-computer games roll who opens; when the
    /// computer does, its move is scheduled after the opening delay.
    pub fn create_session(&self, request: SessionRequest) -> Result<SessionView, DomainError> {
        let computer_first = matches!(request.mode, GameMode::HumanVsComputer(_))
            && self
                .rng
                .lock()
                .random_bool(self.settings.computer_first_chance);
        let first = if computer_first { Mark::O } else { Mark::X };

        let session = GameSession::open(SessionId::generate(), request, first)?;
        let id = session.id();
        let view = SessionView::from(&session);
        self.sessions.insert(id, session);
        info!(session = %id, mode = ?view.mode, computer_first, "game session opened");

        if computer_first {
            self.schedule_computer(id, self.settings.computer_first_delay);
        }
        Ok(view)
    }

    pub fn accept(&self, id: SessionId, actor: MemberId) -> Result<SessionView, DomainError> {
        let ((), view) = self.with_session(id, |s| s.accept(actor))?;
        info!(session = %id, member = %actor, "invitation accepted");
        Ok(view)
    }

    /// Decline a pending invitation; the session is discarded.
    pub fn decline(&self, id: SessionId, actor: MemberId) -> Result<SessionView, DomainError> {
        let ((), view) = self.with_session(id, |s| s.decline(actor))?;
        self.sessions.remove(&id);
        info!(session = %id, member = %actor, "invitation declined");
        Ok(view)
    }

    pub fn apply_move(
        &self,
        id: SessionId,
        actor: MemberId,
        cell: u8,
    ) -> Result<SessionView, DomainError> {
        let (record, view) = self.with_session(id, |s| s.apply_move(Actor::Member(actor), cell))?;
        debug!(session = %id, member = %actor, cell, verdict = ?record.verdict, "move applied");
        self.after_move(id, &view);
        Ok(view)
    }

    pub fn reset(&self, id: SessionId, actor: MemberId) -> Result<SessionView, DomainError> {
        let ((), view) = self.with_session(id, |s| s.reset(actor))?;
        info!(session = %id, member = %actor, "board reset");
        self.after_move(id, &view);
        Ok(view)
    }

    /// Close the session whoever asks and return its final state. A pending
    /// computer turn finds it gone.
    pub fn quit(&self, id: SessionId, actor: MemberId) -> Result<SessionView, DomainError> {
        let (_, session) = self
            .sessions
            .remove(&id)
            .ok_or_else(|| DomainError::session_not_found(id))?;
        let view = SessionView::from(&session);
        info!(session = %id, member = %actor, "game session closed");
        Ok(view)
    }

    /// Route a button token to the matching operation.
    pub fn handle_action(&self, actor: MemberId, raw_token: &str) -> Result<SessionView, DomainError> {
        let token: ActionToken = raw_token.parse()?;
        match token.action {
            GameAction::Accept => self.accept(token.session, actor),
            GameAction::Decline => self.decline(token.session, actor),
            GameAction::Reset => self.reset(token.session, actor),
            GameAction::Quit => self.quit(token.session, actor),
            GameAction::Move(cell) => self.apply_move(token.session, actor, cell),
        }
    }

    fn after_move(&self, id: SessionId, view: &SessionView) {
        if view.status == SessionStatus::Active
            && view.to_move == Mark::O
            && view.player_b == SecondSeat::Computer
        {
            self.schedule_computer(id, self.settings.computer_delay);
        }
    }

    fn schedule_computer(&self, id: SessionId, delay: std::time::Duration) {
        let me = self.me.clone();
        schedule_after(delay, "computer-move", async move {
            if let Some(service) = me.upgrade() {
                service.play_computer_turn(id).await;
            }
        });
    }

    fn next_seed(&self) -> u64 {
        self.rng.lock().random()
    }

    /// Make the computer's move if, at this moment, it is still the
    /// computer's turn in an active session. Otherwise do nothing.
    pub async fn play_computer_turn(&self, id: SessionId) -> Option<MoveRecord> {
        let seed = self.next_seed();
        let outcome = self.with_session(id, |s| {
            let Some(difficulty) = s.difficulty().filter(|_| s.computer_to_move()) else {
                return Ok(None);
            };
            let player = (self.computer)(difficulty, seed);
            let cell = player.choose_cell(s.board(), Mark::O)?;
            s.apply_move(Actor::Computer, cell).map(Some)
        });

        let (record, view) = match outcome {
            Ok((Some(record), view)) => (record, view),
            Ok((None, _)) => {
                debug!(session = %id, "computer turn no longer due");
                return None;
            }
            Err(e) => {
                debug!(session = %id, error = %e, "computer turn skipped");
                return None;
            }
        };
        debug!(session = %id, cell = record.cell, verdict = ?record.verdict, "computer moved");

        if let Some(channel) = self.channel_of(id) {
            self.publish(channel, &view.rendered).await;
        }
        Some(record)
    }

    fn channel_of(&self, id: SessionId) -> Option<ChannelId> {
        self.sessions.get(&id).and_then(|s| s.channel())
    }

    async fn publish(&self, channel: ChannelId, text: &str) {
        if let Err(e) = self.gateway.send_message(channel, text).await {
            warn!(channel = %channel, error = %e, "could not post board update");
        }
    }
}
