//! Game service on a paused clock: delayed computer turns, stale timers,
//! action-token routing.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use crate::ai::{AiError, ComputerPlayer};
use crate::config::GameSettings;
use crate::domain::{
    ActionToken, Board, ChannelId, Difficulty, GameAction, GameMode, Invitee, Mark, MemberId,
    SecondSeat, SessionId, SessionRequest, SessionStatus, Verdict,
};
use crate::errors::domain::{DomainError, NotFoundKind, ValidationKind};
use crate::gateway::memory::MemoryGateway;
use crate::services::games::{ComputerFactory, GameService};

const ANA: MemberId = MemberId(1);
const BRUNO: MemberId = MemberId(2);
const TABLE: ChannelId = ChannelId(40);

/// Plays the first free cell of a fixed preference list.
struct Scripted(Vec<u8>);

impl ComputerPlayer for Scripted {
    fn choose_cell(&self, board: &Board, _me: Mark) -> Result<u8, AiError> {
        self.0
            .iter()
            .copied()
            .find(|&c| board.is_free(c))
            .ok_or(AiError::NoMoves)
    }
}

fn scripted(cells: &'static [u8]) -> ComputerFactory {
    Arc::new(move |_: Difficulty, _: u64| {
        Box::new(Scripted(cells.to_vec())) as Box<dyn ComputerPlayer>
    })
}

fn settings(computer_first_chance: f64) -> GameSettings {
    GameSettings {
        computer_first_chance,
        rng_seed: Some(7),
        ..GameSettings::default()
    }
}

fn pve() -> SessionRequest {
    SessionRequest {
        community: None,
        channel: Some(TABLE),
        initiator: ANA,
        mode: GameMode::HumanVsComputer(Difficulty::Hard),
        invitee: None,
    }
}

fn pvp_invite() -> SessionRequest {
    SessionRequest {
        community: None,
        channel: Some(TABLE),
        initiator: ANA,
        mode: GameMode::HumanVsHuman,
        invitee: Some(Invitee {
            member: BRUNO,
            is_bot: false,
        }),
    }
}

async fn computer_think() {
    sleep(Duration::from_millis(1600)).await;
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn computer_answers_each_human_move_until_draw() {
    let gateway = Arc::new(MemoryGateway::new());
    let games = GameService::with_computer(settings(0.0), gateway.clone(), scripted(&[4, 1, 6, 5]));
    let view = games.create_session(pve()).unwrap();
    let id = view.session_id;
    assert_eq!(view.to_move, Mark::X);
    assert_eq!(view.player_b, SecondSeat::Computer);

    for (human, reply) in [(0, 4), (8, 1), (7, 6), (2, 5)] {
        let after_human = games.apply_move(id, ANA, human).unwrap();
        assert_eq!(after_human.to_move, Mark::O);
        computer_think().await;
        let view = games.get(id).unwrap();
        assert_eq!(view.board.get(reply), Some(Mark::O));
        assert_eq!(view.to_move, Mark::X);
    }

    let view = games.apply_move(id, ANA, 3).unwrap();
    assert_eq!(
        view.status,
        SessionStatus::Finished {
            verdict: Verdict::Draw
        }
    );
    assert_eq!(view.tally.draws, 1);
    assert_eq!(gateway.messages_to(TABLE).len(), 4);
}

#[tokio::test(start_paused = true)]
async fn human_cannot_move_for_the_computer() {
    let gateway = Arc::new(MemoryGateway::new());
    let games = GameService::with_computer(settings(0.0), gateway, scripted(&[4]));
    let id = games.create_session(pve()).unwrap().session_id;
    games.apply_move(id, ANA, 0).unwrap();

    let err = games.apply_move(id, ANA, 1).unwrap_err();
    assert!(matches!(err, DomainError::Validation(ValidationKind::NotYourTurn, _)));
}

#[tokio::test(start_paused = true)]
async fn stale_computer_turn_is_a_no_op() {
    let gateway = Arc::new(MemoryGateway::new());
    let games = GameService::with_computer(settings(0.0), gateway.clone(), scripted(&[4]));
    let id = games.create_session(pve()).unwrap().session_id;

    assert_eq!(games.play_computer_turn(id).await, None);
    assert!(games.get(id).unwrap().board.is_blank());

    games.apply_move(id, ANA, 0).unwrap();
    games.quit(id, ANA).unwrap();
    computer_think().await;
    assert_eq!(games.session_count(), 0);
    assert!(gateway.messages_to(TABLE).is_empty());
}

#[tokio::test(start_paused = true)]
async fn computer_may_open_the_game() {
    let gateway = Arc::new(MemoryGateway::new());
    let games = GameService::with_computer(settings(1.0), gateway, scripted(&[4]));
    let view = games.create_session(pve()).unwrap();
    assert_eq!(view.to_move, Mark::O);

    sleep(Duration::from_millis(1100)).await;
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
    let view = games.get(view.session_id).unwrap();
    assert_eq!(view.board.get(4), Some(Mark::O));
    assert_eq!(view.to_move, Mark::X);
}

#[tokio::test(start_paused = true)]
async fn seeded_services_open_identically() {
    let first = |games: &Arc<GameService>| games.create_session(pve()).unwrap().to_move;
    let a = GameService::new(settings(0.5), Arc::new(MemoryGateway::new()));
    let b = GameService::new(settings(0.5), Arc::new(MemoryGateway::new()));
    let openers_a: Vec<Mark> = (0..10).map(|_| first(&a)).collect();
    let openers_b: Vec<Mark> = (0..10).map(|_| first(&b)).collect();
    assert_eq!(openers_a, openers_b);
}

#[tokio::test(start_paused = true)]
async fn invitations_route_through_action_tokens() {
    let games = GameService::new(settings(0.0), Arc::new(MemoryGateway::new()));
    let id = games.create_session(pvp_invite()).unwrap().session_id;
    let token = |action| ActionToken::new(id, action).to_string();

    let err = games.handle_action(ANA, &token(GameAction::Move(0))).unwrap_err();
    assert!(matches!(err, DomainError::Validation(ValidationKind::InvitePending, _)));

    let err = games.handle_action(ANA, &token(GameAction::Accept)).unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    let view = games.handle_action(BRUNO, &token(GameAction::Accept)).unwrap();
    assert_eq!(view.status, SessionStatus::Active);

    let view = games.handle_action(ANA, &token(GameAction::Move(4))).unwrap();
    assert_eq!(view.board.get(4), Some(Mark::X));
    let view = games.handle_action(BRUNO, &token(GameAction::Move(0))).unwrap();
    assert_eq!(view.board.get(0), Some(Mark::O));

    let view = games.handle_action(BRUNO, &token(GameAction::Reset)).unwrap();
    assert!(view.board.is_blank());
    assert_eq!(view.to_move, Mark::X);

    games.handle_action(ANA, &token(GameAction::Quit)).unwrap();
    let err = games.get(id).unwrap_err();
    assert!(matches!(err, DomainError::NotFound(NotFoundKind::Session, _)));
}

#[tokio::test(start_paused = true)]
async fn anyone_pressing_quit_ends_the_game() {
    let games = GameService::new(settings(0.0), Arc::new(MemoryGateway::new()));
    let id = games.create_session(pvp_invite()).unwrap().session_id;
    let bystander = MemberId(99);

    let view = games.quit(id, bystander).unwrap();
    assert_eq!(view.session_id, id);
    assert_eq!(games.session_count(), 0);

    let err = games.quit(id, ANA).unwrap_err();
    assert!(matches!(err, DomainError::NotFound(NotFoundKind::Session, _)));
}

#[tokio::test(start_paused = true)]
async fn declining_discards_the_session() {
    let games = GameService::new(settings(0.0), Arc::new(MemoryGateway::new()));
    let id = games.create_session(pvp_invite()).unwrap().session_id;

    let view = games.decline(id, BRUNO).unwrap();
    assert_eq!(view.status, SessionStatus::Declined);
    assert_eq!(games.session_count(), 0);
    assert!(games.accept(id, BRUNO).is_err());
}

#[tokio::test(start_paused = true)]
async fn malformed_tokens_and_unknown_sessions() {
    let games = GameService::new(settings(0.0), Arc::new(MemoryGateway::new()));

    let err = games.handle_action(ANA, "ttt:nope:4").unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::InvalidActionToken, _)
    ));

    let ghost = ActionToken::new(SessionId::generate(), GameAction::Move(4)).to_string();
    let err = games.handle_action(ANA, &ghost).unwrap_err();
    assert!(matches!(err, DomainError::NotFound(NotFoundKind::Session, _)));
}

#[tokio::test(start_paused = true)]
async fn self_challenge_is_refused_by_the_service() {
    let games = GameService::new(settings(0.0), Arc::new(MemoryGateway::new()));
    let mut request = pvp_invite();
    request.invitee = Some(Invitee {
        member: ANA,
        is_bot: false,
    });
    let err = games.create_session(request).unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::SelfChallenge, _)
    ));
    assert_eq!(games.session_count(), 0);
}
