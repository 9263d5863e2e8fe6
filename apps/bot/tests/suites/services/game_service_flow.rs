//! Game service driven through the public API with the real strategies.

use std::sync::Arc;
use std::time::Duration;

use cafebot::config::GameSettings;
use cafebot::domain::{
    ChannelId, Difficulty, GameMode, Mark, MemberId, SecondSeat, SessionRequest, SessionStatus,
};
use cafebot::gateway::MemoryGateway;
use cafebot::services::GameService;
use tokio::time::sleep;

const ANA: MemberId = MemberId(1);
const BRUNO: MemberId = MemberId(2);
const CAIO: MemberId = MemberId(3);
const TABLE: ChannelId = ChannelId(40);

fn settings() -> GameSettings {
    GameSettings {
        computer_first_chance: 0.0,
        rng_seed: Some(11),
        ..GameSettings::default()
    }
}

fn request(mode: GameMode) -> SessionRequest {
    SessionRequest {
        community: None,
        channel: Some(TABLE),
        initiator: ANA,
        mode,
        invitee: None,
    }
}

async fn let_computer_move(settings: &GameSettings) {
    sleep(settings.computer_delay + Duration::from_millis(100)).await;
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn hard_computer_centers_then_blocks() {
    let settings = settings();
    let gateway = Arc::new(MemoryGateway::new());
    let games = GameService::new(settings.clone(), gateway.clone());
    let id = games
        .create_session(request(GameMode::HumanVsComputer(Difficulty::Hard)))
        .unwrap()
        .session_id;

    games.apply_move(id, ANA, 0).unwrap();
    let_computer_move(&settings).await;
    assert_eq!(games.get(id).unwrap().board.get(4), Some(Mark::O));

    games.apply_move(id, ANA, 1).unwrap();
    let_computer_move(&settings).await;
    let view = games.get(id).unwrap();
    assert_eq!(view.board.get(2), Some(Mark::O));
    assert_eq!(view.to_move, Mark::X);
    assert_eq!(gateway.messages_to(TABLE).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn computer_round_always_reaches_a_verdict() {
    let settings = settings();
    let games = GameService::new(settings.clone(), Arc::new(MemoryGateway::new()));
    let id = games
        .create_session(request(GameMode::HumanVsComputer(Difficulty::Easy)))
        .unwrap()
        .session_id;

    for _ in 0..5 {
        let view = games.get(id).unwrap();
        if matches!(view.status, SessionStatus::Finished { .. }) {
            break;
        }
        let cell = view.board.empty_cells()[0];
        let view = games.apply_move(id, ANA, cell).unwrap();
        if matches!(view.status, SessionStatus::Finished { .. }) {
            break;
        }
        let_computer_move(&settings).await;
    }

    let view = games.get(id).unwrap();
    assert!(matches!(view.status, SessionStatus::Finished { .. }));
    assert_eq!(view.tally.rounds(), 1);
    assert!(view.hint.is_none());

    let view = games.reset(id, ANA).unwrap();
    assert_eq!(view.status, SessionStatus::Active);
    assert!(view.board.is_blank());
    assert_eq!(view.tally.rounds(), 1);
}

#[tokio::test(start_paused = true)]
async fn open_challenge_seat_goes_to_first_other_mover() {
    let games = GameService::new(settings(), Arc::new(MemoryGateway::new()));
    let id = games
        .create_session(request(GameMode::HumanVsHuman))
        .unwrap()
        .session_id;
    assert_eq!(games.get(id).unwrap().player_b, SecondSeat::Unclaimed);

    games.apply_move(id, ANA, 4).unwrap();
    let view = games.apply_move(id, BRUNO, 0).unwrap();
    assert_eq!(view.player_b, SecondSeat::Member(BRUNO));

    games.apply_move(id, ANA, 8).unwrap();
    assert!(games.apply_move(id, CAIO, 1).is_err());
    let view = games.apply_move(id, BRUNO, 1).unwrap();
    assert_eq!(view.board.get(1), Some(Mark::O));
}
