//! Plain-text rendering of a session for chat messages.

use std::fmt::Write;

use super::board::{hint_for, Board, Hint, Mark, Verdict};
use super::session::{GameSession, SecondSeat, SessionStatus, Tally, TurnHolder};

fn cell_glyph(board: &Board, cell: u8) -> String {
    match board.get(cell) {
        Some(mark) => mark.symbol().to_string(),
        None => (cell + 1).to_string(),
    }
}

/// Three rows of cells; empty cells show their 1-based number.
pub fn render_board(board: &Board) -> String {
    let rows: Vec<String> = (0..3u8)
        .map(|row| {
            (0..3u8)
                .map(|col| format!(" {} ", cell_glyph(board, row * 3 + col)))
                .collect::<Vec<_>>()
                .join("|")
        })
        .collect();
    rows.join("\n---+---+---\n")
}

fn seat_label(seat: SecondSeat) -> String {
    match seat {
        SecondSeat::Unclaimed => "anyone".to_string(),
        SecondSeat::Member(m) => format!("<@{m}>"),
        SecondSeat::Computer => "the computer".to_string(),
    }
}

pub fn render_tally(tally: &Tally) -> String {
    format!(
        "X {} ({}%) | O {} ({}%) | draws {}",
        tally.x_wins,
        tally.win_rate(Mark::X),
        tally.o_wins,
        tally.win_rate(Mark::O),
        tally.draws
    )
}

pub fn render_status(session: &GameSession) -> String {
    match session.status() {
        SessionStatus::PendingInvite { invitee } => {
            format!("<@{invitee}>, <@{}> challenged you!", session.player_a())
        }
        SessionStatus::Active => match session.seat_to_move() {
            TurnHolder::PlayerA(a) => format!("<@{a}> to move (X)"),
            TurnHolder::Seat(seat) => format!("{} to move (O)", seat_label(seat)),
        },
        SessionStatus::Finished { verdict } => match verdict {
            Verdict::Win(Mark::X) => format!("<@{}> wins!", session.player_a()),
            Verdict::Win(Mark::O) => format!("{} wins!", seat_label(session.second_seat())),
            Verdict::Draw => "It's a draw.".to_string(),
        },
        SessionStatus::Declined => "The challenge was declined.".to_string(),
    }
}

/// Full message body: status, grid, an optional hint, then the running tally.
pub fn render_session(session: &GameSession) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", render_status(session));
    let _ = writeln!(out, "```\n{}\n```", render_board(session.board()));
    if session.is_active() {
        match hint_for(session.board(), session.to_move()) {
            Some(Hint::CanWin(cell)) => {
                let _ = writeln!(out, "Hint: cell {} wins.", cell + 1);
            }
            Some(Hint::MustBlock(cell)) => {
                let _ = writeln!(out, "Hint: block cell {}.", cell + 1);
            }
            None => {}
        }
    }
    out.push_str(&render_tally(&session.tally()));
    out
}
