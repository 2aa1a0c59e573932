//! End-to-end flows through the public session API.

use blockfall::{
    Direction, DropOutcome, GameResult, GameSession, PieceType, RandomPieces, Rules,
    ScriptedPieces, Status, collides,
};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

fn scripted(tags: &str) -> (GameSession, Receiver<GameResult>) {
    let (tx, rx) = mpsc::channel();
    let pieces = ScriptedPieces::parse(tags).expect("valid tags");
    (GameSession::new(Rules::default(), pieces, tx), rx)
}

fn filled_cells(session: &GameSession) -> Vec<(usize, usize, u8)> {
    let grid = session.grid();
    let mut out = Vec::new();
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            match grid.get(x, y) {
                Some(0) | None => {}
                Some(v) => out.push((x, y, v)),
            }
        }
    }
    out
}

#[test]
fn t_piece_soft_dropped_to_the_floor() {
    let (mut s, rx) = scripted("T");
    s.start();
    let mut falls = 0;
    let outcome = loop {
        match s.soft_drop().expect("running") {
            DropOutcome::Fell => falls += 1,
            other => break other,
        }
    };
    assert_eq!(falls, 27);
    assert_eq!(outcome, DropOutcome::Locked { rows: vec![] });
    // spawn x is 7 - 1 = 6; the T's flat row sits on row 28 and its stem on row 29
    assert_eq!(
        filled_cells(&s),
        vec![(6, 28, 1), (7, 28, 1), (8, 28, 1), (7, 29, 1)]
    );
    assert_eq!(s.score(), 0);
    assert_eq!(s.lines(), 0);
    assert_eq!(s.status(), Status::Running);
    let next = s.active().expect("next piece");
    assert_eq!((next.kind, next.x, next.y), (PieceType::T, 6, 0));
    assert!(rx.try_recv().is_err());
}

#[test]
fn timer_drives_the_piece_down() {
    let (mut s, _rx) = scripted("O");
    s.start();
    let frame = Duration::from_millis(16);
    let mut drops = 0;
    for _ in 0..(62 * 5) {
        if let Some(DropOutcome::Fell) = s.step(frame) {
            drops += 1;
        }
    }
    // 62 frames of 16 ms = 992 ms > 980 ms per drop
    assert_eq!(drops, 5);
    assert_eq!(s.active().unwrap().y, 5);
}

#[test]
fn stacking_o_pieces_tops_out_once() {
    let (mut s, rx) = scripted("O");
    s.start();
    let mut locks = 0;
    let result = loop {
        match s.soft_drop() {
            Some(DropOutcome::Fell) => {}
            Some(DropOutcome::Locked { rows }) => {
                assert!(rows.is_empty());
                locks += 1;
                assert!(locks < 100, "never topped out");
            }
            Some(DropOutcome::ToppedOut(result)) => break result,
            None => panic!("left Running without topping out"),
        }
    };
    // fifteen 2x2 pieces fill a 30-row column, the sixteenth cannot spawn
    assert_eq!(locks, 14);
    assert_eq!(result, GameResult { score: 0, lines: 0 });
    assert_eq!(s.status(), Status::GameOver);
    assert!(s.grid().is_empty());

    // nothing else happens until restart
    assert_eq!(s.soft_drop(), None);
    assert!(!s.move_horizontal(Direction::Left));
    assert!(!s.rotate_active());
    assert_eq!(s.step(Duration::from_secs(30)), None);
    assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![result]);

    assert!(s.start());
    assert_eq!(s.status(), Status::Running);
    assert!(rx.try_recv().is_err());
}

#[test]
fn interval_ramps_only_while_running() {
    let (mut s, _rx) = scripted("I");
    // idle time does not count
    s.step(Duration::from_secs(120));
    s.start();
    assert_eq!(s.interval(), Duration::from_millis(980));
    for _ in 0..3 {
        s.step(Duration::from_secs(20));
    }
    assert_eq!(s.interval(), Duration::from_millis(881));
    s.abandon();
    s.step(Duration::from_secs(200));
    assert_eq!(s.interval(), Duration::from_millis(881));
    s.start();
    assert_eq!(s.interval(), Duration::from_millis(980));
}

#[test]
fn random_session_keeps_invariants() {
    let (tx, rx) = mpsc::channel();
    let mut s = GameSession::new(Rules::default(), RandomPieces::seeded(42), tx);
    s.start();
    let moves = [Direction::Left, Direction::Right];
    for i in 0..5000usize {
        match i % 4 {
            0 => {
                s.rotate_active();
            }
            1 => {
                s.move_horizontal(moves[(i / 4) % 2]);
            }
            _ => {
                s.soft_drop();
            }
        }
        if let Some(piece) = s.active() {
            assert!(!collides(s.grid(), piece));
        }
        let grid = s.grid();
        assert_eq!(grid.rows().count(), 30);
        assert!(grid.rows().all(|row| row.len() == 15));
        assert!(grid.rows().flatten().all(|&c| c <= 7));
        assert_eq!(s.score(), s.lines() * 100);
        if s.status() == Status::GameOver {
            break;
        }
    }
    // any game over was reported exactly once
    let reports = rx.try_iter().count();
    assert_eq!(reports, usize::from(s.status() == Status::GameOver));
}
