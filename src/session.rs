//! Game session: owns the grid, active piece, counters and status, and composes the
//! rules into the tick and input protocol.
//!
//! The session is a plain owned value. Every entry point runs to completion, so a
//! host only has to make sure calls are not interleaved.

use crate::collision::{collides, merge};
use crate::config::Rules;
use crate::grid::{Grid, Sweep};
use crate::piece::{ActivePiece, PieceSource, SpawnResult};
use crate::scheduler::DropScheduler;
use serde::Serialize;
use std::sync::mpsc::Sender;
use std::time::Duration;
use tracing::{debug, info, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Running,
    GameOver,
}

/// Final numbers of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameResult {
    pub score: u32,
    pub lines: u32,
}

/// Receives one [`GameResult`] per game over. Delivery is fire-and-forget.
pub trait ResultSink {
    fn deliver(&mut self, result: GameResult);
}

impl ResultSink for Sender<GameResult> {
    fn deliver(&mut self, result: GameResult) {
        // A dropped receiver just means nobody is listening any more.
        let _ = self.send(result);
    }
}

/// Discards results.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ResultSink for NullSink {
    fn deliver(&mut self, _result: GameResult) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    fn dx(self) -> i32 {
        match self {
            Self::Left => -1,
            Self::Right => 1,
        }
    }
}

/// What a single drop step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// The piece moved down one row.
    Fell,
    /// The piece landed and was merged; `rows` are the sweep's removal indices.
    Locked { rows: Vec<usize> },
    /// The next piece could not spawn. The grid was cleared and the result delivered.
    ToppedOut(GameResult),
}

pub struct GameSession {
    rules: Rules,
    grid: Grid,
    active: Option<ActivePiece>,
    score: u32,
    lines: u32,
    status: Status,
    scheduler: DropScheduler,
    pieces: Box<dyn PieceSource>,
    sink: Box<dyn ResultSink>,
}

impl GameSession {
    /// New idle session. `rules` are assumed validated.
    pub fn new(
        rules: Rules,
        pieces: impl PieceSource + 'static,
        sink: impl ResultSink + 'static,
    ) -> Self {
        Self {
            grid: Grid::new(rules.width, rules.height),
            scheduler: DropScheduler::new(&rules),
            rules,
            active: None,
            score: 0,
            lines: 0,
            status: Status::Idle,
            pieces: Box::new(pieces),
            sink: Box::new(sink),
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == Status::Running
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn active(&self) -> Option<&ActivePiece> {
        self.active.as_ref()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn interval(&self) -> Duration {
        self.scheduler.interval()
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Begin a fresh game from Idle or GameOver. Ignored while Running.
    pub fn start(&mut self) -> bool {
        if self.status == Status::Running {
            return false;
        }
        self.grid = Grid::new(self.rules.width, self.rules.height);
        self.score = 0;
        self.lines = 0;
        self.scheduler.reset();
        self.status = Status::Running;
        info!(
            width = self.rules.width,
            height = self.rules.height,
            "session started"
        );
        // A grid too narrow for the first piece ends the game straight away.
        self.spawn_next();
        true
    }

    /// Host teardown mid-game: back to Idle without reporting a result.
    pub fn abandon(&mut self) {
        if self.status == Status::Running {
            info!(score = self.score, lines = self.lines, "session abandoned");
            self.status = Status::Idle;
            self.active = None;
        }
    }

    /// Advance the clock by one frame. At most one drop step runs per call.
    pub fn step(&mut self, delta: Duration) -> Option<DropOutcome> {
        if !self.is_running() {
            return None;
        }
        if self.scheduler.advance(delta) {
            Some(self.drop_step())
        } else {
            None
        }
    }

    /// One immediate drop step, independent of the timer.
    pub fn soft_drop(&mut self) -> Option<DropOutcome> {
        if !self.is_running() {
            return None;
        }
        self.scheduler.reset_accumulator();
        Some(self.drop_step())
    }

    /// Shift the piece one column; a blocked shift leaves it where it was.
    pub fn move_horizontal(&mut self, dir: Direction) -> bool {
        if !self.is_running() {
            return false;
        }
        let Some(piece) = self.active.as_mut() else {
            return false;
        };
        piece.x += dir.dx();
        if collides(&self.grid, piece) {
            piece.x -= dir.dx();
            return false;
        }
        true
    }

    /// Rotate in place. A rotation that would collide is discarded (no wall kick).
    pub fn rotate_active(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        let Some(piece) = self.active.as_mut() else {
            return false;
        };
        let rotated = piece.shape.rotate();
        let previous = std::mem::replace(&mut piece.shape, rotated);
        if collides(&self.grid, piece) {
            trace!(kind = ?piece.kind, x = piece.x, y = piece.y, "rotation blocked");
            piece.shape = previous;
            return false;
        }
        true
    }

    fn drop_step(&mut self) -> DropOutcome {
        let Some(piece) = self.active.as_mut() else {
            return match self.spawn_next() {
                Some(result) => DropOutcome::ToppedOut(result),
                None => DropOutcome::Fell,
            };
        };
        piece.y += 1;
        if !collides(&self.grid, piece) {
            return DropOutcome::Fell;
        }
        piece.y -= 1;
        if let Some(piece) = self.active.take() {
            merge(&mut self.grid, &piece);
        }
        let sweep = self.grid.sweep();
        self.score_sweep(&sweep);
        match self.spawn_next() {
            Some(result) => DropOutcome::ToppedOut(result),
            None => DropOutcome::Locked { rows: sweep.rows },
        }
    }

    fn score_sweep(&mut self, sweep: &Sweep) {
        if sweep.is_empty() {
            return;
        }
        let count = sweep.count();
        self.lines = self.lines.saturating_add(count);
        self.score = self
            .score
            .saturating_add(count.saturating_mul(self.rules.line_score));
        debug!(rows = count, score = self.score, lines = self.lines, "lines cleared");
    }

    /// Spawn the next piece. A blocked spawn ends the game and yields its result.
    fn spawn_next(&mut self) -> Option<GameResult> {
        let kind = self.pieces.next_type();
        match ActivePiece::spawn(kind, &self.grid) {
            SpawnResult::Spawned(piece) => {
                self.active = Some(piece);
                None
            }
            SpawnResult::Blocked => Some(self.game_over()),
        }
    }

    fn game_over(&mut self) -> GameResult {
        let result = GameResult {
            score: self.score,
            lines: self.lines,
        };
        self.grid.clear();
        self.active = None;
        self.status = Status::GameOver;
        info!(score = result.score, lines = result.lines, "game over");
        self.sink.deliver(result);
        result
    }
}
