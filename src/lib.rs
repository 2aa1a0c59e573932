//! Blockfall: falling-block puzzle engine.
//!
//! The library holds the game rules: grid, pieces, collision, merge, line sweep,
//! rotation and drop scheduling, composed by [`GameSession`]. Rendering, key handling
//! and result delivery live in the terminal binary and talk to the session through
//! its accessors and the [`ResultSink`] trait.

pub mod collision;
pub mod config;
pub mod grid;
pub mod piece;
pub mod scheduler;
pub mod session;
pub mod shape;

pub use collision::{collides, merge};
pub use config::{ConfigError, Rules};
pub use grid::{Grid, Sweep};
pub use piece::{
    ActivePiece, CatalogError, PieceSource, PieceType, RandomPieces, ScriptedPieces, SpawnResult,
    shape_for, spawn_type,
};
pub use scheduler::DropScheduler;
pub use session::{
    Direction, DropOutcome, GameResult, GameSession, NullSink, ResultSink, Status,
};
pub use shape::Shape;
