//! Piece catalog, piece sources and the active piece.

use crate::collision::collides;
use crate::grid::Grid;
use crate::shape::Shape;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("invalid piece type: {0:?}")]
    InvalidPieceType(char),
    #[error("piece sequence is empty")]
    EmptySequence,
}

/// Tetromino kinds (T, O, L, J, I, S, Z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceType {
    T,
    O,
    L,
    J,
    I,
    S,
    Z,
}

impl PieceType {
    pub const ALL: [Self; 7] = [Self::T, Self::O, Self::L, Self::J, Self::I, Self::S, Self::Z];

    /// Parse a one-letter tag (case-insensitive).
    pub fn from_tag(tag: char) -> Result<Self, CatalogError> {
        match tag.to_ascii_uppercase() {
            'T' => Ok(Self::T),
            'O' => Ok(Self::O),
            'L' => Ok(Self::L),
            'J' => Ok(Self::J),
            'I' => Ok(Self::I),
            'S' => Ok(Self::S),
            'Z' => Ok(Self::Z),
            _ => Err(CatalogError::InvalidPieceType(tag)),
        }
    }

    pub fn tag(&self) -> char {
        match self {
            Self::T => 'T',
            Self::O => 'O',
            Self::L => 'L',
            Self::J => 'J',
            Self::I => 'I',
            Self::S => 'S',
            Self::Z => 'Z',
        }
    }

    /// Colour class written into the grid (1..=7).
    pub fn color(&self) -> u8 {
        match self {
            Self::T => 1,
            Self::O => 2,
            Self::L => 3,
            Self::J => 4,
            Self::I => 5,
            Self::S => 6,
            Self::Z => 7,
        }
    }

    /// Fresh spawn-orientation matrix for this kind.
    pub fn shape(&self) -> Shape {
        match self {
            Self::T => Shape::from_rows(&[&[0, 0, 0], &[1, 1, 1], &[0, 1, 0]]),
            Self::O => Shape::from_rows(&[&[2, 2], &[2, 2]]),
            Self::L => Shape::from_rows(&[&[0, 3, 0], &[0, 3, 0], &[0, 3, 3]]),
            Self::J => Shape::from_rows(&[&[0, 4, 0], &[0, 4, 0], &[4, 4, 0]]),
            Self::I => Shape::from_rows(&[
                &[0, 5, 0, 0],
                &[0, 5, 0, 0],
                &[0, 5, 0, 0],
                &[0, 5, 0, 0],
            ]),
            Self::S => Shape::from_rows(&[&[0, 6, 6], &[6, 6, 0], &[0, 0, 0]]),
            Self::Z => Shape::from_rows(&[&[7, 7, 0], &[0, 7, 7], &[0, 0, 0]]),
        }
    }
}

/// Shape for a piece tag; unknown tags are an error rather than an empty shape.
pub fn shape_for(tag: char) -> Result<Shape, CatalogError> {
    PieceType::from_tag(tag).map(|kind| kind.shape())
}

/// Uniform pick among the seven kinds. No bag, no history.
pub fn spawn_type<R: Rng + ?Sized>(rng: &mut R) -> PieceType {
    PieceType::ALL[rng.random_range(0..PieceType::ALL.len())]
}

/// Decides which kind spawns next.
pub trait PieceSource {
    fn next_type(&mut self) -> PieceType;
}

impl<P: PieceSource + ?Sized> PieceSource for Box<P> {
    fn next_type(&mut self) -> PieceType {
        (**self).next_type()
    }
}

/// Independent uniform draws.
#[derive(Debug, Clone)]
pub struct RandomPieces {
    rng: StdRng,
}

impl RandomPieces {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPieces {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceSource for RandomPieces {
    fn next_type(&mut self) -> PieceType {
        spawn_type(&mut self.rng)
    }
}

/// Cycles through a fixed list of kinds.
#[derive(Debug, Clone)]
pub struct ScriptedPieces {
    kinds: Vec<PieceType>,
    pos: usize,
}

impl ScriptedPieces {
    pub fn new(kinds: Vec<PieceType>) -> Result<Self, CatalogError> {
        if kinds.is_empty() {
            return Err(CatalogError::EmptySequence);
        }
        Ok(Self { kinds, pos: 0 })
    }

    /// Parse a tag string such as `"TOIL"`. Whitespace and commas are skipped.
    pub fn parse(tags: &str) -> Result<Self, CatalogError> {
        let kinds = tags
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ',')
            .map(PieceType::from_tag)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(kinds)
    }
}

impl PieceSource for ScriptedPieces {
    fn next_type(&mut self) -> PieceType {
        let kind = self.kinds[self.pos];
        self.pos = (self.pos + 1) % self.kinds.len();
        kind
    }
}

/// The falling piece: its own copy of a shape plus the top-left anchor in grid cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivePiece {
    pub kind: PieceType,
    pub shape: Shape,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpawnResult {
    Spawned(ActivePiece),
    /// The spawn position already overlaps the stack.
    Blocked,
}

impl ActivePiece {
    /// Piece at the top row, horizontally centred: `floor(W/2) - floor(size/2)`.
    pub fn new(kind: PieceType, grid_width: usize) -> Self {
        let shape = kind.shape();
        let x = (grid_width / 2) as i32 - (shape.size() / 2) as i32;
        Self { kind, shape, x, y: 0 }
    }

    pub fn spawn(kind: PieceType, grid: &Grid) -> SpawnResult {
        let piece = Self::new(kind, grid.width());
        if collides(grid, &piece) {
            SpawnResult::Blocked
        } else {
            SpawnResult::Spawned(piece)
        }
    }

    /// Absolute grid coordinates and colour of every filled cell.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32, u8)> + '_ {
        self.shape
            .filled()
            .map(|(dx, dy, v)| (self.x + dx as i32, self.y + dy as i32, v))
    }
}
