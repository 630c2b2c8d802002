use serde::{Deserialize, Serialize};

/// What a cell holds, fixed once mines are placed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellValue {
    Mine,
    /// Number of mines among the up-to-8 neighbors.
    Count(u8),
}

impl CellValue {
    pub const fn is_mine(self) -> bool {
        matches!(self, Self::Mine)
    }

    /// The adjacency count, `None` for mines.
    pub const fn count(self) -> Option<u8> {
        match self {
            Self::Mine => None,
            Self::Count(count) => Some(count),
        }
    }
}

/// Canonical player-visible state stored by the gameplay engine.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineCell {
    #[default]
    Hidden,
    Flagged,
    Revealed(CellValue),
}

impl EngineCell {
    pub const fn is_revealed(self) -> bool {
        matches!(self, Self::Revealed(_))
    }

    pub const fn is_flagged(self) -> bool {
        matches!(self, Self::Flagged)
    }
}

/// Resolved view of a cell for drawing, includes end-of-game annotations.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tile {
    Closed,
    Flag,
    Open(u8),
    /// The mine that ended the game.
    Exploded,
    /// Any other mine, only shown once the game is lost.
    Mine,
    /// Flag placed on a safe cell, only shown once the game is lost.
    IncorrectFlag,
}

impl Tile {
    // whether the tile is visually closed
    pub const fn is_closed(self) -> bool {
        use Tile::*;
        match self {
            Closed => true,
            Flag => true,
            Open(_) => false,
            Exploded => false,
            Mine => false,
            IncorrectFlag => true,
        }
    }
}
