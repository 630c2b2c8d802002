use serde::{Deserialize, Serialize};

use crate::*;
pub use random::*;

mod random;

/// Source of mine layouts, consulted once per game with the first revealed cell as anchor.
pub trait MinefieldGenerator {
    fn generate(&mut self, config: GameConfig, anchor: Coord2) -> MineLayout;
}

/// How much of the board around the anchor is kept free of mines.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartTile {
    /// No guarantee, the first click may hit a mine.
    Random,
    /// Only the anchor itself is safe.
    SimpleSafe,
    /// The anchor and all of its neighbors are safe, so the first click opens a region.
    #[default]
    AlwaysZero,
}

impl StartTile {
    /// Whether a mine may not be placed at `coords`.
    pub const fn excludes(self, coords: Coord2, anchor: Coord2) -> bool {
        match self {
            Self::Random => false,
            Self::SimpleSafe => coords.0 == anchor.0 && coords.1 == anchor.1,
            Self::AlwaysZero => chebyshev(coords, anchor) <= 1,
        }
    }

    /// Number of in-bounds cells this policy keeps free.
    pub fn excluded_cells(self, size: Coord2, anchor: Coord2) -> CellCount {
        match self {
            Self::Random => 0,
            Self::SimpleSafe => 1,
            Self::AlwaysZero => 1 + NeighborIter::new(anchor, size).count() as CellCount,
        }
    }

    /// Strongest policy not exceeding this one that still leaves room for every mine.
    pub fn fit(self, config: GameConfig, anchor: Coord2) -> Self {
        use StartTile::*;

        let free_cells = |start: Self| {
            config
                .total_cells()
                .saturating_sub(start.excluded_cells(config.size, anchor))
        };

        match self {
            Random => Random,
            SimpleSafe | AlwaysZero if config.mines > free_cells(SimpleSafe) => {
                log::warn!("Cannot make start tile safe, fallback to random");
                Random
            }
            SimpleSafe => SimpleSafe,
            AlwaysZero if config.mines > free_cells(AlwaysZero) => {
                log::warn!("Cannot make start tile zero, fallback to simple safe");
                SimpleSafe
            }
            AlwaysZero => AlwaysZero,
        }
    }
}

/// A fixed layout replays itself every game, whatever the anchor.
impl MinefieldGenerator for MineLayout {
    fn generate(&mut self, config: GameConfig, _anchor: Coord2) -> MineLayout {
        if self.game_config() != config {
            log::warn!(
                "Preset layout {:?} does not match requested config {:?}",
                self.game_config(),
                config
            );
        }
        self.clone()
    }
}
