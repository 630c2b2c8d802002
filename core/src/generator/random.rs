use ndarray::Array2;
use rand::prelude::*;

use super::*;

/// Generation strategy that keeps the start area clear according to [`StartTile`], but other than that is
/// purely random. Mines are drawn by rejection sampling from a seeded RNG, so a seed fully determines every
/// layout in the sequence.
#[derive(Clone, Debug)]
pub struct RandomMinefieldGenerator {
    rng: SmallRng,
    start_tile: StartTile,
}

impl RandomMinefieldGenerator {
    pub fn new(seed: u64, start_tile: StartTile) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            start_tile,
        }
    }

    pub fn start_tile(&self) -> StartTile {
        self.start_tile
    }
}

impl MinefieldGenerator for RandomMinefieldGenerator {
    fn generate(&mut self, config: GameConfig, anchor: Coord2) -> MineLayout {
        let total_cells = config.total_cells();

        // optimize for full boards
        if config.mines >= total_cells {
            log::warn!(
                "Minefield already full, generated anyway, requested {} but only fits {}",
                config.mines,
                total_cells
            );
            return MineLayout::from_sized_mask(&Array2::from_elem(config.size.to_nd_index(), true), config.size);
        }

        let start_tile = self.start_tile.fit(config, anchor);
        let mut mines: Array2<bool> = Array2::default(config.size.to_nd_index());
        let mut mines_placed: CellCount = 0;

        while mines_placed < config.mines {
            let candidate = (
                self.rng.random_range(0..config.size.0),
                self.rng.random_range(0..config.size.1),
            );
            if start_tile.excludes(candidate, anchor) || mines[candidate.to_nd_index()] {
                continue;
            }
            mines[candidate.to_nd_index()] = true;
            mines_placed += 1;
        }

        log::debug!(
            "Placed {} mines around anchor {:?} ({:?})",
            mines_placed,
            anchor,
            start_tile
        );
        MineLayout::from_sized_mask(&mines, config.size)
    }
}
