use core::ops::BitOr;
use core::time::Duration;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::*;

/// Session state machine: `InProgress -> Won` or `InProgress -> Lost`, both terminal until reset.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    #[default]
    InProgress,
    Won,
    Lost,
}

impl Outcome {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// Owns the grid and the session built on top of it.
///
/// Mines are not placed until the first reveal, which makes that reveal the anchor handed to the
/// generator. Every operation is total over in-range coordinates: requests that make no sense for
/// the current state (revealing a flag, flagging an open cell, moves after the game ended) are
/// reported as `NoChange` and leave the state untouched.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayEngine<G = RandomMinefieldGenerator> {
    config: GameConfig,
    generator: G,
    mine_layout: Option<MineLayout>,
    board: Array2<EngineCell>,
    revealed_count: CellCount,
    flag_count: CellCount,
    outcome: Outcome,
    triggered_mine: Option<Coord2>,
    started_at: Option<Instant>,
    ended_at: Option<Instant>,
}

impl PlayEngine<RandomMinefieldGenerator> {
    /// Random layouts with a zero-valued first click.
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self::new(config, RandomMinefieldGenerator::new(seed, StartTile::AlwaysZero))
    }
}

impl PlayEngine<MineLayout> {
    /// Replays `mine_layout` on every game, ignoring the anchor.
    pub fn with_layout(mine_layout: MineLayout) -> Self {
        Self::new(mine_layout.game_config(), mine_layout)
    }
}

impl<G: MinefieldGenerator> PlayEngine<G> {
    pub fn new(config: GameConfig, generator: G) -> Self {
        Self {
            config,
            generator,
            mine_layout: None,
            board: Array2::default(config.size.to_nd_index()),
            revealed_count: 0,
            flag_count: 0,
            outcome: Outcome::InProgress,
            triggered_mine: None,
            started_at: None,
            ended_at: None,
        }
    }

    /// Back to a mine-free, unrevealed, unflagged board. The generator is kept so the next game
    /// continues its sequence.
    pub fn reset(&mut self) {
        self.mine_layout = None;
        self.board.fill(EngineCell::Hidden);
        self.revealed_count = 0;
        self.flag_count = 0;
        self.outcome = Outcome::InProgress;
        self.triggered_mine = None;
        self.started_at = None;
        self.ended_at = None;
        log::debug!("Board reset");
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn size(&self) -> Coord2 {
        self.config.size
    }

    pub fn total_mines(&self) -> CellCount {
        self.mine_layout
            .as_ref()
            .map_or(self.config.mines, MineLayout::mine_count)
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_finished()
    }

    pub fn mines_placed(&self) -> bool {
        self.mine_layout.is_some()
    }

    pub fn flag_count(&self) -> CellCount {
        self.flag_count
    }

    /// Mines minus flags, negative when the player over-flags.
    pub fn mines_left(&self) -> isize {
        (self.total_mines() as isize) - (self.flag_count as isize)
    }

    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.triggered_mine
    }

    pub fn cell_at(&self, coords: Coord2) -> EngineCell {
        self.board[coords.to_nd_index()]
    }

    pub fn is_revealed(&self, coords: Coord2) -> bool {
        self.cell_at(coords).is_revealed()
    }

    pub fn is_flagged(&self, coords: Coord2) -> bool {
        self.cell_at(coords).is_flagged()
    }

    /// `None` until mines have been placed.
    pub fn value_at(&self, coords: Coord2) -> Option<CellValue> {
        self.mine_layout.as_ref().map(|layout| layout[coords])
    }

    pub fn has_mine_at(&self, coords: Coord2) -> bool {
        self.value_at(coords).is_some_and(CellValue::is_mine)
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Time since mines were placed as seen at `now`, frozen once the game is finished.
    pub fn elapsed_at(&self, now: Instant) -> Duration {
        match self.started_at {
            Some(started_at) => self
                .ended_at
                .unwrap_or(now)
                .saturating_duration_since(started_at),
            None => Duration::ZERO,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Instant::now())
    }

    /// How many seconds have passed since game started, 0 if it hasn't started
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed().as_secs()
    }

    /// Resolved view of a cell for drawing. Mines and wrong flags only surface after a loss.
    pub fn tile_at(&self, coords: Coord2) -> Tile {
        let lost = matches!(self.outcome, Outcome::Lost);
        match self.cell_at(coords) {
            EngineCell::Revealed(CellValue::Count(count)) => Tile::Open(count),
            EngineCell::Revealed(CellValue::Mine) => Tile::Exploded,
            EngineCell::Flagged if lost && !self.has_mine_at(coords) => Tile::IncorrectFlag,
            EngineCell::Flagged => Tile::Flag,
            EngineCell::Hidden if lost && self.has_mine_at(coords) => Tile::Mine,
            EngineCell::Hidden => Tile::Closed,
        }
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> MarkOutcome {
        use EngineCell::*;
        use MarkOutcome::*;

        if !self.accepts(coords) {
            return NoChange;
        }

        match self.cell_at(coords) {
            Hidden => {
                self.board[coords.to_nd_index()] = Flagged;
                self.flag_count += 1;
                Changed
            }
            Flagged => {
                self.board[coords.to_nd_index()] = Hidden;
                self.flag_count -= 1;
                Changed
            }
            Revealed(_) => NoChange,
        }
    }

    pub fn reveal(&mut self, coords: Coord2) -> RevealOutcome {
        if !self.accepts(coords) || self.cell_at(coords) != EngineCell::Hidden {
            return RevealOutcome::NoChange;
        }

        if !self.place_mines(coords) {
            return RevealOutcome::NoChange;
        }
        self.reveal_cell(coords)
    }

    /// Reveals every hidden neighbor of a numbered cell once exactly that many neighbors are flagged.
    pub fn chord(&mut self, coords: Coord2) -> RevealOutcome {
        if !self.accepts(coords) {
            return RevealOutcome::NoChange;
        }

        let EngineCell::Revealed(CellValue::Count(count @ 1..)) = self.cell_at(coords) else {
            return RevealOutcome::NoChange;
        };

        let flagged = self
            .neighbors(coords)
            .filter(|&pos| self.is_flagged(pos))
            .count();
        if flagged != usize::from(count) {
            log::trace!("Chord at {:?} skipped, {} flags for {}", coords, flagged, count);
            return RevealOutcome::NoChange;
        }

        self.neighbors(coords)
            .map(|pos| self.reveal_cell(pos))
            .fold(RevealOutcome::NoChange, BitOr::bitor)
    }

    fn accepts(&self, coords: Coord2) -> bool {
        if !self.config.contains(coords) {
            log::warn!("Ignoring out-of-range coordinates {:?}", coords);
            return false;
        }
        !self.outcome.is_finished()
    }

    /// Returns whether a layout is in place afterwards.
    fn place_mines(&mut self, anchor: Coord2) -> bool {
        if self.mine_layout.is_some() {
            return true;
        }

        let layout = self.generator.generate(self.config, anchor);
        if layout.size() != self.config.size {
            log::error!(
                "Generator returned a {:?} layout for a {:?} board, discarding it",
                layout.size(),
                self.config.size
            );
            return false;
        }
        self.mine_layout = Some(layout);

        let now = Instant::now();
        self.started_at = Some(now);
        log::debug!("Mines placed, anchor {:?}, started at {:?}", anchor, now);
        true
    }

    /// Opens a single hidden cell and flood-fills from it when it has no adjacent mines.
    fn reveal_cell(&mut self, coords: Coord2) -> RevealOutcome {
        if self.cell_at(coords) != EngineCell::Hidden {
            return RevealOutcome::NoChange;
        }

        let value = self.layout_value(coords);
        self.board[coords.to_nd_index()] = EngineCell::Revealed(value);

        let CellValue::Count(count) = value else {
            log::debug!("Hit mine at {:?}", coords);
            self.triggered_mine.get_or_insert(coords);
            self.end_game(Outcome::Lost);
            return RevealOutcome::HitMine;
        };

        self.revealed_count += 1;
        log::debug!("Open cell at {:?}, mine count: {}", coords, count);

        if count == 0 {
            self.flood_from(coords);
        }

        if self.revealed_count == self.safe_cell_count() && self.end_game(Outcome::Won) {
            RevealOutcome::Won
        } else {
            RevealOutcome::Revealed
        }
    }

    fn flood_from(&mut self, origin: Coord2) {
        let mut to_visit: Vec<Coord2> = self.hidden_neighbors(origin).collect();
        log::trace!("Starting flood-fill from {:?}, initial neighbors: {:?}", origin, to_visit);

        while let Some(visit_coords) = to_visit.pop() {
            // may have been opened since it was queued
            if self.cell_at(visit_coords) != EngineCell::Hidden {
                continue;
            }

            // neighbors of a zero are never mines
            let value = self.layout_value(visit_coords);
            self.board[visit_coords.to_nd_index()] = EngineCell::Revealed(value);
            self.revealed_count += 1;
            log::trace!("Flood opened cell at {:?}, value: {:?}", visit_coords, value);

            if value == CellValue::Count(0) {
                to_visit.extend(self.hidden_neighbors(visit_coords));
            }
        }
    }

    /// Returns whether this call finished the game.
    fn end_game(&mut self, outcome: Outcome) -> bool {
        if self.outcome.is_finished() {
            return false;
        }

        let now = Instant::now();
        self.outcome = outcome;
        self.ended_at = Some(now);
        log::debug!("Game ended {:?} at {:?}", outcome, now);
        true
    }

    fn layout_value(&self, coords: Coord2) -> CellValue {
        self.mine_layout
            .as_ref()
            .map_or(CellValue::Count(0), |layout| layout[coords])
    }

    fn safe_cell_count(&self) -> CellCount {
        self.mine_layout
            .as_ref()
            .map_or(self.config.safe_cells(), MineLayout::safe_cell_count)
    }

    fn neighbors(&self, coords: Coord2) -> NeighborIter {
        NeighborIter::new(coords, self.config.size)
    }

    fn hidden_neighbors(&self, coords: Coord2) -> impl Iterator<Item = Coord2> + '_ {
        self.neighbors(coords)
            .filter(|&pos| self.cell_at(pos) == EngineCell::Hidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(size: Coord2, mines: &[Coord2]) -> PlayEngine<MineLayout> {
        PlayEngine::with_layout(MineLayout::from_mine_coords(size, mines).unwrap())
    }

    fn revealed_cells<G: MinefieldGenerator>(engine: &PlayEngine<G>) -> Vec<Coord2> {
        let (w, h) = engine.size();
        (0..w)
            .flat_map(|x| (0..h).map(move |y| (x, y)))
            .filter(|&pos| engine.is_revealed(pos))
            .collect()
    }

    #[test]
    fn first_reveal_places_mines_around_anchor() {
        for seed in 0..25 {
            let mut engine = PlayEngine::with_seed(GameConfig::REFERENCE, seed);
            assert!(!engine.mines_placed());
            assert_eq!(engine.value_at((5, 5)), None);

            let outcome = engine.reveal((5, 5));

            assert!(engine.mines_placed());
            assert!(engine.started_at().is_some());
            assert_ne!(outcome, RevealOutcome::HitMine);
            assert_eq!(engine.cell_at((5, 5)), EngineCell::Revealed(CellValue::Count(0)));
            for pos in NeighborIter::new((5, 5), engine.size()) {
                assert!(engine.is_revealed(pos), "seed {seed} {pos:?}");
            }
        }
    }

    #[test]
    fn win_needs_every_safe_cell() {
        let mut engine = engine((2, 2), &[(1, 1)]);

        assert_eq!(engine.reveal((0, 0)), RevealOutcome::Revealed);
        assert_eq!(engine.cell_at((0, 0)), EngineCell::Revealed(CellValue::Count(1)));
        assert_eq!(engine.reveal((1, 0)), RevealOutcome::Revealed);
        assert_eq!(engine.outcome(), Outcome::InProgress);

        assert_eq!(engine.reveal((0, 1)), RevealOutcome::Won);
        assert_eq!(engine.outcome(), Outcome::Won);
        assert!(!engine.is_revealed((1, 1)));
    }

    #[test]
    fn revealing_last_hidden_mine_loses() {
        let mut engine = engine((2, 2), &[(1, 1)]);

        engine.reveal((0, 0));
        engine.reveal((1, 0));
        assert_eq!(engine.reveal((1, 1)), RevealOutcome::HitMine);
        assert_eq!(engine.outcome(), Outcome::Lost);
    }

    #[test]
    fn mine_reveal_does_not_cascade() {
        let mut engine = engine((3, 3), &[(1, 1)]);

        let outcome = engine.reveal((1, 1));

        assert_eq!(outcome, RevealOutcome::HitMine);
        assert_eq!(engine.outcome(), Outcome::Lost);
        assert_eq!(engine.triggered_mine(), Some((1, 1)));
        assert_eq!(revealed_cells(&engine), vec![(1, 1)]);
    }

    #[test]
    fn reveal_is_idempotent() {
        let mut engine = engine((3, 1), &[(2, 0)]);

        assert_eq!(engine.reveal((1, 0)), RevealOutcome::Revealed);
        let before = engine.clone();

        assert_eq!(engine.reveal((1, 0)), RevealOutcome::NoChange);
        assert_eq!(engine, before);
    }

    #[test]
    fn flood_opens_zero_region_and_its_border() {
        // a full column of mines at x = 2 walls off the right side
        let mut engine = engine((5, 3), &[(2, 0), (2, 1), (2, 2)]);

        assert_eq!(engine.reveal((0, 0)), RevealOutcome::Revealed);

        assert_eq!(
            revealed_cells(&engine),
            vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]
        );
        assert_eq!(engine.cell_at((1, 1)), EngineCell::Revealed(CellValue::Count(3)));
        assert_eq!(engine.outcome(), Outcome::InProgress);
    }

    #[test]
    fn flood_skips_flagged_cells() {
        let mut engine = engine((5, 3), &[(2, 0), (2, 1), (2, 2)]);

        engine.toggle_flag((0, 2));
        engine.reveal((0, 0));

        assert_eq!(engine.cell_at((0, 2)), EngineCell::Flagged);
        assert!(engine.is_revealed((1, 2)));
        assert_eq!(revealed_cells(&engine).len(), 5);
    }

    #[test]
    fn flood_on_open_board_wins_immediately() {
        let mut engine = engine((3, 3), &[(2, 2)]);

        assert_eq!(engine.reveal((0, 0)), RevealOutcome::Won);
        assert_eq!(engine.cell_at((1, 1)), EngineCell::Revealed(CellValue::Count(1)));
        assert_eq!(engine.cell_at((2, 2)), EngineCell::Hidden);
    }

    #[test]
    fn toggle_flag_round_trips() {
        let mut engine = engine((3, 3), &[(0, 0)]);
        let before = engine.clone();

        assert_eq!(engine.toggle_flag((2, 2)), MarkOutcome::Changed);
        assert!(engine.is_flagged((2, 2)));
        assert_eq!(engine.flag_count(), 1);

        assert_eq!(engine.toggle_flag((2, 2)), MarkOutcome::Changed);
        assert_eq!(engine, before);
        assert_eq!(engine.flag_count(), 0);
    }

    #[test]
    fn flags_do_not_stick_to_revealed_cells() {
        let mut engine = engine((3, 1), &[(2, 0)]);
        engine.reveal((1, 0));

        assert_eq!(engine.toggle_flag((1, 0)), MarkOutcome::NoChange);
        assert_eq!(engine.flag_count(), 0);
    }

    #[test]
    fn revealing_a_flag_is_a_no_op() {
        let mut engine = engine((3, 1), &[(2, 0)]);
        engine.toggle_flag((0, 0));

        assert_eq!(engine.reveal((0, 0)), RevealOutcome::NoChange);
        assert!(!engine.mines_placed());
    }

    #[test]
    fn over_flagging_goes_negative() {
        let mut engine = engine((2, 2), &[(0, 0)]);
        for pos in [(0, 0), (0, 1), (1, 0)] {
            engine.toggle_flag(pos);
        }

        assert_eq!(engine.flag_count(), 3);
        assert_eq!(engine.mines_left(), -2);
    }

    #[test]
    fn chord_reveals_when_flags_match() {
        let mines = &[(0, 1), (2, 1)];
        let mut engine = engine((3, 3), mines);

        engine.reveal((1, 1));
        engine.toggle_flag((0, 1));
        engine.toggle_flag((2, 1));

        let outcome = engine.chord((1, 1));

        assert_eq!(outcome, RevealOutcome::Won);
        assert_eq!(engine.cell_at((1, 0)), EngineCell::Revealed(CellValue::Count(2)));
        assert_eq!(engine.cell_at((1, 2)), EngineCell::Revealed(CellValue::Count(2)));
        assert_eq!(engine.cell_at((0, 0)), EngineCell::Revealed(CellValue::Count(1)));
    }

    #[test]
    fn chord_with_flag_mismatch_changes_nothing() {
        let mut engine = engine((3, 3), &[(0, 1), (2, 1)]);

        engine.reveal((1, 1));
        engine.toggle_flag((0, 1));
        let before = engine.clone();

        assert_eq!(engine.chord((1, 1)), RevealOutcome::NoChange);
        assert_eq!(engine, before);

        // too many flags is a mismatch as well
        engine.toggle_flag((2, 1));
        engine.toggle_flag((1, 0));
        let before = engine.clone();
        assert_eq!(engine.chord((1, 1)), RevealOutcome::NoChange);
        assert_eq!(engine, before);
    }

    #[test]
    fn chord_on_wrong_flag_hits_mine_and_opens_the_rest() {
        let mut engine = engine((3, 3), &[(0, 0)]);

        engine.reveal((1, 1));
        engine.toggle_flag((2, 2));

        assert_eq!(engine.chord((1, 1)), RevealOutcome::HitMine);
        assert_eq!(engine.outcome(), Outcome::Lost);
        assert_eq!(engine.triggered_mine(), Some((0, 0)));
        assert!(engine.is_revealed((2, 0)));
        assert!(engine.is_flagged((2, 2)));
    }

    #[test]
    fn chord_ignores_unrevealed_and_zero_cells() {
        let mut engine = engine((5, 3), &[(2, 0), (2, 1), (2, 2)]);

        assert_eq!(engine.chord((4, 1)), RevealOutcome::NoChange);

        engine.reveal((0, 0));
        let before = engine.clone();
        assert_eq!(engine.chord((0, 1)), RevealOutcome::NoChange);
        assert_eq!(engine, before);
    }

    #[test]
    fn finished_game_ignores_moves() {
        let mut engine = engine((3, 1), &[(0, 0)]);
        engine.reveal((0, 0));
        let before = engine.clone();

        assert_eq!(engine.reveal((2, 0)), RevealOutcome::NoChange);
        assert_eq!(engine.toggle_flag((2, 0)), MarkOutcome::NoChange);
        assert_eq!(engine, before);
    }

    #[test]
    fn out_of_range_is_ignored() {
        let mut engine = engine((2, 2), &[(0, 0)]);

        assert_eq!(engine.reveal((2, 0)), RevealOutcome::NoChange);
        assert_eq!(engine.toggle_flag((0, 9)), MarkOutcome::NoChange);
        assert_eq!(engine.chord((5, 5)), RevealOutcome::NoChange);
        assert!(!engine.mines_placed());
    }

    #[test]
    fn layout_of_another_size_is_refused() {
        let layout = MineLayout::from_mine_coords((2, 2), &[(0, 0)]).unwrap();
        let mut engine = PlayEngine::new(GameConfig::new_unchecked((3, 3), 1), layout);

        assert_eq!(engine.reveal((2, 2)), RevealOutcome::NoChange);
        assert!(!engine.mines_placed());
        assert!(!engine.is_revealed((2, 2)));
        assert_eq!(engine.started_at(), None);
        assert_eq!(engine.outcome(), Outcome::InProgress);
    }

    #[test]
    fn reset_restores_pristine_board() {
        let mut lost = engine((3, 3), &[(1, 1)]);
        lost.toggle_flag((0, 0));
        lost.reveal((1, 1));

        let mut won = engine((3, 3), &[(2, 2)]);
        won.reveal((0, 0));

        let mut mid_game = PlayEngine::with_seed(GameConfig::REFERENCE, 9);
        mid_game.reveal((3, 3));
        mid_game.toggle_flag((15, 15));

        assert_eq!(lost.outcome(), Outcome::Lost);
        assert_eq!(won.outcome(), Outcome::Won);

        for mut engine in [lost, won] {
            engine.reset();
            assert_pristine(&engine);
        }
        mid_game.reset();
        assert_pristine(&mid_game);
    }

    fn assert_pristine<G: MinefieldGenerator>(engine: &PlayEngine<G>) {
        assert!(!engine.mines_placed());
        assert_eq!(engine.outcome(), Outcome::InProgress);
        assert_eq!(engine.flag_count(), 0);
        assert_eq!(engine.triggered_mine(), None);
        assert_eq!(engine.started_at(), None);
        assert_eq!(engine.elapsed(), Duration::ZERO);
        assert!(engine.board.iter().all(|&cell| cell == EngineCell::Hidden));
    }

    #[test]
    fn elapsed_freezes_at_end() {
        let mut engine = engine((3, 1), &[(2, 0)]);
        assert_eq!(engine.elapsed_at(Instant::now()), Duration::ZERO);

        engine.reveal((1, 0));
        let started_at = engine.started_at().unwrap();
        assert_eq!(
            engine.elapsed_at(started_at + Duration::from_secs(5)),
            Duration::from_secs(5)
        );

        engine.reveal((0, 0));
        assert_eq!(engine.outcome(), Outcome::Won);
        let frozen = engine.elapsed_at(started_at + Duration::from_secs(3600));
        assert!(frozen < Duration::from_secs(3600));
        assert_eq!(frozen, engine.elapsed());
    }

    #[test]
    fn tiles_show_mines_and_wrong_flags_after_loss() {
        let mut engine = engine((4, 1), &[(0, 0), (2, 0)]);
        assert_eq!(engine.reveal((3, 0)), RevealOutcome::Revealed);
        assert_eq!(engine.toggle_flag((2, 0)), MarkOutcome::Changed);
        assert_eq!(engine.outcome(), Outcome::InProgress);
        assert_eq!(engine.tile_at((0, 0)), Tile::Closed);
        assert_eq!(engine.tile_at((2, 0)), Tile::Flag);

        assert_eq!(engine.reveal((0, 0)), RevealOutcome::HitMine);

        assert_eq!(engine.outcome(), Outcome::Lost);
        assert_eq!(engine.tile_at((0, 0)), Tile::Exploded);
        assert_eq!(engine.tile_at((1, 0)), Tile::Closed);
        assert_eq!(engine.tile_at((2, 0)), Tile::Flag);
        assert_eq!(engine.tile_at((3, 0)), Tile::Open(1));

        let mut engine = engine_with_wrong_flag();
        assert_eq!(engine.reveal((0, 0)), RevealOutcome::HitMine);
        assert_eq!(engine.tile_at((1, 0)), Tile::IncorrectFlag);
        assert_eq!(engine.tile_at((2, 0)), Tile::Mine);
    }

    fn engine_with_wrong_flag() -> PlayEngine<MineLayout> {
        let mut engine = engine((4, 1), &[(0, 0), (2, 0)]);
        engine.reveal((3, 0));
        engine.toggle_flag((1, 0));
        engine
    }
}
