//! Mapping from raw pointer and key events to engine commands.
//!
//! Front ends feed pixel positions relative to the top-left corner of the play area, the top
//! `margin` pixels of which are reserved for status text. Anything that does not land on a grid
//! cell is dropped here, so the engine only ever sees in-range coordinates.

use serde::{Deserialize, Serialize};

use crate::*;

/// Pixel layout of the board: square cells below a status margin.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardGeometry {
    pub cell_size: u16,
    pub margin: u16,
}

impl BoardGeometry {
    /// 60px cells under an 80px status bar.
    pub const REFERENCE: Self = Self {
        cell_size: 60,
        margin: 80,
    };

    /// Grid cell under the pixel, `None` when it falls in the margin or outside the board.
    pub fn pixel_to_cell(&self, (px, py): (i32, i32), size: Coord2) -> Option<Coord2> {
        let cell_size = i32::from(self.cell_size.max(1));
        let grid_x = px.div_euclid(cell_size);
        let grid_y = py.saturating_sub(i32::from(self.margin)).div_euclid(cell_size);

        let coords = (Coord::try_from(grid_x).ok()?, Coord::try_from(grid_y).ok()?);
        in_bounds(coords, size).then_some(coords)
    }

    /// Top-left pixel of a cell.
    pub fn cell_origin(&self, (x, y): Coord2) -> (u32, u32) {
        let cell_size = u32::from(self.cell_size);
        (
            u32::from(x) * cell_size,
            u32::from(y) * cell_size + u32::from(self.margin),
        )
    }

    /// Width and height of the whole play area, margin included.
    pub fn canvas_size(&self, (w, h): Coord2) -> (u32, u32) {
        self.cell_origin((w, h))
    }
}

impl Default for BoardGeometry {
    fn default() -> Self {
        Self::REFERENCE
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerButton {
    Primary,
    Secondary,
    Other,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    Pointer {
        position: (i32, i32),
        button: PointerButton,
    },
    Key(char),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Reveal(Coord2),
    Chord(Coord2),
    ToggleFlag(Coord2),
    Reset,
}

/// Turns input into commands and refuses moves once the game is over.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Controller {
    geometry: BoardGeometry,
}

impl Controller {
    pub const RESET_KEYS: [char; 2] = ['r', 'R'];

    pub const fn new(geometry: BoardGeometry) -> Self {
        Self { geometry }
    }

    pub const fn geometry(&self) -> BoardGeometry {
        self.geometry
    }

    pub fn translate<G>(&self, engine: &PlayEngine<G>, event: InputEvent) -> Option<Command>
    where
        G: MinefieldGenerator,
    {
        match event {
            InputEvent::Key(key) if Self::RESET_KEYS.contains(&key) => Some(Command::Reset),
            InputEvent::Key(_) => None,
            InputEvent::Pointer { .. } if engine.is_finished() => None,
            InputEvent::Pointer { position, button } => {
                let coords = self.geometry.pixel_to_cell(position, engine.size())?;
                match button {
                    PointerButton::Primary if engine.is_revealed(coords) => Some(Command::Chord(coords)),
                    PointerButton::Primary => Some(Command::Reveal(coords)),
                    PointerButton::Secondary => Some(Command::ToggleFlag(coords)),
                    PointerButton::Other => None,
                }
            }
        }
    }

    /// Applies a command, returns whether anything visible changed.
    pub fn dispatch<G>(engine: &mut PlayEngine<G>, command: Command) -> bool
    where
        G: MinefieldGenerator,
    {
        if engine.is_finished() && command != Command::Reset {
            log::debug!("Game is over, dropping {:?}", command);
            return false;
        }

        log::trace!("Dispatching {:?}", command);
        match command {
            Command::Reveal(coords) => engine.reveal(coords).has_update(),
            Command::Chord(coords) => engine.chord(coords).has_update(),
            Command::ToggleFlag(coords) => engine.toggle_flag(coords).has_update(),
            Command::Reset => {
                engine.reset();
                true
            }
        }
    }

    /// Translate and dispatch in one go.
    pub fn handle<G>(&self, engine: &mut PlayEngine<G>, event: InputEvent) -> bool
    where
        G: MinefieldGenerator,
    {
        self.translate(engine, event)
            .is_some_and(|command| Self::dispatch(engine, command))
    }
}
