use sapper_core::Tile;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn css(self) -> String {
        let Self(r, g, b) = self;
        format!("rgb({r}, {g}, {b})")
    }
}

/// Resolved color table handed to the board at construction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub background: Rgb,
    pub cell: Rgb,
    pub cell_pressed: Rgb,
    pub cell_border: Rgb,
    pub cell_highlight: Rgb,
    pub cell_shadow: Rgb,
    pub mine: Rgb,
    pub flag: Rgb,
    pub text: Rgb,
    pub won: Rgb,
    pub lost: Rgb,
    /// Colors for counts 1 through 8.
    pub numbers: [Rgb; 8],
}

impl Palette {
    pub const CLASSIC: Self = Self {
        background: Rgb(192, 192, 192),
        cell: Rgb(128, 128, 128),
        cell_pressed: Rgb(200, 200, 200),
        cell_border: Rgb(100, 100, 100),
        cell_highlight: Rgb(255, 255, 255),
        cell_shadow: Rgb(64, 64, 64),
        mine: Rgb(255, 0, 0),
        flag: Rgb(255, 0, 0),
        text: Rgb(0, 0, 0),
        won: Rgb(0, 200, 0),
        lost: Rgb(200, 0, 0),
        numbers: [
            Rgb(0, 0, 255),
            Rgb(0, 128, 0),
            Rgb(255, 0, 0),
            Rgb(0, 0, 128),
            Rgb(128, 0, 0),
            Rgb(0, 128, 128),
            Rgb(0, 0, 0),
            Rgb(128, 128, 128),
        ],
    };

    /// Color of a count label, `None` for zero which is drawn blank.
    pub fn number(&self, count: u8) -> Option<Rgb> {
        let index = usize::from(count).checked_sub(1)?;
        self.numbers.get(index).copied()
    }

    /// Inline css for the background and border of a tile face.
    pub fn face_css(&self, tile: Tile) -> String {
        if tile.is_closed() {
            let highlight = self.cell_highlight.css();
            let shadow = self.cell_shadow.css();
            format!(
                "background: {}; border: 2px solid; border-color: {highlight} {shadow} {shadow} {highlight};",
                self.cell.css()
            )
        } else {
            format!(
                "background: {}; border: 1px solid {};",
                self.cell_pressed.css(),
                self.cell_border.css()
            )
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::CLASSIC
    }
}
