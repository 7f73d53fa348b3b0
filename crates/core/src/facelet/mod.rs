//! Facelet strings: the 54-symbol wire encoding of every sticker on the cube.
//!
//! Blocks of nine appear in the fixed order Up, Right, Front, Down, Left,
//! Back, each read row-major while facing that side. Two alphabets are
//! accepted: the raw colour letters produced by the scanner (`W Y R O B G`)
//! and the canonical face letters used once orientation is resolved
//! (`U R F D L B`). `R` and `B` mean the same colour in both.

use std::{fmt, str::FromStr};

use glam::IVec3;
use serde::{Deserialize, Serialize};

use crate::{colour::RawColour, CubeVizError, Result};

/// Number of stickers on a 3x3x3 cube.
pub const FACELET_COUNT: usize = 54;

/// Number of stickers on one face.
pub const CELLS_PER_FACE: usize = 9;

/// Face blocks in wire order.
pub const FACE_ORDER: [Face; 6] = [
    Face::Up,
    Face::Right,
    Face::Front,
    Face::Down,
    Face::Left,
    Face::Back,
];

/// One of the six outer layers of the cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Face {
    Up,
    Right,
    Front,
    Down,
    Left,
    Back,
}

impl Face {
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'U' => Some(Self::Up),
            'R' => Some(Self::Right),
            'F' => Some(Self::Front),
            'D' => Some(Self::Down),
            'L' => Some(Self::Left),
            'B' => Some(Self::Back),
            _ => None,
        }
    }

    pub const fn letter(self) -> char {
        match self {
            Self::Up => 'U',
            Self::Right => 'R',
            Self::Front => 'F',
            Self::Down => 'D',
            Self::Left => 'L',
            Self::Back => 'B',
        }
    }

    /// Position of this face's block in the facelet string.
    pub const fn index(self) -> usize {
        match self {
            Self::Up => 0,
            Self::Right => 1,
            Self::Front => 2,
            Self::Down => 3,
            Self::Left => 4,
            Self::Back => 5,
        }
    }

    /// Outward unit normal in grid coordinates (y up, z towards the viewer).
    pub const fn normal(self) -> IVec3 {
        match self {
            Self::Up => IVec3::Y,
            Self::Down => IVec3::NEG_Y,
            Self::Right => IVec3::X,
            Self::Left => IVec3::NEG_X,
            Self::Front => IVec3::Z,
            Self::Back => IVec3::NEG_Z,
        }
    }

    pub fn from_normal(normal: IVec3) -> Option<Self> {
        FACE_ORDER.into_iter().find(|face| face.normal() == normal)
    }

    /// Sticker colour carried by this face on a solved cube.
    pub const fn solved_colour(self) -> RawColour {
        match self {
            Self::Up => RawColour::White,
            Self::Right => RawColour::Red,
            Self::Front => RawColour::Green,
            Self::Down => RawColour::Yellow,
            Self::Left => RawColour::Orange,
            Self::Back => RawColour::Blue,
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Display colour of a facelet symbol from either alphabet.
pub fn colour_of_symbol(symbol: char) -> Option<RawColour> {
    RawColour::from_letter(symbol).or_else(|| Face::from_letter(symbol).map(Face::solved_colour))
}

/// A validated 54-symbol facelet string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FaceletString(String);

impl FaceletString {
    /// Validates `text` without truncating or padding it.
    pub fn parse(text: &str) -> Result<Self> {
        let len = text.chars().count();
        if len != FACELET_COUNT {
            return Err(CubeVizError::InvalidFacelets(format!(
                "expected {FACELET_COUNT} symbols, found {len}"
            )));
        }

        if let Some((position, symbol)) = text
            .chars()
            .enumerate()
            .find(|(_, symbol)| colour_of_symbol(*symbol).is_none())
        {
            return Err(CubeVizError::InvalidFacelets(format!(
                "unknown symbol `{symbol}` at position {position}"
            )));
        }

        Ok(Self(text.to_string()))
    }

    /// The solved cube in canonical letters.
    pub fn solved() -> Self {
        Self(
            FACE_ORDER
                .iter()
                .flat_map(|face| std::iter::repeat(face.letter()).take(CELLS_PER_FACE))
                .collect(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The nine symbols of one face, row-major.
    pub fn face(&self, face: Face) -> &str {
        let start = face.index() * CELLS_PER_FACE;
        &self.0[start..start + CELLS_PER_FACE]
    }

    /// All six blocks in wire order.
    pub fn blocks(&self) -> [(Face, &str); 6] {
        FACE_ORDER.map(|face| (face, self.face(face)))
    }

    pub fn symbol(&self, face: Face, cell: usize) -> Option<char> {
        if cell >= CELLS_PER_FACE {
            return None;
        }
        self.0.as_bytes().get(face.index() * CELLS_PER_FACE + cell).map(|b| *b as char)
    }

    /// True when every symbol is a face letter.
    pub fn is_canonical(&self) -> bool {
        self.0.chars().all(|symbol| Face::from_letter(symbol).is_some())
    }
}

impl FromStr for FaceletString {
    type Err = CubeVizError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for FaceletString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
