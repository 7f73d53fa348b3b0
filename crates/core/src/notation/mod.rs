//! Move notation: whitespace separated tokens such as `R`, `U'` or `F2`.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{facelet::Face, CubeVizError, Result};

/// Direction and size of a face turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Turn {
    Clockwise,
    CounterClockwise,
    Double,
}

impl Turn {
    /// Signed number of quarter turns, clockwise positive.
    pub const fn quarter_turns(self) -> i32 {
        match self {
            Self::Clockwise => 1,
            Self::CounterClockwise => -1,
            Self::Double => 2,
        }
    }

    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Clockwise => "",
            Self::CounterClockwise => "'",
            Self::Double => "2",
        }
    }
}

/// A single parsed face turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub face: Face,
    pub turn: Turn,
}

impl Move {
    pub const fn new(face: Face, turn: Turn) -> Self {
        Self { face, turn }
    }

    pub const fn quarter_turns(self) -> i32 {
        self.turn.quarter_turns()
    }

    /// The move that undoes this one.
    pub const fn inverse(self) -> Self {
        let turn = match self.turn {
            Turn::Clockwise => Turn::CounterClockwise,
            Turn::CounterClockwise => Turn::Clockwise,
            Turn::Double => Turn::Double,
        };
        Self::new(self.face, turn)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.face, self.turn.suffix())
    }
}

impl FromStr for Move {
    type Err = CubeVizError;

    /// The first character names the face. A trailing `'` reverses the
    /// turn and a trailing `2` doubles it; anything else is a single
    /// clockwise quarter turn.
    fn from_str(token: &str) -> Result<Self> {
        let face = token
            .chars()
            .next()
            .and_then(Face::from_letter)
            .ok_or_else(|| CubeVizError::msg(format!("unknown move `{token}`")))?;

        let turn = if token.ends_with('\'') {
            Turn::CounterClockwise
        } else if token.len() > 1 && token.ends_with('2') {
            Turn::Double
        } else {
            Turn::Clockwise
        };

        Ok(Self::new(face, turn))
    }
}

/// One entry of a move list. Tokens that do not name a face are kept so
/// they can still be shown, but carry no move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveToken {
    pub text: String,
    pub parsed: Option<Move>,
}

/// Splits a move string into tokens, keeping unrecognised ones.
pub fn tokenize(sequence: &str) -> Vec<MoveToken> {
    sequence
        .split_whitespace()
        .map(|text| MoveToken {
            text: text.to_string(),
            parsed: text.parse().ok(),
        })
        .collect()
}

/// Parses a move string into turns, skipping tokens that name no face.
pub fn parse_moves(sequence: &str) -> Vec<Move> {
    tokenize(sequence)
        .into_iter()
        .filter_map(|token| token.parsed)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_suffixes() {
        assert_eq!(
            parse_moves("R U' F2"),
            vec![
                Move::new(Face::Right, Turn::Clockwise),
                Move::new(Face::Up, Turn::CounterClockwise),
                Move::new(Face::Front, Turn::Double),
            ]
        );
    }

    #[test]
    fn tolerates_irregular_whitespace() {
        assert_eq!(tokenize("  R\tU \n  D ").len(), 3);
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn unknown_faces_are_kept_but_skipped() {
        let tokens = tokenize("R X U");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].text, "X");
        assert_eq!(tokens[1].parsed, None);

        assert_eq!(parse_moves("R X U").len(), 2);
    }

    #[test]
    fn quarter_turn_counts() {
        assert_eq!("B".parse::<Move>().unwrap().quarter_turns(), 1);
        assert_eq!("B'".parse::<Move>().unwrap().quarter_turns(), -1);
        assert_eq!("B2".parse::<Move>().unwrap().quarter_turns(), 2);
    }

    #[test]
    fn display_round_trips_notation() {
        for token in ["U", "D'", "L2"] {
            assert_eq!(token.parse::<Move>().unwrap().to_string(), token);
        }
        let mv: Move = "F'".parse().unwrap();
        assert_eq!(mv.inverse().to_string(), "F");
    }
}
