//! Mapping between sub-cube grid positions and facelet cells.
//!
//! Each face is read as if the viewer is looking straight at it from
//! outside the cube: Up with Back at the top edge, Down with Front at the
//! top edge, and the four side faces with Up at the top edge. Coordinates
//! are in `{-1, 0, 1}` with x to the right, y up and z towards the viewer.

use glam::IVec3;

use crate::facelet::Face;

/// Row and column of a sticker within its face block, each in `0..3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub fn from_index(index: usize) -> Option<Self> {
        (index < 9).then_some(Self {
            row: index / 3,
            col: index % 3,
        })
    }

    /// Row-major offset inside the face's 9-symbol block.
    pub const fn index(self) -> usize {
        self.row * 3 + self.col
    }
}

/// Cell of `face` occupied by the sub-cube at `pos`, or `None` when that
/// sub-cube does not touch the face.
pub fn cell_for(face: Face, pos: IVec3) -> Option<Cell> {
    if pos.abs().max_element() > 1 || pos.dot(face.normal()) != 1 {
        return None;
    }

    let IVec3 { x, y, z } = pos;
    let (row, col) = match face {
        Face::Up => (z + 1, x + 1),
        Face::Down => (1 - z, x + 1),
        Face::Right => (1 - y, 1 - z),
        Face::Left => (1 - y, z + 1),
        Face::Front => (1 - y, x + 1),
        Face::Back => (1 - y, 1 - x),
    };

    Some(Cell {
        row: row as usize,
        col: col as usize,
    })
}

/// Grid position of the sub-cube that shows `cell` on `face`.
pub fn position_for(face: Face, cell: Cell) -> IVec3 {
    let row = cell.row as i32;
    let col = cell.col as i32;
    match face {
        Face::Up => IVec3::new(col - 1, 1, row - 1),
        Face::Down => IVec3::new(col - 1, -1, 1 - row),
        Face::Right => IVec3::new(1, 1 - row, 1 - col),
        Face::Left => IVec3::new(-1, 1 - row, col - 1),
        Face::Front => IVec3::new(col - 1, 1 - row, 1),
        Face::Back => IVec3::new(1 - col, 1 - row, -1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facelet::FACE_ORDER;

    fn grid() -> impl Iterator<Item = IVec3> {
        (-1..=1).flat_map(|x| {
            (-1..=1).flat_map(move |y| (-1..=1).map(move |z| IVec3::new(x, y, z)))
        })
    }

    #[test]
    fn every_face_has_nine_cells() {
        for face in FACE_ORDER {
            let mut cells: Vec<usize> = grid()
                .filter_map(|pos| cell_for(face, pos))
                .map(Cell::index)
                .collect();
            cells.sort_unstable();
            assert_eq!(cells, (0..9).collect::<Vec<_>>(), "face {face}");
        }
    }

    #[test]
    fn inverse_mapping_round_trips() {
        for face in FACE_ORDER {
            for index in 0..9 {
                let cell = Cell::from_index(index).unwrap();
                let pos = position_for(face, cell);
                assert_eq!(cell_for(face, pos), Some(cell), "face {face} cell {index}");
            }
        }
    }

    #[test]
    fn inner_cubies_touch_nothing() {
        for face in FACE_ORDER {
            assert_eq!(cell_for(face, IVec3::ZERO), None);
        }
        assert_eq!(cell_for(Face::Up, IVec3::new(1, 0, 1)), None);
        assert_eq!(cell_for(Face::Up, IVec3::new(0, 2, 0)), None);
    }

    #[test]
    fn viewing_conventions() {
        // Up: back-left corner is the first sticker.
        assert_eq!(cell_for(Face::Up, IVec3::new(-1, 1, -1)).map(Cell::index), Some(0));
        // Front: top-left seen from the front.
        assert_eq!(cell_for(Face::Front, IVec3::new(-1, 1, 1)).map(Cell::index), Some(0));
        // Right: the front edge is on the left when facing the right side.
        assert_eq!(cell_for(Face::Right, IVec3::new(1, 1, 1)).map(Cell::index), Some(0));
        // Back: mirrored in x.
        assert_eq!(cell_for(Face::Back, IVec3::new(1, 1, -1)).map(Cell::index), Some(0));
        // Down: the front edge is on top.
        assert_eq!(cell_for(Face::Down, IVec3::new(-1, -1, 1)).map(Cell::index), Some(0));
        // Left: the back edge is on the left.
        assert_eq!(cell_for(Face::Left, IVec3::new(-1, 1, -1)).map(Cell::index), Some(0));
    }
}
