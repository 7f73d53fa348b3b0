//! The 27 rigid sub-cubes and their stickers.
//!
//! Sticker symbols are attached to a sub-cube's own local axes when the
//! model is built and never move relative to it; turns only change the
//! sub-cube's pose. Reading the current state back therefore needs the
//! inverse orientation of each sub-cube to find which local sticker faces
//! a given world direction.

use glam::{IVec3, Mat3, Quat, Vec3};
use tracing::debug;

use crate::{
    colour::RawColour,
    config::ModelConfig,
    coords::{cell_for, position_for, Cell},
    facelet::{colour_of_symbol, Face, FaceletString, CELLS_PER_FACE, FACE_ORDER},
    CubeVizError, Result,
};

/// Rigid transform of a sub-cube or of a rotation pivot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Applies `child` inside this frame.
    pub fn compose(&self, child: &Pose) -> Pose {
        Pose {
            translation: self.rotation * child.translation + self.translation,
            rotation: (self.rotation * child.rotation).normalize(),
        }
    }

    pub fn inverse(&self) -> Pose {
        let rotation = self.rotation.inverse();
        Pose {
            translation: rotation * -self.translation,
            rotation,
        }
    }

    /// Rounds the translation to the nearest lattice point and the rotation
    /// to the nearest axis-aligned orientation.
    pub fn snapped(&self, spacing: f32) -> Pose {
        let translation = (self.translation / spacing).round() * spacing;
        let m = Mat3::from_quat(self.rotation);
        let rotation = Quat::from_mat3(&Mat3::from_cols(
            m.x_axis.round(),
            m.y_axis.round(),
            m.z_axis.round(),
        ))
        .normalize();
        Pose {
            translation,
            rotation,
        }
    }

    pub fn approx_eq(&self, other: &Pose, tolerance: f32) -> bool {
        self.translation.abs_diff_eq(other.translation, tolerance)
            && self.rotation.dot(other.rotation).abs() >= 1.0 - tolerance
    }
}

/// One of the 27 sub-cubes.
#[derive(Debug, Clone)]
pub struct Cubie {
    id: usize,
    home: IVec3,
    pub(crate) pose: Pose,
    /// Sticker symbol per local side, indexed by [`Face::index`].
    stickers: [Option<char>; 6],
}

impl Cubie {
    pub fn id(&self) -> usize {
        self.id
    }

    /// Grid position at build time.
    pub fn home(&self) -> IVec3 {
        self.home
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Symbol on the side that pointed towards `side` when the model was built.
    pub fn sticker(&self, side: Face) -> Option<char> {
        self.stickers[side.index()]
    }

    pub fn sticker_colour(&self, side: Face) -> Option<RawColour> {
        self.sticker(side).and_then(colour_of_symbol)
    }

    pub fn visible_sides(&self) -> usize {
        self.stickers.iter().flatten().count()
    }

    /// Symbol currently facing the world direction of `face`, if any.
    pub fn sticker_facing(&self, face: Face) -> Option<char> {
        let local = self.pose.rotation.inverse() * face.normal().as_vec3();
        Face::from_normal(local.round().as_ivec3()).and_then(|side| self.sticker(side))
    }
}

/// The full 3x3x3 model.
#[derive(Debug, Clone)]
pub struct CubeModel {
    cubies: Vec<Cubie>,
    spacing: f32,
}

impl CubeModel {
    /// Builds the model, colouring every outward side from `facelets`.
    pub fn build(facelets: &FaceletString, config: &ModelConfig) -> Self {
        let spacing = config.spacing;
        let mut cubies = Vec::with_capacity(27);
        for x in -1..=1 {
            for y in -1..=1 {
                for z in -1..=1 {
                    let home = IVec3::new(x, y, z);
                    let stickers = FACE_ORDER.map(|face| {
                        cell_for(face, home)
                            .and_then(|cell| facelets.symbol(face, cell.index()))
                    });
                    cubies.push(Cubie {
                        id: cubies.len(),
                        home,
                        pose: Pose::new(home.as_vec3() * spacing, Quat::IDENTITY),
                        stickers,
                    });
                }
            }
        }

        debug!(facelets = %facelets, "built cube model");
        Self { cubies, spacing }
    }

    /// Validates `text` first; a malformed string is never padded or cut.
    pub fn parse(text: &str, config: &ModelConfig) -> Result<Self> {
        Ok(Self::build(&FaceletString::parse(text)?, config))
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    pub fn cubies(&self) -> &[Cubie] {
        &self.cubies
    }

    pub fn cubie(&self, id: usize) -> Option<&Cubie> {
        self.cubies.get(id)
    }

    pub(crate) fn cubie_mut(&mut self, id: usize) -> Option<&mut Cubie> {
        self.cubies.get_mut(id)
    }

    /// Current position of a sub-cube in grid units.
    pub fn grid_position(&self, id: usize) -> Option<IVec3> {
        self.cubie(id)
            .map(|cubie| (cubie.pose.translation / self.spacing).round().as_ivec3())
    }

    pub fn cubie_at(&self, pos: IVec3) -> Option<&Cubie> {
        self.cubies
            .iter()
            .find(|cubie| self.grid_position(cubie.id) == Some(pos))
    }

    /// Ids of sub-cubes that are not at their build position.
    pub fn displaced(&self) -> Vec<usize> {
        self.cubies
            .iter()
            .filter(|cubie| self.grid_position(cubie.id) != Some(cubie.home))
            .map(|cubie| cubie.id)
            .collect()
    }

    /// Reads the facelet string for the current poses.
    pub fn read_facelets(&self) -> Result<FaceletString> {
        let mut text = String::with_capacity(54);
        for face in FACE_ORDER {
            for index in 0..CELLS_PER_FACE {
                let cell = Cell::from_index(index).ok_or(CubeVizError::InvalidCell(index))?;
                let pos = position_for(face, cell);
                let symbol = self
                    .cubie_at(pos)
                    .and_then(|cubie| cubie.sticker_facing(face))
                    .ok_or_else(|| {
                        CubeVizError::msg(format!(
                            "no sticker faces {face} at {pos}; model is mid-turn or corrupt"
                        ))
                    })?;
                text.push(symbol);
            }
        }
        FaceletString::parse(&text)
    }
}
