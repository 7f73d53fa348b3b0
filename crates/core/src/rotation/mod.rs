//! Face turns as rigid rotations of a temporary pivot.
//!
//! A turn captures the world pose of every sub-cube in the turning layer,
//! re-expresses it relative to a pivot at the cube centre, spins the pivot
//! about the face axis, then writes the resulting world poses back and
//! drops the pivot. Opposite faces share an axis, so each face carries a
//! sign that turns "clockwise as seen from outside" into an angle about
//! the shared axis.

use std::{f32::consts::FRAC_PI_2, time::Duration};

use glam::{Quat, Vec3};
use tracing::debug;

use crate::{
    config::ModelConfig,
    facelet::Face,
    model::{CubeModel, Pose},
    notation::Move,
};

/// Axis the layer of `face` rotates about. Opposite faces share one.
pub fn axis_for_face(face: Face) -> Vec3 {
    match face {
        Face::Up | Face::Down => Vec3::Y,
        Face::Right | Face::Left => Vec3::X,
        Face::Front | Face::Back => Vec3::Z,
    }
}

/// Sign turning a clockwise quarter of `face` into a right-handed angle
/// about [`axis_for_face`].
pub fn sign_for_face(face: Face) -> f32 {
    match face {
        Face::Up | Face::Right | Face::Front => -1.0,
        Face::Down | Face::Left | Face::Back => 1.0,
    }
}

/// Total pivot angle for a move, in radians.
pub fn turn_angle(mv: Move) -> f32 {
    FRAC_PI_2 * mv.quarter_turns() as f32 * sign_for_face(mv.face)
}

/// Selects layers and starts turns against a [`CubeModel`].
#[derive(Debug, Clone)]
pub struct RotationEngine {
    selection_threshold: f32,
}

impl RotationEngine {
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            selection_threshold: config.selection_threshold,
        }
    }

    /// Ids of the sub-cubes in the layer of `face`. Positions are compared
    /// against a threshold rather than an exact coordinate so that small
    /// drift never drops a sub-cube from its layer.
    pub fn select(&self, model: &CubeModel, face: Face) -> Vec<usize> {
        let normal = face.normal().as_vec3();
        let threshold = self.selection_threshold * model.spacing();
        model
            .cubies()
            .iter()
            .filter(|cubie| cubie.pose().translation.dot(normal) > threshold)
            .map(|cubie| cubie.id())
            .collect()
    }

    /// Regroups the layer of `mv` under a fresh pivot. Returns `None` when
    /// the layer is empty, in which case nothing about the model changes.
    pub fn begin(
        &self,
        model: &CubeModel,
        mv: Move,
        quarter_turn: Duration,
    ) -> Option<RotationGroup> {
        let members = self.select(model, mv.face);
        if members.is_empty() {
            return None;
        }

        let pivot = Pose::IDENTITY;
        let to_pivot = pivot.inverse();
        let locals = members
            .iter()
            .filter_map(|id| model.cubie(*id))
            .map(|cubie| to_pivot.compose(&cubie.pose()))
            .collect();

        Some(RotationGroup {
            mv,
            members,
            locals,
            pivot,
            axis: axis_for_face(mv.face),
            total_angle: turn_angle(mv),
            duration: quarter_turn * mv.quarter_turns().unsigned_abs(),
            elapsed: Duration::ZERO,
        })
    }

    /// Performs a whole turn at once.
    pub fn apply(&self, model: &mut CubeModel, mv: Move) {
        if let Some(mut group) = self.begin(model, mv, Duration::ZERO) {
            group.finish();
            group.commit(model);
        }
    }
}

/// Sub-cubes of one layer attached to a shared pivot for the duration of a
/// single turn.
#[derive(Debug, Clone)]
pub struct RotationGroup {
    mv: Move,
    members: Vec<usize>,
    /// Member poses relative to the pivot, captured at regrouping.
    locals: Vec<Pose>,
    pivot: Pose,
    axis: Vec3,
    total_angle: f32,
    duration: Duration,
    elapsed: Duration,
}

impl RotationGroup {
    pub fn mv(&self) -> Move {
        self.mv
    }

    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Fraction of the turn completed, in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Moves the interpolation forward and re-poses the pivot.
    pub fn advance(&mut self, delta: Duration) {
        self.set_elapsed(self.elapsed + delta);
    }

    pub fn set_elapsed(&mut self, elapsed: Duration) {
        self.elapsed = elapsed.min(self.duration);
        let angle = self.total_angle * self.progress();
        self.pivot.rotation = Quat::from_axis_angle(self.axis, angle);
    }

    pub fn finish(&mut self) {
        self.set_elapsed(self.duration);
    }

    /// Current world pose of a member, or `None` for sub-cubes outside the
    /// group.
    pub fn world_pose(&self, id: usize) -> Option<Pose> {
        self.members
            .iter()
            .position(|member| *member == id)
            .map(|slot| self.pivot.compose(&self.locals[slot]))
    }

    /// Writes the members' world poses back to the model, snapped to the
    /// grid, and discards the pivot.
    pub fn commit(self, model: &mut CubeModel) {
        let spacing = model.spacing();
        for (id, local) in self.members.iter().zip(&self.locals) {
            let world = self.pivot.compose(local).snapped(spacing);
            if let Some(cubie) = model.cubie_mut(*id) {
                cubie.pose = world;
            }
        }
        debug!(mv = %self.mv, members = self.members.len(), "committed turn");
    }
}

#[cfg(test)]
mod tests {
    use glam::IVec3;

    use super::*;
    use crate::{
        facelet::{FaceletString, FACE_ORDER},
        notation::{parse_moves, Turn},
    };

    fn solved() -> CubeModel {
        CubeModel::build(&FaceletString::solved(), &ModelConfig::default())
    }

    fn engine() -> RotationEngine {
        RotationEngine::new(&ModelConfig::default())
    }

    fn apply_all(model: &mut CubeModel, moves: &str) {
        let engine = engine();
        for mv in parse_moves(moves) {
            engine.apply(model, mv);
        }
    }

    fn poses(model: &CubeModel) -> Vec<Pose> {
        model.cubies().iter().map(|cubie| cubie.pose()).collect()
    }

    #[test]
    fn every_layer_has_nine_cubies() {
        let model = solved();
        for face in FACE_ORDER {
            assert_eq!(engine().select(&model, face).len(), 9, "face {face}");
        }
    }

    #[test]
    fn move_then_inverse_restores_every_pose() {
        for face in FACE_ORDER {
            let mut model = solved();
            apply_all(&mut model, "R U F'");
            let before = poses(&model);

            let engine = engine();
            let mv = Move::new(face, Turn::Clockwise);
            engine.apply(&mut model, mv);
            engine.apply(&mut model, mv.inverse());

            for (a, b) in before.iter().zip(poses(&model)) {
                assert!(a.approx_eq(&b, 1e-5), "face {face}");
            }
        }
    }

    #[test]
    fn double_turn_twice_is_identity() {
        for face in FACE_ORDER {
            let mut model = solved();
            let before = poses(&model);
            let mv = Move::new(face, Turn::Double);
            engine().apply(&mut model, mv);
            engine().apply(&mut model, mv);
            for (a, b) in before.iter().zip(poses(&model)) {
                assert!(a.approx_eq(&b, 1e-5), "face {face}");
            }
        }
    }

    #[test]
    fn four_quarter_turns_are_identity() {
        let mut model = solved();
        apply_all(&mut model, "U U U U");
        assert_eq!(model.read_facelets().unwrap(), FaceletString::solved());
    }

    #[test]
    fn clockwise_up_moves_front_stickers_to_the_left() {
        let mut model = solved();
        apply_all(&mut model, "U");
        let state = model.read_facelets().unwrap();
        assert_eq!(&state.face(Face::Left)[..3], "FFF");
        assert_eq!(&state.face(Face::Front)[..3], "RRR");
        assert_eq!(&state.face(Face::Front)[3..], "FFFFFF");
    }

    #[test]
    fn clockwise_right_moves_front_stickers_up() {
        let mut model = solved();
        apply_all(&mut model, "R");
        let state = model.read_facelets().unwrap();
        let up = state.face(Face::Up);
        assert_eq!(up, "UUFUUFUUF");
        assert_eq!(state.face(Face::Back), "UBBUBBUBB");
    }

    #[test]
    fn known_scramble_matches_reference_state() {
        // Matches a standard cube simulator for this sequence.
        let mut model = solved();
        apply_all(&mut model, "F");
        let state = model.read_facelets().unwrap();
        assert_eq!(state.face(Face::Up), "UUUUUULLL");
        assert_eq!(state.face(Face::Right), "URRURRURR");
        assert_eq!(state.face(Face::Down), "RRRDDDDDD");
        assert_eq!(state.face(Face::Left), "LLDLLDLLD");
    }

    #[test]
    fn long_sequences_do_not_drift() {
        let mut model = solved();
        let sexy = "R U R' U' ";
        apply_all(&mut model, &sexy.repeat(6));
        assert_eq!(model.read_facelets().unwrap(), FaceletString::solved());
        for cubie in model.cubies() {
            let t = cubie.pose().translation;
            assert_eq!(t, t.round());
        }
    }

    #[test]
    fn interpolation_keeps_members_rigid() {
        let model = solved();
        let mv: Move = "R".parse().unwrap();
        let mut group = engine()
            .begin(&model, mv, Duration::from_millis(800))
            .unwrap();
        assert_eq!(group.duration(), Duration::from_millis(800));

        let id = model.cubie_at(IVec3::new(1, 1, 1)).unwrap().id();
        let start = group.world_pose(id).unwrap();
        assert!(start.approx_eq(&model.cubie(id).unwrap().pose(), 1e-6));

        group.advance(Duration::from_millis(400));
        assert!((group.progress() - 0.5).abs() < 1e-6);
        let halfway = group.world_pose(id).unwrap();
        // Distance from the axis is preserved mid-turn.
        let radius = |p: Vec3| (p.y * p.y + p.z * p.z).sqrt();
        assert!((radius(halfway.translation) - radius(start.translation)).abs() < 1e-5);
        assert!((halfway.translation.x - 1.0).abs() < 1e-5);
        assert!(!group.is_finished());

        assert_eq!(group.world_pose(model.cubie_at(IVec3::new(-1, 0, 0)).unwrap().id()), None);
    }

    #[test]
    fn double_turns_take_twice_as_long() {
        let model = solved();
        let single = engine()
            .begin(&model, "L".parse().unwrap(), Duration::from_millis(800))
            .unwrap();
        let double = engine()
            .begin(&model, "L2".parse().unwrap(), Duration::from_millis(800))
            .unwrap();
        let reverse = engine()
            .begin(&model, "L'".parse().unwrap(), Duration::from_millis(800))
            .unwrap();
        assert_eq!(double.duration(), single.duration() * 2);
        assert_eq!(reverse.duration(), single.duration());
    }

    #[test]
    fn opposite_faces_turn_in_opposite_senses() {
        let up: Move = "U".parse().unwrap();
        let down: Move = "D".parse().unwrap();
        assert_eq!(axis_for_face(Face::Up), axis_for_face(Face::Down));
        assert!((turn_angle(up) + turn_angle(down)).abs() < 1e-6);
    }

    #[test]
    fn empty_layer_is_a_no_op() {
        let config = ModelConfig {
            selection_threshold: 5.0,
            ..ModelConfig::default()
        };
        let engine = RotationEngine::new(&config);
        let mut model = solved();
        let before = poses(&model);
        assert!(engine.begin(&model, "R".parse().unwrap(), Duration::from_millis(800)).is_none());
        engine.apply(&mut model, "R".parse().unwrap());
        assert_eq!(before, poses(&model));
    }
}
