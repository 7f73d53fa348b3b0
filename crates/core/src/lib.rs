//! Core library for the Cube Visualiser application.
//!
//! The crate covers the two halves of the pipeline. Scanning turns camera
//! frames into a facelet string through colour classification and a
//! per-face review loop. Replay builds a model of 27 rigid sub-cubes from a
//! facelet string and animates a move sequence on it, one layer turn at a
//! time, alongside a highlighted move list. Camera capture, rendering and
//! the decode/solve services live outside the crate; the latter are
//! reached through the traits in [`session`].

pub mod colour;
pub mod config;
pub mod coords;
pub mod error;
pub mod facelet;
pub mod model;
pub mod notation;
pub mod playback;
pub mod rotation;
pub mod scan;
pub mod session;

pub use colour::{
    Classification, ColourClassifier, FaceClassification, Frame, Hsv, RawColour, Rgb,
};
pub use config::{AppConfig, ModelConfig, PlaybackConfig, ReferenceColour, ScanConfig};
pub use coords::{cell_for, position_for, Cell};
pub use error::{CubeVizError, Result};
pub use facelet::{Face, FaceletString, FACE_ORDER};
pub use model::{CubeModel, Cubie, Pose};
pub use notation::{parse_moves, tokenize, Move, MoveToken, Turn};
pub use playback::{PlaybackClock, PlaybackEvent, PlaybackScheduler, TokenState};
pub use rotation::{RotationEngine, RotationGroup};
pub use scan::{
    FaceReading, FaceScanController, FlipCue, FlipDirection, ScanEvent, ScanState, TickOutcome,
};
pub use session::{
    ColourSubstitution, DecodeService, FixedSolution, Playback, Resolution, SolveService,
    SolveSession,
};
