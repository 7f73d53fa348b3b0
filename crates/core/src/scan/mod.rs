//! Face-by-face scanning of a physical cube.
//!
//! Each face moves through `Sampling -> Reviewing`, and from review either
//! back to `Sampling` (retry) or on to the next face (accept). Rejected
//! reads are dropped silently and retried on the next tick; there is no
//! retry limit. After the sixth face is accepted the controller holds the
//! raw facelet string in wire order.
//!
//! Between faces the operator has to re-orient the cube. The guidance for
//! that is fixed: the decode step downstream assumes exactly this
//! choreography, so changing it changes the meaning of the scanned string.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    colour::{ColourClassifier, FaceClassification, Frame, RawColour, Rgb},
    config::ScanConfig,
    facelet::{FaceletString, CELLS_PER_FACE, FACE_ORDER},
    CubeVizError, Result,
};

/// Number of faces scanned per session.
pub const FACE_COUNT: usize = 6;

/// Direction in which the operator should flip the cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlipDirection {
    Right,
    Down,
    Left,
    Up,
}

/// Flips shown after each accepted face, indexed by the accepted face.
pub const FLIP_CHOREOGRAPHY: [&[FlipDirection]; FACE_COUNT] = [
    &[FlipDirection::Up, FlipDirection::Left],
    &[FlipDirection::Left],
    &[FlipDirection::Up],
    &[FlipDirection::Down, FlipDirection::Left],
    &[FlipDirection::Left],
    &[],
];

/// Guidance cue; `delay` is how long to wait before presenting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlipCue {
    pub direction: FlipDirection,
    pub delay: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanState {
    Sampling,
    Reviewing,
    Completed,
    Cancelled,
}

impl ScanState {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sampling => "sampling",
            Self::Reviewing => "reviewing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Nine cells of the face currently being scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FaceReading {
    cells: [Option<RawColour>; CELLS_PER_FACE],
}

impl FaceReading {
    pub fn from_colours(colours: [RawColour; CELLS_PER_FACE]) -> Self {
        Self {
            cells: colours.map(Some),
        }
    }

    pub fn get(&self, cell: usize) -> Option<RawColour> {
        self.cells.get(cell).copied().flatten()
    }

    pub fn set(&mut self, cell: usize, colour: RawColour) -> Result<()> {
        let slot = self.cells.get_mut(cell).ok_or(CubeVizError::InvalidCell(cell))?;
        *slot = Some(colour);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.cells = [None; CELLS_PER_FACE];
    }

    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Nine colour letters, `None` while any cell is unset.
    pub fn letters(&self) -> Option<String> {
        self.cells
            .iter()
            .map(|cell| cell.map(RawColour::letter))
            .collect()
    }
}

/// Outcome of a sampling tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The read was rejected; sample again after the given interval.
    Retry { after: Duration },
    /// The read passed validation and is now under review.
    Review(FaceClassification),
    /// The controller is not sampling, the frame was ignored.
    Idle,
}

/// Notifications raised when a face is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    FaceAccepted { face: usize, letters: String },
    Flip(FlipCue),
    Completed(FaceletString),
}

/// State machine that turns camera frames into a raw facelet string.
#[derive(Debug, Clone)]
pub struct FaceScanController {
    classifier: ColourClassifier,
    sample_fraction: f32,
    retry_interval: Duration,
    flip_pause: Duration,
    state: ScanState,
    face: usize,
    reading: FaceReading,
    accepted: String,
    completed: Option<FaceletString>,
}

impl FaceScanController {
    pub fn new(config: &ScanConfig) -> Result<Self> {
        Ok(Self {
            classifier: ColourClassifier::new(config)?,
            sample_fraction: config.sample_fraction,
            retry_interval: config.retry_interval,
            flip_pause: config.flip_pause,
            state: ScanState::Sampling,
            face: 0,
            reading: FaceReading::default(),
            accepted: String::with_capacity(FACE_COUNT * CELLS_PER_FACE),
            completed: None,
        })
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Zero-based index of the face being scanned.
    pub fn face_index(&self) -> usize {
        self.face
    }

    pub fn reading(&self) -> &FaceReading {
        &self.reading
    }

    /// Letters accepted so far, in wire order.
    pub fn accepted(&self) -> &str {
        &self.accepted
    }

    /// The full raw string once all six faces are accepted.
    pub fn facelets(&self) -> Option<&FaceletString> {
        self.completed.as_ref()
    }

    pub fn tick(&mut self, frame: &Frame) -> TickOutcome {
        let samples = frame.sample_cells(self.sample_fraction);
        self.tick_samples(&samples)
    }

    /// Classifies nine averaged cell samples.
    pub fn tick_samples(&mut self, samples: &[Rgb; CELLS_PER_FACE]) -> TickOutcome {
        if self.state != ScanState::Sampling {
            return TickOutcome::Idle;
        }

        let result = self.classifier.classify_face(samples);
        debug!(
            face = self.face,
            total = result.total_distance,
            accepted = result.accepted,
            "classified face"
        );

        if !result.accepted {
            self.reading.clear();
            return TickOutcome::Retry {
                after: self.retry_interval,
            };
        }

        self.reading = FaceReading::from_colours(result.colours());
        self.state = ScanState::Reviewing;
        TickOutcome::Review(result)
    }

    /// Overrides one cell of the reading under review.
    pub fn paint(&mut self, cell: usize, colour: RawColour) -> Result<()> {
        self.require(ScanState::Reviewing, "paint")?;
        self.reading.set(cell, colour)
    }

    /// Discards the reading under review and samples the same face again.
    pub fn retry(&mut self) -> Result<()> {
        self.require(ScanState::Reviewing, "retry")?;
        self.reading.clear();
        self.state = ScanState::Sampling;
        Ok(())
    }

    /// Appends the reading under review and moves to the next face.
    pub fn accept(&mut self) -> Result<Vec<ScanEvent>> {
        self.require(ScanState::Reviewing, "accept")?;
        let letters = self
            .reading
            .letters()
            .ok_or_else(|| CubeVizError::msg("face reading is incomplete"))?;

        self.accepted.push_str(&letters);
        info!(face = %FACE_ORDER[self.face], %letters, "accepted face");

        let mut events = vec![ScanEvent::FaceAccepted {
            face: self.face,
            letters,
        }];
        for (position, direction) in FLIP_CHOREOGRAPHY[self.face].iter().enumerate() {
            let delay = if position == 0 {
                Duration::ZERO
            } else {
                self.flip_pause
            };
            events.push(ScanEvent::Flip(FlipCue {
                direction: *direction,
                delay,
            }));
        }

        self.reading.clear();
        if self.face + 1 == FACE_COUNT {
            let facelets = FaceletString::parse(&self.accepted)?;
            self.state = ScanState::Completed;
            self.completed = Some(facelets.clone());
            events.push(ScanEvent::Completed(facelets));
        } else {
            self.face += 1;
            self.state = ScanState::Sampling;
        }

        Ok(events)
    }

    /// Abandons the scan. Terminal states are left unchanged.
    pub fn cancel(&mut self) {
        if !self.state.is_terminal() {
            self.reading.clear();
            self.state = ScanState::Cancelled;
        }
    }

    fn require(&self, expected: ScanState, action: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(CubeVizError::InvalidState {
                action,
                state: self.state.name(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Averaged samples that land close to each reference colour.
    const WHITE: Rgb = Rgb::new(179, 156, 138);
    const RED: Rgb = Rgb::new(191, 63, 57);
    const GREEN: Rgb = Rgb::new(35, 64, 42);
    const NOISE: Rgb = Rgb::new(255, 0, 255);

    fn controller() -> FaceScanController {
        FaceScanController::new(&ScanConfig::default()).unwrap()
    }

    fn scan_face(controller: &mut FaceScanController, rgb: Rgb) -> Vec<ScanEvent> {
        assert!(matches!(
            controller.tick_samples(&[rgb; 9]),
            TickOutcome::Review(_)
        ));
        controller.accept().unwrap()
    }

    #[test]
    fn reference_like_samples_classify() {
        let classifier = ColourClassifier::new(&ScanConfig::default()).unwrap();
        assert_eq!(classifier.classify(WHITE).colour, RawColour::White);
        assert_eq!(classifier.classify(RED).colour, RawColour::Red);
        assert_eq!(classifier.classify(GREEN).colour, RawColour::Green);
    }

    #[test]
    fn noisy_reads_are_retried() {
        let mut controller = controller();
        let mut samples = [WHITE; 9];
        samples[8] = NOISE;

        let outcome = controller.tick_samples(&samples);
        assert_eq!(
            outcome,
            TickOutcome::Retry {
                after: Duration::from_millis(200)
            }
        );
        assert_eq!(controller.state(), ScanState::Sampling);
        assert_eq!(controller.reading(), &FaceReading::default());

        assert!(matches!(
            controller.tick_samples(&[WHITE; 9]),
            TickOutcome::Review(_)
        ));
        assert_eq!(controller.state(), ScanState::Reviewing);
    }

    #[test]
    fn frames_are_ignored_outside_sampling() {
        let mut controller = controller();
        controller.tick_samples(&[WHITE; 9]);
        assert_eq!(controller.tick_samples(&[RED; 9]), TickOutcome::Idle);
        assert_eq!(controller.reading().get(0), Some(RawColour::White));
    }

    #[test]
    fn painting_overrides_cells() {
        let mut controller = controller();
        controller.tick_samples(&[WHITE; 9]);
        controller.paint(4, RawColour::Yellow).unwrap();
        assert!(matches!(
            controller.paint(9, RawColour::Yellow),
            Err(CubeVizError::InvalidCell(9))
        ));

        let events = controller.accept().unwrap();
        assert_eq!(
            events[0],
            ScanEvent::FaceAccepted {
                face: 0,
                letters: "WWWWYWWWW".to_string()
            }
        );
    }

    #[test]
    fn retry_discards_the_reading_and_keeps_the_face() {
        let mut controller = controller();
        controller.tick_samples(&[WHITE; 9]);
        controller.retry().unwrap();
        assert_eq!(controller.state(), ScanState::Sampling);
        assert_eq!(controller.face_index(), 0);
        assert!(controller.accepted().is_empty());
        assert!(!controller.reading().is_complete());
    }

    #[test]
    fn actions_require_review() {
        let mut controller = controller();
        let err = controller.accept().unwrap_err();
        assert!(format!("{err}").contains("sampling"));
        assert!(controller.retry().is_err());
        assert!(controller.paint(0, RawColour::Red).is_err());
    }

    #[test]
    fn six_faces_complete_the_scan() {
        let mut controller = controller();
        let colours = [WHITE, RED, GREEN, WHITE, RED, GREEN];
        let mut flips = Vec::new();
        let mut completed = None;

        for rgb in colours {
            for event in scan_face(&mut controller, rgb) {
                match event {
                    ScanEvent::Flip(cue) => flips.push(cue),
                    ScanEvent::Completed(facelets) => completed = Some(facelets),
                    ScanEvent::FaceAccepted { .. } => {}
                }
            }
        }

        assert_eq!(controller.state(), ScanState::Completed);
        let facelets = completed.expect("scan should complete");
        assert_eq!(
            facelets.as_str(),
            "WWWWWWWWWRRRRRRRRRGGGGGGGGGWWWWWWWWWRRRRRRRRRGGGGGGGGG"
        );
        assert_eq!(controller.facelets(), Some(&facelets));

        let directions: Vec<_> = flips.iter().map(|cue| cue.direction).collect();
        assert_eq!(
            directions,
            vec![
                FlipDirection::Up,
                FlipDirection::Left,
                FlipDirection::Left,
                FlipDirection::Up,
                FlipDirection::Down,
                FlipDirection::Left,
                FlipDirection::Left,
            ]
        );
        assert_eq!(flips[0].delay, Duration::ZERO);
        assert_eq!(flips[1].delay, Duration::from_millis(1000));

        assert_eq!(controller.tick_samples(&[WHITE; 9]), TickOutcome::Idle);
    }

    #[test]
    fn cancel_is_terminal() {
        let mut controller = controller();
        controller.tick_samples(&[WHITE; 9]);
        controller.cancel();
        assert_eq!(controller.state(), ScanState::Cancelled);
        assert_eq!(controller.tick_samples(&[WHITE; 9]), TickOutcome::Idle);
        assert!(controller.accept().is_err());
        assert!(controller.facelets().is_none());
    }

    #[test]
    fn ticks_on_frames() {
        let mut controller = controller();
        let frame = Frame::from_cells(30, &[GREEN; 9]).unwrap();
        assert!(matches!(controller.tick(&frame), TickOutcome::Review(_)));
        assert_eq!(controller.reading().letters().as_deref(), Some("GGGGGGGGG"));
    }
}
