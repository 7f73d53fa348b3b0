//! Lifecycle of one solve: scan, resolve through the external services,
//! then replay.
//!
//! State is owned by explicit stage objects instead of globals. A
//! [`SolveSession`] owns the scanner; resolving it consumes the session and
//! yields a [`Resolution`]; starting playback consumes that and yields a
//! [`Playback`] owning the model and scheduler. Service failures never
//! abort the pipeline: a failed decode keeps the raw string, a failed solve
//! leaves the move list empty, and both are flagged on the resolution.

use tracing::{info, warn};

use crate::{
    config::AppConfig,
    facelet::FaceletString,
    model::CubeModel,
    playback::{PlaybackEvent, PlaybackScheduler},
    scan::FaceScanController,
    CubeVizError, Result,
};

/// Turns a raw scanned string into canonical face letters.
pub trait DecodeService {
    fn decode(&self, raw: &str) -> Result<String>;
}

/// Produces a move sequence for a canonical facelet string.
pub trait SolveService {
    fn solve(&self, facelets: &str) -> Result<String>;
}

/// Letter substitution used by the reference decode endpoint: colours of
/// the solved scheme become the face they sit on.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColourSubstitution;

impl DecodeService for ColourSubstitution {
    fn decode(&self, raw: &str) -> Result<String> {
        Ok(raw
            .chars()
            .map(|symbol| match symbol {
                'W' => 'U',
                'G' => 'F',
                'O' => 'L',
                'Y' => 'D',
                other => other,
            })
            .collect())
    }
}

/// Solver stand-in that always answers with a fixed sequence.
#[derive(Debug, Clone, Default)]
pub struct FixedSolution(pub String);

impl SolveService for FixedSolution {
    fn solve(&self, _facelets: &str) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Scanning stage.
#[derive(Debug)]
pub struct SolveSession {
    config: AppConfig,
    scanner: FaceScanController,
}

impl SolveSession {
    pub fn new(config: AppConfig) -> Result<Self> {
        let scanner = FaceScanController::new(&config.scan)?;
        Ok(Self { config, scanner })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn scanner(&self) -> &FaceScanController {
        &self.scanner
    }

    pub fn scanner_mut(&mut self) -> &mut FaceScanController {
        &mut self.scanner
    }

    /// Hands the completed scan to the external services.
    pub fn resolve(
        self,
        decoder: &dyn DecodeService,
        solver: &dyn SolveService,
    ) -> Result<Resolution> {
        let raw = self
            .scanner
            .facelets()
            .cloned()
            .ok_or(CubeVizError::InvalidState {
                action: "resolve",
                state: self.scanner.state().name(),
            })?;
        Ok(Resolution::from_raw(self.config, raw, decoder, solver))
    }
}

/// Output of the decode and solve services.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub config: AppConfig,
    pub raw: FaceletString,
    pub facelets: FaceletString,
    pub moves: String,
    /// Decode failed; `facelets` is the raw string.
    pub decode_degraded: bool,
    /// Solve failed; `moves` is empty.
    pub solve_degraded: bool,
}

impl Resolution {
    pub fn from_raw(
        config: AppConfig,
        raw: FaceletString,
        decoder: &dyn DecodeService,
        solver: &dyn SolveService,
    ) -> Self {
        let decoded = decoder
            .decode(raw.as_str())
            .and_then(|text| FaceletString::parse(&text));
        let (facelets, decode_degraded) = match decoded {
            Ok(facelets) => (facelets, false),
            Err(err) => {
                warn!(error = %err, "decode failed, continuing with the raw scan");
                (raw.clone(), true)
            }
        };

        let (moves, solve_degraded) = match solver.solve(facelets.as_str()) {
            Ok(moves) => (moves, false),
            Err(err) => {
                warn!(error = %err, "solve failed, continuing without moves");
                (String::new(), true)
            }
        };

        info!(%facelets, %moves, "resolved scan");
        Self {
            config,
            raw,
            facelets,
            moves,
            decode_degraded,
            solve_degraded,
        }
    }

    pub fn start_playback(self) -> Playback {
        Playback::new(&self.config, &self.facelets, &self.moves)
    }
}

/// Replay stage: the model and the scheduler driving it.
#[derive(Debug)]
pub struct Playback {
    model: CubeModel,
    scheduler: PlaybackScheduler,
}

impl Playback {
    pub fn new(config: &AppConfig, facelets: &FaceletString, moves: &str) -> Self {
        Self {
            model: CubeModel::build(facelets, &config.model),
            scheduler: PlaybackScheduler::new(moves, &config.playback, &config.model),
        }
    }

    pub fn model(&self) -> &CubeModel {
        &self.model
    }

    pub fn scheduler(&self) -> &PlaybackScheduler {
        &self.scheduler
    }

    pub fn advance(&mut self, delta: std::time::Duration) -> Vec<PlaybackEvent> {
        self.scheduler.advance(&mut self.model, delta)
    }

    pub fn run_to_end(&mut self) -> Vec<PlaybackEvent> {
        self.scheduler.run_to_end(&mut self.model)
    }

    pub fn is_finished(&self) -> bool {
        self.scheduler.is_finished()
    }

    /// Ends the session and returns the final model.
    pub fn into_model(self) -> CubeModel {
        self.model
    }
}
