//! Tick-driven replay of a move sequence.
//!
//! Every token of the move list gets one step. A step starts the token's
//! highlight and its turn together; the highlight stays on for at least
//! the configured minimum and never ends before the turn (plus its settle
//! time) has finished. A fixed pacing gap follows every step. Tokens that
//! name no face still get their highlight window but rotate nothing.
//!
//! Time only moves when the caller advances the scheduler, which keeps the
//! timeline deterministic under test and lets a renderer drive it from its
//! own frame loop.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    config::{ModelConfig, PlaybackConfig},
    model::{CubeModel, Pose},
    notation::{tokenize, MoveToken},
    rotation::{RotationEngine, RotationGroup},
};

/// Virtual clock advanced by the scheduler.
#[derive(Debug, Default, Clone)]
pub struct PlaybackClock {
    elapsed: Duration,
}

impl PlaybackClock {
    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    pub fn advance(&mut self, delta: Duration) {
        self.elapsed += delta;
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Display state of a move-list token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenState {
    Pending,
    Active,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    MoveStarted { index: usize, token: String, at: Duration },
    MoveCompleted { index: usize, at: Duration },
    HighlightEnded { index: usize, at: Duration },
    Finished { at: Duration },
}

#[derive(Debug)]
struct Step {
    index: usize,
    group: Option<RotationGroup>,
    elapsed: Duration,
    /// Turn time plus settle; zero for tokens that rotate nothing.
    turn_window: Duration,
    highlight_window: Duration,
    turn_done: bool,
}

#[derive(Debug)]
enum Phase {
    Idle,
    Stepping(Step),
    Pacing(Duration),
    Finished,
}

/// Sequences turns and move-list highlights against a [`CubeModel`].
#[derive(Debug)]
pub struct PlaybackScheduler {
    config: PlaybackConfig,
    engine: RotationEngine,
    tokens: Vec<MoveToken>,
    states: Vec<TokenState>,
    clock: PlaybackClock,
    next: usize,
    phase: Phase,
}

impl PlaybackScheduler {
    pub fn new(moves: &str, config: &PlaybackConfig, model: &ModelConfig) -> Self {
        let tokens = tokenize(moves);
        for token in tokens.iter().filter(|token| token.parsed.is_none()) {
            warn!(token = %token.text, "move token names no face; it will not turn");
        }

        Self {
            config: config.clone(),
            engine: RotationEngine::new(model),
            states: vec![TokenState::Pending; tokens.len()],
            tokens,
            clock: PlaybackClock::default(),
            next: 0,
            phase: Phase::Idle,
        }
    }

    pub fn tokens(&self) -> &[MoveToken] {
        &self.tokens
    }

    pub fn token_states(&self) -> &[TokenState] {
        &self.states
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished)
    }

    /// Index of the token whose step is in progress.
    pub fn current(&self) -> Option<usize> {
        match &self.phase {
            Phase::Stepping(step) => Some(step.index),
            _ => None,
        }
    }

    /// Pose of a sub-cube as it should be drawn right now, including any
    /// turn in progress.
    pub fn world_pose(&self, model: &CubeModel, id: usize) -> Option<Pose> {
        if let Phase::Stepping(Step {
            group: Some(group), ..
        }) = &self.phase
        {
            if let Some(pose) = group.world_pose(id) {
                return Some(pose);
            }
        }
        model.cubie(id).map(|cubie| cubie.pose())
    }

    /// Moves the timeline forward by `delta`, crossing as many step
    /// boundaries as fit, and reports what happened.
    pub fn advance(&mut self, model: &mut CubeModel, delta: Duration) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        let mut remaining = delta;

        loop {
            match std::mem::replace(&mut self.phase, Phase::Finished) {
                Phase::Finished => {
                    self.phase = Phase::Finished;
                    break;
                }
                Phase::Idle => {
                    if self.next >= self.tokens.len() {
                        info!(moves = self.tokens.len(), "playback finished");
                        events.push(PlaybackEvent::Finished {
                            at: self.clock.elapsed(),
                        });
                        self.phase = Phase::Finished;
                        break;
                    }
                    let step = self.start_step(model, self.next);
                    events.push(PlaybackEvent::MoveStarted {
                        index: step.index,
                        token: self.tokens[step.index].text.clone(),
                        at: self.clock.elapsed(),
                    });
                    self.phase = Phase::Stepping(step);
                }
                Phase::Stepping(mut step) => {
                    let boundary = if step.turn_done {
                        step.highlight_window
                    } else {
                        step.turn_window
                    };
                    let used = remaining.min(boundary.saturating_sub(step.elapsed));
                    step.elapsed += used;
                    remaining -= used;
                    self.clock.advance(used);

                    if let Some(group) = step.group.as_mut() {
                        group.set_elapsed(step.elapsed);
                    }
                    if step.group.as_ref().is_some_and(RotationGroup::is_finished) {
                        if let Some(group) = step.group.take() {
                            group.commit(model);
                        }
                    }
                    if !step.turn_done && step.elapsed >= step.turn_window {
                        step.turn_done = true;
                        events.push(PlaybackEvent::MoveCompleted {
                            index: step.index,
                            at: self.clock.elapsed(),
                        });
                    }

                    if step.elapsed >= step.highlight_window {
                        self.states[step.index] = TokenState::Done;
                        events.push(PlaybackEvent::HighlightEnded {
                            index: step.index,
                            at: self.clock.elapsed(),
                        });
                        self.next = step.index + 1;
                        self.phase = Phase::Pacing(self.config.pacing);
                    } else {
                        self.phase = Phase::Stepping(step);
                        if remaining.is_zero() {
                            break;
                        }
                    }
                }
                Phase::Pacing(left) => {
                    let used = remaining.min(left);
                    remaining -= used;
                    self.clock.advance(used);
                    if used < left {
                        self.phase = Phase::Pacing(left - used);
                        break;
                    }
                    self.phase = Phase::Idle;
                }
            }
        }

        events
    }

    /// Drives the timeline in frame-sized steps until every token is done.
    pub fn run_to_end(&mut self, model: &mut CubeModel) -> Vec<PlaybackEvent> {
        let step = self.config.tick();
        let mut events = Vec::new();
        while !self.is_finished() {
            events.extend(self.advance(model, step));
        }
        events
    }

    fn start_step(&mut self, model: &CubeModel, index: usize) -> Step {
        self.states[index] = TokenState::Active;
        let token = &self.tokens[index];
        let group = token
            .parsed
            .and_then(|mv| self.engine.begin(model, mv, self.config.quarter_turn));

        let turn_window = group
            .as_ref()
            .map(|group| group.duration() + self.config.settle)
            .unwrap_or(Duration::ZERO);
        debug!(index, token = %token.text, ?turn_window, "starting move");

        Step {
            index,
            group,
            elapsed: Duration::ZERO,
            turn_window,
            highlight_window: turn_window.max(self.config.min_highlight),
            turn_done: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facelet::FaceletString;

    fn setup(moves: &str) -> (CubeModel, PlaybackScheduler) {
        let model = CubeModel::build(&FaceletString::solved(), &ModelConfig::default());
        let scheduler =
            PlaybackScheduler::new(moves, &PlaybackConfig::default(), &ModelConfig::default());
        (model, scheduler)
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn empty_sequence_finishes_immediately() {
        let (mut model, mut scheduler) = setup("");
        let before = model.read_facelets().unwrap();

        let events = scheduler.advance(&mut model, Duration::ZERO);
        assert_eq!(events, vec![PlaybackEvent::Finished { at: Duration::ZERO }]);
        assert!(scheduler.token_states().is_empty());
        assert_eq!(model.read_facelets().unwrap(), before);
        assert!(model.displaced().is_empty());
    }

    #[test]
    fn single_move_timeline() {
        let (mut model, mut scheduler) = setup("R");
        let events = scheduler.run_to_end(&mut model);

        // 800ms turn + 30ms settle is under the 1000ms highlight minimum,
        // then 140ms pacing.
        assert_eq!(
            events,
            vec![
                PlaybackEvent::MoveStarted {
                    index: 0,
                    token: "R".to_string(),
                    at: ms(0)
                },
                PlaybackEvent::MoveCompleted { index: 0, at: ms(830) },
                PlaybackEvent::HighlightEnded {
                    index: 0,
                    at: ms(1000)
                },
                PlaybackEvent::Finished { at: ms(1140) },
            ]
        );
        assert_eq!(scheduler.token_states(), &[TokenState::Done]);
    }

    #[test]
    fn double_turn_extends_the_highlight() {
        let (mut model, mut scheduler) = setup("F2");
        let events = scheduler.run_to_end(&mut model);
        assert!(events.contains(&PlaybackEvent::MoveCompleted {
            index: 0,
            at: ms(1630)
        }));
        assert!(events.contains(&PlaybackEvent::HighlightEnded {
            index: 0,
            at: ms(1630)
        }));
    }

    #[test]
    fn token_is_active_during_its_turn() {
        let (mut model, mut scheduler) = setup("U D");
        scheduler.advance(&mut model, ms(500));
        assert_eq!(scheduler.current(), Some(0));
        assert_eq!(
            scheduler.token_states(),
            &[TokenState::Active, TokenState::Pending]
        );

        // Mid-turn poses come from the pivot, the model is untouched.
        let id = model
            .cubie_at(glam::IVec3::new(1, 1, 1))
            .map(|cubie| cubie.id())
            .unwrap();
        let drawn = scheduler.world_pose(&model, id).unwrap();
        assert!(!drawn.approx_eq(&model.cubie(id).unwrap().pose(), 1e-3));
        assert!(model.displaced().is_empty());

        scheduler.advance(&mut model, ms(700));
        assert_eq!(scheduler.current(), Some(1));
        assert_eq!(
            scheduler.token_states(),
            &[TokenState::Done, TokenState::Active]
        );
    }

    #[test]
    fn coarse_ticks_cross_several_steps() {
        let (mut model, mut scheduler) = setup("R R'");
        let events = scheduler.advance(&mut model, Duration::from_secs(10));
        assert!(scheduler.is_finished());
        assert_eq!(events.len(), 7);
        assert_eq!(events.last(), Some(&PlaybackEvent::Finished { at: ms(2280) }));
        assert_eq!(model.read_facelets().unwrap(), FaceletString::solved());
    }

    #[test]
    fn unknown_tokens_hold_their_slot_without_turning() {
        let (mut model, mut scheduler) = setup("X");
        let events = scheduler.run_to_end(&mut model);
        assert_eq!(events[1], PlaybackEvent::MoveCompleted { index: 0, at: ms(0) });
        assert_eq!(
            events[2],
            PlaybackEvent::HighlightEnded {
                index: 0,
                at: ms(1000)
            }
        );
        assert!(model.displaced().is_empty());
    }

    #[test]
    fn finished_scheduler_stays_finished() {
        let (mut model, mut scheduler) = setup("L");
        scheduler.run_to_end(&mut model);
        assert!(scheduler.advance(&mut model, ms(100)).is_empty());
    }

    #[test]
    fn clock_tracks_consumed_time() {
        let mut clock = PlaybackClock::default();
        clock.advance(ms(16));
        clock.advance(ms(16));
        assert_eq!(clock.elapsed(), ms(32));
        clock.reset();
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }
}
