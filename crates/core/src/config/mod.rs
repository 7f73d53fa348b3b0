use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{colour::RawColour, CubeVizError, Result};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scan: ScanConfig,
    pub model: ModelConfig,
    pub playback: PlaybackConfig,
}

impl AppConfig {
    /// Reads a JSON configuration file. Fields that are absent keep their
    /// default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.playback.frame_step.is_zero() {
            return Err(CubeVizError::msg("playback.frame_step must be at least 1 ms"));
        }
        Ok(())
    }
}

/// Reference point for one sticker colour, in degrees / percent / percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceColour {
    pub colour: RawColour,
    pub hue: f32,
    pub saturation: f32,
    pub value: f32,
}

impl ReferenceColour {
    pub const fn new(colour: RawColour, hue: f32, saturation: f32, value: f32) -> Self {
        Self {
            colour,
            hue,
            saturation,
            value,
        }
    }
}

/// Tuning for the colour classifier and the face scanning loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub references: Vec<ReferenceColour>,
    /// Whites at or below this value are re-read as blue.
    pub white_darkness_value: f32,
    /// Oranges at or below this hue are re-read as red.
    pub orange_min_hue: f32,
    /// Reds at or above this hue are re-read as orange.
    pub red_max_hue: f32,
    pub max_cell_distance: f32,
    pub max_face_distance: f32,
    /// Fraction of a cell's width averaged around its centre.
    pub sample_fraction: f32,
    #[serde(with = "millis")]
    pub retry_interval: Duration,
    #[serde(with = "millis")]
    pub flip_pause: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            references: vec![
                ReferenceColour::new(RawColour::White, 23.0, 23.0, 70.0),
                ReferenceColour::new(RawColour::Yellow, 45.0, 65.0, 85.0),
                ReferenceColour::new(RawColour::Red, 2.0, 70.0, 75.0),
                ReferenceColour::new(RawColour::Orange, 10.0, 70.0, 70.0),
                ReferenceColour::new(RawColour::Blue, 220.0, 30.0, 28.0),
                ReferenceColour::new(RawColour::Green, 135.0, 45.0, 25.0),
            ],
            white_darkness_value: 40.0,
            orange_min_hue: 7.0,
            red_max_hue: 10.0,
            max_cell_distance: 50.0,
            max_face_distance: 200.0,
            sample_fraction: 0.4,
            retry_interval: Duration::from_millis(200),
            flip_pause: Duration::from_millis(1000),
        }
    }
}

/// Geometry of the sub-cube model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Distance between neighbouring sub-cube centres.
    pub spacing: f32,
    /// Minimum coordinate along a face axis, in grid units, for a sub-cube
    /// to count as part of that face's layer.
    pub selection_threshold: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            spacing: 1.0,
            selection_threshold: 0.5,
        }
    }
}

/// Pacing of the solution replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    #[serde(with = "millis")]
    pub quarter_turn: Duration,
    /// Pause after a turn commits before it counts as finished.
    #[serde(with = "millis")]
    pub settle: Duration,
    #[serde(with = "millis")]
    pub min_highlight: Duration,
    #[serde(with = "millis")]
    pub pacing: Duration,
    #[serde(with = "millis")]
    pub frame_step: Duration,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            quarter_turn: Duration::from_millis(800),
            settle: Duration::from_millis(30),
            min_highlight: Duration::from_millis(1000),
            pacing: Duration::from_millis(140),
            frame_step: Duration::from_millis(16),
        }
    }
}

impl PlaybackConfig {
    /// Frame step used to drive the clock, never zero.
    pub fn tick(&self) -> Duration {
        self.frame_step.max(Duration::from_millis(1))
    }
}

/// Durations are written as whole milliseconds in configuration files.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
