//! Sticker colour classification.
//!
//! Averaged camera samples are converted to HSV (hue in degrees, saturation
//! and value in percent) and matched against a fixed palette of reference
//! points. The distance combines a circular hue difference with linear
//! saturation and value differences. A handful of correction rules then
//! separate the pairs that sit close together under typical webcam
//! exposure: dim white versus blue, and red versus orange.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    config::{ReferenceColour, ScanConfig},
    facelet::CELLS_PER_FACE,
    CubeVizError, Result,
};

/// Sticker colour as observed by the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RawColour {
    White,
    Yellow,
    Red,
    Orange,
    Blue,
    Green,
}

impl RawColour {
    pub const ALL: [RawColour; 6] = [
        Self::White,
        Self::Yellow,
        Self::Red,
        Self::Orange,
        Self::Blue,
        Self::Green,
    ];

    pub const fn letter(self) -> char {
        match self {
            Self::White => 'W',
            Self::Yellow => 'Y',
            Self::Red => 'R',
            Self::Orange => 'O',
            Self::Blue => 'B',
            Self::Green => 'G',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        Self::ALL.into_iter().find(|colour| colour.letter() == letter)
    }

    /// Display colour as 0xRRGGBB.
    pub const fn display_rgb(self) -> u32 {
        match self {
            Self::White => 0xffffff,
            Self::Yellow => 0xffff00,
            Self::Red => 0xff0000,
            Self::Orange => 0xff8000,
            Self::Blue => 0x0000ff,
            Self::Green => 0x00a000,
        }
    }
}

impl fmt::Display for RawColour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// 8-bit RGB sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Hue in degrees `[0, 360)`, saturation and value in percent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Hsv {
    pub hue: f32,
    pub saturation: f32,
    pub value: f32,
}

impl Hsv {
    pub const fn new(hue: f32, saturation: f32, value: f32) -> Self {
        Self {
            hue,
            saturation,
            value,
        }
    }

    pub fn from_rgb(rgb: Rgb) -> Self {
        let r = rgb.r as f32 / 255.0;
        let g = rgb.g as f32 / 255.0;
        let b = rgb.b as f32 / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;
        let value = max * 100.0;

        if delta <= f32::EPSILON {
            return Self::new(0.0, 0.0, value);
        }

        let hue = if max == r {
            ((g - b) / delta) % 6.0
        } else if max == g {
            (b - r) / delta + 2.0
        } else {
            (r - g) / delta + 4.0
        };
        let hue = hue * 60.0;
        let hue = if hue < 0.0 { hue + 360.0 } else { hue };

        Self::new(hue, delta / max * 100.0, value)
    }

    /// Hue with the magenta band above 300 degrees read as negative, so reds
    /// just below 360 count as small negative angles. Blues and purples up
    /// to 300 stay positive.
    pub fn signed_hue(&self) -> f32 {
        if self.hue > 300.0 {
            self.hue - 360.0
        } else {
            self.hue
        }
    }

    /// Euclidean distance with the hue difference wrapped at 180 degrees.
    pub fn distance(&self, other: &Hsv) -> f32 {
        let dh = hue_difference(self.hue, other.hue);
        let ds = self.saturation - other.saturation;
        let dv = self.value - other.value;
        (dh * dh + ds * ds + dv * dv).sqrt()
    }
}

/// Shortest angular distance between two hues, in `[0, 180]`.
pub fn hue_difference(a: f32, b: f32) -> f32 {
    let dh = (a - b).abs() % 360.0;
    if dh > 180.0 {
        360.0 - dh
    } else {
        dh
    }
}

/// Result of classifying one cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub colour: RawColour,
    /// Distance to the winning reference before any correction rule.
    pub distance: f32,
    pub hsv: Hsv,
}

/// Classification of all nine cells of one face.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceClassification {
    pub cells: [Classification; CELLS_PER_FACE],
    pub total_distance: f32,
    pub accepted: bool,
}

impl FaceClassification {
    pub fn colours(&self) -> [RawColour; CELLS_PER_FACE] {
        self.cells.map(|cell| cell.colour)
    }
}

/// Nearest-reference classifier with glare and hue corrections.
#[derive(Debug, Clone)]
pub struct ColourClassifier {
    references: Vec<ReferenceColour>,
    white_darkness_value: f32,
    orange_min_hue: f32,
    red_max_hue: f32,
    max_cell_distance: f32,
    max_face_distance: f32,
}

impl ColourClassifier {
    /// Builds a classifier from the scan configuration. An empty reference
    /// palette cannot classify anything and is rejected.
    pub fn new(config: &ScanConfig) -> Result<Self> {
        if config.references.is_empty() {
            return Err(CubeVizError::msg("colour palette has no reference colours"));
        }

        Ok(Self {
            references: config.references.clone(),
            white_darkness_value: config.white_darkness_value,
            orange_min_hue: config.orange_min_hue,
            red_max_hue: config.red_max_hue,
            max_cell_distance: config.max_cell_distance,
            max_face_distance: config.max_face_distance,
        })
    }

    pub fn classify(&self, rgb: Rgb) -> Classification {
        self.classify_hsv(Hsv::from_rgb(rgb))
    }

    pub fn classify_hsv(&self, hsv: Hsv) -> Classification {
        let mut best = self.references[0];
        let mut best_distance = f32::INFINITY;
        for reference in &self.references {
            let point = Hsv::new(reference.hue, reference.saturation, reference.value);
            let distance = hsv.distance(&point);
            if distance < best_distance {
                best_distance = distance;
                best = *reference;
            }
        }

        Classification {
            colour: self.correct(best.colour, &hsv),
            distance: best_distance,
            hsv,
        }
    }

    fn correct(&self, colour: RawColour, hsv: &Hsv) -> RawColour {
        let hue = hsv.signed_hue();
        let mut colour = colour;
        if colour == RawColour::White && hsv.value <= self.white_darkness_value {
            colour = RawColour::Blue;
        }
        if colour == RawColour::Orange && hue <= self.orange_min_hue {
            colour = RawColour::Red;
        }
        if colour == RawColour::Red && hue >= self.red_max_hue {
            colour = RawColour::Orange;
        }
        colour
    }

    /// True when no single cell is too far from its reference and the face
    /// as a whole is not too noisy.
    pub fn is_acceptable(&self, distances: &[f32]) -> bool {
        let worst = distances.iter().copied().fold(0.0_f32, f32::max);
        let total: f32 = distances.iter().sum();
        worst <= self.max_cell_distance && total <= self.max_face_distance
    }

    pub fn classify_face(&self, samples: &[Rgb; CELLS_PER_FACE]) -> FaceClassification {
        let cells = samples.map(|rgb| self.classify(rgb));
        let distances = cells.map(|cell| cell.distance);
        FaceClassification {
            cells,
            total_distance: distances.iter().sum(),
            accepted: self.is_acceptable(&distances),
        }
    }
}

/// Packed RGB camera frame.
#[derive(Debug, Clone)]
pub struct Frame {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Frame {
    /// Wraps a tightly packed RGB8 buffer.
    pub fn new(width: usize, height: usize, pixels: Vec<u8>) -> Result<Self> {
        if width < 3 || height < 3 {
            return Err(CubeVizError::InvalidFrame(format!(
                "{width}x{height} is too small for a 3x3 grid"
            )));
        }
        if pixels.len() != width * height * 3 {
            return Err(CubeVizError::InvalidFrame(format!(
                "expected {} bytes for {width}x{height}, found {}",
                width * height * 3,
                pixels.len()
            )));
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A frame painted with one colour per grid cell, row-major.
    pub fn from_cells(cell_size: usize, cells: &[Rgb; CELLS_PER_FACE]) -> Result<Self> {
        let side = cell_size * 3;
        let mut pixels = Vec::with_capacity(side * side * 3);
        for y in 0..side {
            for x in 0..side {
                let rgb = cells[(y / cell_size.max(1)) * 3 + x / cell_size.max(1)];
                pixels.extend_from_slice(&[rgb.r, rgb.g, rgb.b]);
            }
        }
        Self::new(side, side, pixels)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let offset = (y * self.width + x) * 3;
        [
            self.pixels[offset],
            self.pixels[offset + 1],
            self.pixels[offset + 2],
        ]
    }

    /// Averages the central `fraction` of each grid cell, row-major.
    pub fn sample_cells(&self, fraction: f32) -> [Rgb; CELLS_PER_FACE] {
        let fraction = fraction.clamp(0.0, 1.0);
        let cell_w = self.width as f32 / 3.0;
        let cell_h = self.height as f32 / 3.0;

        std::array::from_fn(|cell| {
            let (row, col) = (cell / 3, cell % 3);
            let region_w = ((cell_w * fraction) as usize).max(1);
            let region_h = ((cell_h * fraction) as usize).max(1);
            let x0 = (col as f32 * cell_w + cell_w * (1.0 - fraction) / 2.0) as usize;
            let y0 = (row as f32 * cell_h + cell_h * (1.0 - fraction) / 2.0) as usize;
            self.average(x0, y0, region_w, region_h)
        })
    }

    fn average(&self, x0: usize, y0: usize, w: usize, h: usize) -> Rgb {
        let x1 = (x0 + w).min(self.width);
        let y1 = (y0 + h).min(self.height);
        let mut sum = [0u64; 3];
        let mut count = 0u64;
        for y in y0..y1 {
            for x in x0..x1 {
                let [r, g, b] = self.pixel(x, y);
                sum[0] += r as u64;
                sum[1] += g as u64;
                sum[2] += b as u64;
                count += 1;
            }
        }

        if count == 0 {
            return Rgb::default();
        }
        let mean = |total: u64| (total as f64 / count as f64).round() as u8;
        Rgb::new(mean(sum[0]), mean(sum[1]), mean(sum[2]))
    }
}
