use serde::{Deserialize, Serialize};

use crate::tag::{AnimalId, AnimalRecord};

/// One tracked individual in one video frame.
///
/// Coordinates are in arena pixels. Any of them may be missing when the tracker
/// could not locate the corresponding body point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub frame_number: u64,
    pub animal_id: AnimalId,
    #[serde(default)]
    pub mass_x: Option<f64>,
    #[serde(default)]
    pub mass_y: Option<f64>,
    #[serde(default)]
    pub front_x: Option<f64>,
    #[serde(default)]
    pub front_y: Option<f64>,
    #[serde(default)]
    pub back_x: Option<f64>,
    #[serde(default)]
    pub back_y: Option<f64>,
    /// Frame time in milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
}

impl Detection {
    #[must_use]
    pub fn new(frame_number: u64, animal_id: AnimalId, timestamp_ms: i64) -> Self {
        Self {
            frame_number,
            animal_id,
            mass_x: None,
            mass_y: None,
            front_x: None,
            front_y: None,
            back_x: None,
            back_y: None,
            timestamp_ms,
        }
    }

    #[must_use]
    pub fn with_mass(mut self, x: f64, y: f64) -> Self {
        self.mass_x = Some(x);
        self.mass_y = Some(y);
        self
    }

    #[must_use]
    pub fn with_front(mut self, x: f64, y: f64) -> Self {
        self.front_x = Some(x);
        self.front_y = Some(y);
        self
    }

    #[must_use]
    pub fn with_back(mut self, x: f64, y: f64) -> Self {
        self.back_x = Some(x);
        self.back_y = Some(y);
        self
    }

    /// Heading from the back point to the front point, in `(-π, π]`.
    #[must_use]
    pub fn direction(&self) -> Option<f64> {
        let dx = self.front_x? - self.back_x?;
        let dy = self.front_y? - self.back_y?;
        Some(dy.atan2(dx))
    }

    /// The per-frame state of the individual, heading included.
    #[must_use]
    pub fn state(&self) -> IndividualState {
        IndividualState {
            mass_x: self.mass_x,
            mass_y: self.mass_y,
            front_x: self.front_x,
            front_y: self.front_y,
            direction: self.direction(),
        }
    }
}

/// Detections of one recording together with the tracker's animal table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionSet {
    #[serde(default)]
    pub animals: Vec<AnimalRecord>,
    pub detections: Vec<Detection>,
}

/// Position and heading of one individual at one timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndividualState {
    pub mass_x: Option<f64>,
    pub mass_y: Option<f64>,
    pub front_x: Option<f64>,
    pub front_y: Option<f64>,
    /// Heading in radians.
    pub direction: Option<f64>,
}

impl IndividualState {
    #[must_use]
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::MassX => self.mass_x,
            Metric::MassY => self.mass_y,
            Metric::FrontX => self.front_x,
            Metric::FrontY => self.front_y,
            Metric::Direction => self.direction,
        }
    }

    /// Center of mass, if both coordinates are present and not `NaN`.
    #[must_use]
    pub fn mass(&self) -> Option<(f64, f64)> {
        present(self.mass_x, self.mass_y)
    }

    /// Front point, if both coordinates are present and not `NaN`.
    #[must_use]
    pub fn front(&self) -> Option<(f64, f64)> {
        present(self.front_x, self.front_y)
    }
}

fn present(x: Option<f64>, y: Option<f64>) -> Option<(f64, f64)> {
    let (x, y) = (x?, y?);
    (!x.is_nan() && !y.is_nan()).then_some((x, y))
}

/// A per-individual column of the wide table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum Metric {
    #[display("MASS_X")]
    MassX,
    #[display("MASS_Y")]
    MassY,
    #[display("FRONT_X")]
    FrontX,
    #[display("FRONT_Y")]
    FrontY,
    #[display("DIRECTION")]
    Direction,
}

impl Metric {
    /// All metrics in column order.
    pub const ALL: [Metric; 5] = [
        Metric::MassX,
        Metric::MassY,
        Metric::FrontX,
        Metric::FrontY,
        Metric::Direction,
    ];
}
