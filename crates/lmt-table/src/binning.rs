use std::collections::BTreeMap;

use lmt_stats::circular::{AngleAccumulator, AngleMean};
use serde::{Deserialize, Serialize};

use crate::{
    ConfigError,
    detection::{Detection, IndividualState},
    tag::AnimalId,
};

/// Default width of a time bin.
pub const DEFAULT_BIN_WIDTH_MS: i64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinningConfig {
    pub bin_width_ms: i64,
    /// How headings inside one bin are averaged.
    pub angle_mean: AngleMean,
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self {
            bin_width_ms: DEFAULT_BIN_WIDTH_MS,
            angle_mean: AngleMean::default(),
        }
    }
}

/// Anything that carries one individual's state at one timestamp.
///
/// Both raw detections and already binned records implement this, so binning
/// can be applied again to its own output.
pub trait BinSample {
    fn timestamp_ms(&self) -> i64;
    fn animal_id(&self) -> AnimalId;
    fn state(&self) -> IndividualState;
}

impl BinSample for Detection {
    fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    fn animal_id(&self) -> AnimalId {
        self.animal_id
    }

    fn state(&self) -> IndividualState {
        Detection::state(self)
    }
}

/// Averaged state of one individual over one time bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinnedRecord {
    /// Start of the bin, a multiple of the bin width.
    pub bin_start_ms: i64,
    pub animal_id: AnimalId,
    pub state: IndividualState,
}

impl BinSample for BinnedRecord {
    fn timestamp_ms(&self) -> i64 {
        self.bin_start_ms
    }

    fn animal_id(&self) -> AnimalId {
        self.animal_id
    }

    fn state(&self) -> IndividualState {
        self.state
    }
}

/// Groups samples into fixed-width time bins and averages each group.
///
/// A sample with timestamp `t` falls into the bin starting at
/// `floor(t / width) * width`. Coordinates are averaged arithmetically over the
/// samples where they are present; headings are averaged with the configured
/// [`AngleMean`]. A bin/individual pair with no samples produces no record.
///
/// # Examples
///
/// ```
/// # use lmt_table::{BinningConfig, Detection, TimeBinner};
/// let binner = TimeBinner::new(BinningConfig::default())?;
/// let records = binner.bin(&[
///     Detection::new(0, 1, 1_010).with_mass(10.0, 0.0),
///     Detection::new(1, 1, 1_190).with_mass(20.0, 0.0),
///     Detection::new(2, 1, 1_200).with_mass(30.0, 0.0),
/// ]);
/// assert_eq!(records.len(), 2);
/// assert_eq!(records[0].bin_start_ms, 1_000);
/// assert_eq!(records[0].state.mass_x, Some(15.0));
/// # Ok::<(), lmt_table::ConfigError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TimeBinner {
    config: BinningConfig,
}

impl TimeBinner {
    pub fn new(config: BinningConfig) -> Result<Self, ConfigError> {
        if config.bin_width_ms <= 0 {
            return Err(ConfigError::NonPositiveBinWidth {
                bin_width_ms: config.bin_width_ms,
            });
        }
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &BinningConfig {
        &self.config
    }

    /// Start of the bin containing `timestamp_ms`.
    #[must_use]
    pub fn bin_start(&self, timestamp_ms: i64) -> i64 {
        let width = self.config.bin_width_ms;
        timestamp_ms.div_euclid(width) * width
    }

    /// Bins `samples`, returning records sorted by bin start and then animal id.
    pub fn bin<S>(&self, samples: &[S]) -> Vec<BinnedRecord>
    where
        S: BinSample,
    {
        let mut groups = BTreeMap::<(i64, AnimalId), StateAccumulator>::new();
        for sample in samples {
            let key = (self.bin_start(sample.timestamp_ms()), sample.animal_id());
            groups.entry(key).or_default().push(&sample.state());
        }

        let records = groups
            .into_iter()
            .map(|((bin_start_ms, animal_id), acc)| BinnedRecord {
                bin_start_ms,
                animal_id,
                state: acc.finish(self.config.angle_mean),
            })
            .collect::<Vec<_>>();
        tracing::debug!(
            samples = samples.len(),
            records = records.len(),
            bin_width_ms = self.config.bin_width_ms,
            "binned samples"
        );
        records
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct MeanAccumulator {
    count: usize,
    sum: f64,
}

impl MeanAccumulator {
    fn push(&mut self, value: Option<f64>) {
        if let Some(value) = value.filter(|v| !v.is_nan()) {
            self.count += 1;
            self.sum += value;
        }
    }

    #[expect(clippy::cast_precision_loss)]
    fn finish(self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct StateAccumulator {
    mass_x: MeanAccumulator,
    mass_y: MeanAccumulator,
    front_x: MeanAccumulator,
    front_y: MeanAccumulator,
    direction: AngleAccumulator,
}

impl StateAccumulator {
    fn push(&mut self, state: &IndividualState) {
        self.mass_x.push(state.mass_x);
        self.mass_y.push(state.mass_y);
        self.front_x.push(state.front_x);
        self.front_y.push(state.front_y);
        if let Some(direction) = state.direction {
            self.direction.push(direction);
        }
    }

    fn finish(self, angle_mean: AngleMean) -> IndividualState {
        IndividualState {
            mass_x: self.mass_x.finish(),
            mass_y: self.mass_y.finish(),
            front_x: self.front_x.finish(),
            front_y: self.front_y.finish(),
            direction: self.direction.mean(angle_mean),
        }
    }
}
