//! Named rectangular arena regions and point classification
//!
//! A [`ZoneRegistry`] is an ordered list of axis-aligned rectangles. Bounds are
//! inclusive on all four sides. [`ZoneRegistry::classify`] returns the first
//! zone containing a point, so with overlapping zones the answer depends on
//! registry order. [`ZoneRegistry::new`] therefore rejects overlapping zones;
//! [`ZoneRegistry::with_overlaps`] accepts them and keeps first-match
//! semantics.
//!
//! Tracking coordinates are never negative in valid data. A negative (or
//! `NaN`) coordinate marks an undetected individual and is never in a zone.
//!
//! # Examples
//!
//! ```
//! use lmt_analysis::zone::{Zone, ZoneRegistry};
//!
//! let zones = ZoneRegistry::new(vec![
//!     Zone::new("A", (0.0, 0.0), (10.0, 10.0)),
//!     Zone::new("B", (20.0, 0.0), (30.0, 10.0)),
//! ])?;
//!
//! assert_eq!(zones.classify(10.0, 5.0).map(|z| z.as_str()), Some("A"));
//! assert_eq!(zones.classify(15.0, 5.0), None);
//! assert_eq!(zones.classify(-1.0, 5.0), None);
//! # Ok::<(), lmt_analysis::zone::ZoneError>(())
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::exclusion::Exclusion;

/// Name of a zone.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct ZoneId(String);

impl ZoneId {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An axis-aligned rectangle with inclusive bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub name: ZoneId,
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Zone {
    #[must_use]
    pub fn new(name: impl Into<String>, min: (f64, f64), max: (f64, f64)) -> Self {
        Self {
            name: ZoneId::new(name),
            min_x: min.0,
            min_y: min.1,
            max_x: max.0,
            max_y: max.1,
        }
    }

    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }

    /// Whether the two rectangles share at least one point.
    #[must_use]
    pub fn overlaps(&self, other: &Zone) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    fn is_well_formed(&self) -> bool {
        [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|v| v.is_finite())
            && self.min_x <= self.max_x
            && self.min_y <= self.max_y
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ZoneError {
    #[display("zone registry is empty")]
    Empty,
    #[display("zone {zone} has non-finite or inverted bounds")]
    Malformed { zone: ZoneId },
    #[display("zone {zone} is defined more than once")]
    DuplicateName { zone: ZoneId },
    #[display("zones {first} and {second} overlap")]
    Overlap { first: ZoneId, second: ZoneId },
}

/// Ordered, validated set of zones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Zone>", into = "Vec<Zone>")]
pub struct ZoneRegistry {
    zones: Vec<Zone>,
}

impl TryFrom<Vec<Zone>> for ZoneRegistry {
    type Error = ZoneError;

    fn try_from(zones: Vec<Zone>) -> Result<Self, Self::Error> {
        Self::new(zones)
    }
}

impl From<ZoneRegistry> for Vec<Zone> {
    fn from(registry: ZoneRegistry) -> Self {
        registry.zones
    }
}

impl ZoneRegistry {
    /// Creates a registry of non-overlapping zones.
    pub fn new(zones: Vec<Zone>) -> Result<Self, ZoneError> {
        let registry = Self::with_overlaps(zones)?;
        for (i, first) in registry.zones.iter().enumerate() {
            if let Some(second) = registry.zones[i + 1..].iter().find(|z| first.overlaps(z)) {
                return Err(ZoneError::Overlap {
                    first: first.name.clone(),
                    second: second.name.clone(),
                });
            }
        }
        Ok(registry)
    }

    /// Creates a registry that may contain overlapping zones.
    ///
    /// Points in an overlap belong to the zone listed first.
    pub fn with_overlaps(zones: Vec<Zone>) -> Result<Self, ZoneError> {
        if zones.is_empty() {
            return Err(ZoneError::Empty);
        }
        let mut names = HashSet::new();
        for zone in &zones {
            if !zone.is_well_formed() {
                return Err(ZoneError::Malformed {
                    zone: zone.name.clone(),
                });
            }
            if !names.insert(&zone.name) {
                return Err(ZoneError::DuplicateName {
                    zone: zone.name.clone(),
                });
            }
        }
        Ok(Self { zones })
    }

    #[must_use]
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Zone names in registry order.
    pub fn ids(&self) -> impl Iterator<Item = &ZoneId> {
        self.zones.iter().map(|zone| &zone.name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Registry position of the zone named `id`.
    #[must_use]
    pub fn index_of(&self, id: &ZoneId) -> Option<usize> {
        self.zones.iter().position(|zone| &zone.name == id)
    }

    #[must_use]
    pub fn contains_id(&self, id: &ZoneId) -> bool {
        self.index_of(id).is_some()
    }

    /// First zone containing `(x, y)`.
    #[must_use]
    pub fn classify(&self, x: f64, y: f64) -> Option<&ZoneId> {
        self.classify_index(x, y).map(|idx| &self.zones[idx].name)
    }

    /// Registry position of the first zone containing `(x, y)`.
    #[must_use]
    pub fn classify_index(&self, x: f64, y: f64) -> Option<usize> {
        if x.is_nan() || y.is_nan() || x < 0.0 || y < 0.0 {
            return None;
        }
        self.zones.iter().position(|zone| zone.contains(x, y))
    }

    /// Classifies an optional point, reporting why it has no zone.
    pub fn locate(&self, point: Option<(f64, f64)>) -> Result<usize, Exclusion> {
        let (x, y) = point.ok_or(Exclusion::MissingCoordinate)?;
        if x < 0.0 || y < 0.0 {
            return Err(Exclusion::NegativeCoordinate);
        }
        self.classify_index(x, y).ok_or(Exclusion::OutsideZone)
    }
}
