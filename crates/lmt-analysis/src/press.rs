//! Lever-press attribution from tracking data
//!
//! Recordings without an RFID event log still know on which frames the lever
//! was pressed. The actor of such a press is the first individual whose center
//! of mass lies in the lever zone on that frame, taken in detection order.
//! Event times are floored to the whole second, like the event log writes them.

use std::collections::{BTreeMap, BTreeSet};

use lmt_table::{Detection, Event, IdentityMap};
use serde::Serialize;

use crate::zone::Zone;

/// Lever zone of the standard arena, in arena pixels.
#[must_use]
pub fn default_lever_zone() -> Zone {
    Zone::new("lever", (215.0, 320.0), (310.0, 385.0))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PressAttribution {
    /// One event per attributed press frame, in frame order.
    pub events: Vec<Event>,
    /// Press frames with nobody in the lever zone.
    pub unattributed: Vec<u64>,
}

/// Turns lever-press frames into events attributed to the individual at the
/// lever.
///
/// Duplicate press frames yield one event. Actors are resolved through
/// `identities` and fall back to the numeric id.
///
/// # Examples
///
/// ```
/// use lmt_analysis::press::{attribute_presses, default_lever_zone};
/// use lmt_table::{Detection, IdentityMap, Tag};
///
/// let detections = [
///     Detection::new(7, 1, 2_480).with_mass(100.0, 100.0),
///     Detection::new(7, 2, 2_480).with_mass(250.0, 350.0),
/// ];
/// let identities = IdentityMap::from_iter([(2, Tag::new("000000000102"))]);
/// let attribution = attribute_presses(&detections, &[7], &default_lever_zone(), &identities);
///
/// assert_eq!(attribution.events[0].actor.as_str(), "000000000102");
/// assert_eq!(attribution.events[0].timestamp_ms, 2_000);
/// ```
#[must_use]
pub fn attribute_presses(
    detections: &[Detection],
    press_frames: &[u64],
    lever_zone: &Zone,
    identities: &IdentityMap,
) -> PressAttribution {
    let frames = press_frames.iter().copied().collect::<BTreeSet<_>>();
    let mut at_lever = BTreeMap::<u64, &Detection>::new();
    for detection in detections {
        if !frames.contains(&detection.frame_number) {
            continue;
        }
        let (Some(x), Some(y)) = (detection.mass_x, detection.mass_y) else {
            continue;
        };
        if lever_zone.contains(x, y) {
            at_lever.entry(detection.frame_number).or_insert(detection);
        }
    }

    let mut attribution = PressAttribution::default();
    for frame in frames {
        match at_lever.get(&frame) {
            Some(detection) => attribution.events.push(Event::lever_press(
                floor_to_second(detection.timestamp_ms),
                identities.resolve(detection.animal_id),
            )),
            None => {
                tracing::debug!(frame, "nobody in the lever zone on press frame");
                attribution.unattributed.push(frame);
            }
        }
    }
    tracing::info!(
        presses = attribution.events.len() + attribution.unattributed.len(),
        attributed = attribution.events.len(),
        unattributed = attribution.unattributed.len(),
        "attributed lever presses"
    );
    attribution
}

fn floor_to_second(timestamp_ms: i64) -> i64 {
    timestamp_ms.div_euclid(1_000) * 1_000
}
