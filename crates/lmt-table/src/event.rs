use std::io;

use serde::{Deserialize, Serialize};

use crate::{
    ConfigError,
    tag::Tag,
    time::{format_event_time, parse_event_time},
};

/// Actor marker written for rows without an event.
pub const NO_ACTOR_SENTINEL: &str = "000000000000";

/// Kind of lever-press events, as written in the event log.
pub const LEVER_PRESS: &str = "id_lever";

/// Target column of lever-press lines in the event log.
pub const LEVER_TARGET: &str = "lever";

/// A discrete, timestamped occurrence attributed to one individual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub timestamp_ms: i64,
    pub actor: Tag,
    pub kind: String,
}

impl Event {
    #[must_use]
    pub fn lever_press(timestamp_ms: i64, actor: Tag) -> Self {
        Self {
            timestamp_ms,
            actor,
            kind: LEVER_PRESS.to_owned(),
        }
    }
}

/// Parameters for turning the event log into [`Event`]s and joining them
/// into a wide table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventJoinConfig {
    /// Only log records of this type are events.
    pub event_type: String,
    /// Largest distance between an event and the row it is attached to.
    pub tolerance_ms: i64,
    /// Actor tags are left-padded with zeros to this width.
    pub tag_width: usize,
}

impl Default for EventJoinConfig {
    fn default() -> Self {
        Self {
            event_type: LEVER_PRESS.to_owned(),
            tolerance_ms: 0,
            tag_width: NO_ACTOR_SENTINEL.len(),
        }
    }
}

impl EventJoinConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tolerance_ms < 0 {
            return Err(ConfigError::NegativeTolerance {
                tolerance_ms: self.tolerance_ms,
            });
        }
        Ok(())
    }
}

/// One line of the event log: `event_type;event_target;event_time;actor_tag`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLogRecord {
    pub event_type: String,
    pub event_target: String,
    pub timestamp_ms: i64,
    /// Raw actor tag; empty when the log has none.
    pub actor: String,
}

impl EventLogRecord {
    #[must_use]
    pub fn from_event(event: &Event, event_target: impl Into<String>) -> Self {
        Self {
            event_type: event.kind.clone(),
            event_target: event_target.into(),
            timestamp_ms: event.timestamp_ms,
            actor: event.actor.as_str().to_owned(),
        }
    }

    /// The record as a log line, without terminator.
    ///
    /// Returns `None` if the timestamp is outside chrono's representable range.
    ///
    /// # Examples
    ///
    /// ```
    /// # use lmt_table::{Event, EventLogRecord, LEVER_TARGET, Tag};
    /// let press = Event::lever_press(1_647_007_509_000, Tag::new("000000004711"));
    /// assert_eq!(
    ///     EventLogRecord::from_event(&press, LEVER_TARGET).to_line().unwrap(),
    ///     "id_lever;lever;11-03-2022 14:05:09:000;000000004711"
    /// );
    /// ```
    #[must_use]
    pub fn to_line(&self) -> Option<String> {
        let time = format_event_time(self.timestamp_ms)?;
        Some(format!(
            "{};{};{time};{}",
            self.event_type, self.event_target, self.actor
        ))
    }
}

/// The parsed event log of one recording.
///
/// Parsing never fails as a whole. Lines with fewer than four fields or with
/// an unreadable time are skipped and counted.
///
/// # Examples
///
/// ```
/// # use lmt_table::{EventJoinConfig, EventLog};
/// let log = EventLog::parse(
///     "id_lever;lever1;11-03-2022 14:05:09:400;4711\n\
///      door;door1;11-03-2022 14:05:10:000;4711\n\
///      id_lever;lever1;11-03-2022 14:05:11:000;\n\
///      garbage\n",
/// );
/// assert_eq!(log.records.len(), 3);
/// assert_eq!(log.skipped_lines, 1);
///
/// let events = log.events(&EventJoinConfig::default());
/// assert_eq!(events.len(), 1);
/// assert_eq!(events[0].actor.as_str(), "000000004711");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    pub records: Vec<EventLogRecord>,
    pub skipped_lines: usize,
}

impl EventLog {
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut log = Self::default();
        for (line_no, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_record(line) {
                Some(record) => log.records.push(record),
                None => {
                    tracing::trace!(line = line_no + 1, "skipping malformed event log line");
                    log.skipped_lines += 1;
                }
            }
        }
        if log.skipped_lines > 0 {
            tracing::debug!(
                records = log.records.len(),
                skipped = log.skipped_lines,
                "parsed event log with skipped lines"
            );
        }
        log
    }

    /// A log holding one record per event, in order.
    #[must_use]
    pub fn from_events(events: &[Event], event_target: &str) -> Self {
        Self {
            records: events
                .iter()
                .map(|event| EventLogRecord::from_event(event, event_target))
                .collect(),
            skipped_lines: 0,
        }
    }

    /// Writes one line per record in the format [`EventLog::parse`] reads.
    pub fn write<W>(&self, mut writer: W) -> io::Result<()>
    where
        W: io::Write,
    {
        for record in &self.records {
            let line = record.to_line().ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "event time {} ms is out of the representable date range",
                        record.timestamp_ms
                    ),
                )
            })?;
            writeln!(writer, "{line}")?;
        }
        Ok(())
    }

    /// Records of the configured type with a non-empty actor, as events.
    #[must_use]
    pub fn events(&self, config: &EventJoinConfig) -> Vec<Event> {
        self.records
            .iter()
            .filter(|record| record.event_type == config.event_type)
            .filter(|record| !record.actor.trim().is_empty())
            .map(|record| Event {
                timestamp_ms: record.timestamp_ms,
                actor: Tag::zero_padded(&record.actor, config.tag_width),
                kind: record.event_type.clone(),
            })
            .collect()
    }
}

fn parse_record(line: &str) -> Option<EventLogRecord> {
    let mut fields = line.split(';');
    let event_type = fields.next()?.trim();
    let event_target = fields.next()?.trim();
    let timestamp_ms = parse_event_time(fields.next()?)?;
    let actor = fields.next()?.trim();
    Some(EventLogRecord {
        event_type: event_type.to_owned(),
        event_target: event_target.to_owned(),
        timestamp_ms,
        actor: actor.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_without_milliseconds() {
        let log = EventLog::parse("id_lever;lever;01-01-1970 00:00:02;12\n");
        assert_eq!(log.records[0].timestamp_ms, 2_000);
        assert_eq!(log.skipped_lines, 0);
    }

    #[test]
    fn test_unreadable_time_is_skipped() {
        let log = EventLog::parse("id_lever;lever;yesterday;12\nid_lever;lever\n\n");
        assert!(log.records.is_empty());
        assert_eq!(log.skipped_lines, 2);
    }

    #[test]
    fn test_event_type_filter() {
        let log = EventLog::parse(
            "id_lever;lever;01-01-1970 00:00:01:000;1\n\
             nose_poke;hole;01-01-1970 00:00:01:500;2\n",
        );
        let config = EventJoinConfig {
            event_type: "nose_poke".to_owned(),
            ..EventJoinConfig::default()
        };
        let events = log.events(&config);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].timestamp_ms, 1_500);
        assert_eq!(events[0].actor.as_str(), "000000000002");
        assert_eq!(events[0].kind, "nose_poke");
    }

    #[test]
    fn test_written_log_parses_back() {
        let events = [
            Event::lever_press(1_000, Tag::new("000000000101")),
            Event::lever_press(61_000, Tag::new("000000000102")),
        ];
        let mut text = Vec::new();
        EventLog::from_events(&events, LEVER_TARGET)
            .write(&mut text)
            .unwrap();
        let text = String::from_utf8(text).unwrap();
        assert_eq!(
            text,
            "id_lever;lever;01-01-1970 00:00:01:000;000000000101\n\
             id_lever;lever;01-01-1970 00:01:01:000;000000000102\n"
        );
        let parsed = EventLog::parse(&text).events(&EventJoinConfig::default());
        assert_eq!(parsed, events);
    }

    #[test]
    fn test_out_of_range_time_is_not_written() {
        let log = EventLog::from_events(&[Event::lever_press(i64::MAX, Tag::new("1"))], "lever");
        assert!(log.write(Vec::new()).is_err());
    }

    #[test]
    fn test_blank_actor_is_not_an_event() {
        let log = EventLog::parse("id_lever;lever;01-01-1970 00:00:01:000;   \n");
        assert_eq!(log.records.len(), 1);
        assert!(log.events(&EventJoinConfig::default()).is_empty());
    }

    #[test]
    fn test_negative_tolerance_is_rejected() {
        let config = EventJoinConfig {
            tolerance_ms: -1,
            ..EventJoinConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NegativeTolerance { tolerance_ms: -1 })
        );
    }

    #[test]
    fn test_config_defaults_from_json() {
        let config: EventJoinConfig = serde_json::from_str(r#"{"tolerance_ms": 100}"#).unwrap();
        assert_eq!(config.event_type, "id_lever");
        assert_eq!(config.tag_width, 12);
        assert_eq!(config.tolerance_ms, 100);
    }
}
