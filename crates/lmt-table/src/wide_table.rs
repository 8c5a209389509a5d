use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    io,
};

use serde::{Deserialize, Serialize};

use crate::{
    ConfigError, TableError,
    binning::BinnedRecord,
    detection::{IndividualState, Metric},
    event::{Event, NO_ACTOR_SENTINEL},
    tag::{IdentityMap, Tag},
    time::format_time_key,
};

/// One timestamp of the wide table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WideRow {
    /// `timestamp_ms` rendered with [`TIME_KEY_FORMAT`](crate::TIME_KEY_FORMAT).
    pub formatted_time: String,
    pub timestamp_ms: i64,
    /// Per-tag state, parallel to [`WideTable::tags`]. `None` where the
    /// individual was not observed.
    pub states: Vec<Option<IndividualState>>,
    /// Individual that pressed the lever at this timestamp.
    #[serde(default)]
    pub lever_press: Option<Tag>,
}

impl WideRow {
    pub fn new(
        timestamp_ms: i64,
        states: Vec<Option<IndividualState>>,
    ) -> Result<Self, TableError> {
        let formatted_time =
            format_time_key(timestamp_ms).ok_or(TableError::TimestampOutOfRange { timestamp_ms })?;
        Ok(Self {
            formatted_time,
            timestamp_ms,
            states,
            lever_press: None,
        })
    }
}

/// Events recovered from the lever-press column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedEvents {
    pub events: Vec<Event>,
    /// Presses attributed to a tag that has no column in the table.
    pub unknown_actors: usize,
}

/// Outcome of [`WideTable::attach_events`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JoinReport {
    pub matched: usize,
    pub unmatched: usize,
}

/// Per-timestamp table of all individuals' states.
///
/// Rows are keyed by `(formatted_time, timestamp_ms)`. Every row holds one
/// optional [`IndividualState`] per tag; the tags determine the column set
/// `{METRIC}_{tag}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWideTable")]
pub struct WideTable {
    tags: Vec<Tag>,
    rows: Vec<WideRow>,
}

#[derive(Deserialize)]
struct RawWideTable {
    tags: Vec<Tag>,
    rows: Vec<WideRow>,
}

impl TryFrom<RawWideTable> for WideTable {
    type Error = TableError;

    fn try_from(raw: RawWideTable) -> Result<Self, Self::Error> {
        Self::new(raw.tags, raw.rows)
    }
}

impl WideTable {
    /// Creates a table, checking that tags are unique and every row has one
    /// state per tag.
    pub fn new(tags: Vec<Tag>, rows: Vec<WideRow>) -> Result<Self, TableError> {
        check_unique(&tags)?;
        for (row, wide_row) in rows.iter().enumerate() {
            if wide_row.states.len() != tags.len() {
                return Err(TableError::RowWidthMismatch {
                    row,
                    len: wide_row.states.len(),
                    expected: tags.len(),
                });
            }
        }
        Ok(Self { tags, rows })
    }

    #[must_use]
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    #[must_use]
    pub fn rows(&self) -> &[WideRow] {
        &self.rows
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn tag_index(&self, tag: &Tag) -> Option<usize> {
        self.tags.iter().position(|t| t == tag)
    }

    /// State of `tag` in row `row`, if both exist and the tag was observed.
    #[must_use]
    pub fn state(&self, row: usize, tag: &Tag) -> Option<&IndividualState> {
        let col = self.tag_index(tag)?;
        self.rows.get(row)?.states[col].as_ref()
    }

    /// Column names in export order.
    ///
    /// # Examples
    ///
    /// ```
    /// # use lmt_table::{Tag, WideTable};
    /// let table = WideTable::new(vec![Tag::new("7")], vec![])?;
    /// assert_eq!(
    ///     table.column_names(),
    ///     [
    ///         "FORMATTED_TIME", "TIMESTAMP", "MASS_X_7", "MASS_Y_7", "FRONT_X_7",
    ///         "FRONT_Y_7", "DIRECTION_7", "LEVER_PRESS",
    ///     ]
    /// );
    /// # Ok::<(), lmt_table::TableError>(())
    /// ```
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        let mut names = vec!["FORMATTED_TIME".to_owned(), "TIMESTAMP".to_owned()];
        for tag in &self.tags {
            names.extend(Metric::ALL.iter().map(|metric| format!("{metric}_{tag}")));
        }
        names.push("LEVER_PRESS".to_owned());
        names
    }

    /// Replaces numeric tags with the persistent tags from `identities`.
    ///
    /// Tags that are not numeric, or whose id has no entry, are kept. Fails
    /// if two columns end up with the same tag.
    pub fn resolve_tags(&self, identities: &IdentityMap) -> Result<Self, TableError> {
        let tags = self
            .tags
            .iter()
            .map(|tag| match tag.animal_id() {
                Some(id) => identities.resolve(id),
                None => tag.clone(),
            })
            .collect::<Vec<_>>();
        check_unique(&tags)?;
        Ok(Self {
            tags,
            rows: self.rows.clone(),
        })
    }

    /// Marks the actor of each event on the row nearest to the event time.
    ///
    /// A row matches when its timestamp is within `tolerance_ms` of the event.
    /// The nearest timestamp wins, and of two equally near the earlier one.
    /// Every row sharing that timestamp is marked. When several events land
    /// on the same row the last one is kept.
    pub fn attach_events(
        &mut self,
        events: &[Event],
        tolerance_ms: i64,
    ) -> Result<JoinReport, TableError> {
        if tolerance_ms < 0 {
            return Err(ConfigError::NegativeTolerance { tolerance_ms }.into());
        }

        let mut by_time = BTreeMap::<i64, Vec<usize>>::new();
        for (idx, row) in self.rows.iter().enumerate() {
            by_time.entry(row.timestamp_ms).or_default().push(idx);
        }

        let mut report = JoinReport::default();
        for event in events {
            let window = event.timestamp_ms.saturating_sub(tolerance_ms)
                ..=event.timestamp_ms.saturating_add(tolerance_ms);
            let nearest = by_time
                .range(window)
                .min_by_key(|(timestamp, _)| timestamp.abs_diff(event.timestamp_ms));
            let Some((_, indices)) = nearest else {
                report.unmatched += 1;
                continue;
            };
            for &idx in indices {
                self.rows[idx].lever_press = Some(event.actor.clone());
            }
            report.matched += 1;
        }

        tracing::debug!(
            matched = report.matched,
            unmatched = report.unmatched,
            tolerance_ms,
            "attached events to table"
        );
        Ok(report)
    }

    /// Events recorded in the lever-press column, in row order.
    #[must_use]
    pub fn lever_press_events(&self) -> ExtractedEvents {
        let mut extracted = ExtractedEvents::default();
        for row in &self.rows {
            let Some(actor) = &row.lever_press else {
                continue;
            };
            if actor.as_str() == NO_ACTOR_SENTINEL {
                continue;
            }
            if self.tag_index(actor).is_none() {
                extracted.unknown_actors += 1;
                continue;
            }
            extracted
                .events
                .push(Event::lever_press(row.timestamp_ms, actor.clone()));
        }
        extracted
    }

    /// Stacks tables row-wise over the union of their tags.
    ///
    /// Tags keep the order of their first appearance. Individuals missing from
    /// a source table are unobserved in its rows.
    #[must_use]
    pub fn concat(tables: &[WideTable]) -> Self {
        let mut tags = Vec::<Tag>::new();
        let mut seen = HashMap::<&Tag, usize>::new();
        for tag in tables.iter().flat_map(|table| &table.tags) {
            seen.entry(tag).or_insert_with(|| {
                tags.push(tag.clone());
                tags.len() - 1
            });
        }

        let mut rows = Vec::with_capacity(tables.iter().map(|t| t.rows.len()).sum());
        for table in tables {
            let columns = table.tags.iter().map(|tag| seen[tag]).collect::<Vec<_>>();
            for row in &table.rows {
                let mut states = vec![None; tags.len()];
                for (state, &col) in row.states.iter().zip(&columns) {
                    states[col] = *state;
                }
                rows.push(WideRow {
                    states,
                    ..row.clone()
                });
            }
        }
        Self { tags, rows }
    }

    /// Writes the table as CSV.
    ///
    /// Missing values are empty fields; rows without a lever press carry
    /// [`NO_ACTOR_SENTINEL`].
    pub fn write_csv<W>(&self, mut writer: W) -> io::Result<()>
    where
        W: io::Write,
    {
        writeln!(writer, "{}", self.column_names().join(","))?;
        for row in &self.rows {
            write!(writer, "{},{}", row.formatted_time, row.timestamp_ms)?;
            for state in &row.states {
                for metric in Metric::ALL {
                    match state.and_then(|s| s.get(metric)) {
                        Some(value) => write!(writer, ",{value}")?,
                        None => write!(writer, ",")?,
                    }
                }
            }
            let actor = row
                .lever_press
                .as_ref()
                .map_or(NO_ACTOR_SENTINEL, Tag::as_str);
            writeln!(writer, ",{actor}")?;
        }
        Ok(())
    }
}

fn check_unique(tags: &[Tag]) -> Result<(), TableError> {
    let mut seen = HashSet::new();
    for tag in tags {
        if !seen.insert(tag) {
            return Err(TableError::DuplicateTag { tag: tag.clone() });
        }
    }
    Ok(())
}

/// Pivots binned records into a [`WideTable`].
///
/// One row is produced per bin, columns are ordered by numeric animal id, and
/// the tags are the decimal ids until [`WideTable::resolve_tags`] is applied.
#[derive(Debug, Clone, Default)]
pub struct WideTableBuilder {
    identities: Option<IdentityMap>,
}

impl WideTableBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves tags with `identities` as part of [`build`](Self::build).
    #[must_use]
    pub fn with_identities(mut self, identities: IdentityMap) -> Self {
        self.identities = Some(identities);
        self
    }

    pub fn build(&self, records: &[BinnedRecord]) -> Result<WideTable, TableError> {
        let ids = records
            .iter()
            .map(|record| record.animal_id)
            .collect::<BTreeSet<_>>();
        let columns = ids
            .iter()
            .enumerate()
            .map(|(col, &id)| (id, col))
            .collect::<HashMap<_, _>>();

        let mut bins = BTreeMap::<i64, Vec<Option<IndividualState>>>::new();
        for record in records {
            let states = bins
                .entry(record.bin_start_ms)
                .or_insert_with(|| vec![None; ids.len()]);
            states[columns[&record.animal_id]] = Some(record.state);
        }

        let rows = bins
            .into_iter()
            .map(|(timestamp_ms, states)| WideRow::new(timestamp_ms, states))
            .collect::<Result<Vec<_>, _>>()?;
        let table = WideTable {
            tags: ids.into_iter().map(Tag::from_animal_id).collect(),
            rows,
        };
        tracing::debug!(
            rows = table.rows.len(),
            individuals = table.tags.len(),
            "built wide table"
        );

        match &self.identities {
            Some(identities) => table.resolve_tags(identities),
            None => Ok(table),
        }
    }
}
