use std::path::PathBuf;

use clap::Args;
use lmt_stats::circular::AngleMean;
use lmt_table::{
    BinningConfig, DEFAULT_BIN_WIDTH_MS, DetectionSet, EventJoinConfig, EventLog, IdentityMap,
    TimeBinner, WideTableBuilder,
};

use crate::util::{self, Output};

#[derive(Debug, Clone, Args)]
pub(crate) struct BuildTableArg {
    /// Path to the detections JSON file
    pub detections: PathBuf,

    /// Path to the event log (`type;target;time;tag` lines)
    #[arg(long)]
    pub events: Option<PathBuf>,

    /// Width of a time bin in milliseconds
    #[arg(long, default_value_t = DEFAULT_BIN_WIDTH_MS)]
    pub bin_width: i64,

    /// How headings are averaged inside a bin
    #[arg(long, default_value_t = AngleMean::Arithmetic)]
    pub angle_mean: AngleMean,

    /// Event type treated as a lever press
    #[arg(long, default_value = "id_lever")]
    pub event_type: String,

    /// Largest distance between an event and its row in milliseconds
    #[arg(long, default_value_t = 0)]
    pub tolerance: i64,

    /// Width event tags are zero-padded to
    #[arg(long, default_value_t = 12)]
    pub tag_width: usize,

    /// Output JSON path (stdout if omitted)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Also write the table as CSV to this path
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

pub(crate) fn run(arg: &BuildTableArg) -> anyhow::Result<()> {
    let binner = TimeBinner::new(BinningConfig {
        bin_width_ms: arg.bin_width,
        angle_mean: arg.angle_mean,
    })?;
    let join_config = EventJoinConfig {
        event_type: arg.event_type.clone(),
        tolerance_ms: arg.tolerance,
        tag_width: arg.tag_width,
    };
    join_config.validate()?;

    let set = util::read_json_file::<DetectionSet, _>("detections", &arg.detections)?;
    let mut builder = WideTableBuilder::new();
    if !set.animals.is_empty() {
        builder = builder.with_identities(IdentityMap::from(set.animals));
    }
    let records = binner.bin(&set.detections);
    let mut table = builder.build(&records)?;
    tracing::info!(
        detections = set.detections.len(),
        rows = table.rows().len(),
        individuals = table.tags().len(),
        "built wide table"
    );

    if let Some(path) = &arg.events {
        let log = EventLog::parse(&util::read_text_file("event log", path)?);
        if log.skipped_lines > 0 {
            tracing::warn!(
                path = %path.display(),
                skipped = log.skipped_lines,
                "skipped unreadable event log lines"
            );
        }
        let events = log.events(&join_config);
        let report = table.attach_events(&events, join_config.tolerance_ms)?;
        tracing::info!(
            events = events.len(),
            matched = report.matched,
            unmatched = report.unmatched,
            "joined event log"
        );
        if report.unmatched > 0 {
            tracing::warn!(
                unmatched = report.unmatched,
                tolerance_ms = join_config.tolerance_ms,
                "some events have no row within tolerance"
            );
        }
    }

    if let Some(path) = &arg.csv {
        Output::create(Some(path))?.write_csv(&table)?;
    }
    Output::save_json(&table, arg.output.as_deref())?;
    Ok(())
}
