use std::{collections::BTreeMap, path::PathBuf};

use clap::Args;
use lmt_analysis::{
    align::AlignMode,
    exclusion::ExclusionTally,
    heading::{ARROW_LENGTH, HeadingCollector, HeadingSample},
};
use serde::Serialize;

use crate::{
    config::ExperimentConfig,
    table,
    util::{self, Output},
};

#[derive(Debug, Clone, Args)]
pub(crate) struct HeadingsArg {
    /// Path to the experiment JSON file
    #[arg(long)]
    pub config: PathBuf,

    /// Wide table JSON files, one per trial
    #[arg(required = true)]
    pub tables: Vec<PathBuf>,

    /// Offsets around each event in milliseconds (comma-separated)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub offsets: Option<Vec<i64>>,

    /// Row lookup mode (exact or nearest)
    #[arg(long)]
    pub align: Option<AlignMode>,

    /// Output JSON path (stdout if omitted)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// A snapshot with the tip of its heading arrow, ready for plotting.
#[derive(Debug, Serialize)]
struct Arrow<'a> {
    #[serde(flatten)]
    sample: &'a HeadingSample,
    tip_x: f64,
    tip_y: f64,
}

#[derive(Debug, Serialize)]
struct HeadingReport<'a> {
    arrow_length: f64,
    arrows: Vec<Arrow<'a>>,
    exclusions: &'a ExclusionTally,
}

pub(crate) fn run(arg: &HeadingsArg) -> anyhow::Result<()> {
    let experiment = ExperimentConfig::load(&arg.config)?;
    let mut config = experiment.heading.clone();
    if let Some(offsets) = &arg.offsets {
        config.offsets.clone_from(offsets);
    }
    if let Some(mode) = arg.align {
        config.mode = mode;
    }

    let collector = HeadingCollector::new(config)?;
    let trials = util::read_trials(&arg.tables)?;
    let snapshots = collector.run(&trials)?;

    let mut per_offset = BTreeMap::<i64, usize>::new();
    for sample in &snapshots.samples {
        *per_offset.entry(sample.offset_ms).or_default() += 1;
    }
    // Tables go to stderr here: stdout may carry the JSON document
    eprintln!("Heading snapshots ({} mode)", collector.config().mode);
    for offset in &collector.config().offsets {
        eprintln!(
            "  {offset:>+8} ms {:>8} samples",
            per_offset.get(offset).copied().unwrap_or(0)
        );
    }
    if arg.output.is_some() {
        table::print_exclusions("Excluded samples", &snapshots.exclusions);
    }

    let arrows = snapshots
        .samples
        .iter()
        .map(|sample| {
            let (tip_x, tip_y) = sample.arrow_tip(ARROW_LENGTH);
            Arrow {
                sample,
                tip_x,
                tip_y,
            }
        })
        .collect();
    Output::save_json(
        &HeadingReport {
            arrow_length: ARROW_LENGTH,
            arrows,
            exclusions: &snapshots.exclusions,
        },
        arg.output.as_deref(),
    )?;
    Ok(())
}
