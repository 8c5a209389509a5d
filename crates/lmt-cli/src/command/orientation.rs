use std::path::PathBuf;

use clap::Args;
use lmt_analysis::{
    align::AlignMode,
    orientation::{OrientationAnalysis, TargetPoint},
    role::{DEFAULT_SUFFIX_LEN, RoleTable},
};

use crate::{
    config::ExperimentConfig,
    table,
    util::{self, Output},
};

#[derive(Debug, Clone, Args)]
pub(crate) struct OrientationArg {
    /// Path to the experiment JSON file
    #[arg(long)]
    pub config: PathBuf,

    /// Role table CSV (`ID_Animal`, `rank`)
    #[arg(long)]
    pub roles: PathBuf,

    /// Role label or role group name (e.g. `2`, `male`)
    #[arg(long)]
    pub rank: String,

    /// Name of a target point from the experiment file (e.g. `lever`)
    #[arg(long)]
    pub target: String,

    /// Wide table JSON files, one per trial
    #[arg(required = true)]
    pub tables: Vec<PathBuf>,

    /// Number of trailing id digits matched against tags
    #[arg(long, default_value_t = DEFAULT_SUFFIX_LEN)]
    pub suffix_len: usize,

    /// Sampling delay after the event in milliseconds
    #[arg(long, allow_hyphen_values = true)]
    pub delay: Option<i64>,

    /// Rows drawn for the random baseline
    #[arg(long)]
    pub random_n: Option<usize>,

    /// Seed of the random baseline
    #[arg(long)]
    pub seed: Option<u64>,

    /// Row lookup mode (exact or nearest)
    #[arg(long)]
    pub align: Option<AlignMode>,

    /// Write the report as JSON to this path
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub(crate) fn run(arg: &OrientationArg) -> anyhow::Result<()> {
    let experiment = ExperimentConfig::load(&arg.config)?;
    let mut config = experiment.orientation;
    if let Some(delay) = arg.delay {
        config.delay_ms = delay;
    }
    if let Some(sample_size) = arg.random_n {
        config.baseline.sample_size = sample_size;
    }
    if let Some(seed) = arg.seed {
        config.baseline.seed = seed;
    }
    if let Some(mode) = arg.align {
        config.mode = mode;
    }

    let target = TargetPoint::find(&experiment.targets, &arg.target)?.clone();
    let analysis = OrientationAnalysis::new(config, &experiment.zones, target)?;
    let roles = RoleTable::from_csv(
        &util::read_text_file("role table", &arg.roles)?,
        arg.suffix_len,
    )?;
    let selection = experiment.role_selection(&arg.rank);
    let trials = util::read_trials(&arg.tables)?;
    let report = analysis.run(&trials, &roles, &selection)?;

    table::print_title(&format!(
        "Orientation of rank {} towards {} ({:+} ms, {} events)",
        report.selection, report.target.name, config.delay_ms, report.events
    ));
    println!();
    for zone in &report.by_zone {
        table::print_orientation(zone);
        println!();
    }
    let zones = report
        .by_zone
        .iter()
        .map(|zone| zone.zone.clone())
        .collect::<Vec<_>>();
    table::print_zone_distributions(
        &zones,
        &[("post", &report.post), ("random", &report.random)],
    );
    println!();
    match &report.comparison {
        Some(comparison) => table::print_comparisons(std::slice::from_ref(comparison)),
        None => println!("  Comparison: insufficient data"),
    }
    println!();
    table::print_exclusions("Excluded samples", &report.exclusions);
    table::print_exclusions("Excluded baseline samples", &report.baseline_exclusions);

    if let Some(path) = &arg.output {
        Output::save_json(&report, Some(path))?;
    }
    Ok(())
}
