use std::path::PathBuf;

use clap::Args;
use lmt_analysis::{
    align::AlignMode,
    occupancy::OccupancyAnalysis,
    role::{DEFAULT_SUFFIX_LEN, RoleTable},
};

use crate::{
    config::ExperimentConfig,
    table,
    util::{self, Output},
};

#[derive(Debug, Clone, Args)]
pub(crate) struct OccupancyArg {
    /// Path to the experiment JSON file
    #[arg(long)]
    pub config: PathBuf,

    /// Role table CSV (`ID_Animal`, `rank`)
    #[arg(long)]
    pub roles: PathBuf,

    /// Role label or role group name (e.g. `2`, `male`)
    #[arg(long)]
    pub rank: String,

    /// Wide table JSON files, one per trial
    #[arg(required = true)]
    pub tables: Vec<PathBuf>,

    /// Number of trailing id digits matched against tags
    #[arg(long, default_value_t = DEFAULT_SUFFIX_LEN)]
    pub suffix_len: usize,

    /// Pre-event offset in milliseconds
    #[arg(long, allow_hyphen_values = true)]
    pub pre: Option<i64>,

    /// Post-event offset in milliseconds
    #[arg(long, allow_hyphen_values = true)]
    pub post: Option<i64>,

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

pub(crate) fn run(arg: &OccupancyArg) -> anyhow::Result<()> {
    let experiment = ExperimentConfig::load(&arg.config)?;
    let mut config = experiment.occupancy;
    if let Some(pre) = arg.pre {
        config.pre_ms = pre;
    }
    if let Some(post) = arg.post {
        config.post_ms = post;
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

    let analysis = OccupancyAnalysis::new(config, &experiment.zones)?;
    let roles = RoleTable::from_csv(
        &util::read_text_file("role table", &arg.roles)?,
        arg.suffix_len,
    )?;
    let selection = experiment.role_selection(&arg.rank);
    let trials = util::read_trials(&arg.tables)?;
    let report = analysis.run(&trials, &roles, &selection)?;

    table::print_title(&format!(
        "Zone occupancy of rank {} ({} individuals, {} events)",
        report.selection,
        report.subjects.len(),
        report.events
    ));
    println!();
    let pre_label = format!("pre {:+}ms", config.pre_ms);
    let post_label = format!("post {:+}ms", config.post_ms);
    table::print_zone_distributions(
        &report.zones,
        &[
            (pre_label.as_str(), &report.pre),
            (post_label.as_str(), &report.post),
            ("random", &report.random),
        ],
    );
    println!();
    if report.insufficient_data {
        println!("  Comparisons: insufficient data");
    } else {
        table::print_comparisons(&report.comparisons);
    }
    println!();
    table::print_exclusions("Excluded samples", &report.exclusions);
    table::print_exclusions("Excluded baseline samples", &report.baseline_exclusions);

    if let Some(path) = &arg.output {
        Output::save_json(&report, Some(path))?;
    }
    Ok(())
}
