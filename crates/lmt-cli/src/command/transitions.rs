use std::path::PathBuf;

use clap::Args;
use lmt_analysis::{
    align::AlignMode,
    role::{DEFAULT_SUFFIX_LEN, RoleAssignment, RoleTable},
    transition::{TransitionAggregator, TransitionOutcome, TransitionSummary},
};
use serde::Serialize;

use crate::{
    config::ExperimentConfig,
    table,
    util::{self, Output},
};

#[derive(Debug, Clone, Args)]
pub(crate) struct TransitionsArg {
    /// Path to the experiment JSON file
    #[arg(long)]
    pub config: PathBuf,

    /// Wide table JSON files, one per trial
    #[arg(required = true)]
    pub tables: Vec<PathBuf>,

    /// Offset of the starting position in milliseconds
    #[arg(long, allow_hyphen_values = true)]
    pub before: Option<i64>,

    /// Offset of the end position in milliseconds
    #[arg(long, allow_hyphen_values = true)]
    pub after: Option<i64>,

    /// Role table CSV (`ID_Animal`, `rank`); positional roles if omitted
    #[arg(long)]
    pub roles: Option<PathBuf>,

    /// Number of trailing id digits matched against tags
    #[arg(long, default_value_t = DEFAULT_SUFFIX_LEN)]
    pub suffix_len: usize,

    /// Only analyze trials tracking exactly this many individuals
    #[arg(long)]
    pub individuals: Option<usize>,

    /// Row lookup mode (exact or nearest)
    #[arg(long)]
    pub align: Option<AlignMode>,

    /// Write the full outcome as JSON to this path
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct TransitionReport<'a> {
    summary: TransitionSummary,
    outcome: &'a TransitionOutcome,
}

pub(crate) fn run(arg: &TransitionsArg) -> anyhow::Result<()> {
    let experiment = ExperimentConfig::load(&arg.config)?;
    let mut config = experiment.transition.clone();
    if let Some(before) = arg.before {
        config.before_ms = before;
    }
    if let Some(after) = arg.after {
        config.after_ms = after;
    }
    if let Some(individuals) = arg.individuals {
        config.required_individuals = Some(individuals);
    }
    if let Some(mode) = arg.align {
        config.mode = mode;
    }

    let roles = match &arg.roles {
        Some(path) => RoleAssignment::Table(RoleTable::from_csv(
            &util::read_text_file("role table", path)?,
            arg.suffix_len,
        )?),
        None => RoleAssignment::Positional(experiment.positional_roles.clone()),
    };
    let aggregator = TransitionAggregator::new(config, &experiment.zones, roles)?;
    let trials = util::read_trials(&arg.tables)?;
    let outcome = aggregator.run(&trials);
    let summary = outcome.summary();

    let config = aggregator.config();
    table::print_title(&format!(
        "Transitions into {} ({:+} ms -> {:+} ms)",
        config.target_zone, config.before_ms, config.after_ms
    ));
    println!();
    table::print_proportions(
        "Role",
        summary
            .by_role
            .iter()
            .map(|(role, proportion)| (role.as_str(), proportion))
            .chain([("all", &summary.combined)]),
    );
    println!();
    table::print_exclusions("Excluded samples", &outcome.exclusions);
    if !outcome.skipped_trials.is_empty() {
        println!("  Skipped trials: {}", outcome.skipped_trials.join(", "));
    }

    if let Some(path) = &arg.output {
        Output::save_json(
            &TransitionReport {
                summary,
                outcome: &outcome,
            },
            Some(path),
        )?;
    }
    Ok(())
}
