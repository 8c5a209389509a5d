use clap::{Parser, Subcommand};

use self::{
    build_table::BuildTableArg, derive_events::DeriveEventsArg, headings::HeadingsArg,
    occupancy::OccupancyArg, orientation::OrientationArg, transitions::TransitionsArg,
};
use crate::logging;

mod build_table;
mod derive_events;
mod headings;
mod occupancy;
mod orientation;
mod transitions;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Log debug events (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Bin detections into a wide table and join the event log
    BuildTable(#[clap(flatten)] BuildTableArg),
    /// Write an event log of lever presses credited to the individual at the lever
    DeriveEvents(#[clap(flatten)] DeriveEventsArg),
    /// Zone transitions of bystanders around lever presses, per role
    Transitions(#[clap(flatten)] TransitionsArg),
    /// Zone occupancy before and after lever presses against a random baseline
    Occupancy(#[clap(flatten)] OccupancyArg),
    /// Heading relative to a target after lever presses against a random baseline
    Orientation(#[clap(flatten)] OrientationArg),
    /// Position and heading snapshots around lever presses
    Headings(#[clap(flatten)] HeadingsArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    logging::init(args.verbose);
    match args.mode {
        Mode::BuildTable(arg) => build_table::run(&arg)?,
        Mode::DeriveEvents(arg) => derive_events::run(&arg)?,
        Mode::Transitions(arg) => transitions::run(&arg)?,
        Mode::Occupancy(arg) => occupancy::run(&arg)?,
        Mode::Orientation(arg) => orientation::run(&arg)?,
        Mode::Headings(arg) => headings::run(&arg)?,
    }
    Ok(())
}
