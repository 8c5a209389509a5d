use std::{io::Write as _, path::PathBuf};

use anyhow::Context;
use clap::Args;
use lmt_analysis::press::{self, attribute_presses};
use lmt_table::{DetectionSet, EventLog, IdentityMap, LEVER_TARGET};

use crate::{
    config::ExperimentConfig,
    util::{self, Output},
};

#[derive(Debug, Clone, Args)]
pub(crate) struct DeriveEventsArg {
    /// Path to the detections JSON file
    pub detections: PathBuf,

    /// JSON array of the frame numbers on which the lever was pressed
    #[arg(long)]
    pub frames: PathBuf,

    /// Experiment JSON file providing the lever zone
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Event log output path (stdout if omitted)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub(crate) fn run(arg: &DeriveEventsArg) -> anyhow::Result<()> {
    let lever_zone = match &arg.config {
        Some(path) => ExperimentConfig::load(path)?.lever_zone,
        None => press::default_lever_zone(),
    };
    let set = util::read_json_file::<DetectionSet, _>("detections", &arg.detections)?;
    let frames = util::read_json_file::<Vec<u64>, _>("press frames", &arg.frames)?;
    let identities = IdentityMap::from(set.animals);

    let attribution = attribute_presses(&set.detections, &frames, &lever_zone, &identities);
    if attribution.events.is_empty() {
        tracing::warn!(
            path = %arg.detections.display(),
            frames = frames.len(),
            "no press frame has an individual in the lever zone"
        );
    } else if !attribution.unattributed.is_empty() {
        tracing::warn!(
            unattributed = attribution.unattributed.len(),
            "some press frames have nobody in the lever zone"
        );
    }

    let mut output = Output::create(arg.output.as_deref())?;
    EventLog::from_events(&attribution.events, LEVER_TARGET)
        .write(&mut output)
        .and_then(|()| output.flush())
        .with_context(|| format!("Failed to write event log to {}", output.display_path()))?;
    if let Output::File { path, .. } = &output {
        tracing::info!(
            path = %path.display(),
            events = attribution.events.len(),
            "wrote event log"
        );
    }
    Ok(())
}
