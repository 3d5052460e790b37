use clap::Args;
use serde::Serialize;

use shipmate::config::{PipelineConfig, DEFAULT_CONFIG_PATH};

use crate::commands::CmdResult;

#[derive(Args)]
pub struct PlanArgs {
    /// Pipeline config path
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedStep {
    pub name: String,
    pub label: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanOutput {
    pub command: String,
    pub config_path: String,
    pub steps: Vec<PlannedStep>,
}

/// Show what `run` would do, without executing anything.
pub fn run(args: PlanArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<PlanOutput> {
    let config = PipelineConfig::load(&args.config)?;

    let steps = super::run::step_summaries(&config)
        .into_iter()
        .map(|(name, label)| PlannedStep {
            name: name.to_string(),
            label,
        })
        .collect();

    Ok((
        PlanOutput {
            command: "plan".to_string(),
            config_path: args.config,
            steps,
        },
        0,
    ))
}
