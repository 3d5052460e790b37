use clap::Args;
use serde::Serialize;
use serde_json::Value;

use shipmate::config::{PipelineConfig, DEFAULT_CONFIG_PATH};
use shipmate::pipeline::{self, Step, StepReport};
use shipmate::{build, log_status, provision, publish, Error};

use crate::commands::CmdResult;

#[derive(Args)]
pub struct RunArgs {
    /// Pipeline config path
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Publish credential (overrides the configured token env var)
    #[arg(long)]
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutput {
    pub command: String,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<String>,
    pub steps: Vec<StepReport>,
}

/// Step names and labels in execution order, shared with `plan`.
pub(crate) fn step_summaries(config: &PipelineConfig) -> Vec<(&'static str, String)> {
    let provision_label = if config.required_packages.is_empty() {
        "No system packages to install".to_string()
    } else {
        format!("Install packages: {}", config.required_packages.join(", "))
    };
    vec![
        ("provision", provision_label),
        (
            "build",
            format!("Build ({} profile)", config.build_profile.as_str()),
        ),
        ("publish", format!("Publish release '{}'", config.tag)),
    ]
}

fn to_value<T: Serialize>(data: T) -> shipmate::Result<Value> {
    serde_json::to_value(data)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize step data".to_string())))
}

pub fn run(args: RunArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<RunOutput> {
    let config = PipelineConfig::load(&args.config)?;

    // Everything the steps need is resolved up front: a pipeline that cannot
    // publish should fail before it mutates host package state.
    let host = super::publish::host_from_config(&config, args.token.as_deref())?;
    let installer = config.install_command();
    let working_dir = config.working_dir();
    let labels = step_summaries(&config);

    let steps = vec![
        Step::new("provision", labels[0].1.clone(), || {
            provision::provision(&installer, &config.required_packages).and_then(to_value)
        }),
        Step::new("build", labels[1].1.clone(), || {
            build::build(
                config.build_profile,
                config.build_command.as_deref(),
                &working_dir,
                &config.artifact_paths,
            )
            .and_then(to_value)
        }),
        Step::new("publish", labels[2].1.clone(), || {
            let spec = super::publish::release_spec(&config)?;
            publish::publish(&host, &spec).and_then(to_value)
        }),
    ];

    let outcome = pipeline::run(steps);

    let exit_code = match &outcome.cause {
        Some(cause) => crate::output::exit_code_for_error(cause.code),
        None => 0,
    };

    if let Some(step) = &outcome.failed_step {
        log_status!("pipeline", "Halted at step '{}'", step);
    }

    Ok((
        RunOutput {
            command: "run".to_string(),
            succeeded: outcome.succeeded,
            failed_step: outcome.failed_step,
            steps: outcome.steps,
        },
        exit_code,
    ))
}
