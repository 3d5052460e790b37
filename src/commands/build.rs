use clap::Args;

use shipmate::build::{self, BuildOutput};
use shipmate::config::{BuildProfile, PipelineConfig, DEFAULT_CONFIG_PATH};

use crate::commands::CmdResult;

#[derive(Args)]
pub struct BuildArgs {
    /// Pipeline config path
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Override the configured build profile (debug|release)
    #[arg(long)]
    pub profile: Option<String>,
}

pub fn run(args: BuildArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<BuildOutput> {
    let config = PipelineConfig::load(&args.config)?;

    let profile = match args.profile.as_deref() {
        Some(s) => BuildProfile::parse(s)?,
        None => config.build_profile,
    };

    let output = build::build(
        profile,
        config.build_command.as_deref(),
        &config.working_dir(),
        &config.artifact_paths,
    )?;
    Ok((output, 0))
}
