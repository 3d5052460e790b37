use clap::Args;

use shipmate::config::{PipelineConfig, DEFAULT_CONFIG_PATH};
use shipmate::provision::{self, ProvisionOutput};

use crate::commands::CmdResult;

#[derive(Args)]
pub struct ProvisionArgs {
    /// Pipeline config path
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,
}

pub fn run(
    args: ProvisionArgs,
    _global: &crate::commands::GlobalArgs,
) -> CmdResult<ProvisionOutput> {
    let config = PipelineConfig::load(&args.config)?;
    let output = provision::provision(&config.install_command(), &config.required_packages)?;
    Ok((output, 0))
}
