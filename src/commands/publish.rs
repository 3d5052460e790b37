use clap::Args;

use shipmate::config::{PipelineConfig, DEFAULT_CONFIG_PATH};
use shipmate::github::GithubClient;
use shipmate::publish::{self, PublishOutput, ReleaseSpec};
use shipmate::utils::artifact::resolve_artifact_path;

use crate::commands::CmdResult;

#[derive(Args)]
pub struct PublishArgs {
    /// Pipeline config path
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Publish credential (overrides the configured token env var)
    #[arg(long)]
    pub token: Option<String>,
}

pub fn run(args: PublishArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<PublishOutput> {
    let config = PipelineConfig::load(&args.config)?;
    let host = host_from_config(&config, args.token.as_deref())?;
    let spec = release_spec(&config)?;
    let output = publish::publish(&host, &spec)?;
    Ok((output, 0))
}

pub(crate) fn host_from_config(
    config: &PipelineConfig,
    token_override: Option<&str>,
) -> shipmate::Result<GithubClient> {
    let repo = config.require_repo()?;
    let token = config.resolve_token(token_override)?;
    GithubClient::new(
        repo,
        token,
        config.api_base_url(),
        config.uploads_base_url(),
    )
}

pub(crate) fn release_spec(config: &PipelineConfig) -> shipmate::Result<ReleaseSpec> {
    let working_dir = config.working_dir();
    let mut artifacts = Vec::with_capacity(config.artifact_paths.len());
    for pattern in &config.artifact_paths {
        artifacts.push(resolve_artifact_path(&working_dir, pattern)?);
    }

    Ok(ReleaseSpec {
        tag: config.tag.clone(),
        prerelease: config.prerelease,
        allow_update: config.allow_update,
        artifacts,
    })
}
