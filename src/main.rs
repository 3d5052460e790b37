use clap::{Parser, Subcommand};

use commands::GlobalArgs;

mod commands;
mod output;

use commands::{build, plan, provision, publish, run};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "shipmate")]
#[command(version = VERSION)]
#[command(about = "CLI tool for provision, build, and release publishing pipelines")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: provision, build, publish
    Run(run::RunArgs),
    /// Show the steps `run` would execute, without executing them
    Plan(plan::PlanArgs),
    /// Install required system packages
    Provision(provision::ProvisionArgs),
    /// Build the project and verify expected artifacts
    Build(build::BuildArgs),
    /// Publish artifacts to a release on the configured host
    Publish(publish::PublishArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let global = GlobalArgs {};

    let (json_result, exit_code) = commands::run_json(cli.command, &global);

    if output::print_json_result(json_result).is_err() {
        return std::process::ExitCode::from(1);
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
