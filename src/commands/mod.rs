pub type CmdResult<T> = shipmate::Result<(T, i32)>;

pub(crate) struct GlobalArgs {}

pub mod build;
pub mod plan;
pub mod provision;
pub mod publish;
pub mod run;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (shipmate::Result<serde_json::Value>, i32) {
    match command {
        crate::Commands::Run(args) => dispatch!(args, global, run),
        crate::Commands::Plan(args) => dispatch!(args, global, plan),
        crate::Commands::Provision(args) => dispatch!(args, global, provision),
        crate::Commands::Build(args) => dispatch!(args, global, build),
        crate::Commands::Publish(args) => dispatch!(args, global, publish),
    }
}
